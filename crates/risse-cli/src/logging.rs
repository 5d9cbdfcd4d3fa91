//! Tracing setup
//!
//! The subscriber is installed only when `RISSE_LOG` or `RUST_LOG` is set.
//! `RISSE_LOG_FORMAT=json` switches to one JSON object per event. All output
//! goes to stderr, leaving stdout to dumps.
//!
//! ```bash
//! RISSE_LOG=risse_compiler=debug risse ssa program.json
//! RISSE_LOG=trace RISSE_LOG_FORMAT=json risse check program.json
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("RISSE_LOG_FORMAT").unwrap_or_default())
    }
}

/// `RISSE_LOG` wins over `RUST_LOG`.
fn build_filter() -> EnvFilter {
    match std::env::var("RISSE_LOG") {
        Ok(value) => EnvFilter::builder().parse_lossy(value),
        Err(_) => EnvFilter::from_default_env(),
    }
}

pub fn init_tracing() {
    if std::env::var_os("RISSE_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Json => {
            let layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
