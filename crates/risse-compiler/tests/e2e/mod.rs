//! End-to-end tests for the SSA lowering
//!
//! These tests lower syntax trees and run the SSA on the reference
//! evaluator in `harness`, checking values and the order of side effects.

mod harness;
mod callbacks;
mod conditionals;
mod errors;
mod exceptions;
mod functions;
mod labels;
mod loops;
mod switch;

pub use harness::*;
