//! Test harness for end-to-end lowering
//!
//! Compiles syntax trees built with `risse_ast::build` and runs the resulting
//! SSA on a small reference evaluator. The evaluator knows just enough of the
//! instruction set to observe control flow: constants, arithmetic and
//! comparisons, variable access across forms, calls, and the try/exit
//! protocol. Unknown members of `this` resolve to host functions that only
//! record their name in the call log.

use std::collections::HashMap;

use risse_ast::Value;
use risse_compiler::ssa::{BlockId, StmtId};
use risse_compiler::{compile, CompileError, CompileOptions, FormId, SsaProgram, VarId};

pub use risse_ast::build::*;
pub use risse_ast::{BinaryOp, Node, UnaryOp};
pub use risse_compiler::OpCode;

/// Guard against runaway loops in broken lowering.
const MAX_STEPS: usize = 100_000;

/// Compile a top-level statement list with default options.
pub fn compile_script(body: Vec<Node>) -> SsaProgram {
    compile_with(body, &CompileOptions::default())
}

pub fn compile_with(body: Vec<Node>, options: &CompileOptions) -> SsaProgram {
    let root = top_level(body);
    match compile(&root, options) {
        Ok(program) => program,
        Err(e) => panic!("Compilation failed: {}\nTree:\n{}", e, risse_ast::dump::dump(&root)),
    }
}

/// Compile a statement list that must fail.
pub fn compile_error(body: Vec<Node>) -> CompileError {
    match compile(&top_level(body), &CompileOptions::default()) {
        Ok(program) => panic!("Expected a compile error, got:\n{}", program.dump()),
        Err(e) => e,
    }
}

/// Compile and run; returns how the top level ended and the call log.
pub fn run(body: Vec<Node>) -> (Outcome, Vec<String>) {
    let program = compile_script(body);
    let mut eval = Evaluator::new(&program);
    let root = program.root_form().expect("no top-level form");
    let outcome = eval.run_form(root, &[], None);
    (outcome, eval.log)
}

/// Compile and run, expecting a normal return of `expected`.
pub fn expect_value(body: Vec<Node>, expected: Val) {
    let (outcome, _) = run(body);
    assert_eq!(outcome, Outcome::Return(expected));
}

pub fn expect_int(body: Vec<Node>, expected: i64) {
    expect_value(body, Val::Int(expected));
}

/// Runtime values of the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Void,
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    This,
    Global,
    Object,
    /// A member of `this` nobody assigned; calling it logs the name.
    Host(String),
    Closure { form: FormId, map: Option<usize> },
    Map(usize),
    /// Result of a protected call that threw.
    Exception(Box<Val>),
    /// Result of a protected call left through exit target `index`.
    Exit { index: u32, value: Box<Val> },
}

impl Val {
    fn truthy(&self) -> bool {
        match self {
            Val::Void | Val::Null => false,
            Val::Bool(b) => *b,
            Val::Int(i) => *i != 0,
            Val::Real(r) => *r != 0.0,
            Val::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    fn from_constant(value: &Value) -> Val {
        match value {
            Value::Void => Val::Void,
            Value::Null => Val::Null,
            Value::Boolean(b) => Val::Bool(*b),
            Value::Integer(i) => Val::Int(*i),
            Value::Real(r) => Val::Real(*r),
            Value::String(s) => Val::Str(s.clone()),
            Value::Octet(_) => Val::Object,
        }
    }
}

/// How a form was left.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Return(Val),
    Throw(Val),
    Exit { try_id: u32, index: u32, value: Val },
}

pub struct Evaluator<'a> {
    program: &'a SsaProgram,
    members: HashMap<String, Val>,
    shared: HashMap<String, Val>,
    maps: Vec<HashMap<String, Val>>,
    steps: usize,
    /// Names of host functions in call order.
    pub log: Vec<String>,
}

impl<'a> Evaluator<'a> {
    pub fn new(program: &'a SsaProgram) -> Self {
        Evaluator {
            program,
            members: HashMap::new(),
            shared: HashMap::new(),
            maps: Vec::new(),
            steps: 0,
            log: Vec::new(),
        }
    }

    pub fn run_form(&mut self, form: FormId, args: &[Val], map: Option<usize>) -> Outcome {
        let program = self.program;
        let mut env: HashMap<VarId, Val> = HashMap::new();
        let mut block = program.form(form).entry();
        let mut prev: Option<BlockId> = None;

        loop {
            let statements = program.block(block).statements();

            // φ statements read their operands simultaneously
            let mut phis = Vec::new();
            for &stmt in statements {
                let s = program.statement(stmt);
                if s.code() != OpCode::Phi {
                    break;
                }
                let pred = prev.expect("phi in an entry block");
                let slot = program
                    .block(block)
                    .preds()
                    .iter()
                    .position(|p| *p == pred)
                    .expect("edge without predecessor entry");
                let operand = env.get(&s.used()[slot]).cloned().unwrap_or_else(|| {
                    panic!("phi operand {} unset in {}", s.used()[slot], program.block(block).name())
                });
                phis.push((s.declared().expect("phi declares nothing"), operand));
            }
            let skip = phis.len();
            for (var, value) in phis {
                env.insert(var, value);
            }

            let mut next = None;
            for &stmt in &statements[skip..] {
                self.steps += 1;
                assert!(self.steps < MAX_STEPS, "evaluation did not terminate");
                match self.step(stmt, &env, args, map) {
                    Step::Value(value) => {
                        if let Some(var) = program.statement(stmt).declared() {
                            env.insert(var, value);
                        }
                    }
                    Step::Goto(target) => {
                        next = Some(target);
                        break;
                    }
                    Step::Leave(outcome) => return outcome,
                }
            }
            let target = next.unwrap_or_else(|| panic!("block {} falls off its end", program.block(block).name()));
            prev = Some(block);
            block = target;
        }
    }

    fn step(&mut self, stmt: StmtId, env: &HashMap<VarId, Val>, args: &[Val], map: Option<usize>) -> Step {
        let program = self.program;
        let s = program.statement(stmt);
        let operand = |i: usize| -> Val {
            env.get(&s.used()[i])
                .cloned()
                .unwrap_or_else(|| panic!("operand {} of {} unset", s.used()[i], s.code()))
        };
        let name = || s.name().expect("statement without a name").to_string();
        let target = |i: usize| s.targets()[i].expect("unset target");

        let value = match s.code() {
            OpCode::AssignConstant => Val::from_constant(s.value().expect("constant without a value")),
            OpCode::AssignThis => Val::This,
            OpCode::AssignGlobal => Val::Global,
            OpCode::AssignParam => args.get(s.index().unwrap_or(0) as usize).cloned().unwrap_or(Val::Void),
            OpCode::AssignNewArray
            | OpCode::AssignNewDict
            | OpCode::AssignNewRegExp
            | OpCode::New
            | OpCode::DefineClass
            | OpCode::DefineProperty => Val::Object,

            OpCode::Jump => return Step::Goto(target(0)),
            OpCode::Branch => return Step::Goto(if operand(0).truthy() { target(0) } else { target(1) }),
            OpCode::CatchBranch => {
                return Step::Goto(match operand(0) {
                    Val::Exception(_) => target(1),
                    Val::Exit { index, .. } => target(index as usize),
                    _ => target(0),
                })
            }
            OpCode::Return => return Step::Leave(Outcome::Return(operand(0))),
            OpCode::Throw => return Step::Leave(Outcome::Throw(operand(0))),
            OpCode::ExitTryException => {
                return Step::Leave(Outcome::Exit {
                    try_id: s.try_id().expect("exit without try id"),
                    index: s.index().expect("exit without index"),
                    value: operand(0),
                })
            }
            OpCode::GetExitTryValue => match operand(0) {
                Val::Exception(value) | Val::Exit { value, .. } => *value,
                other => panic!("GetExitTryValue on {:?}", other),
            },
            OpCode::Debugger | OpCode::EndAccessMap => Val::Void,

            OpCode::ReadVar | OpCode::WriteVar => operand(0),
            OpCode::Read => self.shared.get(&name()).cloned().unwrap_or(Val::Void),
            OpCode::Write => {
                let value = operand(0);
                self.shared.insert(name(), value.clone());
                value
            }
            OpCode::DefineAccessMap => {
                self.maps.push(HashMap::new());
                Val::Map(self.maps.len() - 1)
            }
            OpCode::ChildWrite => {
                let Val::Map(m) = operand(0) else { panic!("ChildWrite without a map") };
                self.maps[m].insert(name(), operand(1));
                Val::Void
            }
            OpCode::ChildRead => {
                let Val::Map(m) = operand(0) else { panic!("ChildRead without a map") };
                self.maps[m].get(&name()).cloned().unwrap_or(Val::Void)
            }
            OpCode::ParentRead => {
                let m = map.expect("ParentRead outside a lazy block");
                self.maps[m].get(&name()).cloned().unwrap_or(Val::Void)
            }
            OpCode::ParentWrite => {
                let m = map.expect("ParentWrite outside a lazy block");
                self.maps[m].insert(name(), operand(0));
                Val::Void
            }
            OpCode::DefineLazyBlock => {
                let map = s.used().first().map(|_| match operand(0) {
                    Val::Map(m) => m,
                    other => panic!("lazy block with {:?} as access map", other),
                });
                Val::Closure {
                    form: s.defined_form().expect("lazy block without a form"),
                    map,
                }
            }

            OpCode::DGet | OpCode::IGet => match (operand(0), operand(1)) {
                (Val::This, Val::Str(key)) => self.members.get(&key).cloned().unwrap_or(Val::Host(key)),
                (Val::Global, Val::Str(key)) => Val::Host(key),
                _ => Val::Void,
            },
            OpCode::DSet | OpCode::ISet | OpCode::DSetAttrib => {
                if let (Val::This, Val::Str(key)) = (operand(0), operand(1)) {
                    self.members.insert(key, operand(2));
                }
                Val::Void
            }
            OpCode::DDelete | OpCode::IDelete => Val::Bool(true),

            OpCode::FuncCall => {
                let args: Vec<Val> = (1..s.used().len()).map(operand).collect();
                match self.call(operand(0), &args) {
                    Outcome::Return(value) => value,
                    other => return Step::Leave(other),
                }
            }
            OpCode::TryFuncCall | OpCode::Sync => {
                let outcome = match operand(0) {
                    Val::Closure { form, map } => self.run_form(form, &[], map),
                    other => panic!("protected call of {:?}", other),
                };
                match protect(outcome, s.try_id().expect("protected call without try id")) {
                    Ok(value) => value,
                    Err(outcome) => return Step::Leave(outcome),
                }
            }
            OpCode::FuncCallBlock => {
                let flags = s.call_flags().expect("call without flags");
                let split = s.used().len() - flags.block_count as usize;
                let args: Vec<Val> = (1..split).map(operand).collect();
                let blocks: Vec<Val> = (split..s.used().len()).map(operand).collect();
                let outcome = self.call_with_blocks(operand(0), &args, &blocks);
                match protect(outcome, s.try_id().expect("block call without try id")) {
                    Ok(value) => value,
                    Err(outcome) => return Step::Leave(outcome),
                }
            }

            OpCode::LogNot => Val::Bool(!operand(0).truthy()),
            OpCode::Plus => operand(0),
            OpCode::Minus => match operand(0) {
                Val::Int(i) => Val::Int(-i),
                Val::Real(r) => Val::Real(-r),
                other => panic!("negating {:?}", other),
            },
            OpCode::Equal | OpCode::DiscEqual => Val::Bool(operand(0) == operand(1)),
            OpCode::NotEqual | OpCode::DiscNotEqual => Val::Bool(operand(0) != operand(1)),
            code @ (OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Mod
            | OpCode::Idiv
            | OpCode::Lesser
            | OpCode::Greater
            | OpCode::LesserOrEqual
            | OpCode::GreaterOrEqual) => arithmetic(code, operand(0), operand(1)),
            OpCode::LogAnd => Val::Bool(operand(0).truthy() && operand(1).truthy()),
            OpCode::LogOr => Val::Bool(operand(0).truthy() || operand(1).truthy()),

            code => panic!("the evaluator does not support {}", code),
        };
        Step::Value(value)
    }

    fn call(&mut self, callee: Val, args: &[Val]) -> Outcome {
        match callee {
            Val::Closure { form, map } => self.run_form(form, args, map),
            Val::Host(name) => {
                self.log.push(name);
                Outcome::Return(Val::Void)
            }
            other => panic!("calling {:?}", other),
        }
    }

    /// Host functions taking blocks call each block with 0, 1 and 2 and
    /// return the last value a block produced.
    fn call_with_blocks(&mut self, callee: Val, args: &[Val], blocks: &[Val]) -> Outcome {
        let Val::Host(name) = callee else {
            panic!("block call of {:?}", callee);
        };
        self.log.push(name);
        let mut last = Val::Void;
        for i in 0..3 {
            for block in blocks {
                let mut block_args = vec![Val::Int(i)];
                block_args.extend(args.iter().cloned());
                match self.call(block.clone(), &block_args) {
                    Outcome::Return(value) => last = value,
                    other => return other,
                }
            }
        }
        Outcome::Return(last)
    }
}

enum Step {
    Value(Val),
    Goto(BlockId),
    Leave(Outcome),
}

/// What a protected call hands to its `CatchBranch`. Exits aimed at another
/// try id keep propagating.
fn protect(outcome: Outcome, try_id: u32) -> Result<Val, Outcome> {
    match outcome {
        Outcome::Return(value) => Ok(value),
        Outcome::Throw(value) => Ok(Val::Exception(Box::new(value))),
        Outcome::Exit { try_id: t, index, value } if t == try_id => Ok(Val::Exit {
            index,
            value: Box::new(value),
        }),
        other => Err(other),
    }
}

fn arithmetic(code: OpCode, a: Val, b: Val) -> Val {
    match (a, b) {
        (Val::Int(a), Val::Int(b)) => match code {
            OpCode::Add => Val::Int(a + b),
            OpCode::Sub => Val::Int(a - b),
            OpCode::Mul => Val::Int(a * b),
            OpCode::Mod => Val::Int(a % b),
            OpCode::Idiv => Val::Int(a / b),
            OpCode::Lesser => Val::Bool(a < b),
            OpCode::Greater => Val::Bool(a > b),
            OpCode::LesserOrEqual => Val::Bool(a <= b),
            OpCode::GreaterOrEqual => Val::Bool(a >= b),
            _ => unreachable!(),
        },
        (Val::Str(a), b) if code == OpCode::Add => Val::Str(format!("{}{}", a, display(&b))),
        (a, b) => panic!("{} on {:?} and {:?}", code, a, b),
    }
}

fn display(value: &Val) -> String {
    match value {
        Val::Str(s) => s.clone(),
        Val::Int(i) => i.to_string(),
        Val::Bool(b) => b.to_string(),
        Val::Void => String::new(),
        other => format!("{:?}", other),
    }
}

/// Opcodes of the live statements of the forms whose name starts with
/// `prefix`, in block order.
pub fn opcodes_of(program: &SsaProgram, prefix: &str) -> Vec<OpCode> {
    program
        .forms()
        .filter(|f| program.form(*f).name().starts_with(prefix))
        .flat_map(|f| program.form(f).blocks().to_vec())
        .flat_map(|b| program.block(b).statements().to_vec())
        .map(|s| program.statement(s).code())
        .collect()
}
