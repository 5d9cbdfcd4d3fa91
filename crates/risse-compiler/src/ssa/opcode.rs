//! SSA instruction set

use risse_ast::{BinaryOp, UnaryOp};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OpCode {
    AssignConstant,
    AssignThis,
    AssignGlobal,
    AssignNewArray,
    AssignNewDict,
    AssignNewRegExp,
    AssignParam,
    Phi,

    // calls
    FuncCall,
    New,
    FuncCallBlock,
    TryFuncCall,
    Sync,

    // control
    Jump,
    Branch,
    CatchBranch,
    Debugger,
    Throw,
    Return,
    ExitTryException,
    GetExitTryValue,

    // operators
    LogNot,
    BitNot,
    Plus,
    Minus,
    LogOr,
    LogAnd,
    BitOr,
    BitXor,
    BitAnd,
    NotEqual,
    Equal,
    DiscNotEqual,
    DiscEqual,
    Lesser,
    Greater,
    LesserOrEqual,
    GreaterOrEqual,
    RBitShift,
    LShift,
    RShift,
    Mod,
    Div,
    Idiv,
    Mul,
    Add,
    Sub,
    IncontextOf,

    // members
    DGet,
    IGet,
    DDelete,
    IDelete,
    DSet,
    ISet,
    DSetAttrib,

    // definitions
    DefineLazyBlock,
    DefineClass,
    DefineProperty,
    DefineAccessMap,
    EndAccessMap,

    // variable access across forms
    ParentRead,
    ParentWrite,
    ChildRead,
    ChildWrite,
    ReadVar,
    WriteVar,
    Read,
    Write,
}

impl OpCode {
    pub fn mnemonic(&self) -> &'static str {
        use OpCode::*;
        match self {
            AssignConstant => "AssignConstant",
            AssignThis => "AssignThis",
            AssignGlobal => "AssignGlobal",
            AssignNewArray => "AssignNewArray",
            AssignNewDict => "AssignNewDict",
            AssignNewRegExp => "AssignNewRegExp",
            AssignParam => "AssignParam",
            Phi => "Phi",
            FuncCall => "FuncCall",
            New => "New",
            FuncCallBlock => "FuncCallBlock",
            TryFuncCall => "TryFuncCall",
            Sync => "Sync",
            Jump => "Jump",
            Branch => "Branch",
            CatchBranch => "CatchBranch",
            Debugger => "Debugger",
            Throw => "Throw",
            Return => "Return",
            ExitTryException => "ExitTryException",
            GetExitTryValue => "GetExitTryValue",
            LogNot => "LogNot",
            BitNot => "BitNot",
            Plus => "Plus",
            Minus => "Minus",
            LogOr => "LogOr",
            LogAnd => "LogAnd",
            BitOr => "BitOr",
            BitXor => "BitXor",
            BitAnd => "BitAnd",
            NotEqual => "NotEqual",
            Equal => "Equal",
            DiscNotEqual => "DiscNotEqual",
            DiscEqual => "DiscEqual",
            Lesser => "Lesser",
            Greater => "Greater",
            LesserOrEqual => "LesserOrEqual",
            GreaterOrEqual => "GreaterOrEqual",
            RBitShift => "RBitShift",
            LShift => "LShift",
            RShift => "RShift",
            Mod => "Mod",
            Div => "Div",
            Idiv => "Idiv",
            Mul => "Mul",
            Add => "Add",
            Sub => "Sub",
            IncontextOf => "IncontextOf",
            DGet => "DGet",
            IGet => "IGet",
            DDelete => "DDelete",
            IDelete => "IDelete",
            DSet => "DSet",
            ISet => "ISet",
            DSetAttrib => "DSetAttrib",
            DefineLazyBlock => "DefineLazyBlock",
            DefineClass => "DefineClass",
            DefineProperty => "DefineProperty",
            DefineAccessMap => "DefineAccessMap",
            EndAccessMap => "EndAccessMap",
            ParentRead => "ParentRead",
            ParentWrite => "ParentWrite",
            ChildRead => "ChildRead",
            ChildWrite => "ChildWrite",
            ReadVar => "ReadVar",
            WriteVar => "WriteVar",
            Read => "Read",
            Write => "Write",
        }
    }

    /// Whether a freshly added statement with this opcode declares a value.
    pub fn declares_value(&self) -> bool {
        use OpCode::*;
        !matches!(
            self,
            Jump
                | Branch
                | CatchBranch
                | Debugger
                | Throw
                | Return
                | ExitTryException
                | DSet
                | ISet
                | DSetAttrib
                | EndAccessMap
                | ParentWrite
                | ChildWrite
                | Write
        )
    }

    /// Block terminators.
    pub fn is_branch(&self) -> bool {
        use OpCode::*;
        matches!(self, Jump | Branch | CatchBranch | Throw | Return | ExitTryException)
    }

    pub fn from_binary(op: BinaryOp) -> Option<OpCode> {
        Some(match op {
            BinaryOp::LogOr => OpCode::LogOr,
            BinaryOp::LogAnd => OpCode::LogAnd,
            BinaryOp::BitOr => OpCode::BitOr,
            BinaryOp::BitXor => OpCode::BitXor,
            BinaryOp::BitAnd => OpCode::BitAnd,
            BinaryOp::NotEqual => OpCode::NotEqual,
            BinaryOp::Equal => OpCode::Equal,
            BinaryOp::DiscNotEqual => OpCode::DiscNotEqual,
            BinaryOp::DiscEqual => OpCode::DiscEqual,
            BinaryOp::Lesser => OpCode::Lesser,
            BinaryOp::Greater => OpCode::Greater,
            BinaryOp::LesserOrEqual => OpCode::LesserOrEqual,
            BinaryOp::GreaterOrEqual => OpCode::GreaterOrEqual,
            BinaryOp::RBitShift => OpCode::RBitShift,
            BinaryOp::LShift => OpCode::LShift,
            BinaryOp::RShift => OpCode::RShift,
            BinaryOp::Mod => OpCode::Mod,
            BinaryOp::Div => OpCode::Div,
            BinaryOp::Idiv => OpCode::Idiv,
            BinaryOp::Mul => OpCode::Mul,
            BinaryOp::Add => OpCode::Add,
            BinaryOp::Sub => OpCode::Sub,
            BinaryOp::IncontextOf => OpCode::IncontextOf,
            _ => return None,
        })
    }

    pub fn from_unary(op: UnaryOp) -> Option<OpCode> {
        Some(match op {
            UnaryOp::LogNot => OpCode::LogNot,
            UnaryOp::BitNot => OpCode::BitNot,
            UnaryOp::Plus => OpCode::Plus,
            UnaryOp::Minus => OpCode::Minus,
            _ => return None,
        })
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
