//! Expression and control-flow nodes.

use crate::{Ast, Name};
use token::IntTy;
use utility::{Atom, Int};

/// An integer literal together with its suffix-derived metadata.
#[derive(Clone, PartialEq, Debug)]
pub struct IntLit {
    pub value: Int,
    pub ty: IntTy,
}

/// An interpolated string: text segments and embedded expressions.
#[derive(Clone, PartialEq, Debug)]
pub struct Fstr {
    pub segments: Vec<Ast>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Arr {
    pub elements: Vec<Ast>,
}

/// A sequence of statements; the final one is the block's value.
#[derive(Clone, PartialEq, Debug)]
pub struct Block {
    pub statements: Vec<Ast>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct If {
    pub condition: Ast,
    pub consequent: Ast,
    pub alternate: Option<Ast>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Match {
    pub scrutinee: Ast,
    pub arms: Vec<MatchArm>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct MatchArm {
    pub pattern: Ast,
    pub body: Ast,
}

/// A pattern test: `scrutinee is pattern`.
#[derive(Clone, PartialEq, Debug)]
pub struct Is {
    pub scrutinee: Ast,
    pub pattern: Ast,
}

#[derive(Clone, PartialEq, Debug)]
pub struct TupleMake {
    pub elements: Vec<Ast>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct TupleAccess {
    pub tuple: Ast,
    pub index: usize,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Return {
    pub value: Option<Ast>,
}

/// `continue` with next values for the induction variables.
#[derive(Clone, PartialEq, Debug)]
pub struct Continue {
    pub values: Vec<Ast>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct EnumConstr {
    pub target: Name,
    pub variant: Atom,
    pub arguments: Vec<Ast>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct StructInit {
    pub target: Name,
    pub fields: Vec<(Atom, Ast)>,
}

/// A functional update: a struct value with some fields replaced.
#[derive(Clone, PartialEq, Debug)]
pub struct StructModif {
    pub base: Ast,
    pub fields: Vec<(Atom, Ast)>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct FieldRef {
    pub base: Ast,
    pub field: Atom,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ArrAccess {
    pub base: Ast,
    pub index: Ast,
}

/// A subslice: `base[from..to]` with optional open ends.
#[derive(Clone, PartialEq, Debug)]
pub struct View {
    pub base: Ast,
    pub from: Option<Ast>,
    pub to: Option<Ast>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Call {
    pub callee: Ast,
    pub arguments: Vec<Ast>,
    pub kwarguments: Vec<(Atom, Ast)>,
}

/// A pipeline: `head |> f(…) |> g(…)`.
#[derive(Clone, PartialEq, Debug)]
pub struct ChainCall {
    pub head: Ast,
    pub calls: Vec<Ast>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Unary {
    pub operator: UnOp,
    pub operand: Ast,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Binary {
    pub operator: BinOp,
    pub left: Ast,
    pub right: Ast,
}

#[derive(Clone, PartialEq, Debug)]
pub struct VarRef {
    pub name: Name,
}

#[derive(Clone, PartialEq, Debug)]
pub struct While {
    pub condition: Ast,
    pub body: Ast,
}

/// A C-style loop: induction variables, stop condition, steps, body
/// and an optional exit expression evaluated after the loop.
#[derive(Clone, PartialEq, Debug)]
pub struct For {
    pub starts: Vec<Ast>,
    pub stop: Ast,
    pub steps: Vec<Ast>,
    pub body: Ast,
    pub exit: Option<Ast>,
}

/// Iteration over a value exposing `iter` (one binder) or `iter2` (two binders).
#[derive(Clone, PartialEq, Debug)]
pub struct ForIn {
    pub binders: Vec<Atom>,
    pub iterable: Ast,
    pub body: Ast,
}

/// `guard condition else alternate`.
#[derive(Clone, PartialEq, Debug)]
pub struct Guard {
    pub condition: Ast,
    pub alternate: Ast,
}

/// The endpoints of an inclusive or exclusive range.
#[derive(Clone, PartialEq, Debug)]
pub struct Range {
    pub start: Ast,
    pub stop: Ast,
}

/// A foreign function body.
#[derive(Clone, PartialEq, Debug)]
pub struct FfiBody {
    pub language: Atom,
    pub code: Atom,
}

#[derive(Clone, PartialEq, Debug)]
pub struct TestDecl {
    pub name: Atom,
    pub body: Ast,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    Assign,
}

impl BinOp {
    /// Operators whose result is `Bool` regardless of the operand type.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::And
                | Self::Or
                | Self::Less
                | Self::LessEqual
                | Self::Greater
                | Self::GreaterEqual
                | Self::Equal
                | Self::NotEqual
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Remainder => "%",
            Self::And => "&&",
            Self::Or => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Assign => "=",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnOp {
    Negate,
    Not,
    BitNot,
}
