//! The abstract syntax tree (AST).
//!
//! Every node carries its span, its attributes and a mutable inferred-type
//! slot which starts out as [`Ty::Unknown`] and is filled in by inference.

use span::{Span, Spanned, Spanning};
use utility::{Atom, SmallVec};

pub use decl::*;
pub use expr::*;
pub use name::{Name, BUILTIN_PACK};
pub use ty::{Ty, WeakCell};

mod decl;
mod expr;
mod name;
pub mod ty;

/// A list of attributes.
pub type Attrs = SmallVec<Spanned<Atom>, 1>;

/// An AST node.
#[derive(Clone, PartialEq, Debug)]
pub struct Ast {
    pub bare: BareAst,
    pub span: Span,
    pub attrs: Attrs,
    pub ty: Ty,
}

impl Ast {
    pub fn new(span: Span, bare: impl Into<BareAst>) -> Self {
        Self {
            bare: bare.into(),
            span,
            attrs: SmallVec::new(),
            ty: Ty::Unknown,
        }
    }

    /// Create a node with an unknown location.
    pub fn bare(bare: impl Into<BareAst>) -> Self {
        Self::new(Span::default(), bare)
    }

    /// Apply the mapper to this node's type and the type of every descendant.
    pub fn map_ty(&mut self, mapper: &impl Fn(&Ty) -> Ty) {
        self.ty = mapper(&self.ty);
        for child in self.children_mut() {
            child.map_ty(mapper);
        }
    }

    /// The direct sub-nodes of this node.
    pub fn children_mut(&mut self) -> Vec<&mut Ast> {
        use BareAst::*;

        fn optional(value: &mut Option<Ast>) -> Vec<&mut Ast> {
            value.as_mut().into_iter().collect()
        }

        match &mut self.bare {
            FnDecl(decl) => {
                let mut children: Vec<_> =
                    decl.params.iter_mut().chain(&mut decl.kwparams).collect();
                children.extend(decl.body.as_mut());
                children
            }
            ImplDecl(decl) => decl.fns.iter_mut().collect(),
            TraitDecl(decl) => decl.fns.iter_mut().collect(),
            GlobalDecl(decl) => optional(&mut decl.value),
            VarDecl(decl) => vec![&mut decl.value],
            ParamDecl(decl) => optional(&mut decl.default),
            TupleDecl(decl) => vec![&mut decl.value],
            StructLet(decl) => vec![&mut decl.value],
            EnumLet(decl) => vec![&mut decl.value],
            StructDecl(_) | EnumDecl(_) | AbstractDecl(_) | Typealias(_) | Fnalias(_) => {
                Vec::new()
            }

            Fstr(fstr) => fstr.segments.iter_mut().collect(),
            Arr(arr) => arr.elements.iter_mut().collect(),
            Block(block) => block.statements.iter_mut().collect(),
            If(if_) => {
                let mut children = vec![&mut if_.condition, &mut if_.consequent];
                children.extend(if_.alternate.as_mut());
                children
            }
            Match(match_) => {
                let mut children = vec![&mut match_.scrutinee];
                for arm in &mut match_.arms {
                    children.push(&mut arm.pattern);
                    children.push(&mut arm.body);
                }
                children
            }
            Is(is) => vec![&mut is.scrutinee, &mut is.pattern],
            TupleMake(tuple) => tuple.elements.iter_mut().collect(),
            TupleAccess(access) => vec![&mut access.tuple],
            Return(return_) => optional(&mut return_.value),
            Continue(continue_) => continue_.values.iter_mut().collect(),
            EnumConstr(constr) => constr.arguments.iter_mut().collect(),
            StructInit(init) => init.fields.iter_mut().map(|(_, value)| value).collect(),
            StructModif(modif) => {
                let mut children = vec![&mut modif.base];
                children.extend(modif.fields.iter_mut().map(|(_, value)| value));
                children
            }
            FieldRef(field) => vec![&mut field.base],
            ArrAccess(access) => vec![&mut access.base, &mut access.index],
            View(view) => {
                let mut children = vec![&mut view.base];
                children.extend(view.from.as_mut());
                children.extend(view.to.as_mut());
                children
            }
            Call(call) => {
                let mut children = vec![&mut call.callee];
                children.extend(&mut call.arguments);
                children.extend(call.kwarguments.iter_mut().map(|(_, value)| value));
                children
            }
            ChainCall(chain) => {
                let mut children = vec![&mut chain.head];
                children.extend(&mut chain.calls);
                children
            }
            Unary(unary) => vec![&mut unary.operand],
            Binary(binary) | BinaryInplace(binary) => vec![&mut binary.left, &mut binary.right],

            While(while_) => vec![&mut while_.condition, &mut while_.body],
            For(for_) => {
                let mut children: Vec<_> = for_.starts.iter_mut().collect();
                children.push(&mut for_.stop);
                children.extend(&mut for_.steps);
                children.push(&mut for_.body);
                children.extend(for_.exit.as_mut());
                children
            }
            ForIn(for_in) => vec![&mut for_in.iterable, &mut for_in.body],
            Guard(guard) => vec![&mut guard.condition, &mut guard.alternate],
            IncRange(range) | ExcRange(range) => vec![&mut range.start, &mut range.stop],
            TestDecl(test) => vec![&mut test.body],

            IntLit(_) | DoubleLit(_) | FloatLit(_) | TextLit(_) | BoolLit(_) | CharLit(_)
            | ByteLit(_) | ByteTextLit(_) | UnitLit | Leaf | Break | VarRef(_) | FfiBody(_) => {
                Vec::new()
            }
        }
    }

    /// The user-facing name of the construct, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        use BareAst::*;

        match &self.bare {
            FnDecl(_) => "function declaration",
            ImplDecl(_) => "implementation block",
            StructDecl(_) => "struct declaration",
            TraitDecl(_) => "trait declaration",
            EnumDecl(_) => "enum declaration",
            AbstractDecl(_) => "abstract type declaration",
            GlobalDecl(_) => "global declaration",
            VarDecl(_) => "binding",
            ParamDecl(_) => "parameter",
            TupleDecl(_) => "tuple binding",
            StructLet(_) => "struct binding",
            EnumLet(_) => "enum binding",
            Typealias(_) => "type alias",
            Fnalias(_) => "function alias",
            IntLit(_) => "integer literal",
            DoubleLit(_) => "number literal",
            FloatLit(_) => "float literal",
            TextLit(_) => "text literal",
            Fstr(_) => "interpolated text literal",
            BoolLit(_) => "boolean literal",
            CharLit(_) => "character literal",
            ByteLit(_) => "byte literal",
            ByteTextLit(_) => "byte text literal",
            Arr(_) => "array literal",
            UnitLit => "unit literal",
            Leaf => "empty node",
            Block(_) => "block",
            If(_) => "if expression",
            Match(_) => "match expression",
            Is(_) => "pattern test",
            TupleMake(_) => "tuple literal",
            TupleAccess(_) => "tuple access",
            Return(_) => "return",
            Break => "break",
            Continue(_) => "continue",
            EnumConstr(_) => "enum constructor",
            StructInit(_) => "struct initializer",
            StructModif(_) => "struct update",
            FieldRef(_) => "field reference",
            ArrAccess(_) => "array access",
            View(_) => "view",
            Call(_) => "call",
            ChainCall(_) => "call chain",
            Unary(_) => "unary operation",
            Binary(_) => "binary operation",
            BinaryInplace(_) => "in-place binary operation",
            VarRef(_) => "reference",
            While(_) => "while loop",
            For(_) => "for loop",
            ForIn(_) => "for-in loop",
            Guard(_) => "guard",
            IncRange(_) => "inclusive range",
            ExcRange(_) => "exclusive range",
            FfiBody(_) => "foreign function body",
            TestDecl(_) => "test declaration",
        }
    }
}

impl Spanning for Ast {
    fn span(&self) -> Span {
        self.span
    }
}

/// A location-less AST node.
#[derive(Clone, PartialEq, Debug)]
pub enum BareAst {
    FnDecl(Box<FnDecl>),
    ImplDecl(Box<ImplDecl>),
    StructDecl(Box<StructDecl>),
    TraitDecl(Box<TraitDecl>),
    EnumDecl(Box<EnumDecl>),
    AbstractDecl(Box<AbstractDecl>),
    GlobalDecl(Box<GlobalDecl>),
    VarDecl(Box<VarDecl>),
    ParamDecl(Box<ParamDecl>),
    TupleDecl(Box<TupleDecl>),
    StructLet(Box<StructLet>),
    EnumLet(Box<EnumLet>),
    Typealias(Box<Typealias>),
    Fnalias(Box<Fnalias>),

    IntLit(Box<IntLit>),
    DoubleLit(f64),
    FloatLit(f32),
    TextLit(Atom),
    Fstr(Box<Fstr>),
    BoolLit(bool),
    CharLit(char),
    ByteLit(u8),
    ByteTextLit(Vec<u8>),
    Arr(Box<Arr>),
    UnitLit,
    Leaf,
    Block(Box<Block>),
    If(Box<If>),
    Match(Box<Match>),
    Is(Box<Is>),
    TupleMake(Box<TupleMake>),
    TupleAccess(Box<TupleAccess>),
    Return(Box<Return>),
    Break,
    Continue(Box<Continue>),
    EnumConstr(Box<EnumConstr>),
    StructInit(Box<StructInit>),
    StructModif(Box<StructModif>),
    FieldRef(Box<FieldRef>),
    ArrAccess(Box<ArrAccess>),
    View(Box<View>),
    Call(Box<Call>),
    ChainCall(Box<ChainCall>),
    Unary(Box<Unary>),
    Binary(Box<Binary>),
    BinaryInplace(Box<Binary>),
    VarRef(Box<VarRef>),

    While(Box<While>),
    For(Box<For>),
    ForIn(Box<ForIn>),
    Guard(Box<Guard>),
    IncRange(Box<Range>),
    ExcRange(Box<Range>),
    FfiBody(Box<FfiBody>),
    TestDecl(Box<TestDecl>),
}

macro_rules! boxed_from {
    ($( $payload:ident ),* $(,)?) => {
        $(
            impl From<$payload> for BareAst {
                fn from(payload: $payload) -> Self {
                    Self::$payload(Box::new(payload))
                }
            }
        )*
    };
}

boxed_from! {
    FnDecl, ImplDecl, StructDecl, TraitDecl, EnumDecl, AbstractDecl, GlobalDecl, VarDecl,
    ParamDecl, TupleDecl, StructLet, EnumLet, Typealias, Fnalias,
    IntLit, Fstr, Arr, Block, If, Match, Is, TupleMake, TupleAccess, Return, Continue,
    EnumConstr, StructInit, StructModif, FieldRef, ArrAccess, View, Call, ChainCall,
    Unary, Binary,
    While, For, ForIn, Guard, FfiBody, TestDecl,
}

impl From<VarRef> for BareAst {
    fn from(reference: VarRef) -> Self {
        Self::VarRef(Box::new(reference))
    }
}

impl From<Name> for BareAst {
    fn from(name: Name) -> Self {
        VarRef { name }.into()
    }
}

#[cfg(test)]
mod test {
    use super::{Arr, Ast, BareAst, Binary, BinOp, Ty, VarRef};
    use crate::Name;

    fn reference(name: &str) -> Ast {
        Ast::bare(VarRef {
            name: Name::standalone(name),
        })
    }

    #[test]
    fn map_ty_reaches_every_node() {
        let mut node = Ast::bare(Arr {
            elements: vec![
                reference("alpha"),
                Ast::bare(Binary {
                    operator: BinOp::Add,
                    left: reference("beta"),
                    right: reference("gamma"),
                }),
            ],
        });

        node.map_ty(&|_| Ty::Int);

        assert_eq!(node.ty, Ty::Int);
        let BareAst::Arr(arr) = &node.bare else { unreachable!() };
        assert_eq!(arr.elements[0].ty, Ty::Int);
        let BareAst::Binary(binary) = &arr.elements[1].bare else { unreachable!() };
        assert_eq!(binary.left.ty, Ty::Int);
        assert_eq!(binary.right.ty, Ty::Int);
    }
}
