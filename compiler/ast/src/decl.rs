//! Declaration nodes.

use crate::{Ast, Name, Ty};
use utility::Atom;

/// A function declaration.
///
/// Positional parameters live in `params`, keyword parameters (each with an
/// optional default) in `kwparams`; both are [`ParamDecl`] nodes.
#[derive(Clone, PartialEq, Debug)]
pub struct FnDecl {
    pub name: Name,
    pub tyvars: Vec<TyvarDecl>,
    pub params: Vec<Ast>,
    pub kwparams: Vec<Ast>,
    pub ret: Ty,
    pub body: Option<Ast>,
}

/// A declared type parameter with its trait bounds.
#[derive(Clone, PartialEq, Debug)]
pub struct TyvarDecl {
    pub binder: Atom,
    pub bounds: Vec<Name>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ImplDecl {
    pub trait_: Option<Name>,
    pub target: Name,
    pub fns: Vec<Ast>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct StructDecl {
    pub name: Name,
    pub tyvars: Vec<Atom>,
    pub fields: Vec<FieldDecl>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct FieldDecl {
    pub binder: Atom,
    pub ty: Ty,
}

#[derive(Clone, PartialEq, Debug)]
pub struct TraitDecl {
    pub name: Name,
    pub fns: Vec<Ast>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct EnumDecl {
    pub name: Name,
    pub tyvars: Vec<Atom>,
    pub variants: Vec<VariantDecl>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct VariantDecl {
    pub binder: Atom,
    pub payload: Vec<Ty>,
}

/// An abstract type: a named type whose representation is hidden.
#[derive(Clone, PartialEq, Debug)]
pub struct AbstractDecl {
    pub name: Name,
    pub tyvars: Vec<Atom>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct GlobalDecl {
    pub name: Name,
    pub mutable: bool,
    pub ty: Ty,
    pub value: Option<Ast>,
}

/// A local binding: `let x = …` or `let mut x: T = …`.
#[derive(Clone, PartialEq, Debug)]
pub struct VarDecl {
    pub binder: Atom,
    pub mutable: bool,
    pub ty: Option<Ty>,
    pub value: Ast,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ParamDecl {
    pub binder: Atom,
    pub ty: Ty,
    pub default: Option<Ast>,
}

/// A destructuring binding over a tuple value.
#[derive(Clone, PartialEq, Debug)]
pub struct TupleDecl {
    pub binders: Vec<Atom>,
    pub value: Ast,
}

/// A destructuring binding over the fields of a struct value.
#[derive(Clone, PartialEq, Debug)]
pub struct StructLet {
    pub target: Name,
    pub binders: Vec<Atom>,
    pub value: Ast,
}

/// A refutable binding over a single enum variant.
#[derive(Clone, PartialEq, Debug)]
pub struct EnumLet {
    pub target: Name,
    pub variant: Atom,
    pub binders: Vec<Atom>,
    pub value: Ast,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Typealias {
    pub name: Name,
    pub ty: Ty,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Fnalias {
    pub name: Name,
    pub target: Name,
}
