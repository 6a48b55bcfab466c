//! The in-memory interface to the package loader.

use ast::{Name, Ty};
use utility::Atom;

/// A dependency package as handed over by the package loader.
pub struct PackDetail {
    /// The canonical name of the package.
    pub fullname: Atom,
    /// The name the current unit imports the package as.
    pub referred: Atom,
    pub fns: Vec<FnDetail>,
    pub structs: Vec<StructDetail>,
    pub enums: Vec<EnumDetail>,
    pub traits: Vec<TraitDetail>,
    pub abstracts: Vec<AbstractDetail>,
    pub impls: Vec<ImplDetail>,
}

#[derive(Clone)]
pub struct FnDetail {
    pub name: Name,
    pub ty: Ty,
}

#[derive(Clone)]
pub struct StructDetail {
    pub name: Name,
    pub tyvars: Vec<Atom>,
    pub fields: Vec<(Atom, Ty)>,
}

#[derive(Clone)]
pub struct EnumDetail {
    pub name: Name,
    pub tyvars: Vec<Atom>,
    pub variants: Vec<(Atom, Vec<Ty>)>,
}

#[derive(Clone)]
pub struct TraitDetail {
    pub name: Name,
    pub fns: Vec<(Atom, Ty)>,
}

#[derive(Clone)]
pub struct AbstractDetail {
    pub name: Name,
    pub tyvars: Vec<Atom>,
}

#[derive(Clone)]
pub struct ImplDetail {
    pub trait_: Name,
    pub target: Name,
}
