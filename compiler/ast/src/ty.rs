//! The type algebra.

use crate::Name;
use std::{cell::RefCell, fmt, rc::Rc};
use utility::Atom;

/// A type of the surface language.
///
/// `Named` is an unresolved reference to a user-declared type; the environment
/// replaces it by `Struct`, `Enum` or `Abstract` during resolution. `Weak` is
/// an inference metavariable backed by a shared mutable [cell](WeakCell).
#[derive(Clone, PartialEq, Debug)]
pub enum Ty {
    Int,
    Long,
    Float,
    Double,
    Bool,
    Char,
    /// The builtin string type, surfaced as `String`.
    Text,
    Unit,
    Error,
    Unknown,
    Option(Box<Ty>),
    FixedArray(Box<Ty>),
    Tuple(Vec<Ty>),
    Function(Vec<Ty>, Box<Ty>),
    Named(Name, Vec<Ty>),
    Struct(Name, Vec<Ty>),
    Enum(Name, Vec<Ty>),
    Abstract(Name, Vec<Ty>),
    /// A declared type parameter. Its trait bounds live in the environment.
    Tyvar(Atom),
    Weak(WeakCell),
    MayError(Box<Ty>),
    HasError(Box<Ty>, Box<Ty>),
    VirtualBase(Box<Ty>),
}

impl Ty {
    /// Rewrite the type bottom-up.
    ///
    /// The payload of a weak cell is not entered: cells hold either `Unknown`
    /// or an already fully resolved type, and the mapper decides what to do
    /// with the `Weak` node itself.
    pub fn map(&self, mapper: &impl Fn(Ty) -> Ty) -> Ty {
        use Ty::*;

        let ty = match self {
            Option(ty) => Option(Box::new(ty.map(mapper))),
            FixedArray(ty) => FixedArray(Box::new(ty.map(mapper))),
            Tuple(elements) => Tuple(elements.iter().map(|ty| ty.map(mapper)).collect()),
            Function(parameters, result) => Function(
                parameters.iter().map(|ty| ty.map(mapper)).collect(),
                Box::new(result.map(mapper)),
            ),
            Named(name, arguments) => {
                Named(*name, arguments.iter().map(|ty| ty.map(mapper)).collect())
            }
            Struct(name, arguments) => {
                Struct(*name, arguments.iter().map(|ty| ty.map(mapper)).collect())
            }
            Enum(name, arguments) => {
                Enum(*name, arguments.iter().map(|ty| ty.map(mapper)).collect())
            }
            Abstract(name, arguments) => {
                Abstract(*name, arguments.iter().map(|ty| ty.map(mapper)).collect())
            }
            MayError(ty) => MayError(Box::new(ty.map(mapper))),
            HasError(ty, error) => {
                HasError(Box::new(ty.map(mapper)), Box::new(error.map(mapper)))
            }
            VirtualBase(ty) => VirtualBase(Box::new(ty.map(mapper))),
            ty => ty.clone(),
        };

        mapper(ty)
    }

    /// Collapse every reachable weak cell to its current resolution.
    ///
    /// Free cells become `Unknown`.
    pub fn deweak(&self) -> Ty {
        self.map(&|ty| match ty {
            Ty::Weak(cell) => cell.resolved(),
            ty => ty,
        })
    }

    /// Turn every reachable `Unknown` into a fresh weak cell.
    ///
    /// Fresh cells are never shared between calls.
    pub fn weaken(&self) -> Ty {
        self.map(&|ty| match ty {
            Ty::Unknown => Ty::Weak(WeakCell::fresh()),
            ty => ty,
        })
    }

    /// The canonical name of the type, if it has one.
    ///
    /// Builtins live in the builtin package; `Unknown`, type variables,
    /// tuples and functions are nameless.
    pub fn name(&self) -> Option<Name> {
        use Ty::*;

        Some(match self {
            Int => Name::builtin("Int"),
            Long => Name::builtin("Long"),
            Float => Name::builtin("Float"),
            Double => Name::builtin("Double"),
            Bool => Name::builtin("Bool"),
            Char => Name::builtin("Char"),
            Text => Name::builtin("String"),
            Unit => Name::builtin("Unit"),
            Error => Name::builtin("Error"),
            Option(_) => Name::builtin("Option"),
            FixedArray(_) => Name::builtin("FixedArray"),
            Named(name, _) | Struct(name, _) | Enum(name, _) | Abstract(name, _) => *name,
            Weak(cell) => return cell.resolved().name(),
            MayError(ty) | HasError(ty, _) | VirtualBase(ty) => return ty.name(),
            Unknown | Tyvar(_) | Tuple(_) | Function(..) => return None,
        })
    }

    /// Map a resolved builtin name back to its type.
    pub fn builtin(name: Name) -> Option<Ty> {
        if name.pack != Some(Atom::from(crate::BUILTIN_PACK)) || name.ns.is_some() {
            return None;
        }

        Some(match name.local.to_str() {
            "Int" => Ty::Int,
            "Long" => Ty::Long,
            "Float" => Ty::Float,
            "Double" => Ty::Double,
            "Bool" => Ty::Bool,
            "Char" => Ty::Char,
            "String" => Ty::Text,
            "Unit" => Ty::Unit,
            _ => return None,
        })
    }

    /// Rewrite `Self` references into the given namespace.
    ///
    /// Used when loading a method signature into its owning type.
    pub fn resolve_self(&self, ns: Name) -> Ty {
        self.map(&|ty| match ty {
            Ty::Named(name, arguments) if name.is_standalone() && name.local.to_str() == "Self" => {
                Ty::Named(ns, arguments)
            }
            ty => ty,
        })
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Ty::*;

        match self {
            Int => f.write_str("Int"),
            Long => f.write_str("Long"),
            Float => f.write_str("Float"),
            Double => f.write_str("Double"),
            Bool => f.write_str("Bool"),
            Char => f.write_str("Char"),
            Text => f.write_str("String"),
            Unit => f.write_str("Unit"),
            Error => f.write_str("Error"),
            Unknown => f.write_str("_"),
            Option(ty) => write!(f, "Option[{ty}]"),
            FixedArray(ty) => write!(f, "FixedArray[{ty}]"),
            Tuple(elements) => {
                f.write_str("(")?;
                for (index, element) in elements.iter().enumerate() {
                    if index != 0 {
                        f.write_str(", ")?;
                    }
                    element.fmt(f)?;
                }
                f.write_str(")")
            }
            Function(parameters, result) => {
                f.write_str("fn(")?;
                for (index, parameter) in parameters.iter().enumerate() {
                    if index != 0 {
                        f.write_str(", ")?;
                    }
                    parameter.fmt(f)?;
                }
                write!(f, ") -> {result}")
            }
            Named(name, arguments)
            | Struct(name, arguments)
            | Enum(name, arguments)
            | Abstract(name, arguments) => {
                write!(f, "{name}")?;
                if !arguments.is_empty() {
                    f.write_str("[")?;
                    for (index, argument) in arguments.iter().enumerate() {
                        if index != 0 {
                            f.write_str(", ")?;
                        }
                        argument.fmt(f)?;
                    }
                    f.write_str("]")?;
                }
                Ok(())
            }
            Tyvar(binder) => write!(f, "{binder}"),
            Weak(cell) => match cell.resolved() {
                Ty::Unknown => f.write_str("_"),
                ty => ty.fmt(f),
            },
            MayError(ty) => write!(f, "{ty}!"),
            HasError(ty, error) => write!(f, "{ty}!{error}"),
            VirtualBase(ty) => write!(f, "virtual {ty}"),
        }
    }
}

/// A mutable metavariable cell.
///
/// Two cells compare equal if they are the same allocation or if their
/// payloads are structurally equal. Aliasing one free cell to another is done
/// by storing a `Weak` pointing at the alias target; [`Self::resolved`]
/// chases such chains.
#[derive(Clone)]
pub struct WeakCell(Rc<RefCell<Ty>>);

impl WeakCell {
    pub fn fresh() -> Self {
        Self(Rc::new(RefCell::new(Ty::Unknown)))
    }

    pub fn get(&self) -> Ty {
        self.0.borrow().clone()
    }

    /// Resolve the cell. A cell may only ever go from `Unknown` to a resolved type.
    pub fn set(&self, ty: Ty) {
        debug_assert!(!matches!(ty, Ty::Unknown));
        *self.0.borrow_mut() = ty;
    }

    pub fn is_free(&self) -> bool {
        matches!(&*self.0.borrow(), Ty::Unknown)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The fully chased resolution of the cell; `Unknown` if it is free.
    pub fn resolved(&self) -> Ty {
        let payload = self.get();
        match payload {
            Ty::Weak(inner) => inner.resolved(),
            Ty::Unknown => Ty::Unknown,
            ty => ty.deweak(),
        }
    }
}

impl PartialEq for WeakCell {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.resolved() == other.resolved()
    }
}

impl fmt::Debug for WeakCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved() {
            Ty::Unknown => f.write_str("?_"),
            ty => write!(f, "?{ty:?}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Ty, WeakCell};
    use crate::Name;

    #[test]
    fn map_with_the_identity_is_the_identity() {
        let ty = Ty::Function(
            vec![
                Ty::Tuple(vec![Ty::Int, Ty::Text]),
                Ty::Struct(Name::builtin("Iter"), vec![Ty::Option(Box::new(Ty::Bool))]),
            ],
            Box::new(Ty::Unit),
        );

        assert_eq!(ty.map(&|ty| ty), ty);
    }

    #[test]
    fn weaken_produces_fresh_cells() {
        let ty = Ty::Tuple(vec![Ty::Unknown, Ty::Unknown]).weaken();

        let Ty::Tuple(elements) = ty else { unreachable!() };
        let (Ty::Weak(first), Ty::Weak(second)) = (&elements[0], &elements[1]) else {
            unreachable!()
        };

        assert!(first.is_free() && second.is_free());
        assert!(!first.ptr_eq(second));
    }

    #[test]
    fn deweak_chases_alias_chains() {
        let first = WeakCell::fresh();
        let second = WeakCell::fresh();
        second.set(Ty::Weak(first.clone()));
        first.set(Ty::Int);

        let ty = Ty::FixedArray(Box::new(Ty::Weak(second)));
        assert_eq!(ty.deweak(), Ty::FixedArray(Box::new(Ty::Int)));
    }

    #[test]
    fn free_cells_deweak_to_unknown() {
        assert_eq!(Ty::Weak(WeakCell::fresh()).deweak(), Ty::Unknown);
    }

    #[test]
    fn builtin_names_round_trip() {
        for ty in [Ty::Int, Ty::Long, Ty::Double, Ty::Bool, Ty::Char, Ty::Text, Ty::Unit] {
            assert_eq!(Ty::builtin(ty.name().unwrap()), Some(ty));
        }
    }

    #[test]
    fn self_resolution_rewrites_standalone_selves() {
        let ty = Ty::Function(
            vec![Ty::Named(Name::standalone("Self"), Vec::new())],
            Box::new(Ty::Int),
        );
        let array = Name::builtin("Array");

        assert_eq!(
            ty.resolve_self(array),
            Ty::Function(vec![Ty::Named(array, Vec::new())], Box::new(Ty::Int)),
        );
    }
}
