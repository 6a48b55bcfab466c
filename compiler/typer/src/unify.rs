//! Structural type unification with in-place updates on weak cells.

use crate::Typer;
use ast::{Name, Ty, WeakCell};
use diagnostics::{Diagnostic, ErrorCode};
use span::Span;
use utility::QuoteExt;

impl Typer<'_> {
    /// Destructively join two types, reporting a mismatch on failure.
    ///
    /// The result is left-biased where the rules leave a choice. Weak cells
    /// are mutated in place; aliasing two free cells makes every future
    /// resolution of one visible through the other.
    pub(crate) fn unify(&mut self, x: &Ty, y: &Ty, span: Span) -> Ty {
        use Ty::*;

        match (x, y) {
            (Weak(a), Weak(b)) => {
                if a.ptr_eq(b) {
                    return Weak(a.clone());
                }

                let left = a.resolved();
                let right = b.resolved();

                match (left, right) {
                    (Ty::Unknown, Ty::Unknown) => {
                        let root = a.root();
                        let other = b.root();
                        if !root.ptr_eq(&other) {
                            other.set(Weak(root.clone()));
                        }
                        Weak(root)
                    }
                    (left, Ty::Unknown) => {
                        b.root().set(left.clone());
                        left
                    }
                    (Ty::Unknown, right) => {
                        a.root().set(right.clone());
                        right
                    }
                    (left, right) => {
                        if left == right {
                            left
                        } else {
                            self.mismatch(&left, &right, span)
                        }
                    }
                }
            }
            (Weak(cell), ty) | (ty, Weak(cell)) => {
                if let Ty::Unknown = ty {
                    // nothing to learn, leave the cell free
                    return Weak(cell.clone());
                }

                let resolved = cell.resolved();
                if let Ty::Unknown = resolved {
                    // the payload keeps sharing any nested cells
                    cell.root().set(ty.clone());
                    ty.clone()
                } else {
                    self.unify(&resolved, ty, span)
                }
            }

            (Error, ty) | (ty, Error) => ty.clone(),

            (Int, Int)
            | (Long, Long)
            | (Float, Float)
            | (Double, Double)
            | (Bool, Bool)
            | (Char, Char)
            | (Text, Text)
            | (Unit, Unit)
            | (Unknown, Unknown) => x.clone(),

            (Tuple(left), Tuple(right)) => {
                if left.len() != right.len() {
                    self.report(
                        Diagnostic::error()
                            .code(ErrorCode::E032)
                            .message(format!(
                                "cannot unify a tuple of {} elements with one of {}",
                                left.len(),
                                right.len(),
                            ))
                            .primary_span(span),
                    );
                }

                let mut joined: Vec<_> = left
                    .iter()
                    .zip(right)
                    .map(|(left, right)| self.unify(left, right, span))
                    .collect();
                joined.extend(left.iter().skip(joined.len()).cloned());
                Tuple(joined)
            }

            (Option(left), Option(right)) => {
                Option(Box::new(self.unify(left, right, span)))
            }

            (FixedArray(left), FixedArray(right)) => {
                FixedArray(Box::new(self.unify(left, right, span)))
            }

            (Function(left, left_result), Function(right, right_result)) => {
                if left.len() != right.len() {
                    return self.mismatch(x, y, span);
                }

                Function(
                    left.iter()
                        .zip(right)
                        .map(|(left, right)| self.unify(left, right, span))
                        .collect(),
                    Box::new(self.unify(left_result, right_result, span)),
                )
            }

            (Named(name, arguments), _) => {
                let resolved = self.lookup_named(*name, arguments.clone(), span);
                match resolved {
                    Ty::Unknown => Ty::Unknown,
                    resolved => self.unify(&resolved, y, span),
                }
            }
            (_, Named(name, arguments)) => {
                let resolved = self.lookup_named(*name, arguments.clone(), span);
                match resolved {
                    Ty::Unknown => Ty::Unknown,
                    resolved => self.unify(x, &resolved, span),
                }
            }

            (
                Struct(left, left_arguments) | Abstract(left, left_arguments),
                Struct(right, right_arguments) | Abstract(right, right_arguments),
            ) => {
                let left_name = self.env.resolve(*left);
                let right_name = self.env.resolve(*right);

                if left_name != right_name {
                    return self.mismatch(x, y, span);
                }

                let arguments = left_arguments
                    .iter()
                    .zip(right_arguments)
                    .map(|(left, right)| self.unify(left, right, span))
                    .collect();

                match x {
                    Struct(..) => Struct(left_name, arguments),
                    _ => Abstract(left_name, arguments),
                }
            }

            (Enum(left, left_arguments), Enum(right, right_arguments)) => {
                let left_name = self.env.resolve(*left);
                let right_name = self.env.resolve(*right);

                if left_name != right_name {
                    return self.mismatch(x, y, span);
                }

                Enum(
                    left_name,
                    left_arguments
                        .iter()
                        .zip(right_arguments)
                        .map(|(left, right)| self.unify(left, right, span))
                        .collect(),
                )
            }

            (Tyvar(binder), ty) | (ty, Tyvar(binder)) => {
                let Some(binding) = self.env.tyvars.get(binder).cloned() else {
                    self.report(
                        Diagnostic::error()
                            .code(ErrorCode::E024)
                            .message(format!("unbound type variable {}", binder.quote()))
                            .primary_span(span),
                    );
                    return Ty::Unknown;
                };

                let joined = self.unify(&binding, ty, span);
                self.check_bounds(*binder, &joined, span);
                joined
            }

            (MayError(left), MayError(right)) => {
                MayError(Box::new(self.unify(left, right, span)))
            }
            (HasError(left, left_error), HasError(right, right_error)) => HasError(
                Box::new(self.unify(left, right, span)),
                Box::new(self.unify(left_error, right_error, span)),
            ),
            (VirtualBase(left), VirtualBase(right)) => {
                VirtualBase(Box::new(self.unify(left, right, span)))
            }

            _ => self.mismatch(x, y, span),
        }
    }

    /// Resolve a `Named` reference, reporting unknown types.
    fn lookup_named(&mut self, name: Name, arguments: Vec<Ty>, span: Span) -> Ty {
        match self.env.lookup_type(name, arguments) {
            Ty::Unknown => {
                self.report(
                    Diagnostic::error()
                        .code(ErrorCode::E022)
                        .message(format!("unknown type {}", name.quote()))
                        .primary_span(span),
                );
                Ty::Unknown
            }
            ty => ty,
        }
    }

    /// Verify the recorded trait bounds of a type variable against a concrete binding.
    fn check_bounds(&mut self, binder: utility::Atom, ty: &Ty, span: Span) {
        let Some(bounds) = self.env.tyvar_traits.get(&binder).cloned() else {
            return;
        };
        let Some(name) = ty.deweak().name() else {
            return;
        };

        for bound in bounds {
            if !self.env.impls.contains(&(bound, name)) {
                self.report(
                    Diagnostic::error()
                        .code(ErrorCode::E036)
                        .message(format!(
                            "{} does not implement {}",
                            name.quote(),
                            bound.quote(),
                        ))
                        .primary_span(span),
                );
            }
        }
    }

    pub(crate) fn mismatch(&mut self, x: &Ty, y: &Ty, span: Span) -> Ty {
        self.report(
            Diagnostic::error()
                .code(ErrorCode::E032)
                .message(format!("cannot unify {} with {}", x.quote(), y.quote()))
                .primary_span(span),
        );
        Ty::Unknown
    }
}

/// The root cell of an alias chain.
trait RootExt {
    fn root(&self) -> WeakCell;
}

impl RootExt for WeakCell {
    fn root(&self) -> WeakCell {
        match self.get() {
            Ty::Weak(inner) => inner.root(),
            _ => self.clone(),
        }
    }
}
