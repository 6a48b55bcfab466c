//! The type checker.
//!
//! Inference assigns every visited node a type and keeps going after
//! reporting; [`check`] finalizes the tree by collapsing the weak cells.

use ast::{Ast, BareAst, BinOp, Name, Ty, UnOp, WeakCell};
use diagnostics::{error::Health, Diagnostic, ErrorCode, Reporter};
use span::Span;
use utility::{pluralize, Atom, QuoteExt};

pub use env::{Env, Global, KwParam, Local};
pub use package::{
    AbstractDetail, EnumDetail, FnDetail, ImplDetail, PackDetail, StructDetail, TraitDetail,
};

mod env;
mod package;
mod unify;

#[cfg(test)]
mod test;

/// Infer the types of the environment's bound tree and finalize it.
///
/// All diagnostics are non-fatal: the returned tree is fully typed with
/// `Unknown` in failure-adjacent nodes, and the health tells the driver
/// whether anything was reported.
pub fn check(env: Env, reporter: &Reporter) -> (Ast, Health) {
    Typer::new(env, reporter).check()
}

pub(crate) struct Typer<'a> {
    pub(crate) env: Env,
    reporter: &'a Reporter,
    health: Health,
}

impl<'a> Typer<'a> {
    fn new(env: Env, reporter: &'a Reporter) -> Self {
        Self {
            env,
            reporter,
            health: Health::Untainted,
        }
    }

    fn check(mut self) -> (Ast, Health) {
        let mut ast = std::mem::replace(&mut self.env.ast, Ast::bare(BareAst::Leaf));
        self.infer(&mut ast);
        ast.map_ty(&Ty::deweak);
        (ast, self.health)
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        let error = diagnostic.report(self.reporter);
        self.health.taint(error);
    }

    /// Assign the node its type.
    fn infer(&mut self, x: &mut Ast) -> Ty {
        let span = x.span;
        let kind = x.kind_name();

        let ty = match &mut x.bare {
            BareAst::IntLit(literal) => match literal.ty.len {
                64 => Ty::Long,
                _ => Ty::Int,
            },
            BareAst::DoubleLit(_) => Ty::Double,
            BareAst::FloatLit(_) => Ty::Float,
            BareAst::TextLit(_) => Ty::Text,
            BareAst::BoolLit(_) => Ty::Bool,
            BareAst::CharLit(_) => Ty::Char,
            BareAst::ByteLit(_) => Ty::Int,
            BareAst::ByteTextLit(_) => Ty::FixedArray(Box::new(Ty::Int)),
            BareAst::UnitLit | BareAst::Leaf => Ty::Unit,

            BareAst::Arr(arr) => {
                let element = Ty::Weak(WeakCell::fresh());
                for node in &mut arr.elements {
                    let node_span = node.span;
                    let ty = self.infer(node);
                    self.unify(&element, &ty, node_span);
                }
                Ty::FixedArray(Box::new(element))
            }

            BareAst::Block(block) => {
                let mut ty = Ty::Unit;
                let count = block.statements.len();
                for (position, statement) in block.statements.iter_mut().enumerate() {
                    let statement_ty = self.infer(statement);
                    if position + 1 == count {
                        ty = statement_ty;
                    }
                }
                ty
            }

            BareAst::Binary(binary) => {
                let left = self.infer(&mut binary.left);
                let right = self.infer(&mut binary.right);
                let joined = self.unify(&left, &right, span);

                if binary.operator.is_comparison() {
                    Ty::Bool
                } else if binary.operator == BinOp::Assign {
                    Ty::Unit
                } else {
                    joined
                }
            }

            BareAst::BinaryInplace(binary) => {
                let left = self.infer(&mut binary.left);
                let right = self.infer(&mut binary.right);
                self.unify(&left, &right, span);
                Ty::Unit
            }

            BareAst::Unary(unary) => {
                let operand = self.infer(&mut unary.operand);
                match unary.operator {
                    UnOp::Not => {
                        self.unify(&operand, &Ty::Bool, span);
                        Ty::Bool
                    }
                    UnOp::Negate | UnOp::BitNot => operand,
                }
            }

            BareAst::VarDecl(decl) => {
                let value_ty = self.infer(&mut decl.value);
                let ty = match &decl.ty {
                    Some(annotation) => self.unify(&value_ty, annotation, span),
                    None => value_ty,
                };
                self.env.add_local(decl.binder, decl.mutable, ty);
                Ty::Unit
            }

            BareAst::TupleDecl(decl) => {
                let value_ty = self.infer(&mut decl.value).deweak();
                let elements = match value_ty {
                    Ty::Tuple(elements) => {
                        if elements.len() != decl.binders.len() {
                            self.report(
                                Diagnostic::error()
                                    .code(ErrorCode::E032)
                                    .message(format!(
                                        "cannot bind {} names to a tuple of {} elements",
                                        decl.binders.len(),
                                        elements.len(),
                                    ))
                                    .primary_span(span),
                            );
                        }
                        elements
                    }
                    ty => {
                        self.report(
                            Diagnostic::error()
                                .code(ErrorCode::E032)
                                .message(format!("cannot destructure {} as a tuple", ty.quote()))
                                .primary_span(span),
                        );
                        Vec::new()
                    }
                };

                for (position, &binder) in decl.binders.iter().enumerate() {
                    let ty = elements.get(position).cloned().unwrap_or(Ty::Unknown);
                    self.env.add_local(binder, false, ty);
                }
                Ty::Unit
            }

            BareAst::GlobalDecl(decl) => {
                let annotation = decl.ty.clone();
                let ty = match &mut decl.value {
                    Some(value) => {
                        let value_ty = self.infer(value);
                        match annotation {
                            Ty::Unknown => value_ty,
                            annotation => self.unify(&value_ty, &annotation, span),
                        }
                    }
                    None => annotation,
                };
                self.env.globals.insert(
                    decl.name,
                    Global {
                        mutable: decl.mutable,
                        ty,
                    },
                );
                Ty::Unit
            }

            BareAst::VarRef(reference) => {
                let name = reference.name;
                let mut ty = None;

                if name.is_standalone() {
                    if let Some(local) = self.env.get_local(name.local) {
                        ty = Some(local.ty.clone());
                    }
                }

                if ty.is_none() {
                    let resolved = self.env.resolve(name);
                    if let Some(signature) = self.env.fns.get(&resolved) {
                        ty = Some(signature.clone());
                    } else if let Some(global) = self.env.globals.get(&resolved) {
                        ty = Some(global.ty.clone());
                    }
                }

                match ty {
                    Some(ty) => ty,
                    None => {
                        self.report(
                            Diagnostic::error()
                                .code(ErrorCode::E021)
                                .message(format!("unknown identifier {}", name.quote()))
                                .primary_span(span),
                        );
                        Ty::Unknown
                    }
                }
            }

            BareAst::If(if_) => {
                let condition_span = if_.condition.span;
                let condition_ty = self.infer(&mut if_.condition);
                self.unify(&condition_ty, &Ty::Bool, condition_span);

                let consequent_ty = self.infer(&mut if_.consequent);
                match &mut if_.alternate {
                    Some(alternate) => {
                        let alternate_ty = self.infer(alternate);
                        self.unify(&consequent_ty, &alternate_ty, span)
                    }
                    None => self.unify(&consequent_ty, &Ty::Unit, span),
                }
            }

            BareAst::FnDecl(decl) => {
                let parent = self.env.clone();
                self.env.curr_fn = Some(decl.name);
                self.env.curr_for = None;

                for tyvar in &decl.tyvars {
                    self.env
                        .tyvars
                        .insert(tyvar.binder, Ty::Weak(WeakCell::fresh()));
                    self.env
                        .tyvar_traits
                        .insert(tyvar.binder, tyvar.bounds.clone());
                }

                let signature = self
                    .env
                    .fns
                    .get(&decl.name)
                    .cloned()
                    .unwrap_or_else(|| env::fn_signature(decl))
                    .weaken();
                let (parameter_tys, result) = match signature {
                    Ty::Function(parameters, result) => (parameters, *result),
                    _ => (Vec::new(), Ty::Weak(WeakCell::fresh())),
                };

                for (position, parameter) in decl.params.iter_mut().enumerate() {
                    let ty = parameter_tys
                        .get(position)
                        .cloned()
                        .unwrap_or_else(|| Ty::Weak(WeakCell::fresh()));
                    if let BareAst::ParamDecl(parameter) = &parameter.bare {
                        self.env.add_local(parameter.binder, false, ty.clone());
                    }
                    parameter.ty = ty;
                }

                for parameter in &mut decl.kwparams {
                    let mut ty = Ty::Unknown;
                    if let BareAst::ParamDecl(kwparam) = &mut parameter.bare {
                        ty = kwparam.ty.weaken();
                        self.env.add_local(kwparam.binder, false, ty.clone());
                        if let Some(default) = &mut kwparam.default {
                            let default_span = default.span;
                            let default_ty = self.infer(default);
                            self.unify(&default_ty, &ty, default_span);
                        }
                    }
                    parameter.ty = ty;
                }

                let (body_ty, body_span) = match &mut decl.body {
                    Some(body) => (self.infer(body), body.span),
                    None => (Ty::Unit, span),
                };
                self.unify(&result, &body_ty, body_span);

                self.env = parent;
                Ty::Unit
            }

            BareAst::ImplDecl(decl) => {
                for function in &mut decl.fns {
                    self.infer(function);
                }
                Ty::Unit
            }

            BareAst::Call(call) => {
                let callee_name = match &call.callee.bare {
                    BareAst::VarRef(reference) => Some(self.env.resolve(reference.name)),
                    _ => None,
                };
                let callee_ty = self.infer(&mut call.callee);

                let mut argument_tys = Vec::new();
                let mut argument_spans = Vec::new();
                for argument in &mut call.arguments {
                    argument_spans.push(argument.span);
                    argument_tys.push(self.infer(argument));
                }

                self.check_kwarguments(callee_name, &mut call.kwarguments, span);

                match callee_ty {
                    Ty::Function(parameters, result) => {
                        self.apply(&parameters, *result, &argument_tys, &argument_spans, span)
                    }
                    Ty::Weak(cell) => match cell.resolved() {
                        Ty::Unknown => {
                            let result = Ty::Weak(WeakCell::fresh());
                            cell.set(Ty::Function(argument_tys, Box::new(result.clone())));
                            result
                        }
                        Ty::Function(parameters, result) => {
                            self.apply(&parameters, *result, &argument_tys, &argument_spans, span)
                        }
                        ty => self.non_function(&ty, span),
                    },
                    ty => self.non_function(&ty, span),
                }
            }

            BareAst::Return(return_) => {
                let value_ty = match &mut return_.value {
                    Some(value) => self.infer(value),
                    None => Ty::Unit,
                };

                match self.env.curr_fn {
                    Some(name) => {
                        if let Some(Ty::Function(_, result)) = self.env.fns.get(&name).cloned() {
                            self.unify(&result, &value_ty, span);
                        }
                    }
                    None => self.report(
                        Diagnostic::error()
                            .code(ErrorCode::E040)
                            .message("‘return’ outside of a function")
                            .primary_span(span),
                    ),
                }
                Ty::Unit
            }

            BareAst::Break => {
                if self.env.curr_for.is_none() {
                    self.report(
                        Diagnostic::error()
                            .code(ErrorCode::E041)
                            .message("‘break’ outside of a loop")
                            .primary_span(span),
                    );
                }
                Ty::Unit
            }

            BareAst::Continue(continue_) => {
                let mut value_tys = Vec::new();
                let mut value_spans = Vec::new();
                for value in &mut continue_.values {
                    value_spans.push(value.span);
                    value_tys.push(self.infer(value));
                }

                match self.env.curr_for.clone() {
                    None => self.report(
                        Diagnostic::error()
                            .code(ErrorCode::E041)
                            .message("‘continue’ outside of a loop")
                            .primary_span(span),
                    ),
                    Some(loop_) => {
                        let binders = induction_binders(&loop_);
                        if value_tys.len() > binders.len() {
                            self.report(
                                Diagnostic::error()
                                    .code(ErrorCode::E042)
                                    .message(format!(
                                        "‘continue’ carries {} values but the loop declares {} induction {}",
                                        value_tys.len(),
                                        binders.len(),
                                        pluralize!(binders.len(), "variable"),
                                    ))
                                    .primary_span(span),
                            );
                        }

                        for ((value_ty, &value_span), binder) in
                            value_tys.iter().zip(&value_spans).zip(binders)
                        {
                            if let Some(local) = self.env.get_local(binder) {
                                let ty = local.ty.clone();
                                self.unify(value_ty, &ty, value_span);
                            }
                        }
                    }
                }
                Ty::Unit
            }

            BareAst::While(while_) => {
                let parent = self.env.clone();
                self.env.curr_for = Some(Ast::new(span, (**while_).clone()));

                let condition_span = while_.condition.span;
                let condition_ty = self.infer(&mut while_.condition);
                self.unify(&condition_ty, &Ty::Bool, condition_span);

                let body_span = while_.body.span;
                let body_ty = self.infer(&mut while_.body);
                self.unify(&body_ty, &Ty::Unit, body_span);

                self.env = parent;
                Ty::Unit
            }

            BareAst::For(for_) => {
                let parent = self.env.clone();
                self.env.curr_for = Some(Ast::new(span, (**for_).clone()));

                for start in &mut for_.starts {
                    self.infer(start);
                }

                let binders: Vec<_> = for_
                    .starts
                    .iter()
                    .filter_map(|start| match &start.bare {
                        BareAst::VarDecl(decl) => Some(decl.binder),
                        _ => None,
                    })
                    .collect();

                let stop_span = for_.stop.span;
                let stop_ty = self.infer(&mut for_.stop);
                self.unify(&stop_ty, &Ty::Bool, stop_span);

                for step in &mut for_.steps {
                    let step_span = step.span;
                    match assign_target(step) {
                        Some(target) if binders.contains(&target) => {}
                        target => {
                            let name = target
                                .map_or_else(|| "this step".into(), |name| name.quote());
                            self.report(
                                Diagnostic::error()
                                    .code(ErrorCode::E023)
                                    .message(format!("{name} is not an induction variable"))
                                    .primary_span(step_span),
                            );
                        }
                    }
                    self.infer(step);
                }

                let body_span = for_.body.span;
                let body_ty = self.infer(&mut for_.body);
                self.unify(&body_ty, &Ty::Unit, body_span);

                if let Some(exit) = &mut for_.exit {
                    self.infer(exit);
                }

                self.env = parent;
                Ty::Unit
            }

            BareAst::ForIn(for_in) => {
                let parent = self.env.clone();
                self.env.curr_for = Some(Ast::new(span, (**for_in).clone()));

                let iterable_span = for_in.iterable.span;
                let iterable_ty = self.infer(&mut for_in.iterable).deweak();

                let elements = match for_in.binders.len() {
                    1 => self.iteration_elements(&iterable_ty, "iter", 1, iterable_span),
                    2 => self.iteration_elements(&iterable_ty, "iter2", 2, iterable_span),
                    count => {
                        self.report(
                            Diagnostic::error()
                                .code(ErrorCode::E044)
                                .message(format!(
                                    "a ‘for’-‘in’ loop binds one or two variables, not {count}"
                                ))
                                .primary_span(span),
                        );
                        None
                    }
                };

                for (position, &binder) in for_in.binders.iter().enumerate() {
                    let ty = elements
                        .as_ref()
                        .and_then(|elements| elements.get(position))
                        .map_or(Ty::Unknown, |element| element.weaken());
                    self.env.add_local(binder, false, ty);
                }

                let body_span = for_in.body.span;
                let body_ty = self.infer(&mut for_in.body);
                self.unify(&body_ty, &Ty::Unit, body_span);

                self.env = parent;
                Ty::Unit
            }

            BareAst::Guard(guard) => {
                let condition_span = guard.condition.span;
                let condition_ty = self.infer(&mut guard.condition);
                self.unify(&condition_ty, &Ty::Bool, condition_span);
                self.infer(&mut guard.alternate);
                Ty::Unit
            }

            BareAst::IncRange(range) | BareAst::ExcRange(range) => {
                let start_ty = self.infer(&mut range.start);
                let stop_ty = self.infer(&mut range.stop);
                let joined = self.unify(&start_ty, &stop_ty, span);

                let element = match joined.deweak() {
                    element @ (Ty::Int | Ty::Long) => element,
                    ty => {
                        self.report(
                            Diagnostic::error()
                                .code(ErrorCode::E045)
                                .message(format!(
                                    "range endpoints must be integers, found {}",
                                    ty.quote(),
                                ))
                                .primary_span(span),
                        );
                        Ty::Int
                    }
                };

                Ty::Struct(Name::builtin("Iter"), vec![element])
            }

            BareAst::TupleMake(tuple) => Ty::Tuple(
                tuple
                    .elements
                    .iter_mut()
                    .map(|element| self.infer(element))
                    .collect(),
            ),

            BareAst::TupleAccess(access) => {
                let index = access.index;
                match self.infer(&mut access.tuple).deweak() {
                    Ty::Tuple(elements) => match elements.get(index) {
                        Some(ty) => ty.clone(),
                        None => {
                            self.report(
                                Diagnostic::error()
                                    .code(ErrorCode::E032)
                                    .message(format!(
                                        "no element {index} in a tuple of {}",
                                        elements.len(),
                                    ))
                                    .primary_span(span),
                            );
                            Ty::Unknown
                        }
                    },
                    ty => {
                        self.report(
                            Diagnostic::error()
                                .code(ErrorCode::E032)
                                .message(format!(
                                    "cannot project out of a value of type {}",
                                    ty.quote(),
                                ))
                                .primary_span(span),
                        );
                        Ty::Unknown
                    }
                }
            }

            BareAst::ArrAccess(access) => {
                let base_ty = self.infer(&mut access.base).deweak();
                let index_span = access.index.span;
                let index_ty = self.infer(&mut access.index);
                self.unify(&index_ty, &Ty::Int, index_span);

                match base_ty {
                    Ty::FixedArray(element) => *element,
                    Ty::Text => Ty::Char,
                    ty => {
                        self.report(
                            Diagnostic::error()
                                .code(ErrorCode::E032)
                                .message(format!(
                                    "cannot index into a value of type {}",
                                    ty.quote(),
                                ))
                                .primary_span(span),
                        );
                        Ty::Unknown
                    }
                }
            }

            BareAst::FieldRef(field) => {
                let field_name = field.field;
                match self.infer(&mut field.base).deweak() {
                    Ty::Struct(name, arguments) | Ty::Abstract(name, arguments) => {
                        let resolved = self.env.resolve(name);
                        match self.env.structs.get(&resolved).cloned() {
                            Some(detail) => match detail
                                .fields
                                .iter()
                                .find(|(binder, _)| *binder == field_name)
                            {
                                Some((_, ty)) => substitute(ty, &detail.tyvars, &arguments),
                                None => {
                                    self.report(
                                        Diagnostic::error()
                                            .code(ErrorCode::E021)
                                            .message(format!(
                                                "{} has no field {}",
                                                resolved.quote(),
                                                field_name.quote(),
                                            ))
                                            .primary_span(span),
                                    );
                                    Ty::Unknown
                                }
                            },
                            None => {
                                self.report(
                                    Diagnostic::error()
                                        .code(ErrorCode::E022)
                                        .message(format!("unknown type {}", resolved.quote()))
                                        .primary_span(span),
                                );
                                Ty::Unknown
                            }
                        }
                    }
                    ty => {
                        self.report(
                            Diagnostic::error()
                                .code(ErrorCode::E032)
                                .message(format!(
                                    "cannot access a field of a value of type {}",
                                    ty.quote(),
                                ))
                                .primary_span(span),
                        );
                        Ty::Unknown
                    }
                }
            }

            BareAst::StructInit(init) => 'init: {
                let resolved = self.env.resolve(init.target);
                let Some(detail) = self.env.structs.get(&resolved).cloned() else {
                    for (_, value) in &mut init.fields {
                        self.infer(value);
                    }
                    self.report(
                        Diagnostic::error()
                            .code(ErrorCode::E022)
                            .message(format!("unknown type {}", init.target.quote()))
                            .primary_span(span),
                    );
                    break 'init Ty::Unknown;
                };

                let arguments: Vec<_> = detail
                    .tyvars
                    .iter()
                    .map(|_| Ty::Weak(WeakCell::fresh()))
                    .collect();

                let mut supplied = Vec::new();
                for (binder, value) in &mut init.fields {
                    let value_span = value.span;
                    let value_ty = self.infer(value);
                    match detail.fields.iter().find(|(field, _)| *field == *binder) {
                        Some((_, field_ty)) => {
                            supplied.push(*binder);
                            let expected = substitute(field_ty, &detail.tyvars, &arguments);
                            self.unify(&value_ty, &expected, value_span);
                        }
                        None => self.report(
                            Diagnostic::error()
                                .code(ErrorCode::E021)
                                .message(format!(
                                    "{} has no field {}",
                                    resolved.quote(),
                                    binder.quote(),
                                ))
                                .primary_span(value_span),
                        ),
                    }
                }

                for (field, _) in &detail.fields {
                    if !supplied.contains(field) {
                        self.report(
                            Diagnostic::error()
                                .message(format!("missing field {}", field.quote()))
                                .primary_span(span),
                        );
                    }
                }

                Ty::Struct(resolved, arguments)
            }

            BareAst::EnumConstr(constr) => 'constr: {
                let resolved = self.env.resolve(constr.target);
                let Some(detail) = self.env.enums.get(&resolved).cloned() else {
                    for argument in &mut constr.arguments {
                        self.infer(argument);
                    }
                    self.report(
                        Diagnostic::error()
                            .code(ErrorCode::E022)
                            .message(format!("unknown type {}", constr.target.quote()))
                            .primary_span(span),
                    );
                    break 'constr Ty::Unknown;
                };

                let arguments: Vec<_> = detail
                    .tyvars
                    .iter()
                    .map(|_| Ty::Weak(WeakCell::fresh()))
                    .collect();

                let mut constr_tys = Vec::new();
                let mut constr_spans = Vec::new();
                for argument in &mut constr.arguments {
                    constr_spans.push(argument.span);
                    constr_tys.push(self.infer(argument));
                }

                match detail
                    .variants
                    .iter()
                    .find(|(variant, _)| *variant == constr.variant)
                {
                    Some((_, payload)) => {
                        if payload.len() != constr_tys.len() {
                            self.report(
                                Diagnostic::error()
                                    .code(ErrorCode::E033)
                                    .message(format!(
                                        "variant {} takes {} {} but {} were supplied",
                                        constr.variant.quote(),
                                        payload.len(),
                                        pluralize!(payload.len(), "argument"),
                                        constr_tys.len(),
                                    ))
                                    .primary_span(span),
                            );
                        }

                        for ((constr_ty, &constr_span), expected) in
                            constr_tys.iter().zip(&constr_spans).zip(payload)
                        {
                            let expected = substitute(expected, &detail.tyvars, &arguments);
                            self.unify(constr_ty, &expected, constr_span);
                        }
                    }
                    None => self.report(
                        Diagnostic::error()
                            .code(ErrorCode::E021)
                            .message(format!(
                                "{} has no variant {}",
                                resolved.quote(),
                                constr.variant.quote(),
                            ))
                            .primary_span(span),
                    ),
                }

                Ty::Enum(resolved, arguments)
            }

            BareAst::ParamDecl(decl) => decl.ty.clone(),

            BareAst::StructDecl(_)
            | BareAst::EnumDecl(_)
            | BareAst::AbstractDecl(_)
            | BareAst::TraitDecl(_)
            | BareAst::Typealias(_)
            | BareAst::Fnalias(_) => Ty::Unit,

            BareAst::TestDecl(test) => {
                self.infer(&mut test.body);
                Ty::Unit
            }

            // the body is opaque, the signature of the surrounding function rules
            BareAst::FfiBody(_) => Ty::Unknown,

            BareAst::Match(_)
            | BareAst::Is(_)
            | BareAst::Fstr(_)
            | BareAst::View(_)
            | BareAst::ChainCall(_)
            | BareAst::StructModif(_)
            | BareAst::StructLet(_)
            | BareAst::EnumLet(_) => {
                self.report(
                    Diagnostic::error()
                        .code(ErrorCode::E046)
                        .message(format!("inference not yet supported for a {kind}"))
                        .primary_span(span),
                );
                Ty::Unknown
            }
        };

        x.ty = ty.clone();
        ty
    }

    fn apply(
        &mut self,
        parameters: &[Ty],
        result: Ty,
        argument_tys: &[Ty],
        argument_spans: &[Span],
        span: Span,
    ) -> Ty {
        if parameters.len() != argument_tys.len() {
            self.report(
                Diagnostic::error()
                    .code(ErrorCode::E033)
                    .message(format!(
                        "this function takes {} {} but {} were supplied",
                        parameters.len(),
                        pluralize!(parameters.len(), "argument"),
                        argument_tys.len(),
                    ))
                    .primary_span(span),
            );
        }

        for ((argument, &argument_span), parameter) in
            argument_tys.iter().zip(argument_spans).zip(parameters)
        {
            self.unify(argument, parameter, argument_span);
        }

        result
    }

    fn non_function(&mut self, ty: &Ty, span: Span) -> Ty {
        self.report(
            Diagnostic::error()
                .code(ErrorCode::E034)
                .message(format!("cannot call a value of type {}", ty.quote()))
                .primary_span(span),
        );
        Ty::Unit
    }

    /// Match keyword arguments against the callee's declared keyword parameters.
    fn check_kwarguments(
        &mut self,
        callee: Option<Name>,
        kwarguments: &mut [(Atom, Ast)],
        span: Span,
    ) {
        let declared = callee.and_then(|name| self.env.kwparams.get(&name).cloned());
        let Some(declared) = declared else {
            for (_, value) in kwarguments.iter_mut() {
                self.infer(value);
            }
            if !kwarguments.is_empty() {
                self.report(
                    Diagnostic::error()
                        .code(ErrorCode::E035)
                        .message(
                            "keyword arguments require a function with declared keyword parameters",
                        )
                        .primary_span(span),
                );
            }
            return;
        };

        let mut supplied = Vec::new();
        for (binder, value) in kwarguments.iter_mut() {
            let value_span = value.span;
            let value_ty = self.infer(value);
            match declared.iter().find(|kwparam| kwparam.binder == *binder) {
                Some(kwparam) => {
                    supplied.push(*binder);
                    self.unify(&value_ty, &kwparam.ty, value_span);
                }
                None => self.report(
                    Diagnostic::error()
                        .code(ErrorCode::E035)
                        .message(format!("unknown keyword argument {}", binder.quote()))
                        .primary_span(value_span),
                ),
            }
        }

        for kwparam in &declared {
            if kwparam.required && !supplied.contains(&kwparam.binder) {
                self.report(
                    Diagnostic::error()
                        .code(ErrorCode::E035)
                        .message(format!(
                            "missing required keyword argument {}",
                            kwparam.binder.quote(),
                        ))
                        .primary_span(span),
                );
            }
        }
    }

    /// The element types produced by the iterable's `iter`/`iter2` method.
    fn iteration_elements(
        &mut self,
        iterable: &Ty,
        method: &str,
        count: usize,
        span: Span,
    ) -> Option<Vec<Ty>> {
        let not_iterable = |this: &mut Self| {
            this.report(
                Diagnostic::error()
                    .code(ErrorCode::E043)
                    .message(format!(
                        "a value of type {} cannot be iterated, it needs a suitable {} method",
                        iterable.quote(),
                        method.quote(),
                    ))
                    .primary_span(span),
            );
        };

        let Some(name) = iterable.name() else {
            not_iterable(self);
            return None;
        };
        let Some(signature) = self.env.method_ty(name, Atom::from(method)).cloned() else {
            not_iterable(self);
            return None;
        };
        let Ty::Function(parameters, result) = signature else {
            not_iterable(self);
            return None;
        };
        if parameters.len() != 1 {
            not_iterable(self);
            return None;
        }

        let expected = if count == 1 { "Iter" } else { "Iter2" };
        if let Ty::Struct(result_name, arguments) | Ty::Named(result_name, arguments) =
            result.deweak()
        {
            if self.env.resolve(result_name) == Name::builtin(expected)
                && arguments.len() == count
            {
                return Some(arguments);
            }
        }

        not_iterable(self);
        None
    }
}

/// The induction variables of the loop node stored in the environment.
fn induction_binders(loop_: &Ast) -> Vec<Atom> {
    match &loop_.bare {
        BareAst::For(for_) => for_
            .starts
            .iter()
            .filter_map(|start| match &start.bare {
                BareAst::VarDecl(decl) => Some(decl.binder),
                _ => None,
            })
            .collect(),
        BareAst::ForIn(for_in) => for_in.binders.clone(),
        _ => Vec::new(),
    }
}

/// The variable a loop step assigns to, if it is a plain assignment.
fn assign_target(step: &Ast) -> Option<Atom> {
    let target = match &step.bare {
        BareAst::Binary(binary) if binary.operator == BinOp::Assign => &binary.left,
        BareAst::BinaryInplace(binary) => &binary.left,
        _ => return None,
    };

    match &target.bare {
        BareAst::VarRef(reference) if reference.name.is_standalone() => {
            Some(reference.name.local)
        }
        _ => None,
    }
}

/// Substitute declared type parameters by the given instantiation.
fn substitute(ty: &Ty, tyvars: &[Atom], arguments: &[Ty]) -> Ty {
    let instance = |binder: Atom| {
        tyvars
            .iter()
            .position(|&tyvar| tyvar == binder)
            .map(|position| arguments.get(position).cloned().unwrap_or(Ty::Unknown))
    };

    ty.map(&|ty| match ty {
        Ty::Tyvar(binder) => instance(binder).unwrap_or(Ty::Tyvar(binder)),
        Ty::Named(name, _) if name.is_standalone() => {
            instance(name.local).unwrap_or(ty)
        }
        ty => ty,
    })
}
