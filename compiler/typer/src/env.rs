//! The environment: scoped tables for everything nameable.

use crate::package::{
    AbstractDetail, EnumDetail, FnDetail, ImplDetail, PackDetail, StructDetail, TraitDetail,
};
use ast::{Ast, BareAst, FnDecl, Name, Ty, BUILTIN_PACK};
use utility::{Atom, HashMap, HashSet};

/// The environment of a compilation unit.
///
/// `clone` opens a nested scope: the map containers themselves are copied so
/// bindings added in the child cannot leak upward, while weak cells inside the
/// stored types stay shared so that resolutions propagate in both directions.
#[derive(Clone)]
pub struct Env {
    pub(crate) locals: HashMap<Atom, Local>,
    pub(crate) globals: HashMap<Name, Global>,
    pub(crate) structs: HashMap<Name, StructDetail>,
    pub(crate) enums: HashMap<Name, EnumDetail>,
    pub(crate) abstracts: HashMap<Name, AbstractDetail>,
    pub(crate) traits: HashMap<Name, TraitDetail>,
    pub(crate) impls: HashSet<(Name, Name)>,
    pub(crate) fns: HashMap<Name, Ty>,
    pub(crate) kwparams: HashMap<Name, Vec<KwParam>>,
    /// Short names made available by the builtin package, mapped to their qualified forms.
    pub(crate) exposed: HashMap<Name, Name>,
    pub(crate) tyvars: HashMap<Atom, Ty>,
    pub(crate) tyvar_traits: HashMap<Atom, Vec<Name>>,
    pub(crate) curr_fn: Option<Name>,
    pub(crate) curr_for: Option<Ast>,
    pub(crate) ast: Ast,
}

#[derive(Clone)]
pub struct Local {
    pub binder: Atom,
    pub mutable: bool,
    pub ty: Ty,
}

#[derive(Clone)]
pub struct Global {
    pub mutable: bool,
    pub ty: Ty,
}

/// A declared keyword parameter of a function.
#[derive(Clone)]
pub struct KwParam {
    pub binder: Atom,
    pub ty: Ty,
    pub required: bool,
}

impl Env {
    pub fn empty() -> Self {
        Self {
            locals: HashMap::default(),
            globals: HashMap::default(),
            structs: HashMap::default(),
            enums: HashMap::default(),
            abstracts: HashMap::default(),
            traits: HashMap::default(),
            impls: HashSet::default(),
            fns: HashMap::default(),
            kwparams: HashMap::default(),
            exposed: HashMap::default(),
            tyvars: HashMap::default(),
            tyvar_traits: HashMap::default(),
            curr_fn: None,
            curr_for: None,
            ast: Ast::bare(BareAst::Leaf),
        }
    }

    pub fn new(ast: Ast) -> Self {
        let mut env = Self::empty();
        env.bind(ast);
        env
    }

    /// Install the top-level declarations of the tree.
    ///
    /// Repeated binds merge and override; existing entries are kept.
    pub fn bind(&mut self, ast: Ast) {
        match &ast.bare {
            BareAst::Block(block) => {
                for statement in &block.statements {
                    self.bind_decl(statement);
                }
            }
            _ => self.bind_decl(&ast),
        }

        self.ast = ast;
    }

    fn bind_decl(&mut self, decl: &Ast) {
        match &decl.bare {
            BareAst::FnDecl(decl) => self.bind_fn(decl.name, decl),
            BareAst::GlobalDecl(decl) => {
                self.globals.insert(
                    decl.name,
                    Global {
                        mutable: decl.mutable,
                        ty: decl.ty.clone(),
                    },
                );
            }
            BareAst::StructDecl(decl) => {
                self.structs.insert(
                    decl.name,
                    StructDetail {
                        name: decl.name,
                        tyvars: decl.tyvars.clone(),
                        fields: decl
                            .fields
                            .iter()
                            .map(|field| (field.binder, field.ty.clone()))
                            .collect(),
                    },
                );
            }
            BareAst::EnumDecl(decl) => {
                self.enums.insert(
                    decl.name,
                    EnumDetail {
                        name: decl.name,
                        tyvars: decl.tyvars.clone(),
                        variants: decl
                            .variants
                            .iter()
                            .map(|variant| (variant.binder, variant.payload.clone()))
                            .collect(),
                    },
                );
            }
            BareAst::AbstractDecl(decl) => {
                self.abstracts.insert(
                    decl.name,
                    AbstractDetail {
                        name: decl.name,
                        tyvars: decl.tyvars.clone(),
                    },
                );
            }
            BareAst::TraitDecl(decl) => {
                self.traits.insert(
                    decl.name,
                    TraitDetail {
                        name: decl.name,
                        fns: decl
                            .fns
                            .iter()
                            .filter_map(|function| match &function.bare {
                                BareAst::FnDecl(function) => {
                                    Some((function.name.local, fn_signature(function)))
                                }
                                _ => None,
                            })
                            .collect(),
                    },
                );
            }
            BareAst::ImplDecl(decl) => {
                for function in &decl.fns {
                    if let BareAst::FnDecl(function) = &function.bare {
                        let name = Name {
                            pack: decl.target.pack,
                            ns: Some(decl.target.local),
                            local: function.name.local,
                        };
                        self.bind_fn(name, function);
                    }
                }

                if let Some(trait_) = decl.trait_ {
                    self.impls.insert((trait_, decl.target));
                }
            }
            BareAst::Typealias(decl) => {
                if let Some(target) = decl.ty.name() {
                    self.exposed.insert(decl.name, target);
                }
            }
            BareAst::Fnalias(decl) => {
                self.exposed.insert(decl.name, decl.target);
            }
            _ => {}
        }
    }

    fn bind_fn(&mut self, name: Name, decl: &FnDecl) {
        self.fns.insert(name, fn_signature(decl));

        let kwparams: Vec<_> = decl
            .kwparams
            .iter()
            .filter_map(|param| match &param.bare {
                BareAst::ParamDecl(param) => Some(KwParam {
                    binder: param.binder,
                    ty: param.ty.clone(),
                    required: param.default.is_none(),
                }),
                _ => None,
            })
            .collect();

        if !kwparams.is_empty() {
            self.kwparams.insert(name, kwparams);
        }
    }

    /// Ingest a dependency package.
    ///
    /// Declarations are stored under their fully qualified names; the builtin
    /// package additionally exposes every short name.
    pub fn load(&mut self, pack: &PackDetail) {
        let is_builtin = pack.fullname.to_str() == BUILTIN_PACK;

        for detail in &pack.fns {
            let name = detail.name.pack(pack.fullname);
            let ty = match name.ns {
                Some(ns) => detail.ty.resolve_self(Name {
                    pack: Some(pack.fullname),
                    ns: None,
                    local: ns,
                }),
                None => detail.ty.clone(),
            };
            self.fns.insert(name, ty);

            if is_builtin && name.ns.is_none() {
                self.expose(name);
            }
        }

        for detail in &pack.structs {
            let name = detail.name.pack(pack.fullname);
            self.structs.insert(
                name,
                StructDetail {
                    name,
                    ..detail.clone()
                },
            );
            if is_builtin {
                self.expose(name);
            }
        }

        for detail in &pack.enums {
            let name = detail.name.pack(pack.fullname);
            self.enums.insert(
                name,
                EnumDetail {
                    name,
                    ..detail.clone()
                },
            );
            if is_builtin {
                self.expose(name);
            }
        }

        for detail in &pack.traits {
            let name = detail.name.pack(pack.fullname);
            self.traits.insert(
                name,
                TraitDetail {
                    name,
                    ..detail.clone()
                },
            );
            if is_builtin {
                self.expose(name);
            }
        }

        for detail in &pack.abstracts {
            let name = detail.name.pack(pack.fullname);
            self.abstracts.insert(
                name,
                AbstractDetail {
                    name,
                    ..detail.clone()
                },
            );
            if is_builtin {
                self.expose(name);
            }
        }

        for ImplDetail { trait_, target } in &pack.impls {
            self.impls
                .insert((trait_.pack(pack.fullname), target.pack(pack.fullname)));
        }
    }

    fn expose(&mut self, name: Name) {
        self.exposed.insert(Name::standalone(name.local), name);
    }

    /// Chase the alias table to a fixed point.
    ///
    /// Terminates even on cyclic tables (the chain length is bounded by the
    /// table size) and memoizes the result.
    pub fn resolve(&mut self, name: Name) -> Name {
        let mut current = name;
        let mut hops = 0;

        while let Some(&next) = self.exposed.get(&current) {
            if next == current || hops >= self.exposed.len() {
                break;
            }
            current = next;
            hops += 1;
        }

        if hops > 0 {
            self.exposed.insert(name, current);
        }

        current
    }

    /// The signature of a method of the named type, if declared.
    pub fn method_ty(&self, ty_name: Name, method: Atom) -> Option<&Ty> {
        self.fns.get(&Name {
            pack: ty_name.pack,
            ns: Some(ty_name.local),
            local: method,
        })
    }

    /// Resolve a type annotation to its declared form.
    ///
    /// Standalone names check the type variables in scope first, then the
    /// builtin scalars, then the declared structs, enums and abstracts.
    pub fn lookup_type(&mut self, name: Name, arguments: Vec<Ty>) -> Ty {
        let name = self.resolve(name);

        if name.is_standalone() {
            if let Some(ty) = self.tyvars.get(&name.local) {
                return ty.clone();
            }
        }

        if let Some(ty) = Ty::builtin(name) {
            return ty;
        }

        if self.structs.contains_key(&name) {
            Ty::Struct(name, arguments)
        } else if self.enums.contains_key(&name) {
            Ty::Enum(name, arguments)
        } else if self.abstracts.contains_key(&name) {
            Ty::Abstract(name, arguments)
        } else {
            Ty::Unknown
        }
    }

    pub fn add_local(&mut self, binder: Atom, mutable: bool, ty: Ty) {
        self.locals.insert(binder, Local { binder, mutable, ty });
    }

    pub fn get_local(&self, binder: Atom) -> Option<&Local> {
        self.locals.get(&binder)
    }
}

/// The positional signature of a function declaration.
///
/// Parameters without an annotation contribute `Unknown`.
pub(crate) fn fn_signature(decl: &FnDecl) -> Ty {
    Ty::Function(
        decl.params.iter().map(param_ty).collect(),
        Box::new(decl.ret.clone()),
    )
}

pub(crate) fn param_ty(param: &Ast) -> Ty {
    match &param.bare {
        BareAst::ParamDecl(param) => param.ty.clone(),
        _ => Ty::Unknown,
    }
}

#[cfg(test)]
mod test {
    use super::Env;
    use ast::Name;
    use utility::Atom;

    fn aliased(env: &mut Env, from: &str, to: Name) {
        env.exposed.insert(Name::standalone(from), to);
    }

    #[test]
    fn resolution_chases_chains_to_a_fixed_point() {
        let mut env = Env::empty();
        aliased(&mut env, "alpha", Name::standalone("beta"));
        aliased(&mut env, "beta", Name::builtin("gamma"));

        assert_eq!(env.resolve(Name::standalone("alpha")), Name::builtin("gamma"));
    }

    #[test]
    fn resolution_is_idempotent() {
        let mut env = Env::empty();
        aliased(&mut env, "alpha", Name::standalone("beta"));
        aliased(&mut env, "beta", Name::builtin("gamma"));

        let once = env.resolve(Name::standalone("alpha"));
        assert_eq!(env.resolve(once), once);
    }

    #[test]
    fn resolution_terminates_on_cycles() {
        let mut env = Env::empty();
        aliased(&mut env, "alpha", Name::standalone("beta"));
        aliased(&mut env, "beta", Name::standalone("alpha"));

        // any fixed point will do as long as we get out
        let _ = env.resolve(Name::standalone("alpha"));
    }

    #[test]
    fn scopes_do_not_leak_upward() {
        let mut parent = Env::empty();
        parent.add_local(Atom::from("outer"), false, ast::Ty::Int);

        let mut child = parent.clone();
        child.add_local(Atom::from("inner"), false, ast::Ty::Bool);

        assert!(parent.get_local(Atom::from("inner")).is_none());
        assert!(child.get_local(Atom::from("outer")).is_some());
    }
}
