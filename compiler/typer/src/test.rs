use crate::{check, Env, FnDetail, PackDetail, StructDetail, Typer};
use ast::{
    Ast, BareAst, BinOp, Binary, Block, Call, Continue, FnDecl, For, ForIn, IntLit, Name,
    ParamDecl, Range, Return, StructInit, Ty, VarDecl, VarRef, WeakCell,
};
use diagnostics::{error::Health, reporter::Buffer, Reporter};
use span::Span;
use token::IntTy;
use utility::Atom;

fn int(value: i64) -> Ast {
    Ast::bare(IntLit {
        value: value.into(),
        ty: IntTy::DEFAULT,
    })
}

fn double(value: f64) -> Ast {
    Ast::bare(BareAst::DoubleLit(value))
}

fn text(value: &str) -> Ast {
    Ast::bare(BareAst::TextLit(Atom::from(value)))
}

fn reference(name: &str) -> Ast {
    Ast::bare(VarRef {
        name: Name::standalone(name),
    })
}

fn binary(operator: BinOp, left: Ast, right: Ast) -> Ast {
    Ast::bare(Binary {
        operator,
        left,
        right,
    })
}

fn block(statements: Vec<Ast>) -> Ast {
    Ast::bare(Block { statements })
}

fn var(binder: &str, ty: Option<Ty>, value: Ast) -> Ast {
    Ast::bare(VarDecl {
        binder: Atom::from(binder),
        mutable: true,
        ty,
        value,
    })
}

fn param(binder: &str, ty: Ty) -> Ast {
    Ast::bare(ParamDecl {
        binder: Atom::from(binder),
        ty,
        default: None,
    })
}

fn call(callee: &str, arguments: Vec<Ast>) -> Ast {
    Ast::bare(Call {
        callee: reference(callee),
        arguments,
        kwarguments: Vec::new(),
    })
}

fn function(name: &str, params: Vec<Ast>, ret: Ty, body: Ast) -> Ast {
    Ast::bare(FnDecl {
        name: Name::standalone(name),
        tyvars: Vec::new(),
        params,
        kwparams: Vec::new(),
        ret,
        body: Some(body),
    })
}

fn checked(ast: Ast) -> (Ast, Health) {
    check(Env::new(ast), &Reporter::silent())
}

fn untainted(ast: Ast) -> Ast {
    let (tree, health) = checked(ast);
    assert_eq!(health, Health::Untainted);
    tree
}

fn tainted_messages(ast: Ast) -> Vec<String> {
    let buffer = Buffer::default();
    let reporter = Reporter::buffer(buffer.clone());
    let (_, health) = check(Env::new(ast), &reporter);
    assert!(matches!(health, Health::Tainted(_)));

    let diagnostics = buffer.lock().unwrap();
    diagnostics
        .iter()
        .map(|diagnostic| diagnostic.format(None))
        .collect()
}

fn statements(tree: &Ast) -> &[Ast] {
    let BareAst::Block(block) = &tree.bare else {
        panic!("the checked tree is not a block");
    };
    &block.statements
}

/// The standard package every test unit may depend on.
fn builtin_pack() -> PackDetail {
    PackDetail {
        fullname: Atom::from("builtin"),
        referred: Atom::from("builtin"),
        fns: vec![
            FnDetail {
                name: Name::standalone("increment"),
                ty: Ty::Function(vec![Ty::Int], Box::new(Ty::Int)),
            },
            FnDetail {
                name: Name {
                    pack: None,
                    ns: Some(Atom::from("Array")),
                    local: Atom::from("iter"),
                },
                ty: Ty::Function(
                    vec![Ty::Named(Name::standalone("Self"), Vec::new())],
                    Box::new(Ty::Struct(Name::builtin("Iter"), vec![Ty::Text])),
                ),
            },
        ],
        structs: vec![StructDetail {
            name: Name::standalone("Array"),
            tyvars: Vec::new(),
            fields: Vec::new(),
        }],
        enums: Vec::new(),
        traits: Vec::new(),
        abstracts: Vec::new(),
        impls: Vec::new(),
    }
}

#[test]
fn integer_addition_has_type_int() {
    let tree = untainted(block(vec![var(
        "x",
        None,
        binary(BinOp::Add, int(1), int(2)),
    )]));

    let BareAst::VarDecl(decl) = &statements(&tree)[0].bare else {
        unreachable!()
    };
    assert_eq!(decl.value.ty, Ty::Int);
    assert_eq!(statements(&tree)[0].ty, Ty::Unit);
}

#[test]
fn comparisons_have_type_bool() {
    let tree = untainted(block(vec![binary(BinOp::Less, int(1), int(2))]));
    assert_eq!(tree.ty, Ty::Bool);
}

#[test]
fn conflicting_annotation_is_reported() {
    let messages = tainted_messages(block(vec![var("y", Some(Ty::Double), int(1))]));
    assert!(messages
        .iter()
        .any(|message| message.contains("cannot unify ‘Int’ with ‘Double’")));
}

#[test]
fn annotations_resolve_named_builtins() {
    let ast = block(vec![var(
        "z",
        Some(Ty::Named(Name::standalone("Int"), Vec::new())),
        int(1),
    )]);

    let mut env = Env::new(ast);
    env.exposed
        .insert(Name::standalone("Int"), Name::builtin("Int"));

    let (_, health) = check(env, &Reporter::silent());
    assert_eq!(health, Health::Untainted);
}

#[test]
fn unknown_identifiers_are_reported() {
    let messages = tainted_messages(block(vec![reference("ghost")]));
    assert!(messages
        .iter()
        .any(|message| message.contains("unknown identifier ‘ghost’")));
}

#[test]
fn c_style_loop_types_its_induction_variable() {
    let tree = untainted(block(vec![Ast::bare(For {
        starts: vec![var("i", None, int(0))],
        stop: binary(BinOp::Less, reference("i"), int(10)),
        steps: vec![binary(
            BinOp::Assign,
            reference("i"),
            binary(BinOp::Add, reference("i"), int(1)),
        )],
        body: block(Vec::new()),
        exit: None,
    })]));

    let loop_ = &statements(&tree)[0];
    assert_eq!(loop_.ty, Ty::Unit);

    let BareAst::For(for_) = &loop_.bare else {
        unreachable!()
    };
    let BareAst::VarDecl(start) = &for_.starts[0].bare else {
        unreachable!()
    };
    assert_eq!(start.value.ty, Ty::Int);
}

#[test]
fn loop_steps_must_target_induction_variables() {
    let messages = tainted_messages(block(vec![
        var("j", None, int(0)),
        Ast::bare(For {
            starts: vec![var("i", None, int(0))],
            stop: binary(BinOp::Less, reference("i"), int(10)),
            steps: vec![binary(BinOp::Assign, reference("j"), int(1))],
            body: block(Vec::new()),
            exit: None,
        }),
    ]));

    assert!(messages
        .iter()
        .any(|message| message.contains("is not an induction variable")));
}

#[test]
fn for_in_binds_the_element_type_of_iter() {
    let ast = block(vec![
        var(
            "xs",
            None,
            Ast::bare(StructInit {
                target: Name::standalone("Array"),
                fields: Vec::new(),
            }),
        ),
        Ast::bare(ForIn {
            binders: vec![Atom::from("x")],
            iterable: reference("xs"),
            body: block(vec![var("y", None, reference("x"))]),
        }),
    ]);

    let mut env = Env::empty();
    env.load(&builtin_pack());
    env.bind(ast);

    let (tree, health) = check(env, &Reporter::silent());
    assert_eq!(health, Health::Untainted);

    let BareAst::ForIn(for_in) = &statements(&tree)[1].bare else {
        unreachable!()
    };
    let BareAst::Block(body) = &for_in.body.bare else {
        unreachable!()
    };
    let BareAst::VarDecl(binding) = &body.statements[0].bare else {
        unreachable!()
    };
    assert_eq!(binding.value.ty, Ty::Text);
}

#[test]
fn for_in_without_an_iter_method_is_reported() {
    let messages = tainted_messages(block(vec![Ast::bare(ForIn {
        binders: vec![Atom::from("x")],
        iterable: int(5),
        body: block(Vec::new()),
    })]));

    assert!(messages
        .iter()
        .any(|message| message.contains("cannot be iterated")));
}

#[test]
fn calls_unify_arguments_and_yield_the_result() {
    let ast = block(vec![var("n", None, call("increment", vec![int(41)]))]);

    let mut env = Env::empty();
    env.load(&builtin_pack());
    env.bind(ast);

    let (tree, health) = check(env, &Reporter::silent());
    assert_eq!(health, Health::Untainted);

    let BareAst::VarDecl(decl) = &statements(&tree)[0].bare else {
        unreachable!()
    };
    assert_eq!(decl.value.ty, Ty::Int);
}

#[test]
fn call_arity_mismatches_are_reported() {
    let ast = block(vec![call("increment", Vec::new())]);

    let buffer = Buffer::default();
    let reporter = Reporter::buffer(buffer.clone());
    let mut env = Env::empty();
    env.load(&builtin_pack());
    env.bind(ast);

    let (_, health) = check(env, &reporter);
    assert!(matches!(health, Health::Tainted(_)));

    let diagnostics = buffer.lock().unwrap();
    assert!(diagnostics
        .iter()
        .any(|diagnostic| diagnostic
            .format(None)
            .contains("takes 1 argument but 0 were supplied")));
}

#[test]
fn calling_through_a_free_cell_resolves_it_to_a_function() {
    let ast = block(vec![call("callback", vec![int(1)])]);

    let mut env = Env::new(ast);
    env.add_local(Atom::from("callback"), false, Ty::Weak(WeakCell::fresh()));

    let (tree, health) = check(env, &Reporter::silent());
    assert_eq!(health, Health::Untainted);

    let BareAst::Call(call) = &statements(&tree)[0].bare else {
        unreachable!()
    };
    assert_eq!(
        call.callee.ty,
        Ty::Function(vec![Ty::Int], Box::new(Ty::Unknown)),
    );
}

#[test]
fn calling_a_non_function_is_reported() {
    let messages = tainted_messages(block(vec![
        var("one", None, int(1)),
        call("one", Vec::new()),
    ]));

    assert!(messages
        .iter()
        .any(|message| message.contains("cannot call a value of type ‘Int’")));
}

#[test]
fn function_bodies_unify_with_the_return_type() {
    let tree = untainted(block(vec![function(
        "twice",
        vec![param("x", Ty::Int)],
        Ty::Int,
        block(vec![binary(BinOp::Add, reference("x"), reference("x"))]),
    )]));

    let BareAst::FnDecl(decl) = &statements(&tree)[0].bare else {
        unreachable!()
    };
    let body = decl.body.as_ref().unwrap();
    assert_eq!(body.ty, Ty::Int);
}

#[test]
fn conflicting_function_bodies_are_reported() {
    let messages = tainted_messages(block(vec![function(
        "broken",
        Vec::new(),
        Ty::Text,
        block(vec![int(1)]),
    )]));

    assert!(messages
        .iter()
        .any(|message| message.contains("cannot unify")));
}

#[test]
fn returns_unify_with_the_function_signature() {
    untainted(block(vec![function(
        "id",
        vec![param("x", Ty::Int)],
        Ty::Int,
        block(vec![Ast::bare(Return {
            value: Some(reference("x")),
        })]),
    )]));
}

#[test]
fn returns_outside_of_functions_are_reported() {
    let messages = tainted_messages(block(vec![Ast::bare(Return { value: None })]));
    assert!(messages
        .iter()
        .any(|message| message.contains("‘return’ outside of a function")));
}

#[test]
fn continue_values_unify_with_induction_variables() {
    untainted(block(vec![Ast::bare(For {
        starts: vec![var("i", None, int(0))],
        stop: binary(BinOp::Less, reference("i"), int(10)),
        steps: vec![binary(
            BinOp::Assign,
            reference("i"),
            binary(BinOp::Add, reference("i"), int(1)),
        )],
        body: block(vec![Ast::bare(Continue {
            values: vec![int(5)],
        })]),
        exit: None,
    })]));
}

#[test]
fn too_many_continue_values_are_reported() {
    let messages = tainted_messages(block(vec![Ast::bare(For {
        starts: vec![var("i", None, int(0))],
        stop: binary(BinOp::Less, reference("i"), int(10)),
        steps: vec![binary(
            BinOp::Assign,
            reference("i"),
            binary(BinOp::Add, reference("i"), int(1)),
        )],
        body: block(vec![Ast::bare(Continue {
            values: vec![int(1), int(2)],
        })]),
        exit: None,
    })]));

    assert!(messages
        .iter()
        .any(|message| message.contains("declares 1 induction variable")));
}

#[test]
fn continue_outside_of_loops_is_reported() {
    let messages = tainted_messages(block(vec![Ast::bare(Continue { values: Vec::new() })]));
    assert!(messages
        .iter()
        .any(|message| message.contains("‘continue’ outside of a loop")));
}

#[test]
fn ranges_produce_iterators_over_their_endpoint_type() {
    let tree = untainted(block(vec![Ast::new(
        Span::default(),
        BareAst::IncRange(Box::new(Range {
            start: int(1),
            stop: int(10),
        })),
    )]));

    assert_eq!(tree.ty, Ty::Struct(Name::builtin("Iter"), vec![Ty::Int]));
}

#[test]
fn non_integral_range_endpoints_are_reported() {
    let messages = tainted_messages(block(vec![Ast::new(
        Span::default(),
        BareAst::ExcRange(Box::new(Range {
            start: double(1.0),
            stop: double(2.0),
        })),
    )]));

    assert!(messages
        .iter()
        .any(|message| message.contains("range endpoints must be integers")));
}

#[test]
fn keyword_arguments_match_declared_keyword_parameters() {
    let greet = Ast::bare(FnDecl {
        name: Name::standalone("greet"),
        tyvars: Vec::new(),
        params: vec![param("name", Ty::Text)],
        kwparams: vec![Ast::bare(ParamDecl {
            binder: Atom::from("punctuation"),
            ty: Ty::Text,
            default: Some(text("!")),
        })],
        ret: Ty::Unit,
        body: Some(block(Vec::new())),
    });

    untainted(block(vec![
        greet,
        Ast::bare(Call {
            callee: reference("greet"),
            arguments: vec![text("moon")],
            kwarguments: vec![(Atom::from("punctuation"), text("?"))],
        }),
    ]));
}

#[test]
fn unknown_keyword_arguments_are_reported() {
    let greet = Ast::bare(FnDecl {
        name: Name::standalone("greet"),
        tyvars: Vec::new(),
        params: Vec::new(),
        kwparams: vec![Ast::bare(ParamDecl {
            binder: Atom::from("punctuation"),
            ty: Ty::Text,
            default: Some(text("!")),
        })],
        ret: Ty::Unit,
        body: Some(block(Vec::new())),
    });

    let messages = tainted_messages(block(vec![
        greet,
        Ast::bare(Call {
            callee: reference("greet"),
            arguments: Vec::new(),
            kwarguments: vec![(Atom::from("volume"), int(11))],
        }),
    ]));

    assert!(messages
        .iter()
        .any(|message| message.contains("unknown keyword argument ‘volume’")));
}

#[test]
fn missing_required_keyword_arguments_are_reported() {
    let greet = Ast::bare(FnDecl {
        name: Name::standalone("greet"),
        tyvars: Vec::new(),
        params: Vec::new(),
        kwparams: vec![param("punctuation", Ty::Text)],
        ret: Ty::Unit,
        body: Some(block(Vec::new())),
    });

    let messages = tainted_messages(block(vec![greet, call("greet", Vec::new())]));

    assert!(messages
        .iter()
        .any(|message| message.contains("missing required keyword argument ‘punctuation’")));
}

#[test]
fn unsupported_constructs_are_reported_not_fatal() {
    let (tree, health) = checked(block(vec![Ast::bare(ast::Fstr {
        segments: Vec::new(),
    })]));

    assert!(matches!(health, Health::Tainted(_)));
    assert_eq!(tree.ty, Ty::Unknown);
}

#[test]
fn checked_trees_contain_no_weak_cells() {
    fn assert_no_weak(node: &mut Ast) {
        assert!(!contains_weak(&node.ty), "weak cell survived in {:?}", node.ty);
        for child in node.children_mut() {
            assert_no_weak(child);
        }
    }

    fn contains_weak(ty: &Ty) -> bool {
        let found = std::cell::Cell::new(false);
        ty.map(&|ty| {
            if matches!(ty, Ty::Weak(_)) {
                found.set(true);
            }
            ty
        });
        found.get()
    }

    let (mut tree, _) = checked(block(vec![function(
        "weave",
        vec![param("x", Ty::Unknown)],
        Ty::Unknown,
        block(vec![binary(BinOp::Add, reference("x"), int(1))]),
    )]));

    assert_no_weak(&mut tree);
}

#[test]
fn unification_is_symmetric() {
    let reporter = Reporter::silent();

    for (x, y) in [
        (Ty::Int, Ty::Int),
        (
            Ty::Tuple(vec![Ty::Int, Ty::Bool]),
            Ty::Tuple(vec![Ty::Int, Ty::Bool]),
        ),
        (
            Ty::FixedArray(Box::new(Ty::Text)),
            Ty::FixedArray(Box::new(Ty::Text)),
        ),
        (Ty::Option(Box::new(Ty::Char)), Ty::Option(Box::new(Ty::Char))),
    ] {
        let mut left = Typer::new(Env::empty(), &reporter);
        let mut right = Typer::new(Env::empty(), &reporter);
        assert_eq!(
            left.unify(&x, &y, Span::default()),
            right.unify(&y, &x, Span::default()),
        );
    }

    // cells are mutated the same way from either side
    let mut typer = Typer::new(Env::empty(), &reporter);

    let cell = WeakCell::fresh();
    typer.unify(&Ty::Weak(cell.clone()), &Ty::Int, Span::default());
    assert_eq!(cell.resolved(), Ty::Int);

    let cell = WeakCell::fresh();
    typer.unify(&Ty::Int, &Ty::Weak(cell.clone()), Span::default());
    assert_eq!(cell.resolved(), Ty::Int);
}

#[test]
fn aliased_cells_resolve_together() {
    let reporter = Reporter::silent();
    let mut typer = Typer::new(Env::empty(), &reporter);

    let left = WeakCell::fresh();
    let right = WeakCell::fresh();
    typer.unify(
        &Ty::Weak(left.clone()),
        &Ty::Weak(right.clone()),
        Span::default(),
    );
    typer.unify(&Ty::Weak(right.clone()), &Ty::Long, Span::default());

    assert_eq!(left.resolved(), Ty::Long);
    assert_eq!(right.resolved(), Ty::Long);
}

#[test]
fn resolved_cells_reject_conflicting_resolutions() {
    let reporter = Reporter::silent();
    let mut typer = Typer::new(Env::empty(), &reporter);

    let cell = WeakCell::fresh();
    typer.unify(&Ty::Weak(cell.clone()), &Ty::Int, Span::default());
    typer.unify(&Ty::Weak(cell.clone()), &Ty::Bool, Span::default());

    // the first resolution wins, the second only reports
    assert_eq!(cell.resolved(), Ty::Int);
    assert!(matches!(typer.health, Health::Tainted(_)));
}

#[test]
fn tuple_arity_mismatches_are_reported_but_join_the_left() {
    let reporter = Reporter::silent();
    let mut typer = Typer::new(Env::empty(), &reporter);

    let joined = typer.unify(
        &Ty::Tuple(vec![Ty::Int, Ty::Bool]),
        &Ty::Tuple(vec![Ty::Int]),
        Span::default(),
    );

    assert_eq!(joined, Ty::Tuple(vec![Ty::Int, Ty::Bool]));
    assert!(matches!(typer.health, Health::Tainted(_)));
}

#[test]
fn type_variable_bounds_are_checked_against_impls() {
    let reporter = Reporter::silent();
    let printable = Name::builtin("Printable");

    let mut env = Env::empty();
    env.tyvars
        .insert(Atom::from("T"), Ty::Weak(WeakCell::fresh()));
    env.tyvar_traits
        .insert(Atom::from("T"), vec![printable]);

    let mut typer = Typer::new(env, &reporter);
    typer.unify(&Ty::Tyvar(Atom::from("T")), &Ty::Int, Span::default());
    assert!(matches!(typer.health, Health::Tainted(_)));

    let mut env = Env::empty();
    env.tyvars
        .insert(Atom::from("T"), Ty::Weak(WeakCell::fresh()));
    env.tyvar_traits
        .insert(Atom::from("T"), vec![printable]);
    env.impls.insert((printable, Name::builtin("Int")));

    let mut typer = Typer::new(env, &reporter);
    typer.unify(&Ty::Tyvar(Atom::from("T")), &Ty::Int, Span::default());
    assert_eq!(typer.health, Health::Untainted);
}

#[test]
fn unbound_type_variables_are_a_hard_error() {
    let reporter = Reporter::silent();
    let mut typer = Typer::new(Env::empty(), &reporter);

    let joined = typer.unify(&Ty::Tyvar(Atom::from("T")), &Ty::Int, Span::default());
    assert_eq!(joined, Ty::Unknown);
    assert!(matches!(typer.health, Health::Tainted(_)));
}

#[test]
fn structs_unify_with_abstracts_of_the_same_name() {
    let reporter = Reporter::silent();
    let mut typer = Typer::new(Env::empty(), &reporter);

    let name = Name::builtin("Buffer");
    let joined = typer.unify(
        &Ty::Struct(name, vec![Ty::Int]),
        &Ty::Abstract(name, vec![Ty::Int]),
        Span::default(),
    );

    assert_eq!(joined, Ty::Struct(name, vec![Ty::Int]));
    assert_eq!(typer.health, Health::Untainted);
}
