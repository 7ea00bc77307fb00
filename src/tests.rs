use logos::Logos;
use pretty_assertions::assert_eq;

use crate::{
    ast::{parse_manager::ParseManager, ASTNode, Value},
    error::ErrorKind,
    eval::{evaluate, Environment, EvalError},
    expr::{ArithOp, Expr, Var},
    lexer::{IntLit, Token},
    request::{bindings, calculate, default_trees, handle, CalcRequest, Limits, RequestError},
    translate::{parse, parse_with_depth, ParseError, MAX_TREE_DEPTH},
};

fn eval_str(text: &str, x: f64, y: f64) -> f64 {
    let tree = parse(text).unwrap_or_else(|e| panic!("{text:?} failed to parse: {e}"));
    evaluate(&tree, &Environment::new(x, y)).unwrap()
}
fn kind_of(text: &str) -> ErrorKind {
    match parse(text) {
        Ok(tree) => panic!("{text:?} parsed to {tree}"),
        Err(e) => e.kind(),
    }
}
fn constant(v: f64) -> Expr {
    Expr::Constant(v)
}
fn var(v: Var) -> Expr {
    Expr::Variable(v)
}

const ALLOWED: &[&str] = &[
    "X",
    "Y",
    "42",
    "3.25",
    "X + Y",
    "X - Y * 2",
    "X / Y",
    "X ** Y",
    "-X",
    "--Y",
    "-(X + Y) ** 2",
    "(X + 1) * (Y - 1) / (X * Y + 0.5)",
    "2 ** -X",
    "1e3 * X + .5 - 2.",
    "((((X))))",
    "X ** 0.5 + Y ** -2.5",
    "0 / 0",
    "X / (Y - Y)",
    "  X*Y  ",
];

// Scenarios ------------------------------------------------

#[test]
fn square_of_x() {
    assert_eq!(eval_str("X**2", 3.0, 0.0), 9.0);
}
#[test]
fn double_of_y() {
    assert_eq!(eval_str("2*Y", 0.0, 5.0), 10.0);
}
#[test]
fn division_by_zero_is_infinite() {
    assert_eq!(eval_str("X/Y", 1.0, 0.0), f64::INFINITY);
}
#[test]
fn negation() {
    assert_eq!(eval_str("-X", 4.0, 0.0), -4.0);
}
#[test]
fn modulo_is_rejected() {
    assert_eq!(kind_of("X % Y"), ErrorKind::DisallowedOperator);
}
#[test]
fn empty_text_is_rejected() {
    assert_eq!(parse(""), Err(ParseError::EmptyExpression));
}
#[test]
fn import_is_not_an_expression() {
    assert_eq!(
        parse("import os"),
        Err(ParseError::UnsupportedNode {
            kind: "Import",
            expr: "import os".to_owned(),
        })
    );
}

// Translator -----------------------------------------------

#[test]
fn builds_restricted_tree() {
    assert_eq!(
        parse("X**2").unwrap(),
        Expr::binary(ArithOp::Pow, var(Var::X), constant(2.0))
    );
    assert_eq!(
        parse("1 + 2 * Y").unwrap(),
        Expr::binary(
            ArithOp::Add,
            constant(1.0),
            Expr::binary(ArithOp::Mul, constant(2.0), var(Var::Y))
        )
    );
    assert_eq!(
        parse("-(X - 1)").unwrap(),
        Expr::negate(Expr::binary(ArithOp::Sub, var(Var::X), constant(1.0)))
    );
}
#[test]
fn whitespace_only_is_empty() {
    for text in [" ", "\t\n", "   \r\n  "] {
        assert_eq!(kind_of(text), ErrorKind::EmptyExpression, "{text:?}");
    }
}
#[test]
fn allowed_corpus_parses_and_evaluates() {
    let envs = [
        Environment::new(0.0, 0.0),
        Environment::new(3.0, -2.0),
        Environment::new(-1.5, 1e10),
        Environment::new(f64::INFINITY, f64::NAN),
    ];
    for text in ALLOWED {
        let tree = parse(text).unwrap_or_else(|e| panic!("{text:?} failed to parse: {e}"));
        for env in &envs {
            assert!(evaluate(&tree, env).is_ok(), "{text:?} with {env:?}");
        }
    }
}
#[test]
fn disallowed_operators() {
    for text in [
        "X % Y",
        "X // Y",
        "X == Y",
        "X != 1",
        "X < Y",
        "X <= Y < 3",
        "X >= 1",
        "X > Y",
        "X & Y",
        "X | Y",
        "X ^ Y",
        "X << 1",
        "X >> 1",
        "X @ Y",
        "X and Y",
        "X or Y",
        "X in Y",
        "X is Y",
        "not X",
        "+X",
        "~X",
        "X + (Y % 2)",
        "-(X // 2)",
    ] {
        assert_eq!(kind_of(text), ErrorKind::DisallowedOperator, "{text:?}");
    }
}
#[test]
fn disallowed_operator_names_the_operator() {
    assert_eq!(
        parse("X // Y"),
        Err(ParseError::DisallowedOperator {
            op: "//",
            expr: "X // Y".to_owned(),
        })
    );
    assert_eq!(
        parse(" not X "),
        Err(ParseError::DisallowedOperator {
            op: "not",
            expr: "not X".to_owned(),
        })
    );
}
#[test]
fn disallowed_variables() {
    for text in ["Z", "x", "y", "X + z", "XY", "X_1", "__builtins__", "2 * Ynot"] {
        assert_eq!(kind_of(text), ErrorKind::DisallowedVariable, "{text:?}");
    }
    assert_eq!(
        parse("X + x"),
        Err(ParseError::DisallowedVariable {
            name: "x".to_owned(),
            expr: "X + x".to_owned(),
        })
    );
}
#[test]
fn non_numeric_constants() {
    for text in ["'abc'", "\"abc\"", "True", "False", "None", "X + 'a'"] {
        assert_eq!(kind_of(text), ErrorKind::InvalidConstant, "{text:?}");
    }
    assert_eq!(
        parse("X * True"),
        Err(ParseError::InvalidConstant {
            found: "True".to_owned(),
            expr: "X * True".to_owned(),
        })
    );
}
#[test]
fn unsupported_nodes_carry_their_kind() {
    for (text, kind) in [
        ("import os", "Import"),
        ("import os.path, sys", "Import"),
        ("from os import path", "ImportFrom"),
        ("X = 1", "Assign"),
        ("X = Y = 2", "Assign"),
        ("f(X)", "Call"),
        ("__import__('os')", "Call"),
        ("X.real", "Attribute"),
        ("X[0]", "Subscript"),
        ("[X, Y]", "List"),
        ("[]", "List"),
        ("(X, Y)", "Tuple"),
        ("X, Y", "Tuple"),
        ("(X,)", "Tuple"),
        ("()", "Tuple"),
        ("lambda: X", "Lambda"),
        ("lambda a, b: a", "Lambda"),
        ("X if Y else 1", "IfExp"),
        ("X; Y", "Module"),
        ("X + f(Y)", "Call"),
    ] {
        match parse(text) {
            Err(ParseError::UnsupportedNode { kind: k, .. }) => assert_eq!(k, kind, "{text:?}"),
            other => panic!("{text:?} gave {other:?}"),
        }
    }
}
#[test]
fn syntax_errors() {
    for text in [
        "X +",
        "(X",
        "X )",
        "X Y",
        "1 2",
        "X $ Y",
        "{X}",
        "007",
        "1__0",
        "0x",
        "X;",
        ";",
        "X;;Y",
        "# only a comment",
        "X if Y",
        "lambda X",
        "import",
        "f(X,",
    ] {
        assert_eq!(kind_of(text), ErrorKind::Syntax, "{text:?}");
    }
}
#[test]
fn operator_is_checked_before_operands() {
    // `%` is reported even though `z` is not an allowed variable either
    assert_eq!(kind_of("z % 2"), ErrorKind::DisallowedOperator);
    assert_eq!(kind_of("z + 2"), ErrorKind::DisallowedVariable);
}
#[test]
fn reparsing_gives_identical_trees() {
    for text in ALLOWED {
        assert_eq!(parse(text), parse(text), "{text:?}");
    }
    for text in ["X % Y", "import os", "Z"] {
        assert_eq!(parse(text), parse(text), "{text:?}");
    }
}
#[test]
fn display_parses_back_to_the_same_tree() {
    for text in ALLOWED {
        let tree = parse(text).unwrap();
        assert_eq!(parse(&tree.to_string()).unwrap(), tree, "{text:?}");
    }
    assert_eq!(parse("X**2").unwrap().to_string(), "(X ** 2.0)");
    assert_eq!(parse("-Y").unwrap().to_string(), "(-Y)");
}

// Parser precedence ----------------------------------------

#[test]
fn precedence_and_associativity() {
    assert_eq!(eval_str("1 + 2 * 3", 0.0, 0.0), 7.0);
    assert_eq!(eval_str("(1 + 2) * 3", 0.0, 0.0), 9.0);
    assert_eq!(eval_str("10 - 4 - 3", 0.0, 0.0), 3.0);
    assert_eq!(eval_str("100 / 10 / 5", 0.0, 0.0), 2.0);
    assert_eq!(eval_str("2 ** 3 ** 2", 0.0, 0.0), 512.0);
    assert_eq!(eval_str("-X ** 2", 3.0, 0.0), -9.0);
    assert_eq!(eval_str("(-X) ** 2", 3.0, 0.0), 9.0);
    assert_eq!(eval_str("2 ** -1", 0.0, 0.0), 0.5);
    assert_eq!(eval_str("2 * -X", 3.0, 0.0), -6.0);
    assert_eq!(eval_str("--X", 3.0, 0.0), 3.0);
    assert_eq!(eval_str("X - -Y", 1.0, 2.0), 3.0);
}
#[test]
fn numeric_literals() {
    assert_eq!(parse("3").unwrap(), constant(3.0));
    assert_eq!(parse("2.5E-3").unwrap(), constant(0.0025));
    assert_eq!(eval_str("1e3 + .5 + 2.", 0.0, 0.0), 1002.5);
    assert_eq!(eval_str("X # trailing comment", 7.0, 0.0), 7.0);
}
#[test]
fn integer_literals_of_any_size_and_radix() {
    assert_eq!(eval_str("99999999999999999999 * X", 1.0, 0.0), 1e20);
    assert_eq!(eval_str("0x10", 0.0, 0.0), 16.0);
    assert_eq!(eval_str("0o17 + 0O1", 0.0, 0.0), 16.0);
    assert_eq!(eval_str("0b101", 0.0, 0.0), 5.0);
    assert_eq!(eval_str("1_000 + 0", 0.0, 0.0), 1000.0);
    assert_eq!(eval_str("1_000.5", 0.0, 0.0), 1000.5);
    assert_eq!(eval_str("1e1_0", 0.0, 0.0), 1e10);
    assert_eq!(eval_str("0_0", 0.0, 0.0), 0.0);
    assert_eq!(
        eval_str("0xFF_FFFF_FFFF_FFFF_FFFF", 0.0, 0.0),
        0xFF_FFFF_FFFF_FFFF_FFFF_u128 as f64
    );
    // more digits than u128 holds
    assert_eq!(
        eval_str(&format!("0x1{}", "0".repeat(40)), 0.0, 0.0),
        2f64.powi(160)
    );
}
#[test]
fn imaginary_literals_are_not_numbers() {
    for text in ["1j", "2.5J", "X * 1e3j", ".5j"] {
        assert_eq!(kind_of(text), ErrorKind::InvalidConstant, "{text:?}");
    }
    assert_eq!(
        parse("1j"),
        Err(ParseError::InvalidConstant {
            found: "1j".to_owned(),
            expr: "1j".to_owned(),
        })
    );
}
#[test]
fn pow_with_x_squared_tree() {
    let tree = parse("-X**2").unwrap();
    assert_eq!(
        tree,
        Expr::negate(Expr::binary(ArithOp::Pow, var(Var::X), constant(2.0)))
    );
}

// Evaluator ------------------------------------------------

#[test]
fn ieee_special_values_are_results() {
    assert_eq!(eval_str("-X/Y", 1.0, 0.0), f64::NEG_INFINITY);
    assert!(eval_str("Y/Y", 0.0, 0.0).is_nan());
    assert!(eval_str("X ** 0.5", -4.0, 0.0).is_nan());
    assert_eq!(eval_str("0 ** -1", 0.0, 0.0), f64::INFINITY);
    assert_eq!(eval_str("X ** 0", f64::NAN, 0.0), 1.0);
}
#[test]
fn evaluation_is_deterministic() {
    let env = Environment::new(-8.0, 3.0);
    for text in ALLOWED.iter().chain(&["X ** (1 / Y)"]) {
        let tree = parse(text).unwrap();
        let first = evaluate(&tree, &env).unwrap();
        let second = evaluate(&tree, &env).unwrap();
        if first.is_nan() {
            assert!(second.is_nan(), "{text:?}");
        } else {
            assert_eq!(first, second, "{text:?}");
        }
    }
}
#[test]
fn missing_binding_is_an_error() {
    let tree = parse("X + Y").unwrap();
    let env = Environment::default().with(Var::X, 1.0);
    let err = evaluate(&tree, &env).unwrap_err();
    assert_eq!(err, EvalError::UnboundVariable(Var::Y));
    assert_eq!(err.kind(), ErrorKind::UnboundVariable);
    // constants need no bindings at all
    assert_eq!(evaluate(&parse("2 ** 10").unwrap(), &Environment::default()), Ok(1024.0));
}
#[test]
fn environment_from_pairs() {
    let env: Environment = [(Var::Y, 2.0), (Var::X, 1.0)].into_iter().collect();
    assert_eq!(env, Environment::new(1.0, 2.0));
    assert_eq!(env.lookup(Var::X), Ok(1.0));
    assert_eq!(env.len(), 2);
}

// Expression tree ------------------------------------------

#[test]
fn tree_helpers() {
    let tree = parse("-(X + 1) * X").unwrap();
    assert_eq!(tree.depth(), 4);
    assert_eq!(tree.variables().into_iter().collect::<Vec<_>>(), vec![Var::X]);
    assert_eq!(parse("7").unwrap().depth(), 1);
    assert!(parse("2 * 3").unwrap().variables().is_empty());

    let drawn = parse("X**2").unwrap().render_tree();
    assert!(drawn.contains("Binary: **"), "{drawn}");
    assert!(drawn.contains('X'), "{drawn}");
    assert!(drawn.contains("2.0"), "{drawn}");
}

// Generic parser -------------------------------------------

#[test]
fn lexes_operators_and_literals() {
    let tokens = Token::lexer("X**2 // 3.5 != 'a'")
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::Ident,
            Token::Pow,
            Token::IntegerLit(IntLit::Small(2)),
            Token::FloorDiv,
            Token::FloatLit(3.5),
            Token::NotEq,
            Token::StringLit,
        ]
    );
}
#[test]
fn generic_tree_keeps_calls() {
    let ast = ParseManager::from_source("f(X, 1)").parse().unwrap();
    let ASTNode::Expr(inner) = ast.root_node().unwrap() else {
        panic!("expected an expression statement, got {ast:?}");
    };
    let ASTNode::Call(callee, args) = &ast[*inner] else {
        panic!("expected a call, got {ast:?}");
    };
    assert_eq!(args.len(), 2);
    assert!(matches!(&ast[*callee], ASTNode::Val(Value::Ident(name)) if name.as_str() == "f"));
    assert!(format!("{ast:?}").contains("Call"));
}
#[test]
fn generic_tree_keeps_dotted_imports() {
    let ast = ParseManager::from_source("import os.path, sys").parse().unwrap();
    let ASTNode::Import(names) = ast.root_node().unwrap() else {
        panic!("expected an import, got {ast:?}");
    };
    let names = names.iter().map(|n| n.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["os.path", "sys"]);
}

// Requests -------------------------------------------------

#[test]
fn default_expressions() {
    let (tree1, tree2) = default_trees().unwrap();
    let env = Environment::new(3.0, 5.0);
    assert_eq!(evaluate(&tree1, &env), Ok(9.0));
    assert_eq!(evaluate(&tree2, &env), Ok(10.0));
}
#[test]
fn blank_request_fields_use_defaults() {
    let request = CalcRequest {
        x: "3".to_owned(),
        y: " 5 ".to_owned(),
        expr1: "  ".to_owned(),
        expr2: String::new(),
    };
    let response = handle(&request, &Limits::default());
    assert!(response.is_ok(), "{response:?}");
    assert_eq!(response.expr1, "X**2");
    assert_eq!(response.expr2, "2*Y");
    assert_eq!(response.results, vec![9.0, 10.0]);
}
#[test]
fn non_numeric_binding_is_reported() {
    let request = CalcRequest {
        x: "three".to_owned(),
        y: "1".to_owned(),
        ..Default::default()
    };
    let response = handle(&request, &Limits::default());
    assert!(response.results.is_empty());
    assert_eq!(response.error_kind, None);
    assert!(response
        .error
        .unwrap()
        .starts_with("enter numeric values for X and Y"));
    assert_eq!(
        bindings("1", "").unwrap_err(),
        RequestError::InvalidNumber {
            var: Var::Y,
            value: String::new(),
        }
    );
}
#[test]
fn bindings_accept_float_syntax() {
    let env = bindings(" 2.5 ", "-inf").unwrap();
    assert_eq!(env.lookup(Var::X), Ok(2.5));
    assert_eq!(env.lookup(Var::Y), Ok(f64::NEG_INFINITY));
    assert!(bindings("1e3", "NaN").unwrap().lookup(Var::Y).unwrap().is_nan());
}
#[test]
fn bindings_accept_digit_separators() {
    let env = bindings("1_000", " 2_5.0_1 ").unwrap();
    assert_eq!(env.lookup(Var::X), Ok(1000.0));
    assert_eq!(env.lookup(Var::Y), Ok(25.01));
    for bad in ["_1", "1_", "1__0", "1_.5", "inf_1"] {
        assert!(bindings(bad, "1").is_err(), "{bad:?}");
    }
}
#[test]
fn deep_nesting_is_refused_not_overflowed() {
    let limits = Limits::default();
    let deep = [
        format!("{}X", "-".repeat(999)),
        format!("{}X{}", "(".repeat(499), ")".repeat(499)),
        format!("{}X", "2 ** ".repeat(199)),
    ];
    for expr1 in deep {
        assert!(expr1.len() <= limits.max_expr_len);
        let request = CalcRequest {
            x: "1".to_owned(),
            y: "1".to_owned(),
            expr1,
            ..Default::default()
        };
        let response = handle(&request, &limits);
        assert!(response.results.is_empty());
        assert_eq!(response.error_kind, Some(ErrorKind::Syntax));
    }
}
#[test]
fn nesting_below_the_limit_is_accepted() {
    let request = CalcRequest {
        x: "2".to_owned(),
        y: "1".to_owned(),
        expr1: format!("{}X", "-".repeat(90)),
        expr2: format!("{}Y{}", "(".repeat(90), ")".repeat(90)),
    };
    let response = handle(&request, &Limits::default());
    assert!(response.is_ok(), "{response:?}");
    assert_eq!(response.results, vec![2.0, 1.0]);

    let nested = format!("{}X", "-".repeat(150));
    assert_eq!(kind_of(&nested), ErrorKind::Syntax);
    assert_eq!(
        parse_with_depth(&nested, 200).map(|tree| tree.depth()),
        Ok(151)
    );
}
#[test]
fn long_chains_are_bounded_by_tree_depth() {
    // `+` chains fold in a loop, so only the translator sees their depth
    let within = format!("X{}", " + 1".repeat(400));
    assert_eq!(eval_str(&within, 1.0, 0.0), 401.0);

    let beyond = format!("X{}", "+1".repeat(MAX_TREE_DEPTH));
    assert_eq!(kind_of(&beyond), ErrorKind::Syntax);
}
#[test]
fn one_bad_expression_fails_the_whole_request() {
    let request = CalcRequest {
        x: "1".to_owned(),
        y: "2".to_owned(),
        expr1: "X + Y".to_owned(),
        expr2: "X % Y".to_owned(),
    };
    let response = handle(&request, &Limits::default());
    assert!(response.results.is_empty());
    assert_eq!(response.error_kind, Some(ErrorKind::DisallowedOperator));
    assert_eq!(
        response.error.as_deref(),
        Some("error evaluating expressions: operator `%` is not allowed in `X % Y`")
    );
}
#[test]
fn long_expressions_are_refused() {
    let limits = Limits {
        max_expr_len: 8,
        ..Default::default()
    };
    let env = Environment::new(1.0, 1.0);
    assert_eq!(calculate(&["X + Y"], &env, &limits), Ok(vec![2.0]));
    assert_eq!(
        calculate(&["X + Y", "X + Y + X + Y"], &env, &limits),
        Err(RequestError::TooLong { len: 13, limit: 8 })
    );
}
#[test]
fn response_serializes_special_values_as_strings() {
    let request = CalcRequest {
        x: "1".to_owned(),
        y: "0".to_owned(),
        expr1: "X/Y".to_owned(),
        expr2: "-X/Y".to_owned(),
    };
    let json = serde_json::to_value(handle(&request, &Limits::default())).unwrap();
    assert_eq!(json["results"], serde_json::json!(["inf", "-inf"]));
    assert_eq!(json["X"], "1");
    assert_eq!(json["error"], serde_json::Value::Null);

    let request = CalcRequest {
        x: "2".to_owned(),
        y: "3".to_owned(),
        ..Default::default()
    };
    let json = serde_json::to_value(handle(&request, &Limits::default())).unwrap();
    assert_eq!(json["results"], serde_json::json!([4.0, 6.0]));
}
#[test]
fn request_from_json() {
    let request: CalcRequest = serde_json::from_str(r#"{"X": "1.5", "expr2": "Y"}"#).unwrap();
    assert_eq!(
        request,
        CalcRequest {
            x: "1.5".to_owned(),
            y: String::new(),
            expr1: String::new(),
            expr2: "Y".to_owned(),
        }
    );
}
