use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use pyx_ir::{Argument, BinaryOp, CompareOp, Expr, Stmt, Target};

fn expr(source: &str) -> Expr {
    match parse(source, "<string>", CompileMode::Eval) {
        Ok(Code {
            body: CodeBody::Expression(expr),
            ..
        }) => expr,
        other => panic!("unexpected parse result for {source:?}: {other:?}"),
    }
}

fn stmts(source: &str) -> Vec<Stmt> {
    match parse(source, "<string>", CompileMode::Exec) {
        Ok(Code {
            body: CodeBody::Statements(body),
            ..
        }) => body,
        other => panic!("unexpected parse result for {source:?}: {other:?}"),
    }
}

fn err(source: &str, mode: CompileMode) -> ParseError {
    match parse(source, "<string>", mode) {
        Err(err) => err,
        Ok(code) => panic!("expected error for {source:?}, got {code:?}"),
    }
}

fn name(n: &str) -> Expr {
    Expr::Name(n.to_string())
}

fn bin(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(
        expr("1 + 2 * 3"),
        bin(
            BinaryOp::Add,
            Expr::Int(1),
            bin(BinaryOp::Mul, Expr::Int(2), Expr::Int(3))
        )
    );
}

#[test]
fn power_is_right_associative_and_binds_tighter_than_unary_minus() {
    assert_eq!(
        expr("-2 ** 3 ** 2"),
        Expr::Unary {
            op: pyx_ir::UnaryOp::Neg,
            operand: Box::new(bin(
                BinaryOp::Pow,
                Expr::Int(2),
                bin(BinaryOp::Pow, Expr::Int(3), Expr::Int(2))
            )),
        }
    );
}

#[test]
fn chained_comparison_with_compound_operators() {
    assert_eq!(
        expr("a < b not in c is not d"),
        Expr::Compare {
            left: Box::new(name("a")),
            ops: vec![
                (CompareOp::Lt, name("b")),
                (CompareOp::NotIn, name("c")),
                (CompareOp::IsNot, name("d")),
            ],
        }
    );
}

#[test]
fn eval_mode_accepts_bare_tuple() {
    assert_eq!(
        expr("1, 'a'"),
        Expr::Tuple(vec![Expr::Int(1), Expr::Str("a".into())])
    );
}

#[test]
fn call_with_all_argument_kinds() {
    assert_eq!(
        expr("f(1, *xs, key=2)"),
        Expr::Call {
            func: Box::new(name("f")),
            args: vec![
                Argument::Positional(Expr::Int(1)),
                Argument::Starred(name("xs")),
                Argument::Keyword("key".into(), Expr::Int(2)),
            ],
        }
    );
}

#[test]
fn generator_argument_becomes_comprehension() {
    let Expr::Call { args, .. } = expr("sum(x for x in xs if x)") else {
        panic!("expected call");
    };
    assert!(matches!(
        args.as_slice(),
        [Argument::Positional(Expr::ListComp { .. })]
    ));
}

#[test]
fn slices() {
    assert_eq!(
        expr("a[1:]"),
        Expr::Subscript {
            value: Box::new(name("a")),
            index: Box::new(Expr::Slice {
                lower: Some(Box::new(Expr::Int(1))),
                upper: None,
                step: None,
            }),
        }
    );
    assert!(matches!(expr("a[::2]"), Expr::Subscript { .. }));
}

#[test]
fn displays() {
    assert_eq!(expr("()"), Expr::Tuple(vec![]));
    assert_eq!(expr("(1,)"), Expr::Tuple(vec![Expr::Int(1)]));
    assert_eq!(expr("(1)"), Expr::Int(1));
    assert_eq!(expr("{}"), Expr::Dict(vec![]));
    assert_eq!(expr("{1}"), Expr::Set(vec![Expr::Int(1)]));
    assert_eq!(
        expr("{'a': 1}"),
        Expr::Dict(vec![(Expr::Str("a".into()), Expr::Int(1))])
    );
    assert_eq!(expr("'a' 'b'"), Expr::Str("ab".into()));
}

#[test]
fn conditional_and_lambda() {
    assert!(matches!(expr("1 if x else 2"), Expr::IfExp { .. }));
    let Expr::Lambda(def) = expr("lambda a, b=2: a + b") else {
        panic!("expected lambda");
    };
    assert_eq!(def.name, "<lambda>");
    assert_eq!(def.params.required(), 1);
    assert!(matches!(def.body.as_slice(), [Stmt::Return(Some(_))]));
}

#[test]
fn assignment_forms() {
    assert_eq!(
        stmts("a = b = 1\n"),
        vec![Stmt::Assign {
            targets: vec![Target::Name("a".into()), Target::Name("b".into())],
            value: Expr::Int(1),
        }]
    );
    assert_eq!(
        stmts("x, y = 1, 2"),
        vec![Stmt::Assign {
            targets: vec![Target::Unpack(vec![
                Target::Name("x".into()),
                Target::Name("y".into())
            ])],
            value: Expr::Tuple(vec![Expr::Int(1), Expr::Int(2)]),
        }]
    );
    assert_eq!(
        stmts("n += 1"),
        vec![Stmt::AugAssign {
            target: Target::Name("n".into()),
            op: BinaryOp::Add,
            value: Expr::Int(1),
        }]
    );
}

#[test]
fn semicolons_split_statements() {
    assert_eq!(stmts("a = 1; b = 2;\n").len(), 2);
}

#[test]
fn compound_statements() {
    let source = "\
def f(x, *rest):
    global total
    for i in range(x):
        if i == 2:
            continue
        elif i > 5:
            break
        else:
            total += i
    else:
        pass
    return total
try:
    f(3)
except ValueError as e:
    raise
else:
    pass
finally:
    print('done')
";
    let body = stmts(source);
    assert_eq!(body.len(), 2);
    let Stmt::FunctionDef(def) = &body[0] else {
        panic!("expected def");
    };
    assert_eq!(def.globals, vec!["total".to_string()]);
    assert_eq!(def.params.varargs.as_deref(), Some("rest"));
    assert!(matches!(&body[1], Stmt::Try { handlers, finalbody, .. }
        if handlers.len() == 1 && finalbody.len() == 1));
}

#[test]
fn inline_block() {
    assert!(matches!(
        stmts("if x: y = 1\n").as_slice(),
        [Stmt::If { body, .. }] if body.len() == 1
    ));
}

#[test]
fn imports() {
    assert_eq!(
        stmts("import os.path as p, sys\nfrom math import (sqrt, pi as PI,)\n"),
        vec![
            Stmt::Import(vec![
                pyx_ir::ImportName {
                    module: "os.path".into(),
                    alias: Some("p".into())
                },
                pyx_ir::ImportName {
                    module: "sys".into(),
                    alias: None
                },
            ]),
            Stmt::ImportFrom {
                module: "math".into(),
                names: vec![("sqrt".into(), None), ("pi".into(), Some("PI".into()))],
            },
        ]
    );
}

#[test]
fn statements_are_syntax_errors_in_eval_mode() {
    let error = err("x = 1", CompileMode::Eval);
    assert_eq!(error.to_string(), "expected end of input, found = (<string>, line 1)");
    assert_eq!(
        err("import math", CompileMode::Eval).kind,
        ParseErrorKind::Expected {
            expected: "an expression",
            found: "import".into()
        }
    );
}

#[test]
fn structural_errors() {
    let cases: &[(&str, ParseErrorKind)] = &[
        ("1 +", ParseErrorKind::InvalidSyntax),
        ("f() = 1", ParseErrorKind::InvalidTarget("function call")),
        ("1 = x", ParseErrorKind::InvalidTarget("literal")),
        ("break", ParseErrorKind::OutsideLoop("break")),
        ("return 1", ParseErrorKind::ReturnOutsideFunction),
        ("while x:\n    def f():\n        break\n", ParseErrorKind::OutsideLoop("break")),
        ("if x:\npass\n", ParseErrorKind::ExpectedIndent),
        ("  x = 1\n", ParseErrorKind::UnexpectedIndent),
        ("def f(a=1, b): pass", ParseErrorKind::DefaultOrdering),
    ];
    for (source, expected) in cases {
        assert_eq!(&err(source, CompileMode::Exec).kind, expected, "source: {source:?}");
    }
}

#[test]
fn lex_errors_carry_filename_and_line() {
    let error = match parse("x = 1\ny = 'oops", "patch.py", CompileMode::Exec) {
        Err(err) => err,
        Ok(code) => panic!("expected error, got {code:?}"),
    };
    assert_eq!(error.line, 2);
    assert_eq!(
        error.to_string(),
        "unterminated string literal (patch.py, line 2)"
    );
}

#[test]
fn deeply_nested_expression_does_not_overflow() {
    let depth = 900;
    let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(expr(&source), Expr::Int(1));
}

#[test]
fn nesting_past_the_cap_is_a_syntax_error() {
    let deep = (MAX_NESTING as usize) * 100;
    let sources = [
        format!("{}1", "-".repeat(deep)),
        format!("{}1", "not ".repeat(deep)),
        format!("{}1{}", "[".repeat(deep), "]".repeat(deep)),
        format!("1{}", " + 1".repeat(deep)),
        format!("1{}", " * 2".repeat(deep)),
        format!("f{}", "()".repeat(deep)),
        format!("x{}", ".y".repeat(deep)),
    ];
    for source in &sources {
        let error = err(source, CompileMode::Eval);
        assert_eq!(error.kind, ParseErrorKind::TooDeeplyNested);
    }
    let levels = MAX_NESTING as usize + 10;
    let blocks: String = (0..levels)
        .map(|level| format!("{}if x:\n", " ".repeat(level)))
        .collect();
    let error = err(&format!("{blocks}{}pass\n", " ".repeat(levels)), CompileMode::Exec);
    assert_eq!(error.kind, ParseErrorKind::TooDeeplyNested);
}

#[test]
fn long_flat_chains_stay_under_the_cap() {
    let source = format!("1{}", " + 1".repeat(500));
    assert!(parse(&source, "<string>", CompileMode::Eval).is_ok());
    let source = format!("{}1", "-".repeat(500));
    assert!(parse(&source, "<string>", CompileMode::Eval).is_ok());
}

proptest! {
    #[test]
    fn sums_parse_left_associative(values in prop::collection::vec(0i64..1000, 2..8)) {
        let source = values.iter().map(ToString::to_string).collect::<Vec<_>>().join(" - ");
        let mut expected = Expr::Int(values[0]);
        for v in &values[1..] {
            expected = bin(BinaryOp::Sub, expected, Expr::Int(*v));
        }
        prop_assert_eq!(expr(&source), expected);
    }
}
