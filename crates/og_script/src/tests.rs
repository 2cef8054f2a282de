use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;

use crate::ast::{BinaryOp, Expr, Literal, LogicalOp, Stmt, UnaryOp};
use crate::{ParseError, Span, parse};

fn ident(name: &str) -> Box<Expr> {
    Box::new(Expr::Ident(String::from(name)))
}

fn number(value: f64) -> Box<Expr> {
    Box::new(Expr::Literal(Literal::Number(value)))
}

fn single_expr(body: &str) -> Expr {
    let program = parse::<&str>(&[], body).unwrap();
    match program.body() {
        [Stmt::Expr(expr)] => expr.clone(),
        other => panic!("expected one expression statement, got {other:?}"),
    }
}

#[test]
fn return_product() {
    for body in ["return a * b;", " return a * b; ", "return  a * b"] {
        let program = parse(&["a", "b"], body).unwrap();
        assert_eq!(
            program.body(),
            [Stmt::Return(Some(Expr::Binary {
                op: BinaryOp::Mul,
                left: ident("a"),
                right: ident("b"),
            }))]
        );
    }
}

#[test]
fn multiplicative_binds_tighter() {
    assert_eq!(
        single_expr("1 + 2 * 3"),
        Expr::Binary {
            op: BinaryOp::Add,
            left: number(1.0),
            right: Box::new(Expr::Binary {
                op: BinaryOp::Mul,
                left: number(2.0),
                right: number(3.0),
            }),
        }
    );
}

#[test]
fn subtraction_is_left_associative() {
    assert_eq!(
        single_expr("a - b - c"),
        Expr::Binary {
            op: BinaryOp::Sub,
            left: Box::new(Expr::Binary {
                op: BinaryOp::Sub,
                left: ident("a"),
                right: ident("b"),
            }),
            right: ident("c"),
        }
    );
}

#[test]
fn exponent_is_right_associative() {
    assert_eq!(
        single_expr("2 ** 3 ** 2"),
        Expr::Binary {
            op: BinaryOp::Pow,
            left: number(2.0),
            right: Box::new(Expr::Binary {
                op: BinaryOp::Pow,
                left: number(3.0),
                right: number(2.0),
            }),
        }
    );
}

#[test]
fn logical_and_unary() {
    assert_eq!(
        single_expr("!a || b ?? c"),
        Expr::Logical {
            op: LogicalOp::Coalesce,
            left: Box::new(Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: ident("a"),
                }),
                right: ident("b"),
            }),
            right: ident("c"),
        }
    );
}

#[test]
fn member_assignment() {
    assert_eq!(
        single_expr("this.total += items[0]"),
        Expr::Assign {
            op: Some(BinaryOp::Add),
            target: Box::new(Expr::Member {
                object: Box::new(Expr::This),
                name: String::from("total"),
            }),
            value: Box::new(Expr::Index {
                object: ident("items"),
                index: number(0.0),
            }),
        }
    );
}

#[test]
fn calls_and_arrays() {
    assert_eq!(
        single_expr("Math.max(1, [x,],)"),
        Expr::Call {
            callee: Box::new(Expr::Member {
                object: ident("Math"),
                name: String::from("max"),
            }),
            args: vec![*number(1.0), Expr::Array(vec![*ident("x")])],
        }
    );
}

#[test]
fn control_flow() {
    let program = parse(
        &["n"],
        "let acc = 0; while (n > 0) { acc += n; n -= 1 } if (acc) return acc; else return -1",
    )
    .unwrap();
    let body = program.body();
    assert_eq!(body.len(), 3);
    assert!(matches!(&body[0], Stmt::Let { name, init: Some(_) } if name == "acc"));
    assert!(matches!(&body[1], Stmt::While { body, .. } if matches!(**body, Stmt::Block(ref b) if b.len() == 2)));
    assert!(matches!(&body[2], Stmt::If { otherwise: Some(_), .. }));
}

#[test]
fn conditional_expression() {
    assert!(matches!(
        single_expr("a ? b : c ? d : e"),
        Expr::Conditional { otherwise, .. } if matches!(*otherwise, Expr::Conditional { .. })
    ));
}

#[test]
fn invalid_assignment_target() {
    let err = parse::<&str>(&[], "1 = 2").unwrap_err();
    assert_eq!(err, ParseError::InvalidAssignment { span: Span::new(0, 1) });
}

#[test]
fn unexpected_token() {
    let err = parse::<&str>(&[], "return (a + ;").unwrap_err();
    assert!(matches!(err, ParseError::Unexpected { expected: "expression", .. }));
}

#[test]
fn unclosed_block() {
    let err = parse::<&str>(&[], "{ let a = 1;").unwrap_err();
    assert_eq!(err, ParseError::UnexpectedEnd { expected: "`}`" });
}

#[test]
fn parameter_validation() {
    assert_eq!(
        parse(&["a", "return"], "").unwrap_err(),
        ParseError::InvalidParameter(String::from("return"))
    );
    assert_eq!(
        parse(&["a", "a"], "").unwrap_err(),
        ParseError::DuplicateParameter(String::from("a"))
    );
    assert_eq!(parse(&[" spaced "], "").unwrap().params(), ["spaced"]);
}

#[test]
fn nesting_limit() {
    let mut body = String::new();
    for _ in 0..crate::MAX_DEPTH + 8 {
        body.push('(');
    }
    body.push('1');
    assert!(matches!(
        parse::<&str>(&[], &body).unwrap_err(),
        ParseError::TooDeep { .. }
    ));
}
