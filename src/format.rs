//! Canonical infix serialization.
//!
//! The printed form is the engine's notion of equality: cycle detection,
//! like-term collection and factor cancellation all compare these strings,
//! so the printer must be total and deterministic. Parenthesization is
//! driven by precedence; a right operand at the parent's precedence is
//! bracketed so re-parsing preserves the association.

use crate::expr::{BinOp, Expr, UnOp};

pub fn format_float(value: f64, prec: usize) -> String {
    format!("{value:.prec$}")
}

pub fn pretty(expr: &Expr) -> String {
    pp(0, expr)
}

fn prec_of(op: BinOp) -> u8 {
    match op {
        BinOp::Add | BinOp::Sub => 1,
        BinOp::Mul | BinOp::Div => 2,
    }
}

fn pp(ctx: u8, expr: &Expr) -> String {
    match expr {
        Expr::Number(n) => n.text.clone(),
        Expr::Ident(name) => name.clone(),
        Expr::Unary(op, inner) => {
            let sign = match op {
                UnOp::Plus => '+',
                UnOp::Minus => '-',
            };
            format!("{sign}{}", pp(3, inner))
        }
        Expr::Binary(op, left, right) => {
            let prec = prec_of(*op);
            let body = format!(
                "{} {} {}",
                pp(prec, left),
                op.symbol(),
                pp(prec + 1, right)
            );
            bracket(ctx, prec, body)
        }
        Expr::Call(head, args) => {
            let rendered: Vec<String> = args.iter().map(|a| pp(0, a)).collect();
            format!("{head}({})", rendered.join(", "))
        }
    }
}

fn bracket(ctx: u8, prec: u8, body: String) -> String {
    if prec < ctx {
        format!("({body})")
    } else {
        body
    }
}
