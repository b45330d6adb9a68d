//! Flat views of sum and product subtrees.
//!
//! Rules that reason about arbitrary arity build these on demand and
//! rebuild a binary tree on exit; the views are never stored in the AST.

use crate::expr::{BinOp, Expr, UnOp, add, div, mul, neg};

/// One signed term of a flattened sum.
#[derive(Clone, Debug)]
pub struct SumTerm {
    pub negative: bool,
    pub term: Expr,
}

impl SumTerm {
    pub fn to_expr(&self) -> Expr {
        if self.negative {
            neg(self.term.clone())
        } else {
            self.term.clone()
        }
    }
}

/// Flatten `+`/`-` spines into an ordered term list. A unary minus is kept
/// inside its term; only binary structure is opened.
pub fn sum_view(expr: &Expr) -> Vec<SumTerm> {
    match expr {
        Expr::Binary(op @ (BinOp::Add | BinOp::Sub), left, right) => {
            let mut terms = sum_view(left);
            let mut rest = sum_view(right);
            if *op == BinOp::Sub {
                for t in &mut rest {
                    t.negative = !t.negative;
                }
            }
            terms.append(&mut rest);
            terms
        }
        other => vec![SumTerm {
            negative: false,
            term: other.clone(),
        }],
    }
}

/// Left-associative reconstruction of a term list.
pub fn sum_to_expr(terms: &[SumTerm]) -> Expr {
    let mut iter = terms.iter();
    let first = iter.next().expect("sum view is never empty");
    let mut acc = first.to_expr();
    for t in iter {
        acc = if t.negative {
            Expr::Binary(BinOp::Sub, acc.boxed(), t.term.clone().boxed())
        } else {
            add(acc, t.term.clone())
        };
    }
    acc
}

/// Numerator and denominator factor lists of a product/quotient spine.
#[derive(Clone, Debug, Default)]
pub struct QuoView {
    pub up: Vec<Expr>,
    pub down: Vec<Expr>,
}

pub fn quo_view(expr: &Expr, prec: usize) -> QuoView {
    match expr {
        Expr::Unary(op, inner) => {
            let mut q = quo_view(inner, prec);
            if *op == UnOp::Minus {
                q.up.insert(0, Expr::number(-1.0, prec));
            }
            q
        }
        Expr::Binary(BinOp::Mul, left, right) => {
            let mut x = quo_view(left, prec);
            let mut y = quo_view(right, prec);
            x.up.append(&mut y.up);
            x.down.append(&mut y.down);
            x
        }
        Expr::Binary(BinOp::Div, left, right) => {
            let mut x = quo_view(left, prec);
            let mut y = quo_view(right, prec);
            x.up.append(&mut y.down);
            x.down.append(&mut y.up);
            x
        }
        other => QuoView {
            up: vec![other.clone()],
            down: Vec::new(),
        },
    }
}

impl QuoView {
    pub fn to_expr(&self, prec: usize) -> Expr {
        if self.up.is_empty() && self.down.is_empty() {
            return Expr::number(1.0, prec);
        }
        let upper = match fold_mul(&self.up) {
            Some(u) => u,
            None => Expr::number(1.0, prec),
        };
        match fold_mul(&self.down) {
            Some(downer) => div(upper, downer),
            None => upper,
        }
    }
}

fn fold_mul(factors: &[Expr]) -> Option<Expr> {
    let mut iter = factors.iter().cloned();
    let first = iter.next()?;
    Some(iter.fold(first, mul))
}
