//! Structural rewrite rules: folding, distribution, ordering, powers,
//! unit/zero elimination, division normalization and term collection.
//!
//! Dispatch order is part of the engine contract; `Simplifier::walk` tries
//! these in the order they appear here and rule code may assume earlier
//! rules have already normalized its input.

use std::io::Write;

use num_traits::{One, Signed, Zero};

use crate::error::Result;
use crate::expr::{heads, BinOp, Expr, UnOp, add, div, mul};
use crate::format::pretty;
use crate::simplify::Simplifier;
use crate::simplify::views::{QuoView, SumTerm, quo_view, sum_to_expr, sum_view};

/// Fold literal arithmetic. In a flat sum every numeric term is collected
/// into one; a binary node over two literals is evaluated directly.
/// Division by a literal zero is fatal.
pub(crate) fn fold_constants(sim: &Simplifier, expr: &Expr) -> Result<Option<Expr>> {
    let mut terms = sum_view(expr);
    if terms.len() > 1 {
        let mut total = 0.0f64;
        let mut amount = 0usize;
        let mut i = 0;
        while i < terms.len() {
            let Some(n) = terms[i].term.as_number() else {
                i += 1;
                continue;
            };
            if terms[i].negative {
                total -= n;
            } else {
                total += n;
            }
            if terms.len() == 1 {
                return Ok(Some(sim.num(total)));
            }
            terms.remove(i);
            amount += 1;
        }
        if amount > 1 || (amount == 1 && total.is_zero()) {
            if total.is_zero() {
                return Ok(Some(sum_to_expr(&terms)));
            }
            return Ok(Some(add(sim.num(total), sum_to_expr(&terms))));
        }
        return Ok(None);
    }

    if let Expr::Binary(op, left, right) = expr {
        let (Some(x), Some(y)) = (left.as_number(), right.as_number()) else {
            return Ok(None);
        };
        if *op == BinOp::Div && y.is_zero() {
            return Err(sim.fail("cannot divide by zero"));
        }
        let value = match op {
            BinOp::Add => x + y,
            BinOp::Sub => x - y,
            BinOp::Mul => x * y,
            BinOp::Div => x / y,
        };
        return Ok(Some(sim.num(value)));
    }
    Ok(None)
}

/// Expand a product of multi-term sums: `(a ± b) · (c ± d) · … / q` becomes
/// the sum of all cross products over the common denominator. Each summand
/// and each partial sum is reduced by a nested engine run to bound growth.
pub(crate) fn distribute(
    sim: &mut Simplifier,
    expr: &Expr,
    out: &mut dyn Write,
) -> Result<Option<Expr>> {
    let prec = sim.prec();
    let q = quo_view(expr, prec);
    if q.up.len() < 2 {
        return Ok(None);
    }
    let views: Vec<Vec<SumTerm>> = q.up.iter().map(sum_view).collect();
    if !views.iter().any(|v| v.len() > 1) {
        return Ok(None);
    }

    let size: usize = views.iter().map(|v| v.len()).product();
    let mut results: Vec<Expr> = vec![sim.num(1.0); size];
    let mut repeat = size;
    for terms in &views {
        repeat /= terms.len();
        let mut index = 0;
        for _ in 0..size / (repeat * terms.len()) {
            for term in terms {
                for _ in 0..repeat {
                    let acc = results[index].clone();
                    results[index] = mul(acc, term.to_expr());
                    index += 1;
                }
            }
        }
    }

    let parts: Vec<Expr> = results
        .into_iter()
        .map(|r| {
            QuoView {
                up: vec![r],
                down: q.down.clone(),
            }
            .to_expr(prec)
        })
        .collect();
    let combined = sim.sum_of_parts(parts, out)?;
    Ok(Some(combined))
}

/// The five-stage ordering rule. Within each sum term: (1) declared
/// constants shift left past other factors and sort lexicographically among
/// themselves, (2) numeric factors collapse into one leading factor,
/// (3) a signed numerator moves out of its quotient, (4) signs of
/// non-leading terms merge into the sum, (5) a numeric term swaps to the
/// front of the sum.
pub(crate) fn sort(sim: &Simplifier, expr: &Expr) -> Result<Option<Expr>> {
    let prec = sim.prec();
    let mut terms = sum_view(expr);
    if terms.is_empty() {
        return Ok(None);
    }

    // constants to the left, lexicographic among constants
    {
        let mut any = false;
        for t in &mut terms {
            let mut q = quo_view(&t.term, prec);
            let up_changed = sort_factors(sim, &mut q.up);
            let down_changed = sort_factors(sim, &mut q.down);
            if up_changed || down_changed {
                t.term = q.to_expr(prec);
                any = true;
            }
        }
        if any {
            return Ok(Some(sum_to_expr(&terms)));
        }
    }

    // numeric factors collapse into one leading factor per term
    {
        let mut any = false;
        for t in &mut terms {
            let mut q = quo_view(&t.term, prec);
            let first_number = q.up.first().map_or(false, Expr::is_number);
            let mut product = 1.0f64;
            let mut amount = 0usize;
            q.up.retain(|f| match f.as_number() {
                Some(n) => {
                    product *= n;
                    amount += 1;
                    false
                }
                None => true,
            });
            // a zero denominator is left in place for the fatal
            // division-by-zero check
            q.down.retain(|f| match f.as_number() {
                Some(n) if !n.is_zero() => {
                    product /= n;
                    amount += 1;
                    false
                }
                _ => true,
            });
            if !product.is_one() {
                q.up.insert(0, sim.num(product));
            }
            if amount > 1 || (amount == 1 && !first_number) {
                t.term = q.to_expr(prec);
                any = true;
            }
        }
        if any {
            return Ok(Some(sum_to_expr(&terms)));
        }
    }

    // a signed numerator moves out of its quotient
    {
        let mut any = false;
        for t in &mut terms {
            let replacement = match &t.term {
                Expr::Binary(BinOp::Div, num, den) => match &**num {
                    Expr::Unary(op, inner) => Some(Expr::Unary(
                        *op,
                        div((**inner).clone(), (**den).clone()).boxed(),
                    )),
                    _ => None,
                },
                _ => None,
            };
            if let Some(moved) = replacement {
                t.term = moved;
                any = true;
            }
        }
        if any {
            return Ok(Some(sum_to_expr(&terms)));
        }
    }

    // signs of non-leading terms merge into the sum structure
    if terms.len() > 1 {
        let mut any = false;
        for t in terms.iter_mut().skip(1) {
            let stripped = match &t.term {
                Expr::Unary(op, inner) => Some((*op, (**inner).clone())),
                _ => None,
            };
            if let Some((op, inner)) = stripped {
                if op == UnOp::Minus {
                    t.negative = !t.negative;
                }
                t.term = inner;
                any = true;
            }
        }
        if any {
            return Ok(Some(sum_to_expr(&terms)));
        }
    }

    // a numeric term swaps to the front of the sum
    if let Some(i) = (1..terms.len()).find(|&i| terms[i].term.is_number()) {
        terms.swap(0, i);
        return Ok(Some(sum_to_expr(&terms)));
    }

    Ok(None)
}

/// Bubble declared constants leftwards; numeric factors pin the scan.
fn sort_factors(sim: &Simplifier, factors: &mut [Expr]) -> bool {
    let mut strs: Vec<String> = factors.iter().map(pretty).collect();
    let mut amount = 0usize;
    loop {
        let mut again = false;
        for i in 1..factors.len() {
            if factors[i - 1].is_number() {
                continue;
            }
            if !sortable_constant(sim, &factors[i - 1]) && sortable_constant(sim, &factors[i]) {
                factors.swap(i - 1, i);
                strs.swap(i - 1, i);
                amount += 1;
                again = true;
            }
            if sortable_constant(sim, &factors[i - 1])
                && sortable_constant(sim, &factors[i])
                && strs[i - 1] > strs[i]
            {
                factors.swap(i - 1, i);
                strs.swap(i - 1, i);
                amount += 1;
                again = true;
            }
        }
        if !again {
            break;
        }
    }
    amount > 0
}

fn sortable_constant(sim: &Simplifier, expr: &Expr) -> bool {
    expr.as_ident()
        .map_or(false, |name| sim.env().is_sortable_constant(name))
}

/// Integer-exponent power expansion.
pub(crate) fn expand_pow(
    sim: &mut Simplifier,
    expr: &Expr,
    out: &mut dyn Write,
) -> Result<Option<Expr>> {
    let Some(args) = expr.as_call(heads::POW) else {
        return Ok(None);
    };
    if args.len() != 2 {
        return Err(sim.fail("function pow expects exactly 2 arguments"));
    }
    let base = &args[0];
    let Expr::Number(n) = &args[1] else {
        return Ok(None);
    };
    if n.value != n.value.trunc() {
        return Ok(None);
    }
    let k = n.value as i64;

    if k == 0 {
        return Ok(Some(sim.num(1.0)));
    }
    if k == 1 {
        return Ok(Some(base.clone()));
    }
    if k < 0 {
        let positive = Expr::call(heads::POW, vec![base.clone(), sim.num(-k as f64)]);
        return Ok(Some(div(sim.num(1.0), positive)));
    }
    if k % 2 == 0 {
        let half = Expr::call(heads::POW, vec![base.clone(), sim.num((k / 2) as f64)]);
        let half = sim.run_child(&half, out)?;
        return Ok(Some(mul(half.clone(), half)));
    }
    let rest = Expr::call(heads::POW, vec![base.clone(), sim.num((k - 1) as f64)]);
    Ok(Some(mul(base.clone(), rest)))
}

/// `1 · x → x`, `x / 1 → x`, `x · 0 → 0`; division by a literal zero is
/// fatal.
pub(crate) fn drop_unit(sim: &Simplifier, expr: &Expr) -> Result<Option<Expr>> {
    let Expr::Binary(op, left, right) = expr else {
        return Ok(None);
    };
    match op {
        BinOp::Div => {
            if right.is_one() {
                return Ok(Some((**left).clone()));
            }
            if right.is_zero() {
                return Err(sim.fail("cannot divide by zero"));
            }
        }
        BinOp::Mul => {
            for (side, other) in [(left, right), (right, left)] {
                if side.is_one() {
                    return Ok(Some((**other).clone()));
                }
                if side.is_zero() {
                    return Ok(Some(sim.num(0.0)));
                }
            }
        }
        _ => {}
    }
    Ok(None)
}

/// Division normalization: `a/(b/c) → a·c/b`, `(a/b)/c → a/(b·c)`, with
/// shortcuts when a side is the literal one.
pub(crate) fn normalize_division(expr: &Expr) -> Option<Expr> {
    let Expr::Binary(BinOp::Div, left, right) = expr else {
        return None;
    };

    if let Expr::Binary(BinOp::Div, rx, ry) = &**right {
        if rx.is_one() {
            return Some(mul((**left).clone(), (**ry).clone()));
        }
        if left.is_one() {
            return Some(div((**ry).clone(), (**rx).clone()));
        }
        if ry.is_one() {
            return Some(div((**left).clone(), (**rx).clone()));
        }
        return Some(div(mul((**left).clone(), (**ry).clone()), (**rx).clone()));
    }

    let Expr::Binary(BinOp::Div, lx, ly) = &**left else {
        return None;
    };
    if right.is_one() {
        return Some((**left).clone());
    }
    if ly.is_one() {
        return Some(div((**lx).clone(), (**right).clone()));
    }
    Some(div((**lx).clone(), mul((**ly).clone(), (**right).clone())))
}

/// Flatten-and-collect: merge quotient pairs under a product, distribute a
/// sum numerator over a denominator, cancel syntactically equal factors
/// between numerator and denominator, normalize negative coefficients to
/// subtracted terms, and collect like terms by their printed form.
pub(crate) fn collect(sim: &Simplifier, expr: &Expr) -> Result<Option<Expr>> {
    let prec = sim.prec();

    if let Expr::Binary(BinOp::Mul, left, right) = expr {
        if let Expr::Binary(BinOp::Div, lx, ly) = &**left {
            // (a/b) · (c/d) → (a·c)/(b·d)
            if let Expr::Binary(BinOp::Div, rx, ry) = &**right {
                return Ok(Some(div(
                    mul((**lx).clone(), (**rx).clone()),
                    mul((**ly).clone(), (**ry).clone()),
                )));
            }
            // (a/b) · c → (a·c)/b
            if !matches!(**right, Expr::Binary(..)) {
                return Ok(Some(div(
                    mul((**lx).clone(), (**right).clone()),
                    (**ly).clone(),
                )));
            }
        }
    }

    let q = quo_view(expr, prec);

    // (… · (a ± b) · …) / q  →  (… · a · …)/q ± (… · b · …)/q
    if !q.down.is_empty() && !(q.down.len() == 1 && q.down[0].is_number()) {
        for (ui, factor) in q.up.iter().enumerate() {
            let Expr::Binary(BinOp::Add | BinOp::Sub, x, y) = factor else {
                continue;
            };
            if x.is_number() || y.is_number() {
                continue;
            }
            let parts = sum_view(factor);
            if parts.len() < 2 {
                continue;
            }
            let common: Vec<Expr> = q
                .up
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != ui)
                .map(|(_, f)| f.clone())
                .collect();
            let mut result: Option<Expr> = None;
            for part in &parts {
                let mut up = common.clone();
                up.push(part.to_expr());
                let piece = QuoView {
                    up,
                    down: q.down.clone(),
                }
                .to_expr(prec);
                result = Some(match result {
                    None => piece,
                    Some(acc) => add(acc, piece),
                });
            }
            return Ok(Some(result.expect("sum has at least two parts")));
        }
    }

    // cancel factors appearing on both sides of the quotient
    if !q.up.is_empty() && !q.down.is_empty() {
        let mut q = q.clone();
        let mut up_str: Vec<String> = q.up.iter().map(pretty).collect();
        let mut down_str: Vec<String> = q.down.iter().map(pretty).collect();
        let mut amount = 0usize;
        'again: loop {
            for ui in 0..up_str.len() {
                for di in 0..down_str.len() {
                    if up_str[ui] == down_str[di] {
                        q.up.remove(ui);
                        q.down.remove(di);
                        up_str.remove(ui);
                        down_str.remove(di);
                        amount += 1;
                        continue 'again;
                    }
                }
            }
            break;
        }
        if amount > 0 {
            return Ok(Some(q.to_expr(prec)));
        }
    }

    let mut terms = sum_view(expr);
    if terms.len() > 1 {
        // negative leading coefficients flip the term's sign in the sum
        let mut amount = 0usize;
        for t in terms.iter_mut().skip(1) {
            if let Some(flipped) = strip_negative_coefficient(&t.term, prec) {
                t.negative = !t.negative;
                t.term = flipped;
                amount += 1;
            }
        }
        if amount > 0 {
            return Ok(Some(sum_to_expr(&terms)));
        }

        // like-term collection, keyed on the canonical printed form
        struct Collected {
            coeff: f64,
            key: String,
            core: Expr,
        }
        let mut collected: Vec<Collected> = terms
            .iter()
            .map(|t| {
                let sign = if t.negative { -1.0 } else { 1.0 };
                if let Expr::Binary(BinOp::Mul, x, y) = &t.term {
                    if let Some(n) = x.as_number() {
                        return Collected {
                            coeff: sign * n,
                            key: pretty(y),
                            core: (**y).clone(),
                        };
                    }
                }
                if let Expr::Binary(BinOp::Div, num, den) = &t.term {
                    if let Expr::Binary(BinOp::Mul, ux, uy) = &**num {
                        if let Some(n) = ux.as_number() {
                            let core = div((**uy).clone(), (**den).clone());
                            return Collected {
                                coeff: sign * n,
                                key: pretty(&core),
                                core,
                            };
                        }
                    }
                }
                Collected {
                    coeff: sign,
                    key: pretty(&t.term),
                    core: t.term.clone(),
                }
            })
            .collect();

        let before = collected.len();
        'merge: loop {
            for i in 0..collected.len() {
                for j in 0..i {
                    if collected[i].key == collected[j].key {
                        collected[i].coeff += collected[j].coeff;
                        collected.remove(j);
                        continue 'merge;
                    }
                }
            }
            break;
        }
        if collected.len() < before {
            let rebuilt: Vec<SumTerm> = collected
                .iter()
                .map(|c| {
                    if c.coeff.is_zero() {
                        SumTerm {
                            negative: false,
                            term: sim.num(0.0),
                        }
                    } else if c.coeff.is_negative() {
                        SumTerm {
                            negative: true,
                            term: mul(Expr::number(-c.coeff, prec), c.core.clone()),
                        }
                    } else {
                        SumTerm {
                            negative: false,
                            term: mul(Expr::number(c.coeff, prec), c.core.clone()),
                        }
                    }
                })
                .collect();
            return Ok(Some(sum_to_expr(&rebuilt)));
        }
    }

    Ok(None)
}

/// The positive remainder of a term whose leading numeric coefficient is
/// negative: `-n · t` or `(-n · t) / d` with `n > 0`.
fn strip_negative_coefficient(term: &Expr, prec: usize) -> Option<Expr> {
    if let Expr::Binary(BinOp::Mul, x, y) = term {
        let n = x.as_number()?;
        if !n.is_negative() {
            return None;
        }
        return Some(if (-n).is_one() {
            (**y).clone()
        } else {
            mul(Expr::number(-n, prec), (**y).clone())
        });
    }
    if let Expr::Binary(BinOp::Div, num, den) = term {
        if let Expr::Binary(BinOp::Mul, ux, uy) = &**num {
            let n = ux.as_number()?;
            if !n.is_negative() {
                return None;
            }
            return Some(if (-n).is_one() {
                div((**uy).clone(), (**den).clone())
            } else {
                div(mul(Expr::number(-n, prec), (**uy).clone()), (**den).clone())
            });
        }
    }
    None
}

/// `0 ± x`, `x ± 0`, `x · 0`, `0 / x`.
pub(crate) fn drop_zero(sim: &Simplifier, expr: &Expr) -> Option<Expr> {
    let Expr::Binary(op, left, right) = expr else {
        return None;
    };
    match op {
        BinOp::Add => {
            if left.is_zero() {
                return Some((**right).clone());
            }
            if right.is_zero() {
                return Some((**left).clone());
            }
        }
        BinOp::Sub => {
            if right.is_zero() {
                return Some((**left).clone());
            }
        }
        BinOp::Mul => {
            if left.is_zero() || right.is_zero() {
                return Some(sim.num(0.0));
            }
        }
        BinOp::Div => {
            if left.is_zero() {
                return Some(sim.num(0.0));
            }
        }
    }
    None
}
