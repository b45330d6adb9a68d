//! The `d(f, x)` rewrite.

use std::io::Write;

use crate::error::Result;
use crate::expr::{heads, BinOp, Expr, UnOp, div, mul, neg, sub};
use crate::matrix::Matrix;
use crate::simplify::Simplifier;
use crate::simplify::views::sum_view;

fn d(body: Expr, var: &str) -> Expr {
    Expr::call(heads::DIFFERENTIAL, vec![body, Expr::ident(var)])
}

pub(crate) fn differentiate_rule(
    sim: &mut Simplifier,
    expr: &Expr,
    out: &mut dyn Write,
) -> Result<Option<Expr>> {
    let Some(args) = expr.as_call(heads::DIFFERENTIAL) else {
        return Ok(None);
    };
    if args.len() != 2 {
        return Err(sim.fail("d expects exactly 2 arguments"));
    }
    let Some(var) = args[1].as_ident() else {
        return Err(sim.fail("second argument of d is not an identifier"));
    };
    if !sim.env().is_variable(var) {
        return Err(sim.fail(format!(
            "second argument of d is not declared as a variable: `{var}`"
        )));
    }
    let var = var.to_string();
    let body = &args[0];

    // d over a matrix distributes to the entries
    if let Some(m) = Matrix::from_expr(sim, body)? {
        let mut result = m.clone();
        for entry in &mut result.entries {
            *entry = d(entry.clone(), &var);
        }
        return Ok(Some(result.to_expr(sim.prec())));
    }

    // d(u ± v ± …, x) → d(u,x) ± d(v,x) ± …
    let terms = sum_view(body);
    if terms.len() > 1 {
        let parts: Vec<Expr> = terms.iter().map(|t| d(t.to_expr(), &var)).collect();
        let combined = sim.sum_of_parts(parts, out)?;
        return Ok(Some(combined));
    }

    // d(±u, x) → ±d(u, x)
    if let Expr::Unary(op, inner) = body {
        let inner_d = d((**inner).clone(), &var);
        return Ok(Some(match op {
            UnOp::Minus => neg(inner_d),
            UnOp::Plus => inner_d,
        }));
    }

    if let Expr::Binary(op, u, v) = body {
        match op {
            // d(u/v, x) → (d(u,x)·v − u·d(v,x)) / (v·v)
            BinOp::Div => {
                let numerator = sub(
                    mul(d((**u).clone(), &var), (**v).clone()),
                    mul((**u).clone(), d((**v).clone(), &var)),
                );
                let denominator = mul((**v).clone(), (**v).clone());
                return Ok(Some(div(numerator, denominator)));
            }
            // d(u·v, x) → d(u,x)·v + u·d(v,x)
            BinOp::Mul => {
                return Ok(Some(crate::expr::add(
                    mul(d((**u).clone(), &var), (**v).clone()),
                    mul((**u).clone(), d((**v).clone(), &var)),
                )));
            }
            _ => {}
        }
    }

    // d(pow(x, k), x) → k · pow(x, k − 1) for constant or literal k
    if let Some(pow_args) = body.as_call(heads::POW) {
        if pow_args.len() != 2 {
            return Err(sim.fail("function pow expects exactly 2 arguments"));
        }
        let base = &pow_args[0];
        let exponent = &pow_args[1];
        if base.as_ident() == Some(var.as_str()) {
            let constant_exp = exponent
                .as_ident()
                .map_or(false, |name| sim.env().is_constant(name))
                || exponent.is_number();
            if constant_exp {
                let lowered = Expr::call(
                    heads::POW,
                    vec![Expr::ident(&var), sub(exponent.clone(), sim.num(1.0))],
                );
                return Ok(Some(mul(exponent.clone(), lowered)));
            }
        }
    }

    if body.is_number() {
        return Ok(Some(sim.num(0.0)));
    }

    if let Some(name) = body.as_ident() {
        if name == var {
            return Ok(Some(sim.num(1.0)));
        }
        if sim.env().is_constant(name) {
            return Ok(Some(sim.num(0.0)));
        }
        // A declared function differentiates to zero unless it depends on
        // the variable; a dependent function stays symbolic.
        if !sim.env().function_depends_on(name, &var) {
            return Ok(Some(sim.num(0.0)));
        }
    }

    Ok(None)
}
