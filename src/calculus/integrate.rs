//! The `integral(f, x, a, b)` rewrite and the `inject` substitution that
//! applies the fundamental theorem of calculus at the endpoints.

use std::io::Write;

use crate::error::Result;
use crate::expr::{heads, Expr, mul, sub};
use crate::format::pretty;
use crate::matrix::Matrix;
use crate::parser::parse_expr;
use crate::simplify::views::{quo_view, sum_view};
use crate::simplify::{Environment, Simplifier};

fn integral(body: Expr, var: &Expr, begin: &Expr, finish: &Expr) -> Expr {
    Expr::call(
        heads::INTEGRAL,
        vec![body, var.clone(), begin.clone(), finish.clone()],
    )
}

fn inject(body: Expr, var: &Expr, value: &Expr) -> Expr {
    Expr::call(heads::INJECT, vec![body, var.clone(), value.clone()])
}

/// A factor that may be pulled out of an integrand: a literal other than
/// one, a declared constant, `sin`/`cos`/`tan` of such a factor, or a
/// binary node over two such factors. Undeclared identifiers are opaque.
fn constant_like(env: &Environment, expr: &Expr) -> bool {
    if expr.is_number() {
        return !expr.is_one();
    }
    if let Some(name) = expr.as_ident() {
        return env.is_constant(name);
    }
    if let Expr::Call(head, args) = expr {
        return (head == heads::SIN || head == heads::COS || head == heads::TAN)
            && args.len() == 1
            && constant_like(env, &args[0]);
    }
    if let Expr::Binary(_, left, right) = expr {
        return constant_like(env, left) && constant_like(env, right);
    }
    false
}

pub(crate) fn integrate_rule(
    sim: &mut Simplifier,
    expr: &Expr,
    out: &mut dyn Write,
) -> Result<Option<Expr>> {
    let Some(args) = expr.as_call(heads::INTEGRAL) else {
        return Ok(None);
    };
    if args.len() != 4 {
        return Err(sim.fail("integral expects exactly 4 arguments"));
    }
    let (body, var, begin, finish) = (&args[0], &args[1], &args[2], &args[3]);
    let is_declared = var
        .as_ident()
        .map_or(false, |name| sim.env().is_variable(name));
    if !is_declared {
        return Err(sim.fail(format!(
            "variable of integral is not a variable: {}",
            pretty(var)
        )));
    }

    // linearity: integral of a sum is the sum of integrals
    let terms = sum_view(body);
    if terms.len() > 1 {
        let parts: Vec<Expr> = terms
            .iter()
            .map(|t| integral(t.to_expr(), var, begin, finish))
            .collect();
        let combined = sim.sum_of_parts(parts, out)?;
        return Ok(Some(combined));
    }

    // a matrix integrand distributes to the entries
    if let Some(m) = Matrix::from_expr(sim, body)? {
        let mut result = m.clone();
        for entry in &mut result.entries {
            *entry = integral(entry.clone(), var, begin, finish);
        }
        return Ok(Some(result.to_expr(sim.prec())));
    }

    // pull constant-like factors out of the integrand
    {
        let prec = sim.prec();
        let mut q = quo_view(body, prec);
        let mut coeff = sim.num(1.0);
        let mut extracted = false;
        let mut i = 0;
        while i < q.up.len() {
            if constant_like(sim.env(), &q.up[i]) {
                coeff = mul(coeff, q.up.remove(i));
                extracted = true;
                i = 0;
                continue;
            }
            i += 1;
        }
        i = 0;
        while i < q.down.len() {
            if constant_like(sim.env(), &q.down[i]) {
                coeff = mul(coeff, crate::expr::div(sim.num(1.0), q.down.remove(i)));
                extracted = true;
                i = 0;
                continue;
            }
            i += 1;
        }
        if extracted {
            let rest = if q.up.is_empty() && q.down.is_empty() {
                sim.num(1.0)
            } else {
                q.to_expr(prec)
            };
            return Ok(Some(mul(coeff, integral(rest, var, begin, finish))));
        }
    }

    // monomial base case: an integrand that is literally x·x·…·x
    {
        let body_text = pretty(body);
        let var_text = pretty(var);
        let n = body_text.matches(&var_text).count();
        let stripped: String = body_text
            .replace(&var_text, "")
            .chars()
            .filter(|c| !matches!(c, '(' | ')' | '*' | ' '))
            .collect();

        if stripped.is_empty() {
            let power = Expr::call(
                heads::POW,
                vec![var.clone(), sim.num((n + 1) as f64)],
            );
            let antiderivative = crate::expr::div(power, sim.num((n + 1) as f64));
            return Ok(Some(sub(
                inject(antiderivative.clone(), var, finish),
                inject(antiderivative, var, begin),
            )));
        }
        if n == 0 {
            return Ok(Some(mul(body.clone(), sub(finish.clone(), begin.clone()))));
        }
    }

    Ok(None)
}

/// `inject(f, x, v)`: textual substitution of the printed form of `x` by
/// the printed form of `v` in the printed form of `f`, re-parsed. Over a
/// matrix the substitution distributes to the entries.
pub(crate) fn inject_rule(sim: &Simplifier, expr: &Expr) -> Result<Option<Expr>> {
    let Some(args) = expr.as_call(heads::INJECT) else {
        return Ok(None);
    };
    if args.len() != 3 {
        return Err(sim.fail("inject expects exactly 3 arguments"));
    }
    let (body, var, value) = (&args[0], &args[1], &args[2]);

    if let Some(m) = Matrix::from_expr(sim, body)? {
        let mut result = m.clone();
        for entry in &mut result.entries {
            *entry = Expr::call(
                heads::INJECT,
                vec![entry.clone(), var.clone(), value.clone()],
            );
        }
        return Ok(Some(result.to_expr(sim.prec())));
    }

    let substituted = pretty(body).replace(&pretty(var), &pretty(value));
    let parsed = parse_expr(&substituted).map_err(|e| sim.fail(e.message()))?;
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(constants: &[&str], variables: &[&str]) -> Environment {
        let mut env = Environment::default();
        env.constants = constants.iter().map(|s| s.to_string()).collect();
        env.variables = variables.iter().map(|s| s.to_string()).collect();
        env
    }

    fn parsed(input: &str) -> Expr {
        parse_expr(input).expect("parse")
    }

    #[test]
    fn constant_likeness() {
        let env = env_with(&["a", "q"], &["x"]);
        assert!(constant_like(&env, &parsed("a")));
        assert!(constant_like(&env, &parsed("2.000")));
        assert!(constant_like(&env, &parsed("sin(q)")));
        assert!(constant_like(&env, &parsed("a * 3.000")));
        assert!(constant_like(&env, &parsed("sin(q) / a")));

        assert!(!constant_like(&env, &parsed("1.000")));
        assert!(!constant_like(&env, &parsed("x")));
        assert!(!constant_like(&env, &parsed("w")));
        assert!(!constant_like(&env, &parsed("sin(x)")));
        assert!(!constant_like(&env, &parsed("a * x")));
    }
}
