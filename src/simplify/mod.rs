//! The rewrite engine: declaration handling, the fixed-point loop and the
//! child-first traversal that dispatches the ordered rule table.

pub(crate) mod rules;
pub mod views;

use std::io::{self, Write};

use crate::calculus;
use crate::error::{ErrorContext, Result, SymError};
use crate::expr::{heads, BinOp, Expr, Num};
use crate::format::{format_float, pretty};
use crate::matrix;
use crate::parser::parse_expr;

/// Engine tunables, read once per `simplify` call.
///
/// A negative `max_iteration` means unbounded: the counter resets to zero
/// whenever it is consulted, which is useful when debugging runaway rule
/// interactions.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub max_iteration: i64,
    pub float_format: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_iteration: 1_000_000,
            float_format: 3,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Function {
    pub name: String,
    pub variables: Vec<String>,
}

/// Declared constants, variables and functions for one `simplify` call.
/// Built by the declaration segments, never mutated afterwards.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    pub constants: Vec<String>,
    pub variables: Vec<String>,
    pub functions: Vec<Function>,
}

impl Environment {
    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.iter().any(|c| c == name)
    }

    pub fn is_variable(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v == name)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.iter().any(|f| f.name == name)
    }

    /// Ordering classification used by the sort rule: declared constants
    /// sort as constants, and so does any identifier that is neither a
    /// declared variable, a declared function nor a reserved head.
    pub fn is_sortable_constant(&self, name: &str) -> bool {
        if self.is_constant(name) {
            return true;
        }
        !self.is_variable(name) && !self.is_function(name) && !heads::RESERVED.contains(&name)
    }

    pub fn function_depends_on(&self, name: &str, var: &str) -> bool {
        self.functions
            .iter()
            .any(|f| f.name == name && f.variables.iter().any(|v| v == var))
    }
}

/// Simplify `input` with default tunables and no iteration log.
pub fn simplify(input: &str) -> Result<String> {
    simplify_with(Config::default(), input, None)
}

/// Simplify `input`, writing each intermediate printed form to `log`.
pub fn simplify_to(input: &str, log: &mut dyn Write) -> Result<String> {
    simplify_with(Config::default(), input, Some(log))
}

pub fn simplify_with(cfg: Config, input: &str, log: Option<&mut dyn Write>) -> Result<String> {
    let input = input.replace('\n', "");
    let (base, env) = parse_input(&input)?;
    let mut sink = io::sink();
    let out: &mut dyn Write = match log {
        Some(w) => w,
        None => &mut sink,
    };
    let mut sim = Simplifier {
        cfg,
        env: &env,
        iter: 0,
        base: base.clone(),
    };
    sim.run(&base, out)
}

/// Split the input on `;`, consume `constant`/`variable`/`function`
/// declaration segments into the environment, and return the last plain
/// segment as the base expression.
fn parse_input(input: &str) -> Result<(String, Environment)> {
    let mut env = Environment::default();
    let mut base: Option<String> = None;

    for segment in input.split(';') {
        if segment.trim().is_empty() {
            continue;
        }
        let ast =
            parse_expr(segment).map_err(|e| context_error(&env, input, 0, e.message()))?;
        if let Expr::Call(head, args) = &ast {
            match head.as_str() {
                heads::FUNCTION => {
                    if args.len() < 2 {
                        return Err(context_error(
                            &env,
                            input,
                            0,
                            "function declaration needs a function name and at least one variable",
                        ));
                    }
                    let name = args[0]
                        .as_ident()
                        .ok_or_else(|| {
                            context_error(&env, input, 0, "not a valid function name")
                        })?
                        .to_string();
                    if heads::RESERVED.contains(&name.as_str()) {
                        return Err(context_error(
                            &env,
                            input,
                            0,
                            format!("`{name}` is reserved and cannot name a function"),
                        ));
                    }
                    let mut variables = Vec::new();
                    for arg in &args[1..] {
                        let var = arg.as_ident().ok_or_else(|| {
                            context_error(&env, input, 0, "not a valid variable name")
                        })?;
                        variables.push(var.to_string());
                        env.variables.push(var.to_string());
                    }
                    env.functions.push(Function { name, variables });
                    continue;
                }
                heads::CONSTANT => {
                    for arg in args {
                        let name = arg.as_ident().ok_or_else(|| {
                            context_error(&env, input, 0, "not a valid constant name")
                        })?;
                        env.constants.push(name.to_string());
                    }
                    continue;
                }
                heads::VARIABLE => {
                    if args.len() != 1 {
                        return Err(context_error(
                            &env,
                            input,
                            0,
                            "variable declaration takes exactly one identifier",
                        ));
                    }
                    let name = args[0].as_ident().ok_or_else(|| {
                        context_error(&env, input, 0, "not a valid variable name")
                    })?;
                    env.variables.push(name.to_string());
                    continue;
                }
                _ => {}
            }
        }
        base = Some(segment.trim().to_string());
    }

    let base = base.ok_or_else(|| context_error(&env, input, 0, "no base expression"))?;
    Ok((base, env))
}

fn context_error(
    env: &Environment,
    expression: &str,
    iteration: i64,
    message: impl Into<String>,
) -> SymError {
    SymError::Simplify(Box::new(ErrorContext {
        expression: expression.to_string(),
        constants: env.constants.clone(),
        variables: env.variables.clone(),
        functions: env
            .functions
            .iter()
            .map(|f| (f.name.clone(), f.variables.clone()))
            .collect(),
        iteration,
        message: message.into(),
    }))
}

pub(crate) struct Simplifier<'e> {
    cfg: Config,
    env: &'e Environment,
    iter: i64,
    base: String,
}

impl<'e> Simplifier<'e> {
    pub(crate) fn prec(&self) -> usize {
        self.cfg.float_format
    }

    pub(crate) fn env(&self) -> &Environment {
        self.env
    }

    pub(crate) fn num(&self, value: f64) -> Expr {
        Expr::number(value, self.prec())
    }

    pub(crate) fn fail(&self, message: impl Into<String>) -> SymError {
        context_error(self.env, &self.base, self.iter, message)
    }

    fn check_iteration_limit(&mut self) -> Result<()> {
        if self.cfg.max_iteration < 0 {
            self.iter = 0;
            return Ok(());
        }
        if self.cfg.max_iteration < self.iter {
            return Err(self.fail("iteration limit"));
        }
        Ok(())
    }

    /// The fixed-point loop: normalize, rewrite once, canonicalize through
    /// the printer, guard against repeats and the iteration budget.
    fn run(&mut self, base: &str, out: &mut dyn Write) -> Result<String> {
        let mut ast = parse_expr(base).map_err(|e| self.fail(e.message()))?;
        let mut history: Vec<String> = Vec::new();

        loop {
            ast = rebalance_mul(ast);
            let rewritten = self.walk(&ast, out)?;
            let changed = rewritten.is_some();
            if let Some(next) = rewritten {
                ast = next;
            }
            let printed = pretty(&ast);
            writeln!(out, "{printed}")?;
            self.base = printed.clone();

            if !changed {
                return Ok(printed);
            }
            if history.iter().any(|h| h == &printed) {
                return Err(self.fail(format!("Repeat result: {printed}")));
            }
            history.push(printed);

            self.check_iteration_limit()?;
            self.iter += 1;
        }
    }

    /// Depth-first search for the first applicable rewrite: children
    /// before the node, left before right, then the rule table in order.
    /// A successful rewrite is serialized and re-parsed before returning
    /// so the caller only ever sees canonical nodes.
    fn walk(&mut self, expr: &Expr, out: &mut dyn Write) -> Result<Option<Expr>> {
        self.check_iteration_limit()?;
        self.iter += 1;

        if let Some(changed) = self.descend(expr, out)? {
            return self.canonical(changed);
        }

        if let Some(r) = rules::fold_constants(self, expr)? {
            return self.canonical(r);
        }
        if let Some(r) = rules::distribute(self, expr, out)? {
            return self.canonical(r);
        }
        if let Some(r) = rules::sort(self, expr)? {
            return self.canonical(r);
        }
        if let Some(r) = rules::expand_pow(self, expr, out)? {
            return self.canonical(r);
        }
        if let Some(r) = rules::drop_unit(self, expr)? {
            return self.canonical(r);
        }
        if let Some(r) = rules::normalize_division(expr) {
            return self.canonical(r);
        }
        if let Some(r) = rules::collect(self, expr)? {
            return self.canonical(r);
        }
        if let Some(r) = rules::drop_zero(self, expr) {
            return self.canonical(r);
        }
        if let Some(r) = matrix::transpose_rule(self, expr)? {
            return self.canonical(r);
        }
        if let Some(r) = matrix::det_rule(self, expr)? {
            return self.canonical(r);
        }
        if let Some(r) = matrix::inverse_rule(self, expr, out)? {
            return self.canonical(r);
        }
        if let Some(r) = matrix::multiply_rule(self, expr)? {
            return self.canonical(r);
        }
        if let Some(r) = matrix::add_sub_rule(self, expr)? {
            return self.canonical(r);
        }
        if let Some(r) = matrix::scalar_broadcast_rule(self, expr)? {
            return self.canonical(r);
        }
        if let Some(r) = calculus::differentiate_rule(self, expr, out)? {
            return self.canonical(r);
        }
        if let Some(r) = calculus::integrate_rule(self, expr, out)? {
            return self.canonical(r);
        }
        if let Some(r) = calculus::inject_rule(self, expr)? {
            return self.canonical(r);
        }

        Ok(None)
    }

    fn descend(&mut self, expr: &Expr, out: &mut dyn Write) -> Result<Option<Expr>> {
        match expr {
            Expr::Binary(op, left, right) => {
                if let Some(l) = self.walk(left, out)? {
                    return Ok(Some(Expr::Binary(*op, l.boxed(), right.clone())));
                }
                if let Some(r) = self.walk(right, out)? {
                    return Ok(Some(Expr::Binary(*op, left.clone(), r.boxed())));
                }
                Ok(None)
            }
            Expr::Unary(op, inner) => {
                Ok(self.walk(inner, out)?.map(|e| Expr::Unary(*op, e.boxed())))
            }
            Expr::Number(n) => {
                // integer literals promote to the canonical fixed-point
                // form on first contact
                if !n.text.contains('.') {
                    let text = format_float(n.value, self.prec());
                    if text != n.text {
                        let value = text.parse().unwrap_or(n.value);
                        return Ok(Some(Expr::Number(Num { value, text })));
                    }
                }
                Ok(None)
            }
            Expr::Ident(_) => Ok(None),
            Expr::Call(head, args) => {
                let mut changed = false;
                let mut rebuilt = Vec::with_capacity(args.len());
                for arg in args {
                    match self.walk(arg, out)? {
                        Some(a) => {
                            changed = true;
                            rebuilt.push(a);
                        }
                        None => rebuilt.push(arg.clone()),
                    }
                }
                if changed {
                    Ok(Some(Expr::Call(head.clone(), rebuilt)))
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn canonical(&self, expr: Expr) -> Result<Option<Expr>> {
        let printed = pretty(&expr);
        let ast = parse_expr(&printed).map_err(|e| self.fail(e.message()))?;
        Ok(Some(ast))
    }

    /// Run a nested simplification of `expr` on its printed form. The
    /// child shares the iteration counter, so its work counts against the
    /// parent's budget.
    pub(crate) fn run_child(&mut self, expr: &Expr, out: &mut dyn Write) -> Result<Expr> {
        let printed = pretty(expr);
        let saved = std::mem::replace(&mut self.base, printed.clone());
        let result = self.run(&printed, out);
        self.base = saved;
        let text = result?;
        parse_expr(&text).map_err(|e| self.fail(e.message()))
    }

    /// Sum a list of subterms, simplifying each part and each partial sum
    /// through nested runs; long lists are split in halves.
    pub(crate) fn sum_of_parts(
        &mut self,
        mut parts: Vec<Expr>,
        out: &mut dyn Write,
    ) -> Result<Expr> {
        match parts.len() {
            0 => Ok(self.num(0.0)),
            1 => self.run_child(&parts[0], out),
            2 => {
                let first = self.run_child(&parts[0], out)?;
                let second = self.run_child(&parts[1], out)?;
                self.run_child(&crate::expr::add(first, second), out)
            }
            _ => {
                let tail = parts.split_off(parts.len() / 2);
                let left = self.sum_of_parts(parts, out)?;
                let right = self.sum_of_parts(tail, out)?;
                self.sum_of_parts(vec![left, right], out)
            }
        }
    }
}

/// Rebalance left-nested multiplication: `(a·b)·c → a·(b·c)`, everywhere,
/// until the fixed point. Runs before every rewrite attempt.
pub(crate) fn rebalance_mul(expr: Expr) -> Expr {
    match expr {
        Expr::Binary(op, left, right) => {
            let left = rebalance_mul(*left);
            let right = rebalance_mul(*right);
            match (op, left) {
                (BinOp::Mul, Expr::Binary(BinOp::Mul, a, b)) => {
                    let rotated = Expr::Binary(BinOp::Mul, b, right.boxed());
                    Expr::Binary(BinOp::Mul, a, rebalance_mul(rotated).boxed())
                }
                (op, left) => Expr::Binary(op, left.boxed(), right.boxed()),
            }
        }
        Expr::Unary(op, inner) => Expr::Unary(op, rebalance_mul(*inner).boxed()),
        Expr::Call(head, args) => {
            Expr::Call(head, args.into_iter().map(rebalance_mul).collect())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebalances_left_nested_multiplication() {
        let expr = parse_expr("a * b * c * d").expect("parse");
        assert_eq!(pretty(&rebalance_mul(expr)), "a * (b * (c * d))");
    }

    #[test]
    fn declarations_populate_environment() {
        let (base, env) =
            parse_input("constant(a, b); d(x, x); variable(x); function(f, x, y)").expect("parse");
        assert_eq!(base, "d(x, x)");
        assert_eq!(env.constants, vec!["a", "b"]);
        assert_eq!(env.variables, vec!["x", "x", "y"]);
        assert!(env.function_depends_on("f", "y"));
        assert!(!env.function_depends_on("f", "z"));
    }

    #[test]
    fn declaration_argument_must_be_bare_identifier() {
        assert!(parse_input("x; constant(1 + 2)").is_err());
        assert!(parse_input("x; variable(a, b)").is_err());
        assert!(parse_input("x; function(f)").is_err());
        assert!(parse_input("x; function(pow, y)").is_err());
    }
}
