//! Matrix algebra over `matrix(e…, R, C)` call shapes.
//!
//! A matrix is not a distinct tree variant: it is a call whose last two
//! arguments are the numeric row and column counts and whose leading
//! arguments are the row-major entries. `Matrix` is a temporary view built
//! by the rules below.

use std::io::Write;

use crate::error::Result;
use crate::expr::{heads, BinOp, Expr, add, div, mul, sub};
use crate::simplify::Simplifier;

#[derive(Clone, Debug)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub entries: Vec<Expr>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, prec: usize) -> Self {
        Matrix {
            rows,
            cols,
            entries: vec![Expr::number(0.0, prec); rows * cols],
        }
    }

    pub fn position(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.cols);
        col + self.cols * row
    }

    pub fn to_expr(&self, prec: usize) -> Expr {
        let mut args = self.entries.clone();
        args.push(Expr::number(self.rows as f64, prec));
        args.push(Expr::number(self.cols as f64, prec));
        Expr::call(heads::MATRIX, args)
    }

    /// View a `matrix(…)` call. `None` when the node is not a matrix call
    /// or its dimensions are not yet literal; an entry count that
    /// contradicts the stated dimensions is a fatal shape error.
    pub fn from_expr(sim: &Simplifier, expr: &Expr) -> Result<Option<Matrix>> {
        let Some(args) = expr.as_call(heads::MATRIX) else {
            return Ok(None);
        };
        if args.len() < 3 {
            return Err(sim.fail(format!(
                "matrix needs entries and two dimensions, got {} arguments",
                args.len()
            )));
        }
        let Some(rows) = args[args.len() - 2].as_number() else {
            return Ok(None);
        };
        let Some(cols) = args[args.len() - 1].as_number() else {
            return Ok(None);
        };
        let rows = rows as usize;
        let cols = cols as usize;
        let entries = args[..args.len() - 2].to_vec();
        if entries.len() != rows * cols {
            return Err(sim.fail(format!(
                "matrix shape mismatch: {} entries for {rows}x{cols}",
                entries.len()
            )));
        }
        Ok(Some(Matrix {
            rows,
            cols,
            entries,
        }))
    }
}

fn is_transpose(expr: &Expr) -> bool {
    expr.as_call(heads::TRANSPOSE).is_some()
}

/// `transpose(matrix(…, R, C))` → the C×R matrix with entries reindexed.
pub(crate) fn transpose_rule(sim: &Simplifier, expr: &Expr) -> Result<Option<Expr>> {
    let Some(args) = expr.as_call(heads::TRANSPOSE) else {
        return Ok(None);
    };
    if args.len() != 1 {
        return Err(sim.fail("transpose expects exactly 1 argument"));
    }
    let Some(m) = Matrix::from_expr(sim, &args[0])? else {
        return Err(sim.fail("transpose argument is not a matrix"));
    };

    let mut result = Matrix::new(m.cols, m.rows, sim.prec());
    for r in 0..m.rows {
        for c in 0..m.cols {
            let pos = result.position(c, r);
            result.entries[pos] = m.entries[m.position(r, c)].clone();
        }
    }
    Ok(Some(result.to_expr(sim.prec())))
}

/// Determinant by cofactor expansion along the first row. Entries that are
/// literal zeros contribute a zero term instead of a `0 · det` product.
pub(crate) fn det_rule(sim: &Simplifier, expr: &Expr) -> Result<Option<Expr>> {
    let Some(args) = expr.as_call(heads::DET) else {
        return Ok(None);
    };
    if args.len() != 1 {
        return Err(sim.fail("det expects exactly 1 argument"));
    }
    let Some(m) = Matrix::from_expr(sim, &args[0])? else {
        return Err(sim.fail("det argument is not a matrix"));
    };
    if m.rows != m.cols {
        return Err(sim.fail("det of a non-square matrix"));
    }

    if m.rows == 1 {
        return Ok(Some(m.entries[0].clone()));
    }

    let size = m.rows;
    let prec = sim.prec();
    let mut acc = sim.num(0.0);
    for i in 0..size {
        let value = m.entries[m.position(0, i)].clone();
        if value.is_zero() {
            acc = add(acc, sim.num(0.0));
            continue;
        }
        let mut minor = Matrix::new(size - 1, size - 1, prec);
        for row in 1..size {
            for c in 0..size - 1 {
                let col = if i <= c { c + 1 } else { c };
                let pos = minor.position(row - 1, c);
                minor.entries[pos] = m.entries[m.position(row, col)].clone();
            }
        }
        let term = mul(value, Expr::call(heads::DET, vec![minor.to_expr(prec)]));
        acc = if i % 2 == 0 { add(acc, term) } else { sub(acc, term) };
    }
    Ok(Some(acc))
}

/// `inverse(M)` → `simplified(1/det(M)) · transpose(cofactor(M))` for a
/// square `M`; the scalar is reduced by a nested run before composition.
pub(crate) fn inverse_rule(
    sim: &mut Simplifier,
    expr: &Expr,
    out: &mut dyn Write,
) -> Result<Option<Expr>> {
    let Some(args) = expr.as_call(heads::INVERSE) else {
        return Ok(None);
    };
    if args.len() != 1 {
        return Err(sim.fail("inverse expects exactly 1 argument"));
    }
    let Some(m) = Matrix::from_expr(sim, &args[0])? else {
        return Err(sim.fail("inverse argument is not a matrix"));
    };
    if m.rows != m.cols {
        return Err(sim.fail("inverse of a non-square matrix"));
    }

    let prec = sim.prec();
    let size = m.rows;
    let scalar = div(
        sim.num(1.0),
        Expr::call(heads::DET, vec![args[0].clone()]),
    );
    let scalar = sim.run_child(&scalar, out)?;

    let mut cof = Matrix::new(size, size, prec);
    for r in 0..size {
        for c in 0..size {
            let mut minor = Matrix::new(size - 1, size - 1, prec);
            for row in 0..size - 1 {
                for col in 0..size - 1 {
                    let row2 = if r <= row { row + 1 } else { row };
                    let col2 = if c <= col { col + 1 } else { col };
                    let pos = minor.position(row, col);
                    minor.entries[pos] = m.entries[m.position(row2, col2)].clone();
                }
            }
            let mut entry = Expr::call(heads::DET, vec![minor.to_expr(prec)]);
            if (r + c) % 2 != 0 {
                entry = mul(Expr::number(-1.0, prec), entry);
            }
            let pos = cof.position(r, c);
            cof.entries[pos] = entry;
        }
    }

    Ok(Some(mul(
        scalar,
        Expr::call(heads::TRANSPOSE, vec![cof.to_expr(prec)]),
    )))
}

/// `matrix · matrix` with conformable shapes; entries are symbolic
/// sums of products, left for the ordinary rules to reduce.
pub(crate) fn multiply_rule(sim: &Simplifier, expr: &Expr) -> Result<Option<Expr>> {
    let Expr::Binary(BinOp::Mul, left, right) = expr else {
        return Ok(None);
    };
    let Some(a) = Matrix::from_expr(sim, left)? else {
        return Ok(None);
    };
    let Some(b) = Matrix::from_expr(sim, right)? else {
        return Ok(None);
    };
    if a.cols != b.rows {
        return Err(sim.fail(format!(
            "matrix multiplication shape mismatch: {}x{} by {}x{}",
            a.rows, a.cols, b.rows, b.cols
        )));
    }

    let mut result = Matrix::new(a.rows, b.cols, sim.prec());
    for r in 0..a.rows {
        for c in 0..b.cols {
            let mut entry: Option<Expr> = None;
            for p in 0..a.cols {
                let product = mul(
                    a.entries[a.position(r, p)].clone(),
                    b.entries[b.position(p, c)].clone(),
                );
                entry = Some(match entry {
                    None => product,
                    Some(acc) => add(acc, product),
                });
            }
            let pos = result.position(r, c);
            result.entries[pos] = entry.expect("matrix dimensions are at least one");
        }
    }
    Ok(Some(result.to_expr(sim.prec())))
}

/// Element-wise `matrix ± matrix`; shapes must match.
pub(crate) fn add_sub_rule(sim: &Simplifier, expr: &Expr) -> Result<Option<Expr>> {
    let Expr::Binary(op @ (BinOp::Add | BinOp::Sub), left, right) = expr else {
        return Ok(None);
    };
    let Some(a) = Matrix::from_expr(sim, left)? else {
        return Ok(None);
    };
    let Some(b) = Matrix::from_expr(sim, right)? else {
        return Ok(None);
    };
    if a.rows != b.rows || a.cols != b.cols {
        return Err(sim.fail(format!(
            "matrix addition shape mismatch: {}x{} and {}x{}",
            a.rows, a.cols, b.rows, b.cols
        )));
    }

    let mut result = Matrix::new(a.rows, a.cols, sim.prec());
    for pos in 0..a.entries.len() {
        result.entries[pos] = Expr::Binary(
            *op,
            a.entries[pos].clone().boxed(),
            b.entries[pos].clone().boxed(),
        );
    }
    Ok(Some(result.to_expr(sim.prec())))
}

/// Scalar broadcast: `s · M`, `M · s` and `M / s` distribute the scalar
/// over the entries. A transpose is not a scalar (it becomes a matrix
/// later); a matrix in a denominator is a shape error.
pub(crate) fn scalar_broadcast_rule(sim: &Simplifier, expr: &Expr) -> Result<Option<Expr>> {
    let Expr::Binary(op, left, right) = expr else {
        return Ok(None);
    };

    if *op == BinOp::Div {
        if Matrix::from_expr(sim, right)?.is_some() || is_transpose(right) {
            return Err(sim.fail("cannot divide by a matrix"));
        }
        let Some(m) = Matrix::from_expr(sim, left)? else {
            return Ok(None);
        };
        let mut result = m.clone();
        for entry in &mut result.entries {
            *entry = div(entry.clone(), (**right).clone());
        }
        return Ok(Some(result.to_expr(sim.prec())));
    }

    if *op != BinOp::Mul {
        return Ok(None);
    }
    for (value, mat) in [(left, right), (right, left)] {
        let Some(m) = Matrix::from_expr(sim, mat)? else {
            continue;
        };
        if Matrix::from_expr(sim, value)?.is_some() || is_transpose(value) {
            continue;
        }
        let mut result = m.clone();
        for entry in &mut result.entries {
            *entry = mul(entry.clone(), (**value).clone());
        }
        return Ok(Some(result.to_expr(sim.prec())));
    }
    Ok(None)
}
