//! Symbolic simplification of algebraic expressions.
//!
//! The core is a fixed-point rewrite engine over an infix expression tree:
//! each pass finds the first reducible node, applies the first matching
//! rule of an ordered table, and canonicalizes the result through the
//! printer. The rule table covers constant folding, distribution, term
//! ordering and collection, integer powers, symbolic differentiation,
//! definite polynomial integration and matrix algebra.
//!
//! ```
//! let out = symat::simplify("d(pow(x, 3), x); variable(x)").unwrap();
//! assert_eq!(out, "3.000 * (x * x)");
//! ```

pub mod calculus;
pub mod error;
pub mod expr;
pub mod format;
pub mod matrix;
pub mod parser;
pub mod simplify;

pub use error::{ErrorContext, Result, SymError};
pub use expr::Expr;
pub use format::pretty;
pub use matrix::Matrix;
pub use parser::parse_expr;
pub use simplify::{simplify, simplify_to, simplify_with, Config, Environment};
