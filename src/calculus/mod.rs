//! Calculus rewrites: symbolic differentiation, polynomial definite
//! integration and endpoint injection.

mod differentiate;
mod integrate;

pub(crate) use differentiate::differentiate_rule;
pub(crate) use integrate::{inject_rule, integrate_rule};
