use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SymError>;

#[derive(Debug, Error)]
pub enum SymError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("log write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Simplify(Box<ErrorContext>),
}

/// Snapshot of the engine state at the point of failure, rendered with the
/// error message so callers can see what was being simplified and under
/// which declarations.
#[derive(Debug)]
pub struct ErrorContext {
    pub expression: String,
    pub constants: Vec<String>,
    pub variables: Vec<String>,
    pub functions: Vec<(String, Vec<String>)>,
    pub iteration: i64,
    pub message: String,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error of symbolic math")?;
        writeln!(f, "  expression: {}", self.expression)?;
        writeln!(f, "  constants : {}", self.constants.join(", "))?;
        writeln!(f, "  variables : {}", self.variables.join(", "))?;
        let funs: Vec<String> = self
            .functions
            .iter()
            .map(|(name, vars)| format!("{}({})", name, vars.join(", ")))
            .collect();
        writeln!(f, "  functions : {}", funs.join(", "))?;
        writeln!(f, "  iteration : {}", self.iteration)?;
        write!(f, "  error     : {}", self.message)
    }
}

impl SymError {
    /// Message text without the context block, for matching in callers.
    pub fn message(&self) -> String {
        match self {
            SymError::Parse(m) => m.clone(),
            SymError::Io(e) => e.to_string(),
            SymError::Simplify(ctx) => ctx.message.clone(),
        }
    }
}
