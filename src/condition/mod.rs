//! The `when:` condition language.
//!
//! A condition is a boolean formula over namespaced project facts:
//!
//! ```text
//! npm:react && !npm:vue
//! (file:tsconfig.json || file:jsconfig.json) && pkg:type == "module"
//! var:strict == true
//! ```
//!
//! - dependency presence: `npm pip go cargo composer gem pub maven gradle nuget`
//! - existence: `file dir` (keys may be glob patterns)
//! - scalars: `pkg var`, the only namespaces that accept `== != > < >= <=`
//!
//! Parsing is total: malformed input is always a [`ConditionError::Parse`] with
//! the byte offset of the problem. Evaluation fails closed on an unknown
//! namespace.
//!
//! # Example
//!
//! ```rust
//! use rulesmith::condition::{Condition, StaticFacts};
//!
//! let facts = StaticFacts::new().with_present("npm", "react");
//! let condition = Condition::parse("npm:react && !npm:vue").unwrap();
//! assert!(condition.evaluate(&facts).unwrap());
//! ```

pub mod ast;
pub mod evaluator;
pub mod facts;
pub mod lexer;
pub mod parser;

use std::fmt;
use thiserror::Error;

pub use ast::{CmpOp, Ecosystem, Expr, Fact, Literal, Namespace};
pub use evaluator::evaluate;
pub use facts::{FactContext, FactValue, StaticFacts};
pub use parser::parse_expression;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConditionError {
    #[error("invalid condition at offset {offset}: {message}")]
    Parse {
        message: String,
        offset: usize,
    },

    #[error("unknown fact namespace '{namespace}' at offset {offset}{}", suggestion.as_ref().map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default())]
    UnknownNamespace {
        namespace: String,
        offset: usize,
        suggestion: Option<String>,
    },
}

impl ConditionError {
    pub fn parse(message: impl Into<String>, offset: usize) -> Self {
        ConditionError::Parse {
            message: message.into(),
            offset,
        }
    }

    /// Byte offset of the problem in the expression source.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ConditionError::Parse {
                offset,
                ..
            }
            | ConditionError::UnknownNamespace {
                offset,
                ..
            } => Some(*offset),
        }
    }
}

/// A parsed `when:` expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    pub fn parse(source: &str) -> Result<Self, ConditionError> {
        Ok(Self {
            source: source.to_string(),
            expr: parse_expression(source)?,
        })
    }

    pub fn evaluate(&self, facts: &dyn FactContext) -> Result<bool, ConditionError> {
        evaluate(&self.expr, facts)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and evaluate in one step.
pub fn evaluate_condition(source: &str, facts: &dyn FactContext) -> Result<bool, ConditionError> {
    Condition::parse(source)?.evaluate(facts)
}
