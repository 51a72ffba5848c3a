use std::cmp::Ordering;

use super::ConditionError;
use super::ast::{CmpOp, Expr, Fact, Literal, Namespace};
use super::facts::{FactContext, FactValue};
use crate::utils::suggest;

/// Evaluate a parsed expression.
///
/// Both operands of `&&` and `||` are always evaluated, so an unknown namespace
/// anywhere in the expression is reported regardless of the other operand.
/// Recursion follows the tree, whose depth the parser bounds.
pub fn evaluate(expr: &Expr, facts: &dyn FactContext) -> Result<bool, ConditionError> {
    match expr {
        Expr::Or(left, right) => {
            let left = evaluate(left, facts)?;
            let right = evaluate(right, facts)?;
            Ok(left || right)
        }
        Expr::And(left, right) => {
            let left = evaluate(left, facts)?;
            let right = evaluate(right, facts)?;
            Ok(left && right)
        }
        Expr::Not(inner) => Ok(!evaluate(inner, facts)?),
        Expr::Fact(fact) => Ok(lookup(fact, facts)?.is_some_and(|value| value.is_truthy())),
        Expr::Compare {
            fact,
            op,
            value,
        } => {
            let actual = lookup(fact, facts)?;
            Ok(compare(actual.as_ref(), *op, value))
        }
    }
}

fn lookup(fact: &Fact, facts: &dyn FactContext) -> Result<Option<FactValue>, ConditionError> {
    if let Namespace::Unknown(name) = &fact.namespace {
        return Err(ConditionError::UnknownNamespace {
            namespace: name.clone(),
            offset: fact.pos,
            suggestion: suggest(&name.to_ascii_lowercase(), Namespace::known()),
        });
    }
    Ok(facts.resolve(fact.namespace.as_str(), &fact.key))
}

/// Compare a fact against a literal.
///
/// An absent fact is unequal to everything and unordered.
fn compare(actual: Option<&FactValue>, op: CmpOp, expected: &Literal) -> bool {
    let Some(actual) = actual else {
        return op == CmpOp::Ne;
    };

    match op {
        CmpOp::Eq => values_equal(actual, expected),
        CmpOp::Ne => !values_equal(actual, expected),
        CmpOp::Lt => order(actual, expected) == Ordering::Less,
        CmpOp::Le => order(actual, expected) != Ordering::Greater,
        CmpOp::Gt => order(actual, expected) == Ordering::Greater,
        CmpOp::Ge => order(actual, expected) != Ordering::Less,
    }
}

fn values_equal(actual: &FactValue, expected: &Literal) -> bool {
    match (actual, expected) {
        (FactValue::Bool(a), Literal::Bool(b)) => a == b,
        (
            FactValue::Number(a),
            Literal::Number {
                value: b,
                ..
            },
        ) => a == b,
        _ => actual.as_text() == expected.as_text(),
    }
}

/// Semantic version order when both sides parse as versions, numeric order
/// when both parse as numbers, byte order otherwise.
fn order(actual: &FactValue, expected: &Literal) -> Ordering {
    let left = actual.as_text();
    let right = expected.as_text();

    if let (Some(a), Some(b)) = (parse_version(&left), parse_version(&right)) {
        return a.cmp(&b);
    }
    if let (Ok(a), Ok(b)) = (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    }
    left.cmp(&right)
}

fn parse_version(text: &str) -> Option<semver::Version> {
    let text = text.trim();
    let text = text.strip_prefix('v').unwrap_or(text);
    semver::Version::parse(text).ok()
}
