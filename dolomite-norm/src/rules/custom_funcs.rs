use std::cmp::Ordering;
use std::sync::Arc;

use datafusion_common::ScalarValue;

use crate::operator::BinaryOperator;
use crate::rules::RuleSet;

/// Handle to the rule library and the helper functions shared by rules.
#[derive(Clone, Debug)]
pub struct CustomFuncs {
    rules: Arc<RuleSet>,
}

impl CustomFuncs {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    /// Folds `left op right` of two constants.
    ///
    /// Returns `None` when the result can't be computed at plan time, e.g. on integer overflow
    /// or division by zero, so that the error surfaces at execution.
    pub fn fold_binary(
        &self,
        op: BinaryOperator,
        left: &ScalarValue,
        right: &ScalarValue,
    ) -> Option<ScalarValue> {
        fold_binary(op, left, right)
    }
}

macro_rules! fold_integer {
    ($op:expr, $l:expr, $r:expr, $variant:ident) => {
        match $op {
            BinaryOperator::Plus => $l.checked_add(*$r).map(|v| ScalarValue::$variant(Some(v))),
            BinaryOperator::Minus => $l.checked_sub(*$r).map(|v| ScalarValue::$variant(Some(v))),
            BinaryOperator::Multiply => {
                $l.checked_mul(*$r).map(|v| ScalarValue::$variant(Some(v)))
            }
            BinaryOperator::Divide => $l.checked_div(*$r).map(|v| ScalarValue::$variant(Some(v))),
            BinaryOperator::Modulo => $l.checked_rem(*$r).map(|v| ScalarValue::$variant(Some(v))),
            op => compare(op, Some($l.cmp($r))),
        }
    };
}

/// See [`CustomFuncs::fold_binary`].
pub fn fold_binary(
    op: BinaryOperator,
    left: &ScalarValue,
    right: &ScalarValue,
) -> Option<ScalarValue> {
    match (left, right) {
        (ScalarValue::Int16(Some(l)), ScalarValue::Int16(Some(r))) => {
            fold_integer!(op, l, r, Int16)
        }
        (ScalarValue::Int32(Some(l)), ScalarValue::Int32(Some(r))) => {
            fold_integer!(op, l, r, Int32)
        }
        (ScalarValue::Int64(Some(l)), ScalarValue::Int64(Some(r))) => {
            fold_integer!(op, l, r, Int64)
        }
        (ScalarValue::Float64(Some(l)), ScalarValue::Float64(Some(r))) => {
            let value = match op {
                BinaryOperator::Plus => l + r,
                BinaryOperator::Minus => l - r,
                BinaryOperator::Multiply => l * r,
                BinaryOperator::Divide if *r != 0.0 => l / r,
                BinaryOperator::Divide => return None,
                op => return compare(op, l.partial_cmp(r)),
            };
            value.is_finite().then_some(ScalarValue::Float64(Some(value)))
        }
        (ScalarValue::Utf8(Some(l)), ScalarValue::Utf8(Some(r))) => compare(op, Some(l.cmp(r))),
        _ => None,
    }
}

fn compare(op: BinaryOperator, ordering: Option<Ordering>) -> Option<ScalarValue> {
    let ordering = ordering?;
    let result = match op {
        BinaryOperator::Eq => ordering == Ordering::Equal,
        BinaryOperator::NotEq => ordering != Ordering::Equal,
        BinaryOperator::Lt => ordering == Ordering::Less,
        BinaryOperator::LtEq => ordering != Ordering::Greater,
        BinaryOperator::Gt => ordering == Ordering::Greater,
        BinaryOperator::GtEq => ordering != Ordering::Less,
        _ => return None,
    };
    Some(ScalarValue::Boolean(Some(result)))
}
