use arrow_schema::DataType;
use datafusion_common::ScalarValue;
use thiserror::Error;

use crate::operator::PlaceholderIdx;

pub type OptResult<T> = anyhow::Result<T>;

/// Result of operations which may evaluate expressions against an [`EvalContext`].
///
/// [`EvalContext`]: crate::eval::EvalContext
pub type NormResult<T> = Result<T, EvalError>;

/// Recoverable failure while evaluating an expression at run time.
///
/// Invariant violations inside the factory are never reported through this type, they panic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("no value provided for placeholder {0}")]
    NoValue(PlaceholderIdx),
    #[error("{value} is out of range for type {data_type}")]
    OutOfRange {
        value: ScalarValue,
        data_type: DataType,
    },
    #[error("could not convert {value:?} to type {data_type}")]
    InvalidCast {
        value: ScalarValue,
        data_type: DataType,
    },
}
