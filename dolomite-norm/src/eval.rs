//! Run time evaluation context.
//!
//! The factory only needs to evaluate one kind of expression at run time: a placeholder, whose
//! value is bound by the client after the statement has been prepared. The bound value is
//! converted to the static type the placeholder was declared with, and the conversion may fail.

use std::collections::HashMap;

use arrow_schema::DataType;
use datafusion_common::ScalarValue;

use crate::error::{EvalError, NormResult};
use crate::operator::{PlaceholderIdx, PlaceholderPrivate};

/// Context for evaluation. Holds the values bound to placeholders of the current execution.
#[derive(Clone, Debug, Default)]
pub struct EvalContext {
    placeholders: HashMap<PlaceholderIdx, ScalarValue>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholders<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (PlaceholderIdx, ScalarValue)>,
    {
        Self {
            placeholders: values.into_iter().collect(),
        }
    }

    pub fn bind(&mut self, idx: PlaceholderIdx, value: ScalarValue) {
        self.placeholders.insert(idx, value);
    }

    /// Evaluates a placeholder to a value of its declared type.
    pub fn eval_placeholder(&self, placeholder: &PlaceholderPrivate) -> NormResult<ScalarValue> {
        let value = self
            .placeholders
            .get(&placeholder.idx())
            .ok_or(EvalError::NoValue(placeholder.idx()))?;
        convert_value(value, placeholder.data_type())
    }
}

/// Converts `value` to `data_type`.
///
/// Nulls of any type convert to [`ScalarValue::Null`], the caller attaches the static type.
pub fn convert_value(value: &ScalarValue, data_type: &DataType) -> NormResult<ScalarValue> {
    if value.is_null() {
        return Ok(ScalarValue::Null);
    }

    let invalid_cast = || EvalError::InvalidCast {
        value: value.clone(),
        data_type: data_type.clone(),
    };
    let out_of_range = || EvalError::OutOfRange {
        value: value.clone(),
        data_type: data_type.clone(),
    };

    match data_type {
        DataType::Int16 => {
            let v = integer_of(value).ok_or_else(invalid_cast)?;
            let v = i16::try_from(v).map_err(|_| out_of_range())?;
            Ok(ScalarValue::Int16(Some(v)))
        }
        DataType::Int32 => {
            let v = integer_of(value).ok_or_else(invalid_cast)?;
            let v = i32::try_from(v).map_err(|_| out_of_range())?;
            Ok(ScalarValue::Int32(Some(v)))
        }
        DataType::Int64 => {
            let v = integer_of(value).ok_or_else(invalid_cast)?;
            let v = i64::try_from(v).map_err(|_| out_of_range())?;
            Ok(ScalarValue::Int64(Some(v)))
        }
        DataType::Float64 => match value {
            ScalarValue::Float64(Some(v)) => Ok(ScalarValue::Float64(Some(*v))),
            ScalarValue::Float32(Some(v)) => Ok(ScalarValue::Float64(Some(*v as f64))),
            ScalarValue::Utf8(Some(s)) => s
                .trim()
                .parse::<f64>()
                .map(|v| ScalarValue::Float64(Some(v)))
                .map_err(|_| invalid_cast()),
            _ => integer_of(value)
                .map(|v| ScalarValue::Float64(Some(v as f64)))
                .ok_or_else(invalid_cast),
        },
        DataType::Boolean => match value {
            ScalarValue::Boolean(Some(v)) => Ok(ScalarValue::Boolean(Some(*v))),
            ScalarValue::Utf8(Some(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" => Ok(ScalarValue::Boolean(Some(true))),
                "false" | "f" => Ok(ScalarValue::Boolean(Some(false))),
                _ => Err(invalid_cast()),
            },
            _ => Err(invalid_cast()),
        },
        DataType::Utf8 => match value {
            ScalarValue::Utf8(Some(s)) => Ok(ScalarValue::Utf8(Some(s.clone()))),
            other => Ok(ScalarValue::Utf8(Some(other.to_string()))),
        },
        _ => {
            if &value.get_datatype() == data_type {
                Ok(value.clone())
            } else {
                Err(invalid_cast())
            }
        }
    }
}

/// Integer content of `value`, parsing strings.
fn integer_of(value: &ScalarValue) -> Option<i128> {
    match value {
        ScalarValue::Int8(Some(v)) => Some(*v as i128),
        ScalarValue::Int16(Some(v)) => Some(*v as i128),
        ScalarValue::Int32(Some(v)) => Some(*v as i128),
        ScalarValue::Int64(Some(v)) => Some(*v as i128),
        ScalarValue::UInt8(Some(v)) => Some(*v as i128),
        ScalarValue::UInt16(Some(v)) => Some(*v as i128),
        ScalarValue::UInt32(Some(v)) => Some(*v as i128),
        ScalarValue::UInt64(Some(v)) => Some(*v as i128),
        ScalarValue::Utf8(Some(s)) => s.trim().parse::<i128>().ok(),
        _ => None,
    }
}
