use std::fmt::{Debug, Display, Formatter};

use arrow_schema::DataType;

use crate::operator::{BinaryOperator, DisplayFields};

/// Zero based index of a query parameter. Displayed one based, e.g. `$1`.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Ord, PartialOrd)]
pub struct PlaceholderIdx(u16);

impl PlaceholderIdx {
    pub fn new(idx: u16) -> Self {
        Self(idx)
    }
}

impl Display for PlaceholderIdx {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.0 as u32 + 1)
    }
}

impl Debug for PlaceholderIdx {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

/// A query parameter which is not bound yet.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct PlaceholderPrivate {
    idx: PlaceholderIdx,
    /// Static type inferred when the statement was prepared.
    data_type: DataType,
}

impl PlaceholderPrivate {
    pub fn new(idx: PlaceholderIdx, data_type: DataType) -> Self {
        Self { idx, data_type }
    }

    pub fn idx(&self) -> PlaceholderIdx {
        self.idx
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

impl DisplayFields for PlaceholderPrivate {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("idx", &self.idx)
            .field("type", &format_args!("{}", self.data_type))
            .finish()
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct FunctionPrivate {
    name: String,
    return_type: DataType,
    /// Volatile functions may have side effects, e.g. `nextval`.
    volatile: bool,
}

impl FunctionPrivate {
    pub fn new<S: Into<String>>(name: S, return_type: DataType, volatile: bool) -> Self {
        Self {
            name: name.into(),
            return_type,
            volatile,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> &DataType {
        &self.return_type
    }

    pub fn is_volatile(&self) -> bool {
        self.volatile
    }
}

impl DisplayFields for FunctionPrivate {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("").field("name", &self.name).finish()
    }
}

/// Operators producing a boolean regardless of their input types: comparisons, including the
/// null safe and regex ones, and `AND`/`OR`.
pub fn is_predicate(op: BinaryOperator) -> bool {
    op.is_comparison_operator() || op.is_logic_operator()
}

/// `IS [NOT] DISTINCT FROM` treats null as a regular value.
pub fn is_null_safe(op: BinaryOperator) -> bool {
    matches!(
        op,
        BinaryOperator::IsDistinctFrom | BinaryOperator::IsNotDistinctFrom
    )
}

/// Static type of `left op right`.
pub fn binary_result_type(op: BinaryOperator, left: &DataType, right: &DataType) -> DataType {
    if is_predicate(op) {
        DataType::Boolean
    } else if left == &DataType::Null {
        right.clone()
    } else {
        left.clone()
    }
}
