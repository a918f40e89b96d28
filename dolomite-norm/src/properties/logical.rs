use arrow_schema::DataType;
use enum_as_inner::EnumAsInner;

use crate::metadata::ColSet;
use crate::properties::Cardinality;

/// Logical properties of a group, derived when the group is memoized.
#[derive(Clone, Debug, PartialEq, EnumAsInner)]
pub enum Props {
    Relational(RelationalProps),
    Scalar(ScalarProps),
}

impl Props {
    pub fn can_have_side_effects(&self) -> bool {
        match self {
            Props::Relational(p) => p.can_have_side_effects,
            Props::Scalar(p) => p.can_have_side_effects,
        }
    }

    pub fn has_placeholder(&self) -> bool {
        match self {
            Props::Relational(p) => p.has_placeholder,
            Props::Scalar(p) => p.has_placeholder,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct RelationalProps {
    pub(crate) output_cols: ColSet,
    pub(crate) cardinality: Cardinality,
    pub(crate) can_have_side_effects: bool,
    pub(crate) has_placeholder: bool,
}

impl RelationalProps {
    pub fn output_cols(&self) -> &ColSet {
        &self.output_cols
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn can_have_side_effects(&self) -> bool {
        self.can_have_side_effects
    }

    pub fn has_placeholder(&self) -> bool {
        self.has_placeholder
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScalarProps {
    pub(crate) data_type: DataType,
    pub(crate) can_have_side_effects: bool,
    pub(crate) has_placeholder: bool,
}

impl ScalarProps {
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn can_have_side_effects(&self) -> bool {
        self.can_have_side_effects
    }

    pub fn has_placeholder(&self) -> bool {
        self.has_placeholder
    }
}
