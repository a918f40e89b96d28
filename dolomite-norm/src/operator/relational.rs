use std::fmt::Formatter;

use enumset::{EnumSet, EnumSetType};

use crate::metadata::{ColList, ColSet, TableId};
use crate::operator::DisplayFields;

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct ScanPrivate {
    table: TableId,
    /// Columns of the table produced by the scan.
    cols: ColSet,
}

impl ScanPrivate {
    pub fn new(table: TableId, cols: ColSet) -> Self {
        Self { table, cols }
    }

    pub fn table(&self) -> TableId {
        self.table
    }

    pub fn cols(&self) -> &ColSet {
        &self.cols
    }
}

impl DisplayFields for ScanPrivate {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("table", &self.table)
            .field("cols", &self.cols)
            .finish()
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq, Default)]
pub struct ValuesPrivate {
    /// Output column of each tuple position.
    cols: ColList,
}

impl ValuesPrivate {
    pub fn new(cols: ColList) -> Self {
        Self { cols }
    }

    pub fn cols(&self) -> &[crate::metadata::ColumnId] {
        &self.cols
    }
}

impl DisplayFields for ValuesPrivate {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("").field("cols", &self.cols).finish()
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq, Default)]
pub struct ProjectPrivate {
    /// Column synthesized by each item of the projections input.
    cols: ColList,
    /// Input columns passed through unchanged.
    passthrough: ColSet,
}

impl ProjectPrivate {
    pub fn new(cols: ColList, passthrough: ColSet) -> Self {
        Self { cols, passthrough }
    }

    pub fn cols(&self) -> &[crate::metadata::ColumnId] {
        &self.cols
    }

    pub fn passthrough(&self) -> &ColSet {
        &self.passthrough
    }
}

impl DisplayFields for ProjectPrivate {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("cols", &self.cols)
            .field("passthrough", &self.passthrough)
            .finish()
    }
}

/// Physical join algorithms.
#[derive(EnumSetType, Debug, Hash)]
pub enum JoinAlgorithm {
    Hash,
    Merge,
    Lookup,
}

/// Private payload shared by all join operators.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct JoinPrivate {
    /// Algorithms the exploration phase may pick, restricted by join hints.
    allowed: EnumSet<JoinAlgorithm>,
}

impl Default for JoinPrivate {
    fn default() -> Self {
        Self {
            allowed: EnumSet::all(),
        }
    }
}

impl JoinPrivate {
    pub fn with_allowed(allowed: EnumSet<JoinAlgorithm>) -> Self {
        Self { allowed }
    }

    pub fn allowed(&self) -> EnumSet<JoinAlgorithm> {
        self.allowed
    }
}

impl DisplayFields for JoinPrivate {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.allowed == EnumSet::all() {
            return Ok(());
        }
        f.debug_struct("").field("allowed", &self.allowed).finish()
    }
}
