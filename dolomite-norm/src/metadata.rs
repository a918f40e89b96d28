//! Query metadata.
//!
//! Expressions never embed table or column definitions, they reference them by [`TableId`] and
//! [`ColumnId`]. The definitions live in [`Metadata`], which is owned by the memo. Identifiers are
//! allocated in order starting from 1 and are stable for the life of the metadata, so when
//! metadata is copied into another memo every reference keeps its meaning.

use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};

use anyhow::anyhow;
use arrow_schema::DataType;
use derive_more::{Display, From};

use crate::error::OptResult;

#[derive(Hash, Eq, PartialEq, Clone, Copy, Ord, PartialOrd, Display, From)]
pub struct ColumnId(u32);

impl Debug for ColumnId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Hash, Eq, PartialEq, Clone, Copy, Ord, PartialOrd, Display, From)]
pub struct TableId(u32);

impl Debug for TableId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Unordered set of columns.
pub type ColSet = BTreeSet<ColumnId>;

/// Ordered list of columns.
pub type ColList = Vec<ColumnId>;

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnMeta {
    id: ColumnId,
    alias: String,
    data_type: DataType,
    /// `None` for columns synthesized by the query, e.g. projections.
    table: Option<TableId>,
}

impl ColumnMeta {
    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn table(&self) -> Option<TableId> {
        self.table
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableMeta {
    id: TableId,
    name: String,
    columns: ColList,
}

impl TableMeta {
    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    pub fn col_set(&self) -> ColSet {
        self.columns.iter().copied().collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    tables: Vec<TableMeta>,
    columns: Vec<ColumnMeta>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.columns.is_empty()
    }

    /// Registers a table and allocates one column id for each of its columns.
    pub fn add_table<S, I, C>(&mut self, name: S, columns: I) -> TableId
    where
        S: Into<String>,
        I: IntoIterator<Item = (C, DataType)>,
        C: Into<String>,
    {
        let table_id = TableId(self.tables.len() as u32 + 1);
        let columns = columns
            .into_iter()
            .map(|(alias, data_type)| {
                self.new_column(alias.into(), data_type, Some(table_id))
            })
            .collect();

        self.tables.push(TableMeta {
            id: table_id,
            name: name.into(),
            columns,
        });
        table_id
    }

    /// Allocates a column which does not belong to any table.
    pub fn add_column<S: Into<String>>(&mut self, alias: S, data_type: DataType) -> ColumnId {
        self.new_column(alias.into(), data_type, None)
    }

    pub fn table(&self, id: TableId) -> &TableMeta {
        &self.tables[id.0 as usize - 1]
    }

    pub fn column(&self, id: ColumnId) -> &ColumnMeta {
        &self.columns[id.0 as usize - 1]
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn table_by_name(&self, name: &str) -> OptResult<TableId> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.id)
            .ok_or_else(|| anyhow!("Table {:?} not exists", name))
    }

    pub fn table_column(&self, table: TableId, alias: &str) -> OptResult<ColumnId> {
        let table = self.table(table);
        table
            .columns
            .iter()
            .copied()
            .find(|c| self.column(*c).alias == alias)
            .ok_or_else(|| anyhow!("Column {:?} not exists in table {:?}", alias, table.name))
    }

    /// Copies all tables and columns of `from`, keeping their ids.
    ///
    /// # Panics
    ///
    /// If this metadata is not empty, since the ids of `from` could collide with existing ones.
    pub fn copy_from(&mut self, from: &Metadata) {
        assert!(
            self.is_empty(),
            "metadata must be empty before copying from another metadata"
        );
        self.tables = from.tables.clone();
        self.columns = from.columns.clone();
    }

    fn new_column(
        &mut self,
        alias: String,
        data_type: DataType,
        table: Option<TableId>,
    ) -> ColumnId {
        let id = ColumnId(self.columns.len() as u32 + 1);
        self.columns.push(ColumnMeta {
            id,
            alias,
            data_type,
            table,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;

    use crate::metadata::{ColumnId, Metadata, TableId};

    #[test]
    fn test_ids_are_allocated_in_order() {
        let mut md = Metadata::new();
        let t1 = md.add_table("t1", vec![("a", DataType::Int64), ("b", DataType::Utf8)]);
        let x = md.add_column("x", DataType::Boolean);
        let t2 = md.add_table("t2", vec![("c", DataType::Int64)]);

        assert_eq!(TableId::from(1), t1);
        assert_eq!(TableId::from(2), t2);
        assert_eq!(ColumnId::from(3), x);
        assert_eq!(&[ColumnId::from(1), ColumnId::from(2)], md.table(t1).columns());
        assert_eq!(&[ColumnId::from(4)], md.table(t2).columns());
        assert_eq!(None, md.column(x).table());
        assert_eq!(x, md.column(x).id());
        assert_eq!(&DataType::Utf8, md.column(ColumnId::from(2)).data_type());
    }

    #[test]
    fn test_lookup_by_name() {
        let mut md = Metadata::new();
        let t1 = md.add_table("t1", vec![("a", DataType::Int64), ("b", DataType::Utf8)]);

        assert_eq!(t1, md.table_by_name("t1").unwrap());
        assert!(md.table_by_name("t2").is_err());
        assert_eq!(ColumnId::from(2), md.table_column(t1, "b").unwrap());
        assert!(md.table_column(t1, "c").is_err());
    }

    #[test]
    fn test_copy_from_preserves_ids() {
        let mut from = Metadata::new();
        from.add_table("t1", vec![("a", DataType::Int64)]);
        let x = from.add_column("x", DataType::Int32);

        let mut to = Metadata::new();
        to.copy_from(&from);

        assert_eq!(from, to);
        assert_eq!("x", to.column(x).alias());

        // Allocation continues after the copied ids.
        let y = to.add_column("y", DataType::Int32);
        assert_eq!(ColumnId::from(3), y);
        assert_eq!(2, from.num_columns());
    }

    #[test]
    #[should_panic(expected = "metadata must be empty")]
    fn test_copy_into_non_empty_metadata() {
        let from = Metadata::new();
        let mut to = Metadata::new();
        to.add_column("x", DataType::Int32);
        to.copy_from(&from);
    }
}
