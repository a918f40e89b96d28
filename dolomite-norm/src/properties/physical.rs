use crate::metadata::ColumnId;

/// Ordering of one column.
#[derive(Hash, Debug, Clone, Eq, PartialEq)]
pub struct Ordering {
    column: ColumnId,
    /// Ascending or descending.
    asc: bool,
    /// Should null be treated first.
    null_first: bool,
}

impl Ordering {
    pub fn new(column: ColumnId, asc: bool, null_first: bool) -> Self {
        Self {
            column,
            asc,
            null_first,
        }
    }

    pub fn column(&self) -> ColumnId {
        self.column
    }
}

/// Ordering property specification.
#[derive(Hash, Debug, Clone, Eq, PartialEq, Default)]
pub struct OrderSpec {
    orders: Vec<Ordering>,
}

impl OrderSpec {
    pub fn new<I: IntoIterator<Item = Ordering>>(orders: I) -> Self {
        Self {
            orders: orders.into_iter().collect(),
        }
    }

    pub fn orders(&self) -> &[Ordering] {
        &self.orders
    }

    /// Tests whether rows sorted by `self` are also sorted by `required`.
    pub fn satisfies(&self, required: &OrderSpec) -> bool {
        required.orders.len() <= self.orders.len()
            && required.orders.iter().zip(&self.orders).all(|(r, o)| r == o)
    }
}

/// Physical properties required of the root of a memo.
#[derive(Hash, Debug, Clone, Eq, PartialEq, Default)]
pub struct PhysicalPropertySet {
    ordering: OrderSpec,
}

impl PhysicalPropertySet {
    pub fn with_ordering(ordering: OrderSpec) -> Self {
        Self { ordering }
    }

    pub fn ordering(&self) -> &OrderSpec {
        &self.ordering
    }
}
