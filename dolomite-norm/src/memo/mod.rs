//! Memo of normalized expressions.
//!
//! The memo is a hash consed table of groups. Each group holds one normalized expression, the
//! canonical representative of its equivalence class, together with logical properties derived
//! from it. An expression is keyed by its operator (including private payload) and the groups of
//! its inputs, so inserting an expression which is structurally identical to an existing one
//! returns the existing group instead of creating a duplicate.
//!
//! Groups are only ever appended. Nothing is removed from a memo until it is reset as a whole by
//! [`Memo::init`].

mod explain;
pub use explain::*;

use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Index;

use itertools::Itertools;
use prettytable::{row, Table};
use smallvec::SmallVec;

use crate::metadata::Metadata;
use crate::operator::{Opcode, Operator};
use crate::properties::{PhysicalPropertySet, Props, RelationalProps, ScalarProps};

/// A group id is an index of `groups` in [`Memo`].
#[derive(Hash, Eq, PartialEq, Clone, Copy, Ord, PartialOrd)]
pub struct GroupId(usize);

impl GroupId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Debug for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl Display for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "G{}", self.0)
    }
}

pub type ChildGroups = SmallVec<[GroupId; 3]>;

/// An operator whose inputs are groups.
///
/// It's also the key used to deduplicate expressions, so it should not be changed after creation.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct MemoExpr {
    operator: Operator,
    children: ChildGroups,
}

impl MemoExpr {
    pub fn new<I: IntoIterator<Item = GroupId>>(operator: Operator, children: I) -> Self {
        Self {
            operator,
            children: children.into_iter().collect(),
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn opcode(&self) -> Opcode {
        self.operator.opcode()
    }

    pub fn children(&self) -> &[GroupId] {
        &self.children
    }

    pub fn child(&self, idx: usize) -> GroupId {
        self.children[idx]
    }
}

impl Display for MemoExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}", self.operator)?;
        for child in &self.children {
            write!(f, " {}", child)?;
        }
        write!(f, ")")
    }
}

/// Index of inputs.
impl Index<usize> for MemoExpr {
    type Output = GroupId;

    fn index(&self, index: usize) -> &GroupId {
        &self.children[index]
    }
}

/// A group of logically equivalent expressions.
///
/// Normalization only ever produces one expression per group, the canonical one. Alternatives
/// are left to the exploration phase of a cost based optimizer.
pub struct Group {
    group_id: GroupId,
    expr: MemoExpr,
    /// All expressions in a group share the same logical properties.
    props: Props,
    alternatives: Vec<MemoExpr>,
}

impl Group {
    pub fn id(&self) -> GroupId {
        self.group_id
    }

    /// The normalized expression of this group.
    pub fn expr(&self) -> &MemoExpr {
        &self.expr
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Equivalent expressions other than the normalized one, always empty after normalization.
    pub fn alternatives(&self) -> &[MemoExpr] {
        &self.alternatives
    }

    /// Logical properties of a relational group.
    ///
    /// # Panics
    ///
    /// If this is a scalar group.
    pub fn relational(&self) -> &RelationalProps {
        match &self.props {
            Props::Relational(p) => p,
            Props::Scalar(_) => panic!("group {} is not relational", self.group_id),
        }
    }

    /// # Panics
    ///
    /// If this is a relational group.
    pub fn scalar(&self) -> &ScalarProps {
        match &self.props {
            Props::Scalar(p) => p,
            Props::Relational(_) => panic!("group {} is not scalar", self.group_id),
        }
    }
}

impl Debug for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.group_id, self.expr)
    }
}

/// Dynamic programming table used for storing expression groups.
#[derive(Default)]
pub struct Memo {
    metadata: Metadata,
    /// Used to avoid inserting duplicate expressions.
    interned: HashMap<MemoExpr, GroupId>,
    groups: Vec<Group>,
    root: Option<GroupId>,
    root_props: PhysicalPropertySet,
}

impl Memo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the memo to the empty state, dropping all groups and metadata.
    pub fn init(&mut self) {
        self.metadata = Metadata::new();
        self.interned.clear();
        self.groups.clear();
        self.root = None;
        self.root_props = PhysicalPropertySet::default();
    }

    /// True if nothing has been added to the memo since it was initialized.
    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.groups.is_empty() && self.metadata.is_empty()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn root(&self) -> Option<GroupId> {
        self.root
    }

    /// Physical properties required of the root group.
    pub fn root_props(&self) -> &PhysicalPropertySet {
        &self.root_props
    }

    /// # Panics
    ///
    /// If `group` is not a relational group of this memo.
    pub fn set_root(&mut self, group: GroupId, props: PhysicalPropertySet) {
        assert!(
            self[group].expr.opcode().is_relational(),
            "root of memo must be relational, but got {}",
            self[group].expr
        );
        self.root = Some(group);
        self.root_props = props;
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn expr(&self, group: GroupId) -> &MemoExpr {
        &self[group].expr
    }

    /// Looks up the group of an already memoized expression.
    pub fn find(&self, expr: &MemoExpr) -> Option<GroupId> {
        self.interned.get(expr).copied()
    }

    /// True if the root expression still references unassigned placeholders.
    pub fn has_placeholders(&self) -> bool {
        self.root
            .map(|root| self[root].props.has_placeholder())
            .unwrap_or(false)
    }

    /// Insert an expression and return its group.
    ///
    /// `props` must have been derived from `expr`. They're dropped if the expression is already
    /// memoized.
    pub(crate) fn memoize(&mut self, expr: MemoExpr, props: Props) -> GroupId {
        if let Some(group_id) = self.interned.get(&expr) {
            return *group_id;
        }

        debug_assert!(
            expr.children.iter().all(|c| c.0 < self.groups.len()),
            "expression {} references groups of another memo",
            expr
        );

        let group_id = GroupId(self.groups.len());
        self.interned.insert(expr.clone(), group_id);
        self.groups.push(Group {
            group_id,
            expr,
            props,
            alternatives: vec![],
        });
        group_id
    }
}

impl Index<GroupId> for Memo {
    type Output = Group;

    fn index(&self, index: GroupId) -> &Group {
        &self.groups[index.0]
    }
}

impl Debug for Memo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "Groups in memo:")?;

        let mut table = Table::new();
        table.add_row(row!["Group Id", "Operator", "Inputs", "Properties"]);
        for group in &self.groups {
            let props = match &group.props {
                Props::Relational(p) => format!(
                    "cols: {:?}, cardinality: {}",
                    p.output_cols, p.cardinality
                ),
                Props::Scalar(p) => format!("type: {}", p.data_type),
            };
            table.add_row(row![
                group.group_id,
                group.expr.operator,
                group.expr.children.iter().join(", "),
                props
            ]);
        }
        writeln!(f, "{}", table)?;

        match self.root {
            Some(root) => writeln!(f, "Root: {} {:?}", root, self.root_props),
            None => writeln!(f, "Root: none"),
        }
    }
}
