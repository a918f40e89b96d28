//! ## Background
//!
//! Before a cost based optimizer can search for a good physical plan, the logical plan produced
//! by the binder has to be brought into a canonical form. Normalization rules are substitution
//! rules that are always beneficial, e.g. folding `5 + 3` into `8`, removing a filter that is
//! always true, or replacing a relation that can never produce rows with an empty `Values`.
//!
//! Instead of running normalization as a separate pass over a finished plan, this crate applies
//! normalization rules while the plan is being built, following the design of the normalizing
//! factory in [1]. Every expression handed out by the [`Factory`] is already normalized and
//! memoized, and two logically identical expressions always map to the same memo group.
//!
//! ## Design
//!
//! * [`metadata`] Identifiers of tables and columns referenced by a query.
//! * [`operator`] Relational and scalar operators with their private payloads.
//! * [`properties`] Logical properties derived for each group, and required physical
//! properties of the root.
//! * [`memo`] Hash consed groups of normalized expressions.
//! * [`rules`] Normalization rule definition and the built-in rule library.
//! * [`factory`] Construction entry points, subtree copy and placeholder assignment.
//! * [`eval`] Evaluation context used to assign placeholder values.
//!
//! ## Reference
//!
//! 1. Cockroach Labs, "How we built a cost-based SQL optimizer", 2018.
//! 2. Graefe, G., 1995. The cascades framework for query optimization. IEEE Data Eng. Bull., 18(3),
//! pp.19-29.

pub mod error;
pub mod eval;
pub mod factory;
pub mod memo;
pub mod metadata;
pub mod operator;
pub mod properties;
pub mod rules;

#[cfg(test)]
pub(crate) mod test_utils;

pub use factory::Factory;
pub use memo::{GroupId, Memo, MemoExpr};
