//! Properties of operators.
//!
//! Currently we have two kinds of properties: logical properties and [`PhysicalPropertySet`].
//! Logical properties are things shared by logically equivalent expressions, such as output
//! columns and cardinality, and are derived once when a group is memoized. Physical properties
//! are concerned with ordering, and are only required of the root of a memo.

mod cardinality;
pub use cardinality::*;
mod logical;
pub use logical::*;
mod physical;
pub use physical::*;
pub(crate) mod derive;
