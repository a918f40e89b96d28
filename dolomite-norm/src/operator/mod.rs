//! Contains relational and scalar operators.
//!
//! Each memoized expression is an [`Operator`] plus the groups of its inputs. The operator carries
//! the operator specific private payload, e.g. the table of a scan, while [`Opcode`] is the plain
//! tag used for rule lookup and pattern matching.
//!
//! Relational operators produce a set of rows, scalar operators produce a single value. Filters,
//! projections and tuples are modeled as scalar list operators, so that every input of a
//! relational operator is a memo group as well.
mod relational;
pub use relational::*;
mod scalar;
pub use scalar::*;

use std::fmt::{Display, Formatter};

use datafusion_common::ScalarValue;
use enum_as_inner::EnumAsInner;
use enumset::{enum_set, EnumSet, EnumSetType};
use strum_macros::{AsRefStr, Display as StrumDisplay};

use crate::metadata::ColumnId;

pub use datafusion_expr::Operator as BinaryOperator;

#[derive(EnumSetType, Debug, Hash, AsRefStr, StrumDisplay)]
pub enum Opcode {
    // Relational operators
    Scan,
    Values,
    Select,
    Project,
    InnerJoin,
    LeftJoin,
    RightJoin,
    FullJoin,
    SemiJoin,
    AntiJoin,
    InnerJoinApply,
    LeftJoinApply,
    RightJoinApply,
    FullJoinApply,
    SemiJoinApply,
    AntiJoinApply,
    Limit,

    // Scalar operators
    Variable,
    Const,
    Null,
    True,
    False,
    Placeholder,
    Binary,
    Not,
    Function,
    Filters,
    Projections,
    Tuple,
}

pub const JOIN_OPS: EnumSet<Opcode> = enum_set!(
    Opcode::InnerJoin
        | Opcode::LeftJoin
        | Opcode::RightJoin
        | Opcode::FullJoin
        | Opcode::SemiJoin
        | Opcode::AntiJoin
        | Opcode::InnerJoinApply
        | Opcode::LeftJoinApply
        | Opcode::RightJoinApply
        | Opcode::FullJoinApply
        | Opcode::SemiJoinApply
        | Opcode::AntiJoinApply
);

pub const RELATIONAL_OPS: EnumSet<Opcode> = enum_set!(
    Opcode::Scan
        | Opcode::Values
        | Opcode::Select
        | Opcode::Project
        | Opcode::InnerJoin
        | Opcode::LeftJoin
        | Opcode::RightJoin
        | Opcode::FullJoin
        | Opcode::SemiJoin
        | Opcode::AntiJoin
        | Opcode::InnerJoinApply
        | Opcode::LeftJoinApply
        | Opcode::RightJoinApply
        | Opcode::FullJoinApply
        | Opcode::SemiJoinApply
        | Opcode::AntiJoinApply
        | Opcode::Limit
);

impl Opcode {
    pub fn is_relational(self) -> bool {
        RELATIONAL_OPS.contains(self)
    }

    pub fn is_join(self) -> bool {
        JOIN_OPS.contains(self)
    }
}

/// An operator together with its private payload.
#[derive(Clone, Debug, Hash, Eq, PartialEq, EnumAsInner)]
pub enum Operator {
    // Relational operators
    Scan(ScanPrivate),
    Values(ValuesPrivate),
    Select,
    Project(ProjectPrivate),
    InnerJoin(JoinPrivate),
    LeftJoin(JoinPrivate),
    RightJoin(JoinPrivate),
    FullJoin(JoinPrivate),
    SemiJoin(JoinPrivate),
    AntiJoin(JoinPrivate),
    InnerJoinApply(JoinPrivate),
    LeftJoinApply(JoinPrivate),
    RightJoinApply(JoinPrivate),
    FullJoinApply(JoinPrivate),
    SemiJoinApply(JoinPrivate),
    AntiJoinApply(JoinPrivate),
    Limit,

    // Scalar operators
    Variable(ColumnId),
    Const(ScalarValue),
    Null(arrow_schema::DataType),
    True,
    False,
    Placeholder(PlaceholderPrivate),
    Binary(BinaryOperator),
    Not,
    Function(FunctionPrivate),
    Filters,
    Projections,
    Tuple,
}

impl Operator {
    pub fn opcode(&self) -> Opcode {
        match self {
            Operator::Scan(_) => Opcode::Scan,
            Operator::Values(_) => Opcode::Values,
            Operator::Select => Opcode::Select,
            Operator::Project(_) => Opcode::Project,
            Operator::InnerJoin(_) => Opcode::InnerJoin,
            Operator::LeftJoin(_) => Opcode::LeftJoin,
            Operator::RightJoin(_) => Opcode::RightJoin,
            Operator::FullJoin(_) => Opcode::FullJoin,
            Operator::SemiJoin(_) => Opcode::SemiJoin,
            Operator::AntiJoin(_) => Opcode::AntiJoin,
            Operator::InnerJoinApply(_) => Opcode::InnerJoinApply,
            Operator::LeftJoinApply(_) => Opcode::LeftJoinApply,
            Operator::RightJoinApply(_) => Opcode::RightJoinApply,
            Operator::FullJoinApply(_) => Opcode::FullJoinApply,
            Operator::SemiJoinApply(_) => Opcode::SemiJoinApply,
            Operator::AntiJoinApply(_) => Opcode::AntiJoinApply,
            Operator::Limit => Opcode::Limit,
            Operator::Variable(_) => Opcode::Variable,
            Operator::Const(_) => Opcode::Const,
            Operator::Null(_) => Opcode::Null,
            Operator::True => Opcode::True,
            Operator::False => Opcode::False,
            Operator::Placeholder(_) => Opcode::Placeholder,
            Operator::Binary(_) => Opcode::Binary,
            Operator::Not => Opcode::Not,
            Operator::Function(_) => Opcode::Function,
            Operator::Filters => Opcode::Filters,
            Operator::Projections => Opcode::Projections,
            Operator::Tuple => Opcode::Tuple,
        }
    }

    pub fn is_relational(&self) -> bool {
        self.opcode().is_relational()
    }

    /// Private payload of a join operator.
    pub fn join_private(&self) -> Option<&JoinPrivate> {
        match self {
            Operator::InnerJoin(p)
            | Operator::LeftJoin(p)
            | Operator::RightJoin(p)
            | Operator::FullJoin(p)
            | Operator::SemiJoin(p)
            | Operator::AntiJoin(p)
            | Operator::InnerJoinApply(p)
            | Operator::LeftJoinApply(p)
            | Operator::RightJoinApply(p)
            | Operator::FullJoinApply(p)
            | Operator::SemiJoinApply(p)
            | Operator::AntiJoinApply(p) => Some(p),
            _ => None,
        }
    }
}

/// Writes operator specific fields after the operator name.
pub trait DisplayFields {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result;
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.opcode())?;
        match self {
            Operator::Scan(p) => p.display(f),
            Operator::Values(p) => p.display(f),
            Operator::Project(p) => p.display(f),
            Operator::Placeholder(p) => p.display(f),
            Operator::Function(p) => p.display(f),
            Operator::Variable(col) => f.debug_struct("").field("col", col).finish(),
            Operator::Const(value) => f
                .debug_struct("")
                .field("value", &format_args!("{}", value))
                .finish(),
            Operator::Null(data_type) => f
                .debug_struct("")
                .field("type", &format_args!("{}", data_type))
                .finish(),
            Operator::Binary(op) => f
                .debug_struct("")
                .field("op", &format_args!("{}", op))
                .finish(),
            other => match other.join_private() {
                Some(p) => p.display(f),
                None => Ok(()),
            },
        }
    }
}
