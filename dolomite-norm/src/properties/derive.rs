use arrow_schema::DataType;
use datafusion_common::ScalarValue;

use crate::memo::{GroupId, Memo, MemoExpr};
use crate::metadata::ColSet;
use crate::operator::{binary_result_type, Opcode, Operator};
use crate::properties::{Cardinality, Props, RelationalProps, ScalarProps};

/// Derives logical properties of an expression whose inputs are already memoized.
pub(crate) fn derive_props(memo: &Memo, expr: &MemoExpr) -> Props {
    let can_have_side_effects = expr
        .children()
        .iter()
        .any(|c| memo[*c].props().can_have_side_effects());
    let has_placeholder = expr
        .children()
        .iter()
        .any(|c| memo[*c].props().has_placeholder());

    if expr.opcode().is_relational() {
        let (output_cols, cardinality) = derive_relational(memo, expr);
        Props::Relational(RelationalProps {
            output_cols,
            cardinality,
            can_have_side_effects,
            has_placeholder,
        })
    } else {
        let mut props = ScalarProps {
            data_type: DataType::Null,
            can_have_side_effects,
            has_placeholder,
        };
        derive_scalar(memo, expr, &mut props);
        Props::Scalar(props)
    }
}

fn derive_relational(memo: &Memo, expr: &MemoExpr) -> (ColSet, Cardinality) {
    let input = |idx: usize| memo[expr.child(idx)].relational();

    match expr.operator() {
        Operator::Scan(p) => (p.cols().clone(), Cardinality::ANY),
        Operator::Values(p) => {
            let rows = expr.children().len() as u64;
            (p.cols().iter().copied().collect(), Cardinality::exact(rows))
        }
        Operator::Select => {
            let cardinality = if is_contradiction(memo, expr.child(1)) {
                Cardinality::ZERO
            } else {
                input(0).cardinality.as_low_as_zero()
            };
            (input(0).output_cols.clone(), cardinality)
        }
        Operator::Project(p) => {
            let mut cols = p.passthrough().clone();
            cols.extend(p.cols().iter().copied());
            (cols, input(0).cardinality)
        }
        Operator::Limit => {
            let input = input(0);
            let cardinality = match memo.expr(expr.child(1)).operator() {
                Operator::Const(value) => match limit_rows(value) {
                    Some(rows) => input.cardinality.limit(rows),
                    None => input.cardinality.as_low_as_zero(),
                },
                _ => input.cardinality.as_low_as_zero(),
            };
            (input.output_cols.clone(), cardinality)
        }
        _ => derive_join(memo, expr),
    }
}

fn derive_join(memo: &Memo, expr: &MemoExpr) -> (ColSet, Cardinality) {
    let left = memo[expr.child(0)].relational();
    let right = memo[expr.child(1)].relational();
    let contradiction = is_contradiction(memo, expr.child(2));
    let union = || left.output_cols.union(&right.output_cols).copied().collect();

    let (l, r) = (left.cardinality, right.cardinality);
    match expr.opcode() {
        Opcode::InnerJoin | Opcode::InnerJoinApply => {
            if contradiction {
                (union(), Cardinality::ZERO)
            } else {
                (union(), l.product(&r).as_low_as_zero())
            }
        }
        // Each left row is emitted at least once.
        Opcode::LeftJoin | Opcode::LeftJoinApply => {
            let max = l.product(&r.at_least(1)).max();
            (union(), Cardinality::new(l.min(), max))
        }
        Opcode::RightJoin | Opcode::RightJoinApply => {
            let max = r.product(&l.at_least(1)).max();
            (union(), Cardinality::new(r.min(), max))
        }
        Opcode::FullJoin | Opcode::FullJoinApply => {
            let max = l.at_least(1).product(&r.at_least(1)).max();
            let cardinality = if l.is_zero() && r.is_zero() {
                Cardinality::ZERO
            } else {
                Cardinality::new(l.min().max(r.min()), max)
            };
            (union(), cardinality)
        }
        Opcode::SemiJoin | Opcode::SemiJoinApply => {
            let cardinality = if contradiction || r.is_zero() {
                Cardinality::ZERO
            } else {
                l.as_low_as_zero()
            };
            (left.output_cols.clone(), cardinality)
        }
        Opcode::AntiJoin | Opcode::AntiJoinApply => {
            (left.output_cols.clone(), l.as_low_as_zero())
        }
        other => unreachable!("{} is not a relational operator", other),
    }
}

fn derive_scalar(memo: &Memo, expr: &MemoExpr, props: &mut ScalarProps) {
    props.data_type = match expr.operator() {
        Operator::Variable(col) => memo.metadata().column(*col).data_type().clone(),
        Operator::Const(value) => value.get_datatype(),
        Operator::Null(data_type) => data_type.clone(),
        Operator::True | Operator::False | Operator::Not => DataType::Boolean,
        Operator::Placeholder(p) => {
            props.has_placeholder = true;
            p.data_type().clone()
        }
        Operator::Binary(op) => binary_result_type(
            *op,
            memo[expr.child(0)].scalar().data_type(),
            memo[expr.child(1)].scalar().data_type(),
        ),
        Operator::Function(p) => {
            props.can_have_side_effects |= p.is_volatile();
            p.return_type().clone()
        }
        Operator::Filters | Operator::Projections | Operator::Tuple => DataType::Null,
        other => unreachable!("{} is not a scalar operator", other),
    };
}

/// A filter list containing `false` or `null` never passes a row.
fn is_contradiction(memo: &Memo, filters: GroupId) -> bool {
    memo.expr(filters)
        .children()
        .iter()
        .any(|c| matches!(memo.expr(*c).opcode(), Opcode::False | Opcode::Null))
}

fn limit_rows(value: &ScalarValue) -> Option<u64> {
    let rows = match value {
        ScalarValue::Int16(Some(v)) => *v as i64,
        ScalarValue::Int32(Some(v)) => *v as i64,
        ScalarValue::Int64(Some(v)) => *v,
        ScalarValue::UInt64(Some(v)) => return Some(*v),
        _ => return None,
    };
    Some(rows.max(0) as u64)
}
