use lazy_static::lazy_static;

use crate::factory::Factory;
use crate::memo::{GroupId, Memo, MemoExpr};
use crate::operator::{Opcode, Operator};
use crate::rules::RuleName::{CommuteRightJoin, EliminateProject, EliminateSelect};
use crate::rules::RulePromise::{Low, Medium};
use crate::rules::{any, pattern, NormRule, Pattern, PatternBuilder, RuleName, RulePromise};

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    static ref ELIMINATE_SELECT_PATTERN: Pattern = {
        pattern(|op| matches!(op, Operator::Select))
          .leaf(any)
          .leaf(|op| matches!(op, Operator::Filters))
        .finish()
    };
    static ref ELIMINATE_PROJECT_PATTERN: Pattern = {
        pattern(|op| matches!(op, Operator::Project(_)))
          .leaf(any)
          .leaf(|op| matches!(op, Operator::Projections))
        .finish()
    };
    static ref COMMUTE_RIGHT_JOIN_PATTERN: Pattern =
        Pattern::new_leaf(|op| matches!(op, Operator::RightJoin(_)));
}

/// Select with no filter is its input.
#[derive(Clone, Default)]
pub struct EliminateSelectRule {}

impl EliminateSelectRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl NormRule for EliminateSelectRule {
    fn opcode(&self) -> Opcode {
        Opcode::Select
    }

    fn pattern(&self) -> &Pattern {
        &ELIMINATE_SELECT_PATTERN
    }

    fn rule_name(&self) -> RuleName {
        EliminateSelect
    }

    fn rule_promise(&self) -> RulePromise {
        Medium
    }

    fn can_apply(&self, memo: &Memo, expr: &MemoExpr) -> bool {
        memo.expr(expr[1]).children().is_empty()
    }

    fn apply(&self, _factory: &mut Factory, expr: &MemoExpr) -> GroupId {
        expr[0]
    }
}

/// Project which only passes through all input columns is its input.
#[derive(Clone, Default)]
pub struct EliminateProjectRule {}

impl EliminateProjectRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl NormRule for EliminateProjectRule {
    fn opcode(&self) -> Opcode {
        Opcode::Project
    }

    fn pattern(&self) -> &Pattern {
        &ELIMINATE_PROJECT_PATTERN
    }

    fn rule_name(&self) -> RuleName {
        EliminateProject
    }

    fn rule_promise(&self) -> RulePromise {
        Medium
    }

    fn can_apply(&self, memo: &Memo, expr: &MemoExpr) -> bool {
        match expr.operator() {
            Operator::Project(p) => {
                p.cols().is_empty()
                    && memo.expr(expr[1]).children().is_empty()
                    && p.passthrough() == memo[expr[0]].relational().output_cols()
            }
            _ => false,
        }
    }

    fn apply(&self, _factory: &mut Factory, expr: &MemoExpr) -> GroupId {
        expr[0]
    }
}

/// `a RIGHT JOIN b` to `b LEFT JOIN a`, so that later rules only deal with left joins.
#[derive(Clone, Default)]
pub struct CommuteRightJoinRule {}

impl CommuteRightJoinRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl NormRule for CommuteRightJoinRule {
    fn opcode(&self) -> Opcode {
        Opcode::RightJoin
    }

    fn pattern(&self) -> &Pattern {
        &COMMUTE_RIGHT_JOIN_PATTERN
    }

    fn rule_name(&self) -> RuleName {
        CommuteRightJoin
    }

    fn rule_promise(&self) -> RulePromise {
        Low
    }

    fn apply(&self, factory: &mut Factory, expr: &MemoExpr) -> GroupId {
        match expr.operator() {
            Operator::RightJoin(p) => {
                factory.construct_left_join(expr[1], expr[0], expr[2], p.clone())
            }
            other => unreachable!("{} is not a right join", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;
    use datafusion_common::ScalarValue;

    use crate::operator::{BinaryOperator, JoinPrivate, Opcode, ProjectPrivate};
    use crate::test_utils::{col, col_id, filters, new_factory, scan};

    #[test]
    fn test_eliminate_select() {
        let mut factory = new_factory();
        let t1 = scan(&mut factory, "t1");
        let t = factory.construct_true();
        let on = filters(&mut factory, vec![t]);
        assert_eq!(t1, factory.construct_select(t1, on));
    }

    #[test]
    fn test_eliminate_project() {
        let mut factory = new_factory();
        let t1 = scan(&mut factory, "t1");
        let cols = factory.memo()[t1].relational().output_cols().clone();
        let projections = factory.construct_projections(vec![]);

        let project =
            factory.construct_project(t1, projections, ProjectPrivate::new(vec![], cols));
        assert_eq!(t1, project);

        // Pruning a column is not a no-op.
        let c1 = col_id(&factory, "t1", "c1");
        let pruned = vec![c1].into_iter().collect();
        let project =
            factory.construct_project(t1, projections, ProjectPrivate::new(vec![], pruned));
        assert_eq!(Opcode::Project, factory.memo().expr(project).opcode());
    }

    #[test]
    fn test_commute_right_join() {
        let mut factory = new_factory();
        let t1 = scan(&mut factory, "t1");
        let t2 = scan(&mut factory, "t2");
        let c1 = col(&mut factory, "t1", "c1");
        let c3 = col(&mut factory, "t2", "c3");
        let one = factory.construct_const_val(ScalarValue::Int64(Some(1)), &DataType::Int64);
        let eq = factory.construct_binary(BinaryOperator::Eq, c1, c3);
        let gt = factory.construct_binary(BinaryOperator::Gt, c3, one);
        let on = filters(&mut factory, vec![eq, gt]);

        let right = factory.construct_right_join(t1, t2, on, JoinPrivate::default());
        let left = factory.construct_left_join(t2, t1, on, JoinPrivate::default());
        assert_eq!(left, right);
        assert_eq!(Opcode::LeftJoin, factory.memo().expr(right).opcode());
    }
}
