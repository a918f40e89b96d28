use lazy_static::lazy_static;

use crate::factory::Factory;
use crate::memo::{GroupId, Memo, MemoExpr};
use crate::operator::{binary_result_type, is_null_safe, BinaryOperator, Opcode, Operator};
use crate::rules::RuleName::{
    EliminateNotNot, FoldBinary, FoldFalseFilters, FoldNot, FoldNullBinary, RemoveTrueFilters,
    SimplifyAnd,
};
use crate::rules::RulePromise::{High, Medium};
use crate::rules::{
    any, fold_binary, pattern, NormRule, Pattern, PatternBuilder, RuleName, RulePromise,
};

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    static ref BINARY_PATTERN: Pattern = {
        pattern(|op| matches!(op, Operator::Binary(_)))
          .leaf(any)
          .leaf(any)
        .finish()
    };
    static ref FOLD_BINARY_PATTERN: Pattern = {
        pattern(|op| matches!(op, Operator::Binary(_)))
          .leaf(|op| matches!(op, Operator::Const(_)))
          .leaf(|op| matches!(op, Operator::Const(_)))
        .finish()
    };
    static ref SIMPLIFY_AND_PATTERN: Pattern = {
        pattern(|op| matches!(op, Operator::Binary(BinaryOperator::And)))
          .leaf(any)
          .leaf(any)
        .finish()
    };
    static ref FOLD_NOT_PATTERN: Pattern = {
        pattern(|op| matches!(op, Operator::Not))
          .leaf(|op| matches!(op, Operator::True | Operator::False))
        .finish()
    };
    static ref NOT_NOT_PATTERN: Pattern = {
        pattern(|op| matches!(op, Operator::Not))
          .pattern(|op| matches!(op, Operator::Not))
            .leaf(any)
          .finish()
        .finish()
    };
    static ref FILTERS_PATTERN: Pattern = Pattern::new_leaf(|op| matches!(op, Operator::Filters));
}

fn is_null(memo: &Memo, group: GroupId) -> bool {
    memo.expr(group).opcode() == Opcode::Null
}

fn is_bool(memo: &Memo, group: GroupId, value: bool) -> bool {
    let opcode = memo.expr(group).opcode();
    (value && opcode == Opcode::True) || (!value && opcode == Opcode::False)
}

/// Arithmetic and comparison with a null operand is null. `AND` and `OR` are excluded since
/// `NULL AND FALSE` is `FALSE`, and so is `IS [NOT] DISTINCT FROM`, which compares nulls.
#[derive(Clone, Default)]
pub struct FoldNullBinaryRule {}

impl FoldNullBinaryRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl NormRule for FoldNullBinaryRule {
    fn opcode(&self) -> Opcode {
        Opcode::Binary
    }

    fn pattern(&self) -> &Pattern {
        &BINARY_PATTERN
    }

    fn rule_name(&self) -> RuleName {
        FoldNullBinary
    }

    fn rule_promise(&self) -> RulePromise {
        High
    }

    fn can_apply(&self, memo: &Memo, expr: &MemoExpr) -> bool {
        match expr.operator() {
            Operator::Binary(op) if op.is_logic_operator() || is_null_safe(*op) => false,
            Operator::Binary(_) => is_null(memo, expr[0]) || is_null(memo, expr[1]),
            _ => false,
        }
    }

    fn apply(&self, factory: &mut Factory, expr: &MemoExpr) -> GroupId {
        let memo = factory.memo();
        let data_type = match expr.operator() {
            Operator::Binary(op) => binary_result_type(
                *op,
                memo[expr[0]].scalar().data_type(),
                memo[expr[1]].scalar().data_type(),
            ),
            other => unreachable!("{} is not a binary operator", other),
        };
        factory.construct_null(data_type)
    }
}

/// Evaluates a binary operator over two constants.
#[derive(Clone, Default)]
pub struct FoldBinaryRule {}

impl FoldBinaryRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl NormRule for FoldBinaryRule {
    fn opcode(&self) -> Opcode {
        Opcode::Binary
    }

    fn pattern(&self) -> &Pattern {
        &FOLD_BINARY_PATTERN
    }

    fn rule_name(&self) -> RuleName {
        FoldBinary
    }

    fn rule_promise(&self) -> RulePromise {
        Medium
    }

    fn can_apply(&self, memo: &Memo, expr: &MemoExpr) -> bool {
        match (
            expr.operator(),
            memo.expr(expr[0]).operator(),
            memo.expr(expr[1]).operator(),
        ) {
            (Operator::Binary(op), Operator::Const(l), Operator::Const(r)) => {
                fold_binary(*op, l, r).is_some()
            }
            _ => false,
        }
    }

    fn apply(&self, factory: &mut Factory, expr: &MemoExpr) -> GroupId {
        let memo = factory.memo();
        let folded = match (
            expr.operator(),
            memo.expr(expr[0]).operator(),
            memo.expr(expr[1]).operator(),
        ) {
            (Operator::Binary(op), Operator::Const(l), Operator::Const(r)) => {
                factory.custom_funcs().fold_binary(*op, l, r)
            }
            _ => None,
        };

        match folded {
            Some(value) => {
                let data_type = value.get_datatype();
                factory.construct_const_val(value, &data_type)
            }
            None => unreachable!("{} can't be folded", expr),
        }
    }
}

/// `NOT TRUE` to `FALSE` and `NOT FALSE` to `TRUE`.
#[derive(Clone, Default)]
pub struct FoldNotRule {}

impl FoldNotRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl NormRule for FoldNotRule {
    fn opcode(&self) -> Opcode {
        Opcode::Not
    }

    fn pattern(&self) -> &Pattern {
        &FOLD_NOT_PATTERN
    }

    fn rule_name(&self) -> RuleName {
        FoldNot
    }

    fn rule_promise(&self) -> RulePromise {
        Medium
    }

    fn apply(&self, factory: &mut Factory, expr: &MemoExpr) -> GroupId {
        if is_bool(factory.memo(), expr[0], true) {
            factory.construct_false()
        } else {
            factory.construct_true()
        }
    }
}

/// `NOT NOT x` to `x`, which also holds for a null `x`.
#[derive(Clone, Default)]
pub struct EliminateNotNotRule {}

impl EliminateNotNotRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl NormRule for EliminateNotNotRule {
    fn opcode(&self) -> Opcode {
        Opcode::Not
    }

    fn pattern(&self) -> &Pattern {
        &NOT_NOT_PATTERN
    }

    fn rule_name(&self) -> RuleName {
        EliminateNotNot
    }

    fn rule_promise(&self) -> RulePromise {
        High
    }

    fn apply(&self, factory: &mut Factory, expr: &MemoExpr) -> GroupId {
        factory.memo().expr(expr[0])[0]
    }
}

/// `x AND TRUE` to `x`, `x AND FALSE` to `FALSE`.
#[derive(Clone, Default)]
pub struct SimplifyAndRule {}

impl SimplifyAndRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl NormRule for SimplifyAndRule {
    fn opcode(&self) -> Opcode {
        Opcode::Binary
    }

    fn pattern(&self) -> &Pattern {
        &SIMPLIFY_AND_PATTERN
    }

    fn rule_name(&self) -> RuleName {
        SimplifyAnd
    }

    fn rule_promise(&self) -> RulePromise {
        Medium
    }

    fn can_apply(&self, memo: &Memo, expr: &MemoExpr) -> bool {
        let (left, right) = (expr[0], expr[1]);
        if is_bool(memo, left, true) || is_bool(memo, right, true) {
            return true;
        }
        let pure = !memo[left].props().can_have_side_effects()
            && !memo[right].props().can_have_side_effects();
        pure && (is_bool(memo, left, false) || is_bool(memo, right, false))
    }

    fn apply(&self, factory: &mut Factory, expr: &MemoExpr) -> GroupId {
        let memo = factory.memo();
        let (left, right) = (expr[0], expr[1]);
        if is_bool(memo, left, false) || is_bool(memo, right, false) {
            factory.construct_false()
        } else if is_bool(memo, left, true) {
            right
        } else {
            left
        }
    }
}

/// A filter list containing `FALSE` never passes a row, so the other items are dropped.
#[derive(Clone, Default)]
pub struct FoldFalseFiltersRule {}

impl FoldFalseFiltersRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl NormRule for FoldFalseFiltersRule {
    fn opcode(&self) -> Opcode {
        Opcode::Filters
    }

    fn pattern(&self) -> &Pattern {
        &FILTERS_PATTERN
    }

    fn rule_name(&self) -> RuleName {
        FoldFalseFilters
    }

    fn rule_promise(&self) -> RulePromise {
        High
    }

    fn can_apply(&self, memo: &Memo, expr: &MemoExpr) -> bool {
        let items = expr.children();
        items.len() > 1
            && items.iter().any(|c| is_bool(memo, *c, false))
            && !items.iter().any(|c| memo[*c].props().can_have_side_effects())
    }

    fn apply(&self, factory: &mut Factory, _expr: &MemoExpr) -> GroupId {
        let false_item = factory.construct_false();
        factory.construct_filters(vec![false_item])
    }
}

/// Drops `TRUE` items of a filter list.
#[derive(Clone, Default)]
pub struct RemoveTrueFiltersRule {}

impl RemoveTrueFiltersRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl NormRule for RemoveTrueFiltersRule {
    fn opcode(&self) -> Opcode {
        Opcode::Filters
    }

    fn pattern(&self) -> &Pattern {
        &FILTERS_PATTERN
    }

    fn rule_name(&self) -> RuleName {
        RemoveTrueFilters
    }

    fn rule_promise(&self) -> RulePromise {
        Medium
    }

    fn can_apply(&self, memo: &Memo, expr: &MemoExpr) -> bool {
        expr.children().iter().any(|c| is_bool(memo, *c, true))
    }

    fn apply(&self, factory: &mut Factory, expr: &MemoExpr) -> GroupId {
        let items = expr
            .children()
            .iter()
            .copied()
            .filter(|c| !is_bool(factory.memo(), *c, true))
            .collect::<Vec<_>>();
        factory.construct_filters(items)
    }
}
