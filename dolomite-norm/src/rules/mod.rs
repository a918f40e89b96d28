//! Normalization rules.
//!
//! A normalization rule is a substitution rule which always produces a better expression than
//! its input, e.g. [`FoldBinaryRule`] folds `5 + 3` into `8`. Unlike exploration rules of a cost
//! based optimizer, a normalization rule never keeps the original expression around: the
//! [`Factory`] tries the rules registered for an operator before memoizing it, and the first rule
//! which matches replaces the expression entirely.
//!
//! ## Pattern
//!
//! A pattern defines what expression the rule should operate on. Take [`FoldNotRule`] as an
//! example, its pattern is defined as following:
//! ```no
//! static ref FOLD_NOT_PATTERN: Pattern = {
//!     pattern(|op| matches!(op, Operator::Not))
//!         .leaf(|op| matches!(op, Operator::True | Operator::False))
//!     .finish()
//! };
//! ```
//!
//! Conditions which can't be expressed by the shape of the expression, e.g. that a filter list
//! contains a `false` item, are checked by [`NormRule::can_apply`]. Both checks are read only.
//! Only after both passed, and the matched rule hook of the factory didn't veto it, is
//! [`NormRule::apply`] invoked. `apply` builds the replacement by calling back into the
//! factory, so the replacement is normalized recursively.
//!
//! ## Rule library
//!
//! Rules are grouped by the [`Opcode`] they are registered for in a [`RuleSet`]. Rules defined
//! outside of this crate plug in through [`NormRuleImpl::Custom`].
//!
//! [`Factory`]: crate::Factory
mod pattern;
pub use pattern::*;
mod custom_funcs;
pub use custom_funcs::*;
mod scalar;
pub use scalar::*;
mod relational;
pub use relational::*;

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use enum_dispatch::enum_dispatch;
use enumset::EnumSetType;
use strum_macros::{AsRefStr, Display as StrumDisplay};

use crate::factory::Factory;
use crate::memo::{GroupId, Memo, MemoExpr};
use crate::operator::Opcode;

/// Identifies a rule in the hooks of the factory.
#[derive(EnumSetType, Debug, Hash, AsRefStr, StrumDisplay)]
pub enum RuleName {
    // Scalar rules
    FoldNullBinary,
    FoldBinary,
    FoldNot,
    EliminateNotNot,
    SimplifyAnd,
    FoldFalseFilters,
    RemoveTrueFilters,

    // Relational rules
    EliminateSelect,
    EliminateProject,
    CommuteRightJoin,
    SimplifyZeroCardinalityGroup,

    /// Any rule plugged in from outside of the built-in library.
    External,
}

/// Rules registered for the same operator are tried in decreasing promise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RulePromise {
    Low = 1,
    Medium = 2,
    High = 3,
}

#[enum_dispatch(NormRuleImpl)]
pub trait NormRule {
    /// Operator this rule is registered for.
    fn opcode(&self) -> Opcode;

    /// Pattern for rule.
    fn pattern(&self) -> &Pattern;

    fn rule_name(&self) -> RuleName;

    fn rule_promise(&self) -> RulePromise;

    /// Extra condition checked after the pattern matched.
    fn can_apply(&self, _memo: &Memo, _expr: &MemoExpr) -> bool {
        true
    }

    /// Builds the replacement of `expr` and returns its group.
    fn apply(&self, factory: &mut Factory, expr: &MemoExpr) -> GroupId;
}

pub type ExternalRule = Arc<dyn NormRule + Send + Sync>;

impl NormRule for ExternalRule {
    fn opcode(&self) -> Opcode {
        (**self).opcode()
    }

    fn pattern(&self) -> &Pattern {
        (**self).pattern()
    }

    fn rule_name(&self) -> RuleName {
        (**self).rule_name()
    }

    fn rule_promise(&self) -> RulePromise {
        (**self).rule_promise()
    }

    fn can_apply(&self, memo: &Memo, expr: &MemoExpr) -> bool {
        (**self).can_apply(memo, expr)
    }

    fn apply(&self, factory: &mut Factory, expr: &MemoExpr) -> GroupId {
        (**self).apply(factory, expr)
    }
}

#[enum_dispatch]
#[derive(Clone, AsRefStr)]
pub enum NormRuleImpl {
    // Scalar rules
    FoldNullBinaryRule,
    FoldBinaryRule,
    FoldNotRule,
    EliminateNotNotRule,
    SimplifyAndRule,
    FoldFalseFiltersRule,
    RemoveTrueFiltersRule,

    // Relational rules
    EliminateSelectRule,
    EliminateProjectRule,
    CommuteRightJoinRule,

    Custom(ExternalRule),
}

impl Debug for NormRuleImpl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_ref())
    }
}

/// Rules grouped by the operator they are registered for.
#[derive(Clone, Debug)]
pub struct RuleSet {
    rules: HashMap<Opcode, Vec<NormRuleImpl>>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    pub fn new<I: IntoIterator<Item = NormRuleImpl>>(rules: I) -> Self {
        let mut rule_set = Self::empty();
        for rule in rules {
            rule_set.add(rule);
        }
        rule_set
    }

    pub fn add(&mut self, rule: NormRuleImpl) {
        let rules = self.rules.entry(rule.opcode()).or_default();
        rules.push(rule);
        // Stable, so rules with equal promise keep insertion order.
        rules.sort_by(|a, b| b.rule_promise().cmp(&a.rule_promise()));
    }

    /// Rules of `opcode` in the order they should be tried.
    pub fn rules_for(&self, opcode: Opcode) -> &[NormRuleImpl] {
        self.rules.get(&opcode).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// The built-in rule library.
impl Default for RuleSet {
    fn default() -> Self {
        Self::new(vec![
            FoldNullBinaryRule::new().into(),
            FoldBinaryRule::new().into(),
            FoldNotRule::new().into(),
            EliminateNotNotRule::new().into(),
            SimplifyAndRule::new().into(),
            FoldFalseFiltersRule::new().into(),
            RemoveTrueFiltersRule::new().into(),
            EliminateSelectRule::new().into(),
            EliminateProjectRule::new().into(),
            CommuteRightJoinRule::new().into(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lazy_static::lazy_static;

    use crate::factory::Factory;
    use crate::memo::{GroupId, MemoExpr};
    use crate::operator::{BinaryOperator, Opcode, Operator};
    use crate::rules::{
        any, pattern, NormRule, NormRuleImpl, Pattern, PatternBuilder, RuleName, RulePromise,
        RuleSet,
    };
    use crate::test_utils::{col, new_factory_with_rules};

    lazy_static! {
        static ref NOT_EQ_PATTERN: Pattern = {
            pattern(|op| matches!(op, Operator::Not))
                .pattern(|op| matches!(op, Operator::Binary(BinaryOperator::Eq)))
                .leaf(any)
                .leaf(any)
                .finish()
                .finish()
        };
    }

    /// `NOT (a = b)` to `a <> b`.
    struct NegateEq;

    impl NormRule for NegateEq {
        fn opcode(&self) -> Opcode {
            Opcode::Not
        }

        fn pattern(&self) -> &Pattern {
            &NOT_EQ_PATTERN
        }

        fn rule_name(&self) -> RuleName {
            RuleName::External
        }

        fn rule_promise(&self) -> RulePromise {
            RulePromise::High
        }

        fn apply(&self, factory: &mut Factory, expr: &MemoExpr) -> GroupId {
            let eq = factory.memo().expr(expr.child(0)).clone();
            factory.construct_binary(BinaryOperator::NotEq, eq.child(0), eq.child(1))
        }
    }

    #[test]
    fn test_rule_order() {
        let rules = RuleSet::default();
        let binary_rules = rules.rules_for(Opcode::Binary);
        assert_eq!(3, binary_rules.len());
        assert_eq!(RuleName::FoldNullBinary, binary_rules[0].rule_name());
        assert!(rules.rules_for(Opcode::Scan).is_empty());

        let not_rules = rules.rules_for(Opcode::Not);
        assert_eq!(RuleName::EliminateNotNot, not_rules[0].rule_name());
        assert_eq!(RuleName::FoldNot, not_rules[1].rule_name());
    }

    #[test]
    fn test_external_rule() {
        let rule: NormRuleImpl = NormRuleImpl::Custom(Arc::new(NegateEq));
        let mut factory = new_factory_with_rules(RuleSet::new(vec![rule]));

        let c1 = col(&mut factory, "t1", "c1");
        let c2 = col(&mut factory, "t1", "c2");
        let eq = factory.construct_binary(BinaryOperator::Eq, c1, c2);
        let not = factory.construct_not(eq);
        assert_eq!(
            &Operator::Binary(BinaryOperator::NotEq),
            factory.memo().expr(not).operator()
        );
        assert_eq!(&[c1, c2], factory.memo().expr(not).children());

        // Only the built-in library would simplify `NOT NOT`.
        let not_not = factory.construct_not(not);
        assert_eq!(Opcode::Not, factory.memo().expr(not_not).opcode());
    }
}
