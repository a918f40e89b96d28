//! Normalizing factory.
//!
//! The factory is the only way to add expressions to a memo. Every `construct_*` function takes
//! inputs which are already normalized, and returns the group of the normalized form of the
//! requested expression:
//!
//! 1. The rules registered for the operator are tried in order of promise. The first rule which
//! matches, and is not vetoed by the matched rule hook, builds the replacement by calling back
//! into the factory. Its result is returned as is, since it's normalized already.
//! 2. Otherwise logical properties are derived. A relational expression which is proven to
//! return no rows and has no side effects is replaced by an empty `Values` with the same output
//! columns.
//! 3. The expression is memoized. An identical expression already in the memo is reused.
//!
//! A factory owns its memo until [`Factory::detach_memo`] hands it over to the caller. A detached
//! memo is read only, and can be used as the source of [`Factory::copy_and_replace`] or
//! [`Factory::assign_placeholders`] by any number of factories at the same time.
mod construct;
mod replace;
pub use replace::*;

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use arrow_schema::DataType;
use datafusion_common::ScalarValue;
use log::{debug, trace};

use crate::eval::EvalContext;
use crate::memo::{GroupId, Memo, MemoExpr};
use crate::metadata::{ColSet, Metadata};
use crate::operator::{JoinPrivate, Opcode, Operator, ValuesPrivate};
use crate::properties::derive::derive_props;
use crate::properties::{PhysicalPropertySet, Props};
use crate::rules::{CustomFuncs, NormRule, RuleName, RuleSet};

/// Consulted before a matched rule is applied, returns `false` to skip the rule.
pub type MatchedRuleFn = Box<dyn FnMut(RuleName) -> bool>;

/// Called after a rule replaced an expression, with the replaced expression and the group of its
/// replacement.
pub type AppliedRuleFn = Box<dyn FnMut(RuleName, &MemoExpr, GroupId)>;

pub struct Factory {
    eval_ctx: Arc<EvalContext>,
    mem: Memo,
    funcs: CustomFuncs,
    matched_rule: Option<MatchedRuleFn>,
    applied_rule: Option<AppliedRuleFn>,
    /// Source group to its copy, only during [`Factory::copy_and_replace`].
    copied: Option<HashMap<GroupId, GroupId>>,
}

impl Factory {
    /// Creates a factory with the built-in rule library.
    pub fn new(eval_ctx: Arc<EvalContext>) -> Self {
        Self::with_rules(eval_ctx, Arc::new(RuleSet::default()))
    }

    pub fn with_rules(eval_ctx: Arc<EvalContext>, rules: Arc<RuleSet>) -> Self {
        let mut factory = Self {
            eval_ctx: eval_ctx.clone(),
            mem: Memo::new(),
            funcs: CustomFuncs::new(rules),
            matched_rule: None,
            applied_rule: None,
            copied: None,
        };
        factory.init(eval_ctx);
        factory
    }

    /// Resets the memo and removes all hooks, so that the factory can build another expression.
    ///
    /// The rule library is kept.
    pub fn init(&mut self, eval_ctx: Arc<EvalContext>) {
        debug!("Initializing factory, discarding {} groups", self.mem.group_count());
        self.mem.init();
        self.eval_ctx = eval_ctx;
        self.matched_rule = None;
        self.applied_rule = None;
    }

    /// Hands over the memo built so far and starts over with an empty one.
    ///
    /// The returned memo must not be changed anymore, so it's shared read only.
    pub fn detach_memo(&mut self) -> Arc<Memo> {
        let memo = std::mem::take(&mut self.mem);
        debug!(
            "Detaching memo with {} groups, root: {:?}",
            memo.group_count(),
            memo.root()
        );
        self.init(self.eval_ctx.clone());
        Arc::new(memo)
    }

    /// Vetoes all rules, so that the constructed expression is exactly the requested one.
    pub fn disable_optimizations(&mut self) {
        self.notify_on_matched_rule(Some(Box::new(|_: RuleName| false)));
    }

    /// Sets the hook consulted before each matched rule is applied. `None` applies all rules.
    pub fn notify_on_matched_rule(&mut self, matched_rule: Option<MatchedRuleFn>) {
        self.matched_rule = matched_rule;
    }

    /// Sets the hook called after each applied rule.
    pub fn notify_on_applied_rule(&mut self, applied_rule: Option<AppliedRuleFn>) {
        self.applied_rule = applied_rule;
    }

    /// Marks `group` as the root of the memo, requiring `props` of it.
    ///
    /// # Panics
    ///
    /// If `group` is not relational.
    pub fn set_root(&mut self, group: GroupId, props: PhysicalPropertySet) {
        self.mem.set_root(group, props);
    }

    pub fn memo(&self) -> &Memo {
        &self.mem
    }

    pub fn metadata(&self) -> &Metadata {
        self.mem.metadata()
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        self.mem.metadata_mut()
    }

    pub fn custom_funcs(&self) -> &CustomFuncs {
        &self.funcs
    }

    pub fn eval_ctx(&self) -> &Arc<EvalContext> {
        &self.eval_ctx
    }

    /// Constructs the join of kind `opcode`.
    ///
    /// # Panics
    ///
    /// If `opcode` is not a join operator.
    pub fn construct_join(
        &mut self,
        opcode: Opcode,
        left: GroupId,
        right: GroupId,
        on: GroupId,
        private: JoinPrivate,
    ) -> GroupId {
        match opcode {
            Opcode::InnerJoin => self.construct_inner_join(left, right, on, private),
            Opcode::LeftJoin => self.construct_left_join(left, right, on, private),
            Opcode::RightJoin => self.construct_right_join(left, right, on, private),
            Opcode::FullJoin => self.construct_full_join(left, right, on, private),
            Opcode::SemiJoin => self.construct_semi_join(left, right, on, private),
            Opcode::AntiJoin => self.construct_anti_join(left, right, on, private),
            Opcode::InnerJoinApply => self.construct_inner_join_apply(left, right, on, private),
            Opcode::LeftJoinApply => self.construct_left_join_apply(left, right, on, private),
            Opcode::RightJoinApply => self.construct_right_join_apply(left, right, on, private),
            Opcode::FullJoinApply => self.construct_full_join_apply(left, right, on, private),
            Opcode::SemiJoinApply => self.construct_semi_join_apply(left, right, on, private),
            Opcode::AntiJoinApply => self.construct_anti_join_apply(left, right, on, private),
            other => panic!("unexpected join operator: {}", other),
        }
    }

    /// Constructs a constant of `data_type`.
    ///
    /// Null and booleans get their dedicated operators, so that rules can match them without
    /// looking at the value.
    pub fn construct_const_val(&mut self, value: ScalarValue, data_type: &DataType) -> GroupId {
        match value {
            v if v.is_null() => self.construct_null(data_type.clone()),
            ScalarValue::Boolean(Some(true)) => self.construct_true(),
            ScalarValue::Boolean(Some(false)) => self.construct_false(),
            v => self.construct_const(v),
        }
    }

    /// A `Values` without rows or columns.
    pub fn construct_zero_values(&mut self) -> GroupId {
        self.construct_values(vec![], ValuesPrivate::default())
    }

    /// A `Values` without rows, producing `cols`.
    pub fn construct_empty_values(&mut self, cols: ColSet) -> GroupId {
        self.construct_values(vec![], ValuesPrivate::new(cols.into_iter().collect()))
    }

    /// Constructs an expression of any operator.
    ///
    /// # Panics
    ///
    /// If the number of children doesn't fit the operator.
    pub fn dynamic_construct<I>(&mut self, operator: Operator, children: I) -> GroupId
    where
        I: IntoIterator<Item = GroupId>,
    {
        let expr = MemoExpr::new(operator, children);
        if let Some(arity) = fixed_arity(expr.opcode()) {
            assert_eq!(
                arity,
                expr.children().len(),
                "wrong number of children for {}",
                expr.operator()
            );
        }
        self.construct(expr)
    }

    /// Normalizes and memoizes `expr`.
    fn construct(&mut self, expr: MemoExpr) -> GroupId {
        let rules = self.funcs.rules().clone();
        for rule in rules.rules_for(expr.opcode()) {
            if !rule.pattern().matches(&self.mem, &expr) || !rule.can_apply(&self.mem, &expr) {
                continue;
            }
            let rule_name = rule.rule_name();
            if !self.allow_rule(rule_name) {
                trace!("Rule {} vetoed for {}", rule_name, expr);
                continue;
            }

            let group = rule.apply(self, &expr);
            trace!("Rule {} replaced {} with {}", rule_name, expr, group);
            self.notify_applied(rule_name, &expr, group);
            return group;
        }

        let props = derive_props(&self.mem, &expr);
        match props {
            Props::Relational(_) => self.on_construct_relational(expr, props),
            Props::Scalar(_) => self.on_construct_scalar(expr, props),
        }
    }

    fn on_construct_relational(&mut self, expr: MemoExpr, props: Props) -> GroupId {
        // Collapsing `Values` would build `Values` again.
        if expr.opcode() != Opcode::Values {
            if let Props::Relational(p) = &props {
                if p.cardinality().is_zero()
                    && !p.can_have_side_effects()
                    && self.allow_rule(RuleName::SimplifyZeroCardinalityGroup)
                {
                    let group = self.construct_empty_values(p.output_cols().clone());
                    trace!("{} returns no rows, replaced with {}", expr, group);
                    self.notify_applied(RuleName::SimplifyZeroCardinalityGroup, &expr, group);
                    return group;
                }
            }
        }
        self.mem.memoize(expr, props)
    }

    fn on_construct_scalar(&mut self, expr: MemoExpr, props: Props) -> GroupId {
        self.mem.memoize(expr, props)
    }

    fn allow_rule(&mut self, rule_name: RuleName) -> bool {
        match self.matched_rule.as_mut() {
            Some(matched_rule) => matched_rule(rule_name),
            None => true,
        }
    }

    fn notify_applied(&mut self, rule_name: RuleName, source: &MemoExpr, target: GroupId) {
        if let Some(applied_rule) = self.applied_rule.as_mut() {
            applied_rule(rule_name, source, target);
        }
    }
}

/// Number of children of operators whose arity doesn't depend on the expression.
fn fixed_arity(opcode: Opcode) -> Option<usize> {
    match opcode {
        Opcode::Scan
        | Opcode::Variable
        | Opcode::Const
        | Opcode::Null
        | Opcode::True
        | Opcode::False
        | Opcode::Placeholder => Some(0),
        Opcode::Not => Some(1),
        Opcode::Select | Opcode::Project | Opcode::Limit | Opcode::Binary => Some(2),
        op if op.is_join() => Some(3),
        _ => None,
    }
}

impl Debug for Factory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("memo", &self.mem)
            .field("eval_ctx", &self.eval_ctx)
            .field("rules", self.funcs.rules())
            .finish()
    }
}
