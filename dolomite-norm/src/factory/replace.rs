use std::collections::HashMap;

use log::debug;

use crate::error::NormResult;
use crate::eval::EvalContext;
use crate::factory::Factory;
use crate::memo::{ChildGroups, GroupId, Memo};
use crate::operator::Operator;
use crate::properties::PhysicalPropertySet;

/// Decides what each group of the source memo becomes in the destination memo during
/// [`Factory::copy_and_replace`].
pub trait Replacer {
    /// Returns the group in the memo of `factory` replacing `src` of `from`.
    ///
    /// Implementations which don't replace `src` delegate to
    /// [`Factory::copy_and_replace_default`], which replaces the children with this replacer and
    /// constructs the operator of `src` again.
    fn replace(&mut self, factory: &mut Factory, from: &Memo, src: GroupId) -> NormResult<GroupId>;
}

/// Copies every group as is.
#[derive(Default)]
pub struct CopyReplacer {}

impl Replacer for CopyReplacer {
    fn replace(&mut self, factory: &mut Factory, from: &Memo, src: GroupId) -> NormResult<GroupId> {
        factory.copy_and_replace_default(from, src, self)
    }
}

/// Replaces placeholders with their values in an [`EvalContext`].
pub struct PlaceholderReplacer<'a> {
    eval_ctx: &'a EvalContext,
}

impl<'a> PlaceholderReplacer<'a> {
    pub fn new(eval_ctx: &'a EvalContext) -> Self {
        Self { eval_ctx }
    }
}

impl<'a> Replacer for PlaceholderReplacer<'a> {
    fn replace(&mut self, factory: &mut Factory, from: &Memo, src: GroupId) -> NormResult<GroupId> {
        match from.expr(src).operator() {
            Operator::Placeholder(p) => {
                let value = self.eval_ctx.eval_placeholder(p)?;
                Ok(factory.construct_const_val(value, p.data_type()))
            }
            _ => factory.copy_and_replace_default(from, src, self),
        }
    }
}

impl Factory {
    /// Copies the expression rooted at `src` of `from` into the memo of this factory, letting
    /// `replacer` substitute groups on the way. The copy becomes the root of the memo, requiring
    /// `props`.
    ///
    /// Metadata of `from` is copied first with the same ids, so column references stay valid.
    /// `from` is never changed.
    ///
    /// # Panics
    ///
    /// If the memo of this factory is not empty.
    pub fn copy_and_replace<R: Replacer + ?Sized>(
        &mut self,
        from: &Memo,
        src: GroupId,
        props: PhysicalPropertySet,
        replacer: &mut R,
    ) -> NormResult<GroupId> {
        assert!(
            self.mem.is_empty(),
            "destination memo must be empty before copy and replace"
        );

        self.mem.metadata_mut().copy_from(from.metadata());
        self.copied = Some(HashMap::new());
        let root = replacer.replace(self, from, src);
        let copied = self.copied.take().map_or(0, |copied| copied.len());
        let root = root?;

        self.mem.set_root(root, props);
        debug!("Copied group {} to {}, {} inputs copied", src, root, copied);
        Ok(root)
    }

    /// Copies `src` by replacing its children with `replacer`, then constructing its operator
    /// over the replaced children, so that the copy is normalized again.
    ///
    /// Within [`Factory::copy_and_replace`] each source group is handed to `replacer` once, later
    /// references to it reuse the first replacement.
    pub fn copy_and_replace_default<R: Replacer + ?Sized>(
        &mut self,
        from: &Memo,
        src: GroupId,
        replacer: &mut R,
    ) -> NormResult<GroupId> {
        let expr = from.expr(src);
        let mut children = ChildGroups::with_capacity(expr.children().len());
        for child in expr.children() {
            let cached = self.copied.as_ref().and_then(|c| c.get(child).copied());
            let group = match cached {
                Some(group) => group,
                None => {
                    let group = replacer.replace(self, from, *child)?;
                    if let Some(copied) = self.copied.as_mut() {
                        copied.insert(*child, group);
                    }
                    group
                }
            };
            children.push(group);
        }
        Ok(self.dynamic_construct(expr.operator().clone(), children))
    }

    /// Builds a copy of `from` with every placeholder replaced by its value in the evaluation
    /// context of this factory. The copy is normalized again, so rules blocked by placeholders
    /// may apply now.
    ///
    /// On error the memo of this factory is reset to empty, `from` is never changed.
    ///
    /// # Panics
    ///
    /// If the memo of this factory is not empty, or `from` has no root.
    pub fn assign_placeholders(&mut self, from: &Memo) -> NormResult<()> {
        let root = match from.root() {
            Some(root) => root,
            None => panic!("can't assign placeholders of a memo without root"),
        };

        let eval_ctx = self.eval_ctx.clone();
        let mut replacer = PlaceholderReplacer::new(&eval_ctx);
        match self.copy_and_replace(from, root, from.root_props().clone(), &mut replacer) {
            Ok(new_root) => {
                debug!("Assigned placeholders, new root: {}", new_root);
                Ok(())
            }
            Err(e) => {
                debug!("Failed to assign placeholders: {}", e);
                self.mem.init();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;

    use arrow_schema::DataType;
    use datafusion_common::ScalarValue;
    use maplit::hashmap;

    use crate::error::{EvalError, NormResult};
    use crate::eval::EvalContext;
    use crate::factory::{CopyReplacer, Factory, Replacer};
    use crate::memo::{GroupId, Memo, MemoExpr};
    use crate::metadata::ColSet;
    use crate::operator::{
        BinaryOperator, Opcode, Operator, PlaceholderIdx, PlaceholderPrivate, ProjectPrivate,
    };
    use crate::properties::{OrderSpec, Ordering, PhysicalPropertySet};
    use crate::test_utils::{col, col_id, filters, new_factory, new_factory_with_ctx, scan};

    /// `SELECT * FROM t1 WHERE c1 > $1 + 3`
    fn parameterized_memo() -> Arc<Memo> {
        let mut factory = new_factory();
        let t1 = scan(&mut factory, "t1");
        let c1 = col(&mut factory, "t1", "c1");
        let p = factory.construct_placeholder(PlaceholderPrivate::new(
            PlaceholderIdx::new(0),
            DataType::Int64,
        ));
        let three = factory.construct_const_val(ScalarValue::Int64(Some(3)), &DataType::Int64);
        let sum = factory.construct_binary(BinaryOperator::Plus, p, three);
        let gt = factory.construct_binary(BinaryOperator::Gt, c1, sum);
        let on = filters(&mut factory, vec![gt]);
        let select = factory.construct_select(t1, on);
        factory.set_root(select, PhysicalPropertySet::default());
        factory.detach_memo()
    }

    fn ctx_with(values: Vec<(u16, ScalarValue)>) -> Arc<EvalContext> {
        Arc::new(EvalContext::with_placeholders(
            values
                .into_iter()
                .map(|(idx, value)| (PlaceholderIdx::new(idx), value)),
        ))
    }

    #[test]
    fn test_copy() {
        let from = parameterized_memo();
        let root = from.root().unwrap();

        let mut factory = new_factory_with_ctx(Arc::new(EvalContext::new()));
        let copied = factory
            .copy_and_replace(
                &from,
                root,
                PhysicalPropertySet::default(),
                &mut CopyReplacer::default(),
            )
            .unwrap();

        let memo = factory.memo();
        assert_eq!(Some(copied), memo.root());
        assert_eq!(from.metadata(), memo.metadata());
        assert_eq!(from.group_count(), memo.group_count());
        assert!(memo.has_placeholders());

        // Extending the copy leaves the source alone.
        let group_count = from.group_count();
        let t2 = scan(&mut factory, "t2");
        assert_eq!(Opcode::Scan, factory.memo().expr(t2).opcode());
        assert_eq!(group_count, from.group_count());
    }

    #[test]
    #[should_panic(expected = "destination memo must be empty")]
    fn test_copy_into_non_empty_memo() {
        let from = parameterized_memo();
        let mut factory = new_factory();
        factory
            .copy_and_replace(
                &from,
                from.root().unwrap(),
                PhysicalPropertySet::default(),
                &mut CopyReplacer::default(),
            )
            .unwrap();
    }

    #[test]
    fn test_custom_replacer() {
        /// Replaces scans of `t1` with an empty `Values`.
        struct EmptyT1 {
            replaced: usize,
        }

        impl Replacer for EmptyT1 {
            fn replace(
                &mut self,
                factory: &mut Factory,
                from: &Memo,
                src: GroupId,
            ) -> NormResult<GroupId> {
                let t1 = from.metadata().table_by_name("t1").unwrap();
                match from.expr(src).operator() {
                    Operator::Scan(p) if p.table() == t1 => {
                        self.replaced += 1;
                        Ok(factory.construct_empty_values(p.cols().clone()))
                    }
                    _ => factory.copy_and_replace_default(from, src, self),
                }
            }
        }

        let from = parameterized_memo();
        let mut factory = new_factory_with_ctx(Arc::new(EvalContext::new()));
        let mut replacer = EmptyT1 { replaced: 0 };
        let root = factory
            .copy_and_replace(
                &from,
                from.root().unwrap(),
                PhysicalPropertySet::default(),
                &mut replacer,
            )
            .unwrap();

        assert_eq!(1, replacer.replaced);
        // The select over an empty input is empty as well.
        assert_eq!(Opcode::Values, factory.memo().expr(root).opcode());
    }

    #[test]
    fn test_assign_placeholders() {
        let from = parameterized_memo();
        assert!(from.has_placeholders());

        let mut factory = new_factory_with_ctx(ctx_with(vec![(0, ScalarValue::Int64(Some(5)))]));
        factory.assign_placeholders(&from).unwrap();
        let root = factory.memo().root().unwrap();
        assert!(!factory.memo().has_placeholders());

        // `$1 + 3` is folded to `8` after assignment.
        let c1 = col(&mut factory, "t1", "c1");
        let eight = factory.construct_const_val(ScalarValue::Int64(Some(8)), &DataType::Int64);
        let gt = factory
            .memo()
            .find(&MemoExpr::new(Operator::Binary(BinaryOperator::Gt), vec![c1, eight]));
        assert!(gt.is_some());
        let on = factory.memo().expr(root).child(1);
        assert_eq!(gt, Some(factory.memo().expr(on).child(0)));

        // The source is untouched.
        assert!(from.has_placeholders());
    }

    #[test]
    fn test_assign_placeholders_to_false() {
        let mut factory = new_factory();
        let t1 = scan(&mut factory, "t1");
        let p = factory.construct_placeholder(PlaceholderPrivate::new(
            PlaceholderIdx::new(0),
            DataType::Boolean,
        ));
        let on = filters(&mut factory, vec![p]);
        let select = factory.construct_select(t1, on);
        factory.set_root(select, PhysicalPropertySet::default());
        let from = factory.detach_memo();
        assert_eq!(Opcode::Select, from.expr(select).opcode());

        let mut factory =
            new_factory_with_ctx(ctx_with(vec![(0, ScalarValue::Boolean(Some(false)))]));
        factory.assign_placeholders(&from).unwrap();
        let root = factory.memo().root().unwrap();
        assert_eq!(Opcode::Values, factory.memo().expr(root).opcode());
        assert!(factory.memo()[root]
            .relational()
            .output_cols()
            .contains(&col_id(&factory, "t1", "c2")));
    }

    #[test]
    fn test_assign_placeholders_error() {
        let from = parameterized_memo();

        let mut factory = new_factory_with_ctx(ctx_with(vec![(
            0,
            ScalarValue::Utf8(Some("99999999999999999999".to_string())),
        )]));
        let group_count = from.group_count();
        let root = from.root();
        let metadata = from.metadata().clone();
        let root_expr = from.expr(from.root().unwrap()).clone();

        let err = factory.assign_placeholders(&from).unwrap_err();
        assert!(matches!(err, EvalError::OutOfRange { .. }));
        assert!(factory.memo().is_empty());

        // The source is untouched.
        assert!(from.has_placeholders());
        assert_eq!(group_count, from.group_count());
        assert_eq!(root, from.root());
        assert_eq!(&metadata, from.metadata());
        assert_eq!(&root_expr, from.expr(from.root().unwrap()));

        // Retry with a valid value.
        factory.init(ctx_with(vec![(0, ScalarValue::Int64(Some(1)))]));
        factory.assign_placeholders(&from).unwrap();
        assert!(!factory.memo().has_placeholders());

        let mut factory = new_factory_with_ctx(Arc::new(EvalContext::new()));
        assert_eq!(
            EvalError::NoValue(PlaceholderIdx::new(0)),
            factory.assign_placeholders(&from).unwrap_err()
        );
    }

    #[test]
    fn test_assign_placeholders_concurrently() {
        let from = parameterized_memo();
        let bindings = hashmap! {
            1i64 => 4i64,
            2 => 5,
            3 => 6,
        };

        thread::scope(|s| {
            for (value, expected) in &bindings {
                let from = from.clone();
                s.spawn(move || {
                    let ctx = ctx_with(vec![(0, ScalarValue::Int64(Some(*value)))]);
                    let mut factory = new_factory_with_ctx(ctx);
                    factory.assign_placeholders(&from).unwrap();
                    let folded = factory.construct_const_val(
                        ScalarValue::Int64(Some(*expected)),
                        &DataType::Int64,
                    );
                    let c1 = col(&mut factory, "t1", "c1");
                    assert!(factory
                        .memo()
                        .find(&MemoExpr::new(
                            Operator::Binary(BinaryOperator::Gt),
                            vec![c1, folded]
                        ))
                        .is_some());
                });
            }
        });
    }

    #[test]
    fn test_copy_shared_inputs_once() {
        /// Copies every group, counting how often each source group is replaced.
        #[derive(Default)]
        struct CountingReplacer {
            replaced: HashMap<GroupId, usize>,
        }

        impl Replacer for CountingReplacer {
            fn replace(
                &mut self,
                factory: &mut Factory,
                from: &Memo,
                src: GroupId,
            ) -> NormResult<GroupId> {
                *self.replaced.entry(src).or_default() += 1;
                factory.copy_and_replace_default(from, src, self)
            }
        }

        // `e = e + e`, 24 times over, every level shares its input twice.
        let mut factory = new_factory();
        let t1 = scan(&mut factory, "t1");
        let mut e = col(&mut factory, "t1", "c1");
        for _ in 0..24 {
            e = factory.construct_binary(BinaryOperator::Plus, e, e);
        }
        let x = factory.metadata_mut().add_column("x", DataType::Int64);
        let projections = factory.construct_projections(vec![e]);
        let project =
            factory.construct_project(t1, projections, ProjectPrivate::new(vec![x], ColSet::new()));
        factory.set_root(project, PhysicalPropertySet::default());
        let from = factory.detach_memo();

        let mut factory = new_factory_with_ctx(Arc::new(EvalContext::new()));
        let mut replacer = CountingReplacer::default();
        factory
            .copy_and_replace(&from, project, PhysicalPropertySet::default(), &mut replacer)
            .unwrap();

        assert_eq!(from.group_count(), replacer.replaced.len());
        assert!(replacer.replaced.values().all(|count| *count == 1));
        assert_eq!(from.group_count(), factory.memo().group_count());
    }

    #[test]
    fn test_copy_keeps_projections() {
        let mut factory = new_factory();
        let t1 = scan(&mut factory, "t1");
        let x = factory.metadata_mut().add_column("x", DataType::Boolean);
        let c1 = col(&mut factory, "t1", "c1");
        let eq = factory.construct_binary(BinaryOperator::Eq, c1, c1);
        let projections = factory.construct_projections(vec![eq]);
        let passthrough = factory.memo()[t1].relational().output_cols().clone();
        let project =
            factory.construct_project(t1, projections, ProjectPrivate::new(vec![x], passthrough));
        let c1_id = col_id(&factory, "t1", "c1");
        let ordered = PhysicalPropertySet::with_ordering(OrderSpec::new(vec![Ordering::new(
            c1_id, true, false,
        )]));
        factory.set_root(project, ordered);
        let from = factory.detach_memo();

        let mut factory = new_factory_with_ctx(Arc::new(EvalContext::new()));
        factory.assign_placeholders(&from).unwrap();
        let root = factory.memo().root().unwrap();
        assert_eq!(from.expr(project).operator(), factory.memo().expr(root).operator());
        assert_eq!(3, factory.memo()[root].relational().output_cols().len());
        // Required properties of the root are carried over.
        assert_eq!(from.root_props(), factory.memo().root_props());
        assert_eq!(c1_id, factory.memo().root_props().ordering().orders()[0].column());
    }
}
