use arrow_schema::DataType;
use datafusion_common::ScalarValue;

use crate::factory::Factory;
use crate::memo::{GroupId, MemoExpr};
use crate::metadata::ColumnId;
use crate::operator::{
    BinaryOperator, FunctionPrivate, JoinPrivate, Operator, PlaceholderPrivate, ProjectPrivate,
    ScanPrivate, ValuesPrivate,
};

macro_rules! construct_joins {
    ($($(#[$doc:meta])* $name:ident => $variant:ident),* $(,)?) => {
        impl Factory {
            $(
                $(#[$doc])*
                pub fn $name(
                    &mut self,
                    left: GroupId,
                    right: GroupId,
                    on: GroupId,
                    private: JoinPrivate,
                ) -> GroupId {
                    self.construct(MemoExpr::new(Operator::$variant(private), [left, right, on]))
                }
            )*
        }
    };
}

construct_joins! {
    construct_inner_join => InnerJoin,
    construct_left_join => LeftJoin,
    /// Normalized to a left join with swapped inputs.
    construct_right_join => RightJoin,
    construct_full_join => FullJoin,
    construct_semi_join => SemiJoin,
    construct_anti_join => AntiJoin,
    /// Join whose right input references columns of the left input.
    construct_inner_join_apply => InnerJoinApply,
    construct_left_join_apply => LeftJoinApply,
    construct_right_join_apply => RightJoinApply,
    construct_full_join_apply => FullJoinApply,
    construct_semi_join_apply => SemiJoinApply,
    construct_anti_join_apply => AntiJoinApply,
}

/// Relational operators.
impl Factory {
    pub fn construct_scan(&mut self, private: ScanPrivate) -> GroupId {
        self.construct(MemoExpr::new(Operator::Scan(private), []))
    }

    /// `rows` are `Tuple`s with one item for each column of `private`.
    pub fn construct_values(&mut self, rows: Vec<GroupId>, private: ValuesPrivate) -> GroupId {
        self.construct(MemoExpr::new(Operator::Values(private), rows))
    }

    pub fn construct_select(&mut self, input: GroupId, filters: GroupId) -> GroupId {
        self.construct(MemoExpr::new(Operator::Select, [input, filters]))
    }

    pub fn construct_project(
        &mut self,
        input: GroupId,
        projections: GroupId,
        private: ProjectPrivate,
    ) -> GroupId {
        self.construct(MemoExpr::new(Operator::Project(private), [input, projections]))
    }

    pub fn construct_limit(&mut self, input: GroupId, limit: GroupId) -> GroupId {
        self.construct(MemoExpr::new(Operator::Limit, [input, limit]))
    }
}

/// Scalar operators.
impl Factory {
    pub fn construct_variable(&mut self, col: ColumnId) -> GroupId {
        self.construct(MemoExpr::new(Operator::Variable(col), []))
    }

    /// Prefer [`Factory::construct_const_val`], which picks the dedicated operator of null and
    /// booleans.
    pub fn construct_const(&mut self, value: ScalarValue) -> GroupId {
        self.construct(MemoExpr::new(Operator::Const(value), []))
    }

    pub fn construct_null(&mut self, data_type: DataType) -> GroupId {
        self.construct(MemoExpr::new(Operator::Null(data_type), []))
    }

    pub fn construct_true(&mut self) -> GroupId {
        self.construct(MemoExpr::new(Operator::True, []))
    }

    pub fn construct_false(&mut self) -> GroupId {
        self.construct(MemoExpr::new(Operator::False, []))
    }

    pub fn construct_placeholder(&mut self, private: PlaceholderPrivate) -> GroupId {
        self.construct(MemoExpr::new(Operator::Placeholder(private), []))
    }

    pub fn construct_binary(
        &mut self,
        op: BinaryOperator,
        left: GroupId,
        right: GroupId,
    ) -> GroupId {
        self.construct(MemoExpr::new(Operator::Binary(op), [left, right]))
    }

    pub fn construct_not(&mut self, input: GroupId) -> GroupId {
        self.construct(MemoExpr::new(Operator::Not, [input]))
    }

    pub fn construct_function(&mut self, args: Vec<GroupId>, private: FunctionPrivate) -> GroupId {
        self.construct(MemoExpr::new(Operator::Function(private), args))
    }

    /// Conjunction of predicates.
    pub fn construct_filters(&mut self, items: Vec<GroupId>) -> GroupId {
        self.construct(MemoExpr::new(Operator::Filters, items))
    }

    /// Expressions synthesizing the columns of a `Project`.
    pub fn construct_projections(&mut self, items: Vec<GroupId>) -> GroupId {
        self.construct(MemoExpr::new(Operator::Projections, items))
    }

    pub fn construct_tuple(&mut self, items: Vec<GroupId>) -> GroupId {
        self.construct(MemoExpr::new(Operator::Tuple, items))
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;
    use datafusion_common::ScalarValue;

    use crate::operator::{JoinAlgorithm, JoinPrivate, Opcode, ValuesPrivate};
    use crate::properties::Cardinality;
    use crate::test_utils::{col_id, filters, new_factory, scan};

    #[test]
    fn test_construct_values() {
        let mut factory = new_factory();
        let col = factory.metadata_mut().add_column("x", DataType::Int64);
        let one = factory.construct_const_val(ScalarValue::Int64(Some(1)), &DataType::Int64);
        let two = factory.construct_const_val(ScalarValue::Int64(Some(2)), &DataType::Int64);
        let rows = vec![
            factory.construct_tuple(vec![one]),
            factory.construct_tuple(vec![two]),
        ];
        let values = factory.construct_values(rows, ValuesPrivate::new(vec![col]));

        let props = factory.memo()[values].relational();
        assert_eq!(Cardinality::exact(2), props.cardinality());
        assert!(props.output_cols().contains(&col));
    }

    #[test]
    fn test_join_private_is_part_of_key() {
        let mut factory = new_factory();
        let t1 = scan(&mut factory, "t1");
        let t2 = scan(&mut factory, "t2");
        let on = filters(&mut factory, vec![]);

        let any = factory.construct_inner_join(t1, t2, on, JoinPrivate::default());
        let hash_only = factory.construct_inner_join(
            t1,
            t2,
            on,
            JoinPrivate::with_allowed(JoinAlgorithm::Hash.into()),
        );
        assert_ne!(any, hash_only);
        assert_eq!(Opcode::InnerJoin, factory.memo().expr(hash_only).opcode());
    }

    #[test]
    fn test_semi_join_with_empty_input() {
        let mut factory = new_factory();
        let t1 = scan(&mut factory, "t1");
        let empty = factory.construct_zero_values();
        let on = filters(&mut factory, vec![]);

        let semi = factory.construct_semi_join(t1, empty, on, JoinPrivate::default());
        let memo = factory.memo();
        assert_eq!(Opcode::Values, memo.expr(semi).opcode());
        assert!(memo[semi]
            .relational()
            .output_cols()
            .contains(&col_id(&factory, "t1", "c1")));
    }
}
