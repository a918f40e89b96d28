use std::sync::Arc;

use arrow_schema::Schema;

use crate::eval::EvalContext;
use crate::factory::Factory;
use crate::memo::GroupId;
use crate::metadata::ColumnId;
use crate::operator::ScanPrivate;
use crate::rules::RuleSet;

const T1_SCHEMA_JSON: &str = r#"{
    "fields": [
        {
            "name": "c1",
            "nullable": false,
            "data_type": "Int64",
            "dict_id": 0,
            "dict_is_ordered": false,
            "metadata": {}
        },
        {
            "name": "c2",
            "nullable": true,
            "data_type": "Int64",
            "dict_id": 0,
            "dict_is_ordered": false,
            "metadata": {}
        }
    ],
    "metadata": {}
}"#;

const T2_SCHEMA_JSON: &str = r#"{
    "fields": [
        {
            "name": "c3",
            "nullable": false,
            "data_type": "Int64",
            "dict_id": 0,
            "dict_is_ordered": false,
            "metadata": {}
        },
        {
            "name": "c4",
            "nullable": true,
            "data_type": "Utf8",
            "dict_id": 0,
            "dict_is_ordered": false,
            "metadata": {}
        }
    ],
    "metadata": {}
}"#;

fn register_table(factory: &mut Factory, name: &str, json: &str) {
    let schema: Schema = serde_json::from_str(json).unwrap();
    factory.metadata_mut().add_table(
        name,
        schema
            .fields()
            .iter()
            .map(|f| (f.name().clone(), f.data_type().clone())),
    );
}

/// A factory with an empty memo.
pub fn new_factory_with_ctx(eval_ctx: Arc<EvalContext>) -> Factory {
    Factory::new(eval_ctx)
}

/// A factory whose metadata contains tables `t1(c1, c2)` and `t2(c3, c4)`.
pub fn new_factory() -> Factory {
    let mut factory = new_factory_with_ctx(Arc::new(EvalContext::new()));
    register_table(&mut factory, "t1", T1_SCHEMA_JSON);
    register_table(&mut factory, "t2", T2_SCHEMA_JSON);
    factory
}

pub fn new_factory_with_rules(rules: RuleSet) -> Factory {
    let mut factory = Factory::with_rules(Arc::new(EvalContext::new()), Arc::new(rules));
    register_table(&mut factory, "t1", T1_SCHEMA_JSON);
    register_table(&mut factory, "t2", T2_SCHEMA_JSON);
    factory
}

/// Scans all columns of `table`.
pub fn scan(factory: &mut Factory, table: &str) -> GroupId {
    let table = factory.metadata().table_by_name(table).unwrap();
    let cols = factory.metadata().table(table).col_set();
    factory.construct_scan(ScanPrivate::new(table, cols))
}

pub fn col_id(factory: &Factory, table: &str, col: &str) -> ColumnId {
    let metadata = factory.metadata();
    let table = metadata.table_by_name(table).unwrap();
    metadata.table_column(table, col).unwrap()
}

/// A variable referencing `table.col`.
pub fn col(factory: &mut Factory, table: &str, col: &str) -> GroupId {
    let col = col_id(factory, table, col);
    factory.construct_variable(col)
}

pub fn filters(factory: &mut Factory, items: Vec<GroupId>) -> GroupId {
    factory.construct_filters(items)
}
