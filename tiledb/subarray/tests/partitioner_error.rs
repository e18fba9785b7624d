//! Budget and configuration error surfaces of the partitioner.

mod support;

use std::sync::Arc;

use tiledb_common::array::{ArrayType, CellValNum, Layout};
use tiledb_common::datatype::Datatype;
use tiledb_common::range::Range;
use tiledb_pod::array::attribute::AttributeData;
use tiledb_subarray::error::{BudgetError, Error};
use tiledb_subarray::{Config, Subarray, SubarrayPartitioner};

use support::{TestArray, compute_pool, int_attribute, int_dimension, schema};

fn partitioner() -> SubarrayPartitioner {
    let schema = schema(
        ArrayType::Dense,
        None,
        vec![int_dimension("d", [1, 10], Some(2))],
        vec![
            int_attribute("a"),
            AttributeData {
                name: "v".to_owned(),
                datatype: Datatype::StringUtf8,
                nullability: None,
                cell_val_num: Some(CellValNum::Var),
            },
            AttributeData {
                name: "n".to_owned(),
                datatype: Datatype::Int32,
                nullability: Some(true),
                cell_val_num: None,
            },
        ],
    );
    let mut array = TestArray::new(Arc::clone(&schema));
    array.fill_dense();

    let mut subarray = Subarray::new(schema, Layout::RowMajor).unwrap();
    subarray.add_range(0, Range::from(&[2i32, 5])).unwrap();

    SubarrayPartitioner::with_default_budgets(
        &Config::new(),
        subarray,
        Arc::new(array),
        compute_pool(),
    )
    .unwrap()
}

#[test]
fn get_budget_before_set() {
    let partitioner = partitioner();
    assert!(matches!(
        partitioner.get_result_budget("a"),
        Err(Error::BudgetNotSet(name)) if name == "a"
    ));
    assert!(matches!(
        partitioner.get_result_budget_var("v"),
        Err(Error::BudgetNotSet(_))
    ));
}

#[test]
fn unknown_field() {
    let mut partitioner = partitioner();
    assert!(matches!(
        partitioner.set_result_budget("nonesuch", 10),
        Err(Error::InvalidBudget(BudgetError::UnknownField(_)))
    ));
    assert!(matches!(
        partitioner.get_result_budget("nonesuch"),
        Err(Error::InvalidBudget(BudgetError::UnknownField(_)))
    ));
}

#[test]
fn budget_kind_mismatch() {
    let mut partitioner = partitioner();

    // fixed-size API over a var-sized field
    assert!(matches!(
        partitioner.set_result_budget("v", 10),
        Err(Error::InvalidBudget(BudgetError::ExpectedVarSize(_)))
    ));
    // var-size API over a fixed-sized field
    assert!(matches!(
        partitioner.set_result_budget_var("a", 10, 10),
        Err(Error::InvalidBudget(BudgetError::ExpectedFixedSize(_)))
    ));
    // non-nullable API over a nullable field
    assert!(matches!(
        partitioner.set_result_budget("n", 10),
        Err(Error::InvalidBudget(BudgetError::ExpectedNonNullable(_)))
    ));
    // nullable API over a non-nullable field
    assert!(matches!(
        partitioner.set_result_budget_nullable("a", 10, 10),
        Err(Error::InvalidBudget(BudgetError::ExpectedNullable(_)))
    ));
}

#[test]
fn budget_roundtrip() {
    let mut partitioner = partitioner();
    partitioner.set_result_budget("a", 10).unwrap();
    partitioner.set_result_budget_var("v", 11, 12).unwrap();
    partitioner.set_result_budget_nullable("n", 13, 14).unwrap();

    assert_eq!(10, partitioner.get_result_budget("a").unwrap());
    assert_eq!(
        (11, 12),
        partitioner.get_result_budget_var("v").unwrap()
    );
    assert_eq!(
        (13, 14),
        partitioner.get_result_budget_nullable("n").unwrap()
    );
    assert_eq!(3, partitioner.budgets().len());

    partitioner.set_memory_budget(1, 2, 3);
    assert_eq!((1, 2, 3), partitioner.get_memory_budget());
}

#[test]
fn malformed_config() {
    let schema = schema(
        ArrayType::Dense,
        None,
        vec![int_dimension("d", [1, 10], Some(2))],
        vec![int_attribute("a")],
    );
    let mut array = TestArray::new(Arc::clone(&schema));
    array.fill_dense();

    let subarray = Subarray::new(schema, Layout::RowMajor).unwrap();

    let mut config = Config::new();
    config.set("sm.skip_est_size_partitioning", "yes");
    assert!(matches!(
        SubarrayPartitioner::with_default_budgets(
            &config,
            subarray,
            Arc::new(array),
            compute_pool(),
        ),
        Err(Error::Config(_))
    ));
}

#[test]
#[should_panic(expected = "no current partition")]
fn split_current_before_next() {
    let mut partitioner = partitioner();
    let _ = partitioner.split_current();
}

#[test]
#[should_panic(expected = "no current partition")]
fn current_before_next() {
    let partitioner = partitioner();
    let _ = partitioner.current();
}
