use proptest::prelude::*;

use tiledb_common::array::CellValNum;
use tiledb_common::datatype::Datatype;

use crate::array::attribute::AttributeData;

pub fn prop_attribute_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-zA-Z0-9_]+")
        .expect("Error creating attribute name strategy")
}

fn prop_cell_val_num(datatype: Datatype) -> BoxedStrategy<Option<CellValNum>> {
    if datatype.is_string_type() {
        Just(Some(CellValNum::Var)).boxed()
    } else {
        prop_oneof![
            2 => Just(None),
            2 => Just(Some(CellValNum::single())),
            1 => Just(Some(CellValNum::Var)),
        ]
        .boxed()
    }
}

impl Arbitrary for AttributeData {
    type Parameters = Option<Datatype>;
    type Strategy = BoxedStrategy<AttributeData>;

    fn arbitrary_with(params: Self::Parameters) -> Self::Strategy {
        let datatype = params
            .map(|dt| Just(dt).boxed())
            .unwrap_or(any::<Datatype>().boxed());

        (prop_attribute_name(), datatype)
            .prop_flat_map(|(name, datatype)| {
                (
                    Just(name),
                    Just(datatype),
                    proptest::option::of(any::<bool>()),
                    prop_cell_val_num(datatype),
                )
            })
            .prop_map(|(name, datatype, nullability, cell_val_num)| {
                AttributeData {
                    name,
                    datatype,
                    nullability,
                    cell_val_num,
                }
            })
            .boxed()
    }
}
