use std::collections::HashSet;

use proptest::prelude::*;

use tiledb_common::array::{ArrayType, CellOrder, TileOrder};

use tiledb_proptest_config::{
    TILEDB_STRATEGY_SCHEMA_PARAMETERS_ATTRIBUTES_MAX,
    TILEDB_STRATEGY_SCHEMA_PARAMETERS_ATTRIBUTES_MIN,
    TILEDB_STRATEGY_SCHEMA_PARAMETERS_SPARSE_TILE_CAPACITY_MAX,
    TILEDB_STRATEGY_SCHEMA_PARAMETERS_SPARSE_TILE_CAPACITY_MIN,
};

use crate::array::attribute::AttributeData;
use crate::array::domain::DomainData;
use crate::array::domain::strategy::Requirements as DomainRequirements;
use crate::array::schema::SchemaData;

#[derive(Clone, Default)]
pub struct Requirements {
    pub array_type: Option<ArrayType>,
    pub domain: Option<DomainRequirements>,
}

impl Arbitrary for SchemaData {
    type Parameters = Requirements;
    type Strategy = BoxedStrategy<SchemaData>;

    fn arbitrary_with(params: Self::Parameters) -> Self::Strategy {
        let strat_array_type = params
            .array_type
            .map(|at| Just(at).boxed())
            .unwrap_or(any::<ArrayType>().boxed());
        let domain_params = params.domain;

        let attr_min = **TILEDB_STRATEGY_SCHEMA_PARAMETERS_ATTRIBUTES_MIN;
        let attr_max = **TILEDB_STRATEGY_SCHEMA_PARAMETERS_ATTRIBUTES_MAX;
        let capacity_min =
            **TILEDB_STRATEGY_SCHEMA_PARAMETERS_SPARSE_TILE_CAPACITY_MIN;
        let capacity_max =
            **TILEDB_STRATEGY_SCHEMA_PARAMETERS_SPARSE_TILE_CAPACITY_MAX;

        strat_array_type
            .prop_flat_map(move |array_type| {
                let domain_params = domain_params.clone().unwrap_or(
                    DomainRequirements {
                        array_type: Some(array_type),
                        ..Default::default()
                    },
                );
                (
                    Just(array_type),
                    any_with::<DomainData>(domain_params),
                    proptest::option::of(capacity_min..=capacity_max),
                    any_with::<CellOrder>(Some(array_type)),
                    any::<TileOrder>(),
                    proptest::option::of(any::<bool>()),
                    proptest::collection::vec(
                        any::<AttributeData>(),
                        attr_min..=attr_max,
                    ),
                )
            })
            .prop_map(
                |(
                    array_type,
                    domain,
                    capacity,
                    cell_order,
                    tile_order,
                    allow_duplicates,
                    mut attributes,
                )| {
                    // field names must be distinct within a schema
                    let mut seen = domain
                        .dimension
                        .iter()
                        .map(|d| d.name.clone())
                        .collect::<HashSet<_>>();
                    for (a, attr) in attributes.iter_mut().enumerate() {
                        if !seen.insert(attr.name.clone()) {
                            attr.name = format!("{}_{}", attr.name, a);
                            seen.insert(attr.name.clone());
                        }
                    }
                    SchemaData {
                        array_type,
                        domain,
                        capacity: if array_type == ArrayType::Sparse {
                            capacity
                        } else {
                            None
                        },
                        cell_order: Some(cell_order),
                        tile_order: Some(tile_order),
                        allow_duplicates: if array_type == ArrayType::Sparse {
                            allow_duplicates
                        } else {
                            None
                        },
                        attributes,
                    }
                },
            )
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn schema_is_consistent(schema in any::<SchemaData>()) {
            // dense domains always have tile geometry
            if schema.array_type == ArrayType::Dense {
                assert!(schema.num_cells_per_tile().is_some());
                for d in schema.domain.dimension.iter() {
                    assert!(d.datatype.is_allowed_dimension_type_dense());
                }
            }

            // field lookup by name agrees with iteration order
            for (idx, field) in schema.fields().enumerate() {
                let by_name = schema.field(field.name()).unwrap();
                assert_eq!(field.name(), by_name.name());
                let by_index = schema.field(idx).unwrap();
                assert_eq!(field.name(), by_index.name());
            }
        }
    }
}
