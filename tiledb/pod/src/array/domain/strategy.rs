use std::collections::HashSet;

use proptest::prelude::*;

use tiledb_common::array::ArrayType;

use tiledb_proptest_config::{
    TILEDB_STRATEGY_DOMAIN_PARAMETERS_DIMENSIONS_MAX,
    TILEDB_STRATEGY_DOMAIN_PARAMETERS_DIMENSIONS_MIN,
};

use crate::array::dimension::DimensionData;
use crate::array::dimension::strategy::Requirements as DimensionRequirements;
use crate::array::domain::DomainData;

#[derive(Clone, Default)]
pub struct Requirements {
    pub array_type: Option<ArrayType>,
    pub dimension: Option<DimensionRequirements>,
}

impl Arbitrary for DomainData {
    type Parameters = Requirements;
    type Strategy = BoxedStrategy<DomainData>;

    fn arbitrary_with(params: Self::Parameters) -> Self::Strategy {
        let dimension_params = params.dimension.unwrap_or(
            DimensionRequirements {
                array_type: params.array_type,
                ..Default::default()
            },
        );

        let min = **TILEDB_STRATEGY_DOMAIN_PARAMETERS_DIMENSIONS_MIN;
        let max = **TILEDB_STRATEGY_DOMAIN_PARAMETERS_DIMENSIONS_MAX;

        proptest::collection::vec(
            any_with::<DimensionData>(dimension_params),
            min..=max,
        )
        .prop_map(|mut dimension| {
            // dimension names must be distinct within a domain
            let mut seen = HashSet::new();
            for (d, dim) in dimension.iter_mut().enumerate() {
                if !seen.insert(dim.name.clone()) {
                    dim.name = format!("{}_{}", dim.name, d);
                    seen.insert(dim.name.clone());
                }
            }
            DomainData { dimension }
        })
        .boxed()
    }
}
