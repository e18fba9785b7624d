use num_traits::{Bounded, FromPrimitive, ToPrimitive};
use proptest::prelude::*;

use tiledb_common::array::ArrayType;
use tiledb_common::array::dimension::DimensionConstraints;
use tiledb_common::datatype::Datatype;
use tiledb_common::range::{Range, SingleValueRange, VarValueRange};
use tiledb_common::{dimension_constraints_go, physical_type_go};

use tiledb_proptest_config::{
    TILEDB_STRATEGY_DIMENSION_PARAMETERS_EXTENT_LIMIT,
    TILEDB_STRATEGY_DOMAIN_PARAMETERS_CELLS_PER_DIMENSION_LIMIT,
};

use crate::array::dimension::DimensionData;

#[derive(Clone)]
pub struct Requirements {
    pub array_type: Option<ArrayType>,
    pub datatype: Option<Datatype>,
    pub extent_limit: usize,
}

impl Default for Requirements {
    fn default() -> Self {
        Requirements {
            array_type: None,
            datatype: None,
            extent_limit: **TILEDB_STRATEGY_DIMENSION_PARAMETERS_EXTENT_LIMIT,
        }
    }
}

pub fn prop_dimension_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-zA-Z0-9_]+")
        .expect("Error creating dimension name strategy")
}

/// Returns the window of representable values, widened to `i128`,
/// in which generated domains live.
///
/// Floating-point domains use a fixed window so that generated tile
/// extents keep integer-exact arithmetic.
fn domain_window<T>() -> (i128, i128)
where
    T: Bounded + ToPrimitive,
{
    const FLOAT_WINDOW: i128 = 1 << 20;
    let min = T::min_value().to_i128().unwrap_or(-FLOAT_WINDOW);
    let max = T::max_value().to_i128().unwrap_or(FLOAT_WINDOW);
    (min, max)
}

/// Construct a strategy to generate valid (domain, extent) pairs.
/// A valid output satisfies
/// `lower <= upper` and `1 <= extent <= min(extent_limit, upper - lower + 1)`.
fn prop_range_and_extent<T>(
    extent_limit: usize,
    require_extent: bool,
) -> BoxedStrategy<([T; 2], Option<T>)>
where
    T: Bounded + FromPrimitive + ToPrimitive + Copy + std::fmt::Debug + 'static,
{
    let (window_min, window_max) = domain_window::<T>();
    let cells_limit =
        **TILEDB_STRATEGY_DOMAIN_PARAMETERS_CELLS_PER_DIMENSION_LIMIT as i128;

    (window_min..=window_max - 1)
        .prop_flat_map(move |lower| {
            let upper_limit =
                std::cmp::min(window_max, lower + cells_limit - 1);
            (Just(lower), (lower + 1)..=upper_limit)
        })
        .prop_flat_map(move |(lower, upper)| {
            let extent_limit = std::cmp::min(
                extent_limit as i128,
                upper - lower + 1,
            );
            let extent = if require_extent {
                (1..=extent_limit).prop_map(Some).boxed()
            } else {
                proptest::option::of(1..=extent_limit).boxed()
            };
            (Just(lower), Just(upper), extent)
        })
        .prop_map(|(lower, upper, extent)| {
            let lower = T::from_i128(lower).unwrap();
            let upper = T::from_i128(upper).unwrap();
            let extent = extent.map(|e| T::from_i128(e).unwrap());
            ([lower, upper], extent)
        })
        .boxed()
}

fn prop_constraints(
    datatype: Datatype,
    extent_limit: usize,
    require_extent: bool,
) -> BoxedStrategy<DimensionConstraints> {
    if datatype.is_string_type() {
        return Just(DimensionConstraints::StringAscii).boxed();
    }
    physical_type_go!(datatype, DT, {
        prop_range_and_extent::<DT>(extent_limit, require_extent)
            .prop_map(|(domain, extent)| {
                DimensionConstraints::from((domain, extent))
            })
            .boxed()
    })
}

fn prop_datatype(array_type: Option<ArrayType>) -> BoxedStrategy<Datatype> {
    let allowed = Datatype::iter()
        .filter(|dt| match array_type {
            Some(ArrayType::Dense) => dt.is_allowed_dimension_type_dense(),
            Some(ArrayType::Sparse) => dt.is_allowed_dimension_type_sparse(),
            None => {
                dt.is_allowed_dimension_type_dense()
                    || dt.is_allowed_dimension_type_sparse()
            }
        })
        .map(Just)
        .collect::<Vec<_>>();
    proptest::strategy::Union::new(allowed).boxed()
}

impl Arbitrary for DimensionData {
    type Parameters = Requirements;
    type Strategy = BoxedStrategy<DimensionData>;

    fn arbitrary_with(params: Self::Parameters) -> Self::Strategy {
        let datatype = params
            .datatype
            .map(|dt| Just(dt).boxed())
            .unwrap_or(prop_datatype(params.array_type));

        // dense arrays require tile extents on every dimension
        let require_extent = matches!(params.array_type, Some(ArrayType::Dense));
        let extent_limit = params.extent_limit;

        (prop_dimension_name(), datatype)
            .prop_flat_map(move |(name, datatype)| {
                (
                    Just(name),
                    Just(datatype),
                    prop_constraints(datatype, extent_limit, require_extent),
                )
            })
            .prop_map(|(name, datatype, constraints)| DimensionData {
                name,
                datatype,
                constraints,
            })
            .boxed()
    }
}

impl DimensionData {
    /// Returns a strategy for generating subarray ranges which fall within
    /// the domain of this dimension.
    ///
    /// `cell_bound` is an optional restriction on the number of possible
    /// values which any generated range is allowed to span.
    pub fn subarray_strategy(
        &self,
        cell_bound: Option<usize>,
    ) -> Option<BoxedStrategy<Range>> {
        dimension_constraints_go!(
            self.constraints,
            DT,
            ref domain,
            _,
            {
                let lower = domain[0].to_i128().unwrap();
                let upper = domain[1].to_i128().unwrap();
                let bound = cell_bound
                    .map(|b| b as i128)
                    .unwrap_or(upper - lower + 1);
                let strat = (lower..=upper)
                    .prop_flat_map(move |lb| {
                        let ub = std::cmp::min(upper, lb + bound - 1);
                        (Just(lb), lb..=ub)
                    })
                    .prop_map(|(min, max)| {
                        let min = DT::from_i128(min).unwrap();
                        let max = DT::from_i128(max).unwrap();
                        Range::Single(SingleValueRange::from(&[min, max]))
                    });
                Some(strat.boxed())
            },
            {
                if cell_bound.is_some() {
                    // A bound over a real domain has no cell arithmetic;
                    // wait for a use case to decide what it should mean.
                    return None;
                }

                let lower = f64::from(domain[0]);
                let upper = f64::from(domain[1]);
                let strat = (lower..=upper)
                    .prop_flat_map(move |lb| (Just(lb), lb..=upper))
                    .prop_map(|(min, max)| {
                        let min = num_traits::cast::<f64, DT>(min).unwrap();
                        let max = num_traits::cast::<f64, DT>(max).unwrap();
                        Range::Single(SingleValueRange::from(&[min, max]))
                    });
                Some(strat.boxed())
            },
            {
                // DimensionConstraints::StringAscii
                if cell_bound.is_some() {
                    // not tractable without a bound on the string length
                    return None;
                }

                let strat_bound =
                    proptest::string::string_regex("[ -~]{0,8}")
                        .unwrap()
                        .boxed();
                let strat = (strat_bound.clone(), strat_bound).prop_map(
                    |(ascii1, ascii2)| {
                        let (lb, ub) = if ascii1 < ascii2 {
                            (ascii1, ascii2)
                        } else {
                            (ascii2, ascii1)
                        };
                        Range::Var(VarValueRange::from((lb, ub)))
                    },
                );
                Some(strat.boxed())
            }
        )
    }

}
