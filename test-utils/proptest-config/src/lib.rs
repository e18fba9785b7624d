use std::ops::Deref;
use std::str::FromStr;
use std::sync::LazyLock;

fn try_parse_env<T>(env: &str) -> Option<T>
where
    T: FromStr,
{
    match std::env::var(env) {
        Ok(value) => Some(
            T::from_str(&value)
                .unwrap_or_else(|_| panic!("Invalid value for {}", env)),
        ),
        Err(_) => None,
    }
}

/// The value of a strategy configuration parameter and its provenance.
pub enum Configuration<T> {
    Default(T),
    Environmental(T),
}

impl<T> Configuration<T> {
    /// Converts to [Option<T>], returning the wrapped value
    /// if this is [Environmental] and [None] otherwise.
    pub fn environmental(&self) -> Option<T>
    where
        T: Copy,
    {
        match self {
            Self::Default(_) => None,
            Self::Environmental(value) => Some(*value),
        }
    }
}

impl<T> Deref for Configuration<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Default(ref value) => value,
            Self::Environmental(ref value) => value,
        }
    }
}

macro_rules! config_param {
    ($name:ident, $type:ty, $default:expr) => {
        pub static $name: LazyLock<Configuration<$type>> =
            LazyLock::new(|| {
                if let Some(value) = try_parse_env::<$type>(stringify!($name)) {
                    Configuration::Environmental(value)
                } else {
                    Configuration::Default($default)
                }
            });
    };
}

// array/dimension/strategy.rs
config_param!(TILEDB_STRATEGY_DIMENSION_PARAMETERS_EXTENT_LIMIT, usize, 16);

// array/domain/strategy.rs
config_param!(TILEDB_STRATEGY_DOMAIN_PARAMETERS_DIMENSIONS_MIN, usize, 1);
config_param!(TILEDB_STRATEGY_DOMAIN_PARAMETERS_DIMENSIONS_MAX, usize, 4);
config_param!(
    TILEDB_STRATEGY_DOMAIN_PARAMETERS_CELLS_PER_DIMENSION_LIMIT,
    usize,
    1024
);

// array/schema/strategy.rs
config_param!(TILEDB_STRATEGY_SCHEMA_PARAMETERS_ATTRIBUTES_MIN, usize, 1);
config_param!(TILEDB_STRATEGY_SCHEMA_PARAMETERS_ATTRIBUTES_MAX, usize, 4);
config_param!(
    TILEDB_STRATEGY_SCHEMA_PARAMETERS_SPARSE_TILE_CAPACITY_MIN,
    u64,
    1
);
config_param!(
    TILEDB_STRATEGY_SCHEMA_PARAMETERS_SPARSE_TILE_CAPACITY_MAX,
    u64,
    10000
);
