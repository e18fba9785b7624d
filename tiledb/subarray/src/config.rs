use std::collections::HashMap;

use thiserror::Error;

/// Skip result-size gating when deciding whether a partition fits;
/// rely only on the memory budget.
pub const SM_SKIP_EST_SIZE_PARTITIONING: &str =
    "sm.skip_est_size_partitioning";

/// Treat a budget overflow on a unary range as success instead of
/// reporting the partition unsplittable.
pub const SM_SKIP_UNARY_PARTITIONING_BUDGET_CHECK: &str =
    "sm.skip_unary_partitioning_budget_check";

/// Default memory budget for fixed-sized data and var-size offsets.
pub const SM_MEMORY_BUDGET: &str = "sm.memory_budget";

/// Default memory budget for var-sized data.
pub const SM_MEMORY_BUDGET_VAR: &str = "sm.memory_budget_var";

/// 5 GiB
pub const DEFAULT_MEMORY_BUDGET: u64 = 5_368_709_120;

/// 10 GiB
pub const DEFAULT_MEMORY_BUDGET_VAR: u64 = 10_737_418_240;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for '{key}': expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// String key/value configuration.
///
/// Unrecognized keys are retained and round-trip through [Config::get];
/// recognized keys are validated when their typed accessors run.
#[derive(Clone, Debug, Default)]
pub struct Config {
    params: HashMap<String, String>,
}

impl Config {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|v| v.as_str())
    }

    fn get_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            Some(other) => Err(ConfigError::InvalidValue {
                key: key.to_owned(),
                value: other.to_owned(),
                expected: "'true' or 'false'",
            }),
        }
    }

    fn get_u64(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => {
                value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_owned(),
                    value: value.to_owned(),
                    expected: "an unsigned integer",
                })
            }
        }
    }

    pub fn skip_est_size_partitioning(&self) -> Result<bool, ConfigError> {
        self.get_bool(SM_SKIP_EST_SIZE_PARTITIONING, false)
    }

    pub fn skip_unary_partitioning_budget_check(
        &self,
    ) -> Result<bool, ConfigError> {
        self.get_bool(SM_SKIP_UNARY_PARTITIONING_BUDGET_CHECK, false)
    }

    pub fn memory_budget(&self) -> Result<u64, ConfigError> {
        self.get_u64(SM_MEMORY_BUDGET, DEFAULT_MEMORY_BUDGET)
    }

    pub fn memory_budget_var(&self) -> Result<u64, ConfigError> {
        self.get_u64(SM_MEMORY_BUDGET_VAR, DEFAULT_MEMORY_BUDGET_VAR)
    }
}
