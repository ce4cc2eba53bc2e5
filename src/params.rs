//! Index configuration parameters.
//!
//! A configuration is a partial mapping from parameter name to a
//! dynamically-typed scalar. Absent keys mean "apply default"; present keys
//! are respected unless a hardware limit forces a cap (see
//! [`crate::tuning`]).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VecIndexError};

/// Well-known parameter names.
pub mod keys {
    /// Cluster (partition) count for inverted-file indexes.
    pub const NLIST: &str = "nlist";
    /// Per-query search breadth.
    pub const NPROBE: &str = "nprobe";
    /// Quantization bit width.
    pub const NBITS: &str = "nbits";
    /// GPU device ordinal.
    pub const GPU_ID: &str = "gpu_id";
    /// Distance metric name, e.g. "L2".
    pub const METRIC_TYPE: &str = "metric_type";
    /// Vector dimensionality.
    pub const DIM: &str = "dim";
    /// Build-time neighbor count for graph indexes.
    pub const KNNG: &str = "knng";
    /// Graph search queue length.
    pub const SEARCH_LENGTH: &str = "search_length";
    /// Maximum out-degree of graph nodes.
    pub const OUT_DEGREE: &str = "out_degree";
    /// Candidate pool size for graph construction.
    pub const CANDIDATE_POOL_SIZE: &str = "candidate_pool_size";
}

/// A dynamically-typed configuration scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Signed integer value.
    Integer(i64),
    /// Floating-point value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl ParamValue {
    /// Name of the contained type, for error reporting.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Integer(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "text",
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Integer(value as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// A partial parameter map handed to the factory, tuner, and engines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexParams {
    values: HashMap<String, ParamValue>,
}

impl IndexParams {
    /// Create an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, overwriting any existing value.
    pub fn set<V: Into<ParamValue>>(&mut self, key: &str, value: V) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with<V: Into<ParamValue>>(mut self, key: &str, value: V) -> Self {
        self.set(key, value);
        self
    }

    /// Set a parameter only if it is not already present.
    pub fn set_default<V: Into<ParamValue>>(&mut self, key: &str, value: V) {
        self.values
            .entry(key.to_string())
            .or_insert_with(|| value.into());
    }

    /// Check whether a parameter is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get the raw value of a parameter.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Get an integer parameter, failing on a non-integer value.
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ParamValue::Integer(v)) => Ok(Some(*v)),
            Some(other) => Err(self.mismatch(key, "integer", other)),
        }
    }

    /// Get an integer parameter, substituting a default when absent.
    pub fn get_i64_or(&self, key: &str, default: i64) -> Result<i64> {
        Ok(self.get_i64(key)?.unwrap_or(default))
    }

    /// Get a float parameter. Integer values widen to float.
    pub fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ParamValue::Float(v)) => Ok(Some(*v)),
            Some(ParamValue::Integer(v)) => Ok(Some(*v as f64)),
            Some(other) => Err(self.mismatch(key, "float", other)),
        }
    }

    /// Get a text parameter, failing on a non-text value.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(ParamValue::Text(v)) => Ok(Some(v.as_str())),
            Some(other) => Err(self.mismatch(key, "text", other)),
        }
    }

    /// Number of parameters present.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn mismatch(&self, key: &str, expected: &'static str, actual: &ParamValue) -> VecIndexError {
        VecIndexError::TypeMismatch {
            key: key.to_string(),
            expected,
            actual: actual.type_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut params = IndexParams::new();
        params.set(keys::NLIST, 100);
        params.set(keys::METRIC_TYPE, "L2");

        assert_eq!(params.get_i64(keys::NLIST).unwrap(), Some(100));
        assert_eq!(params.get_str(keys::METRIC_TYPE).unwrap(), Some("L2"));
        assert_eq!(params.get_i64(keys::NPROBE).unwrap(), None);
    }

    #[test]
    fn test_get_with_default() {
        let params = IndexParams::new().with(keys::GPU_ID, 2);

        assert_eq!(params.get_i64_or(keys::GPU_ID, 0).unwrap(), 2);
        assert_eq!(params.get_i64_or(keys::NPROBE, 16).unwrap(), 16);
    }

    #[test]
    fn test_set_default_respects_present_key() {
        let mut params = IndexParams::new().with(keys::NBITS, 4);

        params.set_default(keys::NBITS, 8);
        params.set_default(keys::NPROBE, 32);

        assert_eq!(params.get_i64(keys::NBITS).unwrap(), Some(4));
        assert_eq!(params.get_i64(keys::NPROBE).unwrap(), Some(32));
    }

    #[test]
    fn test_type_mismatch() {
        let params = IndexParams::new().with(keys::NLIST, "not a number");

        let err = params.get_i64(keys::NLIST).unwrap_err();
        match err {
            VecIndexError::TypeMismatch {
                key,
                expected,
                actual,
            } => {
                assert_eq!(key, keys::NLIST);
                assert_eq!(expected, "integer");
                assert_eq!(actual, "text");
            }
            other => panic!("Expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_float_widening() {
        let params = IndexParams::new().with(keys::DIM, 128);

        assert_eq!(params.get_f64(keys::DIM).unwrap(), Some(128.0));

        // The reverse direction stays strict.
        let params = IndexParams::new().with("threshold", 0.5);
        assert!(params.get_i64("threshold").is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let params = IndexParams::new()
            .with(keys::NLIST, 4096)
            .with(keys::METRIC_TYPE, "L2")
            .with("boost", 1.5);

        let json = serde_json::to_string(&params).unwrap();
        let decoded: IndexParams = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.get_i64(keys::NLIST).unwrap(), Some(4096));
        assert_eq!(decoded.get_str(keys::METRIC_TYPE).unwrap(), Some("L2"));
        assert_eq!(decoded.get_f64("boost").unwrap(), Some(1.5));
    }
}
