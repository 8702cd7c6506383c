//! Aesthetic binding: tiling caller-supplied values over aesthetic dimensions.

use crate::data::{Dataset, Dimension, Variable};
use crate::error::{FacetError, Result};
use crate::labeled::LabeledArray;
use crate::selection::Selection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque aesthetic payload. The core never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AesValue {
    Num(f64),
    Str(String),
    /// No value: consumers treat it as "unset" and fall back to their defaults.
    None,
}

impl AesValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AesValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AesValue::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, AesValue::None)
    }
}

impl fmt::Display for AesValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AesValue::Num(n) => write!(f, "{}", n),
            AesValue::Str(s) => f.write_str(s),
            AesValue::None => f.write_str("none"),
        }
    }
}

impl From<&str> for AesValue {
    fn from(s: &str) -> Self {
        AesValue::Str(s.to_string())
    }
}

impl From<String> for AesValue {
    fn from(s: String) -> Self {
        AesValue::Str(s)
    }
}

impl From<f64> for AesValue {
    fn from(n: f64) -> Self {
        AesValue::Num(n)
    }
}

/// Which dimensions drive each aesthetic, and the values to spread over them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AesSpec {
    mappings: Vec<(String, Vec<String>)>,
    values: HashMap<String, Vec<AesValue>>,
}

impl AesSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `key` as driven by `dims`. Redeclaring a key replaces its dims.
    pub fn map<S: AsRef<str>>(mut self, key: &str, dims: &[S]) -> Self {
        let dims: Vec<String> = dims.iter().map(|d| d.as_ref().to_string()).collect();
        match self.mappings.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = dims,
            None => self.mappings.push((key.to_string(), dims)),
        }
        self
    }

    pub fn values<V: Into<AesValue>>(mut self, key: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.values
            .insert(key.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn mappings(&self) -> &[(String, Vec<String>)] {
        &self.mappings
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|(k, _)| k.as_str())
    }

    pub fn dims_of(&self, key: &str) -> Option<&[String]> {
        self.mappings
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, d)| d.as_slice())
    }

    /// Supplied values for `key`; a key without values gets a single [`AesValue::None`].
    pub fn values_of(&self, key: &str) -> Vec<AesValue> {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| vec![AesValue::None])
    }
}

/// Tile `values` cyclically, then truncate, to exactly `required` elements.
///
/// The result's element `i` is `values[i % values.len()]`.
pub fn broadcast<T: Clone>(key: &str, values: &[T], required: usize) -> Result<Vec<T>> {
    if values.is_empty() && required > 0 {
        return Err(FacetError::BroadcastLength {
            key: key.to_string(),
            required,
        });
    }
    Ok(values.iter().cycle().take(required).cloned().collect())
}

fn bind(key: &str, dims: Vec<Dimension>, values: &[AesValue]) -> Result<LabeledArray<AesValue>> {
    if dims.is_empty() {
        let first = values.first().cloned().ok_or_else(|| FacetError::BroadcastLength {
            key: key.to_string(),
            required: 1,
        })?;
        return Ok(LabeledArray::scalar(first));
    }
    let required = dims.iter().map(Dimension::size).product();
    let tiled = broadcast(key, values, required)?;
    LabeledArray::from_vec(dims, tiled)
}

/// Aesthetic arrays, built once and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AesBinding {
    arrays: Vec<(String, LabeledArray<AesValue>)>,
}

impl AesBinding {
    /// Bind every aesthetic of `spec` over the dataset-wide dimensions.
    pub fn build(dataset: &Dataset, spec: &AesSpec) -> Result<Self> {
        let mut arrays = Vec::with_capacity(spec.mappings().len());
        for (key, dims) in spec.mappings() {
            let dims = dataset.resolve_dims(dims)?;
            arrays.push((key.clone(), bind(key, dims, &spec.values_of(key))?));
        }
        Ok(Self { arrays })
    }

    /// Bind every aesthetic of `spec` over the dimensions one variable has.
    ///
    /// Declared dims the variable lacks are dropped; with none left the
    /// aesthetic becomes the constant first value.
    pub fn for_variable(variable: &Variable, spec: &AesSpec) -> Result<Self> {
        let mut arrays = Vec::with_capacity(spec.mappings().len());
        for (key, dims) in spec.mappings() {
            let dims: Vec<Dimension> = dims
                .iter()
                .filter_map(|d| variable.dim(d).cloned())
                .collect();
            arrays.push((key.clone(), bind(key, dims, &spec.values_of(key))?));
        }
        Ok(Self { arrays })
    }

    pub fn get(&self, key: &str) -> Option<&LabeledArray<AesValue>> {
        self.arrays.iter().find(|(k, _)| k == key).map(|(_, a)| a)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.arrays.iter().map(|(k, _)| k.as_str())
    }

    /// Value of `key` at `selection`, restricted to the aesthetic's own dims.
    pub fn lookup(&self, key: &str, selection: &Selection) -> Option<&AesValue> {
        self.get(key)?.get(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let mu = Variable::new(
            "mu",
            vec![
                Dimension::range("chain", 4),
                Dimension::range("draw", 2),
                Dimension::new("team", ["a", "b", "c"]),
            ],
            vec![0.0; 24],
        )
        .unwrap();
        Dataset::new(vec![mu]).unwrap()
    }

    fn colors(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("C{}", i)).collect()
    }

    #[test]
    fn test_exact_length() {
        let spec = AesSpec::new().map("color", &["chain"]).values("color", colors(4));
        let binding = AesBinding::build(&dataset(), &spec).unwrap();
        let arr = binding.get("color").unwrap();
        assert_eq!(arr.shape(), vec![4]);
        let expected: Vec<AesValue> = colors(4).into_iter().map(AesValue::from).collect();
        assert_eq!(arr.data(), expected.as_slice());
    }

    #[test]
    fn test_tiling() {
        let spec = AesSpec::new().map("color", &["chain"]).values("color", ["c0", "c1"]);
        let binding = AesBinding::build(&dataset(), &spec).unwrap();
        let flat: Vec<String> = binding.get("color").unwrap().iter().map(|v| v.to_string()).collect();
        assert_eq!(flat, vec!["c0", "c1", "c0", "c1"]);
    }

    #[test]
    fn test_truncation() {
        let spec = AesSpec::new().map("color", &["team"]).values("color", colors(5));
        let binding = AesBinding::build(&dataset(), &spec).unwrap();
        assert_eq!(binding.get("color").unwrap().len(), 3);
    }

    #[test]
    fn test_multi_dim_shape() {
        let spec = AesSpec::new()
            .map("marker", &["team", "chain"])
            .values("marker", ["o", "x", "s"]);
        let binding = AesBinding::build(&dataset(), &spec).unwrap();
        let arr = binding.get("marker").unwrap();
        assert_eq!(arr.shape(), vec![3, 4]);
        assert_eq!(arr.data()[4], AesValue::from("x"));
    }

    #[test]
    fn test_empty_dims_constant() {
        let spec = AesSpec::new()
            .map("color", &[] as &[&str])
            .values("color", ["k", "r"]);
        let binding = AesBinding::build(&dataset(), &spec).unwrap();
        let arr = binding.get("color").unwrap();
        assert!(arr.is_scalar());
        assert_eq!(binding.lookup("color", &Selection::default()), Some(&AesValue::from("k")));
    }

    #[test]
    fn test_missing_values_default_to_none() {
        let spec = AesSpec::new().map("color", &["chain"]);
        let binding = AesBinding::build(&dataset(), &spec).unwrap();
        assert!(binding.get("color").unwrap().iter().all(AesValue::is_none));
    }

    #[test]
    fn test_empty_values_error() {
        let spec = AesSpec::new()
            .map("color", &["chain"])
            .values("color", Vec::<String>::new());
        let res = AesBinding::build(&dataset(), &spec);
        assert!(matches!(res, Err(FacetError::BroadcastLength { required: 4, .. })));
    }

    #[test]
    fn test_unknown_dim() {
        let spec = AesSpec::new().map("color", &["school"]);
        let res = AesBinding::build(&dataset(), &spec);
        assert!(matches!(res, Err(FacetError::DimensionNotFound { .. })));
    }

    #[test]
    fn test_for_variable_drops_missing_dims() {
        let ds = dataset();
        let var = ds.variable("mu").unwrap();
        let spec = AesSpec::new().map("color", &["school"]).values("color", ["k"]);
        let binding = AesBinding::for_variable(var, &spec).unwrap();
        assert!(binding.get("color").unwrap().is_scalar());
    }

    #[test]
    fn test_aes_value_deserialize() {
        let values: Vec<AesValue> = serde_json::from_str(r#"["C0", 1.5, null]"#).unwrap();
        assert_eq!(values, vec![AesValue::from("C0"), AesValue::Num(1.5), AesValue::None]);
    }
}
