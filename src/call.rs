//! What `map` hands to a mapped function, and the options that shape it.

use crate::aes::{AesBinding, AesSpec, AesValue};
use crate::backend::Backend;
use crate::data::{DataSlice, Dataset, DatasetSlice};
use crate::dims::DimSet;
use crate::error::{FacetError, Result};
use crate::selection::{Selection, SelectionIter};
use std::collections::BTreeMap;

/// Extra keyword parameters forwarded to every call.
pub type Params = BTreeMap<String, AesValue>;

/// Which point of the iteration space a call is drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetInfo {
    pub variable: String,
    /// Carries both the label and the index view of the point.
    pub selection: Selection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    /// Key of the artifact array in the store.
    pub label: String,
    pub ignore_aes: Vec<String>,
    pub preprocessed: bool,
    pub subset_info: bool,
    pub store_artist: bool,
    /// Extra artifact dimensions, only honoured by the variable-keyed tree.
    pub artist_dims: Vec<(String, usize)>,
    pub extra: Params,
}

impl MapOptions {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ignore_aes: Vec::new(),
            preprocessed: false,
            subset_info: false,
            store_artist: true,
            artist_dims: Vec::new(),
            extra: Params::new(),
        }
    }

    pub fn ignore<S: AsRef<str>>(mut self, keys: &[S]) -> Self {
        self.ignore_aes
            .extend(keys.iter().map(|k| k.as_ref().to_string()));
        self
    }

    pub fn preprocessed(mut self, on: bool) -> Self {
        self.preprocessed = on;
        self
    }

    pub fn subset_info(mut self, on: bool) -> Self {
        self.subset_info = on;
        self
    }

    pub fn store_artist(mut self, on: bool) -> Self {
        self.store_artist = on;
        self
    }

    pub fn artist_dim(mut self, name: &str, size: usize) -> Self {
        self.artist_dims.push((name.to_string(), size));
        self
    }

    pub fn param(mut self, key: &str, value: impl Into<AesValue>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// One invocation of a mapped function.
pub struct MapCall<'a, B: Backend> {
    pub data: DataSlice,
    pub target: B::Target,
    pub aes: Vec<(String, AesValue)>,
    pub preprocessed: Option<DatasetSlice>,
    pub subset: Option<SubsetInfo>,
    pub extra: &'a Params,
    pub backend: &'a mut B,
}

impl<'a, B: Backend> MapCall<'a, B> {
    pub fn aes_value(&self, key: &str) -> Option<&AesValue> {
        self.aes.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Extra parameters override aesthetic values of the same key.
    pub fn param(&self, key: &str) -> Option<&AesValue> {
        self.extra.get(key).or_else(|| self.aes_value(key))
    }

    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.param(key).and_then(AesValue::as_f64)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(AesValue::as_str)
    }
}

/// Operations shared by the homogeneous collection and the variable-keyed tree.
pub trait FacetMap<B: Backend> {
    /// Call `f` once per point of the loop dimensions.
    fn map<F>(&mut self, f: F, options: &MapOptions) -> Result<()>
    where
        F: FnMut(MapCall<'_, B>) -> Result<B::Artist>;

    fn set_preprocessed(&mut self, data: Dataset);

    fn loop_dims(&self, ignore_aes: &[String]) -> DimSet;

    fn plot_iterator(&self, ignore_aes: &[String]) -> SelectionIter<'_>;

    fn canvas(&self) -> &B::Canvas;

    /// Hand back the backend and the canvas for rendering.
    fn into_parts(self) -> (B, B::Canvas);
}

/// Aesthetic keys `map` binds, in declaration order.
pub(crate) fn active_keys(spec: &AesSpec, ignore_aes: &[String]) -> Vec<String> {
    spec.keys()
        .filter(|k| !ignore_aes.iter().any(|i| i == k))
        .map(str::to_string)
        .collect()
}

/// Layout dimensions plus the dimensions of every non-ignored aesthetic.
pub(crate) fn loop_dims(layout_dims: DimSet, spec: &AesSpec, ignore_aes: &[String]) -> DimSet {
    let aes_dims: DimSet = active_keys(spec, ignore_aes)
        .iter()
        .filter_map(|k| spec.dims_of(k))
        .flatten()
        .collect();
    layout_dims.union(&aes_dims)
}

pub(crate) fn lookup_aes(
    binding: &AesBinding,
    keys: &[String],
    selection: &Selection,
) -> Result<Vec<(String, AesValue)>> {
    keys.iter()
        .map(|key| {
            let value = binding.lookup(key, selection).cloned().ok_or_else(|| {
                FacetError::FacetAlignment(format!(
                    "aesthetic '{}' has no value at '{}'",
                    key, selection
                ))
            })?;
            Ok((key.clone(), value))
        })
        .collect()
}

pub(crate) fn require_preprocessed<'p>(
    preprocessed: Option<&'p Dataset>,
    options: &MapOptions,
) -> Result<Option<&'p Dataset>> {
    match (options.preprocessed, preprocessed) {
        (false, _) => Ok(None),
        (true, Some(data)) => Ok(Some(data)),
        (true, None) => Err(FacetError::Precondition(
            "preprocessed data must be attached with set_preprocessed before mapping with preprocessed=true"
                .to_string(),
        )),
    }
}
