//! Homogeneous collection: every variable shares the facet and aesthetic dimensions.

use crate::aes::{AesBinding, AesSpec};
use crate::backend::{Backend, GridOptions};
use crate::call::{self, FacetMap, MapCall, MapOptions, SubsetInfo};
use crate::data::{Dataset, Dimension};
use crate::dims::DimSet;
use crate::error::{FacetError, Result};
use crate::labeled::LabeledArray;
use crate::layout::{self, FacetDim, FacetLayout, Layout};
use crate::selection::SelectionIter;
use crate::store::ArtifactStore;

/// Facet dimensions wrapped into rows of at most `col_wrap` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapSpec {
    pub cols: Vec<FacetDim>,
    pub col_wrap: usize,
}

impl WrapSpec {
    pub fn new<S: AsRef<str>>(cols: &[S]) -> Self {
        Self {
            cols: cols.iter().map(|c| FacetDim::parse(c.as_ref())).collect(),
            col_wrap: 4,
        }
    }

    pub fn col_wrap(mut self, col_wrap: usize) -> Self {
        self.col_wrap = col_wrap;
        self
    }
}

impl Default for WrapSpec {
    fn default() -> Self {
        Self {
            cols: Vec::new(),
            col_wrap: 4,
        }
    }
}

/// Facet dimensions split over explicit rows and columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridSpec {
    pub rows: Vec<FacetDim>,
    pub cols: Vec<FacetDim>,
}

impl GridSpec {
    pub fn new<R: AsRef<str>, C: AsRef<str>>(rows: &[R], cols: &[C]) -> Self {
        Self {
            rows: rows.iter().map(|r| FacetDim::parse(r.as_ref())).collect(),
            cols: cols.iter().map(|c| FacetDim::parse(c.as_ref())).collect(),
        }
    }
}

fn reject_variable_dim(dims: &[FacetDim]) -> Result<()> {
    if dims.iter().any(FacetDim::is_variable) {
        return Err(FacetError::Validation(format!(
            "'{}' faceting needs a PlotTree",
            layout::VARIABLE_DIM
        )));
    }
    Ok(())
}

/// Every variable must own every aesthetic dimension, with the same labels,
/// so each selection is complete.
fn check_aes_dims(data: &Dataset, aes: &AesSpec) -> Result<()> {
    for (key, dims) in aes.mappings() {
        let declared = data.resolve_dims(dims)?;
        for variable in data.variables() {
            for expected in &declared {
                match variable.dim(&expected.name) {
                    None => {
                        return Err(FacetError::FacetAlignment(format!(
                            "variable '{}' lacks dimension '{}' of aesthetic '{}'",
                            variable.name(),
                            expected.name,
                            key
                        )))
                    }
                    Some(dim) if dim.labels != expected.labels => {
                        return Err(FacetError::FacetAlignment(format!(
                            "variable '{}' labels dimension '{}' of aesthetic '{}' differently",
                            variable.name(),
                            expected.name,
                            key
                        )))
                    }
                    Some(_) => {}
                }
            }
        }
    }
    Ok(())
}

/// A facet layout over a dataset whose variables share their dimensions,
/// with one artifact array per mapped function.
pub struct PlotCollection<'d, B: Backend> {
    data: &'d Dataset,
    layout: FacetLayout<B::Canvas, B::Target>,
    aes_spec: AesSpec,
    aes: AesBinding,
    store: ArtifactStore<B::Artist>,
    preprocessed: Option<Dataset>,
    backend: B,
}

impl<'d, B: Backend> PlotCollection<'d, B> {
    pub fn wrap(
        data: &'d Dataset,
        spec: &WrapSpec,
        mut backend: B,
        options: &GridOptions,
        aes: AesSpec,
    ) -> Result<Self> {
        reject_variable_dim(&spec.cols)?;
        check_aes_dims(data, &aes)?;
        let binding = AesBinding::build(data, &aes)?;
        let layout = layout::build_wrap(data, &spec.cols, spec.col_wrap, &mut backend, options)?;
        Ok(Self::assemble(data, layout, aes, binding, backend))
    }

    pub fn grid(
        data: &'d Dataset,
        spec: &GridSpec,
        mut backend: B,
        options: &GridOptions,
        aes: AesSpec,
    ) -> Result<Self> {
        reject_variable_dim(&spec.rows)?;
        reject_variable_dim(&spec.cols)?;
        check_aes_dims(data, &aes)?;
        let binding = AesBinding::build(data, &aes)?;
        let layout = layout::build_grid(data, &spec.rows, &spec.cols, &mut backend, options)?;
        Ok(Self::assemble(data, layout, aes, binding, backend))
    }

    fn assemble(
        data: &'d Dataset,
        layout: FacetLayout<B::Canvas, B::Target>,
        aes_spec: AesSpec,
        aes: AesBinding,
        backend: B,
    ) -> Self {
        Self {
            data,
            layout,
            aes_spec,
            aes,
            store: ArtifactStore::new(),
            preprocessed: None,
            backend,
        }
    }

    pub fn data(&self) -> &'d Dataset {
        self.data
    }

    pub fn layout(&self) -> &Layout<B::Target> {
        &self.layout.layout
    }

    /// Grid shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.layout.rows, self.layout.cols)
    }

    pub fn aes(&self) -> &AesBinding {
        &self.aes
    }

    pub fn aes_spec(&self) -> &AesSpec {
        &self.aes_spec
    }

    pub fn preprocessed(&self) -> Option<&Dataset> {
        self.preprocessed.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn artifacts(&self) -> &ArtifactStore<B::Artist> {
        &self.store
    }

    pub fn artifact(&self, label: &str) -> Option<&LabeledArray<Option<B::Artist>>> {
        self.store.get(label)
    }

    /// Dataset dimensions among `loop_dims`, in dataset order.
    fn artist_dims(&self, loop_dims: &DimSet) -> Vec<Dimension> {
        self.data
            .dims()
            .intersection(loop_dims)
            .iter()
            .filter_map(|d| self.data.dimension(d).cloned())
            .collect()
    }
}

impl<'d, B: Backend> FacetMap<B> for PlotCollection<'d, B> {
    fn map<F>(&mut self, mut f: F, options: &MapOptions) -> Result<()>
    where
        F: FnMut(MapCall<'_, B>) -> Result<B::Artist>,
    {
        let preprocessed = call::require_preprocessed(self.preprocessed.as_ref(), options)?;
        let loop_dims = self.loop_dims(&options.ignore_aes);
        let keys = call::active_keys(&self.aes_spec, &options.ignore_aes);
        if options.store_artist {
            let mut dims = self.artist_dims(&loop_dims);
            dims.extend(
                options
                    .artist_dims
                    .iter()
                    .map(|(name, size)| Dimension::range(name, *size)),
            );
            self.store.allocate(&options.label, dims);
        }
        log::debug!(
            target: "facetmap",
            "map '{}' over loop dims {:?}",
            options.label,
            loop_dims.as_slice()
        );

        let data = self.data;
        let mut visits = 0;
        for (var_name, selection) in SelectionIter::new(data, &loop_dims) {
            let variable = data
                .variable(var_name)
                .ok_or_else(|| FacetError::Validation(format!("unknown variable '{}'", var_name)))?;
            let target = self
                .layout
                .layout
                .grid_for(var_name)
                .and_then(|g| g.target(&selection))
                .cloned()
                .ok_or_else(|| {
                    FacetError::FacetAlignment(format!("no target for '{}' at '{}'", var_name, selection))
                })?;
            let aes = call::lookup_aes(&self.aes, &keys, &selection)?;
            let pre = preprocessed.map(|p| p.sel(&selection)).transpose()?;
            let subset = options.subset_info.then(|| SubsetInfo {
                variable: var_name.to_string(),
                selection: selection.clone(),
            });
            log::trace!(target: "facetmap", "'{}' -> {} [{}]", options.label, var_name, selection);

            let artist = f(MapCall {
                data: variable.sel(&selection)?,
                target,
                aes,
                preprocessed: pre,
                subset,
                extra: &options.extra,
                backend: &mut self.backend,
            })?;
            if options.store_artist {
                if options.artist_dims.is_empty() {
                    self.store.record(&options.label, &selection, artist)?;
                } else {
                    self.store.record_partial(&options.label, &selection, artist)?;
                }
            }
            visits += 1;
        }
        log::debug!(target: "facetmap", "map '{}' made {} calls", options.label, visits);
        Ok(())
    }

    fn set_preprocessed(&mut self, data: Dataset) {
        self.preprocessed = Some(data);
    }

    fn loop_dims(&self, ignore_aes: &[String]) -> DimSet {
        call::loop_dims(self.layout.layout.dims(), &self.aes_spec, ignore_aes)
    }

    fn plot_iterator(&self, ignore_aes: &[String]) -> SelectionIter<'_> {
        SelectionIter::new(self.data, &self.loop_dims(ignore_aes))
    }

    fn canvas(&self) -> &B::Canvas {
        &self.layout.canvas
    }

    fn into_parts(self) -> (B, B::Canvas) {
        (self.backend, self.layout.canvas)
    }
}
