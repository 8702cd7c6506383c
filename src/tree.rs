//! Variable-keyed tree: faceting datasets whose variables need not share
//! their dimensions.

use crate::aes::{AesBinding, AesSpec};
use crate::backend::{Backend, GridOptions};
use crate::call::{self, FacetMap, MapCall, MapOptions, SubsetInfo};
use crate::collection::{GridSpec, WrapSpec};
use crate::data::{Dataset, Dimension};
use crate::dims::DimSet;
use crate::error::{FacetError, Result};
use crate::labeled::LabeledArray;
use crate::layout::{self, FacetLayout, Layout};
use crate::selection::SelectionIter;
use crate::store::ArtifactStore;
use std::collections::BTreeMap;

/// Per-variable state: aesthetics bound over the variable's own dims and its artifacts.
#[derive(Debug, Clone)]
pub struct VariableNode<A> {
    aes: AesBinding,
    store: ArtifactStore<A>,
}

impl<A> VariableNode<A> {
    pub fn aes(&self) -> &AesBinding {
        &self.aes
    }

    pub fn artifacts(&self) -> &ArtifactStore<A> {
        &self.store
    }
}

/// Tree nodes never squeeze: every variable keeps an indexable grid.
fn unsqueezed(options: &GridOptions) -> GridOptions {
    GridOptions {
        squeeze: false,
        ..*options
    }
}

fn bind_nodes<A>(data: &Dataset, aes: &AesSpec) -> Result<BTreeMap<String, VariableNode<A>>> {
    for (_, dims) in aes.mappings() {
        data.require_dims(dims)?;
    }
    data.variables()
        .iter()
        .map(|v| {
            let node = VariableNode {
                aes: AesBinding::for_variable(v, aes)?,
                store: ArtifactStore::new(),
            };
            Ok((v.name().to_string(), node))
        })
        .collect()
}

/// A facet layout keyed by variable, with aesthetics and artifacts per variable.
pub struct PlotTree<'d, B: Backend> {
    data: &'d Dataset,
    layout: FacetLayout<B::Canvas, B::Target>,
    aes_spec: AesSpec,
    nodes: BTreeMap<String, VariableNode<B::Artist>>,
    preprocessed: Option<Dataset>,
    backend: B,
}

impl<'d, B: Backend> PlotTree<'d, B> {
    pub fn wrap(
        data: &'d Dataset,
        spec: &WrapSpec,
        mut backend: B,
        options: &GridOptions,
        aes: AesSpec,
    ) -> Result<Self> {
        let nodes = bind_nodes(data, &aes)?;
        let layout = layout::build_wrap(data, &spec.cols, spec.col_wrap, &mut backend, &unsqueezed(options))?;
        Ok(Self {
            data,
            layout,
            aes_spec: aes,
            nodes,
            preprocessed: None,
            backend,
        })
    }

    pub fn grid(
        data: &'d Dataset,
        spec: &GridSpec,
        mut backend: B,
        options: &GridOptions,
        aes: AesSpec,
    ) -> Result<Self> {
        let nodes = bind_nodes(data, &aes)?;
        let layout = layout::build_grid(data, &spec.rows, &spec.cols, &mut backend, &unsqueezed(options))?;
        Ok(Self {
            data,
            layout,
            aes_spec: aes,
            nodes,
            preprocessed: None,
            backend,
        })
    }

    /// Rebind every variable's aesthetics. Existing artifacts are kept.
    pub fn set_aes(&mut self, aes: AesSpec) -> Result<()> {
        let fresh: BTreeMap<String, VariableNode<B::Artist>> = bind_nodes(self.data, &aes)?;
        for (name, node) in fresh {
            match self.nodes.get_mut(&name) {
                Some(existing) => existing.aes = node.aes,
                None => {
                    self.nodes.insert(name, node);
                }
            }
        }
        self.aes_spec = aes;
        Ok(())
    }

    pub fn data(&self) -> &'d Dataset {
        self.data
    }

    pub fn layout(&self) -> &Layout<B::Target> {
        &self.layout.layout
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.layout.rows, self.layout.cols)
    }

    pub fn aes_spec(&self) -> &AesSpec {
        &self.aes_spec
    }

    pub fn node(&self, variable: &str) -> Option<&VariableNode<B::Artist>> {
        self.nodes.get(variable)
    }

    pub fn preprocessed(&self) -> Option<&Dataset> {
        self.preprocessed.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn artifact(&self, variable: &str, label: &str) -> Option<&LabeledArray<Option<B::Artist>>> {
        self.nodes.get(variable)?.store.get(label)
    }
}

impl<'d, B: Backend> FacetMap<B> for PlotTree<'d, B> {
    fn map<F>(&mut self, mut f: F, options: &MapOptions) -> Result<()>
    where
        F: FnMut(MapCall<'_, B>) -> Result<B::Artist>,
    {
        let preprocessed = call::require_preprocessed(self.preprocessed.as_ref(), options)?;
        let loop_dims = self.loop_dims(&options.ignore_aes);
        let keys = call::active_keys(&self.aes_spec, &options.ignore_aes);
        let data = self.data;

        if options.store_artist {
            let extra: Vec<Dimension> = options
                .artist_dims
                .iter()
                .map(|(name, size)| Dimension::range(name, *size))
                .collect();
            for variable in data.variables() {
                let mut dims: Vec<Dimension> = variable
                    .dims()
                    .iter()
                    .filter(|d| loop_dims.contains(&d.name))
                    .cloned()
                    .collect();
                dims.extend(extra.iter().cloned());
                if let Some(node) = self.nodes.get_mut(variable.name()) {
                    node.store.allocate(&options.label, dims);
                }
            }
        }
        log::debug!(
            target: "facetmap",
            "map '{}' over loop dims {:?} for {} variables",
            options.label,
            loop_dims.as_slice(),
            data.variables().len()
        );

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
            let node = self
                .nodes
                .get(var_name)
                .ok_or_else(|| FacetError::Validation(format!("no tree node for '{}'", var_name)))?;
            let aes = call::lookup_aes(&node.aes, &keys, &selection)?;
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
                if let Some(node) = self.nodes.get_mut(var_name) {
                    node.store.record_partial(&options.label, &selection, artist)?;
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
