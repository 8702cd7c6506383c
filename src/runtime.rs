// Runtime executor for the faceting DSL

use crate::aes::AesSpec;
use crate::backend::{Backend, GridOptions, PlottersBackend};
use crate::call::{FacetMap, MapOptions};
use crate::collection::{GridSpec, PlotCollection, WrapSpec};
use crate::data::Dataset;
use crate::layout::VARIABLE_DIM;
use crate::parser::ast::{AesCommand, FacetSpec, LayoutCommand, OptionsCommand, Visual, VisualCommand};
use crate::preprocess;
use crate::stats::DEFAULT_GRID_LEN;
use crate::tree::PlotTree;
use crate::visuals;
use crate::RenderOptions;
use anyhow::{anyhow, Context, Result};

/// Render a faceting pipeline over `dataset` to image bytes.
pub fn render_facets(
    spec: &FacetSpec,
    dataset: &Dataset,
    grid_options: GridOptions,
    render_options: &RenderOptions,
) -> Result<Vec<u8>> {
    let options = apply_options(grid_options, &spec.options);
    let aes = aes_spec(&spec.aes);

    let preprocessed = match &spec.preprocess {
        Some(p) => {
            let var = match &p.var {
                Some(v) => v.clone(),
                None => dataset
                    .names()
                    .next()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("Cannot preprocess a dataset without variables"))?,
            };
            let grid_len = p.grid_len.unwrap_or(DEFAULT_GRID_LEN);
            let summary = preprocess::summarize(dataset, &var, &p.dims, grid_len)
                .with_context(|| format!("Failed to preprocess variable '{}'", var))?;
            Some(summary)
        }
        None => None,
    };

    let backend = PlottersBackend::new();
    let (backend, canvas) = if uses_tree(spec, dataset) {
        log::debug!(target: "facetmap", "rendering with a per-variable tree");
        let mut tree = match &spec.layout {
            LayoutCommand::Wrap { cols, col_wrap } => {
                PlotTree::wrap(dataset, &wrap_spec(cols, *col_wrap), backend, &options, aes)
            }
            LayoutCommand::Grid { rows, cols } => {
                PlotTree::grid(dataset, &GridSpec::new(rows, cols), backend, &options, aes)
            }
        }
        .context("Failed to build facet layout")?;
        draw::<PlottersBackend, _>(&mut tree, &spec.visuals, preprocessed)?;
        tree.into_parts()
    } else {
        log::debug!(target: "facetmap", "rendering with a shared collection");
        let mut collection = match &spec.layout {
            LayoutCommand::Wrap { cols, col_wrap } => {
                PlotCollection::wrap(dataset, &wrap_spec(cols, *col_wrap), backend, &options, aes)
            }
            LayoutCommand::Grid { rows, cols } => {
                PlotCollection::grid(dataset, &GridSpec::new(rows, cols), backend, &options, aes)
            }
        }
        .context("Failed to build facet layout")?;
        draw::<PlottersBackend, _>(&mut collection, &spec.visuals, preprocessed)?;
        collection.into_parts()
    };

    backend.render(canvas, render_options)
}

/// A `__variable__` facet or per-variable dimensions need the tree.
fn uses_tree(spec: &FacetSpec, dataset: &Dataset) -> bool {
    let mentions_variable = match &spec.layout {
        LayoutCommand::Wrap { cols, .. } => cols.iter().any(|c| c == VARIABLE_DIM),
        LayoutCommand::Grid { rows, cols } => rows.iter().chain(cols).any(|c| c == VARIABLE_DIM),
    };
    mentions_variable || dataset.is_heterogeneous()
}

fn wrap_spec(cols: &[String], col_wrap: Option<usize>) -> WrapSpec {
    let spec = WrapSpec::new(cols);
    match col_wrap {
        Some(n) => spec.col_wrap(n),
        None => spec,
    }
}

fn apply_options(base: GridOptions, overrides: &OptionsCommand) -> GridOptions {
    GridOptions {
        squeeze: overrides.squeeze.unwrap_or(base.squeeze),
        sharex: overrides.sharex.unwrap_or(base.sharex),
        sharey: overrides.sharey.unwrap_or(base.sharey),
        polar: overrides.polar.unwrap_or(base.polar),
    }
}

fn aes_spec(commands: &[AesCommand]) -> AesSpec {
    commands.iter().fold(AesSpec::new(), |spec, cmd| {
        let spec = spec.map(&cmd.key, &cmd.dims);
        if cmd.values.is_empty() {
            spec
        } else {
            spec.values(&cmd.key, cmd.values.iter().cloned())
        }
    })
}

fn map_options(cmd: &VisualCommand) -> MapOptions {
    cmd.params.iter().fold(
        MapOptions::new(cmd.artifact_label())
            .ignore(&cmd.ignore)
            .preprocessed(cmd.preprocessed)
            .subset_info(cmd.subset_info),
        |options, (key, value)| options.param(key, value.clone()),
    )
}

/// Map every visual of the pipeline, in order.
fn draw<B, M>(plot: &mut M, visuals: &[VisualCommand], preprocessed: Option<Dataset>) -> Result<()>
where
    B: Backend,
    M: FacetMap<B>,
{
    if let Some(data) = preprocessed {
        plot.set_preprocessed(data);
    }
    for cmd in visuals {
        let options = map_options(cmd);
        let mapped = match cmd.visual {
            Visual::Kde => plot.map(visuals::kde::<B>, &options),
            Visual::Interval => plot.map(visuals::interval::<B>, &options),
            Visual::Point => plot.map(visuals::point::<B>, &options),
            Visual::PointLabel => plot.map(visuals::point_label::<B>, &options),
        };
        mapped.with_context(|| format!("Failed to map {}", cmd.visual.name()))?;
    }
    Ok(())
}
