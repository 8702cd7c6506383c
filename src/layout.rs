//! Facet layout builder: sizing the target grid and indexing its cells by
//! facet coordinates.

use crate::backend::{Backend, GridOptions, TargetGrid};
use crate::data::{Dataset, Dimension, Variable};
use crate::dims::DimSet;
use crate::error::{FacetError, Result};
use crate::labeled::LabeledArray;
use crate::selection::Selection;
use std::collections::BTreeMap;
use std::fmt;

/// Spelling of the per-variable pseudo-dimension.
pub const VARIABLE_DIM: &str = "__variable__";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FacetDim {
    Named(String),
    /// One facet block per variable.
    Variable,
}

impl FacetDim {
    pub fn parse(name: &str) -> Self {
        if name == VARIABLE_DIM {
            FacetDim::Variable
        } else {
            FacetDim::Named(name.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FacetDim::Named(name) => name,
            FacetDim::Variable => VARIABLE_DIM,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, FacetDim::Variable)
    }
}

impl From<&str> for FacetDim {
    fn from(name: &str) -> Self {
        FacetDim::parse(name)
    }
}

impl fmt::Display for FacetDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn has_variable(dims: &[FacetDim]) -> bool {
    dims.iter().any(FacetDim::is_variable)
}

fn named(dims: &[FacetDim]) -> Vec<&str> {
    dims.iter()
        .filter_map(|d| match d {
            FacetDim::Named(name) => Some(name.as_str()),
            FacetDim::Variable => None,
        })
        .collect()
}

/// The variable's own dimensions among `names`, in the order of `names`.
fn variable_dims(variable: &Variable, names: &[&str]) -> Vec<Dimension> {
    names.iter().filter_map(|n| variable.dim(n).cloned()).collect()
}

/// Number of facet cells for `facet_dims`, and per variable when the
/// per-variable pseudo-dimension is present.
///
/// Without the pseudo-dimension every variable must own every facet
/// dimension with the same labels, and the per-variable list is empty.
pub fn facet_counts(dataset: &Dataset, facet_dims: &[FacetDim]) -> Result<(usize, Vec<(String, usize)>)> {
    let names = named(facet_dims);
    dataset.require_dims(&names)?;

    if has_variable(facet_dims) {
        let per_variable: Vec<(String, usize)> = dataset
            .variables()
            .iter()
            .map(|v| {
                let count = variable_dims(v, &names).iter().map(Dimension::size).product();
                (v.name().to_string(), count)
            })
            .collect();
        let total = per_variable.iter().map(|(_, c)| c).sum();
        return Ok((total, per_variable));
    }

    let mut missing = Vec::new();
    for variable in dataset.variables() {
        let lacking: Vec<&str> = names.iter().copied().filter(|n| !variable.has_dim(n)).collect();
        if !lacking.is_empty() {
            missing.push(format!("{}: {:?}", variable.name(), lacking));
        }
    }
    if !missing.is_empty() {
        return Err(FacetError::FacetAlignment(format!(
            "All variables must have all facetting dimensions, but these are missing: {}",
            missing.join(", ")
        )));
    }

    let dims = dataset.resolve_dims(&names)?;
    for dim in &dims {
        for variable in dataset.variables() {
            if variable.dim(&dim.name).map(|d| &d.labels) != Some(&dim.labels) {
                return Err(FacetError::FacetAlignment(format!(
                    "variable '{}' disagrees on the labels of facet dimension '{}'",
                    variable.name(),
                    dim.name
                )));
            }
        }
    }
    Ok((dims.iter().map(Dimension::size).product(), Vec::new()))
}

/// `(rows, cols)` holding `total` cells wrapped at `col_wrap` columns.
pub fn wrap_shape(total: usize, col_wrap: usize) -> Result<(usize, usize)> {
    if col_wrap == 0 {
        return Err(FacetError::Validation("col_wrap must be at least 1".to_string()));
    }
    if total <= col_wrap {
        Ok((1, total))
    } else {
        Ok((total.div_ceil(col_wrap), col_wrap))
    }
}

/// Targets and their grid coordinates, indexed by facet dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetGrid<T> {
    pub plot: LabeledArray<Option<T>>,
    pub row: LabeledArray<usize>,
    pub col: LabeledArray<usize>,
}

impl<T> FacetGrid<T> {
    fn from_cells(dims: Vec<Dimension>, cells: Vec<Option<T>>, positions: Vec<(usize, usize)>) -> Result<Self> {
        let (rows, cols): (Vec<usize>, Vec<usize>) = positions.into_iter().unzip();
        Ok(Self {
            plot: LabeledArray::from_vec(dims.clone(), cells)?,
            row: LabeledArray::from_vec(dims.clone(), rows)?,
            col: LabeledArray::from_vec(dims, cols)?,
        })
    }

    pub fn dims(&self) -> &[Dimension] {
        self.plot.dims()
    }

    /// Target addressed by the entries of `selection` on this grid's dims.
    pub fn target(&self, selection: &Selection) -> Option<&T> {
        self.plot.get(selection).and_then(Option::as_ref)
    }

    /// The target of a squeezed, dimensionless layout.
    pub fn single(&self) -> Option<&T> {
        if self.plot.is_scalar() {
            self.plot.data().first().and_then(Option::as_ref)
        } else {
            None
        }
    }

    pub fn position(&self, selection: &Selection) -> Option<(usize, usize)> {
        Some((*self.row.get(selection)?, *self.col.get(selection)?))
    }

    pub fn targets(&self) -> impl Iterator<Item = &T> {
        self.plot.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.plot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plot.is_empty()
    }
}

/// One grid shared by every variable, or one slice of the grid per variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout<T> {
    Shared(FacetGrid<T>),
    PerVariable(BTreeMap<String, FacetGrid<T>>),
}

impl<T> Layout<T> {
    /// The grid `variable` draws into.
    pub fn grid_for(&self, variable: &str) -> Option<&FacetGrid<T>> {
        match self {
            Layout::Shared(grid) => Some(grid),
            Layout::PerVariable(grids) => grids.get(variable),
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Layout::Shared(_))
    }

    /// Dimensions that index targets; always part of the loop dimensions.
    pub fn dims(&self) -> DimSet {
        match self {
            Layout::Shared(grid) => grid.dims().iter().map(|d| d.name.as_str()).collect(),
            Layout::PerVariable(grids) => grids
                .values()
                .flat_map(|g| g.dims().iter().map(|d| d.name.as_str()))
                .collect(),
        }
    }

    pub fn grids(&self) -> Vec<&FacetGrid<T>> {
        match self {
            Layout::Shared(grid) => vec![grid],
            Layout::PerVariable(grids) => grids.values().collect(),
        }
    }
}

/// A layout plus the canvas it was carved from.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetLayout<C, T> {
    pub canvas: C,
    pub layout: Layout<T>,
    pub rows: usize,
    pub cols: usize,
}

fn take_cells<T>(targets: TargetGrid<T>, total: usize) -> Result<Vec<Option<T>>> {
    let mut cells = targets.into_cells();
    if cells.len() < total {
        return Err(FacetError::Backend(format!(
            "backend returned {} targets for {} facets",
            cells.len(),
            total
        )));
    }
    cells.truncate(total);
    Ok(cells)
}

fn non_empty(total: usize) -> Result<()> {
    if total == 0 {
        return Err(FacetError::Validation(
            "facet dimensions span zero cells".to_string(),
        ));
    }
    Ok(())
}

fn shared_grid<T>(
    dataset: &Dataset,
    names: &[&str],
    cells: Vec<Option<T>>,
    positions: Vec<(usize, usize)>,
    options: &GridOptions,
) -> Result<Layout<T>> {
    // A squeezed single cell loses its facet dimensions.
    let dims = if options.squeeze && cells.len() == 1 {
        Vec::new()
    } else {
        dataset.resolve_dims(names)?
    };
    Ok(Layout::Shared(FacetGrid::from_cells(dims, cells, positions)?))
}

/// Lay out one cell per coordinate of `facet_dims`, wrapped at `col_wrap` columns.
pub fn build_wrap<B: Backend>(
    dataset: &Dataset,
    facet_dims: &[FacetDim],
    col_wrap: usize,
    backend: &mut B,
    options: &GridOptions,
) -> Result<FacetLayout<B::Canvas, B::Target>> {
    let (total, per_variable) = facet_counts(dataset, facet_dims)?;
    non_empty(total)?;
    let (rows, cols) = wrap_shape(total, col_wrap)?;
    log::debug!(
        target: "facetmap",
        "wrap layout over {:?}: {} cells in {}x{}",
        named(facet_dims),
        total,
        rows,
        cols
    );

    let (canvas, targets) = backend.create_plotting_grid(total, rows, cols, options)?;
    let cells = take_cells(targets, total)?;
    let positions: Vec<(usize, usize)> = (0..total).map(|i| (i / cols, i % cols)).collect();
    let names = named(facet_dims);

    let layout = if has_variable(facet_dims) {
        let mut grids = BTreeMap::new();
        let mut offset = 0;
        for (variable, (_, count)) in dataset.variables().iter().zip(per_variable) {
            let range = offset..offset + count;
            let grid = FacetGrid::from_cells(
                variable_dims(variable, &names),
                cells[range.clone()].to_vec(),
                positions[range].to_vec(),
            )?;
            log::trace!(target: "facetmap", "variable '{}' takes cells {}..{}", variable.name(), offset, offset + count);
            grids.insert(variable.name().to_string(), grid);
            offset += count;
        }
        Layout::PerVariable(grids)
    } else {
        shared_grid(dataset, &names, cells, positions, options)?
    };
    Ok(FacetLayout {
        canvas,
        layout,
        rows,
        cols,
    })
}

/// Lay out one row per coordinate of `row_dims` and one column per coordinate of `col_dims`.
///
/// With the per-variable pseudo-dimension on one axis, each variable owns a
/// contiguous block of rows (or columns) spanning the whole other axis.
pub fn build_grid<B: Backend>(
    dataset: &Dataset,
    row_dims: &[FacetDim],
    col_dims: &[FacetDim],
    backend: &mut B,
    options: &GridOptions,
) -> Result<FacetLayout<B::Canvas, B::Target>> {
    let repeated: Vec<&str> = named(row_dims)
        .into_iter()
        .filter(|r| named(col_dims).contains(r))
        .collect();
    if !repeated.is_empty() {
        return Err(FacetError::FacetAlignment(format!(
            "The same dimension can't be used for both cols and rows: {:?}",
            repeated
        )));
    }
    let variable_rows = has_variable(row_dims);
    if variable_rows && has_variable(col_dims) {
        return Err(FacetError::Validation(format!(
            "'{}' can facet rows or cols, not both",
            VARIABLE_DIM
        )));
    }

    let (n_rows, rows_per_variable) = facet_counts(dataset, row_dims)?;
    let (n_cols, cols_per_variable) = facet_counts(dataset, col_dims)?;
    let total = n_rows * n_cols;
    non_empty(total)?;
    log::debug!(
        target: "facetmap",
        "grid layout rows {:?} x cols {:?}: {}x{}",
        named(row_dims),
        named(col_dims),
        n_rows,
        n_cols
    );

    let (canvas, targets) = backend.create_plotting_grid(total, n_rows, n_cols, options)?;
    let cells = take_cells(targets, total)?;
    let positions: Vec<(usize, usize)> = (0..total).map(|i| (i / n_cols, i % n_cols)).collect();
    let mut names = named(row_dims);
    names.extend(named(col_dims));

    let layout = if !variable_rows && !has_variable(col_dims) {
        shared_grid(dataset, &names, cells, positions, options)?
    } else {
        let blocks = if variable_rows {
            rows_per_variable
        } else {
            cols_per_variable
        };
        let mut grids = BTreeMap::new();
        let mut offset = 0;
        for (variable, (_, count)) in dataset.variables().iter().zip(blocks) {
            let (row_range, col_range) = if variable_rows {
                (offset..offset + count, 0..n_cols)
            } else {
                (0..n_rows, offset..offset + count)
            };
            let indices: Vec<usize> = row_range
                .flat_map(|r| col_range.clone().map(move |c| r * n_cols + c))
                .collect();
            let grid = FacetGrid::from_cells(
                variable_dims(variable, &names),
                indices.iter().map(|&i| cells[i].clone()).collect(),
                indices.iter().map(|&i| positions[i]).collect(),
            )?;
            grids.insert(variable.name().to_string(), grid);
            offset += count;
        }
        Layout::PerVariable(grids)
    };
    Ok(FacetLayout {
        canvas,
        layout,
        rows: n_rows,
        cols: n_cols,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CellId, PlottersBackend};
    use crate::data::Label;
    use crate::selection::SelectionEntry;

    fn var(name: &str, dims: Vec<Dimension>) -> Variable {
        let n = dims.iter().map(Dimension::size).product();
        Variable::new(name, dims, vec![0.0; n]).unwrap()
    }

    fn teams() -> Dataset {
        Dataset::new(vec![var(
            "mu",
            vec![
                Dimension::range("chain", 4),
                Dimension::range("draw", 3),
                Dimension::new("team", ["a", "b", "c", "d"]),
            ],
        )])
        .unwrap()
    }

    fn mixed() -> Dataset {
        Dataset::new(vec![
            var("mu", vec![Dimension::range("chain", 2), Dimension::range("draw", 3)]),
            var(
                "theta",
                vec![
                    Dimension::range("chain", 2),
                    Dimension::range("draw", 3),
                    Dimension::new("school", ["x", "y", "z"]),
                ],
            ),
        ])
        .unwrap()
    }

    fn dims(names: &[&str]) -> Vec<FacetDim> {
        names.iter().map(|n| FacetDim::parse(n)).collect()
    }

    fn sel(entries: &[(&str, Label, usize)]) -> Selection {
        let mut s = Selection::default();
        for (dim, label, idx) in entries {
            s.push(SelectionEntry::new(dim, label.clone(), *idx));
        }
        s
    }

    #[test]
    fn test_wrap_shape() {
        assert_eq!(wrap_shape(4, 4).unwrap(), (1, 4));
        assert_eq!(wrap_shape(5, 4).unwrap(), (2, 4));
        assert_eq!(wrap_shape(8, 4).unwrap(), (2, 4));
        assert_eq!(wrap_shape(9, 4).unwrap(), (3, 4));
        assert!(matches!(wrap_shape(3, 0), Err(FacetError::Validation(_))));
    }

    #[test]
    fn test_facet_counts() {
        assert_eq!(facet_counts(&teams(), &[]).unwrap(), (1, vec![]));
        assert_eq!(facet_counts(&teams(), &dims(&["team", "chain"])).unwrap().0, 16);
        let (total, per_var) = facet_counts(&mixed(), &dims(&["__variable__", "school"])).unwrap();
        assert_eq!(total, 4);
        assert_eq!(per_var, vec![("mu".to_string(), 1), ("theta".to_string(), 3)]);
    }

    #[test]
    fn test_facet_counts_misaligned() {
        let res = facet_counts(&mixed(), &dims(&["school"]));
        assert!(matches!(res, Err(FacetError::FacetAlignment(_))));
        let res = facet_counts(&mixed(), &dims(&["team"]));
        assert!(matches!(res, Err(FacetError::DimensionNotFound { .. })));
    }

    #[test]
    fn test_wrap_one_row() {
        let mut backend = PlottersBackend::new();
        let layout = build_wrap(&teams(), &dims(&["team"]), 4, &mut backend, &GridOptions::default()).unwrap();
        assert_eq!((layout.rows, layout.cols), (1, 4));
        let Layout::Shared(grid) = &layout.layout else {
            panic!("expected a shared layout");
        };
        assert_eq!(grid.plot.shape(), vec![4]);
        let s = sel(&[("team", Label::from("c"), 2)]);
        assert_eq!(grid.target(&s), Some(&CellId { figure: 0, index: 2 }));
        assert_eq!(grid.position(&s), Some((0, 2)));
    }

    #[test]
    fn test_wrap_multiple_rows() {
        let mut backend = PlottersBackend::new();
        let layout = build_wrap(&teams(), &dims(&["team", "chain"]), 5, &mut backend, &GridOptions::default())
            .unwrap();
        assert_eq!((layout.rows, layout.cols), (4, 5));
        let grid = layout.layout.grid_for("mu").unwrap();
        assert_eq!(grid.plot.shape(), vec![4, 4]);
        assert_eq!(grid.targets().count(), 16);
        let s = sel(&[("team", Label::from("b"), 1), ("chain", Label::Int(3), 3)]);
        assert_eq!(grid.position(&s), Some((1, 2)));
    }

    #[test]
    fn test_wrap_squeeze() {
        let mut backend = PlottersBackend::new();
        let layout = build_wrap(&teams(), &[], 4, &mut backend, &GridOptions::default()).unwrap();
        let grid = layout.layout.grid_for("mu").unwrap();
        assert_eq!(grid.single(), Some(&CellId { figure: 0, index: 0 }));
        assert!(layout.layout.dims().is_empty());
    }

    #[test]
    fn test_wrap_per_variable_slices() {
        let mut backend = PlottersBackend::new();
        let options = GridOptions {
            squeeze: false,
            ..Default::default()
        };
        let layout =
            build_wrap(&mixed(), &dims(&["__variable__", "school"]), 3, &mut backend, &options).unwrap();
        assert_eq!((layout.rows, layout.cols), (2, 3));
        let Layout::PerVariable(grids) = &layout.layout else {
            panic!("expected a per-variable layout");
        };
        let mu = &grids["mu"];
        assert_eq!(mu.single(), Some(&CellId { figure: 0, index: 0 }));
        let theta = &grids["theta"];
        assert_eq!(theta.plot.shape(), vec![3]);
        let s = sel(&[("school", Label::from("x"), 0)]);
        assert_eq!(theta.target(&s), Some(&CellId { figure: 0, index: 1 }));
        let s = sel(&[("school", Label::from("z"), 2)]);
        assert_eq!(theta.position(&s), Some((1, 0)));
    }

    #[test]
    fn test_grid_shape() {
        let mut backend = PlottersBackend::new();
        let layout = build_grid(
            &teams(),
            &dims(&["chain"]),
            &dims(&["team"]),
            &mut backend,
            &GridOptions::default(),
        )
        .unwrap();
        assert_eq!((layout.rows, layout.cols), (4, 4));
        let grid = layout.layout.grid_for("mu").unwrap();
        assert_eq!(grid.dims()[0].name, "chain");
        let s = sel(&[("chain", Label::Int(2), 2), ("team", Label::from("d"), 3)]);
        assert_eq!(grid.position(&s), Some((2, 3)));
        assert_eq!(grid.target(&s), Some(&CellId { figure: 0, index: 11 }));
    }

    #[test]
    fn test_grid_overlap_rejected() {
        let mut backend = PlottersBackend::new();
        let res = build_grid(
            &teams(),
            &dims(&["chain", "team"]),
            &dims(&["team"]),
            &mut backend,
            &GridOptions::default(),
        );
        assert!(matches!(res, Err(FacetError::FacetAlignment(_))));
        assert!(backend.figures().is_empty());
    }

    #[test]
    fn test_grid_variable_rows() {
        let mut backend = PlottersBackend::new();
        let layout = build_grid(
            &mixed(),
            &dims(&["__variable__", "school"]),
            &dims(&["chain"]),
            &mut backend,
            &GridOptions::default(),
        )
        .unwrap();
        assert_eq!((layout.rows, layout.cols), (4, 2));
        let Layout::PerVariable(grids) = &layout.layout else {
            panic!("expected a per-variable layout");
        };
        assert_eq!(grids["mu"].plot.shape(), vec![2]);
        let s = sel(&[("school", Label::from("y"), 1), ("chain", Label::Int(1), 1)]);
        assert_eq!(grids["theta"].position(&s), Some((2, 1)));
        assert_eq!(grids["theta"].plot.shape(), vec![3, 2]);
    }

    #[test]
    fn test_grid_variable_cols() {
        let mut backend = PlottersBackend::new();
        let layout = build_grid(
            &mixed(),
            &dims(&["chain"]),
            &dims(&["__variable__"]),
            &mut backend,
            &GridOptions::default(),
        )
        .unwrap();
        assert_eq!((layout.rows, layout.cols), (2, 2));
        let theta = layout.layout.grid_for("theta").unwrap();
        let s = sel(&[("chain", Label::Int(1), 1)]);
        assert_eq!(theta.position(&s), Some((1, 1)));
    }

    #[test]
    fn test_grid_variable_both_axes() {
        let mut backend = PlottersBackend::new();
        let res = build_grid(
            &mixed(),
            &dims(&["__variable__"]),
            &dims(&["__variable__"]),
            &mut backend,
            &GridOptions::default(),
        );
        assert!(matches!(res, Err(FacetError::Validation(_))));
    }
}
