//! Summaries computed once up front and attached with `set_preprocessed`.

use crate::data::{Dataset, Dimension, Label, Variable};
use crate::error::{FacetError, Result};
use crate::labeled::advance;
use crate::selection::{Selection, SelectionEntry};
use crate::stats;

/// Dimension of the density evaluation grid.
pub const KDE_DIM: &str = "kde_dim";
/// Dimension holding the lower and upper interval bounds.
pub const BOUND_DIM: &str = "bound";

/// Reduce `var` over `reduce_dims`, keeping every other dimension.
///
/// The result holds `grid` and `kde` (kept dims + [`KDE_DIM`]), `interval`
/// (kept dims + [`BOUND_DIM`]) and `point_estimate` (kept dims).
pub fn summarize<S: AsRef<str>>(
    dataset: &Dataset,
    var: &str,
    reduce_dims: &[S],
    grid_len: usize,
) -> Result<Dataset> {
    let variable = dataset
        .variable(var)
        .ok_or_else(|| FacetError::Validation(format!("no variable named '{}'", var)))?;
    if let Some(missing) = reduce_dims.iter().find(|d| !variable.has_dim(d.as_ref())) {
        return Err(FacetError::DimensionNotFound {
            dim: missing.as_ref().to_string(),
        });
    }

    let kept: Vec<Dimension> = variable
        .dims()
        .iter()
        .filter(|d| !reduce_dims.iter().any(|r| r.as_ref() == d.name))
        .cloned()
        .collect();
    let shape: Vec<usize> = kept.iter().map(Dimension::size).collect();
    let points: usize = shape.iter().product();

    log::debug!(
        target: "facetmap",
        "summarizing '{}' over {:?}: {} points kept",
        var,
        reduce_dims.iter().map(AsRef::as_ref).collect::<Vec<_>>(),
        points
    );

    let mut grid = Vec::with_capacity(points * grid_len);
    let mut kde = Vec::with_capacity(points * grid_len);
    let mut interval = Vec::with_capacity(points * 2);
    let mut point_estimate = Vec::with_capacity(points);

    let mut counter = vec![0; kept.len()];
    for _ in 0..points {
        let mut selection = Selection::default();
        for (dim, &idx) in kept.iter().zip(&counter) {
            selection.push(SelectionEntry::new(&dim.name, dim.labels[idx].clone(), idx));
        }
        let values = variable.sel(&selection)?.into_values();

        let (g, d) = stats::density_estimate_with(&values, grid_len)?;
        grid.extend(g);
        kde.extend(d);
        let (lower, upper) = stats::interval_estimate(&values, stats::DEFAULT_PROB)?;
        interval.extend([lower, upper]);
        point_estimate.push(stats::point_estimate(&values)?);

        advance(&mut counter, &shape);
    }

    let with = |extra: Dimension| {
        let mut dims = kept.clone();
        dims.push(extra);
        dims
    };
    let bounds = Dimension::new(BOUND_DIM, [Label::from("lower"), Label::from("upper")]);

    Dataset::new(vec![
        Variable::new("grid", with(Dimension::range(KDE_DIM, grid_len)), grid)?,
        Variable::new("kde", with(Dimension::range(KDE_DIM, grid_len)), kde)?,
        Variable::new("interval", with(bounds), interval)?,
        Variable::new("point_estimate", kept.clone(), point_estimate)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn posterior() -> Dataset {
        // chain x draw x team; team 'b' sits ten units above team 'a'
        let mut values = Vec::new();
        for c in 0..2 {
            for d in 0..5 {
                values.push((c + d) as f64);
                values.push((c + d) as f64 + 10.0);
            }
        }
        let mu = Variable::new(
            "mu",
            vec![
                Dimension::range("chain", 2),
                Dimension::range("draw", 5),
                Dimension::new("team", ["a", "b"]),
            ],
            values,
        )
        .unwrap();
        Dataset::new(vec![mu]).unwrap()
    }

    #[test]
    fn test_summarize_shapes() {
        let summary = summarize(&posterior(), "mu", &["chain", "draw"], 32).unwrap();
        assert_eq!(summary.variable("grid").unwrap().shape(), vec![2, 32]);
        assert_eq!(summary.variable("kde").unwrap().shape(), vec![2, 32]);
        assert_eq!(summary.variable("interval").unwrap().shape(), vec![2, 2]);
        assert_eq!(summary.variable("point_estimate").unwrap().shape(), vec![2]);
    }

    #[test]
    fn test_summarize_values_per_team() {
        let summary = summarize(&posterior(), "mu", &["chain", "draw"], 16).unwrap();
        let means = summary.variable("point_estimate").unwrap().values();
        assert_relative_eq!(means[0], 2.5);
        assert_relative_eq!(means[1], 12.5);

        let mut sel = Selection::default();
        sel.push(SelectionEntry::new("team", Label::from("b"), 1));
        let slice = summary.sel(&sel).unwrap();
        let bounds = slice.values("interval").unwrap();
        assert!(bounds[0] >= 10.0 && bounds[1] <= 15.0);
    }

    #[test]
    fn test_summarize_everything() {
        let summary = summarize(&posterior(), "mu", &["chain", "draw", "team"], 8).unwrap();
        let pe = summary.variable("point_estimate").unwrap();
        assert!(pe.dims().is_empty());
        assert_relative_eq!(pe.values()[0], 7.5);
    }

    #[test]
    fn test_summarize_errors() {
        let ds = posterior();
        assert!(matches!(
            summarize(&ds, "tau", &["chain"], 8),
            Err(FacetError::Validation(_))
        ));
        assert!(matches!(
            summarize(&ds, "mu", &["school"], 8),
            Err(FacetError::DimensionNotFound { .. })
        ));
    }
}
