//! Rendering backend contract consumed by the layout builder and the visuals.

pub mod plotting;
pub mod style;

pub use plotting::{ArtistId, CellId, DrawCommand, FigureId, PanelScene, PlottersBackend};
pub use style::{LineDash, LineStyle, Marker, Paint, ScatterStyle, TextStyle};

use crate::error::Result;
use serde::Deserialize;

/// Options forwarded to [`Backend::create_plotting_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridOptions {
    /// Return a bare target instead of a one-cell grid.
    #[serde(default = "default_squeeze")]
    pub squeeze: bool,
    #[serde(default)]
    pub sharex: bool,
    #[serde(default)]
    pub sharey: bool,
    #[serde(default)]
    pub polar: bool,
}

fn default_squeeze() -> bool {
    true
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            squeeze: true,
            sharex: false,
            sharey: false,
            polar: false,
        }
    }
}

/// Targets handed back by a backend for a `rows x cols` grid.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetGrid<T> {
    /// Squeezed single-cell grid.
    Single(T),
    /// Row-major cells; cells past the requested count are `None`.
    Cells(Vec<Option<T>>),
}

impl<T> TargetGrid<T> {
    pub fn into_cells(self) -> Vec<Option<T>> {
        match self {
            TargetGrid::Single(t) => vec![Some(t)],
            TargetGrid::Cells(cells) => cells,
        }
    }
}

/// A rendering library adapter.
///
/// Handles are opaque to the faceting core: it only stores targets in the
/// layout and artists in the artifact store.
pub trait Backend {
    /// Handle for the whole chart.
    type Canvas;
    /// Handle for one plotting area.
    type Target: Clone;
    /// Handle for one drawn element.
    type Artist: Clone;

    /// Allocate `rows * cols` targets, switching off any past `count`.
    fn create_plotting_grid(
        &mut self,
        count: usize,
        rows: usize,
        cols: usize,
        options: &GridOptions,
    ) -> Result<(Self::Canvas, TargetGrid<Self::Target>)>;

    fn line(&mut self, x: &[f64], y: &[f64], target: &Self::Target, style: &LineStyle) -> Result<Self::Artist>;

    fn scatter(
        &mut self,
        x: &[f64],
        y: &[f64],
        target: &Self::Target,
        style: &ScatterStyle,
    ) -> Result<Self::Artist>;

    fn text(
        &mut self,
        x: f64,
        y: f64,
        text: &str,
        target: &Self::Target,
        style: &TextStyle,
    ) -> Result<Self::Artist>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_options_defaults() {
        let opts: GridOptions = serde_json::from_str(r#"{"sharex": true}"#).unwrap();
        assert!(opts.squeeze);
        assert!(opts.sharex);
        assert!(!opts.polar);
        assert_eq!(GridOptions::default().squeeze, opts.squeeze);
    }

    #[test]
    fn test_target_grid_cells() {
        assert_eq!(TargetGrid::Single(3).into_cells(), vec![Some(3)]);
        assert_eq!(TargetGrid::Cells(vec![Some(1), None]).into_cells().len(), 2);
    }
}
