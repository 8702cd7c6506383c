//! `plotters` implementation of [`Backend`].
//!
//! Drawing calls are recorded as a scene graph per figure and only rasterized
//! by [`PlottersBackend::render`], so shared axes can pool the ranges of every
//! cell before anything is drawn.

use super::style::{LineDash, LineStyle, Marker, Paint, ScatterStyle, TextStyle};
use super::{Backend, GridOptions, TargetGrid};
use crate::error::{FacetError, Result};
use crate::{OutputFormat, RenderOptions};
use anyhow::{anyhow, Context};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

/// Handle for one figure held by a [`PlottersBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FigureId(pub usize);

/// Handle for one cell of a figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId {
    pub figure: usize,
    pub index: usize,
}

/// Handle for one recorded draw command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtistId {
    pub figure: usize,
    pub cell: usize,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Line {
        points: Vec<(f64, f64)>,
        style: LineStyle,
    },
    Scatter {
        points: Vec<(f64, f64)>,
        style: ScatterStyle,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        style: TextStyle,
    },
}

impl DrawCommand {
    fn points(&self) -> Vec<(f64, f64)> {
        match self {
            DrawCommand::Line { points, .. } | DrawCommand::Scatter { points, .. } => points.clone(),
            DrawCommand::Text { x, y, .. } => vec![(*x, *y)],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelScene {
    pub row: usize,
    pub col: usize,
    /// Cells past the requested count are switched off and never drawn.
    pub active: bool,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FigureScene {
    pub rows: usize,
    pub cols: usize,
    pub count: usize,
    pub options: GridOptions,
    pub cells: Vec<PanelScene>,
}

/// Backend that records draw commands and renders them with `plotters`.
#[derive(Debug, Clone)]
pub struct PlottersBackend {
    figures: Vec<FigureScene>,
    line_defaults: LineStyle,
    scatter_defaults: ScatterStyle,
    text_defaults: TextStyle,
}

impl Default for PlottersBackend {
    fn default() -> Self {
        Self {
            figures: Vec::new(),
            line_defaults: LineStyle {
                color: Some(Paint::Color("C0".to_string())),
                alpha: Some(1.0),
                width: Some(1.5),
                dash: Some(LineDash::Solid),
            },
            scatter_defaults: ScatterStyle {
                size: Some(4.0),
                marker: Some(Marker::Circle),
                alpha: Some(1.0),
                facecolor: Some(Paint::Color("C0".to_string())),
                edgecolor: Some(Paint::None),
                edgewidth: Some(1.0),
            },
            text_defaults: TextStyle {
                size: Some(12.0),
                alpha: Some(1.0),
                color: Some(Paint::Color("black".to_string())),
            },
        }
    }
}

impl PlottersBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn figures(&self) -> &[FigureScene] {
        &self.figures
    }

    pub fn figure(&self, id: FigureId) -> Option<&FigureScene> {
        self.figures.get(id.0)
    }

    fn cell_mut(&mut self, target: &CellId) -> Result<&mut PanelScene> {
        let cell = self
            .figures
            .get_mut(target.figure)
            .and_then(|f| f.cells.get_mut(target.index))
            .ok_or_else(|| FacetError::Backend(format!("unknown target {:?}", target)))?;
        if !cell.active {
            return Err(FacetError::Backend(format!(
                "target {:?} is switched off",
                target
            )));
        }
        Ok(cell)
    }

    fn push(&mut self, target: &CellId, command: DrawCommand) -> Result<ArtistId> {
        let cell = self.cell_mut(target)?;
        cell.commands.push(command);
        Ok(ArtistId {
            figure: target.figure,
            cell: target.index,
            index: cell.commands.len() - 1,
        })
    }

    /// Rasterize (PNG) or serialize (SVG) one figure.
    pub fn render(&self, id: FigureId, options: &RenderOptions) -> anyhow::Result<Vec<u8>> {
        let scene = self
            .figure(id)
            .ok_or_else(|| anyhow!("Unknown figure {}", id.0))?;
        log::debug!(
            target: "facetmap",
            "rendering {}x{} figure at {}x{}",
            scene.rows,
            scene.cols,
            options.width,
            options.height
        );
        match options.format {
            OutputFormat::Png => {
                let len = (options.width as usize)
                    .checked_mul(options.height as usize)
                    .and_then(|n| n.checked_mul(3))
                    .ok_or_else(|| {
                        FacetError::Validation(format!(
                            "image size {}x{} is too large",
                            options.width, options.height
                        ))
                    })?;
                let mut buffer = vec![0u8; len];
                {
                    let root = BitMapBackend::with_buffer(&mut buffer, (options.width, options.height))
                        .into_drawing_area();
                    draw_scene(&root, scene)?;
                }
                let mut png_bytes = Vec::new();
                image::codecs::png::PngEncoder::new(&mut png_bytes)
                    .write_image(&buffer, options.width, options.height, image::ColorType::Rgb8)
                    .context("Failed to encode PNG")?;
                Ok(png_bytes)
            }
            OutputFormat::Svg => {
                let mut svg = String::new();
                {
                    let root =
                        SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
                    draw_scene(&root, scene)?;
                }
                Ok(svg.into_bytes())
            }
        }
    }
}

fn check_lengths(x: &[f64], y: &[f64]) -> Result<Vec<(f64, f64)>> {
    if x.len() != y.len() {
        return Err(FacetError::Backend(format!(
            "X and Y data must have the same length (x: {}, y: {})",
            x.len(),
            y.len()
        )));
    }
    Ok(x.iter().copied().zip(y.iter().copied()).collect())
}

fn check_paint(paint: &Option<Paint>) -> Result<()> {
    match paint {
        Some(Paint::Color(name)) if parse_color(name).is_none() => {
            Err(FacetError::Backend(format!("unknown color '{}'", name)))
        }
        _ => Ok(()),
    }
}

impl Backend for PlottersBackend {
    type Canvas = FigureId;
    type Target = CellId;
    type Artist = ArtistId;

    fn create_plotting_grid(
        &mut self,
        count: usize,
        rows: usize,
        cols: usize,
        options: &GridOptions,
    ) -> Result<(FigureId, TargetGrid<CellId>)> {
        if count > rows * cols {
            return Err(FacetError::Backend(format!(
                "cannot place {} targets in a {}x{} grid",
                count, rows, cols
            )));
        }
        let figure = self.figures.len();
        let cells = (0..rows * cols)
            .map(|i| PanelScene {
                row: i / cols,
                col: i % cols,
                active: i < count,
                commands: Vec::new(),
            })
            .collect();
        self.figures.push(FigureScene {
            rows,
            cols,
            count,
            options: *options,
            cells,
        });

        let targets = if options.squeeze && count == 1 && rows * cols == 1 {
            TargetGrid::Single(CellId { figure, index: 0 })
        } else {
            TargetGrid::Cells(
                (0..rows * cols)
                    .map(|index| (index < count).then_some(CellId { figure, index }))
                    .collect(),
            )
        };
        Ok((FigureId(figure), targets))
    }

    fn line(&mut self, x: &[f64], y: &[f64], target: &CellId, style: &LineStyle) -> Result<ArtistId> {
        let points = check_lengths(x, y)?;
        let style = style.merge_over(&self.line_defaults);
        check_paint(&style.color)?;
        self.push(target, DrawCommand::Line { points, style })
    }

    fn scatter(&mut self, x: &[f64], y: &[f64], target: &CellId, style: &ScatterStyle) -> Result<ArtistId> {
        let points = check_lengths(x, y)?;
        let style = style.merge_over(&self.scatter_defaults);
        check_paint(&style.facecolor)?;
        check_paint(&style.edgecolor)?;
        self.push(target, DrawCommand::Scatter { points, style })
    }

    fn text(&mut self, x: f64, y: f64, text: &str, target: &CellId, style: &TextStyle) -> Result<ArtistId> {
        let style = style.merge_over(&self.text_defaults);
        check_paint(&style.color)?;
        self.push(
            target,
            DrawCommand::Text {
                x,
                y,
                text: text.to_string(),
                style,
            },
        )
    }
}

/// Data extent of `values` padded by 5%, or +/-1 around a single value.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min > max {
        0.0..1.0
    } else if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

/// Axis ranges per cell, pooled over the active cells when axes are shared.
fn panel_ranges(scene: &FigureScene) -> Vec<(Range<f64>, Range<f64>)> {
    let points: Vec<Vec<(f64, f64)>> = scene
        .cells
        .iter()
        .map(|cell| cell.commands.iter().flat_map(DrawCommand::points).collect())
        .collect();
    let all = || points.iter().zip(&scene.cells).filter(|(_, c)| c.active).flat_map(|(p, _)| p.iter());
    let shared_x = padded_range(all().map(|p| p.0));
    let shared_y = padded_range(all().map(|p| p.1));

    points
        .iter()
        .map(|pts| {
            let x = if scene.options.sharex {
                shared_x.clone()
            } else {
                padded_range(pts.iter().map(|p| p.0))
            };
            let y = if scene.options.sharey {
                shared_y.clone()
            } else {
                padded_range(pts.iter().map(|p| p.1))
            };
            (x, y)
        })
        .collect()
}

/// Split a polyline into the visible runs of a dash pattern counted in points.
fn dash_runs(points: &[(f64, f64)], on: usize, off: usize) -> Vec<Vec<(f64, f64)>> {
    points
        .chunks(on + off)
        .map(|chunk| chunk.iter().take(on + 1).copied().collect::<Vec<_>>())
        .filter(|run| run.len() > 1)
        .collect()
}

fn resolve_paint(paint: &Option<Paint>, alpha: Option<f64>) -> Option<RGBAColor> {
    match paint {
        Some(Paint::Color(name)) => parse_color(name).map(|c| c.mix(alpha.unwrap_or(1.0))),
        Some(Paint::None) | None => None,
    }
}

fn draw_scene<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &FigureScene) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;
    let areas = root.split_evenly((scene.rows.max(1), scene.cols.max(1)));
    let ranges = panel_ranges(scene);
    for ((cell, area), (x_range, y_range)) in scene.cells.iter().zip(&areas).zip(ranges) {
        if cell.active {
            draw_panel(area, cell, x_range, y_range, scene.options.polar)?;
        }
    }
    root.present().context("Failed to present drawing")?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    cell: &PanelScene,
    x_range: Range<f64>,
    y_range: Range<f64>,
    polar: bool,
) -> anyhow::Result<()>
where
    DB::ErrorType: 'static,
{
    // No polar coordinate system in plotters; mark the panel instead.
    let caption = if polar { "polar" } else { "" };
    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .caption(caption, ("sans-serif", 14.0))
        .x_label_area_size(25)
        .y_label_area_size(40)
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_labels(5)
        .y_labels(5)
        .draw()
        .context("Failed to draw mesh")?;

    for command in &cell.commands {
        match command {
            DrawCommand::Line { points, style } => {
                let Some(color) = resolve_paint(&style.color, style.alpha) else {
                    continue;
                };
                let shape = color.stroke_width(style.width.unwrap_or(1.5).round().max(1.0) as u32);
                let runs = match style.dash.unwrap_or(LineDash::Solid) {
                    LineDash::Solid => vec![points.clone()],
                    LineDash::Dashed => dash_runs(points, 8, 6),
                    LineDash::Dotted => dash_runs(points, 2, 4),
                };
                for run in runs {
                    chart
                        .draw_series(LineSeries::new(run, shape))
                        .context("Failed to draw line series")?;
                }
            }
            DrawCommand::Scatter { points, style } => {
                let size = style.size.unwrap_or(4.0).round().max(1.0) as i32;
                let edge_width = style.edgewidth.unwrap_or(1.0).round().max(1.0) as u32;
                let mut shapes = Vec::new();
                if let Some(fill) = resolve_paint(&style.facecolor, style.alpha) {
                    shapes.push(fill.filled());
                }
                if let Some(edge) = resolve_paint(&style.edgecolor, style.alpha) {
                    shapes.push(edge.stroke_width(edge_width));
                }
                let marker = style.marker.unwrap_or(Marker::Circle);
                for shape in shapes {
                    let drawn = match marker {
                        Marker::Circle => {
                            chart.draw_series(points.iter().map(|&p| Circle::new(p, size, shape)))
                        }
                        Marker::Cross => {
                            chart.draw_series(points.iter().map(|&p| Cross::new(p, size, shape)))
                        }
                        Marker::Triangle => {
                            chart.draw_series(points.iter().map(|&p| TriangleMarker::new(p, size, shape)))
                        }
                        Marker::Square => chart.draw_series(points.iter().map(|&p| {
                            EmptyElement::at(p) + Rectangle::new([(-size, -size), (size, size)], shape)
                        })),
                    };
                    drawn.context("Failed to draw scatter series")?;
                }
            }
            DrawCommand::Text { x, y, text, style } => {
                let Some(color) = resolve_paint(&style.color, style.alpha) else {
                    continue;
                };
                let font = ("sans-serif", style.size.unwrap_or(12.0)).into_font().color(&color);
                chart
                    .draw_series(std::iter::once(Text::new(text.clone(), (*x, *y), font)))
                    .context("Failed to draw text")?;
            }
        }
    }
    Ok(())
}

const TAB10: [(u8, u8, u8); 10] = [
    (31, 119, 180),
    (255, 127, 14),
    (44, 160, 44),
    (214, 39, 40),
    (148, 103, 189),
    (140, 86, 75),
    (227, 119, 194),
    (127, 127, 127),
    (188, 189, 34),
    (23, 190, 207),
];

/// Parse a named color, a `C0`..`C9` cycle color or a `#rrggbb` hex string.
pub fn parse_color(name: &str) -> Option<RGBColor> {
    let named = match name {
        "red" => Some(RED),
        "green" => Some(GREEN),
        "blue" => Some(BLUE),
        "black" | "k" => Some(BLACK),
        "yellow" => Some(YELLOW),
        "cyan" => Some(CYAN),
        "magenta" => Some(MAGENTA),
        "white" => Some(WHITE),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        _ => None,
    };
    if named.is_some() {
        return named;
    }
    if let Some(idx) = name.strip_prefix('C').and_then(|d| d.parse::<usize>().ok()) {
        return TAB10.get(idx).map(|&(r, g, b)| RGBColor(r, g, b));
    }
    let hex = name.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(backend: &mut PlottersBackend, count: usize, rows: usize, cols: usize) -> TargetGrid<CellId> {
        backend
            .create_plotting_grid(count, rows, cols, &GridOptions::default())
            .unwrap()
            .1
    }

    #[test]
    fn test_squeeze_single_cell() {
        let mut backend = PlottersBackend::new();
        assert_eq!(
            grid(&mut backend, 1, 1, 1),
            TargetGrid::Single(CellId { figure: 0, index: 0 })
        );
        let opts = GridOptions {
            squeeze: false,
            ..Default::default()
        };
        let (_, targets) = backend.create_plotting_grid(1, 1, 1, &opts).unwrap();
        assert!(matches!(targets, TargetGrid::Cells(ref c) if c.len() == 1));
    }

    #[test]
    fn test_cells_past_count_are_off() {
        let mut backend = PlottersBackend::new();
        let cells = grid(&mut backend, 5, 2, 3).into_cells();
        assert_eq!(cells.len(), 6);
        assert!(cells[4].is_some());
        assert!(cells[5].is_none());
        let scene = &backend.figures()[0];
        assert!(!scene.cells[5].active);
        assert_eq!((scene.cells[4].row, scene.cells[4].col), (1, 1));
    }

    #[test]
    fn test_too_many_targets() {
        let mut backend = PlottersBackend::new();
        let res = backend.create_plotting_grid(7, 2, 3, &GridOptions::default());
        assert!(matches!(res, Err(FacetError::Backend(_))));
    }

    #[test]
    fn test_line_merges_defaults() {
        let mut backend = PlottersBackend::new();
        let cells = grid(&mut backend, 2, 1, 2).into_cells();
        let target = cells[1].unwrap();
        let style = LineStyle {
            color: Some(Paint::Color("C3".to_string())),
            ..Default::default()
        };
        let artist = backend.line(&[0.0, 1.0], &[1.0, 2.0], &target, &style).unwrap();
        assert_eq!(artist, ArtistId { figure: 0, cell: 1, index: 0 });
        match &backend.figures()[0].cells[1].commands[0] {
            DrawCommand::Line { style, .. } => {
                assert_eq!(style.color, Some(Paint::Color("C3".to_string())));
                assert_eq!(style.width, Some(1.5));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_line_length_mismatch() {
        let mut backend = PlottersBackend::new();
        let target = grid(&mut backend, 1, 1, 1).into_cells()[0].unwrap();
        let res = backend.line(&[0.0], &[1.0, 2.0], &target, &LineStyle::default());
        assert!(matches!(res, Err(FacetError::Backend(_))));
    }

    #[test]
    fn test_unknown_color_rejected() {
        let mut backend = PlottersBackend::new();
        let target = grid(&mut backend, 1, 1, 1).into_cells()[0].unwrap();
        let style = TextStyle {
            color: Some(Paint::Color("not-a-color".to_string())),
            ..Default::default()
        };
        assert!(backend.text(0.0, 0.0, "hi", &target, &style).is_err());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("C1"), Some(RGBColor(255, 127, 14)));
        assert_eq!(parse_color("#ff0010"), Some(RGBColor(255, 0, 16)));
        assert_eq!(parse_color("blue"), Some(BLUE));
        assert_eq!(parse_color("C12"), None);
        assert_eq!(parse_color("#ff00"), None);
    }

    #[test]
    fn test_shared_ranges() {
        let mut backend = PlottersBackend::new();
        let opts = GridOptions {
            sharex: true,
            ..Default::default()
        };
        let (_, targets) = backend.create_plotting_grid(2, 1, 2, &opts).unwrap();
        let cells = targets.into_cells();
        backend
            .scatter(&[0.0], &[0.0], &cells[0].unwrap(), &ScatterStyle::default())
            .unwrap();
        backend
            .scatter(&[10.0], &[5.0], &cells[1].unwrap(), &ScatterStyle::default())
            .unwrap();
        let ranges = panel_ranges(&backend.figures()[0]);
        assert_eq!(ranges[0].0, ranges[1].0);
        assert_ne!(ranges[0].1, ranges[1].1);
    }

    #[test]
    fn test_dash_runs() {
        let points: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 0.0)).collect();
        let runs = dash_runs(&points, 2, 3);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 3);
    }

    #[test]
    fn test_render_png_header() {
        let mut backend = PlottersBackend::new();
        let (canvas, targets) = backend
            .create_plotting_grid(1, 1, 1, &GridOptions::default())
            .unwrap();
        let target = targets.into_cells()[0].unwrap();
        backend
            .line(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.5], &target, &LineStyle::default())
            .unwrap();
        let options = RenderOptions {
            width: 200,
            height: 150,
            ..Default::default()
        };
        let bytes = backend.render(canvas, &options).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_render_size_overflow() {
        let mut backend = PlottersBackend::new();
        let (canvas, _) = backend
            .create_plotting_grid(1, 1, 1, &GridOptions::default())
            .unwrap();
        let options = RenderOptions {
            width: u32::MAX,
            height: u32::MAX,
            ..Default::default()
        };
        let err = backend.render(canvas, &options).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FacetError>(),
            Some(FacetError::Validation(_))
        ));
    }
}
