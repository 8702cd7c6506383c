//! Distribution visuals that can be handed to `map`.
//!
//! Each one reads its style from the call's aesthetics and extra parameters,
//! and its numbers from the preprocessed slice when there is one, computing
//! the statistic from the raw slice otherwise.

use crate::backend::{Backend, LineDash, LineStyle, Marker, Paint, ScatterStyle, TextStyle};
use crate::call::MapCall;
use crate::data::DatasetSlice;
use crate::error::{FacetError, Result};
use crate::stats;

fn paint<B: Backend>(call: &MapCall<'_, B>, key: &str) -> Option<Paint> {
    call.param(key).and_then(Paint::from_aes)
}

fn line_style<B: Backend>(call: &MapCall<'_, B>) -> Result<LineStyle> {
    let dash = match call.param_str("linestyle") {
        Some(s) => Some(
            LineDash::parse(s)
                .ok_or_else(|| FacetError::Validation(format!("unknown line style '{}'", s)))?,
        ),
        None => None,
    };
    Ok(LineStyle {
        color: paint(call, "color"),
        alpha: call.param_f64("alpha"),
        width: call.param_f64("linewidth"),
        dash,
    })
}

fn scatter_style<B: Backend>(call: &MapCall<'_, B>) -> Result<ScatterStyle> {
    let marker = match call.param_str("marker") {
        Some(s) => Some(
            Marker::parse(s).ok_or_else(|| FacetError::Validation(format!("unknown marker '{}'", s)))?,
        ),
        None => None,
    };
    Ok(ScatterStyle {
        size: call.param_f64("size"),
        marker,
        alpha: call.param_f64("alpha"),
        // `color` is shorthand for the face color
        facecolor: paint(call, "facecolor").or_else(|| paint(call, "color")),
        edgecolor: paint(call, "edgecolor"),
        edgewidth: call.param_f64("edgewidth"),
    })
}

fn text_style<B: Backend>(call: &MapCall<'_, B>) -> TextStyle {
    TextStyle {
        size: call.param_f64("fontsize"),
        alpha: call.param_f64("alpha"),
        color: paint(call, "color"),
    }
}

fn scalar(pre: &DatasetSlice, name: &str) -> Result<f64> {
    let values = pre.values(name)?;
    match values {
        [v] => Ok(*v),
        _ => Err(FacetError::ShapeMismatch(format!(
            "preprocessed '{}' should hold one value per plot, found {}",
            name,
            values.len()
        ))),
    }
}

fn point_value<B: Backend>(call: &MapCall<'_, B>) -> Result<(f64, String)> {
    if let Some(pre) = &call.preprocessed {
        let label = call.param_str("point_label").unwrap_or("mean").to_string();
        return Ok((scalar(pre, "point_estimate")?, label));
    }
    let func = call.param_str("point_func").unwrap_or("mean");
    let estimate = match func {
        "mean" => stats::point_estimate(call.data.flat())?,
        "median" => stats::median(call.data.flat())?,
        other => {
            return Err(FacetError::Validation(format!(
                "unknown point estimate '{}'",
                other
            )))
        }
    };
    let label = call.param_str("point_label").unwrap_or(func).to_string();
    Ok((estimate, label))
}

/// Density curve, lifted by the `y` parameter.
pub fn kde<B: Backend>(call: MapCall<'_, B>) -> Result<B::Artist> {
    let (grid, pdf) = match &call.preprocessed {
        Some(pre) => (pre.values("grid")?.to_vec(), pre.values("kde")?.to_vec()),
        None => stats::density_estimate(call.data.flat())?,
    };
    let y = call.param_f64("y").unwrap_or(0.0);
    let lifted: Vec<f64> = pdf.iter().map(|d| d + y).collect();
    let style = line_style(&call)?;
    call.backend.line(&grid, &lifted, &call.target, &style)
}

/// Horizontal credible interval drawn at height `y`.
pub fn interval<B: Backend>(call: MapCall<'_, B>) -> Result<B::Artist> {
    let bounds = match &call.preprocessed {
        Some(pre) => pre.values("interval")?.to_vec(),
        None => {
            let prob = call.param_f64("prob").unwrap_or(stats::DEFAULT_PROB);
            let (lower, upper) = match call.param_str("interval_func").unwrap_or("hdi") {
                "hdi" => stats::interval_estimate(call.data.flat(), prob)?,
                "eti" => stats::equal_tail_interval(call.data.flat(), prob)?,
                other => {
                    return Err(FacetError::Validation(format!(
                        "unknown interval function '{}'",
                        other
                    )))
                }
            };
            vec![lower, upper]
        }
    };
    let y = call.param_f64("y").unwrap_or(0.0);
    let style = line_style(&call)?;
    call.backend.line(&bounds, &[y, y], &call.target, &style)
}

/// Point estimate marker at height `y`.
pub fn point<B: Backend>(call: MapCall<'_, B>) -> Result<B::Artist> {
    let (estimate, _) = point_value(&call)?;
    let y = call.param_f64("y").unwrap_or(0.0);
    let style = scatter_style(&call)?;
    call.backend.scatter(&[estimate], &[y], &call.target, &style)
}

/// Text with the point estimate, placed at 5% of the density peak.
pub fn point_label<B: Backend>(call: MapCall<'_, B>) -> Result<B::Artist> {
    let (estimate, label) = point_value(&call)?;
    let pdf = match &call.preprocessed {
        Some(pre) => pre.values("kde")?.to_vec(),
        None => stats::density_estimate(call.data.flat())?.1,
    };
    let top = pdf.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let top = if top.is_finite() { top } else { 0.0 };
    let style = text_style(&call);
    let text = format!("{:.2} {}", estimate, label);
    call.backend.text(estimate, 0.05 * top, &text, &call.target, &style)
}
