//! Style options for the drawing primitives.
//!
//! Every field is optional: `None` means "unset, use the backend default".
//! An explicit absence of effect (no stroke, no fill) is [`Paint::None`],
//! which is a real value and overrides the default.

use crate::aes::AesValue;

/// A color, or explicitly no color.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    None,
    Color(String),
}

impl Paint {
    /// Read a paint from an aesthetic value; [`AesValue::None`] stays unset.
    pub fn from_aes(value: &AesValue) -> Option<Paint> {
        match value {
            AesValue::Str(s) if s.eq_ignore_ascii_case("none") => Some(Paint::None),
            AesValue::Str(s) => Some(Paint::Color(s.clone())),
            AesValue::Num(n) => Some(Paint::Color(n.to_string())),
            AesValue::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDash {
    Solid,
    Dashed,
    Dotted,
}

impl LineDash {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "solid" | "-" => Some(LineDash::Solid),
            "dashed" | "--" => Some(LineDash::Dashed),
            "dotted" | ":" => Some(LineDash::Dotted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
    Triangle,
    Cross,
}

impl Marker {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "circle" | "o" => Some(Marker::Circle),
            "square" | "s" => Some(Marker::Square),
            "triangle" | "^" => Some(Marker::Triangle),
            "cross" | "x" | "+" => Some(Marker::Cross),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineStyle {
    pub color: Option<Paint>,
    pub alpha: Option<f64>,
    pub width: Option<f64>,
    pub dash: Option<LineDash>,
}

impl LineStyle {
    /// Set fields of `self` win; unset ones take the value from `defaults`.
    pub fn merge_over(&self, defaults: &LineStyle) -> LineStyle {
        LineStyle {
            color: self.color.clone().or_else(|| defaults.color.clone()),
            alpha: self.alpha.or(defaults.alpha),
            width: self.width.or(defaults.width),
            dash: self.dash.or(defaults.dash),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScatterStyle {
    pub size: Option<f64>,
    pub marker: Option<Marker>,
    pub alpha: Option<f64>,
    pub facecolor: Option<Paint>,
    pub edgecolor: Option<Paint>,
    pub edgewidth: Option<f64>,
}

impl ScatterStyle {
    pub fn merge_over(&self, defaults: &ScatterStyle) -> ScatterStyle {
        ScatterStyle {
            size: self.size.or(defaults.size),
            marker: self.marker.or(defaults.marker),
            alpha: self.alpha.or(defaults.alpha),
            facecolor: self.facecolor.clone().or_else(|| defaults.facecolor.clone()),
            edgecolor: self.edgecolor.clone().or_else(|| defaults.edgecolor.clone()),
            edgewidth: self.edgewidth.or(defaults.edgewidth),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyle {
    pub size: Option<f64>,
    pub alpha: Option<f64>,
    pub color: Option<Paint>,
}

impl TextStyle {
    pub fn merge_over(&self, defaults: &TextStyle) -> TextStyle {
        TextStyle {
            size: self.size.or(defaults.size),
            alpha: self.alpha.or(defaults.alpha),
            color: self.color.clone().or_else(|| defaults.color.clone()),
        }
    }
}
