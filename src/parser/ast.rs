// Abstract syntax tree of the faceting DSL

use crate::aes::AesValue;

/// How the facet cells are laid out.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutCommand {
    /// wrap(cols: [..], col_wrap: N)
    Wrap {
        cols: Vec<String>,
        col_wrap: Option<usize>,
    },
    /// grid(rows: [..], cols: [..])
    Grid { rows: Vec<String>, cols: Vec<String> },
}

/// aes(color: [chain], values: ["C0", "C1"])
#[derive(Debug, Clone, PartialEq)]
pub struct AesCommand {
    pub key: String,
    pub dims: Vec<String>,
    /// Empty means "no values supplied".
    pub values: Vec<AesValue>,
}

/// options(sharex: true, ...); unset fields keep the configured value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptionsCommand {
    pub squeeze: Option<bool>,
    pub sharex: Option<bool>,
    pub sharey: Option<bool>,
    pub polar: Option<bool>,
}

/// preprocess(var: mu, dims: [chain, draw], grid_len: 512)
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessCommand {
    pub var: Option<String>,
    pub dims: Vec<String>,
    pub grid_len: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visual {
    Kde,
    Interval,
    Point,
    PointLabel,
}

impl Visual {
    pub fn name(&self) -> &'static str {
        match self {
            Visual::Kde => "kde",
            Visual::Interval => "interval",
            Visual::Point => "point",
            Visual::PointLabel => "point_label",
        }
    }
}

/// One mapped visual, e.g. kde(color: "C1", ignore: [color], preprocessed: true)
#[derive(Debug, Clone, PartialEq)]
pub struct VisualCommand {
    pub visual: Visual,
    pub label: Option<String>,
    pub ignore: Vec<String>,
    pub preprocessed: bool,
    pub subset_info: bool,
    /// Remaining `key: value` arguments, forwarded as extra parameters.
    pub params: Vec<(String, AesValue)>,
}

impl VisualCommand {
    pub fn new(visual: Visual) -> Self {
        Self {
            visual,
            label: None,
            ignore: Vec::new(),
            preprocessed: false,
            subset_info: false,
            params: Vec::new(),
        }
    }

    /// Artifact label: the explicit one, or the visual's name.
    pub fn artifact_label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.visual.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Layout(LayoutCommand),
    Aes(AesCommand),
    Options(OptionsCommand),
    Preprocess(PreprocessCommand),
    Visual(VisualCommand),
}

/// A complete faceting pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetSpec {
    pub layout: LayoutCommand,
    pub aes: Vec<AesCommand>,
    pub options: OptionsCommand,
    pub preprocess: Option<PreprocessCommand>,
    pub visuals: Vec<VisualCommand>,
}
