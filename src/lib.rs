// Library exports for facetmap

pub mod aes;
pub mod backend;
pub mod call;
pub mod collection;
pub mod data;
pub mod dims;
pub mod error;
pub mod labeled;
pub mod layout;
pub mod selection;
pub mod store;
pub mod tree;

// Statistics, visuals and the DSL front end
pub mod parser;
pub mod preprocess;
pub mod runtime;
pub mod stats;
pub mod visuals;

pub use aes::{AesBinding, AesSpec, AesValue};
pub use backend::{Backend, GridOptions, PlottersBackend, TargetGrid};
pub use call::{FacetMap, MapCall, MapOptions, SubsetInfo};
pub use collection::{GridSpec, PlotCollection, WrapSpec};
pub use data::{Dataset, Dimension, Label, Variable};
pub use error::{FacetError, Result};
pub use layout::{FacetDim, VARIABLE_DIM};
pub use selection::{Selection, SelectionIter};
pub use tree::PlotTree;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}
