// Library exports for strataplot

pub mod artifact;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod loader;
pub mod palette;
pub mod parser;
pub mod report;
pub mod runtime;
pub mod stats;
pub mod surface;

// Rendering pipeline
pub mod ir;
pub mod resolve;
pub mod transform;
pub mod scale;
pub mod compiler;

pub use artifact::ChartArtifact;
pub use data::{RecordTable, Value};
pub use error::{Error, Result};
pub use ir::{ChartKind, ChartRequest};
pub use runtime::{render_request, render_str};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type", alias = "format")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            format: OutputFormat::Png,
        }
    }
}
