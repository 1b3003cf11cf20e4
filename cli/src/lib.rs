use chart::{AnalysisConfig, ChartAnalysis, ChartError, TextRegion};
use image::GrayImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error(transparent)]
    ChartError(#[from] ChartError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// OCR output for one region
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct OcrDocument {
    #[serde(default)]
    pub regions: Vec<TextRegion>,
}

/// JSON OCR files may be a bare array of regions or a `{ "regions": [...] }` object
#[derive(Deserialize)]
#[serde(untagged)]
enum OcrJson {
    Regions(Vec<TextRegion>),
    Document(OcrDocument),
}

impl OcrDocument {
    /// Load OCR regions from TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load OCR regions from JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(match serde_json::from_str(content)? {
            OcrJson::Regions(regions) => Self { regions },
            OcrJson::Document(document) => document,
        })
    }

    /// Auto-detect file format and load OCR regions
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path_ref)?),
            Some("json") => Self::from_json(&fs::read_to_string(path_ref)?),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }
}

/// Open any raster format `image` understands as a grayscale region
pub fn load_region<P: AsRef<Path>>(path: P) -> Result<GrayImage, CliError> {
    Ok(image::open(path)?.to_luma8())
}

/// Configuration file if given, defaults otherwise
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, CliError> {
    match path {
        Some(path) => Ok(AnalysisConfig::from_file(path)?),
        None => Ok(AnalysisConfig::default()),
    }
}

/// One-line human summary of an analysis
pub fn summary(analysis: &ChartAnalysis) -> String {
    let mut line = format!(
        "{} chart (confidence {:.2}), {} shapes, {} patterns, {} data points",
        analysis.chart.kind,
        analysis.chart.confidence,
        analysis.shapes.len(),
        analysis.patterns.len(),
        analysis.dataset.points.len()
    );
    if let Some(runner_up) = &analysis.chart.runner_up {
        line.push_str(&format!(
            "; runner-up {} ({:.2})",
            runner_up.kind, runner_up.confidence
        ));
    }
    line
}
