//! # Chart Region Analysis Library
//!
//! Recovers the chart type and approximate data values from a raster region
//! (a page or a crop of one) plus the OCR text found on it.
//!
//! ## Core Features
//!
//! - **Shape Detection**: Contours classified as rectangles, circles, triangles, points or lines
//! - **Structural Analysis**: Baselines, rows, series, radial and grid arrangements
//! - **Chart Classification**: Bar, line and pie verdicts with confidence and runner-up
//! - **Data Extraction**: Values read against OCR axis ticks, or shape-relative when none exist
//! - **GeoJSON Support**: Export detected shapes for inspection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chart::{AnalysisConfig, TextRegion, analyze};
//! use image::open;
//!
//! let region = open("chart.png")?.to_luma8();
//! let ocr: Vec<TextRegion> = Vec::new();
//! let analysis = analyze(&region, &ocr, &AnalysisConfig::default());
//!
//! println!("{} ({:.2})", analysis.chart.kind, analysis.chart.confidence);
//! for point in &analysis.dataset.points {
//!     println!("{:?} = {}", point.label, point.value);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use chart::{ChartPipeline, algorithms::*};
//!
//! let pipeline = ChartPipeline::builder()
//!     .add_preprocessor(GaussianBlurPreprocessor { sigma: 1.0 })
//!     .add_preprocessor(ThresholdPreprocessor { threshold: Some(150), invert: None })
//!     .build();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod config;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod structure;
pub mod classifier;
pub mod extractor;
pub mod pipeline;
pub mod io;

// Re-exports for convenience
pub use error::{ChartError, Result};
pub use config::{AnalysisConfig, ExtractionConfig, PreprocessConfig, ShapeThresholds};
pub use types::{BoundingBox, PatternId, RawContour, ShapeCandidate, ShapeFeatures, ShapeId, ShapeKind, TextRegion};
pub use traits::*;
pub use structure::{PatternGeometry, PatternKind, StructuralAnalyzer, StructuralPattern};
pub use classifier::{ChartCandidate, ChartClassifier, ChartKind, RunnerUp};
pub use extractor::{Calibration, DataExtractor, DataPoint, ExtractedDataset};
pub use pipeline::{ChartAnalysis, ChartPipeline, analyze, builder::PipelineBuilder};
