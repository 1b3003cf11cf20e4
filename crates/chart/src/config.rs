use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, Result};

/// Tunable options for one `analyze` run.
///
/// Every threshold the pipeline uses lives here; algorithm bodies never carry
/// their own literals. Missing fields fall back to [`AnalysisConfig::default`],
/// so a TOML file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Contours whose polygon area (px²) is below this are dropped by the shape detector
    #[schemars(range(min = 0.0))]
    pub min_shape_area: f64,
    /// Polygon approximation tolerances, as fractions of the contour perimeter
    pub epsilon_values: Vec<f64>,
    /// Alignment band, as a fraction of the region's larger side
    #[schemars(range(min = 0.0, max = 1.0))]
    pub alignment_tolerance: f64,
    /// Largest accepted coefficient of variation for radial distance and angular spacing
    #[schemars(range(min = 0.0, max = 1.0))]
    pub radial_tolerance: f64,
    /// Row/column band for grid detection, as a fraction of the region's larger side
    #[schemars(range(min = 0.0, max = 1.0))]
    pub grid_tolerance: f64,
    /// Verdicts below this confidence are reported as `unknown`
    #[schemars(range(min = 0.0, max = 1.0))]
    pub min_classifier_confidence: f64,
    /// OCR regions within this fraction of the chart's larger side become text hints
    #[schemars(range(min = 0.0))]
    pub text_hint_margin: f64,
    pub shape: ShapeThresholds,
    pub preprocess: PreprocessConfig,
    pub extraction: ExtractionConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_shape_area: 10.0,
            epsilon_values: vec![0.01, 0.02, 0.05, 0.1],
            alignment_tolerance: 0.02,
            radial_tolerance: 0.25,
            grid_tolerance: 0.02,
            min_classifier_confidence: 0.3,
            text_hint_margin: 0.25,
            shape: ShapeThresholds::default(),
            preprocess: PreprocessConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

/// Per-rule thresholds of the shape detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ShapeThresholds {
    /// Largest side, corner, fill or convexity deviation still accepted as a rectangle
    pub rectangle_tolerance: f64,
    /// Minimum circularity (4πA/P²) for a circle
    pub circularity_threshold: f64,
    /// Largest fill or convexity deviation still accepted as a triangle
    pub triangle_tolerance: f64,
    /// Bounding boxes at or below this area (px²) are point markers
    pub point_max_area: f64,
    /// Oriented thickness (px) at or below which an elongated shape is a stroke
    pub line_max_thickness: f64,
    /// Minimum length/thickness ratio of a stroke
    pub line_min_elongation: f64,
    /// Most approximation vertices a line segment may have
    pub line_max_vertices: usize,
    /// Fraction of a shape's bounding box that must sit inside another's to become its child
    pub containment_ratio: f64,
    /// A circle's child reaching this fraction of the radius from its centre is a pie sector
    pub sector_apex_fraction: f64,
    /// Horizontal and vertical runs at least this fraction of the region's larger
    /// side are split off the shapes they touch (axes, grid lines)
    pub ruling_min_length: f64,
}

impl Default for ShapeThresholds {
    fn default() -> Self {
        Self {
            rectangle_tolerance: 0.12,
            circularity_threshold: 0.85,
            triangle_tolerance: 0.5,
            point_max_area: 100.0,
            line_max_thickness: 8.0,
            line_min_elongation: 4.0,
            line_max_vertices: 6,
            containment_ratio: 0.9,
            sector_apex_fraction: 0.2,
            ruling_min_length: 0.25,
        }
    }
}

/// Noise reduction and binarization options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Fixed binarization level; Otsu's level is used when absent
    pub threshold: Option<u8>,
    /// Binarize against the mean of a (2r + 1)² block instead of one global level
    pub adaptive_block_radius: Option<u32>,
    /// Force polarity; auto-detected from mean intensity when absent
    pub invert: Option<bool>,
    /// Gaussian blur applied before binarization
    pub blur_sigma: Option<f32>,
    /// Median filter radius applied after binarization
    pub median_radius: Option<u32>,
}

/// Geometry used when reading values off a classified chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Sector contour points closer to the pie centre than this fraction of the radius are ignored
    pub pie_core_fraction: f64,
    /// Pie labels are searched from this multiple of the radius along the sector bisector
    pub pie_label_reach: f64,
    /// Line strokes are sampled up to this fraction of the series band beyond their ends
    pub line_sample_reach: f64,
    /// Horizontal strokes spanning at least this fraction of the plot width are gridlines
    pub gridline_min_span: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pie_core_fraction: 0.2,
            pie_label_reach: 1.2,
            line_sample_reach: 0.5,
            gridline_min_span: 0.5,
        }
    }
}

impl AnalysisConfig {
    /// JSON schema of the configuration file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisConfig)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path_ref)?),
            Some("json") => Self::from_json(&fs::read_to_string(path_ref)?),
            _ => Err(ChartError::UnsupportedFileFormat(
                path_ref.display().to_string(),
            )),
        }
    }

    /// Convert configuration to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the algorithms cannot work with
    pub fn validate(&self) -> Result<()> {
        fn check(ok: bool, message: &str) -> Result<()> {
            if ok {
                Ok(())
            } else {
                Err(ChartError::InvalidConfig(message.to_string()))
            }
        }

        check(
            self.min_shape_area.is_finite() && self.min_shape_area >= 0.0,
            "min_shape_area must be a non-negative number",
        )?;
        check(!self.epsilon_values.is_empty(), "epsilon_values must not be empty")?;
        check(
            self.epsilon_values
                .iter()
                .all(|eps| eps.is_finite() && *eps > 0.0 && *eps <= 1.0),
            "epsilon_values must lie in (0, 1]",
        )?;
        for (name, value) in [
            ("alignment_tolerance", self.alignment_tolerance),
            ("radial_tolerance", self.radial_tolerance),
            ("grid_tolerance", self.grid_tolerance),
        ] {
            check(
                value.is_finite() && value > 0.0 && value <= 1.0,
                &format!("{name} must lie in (0, 1]"),
            )?;
        }
        check(
            (0.0..=1.0).contains(&self.min_classifier_confidence),
            "min_classifier_confidence must lie in [0, 1]",
        )?;
        check(
            self.text_hint_margin.is_finite() && self.text_hint_margin >= 0.0,
            "text_hint_margin must be a non-negative number",
        )?;

        let shape = &self.shape;
        check(
            shape.rectangle_tolerance > 0.0 && shape.triangle_tolerance > 0.0,
            "shape tolerances must be positive",
        )?;
        check(
            shape.circularity_threshold > 0.0 && shape.circularity_threshold <= 1.0,
            "circularity_threshold must lie in (0, 1]",
        )?;
        check(shape.point_max_area >= 0.0, "point_max_area must be non-negative")?;
        check(
            shape.line_max_thickness > 0.0 && shape.line_min_elongation >= 1.0,
            "line_max_thickness must be positive and line_min_elongation at least 1",
        )?;
        check(shape.line_max_vertices >= 2, "line_max_vertices must be at least 2")?;
        check(
            shape.containment_ratio > 0.0 && shape.containment_ratio <= 1.0,
            "containment_ratio must lie in (0, 1]",
        )?;
        check(
            shape.sector_apex_fraction > 0.0 && shape.sector_apex_fraction < 1.0,
            "sector_apex_fraction must lie in (0, 1)",
        )?;
        check(
            shape.ruling_min_length > 0.0 && shape.ruling_min_length <= 1.0,
            "ruling_min_length must lie in (0, 1]",
        )?;

        if let Some(sigma) = self.preprocess.blur_sigma {
            check(sigma.is_finite(), "blur_sigma must be finite")?;
        }

        let extraction = &self.extraction;
        check(
            (0.0..1.0).contains(&extraction.pie_core_fraction),
            "pie_core_fraction must lie in [0, 1)",
        )?;
        check(
            extraction.pie_label_reach.is_finite() && extraction.pie_label_reach > 1.0,
            "pie_label_reach must be greater than 1",
        )?;
        check(
            extraction.line_sample_reach.is_finite() && extraction.line_sample_reach >= 0.0,
            "line_sample_reach must be a non-negative number",
        )?;
        check(
            extraction.gridline_min_span > 0.0 && extraction.gridline_min_span <= 1.0,
            "gridline_min_span must lie in (0, 1]",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        AnalysisConfig::default()
            .validate()
            .expect("Default configuration should validate");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml(
            r#"
            min_shape_area = 25.0
            epsilon_values = [0.02, 0.08]

            [shape]
            point_max_area = 64.0
            "#,
        )
        .expect("Should parse partial TOML");

        assert_eq!(config.min_shape_area, 25.0);
        assert_eq!(config.epsilon_values, vec![0.02, 0.08]);
        assert_eq!(config.shape.point_max_area, 64.0);
        assert_eq!(config.shape.line_max_vertices, ShapeThresholds::default().line_max_vertices);
        assert_eq!(config.alignment_tolerance, AnalysisConfig::default().alignment_tolerance);
    }

    #[test]
    fn test_invalid_epsilon_rejected() {
        let err = AnalysisConfig::from_json(r#"{ "epsilon_values": [] }"#)
            .expect_err("Empty epsilon list should be rejected");
        assert!(matches!(err, ChartError::InvalidConfig(_)));

        let err = AnalysisConfig::from_json(r#"{ "epsilon_values": [0.0, 0.1] }"#)
            .expect_err("Zero epsilon should be rejected");
        assert!(matches!(err, ChartError::InvalidConfig(_)));
    }

    #[test]
    fn test_extraction_table_is_validated() {
        let config = AnalysisConfig::from_toml(
            r#"
            text_hint_margin = 0.5

            [extraction]
            pie_label_reach = 1.5
            "#,
        )
        .expect("Should parse extraction table");
        assert_eq!(config.text_hint_margin, 0.5);
        assert_eq!(config.extraction.pie_label_reach, 1.5);
        assert_eq!(config.extraction.pie_core_fraction, ExtractionConfig::default().pie_core_fraction);

        let err = AnalysisConfig::from_json(r#"{ "extraction": { "pie_label_reach": 0.8 } }"#)
            .expect_err("A label search starting inside the circle should be rejected");
        assert!(matches!(err, ChartError::InvalidConfig(_)));

        let err = AnalysisConfig::from_json(r#"{ "text_hint_margin": -1.0 }"#)
            .expect_err("Negative margin should be rejected");
        assert!(matches!(err, ChartError::InvalidConfig(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AnalysisConfig {
            min_classifier_confidence: 0.5,
            ..AnalysisConfig::default()
        };
        let text = config.to_toml().expect("Should serialize");
        let parsed = AnalysisConfig::from_toml(&text).expect("Should parse back");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_file_detects_format() {
        let mut json = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("Should create temp file");
        write!(json, r#"{{ "radial_tolerance": 0.4 }}"#).expect("Should write");
        let config = AnalysisConfig::from_file(json.path()).expect("Should load JSON file");
        assert_eq!(config.radial_tolerance, 0.4);

        let other = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("Should create temp file");
        let err = AnalysisConfig::from_file(other.path()).expect_err("YAML is not supported");
        assert!(matches!(err, ChartError::UnsupportedFileFormat(_)));
    }
}
