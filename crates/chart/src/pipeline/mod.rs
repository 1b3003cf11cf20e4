pub mod builder;

use std::collections::HashSet;

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    algorithms::{Detection, RulingSeparator, ShapeDetector},
    classifier::{ChartCandidate, ChartClassifier},
    config::AnalysisConfig,
    error::Result,
    extractor::{DataExtractor, ExtractedDataset},
    structure::{StructuralAnalyzer, StructuralPattern},
    traits::{ContourExtractor, ImagePreprocessor},
    types::{RawContour, ShapeCandidate, ShapeKind, TextRegion},
};

/// Everything one region analysis produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChartAnalysis {
    pub shapes: Vec<ShapeCandidate>,
    pub patterns: Vec<StructuralPattern>,
    pub chart: ChartCandidate,
    pub dataset: ExtractedDataset,
    /// Contours the shape detector rejected
    pub dropped_contours: usize,
    pub image_width: u32,
    pub image_height: u32,
}

impl ChartAnalysis {
    /// Shapes that matched no primitive
    pub fn unclassified(&self) -> impl Iterator<Item = &ShapeCandidate> {
        self.shapes.iter().filter(|s| s.kind == ShapeKind::Unknown)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        Ok(if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        })
    }
}

/// Preprocess, trace, detect, relate, classify and extract, in that order
pub struct ChartPipeline {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    contour_extractor: Box<dyn ContourExtractor>,
    detector: ShapeDetector,
    separator: Option<RulingSeparator>,
    analyzer: StructuralAnalyzer,
    classifier: ChartClassifier,
    extractor: DataExtractor,
}

impl ChartPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(
        preprocessors: Vec<Box<dyn ImagePreprocessor>>,
        contour_extractor: Box<dyn ContourExtractor>,
        detector: ShapeDetector,
        separator: Option<RulingSeparator>,
        analyzer: StructuralAnalyzer,
        classifier: ChartClassifier,
        extractor: DataExtractor,
    ) -> Self {
        Self {
            preprocessors,
            contour_extractor,
            detector,
            separator,
            analyzer,
            classifier,
            extractor,
        }
    }

    /// Pipeline with every stage configured from `config`
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::builder().with_config(config.clone()).build()
    }

    /// Analyze one region with the OCR text found on it
    pub fn analyze(&self, image: &GrayImage, text: &[TextRegion]) -> ChartAnalysis {
        let (width, height) = image.dimensions();

        // Step 1: Apply all preprocessors in sequence
        let mut processed = image.clone();
        for preprocessor in &self.preprocessors {
            processed = preprocessor.preprocess(&processed);
        }

        // Step 2: Trace borders
        let contours = self.contour_extractor.extract_contours(&processed);
        debug!(contours = contours.len(), width, height, "Contours traced");

        // Step 3: Classify primitives, tracing again with axes and gridlines
        // split off when they merged shapes into one unknown outline
        let mut detection = self.detector.detect(contours);
        if let Some(contours) = self.split_rulings(&processed, &detection) {
            detection = self.detector.detect(contours);
        }

        // Step 4: Relate shapes
        let patterns = self.analyzer.analyze(&detection.shapes, width, height);

        // Step 5: Decide the chart type and read its values
        let chart = self.classifier.classify(&detection.shapes, &patterns, text);
        let dataset = self.extractor.extract(&chart, &detection.shapes, &patterns, text);

        info!(
            kind = %chart.kind,
            confidence = chart.confidence,
            shapes = detection.shapes.len(),
            points = dataset.points.len(),
            "Chart analysis complete"
        );

        ChartAnalysis {
            shapes: detection.shapes,
            patterns,
            chart,
            dataset,
            dropped_contours: detection.dropped,
            image_width: width,
            image_height: height,
        }
    }

    /// Contours of `binary` with rulings traced apart from the unknown outer
    /// shapes they belong to; `None` when there was nothing to split
    fn split_rulings(&self, binary: &GrayImage, detection: &Detection) -> Option<Vec<RawContour>> {
        let separator = self.separator.as_ref()?;
        let seeds: Vec<[f64; 2]> = detection
            .shapes
            .iter()
            .filter(|s| s.kind == ShapeKind::Unknown && !s.is_hole)
            .filter_map(|s| s.contour.first().copied())
            .collect();
        if seeds.is_empty() {
            return None;
        }

        let labels = connected_components(binary, Connectivity::Eight, Luma([0u8]));
        let (width, height) = binary.dimensions();
        let merged: HashSet<u32> = seeds
            .iter()
            .filter(|[x, y]| *x >= 0.0 && *y >= 0.0 && (*x as u32) < width && (*y as u32) < height)
            .map(|[x, y]| labels.get_pixel(*x as u32, *y as u32)[0])
            .filter(|label| *label != 0)
            .collect();
        let components = GrayImage::from_fn(width, height, |x, y| {
            if merged.contains(&labels.get_pixel(x, y)[0]) { Luma([255]) } else { Luma([0]) }
        });

        let rulings = separator.separate(&components)?;
        let mut rest = binary.clone();
        rulings.clear_from(&mut rest);

        let mut contours = self.contour_extractor.extract_contours(&rest);
        contours.extend(self.contour_extractor.extract_contours(&rulings.horizontal));
        contours.extend(self.contour_extractor.extract_contours(&rulings.vertical));
        debug!(components = merged.len(), contours = contours.len(), "Traced again without rulings");
        Some(contours)
    }

    /// Analyze independent regions in parallel; results keep input order
    pub fn analyze_batch(&self, regions: &[(GrayImage, Vec<TextRegion>)]) -> Vec<ChartAnalysis> {
        regions
            .par_iter()
            .map(|(image, text)| self.analyze(image, text))
            .collect()
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "ChartPipeline: {} preprocessors, {} approximation tolerances, min classifier confidence {}",
            self.preprocessors.len(),
            self.detector.epsilon_values.len(),
            self.classifier.min_confidence
        )
    }
}

/// Analyze one region with a pipeline built from `config`
pub fn analyze(region: &GrayImage, text: &[TextRegion], config: &AnalysisConfig) -> ChartAnalysis {
    ChartPipeline::from_config(config).analyze(region, text)
}
