use crate::{
    algorithms::{
        ImageprocContourExtractor, RulingSeparator, ShapeDetector, ThresholdPreprocessor,
        preprocessors_from_config,
    },
    classifier::ChartClassifier,
    config::AnalysisConfig,
    extractor::DataExtractor,
    pipeline::ChartPipeline,
    structure::StructuralAnalyzer,
    traits::{ContourExtractor, ImagePreprocessor},
};

/// Builder for creating chart pipelines with a fluent API
pub struct PipelineBuilder {
    config: AnalysisConfig,
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
    detector: Option<ShapeDetector>,
    separator: Option<Option<RulingSeparator>>,
    analyzer: Option<StructuralAnalyzer>,
    classifier: Option<ChartClassifier>,
    extractor: Option<DataExtractor>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
            preprocessors: Vec::new(),
            contour_extractor: None,
            detector: None,
            separator: None,
            analyzer: None,
            classifier: None,
            extractor: None,
        }
    }

    /// Take thresholds for every stage not set explicitly from `config`
    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a preprocessor; replaces the configured preprocessing stages
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Set the contour extractor (replaces any existing one)
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Box::new(extractor));
        self
    }

    pub fn set_shape_detector(mut self, detector: ShapeDetector) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Set the ruling separator; `None` turns ruling separation off
    pub fn set_ruling_separator(mut self, separator: Option<RulingSeparator>) -> Self {
        self.separator = Some(separator);
        self
    }

    pub fn set_structural_analyzer(mut self, analyzer: StructuralAnalyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn set_classifier(mut self, classifier: ChartClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn set_data_extractor(mut self, extractor: DataExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Build the pipeline with configured components where none were given
    pub fn build(self) -> ChartPipeline {
        let preprocessors = if self.preprocessors.is_empty() {
            preprocessors_from_config(&self.config.preprocess)
        } else {
            self.preprocessors
        };
        let contour_extractor = self
            .contour_extractor
            .unwrap_or_else(|| Box::new(ImageprocContourExtractor));

        ChartPipeline::new(
            preprocessors,
            contour_extractor,
            self.detector
                .unwrap_or_else(|| ShapeDetector::from_config(&self.config)),
            self.separator
                .unwrap_or_else(|| Some(RulingSeparator::from_config(&self.config))),
            self.analyzer
                .unwrap_or_else(|| StructuralAnalyzer::from_config(&self.config)),
            self.classifier
                .unwrap_or_else(|| ChartClassifier::from_config(&self.config)),
            self.extractor
                .unwrap_or_else(|| DataExtractor::from_config(&self.config)),
        )
    }

    /// Build a default pipeline binarizing at a fixed level
    pub fn build_with_threshold(threshold: u8) -> ChartPipeline {
        Self::new()
            .add_preprocessor(ThresholdPreprocessor {
                threshold: Some(threshold),
                invert: None,
            })
            .build()
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
