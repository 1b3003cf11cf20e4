use image::GrayImage;
use crate::types::RawContour;

/// Trait for image preprocessing stages
pub trait ImagePreprocessor: Send + Sync {
    /// Transform the region (e.g., blur, threshold). Must be deterministic.
    fn preprocess(&self, image: &GrayImage) -> GrayImage;
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Trace the borders of foreground (non-zero) regions in a binary image
    fn extract_contours(&self, image: &GrayImage) -> Vec<RawContour>;
}
