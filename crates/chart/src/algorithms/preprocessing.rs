use image::GrayImage;
use tracing::debug;

use crate::{config::PreprocessConfig, traits::ImagePreprocessor};

/// Binarization with automatic polarity.
///
/// Charts are usually dark ink on light paper; when the region is brighter
/// than mid-grey (or `invert` forces it) the image is inverted first so that
/// ink always ends up as the non-zero foreground the contour tracer expects.
#[derive(Debug, Clone, Default)]
pub struct ThresholdPreprocessor {
    /// Fixed level on the original intensity scale; Otsu's level when `None`
    pub threshold: Option<u8>,
    pub invert: Option<bool>,
}

impl ImagePreprocessor for ThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return GrayImage::new(width, height);
        }

        let (min, max) = image
            .pixels()
            .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
        if min == max {
            // Flat region: nothing to separate from the background
            return GrayImage::new(width, height);
        }

        let invert = self.invert.unwrap_or_else(|| mean_intensity(image) > 127.5);
        let mut source = image.clone();
        if invert {
            image::imageops::invert(&mut source);
        }

        let level = match self.threshold {
            Some(t) if invert => 255 - t,
            Some(t) => t,
            None => imageproc::contrast::otsu_level(&source),
        };
        debug!(invert, level, "Binarizing region");
        imageproc::contrast::threshold(&source, level)
    }
}

/// Binarization against the local mean, for unevenly lit scans.
///
/// Ink is whatever is darker than the mean of its block (brighter when
/// `invert` says the ink is light). Filled areas wider than the block come
/// out as outlines.
#[derive(Debug, Clone)]
pub struct AdaptiveThresholdPreprocessor {
    pub block_radius: u32,
    pub invert: Option<bool>,
}

impl Default for AdaptiveThresholdPreprocessor {
    fn default() -> Self {
        Self {
            block_radius: 5,
            invert: None,
        }
    }
}

impl ImagePreprocessor for AdaptiveThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 || self.block_radius == 0 {
            return GrayImage::new(width, height);
        }

        // adaptive_threshold marks pixels at or above the local mean, so the
        // ink has to be the dark side of the source
        let dark_ink = self.invert.unwrap_or_else(|| mean_intensity(image) > 127.5);
        let mut source = image.clone();
        if !dark_ink {
            image::imageops::invert(&mut source);
        }
        debug!(block_radius = self.block_radius, dark_ink, "Adaptive binarization");

        let mut binary = imageproc::contrast::adaptive_threshold(&source, self.block_radius);
        image::imageops::invert(&mut binary);
        binary
    }
}

/// Gaussian blur preprocessor for noise reduction
#[derive(Debug, Clone)]
pub struct GaussianBlurPreprocessor {
    pub sigma: f32,
}

impl Default for GaussianBlurPreprocessor {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

impl ImagePreprocessor for GaussianBlurPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> GrayImage {
        if self.sigma <= 0.0 || image.width() == 0 || image.height() == 0 {
            return image.clone();
        }
        imageproc::filter::gaussian_blur_f32(image, self.sigma)
    }
}

/// Median filter that removes speckle left after binarization
#[derive(Debug, Clone)]
pub struct MedianPreprocessor {
    pub radius: u32,
}

impl Default for MedianPreprocessor {
    fn default() -> Self {
        Self { radius: 1 }
    }
}

impl ImagePreprocessor for MedianPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> GrayImage {
        if self.radius == 0 || image.width() == 0 || image.height() == 0 {
            return image.clone();
        }
        imageproc::filter::median_filter(image, self.radius, self.radius)
    }
}

/// Stages described by a [`PreprocessConfig`], in execution order
pub fn preprocessors_from_config(config: &PreprocessConfig) -> Vec<Box<dyn ImagePreprocessor>> {
    let mut stages: Vec<Box<dyn ImagePreprocessor>> = Vec::new();
    if let Some(sigma) = config.blur_sigma.filter(|s| *s > 0.0) {
        stages.push(Box::new(GaussianBlurPreprocessor { sigma }));
    }
    match config.adaptive_block_radius.filter(|r| *r > 0) {
        Some(block_radius) => stages.push(Box::new(AdaptiveThresholdPreprocessor {
            block_radius,
            invert: config.invert,
        })),
        None => stages.push(Box::new(ThresholdPreprocessor {
            threshold: config.threshold,
            invert: config.invert,
        })),
    }
    if let Some(radius) = config.median_radius.filter(|r| *r > 0) {
        stages.push(Box::new(MedianPreprocessor { radius }));
    }
    stages
}

fn mean_intensity(image: &GrayImage) -> f64 {
    let total: u64 = image.pixels().map(|p| u64::from(p.0[0])).sum();
    total as f64 / (u64::from(image.width()) * u64::from(image.height())) as f64
}
