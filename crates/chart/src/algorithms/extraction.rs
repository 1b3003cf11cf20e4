use image::GrayImage;
use imageproc::contours::BorderType;

use crate::{traits::ContourExtractor, types::RawContour};

/// Imageproc-based contour extractor (Suzuki-Abe border following).
///
/// Returns outer borders and hole borders alike; holes matter because the
/// slices of an outlined pie are holes of the ring-and-radii component.
#[derive(Debug, Clone, Default)]
pub struct ImageprocContourExtractor;

impl ContourExtractor for ImageprocContourExtractor {
    fn extract_contours(&self, binary_image: &GrayImage) -> Vec<RawContour> {
        if binary_image.width() == 0 || binary_image.height() == 0 {
            return Vec::new();
        }

        imageproc::contours::find_contours::<i32>(binary_image)
            .into_iter()
            .map(|contour| RawContour {
                points: contour
                    .points
                    .iter()
                    .map(|p| [f64::from(p.x), f64::from(p.y)])
                    .collect(),
                is_hole: contour.border_type == BorderType::Hole,
            })
            .collect()
    }
}
