use image::{GrayImage, Luma};
use tracing::debug;

use crate::config::AnalysisConfig;

/// Splits long thin horizontal and vertical runs (axes, gridlines) off the
/// shapes they touch.
///
/// A ruling pixel stays with the shape when the pixels just past the ruling
/// on both sides are ink, so a bar crossed by a gridline keeps its outline.
#[derive(Debug, Clone)]
pub struct RulingSeparator {
    /// Shortest ruling, as a fraction of the image's larger side
    pub min_length_fraction: f64,
    /// Thickest ruling in pixels
    pub max_thickness: f64,
}

impl Default for RulingSeparator {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// Ruling pixels split off a binary image, one mask per direction
#[derive(Debug, Clone, PartialEq)]
pub struct Rulings {
    pub horizontal: GrayImage,
    pub vertical: GrayImage,
}

impl Rulings {
    /// Clear every ruling pixel from `image`
    pub fn clear_from(&self, image: &mut GrayImage) {
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            if self.horizontal.get_pixel(x, y)[0] > 0 || self.vertical.get_pixel(x, y)[0] > 0 {
                *pixel = Luma([0]);
            }
        }
    }
}

/// Consecutive lines sharing an overlapping long run
#[derive(Debug, Clone, Copy)]
struct Band {
    first_line: u32,
    /// One past the last line
    end_line: u32,
    lo: u32,
    /// One past the last position
    hi: u32,
}

impl RulingSeparator {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            min_length_fraction: config.shape.ruling_min_length,
            max_thickness: config.shape.line_max_thickness,
        }
    }

    /// Split the rulings off `binary`; `None` when it holds none
    pub fn separate(&self, binary: &GrayImage) -> Option<Rulings> {
        let (width, height) = binary.dimensions();
        if width == 0 || height == 0 {
            return None;
        }
        let min_length = (self.min_length_fraction * f64::from(width.max(height))).ceil().max(2.0) as u32;
        let max_thickness = self.max_thickness.floor().max(1.0) as u32;
        let ink = |x: u32, y: u32| binary.get_pixel(x, y)[0] > 0;

        let mut horizontal = GrayImage::new(width, height);
        let rows = bands(height, width, min_length, max_thickness, |line, at| ink(at, line));
        for band in &rows {
            for x in band.lo..band.hi {
                let above = band.first_line > 0 && ink(x, band.first_line - 1);
                let below = band.end_line < height && ink(x, band.end_line);
                if above && below {
                    continue;
                }
                for y in band.first_line..band.end_line {
                    if ink(x, y) {
                        horizontal.put_pixel(x, y, Luma([255]));
                    }
                }
            }
        }

        let mut vertical = GrayImage::new(width, height);
        let columns = bands(width, height, min_length, max_thickness, |line, at| ink(line, at));
        for band in &columns {
            for y in band.lo..band.hi {
                let left = band.first_line > 0 && ink(band.first_line - 1, y);
                let right = band.end_line < width && ink(band.end_line, y);
                if left && right {
                    continue;
                }
                for x in band.first_line..band.end_line {
                    if ink(x, y) {
                        vertical.put_pixel(x, y, Luma([255]));
                    }
                }
            }
        }

        if rows.is_empty() && columns.is_empty() {
            return None;
        }
        debug!(rows = rows.len(), columns = columns.len(), "Rulings split off");
        Some(Rulings { horizontal, vertical })
    }
}

/// Bands of long runs no thicker than `max_thickness` lines.
///
/// `ink(line, at)` reads the image along `lines` lines of `length` pixels.
fn bands(
    lines: u32,
    length: u32,
    min_length: u32,
    max_thickness: u32,
    ink: impl Fn(u32, u32) -> bool,
) -> Vec<Band> {
    let mut open: Vec<Band> = Vec::new();
    let mut closed: Vec<Band> = Vec::new();

    for line in 0..lines {
        let mut runs = Vec::new();
        let mut start = None;
        for at in 0..=length {
            match (at < length && ink(line, at), start) {
                (true, None) => start = Some(at),
                (false, Some(from)) => {
                    if at - from >= min_length {
                        runs.push((from, at));
                    }
                    start = None;
                }
                _ => {}
            }
        }

        for (lo, hi) in runs {
            match open
                .iter_mut()
                .find(|band| band.end_line == line && band.lo < hi && lo < band.hi)
            {
                Some(band) => {
                    band.end_line = line + 1;
                    band.lo = band.lo.min(lo);
                    band.hi = band.hi.max(hi);
                }
                None => open.push(Band {
                    first_line: line,
                    end_line: line + 1,
                    lo,
                    hi,
                }),
            }
        }

        let (ended, running): (Vec<Band>, Vec<Band>) =
            open.into_iter().partition(|band| band.end_line <= line);
        closed.extend(ended);
        open = running;
    }
    closed.extend(open);

    closed.retain(|band| band.end_line - band.first_line <= max_thickness);
    closed.sort_by_key(|band| (band.first_line, band.lo));
    closed
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Luma<u8> = Luma([255u8]);

    fn fill(img: &mut GrayImage, x0: u32, y0: u32, width: u32, height: u32) {
        for y in y0..y0 + height {
            for x in x0..x0 + width {
                img.put_pixel(x, y, INK);
            }
        }
    }

    fn count(img: &GrayImage) -> usize {
        img.pixels().filter(|p| p[0] > 0).count()
    }

    #[test]
    fn test_bars_on_axis_come_apart() {
        let mut img = GrayImage::new(300, 300);
        fill(&mut img, 60, 200, 30, 50);
        fill(&mut img, 110, 150, 30, 100);
        fill(&mut img, 40, 250, 240, 2);
        fill(&mut img, 40, 40, 2, 212);

        let rulings = RulingSeparator::default().separate(&img).expect("Axes found");
        assert_eq!(count(&rulings.horizontal), 240 * 2);
        assert_eq!(count(&rulings.vertical), 2 * 212);

        let mut rest = img.clone();
        rulings.clear_from(&mut rest);
        assert_eq!(count(&rest), 30 * 50 + 30 * 100);
        assert_eq!(rest.get_pixel(75, 249)[0], 255);
        assert_eq!(rest.get_pixel(75, 250)[0], 0);
    }

    #[test]
    fn test_gridline_through_bar_leaves_bar_whole() {
        let mut img = GrayImage::new(300, 300);
        fill(&mut img, 110, 100, 30, 150);
        fill(&mut img, 40, 200, 240, 2);

        let rulings = RulingSeparator::default().separate(&img).expect("Gridline found");
        assert_eq!(rulings.horizontal.get_pixel(120, 200)[0], 0);
        assert_eq!(rulings.horizontal.get_pixel(60, 200)[0], 255);
        assert_eq!(count(&rulings.horizontal), (240 - 30) * 2);

        let mut rest = img.clone();
        rulings.clear_from(&mut rest);
        assert_eq!(count(&rest), 30 * 150);
    }

    #[test]
    fn test_wide_blocks_and_short_strokes_are_not_rulings() {
        let mut img = GrayImage::new(300, 300);
        fill(&mut img, 20, 20, 200, 40);
        fill(&mut img, 20, 100, 60, 2);
        assert!(RulingSeparator::default().separate(&img).is_none());
        assert!(RulingSeparator::default().separate(&GrayImage::new(0, 0)).is_none());
    }
}
