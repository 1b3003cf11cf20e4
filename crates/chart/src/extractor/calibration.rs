use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    structure::mean,
    types::{BoundingBox, TextRegion},
};

/// How extracted values relate to the chart's own scale
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Calibration {
    /// Values read against OCR tick labels
    Axis,
    /// Values counted in grid-row steps from the lowest gridline or grid row
    GridSteps,
    /// Shape-relative values (ratios, shares)
    Uncalibrated,
}

/// Linear map from a pixel row to a data value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisCalibration {
    pub slope: f64,
    pub intercept: f64,
}

impl AxisCalibration {
    pub fn value_at(&self, y: f64) -> f64 {
        self.slope * y + self.intercept
    }

    /// Least-squares fit over numeric labels left of `plot`.
    ///
    /// Needs labels on at least two distinct rows and a non-flat fit.
    pub fn from_y_ticks(text: &[TextRegion], plot: &BoundingBox) -> Option<Self> {
        let samples: Vec<(f64, f64)> = y_tick_indices(text, plot)
            .into_iter()
            .filter_map(|i| Some((text[i].center()[1], text[i].numeric_value()?)))
            .collect();
        Self::fit(&samples)
    }

    /// Grid-step scale: one unit per row spacing, zero half a step below the lowest row
    pub fn from_grid_rows(rows: &[f64]) -> Option<Self> {
        if rows.len() < 2 {
            return None;
        }
        let steps: Vec<f64> = rows.windows(2).map(|w| w[1] - w[0]).collect();
        let step = mean(&steps);
        if !(step > 0.0) {
            return None;
        }
        let zero = rows[rows.len() - 1] + step / 2.0;
        Some(Self {
            slope: -1.0 / step,
            intercept: zero / step,
        })
    }

    /// Gridline scale: one unit per line spacing, zero on the lowest line.
    ///
    /// `rows` must be ascending.
    pub fn from_gridlines(rows: &[f64]) -> Option<Self> {
        let (first, last) = (rows.first()?, rows.last()?);
        if rows.len() < 2 {
            return None;
        }
        let step = (last - first) / (rows.len() - 1) as f64;
        if !(step > 0.0) {
            return None;
        }
        Some(Self {
            slope: -1.0 / step,
            intercept: last / step,
        })
    }

    fn fit(samples: &[(f64, f64)]) -> Option<Self> {
        let (lowest, highest) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (y, _)| (lo.min(*y), hi.max(*y)));
        if samples.len() < 2 || highest - lowest < 1.0 {
            return None;
        }

        let ys: Vec<f64> = samples.iter().map(|(y, _)| *y).collect();
        let vs: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
        let (mean_y, mean_v) = (mean(&ys), mean(&vs));
        let covariance: f64 = samples.iter().map(|(y, v)| (y - mean_y) * (v - mean_v)).sum();
        let variance: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();
        let slope = covariance / variance;
        if !slope.is_finite() || slope == 0.0 {
            return None;
        }
        Some(Self {
            slope,
            intercept: mean_v - slope * mean_y,
        })
    }
}

/// Numeric OCR regions whose centre lies left of the plot area
pub fn y_tick_indices(text: &[TextRegion], plot: &BoundingBox) -> Vec<usize> {
    text.iter()
        .enumerate()
        .filter(|(_, region)| region.center()[0] < plot.x && region.numeric_value().is_some())
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str, cx: f64, cy: f64) -> TextRegion {
        TextRegion::new(text, BoundingBox::new(cx - 6.0, cy - 6.0, 12.0, 12.0))
    }

    #[test]
    fn test_two_tick_fit() {
        let plot = BoundingBox::new(60.0, 50.0, 200.0, 200.0);
        let text = vec![label("0", 26.0, 250.0), label("40", 23.0, 50.0), label("Q1", 75.0, 260.0)];
        let axis = AxisCalibration::from_y_ticks(&text, &plot).expect("Calibrated");
        assert!((axis.value_at(250.0)).abs() < 1e-9);
        assert!((axis.value_at(50.0) - 40.0).abs() < 1e-9);
        assert!((axis.value_at(150.0) - 20.0).abs() < 1e-9);
        assert_eq!(y_tick_indices(&text, &plot), vec![0, 1]);
    }

    #[test]
    fn test_least_squares_over_noisy_ticks() {
        let plot = BoundingBox::new(60.0, 0.0, 200.0, 300.0);
        let text = vec![
            label("0", 20.0, 250.0),
            label("50", 20.0, 151.0),
            label("100", 20.0, 49.0),
        ];
        let axis = AxisCalibration::from_y_ticks(&text, &plot).expect("Calibrated");
        assert!((axis.value_at(150.0) - 50.0).abs() < 1.0);
    }

    #[test]
    fn test_insufficient_ticks() {
        let plot = BoundingBox::new(60.0, 0.0, 200.0, 300.0);
        assert!(AxisCalibration::from_y_ticks(&[label("10", 20.0, 100.0)], &plot).is_none());
        let same_row = vec![label("10", 20.0, 100.0), label("20", 40.0, 100.0)];
        assert!(AxisCalibration::from_y_ticks(&same_row, &plot).is_none());
        let inside = vec![label("0", 100.0, 250.0), label("40", 100.0, 50.0)];
        assert!(AxisCalibration::from_y_ticks(&inside, &plot).is_none());
    }

    #[test]
    fn test_grid_steps() {
        let axis = AxisCalibration::from_grid_rows(&[45.0, 105.0, 165.0]).expect("Grid scale");
        assert!((axis.value_at(195.0)).abs() < 1e-9);
        assert!((axis.value_at(75.0) - 2.0).abs() < 1e-9);
        assert!(AxisCalibration::from_grid_rows(&[45.0]).is_none());
    }

    #[test]
    fn test_gridline_steps_start_on_lowest_line() {
        let axis = AxisCalibration::from_gridlines(&[50.5, 100.5, 150.5, 200.5, 250.5]).expect("Gridline scale");
        assert!(axis.value_at(250.5).abs() < 1e-9);
        assert!((axis.value_at(60.0) - 3.81).abs() < 1e-9);
        assert!(AxisCalibration::from_gridlines(&[120.0]).is_none());
        assert!(AxisCalibration::from_gridlines(&[]).is_none());
    }
}
