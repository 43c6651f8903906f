//! Rectangular region statistics and intensity histograms over a slice.

use ndarray::ArrayView2;
use ndarray::s;

/// A rectangle on a plane slice, spanned by two (row, column) corners.
///
/// Corners may come in any order; the covered cells are the half-open
/// rectangle [min, max) on each axis, clamped to the slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionOfInterest {
    pub corner_a: (usize, usize),
    pub corner_b: (usize, usize),
}

/// Statistics of the cells under a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionStats {
    /// Mean intensity.
    pub mean: f64,
    /// Population standard deviation (N divisor).
    pub std_dev: f64,
    /// Physical area of the covered rectangle, square millimetres.
    pub area_mm2: f64,
}

impl RegionOfInterest {
    pub fn new(corner_a: (usize, usize), corner_b: (usize, usize)) -> Self {
        RegionOfInterest { corner_a, corner_b }
    }

    /// Clamped half-open spans as ((row_lo, row_hi), (col_lo, col_hi)).
    fn spans(&self, rows: usize, cols: usize) -> ((usize, usize), (usize, usize)) {
        let (row_a, col_a) = self.corner_a;
        let (row_b, col_b) = self.corner_b;
        (
            (row_a.min(row_b).min(rows), row_a.max(row_b).min(rows)),
            (col_a.min(col_b).min(cols), col_a.max(col_b).min(cols)),
        )
    }

    /// Mean, population standard deviation and physical area of the cells
    /// under this region.
    ///
    /// The covered rectangle is half-open, so a point or line region
    /// reports 0 mm² and zero deviation, while its mean still samples the
    /// cells it sits on. A region entirely outside the slice yields
    /// all-zero statistics.
    pub fn stats<T>(&self, view: ArrayView2<'_, T>, spacing: (f64, f64)) -> RegionStats
    where
        T: Copy + Into<f64>,
    {
        let (rows, cols) = view.dim();
        let ((row_lo, row_hi), (col_lo, col_hi)) = self.spans(rows, cols);

        let area_mm2 =
            (row_hi - row_lo) as f64 * spacing.0 * ((col_hi - col_lo) as f64) * spacing.1;
        let collapsed = row_lo == row_hi || col_lo == col_hi;

        // collapsed axes still sample the boundary cell they sit on
        let row_hi = if row_lo == row_hi && row_lo < rows {
            row_lo + 1
        } else {
            row_hi
        };
        let col_hi = if col_lo == col_hi && col_lo < cols {
            col_lo + 1
        } else {
            col_hi
        };

        let region = view.slice(s![row_lo..row_hi, col_lo..col_hi]);
        let count = region.len();
        if count == 0 {
            return RegionStats {
                mean: 0.0,
                std_dev: 0.0,
                area_mm2: 0.0,
            };
        }

        let mut sum = 0f64;
        for &value in &region {
            sum += value.into();
        }
        let mean = sum / count as f64;

        let std_dev = if collapsed {
            0.0
        } else {
            let mut variance_sum = 0f64;
            for &value in &region {
                let diff = value.into() - mean;
                variance_sum += diff * diff;
            }
            (variance_sum / count as f64).sqrt()
        };

        RegionStats {
            mean,
            std_dev,
            area_mm2,
        }
    }
}

/// Binned intensity counts of a slice, for histogram displays.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityHistogram {
    pub bins: Vec<u64>,
    pub min: f64,
    pub max: f64,
}

impl IntensityHistogram {
    /// Bin the values of a slice into `bin_count` equal-width bins between
    /// the slice minimum and maximum.
    ///
    /// A constant slice lands entirely in the first bin.
    pub fn from_slice<T>(view: ArrayView2<'_, T>, bin_count: usize) -> Self
    where
        T: Copy + Into<f64>,
    {
        if view.is_empty() {
            return IntensityHistogram {
                bins: vec![],
                min: 0.0,
                max: 0.0,
            };
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &value in &view {
            let value = value.into();
            min = min.min(value);
            max = max.max(value);
        }

        let bin_count = bin_count.max(1);
        let mut bins = vec![0u64; bin_count];
        let range = max - min;
        for &value in &view {
            let index = if range == 0.0 {
                0
            } else {
                (((value.into() - min) / range) * bin_count as f64).floor() as usize
            };
            bins[index.min(bin_count - 1)] += 1;
        }

        IntensityHistogram { bins, min, max }
    }

    /// Width of one bin in intensity units.
    pub fn bin_width(&self) -> f64 {
        if self.bins.is_empty() {
            0.0
        } else {
            (self.max - self.min) / self.bins.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    fn quad() -> Array2<i16> {
        array![[5, 6], [7, 8]]
    }

    #[test]
    fn full_rectangle_matches_the_worked_numbers() {
        let roi = RegionOfInterest::new((0, 0), (2, 2));
        let stats = roi.stats(quad().view(), (1.0, 1.0));

        assert_eq!(stats.mean, 6.5);
        assert!((stats.std_dev - 1.118033988749895).abs() < 1e-12);
        assert_eq!(stats.area_mm2, 4.0);
    }

    #[test]
    fn corner_order_does_not_matter() {
        let forward = RegionOfInterest::new((0, 0), (2, 2));
        let backward = RegionOfInterest::new((2, 2), (0, 0));
        let view = quad();

        assert_eq!(
            forward.stats(view.view(), (1.0, 1.0)),
            backward.stats(view.view(), (1.0, 1.0))
        );
    }

    #[test]
    fn oversized_rectangles_clamp_to_the_slice() {
        let clamped = RegionOfInterest::new((0, 0), (10, 10));
        let exact = RegionOfInterest::new((0, 0), (2, 2));
        let view = quad();

        assert_eq!(
            clamped.stats(view.view(), (1.0, 1.0)),
            exact.stats(view.view(), (1.0, 1.0))
        );
    }

    #[test]
    fn point_region_reports_the_cell_value() {
        let roi = RegionOfInterest::new((1, 1), (1, 1));
        let stats = roi.stats(quad().view(), (1.0, 1.0));

        assert_eq!(stats.mean, 8.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.area_mm2, 0.0);
    }

    #[test]
    fn line_region_samples_its_strip() {
        let roi = RegionOfInterest::new((0, 0), (0, 2));
        let stats = roi.stats(quad().view(), (1.0, 1.0));

        assert_eq!(stats.mean, 5.5);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.area_mm2, 0.0);

        let column = RegionOfInterest::new((0, 1), (2, 1));
        let stats = column.stats(quad().view(), (1.0, 1.0));

        assert_eq!(stats.mean, 7.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.area_mm2, 0.0);
    }

    #[test]
    fn region_outside_the_slice_is_all_zero() {
        let roi = RegionOfInterest::new((5, 5), (9, 9));
        let stats = roi.stats(quad().view(), (1.0, 1.0));

        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.area_mm2, 0.0);
    }

    #[test]
    fn area_scales_with_spacing() {
        let view = Array2::<i16>::zeros((4, 4));
        let roi = RegionOfInterest::new((0, 0), (2, 3));
        let stats = roi.stats(view.view(), (0.5, 2.0));

        assert_eq!(stats.area_mm2, 6.0);
    }

    #[test]
    fn full_slice_region_equals_whole_array_statistics() {
        let view = Array2::from_shape_fn((3, 4), |(r, c)| (r * r * 7 + c * 3) as i16);
        let roi = RegionOfInterest::new((0, 0), (3, 4));
        let stats = roi.stats(view.view(), (0.5, 2.0));

        let count = view.len() as f64;
        let mean = view.iter().map(|&v| f64::from(v)).sum::<f64>() / count;
        let variance = view
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / count;

        assert_eq!(stats.mean, mean);
        assert!((stats.std_dev - variance.sqrt()).abs() < 1e-12);
        assert_eq!(stats.area_mm2, 3.0 * 0.5 * 4.0 * 2.0);
    }

    #[test]
    fn histogram_counts_every_sample() {
        let view = array![[-1000i16, 0], [500, 3000]];
        let histogram = IntensityHistogram::from_slice(view.view(), 8);

        assert_eq!(histogram.bins.iter().sum::<u64>(), 4);
        assert_eq!(histogram.min, -1000.0);
        assert_eq!(histogram.max, 3000.0);
        assert_eq!(histogram.bin_width(), 500.0);
        // the maximum falls into the last bin, not past it
        assert_eq!(histogram.bins[7], 1);
    }

    #[test]
    fn constant_slice_occupies_a_single_bin() {
        let view = Array2::<i16>::from_elem((3, 3), 42);
        let histogram = IntensityHistogram::from_slice(view.view(), 16);

        assert_eq!(histogram.bins[0], 9);
        assert_eq!(histogram.bins.iter().sum::<u64>(), 9);
        assert_eq!(histogram.bin_width(), 0.0);
    }
}
