//! Window center/width mapping from stored intensities to display samples.

/// A linear VOI window (DICOM PS3.3 C.11.2.1.2.1) taking intensity values
/// to 8-bit display samples.
///
/// The width is treated as at least 1 when applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLevel {
    /// The window center (level).
    pub center: f64,
    /// The window width.
    pub width: f64,
}

impl WindowLevel {
    pub fn new(center: f64, width: f64) -> Self {
        WindowLevel { center, width }
    }

    /// Build a window from display levels, the way a histogram widget
    /// reports them: `width = max - min`, `center = min + width / 2`.
    pub fn from_levels(min: f64, max: f64) -> Self {
        let width = max - min;
        WindowLevel {
            center: min + width / 2.0,
            width,
        }
    }

    /// Map an intensity value to a display sample in `0..=255`.
    ///
    /// Values at or below `center - (width-1)/2` map to 0, values above
    /// `center - 0.5 + (width-1)/2` map to 255, linear in between.
    pub fn apply(&self, value: f64) -> u8 {
        let width = self.width.max(1.0);
        let min = self.center - (width - 1.0) / 2.0;
        let max = self.center - 0.5 + (width - 1.0) / 2.0;

        if value <= min {
            0
        } else if value > max {
            255
        } else {
            (((value - (self.center - 0.5)) / (width - 1.0) + 0.5) * 255.0).clamp(0.0, 255.0) as u8
        }
    }
}

impl Default for WindowLevel {
    /// The viewer's CT preset: level 2000, width 4000.
    fn default() -> Self {
        WindowLevel {
            center: 2000.0,
            width: 4000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_maps_extremes() {
        let window = WindowLevel::default();
        assert_eq!(window.apply(-1000.0), 0);
        assert_eq!(window.apply(0.0), 0);
        assert_eq!(window.apply(4000.0), 255);
        assert_eq!(window.apply(10_000.0), 255);

        // midpoint lands near the middle of the display range
        let mid = window.apply(2000.0);
        assert!((126..=128).contains(&mid), "midpoint was {mid}");
    }

    #[test]
    fn window_is_monotonic() {
        let window = WindowLevel::new(50.0, 300.0);
        let mut previous = 0;
        for hu in -300..300 {
            let sample = window.apply(f64::from(hu));
            assert!(sample >= previous);
            previous = sample;
        }
        assert_eq!(previous, 255);
    }

    #[test]
    fn degenerate_width_is_a_threshold() {
        let window = WindowLevel::new(0.0, 0.0);
        assert_eq!(window.apply(-5.0), 0);
        assert_eq!(window.apply(0.0), 0);
        assert_eq!(window.apply(5.0), 255);
    }

    #[test]
    fn from_levels_matches_the_histogram_convention() {
        let window = WindowLevel::from_levels(0.0, 4000.0);
        assert_eq!(window, WindowLevel::default());

        let narrow = WindowLevel::from_levels(-100.0, 300.0);
        assert_eq!(narrow.width, 400.0);
        assert_eq!(narrow.center, 100.0);
    }
}
