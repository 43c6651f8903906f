use crate::enums::{Plane, SortBy};
use crate::slice::SliceImage;
use crate::windowing::WindowLevel;

use image::ImageBuffer;
use image::Luma;
use ndarray::Array3;
use ndarray::ArrayView2;
use ndarray::s;
use rayon::prelude::*;
use thiserror::Error;
use tracing::warn;

/// Spacing values closer than this are treated as equal, in millimetres.
pub const SPACING_TOLERANCE_MM: f64 = 1e-3;

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("No slices to assemble")]
    EmptyInput,

    #[error("Inconsistent slice geometry: {reason}")]
    InconsistentGeometry { reason: String },

    #[error("Missing required attribute {name}")]
    MissingAttribute { name: &'static str },

    #[error("{plane} index {index} out of range (extent {extent})")]
    IndexOutOfRange {
        plane: Plane,
        index: usize,
        extent: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Read(#[from] dicom::object::ReadError),

    #[error("Pixel data error: {0}")]
    CorruptSlice(#[from] dicom::pixeldata::Error),
}

/// A CT volume indexed (slice, row, column), in Hounsfield units.
#[derive(Debug, Clone)]
pub struct Volume {
    data: Array3<i16>,
    spacing: (f64, f64, f64),
    uniform_slice_spacing: bool,
}

impl Volume {
    /// Build a volume directly from voxel data and a known spacing.
    pub fn new(data: Array3<i16>, spacing: (f64, f64, f64)) -> Self {
        Self {
            data,
            spacing,
            uniform_slice_spacing: true,
        }
    }

    /// Stack decoded slices into a volume.
    ///
    /// Slices are sorted ascending by the `sort_by` key before stacking
    /// (stable, so ties keep ingestion order); `SortBy::FileOrder` skips
    /// sorting entirely. All slices must share the same in-plane
    /// dimensions and pixel spacing.
    pub fn assemble(mut slices: Vec<SliceImage>, sort_by: SortBy) -> Result<Volume, VolumeError> {
        if slices.is_empty() {
            return Err(VolumeError::EmptyInput);
        }

        if sort_by != SortBy::FileOrder {
            slices.sort_by(|a, b| {
                a.geometry()
                    .sort_key(sort_by)
                    .partial_cmp(&b.geometry().sort_key(sort_by))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let (rows, cols) = slices[0].dim();
        if slices.iter().any(|slice| slice.dim() != (rows, cols)) {
            return Err(VolumeError::InconsistentGeometry {
                reason: "slices differ in rows/columns".into(),
            });
        }

        let row_spacing = slices[0].geometry().row_spacing_mm;
        let col_spacing = slices[0].geometry().col_spacing_mm;
        let spacing_agrees = slices.iter().all(|slice| {
            let geometry = slice.geometry();
            (geometry.row_spacing_mm - row_spacing).abs() <= SPACING_TOLERANCE_MM
                && (geometry.col_spacing_mm - col_spacing).abs() <= SPACING_TOLERANCE_MM
        });
        if !spacing_agrees {
            return Err(VolumeError::InconsistentGeometry {
                reason: "slices differ in pixel spacing".into(),
            });
        }

        let (slice_spacing, uniform_slice_spacing) = Self::derive_slice_spacing(&slices);

        let depth = slices.len();
        let mut data = Array3::zeros((depth, rows, cols));
        for (i, slice) in slices.into_iter().enumerate() {
            let (pixels, _) = slice.into_parts();
            data.slice_mut(s![i, .., ..]).assign(&pixels);
        }

        Ok(Volume {
            data,
            spacing: (slice_spacing, row_spacing, col_spacing),
            uniform_slice_spacing,
        })
    }

    /// Mean gap between consecutive slice positions, and whether every gap
    /// agrees with that mean within [`SPACING_TOLERANCE_MM`].
    fn derive_slice_spacing(slices: &[SliceImage]) -> (f64, bool) {
        if slices.len() < 2 {
            let spacing = match slices[0].geometry().thickness_mm {
                Some(thickness) if thickness > 0.0 => thickness,
                _ => {
                    warn!("single slice without thickness, assuming 1.0 mm spacing");
                    1.0
                }
            };
            return (spacing, true);
        }

        let gaps: Vec<f64> = slices
            .windows(2)
            .map(|pair| (pair[1].geometry().position_mm - pair[0].geometry().position_mm).abs())
            .collect();
        let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;

        if mean <= SPACING_TOLERANCE_MM {
            warn!("slice positions are degenerate, assuming 1.0 mm spacing");
            return (1.0, false);
        }

        let uniform = gaps
            .iter()
            .all(|gap| (gap - mean).abs() <= SPACING_TOLERANCE_MM);
        if !uniform {
            warn!(
                mean_spacing_mm = mean,
                "non-uniform slice spacing, reconstructions use the mean gap"
            );
        }

        (mean, uniform)
    }

    /// Get the dimensions of the volume (slices, rows, columns)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<i16> {
        &self.data
    }

    /// Voxel spacing in (slice, row, column) order, millimetres.
    pub fn spacing(&self) -> (f64, f64, f64) {
        self.spacing
    }

    /// False when the stack's consecutive gaps disagree with their mean.
    pub fn has_uniform_slice_spacing(&self) -> bool {
        self.uniform_slice_spacing
    }

    /// Number of positions a plane pages through.
    pub fn plane_extent(&self, plane: Plane) -> usize {
        let (slices, rows, cols) = self.dim();
        match plane {
            Plane::Axial => slices,
            Plane::Coronal => rows,
            Plane::Sagittal => cols,
        }
    }

    /// In-plane step (vertical, horizontal) of a reslice, millimetres.
    pub fn plane_spacing(&self, plane: Plane) -> (f64, f64) {
        let (slice, row, col) = self.spacing;
        match plane {
            Plane::Axial => (row, col),
            Plane::Coronal => (slice, col),
            Plane::Sagittal => (slice, row),
        }
    }

    /// Distance between two consecutive positions of a plane, millimetres.
    pub fn plane_step(&self, plane: Plane) -> f64 {
        let (slice, row, col) = self.spacing;
        match plane {
            Plane::Axial => slice,
            Plane::Coronal => row,
            Plane::Sagittal => col,
        }
    }

    /// Cut the plane at `index` out of the volume, without copying.
    ///
    /// Axial fixes the slice axis, coronal the row axis, sagittal the
    /// column axis. The index is not clamped; anything past the extent is
    /// an error.
    pub fn reslice(&self, plane: Plane, index: usize) -> Result<PlaneSlice<'_>, VolumeError> {
        let extent = self.plane_extent(plane);
        if index >= extent {
            return Err(VolumeError::IndexOutOfRange {
                plane,
                index,
                extent,
            });
        }

        let data = match plane {
            Plane::Axial => self.data.slice(s![index, .., ..]),
            Plane::Coronal => self.data.slice(s![.., index, ..]),
            Plane::Sagittal => self.data.slice(s![.., .., index]),
        };

        Ok(PlaneSlice {
            data,
            spacing: self.plane_spacing(plane),
            step_mm: self.plane_step(plane),
            plane,
            index,
            extent,
        })
    }
}

/// A 2D cut through a [`Volume`], borrowing its voxels.
///
/// The view's rows and columns follow the plane mapping: axial is
/// (row, column) of the source grid, coronal is (slice, column), sagittal
/// is (slice, row).
#[derive(Debug, Clone, Copy)]
pub struct PlaneSlice<'a> {
    data: ArrayView2<'a, i16>,
    spacing: (f64, f64),
    step_mm: f64,
    plane: Plane,
    index: usize,
    extent: usize,
}

impl<'a> PlaneSlice<'a> {
    /// The voxel view. It borrows the volume, not this cut, so it may
    /// outlive the `PlaneSlice` it was taken from.
    pub fn data(&self) -> ArrayView2<'a, i16> {
        self.data
    }

    /// In-plane pixel pitch (vertical, horizontal) of this cut, millimetres.
    pub fn spacing(&self) -> (f64, f64) {
        self.spacing
    }

    /// Distance to the neighbouring cuts of the same plane, millimetres.
    ///
    /// Viewers display this as the slice thickness of the view.
    pub fn step_mm(&self) -> f64 {
        self.step_mm
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    /// Zero-based position along the paging axis.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of positions along the paging axis.
    pub fn extent(&self) -> usize {
        self.extent
    }

    /// Dimensions as (rows, columns).
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Physical size as (height, width), millimetres.
    pub fn physical_size_mm(&self) -> (f64, f64) {
        let (rows, cols) = self.dim();
        (rows as f64 * self.spacing.0, cols as f64 * self.spacing.1)
    }

    /// Render the cut through a window into an 8-bit grayscale image.
    pub fn to_image(&self, window: WindowLevel) -> Option<ImageBuffer<Luma<u8>, Vec<u8>>> {
        let (height, width) = self.dim();
        let pixel_data: Vec<u8> = self
            .data
            .into_par_iter()
            .map(|&value| window.apply(f64::from(value)))
            .collect();
        ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
    }
}

impl std::fmt::Display for PlaneSlice<'_> {
    /// One-based label in the form `Axial 3/12`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.plane, self.index + 1, self.extent)
    }
}
