//! # DICOM MPR library
//!
//! This crate serves a high-level API for viewing a CT series of 2D DICOM
//! files as a volume
//!
//! This library is part of the dicom-rs ecosystem and leverages its
//! components to assemble axial slice files into a `(slice, row, column)`
//! volume of Hounsfield units. Volumes can either be loaded from multiple
//! [`FileDicomObject<InMemDicomObject>`] or from a specified folder where
//! each ".dcm" file is read from; decoding runs in parallel using rayon.
//! The volume can be resliced along the three medical axes:
//!  - Axial
//!  - Coronal
//!  - Sagittal
//!
//! Reslices are index-for-index cuts of the stored grid; no resampling or
//! interpolation is applied, and the anisotropy of each cut is reported
//! through its per-axis spacing instead. DICOM files are assumed to have
//! the following attributes:
//!  - Axial data set with PixelSpacing and a SliceLocation or
//!    ImagePositionPatient per file
//!  - No multiframe (always the first frame is used)
//!  - Equal rows, columns and pixel spacing across the series
//!
//! On top of the volume sit a [`Session`] holding per-plane cursors and an
//! optional rectangular region of interest, window/level display mapping,
//! and region statistics (mean, standard deviation, physical area).
//!
//! # Examples
//!
//! ## Browsing a series and measuring a region
//!
//! Read all DICOM files from the dicom/ directory and sort them by
//! SliceLocation. The session starts each plane at its middle slice;
//! measure a region on the sagittal cut and save a windowed PNG of it.
//!
//! ```no_run
//! # use dicom_mpr::{Plane, RegionOfInterest, Session, SortBy, WindowLevel};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new();
//! session.load_directory("dicom", SortBy::SliceLocation)?;
//! session.set_roi(Plane::Sagittal, RegionOfInterest::new((40, 40), (80, 90)));
//!
//! if let Some(stats) = session.roi_stats() {
//!     println!("mean {:.1} HU over {:.1} mm²", stats.mean, stats.area_mm2);
//! }
//!
//! let slice = session
//!     .current_slice(Plane::Sagittal)
//!     .expect("volume is loaded");
//! let image = slice
//!     .to_image(WindowLevel::default())
//!     .expect("slice dimensions fit an image buffer");
//! image.save("sagittal.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! [`FileDicomObject<InMemDicomObject>`]: https://docs.rs/dicom-object/latest/dicom_object/struct.FileDicomObject.html

pub mod enums;
pub mod metadata;
pub mod roi;
pub mod session;
pub mod slice;
pub mod volume;
pub mod volume_loader;
pub mod windowing;

pub use enums::{Plane, SortBy};
pub use metadata::{PatientInfo, StudyInfo};
pub use roi::{IntensityHistogram, RegionOfInterest, RegionStats};
pub use session::{RoiPolicy, Session};
pub use slice::{SliceGeometry, SliceImage};
pub use volume::{PlaneSlice, SPACING_TOLERANCE_MM, Volume, VolumeError};
pub use volume_loader::{LoadedSeries, VolumeLoader};
pub use windowing::WindowLevel;
