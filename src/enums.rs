use std::fmt;
use std::str::FromStr;

/// Anatomical viewing plane through a stacked CT volume.
///
/// The volume is indexed `(slice, row, column)`; each plane fixes one of
/// those axes and exposes the other two as the displayed image axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    /// Fixes the slice axis; in-plane axes are (row, column).
    Axial,
    /// Fixes the row axis; in-plane axes are (slice, column).
    Coronal,
    /// Fixes the column axis; in-plane axes are (slice, row).
    Sagittal,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Axial, Plane::Coronal, Plane::Sagittal];

    /// Anatomical labels for the (top, bottom, left, right) edges of the
    /// displayed slice, from the observer's point of view.
    pub fn edge_labels(self) -> (&'static str, &'static str, &'static str, &'static str) {
        match self {
            Plane::Axial => ("P", "A", "R", "L"),
            Plane::Coronal => ("S", "I", "R", "L"),
            Plane::Sagittal => ("S", "I", "A", "P"),
        }
    }

    pub(crate) fn ordinal(self) -> usize {
        match self {
            Plane::Axial => 0,
            Plane::Coronal => 1,
            Plane::Sagittal => 2,
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Plane::Axial => "Axial",
            Plane::Coronal => "Coronal",
            Plane::Sagittal => "Sagittal",
        })
    }
}

impl FromStr for Plane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "axial" => Ok(Plane::Axial),
            "coronal" => Ok(Plane::Coronal),
            "sagittal" => Ok(Plane::Sagittal),
            other => Err(format!(
                "unknown plane `{other}` (expected axial, coronal or sagittal)"
            )),
        }
    }
}

/// Which attribute orders the slices along the stacking axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Slice Location (0020,1041).
    #[default]
    SliceLocation,
    /// Third component of Image Position (Patient) (0020,0032).
    ImagePositionPatient,
    /// Instance Number (0020,0013).
    InstanceNumber,
    /// Keep the order in which the files were ingested.
    FileOrder,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slice-location" => Ok(SortBy::SliceLocation),
            "image-position" => Ok(SortBy::ImagePositionPatient),
            "instance-number" => Ok(SortBy::InstanceNumber),
            "file-order" => Ok(SortBy::FileOrder),
            other => Err(format!(
                "unknown ordering `{other}` (expected slice-location, image-position, \
                 instance-number or file-order)"
            )),
        }
    }
}
