//! Single-slice decoding: Hounsfield pixels plus per-slice geometry.

use crate::enums::SortBy;
use crate::volume::VolumeError;

use dicom::object::{FileDicomObject, InMemDicomObject};
use dicom::pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder};
use dicom_dictionary_std::tags;
use ndarray::{Array2, s};

/// Spatial metadata of a single slice, in millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceGeometry {
    /// Distance between pixel centers along a column (PixelSpacing row value).
    pub row_spacing_mm: f64,
    /// Distance between pixel centers along a row (PixelSpacing column value).
    pub col_spacing_mm: f64,
    /// Position along the stacking axis: SliceLocation, or the z component
    /// of ImagePositionPatient when SliceLocation is absent.
    pub position_mm: f64,
    /// z component of ImagePositionPatient, when present.
    pub patient_z_mm: Option<f64>,
    /// SliceThickness, when present.
    pub thickness_mm: Option<f64>,
    /// InstanceNumber, when present.
    pub instance_number: Option<i32>,
}

impl SliceGeometry {
    /// Read the slice geometry from a DICOM object.
    ///
    /// Pixel spacing and a stacking-axis position are required and fail
    /// fast when absent or malformed; thickness and instance number are
    /// optional.
    pub fn from_object(object: &InMemDicomObject) -> Result<Self, VolumeError> {
        let pixel_spacing = object
            .element(tags::PIXEL_SPACING)
            .ok()
            .and_then(|element| element.to_multi_float64().ok())
            .ok_or(VolumeError::MissingAttribute {
                name: "PixelSpacing",
            })?;
        let (row_spacing_mm, col_spacing_mm) = match pixel_spacing[..] {
            [row, col, ..] => (row, col),
            _ => {
                return Err(VolumeError::MissingAttribute {
                    name: "PixelSpacing",
                });
            }
        };

        let patient_z_mm = object
            .element(tags::IMAGE_POSITION_PATIENT)
            .ok()
            .and_then(|element| element.to_multi_float64().ok())
            .and_then(|position| position.get(2).copied());

        let slice_location = object
            .element(tags::SLICE_LOCATION)
            .ok()
            .and_then(|element| element.to_float64().ok());

        let position_mm =
            slice_location
                .or(patient_z_mm)
                .ok_or(VolumeError::MissingAttribute {
                    name: "SliceLocation",
                })?;

        let thickness_mm = object
            .element(tags::SLICE_THICKNESS)
            .ok()
            .and_then(|element| element.to_float64().ok());

        let instance_number = object
            .element(tags::INSTANCE_NUMBER)
            .ok()
            .and_then(|element| element.to_int::<i32>().ok());

        Ok(SliceGeometry {
            row_spacing_mm,
            col_spacing_mm,
            position_mm,
            patient_z_mm,
            thickness_mm,
            instance_number,
        })
    }

    /// The scalar this slice sorts by for the given ordering.
    ///
    /// Orderings whose tag is absent fall back to the stacking-axis
    /// position so a mixed series still sorts deterministically.
    pub fn sort_key(&self, sort_by: SortBy) -> f64 {
        match sort_by {
            SortBy::SliceLocation => self.position_mm,
            SortBy::ImagePositionPatient => self.patient_z_mm.unwrap_or(self.position_mm),
            SortBy::InstanceNumber => self
                .instance_number
                .map(f64::from)
                .unwrap_or(self.position_mm),
            SortBy::FileOrder => 0.0,
        }
    }
}

/// A decoded slice: Hounsfield intensities and the geometry they sit in.
#[derive(Debug, Clone)]
pub struct SliceImage {
    pixels: Array2<i16>,
    geometry: SliceGeometry,
}

impl SliceImage {
    /// Build a slice from raw intensities.
    pub fn new(pixels: Array2<i16>, geometry: SliceGeometry) -> Self {
        SliceImage { pixels, geometry }
    }

    /// Decode a DICOM object into Hounsfield units and read its geometry.
    ///
    /// The modality LUT (rescale slope/intercept) is applied here; VOI
    /// windowing is left to [`WindowLevel`](crate::windowing::WindowLevel)
    /// at display time.
    pub fn from_object(object: &FileDicomObject<InMemDicomObject>) -> Result<Self, VolumeError> {
        let geometry = SliceGeometry::from_object(object)?;

        let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::Default);
        let pixels = object
            .decode_pixel_data()?
            .to_ndarray_with_options::<i16>(&options)?
            .slice_move(s![0, .., .., 0]);

        Ok(SliceImage { pixels, geometry })
    }

    /// In-plane dimensions as (rows, columns).
    pub fn dim(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    pub fn pixels(&self) -> &Array2<i16> {
        &self.pixels
    }

    pub fn geometry(&self) -> &SliceGeometry {
        &self.geometry
    }

    pub(crate) fn into_parts(self) -> (Array2<i16>, SliceGeometry) {
        (self.pixels, self.geometry)
    }
}

/// Whether a DICOM object looks like a CT slice worth stacking.
///
/// Localizer and scout images carry no SliceLocation and report a zero
/// SliceThickness; such files are skipped during loading.
pub fn is_ct_slice(object: &InMemDicomObject) -> bool {
    let has_location = object
        .element(tags::SLICE_LOCATION)
        .ok()
        .and_then(|element| element.to_float64().ok())
        .is_some();

    let has_thickness = object
        .element(tags::SLICE_THICKNESS)
        .ok()
        .and_then(|element| element.to_float64().ok())
        .is_some_and(|thickness| thickness != 0.0);

    has_location || has_thickness
}
