use crate::enums::SortBy;
use crate::metadata::{PatientInfo, StudyInfo};
use crate::slice::{self, SliceImage};
use crate::volume::{Volume, VolumeError};

use dicom::object::{FileDicomObject, InMemDicomObject, open_file};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// A volume together with the descriptors of the series it came from.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub volume: Volume,
    pub patient: PatientInfo,
    pub study: StudyInfo,
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a series from DICOM objects
    ///
    /// Objects that do not look like CT slices (localizers, scouts) are
    /// skipped; the remainder is decoded in parallel, sorted and stacked.
    /// Patient and study descriptors are read from the middle of the
    /// admitted stack.
    ///
    /// # Arguments
    ///
    /// * `dicom_objects` - Slice of DICOM file objects
    /// * `sort_by` - Ordering key for the slices
    ///
    /// # Errors
    ///
    /// Returns error if no CT slices are admitted, a slice fails to
    /// decode, or the slices do not agree on geometry
    pub fn load_from_dicom_objects(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
        sort_by: SortBy,
    ) -> Result<LoadedSeries, VolumeError> {
        let admitted: Vec<_> = dicom_objects
            .iter()
            .filter(|object| {
                let keep = slice::is_ct_slice(object);
                if !keep {
                    debug!("skipping non-CT object");
                }
                keep
            })
            .collect();

        if admitted.is_empty() {
            return Err(VolumeError::EmptyInput);
        }

        let slices: Vec<SliceImage> = admitted
            .par_iter()
            .map(|object| SliceImage::from_object(object))
            .collect::<Result<_, _>>()?;

        // descriptors come from the middle of the stack, clear of scouts
        let middle = admitted[admitted.len() / 2];
        let patient = PatientInfo::from_object(middle);
        let study = StudyInfo::from_object(middle);

        let volume = Volume::assemble(slices, sort_by)?;
        info!(
            slices = volume.dim().0,
            skipped = dicom_objects.len() - admitted.len(),
            "assembled volume"
        );

        Ok(LoadedSeries {
            volume,
            patient,
            study,
        })
    }

    /// Load a series from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path>],
        sort_by: SortBy,
    ) -> Result<LoadedSeries, VolumeError> {
        let objects: Result<Vec<_>, _> =
            paths.iter().map(|path| open_file(path.as_ref())).collect();

        Self::load_from_dicom_objects(&objects?, sort_by)
    }

    /// Load a series from a directory containing .dcm files
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<LoadedSeries, VolumeError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();
        // read_dir order is platform dependent
        paths.sort();

        if paths.is_empty() {
            return Err(VolumeError::EmptyInput);
        }

        Self::load_from_file_paths(&paths, sort_by)
    }

    /// Load a series on the runtime's blocking pool
    pub async fn load_from_directory_async(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<LoadedSeries, VolumeError> {
        let path = path.as_ref().to_owned();
        tokio::task::spawn_blocking(move || Self::load_from_directory(path, sort_by))
            .await
            .map_err(|e| VolumeError::Io(std::io::Error::other(e)))?
    }
}
