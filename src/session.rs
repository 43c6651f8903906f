//! Viewer state: the loaded series, per-plane cursors and the active region.

use crate::enums::{Plane, SortBy};
use crate::metadata::{PatientInfo, StudyInfo};
use crate::roi::{RegionOfInterest, RegionStats};
use crate::volume::{PlaneSlice, Volume, VolumeError};
use crate::volume_loader::{LoadedSeries, VolumeLoader};

use dicom::object::{FileDicomObject, InMemDicomObject};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// What happens to the active region when the slice under it changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoiPolicy {
    /// Drop the region as soon as its plane's cursor moves.
    #[default]
    Discard,
    /// Keep the region across navigation; statistics follow the cursor.
    Retain,
}

/// Viewer state over one loaded series.
///
/// The volume sits behind an `Arc` and is only replaced after a load
/// completes, so a failed reload leaves the previous series in place and
/// handles held elsewhere stay valid.
#[derive(Default)]
pub struct Session {
    volume: Option<Arc<Volume>>,
    patient: Option<PatientInfo>,
    study: Option<StudyInfo>,
    cursors: [usize; 3],
    roi: Option<(Plane, RegionOfInterest)>,
    roi_policy: RoiPolicy,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roi_policy(roi_policy: RoiPolicy) -> Self {
        Session {
            roi_policy,
            ..Self::default()
        }
    }

    /// Load a series from a directory, replacing the current one on success.
    pub fn load_directory(
        &mut self,
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<(), VolumeError> {
        let series = VolumeLoader::load_from_directory(path, sort_by)?;
        self.install(series);
        Ok(())
    }

    /// Async variant of [`load_directory`](Self::load_directory).
    pub async fn load_directory_async(
        &mut self,
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<(), VolumeError> {
        let series = VolumeLoader::load_from_directory_async(path, sort_by).await?;
        self.install(series);
        Ok(())
    }

    /// Load a series from DICOM objects already in memory.
    pub fn load_dicom_objects(
        &mut self,
        objects: &[FileDicomObject<InMemDicomObject>],
        sort_by: SortBy,
    ) -> Result<(), VolumeError> {
        let series = VolumeLoader::load_from_dicom_objects(objects, sort_by)?;
        self.install(series);
        Ok(())
    }

    fn install(&mut self, series: LoadedSeries) {
        let volume = Arc::new(series.volume);
        // sliders start at the center of each plane
        for plane in Plane::ALL {
            self.cursors[plane.ordinal()] = volume.plane_extent(plane) / 2;
        }
        self.roi = None;
        self.patient = Some(series.patient);
        self.study = Some(series.study);
        self.volume = Some(volume);
    }

    /// Shared handle to the loaded volume.
    pub fn volume(&self) -> Option<Arc<Volume>> {
        self.volume.clone()
    }

    pub fn patient(&self) -> Option<&PatientInfo> {
        self.patient.as_ref()
    }

    pub fn study(&self) -> Option<&StudyInfo> {
        self.study.as_ref()
    }

    pub fn roi_policy(&self) -> RoiPolicy {
        self.roi_policy
    }

    pub fn set_roi_policy(&mut self, roi_policy: RoiPolicy) {
        self.roi_policy = roi_policy;
    }

    /// The plane's cursor position.
    pub fn cursor(&self, plane: Plane) -> usize {
        self.cursors[plane.ordinal()]
    }

    /// The slice under the plane's cursor, or None before the first load.
    pub fn current_slice(&self, plane: Plane) -> Option<PlaneSlice<'_>> {
        let volume = self.volume.as_deref()?;
        volume.reslice(plane, self.cursors[plane.ordinal()]).ok()
    }

    /// Move the plane's cursor by `delta`, clamped to the volume.
    ///
    /// Returns the cursor after the move.
    pub fn navigate(&mut self, plane: Plane, delta: isize) -> usize {
        let Some(volume) = self.volume.as_deref() else {
            return 0;
        };
        let last = volume.plane_extent(plane).saturating_sub(1);
        let cursor = self.cursors[plane.ordinal()];
        let moved = cursor.saturating_add_signed(delta).min(last);
        if moved != cursor {
            self.cursors[plane.ordinal()] = moved;
            self.apply_roi_policy(plane);
        }
        moved
    }

    /// Place the plane's cursor at an exact index.
    pub fn set_index(&mut self, plane: Plane, index: usize) -> Result<(), VolumeError> {
        let extent = self
            .volume
            .as_deref()
            .map_or(0, |volume| volume.plane_extent(plane));
        if index >= extent {
            return Err(VolumeError::IndexOutOfRange {
                plane,
                index,
                extent,
            });
        }
        if self.cursors[plane.ordinal()] != index {
            self.cursors[plane.ordinal()] = index;
            self.apply_roi_policy(plane);
        }
        Ok(())
    }

    /// Select a region on a plane's current slice, replacing any previous one.
    pub fn set_roi(&mut self, plane: Plane, roi: RegionOfInterest) {
        self.roi = Some((plane, roi));
    }

    pub fn clear_roi(&mut self) {
        self.roi = None;
    }

    pub fn roi(&self) -> Option<(Plane, RegionOfInterest)> {
        self.roi
    }

    /// Statistics of the active region against the current slice of its
    /// plane. Recomputed on every call, never cached.
    pub fn roi_stats(&self) -> Option<RegionStats> {
        let (plane, roi) = self.roi?;
        let slice = self.current_slice(plane)?;
        Some(roi.stats(slice.data(), slice.spacing()))
    }

    fn apply_roi_policy(&mut self, changed_plane: Plane) {
        if self.roi_policy == RoiPolicy::Discard
            && self.roi.is_some_and(|(plane, _)| plane == changed_plane)
        {
            debug!(%changed_plane, "discarding region after navigation");
            self.roi = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn test_series() -> LoadedSeries {
        let data = Array3::from_shape_fn((4, 3, 2), |(s, r, c)| (s * 100 + r * 10 + c) as i16);
        LoadedSeries {
            volume: Volume::new(data, (1.0, 1.0, 1.0)),
            patient: PatientInfo::from_object(&InMemDicomObject::new_empty()),
            study: StudyInfo::from_object(&InMemDicomObject::new_empty()),
        }
    }

    fn loaded_session() -> Session {
        let mut session = Session::new();
        session.install(test_series());
        session
    }

    #[test]
    fn empty_session_has_no_slice() {
        let mut session = Session::new();
        assert!(session.current_slice(Plane::Axial).is_none());
        assert_eq!(session.navigate(Plane::Axial, 5), 0);
        assert!(session.set_index(Plane::Axial, 0).is_err());
        assert!(session.roi_stats().is_none());
    }

    #[test]
    fn load_starts_cursors_at_the_middle() {
        let session = loaded_session();
        assert_eq!(session.cursor(Plane::Axial), 2);
        assert_eq!(session.cursor(Plane::Coronal), 1);
        assert_eq!(session.cursor(Plane::Sagittal), 1);
        assert_eq!(session.patient().unwrap().name, "UNKNOWN");
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut session = loaded_session();
        assert_eq!(session.navigate(Plane::Axial, 100), 3);
        assert_eq!(session.navigate(Plane::Axial, 1), 3);
        assert_eq!(session.navigate(Plane::Axial, -100), 0);
        assert_eq!(session.navigate(Plane::Axial, -1), 0);
    }

    #[test]
    fn zero_extent_axes_navigate_to_zero() {
        let mut session = Session::new();
        session.install(LoadedSeries {
            volume: Volume::new(Array3::zeros((2, 0, 4)), (1.0, 1.0, 1.0)),
            patient: PatientInfo::from_object(&InMemDicomObject::new_empty()),
            study: StudyInfo::from_object(&InMemDicomObject::new_empty()),
        });

        assert_eq!(session.navigate(Plane::Coronal, 1), 0);
        assert_eq!(session.navigate(Plane::Coronal, -1), 0);
        assert!(session.current_slice(Plane::Coronal).is_none());
        assert_eq!(session.navigate(Plane::Axial, 1), 1);
    }

    #[test]
    fn set_index_validates_the_range() {
        let mut session = loaded_session();
        session.set_index(Plane::Sagittal, 1).unwrap();
        assert_eq!(session.cursor(Plane::Sagittal), 1);

        let error = session.set_index(Plane::Sagittal, 2).unwrap_err();
        assert!(matches!(
            error,
            VolumeError::IndexOutOfRange {
                plane: Plane::Sagittal,
                index: 2,
                extent: 2
            }
        ));
    }

    #[test]
    fn default_policy_discards_the_region_on_navigation() {
        let mut session = loaded_session();
        session.set_roi(Plane::Axial, RegionOfInterest::new((0, 0), (2, 2)));
        assert!(session.roi_stats().is_some());

        session.navigate(Plane::Axial, 1);
        assert!(session.roi().is_none());
        assert!(session.roi_stats().is_none());
    }

    #[test]
    fn navigating_another_plane_keeps_the_region() {
        let mut session = loaded_session();
        session.set_roi(Plane::Axial, RegionOfInterest::new((0, 0), (2, 2)));

        session.navigate(Plane::Coronal, 1);
        assert!(session.roi().is_some());
    }

    #[test]
    fn retain_policy_keeps_the_region_and_follows_the_cursor() {
        let mut session = Session::with_roi_policy(RoiPolicy::Retain);
        session.install(test_series());
        session.set_roi(Plane::Axial, RegionOfInterest::new((0, 0), (2, 2)));

        let before = session.roi_stats().unwrap();
        session.navigate(Plane::Axial, 1);
        let after = session.roi_stats().unwrap();

        assert!(session.roi().is_some());
        // one slice further, every voxel is 100 HU higher
        assert_eq!(after.mean, before.mean + 100.0);
    }

    #[test]
    fn roi_stats_track_the_current_slice() {
        let mut session = loaded_session();
        session.set_roi(Plane::Axial, RegionOfInterest::new((0, 0), (2, 2)));

        let stats = session.roi_stats().unwrap();
        // axial cursor 2: cells 200, 201, 210, 211
        assert_eq!(stats.mean, 205.5);
        assert_eq!(stats.area_mm2, 4.0);
    }

    #[test]
    fn failed_load_leaves_the_previous_series_in_place() {
        let mut session = loaded_session();
        session.set_roi(Plane::Axial, RegionOfInterest::new((0, 0), (1, 1)));

        let result = session.load_directory("/definitely/not/here", SortBy::SliceLocation);
        assert!(result.is_err());

        assert!(session.volume().is_some());
        assert_eq!(session.cursor(Plane::Axial), 2);
        assert!(session.roi().is_some());
    }

    #[test]
    fn reload_resets_cursors_and_region() {
        let mut session = loaded_session();
        session.navigate(Plane::Axial, 1);
        session.set_roi(Plane::Axial, RegionOfInterest::new((0, 0), (1, 1)));

        session.install(test_series());
        assert_eq!(session.cursor(Plane::Axial), 2);
        assert!(session.roi().is_none());
    }
}
