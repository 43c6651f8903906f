//! Patient and study descriptors attached to a loaded series.

use dicom::core::Tag;
use dicom::object::InMemDicomObject;
use dicom_dictionary_std::tags;

const UNKNOWN: &str = "unknown";

fn string_or_unknown(object: &InMemDicomObject, tag: Tag) -> String {
    object
        .element(tag)
        .ok()
        .and_then(|element| element.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Patient demographics. Lenient: absent or empty tags read as `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientInfo {
    pub id: String,
    /// Patient name, uppercased for display.
    pub name: String,
    pub age: String,
    pub sex: String,
}

impl PatientInfo {
    pub fn from_object(object: &InMemDicomObject) -> Self {
        PatientInfo {
            id: string_or_unknown(object, tags::PATIENT_ID),
            name: string_or_unknown(object, tags::PATIENT_NAME).to_uppercase(),
            age: string_or_unknown(object, tags::PATIENT_AGE),
            sex: string_or_unknown(object, tags::PATIENT_SEX),
        }
    }
}

/// Study descriptors, read as leniently as [`PatientInfo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyInfo {
    pub study_id: String,
    pub date: String,
    pub body_part: String,
}

impl StudyInfo {
    pub fn from_object(object: &InMemDicomObject) -> Self {
        StudyInfo {
            study_id: string_or_unknown(object, tags::STUDY_ID),
            date: string_or_unknown(object, tags::STUDY_DATE),
            body_part: string_or_unknown(object, tags::BODY_PART_EXAMINED),
        }
    }
}
