//! Sidecar and dataset-description metadata.
//!
//! Everything here is a constant mock literal except the series/protocol
//! description fields, which carry the contrast value of the file they
//! accompany.

use serde::{Deserialize, Serialize};

use crate::keywords::KeywordValue;

/// Acquisition-parameter sidecar accompanying every mock image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SidecarMetadata {
    pub modality: String,
    pub magnetic_field_strength: u32,
    pub manufacturer: String,
    pub institution_name: String,
    #[serde(rename = "MRAcquisitionType")]
    pub mr_acquisition_type: String,
    pub series_description: String,
    pub protocol_name: String,
    pub echo_time: u32,
    pub repetition_time: u32,
    pub inversion_time: u32,
    pub flip_angle: u32,
    pub slice_thickness: u32,
    pub conversion_software: String,
}

impl SidecarMetadata {
    /// Mock acquisition parameters for one contrast.
    pub fn mock(contrast: &KeywordValue) -> Self {
        let contrast = contrast.to_string();
        Self {
            modality: "MR".to_string(),
            magnetic_field_strength: 3,
            manufacturer: "MOCK".to_string(),
            institution_name: "MOCK Research Center".to_string(),
            mr_acquisition_type: "3D".to_string(),
            series_description: contrast.clone(),
            protocol_name: contrast,
            echo_time: 1,
            repetition_time: 1,
            inversion_time: 1,
            flip_angle: 1,
            slice_thickness: 1,
            conversion_software: "MOCK".to_string(),
        }
    }
}

/// Dataset-level description, written exactly once per dataset root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatasetDescription {
    pub name: String,
    #[serde(rename = "BIDSVersion")]
    pub bids_version: String,
    pub researcher: String,
    pub study: String,
    pub pipeline_description: PipelineDescription,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PipelineDescription {
    pub name: String,
}

impl DatasetDescription {
    pub fn mock() -> Self {
        Self {
            name: "MOCK multi-contrast multi-session dataset".to_string(),
            bids_version: "1.0.2".to_string(),
            researcher: "MOCK_RESEARCHER".to_string(),
            study: "MOCK_STUDY".to_string(),
            pipeline_description: PipelineDescription {
                // double space as in the fixtures this mimics
                name: "MOCK  ivadomed multi contrast multi session pipeline".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};

    #[test]
    fn sidecar_uses_bids_field_names() {
        let meta = SidecarMetadata::mock(&KeywordValue::from("T1w"));
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["Modality"], "MR");
        assert_eq!(value["MRAcquisitionType"], "3D");
        assert_eq!(value["SeriesDescription"], "T1w");
        assert_eq!(value["ProtocolName"], "T1w");
        assert_eq!(value["MagneticFieldStrength"], 3);
    }

    #[test]
    fn description_uses_bids_field_names() {
        let value = serde_json::to_value(DatasetDescription::mock()).unwrap();
        assert_eq!(value["BIDSVersion"], "1.0.2");
        assert_eq!(value["PipelineDescription"]["Name"],
                   "MOCK  ivadomed multi contrast multi session pipeline");
    }

    #[test]
    fn sidecar_roundtrips_through_json() {
        let meta = SidecarMetadata::mock(&KeywordValue::from("FLAIR"));
        let text = serde_json::to_string(&meta).unwrap();
        let back: SidecarMetadata = serde_json::from_str(&text).unwrap();
        assert_eq!(meta, back);
    }
}
