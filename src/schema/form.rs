//! Data models for the OR form
//!
//! Field names and nesting are consumed by the review UI and the training-data
//! exporter, so they must not change.

use serde::{Deserialize, Serialize};

/// Structured record for one operating-room event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrForm {
    /// Operation date (YYYY-MM-DD)
    pub date: Option<String>,

    pub times: Times,

    pub personnel: Personnel,

    pub diagnosis: Diagnosis,

    pub operation: Operation,

    pub anesthesia: Anesthesia,

    /// Patient position on the table
    pub position: Option<String>,

    pub devices: Devices,

    pub specimen: Specimen,

    pub condition_post_op: Option<String>,

    pub vitals: Vitals,

    pub medications: Vec<Medication>,

    /// Full trimmed transcript, kept regardless of what else was extracted
    pub free_notes: String,
}

/// Key timestamps of the procedure, stored as spoken ("9:30 pm")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Times {
    /// Patient in the room
    #[serde(rename = "in")]
    pub in_room: Option<String>,

    /// Patient out of the room
    #[serde(rename = "out")]
    pub out_room: Option<String>,

    pub induction: Option<String>,

    /// Skin incision
    pub cutting: Option<String>,

    pub end_of_surgery: Option<String>,

    pub dressing: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personnel {
    pub surgeon_1: Option<String>,
    pub surgeon_2: Option<String>,
    pub assistant_1: Option<String>,
    pub assistant_2: Option<String>,
    pub anesthetist: Option<String>,
    pub scrub_nurse: Option<String>,
    pub circulating_nurse: Option<String>,
    pub anesthesia_technician: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub pre_op: Option<String>,
    pub post_op: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: Option<String>,
    pub code: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Anesthesia {
    /// Techniques in first-seen order, no duplicates
    #[serde(rename = "type")]
    pub kinds: Vec<String>,

    pub sedation: Option<String>,
}

/// Devices left in place at the end of the procedure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Devices {
    pub foley: bool,
    pub foley_with_irrigation: bool,
    pub hemovac: bool,
    pub ng_tube: bool,
    pub chest_tube: bool,
    pub others: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specimen {
    pub sent: bool,

    #[serde(rename = "type")]
    pub kinds: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub bp_systolic: Option<u32>,
    pub bp_diastolic: Option<u32>,
    pub heart_rate: Option<u32>,
    pub spo2: Option<u32>,
}

/// A single administered drug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dose: Option<f64>,
    pub unit: Option<String>,
}

impl OrForm {
    /// Create an empty form with only the free-text notes filled in
    pub fn with_notes(transcript: &str) -> Self {
        Self {
            free_notes: transcript.trim().to_string(),
            ..Self::default()
        }
    }

    /// Serialize to the canonical JSON document
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
