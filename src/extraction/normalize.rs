//! Field normalization: grouped model spans -> typed OR form fields

use lazy_static::lazy_static;
use regex::Regex;

use crate::extraction::aggregate::CONTINUATION_MARKER;
use crate::extraction::dates::normalize_date;
use crate::extraction::prediction::FieldSpanGroups;
use crate::schema::{Medication, OrForm};

lazy_static! {
    static ref INT_RE: Regex = Regex::new(r"\d+").unwrap();
    static ref FLOAT_RE: Regex = Regex::new(r"\d+(\.\d+)?").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

const ANESTHESIA_TYPES: [&str; 5] = ["general", "spinal", "epidural", "local", "regional"];

const SPECIMEN_TYPES: [&str; 6] = ["pathology", "culture", "cytology", "frozen", "csf", "stone"];

/// Model labels for the six procedure timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeSlot {
    In,
    Out,
    Induction,
    Cutting,
    End,
    Dressing,
}

impl TimeSlot {
    const ALL: [TimeSlot; 6] = [
        Self::In,
        Self::Out,
        Self::Induction,
        Self::Cutting,
        Self::End,
        Self::Dressing,
    ];

    fn label(&self) -> &'static str {
        match self {
            Self::In => "TIME_IN",
            Self::Out => "TIME_OUT",
            Self::Induction => "TIME_INDUCTION",
            Self::Cutting => "TIME_CUTTING",
            Self::End => "TIME_END",
            Self::Dressing => "TIME_DRESSING",
        }
    }

    fn field<'a>(&self, form: &'a mut OrForm) -> &'a mut Option<String> {
        let times = &mut form.times;
        match self {
            Self::In => &mut times.in_room,
            Self::Out => &mut times.out_room,
            Self::Induction => &mut times.induction,
            Self::Cutting => &mut times.cutting,
            Self::End => &mut times.end_of_surgery,
            Self::Dressing => &mut times.dressing,
        }
    }
}

/// Fill `form` from model spans. Fields whose label is absent are untouched.
pub fn apply_model_spans(form: &mut OrForm, spans: &FieldSpanGroups) {
    if spans.contains("DATE") {
        let joined = join_clean(&spans.texts("DATE"));
        form.date = normalize_date(&joined);
        if form.date.is_none() && !joined.is_empty() {
            tracing::debug!("Could not parse date from {:?}", joined);
        }
    }

    for slot in TimeSlot::ALL {
        if spans.contains(slot.label()) {
            *slot.field(form) = non_empty(normalize_time(&join_clean(&spans.texts(slot.label()))));
        }
    }

    let personnel = &mut form.personnel;
    // A single model surgeon goes to the first slot; the rules decide slot 2.
    set_joined(spans, "PERSON_SURGEON", &mut personnel.surgeon_1);
    set_joined(spans, "PERSON_ANESTHETIST", &mut personnel.anesthetist);
    set_joined(spans, "PERSON_SCRUB", &mut personnel.scrub_nurse);
    set_joined(spans, "PERSON_CIRC", &mut personnel.circulating_nurse);
    set_joined(spans, "PERSON_TECH", &mut personnel.anesthesia_technician);

    set_joined(spans, "DIAG_PRE", &mut form.diagnosis.pre_op);
    set_joined(spans, "DIAG_POST", &mut form.diagnosis.post_op);
    set_joined(spans, "OP_NAME", &mut form.operation.name);
    set_joined(spans, "OP_CODE", &mut form.operation.code);

    let vitals = &mut form.vitals;
    set_first_int(spans, "BP_SYS", &mut vitals.bp_systolic);
    set_first_int(spans, "BP_DIA", &mut vitals.bp_diastolic);
    set_first_int(spans, "HR", &mut vitals.heart_rate);
    set_first_int(spans, "SPO2", &mut vitals.spo2);

    if spans.contains("ANES_TYPE") {
        let text = join_lower(spans, "ANES_TYPE");
        collect_keywords(&text, &ANESTHESIA_TYPES, &mut form.anesthesia.kinds);
    }

    if spans.contains("POSITION") {
        form.position = non_empty(join_lower(spans, "POSITION"));
    }

    if spans.contains("DEVICE") {
        let devices = join_lower(spans, "DEVICE");
        let flags = &mut form.devices;
        flags.foley |= devices.contains("foley");
        flags.foley_with_irrigation |= devices.contains("irrigation");
        flags.hemovac |= devices.contains("hemovac");
        flags.ng_tube |= devices.contains("ng") || devices.contains("ngt");
        flags.chest_tube |= devices.contains("chest");
    }

    if spans.contains("SPECIMEN") {
        form.specimen.sent = true;
        let text = join_lower(spans, "SPECIMEN");
        collect_keywords(&text, &SPECIMEN_TYPES, &mut form.specimen.kinds);
    }

    if spans.contains("CONDITION") {
        form.condition_post_op = non_empty(join_lower(spans, "CONDITION"));
    }

    if let Some(medication) = medication_from_spans(spans) {
        form.medications.push(medication);
    }
}

/// One medication entry from the DRUG/DOSE/UNIT groups
fn medication_from_spans(spans: &FieldSpanGroups) -> Option<Medication> {
    if !spans.contains("DRUG") {
        return None;
    }
    let name = join_clean(&spans.texts("DRUG"));
    if name.is_empty() {
        return None;
    }

    let dose = first_float(&join_clean(&spans.texts("DOSE")));
    let unit = join_clean(&spans.texts("UNIT"))
        .replace(CONTINUATION_MARKER, "")
        .trim()
        .to_string();

    Some(Medication {
        name,
        dose,
        unit: non_empty(unit),
    })
}

/// Join span texts with single spaces, dropping fragments with no letters or
/// digits (stray punctuation the model tagged).
pub fn join_clean<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(AsRef::as_ref)
        .filter(|w| w.chars().any(|c| c.is_ascii_alphanumeric()))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Light normalization of a spoken time: lower-case, `.` -> `:`, single spaces
pub fn normalize_time(text: &str) -> String {
    let lowered = text.trim().to_lowercase().replace('.', ":");
    WHITESPACE_RE.replace_all(&lowered, " ").into_owned()
}

pub fn first_int(text: &str) -> Option<u32> {
    INT_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

pub fn first_float(text: &str) -> Option<f64> {
    FLOAT_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn join_lower(spans: &FieldSpanGroups, label: &str) -> String {
    join_clean(&spans.texts(label)).to_lowercase()
}

fn set_joined(spans: &FieldSpanGroups, label: &str, field: &mut Option<String>) {
    if spans.contains(label) {
        *field = non_empty(join_clean(&spans.texts(label)));
    }
}

fn set_first_int(spans: &FieldSpanGroups, label: &str, field: &mut Option<u32>) {
    if spans.contains(label) {
        *field = first_int(&join_clean(&spans.texts(label)));
    }
}

fn collect_keywords(text: &str, vocabulary: &[&str], found: &mut Vec<String>) {
    for keyword in vocabulary {
        if text.contains(keyword) && !found.iter().any(|f| f == keyword) {
            found.push(keyword.to_string());
        }
    }
}
