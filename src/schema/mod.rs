//! Schema module for orform
//!
//! The fixed-schema OR form produced by one extraction call.

mod form;

pub use form::{
    Anesthesia, Devices, Diagnosis, Medication, Operation, OrForm, Personnel, Specimen, Times,
    Vitals,
};
