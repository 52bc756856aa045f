//! Model back-end module for orform
//!
//! Token-classification back-ends behind one trait, resolved by name through
//! a registry built at startup.

mod client;
mod remote;
mod rules_only;

pub use client::{
    ClassifierConstructor, Extractor, ModelInfo, ModelRegistry, ModelValidation, TokenClassifier,
};
pub use remote::RemoteClassifier;
pub use rules_only::RulesOnlyClassifier;
