#![deny(unsafe_code)]

//! Reference tables and rule vocabulary for lab harmonization.

pub mod csv_utils;
pub mod error;
pub mod loaders;
pub mod vocabulary;

pub use crate::error::{Result, StandardsError};
pub use crate::loaders::{
    ReferenceTablePaths, load_cross_system, load_dosage_units, load_equivalent_labels,
    load_plausible_ranges, load_reference_tables,
};
pub use crate::vocabulary::{default_vocabulary, default_vocabulary_source, load_vocabulary};
