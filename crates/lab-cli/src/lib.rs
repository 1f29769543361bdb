//! Command-line front end for lab harmonization.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
pub mod types;
