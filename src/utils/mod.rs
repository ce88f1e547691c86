//! Utility modules

pub mod url_validation;
