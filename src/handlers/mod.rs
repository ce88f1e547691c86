//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `upload` - Upload proxy: forwards a multipart file to the vendor
//! - `clone` - Clone proxy: forwards a voice-clone request to the vendor

pub mod api;
pub mod clone;
pub mod upload;
