//! Core traits for ShopSeeker.
//!
//! - `analyzer`: the remote image analysis seam (ImageAnalyzer)
//! - `location`: the device position seam (LocationProvider)

pub mod analyzer;
pub mod location;

pub use analyzer::*;
pub use location::*;
