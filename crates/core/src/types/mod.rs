//! Core type definitions for ShopSeeker.
//!
//! Broken down into submodules by the stage that produces them.

pub mod analysis;
pub mod image;
pub mod location;

pub use analysis::*;
pub use image::*;
pub use location::*;
