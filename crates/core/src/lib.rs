#![deny(unused)]
//! Core types, traits, and error definitions for ShopSeeker.
//!
//! This crate provides the building blocks shared by the ingestion,
//! analysis, and session layers.

pub mod config;
pub mod error;
pub mod mocks;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::*;
pub use types::*;
