#![deny(unused)]
//! Input side of ShopSeeker.
//!
//! This crate turns what the user and the device provide into values the
//! session can use: encoded images and the best-effort device location.

pub mod location;
pub mod vision;

pub use location::{
    provider_from_config, FixedLocation, IpGeolocation, LocationHandle, NoLocation,
};
pub use vision::{inspect, sniff_media_type, ImageInfo, ImageIngestor};
