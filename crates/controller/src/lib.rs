#![deny(unused)]
//! Session control for ShopSeeker.
//!
//! This crate provides the session state machine and the controller that
//! runs searches against the analysis client.

pub mod builder;
pub mod controller;
pub mod session;

pub use builder::SearchControllerBuilder;
pub use controller::SearchController;
pub use session::{AppStatus, SearchSession, SearchTicket, SessionState, GENERIC_FAILURE};
