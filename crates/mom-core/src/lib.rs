//! MOM Core Library
//!
//! Capture, analysis and provider lookup for the MOM skin scan.

pub mod analysis;
pub mod capture;
pub mod config;
pub mod error;
pub mod geo;
pub mod locator;
pub mod notice;
pub mod report;
pub mod session;

pub use error::{MomError, MomResult};
