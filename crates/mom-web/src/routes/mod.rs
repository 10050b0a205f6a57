//! Route handlers.

pub mod dashboard;
pub mod providers;
pub mod scans;
