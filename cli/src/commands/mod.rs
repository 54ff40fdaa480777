//! Command implementations

pub mod check;
pub mod deploy;
pub mod urls;
pub mod version;
pub mod wait;
