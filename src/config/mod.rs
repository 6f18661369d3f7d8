//! Configuration for the lunch fund
//!
//! - Data directory resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::LunchPaths;
pub use settings::Settings;
