pub mod achievements;
pub mod config;
pub mod session;
pub mod stats;
