pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod metabolic;
pub mod narrative;
pub mod nutrition;
pub mod plan;
pub mod profile;
pub mod projection;
pub mod prompt;
pub mod session;
pub mod summary;
pub mod workout;
