//! CLI command implementations.

pub mod dashboard;
pub mod init;
pub mod lifecycle;
pub mod reset;
pub mod route;
pub mod settings;
pub mod status;
pub mod validate;
