//! Command implementations.

pub mod init;
pub mod models;
pub mod ocr;
pub mod projects;
pub mod serve;
pub mod stats;
pub mod texts;
