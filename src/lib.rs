//! Scrivener - OCR and retrieval backend for scanned and handwritten notes.
//!
//! Images go through an escalating chain of OCR providers, the accepted
//! text is embedded and stored in SQLite, and stored texts can be searched,
//! ranked by similarity, summarized and grouped into projects.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
pub mod similarity;
