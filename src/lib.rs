//! Chapter reader core for a serialized-novel book API: table of contents
//! and batched chapter downloads, viewport pagination, and a bounded window
//! of virtual sections over the chapter list.

pub mod bridge;
pub mod chapter_store;
pub mod cli;
pub mod config;
pub mod models;
pub mod net;
pub mod normalizer;
pub mod pagination;
pub mod reader;
pub mod terminal;
