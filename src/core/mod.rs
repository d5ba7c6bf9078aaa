//! Core note model and storage

pub mod note;
pub mod store;
