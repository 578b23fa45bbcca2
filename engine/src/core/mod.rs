//! Core object model and scene traversal

pub mod object;
pub mod scene;
