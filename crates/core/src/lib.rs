//! Core business logic for Tulay.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `workflow` - Status graphs, permission matrix and the workflow engine
//! - `tier` - Partner tier calculation

pub mod tier;
pub mod workflow;
