// crates/strongbox-config/src/lib.rs
// ============================================================================
// Module: Strongbox Config Library
// Description: Canonical config model, physical options, and validation.
// Purpose: Single source of truth for strongbox.toml semantics.
// Dependencies: strongbox-core, strongbox-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `strongbox-config` defines the `strongbox.toml` model and turns its loose
//! storage options into the typed configuration the table backend consumes.
//! Validation is strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;
pub mod physical;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
pub use physical::PhysicalOptions;
