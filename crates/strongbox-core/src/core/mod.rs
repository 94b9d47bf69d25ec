// crates/strongbox-core/src/core/mod.rs
// ============================================================================
// Module: Strongbox Core Types
// Description: Stored entries, prefix listing, and lease options.
// Purpose: Provide the value types shared by every backend and request path.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types describe what a backend stores ([`Entry`]), how a flat key
//! namespace is presented as directories ([`listing`]), and how renewable
//! credentials carry their lease data ([`lease`]).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod entry;
pub mod lease;
pub mod listing;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use entry::Entry;
pub use entry::MAX_KEY_BYTES;
pub use entry::validate_key;
pub use lease::Auth;
pub use lease::LeaseContext;
pub use lease::LeaseError;
pub use lease::LeaseExtender;
pub use lease::LeaseOptions;
pub use lease::Request;
pub use lease::Response;
pub use lease::Secret;
pub use listing::PATH_SEPARATOR;
pub use listing::collapse_listing;
