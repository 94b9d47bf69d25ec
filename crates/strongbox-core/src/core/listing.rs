// crates/strongbox-core/src/core/listing.rs
// ============================================================================
// Module: Strongbox Prefix Listing
// Description: Directory-style listing over a flat key namespace.
// Purpose: Share one collapse/dedup/sort rule across every backend.
// Dependencies: Standard library.
// ============================================================================

//! ## Overview
//! Backends store flat keys such as `a/d/e`. Listing a prefix presents the
//! keys beneath it one level deep: leaf names are returned as-is and deeper
//! keys collapse into their first segment followed by [`PATH_SEPARATOR`].
//!
//! ```
//! use strongbox_core::collapse_listing;
//!
//! let keys = ["a/b", "a/c", "a/d/e"];
//! assert_eq!(collapse_listing("a/", keys), vec!["b", "c", "d/"]);
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

// ============================================================================
// SECTION: Listing
// ============================================================================

/// Separator between key path segments.
pub const PATH_SEPARATOR: char = '/';

/// Collapses keys under `prefix` into a sorted, deduplicated directory listing.
///
/// Keys that do not start with `prefix` are ignored, so callers may pass an
/// unfiltered scan.
#[must_use]
pub fn collapse_listing<I, K>(prefix: &str, keys: I) -> Vec<String>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    let mut listing = BTreeSet::new();
    for key in keys {
        let Some(remainder) = key.as_ref().strip_prefix(prefix) else {
            continue;
        };
        match remainder.find(PATH_SEPARATOR) {
            None => {
                listing.insert(remainder.to_string());
            }
            Some(index) => {
                listing.insert(remainder[..= index].to_string());
            }
        }
    }
    listing.into_iter().collect()
}
