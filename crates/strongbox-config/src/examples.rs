// crates/strongbox-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for Strongbox configuration. The output is static and
//! must keep parsing under [`StrongboxConfig::from_bytes`](crate::StrongboxConfig::from_bytes).

/// Returns a canonical example `strongbox.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[storage]
backend = "sqlite"

[storage.options]
path = "/var/lib/strongbox"
database = "Vault"
schema = "main"
table = "Vault"
appname = "Vault"
max_parallel = "128"
"connection timeout" = "30"
"log level" = "0"
# connection_url = "file:/var/lib/strongbox/Vault.db?mode=rwc"

[lease]
max_offset_secs = 2764800
"#,
    )
}
