// resultsdb-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `resultsdb.toml`. The example validates as-is; the token
//! is left to `RESULTSDB_TOKEN`.

/// Returns a canonical example `resultsdb.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[account]
url = "https://api.quantum-computing.ibm.com"
# token = "<api token>"
hub = "ibm-q"
group = "open"
project = "main"
verify = true
local = false

[http]
timeout_ms = 30000
max_response_bytes = 33554432
user_agent = "resultsdb-client/0.1"

[service]
prompt_for_delete = true
utc_offset = "+00:00"
preferences = { auto_save = false }

[logging]
level = "warning"
# file = "resultsdb.log"
"#,
    )
}
