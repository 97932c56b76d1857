//! Config load validation tests for resultsdb-config.
// resultsdb-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards and section validation.
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use resultsdb_config::ConfigError;
use resultsdb_config::DEFAULT_ACCOUNT_URL;
use resultsdb_config::ResultsDbConfig;
use resultsdb_config::config_toml_example;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<ResultsDbConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn load_text(content: &str) -> Result<ResultsDbConfig, ConfigError> {
    let mut file = NamedTempFile::new().map_err(|err| ConfigError::Io(err.to_string()))?;
    file.write_all(content.as_bytes()).map_err(|err| ConfigError::Io(err.to_string()))?;
    ResultsDbConfig::load(Some(file.path()))
}

// ============================================================================
// SECTION: Load Guards
// ============================================================================

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(ResultsDbConfig::load(Some(path)), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(ResultsDbConfig::load(Some(path)), "config path component too long")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(ResultsDbConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(ResultsDbConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_reports_missing_file_as_io() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let missing = dir.path().join("absent.toml");
    assert_invalid(ResultsDbConfig::load(Some(&missing)), "config io error")
}

#[test]
fn load_reports_malformed_toml() -> TestResult {
    assert_invalid(load_text("[account\nurl = 1"), "config parse error")
}

// ============================================================================
// SECTION: Defaults and Example
// ============================================================================

#[test]
fn empty_file_uses_defaults() -> TestResult {
    let config = load_text("").map_err(|err| err.to_string())?;
    assert_eq!(config.account.url, DEFAULT_ACCOUNT_URL);
    assert_eq!(config.account.token, None);
    assert!(config.account.verify);
    assert!(!config.account.local);
    assert_eq!(config.http.timeout_ms, 30_000);
    assert_eq!(config.http.max_response_bytes, 32 * 1024 * 1024);
    assert!(config.service.prompt_for_delete);
    assert_eq!(config.service.utc_offset, None);
    let preferences = config.service.preferences_json().map_err(|err| err.to_string())?;
    assert_eq!(preferences.get("auto_save"), Some(&serde_json::Value::Bool(false)));
    assert_eq!(config.logging.level, None);
    Ok(())
}

#[test]
fn example_config_validates() -> TestResult {
    let config = load_text(&config_toml_example()).map_err(|err| err.to_string())?;
    assert_eq!(config.account.hub.as_deref(), Some("ibm-q"));
    assert_eq!(config.account.project.as_deref(), Some("main"));
    assert_eq!(config.logging.level.as_deref(), Some("warning"));
    Ok(())
}

#[test]
fn derived_urls_ignore_trailing_slash() -> TestResult {
    let config = ResultsDbConfig::from_toml_str("[account]\nurl = \"https://host.example/\"\n")
        .map_err(|err| err.to_string())?;
    assert_eq!(config.account.database_url(), "https://host.example/resultsdb");
    assert_eq!(config.account.login_url(), "https://host.example/v2/users/loginWithToken");
    Ok(())
}

// ============================================================================
// SECTION: Section Validation
// ============================================================================

#[test]
fn group_without_hub_is_rejected() -> TestResult {
    assert_invalid(
        ResultsDbConfig::from_toml_str("[account]\ngroup = \"open\"\n"),
        "If group is specified, hub must also be specified.",
    )
}

#[test]
fn project_without_group_is_rejected() -> TestResult {
    assert_invalid(
        ResultsDbConfig::from_toml_str("[account]\nhub = \"h\"\nproject = \"p\"\n"),
        "If project is specified, group and hub must also be specified.",
    )
}

#[test]
fn non_http_url_is_rejected() -> TestResult {
    assert_invalid(
        ResultsDbConfig::from_toml_str("[account]\nurl = \"ftp://host\"\n"),
        "account.url must be an http(s) url",
    )
}

#[test]
fn token_with_whitespace_is_rejected() -> TestResult {
    assert_invalid(
        ResultsDbConfig::from_toml_str("[account]\ntoken = \"abc def\"\n"),
        "account.token must not contain whitespace",
    )
}

#[test]
fn timeout_out_of_range_is_rejected() -> TestResult {
    assert_invalid(ResultsDbConfig::from_toml_str("[http]\ntimeout_ms = 50\n"), "http.timeout_ms")?;
    assert_invalid(
        ResultsDbConfig::from_toml_str("[http]\ntimeout_ms = 300001\n"),
        "http.timeout_ms",
    )
}

#[test]
fn zero_response_cap_is_rejected() -> TestResult {
    assert_invalid(
        ResultsDbConfig::from_toml_str("[http]\nmax_response_bytes = 0\n"),
        "http.max_response_bytes",
    )
}

#[test]
fn malformed_utc_offset_is_rejected() -> TestResult {
    assert_invalid(
        ResultsDbConfig::from_toml_str("[service]\nutc_offset = \"two hours\"\n"),
        "service.utc_offset",
    )
}

#[test]
fn unknown_log_level_is_rejected() -> TestResult {
    assert_invalid(
        ResultsDbConfig::from_toml_str("[logging]\nlevel = \"chatty\"\n"),
        "logging.level",
    )
}

#[test]
fn log_level_is_case_insensitive() -> TestResult {
    let config = ResultsDbConfig::from_toml_str("[logging]\nlevel = \"DEBUG\"\n")
        .map_err(|err| err.to_string())?;
    assert_eq!(config.logging.level.as_deref(), Some("DEBUG"));
    Ok(())
}
