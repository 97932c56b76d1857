//! Service construction tests for resultsdb-config.
// resultsdb-config/tests/service_builder.rs
// =============================================================================
// Module: Service Builder Tests
// Description: Turning validated configuration into a working service.
// Purpose: Ensure options, account context, and sinks follow the config.
// =============================================================================

use std::fs;
use std::net::TcpListener;

use resultsdb_config::ConfigError;
use resultsdb_config::ResultsDbConfig;
use resultsdb_config::account_context;
use resultsdb_config::build_local_service;
use resultsdb_config::build_service;
use resultsdb_config::http_client_config;
use resultsdb_config::service_options;
use resultsdb_core::ExperimentDraft;
use resultsdb_core::ExperimentId;
use resultsdb_core::LocalZone;
use serde_json::Value;

type TestResult = Result<(), String>;

fn parse(content: &str) -> Result<ResultsDbConfig, String> {
    ResultsDbConfig::from_toml_str(content).map_err(|err| err.to_string())
}

#[test]
fn options_and_account_follow_config() -> TestResult {
    let config = parse(
        "[account]\nhub = \"h\"\ngroup = \"g\"\n\n[service]\nprompt_for_delete = false\n\
         utc_offset = \"+02:00\"\npreferences = { auto_save = true, theme = \"dark\" }\n",
    )?;
    let options = service_options(&config).map_err(|err| err.to_string())?;
    assert!(!options.prompt_for_delete);
    assert_eq!(options.zone, LocalZone::parse_offset("+02:00").map_err(|err| err.to_string())?);

    let account = account_context(&config).map_err(|err| err.to_string())?;
    assert_eq!(account.hub.as_deref(), Some("h"));
    assert_eq!(account.group.as_deref(), Some("g"));
    assert_eq!(account.project, None);
    assert_eq!(account.preferences.get("auto_save"), Some(&Value::Bool(true)));
    assert_eq!(account.preferences.get("theme"), Some(&Value::String("dark".to_string())));
    Ok(())
}

#[test]
fn http_settings_map_onto_transport_config() -> TestResult {
    let config = parse(
        "[account]\nurl = \"https://host.example\"\nverify = false\n\n[http]\ntimeout_ms = 1500\n\
         max_response_bytes = 4096\nuser_agent = \"agent/1\"\n",
    )?;
    let http = http_client_config(&config, Some("access".to_string()));
    assert_eq!(http.base_url, "https://host.example/resultsdb");
    assert_eq!(http.access_token.as_deref(), Some("access"));
    assert_eq!(http.timeout_ms, 1500);
    assert_eq!(http.max_response_bytes, 4096);
    assert_eq!(http.user_agent, "agent/1");
    assert!(!http.verify);
    Ok(())
}

#[test]
fn local_service_writes_events_to_configured_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let log_path = dir.path().join("events.log");
    let config = parse(&format!(
        "[account]\nlocal = true\n\n[service]\nutc_offset = \"+00:00\"\n\n[logging]\n\
         level = \"info\"\nfile = '{}'\n",
        log_path.display()
    ))?;
    let service = build_local_service(&config).map_err(|err| err.to_string())?;
    let mut draft = ExperimentDraft::new("Rabi", "backend-a");
    draft.experiment_id = Some(ExperimentId::new("0c4e1b9a-5a2f-4d3e-9f61-6f0a2b9d7c11"));
    let id = service.create_experiment(&draft).map_err(|err| err.to_string())?;
    assert_eq!(id.as_str(), "0c4e1b9a-5a2f-4d3e-9f61-6f0a2b9d7c11");

    let log = fs::read_to_string(&log_path).map_err(|err| err.to_string())?;
    assert!(log.contains("experiment_created"), "{log}");
    Ok(())
}

#[test]
fn remote_build_rejects_local_mode() -> TestResult {
    let config = parse("[account]\nlocal = true\ntoken = \"abc\"\n")?;
    match build_service(&config) {
        Err(ConfigError::Invalid(message)) => {
            assert!(message.contains("account.local"), "{message}");
            Ok(())
        }
        Err(other) => Err(format!("unexpected error: {other}")),
        Ok(_) => Err("expected local mode rejection".to_string()),
    }
}

#[test]
fn failed_login_surfaces_as_client_error() -> TestResult {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;
    drop(listener);
    let config = parse(&format!(
        "[account]\nurl = \"http://{addr}\"\ntoken = \"abc\"\n\n[http]\ntimeout_ms = 2000\n\n\
         [logging]\nlevel = \"critical\"\n"
    ))?;
    match build_service(&config) {
        Err(ConfigError::Client(_)) => Ok(()),
        Err(other) => Err(format!("unexpected error: {other}")),
        Ok(_) => Err("expected login failure".to_string()),
    }
}
