use rollcall_core::{ConfigError, RollcallConfig, StatusPolicy};
use std::io::Write;
use std::path::PathBuf;

#[test]
fn empty_file_yields_defaults() {
    let config = RollcallConfig::from_toml_str("").unwrap();
    assert_eq!(config, RollcallConfig::default());
    assert_eq!(config.status, StatusPolicy::default());
    assert_eq!(config.status.window_sessions, 4);
    assert_eq!(config.reports.low_attendance_percent, 50);
    assert_eq!(config.reports.recent_sessions, 10);
    assert_eq!(config.contact.default_country_code, "55");
    assert_eq!(config.effective_log_level(), rollcall_core::default_log_level());
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let config = RollcallConfig::from_toml_str(
        r#"
        log_level = "warn"
        database_path = "/var/lib/rollcall/rollcall.db"

        [status]
        active_min_percent = 80

        [reports]
        recent_sessions = 5
        "#,
    )
    .unwrap();

    assert_eq!(config.effective_log_level(), "warn");
    assert_eq!(
        config.database_path,
        Some(PathBuf::from("/var/lib/rollcall/rollcall.db"))
    );
    assert_eq!(config.status.active_min_percent, 80);
    assert_eq!(config.status.at_risk_min_percent, 50);
    assert_eq!(config.status.window_sessions, 4);
    assert_eq!(config.reports.recent_sessions, 5);
    assert_eq!(config.reports.low_attendance_percent, 50);
}

#[test]
fn inconsistent_thresholds_are_rejected() {
    let err = RollcallConfig::from_toml_str(
        "[status]\nactive_min_percent = 40\nat_risk_min_percent = 60\n",
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = RollcallConfig::from_toml_str("[status]\nwindow_sessions = 0\n").unwrap_err();
    assert!(err.to_string().contains("window_sessions"));

    let err = RollcallConfig::from_toml_str("[contact]\ndefault_country_code = \"+55\"\n")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = RollcallConfig::from_toml_str("[status\nwindow_sessions = 4").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));

    let err = RollcallConfig::from_toml_str("[status]\nwindow_sessions = \"four\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn load_reads_file_and_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rollcall.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[reports]\nlow_attendance_percent = 40").unwrap();
    drop(file);

    let config = RollcallConfig::load(&path).unwrap();
    assert_eq!(config.reports.low_attendance_percent, 40);

    let err = RollcallConfig::load(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
