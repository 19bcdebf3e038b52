//! Configuration loading and runtime patching.

use layerkit::{Config, ConfigPatch, Document, Kernel, LayerkitError, PlatformCapabilities};
use std::io::Write;

#[test]
fn loads_config_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
closeOnOverlayClick = false
maxToasts = 5
safeMode = false
toastExitDelay = 0

[shortcuts]
closeKey = "q"
dismissToastsKey = "x"
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert!(!config.close_on_overlay_click);
    assert_eq!(config.max_toasts, 5);
    assert!(!config.safe_mode);
    assert_eq!(config.toast_exit_delay, 0);
    assert_eq!(config.shortcuts.close_key, "q");
    assert_eq!(config.shortcuts.dismiss_toasts_key.as_deref(), Some("x"));
    assert!(config.close_on_escape);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, LayerkitError::Io(_)));
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = Config::from_toml_str("maxToasts = \"many\"").unwrap_err();
    assert!(matches!(err, LayerkitError::Config(_)));
}

#[test]
fn set_config_merges_nested_shortcuts() {
    let mut config = Config::default();
    config.shortcuts.dismiss_toasts_key = Some("x".to_string());
    let mut kernel = Kernel::new(config, PlatformCapabilities::browser(), Document::new());

    kernel.set_config(ConfigPatch::from_json(r#"{"shortcuts": {"closeKey": "q"}, "maxToasts": 2}"#).unwrap());

    let merged = kernel.get_config();
    assert_eq!(merged.shortcuts.close_key, "q");
    assert_eq!(merged.shortcuts.dismiss_toasts_key.as_deref(), Some("x"));
    assert_eq!(merged.max_toasts, 2);
    assert!(merged.close_on_escape);
}

#[test]
fn config_round_trips_through_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let mut config = Config::default();
    config.batch_updates = true;
    config.trace_level = Some("debug".to_string());
    config.shortcuts.close_key = "q".to_string();

    file.write_all(config.to_toml_string().unwrap().as_bytes()).unwrap();
    assert_eq!(Config::from_file(file.path()).unwrap(), config);
}

#[test]
fn disabling_history_stops_recording() {
    let mut kernel = Kernel::new(Config::default(), PlatformCapabilities::browser(), Document::new());
    kernel.show_toast("a", layerkit::ToastKind::Info, None);
    assert_eq!(kernel.get_history().len(), 1);

    kernel.set_config(ConfigPatch::from_json(r#"{"stateHistorySize": 0}"#).unwrap());
    kernel.show_toast("b", layerkit::ToastKind::Info, None);
    assert!(kernel.get_history().is_empty());
    assert!(kernel.history_json().unwrap().starts_with('['));
}
