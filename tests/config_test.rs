use dftable::config::{AppConfig, ConfigManager, Theme};
use dftable::App;
use ratatui::style::Color;
use std::fs;
use tempfile::TempDir;

fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");
    assert!(config.file_loading.delimiter.is_none());
    assert!(config.display.row_labels);
    assert!(config.display.alternate_rows);
    assert!(config.display.toolbar);
    assert_eq!(config.display.cell_padding, 1);
    assert_eq!(config.clean.fill_method, "");
    assert_eq!(config.clean.drop_how, "any");
    assert!(config.clean.limit_gaps);
    assert_eq!(config.theme.colors.primary, "cyan");
    assert_eq!(config.theme.colors.alternate_row, "indexed(234)");
    assert!(!config.debug.enabled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_generate_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let template = config_manager.generate_default_config();

    assert!(template.contains("version = \"0.1\""));
    for section in ["[file_loading]", "[display]", "[clean]", "[theme.colors]", "[debug]"] {
        assert!(template.contains(section), "missing {}", section);
    }
}

#[test]
fn test_default_template_parses_to_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.write_default_config(false).unwrap();

    let config = AppConfig::load_from(&config_manager).unwrap();
    let default = AppConfig::default();
    assert_eq!(config.display.cell_padding, default.display.cell_padding);
    assert_eq!(config.theme.colors.selection, default.theme.colors.selection);
}

#[test]
fn test_write_default_config_requires_force() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config_path = config_manager
        .write_default_config(false)
        .expect("Failed to write config");
    assert!(config_path.exists());

    let err = config_manager.write_default_config(false).unwrap_err();
    assert!(err.to_string().contains("--force"));

    fs::write(&config_path, "version = \"0.1\"\n").unwrap();
    config_manager.write_default_config(true).unwrap();
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[display]"));
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.clean.drop_how, "any");
    assert!(config.display.toolbar);
}

#[test]
fn test_partial_config_overrides_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().unwrap();
    fs::write(
        config_manager.config_path("config.toml"),
        r##"
version = "0.1"

[file_loading]
delimiter = 59

[display]
toolbar = false

[clean]
fill_method = "ffill"

[theme.colors]
primary = "#ff0000"
"##,
    )
    .unwrap();

    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.file_loading.delimiter, Some(b';'));
    assert!(!config.display.toolbar);
    assert!(config.display.row_labels);
    assert_eq!(config.clean.fill_method, "ffill");
    assert_eq!(config.clean.drop_how, "any");
    assert_eq!(config.theme.colors.primary, "#ff0000");
    assert_eq!(config.theme.colors.secondary, "yellow");
}

#[test]
fn test_invalid_values_are_rejected() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().unwrap();
    let path = config_manager.config_path("config.toml");

    fs::write(&path, "[clean]\nfill_method = \"mean\"\n").unwrap();
    let err = AppConfig::load_from(&config_manager).unwrap_err();
    assert!(err.to_string().contains("fill_method"));

    fs::write(&path, "[clean]\ndrop_how = \"some\"\n").unwrap();
    assert!(AppConfig::load_from(&config_manager).is_err());

    fs::write(&path, "version = \"9.0\"\n").unwrap();
    assert!(AppConfig::load_from(&config_manager).is_err());
}

#[test]
fn test_malformed_toml_reports_path() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().unwrap();
    let path = config_manager.config_path("config.toml");
    fs::write(&path, "[display\nrow_labels = ").unwrap();

    let err = AppConfig::load_from(&config_manager).unwrap_err();
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn test_merge_keeps_unset_fields() {
    let mut base = AppConfig::default();
    let mut other = AppConfig::default();
    other.display.cell_padding = 3;
    other.file_loading.skip_rows = Some(2);
    base.merge(other);

    assert_eq!(base.display.cell_padding, 3);
    assert_eq!(base.file_loading.skip_rows, Some(2));
    assert!(base.display.row_labels);
}

#[test]
fn test_theme_from_default_config() {
    let config = AppConfig::default();
    let theme = Theme::from_config(&config.theme).expect("default theme");
    assert!(theme.get_optional("selection").is_some());
    assert!(theme.get_optional("no_such_color").is_none());
    assert_eq!(theme.get("no_such_color"), Color::Reset);
}

#[test]
fn test_app_with_configured_clean_defaults() {
    let mut config = AppConfig::default();
    config.clean.fill_method = "bfill".to_string();
    let theme = Theme::from_config(&config.theme).unwrap();
    let app = App::new_with_config(theme, config).unwrap();
    assert_eq!(app.widget.model.row_count(), 10);
}

#[test]
fn test_app_rejects_unknown_fill_method() {
    let mut config = AppConfig::default();
    config.clean.fill_method = "mean".to_string();
    let theme = Theme::from_config(&config.theme).unwrap();
    assert!(App::new_with_config(theme, config).is_err());
}
