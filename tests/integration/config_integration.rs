//! Integration tests for configuration layering

use super::test_utils::with_xdg_env;
use bulletin::config::{global_config_path, BulletinConfig, ConfigLoader};
use bulletin::orchestrator::{AcceptancePolicy, OrchestratorConfig};
use std::path::PathBuf;
use tempfile::TempDir;

fn write(path: PathBuf, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

#[test]
fn test_defaults_without_any_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = with_xdg_env(&temp_dir, || ConfigLoader::load(temp_dir.path())).unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.stages.synthesize.max_tokens, 12000);
    assert_eq!(config.retry.policy, AcceptancePolicy::BestEffort);
    assert_eq!(config.prompts.reference, PathBuf::from("templates/reference.html"));
}

#[test]
fn test_global_file_is_read_from_xdg_config_home() {
    let temp_dir = TempDir::new().unwrap();
    let config = with_xdg_env(&temp_dir, || {
        let path = global_config_path().unwrap();
        assert_eq!(path, temp_dir.path().join("xdg/bulletin/config.toml"));
        write(path, "[provider]\nmodel = \"global-model\"\n");
        ConfigLoader::load(temp_dir.path())
    })
    .unwrap();

    assert_eq!(config.provider.model, "global-model");
}

#[test]
fn test_workspace_overrides_global() {
    let temp_dir = TempDir::new().unwrap();
    let config = with_xdg_env(&temp_dir, || {
        write(
            global_config_path().unwrap(),
            "[provider]\nmodel = \"global-model\"\n\n[validation]\nmin_links = 3\n",
        );
        write(
            temp_dir.path().join("config/config.toml"),
            "[provider]\nmodel = \"workspace-model\"\n",
        );
        ConfigLoader::load(temp_dir.path())
    })
    .unwrap();

    assert_eq!(config.provider.model, "workspace-model");
    // Keys the workspace does not mention keep the global value
    assert_eq!(config.validation.min_links, 3);
}

#[test]
fn test_environment_specific_file_and_env_override() {
    let temp_dir = TempDir::new().unwrap();
    let config = with_xdg_env(&temp_dir, || {
        write(
            temp_dir.path().join("config/config.toml"),
            "[retry]\nmax_retries = 4\n",
        );
        write(
            temp_dir.path().join("config/production.toml"),
            "[retry]\npolicy = \"strict\"\n",
        );
        std::env::set_var("BULLETIN_ENV", "production");
        std::env::set_var("BULLETIN__RETRY__DELAY_MS", "250");
        let loaded = ConfigLoader::load(temp_dir.path());
        std::env::remove_var("BULLETIN_ENV");
        std::env::remove_var("BULLETIN__RETRY__DELAY_MS");
        loaded
    })
    .unwrap();

    assert_eq!(config.retry.max_retries, 4);
    assert_eq!(config.retry.policy, AcceptancePolicy::Strict);
    assert_eq!(config.retry.delay_ms, 250);
}

#[test]
fn test_invalid_values_are_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("bad.toml");
    std::fs::write(
        &config_file,
        "[retry]\nmax_retries = 50\n\n[output]\ndocument = \"same.md\"\nsummary = \"same.md\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
}

#[test]
fn test_unknown_policy_fails_to_load() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("bad.toml");
    std::fs::write(&config_file, "[retry]\npolicy = \"sometimes\"\n").unwrap();

    assert!(ConfigLoader::load_from_file(&config_file).is_err());
}

#[test]
fn test_orchestrator_config_follows_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("bulletin.toml");
    std::fs::write(
        &config_file,
        r#"
[provider]
credential_prefix = "key-"

[content]
title = "Weekly Trade Brief"
sections = ["Overview", "Markets"]

[validation]
min_sections = 2
"#,
    )
    .unwrap();

    let config: BulletinConfig = ConfigLoader::load_from_file(&config_file).unwrap();
    let orchestrator = OrchestratorConfig::from(&config);
    assert_eq!(orchestrator.credential_prefix, "key-");
    assert_eq!(orchestrator.requirements.title, "Weekly Trade Brief");
    assert_eq!(orchestrator.requirements.sections.len(), 2);
    assert_eq!(orchestrator.validation.min_sections, 2);
    assert_eq!(orchestrator.stages.learn.timeout_secs, 60);
}
