//! Full `run` command against a scripted service: artifacts on disk.

use super::test_utils::{passing_document, reference_html, thin_document, ScriptedProvider};
use bulletin::cli::{Commands, RunContext};
use bulletin::config::BulletinConfig;
use bulletin::error::PipelineError;
use bulletin::persist::content_digest;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const CREDENTIAL_VAR: &str = "BULLETIN_IT_PERSISTENCE_KEY";

fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("templates")).unwrap();
    std::fs::write(temp.path().join("templates/reference.html"), reference_html()).unwrap();
    temp
}

fn config() -> BulletinConfig {
    std::env::set_var(CREDENTIAL_VAR, "sk-integration");
    let mut config = BulletinConfig::default();
    config.provider.credential_env = CREDENTIAL_VAR.to_string();
    config.retry.delay_ms = 0;
    config
}

fn script(document: String) -> Vec<Result<String, bulletin::error::ServiceErrorKind>> {
    vec![
        Ok("hello".to_string()),
        Ok("analysis".to_string()),
        Ok(document),
    ]
}

fn body(path: &Path) -> (String, String) {
    let written = std::fs::read_to_string(path).unwrap();
    let (first, rest) = written.split_once('\n').unwrap();
    (first.to_string(), rest.to_string())
}

#[tokio::test]
async fn run_writes_document_and_summary() {
    let temp = workspace();
    let provider = Arc::new(ScriptedProvider::new(script(passing_document())));
    let context = RunContext::from_config(temp.path().to_path_buf(), config())
        .with_client(provider.clone());

    let output = context.execute(&Commands::Run).await.unwrap();
    assert!(output.contains("Validation passed"));

    let (marker, document) = body(&temp.path().join("generated-content.html"));
    assert!(marker.starts_with("<!-- Generated on: "));
    assert!(marker.ends_with(" -->"));
    assert_eq!(document, passing_document().trim());

    let summary = std::fs::read_to_string(temp.path().join("README.md")).unwrap();
    assert!(summary.contains("## Validation: passed"));
    assert!(summary.contains(&content_digest(passing_document().trim())));
    assert!(summary.contains("- **Model:** scripted-model"));
    assert!(!temp.path().join("error.log").exists());
}

#[tokio::test]
async fn rerun_changes_only_the_timestamp_line() {
    let temp = workspace();
    let path = temp.path().join("generated-content.html");

    let first = RunContext::from_config(temp.path().to_path_buf(), config())
        .with_client(Arc::new(ScriptedProvider::new(script(passing_document()))));
    first.execute(&Commands::Run).await.unwrap();
    let (_, first_body) = body(&path);

    let second = RunContext::from_config(temp.path().to_path_buf(), config())
        .with_client(Arc::new(ScriptedProvider::new(script(passing_document()))));
    second.execute(&Commands::Run).await.unwrap();
    let (_, second_body) = body(&path);

    assert_eq!(first_body, second_body);
}

#[tokio::test]
async fn degraded_run_still_publishes_with_warnings() {
    let temp = workspace();
    let mut config = config();
    config.retry.max_retries = 0;
    let context = RunContext::from_config(temp.path().to_path_buf(), config)
        .with_client(Arc::new(ScriptedProvider::new(script(thin_document()))));

    let output = context.execute(&Commands::Run).await.unwrap();
    assert!(output.contains("Accepted with warnings"));

    let summary = std::fs::read_to_string(temp.path().join("README.md")).unwrap();
    assert!(summary.contains("## Validation: accepted with warnings"));
    assert!(summary.contains("units below threshold (1/10)"));
}

#[tokio::test]
async fn strict_exhaustion_writes_nothing() {
    let temp = workspace();
    let context = RunContext::from_config(temp.path().to_path_buf(), config())
        .with_policy(Some("strict"))
        .unwrap()
        .with_client(Arc::new(ScriptedProvider::new(vec![
            Ok("hello".to_string()),
            Ok("a".to_string()),
            Ok(thin_document()),
            Ok("b".to_string()),
            Ok(thin_document()),
            Ok("c".to_string()),
            Ok(thin_document()),
        ])));

    let err = context.execute(&Commands::Run).await.unwrap_err();
    assert!(matches!(err, PipelineError::Validation { .. }));
    assert!(!temp.path().join("generated-content.html").exists());
}

#[tokio::test]
async fn missing_reference_fails_before_any_request() {
    let temp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(script(passing_document())));
    let context = RunContext::from_config(temp.path().to_path_buf(), config())
        .with_client(provider.clone());

    let err = context.execute(&Commands::Run).await.unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(_)));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn output_paths_are_configurable() {
    let temp = workspace();
    let mut config = config();
    config.output.document = "public/bulletin.html".into();
    config.output.summary = "public/SUMMARY.md".into();
    let context = RunContext::from_config(temp.path().to_path_buf(), config)
        .with_client(Arc::new(ScriptedProvider::new(script(passing_document()))));

    context.execute(&Commands::Run).await.unwrap();
    assert!(temp.path().join("public/bulletin.html").exists());
    assert!(temp.path().join("public/SUMMARY.md").exists());
}

#[tokio::test]
async fn archive_dir_publishes_monthly_copy_and_index() {
    let temp = workspace();
    let mut config = config();
    config.output.archive_dir = Some("docs".into());
    config.output.archive_prefix = "trade_news".to_string();
    let context = RunContext::from_config(temp.path().to_path_buf(), config)
        .with_client(Arc::new(ScriptedProvider::new(script(passing_document()))));

    let output = context.execute(&Commands::Run).await.unwrap();

    let index = temp.path().join("docs/index.html");
    assert!(output.contains(&index.display().to_string()));
    let archived: Vec<_> = std::fs::read_dir(temp.path().join("docs"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name != "index.html")
        .collect();
    assert_eq!(archived.len(), 1);
    let name = &archived[0];
    assert!(name.starts_with("trade_news_"), "{name}");
    assert!(name.ends_with(".html"), "{name}");
    assert_eq!(name.len(), "trade_news_YYYYMM.html".len());

    let primary = std::fs::read_to_string(temp.path().join("generated-content.html")).unwrap();
    assert_eq!(std::fs::read_to_string(&index).unwrap(), primary);
    assert_eq!(
        std::fs::read_to_string(temp.path().join("docs").join(name)).unwrap(),
        primary
    );
}

#[tokio::test]
async fn summary_usage_names_configured_document() {
    let temp = workspace();
    let mut config = config();
    config.output.document = "site/weekly.html".into();
    let context = RunContext::from_config(temp.path().to_path_buf(), config)
        .with_client(Arc::new(ScriptedProvider::new(script(passing_document()))));

    context.execute(&Commands::Run).await.unwrap();
    let summary = std::fs::read_to_string(temp.path().join("README.md")).unwrap();
    assert!(summary.contains("1. Open `weekly.html` and copy its contents."));
    assert!(!summary.contains("generated-content.html"));
}
