//! End-to-end orchestration against a scripted service.

use super::test_utils::{passing_document, reference_html, thin_document, ScriptedProvider};
use bulletin::config::BulletinConfig;
use bulletin::error::{PipelineError, ServiceErrorKind};
use bulletin::orchestrator::{
    Acceptance, AcceptancePolicy, NoopProgress, OrchestratorConfig, PipelineInputs,
    PipelineState, RetryOrchestrator,
};
use bulletin::profile::ReferenceDocument;
use bulletin::prompts::{DEFAULT_ANALYSIS_INSTRUCTIONS, DEFAULT_GENERATION_INSTRUCTIONS};
use std::sync::Arc;

fn inputs() -> PipelineInputs {
    PipelineInputs {
        reference: ReferenceDocument::new(reference_html()),
        analysis_instructions: DEFAULT_ANALYSIS_INSTRUCTIONS.to_string(),
        generation_instructions: DEFAULT_GENERATION_INSTRUCTIONS.to_string(),
        period_label: "Week 42 of 2026".to_string(),
    }
}

fn config(max_retries: usize, policy: AcceptancePolicy) -> OrchestratorConfig {
    let mut config = BulletinConfig::default();
    config.retry.max_retries = max_retries;
    config.retry.delay_ms = 0;
    config.retry.policy = policy;
    OrchestratorConfig::from(&config)
}

fn orchestrator(provider: &Arc<ScriptedProvider>, config: OrchestratorConfig) -> RetryOrchestrator {
    RetryOrchestrator::new(provider.clone(), config)
}

#[tokio::test]
async fn first_attempt_passes() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok("hello".to_string()),
        Ok("Cards with date and source badges.".to_string()),
        Ok(format!("```html\n{}\n```", passing_document())),
    ]));
    let outcome = orchestrator(&provider, config(2, AcceptancePolicy::BestEffort))
        .run(Some("sk-test"), &inputs(), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(outcome.acceptance, Acceptance::Accepted);
    assert!(outcome.report.passed());
    assert_eq!(outcome.retry.attempt, 0);
    assert_eq!(provider.request_count(), 3);
    assert_eq!(outcome.trace.last(), Some(&PipelineState::Done));
    assert!(outcome.document.text.starts_with("<!DOCTYPE html>"));

    // The learning request embeds the reference document
    let requests = provider.requests();
    assert!(requests[1]
        .messages
        .iter()
        .any(|m| m.content.contains("news-card")));
}

#[tokio::test]
async fn malformed_credential_sends_nothing() {
    for credential in [None, Some(""), Some("pk-live-123"), Some("sk-")] {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let err = orchestrator(&provider, config(2, AcceptancePolicy::BestEffort))
            .run(credential, &inputs(), &NoopProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Credential(_)), "{:?}", credential);
        assert_eq!(provider.request_count(), 0);
    }
}

#[tokio::test]
async fn rate_limited_learn_recovers_on_retry() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok("hello".to_string()),
        Ok("analysis one".to_string()),
        Ok(thin_document()),
        Ok("analysis two".to_string()),
        Ok(passing_document()),
    ]));
    let outcome = orchestrator(&provider, config(2, AcceptancePolicy::BestEffort))
        .run(Some("sk-test"), &inputs(), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(outcome.acceptance, Acceptance::Accepted);
    assert_eq!(outcome.retry.attempt, 1);
    assert_eq!(outcome.learn_calls, 2);
    assert_eq!(outcome.synthesize_calls, 2);
    assert_eq!(provider.request_count(), 5);
    assert!(outcome.trace.contains(&PipelineState::Retrying));
}

#[tokio::test]
async fn exhausted_best_effort_accepts_degraded() {
    let mut script = vec![Ok("hello".to_string())];
    for _ in 0..3 {
        script.push(Ok("analysis".to_string()));
        script.push(Ok(thin_document()));
    }
    let provider = Arc::new(ScriptedProvider::new(script));
    let outcome = orchestrator(&provider, config(2, AcceptancePolicy::BestEffort))
        .run(Some("sk-test"), &inputs(), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(outcome.acceptance, Acceptance::Degraded);
    assert!(!outcome.report.passed());
    assert_eq!(outcome.learn_calls, 3);
    assert_eq!(provider.request_count(), 7);
    assert_eq!(outcome.document.text, thin_document());
}

#[tokio::test]
async fn exhausted_strict_fails_with_report() {
    let mut script = vec![Ok("hello".to_string())];
    for _ in 0..3 {
        script.push(Ok("analysis".to_string()));
        script.push(Ok(thin_document()));
    }
    let provider = Arc::new(ScriptedProvider::new(script));
    let err = orchestrator(&provider, config(2, AcceptancePolicy::Strict))
        .run(Some("sk-test"), &inputs(), &NoopProgress)
        .await
        .unwrap_err();

    match err {
        PipelineError::Validation { report } => {
            assert!(!report.passed());
            assert_eq!(report.metrics.units, 1);
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
    assert_eq!(provider.request_count(), 7);
}

#[tokio::test]
async fn unreachable_service_is_not_retried() {
    let provider = Arc::new(ScriptedProvider::new(vec![Err(ServiceErrorKind::Unauthorized)]));
    let err = orchestrator(&provider, config(2, AcceptancePolicy::BestEffort))
        .run(Some("sk-revoked"), &inputs(), &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Connectivity(_)));
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn learn_and_synthesize_pairs_are_bounded() {
    for max_retries in 0..=3 {
        let mut script = vec![Ok("hello".to_string())];
        for _ in 0..10 {
            script.push(Ok("analysis".to_string()));
            script.push(Ok(thin_document()));
        }
        let provider = Arc::new(ScriptedProvider::new(script));
        let outcome = orchestrator(&provider, config(max_retries, AcceptancePolicy::BestEffort))
            .run(Some("sk-test"), &inputs(), &NoopProgress)
            .await
            .unwrap();

        assert_eq!(outcome.learn_calls, max_retries + 1);
        assert_eq!(outcome.synthesize_calls, max_retries + 1);
        assert_eq!(provider.request_count(), 1 + 2 * (max_retries + 1));
    }
}

#[tokio::test]
async fn synthesis_timeout_restarts_from_learning() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Ok("hello".to_string()),
        Ok("analysis".to_string()),
        Err(ServiceErrorKind::Timeout),
        Ok("analysis again".to_string()),
        Ok(passing_document()),
    ]));
    let outcome = orchestrator(&provider, config(2, AcceptancePolicy::BestEffort))
        .run(Some("sk-test"), &inputs(), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(outcome.acceptance, Acceptance::Accepted);
    assert_eq!(outcome.learn_calls, 2);
    assert!(outcome
        .retry
        .last_failure
        .as_deref()
        .unwrap_or_default()
        .contains("timeout"));
}
