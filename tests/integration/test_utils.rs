//! Shared test utilities for integration tests
//!
//! A scripted provider standing in for the generative service, document
//! fixtures that pass or fail the default checks, and XDG isolation for
//! configuration tests.

use async_trait::async_trait;
use bulletin::credential::Credential;
use bulletin::error::{PipelineError, ServiceErrorKind};
use bulletin::provider::{CompletionRequest, CompletionResponse, ModelProviderClient, TokenUsage};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = parking_lot::const_mutex(());

/// Provider that answers from a script, in order, and records every request.
/// Once the script runs out every call fails as a server error.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ServiceErrorKind>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ServiceErrorKind>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ModelProviderClient for ScriptedProvider {
    async fn complete(
        &self,
        _credential: &Credential,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, PipelineError> {
        self.requests.lock().push(request);
        let next = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or(Err(ServiceErrorKind::ServerError));
        match next {
            Ok(content) => Ok(CompletionResponse {
                content,
                model: "scripted-model".to_string(),
                usage: TokenUsage::default(),
                finish_reason: Some("stop".to_string()),
            }),
            Err(kind) => Err(PipelineError::service(kind, "scripted failure")),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

/// A document that satisfies every default marker and threshold.
pub fn passing_document() -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html lang=\"zh-TW\">\n<head>\n\
         <title>Tariff Policy Update</title>\n\
         <script src=\"https://cdn.tailwindcss.com\"></script>\n\
         <link rel=\"stylesheet\" href=\"https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/fontawesome.min.css\">\n\
         <style>:root { --sowork-orange: #FF6B35; }</style>\n\
         </head>\n<body>\n",
    );
    for section in 0..4 {
        html.push_str(&format!("<section id=\"s{}\">\n<h2>Section {}</h2>\n", section, section));
        for item in 0..3 {
            html.push_str(&format!(
                "<article class=\"news-card\">\
                 <span class=\"date-badge\">2026-10-1{}</span>\
                 <span class=\"source-badge\">Source {}</span>\
                 <p>{}</p>\
                 <a href=\"https://example.com/{}/{}\" target=\"_blank\" rel=\"noopener\">Read</a>\
                 </article>\n",
                item,
                item,
                "Trade policy summary. ".repeat(70),
                section,
                item
            ));
        }
        html.push_str("</section>\n");
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// A document with the right look but far too little content.
pub fn thin_document() -> String {
    "<!DOCTYPE html><html><head><title>Tariff Policy Update</title></head>\
     <body><section><article class=\"news-card\">one</article></section></body></html>"
        .to_string()
}

/// Reference layout used as the learning input.
pub fn reference_html() -> String {
    passing_document()
}

/// Run `f` with XDG_CONFIG_HOME pointed into `test_dir`, restoring the
/// environment afterwards. Serialized across tests.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock();
    let original = std::env::var_os("XDG_CONFIG_HOME");

    let config_home = test_dir.path().join("xdg");
    std::fs::create_dir_all(&config_home).unwrap();
    std::env::set_var("XDG_CONFIG_HOME", &config_home);

    let result = f();

    match original {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
    result
}
