//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources replace earlier ones key by key, so a file that sets only
//! `stages.synthesize.max_tokens` keeps the default timeout for that stage.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("stages.probe.max_tokens", 10_i64)?
        .set_default("stages.probe.timeout_secs", 30_i64)?
        .set_default("stages.learn.max_tokens", 2000_i64)?
        .set_default("stages.learn.temperature", 0.2_f64)?
        .set_default("stages.learn.timeout_secs", 60_i64)?
        .set_default("stages.synthesize.max_tokens", 12000_i64)?
        .set_default("stages.synthesize.temperature", 0.3_f64)?
        .set_default("stages.synthesize.timeout_secs", 120_i64)?
        .set_default("retry.max_retries", 2_i64)?
        .set_default("retry.delay_ms", 5000_i64)?
        .set_default("retry.policy", "best-effort")
}
