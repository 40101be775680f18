//! Environment overrides: `BULLETIN__RETRY__POLICY=strict` sets `retry.policy`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("BULLETIN")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
