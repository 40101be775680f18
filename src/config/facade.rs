//! Entry points for loading a `BulletinConfig`.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::BulletinConfig;
use config::{ConfigError, File};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the full layered configuration for a workspace.
    ///
    /// Order (later wins): defaults, global file, `config/config.toml`,
    /// `config/{BULLETIN_ENV}.toml`, `BULLETIN__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<BulletinConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load defaults plus a single explicit file, which must exist.
    pub fn load_from_file(path: &Path) -> Result<BulletinConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }
}
