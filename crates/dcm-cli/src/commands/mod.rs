//! Command dispatch and handler modules.

mod add;
mod deprecate_truncate;
mod migrate;
mod version;

use miette::Result;

use dcm_core::config::GlobalConfig;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let mirror = cli.image_mirror.as_deref();
    match cli.command {
        Command::Add {
            dir,
            images,
            overwrite_latest,
        } => add::exec(&dir, images, overwrite_latest, mirror),
        Command::Deprecatetruncate { dir, images } => deprecate_truncate::exec(&dir, images),
        Command::Migrate {
            index_image,
            output_dir,
        } => migrate::exec(&index_image, &output_dir, mirror),
        Command::Version => version::exec(),
    }
}

fn load_config() -> Result<GlobalConfig> {
    let config = GlobalConfig::load()?;
    tracing::debug!(path = %GlobalConfig::default_path().display(), "loaded global config");
    Ok(config)
}
