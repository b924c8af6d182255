//! CLI argument definitions for dcm.
//!
//! Uses `clap` derive macros to define the full command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "dcm",
    version,
    about = "Manage declarative config operator catalogs",
    long_about = "dcm maintains file-based operator catalogs: it inserts bundle images into \
                  their packages' upgrade graphs, truncates deprecated bundles out of their \
                  channels, and migrates index images to declarative config directories."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read images from a directory of pre-rendered images instead of a registry
    #[arg(long, global = true, env = "DCM_IMAGE_MIRROR", value_name = "DIR")]
    pub image_mirror: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add bundle images to a catalog
    Add {
        /// Catalog directory
        dir: PathBuf,
        /// Bundle images to add, in order
        #[arg(required = true)]
        images: Vec<String>,
        /// Allow overwriting a bundle that nothing replaces or skips
        #[arg(long)]
        overwrite_latest: bool,
    },

    /// Remove bundles and their replaces chains from every channel they belong to
    Deprecatetruncate {
        /// Catalog directory
        dir: PathBuf,
        /// Images of the bundles to deprecate
        #[arg(required = true)]
        images: Vec<String>,
    },

    /// Render an index image into a declarative config directory
    Migrate {
        /// Index image to render
        index_image: String,
        /// Output directory; must be empty or absent
        #[arg(short, long, default_value = "index")]
        output_dir: PathBuf,
    },

    /// Print version information
    Version,
}

pub fn parse() -> Cli {
    Cli::parse()
}
