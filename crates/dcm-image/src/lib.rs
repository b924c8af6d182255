//! Image sources: parsing image references, reading image labels, and
//! rendering bundle and index images to declarative config, either through
//! external tools or from a local mirror directory.

pub mod command;
pub mod csv;
pub mod mirror;
pub mod reference;
pub mod source;

pub use command::CommandSource;
pub use mirror::MirrorSource;
pub use reference::ImageRef;
pub use source::{ImageSource, RenderedBundle, DEFAULT_CHANNEL_LABEL};
