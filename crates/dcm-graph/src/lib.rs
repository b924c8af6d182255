//! Catalog version graph engine: version ordering, channel heads, bundle
//! insertion with substitution chains and channel propagation, default
//! channel selection, deprecation truncation, and model validation.

pub mod default_channel;
pub mod graph;
pub mod heads;
pub mod insert;
pub mod model;
pub mod substitution;
pub mod truncate;
pub mod validate;
pub mod version;

pub use default_channel::DefaultChannelHints;
pub use graph::PackageGraph;
pub use model::Model;
