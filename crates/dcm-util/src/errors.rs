use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all dcm operations.
///
/// Every variant is terminal for the operation that raised it: nothing is
/// retried and nothing is written back to the catalog.
#[derive(Debug, Error, Diagnostic)]
pub enum DcmError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A catalog file could not be read or decoded.
    #[error("Catalog error in {path}: {message}")]
    Catalog { path: String, message: String },

    /// A bundle property is missing, duplicated or undecodable.
    #[error("Malformed property in bundle {bundle:?}: {message}")]
    #[diagnostic(help("Each bundle needs exactly one olm.package property and at most one olm.skipRange and olm.substitutesFor"))]
    MalformedProperty { bundle: String, message: String },

    /// A bundle declares different replaces targets in different channels.
    #[error("Bundle {bundle:?} has multiple replaces ({}): channel-specific replaces are not supported", .targets.join(", "))]
    AmbiguousReplaces {
        bundle: String,
        targets: Vec<String>,
    },

    /// Two substitutes for the same bundle cannot be ordered.
    #[error("Cannot order substitutions for {target:?}: {message}")]
    #[diagnostic(help("Substitutes for the same bundle must have strictly ordered versions"))]
    AmbiguousSubstitution { target: String, message: String },

    /// More than one channel head shares the package-wide maximum version.
    #[error("Package {package:?} has more than one bundle with maximum version {version}: {}", .bundles.join(", "))]
    AmbiguousDefaultChannel {
        package: String,
        version: String,
        bundles: Vec<String>,
    },

    /// The maximum-version head carries no usable default channel hint.
    #[error("Unable to determine default channel for package {package:?}: {message}")]
    NoDefaultChannel { package: String, message: String },

    /// No bundle in the catalog was built from the given images.
    #[error("Could not find bundles in the catalog for images: {}", .images.join(", "))]
    BundleNotFound { images: Vec<String> },

    /// The bundle carries the legacy deprecation marker.
    #[error("Bundle {bundle:?} is already deprecated")]
    AlreadyDeprecated { bundle: String },

    /// A bundle with the same name exists and may not be replaced.
    #[error("Cannot overwrite bundle {bundle:?}: {reason}")]
    OverwriteNotPermitted { bundle: String, reason: String },

    /// Removing a bundle would leave a channel that must survive without a head.
    #[error("Cannot remove head {bundle:?} of channel {channel:?}: {reason}")]
    ChannelHeadRemoval {
        bundle: String,
        channel: String,
        reason: String,
    },

    /// A bundle belongs to a different package than the one being edited.
    #[error("Found package {found:?} in bundle {bundle:?}, expected {expected:?}")]
    PackageMismatch {
        bundle: String,
        expected: String,
        found: String,
    },

    /// The catalog model failed validation.
    #[error("Invalid catalog model: {message}")]
    #[diagnostic(help("{state}"))]
    InvalidModel { message: String, state: String },

    /// Pulling, inspecting or rendering an image failed.
    #[error("Image error for {image}: {message}")]
    Image { image: String, message: String },

    /// Global configuration could not be loaded.
    #[error("Config error: {message}")]
    #[diagnostic(help("Check ~/.dcm/config.toml for syntax errors"))]
    Config { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}
