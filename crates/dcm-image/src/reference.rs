//! Container image references.

use std::fmt;
use std::str::FromStr;

use dcm_util::errors::DcmError;

/// A parsed `[registry/]repository[:tag][@digest]` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageRef {
    original: String,
    pub registry: Option<String>,
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageRef {
    pub fn parse(reference: &str) -> Result<Self, DcmError> {
        let invalid = |message: &str| DcmError::Image {
            image: reference.to_string(),
            message: message.to_string(),
        };
        if reference.is_empty() {
            return Err(invalid("empty image reference"));
        }
        if reference.chars().any(char::is_whitespace) {
            return Err(invalid("image reference contains whitespace"));
        }

        let (name, digest) = match reference.split_once('@') {
            Some((name, digest)) if !digest.is_empty() => (name, Some(digest.to_string())),
            Some(_) => return Err(invalid("empty digest")),
            None => (reference, None),
        };

        // A colon after the last slash starts the tag; earlier colons belong
        // to a registry port.
        let last_slash = name.rfind('/').map_or(0, |i| i + 1);
        let (path, tag) = match name[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                let tag = &name[split + 1..];
                if tag.is_empty() {
                    return Err(invalid("empty tag"));
                }
                (&name[..split], Some(tag.to_string()))
            }
            None => (name, None),
        };

        let (registry, repository) = match path.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (Some(first.to_string()), rest.to_string())
            }
            _ => (None, path.to_string()),
        };
        if repository.is_empty() {
            return Err(invalid("empty repository"));
        }

        Ok(Self {
            original: reference.to_string(),
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// The reference exactly as given.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// File-system-safe name for this reference, used by mirrors.
    pub fn dir_name(&self) -> String {
        self.original.replace(['/', ':', '@'], "_")
    }
}

impl FromStr for ImageRef {
    type Err = DcmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}
