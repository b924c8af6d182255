//! One package's bundles, held as an arena keyed by bundle name.
//!
//! Bundles refer to each other only by name (replaces, skips,
//! substitutes-for), so every cross-reference is a lookup here and edits
//! never alias.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use dcm_core::bundle::Bundle;
use dcm_core::declcfg::{ChannelBlob, ChannelEntry};
use dcm_core::package::Package;

/// A package and all of its bundles.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageGraph {
    pub package: Package,
    bundles: BTreeMap<String, Bundle>,
    /// Loaded channel blobs without entries, kept for their extra keys.
    channel_templates: BTreeMap<String, ChannelBlob>,
}

impl PackageGraph {
    pub fn new(package: Package) -> Self {
        Self {
            package,
            bundles: BTreeMap::new(),
            channel_templates: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.package.name
    }

    pub fn default_channel(&self) -> &str {
        &self.package.default_channel
    }

    /// Put a bundle into the arena, returning the record it replaced.
    pub fn put(&mut self, bundle: Bundle) -> Option<Bundle> {
        self.bundles.insert(bundle.name.clone(), bundle)
    }

    pub fn remove(&mut self, name: &str) -> Option<Bundle> {
        self.bundles.remove(name)
    }

    pub fn bundle(&self, name: &str) -> Option<&Bundle> {
        self.bundles.get(name)
    }

    pub fn bundle_mut(&mut self, name: &str) -> Option<&mut Bundle> {
        self.bundles.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bundles.contains_key(name)
    }

    /// Bundles in name order.
    pub fn bundles(&self) -> impl Iterator<Item = &Bundle> {
        self.bundles.values()
    }

    pub fn bundles_mut(&mut self) -> impl Iterator<Item = &mut Bundle> {
        self.bundles.values_mut()
    }

    pub fn names(&self) -> Vec<String> {
        self.bundles.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Every channel some bundle is a member of.
    pub fn channel_names(&self) -> BTreeSet<String> {
        self.bundles
            .values()
            .flat_map(|b| b.channels.iter().map(|ch| ch.name.clone()))
            .collect()
    }

    /// Members of `channel`, in name order.
    pub fn channel_members(&self, channel: &str) -> Vec<&Bundle> {
        self.bundles
            .values()
            .filter(|b| b.in_channel(channel))
            .collect()
    }

    /// Bundles built from `image`, in name order.
    pub fn find_by_image(&self, image: &str) -> Vec<&Bundle> {
        self.bundles.values().filter(|b| b.image == image).collect()
    }

    /// Names of bundles that replace `name` in any channel.
    pub fn replaced_by(&self, name: &str) -> Vec<&str> {
        self.bundles
            .values()
            .filter(|b| b.channels.iter().any(|ch| ch.replaces.as_deref() == Some(name)))
            .map(|b| b.name.as_str())
            .collect()
    }

    /// Names of bundles that list `name` in their skips.
    pub fn skipped_by(&self, name: &str) -> Vec<&str> {
        self.bundles
            .values()
            .filter(|b| b.skips_bundle(name))
            .map(|b| b.name.as_str())
            .collect()
    }

    /// Names of bundles claiming to substitute for `name`.
    pub fn substituted_by(&self, name: &str) -> Vec<&str> {
        self.bundles
            .values()
            .filter(|b| b.substitutes_for.as_deref() == Some(name))
            .map(|b| b.name.as_str())
            .collect()
    }

    /// Remember a loaded channel blob's extra keys for [`Self::channel_blobs`].
    pub fn keep_channel_template(&mut self, mut blob: ChannelBlob) {
        blob.entries.clear();
        self.channel_templates.insert(blob.name.clone(), blob);
    }

    /// One `olm.channel` blob per channel, rebuilt from the bundles'
    /// memberships. Entries are in bundle name order.
    pub fn channel_blobs(&self) -> Vec<ChannelBlob> {
        self.channel_names()
            .into_iter()
            .map(|channel| {
                let mut blob = self
                    .channel_templates
                    .get(&channel)
                    .cloned()
                    .unwrap_or_else(|| ChannelBlob::new(self.name(), channel.as_str()));
                blob.entries = self
                    .channel_members(&channel)
                    .into_iter()
                    .map(|b| ChannelEntry {
                        name: b.name.clone(),
                        replaces: b.replaces_in(&channel).map(str::to_string),
                        skips: b.skips.clone(),
                        skip_range: b.skip_range.clone(),
                    })
                    .collect();
                blob
            })
            .collect()
    }

    /// Dedup every bundle's memberships, skips and opaque properties.
    pub fn normalize(&mut self) {
        for bundle in self.bundles.values_mut() {
            bundle.normalize();
        }
    }
}

/// Multi-line dump of the package, used as diagnostic state.
impl fmt::Display for PackageGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "package {} (default channel {:?})",
            self.package.name, self.package.default_channel
        )?;
        for b in self.bundles.values() {
            writeln!(f, "  {b}")?;
            for ch in &b.channels {
                match &ch.replaces {
                    Some(r) => writeln!(f, "    channel {} replaces {r}", ch.name)?,
                    None => writeln!(f, "    channel {}", ch.name)?,
                }
            }
            if !b.skips.is_empty() {
                writeln!(f, "    skips {}", b.skips.join(", "))?;
            }
            if let Some(range) = &b.skip_range {
                writeln!(f, "    skipRange {range}")?;
            }
            if let Some(sub) = &b.substitutes_for {
                writeln!(f, "    substitutesFor {sub}")?;
            }
        }
        Ok(())
    }
}
