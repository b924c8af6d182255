//! Deprecation truncation.
//!
//! Deprecating a bundle removes it, together with the replaces chain below
//! it, from every channel it belongs to. Channels left without members
//! disappear, and bundles left without any membership are deleted.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use dcm_util::errors::DcmError;

use crate::graph::PackageGraph;

/// What a truncation removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TruncateReport {
    pub target: String,
    /// Names removed from each channel.
    pub removed_from_channels: BTreeMap<String, BTreeSet<String>>,
    pub emptied_channels: BTreeSet<String>,
    /// Bundles deleted because no membership was left.
    pub deleted: BTreeSet<String>,
}

impl fmt::Display for TruncateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "truncated {}", self.target)?;
        for (channel, names) in &self.removed_from_channels {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            write!(f, "; {channel}: {}", names.join(", "))?;
        }
        if !self.deleted.is_empty() {
            let names: Vec<&str> = self.deleted.iter().map(String::as_str).collect();
            write!(f, "; deleted {}", names.join(", "))?;
        }
        Ok(())
    }
}

/// Remove `target` and its replaces tail from every channel containing it.
///
/// Fails with `AlreadyDeprecated` if the bundle carries the legacy
/// deprecation marker, and with `ChannelHeadRemoval` if the package's
/// default channel would be left empty. The graph is unchanged on error.
pub fn deprecate_truncate(graph: &mut PackageGraph, target: &str) -> Result<TruncateReport, DcmError> {
    let bundle = graph.bundle(target).ok_or_else(|| DcmError::BundleNotFound {
        images: vec![target.to_string()],
    })?;
    if bundle.deprecated {
        return Err(DcmError::AlreadyDeprecated {
            bundle: target.to_string(),
        });
    }

    let channels_before = graph.channel_names();
    let target_channels: Vec<String> = bundle
        .channel_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut work = graph.clone();
    let mut report = TruncateReport {
        target: target.to_string(),
        ..TruncateReport::default()
    };

    for channel in target_channels {
        let tail = replaces_tail(&work, target, &channel);
        for name in &tail {
            if let Some(b) = work.bundle_mut(name) {
                b.remove_channel(&channel);
            }
        }
        tracing::debug!(channel = %channel, "removed {} bundle(s) from channel", tail.len());
        report.removed_from_channels.insert(channel, tail);
    }

    let channels_after = work.channel_names();
    report.emptied_channels = channels_before.difference(&channels_after).cloned().collect();
    let default = work.default_channel().to_string();
    if report.emptied_channels.contains(&default) {
        return Err(DcmError::ChannelHeadRemoval {
            bundle: target.to_string(),
            channel: default,
            reason: "the package's default channel would be left empty".to_string(),
        });
    }

    // A bundle truncated from one channel may live on in another.
    let removed: BTreeSet<String> = report.removed_from_channels.values().flatten().cloned().collect();
    for name in removed {
        if work.bundle(&name).is_some_and(|b| b.channels.is_empty()) {
            work.remove(&name);
            report.deleted.insert(name);
        }
    }

    *graph = work;
    Ok(report)
}

/// `start` plus every channel member reached by following replaces edges
/// recorded for `channel`.
fn replaces_tail(graph: &PackageGraph, start: &str, channel: &str) -> BTreeSet<String> {
    let mut tail = BTreeSet::new();
    let mut current = Some(start.to_string());
    while let Some(name) = current.take() {
        let Some(bundle) = graph.bundle(&name) else {
            break;
        };
        if !bundle.in_channel(channel) || !tail.insert(name.clone()) {
            break;
        }
        current = bundle.replaces_in(channel).map(str::to_string);
    }
    tail
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{bundle, graph};

    fn stable_and_fast() -> PackageGraph {
        graph(vec![
            bundle("a", "4.0.0", &[("stable", Some("b"))]),
            bundle("b", "3.0.0", &[("stable", Some("c"))]),
            bundle("c", "2.0.0", &[("stable", Some("d"))]),
            bundle("d", "1.0.0", &[("stable", None), ("fast", None)]),
            bundle("e", "1.5.0", &[("fast", Some("d"))]),
        ])
    }

    #[test]
    fn truncation_cascade() {
        let mut g = stable_and_fast();
        let report = deprecate_truncate(&mut g, "c").unwrap();
        assert_eq!(
            report.removed_from_channels["stable"],
            BTreeSet::from(["c".to_string(), "d".to_string()])
        );
        assert_eq!(report.deleted, BTreeSet::from(["c".to_string()]));
        assert!(!g.contains("c"));
        let d = g.bundle("d").unwrap();
        assert!(!d.in_channel("stable"));
        assert!(d.in_channel("fast"));
        assert!(g.bundle("b").unwrap().in_channel("stable"));
    }

    #[test]
    fn emptied_channel_disappears() {
        let mut g = stable_and_fast();
        let report = deprecate_truncate(&mut g, "e").unwrap();
        assert_eq!(report.emptied_channels, BTreeSet::from(["fast".to_string()]));
        assert!(!g.channel_names().contains("fast"));
        assert!(g.contains("d"));
        assert!(!g.contains("e"));
    }

    #[test]
    fn emptying_default_channel_fails() {
        let mut g = stable_and_fast();
        let before = g.clone();
        let err = deprecate_truncate(&mut g, "a").unwrap_err();
        assert!(matches!(err, DcmError::ChannelHeadRemoval { ref channel, .. } if channel == "stable"));
        assert_eq!(g, before);
    }

    #[test]
    fn marked_bundle_is_already_deprecated() {
        let mut g = stable_and_fast();
        g.bundle_mut("b").unwrap().deprecated = true;
        assert!(matches!(
            deprecate_truncate(&mut g, "b"),
            Err(DcmError::AlreadyDeprecated { .. })
        ));
    }

    #[test]
    fn cyclic_replaces_terminate() {
        let mut g = graph(vec![
            bundle("a", "2.0.0", &[("stable", Some("b"))]),
            bundle("b", "1.0.0", &[("stable", Some("a"))]),
            bundle("z", "3.0.0", &[("fast", None)]),
        ]);
        g.package.default_channel = "fast".to_string();
        let report = deprecate_truncate(&mut g, "a").unwrap();
        assert_eq!(report.deleted.len(), 2);
    }

    #[test]
    fn report_display() {
        let mut g = stable_and_fast();
        let report = deprecate_truncate(&mut g, "c").unwrap();
        assert_eq!(report.to_string(), "truncated c; stable: c, d; deleted c");
    }
}
