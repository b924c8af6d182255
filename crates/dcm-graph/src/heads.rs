//! Channel head computation.
//!
//! A channel's heads are its members that no other member replaces and that
//! no bundle of the package skips. Skips are global: a skip recorded in one
//! channel hides the skipped bundle from every channel.

use std::collections::{BTreeMap, BTreeSet};

use dcm_util::errors::DcmError;

use crate::graph::PackageGraph;

/// Heads of every channel, keyed by channel name.
///
/// Fails with `AmbiguousReplaces` if any bundle declares more than one
/// distinct replaces target across its memberships.
pub fn channel_heads(graph: &PackageGraph) -> Result<BTreeMap<String, BTreeSet<String>>, DcmError> {
    let mut in_channel: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut replaced_in_channel: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut skipped: BTreeSet<&str> = BTreeSet::new();

    for bundle in graph.bundles() {
        bundle.replaces()?;
        for ch in &bundle.channels {
            in_channel
                .entry(ch.name.as_str())
                .or_default()
                .insert(bundle.name.as_str());
            if let Some(replaces) = ch.replaces.as_deref() {
                replaced_in_channel
                    .entry(ch.name.as_str())
                    .or_default()
                    .insert(replaces);
            }
        }
        skipped.extend(bundle.skips.iter().map(String::as_str));
    }

    let mut heads = BTreeMap::new();
    for (channel, members) in in_channel {
        let replaced = replaced_in_channel.remove(channel).unwrap_or_default();
        let channel_heads: BTreeSet<String> = members
            .into_iter()
            .filter(|name| !replaced.contains(name) && !skipped.contains(name))
            .map(str::to_string)
            .collect();
        heads.insert(channel.to_string(), channel_heads);
    }
    Ok(heads)
}

/// Union of all channel heads. A bundle heading several channels appears once.
pub fn heads(graph: &PackageGraph) -> Result<BTreeSet<String>, DcmError> {
    Ok(channel_heads(graph)?.into_values().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{bundle, graph};

    #[test]
    fn linear_chain_has_single_head() {
        let g = graph(vec![
            bundle("a", "3.0.0", &[("stable", Some("b"))]),
            bundle("b", "2.0.0", &[("stable", Some("c"))]),
            bundle("c", "1.0.0", &[("stable", None)]),
        ]);
        assert_eq!(heads(&g).unwrap(), BTreeSet::from(["a".to_string()]));
    }

    #[test]
    fn skipping_bundle_is_an_extra_head() {
        let mut d = bundle("d", "2.5.0", &[("stable", None)]);
        d.add_skip("b");
        let g = graph(vec![
            bundle("a", "3.0.0", &[("stable", Some("b"))]),
            bundle("b", "2.0.0", &[("stable", Some("c"))]),
            bundle("c", "1.0.0", &[("stable", None)]),
            d,
        ]);
        assert_eq!(
            heads(&g).unwrap(),
            BTreeSet::from(["a".to_string(), "d".to_string()])
        );
    }

    #[test]
    fn replaced_skipper_is_not_a_head() {
        let mut d = bundle("d", "2.5.0", &[("stable", None)]);
        d.add_skip("b");
        let g = graph(vec![
            bundle("a", "3.0.0", &[("stable", Some("d"))]),
            bundle("b", "2.0.0", &[("stable", None)]),
            d,
        ]);
        assert_eq!(heads(&g).unwrap(), BTreeSet::from(["a".to_string()]));
    }

    #[test]
    fn skips_are_global_across_channels() {
        let mut a = bundle("a", "2.0.0", &[("fast", None)]);
        a.add_skip("b");
        let g = graph(vec![a, bundle("b", "1.0.0", &[("stable", None)])]);
        let per_channel = channel_heads(&g).unwrap();
        assert!(per_channel["stable"].is_empty());
        assert_eq!(per_channel["fast"], BTreeSet::from(["a".to_string()]));
    }

    #[test]
    fn head_of_one_channel_only() {
        let g = graph(vec![
            bundle("a", "2.0.0", &[("stable", Some("b"))]),
            bundle("b", "1.0.0", &[("stable", None), ("fast", None)]),
        ]);
        let per_channel = channel_heads(&g).unwrap();
        assert_eq!(per_channel["stable"], BTreeSet::from(["a".to_string()]));
        assert_eq!(per_channel["fast"], BTreeSet::from(["b".to_string()]));
    }

    #[test]
    fn tail_of_one_channel_may_replace_in_another() {
        let g = graph(vec![
            bundle("b", "2.0.0", &[("stable", Some("a")), ("fast", None)]),
            bundle("a", "1.0.0", &[("stable", None)]),
        ]);
        let per_channel = channel_heads(&g).unwrap();
        assert_eq!(per_channel["stable"], BTreeSet::from(["b".to_string()]));
        assert_eq!(per_channel["fast"], BTreeSet::from(["b".to_string()]));
    }

    #[test]
    fn conflicting_replaces_fail() {
        let g = graph(vec![bundle(
            "a",
            "2.0.0",
            &[("stable", Some("b")), ("fast", Some("c"))],
        )]);
        assert!(matches!(
            heads(&g),
            Err(DcmError::AmbiguousReplaces { ref bundle, .. }) if bundle == "a"
        ));
    }
}
