//! Substitution chain resolution.
//!
//! Several bundles may claim to substitute for the same original. Claims are
//! linearized by version into one chain per original (oldest substitute
//! first, newest last), and each hop of the chain is then applied to the
//! replaces and skips edges of the whole package so that the newest
//! substitute behaves like a natively published successor.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use dcm_util::errors::DcmError;

use crate::graph::PackageGraph;
use crate::version;

/// One link of a substitution chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub original: String,
    pub substitute: String,
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} supersedes {}", self.substitute, self.original)
    }
}

/// Linearize every substitution chain in the package and rewrite edges.
///
/// Returns the hops applied, chain by chain in original name order.
/// Resolving an already resolved package changes nothing.
pub fn resolve_substitutions(graph: &mut PackageGraph) -> Result<Vec<Hop>, DcmError> {
    let chains = linearize(graph)?;
    let mut hops = Vec::new();
    for (original, chain) in chains {
        let mut from = original;
        for to in chain {
            let hop = Hop {
                original: from,
                substitute: to.clone(),
            };
            tracing::debug!(package = graph.name(), "applying substitution: {hop}");
            apply_hop(graph, &hop);
            hops.push(hop);
            from = to;
        }
    }
    Ok(hops)
}

/// Order each original's substitutes by version and point every
/// substitute's `substitutes_for` at its predecessor in the chain.
fn linearize(graph: &mut PackageGraph) -> Result<BTreeMap<String, Vec<String>>, DcmError> {
    let mut claims: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for b in graph.bundles() {
        if let Some(target) = b.substitutes_for.as_deref() {
            if target == b.name {
                return Err(DcmError::AmbiguousSubstitution {
                    target: target.to_string(),
                    message: "bundle substitutes for itself".to_string(),
                });
            }
            claims
                .entry(target.to_string())
                .or_default()
                .push(b.name.clone());
        }
    }

    // Originals are targets that do not substitute for anything themselves.
    let originals: Vec<String> = claims
        .keys()
        .filter(|target| {
            graph
                .bundle(target.as_str())
                .map_or(true, |b| b.substitutes_for.is_none())
        })
        .cloned()
        .collect();

    let mut chains = BTreeMap::new();
    for original in originals {
        let mut family: Vec<String> = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue = vec![original.clone()];
        while let Some(target) = queue.pop() {
            for sub in claims.get(&target).into_iter().flatten() {
                if seen.insert(sub.clone()) {
                    family.push(sub.clone());
                    queue.push(sub.clone());
                }
            }
        }

        let mut ordered = Vec::with_capacity(family.len());
        for name in family {
            if let Some(b) = graph.bundle(&name) {
                ordered.push((b.version.clone(), name));
            }
        }
        ordered.sort_by(|(va, _), (vb, _)| version::compare(va, vb));
        for pair in ordered.windows(2) {
            let ((va, a), (vb, b)) = (&pair[0], &pair[1]);
            if version::compare(va, vb).is_eq() {
                return Err(DcmError::AmbiguousSubstitution {
                    target: original.clone(),
                    message: format!("{a} and {b} both have version {va}"),
                });
            }
        }

        let chain: Vec<String> = ordered.into_iter().map(|(_, name)| name).collect();
        let mut predecessor = original.clone();
        for name in &chain {
            if let Some(b) = graph.bundle_mut(name) {
                if b.substitutes_for.as_deref() != Some(predecessor.as_str()) {
                    tracing::debug!(
                        bundle = %name,
                        "re-pointing substitution from {:?} to {predecessor}",
                        b.substitutes_for
                    );
                    b.substitutes_for = Some(predecessor.clone());
                }
            }
            predecessor = name.clone();
        }
        chains.insert(original, chain);
    }
    Ok(chains)
}

fn apply_hop(graph: &mut PackageGraph, hop: &Hop) {
    let orig = hop.original.as_str();
    let sub = hop.substitute.as_str();

    // Take the original's outgoing edges; the original becomes a dead end.
    let (orig_replaces, orig_skips, orig_skip_range, orig_channels) = match graph.bundle_mut(orig) {
        Some(o) => {
            let replaces = o.channels.iter().find_map(|ch| ch.replaces.clone());
            o.set_replaces(None);
            let skips = std::mem::take(&mut o.skips);
            // A substitute in the middle of a chain keeps skipping its predecessor.
            if let Some(pred) = o.substitutes_for.clone() {
                if skips.contains(&pred) {
                    o.add_skip(&pred);
                }
            }
            (
                replaces,
                skips,
                o.skip_range.take(),
                o.channel_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect::<Vec<_>>(),
            )
        }
        None => (None, Vec::new(), None, Vec::new()),
    };

    if let Some(s) = graph.bundle_mut(sub) {
        s.add_skip(orig);
        for skip in &orig_skips {
            if skip != sub {
                s.add_skip(skip);
            }
        }
        if s.channels.iter().any(|ch| ch.replaces.as_deref() == Some(orig)) {
            s.set_replaces(None);
        }
        if let Some(r) = orig_replaces.as_deref() {
            s.set_replaces(Some(r));
        }
        if orig_skip_range.is_some() {
            s.skip_range = orig_skip_range;
        }
        let replaces = s.channels.iter().find_map(|ch| ch.replaces.clone());
        for channel in &orig_channels {
            if !s.in_channel(channel) {
                s.add_channel(channel, replaces.as_deref());
            }
        }
    }

    for b in graph.bundles_mut() {
        if b.name == orig || b.name == sub {
            continue;
        }
        let mut replaced_orig = false;
        for ch in &mut b.channels {
            if ch.replaces.as_deref() == Some(orig) {
                ch.replaces = Some(sub.to_string());
                replaced_orig = true;
            }
        }
        if replaced_orig {
            b.add_skip(orig);
        }
        if b.skips_bundle(orig) {
            b.add_skip(sub);
        }
        b.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{bundle, graph};
    use crate::heads::heads;

    fn substitute(name: &str, version: &str, target: &str) -> dcm_core::bundle::Bundle {
        let mut b = bundle(name, version, &[("stable", None)]);
        b.substitutes_for = Some(target.to_string());
        b
    }

    fn scenario() -> PackageGraph {
        graph(vec![
            bundle("x", "2.0.0", &[("stable", Some("o"))]),
            bundle("o", "1.0.0", &[("stable", Some("p"))]),
            bundle("p", "0.9.0", &[("stable", None)]),
            substitute("s2", "1.0.2", "o"),
            substitute("s1", "1.0.1", "o"),
        ])
    }

    #[test]
    fn chain_orders_by_version() {
        let mut g = scenario();
        let hops = resolve_substitutions(&mut g).unwrap();
        assert_eq!(
            hops,
            vec![
                Hop {
                    original: "o".into(),
                    substitute: "s1".into()
                },
                Hop {
                    original: "s1".into(),
                    substitute: "s2".into()
                },
            ]
        );
        assert_eq!(g.bundle("s1").unwrap().substitutes_for.as_deref(), Some("o"));
        assert_eq!(g.bundle("s2").unwrap().substitutes_for.as_deref(), Some("s1"));
    }

    #[test]
    fn substitutes_skip_their_predecessors() {
        let mut g = scenario();
        resolve_substitutions(&mut g).unwrap();
        let s1 = g.bundle("s1").unwrap();
        let s2 = g.bundle("s2").unwrap();
        assert!(s1.skips_bundle("o"));
        assert!(s2.skips_bundle("o"));
        assert!(s2.skips_bundle("s1"));
        assert!(g.bundle("o").unwrap().skips.is_empty());
    }

    #[test]
    fn original_skips_move_to_substitute() {
        let mut g = graph(vec![
            bundle("o", "1.0.0", &[("stable", None)]),
            bundle("q", "0.9.0", &[("stable", None)]),
            substitute("s", "1.0.1", "o"),
        ]);
        g.bundle_mut("o").unwrap().add_skip("q");
        resolve_substitutions(&mut g).unwrap();
        assert!(g.bundle("o").unwrap().skips.is_empty());
        let s = g.bundle("s").unwrap();
        assert!(s.skips_bundle("o"));
        assert!(s.skips_bundle("q"));
    }

    #[test]
    fn successor_of_substitute_still_skips_it() {
        let mut y = bundle("y", "3.0.0", &[("stable", Some("s"))]);
        y.add_skip("o");
        let mut g = graph(vec![
            bundle("o", "1.0.0", &[("stable", None)]),
            substitute("s", "1.0.1", "o"),
            y,
        ]);
        resolve_substitutions(&mut g).unwrap();
        let y = g.bundle("y").unwrap();
        assert_eq!(y.replaces().unwrap(), Some("s"));
        assert!(y.skips_bundle("s"));
    }

    #[test]
    fn replacer_of_original_moves_to_newest_substitute() {
        let mut g = scenario();
        resolve_substitutions(&mut g).unwrap();
        let x = g.bundle("x").unwrap();
        assert_eq!(x.replaces().unwrap(), Some("s2"));
        assert!(x.skips_bundle("o"));
        assert!(x.skips_bundle("s1"));
    }

    #[test]
    fn original_edges_move_to_chain_end() {
        let mut g = scenario();
        g.bundle_mut("o").unwrap().skip_range = Some("<1.0.0".into());
        resolve_substitutions(&mut g).unwrap();
        let o = g.bundle("o").unwrap();
        assert_eq!(o.replaces().unwrap(), None);
        assert_eq!(o.skip_range, None);
        let s2 = g.bundle("s2").unwrap();
        assert_eq!(s2.replaces().unwrap(), Some("p"));
        assert_eq!(s2.skip_range.as_deref(), Some("<1.0.0"));
        assert_eq!(heads(&g).unwrap(), BTreeSet::from(["x".to_string()]));
    }

    #[test]
    fn skippers_of_original_skip_substitutes() {
        let mut g = scenario();
        let mut y = bundle("y", "3.0.0", &[("fast", None)]);
        y.add_skip("o");
        g.put(y);
        resolve_substitutions(&mut g).unwrap();
        let y = g.bundle("y").unwrap();
        assert!(y.skips_bundle("s1"));
        assert!(y.skips_bundle("s2"));
    }

    #[test]
    fn substitute_joins_original_channels() {
        let mut g = scenario();
        g.bundle_mut("o").unwrap().add_channel("fast", Some("p"));
        resolve_substitutions(&mut g).unwrap();
        let s1 = g.bundle("s1").unwrap();
        assert!(s1.in_channel("fast"));
        assert!(s1.replaces().is_ok());
    }

    #[test]
    fn resolution_is_idempotent() {
        let mut g = scenario();
        resolve_substitutions(&mut g).unwrap();
        let once = g.clone();
        resolve_substitutions(&mut g).unwrap();
        assert_eq!(g, once);
    }

    #[test]
    fn equal_versions_are_ambiguous() {
        let mut g = graph(vec![
            bundle("o", "1.0.0", &[("stable", None)]),
            substitute("s1", "1.0.1", "o"),
            substitute("s2", "1.0.1", "o"),
        ]);
        assert!(matches!(
            resolve_substitutions(&mut g),
            Err(DcmError::AmbiguousSubstitution { ref target, .. }) if target == "o"
        ));
    }

    #[test]
    fn build_metadata_orders_rebuilds() {
        let mut g = graph(vec![
            bundle("o", "1.0.0", &[("stable", None)]),
            substitute("r2", "1.0.0+2", "o"),
            substitute("r10", "1.0.0+10", "o"),
        ]);
        resolve_substitutions(&mut g).unwrap();
        assert_eq!(g.bundle("r10").unwrap().substitutes_for.as_deref(), Some("r2"));
    }

    #[test]
    fn self_substitution_fails() {
        let mut g = graph(vec![substitute("o", "1.0.0", "o")]);
        assert!(resolve_substitutions(&mut g).is_err());
    }
}
