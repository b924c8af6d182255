//! Bundle insertion.
//!
//! Inserting a bundle checks package ownership and overwrite rules, resolves
//! substitution chains, propagates channel membership from every head down
//! its replaces chain, deduplicates, and re-selects the default channel. The
//! package graph is only updated when every step succeeds.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;

use dcm_core::bundle::Bundle;
use dcm_util::errors::DcmError;

use crate::default_channel::{select_default_channel, DefaultChannelHints};
use crate::graph::PackageGraph;
use crate::heads::heads;
use crate::substitution::{resolve_substitutions, Hop};

#[derive(Debug, Clone, Copy, Default)]
pub struct InsertOptions {
    /// Allow replacing an existing bundle that nothing replaces or skips.
    pub overwrite_latest: bool,
}

/// What an insertion changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InsertReport {
    pub bundle: String,
    pub overwritten: bool,
    pub substitutions: Vec<Hop>,
    /// (bundle, channel) memberships added to ancestors.
    pub propagated: Vec<(String, String)>,
    pub heads: BTreeSet<String>,
    pub default_channel: String,
    pub default_channel_changed: bool,
}

impl fmt::Display for InsertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.overwritten { "overwrote" } else { "added" };
        write!(f, "{verb} {}", self.bundle)?;
        if !self.substitutions.is_empty() {
            write!(f, ", {} substitution(s)", self.substitutions.len())?;
        }
        if !self.propagated.is_empty() {
            write!(f, ", {} channel membership(s) propagated", self.propagated.len())?;
        }
        if self.default_channel_changed {
            write!(f, ", default channel now {:?}", self.default_channel)?;
        }
        Ok(())
    }
}

/// Insert `bundle` into `graph`.
pub fn insert_bundle(
    graph: &mut PackageGraph,
    bundle: Bundle,
    hints: &dyn DefaultChannelHints,
    options: InsertOptions,
) -> Result<InsertReport, DcmError> {
    if bundle.package != graph.name() {
        return Err(DcmError::PackageMismatch {
            bundle: bundle.name.clone(),
            expected: graph.name().to_string(),
            found: bundle.package.clone(),
        });
    }

    let overwritten = graph.contains(&bundle.name);
    if overwritten {
        check_overwrite(graph, &bundle.name, options)?;
    }

    let mut work = graph.clone();
    let name = bundle.name.clone();
    work.put(bundle);

    let substitutions = resolve_substitutions(&mut work)?;
    let heads = heads(&work)?;
    tracing::info!(package = work.name(), "adding channels to descendants");
    let propagated = propagate_channels(&mut work, &heads);
    work.normalize();

    let default_channel = select_default_channel(&work, hints)?;
    let default_channel_changed = work.package.default_channel != default_channel;
    if default_channel_changed {
        tracing::info!(
            package = work.name(),
            "updating default channel to {default_channel:?}"
        );
        work.package.default_channel = default_channel.clone();
    }

    *graph = work;
    Ok(InsertReport {
        bundle: name,
        overwritten,
        substitutions,
        propagated,
        heads,
        default_channel,
        default_channel_changed,
    })
}

/// A bundle may only be overwritten when nothing replaces or skips it, and
/// only when overwriting is enabled.
fn check_overwrite(graph: &PackageGraph, name: &str, options: InsertOptions) -> Result<(), DcmError> {
    if let Some(by) = graph.replaced_by(name).first() {
        return Err(DcmError::OverwriteNotPermitted {
            bundle: name.to_string(),
            reason: format!("it is replaced by bundle {by:?}"),
        });
    }
    if let Some(by) = graph.skipped_by(name).first() {
        return Err(DcmError::OverwriteNotPermitted {
            bundle: name.to_string(),
            reason: format!("it is skipped by bundle {by:?}"),
        });
    }
    if !options.overwrite_latest {
        return Err(DcmError::OverwriteNotPermitted {
            bundle: name.to_string(),
            reason: "--overwrite-latest is not enabled".to_string(),
        });
    }
    Ok(())
}

/// Walk each head's replaces chain and give every ancestor a membership in
/// each channel its descendant belongs to.
///
/// An ancestor joins with its own replaces target, if any, so the
/// single-replaces rule keeps holding. The walk stops at a name missing from
/// the graph or at an ancestor with no channels.
fn propagate_channels(graph: &mut PackageGraph, heads: &BTreeSet<String>) -> Vec<(String, String)> {
    let mut added = Vec::new();
    let mut done: HashMap<String, BTreeSet<String>> = HashMap::new();
    let mut queue: VecDeque<String> = heads.iter().cloned().collect();

    while let Some(current) = queue.pop_front() {
        let Some(bundle) = graph.bundle(&current) else {
            continue;
        };
        let memberships: Vec<(String, Option<String>)> = bundle
            .channels
            .iter()
            .map(|ch| (ch.name.clone(), ch.replaces.clone()))
            .collect();

        for (channel, replaces) in memberships {
            if !done.entry(current.clone()).or_default().insert(channel.clone()) {
                continue;
            }
            let Some(ancestor_name) = replaces else {
                continue;
            };
            let Some(ancestor) = graph.bundle_mut(&ancestor_name) else {
                continue;
            };
            if ancestor.channels.is_empty() {
                continue;
            }
            let ancestor_replaces = ancestor.channels.iter().find_map(|ch| ch.replaces.clone());
            if ancestor.add_channel(&channel, ancestor_replaces.as_deref()) {
                tracing::debug!(bundle = %ancestor_name, channel = %channel, "propagated channel");
                added.push((ancestor_name.clone(), channel.clone()));
            }
            queue.push_back(ancestor_name);
        }
    }
    added
}
