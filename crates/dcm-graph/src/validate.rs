//! Structural validation of a package graph.
//!
//! All violations of a package are collected before failing, so an operator
//! fixing a catalog by hand sees every problem at once.

use std::collections::{BTreeMap, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use dcm_util::errors::DcmError;

use crate::graph::PackageGraph;

/// Every structural rule `graph` breaks, as human-readable lines.
pub fn violations(graph: &PackageGraph) -> Vec<String> {
    let mut found = Vec::new();

    for b in graph.bundles() {
        if b.package != graph.name() {
            found.push(format!(
                "bundle {:?} belongs to package {:?}, not {:?}",
                b.name,
                b.package,
                graph.name()
            ));
        }
        if b.channels.is_empty() {
            found.push(format!("bundle {:?} is not a member of any channel", b.name));
        }
        if let Err(e) = b.replaces() {
            found.push(e.to_string());
        }
        if b.substitutes_for.as_deref() == Some(b.name.as_str()) {
            found.push(format!("bundle {:?} substitutes for itself", b.name));
        }
    }

    let channels = graph.channel_names();
    if channels.is_empty() {
        found.push(format!("package {:?} has no channels", graph.name()));
    } else if !channels.contains(graph.default_channel()) {
        found.push(format!(
            "default channel {:?} of package {:?} does not exist",
            graph.default_channel(),
            graph.name()
        ));
    }

    for channel in &channels {
        let edges = graph.channel_members(channel).into_iter().filter_map(|b| {
            b.replaces_in(channel)
                .filter(|r| graph.bundle(r).is_some_and(|t| t.in_channel(channel)))
                .map(|r| (b.name.as_str(), r))
        });
        for cycle in cycles(edges) {
            found.push(format!(
                "channel {channel:?} has a replaces cycle: {}",
                cycle.join(" -> ")
            ));
        }
    }

    let mut substitutes: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for b in graph.bundles() {
        if let Some(target) = b.substitutes_for.as_deref() {
            substitutes.entry(target).or_default().push(b.name.as_str());
        }
    }
    for (target, subs) in &substitutes {
        if subs.len() > 1 {
            found.push(format!(
                "bundle {target:?} has more than one direct substitute: {}",
                subs.join(", ")
            ));
        }
    }
    let substitution_edges = graph.bundles().filter_map(|b| {
        b.substitutes_for
            .as_deref()
            .filter(|t| *t != b.name)
            .map(|t| (b.name.as_str(), t))
    });
    for cycle in cycles(substitution_edges) {
        found.push(format!("substitution cycle: {}", cycle.join(" -> ")));
    }

    found
}

/// Validate one package, failing with `InvalidModel` and a state dump.
pub fn validate_package(graph: &PackageGraph) -> Result<(), DcmError> {
    let found = violations(graph);
    if found.is_empty() {
        return Ok(());
    }
    Err(DcmError::InvalidModel {
        message: format!("package {:?}: {}", graph.name(), found.join("; ")),
        state: graph.to_string(),
    })
}

/// Strongly connected components with more than one node, or a self edge.
fn cycles<'a>(edges: impl Iterator<Item = (&'a str, &'a str)>) -> Vec<Vec<&'a str>> {
    let mut g: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();
    let mut self_loops = Vec::new();
    for (from, to) in edges {
        if from == to {
            self_loops.push(vec![from, to]);
            continue;
        }
        let a = *index.entry(from).or_insert_with(|| g.add_node(from));
        let b = *index.entry(to).or_insert_with(|| g.add_node(to));
        g.add_edge(a, b, ());
    }

    let mut found: Vec<Vec<&str>> = tarjan_scc(&g)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut names: Vec<&str> = scc.into_iter().map(|idx| g[idx]).collect();
            names.sort();
            names
        })
        .collect();
    found.extend(self_loops);
    found.sort();
    found
}
