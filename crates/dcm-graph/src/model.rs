//! The whole catalog as package graphs.

use std::collections::BTreeMap;

use dcm_core::bundle::Bundle;
use dcm_core::declcfg::{ChannelBlob, DeclarativeConfig, Meta};
use dcm_util::errors::DcmError;

use crate::graph::PackageGraph;
use crate::validate::{validate_package, violations};

/// Every package of a catalog, plus the blobs the graph engine does not
/// interpret. Channel blobs are folded into bundle memberships on load and
/// rebuilt from them on encode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    packages: BTreeMap<String, PackageGraph>,
    pub others: Vec<Meta>,
}

impl Model {
    /// Build the model from decoded catalog blobs.
    ///
    /// Fails with `InvalidModel` for duplicate packages or bundles, for
    /// bundles or channels whose package has no package blob and for channel
    /// entries that disagree with their bundle, and with `MalformedProperty`
    /// for undecodable bundle properties.
    pub fn from_config(cfg: DeclarativeConfig) -> Result<Self, DcmError> {
        let mut model = Model {
            packages: BTreeMap::new(),
            others: cfg.others,
        };
        let mut problems = Vec::new();

        for pkg in cfg.packages {
            if model.packages.contains_key(&pkg.name) {
                problems.push(format!("duplicate package {:?}", pkg.name));
                continue;
            }
            model.packages.insert(pkg.name.clone(), PackageGraph::new(pkg));
        }

        for blob in cfg.bundles {
            let bundle = Bundle::from_blob(blob)?;
            let Some(graph) = model.packages.get_mut(&bundle.package) else {
                problems.push(format!(
                    "bundle {:?} belongs to package {:?}, which has no package blob",
                    bundle.name, bundle.package
                ));
                continue;
            };
            let name = bundle.name.clone();
            if graph.put(bundle).is_some() {
                problems.push(format!(
                    "duplicate bundle {name:?} in package {:?}",
                    graph.name()
                ));
            }
        }

        for channel in cfg.channels {
            let Some(graph) = model.packages.get_mut(&channel.package) else {
                problems.push(format!(
                    "channel {:?} belongs to package {:?}, which has no package blob",
                    channel.name, channel.package
                ));
                continue;
            };
            fold_channel(graph, channel, &mut problems);
        }

        if !problems.is_empty() {
            return Err(DcmError::InvalidModel {
                message: problems.join("; "),
                state: format!("{} package(s) decoded", model.packages.len()),
            });
        }
        Ok(model)
    }

    /// Encode back into catalog blobs, packages in name order.
    pub fn to_config(&self) -> DeclarativeConfig {
        let mut cfg = DeclarativeConfig::default();
        for graph in self.packages.values() {
            cfg.packages.push(graph.package.clone());
            cfg.bundles.extend(graph.bundles().map(Bundle::to_blob));
            cfg.channels.extend(graph.channel_blobs());
        }
        cfg.others = self.others.clone();
        cfg
    }

    pub fn package(&self, name: &str) -> Option<&PackageGraph> {
        self.packages.get(name)
    }

    pub fn package_mut(&mut self, name: &str) -> Option<&mut PackageGraph> {
        self.packages.get_mut(name)
    }

    /// Add or replace a whole package.
    pub fn put_package(&mut self, graph: PackageGraph) {
        self.packages.insert(graph.name().to_string(), graph);
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageGraph> {
        self.packages.values()
    }

    /// Every bundle built from `image`, as (package, bundle) names.
    pub fn find_by_image(&self, image: &str) -> Vec<(&str, &str)> {
        self.packages
            .values()
            .flat_map(|graph| {
                graph
                    .find_by_image(image)
                    .into_iter()
                    .map(move |b| (graph.name(), b.name.as_str()))
            })
            .collect()
    }

    /// Validate every package, reporting all failing packages together.
    pub fn validate(&self) -> Result<(), DcmError> {
        let failing: Vec<&PackageGraph> = self
            .packages
            .values()
            .filter(|g| !violations(g).is_empty())
            .collect();
        match failing.as_slice() {
            [] => Ok(()),
            [one] => validate_package(one),
            many => {
                let mut message = Vec::new();
                let mut state = String::new();
                for graph in many {
                    message.push(format!("package {:?}: {}", graph.name(), violations(graph).join("; ")));
                    state.push_str(&graph.to_string());
                }
                Err(DcmError::InvalidModel {
                    message: message.join(" | "),
                    state,
                })
            }
        }
    }
}

/// Merge a channel blob's entries into the memberships, skips and skip
/// ranges of the bundles they name.
fn fold_channel(graph: &mut PackageGraph, channel: ChannelBlob, problems: &mut Vec<String>) {
    let package = graph.name().to_string();
    for entry in &channel.entries {
        let Some(bundle) = graph.bundle_mut(&entry.name) else {
            problems.push(format!(
                "channel {:?} of package {package:?} lists unknown bundle {:?}",
                channel.name, entry.name
            ));
            continue;
        };
        let replaces = entry.replaces.as_deref().filter(|r| !r.is_empty());
        match bundle.channels.iter_mut().find(|ch| ch.name == channel.name) {
            None => {
                bundle.add_channel(&channel.name, replaces);
            }
            Some(membership) => match (membership.replaces.as_deref(), replaces) {
                (None, Some(r)) => membership.replaces = Some(r.to_string()),
                (Some(have), Some(r)) if have != r => problems.push(format!(
                    "channel {:?} entry {:?} replaces {r:?}, but the bundle replaces {have:?}",
                    channel.name, entry.name
                )),
                _ => {}
            },
        }
        for skip in &entry.skips {
            bundle.add_skip(skip);
        }
        if bundle.skip_range.is_none() {
            bundle.skip_range = entry.skip_range.clone().filter(|r| !r.is_empty());
        }
        bundle.normalize();
    }
    graph.keep_channel_template(channel);
}
