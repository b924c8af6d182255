//! Default channel selection.
//!
//! The package's maximum-version channel head decides the default channel
//! through the hint its image carries. The maximum must be unique across the
//! whole package; a tie inside a single channel is only reported.

use std::collections::BTreeMap;

use dcm_core::bundle::Bundle;
use dcm_util::errors::DcmError;

use crate::graph::PackageGraph;
use crate::heads::channel_heads;
use crate::version;

/// Source of per-bundle default channel hints, typically image labels.
pub trait DefaultChannelHints {
    /// The default channel the bundle's image asks for, if any.
    fn default_channel_hint(&self, bundle: &Bundle) -> Result<Option<String>, DcmError>;
}

impl<F> DefaultChannelHints for F
where
    F: Fn(&Bundle) -> Result<Option<String>, DcmError>,
{
    fn default_channel_hint(&self, bundle: &Bundle) -> Result<Option<String>, DcmError> {
        self(bundle)
    }
}

/// The highest-version head of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    pub max_head: String,
    /// Heads sharing the maximum version, `max_head` included.
    pub ties: usize,
}

/// Summarize every channel's heads.
pub fn channel_summaries(graph: &PackageGraph) -> Result<BTreeMap<String, ChannelSummary>, DcmError> {
    let mut summaries = BTreeMap::new();
    for (channel, heads) in channel_heads(graph)? {
        let mut summary: Option<(ChannelSummary, &Bundle)> = None;
        for b in heads.iter().filter_map(|name| graph.bundle(name)) {
            summary = Some(match summary {
                None => (
                    ChannelSummary {
                        max_head: b.name.clone(),
                        ties: 1,
                    },
                    b,
                ),
                Some((mut current, max)) => match version::compare(&b.version, &max.version) {
                    std::cmp::Ordering::Less => (current, max),
                    std::cmp::Ordering::Equal => {
                        current.ties += 1;
                        (current, max)
                    }
                    std::cmp::Ordering::Greater => (
                        ChannelSummary {
                            max_head: b.name.clone(),
                            ties: 1,
                        },
                        b,
                    ),
                },
            });
        }
        if let Some((summary, _)) = summary {
            if summary.ties > 1 {
                tracing::debug!(
                    package = graph.name(),
                    channel = %channel,
                    "{} heads share the maximum version",
                    summary.ties
                );
            }
            summaries.insert(channel, summary);
        }
    }
    Ok(summaries)
}

/// Pick the package's default channel.
///
/// Fails with `AmbiguousDefaultChannel` when several heads share the
/// package-wide maximum version, and with `NoDefaultChannel` when the
/// maximum head has no hint or hints at a channel the package lacks.
pub fn select_default_channel(
    graph: &PackageGraph,
    hints: &dyn DefaultChannelHints,
) -> Result<String, DcmError> {
    let summaries = channel_summaries(graph)?;

    let mut candidates: Vec<&Bundle> = summaries
        .values()
        .filter_map(|s| graph.bundle(&s.max_head))
        .collect();
    candidates.sort_by(|a, b| version::compare(&b.version, &a.version).then(a.name.cmp(&b.name)));
    candidates.dedup_by(|a, b| a.name == b.name);

    let Some(max) = candidates.first().copied() else {
        return Err(DcmError::NoDefaultChannel {
            package: graph.name().to_string(),
            message: "the package has no channel heads".to_string(),
        });
    };

    // Channel-level maxima can hide a tie, so compare against every head.
    let mut tied: Vec<String> = channel_heads(graph)?
        .into_values()
        .flatten()
        .filter(|name| {
            graph
                .bundle(name)
                .is_some_and(|b| version::compare(&b.version, &max.version).is_eq())
        })
        .collect();
    tied.sort();
    tied.dedup();
    if tied.len() > 1 {
        return Err(DcmError::AmbiguousDefaultChannel {
            package: graph.name().to_string(),
            version: max.version.to_string(),
            bundles: tied,
        });
    }

    let hint = hints
        .default_channel_hint(max)?
        .filter(|h| !h.is_empty())
        .ok_or_else(|| DcmError::NoDefaultChannel {
            package: graph.name().to_string(),
            message: format!("maximum-version head {max} carries no default channel hint"),
        })?;
    if !graph.channel_names().contains(&hint) {
        return Err(DcmError::NoDefaultChannel {
            package: graph.name().to_string(),
            message: format!("{max} names default channel {hint:?}, which the package does not have"),
        });
    }
    Ok(hint)
}
