//! Directory-backed catalog store.
//!
//! Loading reads every `*.json` file below the root. Saving writes one file
//! per package plus a global file for package-less blobs, skips files whose
//! content is unchanged, and removes loaded files that were not rewritten.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use dcm_util::errors::DcmError;
use dcm_util::{fs, hash};

use crate::declcfg::{DeclarativeConfig, Meta};

/// File holding blobs that belong to no package.
pub const GLOBAL_FILE_NAME: &str = "__global.json";

/// Default per-package file name.
pub const DEFAULT_FILE_NAME: &str = "index.json";

/// What [`CatalogStore::save`] did to the tree.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

/// A catalog rooted at a directory.
#[derive(Debug)]
pub struct CatalogStore {
    root: PathBuf,
    file_name: String,
    loaded: BTreeSet<PathBuf>,
}

impl CatalogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_file_name(root, DEFAULT_FILE_NAME)
    }

    pub fn with_file_name(root: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            file_name: file_name.into(),
            loaded: BTreeSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every catalog file below the root, in path order.
    pub fn load(&mut self) -> Result<DeclarativeConfig, DcmError> {
        let mut files = Vec::new();
        if self.root.is_dir() {
            collect_json_files(&self.root, &mut files)?;
        }
        files.sort();

        let mut cfg = DeclarativeConfig::default();
        for path in files {
            let data = std::fs::read_to_string(&path).map_err(|e| DcmError::Catalog {
                path: path.display().to_string(),
                message: format!("failed to read: {e}"),
            })?;
            let part = DeclarativeConfig::from_json_stream(&data, &path.display().to_string())?;
            tracing::debug!(
                path = %path.display(),
                packages = part.packages.len(),
                bundles = part.bundles.len(),
                channels = part.channels.len(),
                "loaded catalog file"
            );
            cfg.merge(part);
            self.loaded.insert(path);
        }
        Ok(cfg)
    }

    /// Write the whole catalog back under the root.
    pub fn save(&self, cfg: &DeclarativeConfig) -> Result<SaveReport, DcmError> {
        fs::ensure_dir(&self.root)?;

        let mut files: BTreeMap<PathBuf, DeclarativeConfig> = BTreeMap::new();
        for pkg in &cfg.packages {
            files
                .entry(self.package_file(&pkg.name))
                .or_default()
                .packages
                .push(pkg.clone());
        }
        for bundle in &cfg.bundles {
            files
                .entry(self.package_file(&bundle.package))
                .or_default()
                .bundles
                .push(bundle.clone());
        }
        for channel in &cfg.channels {
            files
                .entry(self.package_file(&channel.package))
                .or_default()
                .channels
                .push(channel.clone());
        }
        for meta in &cfg.others {
            let path = match &meta.package {
                Some(pkg) => self.package_file(pkg),
                None => self.root.join(GLOBAL_FILE_NAME),
            };
            files.entry(path).or_default().others.push(meta.clone());
        }

        let mut report = SaveReport::default();
        for (path, mut part) in files {
            part.bundles.sort_by(|a, b| a.name.cmp(&b.name));
            part.channels.sort_by(|a, b| a.name.cmp(&b.name));
            sort_others(&mut part.others);
            let data = part.to_json_stream()?;
            if hash::file_matches(&path, data.as_bytes()) {
                report.unchanged.push(path);
                continue;
            }
            fs::write_atomic(&path, data.as_bytes())?;
            tracing::debug!(path = %path.display(), "wrote catalog file");
            report.written.push(path);
        }

        for stale in &self.loaded {
            let produced = report.written.contains(stale) || report.unchanged.contains(stale);
            if !produced && stale.is_file() {
                std::fs::remove_file(stale)?;
                tracing::debug!(path = %stale.display(), "removed stale catalog file");
                report.removed.push(stale.clone());
            }
        }
        Ok(report)
    }

    fn package_file(&self, package: &str) -> PathBuf {
        self.root.join(package).join(&self.file_name)
    }
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), DcmError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

fn sort_others(others: &mut [Meta]) {
    others.sort_by(|a, b| {
        let name = |m: &Meta| {
            m.blob
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        a.schema.cmp(&b.schema).then_with(|| name(a).cmp(&name(b)))
    });
}
