//! Image source backed by external tools.
//!
//! Rendering runs the configured render command (by default `opm render`)
//! and label lookup runs the inspect command (by default `skopeo inspect`).
//! Both tools fetch from the registry themselves, so pulling amounts to a
//! successful inspection.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use dcm_core::config::ImagesConfig;
use dcm_core::declcfg::DeclarativeConfig;
use dcm_util::errors::DcmError;
use dcm_util::process::CommandBuilder;

use crate::csv;
use crate::reference::ImageRef;
use crate::source::{ImageSource, RenderedBundle};

pub struct CommandSource {
    render_command: Vec<String>,
    inspect_command: Vec<String>,
    labels: RefCell<HashMap<String, BTreeMap<String, String>>>,
}

impl CommandSource {
    pub fn new(render_command: Vec<String>, inspect_command: Vec<String>) -> Self {
        Self {
            render_command,
            inspect_command,
            labels: RefCell::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &ImagesConfig) -> Self {
        Self::new(config.render_command.clone(), config.inspect_command.clone())
    }

    fn run(&self, template: &[String], image: &ImageRef) -> Result<Vec<u8>, DcmError> {
        let cmd = CommandBuilder::from_template(template, &[("image", image.as_str())])
            .ok_or_else(|| DcmError::Config {
                message: "image command template is empty".to_string(),
            })?;
        cmd.exec_stdout().map_err(|e| DcmError::Image {
            image: image.to_string(),
            message: e.to_string(),
        })
    }

    fn render(&self, image: &ImageRef) -> Result<DeclarativeConfig, DcmError> {
        let out = self.run(&self.render_command, image)?;
        let text = String::from_utf8_lossy(&out);
        DeclarativeConfig::from_json_stream(&text, image.as_str()).map_err(|e| DcmError::Image {
            image: image.to_string(),
            message: format!("render output is not a catalog: {e}"),
        })
    }
}

impl ImageSource for CommandSource {
    fn pull(&self, image: &ImageRef) -> Result<(), DcmError> {
        self.labels(image).map(|_| ())
    }

    fn labels(&self, image: &ImageRef) -> Result<BTreeMap<String, String>, DcmError> {
        if let Some(cached) = self.labels.borrow().get(image.as_str()) {
            return Ok(cached.clone());
        }
        let out = self.run(&self.inspect_command, image)?;
        let labels = parse_labels(&out).map_err(|message| DcmError::Image {
            image: image.to_string(),
            message,
        })?;
        self.labels
            .borrow_mut()
            .insert(image.as_str().to_string(), labels.clone());
        Ok(labels)
    }

    fn render_bundle(&self, image: &ImageRef) -> Result<RenderedBundle, DcmError> {
        let cfg = self.render(image)?;
        let mut bundles = cfg.bundles;
        let bundle = match bundles.len() {
            1 => bundles.remove(0),
            n => {
                return Err(DcmError::Image {
                    image: image.to_string(),
                    message: format!("expected 1 bundle in render output, found {n}"),
                })
            }
        };
        let (description, icon) = csv::summary(&bundle);
        Ok(RenderedBundle {
            bundle,
            description,
            icon,
        })
    }

    fn render_catalog(&self, image: &ImageRef) -> Result<DeclarativeConfig, DcmError> {
        self.render(image)
    }
}

/// Labels from inspect output: a top-level `Labels` object (skopeo), or
/// `Config.Labels` of the first element of an array (podman, docker).
fn parse_labels(out: &[u8]) -> Result<BTreeMap<String, String>, String> {
    let value: Value =
        serde_json::from_slice(out).map_err(|e| format!("inspect output is not JSON: {e}"))?;
    let root = match &value {
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    };
    let labels = root
        .get("Labels")
        .or_else(|| root.get("Config").and_then(|c| c.get("Labels")));
    let mut map = BTreeMap::new();
    if let Some(Value::Object(entries)) = labels {
        for (key, value) in entries {
            if let Some(s) = value.as_str() {
                map.insert(key.clone(), s.to_string());
            }
        }
    }
    Ok(map)
}
