//! Package summary metadata carried inside a rendered bundle.
//!
//! A rendered bundle embeds its manifests as `olm.bundle.object`
//! properties holding base64-encoded JSON. The release descriptor among
//! them (kind `ClusterServiceVersion`) carries the description and icon.
//! `olm.csv.metadata` is consulted for the description when no descriptor
//! object is embedded.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use dcm_core::declcfg::BundleBlob;
use dcm_core::package::Icon;

const TYPE_BUNDLE_OBJECT: &str = "olm.bundle.object";
const TYPE_CSV_METADATA: &str = "olm.csv.metadata";
const CSV_KIND: &str = "ClusterServiceVersion";

/// Description and icon found in the bundle's properties.
pub fn summary(blob: &BundleBlob) -> (Option<String>, Option<Icon>) {
    let csv = blob
        .properties
        .iter()
        .filter(|p| p.kind == TYPE_BUNDLE_OBJECT)
        .filter_map(|p| decode_object(&p.value))
        .find(|obj| obj.get("kind").and_then(Value::as_str) == Some(CSV_KIND));

    let spec = csv.as_ref().and_then(|c| c.get("spec"));
    let description = spec
        .and_then(|s| s.get("description"))
        .and_then(Value::as_str)
        .or_else(|| {
            blob.properties
                .iter()
                .find(|p| p.kind == TYPE_CSV_METADATA)
                .and_then(|p| p.value.get("description"))
                .and_then(Value::as_str)
        })
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    let icon = spec
        .and_then(|s| s.get("icon"))
        .and_then(Value::as_array)
        .and_then(|icons| icons.first())
        .and_then(|icon| {
            Some(Icon {
                data: icon.get("base64data")?.as_str()?.to_string(),
                media_type: icon.get("mediatype")?.as_str()?.to_string(),
            })
        });
    (description, icon)
}

fn decode_object(value: &Value) -> Option<Value> {
    let data = value.get("data")?.as_str()?;
    let bytes = match STANDARD.decode(data) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("skipping undecodable bundle object: {e}");
            return None;
        }
    };
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcm_core::property::RawProperty;
    use serde_json::json;

    fn blob(properties: Vec<RawProperty>) -> BundleBlob {
        serde_json::from_value(json!({
            "schema": "olm.bundle",
            "name": "etcd.v1",
            "package": "etcd",
            "properties": properties,
        }))
        .unwrap()
    }

    #[test]
    fn reads_embedded_csv() {
        let csv = json!({
            "kind": "ClusterServiceVersion",
            "spec": {
                "description": "Runs etcd clusters",
                "icon": [{"base64data": "PHN2Zy8+", "mediatype": "image/svg+xml"}]
            }
        });
        let data = STANDARD.encode(csv.to_string());
        let (description, icon) = summary(&blob(vec![RawProperty {
            kind: TYPE_BUNDLE_OBJECT.to_string(),
            value: json!({ "data": data }),
        }]));
        assert_eq!(description.as_deref(), Some("Runs etcd clusters"));
        let icon = icon.unwrap();
        assert_eq!(icon.media_type, "image/svg+xml");
        assert_eq!(icon.data, "PHN2Zy8+");
    }

    #[test]
    fn falls_back_to_csv_metadata() {
        let (description, icon) = summary(&blob(vec![RawProperty {
            kind: TYPE_CSV_METADATA.to_string(),
            value: json!({ "description": "From metadata" }),
        }]));
        assert_eq!(description.as_deref(), Some("From metadata"));
        assert!(icon.is_none());
    }

    #[test]
    fn ignores_garbage_objects() {
        let (description, icon) = summary(&blob(vec![RawProperty {
            kind: TYPE_BUNDLE_OBJECT.to_string(),
            value: json!({ "data": "not base64!" }),
        }]));
        assert!(description.is_none());
        assert!(icon.is_none());
    }
}
