use dcm_image::{ImageRef, ImageSource, MirrorSource, DEFAULT_CHANNEL_LABEL};
use tempfile::TempDir;

const BUNDLE: &str = r#"{
  "bundle": {
    "schema": "olm.bundle",
    "name": "etcd.v2",
    "package": "etcd",
    "image": "quay.io/acme/etcd-bundle:v2",
    "properties": [
      {"type": "olm.package", "value": {"packageName": "etcd", "version": "2.0.0"}},
      {"type": "olm.channel", "value": {"name": "stable", "replaces": "etcd.v1"}}
    ]
  },
  "description": "Runs etcd clusters"
}"#;

fn mirror_with_bundle() -> (TempDir, MirrorSource, ImageRef) {
    let tmp = TempDir::new().unwrap();
    let image = ImageRef::parse("quay.io/acme/etcd-bundle:v2").unwrap();
    let source = MirrorSource::new(tmp.path());
    let dir = source.image_dir(&image);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("bundle.json"), BUNDLE).unwrap();
    (tmp, source, image)
}

#[test]
fn test_mirror_dir_name() {
    let (tmp, source, image) = mirror_with_bundle();
    assert_eq!(
        source.image_dir(&image),
        tmp.path().join("quay.io_acme_etcd-bundle_v2")
    );
}

#[test]
fn test_render_bundle_from_mirror() {
    let (_tmp, source, image) = mirror_with_bundle();
    let rendered = source.render_bundle(&image).unwrap();
    assert_eq!(rendered.bundle.name, "etcd.v2");
    assert_eq!(rendered.bundle.properties.len(), 2);
    assert_eq!(rendered.description.as_deref(), Some("Runs etcd clusters"));
    assert!(rendered.icon.is_none());
}

#[test]
fn test_missing_labels_file_means_no_hint() {
    let (_tmp, source, image) = mirror_with_bundle();
    assert!(source.labels(&image).unwrap().is_empty());
    assert_eq!(source.default_channel(&image).unwrap(), None);
}

#[test]
fn test_default_channel_label() {
    let (_tmp, source, image) = mirror_with_bundle();
    let labels = format!(r#"{{"{DEFAULT_CHANNEL_LABEL}": "stable"}}"#);
    std::fs::write(source.image_dir(&image).join("labels.json"), labels).unwrap();
    assert_eq!(
        source.default_channel(&image).unwrap().as_deref(),
        Some("stable")
    );
}

#[test]
fn test_unknown_image_is_an_error() {
    let (_tmp, source, _) = mirror_with_bundle();
    let other = ImageRef::parse("quay.io/acme/other:v1").unwrap();
    let err = source.render_bundle(&other).unwrap_err();
    assert!(err.to_string().contains("not found in mirror"), "got: {err}");
}

#[test]
fn test_render_catalog_from_mirror() {
    let tmp = TempDir::new().unwrap();
    let image = ImageRef::parse("quay.io/acme/index:latest").unwrap();
    let source = MirrorSource::new(tmp.path());
    let dir = source.image_dir(&image);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("catalog.json"),
        r#"{"schema": "olm.package", "name": "etcd", "defaultChannel": "stable"}"#,
    )
    .unwrap();
    let cfg = source.render_catalog(&image).unwrap();
    assert_eq!(cfg.packages.len(), 1);
}
