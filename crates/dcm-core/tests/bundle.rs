use dcm_core::bundle::Bundle;
use dcm_core::declcfg::BundleBlob;
use dcm_util::errors::DcmError;
use serde_json::json;

fn blob(value: serde_json::Value) -> BundleBlob {
    serde_json::from_value(value).unwrap()
}

fn etcd_blob() -> BundleBlob {
    blob(json!({
        "schema": "olm.bundle",
        "name": "etcdoperator.v0.9.4",
        "package": "etcd",
        "image": "quay.io/coreos/etcd-operator:v0.9.4",
        "properties": [
            {"type": "olm.gvk", "value": {"group": "etcd.database.coreos.com", "kind": "EtcdCluster", "version": "v1beta2"}},
            {"type": "olm.package", "value": {"packageName": "etcd", "version": "0.9.4"}},
            {"type": "olm.channel", "value": {"name": "alpha", "replaces": "etcdoperator.v0.9.2"}},
            {"type": "olm.channel", "value": {"name": "stable", "replaces": "etcdoperator.v0.9.2"}},
            {"type": "olm.skips", "value": "etcdoperator.v0.9.0"},
            {"type": "olm.skips", "value": "etcdoperator.v0.9.0"},
            {"type": "olm.skipRange", "value": "<0.9.4"}
        ],
        "relatedImages": [{"name": "operator", "image": "quay.io/coreos/etcd-operator:v0.9.4"}]
    }))
}

#[test]
fn test_from_blob_decodes_graph_properties() {
    let b = Bundle::from_blob(etcd_blob()).unwrap();
    assert_eq!(b.version.to_string(), "0.9.4");
    assert_eq!(b.channel_names().into_iter().collect::<Vec<_>>(), ["alpha", "stable"]);
    assert_eq!(b.replaces().unwrap(), Some("etcdoperator.v0.9.2"));
    assert_eq!(b.skips, ["etcdoperator.v0.9.0"]);
    assert_eq!(b.skip_range.as_deref(), Some("<0.9.4"));
    assert_eq!(b.properties.len(), 1);
    assert_eq!(b.properties[0].kind, "olm.gvk");
}

#[test]
fn test_to_blob_is_canonical_and_duplicate_free() {
    let b = Bundle::from_blob(etcd_blob()).unwrap();
    let out = b.to_blob();
    let kinds: Vec<&str> = out.properties.iter().map(|p| p.kind.as_str()).collect();
    assert_eq!(
        kinds,
        [
            "olm.package",
            "olm.channel",
            "olm.channel",
            "olm.skips",
            "olm.skipRange",
            "olm.gvk"
        ]
    );
    assert_eq!(Bundle::from_blob(out).unwrap(), b);
}

#[test]
fn test_missing_package_property_is_malformed() {
    let err = Bundle::from_blob(blob(json!({
        "schema": "olm.bundle",
        "name": "a.v1",
        "package": "a",
        "properties": []
    })))
    .unwrap_err();
    assert!(matches!(err, DcmError::MalformedProperty { ref bundle, .. } if bundle == "a.v1"));
}

#[test]
fn test_duplicate_package_property_is_malformed() {
    let err = Bundle::from_blob(blob(json!({
        "schema": "olm.bundle",
        "name": "a.v1",
        "package": "a",
        "properties": [
            {"type": "olm.package", "value": {"packageName": "a", "version": "1.0.0"}},
            {"type": "olm.package", "value": {"packageName": "a", "version": "1.0.1"}}
        ]
    })))
    .unwrap_err();
    assert!(err.to_string().contains("found 2 olm.package properties"), "got: {err}");
}

#[test]
fn test_non_semver_version_is_malformed() {
    let err = Bundle::from_blob(blob(json!({
        "schema": "olm.bundle",
        "name": "a.v1",
        "package": "a",
        "properties": [
            {"type": "olm.package", "value": {"packageName": "a", "version": "v1"}}
        ]
    })))
    .unwrap_err();
    assert!(matches!(err, DcmError::MalformedProperty { .. }));
}

#[test]
fn test_two_substitutes_for_is_malformed() {
    let err = Bundle::from_blob(blob(json!({
        "schema": "olm.bundle",
        "name": "a.v1",
        "package": "a",
        "properties": [
            {"type": "olm.package", "value": {"packageName": "a", "version": "1.0.0"}},
            {"type": "olm.substitutesFor", "value": "x"},
            {"type": "olm.substitutesFor", "value": "y"}
        ]
    })))
    .unwrap_err();
    assert!(matches!(err, DcmError::MalformedProperty { .. }));
}

#[test]
fn test_conflicting_replaces_are_ambiguous() {
    let b = Bundle::from_blob(blob(json!({
        "schema": "olm.bundle",
        "name": "a.v3",
        "package": "a",
        "properties": [
            {"type": "olm.package", "value": {"packageName": "a", "version": "3.0.0"}},
            {"type": "olm.channel", "value": {"name": "stable", "replaces": "a.v2"}},
            {"type": "olm.channel", "value": {"name": "fast", "replaces": "a.v1"}}
        ]
    })))
    .unwrap();
    match b.replaces() {
        Err(DcmError::AmbiguousReplaces { targets, .. }) => assert_eq!(targets, ["a.v1", "a.v2"]),
        other => panic!("expected ambiguous replaces, got {other:?}"),
    }
}

#[test]
fn test_channel_without_replaces_is_not_a_second_target() {
    let b = Bundle::from_blob(blob(json!({
        "schema": "olm.bundle",
        "name": "a.v3",
        "package": "a",
        "properties": [
            {"type": "olm.package", "value": {"packageName": "a", "version": "3.0.0"}},
            {"type": "olm.channel", "value": {"name": "stable", "replaces": "a.v2"}},
            {"type": "olm.channel", "value": {"name": "fast"}},
            {"type": "olm.channel", "value": {"name": "candidate", "replaces": "a.v2"}}
        ]
    })))
    .unwrap();
    assert_eq!(b.replaces().unwrap(), Some("a.v2"));
    assert_eq!(b.replaces_in("fast"), None);
}

#[test]
fn test_channel_edits() {
    let mut b = Bundle::from_blob(etcd_blob()).unwrap();
    assert!(!b.add_channel("alpha", Some("etcdoperator.v0.9.2")));
    assert!(b.add_channel("beta", Some("etcdoperator.v0.9.2")));
    assert!(b.remove_channel("alpha"));
    assert!(!b.in_channel("alpha"));
    b.set_replaces(None);
    assert_eq!(b.replaces().unwrap(), None);
    assert_eq!(b.replaces_in("beta"), None);
}
