use std::sync::Arc;

use modwire_core::capability::Capability;
use modwire_core::requirement::Requirement;
use modwire_core::resource::ResourceId;
use modwire_core::wire::Wire;

fn rid(s: &str) -> ResourceId {
    ResourceId::parse(s).unwrap()
}

#[test]
fn resource_id_ordering_is_name_then_version() {
    let mut ids = vec![rid("b:1.0.0"), rid("a:2.0.0"), rid("a:1.0.0")];
    ids.sort();
    assert_eq!(ids[0], rid("a:1.0.0"));
    assert_eq!(ids[1], rid("a:2.0.0"));
    assert_eq!(ids[2], rid("b:1.0.0"));
}

#[test]
fn wire_serializes_to_json() {
    let wire = Wire::new(
        Arc::new(Requirement::package(rid("app:1.0.0"), "org.example.api")),
        Arc::new(Capability::package(
            rid("lib:2.0.0"),
            "org.example.api",
            ["org.example.base"],
        )),
    );
    let json = serde_json::to_string(&wire).unwrap();
    assert!(json.contains("org.example.api"));
    assert!(json.contains("org.example.base"));

    let back: Wire = serde_json::from_str(&json).unwrap();
    assert_eq!(back, wire);
}

#[test]
fn requirement_equality_is_by_value() {
    let a = Requirement::package(rid("app:1.0.0"), "org.example.api");
    let b = Requirement::package(rid("app:1.0.0"), "org.example.api");
    assert_eq!(a, b);
    assert_ne!(a, b.clone().with_optional());
}
