use crate::{
    config::Scalar,
    job::input::{apply, load, rewrite, to_pretty_string, validate_basis, InputError},
    sweep::Combination,
};
use serde_json::{json, Value};
use std::{fs, path::PathBuf};

fn template() -> Value {
    json!({
        "basis": {
            "order": 7,
            "node_sequence": "linear_parabolic",
            "num_nodes": 100,
            "x_min": 0.0,
            "x_max": 100.0,
            "lmax": 10,
            "mmax": 0
        },
        "time_step": 0.1,
        "laser": { "frequency": 0.057, "cycles": 10 },
        "observables": ["norm", "dipole"]
    })
}

fn combination(lmax: u64) -> Combination {
    Combination {
        index: 0,
        num_nodes: 800,
        time_step: Scalar::Real(0.05),
        x_max: Scalar::Integer(750),
        lmax,
        directory: PathBuf::from("n_800_dt_0.05_bs_750_l_40"),
    }
}

#[test]
pub fn apply_overwrites_swept_fields_only() {
    let mut document = template();
    apply(&mut document, &combination(40)).unwrap();

    assert_eq!(document["time_step"], json!(0.05));
    assert_eq!(document["basis"]["num_nodes"], json!(800));
    assert_eq!(document["basis"]["x_max"], json!(750));
    assert_eq!(document["basis"]["lmax"], json!(40));

    let original = template();
    assert_eq!(document["laser"], original["laser"]);
    assert_eq!(document["observables"], original["observables"]);
    for field in ["order", "node_sequence", "x_min", "mmax"] {
        assert_eq!(document["basis"][field], original["basis"][field]);
    }
}

#[test]
pub fn apply_requires_basis_object() {
    let mut document = json!({ "time_step": 0.1, "basis": 3 });

    assert!(matches!(
        apply(&mut document, &combination(40)),
        Err(InputError::MustContain { field: "basis", .. })
    ));
    assert!(matches!(
        apply(&mut json!([1, 2]), &combination(40)),
        Err(InputError::NotAnObject)
    ));
}

#[test]
pub fn validate_rejects_incomplete_basis() {
    assert!(validate_basis(&template()).is_ok());

    let mut missing = template();
    missing["basis"].as_object_mut().unwrap().remove("x_min");
    assert!(matches!(
        validate_basis(&missing),
        Err(InputError::MustContain { field: "x_min", kind: "number" })
    ));

    let mut wrong_type = template();
    wrong_type["basis"]["node_sequence"] = json!(1);
    assert!(matches!(
        validate_basis(&wrong_type),
        Err(InputError::MustContain { field: "node_sequence", .. })
    ));

    assert!(matches!(
        validate_basis(&json!({ "time_step": 0.1 })),
        Err(InputError::MustContain { field: "basis", .. })
    ));
}

#[test]
pub fn validate_rejects_mmax_above_lmax() {
    let mut document = template();
    document["basis"]["mmax"] = json!(12);

    assert!(matches!(
        validate_basis(&document),
        Err(InputError::MmaxExceedsLmax { .. })
    ));
}

#[test]
pub fn pretty_output_uses_four_spaces() {
    let rendered = to_pretty_string(&json!({ "basis": { "lmax": 30 } })).unwrap();

    assert_eq!(rendered, "{\n    \"basis\": {\n        \"lmax\": 30\n    }\n}");
}

#[test]
pub fn rewrite_truncates_and_keeps_key_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.json");
    // trailing whitespace makes the original longer than anything rewrite produces
    let original = format!("{}{}", to_pretty_string(&template()).unwrap(), " ".repeat(4096));
    fs::write(&path, &original).unwrap();

    let written = rewrite(&path, &combination(40)).unwrap();
    let on_disk = fs::read_to_string(&path).unwrap();

    assert!(on_disk.len() < original.len());
    assert_eq!(load(&path).unwrap(), written);
    let keys: Vec<_> = written.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, ["basis", "time_step", "laser", "observables"]);
}

#[test]
pub fn rewrite_refuses_lmax_below_mmax() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.json");
    let mut document = template();
    document["basis"]["mmax"] = json!(35);
    fs::write(&path, to_pretty_string(&document).unwrap()).unwrap();

    assert!(matches!(
        rewrite(&path, &combination(30)),
        Err(InputError::MmaxExceedsLmax { .. })
    ));
}

#[test]
pub fn load_reports_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.json");
    fs::write(&path, "{ \"basis\": ").unwrap();

    assert!(matches!(load(&path), Err(InputError::Parse { .. })));
    assert!(matches!(
        load(&dir.path().join("missing.json")),
        Err(InputError::Io { .. })
    ));
}
