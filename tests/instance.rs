//! Integration tests for reading and building instances.
use evsite::cli::load_instance_data;
use evsite::instance::{Instance, InstanceData, builtin_instance};
use evsite::report::SiteSegmentTable;
use float_cmp::assert_approx_eq;
use std::fs;
use tempfile::tempdir;

/// The TOML written by `instance dump` can be read back unchanged
#[test]
fn test_builtin_instance_toml_round_trip() {
    let data = builtin_instance();
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("instance.toml");
    fs::write(&file_path, toml::to_string(&data).unwrap()).unwrap();

    assert_eq!(load_instance_data(Some(&file_path)).unwrap(), data);
    assert_eq!(load_instance_data(None).unwrap(), data);
}

#[test]
fn test_instance_file_with_currency_index() {
    let mut data = builtin_instance();
    data.currency_index = Some(1000.0);
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("instance.toml");
    fs::write(&file_path, toml::to_string(&data).unwrap()).unwrap();

    let read_back = InstanceData::from_path(&file_path).unwrap();
    assert_eq!(read_back.currency_index, Some(1000.0));

    let scaled = Instance::from_path(&file_path).unwrap();
    let unscaled = Instance::builtin().unwrap();
    assert_approx_eq!(
        f64,
        scaled.capex_budget.value(),
        unscaled.capex_budget.value() / 1000.0
    );
}

#[test]
fn test_builtin_demand_summary() {
    let instance = Instance::builtin().unwrap();
    let demand = SiteSegmentTable::demand(&instance).unwrap();

    assert_approx_eq!(
        f64,
        demand
            .get(&"Copiapo".into(), &"HeavyFreight".into())
            .unwrap()
            .value(),
        2600.0,
        epsilon = 1e-9
    );

    let expected_total: f64 = [
        2600.0, 1150.0, 620.0, 1900.0, 720.0, 460.0, 2100.0, 840.0, 510.0, 3050.0, 980.0, 730.0,
    ]
    .iter()
    .sum();
    assert_approx_eq!(
        f64,
        demand.grand_total().value(),
        expected_total,
        epsilon = 1e-6
    );
}

#[test]
fn test_missing_instance_file() {
    let dir = tempdir().unwrap();
    assert!(load_instance_data(Some(&dir.path().join("missing.toml"))).is_err());
}
