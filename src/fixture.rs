//! Fixtures for tests
use crate::formulation::build_problem;
use crate::instance::{
    ChargerTypeData, Instance, InstanceData, PanelTypeData, SegmentData, SiteData,
};
use crate::solution::Solution;
use crate::units::Money;
use indexmap::indexmap;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// A two-hour, single-site instance with one segment, panel type and charger type
#[fixture]
pub fn instance_data() -> InstanceData {
    InstanceData {
        name: "test".into(),
        horizon_days: 1.0,
        capex_budget: 1000.0,
        currency_index: None,
        demand_profile: vec![1.0, 3.0],
        grid_price_profile: vec![10.0, 10.0],
        solar_profile: vec![0.0, 0.5],
        penalty_demand_factor: 0.4,
        segments: vec![SegmentData {
            id: "car".into(),
            sale_price: 12.0,
            operating_cost: 2.0,
            base_penalty: 2.0,
        }],
        panel_types: vec![PanelTypeData {
            id: "pv".into(),
            peak_output: 0.5,
            unit_capex: 100.0,
            om_cost: 10.0,
        }],
        charger_types: vec![ChargerTypeData {
            id: "dc".into(),
            rated_power: 150.0,
            unit_capex: 50.0,
            availability: None,
        }],
        sites: vec![SiteData {
            id: "site1".into(),
            grid_price_weight: 2.0,
            priority: 1.5,
            daily_demand: indexmap! { "car".into() => 100.0 },
            panel_capacity: indexmap! { "pv".into() => 10 },
            panel_fixed_cost: indexmap! { "pv".into() => 200.0 },
            charger_capacity: indexmap! { "dc".into() => 2 },
        }],
    }
}

#[fixture]
pub fn instance(instance_data: InstanceData) -> Instance {
    Instance::from_data(&instance_data).unwrap()
}

/// A feasible solution for [`instance`]: the site is opened with 4 panels and 1 charger, and all
/// demand is served except 5 kWh in hour 1.
///
/// The column values are in variable order: open, panel chosen, panel count, charger count, served
/// (hours 0 and 1), grid draw (hours 0 and 1).
#[fixture]
pub fn solution(instance: Instance) -> Solution {
    let formulation = build_problem(&instance).unwrap();
    Solution::new(
        vec![1.0, 1.0, 4.0, 1.0, 25.0, 70.0, 25.0, 69.0],
        formulation.variables,
        Money(123_456.7),
    )
}
