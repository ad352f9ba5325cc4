//! Integration tests which formulate and solve instances with HiGHS.
use evsite::formulation::build_problem;
use evsite::instance::{
    ChargerTypeData, Instance, InstanceData, PanelTypeData, SegmentData, SiteData,
    builtin_instance,
};
use evsite::solution::{FEASIBILITY_TOLERANCE, Solution};
use evsite::solver::{SolveStatus, SolverOptions, solve};
use evsite::units::Money;
use float_cmp::assert_approx_eq;
use indexmap::indexmap;
use rstest::rstest;

/// Formulate and solve an instance, asserting that an optimal solution is found
fn solve_optimal(instance: &Instance) -> Solution {
    let formulation = build_problem(instance).unwrap();
    let outcome = solve(formulation, &SolverOptions::default()).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert!(outcome.is_optimal());

    outcome.solution.unwrap()
}

/// Recompute the objective from the solution values and the instance's tables
fn recompute_objective(instance: &Instance, solution: &Solution) -> Money {
    let mut daily = Money::default();
    for site_id in &instance.sites {
        for hour in instance.hours() {
            for segment_id in &instance.segments {
                let margin = instance.sale_price.get(segment_id).unwrap()
                    - instance.op_cost.get(segment_id).unwrap();
                daily += margin * solution.served(site_id, hour, segment_id);
            }
            let price = instance.grid_price.get(&(site_id.clone(), hour)).unwrap();
            daily -= price * solution.grid_draw(site_id, hour);
        }
    }
    daily -= solution.penalty_cost(instance).unwrap();

    let mut panel_om = Money::default();
    for site_id in &instance.sites {
        for panel_id in &instance.panel_types {
            panel_om +=
                instance.panel_om.get(panel_id).unwrap() * solution.panel_count(site_id, panel_id);
        }
    }

    instance.horizon_days * daily - solution.capex_spent(instance).unwrap() - panel_om
}

/// One site, one segment and one hour: 100 kWh of demand, margin 10, penalty 1, free equipment
fn single_site_data(horizon_days: f64) -> InstanceData {
    InstanceData {
        name: "single_site".into(),
        horizon_days,
        capex_budget: 0.0,
        currency_index: None,
        demand_profile: vec![1.0],
        grid_price_profile: vec![0.0],
        solar_profile: vec![0.0],
        penalty_demand_factor: 0.0,
        segments: vec![SegmentData {
            id: "car".into(),
            sale_price: 12.0,
            operating_cost: 2.0,
            base_penalty: 1.0,
        }],
        panel_types: vec![PanelTypeData {
            id: "pv".into(),
            peak_output: 0.5,
            unit_capex: 0.0,
            om_cost: 0.0,
        }],
        charger_types: vec![ChargerTypeData {
            id: "dc".into(),
            rated_power: 150.0,
            unit_capex: 0.0,
            availability: None,
        }],
        sites: vec![SiteData {
            id: "site".into(),
            grid_price_weight: 1.0,
            priority: 1.0,
            daily_demand: indexmap! { "car".into() => 100.0 },
            panel_capacity: indexmap! { "pv".into() => 0 },
            panel_fixed_cost: indexmap! { "pv".into() => 0.0 },
            charger_capacity: indexmap! { "dc".into() => 1 },
        }],
    }
}

#[test]
fn test_solve_builtin() {
    let instance = Instance::builtin().unwrap();
    let solution = solve_optimal(&instance);

    solution
        .check_feasibility(&instance, FEASIBILITY_TOLERANCE)
        .unwrap();

    // Serving demand is profitable here, so something must be built
    assert!(instance.sites.iter().any(|site_id| solution.is_open(site_id)));

    assert_approx_eq!(
        f64,
        solution.objective().value(),
        recompute_objective(&instance, &solution).value(),
        epsilon = 1e-6 * solution.objective().value().abs()
    );
}

#[test]
fn test_solve_builtin_zero_budget() {
    let mut data = builtin_instance();
    data.capex_budget = 0.0;
    let instance = Instance::from_data(&data).unwrap();
    let solution = solve_optimal(&instance);

    for site_id in &instance.sites {
        assert!(!solution.is_open(site_id));
        for panel_id in &instance.panel_types {
            assert_eq!(solution.panel_count(site_id, panel_id).value(), 0.0);
        }
        for charger_id in &instance.charger_types {
            assert_eq!(solution.charger_count(site_id, charger_id).value(), 0.0);
        }
        for hour in instance.hours() {
            assert_approx_eq!(
                f64,
                solution.served_at(&instance, site_id, hour).value(),
                0.0,
                epsilon = 1e-6
            );
        }
    }

    // Nothing is served, so only the penalty for all demand remains
    let penalty = solution.penalty_cost(&instance).unwrap();
    assert_approx_eq!(
        f64,
        solution.objective().value(),
        -penalty.value(),
        epsilon = 1e-6 * penalty.value()
    );
}

#[rstest]
#[case(1.0)]
#[case(30.0)]
fn test_solve_single_site(#[case] horizon_days: f64) {
    let instance = Instance::from_data(&single_site_data(horizon_days)).unwrap();
    let solution = solve_optimal(&instance);
    let site_id = "site".into();

    assert!(solution.is_open(&site_id));
    assert_eq!(solution.charger_count(&site_id, &"dc".into()).value(), 1.0);
    assert_approx_eq!(
        f64,
        solution.served(&site_id, 0, &"car".into()).value(),
        100.0,
        epsilon = 1e-6
    );

    // (margin + penalty) * 100 kWh earned, minus the penalty offset for 100 kWh
    assert_approx_eq!(
        f64,
        solution.objective().value(),
        horizon_days * 1000.0,
        epsilon = 1e-6 * horizon_days * 1000.0
    );
}

#[test]
fn test_solve_single_site_no_chargers() {
    let mut data = single_site_data(1.0);
    data.sites[0].charger_capacity["dc"] = 0;
    let instance = Instance::from_data(&data).unwrap();
    let solution = solve_optimal(&instance);

    assert_approx_eq!(
        f64,
        solution.served(&"site".into(), 0, &"car".into()).value(),
        0.0,
        epsilon = 1e-6
    );
    assert_approx_eq!(f64, solution.objective().value(), -100.0, epsilon = 1e-6);
}
