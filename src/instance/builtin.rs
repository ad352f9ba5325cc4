//! The built-in example instance: four candidate sites along the Atacama highway corridor.
//!
//! Monetary values are in Chilean pesos (CLP).
use super::{ChargerTypeData, InstanceData, PanelTypeData, SegmentData, SiteData};
use indexmap::indexmap;

/// Relative hourly demand for charging over the representative day
const DEMAND_PROFILE: [f64; 24] = [
    0.015, 0.012, 0.010, 0.010, 0.012, 0.020, 0.035, 0.055, 0.070, 0.085, 0.095, 0.100, 0.100,
    0.095, 0.085, 0.070, 0.055, 0.040, 0.028, 0.018, 0.012, 0.010, 0.010, 0.008,
];

/// Base grid price (CLP/kWh) for each hour
const GRID_PRICE_PROFILE: [f64; 24] = [
    118.0, 115.0, 112.0, 110.0, 108.0, 105.0, 102.0, 98.0, 95.0, 94.0, 92.0, 90.0, 92.0, 95.0,
    100.0, 108.0, 120.0, 132.0, 140.0, 148.0, 150.0, 146.0, 135.0, 125.0,
];

/// Solar output as a proportion of peak for each hour
const SOLAR_PROFILE: [f64; 24] = [
    0.00, 0.00, 0.00, 0.00, 0.05, 0.12, 0.28, 0.52, 0.72, 0.86, 0.96, 1.00, 0.96, 0.88, 0.75,
    0.58, 0.38, 0.18, 0.06, 0.00, 0.00, 0.00, 0.00, 0.00,
];

const HEAVY_FREIGHT: &str = "HeavyFreight";
const INTERCITY_BUS: &str = "IntercityBus";
const LIGHT_LOGISTICS: &str = "LightLogistics";
const PV_LFP: &str = "PV_LFP_550";
const PV_BIFACIAL: &str = "PV_Bifacial_680";
const DC_150: &str = "DC_150kW";
const HPC_350: &str = "HPC_350kW";

fn segment(id: &str, sale_price: f64, operating_cost: f64, base_penalty: f64) -> SegmentData {
    SegmentData {
        id: id.into(),
        sale_price,
        operating_cost,
        base_penalty,
    }
}

/// Per-site data, in the order: daily demand (heavy freight, intercity bus, light logistics),
/// panel capacity and fixed cost (LFP, bifacial), charger capacity (DC, HPC)
fn site(
    id: &str,
    grid_price_weight: f64,
    priority: f64,
    daily_demand: [f64; 3],
    panel_capacity: [u32; 2],
    panel_fixed_cost: [f64; 2],
    charger_capacity: [u32; 2],
) -> SiteData {
    SiteData {
        id: id.into(),
        grid_price_weight,
        priority,
        daily_demand: indexmap! {
            HEAVY_FREIGHT.into() => daily_demand[0],
            INTERCITY_BUS.into() => daily_demand[1],
            LIGHT_LOGISTICS.into() => daily_demand[2],
        },
        panel_capacity: indexmap! {
            PV_LFP.into() => panel_capacity[0],
            PV_BIFACIAL.into() => panel_capacity[1],
        },
        panel_fixed_cost: indexmap! {
            PV_LFP.into() => panel_fixed_cost[0],
            PV_BIFACIAL.into() => panel_fixed_cost[1],
        },
        charger_capacity: indexmap! {
            DC_150.into() => charger_capacity[0],
            HPC_350.into() => charger_capacity[1],
        },
    }
}

/// The raw data for the built-in instance
pub fn builtin_instance() -> InstanceData {
    InstanceData {
        name: "atacama_corridor".into(),
        horizon_days: 1.0,
        capex_budget: 8_200_000_000.0,
        currency_index: None,
        demand_profile: DEMAND_PROFILE.to_vec(),
        grid_price_profile: GRID_PRICE_PROFILE.to_vec(),
        solar_profile: SOLAR_PROFILE.to_vec(),
        penalty_demand_factor: super::DEFAULT_PENALTY_DEMAND_FACTOR,
        segments: vec![
            segment(HEAVY_FREIGHT, 320.0, 45.0, 420.0),
            segment(INTERCITY_BUS, 285.0, 38.0, 360.0),
            segment(LIGHT_LOGISTICS, 255.0, 32.0, 305.0),
        ],
        panel_types: vec![
            PanelTypeData {
                id: PV_LFP.into(),
                peak_output: 0.55,
                unit_capex: 280_000.0,
                om_cost: 14_000.0,
            },
            PanelTypeData {
                id: PV_BIFACIAL.into(),
                peak_output: 0.74,
                unit_capex: 355_000.0,
                om_cost: 18_500.0,
            },
        ],
        charger_types: vec![
            ChargerTypeData {
                id: DC_150.into(),
                rated_power: 150.0,
                unit_capex: 26_000_000.0,
                availability: None,
            },
            ChargerTypeData {
                id: HPC_350.into(),
                rated_power: 350.0,
                unit_capex: 47_000_000.0,
                availability: None,
            },
        ],
        sites: vec![
            site(
                "Copiapo",
                1.00,
                1.00,
                [2600.0, 1150.0, 620.0],
                [1800, 1500],
                [180_000_000.0, 205_000_000.0],
                [8, 5],
            ),
            site(
                "Chañaral",
                1.03,
                1.05,
                [1900.0, 720.0, 460.0],
                [1400, 1100],
                [145_000_000.0, 165_000_000.0],
                [6, 3],
            ),
            site(
                "Taltal",
                1.05,
                1.10,
                [2100.0, 840.0, 510.0],
                [1500, 1200],
                [150_000_000.0, 170_000_000.0],
                [7, 4],
            ),
            site(
                "Antofagasta",
                1.08,
                1.15,
                [3050.0, 980.0, 730.0],
                [2100, 1800],
                [210_000_000.0, 235_000_000.0],
                [10, 6],
            ),
        ],
    }
}
