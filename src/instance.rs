//! The problem instance: raw input data and the parameter tables derived from it.
//!
//! An instance is described by an [`InstanceData`], which holds the literal constants (daily
//! demands, hourly profiles, equipment catalogues, etc.). [`Instance::from_data`] validates these
//! and derives the immutable parameter tables consumed by the model formulation.
use crate::id::{IDLike, collect_unique_ids, define_id_type};
use crate::input::{
    check_non_negative, check_positive, check_proportion, input_err_msg, read_toml,
};
use crate::units::{
    Count, Dimensionless, Energy, EnergyPerUnit, Money, MoneyPerEnergy, MoneyPerUnit,
};
use anyhow::{Context, Result, ensure};
use float_cmp::approx_eq;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod builtin;
pub mod table;
pub use builtin::builtin_instance;
pub use table::Table;

define_id_type! {SiteID}
define_id_type! {SegmentID}
define_id_type! {PanelTypeID}
define_id_type! {ChargerTypeID}

/// An hour of the representative day, counting from zero
pub type Hour = usize;

/// The default weight of the demand share in the unmet-demand penalty
const DEFAULT_PENALTY_DEMAND_FACTOR: f64 = 0.4;

fn default_penalty_demand_factor() -> f64 {
    DEFAULT_PENALTY_DEMAND_FACTOR
}

/// The raw data describing a problem instance, as read from (or written to) a TOML file.
///
/// All monetary values are expressed in the same currency. If `currency_index` is given, every one
/// of them is divided by it when the instance is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceData {
    /// A short name for the instance
    pub name: String,
    /// Number of days over which one representative day's cash flow is projected
    pub horizon_days: f64,
    /// Upper bound on total capital expenditure
    pub capex_budget: f64,
    /// Optional currency index which all monetary values are divided by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_index: Option<f64>,
    /// Relative hourly demand; normalised to sum to one
    pub demand_profile: Vec<f64>,
    /// Base grid price per kWh for each hour
    pub grid_price_profile: Vec<f64>,
    /// Solar output for each hour as a proportion of peak output
    pub solar_profile: Vec<f64>,
    /// How strongly the hourly demand share scales the unmet-demand penalty
    #[serde(default = "default_penalty_demand_factor")]
    pub penalty_demand_factor: f64,
    /// Vehicle segments
    pub segments: Vec<SegmentData>,
    /// Solar panel catalogue
    pub panel_types: Vec<PanelTypeData>,
    /// Charger catalogue
    pub charger_types: Vec<ChargerTypeData>,
    /// Candidate locations
    pub sites: Vec<SiteData>,
}

/// A vehicle segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentData {
    /// Unique identifier
    pub id: SegmentID,
    /// Price charged per kWh delivered
    pub sale_price: f64,
    /// Operating cost per kWh delivered
    pub operating_cost: f64,
    /// Penalty per kWh of unmet demand, before location and hour scaling
    pub base_penalty: f64,
}

/// A solar panel type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelTypeData {
    /// Unique identifier
    pub id: PanelTypeID,
    /// Energy produced by one unit in one hour at full sun (kWh)
    pub peak_output: f64,
    /// Capital cost per unit
    pub unit_capex: f64,
    /// Operation and maintenance cost per unit
    pub om_cost: f64,
}

/// A charger type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargerTypeData {
    /// Unique identifier
    pub id: ChargerTypeID,
    /// Rated power (kW)
    pub rated_power: f64,
    /// Capital cost per unit
    pub unit_capex: f64,
    /// Proportion of rated power available in each hour. Defaults to full availability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<Vec<f64>>,
}

/// A candidate location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteData {
    /// Unique identifier
    pub id: SiteID,
    /// Multiplier applied to the base grid price at this site
    pub grid_price_weight: f64,
    /// Multiplier applied to the unmet-demand penalty at this site
    pub priority: f64,
    /// Daily energy demand (kWh) for each segment
    pub daily_demand: IndexMap<SegmentID, f64>,
    /// Maximum number of units installable for each panel type
    pub panel_capacity: IndexMap<PanelTypeID, u32>,
    /// Fixed cost incurred if a panel type is installed at all
    pub panel_fixed_cost: IndexMap<PanelTypeID, f64>,
    /// Maximum number of units installable for each charger type
    pub charger_capacity: IndexMap<ChargerTypeID, u32>,
}

impl InstanceData {
    /// Read instance data from a TOML file
    pub fn from_path(file_path: &Path) -> Result<Self> {
        read_toml(file_path)
    }

    /// The number of hours in the representative day
    pub fn num_hours(&self) -> usize {
        self.demand_profile.len()
    }
}

/// Validated parameter tables for a problem instance.
///
/// Nothing in here is modified once the instance has been built.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// A short name for the instance
    pub name: String,
    /// Candidate locations
    pub sites: IndexSet<SiteID>,
    /// Vehicle segments
    pub segments: IndexSet<SegmentID>,
    /// Panel types
    pub panel_types: IndexSet<PanelTypeID>,
    /// Charger types
    pub charger_types: IndexSet<ChargerTypeID>,
    /// Number of hours in the representative day
    pub num_hours: usize,
    /// Economic horizon in days
    pub horizon_days: Dimensionless,
    /// Upper bound on total capital expenditure
    pub capex_budget: Money,
    /// Share of daily demand falling in each hour. Sums to one.
    pub demand_share: Vec<Dimensionless>,
    /// Demand (kWh) per site, hour and segment
    pub demand: Table<(SiteID, Hour, SegmentID), Energy>,
    /// Grid price per kWh at each site and hour
    pub grid_price: Table<(SiteID, Hour), MoneyPerEnergy>,
    /// Energy produced by one panel of each type in each hour
    pub solar_yield: Table<(PanelTypeID, Hour), EnergyPerUnit>,
    /// Maximum number of panels of each type at each site
    pub panel_capacity: Table<(SiteID, PanelTypeID), Count>,
    /// Maximum number of chargers of each type at each site
    pub charger_capacity: Table<(SiteID, ChargerTypeID), Count>,
    /// Fixed cost of installing a panel type at a site
    pub panel_fixed_cost: Table<(SiteID, PanelTypeID), Money>,
    /// Capital cost per panel
    pub panel_unit_capex: Table<PanelTypeID, MoneyPerUnit>,
    /// O&M cost per panel, counted once
    pub panel_om: Table<PanelTypeID, MoneyPerUnit>,
    /// Capital cost per charger
    pub charger_unit_capex: Table<ChargerTypeID, MoneyPerUnit>,
    /// Energy one charger of each type can deliver in each hour
    pub charger_power: Table<(ChargerTypeID, Hour), EnergyPerUnit>,
    /// Sale price per kWh for each segment
    pub sale_price: Table<SegmentID, MoneyPerEnergy>,
    /// Operating cost per kWh for each segment
    pub op_cost: Table<SegmentID, MoneyPerEnergy>,
    /// Penalty per kWh of unmet demand per site, hour and segment
    pub penalty: Table<(SiteID, Hour, SegmentID), MoneyPerEnergy>,
}

/// Converts literal monetary values into the instance's single currency unit
#[derive(Clone, Copy)]
struct CurrencyIndex(f64);

impl CurrencyIndex {
    fn new(index: Option<f64>) -> Result<Self> {
        match index {
            Some(index) => {
                check_positive(index, "currency_index")?;
                Ok(Self(index))
            }
            None => Ok(Self(1.0)),
        }
    }

    fn money(self, value: f64) -> Money {
        Money::new(value / self.0)
    }

    fn money_per_energy(self, value: f64) -> MoneyPerEnergy {
        MoneyPerEnergy::new(value / self.0)
    }

    fn money_per_unit(self, value: f64) -> MoneyPerUnit {
        MoneyPerUnit::new(value / self.0)
    }
}

/// Check that every hourly profile has the same, non-zero length and return it
fn check_profile_lengths(data: &InstanceData) -> Result<usize> {
    let num_hours = data.num_hours();
    ensure!(num_hours > 0, "demand_profile cannot be empty");

    let mut profiles = vec![
        ("grid_price_profile".to_string(), data.grid_price_profile.len()),
        ("solar_profile".to_string(), data.solar_profile.len()),
    ];
    for charger in &data.charger_types {
        if let Some(availability) = &charger.availability {
            profiles.push((
                format!("availability of charger type {}", charger.id),
                availability.len(),
            ));
        }
    }

    for (name, len) in profiles {
        ensure!(
            len == num_hours,
            "{name} has {len} entries but demand_profile has {num_hours}"
        );
    }

    Ok(num_hours)
}

/// Normalise the demand profile so that its entries sum to one
pub fn normalise_profile(profile: &[f64]) -> Result<Vec<Dimensionless>> {
    for (hour, &value) in profile.iter().enumerate() {
        check_non_negative(value, &format!("demand_profile[{hour}]"))?;
    }

    let total: f64 = profile.iter().sum();
    ensure!(total > 0.0, "demand_profile must have a positive sum");

    let shares: Vec<_> = profile
        .iter()
        .map(|value| Dimensionless::new(value / total))
        .collect();
    debug_assert!(approx_eq!(
        f64,
        shares.iter().map(|share| share.value()).sum::<f64>(),
        1.0,
        epsilon = 1e-9
    ));

    Ok(shares)
}

/// Check that the keys of a per-site map match the given ID set exactly
fn check_site_keys<ID, V>(
    site_id: &SiteID,
    field: &str,
    map: &IndexMap<ID, V>,
    expected: &IndexSet<ID>,
) -> Result<()>
where
    ID: IDLike,
{
    for id in map.keys() {
        ensure!(
            expected.contains(id),
            "Unknown key {id} in `{field}` of site {site_id}"
        );
    }
    for id in expected {
        ensure!(
            map.contains_key(id),
            "Missing entry for {id} in `{field}` of site {site_id}"
        );
    }

    Ok(())
}

impl Instance {
    /// Read instance data from a TOML file and build the instance
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let data = InstanceData::from_path(file_path)?;
        Self::from_data(&data).with_context(|| input_err_msg(file_path))
    }

    /// The built-in example instance
    pub fn builtin() -> Result<Self> {
        Self::from_data(&builtin_instance())
    }

    /// Validate instance data and derive the parameter tables from it
    pub fn from_data(data: &InstanceData) -> Result<Self> {
        check_positive(data.horizon_days, "horizon_days")?;
        check_non_negative(data.capex_budget, "capex_budget")?;
        check_non_negative(data.penalty_demand_factor, "penalty_demand_factor")?;
        let currency = CurrencyIndex::new(data.currency_index)?;

        let num_hours = check_profile_lengths(data)?;
        let demand_share = normalise_profile(&data.demand_profile)?;

        let sites = collect_unique_ids(data.sites.iter().map(|s| s.id.clone()), "site")?;
        let segments =
            collect_unique_ids(data.segments.iter().map(|s| s.id.clone()), "segment")?;
        let panel_types =
            collect_unique_ids(data.panel_types.iter().map(|p| p.id.clone()), "panel type")?;
        let charger_types = collect_unique_ids(
            data.charger_types.iter().map(|c| c.id.clone()),
            "charger type",
        )?;
        ensure!(!sites.is_empty(), "At least one site must be given");
        ensure!(!segments.is_empty(), "At least one segment must be given");
        ensure!(
            !charger_types.is_empty(),
            "At least one charger type must be given"
        );

        let mut instance = Instance {
            name: data.name.clone(),
            sites,
            segments,
            panel_types,
            charger_types,
            num_hours,
            horizon_days: Dimensionless::new(data.horizon_days),
            capex_budget: currency.money(data.capex_budget),
            demand_share,
            demand: Table::new("demand"),
            grid_price: Table::new("grid_price"),
            solar_yield: Table::new("solar_yield"),
            panel_capacity: Table::new("panel_capacity"),
            charger_capacity: Table::new("charger_capacity"),
            panel_fixed_cost: Table::new("panel_fixed_cost"),
            panel_unit_capex: Table::new("panel_unit_capex"),
            panel_om: Table::new("panel_om"),
            charger_unit_capex: Table::new("charger_unit_capex"),
            charger_power: Table::new("charger_power"),
            sale_price: Table::new("sale_price"),
            op_cost: Table::new("op_cost"),
            penalty: Table::new("penalty"),
        };

        instance.add_segment_tables(data, currency)?;
        instance.add_panel_tables(data, currency)?;
        instance.add_charger_tables(data, currency)?;
        instance.add_site_tables(data, currency)?;

        Ok(instance)
    }

    /// Iterate over the hours of the representative day
    pub fn hours(&self) -> std::ops::Range<Hour> {
        0..self.num_hours
    }

    fn add_segment_tables(&mut self, data: &InstanceData, currency: CurrencyIndex) -> Result<()> {
        for segment in &data.segments {
            let context = || format!("Invalid data for segment {}", segment.id);
            check_non_negative(segment.sale_price, "sale_price").with_context(context)?;
            check_non_negative(segment.operating_cost, "operating_cost").with_context(context)?;
            check_non_negative(segment.base_penalty, "base_penalty").with_context(context)?;

            self.sale_price
                .insert(segment.id.clone(), currency.money_per_energy(segment.sale_price))?;
            self.op_cost.insert(
                segment.id.clone(),
                currency.money_per_energy(segment.operating_cost),
            )?;
        }

        Ok(())
    }

    fn add_panel_tables(&mut self, data: &InstanceData, currency: CurrencyIndex) -> Result<()> {
        for (hour, &value) in data.solar_profile.iter().enumerate() {
            check_proportion(value, &format!("solar_profile[{hour}]"))?;
        }

        for panel in &data.panel_types {
            let context = || format!("Invalid data for panel type {}", panel.id);
            check_positive(panel.peak_output, "peak_output").with_context(context)?;
            check_non_negative(panel.unit_capex, "unit_capex").with_context(context)?;
            check_non_negative(panel.om_cost, "om_cost").with_context(context)?;

            self.panel_unit_capex
                .insert(panel.id.clone(), currency.money_per_unit(panel.unit_capex))?;
            self.panel_om
                .insert(panel.id.clone(), currency.money_per_unit(panel.om_cost))?;
            for (hour, &fraction) in data.solar_profile.iter().enumerate() {
                self.solar_yield.insert(
                    (panel.id.clone(), hour),
                    EnergyPerUnit::new(fraction * panel.peak_output),
                )?;
            }
        }

        Ok(())
    }

    fn add_charger_tables(&mut self, data: &InstanceData, currency: CurrencyIndex) -> Result<()> {
        for charger in &data.charger_types {
            let context = || format!("Invalid data for charger type {}", charger.id);
            check_positive(charger.rated_power, "rated_power").with_context(context)?;
            check_non_negative(charger.unit_capex, "unit_capex").with_context(context)?;

            self.charger_unit_capex
                .insert(charger.id.clone(), currency.money_per_unit(charger.unit_capex))?;
            for hour in 0..self.num_hours {
                let availability = match &charger.availability {
                    Some(availability) => {
                        let value = availability[hour];
                        check_proportion(value, &format!("availability[{hour}]"))
                            .with_context(context)?;
                        value
                    }
                    None => 1.0,
                };

                // Hours are one hour long, so kW and kWh per hour coincide
                self.charger_power.insert(
                    (charger.id.clone(), hour),
                    EnergyPerUnit::new(charger.rated_power * availability),
                )?;
            }
        }

        Ok(())
    }

    fn add_site_tables(&mut self, data: &InstanceData, currency: CurrencyIndex) -> Result<()> {
        for (hour, &price) in data.grid_price_profile.iter().enumerate() {
            check_non_negative(price, &format!("grid_price_profile[{hour}]"))?;
        }
        let base_penalty: IndexMap<_, _> = data
            .segments
            .iter()
            .map(|segment| (segment.id.clone(), segment.base_penalty))
            .collect();

        for site in &data.sites {
            let context = || format!("Invalid data for site {}", site.id);
            check_positive(site.grid_price_weight, "grid_price_weight").with_context(context)?;
            check_positive(site.priority, "priority").with_context(context)?;
            check_site_keys(&site.id, "daily_demand", &site.daily_demand, &self.segments)?;
            check_site_keys(
                &site.id,
                "panel_capacity",
                &site.panel_capacity,
                &self.panel_types,
            )?;
            check_site_keys(
                &site.id,
                "panel_fixed_cost",
                &site.panel_fixed_cost,
                &self.panel_types,
            )?;
            check_site_keys(
                &site.id,
                "charger_capacity",
                &site.charger_capacity,
                &self.charger_types,
            )?;

            for (hour, &base_price) in data.grid_price_profile.iter().enumerate() {
                self.grid_price.insert(
                    (site.id.clone(), hour),
                    currency.money_per_energy(base_price * site.grid_price_weight),
                )?;
            }

            for (segment_id, &daily_demand) in &site.daily_demand {
                check_non_negative(daily_demand, &format!("daily_demand for {segment_id}"))
                    .with_context(context)?;
                for (hour, &share) in self.demand_share.iter().enumerate() {
                    let key = (site.id.clone(), hour, segment_id.clone());
                    self.demand
                        .insert(key.clone(), Energy::new(daily_demand) * share)?;

                    let penalty = base_penalty[segment_id]
                        * site.priority
                        * (1.0 + data.penalty_demand_factor * share.value());
                    self.penalty
                        .insert(key, currency.money_per_energy(penalty))?;
                }
            }

            for (panel_id, &capacity) in &site.panel_capacity {
                self.panel_capacity.insert(
                    (site.id.clone(), panel_id.clone()),
                    Count::new(capacity as f64),
                )?;
            }
            for (panel_id, &cost) in &site.panel_fixed_cost {
                check_non_negative(cost, &format!("panel_fixed_cost for {panel_id}"))
                    .with_context(context)?;
                self.panel_fixed_cost
                    .insert((site.id.clone(), panel_id.clone()), currency.money(cost))?;
            }
            for (charger_id, &capacity) in &site.charger_capacity {
                self.charger_capacity.insert(
                    (site.id.clone(), charger_id.clone()),
                    Count::new(capacity as f64),
                )?;
            }
        }

        Ok(())
    }

    /// Daily demand (kWh) for a site and segment, summed over hours
    pub fn daily_demand(&self, site_id: &SiteID, segment_id: &SegmentID) -> Result<Energy> {
        self.hours()
            .map(|hour| {
                self.demand
                    .get(&(site_id.clone(), hour, segment_id.clone()))
            })
            .sum()
    }
}
