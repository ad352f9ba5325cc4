//! Typed access to the values of a solved problem.
use crate::formulation::{Variable, VariableMap};
use crate::instance::{ChargerTypeID, Hour, Instance, PanelTypeID, SegmentID, SiteID};
use crate::units::{Count, Energy, Money};
use anyhow::{Result, ensure};

/// The default absolute tolerance used when checking a solution against the constraints
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// The solution to the siting and sizing problem
pub struct Solution {
    columns: Vec<f64>,
    variables: VariableMap,
    objective: Money,
}

impl Solution {
    /// Create a new [`Solution`] from the solver's column values
    pub fn new(columns: Vec<f64>, variables: VariableMap, objective: Money) -> Self {
        Self {
            columns,
            variables,
            objective,
        }
    }

    /// The value of the objective, including the constant penalty term
    pub fn objective(&self) -> Money {
        self.objective
    }

    fn value(&self, var: Variable) -> f64 {
        self.columns[var.index()]
    }

    /// The value of the site's open flag
    fn open_flag(&self, site_id: &SiteID) -> bool {
        let var = *self
            .variables
            .open
            .get(site_id)
            .expect("No open variable for site");
        self.value(var) > 0.5
    }

    /// Whether the site is developed, i.e. it is open and has at least one charger.
    ///
    /// The open flag has no cost, so at a site with no chargers the solver may return it set or
    /// unset. Such a site is never reported as developed.
    pub fn is_open(&self, site_id: &SiteID) -> bool {
        self.open_flag(site_id)
            && self
                .variables
                .charger_count
                .iter()
                .filter(|((id, _), _)| id == site_id)
                .any(|(_, var)| self.value(*var).round() > 0.0)
    }

    /// Whether the panel type is installed at the site
    pub fn is_panel_chosen(&self, site_id: &SiteID, panel_id: &PanelTypeID) -> bool {
        let var = *self
            .variables
            .panel_chosen
            .get(&(site_id.clone(), panel_id.clone()))
            .expect("No panel selection variable for site and panel type");
        self.value(var) > 0.5
    }

    /// Number of panels of the given type installed at the site
    pub fn panel_count(&self, site_id: &SiteID, panel_id: &PanelTypeID) -> Count {
        let var = *self
            .variables
            .panel_count
            .get(&(site_id.clone(), panel_id.clone()))
            .expect("No panel count variable for site and panel type");
        Count::new(self.value(var).round())
    }

    /// Number of chargers of the given type installed at the site
    pub fn charger_count(&self, site_id: &SiteID, charger_id: &ChargerTypeID) -> Count {
        let var = *self
            .variables
            .charger_count
            .get(&(site_id.clone(), charger_id.clone()))
            .expect("No charger count variable for site and charger type");
        Count::new(self.value(var).round())
    }

    /// Energy delivered to the segment at the site in the given hour
    pub fn served(&self, site_id: &SiteID, hour: Hour, segment_id: &SegmentID) -> Energy {
        let var = *self
            .variables
            .served
            .get(&(site_id.clone(), hour, segment_id.clone()))
            .expect("No served variable for site, hour and segment");
        Energy::new(self.value(var))
    }

    /// Energy bought from the grid at the site in the given hour
    pub fn grid_draw(&self, site_id: &SiteID, hour: Hour) -> Energy {
        let var = *self
            .variables
            .grid_draw
            .get(&(site_id.clone(), hour))
            .expect("No grid draw variable for site and hour");
        Energy::new(self.value(var))
    }

    /// Energy delivered at the site in the given hour, over all segments
    pub fn served_at(&self, instance: &Instance, site_id: &SiteID, hour: Hour) -> Energy {
        instance
            .segments
            .iter()
            .map(|segment_id| self.served(site_id, hour, segment_id))
            .sum()
    }

    /// Solar energy available at the site in the given hour from the installed panels
    pub fn solar_available(
        &self,
        instance: &Instance,
        site_id: &SiteID,
        hour: Hour,
    ) -> Result<Energy> {
        instance
            .panel_types
            .iter()
            .map(|panel_id| {
                let solar_yield = instance.solar_yield.get(&(panel_id.clone(), hour))?;
                Ok(solar_yield * self.panel_count(site_id, panel_id))
            })
            .sum()
    }

    /// Installed charging energy available at the site in the given hour
    pub fn charging_available(
        &self,
        instance: &Instance,
        site_id: &SiteID,
        hour: Hour,
    ) -> Result<Energy> {
        instance
            .charger_types
            .iter()
            .map(|charger_id| {
                let power = instance.charger_power.get(&(charger_id.clone(), hour))?;
                Ok(power * self.charger_count(site_id, charger_id))
            })
            .sum()
    }

    /// Demand which is not served for the segment at the site in the given hour
    pub fn unmet_demand(
        &self,
        instance: &Instance,
        site_id: &SiteID,
        hour: Hour,
        segment_id: &SegmentID,
    ) -> Result<Energy> {
        let demand = instance
            .demand
            .get(&(site_id.clone(), hour, segment_id.clone()))?;
        Ok(demand - self.served(site_id, hour, segment_id))
    }

    /// Capital expenditure on panels and chargers at a single site
    pub fn site_capex(&self, instance: &Instance, site_id: &SiteID) -> Result<Money> {
        let mut total = Money::default();
        for panel_id in &instance.panel_types {
            total += instance.panel_unit_capex.get(panel_id)? * self.panel_count(site_id, panel_id);
            if self.is_panel_chosen(site_id, panel_id) {
                total += instance
                    .panel_fixed_cost
                    .get(&(site_id.clone(), panel_id.clone()))?;
            }
        }
        for charger_id in &instance.charger_types {
            total +=
                instance.charger_unit_capex.get(charger_id)? * self.charger_count(site_id, charger_id);
        }

        Ok(total)
    }

    /// Total capital expenditure on panels and chargers
    pub fn capex_spent(&self, instance: &Instance) -> Result<Money> {
        instance
            .sites
            .iter()
            .map(|site_id| self.site_capex(instance, site_id))
            .sum()
    }

    /// Penalty incurred for unmet demand over one day
    pub fn penalty_cost(&self, instance: &Instance) -> Result<Money> {
        let mut total = Money::default();
        for (site_id, hour, segment_id) in instance.demand.iter().map(|(key, _)| key) {
            let penalty = instance
                .penalty
                .get(&(site_id.clone(), *hour, segment_id.clone()))?;
            total += penalty * self.unmet_demand(instance, site_id, *hour, segment_id)?;
        }

        Ok(total)
    }

    /// Check that the solution satisfies every constraint of the problem.
    ///
    /// Values are compared with an absolute tolerance scaled by the size of the right-hand side.
    ///
    /// # Returns
    ///
    /// An error naming the first violated constraint and its key, if any.
    pub fn check_feasibility(&self, instance: &Instance, tolerance: f64) -> Result<()> {
        let within = |lhs: f64, rhs: f64| lhs <= rhs + tolerance * rhs.abs().max(1.0);

        for site_id in &instance.sites {
            for hour in instance.hours() {
                for segment_id in &instance.segments {
                    let key = (site_id.clone(), hour, segment_id.clone());
                    let served = self.served(site_id, hour, segment_id);
                    let demand = instance.demand.get(&key)?;
                    ensure!(
                        served.value() >= -tolerance && within(served.value(), demand.value()),
                        "demand_cap violated for {key:?}: served {served} > demand {demand}"
                    );
                }

                let served = self.served_at(instance, site_id, hour);
                let supply =
                    self.solar_available(instance, site_id, hour)? + self.grid_draw(site_id, hour);
                ensure!(
                    within(served.value(), supply.value()),
                    "energy_balance violated for ({site_id:?}, {hour}): served {served} > supply \
                    {supply}"
                );

                let charging = self.charging_available(instance, site_id, hour)?;
                ensure!(
                    within(served.value(), charging.value()),
                    "charger_throughput violated for ({site_id:?}, {hour}): served {served} > \
                    charging capacity {charging}"
                );
            }

            for panel_id in &instance.panel_types {
                let key = (site_id.clone(), panel_id.clone());
                let count = self.panel_count(site_id, panel_id);
                let limit = if self.is_panel_chosen(site_id, panel_id) {
                    instance.panel_capacity.get(&key)?
                } else {
                    Count::default()
                };
                ensure!(
                    count <= limit,
                    "panel_capacity violated for {key:?}: {count} panels > limit {limit}"
                );
            }

            for charger_id in &instance.charger_types {
                let key = (site_id.clone(), charger_id.clone());
                let count = self.charger_count(site_id, charger_id);
                let limit = if self.open_flag(site_id) {
                    instance.charger_capacity.get(&key)?
                } else {
                    Count::default()
                };
                ensure!(
                    count <= limit,
                    "charger_capacity violated for {key:?}: {count} chargers > limit {limit}"
                );
            }
        }

        let capex = self.capex_spent(instance)?;
        ensure!(
            within(capex.value(), instance.capex_budget.value()),
            "budget violated: capex {capex} > budget {}",
            instance.capex_budget
        );

        Ok(())
    }
}
