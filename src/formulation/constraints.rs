//! Code for adding constraints to the siting and sizing problem.
use super::Formulation;
use crate::instance::Instance;
use anyhow::Result;
use highs::Col;

/// The families of constraints in the problem
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConstraintFamily {
    /// Energy served cannot exceed demand
    #[display("demand_cap")]
    DemandCap,
    /// Energy served must come from on-site solar or the grid
    #[display("energy_balance")]
    EnergyBalance,
    /// Energy served is limited by installed charging power
    #[display("charger_throughput")]
    ChargerThroughput,
    /// Panels can only be installed if their type is selected
    #[display("panel_capacity")]
    PanelCapacity,
    /// Chargers can only be installed at developed sites
    #[display("charger_capacity")]
    ChargerCapacity,
    /// Total capital expenditure is bounded
    #[display("budget")]
    Budget,
}

/// Add all constraints to the problem.
///
/// Variables must already have been added.
pub fn add_constraints(formulation: &mut Formulation, instance: &Instance) -> Result<()> {
    add_demand_cap_constraints(formulation, instance)?;
    add_energy_balance_constraints(formulation, instance)?;
    add_charger_throughput_constraints(formulation, instance)?;
    add_panel_capacity_constraints(formulation, instance)?;
    add_charger_capacity_constraints(formulation, instance)?;
    add_budget_constraint(formulation, instance)?;

    Ok(())
}

/// Add a row of the form `terms <= rhs` and count it towards `family`
fn add_upper_bound_row(
    formulation: &mut Formulation,
    family: ConstraintFamily,
    rhs: f64,
    terms: impl IntoIterator<Item = (Col, f64)>,
) {
    formulation.problem.add_row(..=rhs, terms);
    *formulation.structure.constraints.entry(family).or_default() += 1;
}

/// `served[i,t,v] <= demand[i,t,v]`
fn add_demand_cap_constraints(formulation: &mut Formulation, instance: &Instance) -> Result<()> {
    for site_id in &instance.sites {
        for hour in instance.hours() {
            for segment_id in &instance.segments {
                let key = (site_id.clone(), hour, segment_id.clone());
                let demand = instance.demand.get(&key)?;
                let served = formulation.variables.served[&key];
                add_upper_bound_row(
                    formulation,
                    ConstraintFamily::DemandCap,
                    demand.value(),
                    [(served.col(), 1.0)],
                );
            }
        }
    }

    Ok(())
}

/// `Σ_v served[i,t,v] - Σ_a solar_yield[a,t] * panel_count[i,a] - grid_draw[i,t] <= 0`
fn add_energy_balance_constraints(
    formulation: &mut Formulation,
    instance: &Instance,
) -> Result<()> {
    let mut terms = Vec::new();
    for site_id in &instance.sites {
        for hour in instance.hours() {
            for segment_id in &instance.segments {
                let served =
                    formulation.variables.served[&(site_id.clone(), hour, segment_id.clone())];
                terms.push((served.col(), 1.0));
            }
            for panel_id in &instance.panel_types {
                let solar_yield = instance.solar_yield.get(&(panel_id.clone(), hour))?;
                let count = formulation.variables.panel_count[&(site_id.clone(), panel_id.clone())];
                terms.push((count.col(), -solar_yield.value()));
            }
            let grid_draw = formulation.variables.grid_draw[&(site_id.clone(), hour)];
            terms.push((grid_draw.col(), -1.0));

            add_upper_bound_row(
                formulation,
                ConstraintFamily::EnergyBalance,
                0.0,
                terms.drain(..),
            );
        }
    }

    Ok(())
}

/// `Σ_v served[i,t,v] - Σ_k charger_power[k,t] * charger_count[i,k] <= 0`
fn add_charger_throughput_constraints(
    formulation: &mut Formulation,
    instance: &Instance,
) -> Result<()> {
    let mut terms = Vec::new();
    for site_id in &instance.sites {
        for hour in instance.hours() {
            for segment_id in &instance.segments {
                let served =
                    formulation.variables.served[&(site_id.clone(), hour, segment_id.clone())];
                terms.push((served.col(), 1.0));
            }
            for charger_id in &instance.charger_types {
                let power = instance.charger_power.get(&(charger_id.clone(), hour))?;
                let count =
                    formulation.variables.charger_count[&(site_id.clone(), charger_id.clone())];
                terms.push((count.col(), -power.value()));
            }

            add_upper_bound_row(
                formulation,
                ConstraintFamily::ChargerThroughput,
                0.0,
                terms.drain(..),
            );
        }
    }

    Ok(())
}

/// `panel_count[i,a] - panel_capacity[i,a] * panel_chosen[i,a] <= 0`
fn add_panel_capacity_constraints(
    formulation: &mut Formulation,
    instance: &Instance,
) -> Result<()> {
    for site_id in &instance.sites {
        for panel_id in &instance.panel_types {
            let key = (site_id.clone(), panel_id.clone());
            let capacity = instance.panel_capacity.get(&key)?;
            let count = formulation.variables.panel_count[&key];
            let chosen = formulation.variables.panel_chosen[&key];

            add_upper_bound_row(
                formulation,
                ConstraintFamily::PanelCapacity,
                0.0,
                [(count.col(), 1.0), (chosen.col(), -capacity.value())],
            );
        }
    }

    Ok(())
}

/// `charger_count[i,k] - charger_capacity[i,k] * open[i] <= 0`
fn add_charger_capacity_constraints(
    formulation: &mut Formulation,
    instance: &Instance,
) -> Result<()> {
    for site_id in &instance.sites {
        let open = formulation.variables.open[site_id];
        for charger_id in &instance.charger_types {
            let key = (site_id.clone(), charger_id.clone());
            let capacity = instance.charger_capacity.get(&key)?;
            let count = formulation.variables.charger_count[&key];

            add_upper_bound_row(
                formulation,
                ConstraintFamily::ChargerCapacity,
                0.0,
                [(count.col(), 1.0), (open.col(), -capacity.value())],
            );
        }
    }

    Ok(())
}

/// Capital expenditure on panels (unit and fixed costs) and chargers must not exceed the budget
fn add_budget_constraint(formulation: &mut Formulation, instance: &Instance) -> Result<()> {
    let mut terms = Vec::new();
    for site_id in &instance.sites {
        for panel_id in &instance.panel_types {
            let key = (site_id.clone(), panel_id.clone());
            let capex = instance.panel_unit_capex.get(panel_id)?;
            let fixed_cost = instance.panel_fixed_cost.get(&key)?;
            terms.push((formulation.variables.panel_count[&key].col(), capex.value()));
            terms.push((formulation.variables.panel_chosen[&key].col(), fixed_cost.value()));
        }
        for charger_id in &instance.charger_types {
            let key = (site_id.clone(), charger_id.clone());
            let capex = instance.charger_unit_capex.get(charger_id)?;
            terms.push((formulation.variables.charger_count[&key].col(), capex.value()));
        }
    }

    add_upper_bound_row(
        formulation,
        ConstraintFamily::Budget,
        instance.capex_budget.value(),
        terms,
    );

    Ok(())
}
