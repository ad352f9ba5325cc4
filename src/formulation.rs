//! Code for formulating the siting and sizing problem as a mixed-integer linear program.
//!
//! Every decision variable is declared through HiGHS' row problem API together with its objective
//! coefficient. The constant part of the objective (the penalty which would be incurred if no
//! demand at all were served) is kept out of the solver and added back to its objective value.
use crate::instance::{ChargerTypeID, Hour, Instance, PanelTypeID, SegmentID, SiteID};
use crate::units::{Dimensionless, Money};
use anyhow::Result;
use float_cmp::approx_eq;
use highs::RowProblem as Problem;
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, warn};
use std::fmt;
use strum::{EnumIter, IntoEnumIterator};

pub mod constraints;
use constraints::{ConstraintFamily, add_constraints};

/// A decision variable in the optimisation.
///
/// Note that this type does **not** include the value of the variable; it refers to a particular
/// column of the problem, along with the position of that column in the solution.
#[derive(Clone, Copy, Debug)]
pub struct Variable {
    col: highs::Col,
    index: usize,
}

impl Variable {
    /// The HiGHS column for this variable
    pub fn col(self) -> highs::Col {
        self.col
    }

    /// The position of the variable's value in the solution's column values
    pub fn index(self) -> usize {
        self.index
    }
}

/// The domain of a decision variable
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, derive_more::Display)]
pub enum VariableKind {
    /// Integer in {0, 1}
    #[display("binary")]
    Binary,
    /// Non-negative integer
    #[display("integer")]
    Integer,
    /// Non-negative real
    #[display("continuous")]
    Continuous,
}

/// Maps for easy lookup of variables in the problem, keyed by index tuples.
///
/// The entries are ordered (see [`IndexMap`]).
#[derive(Default)]
pub struct VariableMap {
    /// Whether a site is developed
    pub open: IndexMap<SiteID, Variable>,
    /// Whether a panel type is installed at a site
    pub panel_chosen: IndexMap<(SiteID, PanelTypeID), Variable>,
    /// Number of panels of each type at a site
    pub panel_count: IndexMap<(SiteID, PanelTypeID), Variable>,
    /// Number of chargers of each type at a site
    pub charger_count: IndexMap<(SiteID, ChargerTypeID), Variable>,
    /// Energy delivered to a segment at a site in an hour
    pub served: IndexMap<(SiteID, Hour, SegmentID), Variable>,
    /// Energy bought from the grid at a site in an hour
    pub grid_draw: IndexMap<(SiteID, Hour), Variable>,
}

/// Counts of the variables and constraints in the problem, by category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelStructure {
    /// Number of variables of each kind
    pub variables: IndexMap<VariableKind, usize>,
    /// Number of constraints in each family
    pub constraints: IndexMap<ConstraintFamily, usize>,
}

impl ModelStructure {
    /// Total number of variables
    pub fn num_variables(&self) -> usize {
        self.variables.values().sum()
    }

    /// Total number of constraints
    pub fn num_constraints(&self) -> usize {
        self.constraints.values().sum()
    }

    /// Whether any variable is restricted to integer values
    pub fn is_mip(&self) -> bool {
        self.variables
            .iter()
            .any(|(kind, &count)| *kind != VariableKind::Continuous && count > 0)
    }
}

impl fmt::Display for ModelStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let by_kind = VariableKind::iter()
            .map(|kind| format!("{} {kind}", self.variables.get(&kind).unwrap_or(&0)))
            .join(" + ");
        writeln!(f, "Total variables: {} = {by_kind}", self.num_variables())?;
        writeln!(f, "Total constraints: {}", self.num_constraints())?;

        for (family, count) in self
            .constraints
            .iter()
            .sorted_by_key(|(family, _)| family.to_string())
        {
            writeln!(f, "  - {family}: {count}")?;
        }

        Ok(())
    }
}

/// The formulated problem, ready to be handed to the solver
pub struct Formulation {
    /// The HiGHS problem
    pub problem: Problem,
    /// The decision variables
    pub variables: VariableMap,
    /// Variable and constraint counts
    pub structure: ModelStructure,
    /// Constant term of the objective, not seen by the solver
    pub objective_offset: Money,
}

impl Formulation {
    /// Add a variable of the given kind with the given objective coefficient
    fn add_variable(&mut self, kind: VariableKind, coefficient: f64) -> Variable {
        let index = self.structure.num_variables();
        let col = match kind {
            VariableKind::Binary => self.problem.add_integer_column(coefficient, 0.0..=1.0),
            VariableKind::Integer => self.problem.add_integer_column(coefficient, 0.0..),
            VariableKind::Continuous => self.problem.add_column(coefficient, 0.0..),
        };
        *self.structure.variables.entry(kind).or_default() += 1;

        Variable { col, index }
    }
}

/// Formulate the siting and sizing problem for the given instance.
///
/// The objective, to be maximised, is:
///
/// `H × (net revenue − grid cost − penalty cost) − panel lifecycle cost − charger capital cost`
///
/// where `H` is the horizon in days. Panel O&M is counted once, like capital costs, rather than
/// for every day of the horizon.
///
/// # Returns
///
/// The formulation, or an error if the instance's tables are inconsistent with its index sets.
pub fn build_problem(instance: &Instance) -> Result<Formulation> {
    if !approx_eq!(f64, instance.horizon_days.value(), 1.0) {
        warn!(
            "Horizon is {} days: daily revenue, grid and penalty flows are scaled by the horizon \
            but panel O&M is counted only once",
            instance.horizon_days
        );
    }

    let mut formulation = Formulation {
        problem: Problem::default(),
        variables: VariableMap::default(),
        structure: ModelStructure::default(),
        objective_offset: calculate_objective_offset(instance)?,
    };
    add_variables(&mut formulation, instance)?;
    add_constraints(&mut formulation, instance)?;

    debug!(
        "Formulated problem with {} variables and {} constraints",
        formulation.structure.num_variables(),
        formulation.structure.num_constraints()
    );

    Ok(formulation)
}

/// Add all decision variables to the problem, with their objective coefficients
fn add_variables(formulation: &mut Formulation, instance: &Instance) -> Result<()> {
    let horizon = instance.horizon_days;

    for site_id in &instance.sites {
        let var = formulation.add_variable(VariableKind::Binary, 0.0);
        formulation.variables.open.insert(site_id.clone(), var);
    }

    for site_id in &instance.sites {
        for panel_id in &instance.panel_types {
            let key = (site_id.clone(), panel_id.clone());
            let fixed_cost = instance.panel_fixed_cost.get(&key)?;
            let var = formulation.add_variable(VariableKind::Binary, -fixed_cost.value());
            formulation.variables.panel_chosen.insert(key, var);
        }
    }

    for site_id in &instance.sites {
        for panel_id in &instance.panel_types {
            let coeff = panel_count_coefficient(instance, panel_id)?;
            let var = formulation.add_variable(VariableKind::Integer, coeff);
            formulation
                .variables
                .panel_count
                .insert((site_id.clone(), panel_id.clone()), var);
        }
    }

    for site_id in &instance.sites {
        for charger_id in &instance.charger_types {
            let capex = instance.charger_unit_capex.get(charger_id)?;
            let var = formulation.add_variable(VariableKind::Integer, -capex.value());
            formulation
                .variables
                .charger_count
                .insert((site_id.clone(), charger_id.clone()), var);
        }
    }

    for site_id in &instance.sites {
        for hour in instance.hours() {
            for segment_id in &instance.segments {
                let key = (site_id.clone(), hour, segment_id.clone());
                let coeff = served_coefficient(instance, &key, horizon)?;
                let var = formulation.add_variable(VariableKind::Continuous, coeff);
                formulation.variables.served.insert(key, var);
            }
        }
    }

    for site_id in &instance.sites {
        for hour in instance.hours() {
            let key = (site_id.clone(), hour);
            let price = instance.grid_price.get(&key)?;
            let var = formulation.add_variable(VariableKind::Continuous, -(horizon * price).value());
            formulation.variables.grid_draw.insert(key, var);
        }
    }

    Ok(())
}

/// Objective coefficient for a unit of energy served.
///
/// Serving a kWh earns the net margin and avoids the shortfall penalty, both for every day of the
/// horizon.
fn served_coefficient(
    instance: &Instance,
    key: &(SiteID, Hour, SegmentID),
    horizon: Dimensionless,
) -> Result<f64> {
    let (_, _, segment_id) = key;
    let margin = instance.sale_price.get(segment_id)? - instance.op_cost.get(segment_id)?;
    let penalty = instance.penalty.get(key)?;

    Ok((horizon * (margin + penalty)).value())
}

/// Objective coefficient for one panel: its capital cost plus O&M, counted once
fn panel_count_coefficient(instance: &Instance, panel_id: &PanelTypeID) -> Result<f64> {
    let capex = instance.panel_unit_capex.get(panel_id)?;
    let om = instance.panel_om.get(panel_id)?;

    Ok(-(capex + om).value())
}

/// The penalty over the horizon if no demand were served, as a (negative) objective constant
fn calculate_objective_offset(instance: &Instance) -> Result<Money> {
    let mut total = Money::default();
    for (key, &demand) in &instance.demand {
        total += instance.penalty.get(key)? * demand;
    }

    Ok(-(instance.horizon_days * total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{instance, instance_data};
    use crate::instance::InstanceData;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_build_problem_structure(instance: Instance) {
        let formulation = build_problem(&instance).unwrap();
        let structure = &formulation.structure;

        // 1 open + 1 panel chosen, 1 panel count + 1 charger count, 2 served + 2 grid
        assert_eq!(structure.variables[&VariableKind::Binary], 2);
        assert_eq!(structure.variables[&VariableKind::Integer], 2);
        assert_eq!(structure.variables[&VariableKind::Continuous], 4);
        assert!(structure.is_mip());

        assert_eq!(structure.constraints[&ConstraintFamily::DemandCap], 2);
        assert_eq!(structure.constraints[&ConstraintFamily::EnergyBalance], 2);
        assert_eq!(structure.constraints[&ConstraintFamily::ChargerThroughput], 2);
        assert_eq!(structure.constraints[&ConstraintFamily::PanelCapacity], 1);
        assert_eq!(structure.constraints[&ConstraintFamily::ChargerCapacity], 1);
        assert_eq!(structure.constraints[&ConstraintFamily::Budget], 1);
        assert_eq!(structure.num_constraints(), 9);
        assert_eq!(formulation.problem.num_rows(), 9);
    }

    #[rstest]
    fn test_variable_indices_are_sequential(instance: Instance) {
        let formulation = build_problem(&instance).unwrap();
        let vars = &formulation.variables;
        let mut indices: Vec<_> = vars
            .open
            .values()
            .chain(vars.panel_chosen.values())
            .chain(vars.panel_count.values())
            .chain(vars.charger_count.values())
            .chain(vars.served.values())
            .chain(vars.grid_draw.values())
            .map(|var| var.index())
            .collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..8).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_served_coefficient(instance: Instance) {
        let key = ("site1".into(), 0, "car".into());
        let penalty = instance.penalty.get(&key).unwrap().value();

        assert_approx_eq!(
            f64,
            served_coefficient(&instance, &key, Dimensionless(1.0)).unwrap(),
            12.0 - 2.0 + penalty
        );
        assert_approx_eq!(
            f64,
            served_coefficient(&instance, &key, Dimensionless(30.0)).unwrap(),
            30.0 * (12.0 - 2.0 + penalty)
        );
    }

    #[rstest]
    fn test_panel_count_coefficient(instance: Instance) {
        assert_approx_eq!(
            f64,
            panel_count_coefficient(&instance, &"pv".into()).unwrap(),
            -110.0
        );
    }

    #[rstest]
    fn test_objective_offset(mut instance_data: InstanceData) {
        instance_data.horizon_days = 2.0;
        let instance = Instance::from_data(&instance_data).unwrap();

        // Hour 0: 25 kWh at 2 * 1.5 * (1 + 0.4 * 0.25); hour 1: 75 kWh at 2 * 1.5 * (1 + 0.4 * 0.75)
        let expected = -2.0 * (25.0 * 3.0 * 1.1 + 75.0 * 3.0 * 1.3);
        assert_approx_eq!(
            f64,
            calculate_objective_offset(&instance).unwrap().value(),
            expected,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_model_structure_display() {
        let structure = ModelStructure {
            variables: [(VariableKind::Binary, 2), (VariableKind::Continuous, 5)]
                .into_iter()
                .collect(),
            constraints: [(ConstraintFamily::Budget, 1), (ConstraintFamily::DemandCap, 4)]
                .into_iter()
                .collect(),
        };

        assert_eq!(
            structure.to_string(),
            "Total variables: 7 = 2 binary + 0 integer + 5 continuous\n\
            Total constraints: 5\n  - budget: 1\n  - demand_cap: 4\n"
        );
    }
}
