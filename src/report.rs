//! Plain-text summaries of an instance and of the outcome of a solve.
use crate::instance::{Instance, SegmentID, SiteID};
use crate::solution::Solution;
use crate::solver::SolveOutcome;
use crate::units::{Dimensionless, Energy, Money};
use anyhow::Result;
use indexmap::IndexMap;
use std::fmt::{self, Write as _};
use std::io::Write;

/// Format a number with a comma between each group of three integer digits
pub fn format_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::new();

    // Don't print "-0" for small negative values
    if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }

    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }

    if let Some(frac_part) = frac_part {
        out.push('.');
        out.push_str(frac_part);
    }

    out
}

/// Format a proportion as a percentage
fn format_percent(share: Dimensionless, decimals: usize) -> String {
    format!("{:.*}%", decimals, share.value() * 100.0)
}

/// Write a table with a left-aligned first column and right-aligned remaining columns
fn write_table(f: &mut impl fmt::Write, header: &[String], rows: &[Vec<String>]) -> fmt::Result {
    let mut widths: Vec<usize> = header.iter().map(|cell| cell.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    for row in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        let mut line = String::new();
        for (i, (cell, width)) in row.iter().zip(&widths).enumerate() {
            // Pad by characters rather than bytes, as site names may not be ASCII
            let padding = " ".repeat(width - cell.chars().count());
            if i == 0 {
                write!(line, "{cell}{padding}")?;
            } else {
                write!(line, "  {padding}{cell}")?;
            }
        }
        writeln!(f, "{}", line.trim_end())?;
    }

    Ok(())
}

/// Daily energy quantities broken down by site and vehicle segment
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSegmentTable {
    segments: Vec<SegmentID>,
    rows: IndexMap<SiteID, Vec<Energy>>,
}

impl SiteSegmentTable {
    /// Build a table by evaluating `value` for every site and segment
    fn from_fn<F>(instance: &Instance, mut value: F) -> Result<Self>
    where
        F: FnMut(&SiteID, &SegmentID) -> Result<Energy>,
    {
        let mut rows = IndexMap::new();
        for site_id in &instance.sites {
            let row = instance
                .segments
                .iter()
                .map(|segment_id| value(site_id, segment_id))
                .collect::<Result<Vec<_>>>()?;
            rows.insert(site_id.clone(), row);
        }

        Ok(Self {
            segments: instance.segments.iter().cloned().collect(),
            rows,
        })
    }

    /// Daily demand
    pub fn demand(instance: &Instance) -> Result<Self> {
        Self::from_fn(instance, |site_id, segment_id| {
            instance.daily_demand(site_id, segment_id)
        })
    }

    /// Energy served per day
    pub fn served(instance: &Instance, solution: &Solution) -> Result<Self> {
        Self::from_fn(instance, |site_id, segment_id| {
            Ok(instance
                .hours()
                .map(|hour| solution.served(site_id, hour, segment_id))
                .sum())
        })
    }

    /// Demand not served per day
    pub fn unmet(instance: &Instance, solution: &Solution) -> Result<Self> {
        Self::from_fn(instance, |site_id, segment_id| {
            instance
                .hours()
                .map(|hour| solution.unmet_demand(instance, site_id, hour, segment_id))
                .sum()
        })
    }

    /// The value for a site and segment, if present
    pub fn get(&self, site_id: &SiteID, segment_id: &SegmentID) -> Option<Energy> {
        let column = self.segments.iter().position(|id| id == segment_id)?;
        Some(self.rows.get(site_id)?[column])
    }

    /// The column totals over all sites
    pub fn totals(&self) -> Vec<Energy> {
        (0..self.segments.len())
            .map(|column| self.rows.values().map(|row| row[column]).sum())
            .collect()
    }

    /// The sum over all sites and segments
    pub fn grand_total(&self) -> Energy {
        self.totals().into_iter().sum()
    }
}

impl fmt::Display for SiteSegmentTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<String> = std::iter::once("Site".to_string())
            .chain(self.segments.iter().map(ToString::to_string))
            .collect();
        let format_row = |label: String, values: &[Energy]| {
            std::iter::once(label)
                .chain(values.iter().map(|value| format_thousands(value.value(), 1)))
                .collect::<Vec<_>>()
        };

        let mut rows: Vec<_> = self
            .rows
            .iter()
            .map(|(site_id, values)| format_row(site_id.to_string(), values))
            .collect();
        rows.push(format_row("Total".to_string(), &self.totals()));

        write_table(f, &header, &rows)
    }
}

/// The investment decisions at each site. `Open` is 1 only for sites with at least one charger.
pub struct InvestmentTable<'a> {
    instance: &'a Instance,
    solution: &'a Solution,
}

impl<'a> InvestmentTable<'a> {
    /// Create a new [`InvestmentTable`]
    pub fn new(instance: &'a Instance, solution: &'a Solution) -> Self {
        Self { instance, solution }
    }
}

impl fmt::Display for InvestmentTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let instance = self.instance;
        let header: Vec<String> = std::iter::once("Site".to_string())
            .chain(std::iter::once("Open".to_string()))
            .chain(instance.panel_types.iter().map(|id| format!("Panels_{id}")))
            .chain(instance.charger_types.iter().map(|id| format!("Chargers_{id}")))
            .collect();

        let rows: Vec<Vec<String>> = instance
            .sites
            .iter()
            .map(|site_id| {
                let mut row = vec![
                    site_id.to_string(),
                    u8::from(self.solution.is_open(site_id)).to_string(),
                ];
                row.extend(
                    instance
                        .panel_types
                        .iter()
                        .map(|id| self.solution.panel_count(site_id, id).to_string()),
                );
                row.extend(
                    instance
                        .charger_types
                        .iter()
                        .map(|id| self.solution.charger_count(site_id, id).to_string()),
                );
                row
            })
            .collect();

        write_table(f, &header, &rows)
    }
}

/// Headline figures for an optimal solution
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionSummary {
    /// Objective value over the horizon, including the constant penalty term
    pub objective: Money,
    /// The horizon in days
    pub horizon_days: Dimensionless,
    /// Energy served per day
    pub served: Energy,
    /// Energy bought from the grid per day
    pub grid: Energy,
    /// Capital expenditure on panels and chargers
    pub capex: Money,
    /// The capital budget
    pub budget: Money,
    /// Penalty for unmet demand per day
    pub penalty_cost: Money,
}

impl SolutionSummary {
    /// Calculate the summary figures for a solution
    pub fn new(instance: &Instance, solution: &Solution) -> Result<Self> {
        let mut served = Energy::default();
        let mut grid = Energy::default();
        for site_id in &instance.sites {
            for hour in instance.hours() {
                served += solution.served_at(instance, site_id, hour);
                grid += solution.grid_draw(site_id, hour);
            }
        }

        Ok(Self {
            objective: solution.objective(),
            horizon_days: instance.horizon_days,
            served,
            grid,
            capex: solution.capex_spent(instance)?,
            budget: instance.capex_budget,
            penalty_cost: solution.penalty_cost(instance)?,
        })
    }

    /// Energy served which is not bought from the grid, i.e. covered by solar
    pub fn solar(&self) -> Energy {
        Energy::new((self.served - self.grid).value().max(0.0))
    }

    /// Grid purchases as a proportion of energy served (zero if nothing is served)
    pub fn grid_share(&self) -> Dimensionless {
        if self.served.value() > 0.0 {
            self.grid / self.served
        } else {
            Dimensionless(0.0)
        }
    }

    /// Capital expenditure as a proportion of the budget (zero if there is no budget)
    pub fn budget_share(&self) -> Dimensionless {
        if self.budget.value() > 0.0 {
            self.capex / self.budget
        } else {
            Dimensionless(0.0)
        }
    }
}

impl fmt::Display for SolutionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Objective value (horizon {} days): {}",
            self.horizon_days,
            format_thousands(self.objective.value(), 0)
        )?;
        writeln!(
            f,
            "Energy served per day: {} kWh",
            format_thousands(self.served.value(), 1)
        )?;
        writeln!(
            f,
            "Energy bought from the grid per day: {} kWh ({} of energy served)",
            format_thousands(self.grid.value(), 1),
            format_percent(self.grid_share(), 1)
        )?;
        writeln!(
            f,
            "Energy covered by solar per day: {} kWh",
            format_thousands(self.solar().value(), 1)
        )?;
        writeln!(
            f,
            "Capital expenditure: {} ({} of budget)",
            format_thousands(self.capex.value(), 0),
            format_percent(self.budget_share(), 1)
        )
    }
}

/// Write the status of the solve and, if it was optimal, a summary of the solution
pub fn write_report(
    out: &mut impl Write,
    instance: &Instance,
    outcome: &SolveOutcome,
) -> Result<()> {
    writeln!(out, "Model status: {}", outcome.status)?;
    writeln!(
        out,
        "Solve time: {:.2} s",
        outcome.solve_time.as_secs_f64()
    )?;
    if let Some(gap) = outcome.mip_gap {
        writeln!(out, "Relative MIP gap: {}", format_percent(Dimensionless(gap), 3))?;
    }

    let Some(solution) = &outcome.solution else {
        return Ok(());
    };

    let summary = SolutionSummary::new(instance, solution)?;
    writeln!(out)?;
    write!(out, "{summary}")?;
    writeln!(out, "\nInvestment decisions by site:")?;
    write!(out, "{}", InvestmentTable::new(instance, solution))?;
    writeln!(out, "\nEnergy served per day (kWh) by site and segment:")?;
    write!(out, "{}", SiteSegmentTable::served(instance, solution)?)?;
    writeln!(out, "\nUnmet demand per day (kWh) by site and segment:")?;
    write!(out, "{}", SiteSegmentTable::unmet(instance, solution)?)?;
    writeln!(
        out,
        "\nPenalty cost per day: {}",
        format_thousands(summary.penalty_cost.value(), 0)
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{instance, instance_data, solution};
    use crate::solver::SolveStatus;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case(0.0, 0, "0")]
    #[case(999.0, 0, "999")]
    #[case(1000.0, 0, "1,000")]
    #[case(1_234_567.891, 1, "1,234,567.9")]
    #[case(-98_765.4, 0, "-98,765")]
    #[case(-0.04, 1, "0.0")]
    #[case(999_999.96, 1, "1,000,000.0")]
    fn test_format_thousands(#[case] value: f64, #[case] decimals: usize, #[case] expected: &str) {
        assert_eq!(format_thousands(value, decimals), expected);
    }

    #[test]
    fn test_write_table() {
        let header = vec!["Site".to_string(), "A".to_string()];
        let rows = vec![
            vec!["Chañaral".to_string(), "1.0".to_string()],
            vec!["X".to_string(), "1,000.0".to_string()],
        ];
        let mut out = String::new();
        write_table(&mut out, &header, &rows).unwrap();
        assert_eq!(
            out,
            "Site            A\nChañaral      1.0\nX         1,000.0\n"
        );
    }

    #[rstest]
    fn test_site_segment_tables(instance: Instance, solution: Solution) {
        let site = "site1".into();
        let segment = "car".into();

        let demand = SiteSegmentTable::demand(&instance).unwrap();
        assert_eq!(demand.get(&site, &segment), Some(Energy(100.0)));

        let served = SiteSegmentTable::served(&instance, &solution).unwrap();
        assert_eq!(served.get(&site, &segment), Some(Energy(95.0)));
        assert_eq!(served.grand_total(), Energy(95.0));

        let unmet = SiteSegmentTable::unmet(&instance, &solution).unwrap();
        assert_approx_eq!(f64, unmet.get(&site, &segment).unwrap().value(), 5.0);
        assert_eq!(unmet.get(&site, &"bus".into()), None);

        assert_eq!(
            served.to_string(),
            "Site    car\nsite1  95.0\nTotal  95.0\n"
        );
    }

    #[rstest]
    fn test_investment_table(instance: Instance, solution: Solution) {
        assert_eq!(
            InvestmentTable::new(&instance, &solution).to_string(),
            "Site   Open  Panels_pv  Chargers_dc\nsite1     1          4            1\n"
        );
    }

    #[rstest]
    fn test_solution_summary(instance: Instance, solution: Solution) {
        let summary = SolutionSummary::new(&instance, &solution).unwrap();

        assert_eq!(summary.served, Energy(95.0));
        assert_eq!(summary.grid, Energy(94.0));
        assert_eq!(summary.solar(), Energy(1.0));
        assert_eq!(summary.capex, Money(650.0));
        assert_approx_eq!(f64, summary.budget_share().value(), 0.65);
        assert_approx_eq!(f64, summary.grid_share().value(), 94.0 / 95.0);
    }

    #[test]
    fn test_solution_summary_nothing_served() {
        let summary = SolutionSummary {
            objective: Money(-10.0),
            horizon_days: Dimensionless(1.0),
            served: Energy(0.0),
            grid: Energy(0.0),
            capex: Money(0.0),
            budget: Money(0.0),
            penalty_cost: Money(10.0),
        };
        assert_eq!(summary.grid_share(), Dimensionless(0.0));
        assert_eq!(summary.budget_share(), Dimensionless(0.0));
        assert_eq!(summary.solar(), Energy(0.0));
    }

    #[rstest]
    fn test_write_report_optimal(instance: Instance, solution: Solution) {
        let outcome = SolveOutcome {
            status: SolveStatus::Optimal,
            solve_time: Duration::from_millis(120),
            mip_gap: Some(0.0),
            solution: Some(solution),
        };
        let mut out = Vec::new();
        write_report(&mut out, &instance, &outcome).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.starts_with(
            "Model status: OPTIMAL\nSolve time: 0.12 s\nRelative MIP gap: 0.000%\n"
        ));
        assert!(out.contains("Objective value (horizon 1 days): 123,457\n"));
        assert!(out.contains("Capital expenditure: 650 (65.0% of budget)\n"));
        assert!(out.contains("Penalty cost per day: 20\n"));
    }

    #[rstest]
    fn test_write_report_not_optimal(instance: Instance) {
        let outcome = SolveOutcome {
            status: SolveStatus::Infeasible,
            solve_time: Duration::from_secs(1),
            mip_gap: None,
            solution: None,
        };
        let mut out = Vec::new();
        write_report(&mut out, &instance, &outcome).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Model status: INFEASIBLE\nSolve time: 1.00 s\n"
        );
    }
}
