//! The boundary with the external MILP solver (HiGHS).
//!
//! Solver configuration is passed explicitly with every call via [`SolverOptions`]; no global
//! solver state is modified.
use crate::formulation::Formulation;
use crate::solution::Solution;
use crate::units::Money;
use anyhow::{Result, anyhow};
use highs::{HighsModelStatus, Sense};
use log::{debug, info};
use std::time::{Duration, Instant};

/// Options passed to the solver for a single solve
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverOptions {
    /// Wall-clock time limit in seconds
    pub time_limit: Option<f64>,
    /// Relative MIP gap at which the solver may stop
    pub mip_rel_gap: Option<f64>,
    /// Number of threads the solver may use
    pub threads: Option<u32>,
    /// Whether to let the solver write its own log to the console
    pub solver_output: bool,
}

/// How the solver terminated
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SolveStatus {
    /// A provably optimal solution (within the MIP gap tolerance) was found
    #[display("OPTIMAL")]
    Optimal,
    /// The problem has no feasible solution
    #[display("INFEASIBLE")]
    Infeasible,
    /// The objective is unbounded
    #[display("UNBOUNDED")]
    Unbounded,
    /// The solver could not tell whether the problem is infeasible or unbounded
    #[display("INF_OR_UNBD")]
    InfeasibleOrUnbounded,
    /// The time limit was reached before optimality was proven
    #[display("TIME_LIMIT")]
    TimeLimit,
    /// An iteration limit was reached before optimality was proven
    #[display("ITERATION_LIMIT")]
    IterationLimit,
    /// Any other termination status reported by the solver
    #[display("STATUS_{_0}")]
    Other(String),
}

impl From<HighsModelStatus> for SolveStatus {
    fn from(status: HighsModelStatus) -> Self {
        match status {
            HighsModelStatus::Optimal => Self::Optimal,
            HighsModelStatus::Infeasible => Self::Infeasible,
            HighsModelStatus::Unbounded => Self::Unbounded,
            HighsModelStatus::UnboundedOrInfeasible => Self::InfeasibleOrUnbounded,
            HighsModelStatus::ReachedTimeLimit => Self::TimeLimit,
            HighsModelStatus::ReachedIterationLimit => Self::IterationLimit,
            other => Self::Other(format!("{other:?}")),
        }
    }
}

/// What the solver returned
pub struct SolveOutcome {
    /// Termination status
    pub status: SolveStatus,
    /// Wall-clock time spent in the solver
    pub solve_time: Duration,
    /// Relative MIP gap, for problems with integer variables
    pub mip_gap: Option<f64>,
    /// The solution, present only if the solve was optimal
    pub solution: Option<Solution>,
}

impl SolveOutcome {
    /// Whether the solver proved optimality
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

/// Apply the solve options to a HiGHS model
fn apply_options(model: &mut highs::Model, options: &SolverOptions) {
    model.set_option("output_flag", options.solver_output);
    model.set_option("log_to_console", options.solver_output);

    if let Some(time_limit) = options.time_limit {
        model.set_option("time_limit", time_limit);
    }
    if let Some(gap) = options.mip_rel_gap {
        model.set_option("mip_rel_gap", gap);
    }
    if let Some(threads) = options.threads {
        model.set_option("threads", i32::try_from(threads).unwrap_or(i32::MAX));
    }
}

/// Solve the formulated problem, maximising the objective.
///
/// A non-optimal termination (infeasible, unbounded, limit reached) is not an error: it is
/// reported through [`SolveOutcome::status`]. An error is returned only if the solver itself fails
/// to run.
pub fn solve(formulation: Formulation, options: &SolverOptions) -> Result<SolveOutcome> {
    let Formulation {
        problem,
        variables,
        structure,
        objective_offset,
    } = formulation;

    let mut model = problem.optimise(Sense::Maximise);
    apply_options(&mut model, options);
    debug!("Solver options: {options:?}");

    let start = Instant::now();
    let solved = model
        .try_solve()
        .map_err(|status| anyhow!("HiGHS failed to run: {status:?}"))?;
    let solve_time = start.elapsed();

    let status = SolveStatus::from(solved.status());
    info!(
        "Solver finished with status {status} in {:.2} s",
        solve_time.as_secs_f64()
    );

    let mip_gap = structure.is_mip().then(|| solved.mip_gap());
    let solution = if status == SolveStatus::Optimal {
        let objective = Money::new(solved.objective_value()) + objective_offset;
        let columns = solved.get_solution().columns().to_vec();
        Some(Solution::new(columns, variables, objective))
    } else {
        None
    };

    Ok(SolveOutcome {
        status,
        solve_time,
        mip_gap,
        solution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HighsModelStatus::Optimal, "OPTIMAL")]
    #[case(HighsModelStatus::Infeasible, "INFEASIBLE")]
    #[case(HighsModelStatus::Unbounded, "UNBOUNDED")]
    #[case(HighsModelStatus::UnboundedOrInfeasible, "INF_OR_UNBD")]
    #[case(HighsModelStatus::ReachedTimeLimit, "TIME_LIMIT")]
    #[case(HighsModelStatus::ModelEmpty, "STATUS_ModelEmpty")]
    fn test_status_labels(#[case] status: HighsModelStatus, #[case] expected: &str) {
        assert_eq!(SolveStatus::from(status).to_string(), expected);
    }
}
