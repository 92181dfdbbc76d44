//! Clarabel backend for area QPs.

use std::collections::BTreeMap;

use clarabel::algebra::CscMatrix;
use clarabel::solver::{DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT};

use crate::opf::traits::{SolverError, SubproblemSolver};
use crate::opf::types::{QpProblem, QpSolution, SolveStatus};

/// Clarabel interior-point backend.
///
/// Clarabel is pure Rust and always available, so it is the default solver
/// for every coordinator.
#[derive(Debug, Clone)]
pub struct ClarabelBackend {
    verbose: bool,
    max_iter: u32,
}

impl ClarabelBackend {
    pub fn new() -> Self {
        Self {
            verbose: false,
            max_iter: 200,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }
}

impl Default for ClarabelBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SubproblemSolver for ClarabelBackend {
    fn id(&self) -> &str {
        "clarabel"
    }

    fn solve(&self, problem: &QpProblem) -> Result<QpSolution, SolverError> {
        check_problem(problem)?;
        let n_var = problem.num_variables();

        // Clarabel form: min ½x'Px + q'x  s.t.  Ax + s = b, s ∈ K.
        // Equalities go to one zero cone, everything else (including finite
        // variable bounds) to one nonnegative cone.
        let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_var];
        let mut rhs: Vec<f64> = Vec::new();

        for row in &problem.equalities {
            let r = rhs.len();
            for &(col, val) in &row.terms {
                columns[col].push((r, val));
            }
            rhs.push(row.rhs);
        }
        let n_eq = rhs.len();

        for row in &problem.inequalities {
            let r = rhs.len();
            for &(col, val) in &row.terms {
                columns[col].push((r, val));
            }
            rhs.push(row.rhs);
        }
        for (col, var) in problem.variables.iter().enumerate() {
            if var.upper.is_finite() {
                columns[col].push((rhs.len(), 1.0));
                rhs.push(var.upper);
            }
            if var.lower.is_finite() {
                columns[col].push((rhs.len(), -1.0));
                rhs.push(-var.lower);
            }
        }
        let n_ineq = rhs.len() - n_eq;

        let mut cones: Vec<SupportedConeT<f64>> = Vec::new();
        if n_eq > 0 {
            cones.push(SupportedConeT::ZeroConeT(n_eq));
        }
        if n_ineq > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(n_ineq));
        }

        let a_mat = to_csc(rhs.len(), columns);
        let p_mat = quadratic_to_csc(n_var, &problem.quadratic);

        let settings = DefaultSettingsBuilder::default()
            .verbose(self.verbose)
            .max_iter(self.max_iter)
            .build()
            .map_err(|e| SolverError::Setup(format!("Clarabel settings error: {:?}", e)))?;

        let mut solver = DefaultSolver::new(&p_mat, &problem.linear, &a_mat, &rhs, &cones, settings)
            .map_err(|e| SolverError::Setup(format!("Clarabel initialization failed: {:?}", e)))?;

        solver.solve();

        let sol = &solver.solution;
        let status = match sol.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => SolveStatus::Optimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                SolveStatus::Infeasible
            }
            other => SolveStatus::Failed(format!("Clarabel returned status {:?}", other)),
        };
        let x = sol.x.clone();
        let objective = match status {
            SolveStatus::Optimal => problem.evaluate(&x),
            _ => f64::NAN,
        };

        Ok(QpSolution {
            status,
            x,
            objective,
        })
    }
}

fn check_problem(problem: &QpProblem) -> Result<(), SolverError> {
    let n_var = problem.num_variables();
    if problem.linear.len() != n_var {
        return Err(SolverError::InvalidProblem(format!(
            "{} cost coefficients for {} variables",
            problem.linear.len(),
            n_var
        )));
    }
    if problem.linear.iter().any(|c| !c.is_finite()) {
        return Err(SolverError::InvalidProblem("non-finite cost coefficient".into()));
    }
    for var in &problem.variables {
        if var.lower > var.upper || var.lower.is_nan() || var.upper.is_nan() {
            return Err(SolverError::InvalidProblem(format!(
                "variable {} has bounds [{}, {}]",
                var.name, var.lower, var.upper
            )));
        }
    }
    let rows = problem.equalities.iter().chain(&problem.inequalities);
    for row in rows {
        if !row.rhs.is_finite() {
            return Err(SolverError::InvalidProblem("non-finite right-hand side".into()));
        }
        if row.terms.iter().any(|&(col, v)| col >= n_var || !v.is_finite()) {
            return Err(SolverError::InvalidProblem("malformed constraint row".into()));
        }
    }
    if problem
        .quadratic
        .iter()
        .any(|&(i, j, q)| i >= n_var || j >= n_var || !q.is_finite())
    {
        return Err(SolverError::InvalidProblem("malformed quadratic term".into()));
    }
    Ok(())
}

/// Column-wise entries to CSC (rows sorted, duplicates summed).
fn to_csc(n_rows: usize, columns: Vec<Vec<(usize, f64)>>) -> CscMatrix<f64> {
    let n_cols = columns.len();
    let mut col_ptr = Vec::with_capacity(n_cols + 1);
    let mut row_idx = Vec::new();
    let mut values = Vec::new();

    for column in columns {
        col_ptr.push(row_idx.len());
        let mut merged: BTreeMap<usize, f64> = BTreeMap::new();
        for (r, v) in column {
            *merged.entry(r).or_default() += v;
        }
        for (r, v) in merged {
            row_idx.push(r);
            values.push(v);
        }
    }
    col_ptr.push(row_idx.len());

    CscMatrix::new(n_rows, n_cols, col_ptr, row_idx, values)
}

/// Upper triangle of P such that ½x'Px equals Σ q·x_i·x_j.
fn quadratic_to_csc(n_var: usize, terms: &[(usize, usize, f64)]) -> CscMatrix<f64> {
    let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_var];
    for &(i, j, q) in terms {
        let (row, col) = (i.min(j), i.max(j));
        let value = if i == j { 2.0 * q } else { q };
        columns[col].push((row, value));
    }
    to_csc(n_var, columns)
}
