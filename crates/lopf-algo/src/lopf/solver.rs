//! LP formulation and solve.

use super::problem::{check_snapshots, extract_problem_data, Capacity, ProblemData};
use super::solution::{LopfStatus, LopfSummary, RawSolution};
use super::LopfOptions;
use clarabel::solver::SolverStatus;
use good_lp::solvers::clarabel::clarabel;
use good_lp::{
    constraint, variable, variables, Constraint, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use lopf_core::{LinkDispatch, Network, Snapshot};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// LOPF solver errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("no snapshots to solve")]
    NoSnapshots,

    #[error("snapshot {0} is not part of the network horizon")]
    UnknownSnapshot(Snapshot),

    /// Solved snapshots must be strictly increasing (offending index)
    #[error("solved snapshots must be strictly increasing (offending index {0})")]
    UnorderedSnapshots(usize),

    /// Required input series or elements are missing
    #[error("missing input data: {0}")]
    MissingData(String),

    #[error("LOPF infeasible (co2_limit = {co2_limit:?}, horizon = {horizon} snapshots)")]
    Infeasible {
        co2_limit: Option<f64>,
        horizon: usize,
    },

    #[error("LOPF unbounded (co2_limit = {co2_limit:?}, horizon = {horizon} snapshots)")]
    Unbounded {
        co2_limit: Option<f64>,
        horizon: usize,
    },

    /// Backend failure other than infeasibility or unboundedness
    #[error("LP solver failed: {0}")]
    Solver(String),
}

impl From<SolveError> for lopf_core::LopfError {
    fn from(err: SolveError) -> Self {
        lopf_core::LopfError::Solver(err.to_string())
    }
}

/// Linear OPF with joint capacity expansion.
///
/// # Example
///
/// ```no_run
/// use lopf_algo::{demo_case, Lopf};
/// use lopf_core::DemoConfig;
///
/// let config = DemoConfig::default();
/// let mut case = demo_case(&config)?;
/// let summary = Lopf::new().solve(&mut case.network, &config.solve_snapshots())?;
/// println!("objective {:.2}", summary.objective);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Lopf {
    options: LopfOptions,
}

impl Lopf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LopfOptions) -> Self {
        Self { options }
    }

    pub fn with_link_dispatch(mut self, link_dispatch: LinkDispatch) -> Self {
        self.options.link_dispatch = link_dispatch;
        self
    }

    /// Override the network's CO2 cap.
    pub fn with_co2_limit(mut self, co2_limit: f64) -> Self {
        self.options.co2_limit = Some(co2_limit);
        self
    }

    pub fn options(&self) -> &LopfOptions {
        &self.options
    }

    /// Solve over `snapshots` and write the results into `network`.
    ///
    /// Determines the network topology first if it is missing or stale.
    pub fn solve(
        &self,
        network: &mut Network,
        snapshots: &[Snapshot],
    ) -> Result<LopfSummary, SolveError> {
        let start = Instant::now();
        check_snapshots(network, snapshots)?;
        if !network.has_topology() {
            network.determine_network_topology();
        }

        let data = extract_problem_data(network, snapshots, &self.options)?;
        let raw = solve_problem(&data, snapshots.len())?;
        raw.write_into(network, &data, snapshots);

        let emissions = raw.emissions(&data);
        let summary = LopfSummary {
            status: raw.status,
            objective: raw.objective(&data),
            emissions,
            co2_limit: data.co2_limit,
            snapshots: snapshots.to_vec(),
            num_variables: raw.num_variables,
            num_constraints: raw.num_constraints,
            solve_time: start.elapsed(),
        };
        info!(
            objective = summary.objective,
            emissions = summary.emissions,
            elapsed_ms = summary.solve_time.as_millis() as u64,
            "LOPF solved"
        );
        Ok(summary)
    }
}

/// Constant or decision variable.
#[derive(Debug, Clone, Copy)]
pub(super) enum Term {
    Const(f64),
    Var(Variable),
}

impl Term {
    fn expr(&self) -> Expression {
        match *self {
            Term::Const(c) => Expression::from(c),
            Term::Var(v) => 1.0 * v,
        }
    }

    fn scaled(&self, k: f64) -> Expression {
        match *self {
            Term::Const(c) => Expression::from(k * c),
            Term::Var(v) => k * v,
        }
    }

    fn is_const(&self) -> bool {
        matches!(self, Term::Const(_))
    }

    pub(super) fn value(&self, solution: &impl Solution) -> f64 {
        match *self {
            Term::Const(c) => c,
            Term::Var(v) => solution.value(v),
        }
    }
}

fn capacity_term(
    vars: &mut ProblemVariables,
    capacity: Capacity,
    capital_cost: f64,
    objective: &mut Expression,
) -> Term {
    match capacity {
        Capacity::Fixed(value) => Term::Const(value),
        Capacity::Extendable(ext) => {
            let def = variable().min(ext.min);
            let def = match ext.max {
                Some(max) => def.max(max),
                None => def,
            };
            let var = vars.add(def);
            *objective += capital_cost * var;
            Term::Var(var)
        }
    }
}

fn nonnegative(vars: &mut ProblemVariables, n: usize) -> Vec<Variable> {
    (0..n).map(|_| vars.add(variable().min(0.0))).collect()
}

fn solve_problem(data: &ProblemData, t_len: usize) -> Result<RawSolution, SolveError> {
    let infeasible = || SolveError::Infeasible {
        co2_limit: data.co2_limit,
        horizon: t_len,
    };
    let unbounded = || SolveError::Unbounded {
        co2_limit: data.co2_limit,
        horizon: t_len,
    };

    // === Variables ===
    let mut vars = variables!();
    let mut objective = Expression::from(0.0);

    let mut gen_cap = Vec::with_capacity(data.generators.len());
    let mut gen_p = Vec::with_capacity(data.generators.len());
    for gen in &data.generators {
        gen_cap.push(capacity_term(&mut vars, gen.capacity, gen.capital_cost, &mut objective));
        let p = nonnegative(&mut vars, t_len);
        for v in &p {
            objective += gen.marginal_cost * *v;
        }
        gen_p.push(p);
    }

    let mut su_cap = Vec::with_capacity(data.storage.len());
    let mut su_store = Vec::with_capacity(data.storage.len());
    let mut su_dispatch = Vec::with_capacity(data.storage.len());
    // Energy level at the end of each snapshot
    let mut su_soc = Vec::with_capacity(data.storage.len());
    for su in &data.storage {
        su_cap.push(capacity_term(&mut vars, su.capacity, su.capital_cost, &mut objective));
        su_store.push(nonnegative(&mut vars, t_len));
        let dispatch = nonnegative(&mut vars, t_len);
        for v in &dispatch {
            objective += su.marginal_cost * *v;
        }
        su_dispatch.push(dispatch);
        su_soc.push(nonnegative(&mut vars, t_len));
    }

    let mut line_cap = Vec::with_capacity(data.lines.len());
    let mut line_flow = Vec::with_capacity(data.lines.len());
    for line in &data.lines {
        line_cap.push(capacity_term(&mut vars, line.capacity, line.capital_cost, &mut objective));
        line_flow.push((0..t_len).map(|_| vars.add(variable())).collect::<Vec<_>>());
    }

    let mut link_cap = Vec::with_capacity(data.links.len());
    let mut link_flow = Vec::with_capacity(data.links.len());
    for link in &data.links {
        link_cap.push(capacity_term(&mut vars, link.capacity, link.capital_cost, &mut objective));
        let flows: Vec<Term> = match &link.schedule {
            Some(schedule) => schedule.iter().map(|&p| Term::Const(p)).collect(),
            None => (0..t_len)
                .map(|_| Term::Var(vars.add(variable().min(link.p_min).max(link.p_max))))
                .collect(),
        };
        link_flow.push(flows);
    }

    // Bus angles, fixed to zero at each sub-network's slack bus
    let theta: Vec<Vec<Term>> = (0..data.n_bus)
        .map(|b| {
            (0..t_len)
                .map(|_| {
                    if data.is_slack[b] {
                        Term::Const(0.0)
                    } else {
                        Term::Var(vars.add(variable()))
                    }
                })
                .collect()
        })
        .collect();

    let num_variables = {
        let per_snapshot = data.generators.len()
            + 3 * data.storage.len()
            + data.lines.len()
            + data.links.iter().filter(|l| l.schedule.is_none()).count()
            + data.is_slack.iter().filter(|s| !**s).count();
        let capacities = gen_cap
            .iter()
            .chain(&su_cap)
            .chain(&line_cap)
            .chain(&link_cap)
            .filter(|c| !c.is_const())
            .count();
        per_snapshot * t_len + capacities
    };

    let mut constraints: Vec<Constraint> = Vec::new();

    // === Generator limits ===
    for ((gen, p), cap) in data.generators.iter().zip(&gen_p).zip(&gen_cap) {
        for t in 0..t_len {
            let limit = match &gen.p_max_pu {
                Some(pu) => cap.scaled(pu[t]),
                None => cap.expr(),
            };
            constraints.push(constraint!(p[t] <= limit));
        }
    }

    // === Storage ===
    for (i, su) in data.storage.iter().enumerate() {
        let cap = su_cap[i];
        let (store, dispatch, soc) = (&su_store[i], &su_dispatch[i], &su_soc[i]);
        let retained = 1.0 - su.standing_loss;
        for t in 0..t_len {
            constraints.push(constraint!(store[t] <= cap.scaled(-su.p_min_pu)));
            constraints.push(constraint!(dispatch[t] <= cap.scaled(su.p_max_pu)));
            constraints.push(constraint!(soc[t] <= cap.scaled(su.max_hours)));

            let mut energy = if t == 0 {
                Expression::from(retained * su.initial_soc)
            } else {
                retained * soc[t - 1]
            };
            energy += su.efficiency_store * store[t];
            energy -= (1.0 / su.efficiency_dispatch) * dispatch[t];
            constraints.push(constraint!(soc[t] == energy));
        }
    }

    // === AC lines ===
    for (i, line) in data.lines.iter().enumerate() {
        let cap = line_cap[i];
        for t in 0..t_len {
            let f = line_flow[i][t];
            let physics = theta[line.bus0][t].scaled(line.susceptance)
                - theta[line.bus1][t].scaled(line.susceptance);
            constraints.push(constraint!(f == physics));
            constraints.push(constraint!(f <= cap.expr()));
            constraints.push(constraint!(f >= cap.scaled(-1.0)));
        }
    }

    // === Transport links ===
    for (i, link) in data.links.iter().enumerate() {
        let cap = link_cap[i];
        for t in 0..t_len {
            let q = link_flow[i][t];
            if let Term::Const(flow) = q {
                if flow < link.p_min - 1e-9 || flow > link.p_max + 1e-9 {
                    warn!(
                        flow,
                        p_min = link.p_min,
                        p_max = link.p_max,
                        "scheduled transfer outside link limits"
                    );
                    return Err(infeasible());
                }
            }
            if let (Term::Const(flow), Term::Const(rating)) = (q, cap) {
                if flow.abs() > rating + 1e-9 {
                    warn!(flow, rating, "scheduled transfer exceeds fixed link rating");
                    return Err(infeasible());
                }
                continue;
            }
            constraints.push(constraint!(q.expr() <= cap.expr()));
            constraints.push(constraint!(q.expr() >= cap.scaled(-1.0)));
        }
    }

    // === Nodal balance ===
    for t in 0..t_len {
        let mut balance: Vec<Expression> = (0..data.n_bus)
            .map(|b| Expression::from(-data.demand[b][t]))
            .collect();
        for (gen, p) in data.generators.iter().zip(&gen_p) {
            balance[gen.bus] += p[t];
        }
        for (i, su) in data.storage.iter().enumerate() {
            balance[su.bus] += su_dispatch[i][t];
            balance[su.bus] -= su_store[i][t];
        }
        for (i, link) in data.links.iter().enumerate() {
            let q = link_flow[i][t];
            balance[link.bus0] -= q.expr();
            balance[link.bus1] += q.expr();
        }
        for (i, line) in data.lines.iter().enumerate() {
            let f = line_flow[i][t];
            balance[line.bus0] -= f;
            balance[line.bus1] += f;
        }
        for expr in balance {
            constraints.push(constraint!(expr == 0.0));
        }
    }

    // === CO2 cap ===
    if let Some(limit) = data.co2_limit {
        let mut emissions = Expression::from(0.0);
        let mut emitting = false;
        for (gen, p) in data.generators.iter().zip(&gen_p) {
            if gen.emission_intensity > 0.0 {
                emitting = true;
                for v in p {
                    emissions += gen.emission_intensity * *v;
                }
            }
        }
        if emitting {
            constraints.push(constraint!(emissions <= limit));
        }
    }

    let num_constraints = constraints.len();
    debug!(
        variables = num_variables,
        constraints = num_constraints,
        snapshots = t_len,
        "built LOPF model"
    );

    let mut model = vars.minimise(objective).using(clarabel);
    for c in constraints {
        model = model.with(c);
    }

    let solution = model.solve().map_err(|e| match e {
        ResolutionError::Infeasible => infeasible(),
        ResolutionError::Unbounded => unbounded(),
        other => SolveError::Solver(other.to_string()),
    })?;

    // good_lp hands back dual-infeasible and reduced-accuracy results as solved
    let status = match solution.inner().status {
        SolverStatus::Solved => LopfStatus::Optimal,
        SolverStatus::AlmostSolved => {
            warn!("Clarabel stopped at reduced accuracy");
            LopfStatus::AlmostOptimal
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            warn!("Clarabel certified dual infeasibility");
            return Err(unbounded());
        }
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            return Err(infeasible());
        }
        other => {
            return Err(SolveError::Solver(format!(
                "Clarabel returned status {other:?}"
            )))
        }
    };

    let values = |vs: &Vec<Variable>| vs.iter().map(|v| solution.value(*v)).collect::<Vec<_>>();
    Ok(RawSolution {
        status,
        gen_capacity: gen_cap.iter().map(|c| c.value(&solution)).collect(),
        gen_p: gen_p.iter().map(values).collect(),
        storage_capacity: su_cap.iter().map(|c| c.value(&solution)).collect(),
        storage_store: su_store.iter().map(values).collect(),
        storage_dispatch: su_dispatch.iter().map(values).collect(),
        storage_soc: su_soc.iter().map(values).collect(),
        line_capacity: line_cap.iter().map(|c| c.value(&solution)).collect(),
        line_flow: line_flow.iter().map(values).collect(),
        link_capacity: link_cap.iter().map(|c| c.value(&solution)).collect(),
        link_flow: link_flow
            .iter()
            .map(|flows| flows.iter().map(|q| q.value(&solution)).collect())
            .collect(),
        num_variables,
        num_constraints,
    })
}
