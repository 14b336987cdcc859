//! Linear optimal power flow with capacity expansion
//!
//! Jointly optimises dispatch over a set of snapshots and the nominal
//! capacity of every extendable asset, subject to a global CO2 cap.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LINEAR OPF WITH STORAGE AND EXPANSION                                   │
//! │  ─────────────────────────────────────                                   │
//! │                                                                          │
//! │  Decide:                                                                 │
//! │    • Generator output p[g,t], storage store/dispatch and state of charge │
//! │    • AC line flows f[l,t], transport link flows q[k,t]                   │
//! │    • Capacities p_nom / s_nom of extendable assets                       │
//! │                                                                          │
//! │  Minimize:                                                               │
//! │    Σ capital_cost · capacity + Σ_t Σ marginal_cost · p                   │
//! │                                                                          │
//! │  Subject to:                                                             │
//! │    • Nodal balance at every bus and snapshot                             │
//! │    • Linearised flow f = (θ0 - θ1)/x, |f| ≤ s_nom                        │
//! │    • p_min ≤ q ≤ p_max, |q| ≤ s_nom (or q = p_set when scheduled)        │
//! │    • 0 ≤ p ≤ p_nom (flexible), 0 ≤ p ≤ p_max_pu[t]·p_nom (variable)      │
//! │    • soc(t+1) = soc(t)(1-loss) + η_s·store(t) - dispatch(t)/η_d          │
//! │    • 0 ≤ soc ≤ max_hours · p_nom                                         │
//! │    • Σ_t Σ_g p[g,t] / η_g · co2(g) ≤ co2_limit                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each sub-network has its own angle reference. Transport links carry
//! power between sub-networks without coupling their angles.
//!
//! Results are written back into the network's result series (`p`, `p0`,
//! `p1`, `state_of_charge`, `p_nom_opt`, `s_nom_opt`).

mod problem;
mod solution;
mod solver;

pub use problem::LopfOptions;
pub use solution::{LopfStatus, LopfSummary};
pub use solver::{Lopf, SolveError};
