//! Session (`spec.md` §6): ties the AIG, SAT solver, probe registry,
//! condition stack, CNF builder, equivalence engine and extractor into
//! the single handle the public API exposes.

use crate::aig::Aig;
use crate::cnf::CnfBuilder;
use crate::cond::ConditionStack;
use crate::equiv::{EquivEngine, EquivStats, EquivStatus};
use crate::error::{Result, SweeperError};
use crate::extract::Extractor;
use crate::lit::Lit;
use crate::probe::ProbeRegistry;
use crate::sat::SatSolver;
use log::info;
use std::time::{Duration, Instant};

/// Builder for the resource limits a session starts with (`spec.md`
/// §6). Setters are infallible; `Session::start` validates the whole
/// config at once and is the single place a bad value is rejected.
#[derive(Clone, Copy)]
pub struct SessionConfig {
    conflict_budget: i64,
    runtime_limit: Option<Duration>,
    initial_var_capacity: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            conflict_budget: 1000,
            runtime_limit: None,
            initial_var_capacity: 1,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conflict_budget(mut self, budget: i64) -> Self {
        self.conflict_budget = budget;
        self
    }

    pub fn with_runtime_limit(mut self, limit: Duration) -> Self {
        self.runtime_limit = Some(limit);
        self
    }

    pub fn with_initial_var_capacity(mut self, capacity: u32) -> Self {
        self.initial_var_capacity = capacity;
        self
    }
}

pub struct Session {
    aig: Aig,
    sat: SatSolver,
    cnf: CnfBuilder,
    probes: ProbeRegistry,
    cond: ConditionStack,
    equiv: EquivEngine,
    extractor: Extractor,
    conflict_budget: i64,
}

impl Session {
    /// Validates `config`, pre-encodes constant-0, and returns a ready
    /// session (`spec.md` §3/§6).
    pub fn start(config: SessionConfig) -> Result<Session> {
        if config.conflict_budget < 0 {
            return Err(SweeperError::InvalidConflictBudget(config.conflict_budget));
        }
        if let Some(limit) = config.runtime_limit {
            if limit.is_zero() {
                return Err(SweeperError::InvalidRuntimeLimit(limit));
            }
        }
        if config.initial_var_capacity < 1 {
            return Err(SweeperError::InvalidVarCapacity);
        }

        let mut sat = SatSolver::new();
        sat.set_num_vars(config.initial_var_capacity);
        if let Some(limit) = config.runtime_limit {
            sat.set_runtime_limit(Some(Instant::now() + limit));
        }
        let mut cnf = CnfBuilder::new();
        cnf.encode_const0(&mut sat);

        info!("session started, conflict_budget={}", config.conflict_budget);
        Ok(Session {
            aig: Aig::new(),
            sat,
            cnf,
            probes: ProbeRegistry::new(),
            cond: ConditionStack::new(),
            equiv: EquivEngine::new(),
            extractor: Extractor::new(),
            conflict_budget: config.conflict_budget,
        })
    }

    /// Reports final statistics and releases nothing else — the
    /// session's resources are dropped along with it, per `spec.md`
    /// §6 (`stop` has no further effect on a session already at rest).
    pub fn stop(&mut self) {
        info!(
            "session stopped: sat_calls={} proofs={} fails={}",
            self.equiv.stats().sat_calls,
            self.equiv.stats().sat_proofs,
            self.equiv.stats().sat_fails
        );
    }

    pub fn set_conflict_limit(&mut self, budget: i64) -> Result<()> {
        if budget < 0 {
            return Err(SweeperError::InvalidConflictBudget(budget));
        }
        self.conflict_budget = budget;
        Ok(())
    }

    pub fn set_runtime_limit(&mut self, limit: Duration) -> Result<()> {
        if limit.is_zero() {
            return Err(SweeperError::InvalidRuntimeLimit(limit));
        }
        self.sat.set_runtime_limit(Some(Instant::now() + limit));
        Ok(())
    }

    /// The AIG backing this session. Callers build primary inputs and
    /// AND gates directly on it, then reference the resulting literals
    /// through `probe_create`/`probe_find`.
    pub fn aig(&self) -> &Aig {
        &self.aig
    }
    pub fn aig_mut(&mut self) -> &mut Aig {
        &mut self.aig
    }

    pub fn probe_create(&mut self, lit: Lit) -> u32 {
        self.probes.probe_create(lit)
    }
    pub fn probe_find(&mut self, lit: Lit) -> u32 {
        self.probes.probe_find(lit)
    }
    pub fn probe_deref(&mut self, id: u32) {
        self.probes.probe_deref(id)
    }
    pub fn probe_lit(&self, id: u32) -> Lit {
        self.probes.probe_lit(id)
    }

    /// Pushes a scoped assumption.
    pub fn cond_push(&mut self, probe_id: u32) {
        self.cond.push(probe_id, &self.probes);
    }

    /// Pops the innermost condition. Probe lifetime is managed by the
    /// caller independently via `probe_deref`.
    pub fn cond_pop(&mut self) -> u32 {
        self.cond.pop()
    }

    /// Proves or refutes `probe_lit(p1) == probe_lit(p2)`, per
    /// `spec.md` §6/§4.4.1.
    pub fn check_equiv(&mut self, p1: u32, p2: u32) -> EquivStatus {
        let lit1 = self.probes.probe_lit(p1);
        let lit2 = self.probes.probe_lit(p2);
        self.equiv
            .check_equiv(&self.aig, &mut self.sat, &mut self.cnf, &self.cond, lit1, lit2, self.conflict_budget)
    }

    pub fn check_cond_unsat(&mut self) -> EquivStatus {
        self.equiv
            .check_cond_unsat(&self.aig, &mut self.sat, &mut self.cnf, &self.cond, self.conflict_budget)
    }

    pub fn get_cex(&self) -> Option<&[bool]> {
        self.equiv.get_cex()
    }

    pub fn equiv_stats(&self) -> &EquivStats {
        self.equiv.stats()
    }

    /// Extracts the logic cone behind `probes` into a standalone AIG,
    /// naming outputs from `output_names` in the same order.
    pub fn extract(&mut self, probes: &[u32], output_names: &[String]) -> Aig {
        let lits: Vec<Lit> = probes.iter().map(|&id| self.probes.probe_lit(id)).collect();
        self.extractor.extract(&mut self.aig, &lits, output_names)
    }
}
