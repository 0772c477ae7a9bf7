//! The SAT solver collaborator (`spec.md` §6): incremental, assumption
//! based, built around the teacher crate's two-watched-literal unit
//! propagation, generalized from one-shot DIMACS solving to a solver
//! that keeps its clause database and accepts a fresh set of
//! assumptions on every call (`spec.md` §4.4/§5 — "partial work ...
//! remains in the solver and is reused on the next call").

use crate::lit::{self, Lit};
use std::time::Instant;
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatResult {
    True,
    False,
    Undef,
}

struct Clause {
    lits: Vec<Lit>,
    watch: [usize; 2],
}

impl Clause {
    fn find_replacement(&self, assignments: &[Option<bool>]) -> Option<usize> {
        self.lits.iter().enumerate().position(|(idx, &l)| {
            idx != self.watch[0] && idx != self.watch[1] && value_of(assignments, l) != Some(false)
        })
    }
}

#[inline]
fn value_of(assignments: &[Option<bool>], l: Lit) -> Option<bool> {
    assignments[lit::index(l) as usize].map(|v| v == !lit::is_complement(l))
}

enum Decision {
    Assumption,
    Branch { var: u32, tried_both: bool },
}

/// Incremental two-watched-literal DPLL solver over the shared literal
/// encoding (`crate::lit`). Variable 0 is reserved, matching
/// `spec.md` §3's "SAT variable counter ... starting at 1".
pub struct SatSolver {
    clauses: Vec<Clause>,
    assignments: Vec<Option<bool>>,
    watch_lists: Vec<Vec<usize>>,
    trail: Vec<u32>,
    trail_lim: Vec<usize>,
    num_vars: u32,
    deadline: Option<Instant>,
    /// Set when a unit clause conflicts with an already-forced literal
    /// at the base level: the formula is unsatisfiable independent of
    /// any assumptions, permanently.
    force_unsat: bool,
}

impl Default for SatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SatSolver {
    pub fn new() -> Self {
        SatSolver {
            clauses: Vec::new(),
            assignments: vec![None],
            watch_lists: vec![Vec::new(), Vec::new()],
            trail: Vec::new(),
            trail_lim: Vec::new(),
            num_vars: 0,
            deadline: None,
            force_unsat: false,
        }
    }

    /// Grows internal arrays so variables `0..n` are addressable.
    pub fn set_num_vars(&mut self, n: u32) {
        if n <= self.num_vars {
            return;
        }
        self.num_vars = n;
        self.assignments.resize((n + 1) as usize, None);
        self.watch_lists.resize(((n + 1) * 2) as usize, Vec::new());
    }

    /// Allocates the next unused variable, growing capacity with the
    /// same margin the original sweeper uses (`nSatVars + 100`).
    pub fn new_var(&mut self) -> u32 {
        self.num_vars += 1;
        let v = self.num_vars;
        if (v + 1) as usize > self.assignments.len() {
            self.set_num_vars(v + 100);
        }
        v
    }

    pub fn set_runtime_limit(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    /// Garbage-collects satisfied/subsumed clauses is a solver-internal
    /// optimization; this solver keeps every learnt clause, so
    /// `compress` is a deadline-free no-op kept for API parity with
    /// the collaborator contract.
    pub fn compress(&mut self) {}

    /// Asserts a clause. Returns `false` only on a genuine programming
    /// error (an empty clause after construction); per `spec.md` §4.3
    /// that is fatal at the call site, not here.
    pub fn add_clause(&mut self, lits: &[Lit]) -> bool {
        if lits.is_empty() {
            return false;
        }
        for &l in lits {
            self.set_num_vars(lit::index(l).max(self.num_vars));
        }
        // A live model from a previous solve (trail_lim non-empty) must
        // not be mistaken for permanent, base-level assignments.
        if !self.trail_lim.is_empty() {
            self.undo_to(0);
        }
        let id = self.clauses.len();
        if lits.len() == 1 {
            self.watch_lists[lits[0] as usize].push(id);
            self.clauses.push(Clause { lits: lits.to_vec(), watch: [0, 0] });
            if !self.assign(lits[0]) || !self.propagate(lits[0]) {
                self.force_unsat = true;
            }
            return true;
        }
        self.watch_lists[lits[0] as usize].push(id);
        self.watch_lists[lits[1] as usize].push(id);
        self.clauses.push(Clause {
            lits: lits.to_vec(),
            watch: [0, 1],
        });
        true
    }

    pub fn var_value(&self, var: u32) -> bool {
        self.assignments[var as usize].unwrap_or(false)
    }

    fn assign(&mut self, l: Lit) -> bool {
        let var = lit::index(l);
        let want = !lit::is_complement(l);
        match self.assignments[var as usize] {
            None => {
                self.assignments[var as usize] = Some(want);
                self.trail.push(var);
                true
            }
            Some(have) => have == want,
        }
    }

    fn undo_to(&mut self, level: usize) {
        if level >= self.trail_lim.len() {
            return;
        }
        let pos = self.trail_lim[level];
        while self.trail.len() > pos {
            let var = self.trail.pop().unwrap();
            self.assignments[var as usize] = None;
        }
        self.trail_lim.truncate(level);
    }

    /// Propagates `l` (already assigned true) to fixed point. Returns
    /// `false` on conflict.
    fn propagate(&mut self, l: Lit) -> bool {
        let mut queue = vec![l];
        while let Some(cur) = queue.pop() {
            if !self.process_watches(cur, &mut queue) {
                return false;
            }
        }
        true
    }

    fn process_watches(&mut self, satisfied: Lit, queue: &mut Vec<Lit>) -> bool {
        let falsified = lit::negate(satisfied) as usize;
        let affected = std::mem::take(&mut self.watch_lists[falsified]);
        let mut conflict = false;
        let mut kept = Vec::with_capacity(affected.len());
        for cid in affected {
            if conflict {
                kept.push(cid);
                continue;
            }
            let (keep, is_conflict) = self.update_clause(cid, lit::negate(satisfied), queue);
            conflict = is_conflict;
            if keep {
                kept.push(cid);
            }
        }
        self.watch_lists[falsified].extend(kept);
        !conflict
    }

    fn update_clause(&mut self, cid: usize, falsified: Lit, queue: &mut Vec<Lit>) -> (bool, bool) {
        if self.clauses[cid].lits[self.clauses[cid].watch[0]] == falsified {
            self.clauses[cid].watch.swap(0, 1);
        }
        let w0 = self.clauses[cid].lits[self.clauses[cid].watch[0]];
        if value_of(&self.assignments, w0) == Some(true) {
            return (true, false);
        }
        if let Some(j) = self.clauses[cid].find_replacement(&self.assignments) {
            self.clauses[cid].watch[1] = j;
            let new_lit = self.clauses[cid].lits[j];
            self.watch_lists[new_lit as usize].push(cid);
            return (false, false);
        }
        match value_of(&self.assignments, w0) {
            Some(false) => (true, true),
            None => {
                if !self.assign(w0) {
                    return (true, true);
                }
                queue.push(w0);
                (true, false)
            }
            Some(true) => (true, false),
        }
    }

    fn pick_unassigned(&self) -> Option<u32> {
        (1..=self.num_vars).find(|&v| self.assignments[v as usize].is_none())
    }

    fn timed_out(&self) -> bool {
        matches!(self.deadline, Some(d) if Instant::now() >= d)
    }

    /// Solves under `assumptions` with a cap of `conflict_budget`
    /// conflicts (0 = unlimited), per `spec.md` §4.4. The model (if
    /// any) from a previous call is discarded first; a fresh model
    /// produced by this call remains readable via `var_value` until
    /// the next `solve_with_assumptions`.
    pub fn solve_with_assumptions(&mut self, assumptions: &[Lit], conflict_budget: i64) -> SatResult {
        if self.force_unsat {
            return SatResult::False;
        }
        self.undo_to(0);
        let mut conflicts: i64 = 0;
        let mut decisions: Vec<Decision> = Vec::new();

        for &a in assumptions {
            self.trail_lim.push(self.trail.len());
            decisions.push(Decision::Assumption);
            if !self.assign(a) || !self.propagate(a) {
                trace!("assumption conflict, reporting unsat");
                self.undo_to(0);
                return SatResult::False;
            }
        }

        loop {
            if self.timed_out() {
                self.undo_to(0);
                return SatResult::Undef;
            }
            let Some(var) = self.pick_unassigned() else {
                return SatResult::True;
            };
            self.trail_lim.push(self.trail.len());
            decisions.push(Decision::Branch { var, tried_both: false });
            let l = lit::make(var, false);
            if self.assign(l) && self.propagate(l) {
                continue;
            }
            conflicts += 1;
            if conflict_budget > 0 && conflicts >= conflict_budget {
                self.undo_to(0);
                return SatResult::Undef;
            }
            match self.backtrack(&mut decisions, &mut conflicts, conflict_budget) {
                BacktrackOutcome::Resumed => continue,
                BacktrackOutcome::Unsat => {
                    self.undo_to(0);
                    return SatResult::False;
                }
                BacktrackOutcome::Budget => {
                    self.undo_to(0);
                    return SatResult::Undef;
                }
            }
        }
    }

    /// Chronological backtracking: tries the other polarity of the
    /// nearest undecided branch point, popping exhausted ones. Every
    /// conflict encountered along the way — not just the one that
    /// triggered this call — counts against `budget`, so a budget of 1
    /// can stop mid-backtrack rather than only between top-level
    /// decisions.
    fn backtrack(&mut self, decisions: &mut Vec<Decision>, conflicts: &mut i64, budget: i64) -> BacktrackOutcome {
        while let Some(mut dec) = decisions.pop() {
            let level = decisions.len();
            match dec {
                Decision::Assumption => {
                    self.undo_to(level);
                }
                Decision::Branch { var, ref mut tried_both } => {
                    if *tried_both {
                        self.undo_to(level);
                        continue;
                    }
                    self.undo_to(level);
                    *tried_both = true;
                    self.trail_lim.push(self.trail.len());
                    let l = lit::make(var, true);
                    let ok = self.assign(l) && self.propagate(l);
                    decisions.push(dec);
                    if ok {
                        return BacktrackOutcome::Resumed;
                    }
                    *conflicts += 1;
                    if budget > 0 && *conflicts >= budget {
                        return BacktrackOutcome::Budget;
                    }
                }
            }
        }
        BacktrackOutcome::Unsat
    }
}

enum BacktrackOutcome {
    Resumed,
    Unsat,
    Budget,
}
