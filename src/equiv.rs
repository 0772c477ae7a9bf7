//! EquivEngine (`spec.md` §4.4): two-polarity SAT equivalence checking
//! between AIG literals under the active condition stack, with
//! counterexample extraction and the statistics the sweeper reports.

use crate::aig::Aig;
use crate::cnf::CnfBuilder;
use crate::cond::ConditionStack;
use crate::lit::{self, Lit};
use crate::sat::{SatResult, SatSolver};
use log::debug;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquivStatus {
    Equivalent,
    NotEquivalent,
    Undecided,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EquivStats {
    pub sat_calls: u64,
    pub sat_calls_sat: u64,
    pub sat_calls_unsat: u64,
    pub sat_fails: u64,
    pub sat_proofs: u64,
    /// Wall-clock time across every SAT call, regardless of outcome.
    pub total_time: Duration,
    pub time_sat: Duration,
    pub time_unsat: Duration,
    pub time_undecided: Duration,
}

pub struct EquivEngine {
    stats: EquivStats,
    counterexample: Option<Vec<bool>>,
}

impl Default for EquivEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EquivEngine {
    pub fn new() -> Self {
        EquivEngine {
            stats: EquivStats::default(),
            counterexample: None,
        }
    }

    pub fn stats(&self) -> &EquivStats {
        &self.stats
    }

    pub fn get_cex(&self) -> Option<&[bool]> {
        self.counterexample.as_deref()
    }

    fn timed_solve(&mut self, sat: &mut SatSolver, assumptions: &[Lit], budget: i64) -> SatResult {
        let start = Instant::now();
        let r = sat.solve_with_assumptions(assumptions, budget);
        let elapsed = start.elapsed();
        self.stats.total_time += elapsed;
        self.stats.sat_calls += 1;
        match r {
            SatResult::True => {
                self.stats.sat_calls_sat += 1;
                self.stats.time_sat += elapsed;
            }
            SatResult::False => {
                self.stats.sat_calls_unsat += 1;
                self.stats.time_unsat += elapsed;
            }
            SatResult::Undef => {
                self.stats.sat_fails += 1;
                self.stats.time_undecided += elapsed;
            }
        }
        debug!("sat call #{} -> {r:?}", self.stats.sat_calls);
        r
    }

    /// Condition-stack entries are AIG literals (the probe registry's
    /// native unit); a SAT call needs each one encoded and translated.
    fn translate_cond(&self, aig: &Aig, sat: &mut SatSolver, cnf: &mut CnfBuilder, cond: &ConditionStack) -> Vec<Lit> {
        cond.lits()
            .iter()
            .map(|&l| {
                cnf.ensure_encoded(aig, sat, lit::index(l));
                cnf.lit_to_sat_lit(l)
            })
            .collect()
    }

    fn capture_cex(&mut self, aig: &Aig, sat: &SatSolver, cnf: &CnfBuilder) {
        let mut cex = Vec::with_capacity(aig.pi_count());
        for i in 0..aig.pi_count() {
            let pi = aig.pi_node_id(i);
            let v = cnf.sat_var_for(pi).map(|v| sat.var_value(v)).unwrap_or(false);
            cex.push(v);
        }
        self.counterexample = Some(cex);
    }

    /// Proves or refutes `lit1 == lit2` under the assumptions on
    /// `cond`, per `spec.md` §4.4: trivial literal-identity shortcuts
    /// first, then two polarity-flipped SAT calls. A proof asserts a
    /// permanent (condition-independent) binary-equivalence clause
    /// pair, the open design choice `spec.md` §9 calls for.
    pub fn check_equiv(
        &mut self,
        aig: &Aig,
        sat: &mut SatSolver,
        cnf: &mut CnfBuilder,
        cond: &ConditionStack,
        lit1: Lit,
        lit2: Lit,
        conflict_budget: i64,
    ) -> EquivStatus {
        if lit1 == lit2 {
            return EquivStatus::Equivalent;
        }
        if lit::regular(lit1) == lit::regular(lit2) {
            // complementary: opposite polarity of the same node
            self.counterexample = Some(vec![false; aig.pi_count()]);
            return EquivStatus::NotEquivalent;
        }

        // Order so lit_big > lit_new by raw literal value. Constant
        // literals (0, 1) are always the smaller of any pair, so after
        // this swap lit_new is constant exactly when one of the two
        // original operands was the constant literal itself.
        let (lit_big, lit_new) = if lit1 < lit2 { (lit2, lit1) } else { (lit1, lit2) };

        cnf.ensure_encoded(aig, sat, lit::index(lit_big));
        cnf.ensure_encoded(aig, sat, lit::index(lit_new));
        let s_big = cnf.lit_to_sat_lit(lit_big);
        let s_new = cnf.lit_to_sat_lit(lit_new);
        let base = self.translate_cond(aig, sat, cnf, cond);

        let mut assumptions = base.clone();
        assumptions.push(s_big);
        assumptions.push(lit::negate(s_new));
        match self.timed_solve(sat, &assumptions, conflict_budget) {
            SatResult::True => {
                self.capture_cex(aig, sat, cnf);
                return EquivStatus::NotEquivalent;
            }
            SatResult::Undef => return EquivStatus::Undecided,
            SatResult::False => {
                let ok = sat.add_clause(&[lit::negate(s_big), s_new]);
                assert!(ok, "add_clause rejected a learnt equivalence clause");
            }
        }

        // If lit_new is itself the constant literal, polarity 1's
        // unsat result already settles the question: lit_big can never
        // take lit_new's value, so it equals the constant.
        if lit::is_const(lit_new) {
            self.stats.sat_proofs += 1;
            return EquivStatus::Equivalent;
        }

        assumptions.truncate(base.len());
        assumptions.push(lit::negate(s_big));
        assumptions.push(s_new);
        match self.timed_solve(sat, &assumptions, conflict_budget) {
            SatResult::True => {
                self.capture_cex(aig, sat, cnf);
                EquivStatus::NotEquivalent
            }
            SatResult::Undef => EquivStatus::Undecided,
            SatResult::False => {
                self.stats.sat_proofs += 1;
                // Polarity 1 already learnt !lit_big | lit_new; this
                // polarity adds the other half of the biconditional.
                let ok = sat.add_clause(&[s_big, lit::negate(s_new)]);
                assert!(ok, "add_clause rejected a learnt equivalence clause");
                EquivStatus::Equivalent
            }
        }
    }

    /// Whether the active condition stack is itself unsatisfiable
    /// (`spec.md` §4.4 `check_cond_unsat`): every subsequent query run
    /// under it would be vacuously proved. `Undecided` on budget
    /// exhaustion, matching `check_equiv`'s trivalent contract.
    pub fn check_cond_unsat(
        &mut self,
        aig: &Aig,
        sat: &mut SatSolver,
        cnf: &mut CnfBuilder,
        cond: &ConditionStack,
        conflict_budget: i64,
    ) -> EquivStatus {
        let assumptions = self.translate_cond(aig, sat, cnf, cond);
        match self.timed_solve(sat, &assumptions, conflict_budget) {
            SatResult::True => EquivStatus::NotEquivalent,
            SatResult::False => EquivStatus::Equivalent,
            SatResult::Undef => EquivStatus::Undecided,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeRegistry;

    #[test]
    fn identical_literals_are_trivially_equivalent() {
        let mut aig = Aig::new();
        let a = aig.mk_primary_input("a");
        let mut sat = SatSolver::new();
        let mut cnf = CnfBuilder::new();
        cnf.encode_const0(&mut sat);
        let mut engine = EquivEngine::new();
        let cond = ConditionStack::new();
        let status = engine.check_equiv(&aig, &mut sat, &mut cnf, &cond, a, a, 0);
        assert_eq!(status, EquivStatus::Equivalent);
        assert_eq!(engine.stats().sat_calls, 0);
    }

    #[test]
    fn complementary_literals_are_trivially_not_equivalent() {
        let mut aig = Aig::new();
        let mut sat = SatSolver::new();
        let mut cnf = CnfBuilder::new();
        cnf.encode_const0(&mut sat);
        let a = aig.mk_primary_input("a");
        let mut engine = EquivEngine::new();
        let cond = ConditionStack::new();
        let status = engine.check_equiv(&aig, &mut sat, &mut cnf, &cond, a, lit::negate(a), 0);
        assert_eq!(status, EquivStatus::NotEquivalent);
    }

    #[test]
    fn structurally_hashed_nodes_are_equivalent_without_a_sat_call() {
        let mut aig = Aig::new();
        let a = aig.mk_primary_input("a");
        let b = aig.mk_primary_input("b");
        let ab = aig.mk_and(a, b);
        let ab_again = aig.mk_and(b, a);
        assert_eq!(ab, ab_again); // structural hashing already unified them

        let mut sat = SatSolver::new();
        let mut cnf = CnfBuilder::new();
        cnf.encode_const0(&mut sat);
        let mut engine = EquivEngine::new();
        let cond = ConditionStack::new();
        let status = engine.check_equiv(&aig, &mut sat, &mut cnf, &cond, ab, ab_again, 0);
        assert_eq!(status, EquivStatus::Equivalent);
        assert_eq!(engine.stats().sat_proofs, 0);
    }

    #[test]
    fn distinct_inputs_are_not_equivalent_with_counterexample() {
        let mut aig = Aig::new();
        let a = aig.mk_primary_input("a");
        let b = aig.mk_primary_input("b");
        let mut sat = SatSolver::new();
        let mut cnf = CnfBuilder::new();
        cnf.encode_const0(&mut sat);
        let mut engine = EquivEngine::new();
        let cond = ConditionStack::new();
        let status = engine.check_equiv(&aig, &mut sat, &mut cnf, &cond, a, b, 0);
        assert_eq!(status, EquivStatus::NotEquivalent);
        assert!(engine.get_cex().is_some());
    }

    #[test]
    fn mux_arms_are_equivalent_to_the_selected_input_under_a_condition() {
        let mut aig = Aig::new();
        let i = aig.mk_primary_input("i");
        let t = aig.mk_primary_input("t");
        let e = aig.mk_primary_input("e");
        let it = aig.mk_and(i, t);
        let ie = aig.mk_and(lit::negate(i), e);
        let f = aig.mk_and(lit::negate(it), lit::negate(ie));

        let mut sat = SatSolver::new();
        let mut cnf = CnfBuilder::new();
        cnf.encode_const0(&mut sat);

        let mut registry = ProbeRegistry::new();
        let i_probe = registry.probe_create(i);
        let mut cond = ConditionStack::new();
        cond.push(i_probe, &registry);

        let mut engine = EquivEngine::new();
        // Under i=true, f must equal t.
        let status = engine.check_equiv(&aig, &mut sat, &mut cnf, &cond, f, t, 0);
        assert_eq!(status, EquivStatus::Equivalent);
    }

    #[test]
    fn constant_operand_short_circuits_the_second_polarity() {
        let mut aig = Aig::new();
        let a = aig.mk_primary_input("a");
        let b = aig.mk_primary_input("b");
        let x = aig.mk_and(a, b);
        let y = aig.mk_and(lit::negate(a), lit::negate(b));
        // (a&b) and (!a&!b) can never both hold, but nothing in mk_and's
        // one-level rewrites can see that, so z == const0 needs a real
        // SAT call rather than a structural shortcut.
        let z = aig.mk_and(x, y);

        let mut sat = SatSolver::new();
        let mut cnf = CnfBuilder::new();
        cnf.encode_const0(&mut sat);
        let mut engine = EquivEngine::new();
        let cond = ConditionStack::new();
        let status = engine.check_equiv(&aig, &mut sat, &mut cnf, &cond, z, aig.const0_lit(), 0);
        assert_eq!(status, EquivStatus::Equivalent);
        assert_eq!(engine.stats().sat_calls, 1); // polarity 2 was skipped
        assert_eq!(engine.stats().sat_proofs, 1);

        // Polarity 1's unsat result must still be learnt as a permanent
        // clause even though polarity 2 never ran: a conflicting
        // assumption (z and const0 both true, both false is fine, but
        // asserting z true while const0 is forced false must now fail
        // at decision level 0 without any further search).
        assert_eq!(sat.solve_with_assumptions(&[cnf.lit_to_sat_lit(z)], 0), SatResult::False);
    }

    #[test]
    fn unsatisfiable_condition_stack_is_reported() {
        let mut aig = Aig::new();
        let a = aig.mk_primary_input("a");
        let mut sat = SatSolver::new();
        let mut cnf = CnfBuilder::new();
        cnf.encode_const0(&mut sat);
        cnf.ensure_encoded(&aig, &mut sat, lit::index(a));

        let mut registry = ProbeRegistry::new();
        let pos = registry.probe_create(a);
        let neg = registry.probe_create(lit::negate(a));
        let mut cond = ConditionStack::new();
        cond.push(pos, &registry);
        cond.push(neg, &registry);

        let mut engine = EquivEngine::new();
        let status = engine.check_cond_unsat(&aig, &mut sat, &mut cnf, &cond, 0);
        assert_eq!(status, EquivStatus::Equivalent); // "Equivalent" means proved unsat here
    }
}
