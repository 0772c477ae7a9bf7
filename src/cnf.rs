//! CnfBuilder (`spec.md` §4.3): lazily translates the AIG cone behind
//! a node into SAT clauses, recognising MUX and multi-input AND
//! super-gate shapes so the CNF stays tighter than a naive per-2-input
//! translation.

use crate::aig::Aig;
use crate::lit::{self, Lit};
use crate::sat::SatSolver;
use log::{debug, trace};

/// The `obj2lit` shadow map of `spec.md` §3: `0` means "not yet
/// encoded" — safe as a sentinel because SAT variable 0 is reserved
/// and no real node is ever assigned it.
pub struct CnfBuilder {
    obj2lit: Vec<Lit>,
}

impl Default for CnfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CnfBuilder {
    pub fn new() -> Self {
        CnfBuilder { obj2lit: vec![0] }
    }

    fn obj_to_lit(&self, id: u32) -> Lit {
        self.obj2lit.get(id as usize).copied().unwrap_or(0)
    }

    fn set_obj_to_lit(&mut self, id: u32, l: Lit) {
        let idx = id as usize;
        if idx >= self.obj2lit.len() {
            self.obj2lit.resize(idx + 1, 0);
        }
        self.obj2lit[idx] = l;
    }

    pub fn is_encoded(&self, id: u32) -> bool {
        self.obj_to_lit(id) != 0
    }

    /// SAT variable backing an already-encoded node, if any.
    pub fn sat_var_for(&self, id: u32) -> Option<u32> {
        let l = self.obj_to_lit(id);
        if l == 0 {
            None
        } else {
            Some(lit::index(l))
        }
    }

    /// Translates an AIG literal to its SAT literal, composing the
    /// looked-up node literal with the AIG edge's own complement bit.
    pub fn lit_to_sat_lit(&self, aig_lit: Lit) -> Lit {
        let base = self.obj_to_lit(lit::index(aig_lit));
        debug_assert_ne!(base, 0, "literal {aig_lit} referenced before encoding");
        lit::negate_if(base, lit::is_complement(aig_lit))
    }

    /// Pre-encodes constant-0: a fresh SAT variable is allocated for
    /// AIG node 0 and the unit clause `!var` is asserted, as required
    /// by `spec.md` §3/§4.6.
    pub fn encode_const0(&mut self, sat: &mut SatSolver) {
        let var = sat.new_var();
        let l = lit::make(var, false);
        self.set_obj_to_lit(0, l);
        let ok = sat.add_clause(&[lit::negate(l)]);
        assert!(ok, "add_clause rejected the constant-0 unit clause");
    }

    fn add_to_frontier(&mut self, aig: &Aig, sat: &mut SatSolver, id: u32, frontier: &mut Vec<u32>) {
        if id == 0 || self.is_encoded(id) {
            return;
        }
        let var = sat.new_var();
        let l = lit::make(var, aig.phase(id));
        self.set_obj_to_lit(id, l);
        trace!("encoded aig node {id} as sat var {var}");
        if aig.is_and(id) {
            frontier.push(id);
        }
    }

    fn collect_super(&self, aig: &Aig, node_id: u32, out: &mut Vec<Lit>) {
        out.clear();
        self.collect_super_rec(aig, aig.fanin0_lit(node_id), out);
        self.collect_super_rec(aig, aig.fanin1_lit(node_id), out);
    }

    fn collect_super_rec(&self, aig: &Aig, l: Lit, out: &mut Vec<Lit>) {
        let id = lit::index(l);
        let is_boundary = lit::is_complement(l)
            || aig.is_const(id)
            || aig.is_ci(id)
            || aig.is_mux_type(id).is_some()
            || aig.is_shared(id);
        if is_boundary {
            if !out.contains(&l) {
                out.push(l);
            }
            return;
        }
        self.collect_super_rec(aig, aig.fanin0_lit(id), out);
        self.collect_super_rec(aig, aig.fanin1_lit(id), out);
    }

    fn add_super_clauses(&self, sat: &mut SatSolver, node_id: u32, fanins: &[Lit]) {
        let lit_f = self.obj_to_lit(node_id);
        let mut big = Vec::with_capacity(fanins.len() + 1);
        for &fan in fanins {
            let li = self.lit_to_sat_lit(fan);
            let ok = sat.add_clause(&[li, lit::negate(lit_f)]);
            assert!(ok, "add_clause rejected a super-gate implication clause");
            big.push(lit::negate(li));
        }
        big.push(lit_f);
        let ok = sat.add_clause(&big);
        assert!(ok, "add_clause rejected a super-gate definition clause");
    }

    fn add_mux_clauses(&self, sat: &mut SatSolver, node_id: u32, i_lit: Lit, t_lit: Lit, e_lit: Lit) {
        // Recognized per SPEC_FULL.md §2: both edges into `node_id` are
        // complemented, so the node's own regular value is `!ITE`.
        let f = lit::negate(self.obj_to_lit(node_id));
        let i = self.lit_to_sat_lit(i_lit);
        let t = self.lit_to_sat_lit(t_lit);
        let e = self.lit_to_sat_lit(e_lit);

        for c in [
            [lit::negate(i), lit::negate(t), f],
            [lit::negate(i), t, lit::negate(f)],
            [i, lit::negate(e), f],
            [i, e, lit::negate(f)],
        ] {
            assert!(sat.add_clause(&c), "add_clause rejected a mux clause");
        }
        if t == e {
            return;
        }
        assert!(
            sat.add_clause(&[t, e, lit::negate(f)]),
            "add_clause rejected a redundant mux clause"
        );
        assert!(
            sat.add_clause(&[lit::negate(t), lit::negate(e), f]),
            "add_clause rejected a redundant mux clause"
        );
    }

    /// Visits the transitive AND cone of `node_id` not yet encoded and
    /// asserts its defining clauses, per `spec.md` §4.3. A no-op if
    /// `node_id` is constant or already encoded.
    pub fn ensure_encoded(&mut self, aig: &Aig, sat: &mut SatSolver, node_id: u32) {
        if node_id == 0 || self.is_encoded(node_id) {
            return;
        }
        let mut frontier = Vec::new();
        self.add_to_frontier(aig, sat, node_id, &mut frontier);

        let mut i = 0;
        while i < frontier.len() {
            let id = frontier[i];
            i += 1;
            if let Some((i_lit, t_lit, e_lit)) = aig.is_mux_type(id) {
                for l in [i_lit, t_lit, e_lit] {
                    self.add_to_frontier(aig, sat, lit::index(l), &mut frontier);
                }
                self.add_mux_clauses(sat, id, i_lit, t_lit, e_lit);
            } else {
                let mut fanins = Vec::new();
                self.collect_super(aig, id, &mut fanins);
                for &l in &fanins {
                    self.add_to_frontier(aig, sat, lit::index(l), &mut frontier);
                }
                self.add_super_clauses(sat, id, &fanins);
            }
        }
        debug!("cnf builder processed frontier of {} node(s)", frontier.len());
    }
}
