//! The AIG (And-Inverter Graph) container. `spec.md` treats this as an
//! external collaborator (§1, §6); this crate still has to ship one to
//! be runnable standalone, so it is implemented here in the same
//! structural-hashing style the teacher crate uses for its clause
//! database — a flat arena indexed by id, grown monotonically, never
//! shrunk except by an explicit `cleanup`.

use crate::lit::{self, Lit};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug)]
enum AigNode {
    Const0,
    Ci,
    And { f0: Lit, f1: Lit, phase: bool },
}

/// An and-inverter graph with structural hashing, primary I/O naming,
/// and the traversal-id / scratch-value bookkeeping the sweeper
/// components need (`spec.md` §6 collaborator contract).
pub struct Aig {
    nodes: Vec<AigNode>,
    hash: HashMap<(Lit, Lit), Lit>,
    fanout_count: Vec<u32>,
    trav_mark: Vec<u64>,
    trav_id_current: u64,
    value: Vec<Option<u32>>,
    pi_ids: Vec<u32>,
    po_lits: Vec<Lit>,
    names_in: Vec<String>,
    names_out: Vec<String>,
    being_swept: bool,
}

impl Default for Aig {
    fn default() -> Self {
        Self::new()
    }
}

impl Aig {
    pub fn new() -> Self {
        Aig {
            nodes: vec![AigNode::Const0],
            hash: HashMap::new(),
            fanout_count: vec![0],
            trav_mark: vec![0],
            trav_id_current: 0,
            value: vec![None],
            pi_ids: Vec::new(),
            po_lits: Vec::new(),
            names_in: Vec::new(),
            names_out: Vec::new(),
            being_swept: false,
        }
    }

    pub const fn const0_lit(&self) -> Lit {
        lit::ZERO
    }
    pub const fn const1_lit(&self) -> Lit {
        lit::ONE
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
    pub fn pi_count(&self) -> usize {
        self.pi_ids.len()
    }
    pub fn pi_node_id(&self, i: usize) -> u32 {
        self.pi_ids[i]
    }
    pub fn po_count(&self) -> usize {
        self.po_lits.len()
    }
    pub fn po_lit(&self, i: usize) -> Lit {
        self.po_lits[i]
    }
    pub fn names_in(&self) -> &[String] {
        &self.names_in
    }
    pub fn names_out(&self) -> &[String] {
        &self.names_out
    }

    pub fn is_being_swept(&self) -> bool {
        self.being_swept
    }
    pub fn set_being_swept(&mut self, flag: bool) {
        self.being_swept = flag;
    }

    fn push_node(&mut self, node: AigNode) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(node);
        self.fanout_count.push(0);
        self.trav_mark.push(0);
        self.value.push(None);
        id
    }

    pub fn mk_primary_input(&mut self, name: impl Into<String>) -> Lit {
        let id = self.push_node(AigNode::Ci);
        self.pi_ids.push(id);
        self.names_in.push(name.into());
        lit::make(id, false)
    }

    pub fn append_primary_output(&mut self, out_lit: Lit, name: impl Into<String>) -> usize {
        self.po_lits.push(out_lit);
        self.names_out.push(name.into());
        self.po_lits.len() - 1
    }

    #[inline]
    pub fn is_and(&self, id: u32) -> bool {
        matches!(self.nodes[id as usize], AigNode::And { .. })
    }
    #[inline]
    pub fn is_ci(&self, id: u32) -> bool {
        matches!(self.nodes[id as usize], AigNode::Ci)
    }
    #[inline]
    pub fn is_const(&self, id: u32) -> bool {
        id == 0
    }

    fn stored_phase(&self, id: u32) -> bool {
        match self.nodes[id as usize] {
            AigNode::And { phase, .. } => phase,
            _ => false,
        }
    }

    /// Phase bit of a node, as propagated during construction
    /// (`spec.md` §3); used as the polarity of its encoded SAT literal.
    pub fn phase(&self, id: u32) -> bool {
        self.stored_phase(id)
    }

    /// Value of a literal under the all-0 primary-input simulation
    /// used only to derive `phase` at construction time.
    fn sim_zero(&self, l: Lit) -> bool {
        self.stored_phase(lit::index(l)) ^ lit::is_complement(l)
    }

    pub fn fanin0_lit(&self, id: u32) -> Lit {
        match self.nodes[id as usize] {
            AigNode::And { f0, .. } => f0,
            _ => panic!("node {id} is not an AND gate"),
        }
    }
    pub fn fanin1_lit(&self, id: u32) -> Lit {
        match self.nodes[id as usize] {
            AigNode::And { f1, .. } => f1,
            _ => panic!("node {id} is not an AND gate"),
        }
    }
    pub fn fanin0_id(&self, id: u32) -> u32 {
        lit::index(self.fanin0_lit(id))
    }
    pub fn fanin1_id(&self, id: u32) -> u32 {
        lit::index(self.fanin1_lit(id))
    }

    fn bump_fanout(&mut self, l: Lit) {
        self.fanout_count[lit::index(l) as usize] += 1;
    }

    /// Fan-out count of a node counting only structural AND-to-AND
    /// edges (`spec.md` §4.3's "shared" annotation): a node referenced
    /// by more than one AND gate is a boundary for super-gate
    /// collection, never merged into two different super-gates.
    pub fn fanout(&self, id: u32) -> u32 {
        self.fanout_count[id as usize]
    }
    pub fn is_shared(&self, id: u32) -> bool {
        self.fanout(id) > 1
    }

    /// Structurally-hashed two-input AND with the one-level rewrites a
    /// real AIG builder always applies before consulting the hash
    /// table: `x & 0 = 0`, `x & 1 = x`, `x & x = x`, `x & !x = 0`.
    pub fn mk_and(&mut self, f0: Lit, f1: Lit) -> Lit {
        if f0 == lit::ZERO || f1 == lit::ZERO {
            return lit::ZERO;
        }
        if f0 == lit::ONE {
            return f1;
        }
        if f1 == lit::ONE {
            return f0;
        }
        if f0 == f1 {
            return f0;
        }
        if lit::regular(f0) == lit::regular(f1) {
            return lit::ZERO;
        }
        let (lo, hi) = if f0 < f1 { (f0, f1) } else { (f1, f0) };
        if let Some(&existing) = self.hash.get(&(lo, hi)) {
            self.bump_fanout(lo);
            self.bump_fanout(hi);
            return existing;
        }
        let phase = self.sim_zero(lo) && self.sim_zero(hi);
        let id = self.push_node(AigNode::And { f0: lo, f1: hi, phase });
        self.hash.insert((lo, hi), lit::make(id, false));
        self.bump_fanout(lo);
        self.bump_fanout(hi);
        lit::make(id, false)
    }

    pub fn value(&self, id: u32) -> Option<u32> {
        self.value[id as usize]
    }
    pub fn set_value(&mut self, id: u32, v: Option<u32>) {
        self.value[id as usize] = v;
    }

    pub fn increment_traversal_id(&mut self) {
        self.trav_id_current += 1;
    }
    pub fn mark_traversal_current(&mut self, id: u32) {
        self.trav_mark[id as usize] = self.trav_id_current;
    }
    pub fn is_traversal_current(&self, id: u32) -> bool {
        self.trav_mark[id as usize] == self.trav_id_current
    }

    /// Recognizes `f = ITE(i, t, e)` per `SPEC_FULL.md` §2: both edges
    /// into `f` must be complemented and each child must itself be an
    /// AND gate sharing a select variable of opposite polarity.
    pub fn is_mux_type(&self, id: u32) -> Option<(Lit, Lit, Lit)> {
        if !self.is_and(id) {
            return None;
        }
        let c0 = self.fanin0_lit(id);
        let c1 = self.fanin1_lit(id);
        if !(lit::is_complement(c0) && lit::is_complement(c1)) {
            return None;
        }
        let na = lit::index(lit::regular(c0));
        let nb = lit::index(lit::regular(c1));
        if !self.is_and(na) || !self.is_and(nb) {
            return None;
        }
        let (a0, a1) = (self.fanin0_lit(na), self.fanin1_lit(na));
        let (b0, b1) = (self.fanin0_lit(nb), self.fanin1_lit(nb));
        for &x in &[a0, a1] {
            for &y in &[b0, b1] {
                if lit::regular(x) == lit::regular(y) && lit::is_complement(x) != lit::is_complement(y) {
                    let t = if x == a0 { a1 } else { a0 };
                    let e = if y == b0 { b1 } else { b0 };
                    return Some((x, t, e));
                }
            }
        }
        None
    }

    /// Rebuilds a compacted AIG keeping only primary inputs/outputs
    /// and the AND gates reachable from the current primary outputs
    /// (`spec.md` §4.5 step 7).
    pub fn cleanup(&self) -> Aig {
        let mut reachable = vec![false; self.nodes.len()];
        let mut stack: Vec<u32> = self.po_lits.iter().map(|&l| lit::index(l)).collect();
        while let Some(id) = stack.pop() {
            if id == 0 || !self.is_and(id) || reachable[id as usize] {
                continue;
            }
            reachable[id as usize] = true;
            stack.push(self.fanin0_id(id));
            stack.push(self.fanin1_id(id));
        }

        let mut out = Aig::new();
        let mut remap: Vec<Option<Lit>> = vec![None; self.nodes.len()];
        remap[0] = Some(lit::ZERO);
        for (&id, name) in self.pi_ids.iter().zip(self.names_in.iter()) {
            remap[id as usize] = Some(out.mk_primary_input(name.clone()));
        }
        for id in 1..self.nodes.len() as u32 {
            if self.is_and(id) && reachable[id as usize] {
                let f0 = self.fanin0_lit(id);
                let f1 = self.fanin1_lit(id);
                let nf0 = lit::negate_if(
                    remap[lit::index(f0) as usize].expect("fanins precede their AND node"),
                    lit::is_complement(f0),
                );
                let nf1 = lit::negate_if(
                    remap[lit::index(f1) as usize].expect("fanins precede their AND node"),
                    lit::is_complement(f1),
                );
                remap[id as usize] = Some(out.mk_and(nf0, nf1));
            }
        }
        for (&l, name) in self.po_lits.iter().zip(self.names_out.iter()) {
            let base = remap[lit::index(l) as usize].expect("every PO is reachable from itself");
            out.append_primary_output(lit::negate_if(base, lit::is_complement(l)), name.clone());
        }
        out
    }

    /// Has any AND node with no path to a primary output.
    pub fn has_dangling(&self) -> bool {
        let cleaned = self.cleanup();
        cleaned.nodes.len() != self.nodes.len()
    }
}
