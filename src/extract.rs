//! Extractor (`spec.md` §4.5): rebuilds the logic cone behind a set of
//! probes into a standalone AIG, post-order over the traversal-id
//! marks the container already carries, using the scratch `value`
//! field to remember each visited node's literal in the new graph.

use crate::aig::Aig;
use crate::lit::{self, Lit};
use std::collections::HashMap;

pub struct Extractor;

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Extractor
    }

    /// Iterative post-order DFS from `start`, skipping anything already
    /// marked current this traversal — recursive would mirror the
    /// AND-cone depth directly onto the call stack.
    fn visit(&self, aig: &mut Aig, start: u32, order: &mut Vec<u32>) {
        if start == 0 || aig.is_traversal_current(start) {
            return;
        }
        let mut stack: Vec<(u32, bool)> = vec![(start, false)];
        while let Some((id, expanded)) = stack.pop() {
            if aig.is_traversal_current(id) {
                continue;
            }
            if aig.is_and(id) && !expanded {
                stack.push((id, true));
                let f0 = lit::index(aig.fanin0_lit(id));
                let f1 = lit::index(aig.fanin1_lit(id));
                if f0 != 0 && !aig.is_traversal_current(f0) {
                    stack.push((f0, false));
                }
                if f1 != 0 && !aig.is_traversal_current(f1) {
                    stack.push((f1, false));
                }
            } else {
                aig.mark_traversal_current(id);
                order.push(id);
            }
        }
    }

    /// Rebuilds a fresh AIG containing exactly the logic reachable from
    /// `probes`, naming its outputs from `output_names` in the same
    /// order, per `spec.md` §4.5. Panics if the two slices differ in
    /// length — a caller contract violation, not a runtime condition.
    pub fn extract(&self, aig: &mut Aig, probes: &[Lit], output_names: &[String]) -> Aig {
        assert_eq!(probes.len(), output_names.len(), "one output name is required per probe");

        aig.increment_traversal_id();
        let mut order = Vec::new();
        for &p in probes {
            self.visit(aig, lit::index(p), &mut order);
        }

        let pi_name: HashMap<u32, &str> = (0..aig.pi_count())
            .map(|i| (aig.pi_node_id(i), aig.names_in()[i].as_str()))
            .collect();

        let mut out = Aig::new();
        for &id in &order {
            let new_lit = if aig.is_ci(id) {
                let name = pi_name.get(&id).copied().unwrap_or("");
                out.mk_primary_input(name)
            } else {
                let f0 = aig.fanin0_lit(id);
                let f1 = aig.fanin1_lit(id);
                let nf0 = lit::negate_if(
                    aig.value(lit::index(f0)).expect("fanin visited before its parent"),
                    lit::is_complement(f0),
                );
                let nf1 = lit::negate_if(
                    aig.value(lit::index(f1)).expect("fanin visited before its parent"),
                    lit::is_complement(f1),
                );
                out.mk_and(nf0, nf1)
            };
            aig.set_value(id, Some(new_lit));
        }

        for (&p, name) in probes.iter().zip(output_names) {
            let base = aig.value(lit::index(p)).expect("probe's own node was visited");
            let out_lit = lit::negate_if(base, lit::is_complement(p));
            out.append_primary_output(out_lit, name.clone());
        }

        for &id in &order {
            aig.set_value(id, None);
        }

        if out.has_dangling() {
            out.cleanup()
        } else {
            out
        }
    }
}
