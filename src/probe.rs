//! ProbeRegistry (`spec.md` §4.1): reference-counted, stable integer
//! handles for AIG literals. An append-only arena addressed by index —
//! dead probes become tombstones, and probe-ID recycling is explicitly
//! deferred (`spec.md` §9).

use crate::lit::Lit;

struct Probe {
    lit: Lit,
    refcount: u32,
}

pub struct ProbeRegistry {
    probes: Vec<Probe>,
    /// literal -> probe id, `None` where no live probe maps to it.
    reverse_map: Vec<Option<u32>>,
}

impl Default for ProbeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeRegistry {
    pub fn new() -> Self {
        ProbeRegistry {
            probes: Vec::new(),
            reverse_map: Vec::new(),
        }
    }

    fn reverse_get(&self, lit: Lit) -> Option<u32> {
        self.reverse_map.get(lit as usize).copied().flatten()
    }

    fn reverse_set(&mut self, lit: Lit, id: Option<u32>) {
        let idx = lit as usize;
        if idx >= self.reverse_map.len() {
            self.reverse_map.resize(idx + 1, None);
        }
        self.reverse_map[idx] = id;
    }

    /// Always allocates a fresh probe id for `lit`, even if one already
    /// exists (`spec.md` §4.1 `probe_create`).
    pub fn probe_create(&mut self, lit: Lit) -> u32 {
        let id = self.probes.len() as u32;
        self.probes.push(Probe { lit, refcount: 1 });
        self.reverse_set(lit, Some(id));
        id
    }

    /// Finds the existing probe for `lit`, bumping its refcount, or
    /// creates one (`spec.md` §4.1 `probe_find`).
    pub fn probe_find(&mut self, lit: Lit) -> u32 {
        if let Some(id) = self.reverse_get(lit) {
            self.probes[id as usize].refcount += 1;
            return id;
        }
        self.probe_create(lit)
    }

    /// Decrements the probe's refcount; tombstones it on reaching zero.
    ///
    /// # Panics
    /// If `id` is not a live probe (refcount already 0) — an
    /// invariant violation per `spec.md` §7.
    pub fn probe_deref(&mut self, id: u32) {
        let probe = &mut self.probes[id as usize];
        assert!(probe.refcount > 0, "probe_deref on a dead probe {id}");
        probe.refcount -= 1;
        if probe.refcount == 0 {
            let l = probe.lit;
            self.reverse_set(l, None);
            self.probes[id as usize].lit = 0;
        }
    }

    pub fn probe_lit(&self, id: u32) -> Lit {
        self.probes[id as usize].lit
    }

    pub fn is_alive(&self, id: u32) -> bool {
        self.probes[id as usize].refcount > 0
    }

    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }
}
