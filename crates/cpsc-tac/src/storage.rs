//! Storage assignment (spec.md §4.4): globals get byte offsets in
//! declaration order, frame slots (locals, parameters) get ordinal
//! `fp`-relative indices, reset at each function boundary.

use std::collections::HashMap;

use cpsc_util::SymbolId;

use crate::operand::Operand;

/// Global slot offsets, assigned once and never reset — globals outlive
/// every function frame (spec.md §4.4: "Globals: `G[k]`... assigned in
/// declaration order").
#[derive(Default)]
pub struct Globals {
    offsets: HashMap<SymbolId, u32>,
    next: u32,
}

impl Globals {
    pub fn get_or_assign(&mut self, sym: SymbolId) -> Operand {
        if let Some(&k) = self.offsets.get(&sym) {
            return Operand::Global(k);
        }
        let k = self.next;
        self.next += 4;
        self.offsets.insert(sym, k);
        Operand::Global(k)
    }
}

/// One function's frame: parameters pre-registered at entry (`fp[-1]` is
/// `this` for methods, `fp[-i]` otherwise in declaration order), locals
/// assigned `fp[k]` as their declarations are visited. Reset per function
/// (spec.md §9: "not truly global... per-function monotonic counters").
#[derive(Default)]
pub struct Frame {
    slots: HashMap<SymbolId, i32>,
    next_local: i32,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_param(&mut self, sym: SymbolId, index: i32) {
        self.slots.insert(sym, index);
    }

    pub fn get(&self, sym: SymbolId) -> Option<Operand> {
        self.slots.get(&sym).map(|&k| Operand::Frame(k))
    }

    pub fn declare_local(&mut self, sym: SymbolId) -> Operand {
        if let Some(&k) = self.slots.get(&sym) {
            return Operand::Frame(k);
        }
        let k = self.next_local;
        self.next_local += 1;
        self.slots.insert(sym, k);
        Operand::Frame(k)
    }

    /// A compiler-internal local with no source symbol — used for the
    /// hidden index variable a `foreach` materializes (spec.md §4.4).
    pub fn fresh_internal_local(&mut self) -> Operand {
        let k = self.next_local;
        self.next_local += 1;
        Operand::Frame(k)
    }
}
