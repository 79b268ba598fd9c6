//! Per-opcode instruction counts gathered by cleanup.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::instr::Opcode;

/// How many instructions of each kind the emitted code contains.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsageStats {
    counts: FxHashMap<Opcode, usize>,
    total: usize,
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, opcode: Opcode) {
        *self.counts.entry(opcode).or_insert(0) += 1;
        self.total += 1;
    }

    /// Occurrences of `opcode`; zero if never recorded.
    pub fn count(&self, opcode: Opcode) -> usize {
        self.counts.get(&opcode).copied().unwrap_or(0)
    }

    /// Occurrences of all opcodes.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct opcodes used.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// `(opcode, count)` pairs in opcode order.
    pub fn iter(&self) -> impl Iterator<Item = (Opcode, usize)> {
        let mut pairs: Vec<_> = self.counts.iter().map(|(&op, &n)| (op, n)).collect();
        pairs.sort_unstable_by_key(|&(op, _)| op);
        pairs.into_iter()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.total = 0;
    }
}

impl fmt::Display for UsageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (op, n) in self.iter() {
            writeln!(f, "{:<16}{n}", op.mnemonic())?;
        }
        write!(f, "{:<16}{}", "total", self.total)
    }
}
