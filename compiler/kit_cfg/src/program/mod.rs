//! The whole-program root of the IR.
//!
//! A [`Program`] owns the block arena of a compilation session, the code
//! entry block of every lowered signature, and what cleanup found: the set
//! of live signatures and the usage statistics of the emitted code.

use kit_types::SigId;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::block::{BlockId, Cfg};
use crate::cleanup::{self, CleanupStats};
use crate::error::CfgError;
use crate::stats::UsageStats;

#[derive(Debug)]
pub struct Program {
    pub(crate) cfg: Cfg,
    entry: SigId,
    /// Extra signatures emitted even if the entry never calls them.
    roots: Vec<SigId>,
    code: FxHashMap<SigId, BlockId>,
    pub(crate) entry_blocks: FxHashSet<BlockId>,
    pub(crate) live: FxHashSet<SigId>,
    pub(crate) stats: UsageStats,
}

impl Program {
    /// A program with an empty arena whose execution starts at `entry`.
    pub fn new(entry: SigId) -> Self {
        Self {
            cfg: Cfg::new(),
            entry,
            roots: Vec::new(),
            code: FxHashMap::default(),
            entry_blocks: FxHashSet::default(),
            live: FxHashSet::default(),
            stats: UsageStats::new(),
        }
    }

    #[inline]
    pub fn entry(&self) -> SigId {
        self.entry
    }

    #[inline]
    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    /// The arena, for lowering.
    #[inline]
    pub fn cfg_mut(&mut self) -> &mut Cfg {
        &mut self.cfg
    }

    /// Emit `sig` even if nothing reachable from the entry calls it.
    pub fn add_root(&mut self, sig: SigId) {
        if sig != self.entry && !self.roots.contains(&sig) {
            self.roots.push(sig);
        }
    }

    pub fn roots(&self) -> &[SigId] {
        &self.roots
    }

    // ── Code ────────────────────────────────────────────────────────

    /// Record `block` as the code of `sig`. Each signature gets its code
    /// exactly once.
    pub fn set_code(&mut self, sig: SigId, block: BlockId) -> Result<(), CfgError> {
        if self.code.contains_key(&sig) {
            return Err(CfgError::CodeAlreadySet(sig));
        }
        self.cfg.check_live(block)?;
        self.code.insert(sig, block);
        self.entry_blocks.insert(block);
        tracing::trace!(sig = sig.raw(), block = block.raw(), "set code");
        Ok(())
    }

    /// The entry block of `sig`'s code, if it has been lowered.
    #[inline]
    pub fn code(&self, sig: SigId) -> Option<BlockId> {
        self.code.get(&sig).copied()
    }

    /// Number of signatures with code.
    pub fn num_bodies(&self) -> usize {
        self.code.len()
    }

    /// Whether `block` is the entry block of some signature's code.
    #[inline]
    pub fn is_entry_block(&self, block: BlockId) -> bool {
        self.entry_blocks.contains(&block)
    }

    /// Successors of `block` plus the entry blocks of every signature its
    /// calls may reach.
    pub fn forward(&self, block: BlockId) -> Vec<BlockId> {
        let b = self.cfg.block(block);
        let mut out: Vec<BlockId> = b.successors().to_vec();
        for call in b.body().iter().filter_map(|i| i.as_call()) {
            out.extend(call.dynamic_targets.iter().filter_map(|&sig| self.code(sig)));
        }
        out
    }

    // ── Cleanup results ─────────────────────────────────────────────

    /// Run reachability cleanup from the entry and the extra roots.
    pub fn clean_up(&mut self) -> Result<CleanupStats, CfgError> {
        cleanup::clean_up(self)
    }

    pub fn is_live(&self, sig: SigId) -> bool {
        self.live.contains(&sig)
    }

    pub fn live_signatures(&self) -> &FxHashSet<SigId> {
        &self.live
    }

    /// Live signatures in the order the encoder consumes them.
    pub fn emission_order(&self) -> Vec<SigId> {
        let mut order: Vec<SigId> = self.live.iter().copied().collect();
        order.sort_unstable();
        order
    }

    pub fn stats(&self) -> &UsageStats {
        &self.stats
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
