//! Whole-program reachability cleanup.
//!
//! One depth-first walk from the entry signature (and any extra roots)
//! over successor edges and call edges. Every block is processed once:
//!
//! - on the way **down**, successors that are mergeable lone `nop`s are
//!   spliced out and replaced by their own successors;
//! - on the way **up**, once every successor is done, the block absorbs
//!   its sole successor for as long as that successor has no other
//!   predecessor, and its own instructions are counted. Each call adds its
//!   dynamic targets to the live set and schedules their code.
//!
//! The walk uses an explicit stack, so neither deep nesting nor long call
//! chains grow the native stack, and a visited set keyed by block id makes
//! it terminate on loops and recursive calls.

use rustc_hash::FxHashSet;

use crate::block::{BlockId, Successors};
use crate::error::CfgError;
use crate::program::Program;

/// What one cleanup run did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub blocks_visited: usize,
    pub nops_spliced: usize,
    pub blocks_merged: usize,
    pub blocks_unlinked: usize,
    pub live_signatures: usize,
}

enum Step {
    /// First visit: splice, then schedule successors.
    Enter(BlockId),
    /// Every successor is done: merge and count.
    Exit(BlockId),
}

struct Cleanup<'p> {
    program: &'p mut Program,
    visited: FxHashSet<BlockId>,
    stack: Vec<Step>,
    stats: CleanupStats,
}

/// Clean up `program` from its entry and extra roots.
///
/// Resets and recomputes the live-signature set and the usage statistics.
/// Fails with [`CfgError::NoCode`] if the entry has not been lowered.
pub fn clean_up(program: &mut Program) -> Result<CleanupStats, CfgError> {
    let entry = program.entry();
    let entry_block = program.code(entry).ok_or(CfgError::NoCode(entry))?;

    program.live.clear();
    program.stats.clear();
    program.live.insert(entry);

    let mut pass = Cleanup {
        program,
        visited: FxHashSet::default(),
        stack: Vec::new(),
        stats: CleanupStats::default(),
    };

    // Roots go below the entry, so the entry is walked first.
    let roots = pass.program.roots().to_vec();
    for &root in roots.iter().rev() {
        pass.program.live.insert(root);
        match pass.program.code(root) {
            Some(block) => pass.stack.push(Step::Enter(block)),
            None => tracing::warn!(sig = root.raw(), "cleanup root has no code"),
        }
    }
    pass.stack.push(Step::Enter(entry_block));
    pass.run();

    pass.stats.live_signatures = pass.program.live.len();
    let stats = pass.stats;
    tracing::debug!(
        entry = entry.raw(),
        visited = stats.blocks_visited,
        spliced = stats.nops_spliced,
        merged = stats.blocks_merged,
        unlinked = stats.blocks_unlinked,
        live = stats.live_signatures,
        "cleanup complete"
    );
    Ok(stats)
}

impl Cleanup<'_> {
    fn run(&mut self) {
        while let Some(step) = self.stack.pop() {
            match step {
                Step::Enter(block) => self.enter(block),
                Step::Exit(block) => self.exit(block),
            }
        }
    }

    fn enter(&mut self, block: BlockId) {
        if !self.program.cfg.block(block).is_live() || !self.visited.insert(block) {
            return;
        }
        self.stats.blocks_visited += 1;
        self.splice_nops(block);

        self.stack.push(Step::Exit(block));
        let succs = self.program.cfg.block(block).successors();
        for &succ in succs.iter().rev() {
            if !self.visited.contains(&succ) {
                self.stack.push(Step::Enter(succ));
            }
        }
    }

    fn exit(&mut self, block: BlockId) {
        // A block absorbed by an ancestor was already counted there.
        if !self.program.cfg.block(block).is_live() {
            return;
        }
        let own = self.program.cfg.block(block).body().clone();
        let merged = self.merge_chain(block);

        if own.is_lone_nop() && merged > 0 {
            // The placeholder body was dropped by the merge.
            return;
        }
        for instr in own.iter() {
            self.program.stats.record(instr.opcode());
            let Some(call) = instr.as_call() else {
                continue;
            };
            for &target in &call.dynamic_targets {
                self.program.live.insert(target);
                match self.program.code(target) {
                    Some(entry) if !self.visited.contains(&entry) => {
                        self.stack.push(Step::Enter(entry));
                    }
                    Some(_) => {}
                    None => tracing::warn!(sig = target.raw(), "live call target has no code"),
                }
            }
        }
    }

    /// Whether `succ`, a successor of `block`, is a placeholder to bypass.
    fn is_spliceable(&self, block: BlockId, succ: BlockId) -> bool {
        succ != block
            && !self.program.is_entry_block(succ)
            && self.program.cfg.block(succ).is_spliceable_nop()
    }

    /// Replace every spliceable successor of `block` by its own successors,
    /// transitively. Each edge is expanded on its own, so duplicate edges
    /// to one nop are all spliced. A nop met again on the chain that
    /// reached it is kept as is: nop cycles stay intact instead of
    /// expanding forever.
    fn splice_nops(&mut self, block: BlockId) {
        let cfg = &self.program.cfg;
        let old = cfg.block(block).successors();
        if !old.iter().any(|&s| self.is_spliceable(block, s)) {
            return;
        }

        let mut new = Successors::new();
        let mut spliced: Vec<BlockId> = Vec::new();
        let mut seen = FxHashSet::default();
        // The chain of nops being expanded, and each pending edge's depth in it.
        let mut chain: Vec<BlockId> = Vec::new();
        let mut pending: Vec<(BlockId, usize)> = old.iter().rev().map(|&s| (s, 0)).collect();
        while let Some((succ, depth)) = pending.pop() {
            chain.truncate(depth);
            if self.is_spliceable(block, succ) && !chain.contains(&succ) {
                if seen.insert(succ) {
                    spliced.push(succ);
                }
                chain.push(succ);
                pending.extend(
                    cfg.block(succ)
                        .successors()
                        .iter()
                        .rev()
                        .map(|&next| (next, depth + 1)),
                );
            } else {
                new.push(succ);
            }
        }

        self.program.cfg.replace_successors(block, new);
        self.stats.nops_spliced += spliced.len();
        tracing::trace!(block = block.raw(), spliced = spliced.len(), "splice nops");

        let program = &mut *self.program;
        for nop in spliced {
            let b = program.cfg.block(nop);
            if b.is_live() && !b.has_predecessors() {
                let entry_blocks = &program.entry_blocks;
                self.stats.blocks_unlinked += program
                    .cfg
                    .unlink_guarded(nop, &|id| entry_blocks.contains(&id));
            }
        }
    }

    /// Absorb sole successors into `block` while they have no other
    /// predecessor. Returns the number of blocks absorbed.
    fn merge_chain(&mut self, block: BlockId) -> usize {
        let mut merged = 0;
        loop {
            let cfg = &self.program.cfg;
            let &[succ] = cfg.block(block).successors() else {
                break;
            };
            let target = cfg.block(succ);
            if succ == block
                || self.program.is_entry_block(succ)
                || !target.is_live()
                || target.num_predecessors() != 1
            {
                break;
            }
            self.program.cfg.merge_into(block, succ);
            merged += 1;
        }
        self.stats.blocks_merged += merged;
        merged
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
