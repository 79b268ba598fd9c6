//! CFG blocks and the arena that owns them.
//!
//! A [`Block`] is a maximal straight-line body ([`InstrList`]) with no
//! internal jump targets, plus its outgoing edges. All blocks of a
//! compilation session live in one [`Cfg`] arena and are addressed by
//! [`BlockId`]; ids are handed out by the arena in allocation order, so they
//! form one monotonically increasing sequence per session.
//!
//! # Edges
//!
//! Successor lists are ordered and may contain duplicates and self-loops.
//! Each block also records one predecessor entry per incoming edge. Both
//! directions are only ever changed together, inside `Cfg`, so for every
//! block `b`:
//!
//! ```text
//! predecessors(b) == { p : b ∈ successors(p) }
//! ```
//!
//! # Lifecycle
//!
//! Blocks start [`Live`](BlockState::Live). Cleanup may absorb a block into
//! its sole predecessor ([`Merged`](BlockState::Merged)), and dead code is
//! [`Unlinked`](BlockState::Unlinked). Neither transition is ever undone,
//! and linking to or prefixing a block that is no longer live is an error.

use std::fmt;
use std::mem;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::error::CfgError;
use crate::instr::{Condition, FinalOp, Instruction};
use crate::instr_list::InstrList;

/// Block ID within a [`Cfg`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    /// Create a new block ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block_{}", self.0)
    }
}

/// Ordered successor list.
pub type Successors = SmallVec<[BlockId; 2]>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockState {
    Live,
    /// Absorbed into the end of `into` by cleanup. Merges run innermost
    /// first, so `into` may itself have been merged later; use
    /// [`Cfg::merged_into`] for the live block holding the code.
    Merged { into: BlockId },
    /// Removed as unreachable.
    Unlinked,
}

/// A CFG node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    id: BlockId,
    body: InstrList,
    successors: Successors,
    /// One entry per incoming edge.
    preds: SmallVec<[BlockId; 2]>,
    mergeable: bool,
    state: BlockState,
}

impl Block {
    #[inline]
    pub fn id(&self) -> BlockId {
        self.id
    }

    #[inline]
    pub fn body(&self) -> &InstrList {
        &self.body
    }

    #[inline]
    pub fn successors(&self) -> &[BlockId] {
        &self.successors
    }

    /// Distinct predecessors, sorted by id.
    pub fn predecessors(&self) -> SmallVec<[BlockId; 2]> {
        let mut preds = self.preds.clone();
        preds.sort_unstable();
        preds.dedup();
        preds
    }

    /// Number of distinct predecessors.
    pub fn num_predecessors(&self) -> usize {
        self.predecessors().len()
    }

    #[inline]
    pub fn has_predecessors(&self) -> bool {
        !self.preds.is_empty()
    }

    /// One entry per incoming edge, in no particular order.
    pub(crate) fn pred_edges(&self) -> &[BlockId] {
        &self.preds
    }

    #[inline]
    pub fn is_mergeable(&self) -> bool {
        self.mergeable
    }

    #[inline]
    pub fn state(&self) -> BlockState {
        self.state
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.state == BlockState::Live
    }

    /// A live, mergeable block whose whole body is one `nop`: a placeholder
    /// that cleanup bypasses.
    pub fn is_spliceable_nop(&self) -> bool {
        self.is_live() && self.mergeable && self.body.is_lone_nop()
    }
}

/// Arena of every block in a compilation session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cfg {
    blocks: Vec<Block>,
}

impl Cfg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks ever allocated, in any state.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The id the next allocated block will get.
    pub fn next_id(&self) -> BlockId {
        BlockId::new(
            u32::try_from(self.blocks.len())
                .unwrap_or_else(|_| panic!("block count exceeds u32::MAX")),
        )
    }

    /// Look up a block.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this arena.
    #[inline]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.iter()
    }

    // ── Construction ────────────────────────────────────────────────

    /// A block with the given body and successors. Mergeable.
    pub fn construct(&mut self, body: InstrList, successors: &[BlockId]) -> Result<BlockId, CfgError> {
        for &succ in successors {
            self.check_live(succ)?;
        }
        let id = self.alloc(body, true);
        for &succ in successors {
            self.add_edge(id, succ);
        }
        Ok(id)
    }

    /// A terminal block holding one final instruction.
    pub fn construct_final(&mut self, op: FinalOp) -> BlockId {
        self.alloc(InstrList::single(op), true)
    }

    /// A `nop` placeholder whose two successors are `yes` prefixed by `cond`
    /// and `no` prefixed by its negation.
    ///
    /// When both arms are the same block it is first marked non-mergeable,
    /// so each arm gets its own test instead of both tests landing on the
    /// shared body.
    pub fn construct_branch(
        &mut self,
        cond: Condition,
        yes: BlockId,
        no: BlockId,
    ) -> Result<BlockId, CfgError> {
        self.check_live(yes)?;
        self.check_live(no)?;
        if yes == no {
            self.do_not_merge(yes)?;
        }
        let no = self.prefixed_by(no, cond.negate())?;
        let yes = self.prefixed_by(yes, cond)?;
        let id = self.alloc(InstrList::nop(), true);
        self.add_edge(id, yes);
        self.add_edge(id, no);
        Ok(id)
    }

    /// An unwired, non-mergeable `nop` block: the stable head of a loop.
    pub fn construct_pivot(&mut self) -> BlockId {
        self.alloc(InstrList::nop(), false)
    }

    // ── Mutation ────────────────────────────────────────────────────

    /// Add an edge `from → to`.
    pub fn link_to(&mut self, from: BlockId, to: BlockId) -> Result<(), CfgError> {
        self.check_live(from)?;
        self.check_live(to)?;
        self.add_edge(from, to);
        tracing::trace!(from = from.raw(), to = to.raw(), "link");
        Ok(())
    }

    /// Put `instr` in front of `block`.
    ///
    /// A mergeable block that nobody links to yet is extended in place and
    /// returned. Otherwise the original is left untouched and a fresh block
    /// holding only `instr`, with `block` as its sole successor, is
    /// returned: existing predecessors keep seeing the shorter body.
    pub fn prefixed_by(
        &mut self,
        block: BlockId,
        instr: impl Into<Instruction>,
    ) -> Result<BlockId, CfgError> {
        self.check_live(block)?;
        let target = &mut self.blocks[block.index()];
        if target.mergeable && target.preds.is_empty() {
            target.body = target.body.prepend(instr);
            return Ok(block);
        }
        let id = self.alloc(InstrList::single(instr), true);
        self.add_edge(id, block);
        tracing::trace!(block = block.raw(), new = id.raw(), "prefix in new block");
        Ok(id)
    }

    /// A fresh block holding `instr` whose sole successor is `block`.
    ///
    /// Unlike [`prefixed_by`](Self::prefixed_by) this never extends `block`,
    /// so the same continuation can be followed from several places.
    pub fn followed_by(
        &mut self,
        instr: impl Into<Instruction>,
        block: BlockId,
    ) -> Result<BlockId, CfgError> {
        self.check_live(block)?;
        let id = self.alloc(InstrList::single(instr), true);
        self.add_edge(id, block);
        Ok(id)
    }

    /// Forbid in-place prefixing of `block` from now on.
    pub fn do_not_merge(&mut self, block: BlockId) -> Result<(), CfgError> {
        self.check_live(block)?;
        self.blocks[block.index()].mergeable = false;
        Ok(())
    }

    /// Drop the first instruction of `block`. A single-instruction body
    /// becomes a lone `nop`.
    pub fn remove_first_instruction(&mut self, block: BlockId) -> Result<(), CfgError> {
        self.check_live(block)?;
        let target = &mut self.blocks[block.index()];
        target.body = target.body.tail().unwrap_or_else(InstrList::nop);
        Ok(())
    }

    /// Remove `block` as unreachable.
    ///
    /// Detaches it from every predecessor, clears its successors, and
    /// recursively unlinks every successor left without predecessors.
    /// Unlinking a block that is not live does nothing. Returns the number
    /// of blocks unlinked.
    pub fn unlink(&mut self, block: BlockId) -> Result<usize, CfgError> {
        if self.get(block).is_none() {
            return Err(CfgError::UnknownBlock(block));
        }
        Ok(self.unlink_guarded(block, &|_| false))
    }

    /// [`unlink`](Self::unlink), but the recursion never unlinks a block for
    /// which `keep` holds (signature entries, blocks known to be reachable).
    pub(crate) fn unlink_guarded(&mut self, root: BlockId, keep: &dyn Fn(BlockId) -> bool) -> usize {
        let mut count = 0;
        let mut work = vec![root];
        while let Some(id) = work.pop() {
            if !self.blocks[id.index()].is_live() {
                continue;
            }

            for pred in mem::take(&mut self.blocks[id.index()].preds) {
                remove_one(&mut self.blocks[pred.index()].successors, id);
            }

            // Edges are cleared before recursing, so a cycle cannot lead
            // back into this block.
            let succs = mem::take(&mut self.blocks[id.index()].successors);
            self.blocks[id.index()].state = BlockState::Unlinked;
            count += 1;
            tracing::trace!(block = id.raw(), "unlink");

            for succ in succs {
                let target = &mut self.blocks[succ.index()];
                remove_one(&mut target.preds, id);
                if target.preds.is_empty() && target.is_live() && !keep(succ) {
                    work.push(succ);
                }
            }
        }
        count
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// The live block whose body now holds `id`'s code: `id` itself while
    /// it is live, the end of its merge chain once merged, and `None` once
    /// unlinked.
    pub fn merged_into(&self, id: BlockId) -> Option<BlockId> {
        let mut current = id;
        loop {
            match self.get(current)?.state {
                BlockState::Live => return Some(current),
                BlockState::Merged { into } => current = into,
                BlockState::Unlinked => return None,
            }
        }
    }

    /// Blocks reachable from `entry` through successor edges, in depth-first
    /// preorder.
    pub fn reachable_from(&self, entry: BlockId) -> Vec<BlockId> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut stack = vec![entry];
        while let Some(id) = stack.pop() {
            let Some(block) = self.get(id) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            for &succ in block.successors.iter().rev() {
                if !seen.contains(&succ) {
                    stack.push(succ);
                }
            }
        }
        order
    }

    /// Unlink every live block allocated at or after `since` that is not
    /// reachable from `entry`. Returns the number of blocks unlinked.
    ///
    /// Lowering calls this once a body is complete: code after a `return`
    /// and the continuations nobody jumped to are discarded, so they do not
    /// inflate the predecessor counts of the blocks they point at.
    pub fn sweep_unreachable(&mut self, entry: BlockId, since: BlockId) -> usize {
        let reachable: FxHashSet<BlockId> = self.reachable_from(entry).into_iter().collect();
        let dead: Vec<BlockId> = (since.index()..self.blocks.len())
            .map(|i| self.blocks[i].id)
            .filter(|id| self.blocks[id.index()].is_live() && !reachable.contains(id))
            .collect();
        let mut count = 0;
        for id in dead {
            count += self.unlink_guarded(id, &|b| reachable.contains(&b));
        }
        if count > 0 {
            tracing::debug!(entry = entry.raw(), unlinked = count, "swept unreachable blocks");
        }
        count
    }

    // ── Cleanup support ─────────────────────────────────────────────

    /// Replace the successor list of `block`, keeping predecessor entries
    /// of old and new targets in step.
    pub(crate) fn replace_successors(&mut self, block: BlockId, new: Successors) {
        for old in mem::take(&mut self.blocks[block.index()].successors) {
            remove_one(&mut self.blocks[old.index()].preds, block);
        }
        for &succ in &new {
            self.blocks[succ.index()].preds.push(block);
        }
        self.blocks[block.index()].successors = new;
    }

    /// Append `succ`'s body to `block` and adopt its successors.
    ///
    /// `succ` must be the only successor of `block`, and `block` its only
    /// predecessor. A lone `nop` body on `block` is dropped rather than
    /// kept in front of the merged code.
    pub(crate) fn merge_into(&mut self, block: BlockId, succ: BlockId) {
        debug_assert_ne!(block, succ, "cannot merge a block into itself");
        debug_assert_eq!(self.blocks[block.index()].successors.as_slice(), &[succ]);
        debug_assert!(self.blocks[succ.index()].preds.iter().all(|&p| p == block));

        self.replace_successors(block, Successors::new());
        let succs = mem::take(&mut self.blocks[succ.index()].successors);
        for &next in &succs {
            remove_one(&mut self.blocks[next.index()].preds, succ);
        }
        self.replace_successors(block, succs);

        let tail = self.blocks[succ.index()].body.clone();
        let target = &mut self.blocks[block.index()];
        target.body = if target.body.is_lone_nop() {
            tail
        } else {
            target.body.concat(&tail)
        };
        self.blocks[succ.index()].state = BlockState::Merged { into: block };
        tracing::trace!(block = block.raw(), absorbed = succ.raw(), "merge");
    }

    // ── Internals ───────────────────────────────────────────────────

    fn alloc(&mut self, body: InstrList, mergeable: bool) -> BlockId {
        let id = self.next_id();
        self.blocks.push(Block {
            id,
            body,
            successors: Successors::new(),
            preds: SmallVec::new(),
            mergeable,
            state: BlockState::Live,
        });
        id
    }

    fn add_edge(&mut self, from: BlockId, to: BlockId) {
        self.blocks[from.index()].successors.push(to);
        self.blocks[to.index()].preds.push(from);
    }

    pub(crate) fn check_live(&self, id: BlockId) -> Result<(), CfgError> {
        match self.get(id).map(Block::state) {
            None => Err(CfgError::UnknownBlock(id)),
            Some(BlockState::Live) => Ok(()),
            Some(BlockState::Unlinked) => Err(CfgError::Unlinked(id)),
            Some(BlockState::Merged { into }) => Err(CfgError::Merged { block: id, into }),
        }
    }
}

/// Remove the first occurrence of `id`, if any.
fn remove_one(list: &mut SmallVec<[BlockId; 2]>, id: BlockId) {
    if let Some(pos) = list.iter().position(|&b| b == id) {
        list.remove(pos);
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
