//! Graph verification.
//!
//! Checks run in debug builds and by tests:
//!
//! - [`verify_links`]: successor and predecessor lists agree edge for
//!   edge, and dead blocks hold no edges. Holds at every point of lowering
//!   and cleanup.
//! - [`verify_clean`]: additionally, every block reachable from live code
//!   is well shaped and as simplified as cleanup makes it.

use kit_types::SigId;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::block::{Block, BlockId, Cfg};
use crate::program::Program;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GraphProblem {
    #[error("{from} has {successor_edges} edges to {to}, but {to} records {predecessor_entries}")]
    EdgeMismatch {
        from: BlockId,
        to: BlockId,
        successor_edges: usize,
        predecessor_entries: usize,
    },

    #[error("{0} is no longer live but still has edges")]
    DeadWithEdges(BlockId),

    #[error("{from} links to {to}, which is no longer live")]
    DeadSuccessor { from: BlockId, to: BlockId },

    #[error("{0} has instructions after a final instruction")]
    CodeAfterFinal(BlockId),

    #[error("{0} ends in a final instruction but has successors")]
    SuccessorsAfterFinal(BlockId),

    #[error("{0} neither ends in a final instruction nor has successors")]
    FallsOffEnd(BlockId),

    #[error("{0} has a branch instruction past its head")]
    MisplacedBranch(BlockId),

    #[error("{from} still links to the placeholder {nop}")]
    UnsplicedNop { from: BlockId, nop: BlockId },

    #[error("{block} and its sole successor {succ} were not merged")]
    UnmergedChain { block: BlockId, succ: BlockId },

    #[error("{0} is live but has no code")]
    MissingCode(SigId),
}

/// Check that both edge directions agree, edge for edge.
pub fn verify_links(cfg: &Cfg) -> Vec<GraphProblem> {
    let mut problems = Vec::new();
    let mut forward: FxHashMap<(BlockId, BlockId), usize> = FxHashMap::default();
    let mut backward: FxHashMap<(BlockId, BlockId), usize> = FxHashMap::default();

    for block in cfg.iter() {
        if !block.is_live() {
            if !block.successors().is_empty() || block.has_predecessors() {
                problems.push(GraphProblem::DeadWithEdges(block.id()));
            }
            continue;
        }
        for &to in block.successors() {
            *forward.entry((block.id(), to)).or_insert(0) += 1;
            if cfg.get(to).map_or(true, |b| !b.is_live()) {
                problems.push(GraphProblem::DeadSuccessor {
                    from: block.id(),
                    to,
                });
            }
        }
        for &from in block.pred_edges() {
            *backward.entry((from, block.id())).or_insert(0) += 1;
        }
    }

    let mut edges: Vec<(BlockId, BlockId)> = forward.keys().chain(backward.keys()).copied().collect();
    edges.sort_unstable();
    edges.dedup();
    for (from, to) in edges {
        let successor_edges = forward.get(&(from, to)).copied().unwrap_or(0);
        let predecessor_entries = backward.get(&(from, to)).copied().unwrap_or(0);
        if successor_edges != predecessor_entries {
            problems.push(GraphProblem::EdgeMismatch {
                from,
                to,
                successor_edges,
                predecessor_entries,
            });
        }
    }
    problems
}

/// [`verify_links`], plus shape and simplification checks on every block
/// reachable from the code of a live signature. Meant to run after
/// [`Program::clean_up`].
pub fn verify_clean(program: &Program) -> Vec<GraphProblem> {
    let cfg = program.cfg();
    let mut problems = verify_links(cfg);
    let mut seen = FxHashSet::default();

    for sig in program.emission_order() {
        let Some(entry) = program.code(sig) else {
            problems.push(GraphProblem::MissingCode(sig));
            continue;
        };
        for id in cfg.reachable_from(entry) {
            if seen.insert(id) {
                check_shape(cfg.block(id), &mut problems);
                check_simplified(program, cfg.block(id), &mut problems);
            }
        }
    }
    problems
}

fn check_shape(block: &Block, problems: &mut Vec<GraphProblem>) {
    let id = block.id();
    let len = block.body().len();
    let mut ends_final = false;
    for (i, instr) in block.body().iter().enumerate() {
        if instr.is_final() {
            if i + 1 < len {
                problems.push(GraphProblem::CodeAfterFinal(id));
            }
            ends_final = i + 1 == len;
        }
        if instr.is_branch() && i > 0 {
            problems.push(GraphProblem::MisplacedBranch(id));
        }
    }
    match (ends_final, block.successors().is_empty()) {
        (true, false) => problems.push(GraphProblem::SuccessorsAfterFinal(id)),
        (false, true) => problems.push(GraphProblem::FallsOffEnd(id)),
        _ => {}
    }
}

fn check_simplified(program: &Program, block: &Block, problems: &mut Vec<GraphProblem>) {
    let cfg = program.cfg();
    let id = block.id();
    for &succ in block.successors() {
        if succ != id
            && !program.is_entry_block(succ)
            && cfg.block(succ).is_spliceable_nop()
            && !on_nop_cycle(program, succ)
        {
            problems.push(GraphProblem::UnsplicedNop { from: id, nop: succ });
        }
    }
    if let &[succ] = block.successors() {
        let target = cfg.block(succ);
        if succ != id
            && !program.is_entry_block(succ)
            && target.is_live()
            && target.num_predecessors() == 1
        {
            problems.push(GraphProblem::UnmergedChain { block: id, succ });
        }
    }
}

/// Whether `nop` reaches itself through spliceable nops only. Such a loop
/// does nothing forever and has no successor to splice in.
fn on_nop_cycle(program: &Program, nop: BlockId) -> bool {
    let cfg = program.cfg();
    let mut stack = vec![nop];
    let mut seen = FxHashSet::default();
    while let Some(block) = stack.pop() {
        for &next in cfg.block(block).successors() {
            if next == nop {
                return true;
            }
            if !program.is_entry_block(next)
                && cfg.block(next).is_spliceable_nop()
                && seen.insert(next)
            {
                stack.push(next);
            }
        }
    }
    false
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
