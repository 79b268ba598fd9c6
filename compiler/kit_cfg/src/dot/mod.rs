//! Graphviz rendering of a signature's code.

use std::fmt::Write;

use kit_types::SigId;

use crate::block::Block;
use crate::program::Program;

/// Render the blocks reachable from `sig`'s code as a `dot` digraph.
///
/// Nodes are named `block_<id>` and labelled with their instructions.
/// Successor edges are solid and numbered by position; call edges into the
/// code of other signatures are dashed. Returns `None` if `sig` has no code.
pub fn to_dot(program: &Program, sig: SigId) -> Option<String> {
    let entry = program.code(sig)?;
    let cfg = program.cfg();
    let mut out = String::new();

    // Writing to a `String` cannot fail.
    let _ = writeln!(out, "digraph \"{sig}\" {{");
    let _ = writeln!(out, "  node [shape=box fontname=monospace];");
    for id in cfg.reachable_from(entry) {
        let block = cfg.block(id);
        let _ = writeln!(out, "  {id} [label=\"{}\"];", label(block));
        for (i, succ) in block.successors().iter().enumerate() {
            let _ = writeln!(out, "  {id} -> {succ} [label=\"{i}\"];");
        }
        let succs = block.successors().len();
        for target in program.forward(id).into_iter().skip(succs) {
            let _ = writeln!(out, "  {id} -> {target} [style=dashed];");
        }
    }
    out.push('}');
    Some(out)
}

fn label(block: &Block) -> String {
    let mut label = format!("{}\\l", block.id());
    for instr in block.body().iter() {
        let _ = write!(label, "{instr}\\l");
    }
    label.replace('"', "\\\"")
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
