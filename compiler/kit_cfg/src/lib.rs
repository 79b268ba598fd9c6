//! Block-structured IR for the Kitten compiler.
//!
//! Lowering builds each code body back to front: every construct is handed
//! the block that runs after it and returns the block that runs it first,
//! so bodies grow by [`Cfg::prefixed_by`] and branch through
//! [`Cfg::construct_branch`]. All blocks of a session live in one [`Cfg`]
//! arena owned by the [`Program`].
//!
//! Once every body is lowered, [`Program::clean_up`] walks the program from
//! its entry across successor and call edges. It splices out placeholder
//! blocks, merges single-entry chains, and records which signatures are
//! live, i.e. must be emitted.
//!
//! # Modules
//!
//! - [`instr`] / [`InstrList`]: instructions and persistent block bodies
//! - [`Block`] / [`Cfg`]: blocks, edges and the arena
//! - [`resolve_dynamic_targets`]: virtual-call target sets
//! - [`Program`] / [`clean_up`]: whole-program cleanup
//! - [`verify_links`] / [`verify_clean`]: graph checks
//! - [`to_dot`]: Graphviz output

mod block;
mod cleanup;
mod dispatch;
mod dot;
mod error;
pub mod instr;
mod instr_list;
mod program;
mod stats;
mod verify;

#[cfg(test)]
mod test_helpers;

pub use block::{Block, BlockId, BlockState, Cfg, Successors};
pub use cleanup::{clean_up, CleanupStats};
pub use dispatch::resolve_dynamic_targets;
pub use dot::to_dot;
pub use error::CfgError;
pub use instr::{
    ArithOp, Call, CallKind, Cmp, Condition, DynamicTargets, FieldRef, FinalOp, Instruction,
    Literal, Opcode, SeqOp,
};
pub use instr_list::InstrList;
pub use program::Program;
pub use stats::UsageStats;
pub use verify::{verify_clean, verify_links, GraphProblem};
