//! Shared test utilities for the block, cleanup and verifier tests.
//! Only compiled in test builds.

use kit_types::Ty;

use crate::block::{BlockId, Cfg};
use crate::instr::{ArithOp, Cmp, Condition, FinalOp, Instruction, Literal, SeqOp};

/// `const v`.
pub(crate) fn int(v: i64) -> Instruction {
    Instruction::from(SeqOp::Const(Literal::Int(v)))
}

/// `load slot` of an `int` local.
pub(crate) fn load(slot: u32) -> Instruction {
    Instruction::from(SeqOp::Load { slot, ty: Ty::Int })
}

/// `add` on ints.
pub(crate) fn add() -> Instruction {
    Instruction::from(SeqOp::Arith {
        op: ArithOp::Add,
        ty: Ty::Int,
    })
}

/// `if_lt` on ints.
pub(crate) fn lt() -> Condition {
    Condition::new(Cmp::Lt, Ty::Int)
}

pub(crate) fn ret_void() -> FinalOp {
    FinalOp::Return { ty: Ty::Void }
}

/// The body of `block` as a `Vec`, in execution order.
pub(crate) fn body_of(cfg: &Cfg, block: BlockId) -> Vec<Instruction> {
    cfg.block(block).body().iter().cloned().collect()
}
