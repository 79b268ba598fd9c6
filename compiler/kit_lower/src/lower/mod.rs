//! Typed AST → block IR lowering.
//!
//! Lowering runs back to front. Each construct implements [`Translate`]:
//! given the block that runs after it (its continuation), it returns the
//! block that runs it first. Boolean expressions also implement
//! [`TranslateTest`], which jumps to one of two blocks instead of pushing a
//! value.
//!
//! # Entry Point
//!
//! [`lower_body`] lowers one signature's body into the program's arena,
//! discards the blocks nothing reaches, and records the entry as the
//! signature's code.
//!
//! # Shared continuations
//!
//! A block reached from two arms must not be prefixed in place by either
//! arm, or the other arm would run the first arm's code. Every construct
//! that hands one continuation to two sub-constructs marks it with
//! [`LowerCtx::do_not_merge`] first.

mod command;
mod expr;

use kit_cfg::{BlockId, Call, Cfg, CfgError, Condition, FinalOp, Instruction, Program, SeqOp};
use kit_types::{ClassTable, CodeKind, Name, SigId, Ty};

use crate::ast::{Body, Expr};
use crate::error::LowerError;

/// Lower a construct in front of a continuation.
pub trait Translate {
    /// The block that runs `self` and then flows into `continuation`.
    fn translate(&self, cx: &mut LowerCtx<'_>, continuation: BlockId)
        -> Result<BlockId, LowerError>;
}

/// Lower a boolean construct as a jump.
pub trait TranslateTest {
    /// The block that evaluates `self` and continues at `yes` when it holds
    /// and at `no` otherwise.
    fn translate_as_test(
        &self,
        cx: &mut LowerCtx<'_>,
        yes: BlockId,
        no: BlockId,
    ) -> Result<BlockId, LowerError>;
}

/// State of the body being lowered: the arena, the class table, and the
/// signature the body belongs to.
pub struct LowerCtx<'a> {
    table: &'a ClassTable,
    cfg: &'a mut Cfg,
    sig: SigId,
    locals: u32,
}

impl<'a> LowerCtx<'a> {
    pub fn new(table: &'a ClassTable, cfg: &'a mut Cfg, sig: SigId, locals: u32) -> Self {
        Self {
            table,
            cfg,
            sig,
            locals,
        }
    }

    #[inline]
    pub fn table(&self) -> &'a ClassTable {
        self.table
    }

    #[inline]
    pub fn sig(&self) -> SigId {
        self.sig
    }

    pub fn kind(&self) -> CodeKind {
        self.table.signature(self.sig).kind
    }

    #[inline]
    pub fn cfg(&self) -> &Cfg {
        &*self.cfg
    }

    // ── Graph edits ─────────────────────────────────────────────────

    fn graph<T>(&self, result: Result<T, CfgError>) -> Result<T, LowerError> {
        result.map_err(|source| LowerError::Graph {
            sig: self.sig,
            source,
        })
    }

    pub fn prefix(
        &mut self,
        block: BlockId,
        instr: impl Into<Instruction>,
    ) -> Result<BlockId, LowerError> {
        let result = self.cfg.prefixed_by(block, instr);
        self.graph(result)
    }

    pub fn followed_by(
        &mut self,
        instr: impl Into<Instruction>,
        block: BlockId,
    ) -> Result<BlockId, LowerError> {
        let result = self.cfg.followed_by(instr, block);
        self.graph(result)
    }

    pub fn branch(
        &mut self,
        cond: Condition,
        yes: BlockId,
        no: BlockId,
    ) -> Result<BlockId, LowerError> {
        let result = self.cfg.construct_branch(cond, yes, no);
        self.graph(result)
    }

    pub fn pivot(&mut self) -> BlockId {
        self.cfg.construct_pivot()
    }

    pub fn final_block(&mut self, op: FinalOp) -> BlockId {
        self.cfg.construct_final(op)
    }

    pub fn link(&mut self, from: BlockId, to: BlockId) -> Result<(), LowerError> {
        let result = self.cfg.link_to(from, to);
        self.graph(result)
    }

    pub fn do_not_merge(&mut self, block: BlockId) -> Result<(), LowerError> {
        let result = self.cfg.do_not_merge(block);
        self.graph(result)
    }

    // ── Checks ──────────────────────────────────────────────────────

    pub(crate) fn check_local(&self, slot: u32) -> Result<(), LowerError> {
        if slot < self.locals {
            Ok(())
        } else {
            Err(LowerError::UnknownLocal {
                sig: self.sig,
                slot,
                locals: self.locals,
            })
        }
    }

    pub(crate) fn check_signature(&self, target: SigId) -> Result<(), LowerError> {
        if target.index() < self.table.num_signatures() {
            Ok(())
        } else {
            Err(LowerError::UnknownSignature {
                sig: self.sig,
                target,
            })
        }
    }

    /// The type `expr` pushes, checking call targets first.
    pub(crate) fn type_of(&self, expr: &Expr) -> Result<Ty, LowerError> {
        if let Expr::Call { method, .. } = expr {
            self.check_signature(*method)?;
        }
        Ok(expr.ty(self.table))
    }

    // ── Body framing ────────────────────────────────────────────────

    /// Where control goes when the body falls off its end.
    fn exit_block(&mut self) -> Result<BlockId, LowerError> {
        match self.kind() {
            CodeKind::Method { returns: Ty::Void } | CodeKind::Constructor | CodeKind::Fixture => {
                Ok(self.final_block(FinalOp::Return { ty: Ty::Void }))
            }
            // Well-typed value methods never get here.
            CodeKind::Method { .. } => Ok(self.final_block(FinalOp::Halt)),
            CodeKind::Test => self.test_result(Name::EMPTY),
        }
    }

    /// A block returning the string `message` from a test.
    pub(crate) fn test_result(&mut self, message: Name) -> Result<BlockId, LowerError> {
        let ret = self.final_block(FinalOp::Return { ty: Ty::Str });
        self.prefix(ret, SeqOp::NewString { value: message })
    }

    /// Put the superclass's no-argument constructor call in front of a
    /// constructor body.
    fn super_constructor_call(&mut self, entry: BlockId) -> Result<BlockId, LowerError> {
        let class = self.table.signature(self.sig).class;
        let Some(superclass) = self.table.class(class).superclass else {
            return Ok(entry);
        };
        let Some(ctor) = self.table.constructor_lookup(superclass, &[]) else {
            tracing::debug!(
                sig = self.sig.raw(),
                superclass = superclass.raw(),
                "superclass has no argument-free constructor"
            );
            return Ok(entry);
        };
        let call = Call::constructor(self.table, ctor);
        let block = self.prefix(entry, call)?;
        self.prefix(
            block,
            SeqOp::Load {
                slot: 0,
                ty: Ty::Class(class),
            },
        )
    }
}

/// Lower `body` as the code of `sig` and record it in `program`.
///
/// Blocks created for the body that are unreachable from its entry (code
/// after a `return`, unused continuations) are unlinked before the entry
/// is recorded.
pub fn lower_body(
    program: &mut Program,
    table: &ClassTable,
    sig: SigId,
    body: &Body,
) -> Result<BlockId, LowerError> {
    if sig.index() >= table.num_signatures() {
        return Err(LowerError::UnknownSignature { sig, target: sig });
    }
    let since = program.cfg().next_id();

    let mut cx = LowerCtx::new(table, program.cfg_mut(), sig, body.locals);
    let exit = cx.exit_block()?;
    let mut entry = body.code.translate(&mut cx, exit)?;
    if cx.kind() == CodeKind::Constructor {
        entry = cx.super_constructor_call(entry)?;
    }

    let swept = program.cfg_mut().sweep_unreachable(entry, since);
    program
        .set_code(sig, entry)
        .map_err(|source| LowerError::Graph { sig, source })?;

    tracing::debug!(
        sig = sig.raw(),
        entry = entry.raw(),
        blocks = program.cfg().len() - since.index(),
        swept,
        "lowered body"
    );
    Ok(entry)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
