//! Statement lowering.

use kit_cfg::{BlockId, FinalOp, SeqOp};
use kit_types::{CodeKind, Ty};

use super::{LowerCtx, Translate, TranslateTest};
use crate::ast::Command;
use crate::error::LowerError;

impl Translate for Command {
    fn translate(&self, cx: &mut LowerCtx<'_>, continuation: BlockId) -> Result<BlockId, LowerError> {
        match self {
            Command::Skip => Ok(continuation),

            Command::Expr(expr) => {
                let ty = cx.type_of(expr)?;
                if ty.is_void() {
                    expr.translate(cx, continuation)
                } else {
                    let block = cx.prefix(continuation, SeqOp::Pop { ty })?;
                    expr.translate(cx, block)
                }
            }

            Command::Assign { slot, ty, value } => {
                cx.check_local(*slot)?;
                let block = cx.prefix(continuation, SeqOp::Store { slot: *slot, ty: *ty })?;
                value.translate(cx, block)
            }

            Command::FieldAssign {
                receiver,
                field,
                value,
            } => {
                let block = cx.prefix(continuation, SeqOp::PutField(*field))?;
                let block = value.translate(cx, block)?;
                receiver.translate(cx, block)
            }

            Command::Seq(commands) => commands
                .iter()
                .rev()
                .try_fold(continuation, |block, command| command.translate(cx, block)),

            Command::If {
                cond,
                then,
                otherwise,
            } => {
                cx.do_not_merge(continuation)?;
                let then_entry = then.translate(cx, continuation)?;
                let else_entry = otherwise.translate(cx, continuation)?;
                cond.translate_as_test(cx, then_entry, else_entry)
            }

            Command::While { cond, body } => {
                let pivot = cx.pivot();
                let body_entry = body.translate(cx, pivot)?;
                let test = cond.translate_as_test(cx, body_entry, continuation)?;
                cx.link(pivot, test)?;
                Ok(pivot)
            }

            Command::Return(value) => {
                // The continuation is dropped: code after a return is dead.
                match value {
                    None => Ok(cx.final_block(FinalOp::Return { ty: Ty::Void })),
                    Some(expr) => {
                        let ty = cx.type_of(expr)?;
                        let ret = cx.final_block(FinalOp::Return { ty });
                        expr.translate(cx, ret)
                    }
                }
            }

            Command::Assert { cond, position } => {
                cx.do_not_merge(continuation)?;
                let failure = if cx.kind() == CodeKind::Test {
                    cx.test_result(*position)?
                } else {
                    cx.final_block(FinalOp::Halt)
                };
                cond.translate_as_test(cx, continuation, failure)
            }
        }
    }
}
