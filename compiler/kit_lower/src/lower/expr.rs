//! Expression lowering.
//!
//! As a value, an expression pushes its result and continues. Booleans can
//! also be lowered as a test: comparisons become branch blocks directly,
//! `!` swaps the targets, and `&&`/`||` short-circuit by chaining tests.
//! Any other boolean is pushed and tested with `if_true`.

use kit_cfg::{ArithOp, BlockId, Call, Cmp, Condition, Literal, SeqOp};
use kit_types::Ty;

use super::{LowerCtx, Translate, TranslateTest};
use crate::ast::Expr;
use crate::error::LowerError;

impl Translate for Expr {
    fn translate(&self, cx: &mut LowerCtx<'_>, continuation: BlockId) -> Result<BlockId, LowerError> {
        match self {
            Expr::Int(v) => cx.prefix(continuation, SeqOp::Const(Literal::Int(*v))),
            Expr::Float(v) => cx.prefix(continuation, SeqOp::Const(Literal::Float(v.to_bits()))),
            Expr::Bool(v) => cx.prefix(continuation, SeqOp::Const(Literal::Bool(*v))),
            Expr::Nil => cx.prefix(continuation, SeqOp::Const(Literal::Nil)),
            Expr::Str(value) => cx.prefix(continuation, SeqOp::NewString { value: *value }),

            Expr::Local { slot, ty } => {
                cx.check_local(*slot)?;
                cx.prefix(continuation, SeqOp::Load { slot: *slot, ty: *ty })
            }

            Expr::Arith { op, ty, lhs, rhs } => {
                let block = cx.prefix(continuation, SeqOp::Arith { op: *op, ty: *ty })?;
                let block = rhs.translate(cx, block)?;
                lhs.translate(cx, block)
            }

            Expr::Neg { ty, operand } => {
                let block = cx.prefix(
                    continuation,
                    SeqOp::Arith {
                        op: ArithOp::Neg,
                        ty: *ty,
                    },
                )?;
                operand.translate(cx, block)
            }

            Expr::Compare { .. } | Expr::Not(_) | Expr::And(..) | Expr::Or(..) => {
                // Both outcomes push a constant and meet again at the
                // continuation; `followed_by` never extends it in place.
                let yes = cx.followed_by(SeqOp::Const(Literal::Bool(true)), continuation)?;
                let no = cx.followed_by(SeqOp::Const(Literal::Bool(false)), continuation)?;
                self.translate_as_test(cx, yes, no)
            }

            Expr::Field { receiver, field } => {
                let block = cx.prefix(continuation, SeqOp::GetField(*field))?;
                receiver.translate(cx, block)
            }

            Expr::Call {
                receiver,
                class,
                method,
                args,
            } => {
                cx.check_signature(*method)?;
                let call = Call::virtual_call(cx.table(), *class, *method);
                if call.dynamic_targets.is_empty() {
                    tracing::warn!(
                        sig = cx.sig().raw(),
                        target = method.raw(),
                        "call has no concrete target"
                    );
                }
                let block = cx.prefix(continuation, call)?;
                let block = translate_args(cx, args, block)?;
                receiver.translate(cx, block)
            }

            Expr::New {
                class,
                constructor,
                args,
            } => {
                cx.check_signature(*constructor)?;
                let call = Call::constructor(cx.table(), *constructor);
                let block = cx.prefix(continuation, call)?;
                let block = translate_args(cx, args, block)?;
                let block = cx.prefix(
                    block,
                    SeqOp::Dup {
                        ty: Ty::Class(*class),
                    },
                )?;
                cx.prefix(block, SeqOp::New { class: *class })
            }
        }
    }
}

/// Push `args` left to right, then continue at `continuation`.
fn translate_args(
    cx: &mut LowerCtx<'_>,
    args: &[Expr],
    continuation: BlockId,
) -> Result<BlockId, LowerError> {
    args.iter()
        .rev()
        .try_fold(continuation, |block, arg| arg.translate(cx, block))
}

impl TranslateTest for Expr {
    fn translate_as_test(
        &self,
        cx: &mut LowerCtx<'_>,
        yes: BlockId,
        no: BlockId,
    ) -> Result<BlockId, LowerError> {
        match self {
            Expr::Bool(true) => Ok(yes),
            Expr::Bool(false) => Ok(no),

            Expr::Compare { op, ty, lhs, rhs } => {
                let test = cx.branch(Condition::new(*op, *ty), yes, no)?;
                let block = rhs.translate(cx, test)?;
                lhs.translate(cx, block)
            }

            Expr::Not(operand) => operand.translate_as_test(cx, no, yes),

            Expr::And(lhs, rhs) => {
                cx.do_not_merge(no)?;
                let second = rhs.translate_as_test(cx, yes, no)?;
                lhs.translate_as_test(cx, second, no)
            }

            Expr::Or(lhs, rhs) => {
                cx.do_not_merge(yes)?;
                let second = rhs.translate_as_test(cx, yes, no)?;
                lhs.translate_as_test(cx, yes, second)
            }

            _ => {
                let test = cx.branch(Condition::new(Cmp::IfTrue, Ty::Bool), yes, no)?;
                self.translate(cx, test)
            }
        }
    }
}
