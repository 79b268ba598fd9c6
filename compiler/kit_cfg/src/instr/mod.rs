//! Kitten IR instructions.
//!
//! An [`Instruction`] is one stack-machine operation. Instructions are
//! immutable once built and own no graph pointers: control flow lives in
//! the [`Block`](crate::Block) successor lists, and calls refer to their
//! targets by [`SigId`].
//!
//! Every instruction falls in exactly one of four shapes:
//!
//! - **Sequential** ([`SeqOp`]): falls through to the next instruction.
//! - **Branching** ([`Condition`]): a test that must hold for control to
//!   enter the block it starts. Branches are only ever found at the head of
//!   the two arms built by [`Cfg::construct_branch`](crate::Cfg::construct_branch).
//! - **Final** ([`FinalOp`]): ends the body; the block has no successors.
//! - **Call** ([`Call`]): invokes code, carrying its resolved dynamic targets.

use std::fmt;

use kit_types::{ClassId, ClassTable, Name, SigId, Ty};
use smallvec::{smallvec, SmallVec};

use crate::dispatch::resolve_dynamic_targets;

/// The set of signatures a call may reach at run time.
///
/// Kept sorted and free of duplicates, so equality is set equality.
pub type DynamicTargets = SmallVec<[SigId; 2]>;

// ── Operands ────────────────────────────────────────────────────────

/// Constant pushed by [`SeqOp::Const`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Int(i64),
    /// IEEE-754 bits, so literals stay `Eq + Hash`.
    Float(u64),
    Bool(bool),
    Nil,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
}

/// Comparison performed by a branching instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cmp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Pops a boolean and holds when it is `true`.
    IfTrue,
    /// Pops a boolean and holds when it is `false`.
    IfFalse,
}

impl Cmp {
    /// The comparison that holds exactly when `self` does not.
    pub fn negate(self) -> Self {
        match self {
            Cmp::Eq => Cmp::Ne,
            Cmp::Ne => Cmp::Eq,
            Cmp::Lt => Cmp::Ge,
            Cmp::Ge => Cmp::Lt,
            Cmp::Le => Cmp::Gt,
            Cmp::Gt => Cmp::Le,
            Cmp::IfTrue => Cmp::IfFalse,
            Cmp::IfFalse => Cmp::IfTrue,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Cmp::Eq => "if_eq",
            Cmp::Ne => "if_ne",
            Cmp::Lt => "if_lt",
            Cmp::Le => "if_le",
            Cmp::Gt => "if_gt",
            Cmp::Ge => "if_ge",
            Cmp::IfTrue => "if_true",
            Cmp::IfFalse => "if_false",
        }
    }
}

/// A field access target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub class: ClassId,
    pub name: Name,
    pub ty: Ty,
}

// ── Instruction shapes ──────────────────────────────────────────────

/// A sequential instruction: executes and falls through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeqOp {
    /// Does nothing. Placeholder bodies of branch and pivot blocks.
    Nop,
    Const(Literal),
    /// Push local slot `slot`.
    Load { slot: u32, ty: Ty },
    /// Pop into local slot `slot`.
    Store { slot: u32, ty: Ty },
    Arith { op: ArithOp, ty: Ty },
    /// Allocate an uninitialised object of `class`.
    New { class: ClassId },
    /// Push a fresh string with the given contents.
    NewString { value: Name },
    GetField(FieldRef),
    PutField(FieldRef),
    Dup { ty: Ty },
    Pop { ty: Ty },
}

/// A branching instruction: a test on the operand stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Condition {
    pub cmp: Cmp,
    /// Type of the compared operands.
    pub ty: Ty,
}

impl Condition {
    pub fn new(cmp: Cmp, ty: Ty) -> Self {
        Self { cmp, ty }
    }

    pub fn negate(self) -> Self {
        Self {
            cmp: self.cmp.negate(),
            ty: self.ty,
        }
    }
}

/// A final instruction: control does not continue past it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FinalOp {
    /// Return from the current code; `Void` returns nothing.
    Return { ty: Ty },
    /// Stop the computation. Ends paths well-typed code never reaches.
    Halt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallKind {
    /// Dynamic lookup on the receiver's run-time class.
    Virtual,
    /// Constructor invocation; the static target is the only target.
    Constructor,
}

/// A call site.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Call {
    pub kind: CallKind,
    /// Static type of the receiver.
    pub receiver: ClassId,
    /// The signature named at the call site.
    pub static_target: SigId,
    /// Every signature the call may reach at run time, frozen when the call
    /// is built. Empty means the call can never execute.
    pub dynamic_targets: DynamicTargets,
}

impl Call {
    /// Build a virtual call, resolving its dynamic targets against every
    /// concrete subtype of `receiver`.
    pub fn virtual_call(table: &ClassTable, receiver: ClassId, static_target: SigId) -> Self {
        let sig = table.signature(static_target);
        let dynamic_targets = resolve_dynamic_targets(table, receiver, sig.name, &sig.params);
        Self {
            kind: CallKind::Virtual,
            receiver,
            static_target,
            dynamic_targets,
        }
    }

    /// Build a constructor call.
    pub fn constructor(table: &ClassTable, ctor: SigId) -> Self {
        Self {
            kind: CallKind::Constructor,
            receiver: table.signature(ctor).class,
            static_target: ctor,
            dynamic_targets: smallvec![ctor],
        }
    }
}

/// One IR operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    Seq(SeqOp),
    Branch(Condition),
    Final(FinalOp),
    Call(Call),
}

impl Instruction {
    pub const NOP: Instruction = Instruction::Seq(SeqOp::Nop);

    pub fn is_nop(&self) -> bool {
        matches!(self, Instruction::Seq(SeqOp::Nop))
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Instruction::Final(_))
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Instruction::Branch(_))
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Instruction::Call(call) => Some(call),
            _ => None,
        }
    }

    /// The usage-statistics key of this instruction.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Seq(op) => match op {
                SeqOp::Nop => Opcode::Nop,
                SeqOp::Const(_) => Opcode::Const,
                SeqOp::Load { .. } => Opcode::Load,
                SeqOp::Store { .. } => Opcode::Store,
                SeqOp::Arith { op, .. } => Opcode::Arith(*op),
                SeqOp::New { .. } => Opcode::New,
                SeqOp::NewString { .. } => Opcode::NewString,
                SeqOp::GetField(_) => Opcode::GetField,
                SeqOp::PutField(_) => Opcode::PutField,
                SeqOp::Dup { .. } => Opcode::Dup,
                SeqOp::Pop { .. } => Opcode::Pop,
            },
            Instruction::Branch(cond) => Opcode::Branch(cond.cmp),
            Instruction::Final(FinalOp::Return { .. }) => Opcode::Return,
            Instruction::Final(FinalOp::Halt) => Opcode::Halt,
            Instruction::Call(call) => Opcode::Call(call.kind),
        }
    }
}

impl From<SeqOp> for Instruction {
    fn from(op: SeqOp) -> Self {
        Instruction::Seq(op)
    }
}

impl From<Condition> for Instruction {
    fn from(cond: Condition) -> Self {
        Instruction::Branch(cond)
    }
}

impl From<FinalOp> for Instruction {
    fn from(op: FinalOp) -> Self {
        Instruction::Final(op)
    }
}

impl From<Call> for Instruction {
    fn from(call: Call) -> Self {
        Instruction::Call(call)
    }
}

// ── Opcodes ─────────────────────────────────────────────────────────

/// Operand-free instruction kind, the key of [`UsageStats`](crate::UsageStats).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opcode {
    Nop,
    Const,
    Load,
    Store,
    Arith(ArithOp),
    New,
    NewString,
    GetField,
    PutField,
    Dup,
    Pop,
    Branch(Cmp),
    Return,
    Halt,
    Call(CallKind),
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "nop",
            Opcode::Const => "const",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::Arith(ArithOp::Add) => "add",
            Opcode::Arith(ArithOp::Sub) => "sub",
            Opcode::Arith(ArithOp::Mul) => "mul",
            Opcode::Arith(ArithOp::Div) => "div",
            Opcode::Arith(ArithOp::Rem) => "rem",
            Opcode::Arith(ArithOp::Neg) => "neg",
            Opcode::New => "new",
            Opcode::NewString => "newstring",
            Opcode::GetField => "getfield",
            Opcode::PutField => "putfield",
            Opcode::Dup => "dup",
            Opcode::Pop => "pop",
            Opcode::Branch(cmp) => cmp.mnemonic(),
            Opcode::Return => "return",
            Opcode::Halt => "halt",
            Opcode::Call(CallKind::Virtual) => "virtualcall",
            Opcode::Call(CallKind::Constructor) => "constructorcall",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode().mnemonic())?;
        match self {
            Instruction::Seq(op) => match op {
                SeqOp::Nop => Ok(()),
                SeqOp::Const(lit) => match lit {
                    Literal::Int(v) => write!(f, " {v}"),
                    Literal::Float(bits) => write!(f, " {}", f64::from_bits(*bits)),
                    Literal::Bool(v) => write!(f, " {v}"),
                    Literal::Nil => f.write_str(" nil"),
                },
                SeqOp::Load { slot, ty } | SeqOp::Store { slot, ty } => write!(f, " {slot} of type {ty}"),
                SeqOp::Arith { ty, .. } | SeqOp::Dup { ty } | SeqOp::Pop { ty } => write!(f, " {ty}"),
                SeqOp::New { class } => write!(f, " class#{}", class.raw()),
                SeqOp::NewString { value } => write!(f, " name#{}", value.raw()),
                SeqOp::GetField(field) | SeqOp::PutField(field) => write!(
                    f,
                    " class#{}.name#{} : {}",
                    field.class.raw(),
                    field.name.raw(),
                    field.ty
                ),
            },
            Instruction::Branch(cond) => write!(f, " {}", cond.ty),
            Instruction::Final(FinalOp::Return { ty }) => write!(f, " {ty}"),
            Instruction::Final(FinalOp::Halt) => Ok(()),
            Instruction::Call(call) => {
                write!(f, " {} ->", call.static_target)?;
                for target in &call.dynamic_targets {
                    write!(f, " {target}")?;
                }
                Ok(())
            }
        }
    }
}
