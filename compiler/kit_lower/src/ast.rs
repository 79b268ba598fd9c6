//! The typed AST handed over by the front end.
//!
//! Names are resolved and types are checked before lowering: locals are
//! slot numbers (slot 0 is the receiver), calls name their static target
//! signature, and every operator carries the type it operates on.

use kit_cfg::{ArithOp, Cmp, FieldRef};
use kit_types::{ClassId, ClassTable, Name, SigId, Ty};

/// An expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// String literal.
    Str(Name),
    Nil,
    /// A local variable or parameter.
    Local { slot: u32, ty: Ty },
    /// Binary arithmetic on a numeric type.
    Arith {
        op: ArithOp,
        ty: Ty,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Arithmetic negation.
    Neg { ty: Ty, operand: Box<Expr> },
    /// Comparison of two operands of type `ty`.
    Compare {
        op: Cmp,
        ty: Ty,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    /// Short-circuit conjunction.
    And(Box<Expr>, Box<Expr>),
    /// Short-circuit disjunction.
    Or(Box<Expr>, Box<Expr>),
    /// Field read.
    Field { receiver: Box<Expr>, field: FieldRef },
    /// Virtual call of `method` on a receiver of static type `class`.
    Call {
        receiver: Box<Expr>,
        class: ClassId,
        method: SigId,
        args: Vec<Expr>,
    },
    /// Object construction through `constructor`.
    New {
        class: ClassId,
        constructor: SigId,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// The static type of the value this expression leaves on the stack.
    pub fn ty(&self, table: &ClassTable) -> Ty {
        match self {
            Expr::Int(_) => Ty::Int,
            Expr::Float(_) => Ty::Float,
            Expr::Bool(_) | Expr::Compare { .. } | Expr::Not(_) | Expr::And(..) | Expr::Or(..) => {
                Ty::Bool
            }
            Expr::Str(_) => Ty::Str,
            Expr::Nil => Ty::Nil,
            Expr::Local { ty, .. } | Expr::Arith { ty, .. } | Expr::Neg { ty, .. } => *ty,
            Expr::Field { field, .. } => field.ty,
            Expr::Call { method, .. } => table.signature(*method).return_type(),
            Expr::New { class, .. } => Ty::Class(*class),
        }
    }

    pub fn int(v: i64) -> Self {
        Expr::Int(v)
    }

    pub fn local(slot: u32, ty: Ty) -> Self {
        Expr::Local { slot, ty }
    }

    pub fn arith(op: ArithOp, ty: Ty, lhs: Expr, rhs: Expr) -> Self {
        Expr::Arith {
            op,
            ty,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn compare(op: Cmp, ty: Ty, lhs: Expr, rhs: Expr) -> Self {
        Expr::Compare {
            op,
            ty,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn not(operand: Expr) -> Self {
        Expr::Not(Box::new(operand))
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Expr::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Expr::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn call(receiver: Expr, class: ClassId, method: SigId, args: Vec<Expr>) -> Self {
        Expr::Call {
            receiver: Box::new(receiver),
            class,
            method,
            args,
        }
    }
}

/// A statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Skip,
    /// Evaluate for effect; any value is discarded.
    Expr(Expr),
    /// Store into a local slot.
    Assign { slot: u32, ty: Ty, value: Expr },
    /// Store into a field of `receiver`.
    FieldAssign {
        receiver: Expr,
        field: FieldRef,
        value: Expr,
    },
    Seq(Vec<Command>),
    If {
        cond: Expr,
        then: Box<Command>,
        otherwise: Box<Command>,
    },
    While { cond: Expr, body: Box<Command> },
    /// Return from the current code, with a value unless it returns `void`.
    Return(Option<Expr>),
    /// Check `cond`; `position` names the assert in failure reports.
    Assert { cond: Expr, position: Name },
}

impl Command {
    pub fn if_else(cond: Expr, then: Command, otherwise: Command) -> Self {
        Command::If {
            cond,
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn while_loop(cond: Expr, body: Command) -> Self {
        Command::While {
            cond,
            body: Box::new(body),
        }
    }
}

/// The source body of one signature.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    /// Number of local slots, receiver and parameters included.
    pub locals: u32,
    pub code: Command,
}
