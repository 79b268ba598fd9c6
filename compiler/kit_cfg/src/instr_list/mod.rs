//! Persistent, non-empty instruction sequences.
//!
//! A block body is an [`InstrList`]: a head instruction plus a persistent
//! tail. Prefixing and concatenation build new lists that share the
//! unchanged parts of their inputs, so a body can be handed to several
//! blocks (or kept by the caller) without copying and without ever being
//! mutated element-wise.

use im::Vector;

use crate::instr::Instruction;

/// A non-empty, immutable sequence of instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstrList {
    head: Instruction,
    tail: Vector<Instruction>,
}

impl InstrList {
    /// A list holding a single instruction.
    pub fn single(instr: impl Into<Instruction>) -> Self {
        Self {
            head: instr.into(),
            tail: Vector::new(),
        }
    }

    /// A list holding a lone `nop`.
    pub fn nop() -> Self {
        Self::single(Instruction::NOP)
    }

    /// Build a list from instructions in execution order.
    ///
    /// Returns `None` for an empty iterator: bodies are never empty.
    pub fn from_instrs(instrs: impl IntoIterator<Item = Instruction>) -> Option<Self> {
        let mut iter = instrs.into_iter();
        let head = iter.next()?;
        Some(Self {
            head,
            tail: iter.collect(),
        })
    }

    /// `instr` followed by this list. The receiver is shared, not copied.
    #[must_use]
    pub fn prepend(&self, instr: impl Into<Instruction>) -> Self {
        let mut tail = self.tail.clone();
        tail.push_front(self.head.clone());
        Self {
            head: instr.into(),
            tail,
        }
    }

    /// This list followed by `other`.
    #[must_use]
    pub fn concat(&self, other: &InstrList) -> Self {
        let mut tail = self.tail.clone();
        tail.push_back(other.head.clone());
        tail.append(other.tail.clone());
        Self {
            head: self.head.clone(),
            tail,
        }
    }

    #[inline]
    pub fn head(&self) -> &Instruction {
        &self.head
    }

    /// Everything after the head, or `None` for a single instruction.
    pub fn tail(&self) -> Option<InstrList> {
        let head = self.tail.front()?.clone();
        Some(Self {
            head,
            tail: self.tail.skip(1),
        })
    }

    /// The last instruction of the list.
    pub fn last(&self) -> &Instruction {
        self.tail.back().unwrap_or(&self.head)
    }

    pub fn len(&self) -> usize {
        1 + self.tail.len()
    }

    /// Always false: lists hold at least one instruction.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether this list is exactly one `nop`.
    pub fn is_lone_nop(&self) -> bool {
        self.tail.is_empty() && self.head.is_nop()
    }

    /// Instructions in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> + '_ {
        std::iter::once(&self.head).chain(self.tail.iter())
    }
}

#[cfg(test)]
mod tests;
