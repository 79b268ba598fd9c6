use kit_types::Ty;
use pretty_assertions::assert_eq;

use crate::instr::{FinalOp, Literal, SeqOp};

use super::*;

fn int(v: i64) -> Instruction {
    Instruction::from(SeqOp::Const(Literal::Int(v)))
}

fn ret() -> Instruction {
    Instruction::from(FinalOp::Return { ty: Ty::Void })
}

#[test]
fn prepend_puts_instruction_first() {
    let list = InstrList::single(ret()).prepend(int(2)).prepend(int(1));
    let got: Vec<_> = list.iter().cloned().collect();
    assert_eq!(got, vec![int(1), int(2), ret()]);
    assert_eq!(list.len(), 3);
}

#[test]
fn prepend_leaves_the_original_untouched() {
    let original = InstrList::single(ret());
    let longer = original.prepend(int(7));
    assert_eq!(original.len(), 1);
    assert_eq!(original.head(), &ret());
    assert_eq!(longer.tail(), Some(original));
}

#[test]
fn concat_preserves_order() {
    let a = InstrList::from_instrs([int(1), int(2)]);
    let b = InstrList::from_instrs([int(3), ret()]);
    let (Some(a), Some(b)) = (a, b) else {
        panic!("non-empty input");
    };
    let joined = a.concat(&b);
    let got: Vec<_> = joined.iter().cloned().collect();
    assert_eq!(got, vec![int(1), int(2), int(3), ret()]);
    assert_eq!(joined.last(), &ret());
}

#[test]
fn empty_input_builds_no_list() {
    assert!(InstrList::from_instrs(Vec::new()).is_none());
}

#[test]
fn tail_of_single_is_none() {
    assert!(InstrList::single(ret()).tail().is_none());
    assert_eq!(InstrList::single(ret()).last(), &ret());
}

#[test]
fn lone_nop_detection() {
    assert!(InstrList::nop().is_lone_nop());
    assert!(!InstrList::nop().prepend(int(1)).is_lone_nop());
    assert!(!InstrList::single(int(1)).is_lone_nop());
}
