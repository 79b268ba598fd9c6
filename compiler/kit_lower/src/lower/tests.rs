use kit_cfg::{
    verify_clean, ArithOp, BlockId, BlockState, Call, CfgError, Cmp, Condition, FinalOp,
    Instruction, Literal, Opcode, Program, SeqOp,
};
use kit_types::{ClassId, ClassTable, Name, SigId, StringInterner, Ty};
use pretty_assertions::assert_eq;

use super::lower_body;
use crate::ast::{Body, Command, Expr};
use crate::error::LowerError;

struct World {
    interner: StringInterner,
    table: ClassTable,
    main_class: ClassId,
    main: SigId,
    value: SigId,
    check: SigId,
    point: ClassId,
    point_new: SigId,
    derived_new: SigId,
    derived: ClassId,
    base_new: SigId,
}

fn world() -> World {
    let interner = StringInterner::new();
    let mut table = ClassTable::new(&interner);
    let main_class = table.add_class(interner.intern("Main"), None);
    let main = table.add_method(main_class, interner.intern("main"), &[], Ty::Void);
    let value = table.add_method(main_class, interner.intern("value"), &[], Ty::Int);
    let check = table.add_test(main_class, interner.intern("check"));
    let point = table.add_class(interner.intern("Point"), None);
    let point_new = table.add_constructor(point, &[]);
    let base = table.add_class(interner.intern("Base"), None);
    let base_new = table.add_constructor(base, &[]);
    let derived = table.add_class(interner.intern("Derived"), Some(base));
    let derived_new = table.add_constructor(derived, &[]);
    World {
        interner,
        table,
        main_class,
        main,
        value,
        check,
        point,
        point_new,
        derived_new,
        derived,
        base_new,
    }
}

fn body(code: Command) -> Body {
    Body { locals: 4, code }
}

fn int_local(slot: u32) -> Expr {
    Expr::local(slot, Ty::Int)
}

fn lt(lhs: Expr, rhs: Expr) -> Expr {
    Expr::compare(Cmp::Lt, Ty::Int, lhs, rhs)
}

fn assign(slot: u32, value: Expr) -> Command {
    Command::Assign {
        slot,
        ty: Ty::Int,
        value,
    }
}

fn load(slot: u32) -> Instruction {
    Instruction::from(SeqOp::Load { slot, ty: Ty::Int })
}

fn store(slot: u32) -> Instruction {
    Instruction::from(SeqOp::Store { slot, ty: Ty::Int })
}

fn int(v: i64) -> Instruction {
    Instruction::from(SeqOp::Const(Literal::Int(v)))
}

fn test_of(cmp: Cmp) -> Instruction {
    Instruction::from(Condition::new(cmp, Ty::Int))
}

fn ret_void() -> Instruction {
    Instruction::from(FinalOp::Return { ty: Ty::Void })
}

fn body_of(program: &Program, block: BlockId) -> Vec<Instruction> {
    program.cfg().block(block).body().iter().cloned().collect()
}

// ── Straight-line code ──────────────────────────────────────────────

#[test]
fn straight_line_code_builds_a_single_block() {
    let w = world();
    let mut program = Program::new(w.main);
    let code = assign(
        3,
        Expr::arith(ArithOp::Add, Ty::Int, int_local(1), int_local(2)),
    );

    let entry = lower_body(&mut program, &w.table, w.main, &body(code)).unwrap();

    assert_eq!(program.cfg().len(), 1);
    assert_eq!(
        body_of(&program, entry),
        vec![
            load(1),
            load(2),
            Instruction::from(SeqOp::Arith {
                op: ArithOp::Add,
                ty: Ty::Int
            }),
            store(3),
            ret_void(),
        ]
    );
    assert_eq!(program.code(w.main), Some(entry));
}

#[test]
fn expression_statements_pop_their_value() {
    let w = world();
    let mut program = Program::new(w.main);
    let code = Command::Expr(Expr::call(
        Expr::local(0, Ty::Class(w.main_class)),
        w.main_class,
        w.value,
        vec![],
    ));

    let entry = lower_body(&mut program, &w.table, w.main, &body(code)).unwrap();

    let opcodes: Vec<Opcode> = body_of(&program, entry).iter().map(Instruction::opcode).collect();
    assert_eq!(
        opcodes,
        vec![
            Opcode::Load,
            Opcode::Call(kit_cfg::CallKind::Virtual),
            Opcode::Pop,
            Opcode::Return
        ]
    );
}

#[test]
fn object_construction_allocates_then_initialises() {
    let w = world();
    let mut program = Program::new(w.main);
    let code = Command::Assign {
        slot: 1,
        ty: Ty::Class(w.point),
        value: Expr::New {
            class: w.point,
            constructor: w.point_new,
            args: vec![],
        },
    };

    let entry = lower_body(&mut program, &w.table, w.main, &body(code)).unwrap();

    assert_eq!(
        body_of(&program, entry),
        vec![
            Instruction::from(SeqOp::New { class: w.point }),
            Instruction::from(SeqOp::Dup {
                ty: Ty::Class(w.point)
            }),
            Instruction::from(Call::constructor(&w.table, w.point_new)),
            Instruction::from(SeqOp::Store {
                slot: 1,
                ty: Ty::Class(w.point)
            }),
            ret_void(),
        ]
    );
}

// ── Control flow ────────────────────────────────────────────────────

#[test]
fn if_else_arms_meet_at_one_continuation() {
    let w = world();
    let mut program = Program::new(w.main);
    let code = Command::if_else(
        lt(int_local(1), int_local(2)),
        assign(3, Expr::int(1)),
        assign(3, Expr::int(2)),
    );

    let entry = lower_body(&mut program, &w.table, w.main, &body(code)).unwrap();

    let cfg = program.cfg();
    assert_eq!(
        body_of(&program, entry),
        vec![load(1), load(2), Instruction::NOP]
    );
    let arms = cfg.block(entry).successors().to_vec();
    assert_eq!(arms.len(), 2);
    assert_eq!(
        body_of(&program, arms[0]),
        vec![test_of(Cmp::Lt), int(1), store(3)]
    );
    assert_eq!(
        body_of(&program, arms[1]),
        vec![test_of(Cmp::Ge), int(2), store(3)]
    );
    let join = cfg.block(arms[0]).successors()[0];
    assert_eq!(cfg.block(arms[1]).successors(), &[join]);
    assert_eq!(body_of(&program, join), vec![ret_void()]);

    program.clean_up().unwrap();
    assert!(verify_clean(&program).is_empty());
}

#[test]
fn if_without_else_tests_the_shared_continuation_separately() {
    let w = world();
    let mut program = Program::new(w.main);
    let code = Command::if_else(lt(int_local(1), int_local(2)), Command::Skip, Command::Skip);

    let entry = lower_body(&mut program, &w.table, w.main, &body(code)).unwrap();

    let arms = program.cfg().block(entry).successors().to_vec();
    assert_eq!(body_of(&program, arms[0]), vec![test_of(Cmp::Lt)]);
    assert_eq!(body_of(&program, arms[1]), vec![test_of(Cmp::Ge)]);
    program.clean_up().unwrap();
    assert!(verify_clean(&program).is_empty());
}

#[test]
fn while_loop_keeps_its_pivot() {
    let w = world();
    let mut program = Program::new(w.main);
    let code = Command::Seq(vec![
        assign(1, Expr::int(0)),
        Command::while_loop(
            lt(int_local(1), int_local(2)),
            assign(
                1,
                Expr::arith(ArithOp::Add, Ty::Int, int_local(1), Expr::int(1)),
            ),
        ),
    ]);

    let entry = lower_body(&mut program, &w.table, w.main, &body(code)).unwrap();
    program.clean_up().unwrap();

    let cfg = program.cfg();
    assert_eq!(body_of(&program, entry), vec![int(0), store(1)]);
    let &[pivot] = cfg.block(entry).successors() else {
        panic!("entry should fall into the loop head");
    };
    assert!(cfg.block(pivot).is_live());
    assert!(!cfg.block(pivot).is_mergeable());
    // Entered from before the loop and from the end of the loop body.
    assert_eq!(cfg.block(pivot).num_predecessors(), 2);
    let arms = cfg.block(pivot).successors().to_vec();
    assert_eq!(arms.len(), 2);
    assert_eq!(cfg.block(arms[0]).successors(), &[pivot]);
    assert_eq!(
        body_of(&program, arms[1]),
        vec![test_of(Cmp::Ge), ret_void()]
    );
    assert!(verify_clean(&program).is_empty());
}

#[test]
fn short_circuit_and_shares_the_failure_target() {
    let w = world();
    let mut program = Program::new(w.main);
    let code = Command::if_else(
        Expr::and(lt(int_local(0), int_local(1)), lt(int_local(2), int_local(3))),
        assign(1, Expr::int(1)),
        Command::Skip,
    );

    lower_body(&mut program, &w.table, w.main, &body(code)).unwrap();
    program.clean_up().unwrap();

    let stats = program.stats();
    assert_eq!(stats.count(Opcode::Branch(Cmp::Lt)), 2);
    assert_eq!(stats.count(Opcode::Branch(Cmp::Ge)), 2);
    assert_eq!(stats.count(Opcode::Return), 1);
    assert!(verify_clean(&program).is_empty());
}

#[test]
fn short_circuit_or_shares_the_success_target() {
    let w = world();
    let mut program = Program::new(w.main);
    let code = Command::if_else(
        Expr::or(lt(int_local(0), int_local(1)), lt(int_local(2), int_local(3))),
        assign(1, Expr::int(1)),
        assign(1, Expr::int(2)),
    );

    lower_body(&mut program, &w.table, w.main, &body(code)).unwrap();
    program.clean_up().unwrap();

    let stats = program.stats();
    assert_eq!(stats.count(Opcode::Branch(Cmp::Lt)), 2);
    assert_eq!(stats.count(Opcode::Branch(Cmp::Ge)), 2);
    // Each arm's code is emitted once.
    assert_eq!(stats.count(Opcode::Store), 2);
    assert!(verify_clean(&program).is_empty());
}

#[test]
fn negation_swaps_the_targets() {
    let w = world();
    let mut program = Program::new(w.main);
    let code = Command::if_else(
        Expr::not(lt(int_local(1), int_local(2))),
        assign(3, Expr::int(1)),
        assign(3, Expr::int(2)),
    );

    let entry = lower_body(&mut program, &w.table, w.main, &body(code)).unwrap();

    let arms = program.cfg().block(entry).successors().to_vec();
    // The `lt` arm now runs the else branch.
    assert_eq!(
        body_of(&program, arms[0]),
        vec![test_of(Cmp::Lt), int(2), store(3)]
    );
    assert_eq!(
        body_of(&program, arms[1]),
        vec![test_of(Cmp::Ge), int(1), store(3)]
    );
}

#[test]
fn boolean_values_are_materialised() {
    let w = world();
    let mut program = Program::new(w.main);
    let code = Command::Assign {
        slot: 3,
        ty: Ty::Bool,
        value: lt(int_local(1), int_local(2)),
    };

    let entry = lower_body(&mut program, &w.table, w.main, &body(code)).unwrap();

    let cfg = program.cfg();
    let arms = cfg.block(entry).successors().to_vec();
    let bool_const = |v| Instruction::from(SeqOp::Const(Literal::Bool(v)));
    assert_eq!(
        body_of(&program, arms[0]),
        vec![test_of(Cmp::Lt), bool_const(true)]
    );
    assert_eq!(
        body_of(&program, arms[1]),
        vec![test_of(Cmp::Ge), bool_const(false)]
    );
    let store = cfg.block(arms[0]).successors()[0];
    assert_eq!(cfg.block(store).num_predecessors(), 2);
    assert_eq!(
        body_of(&program, store),
        vec![
            Instruction::from(SeqOp::Store {
                slot: 3,
                ty: Ty::Bool
            }),
            ret_void()
        ]
    );
}

#[test]
fn boolean_locals_are_tested_with_if_true() {
    let w = world();
    let mut program = Program::new(w.main);
    let code = Command::if_else(
        Expr::local(1, Ty::Bool),
        assign(2, Expr::int(1)),
        Command::Skip,
    );

    let entry = lower_body(&mut program, &w.table, w.main, &body(code)).unwrap();

    let arms = program.cfg().block(entry).successors().to_vec();
    assert_eq!(
        body_of(&program, arms[0])[0],
        Instruction::from(Condition::new(Cmp::IfTrue, Ty::Bool))
    );
    assert_eq!(
        body_of(&program, arms[1])[0],
        Instruction::from(Condition::new(Cmp::IfFalse, Ty::Bool))
    );
}

// ── Returns and dead code ───────────────────────────────────────────

#[test]
fn code_after_return_is_discarded() {
    let w = world();
    let mut program = Program::new(w.main);
    let code = Command::Seq(vec![Command::Return(None), assign(1, Expr::int(1))]);

    let entry = lower_body(&mut program, &w.table, w.main, &body(code)).unwrap();

    assert_eq!(body_of(&program, entry), vec![ret_void()]);
    let dead = BlockId::new(0);
    assert_ne!(dead, entry);
    assert_eq!(program.cfg().block(dead).state(), BlockState::Unlinked);
}

#[test]
fn value_methods_return_their_value() {
    let w = world();
    let mut program = Program::new(w.value);
    let code = Command::Return(Some(Expr::int(42)));

    let entry = lower_body(&mut program, &w.table, w.value, &body(code)).unwrap();

    assert_eq!(
        body_of(&program, entry),
        vec![int(42), Instruction::from(FinalOp::Return { ty: Ty::Int })]
    );
    // The halt block for falling off the end is unreachable.
    assert_eq!(program.cfg().block(BlockId::new(0)).state(), BlockState::Unlinked);
}

// ── Tests, asserts and constructors ─────────────────────────────────

#[test]
fn tests_report_the_failing_assert() {
    let w = world();
    let mut program = Program::new(w.check);
    let position = w.interner.intern("check.kit:3");
    let code = Command::Assert {
        cond: lt(int_local(1), int_local(2)),
        position,
    };

    let entry = lower_body(&mut program, &w.table, w.check, &body(code)).unwrap();

    let ret_str = Instruction::from(FinalOp::Return { ty: Ty::Str });
    let cfg = program.cfg();
    let arms = cfg.block(entry).successors().to_vec();
    // The code after an assert is never extended by its test.
    assert_eq!(body_of(&program, arms[0]), vec![test_of(Cmp::Lt)]);
    let rest = cfg.block(arms[0]).successors()[0];
    assert!(!cfg.block(rest).is_mergeable());
    assert_eq!(
        body_of(&program, rest),
        vec![
            Instruction::from(SeqOp::NewString { value: Name::EMPTY }),
            ret_str.clone(),
        ]
    );
    assert_eq!(
        body_of(&program, arms[1]),
        vec![
            test_of(Cmp::Ge),
            Instruction::from(SeqOp::NewString { value: position }),
            ret_str,
        ]
    );
}

#[test]
fn constructors_call_the_super_constructor_first() {
    let w = world();
    let mut program = Program::new(w.derived_new);

    let entry = lower_body(&mut program, &w.table, w.derived_new, &body(Command::Skip)).unwrap();

    assert_eq!(
        body_of(&program, entry),
        vec![
            Instruction::from(SeqOp::Load {
                slot: 0,
                ty: Ty::Class(w.derived)
            }),
            Instruction::from(Call::constructor(&w.table, w.base_new)),
            ret_void(),
        ]
    );
}

#[test]
fn root_constructors_have_no_super_call() {
    let w = world();
    let mut program = Program::new(w.point_new);

    let entry = lower_body(&mut program, &w.table, w.point_new, &body(Command::Skip)).unwrap();

    assert_eq!(body_of(&program, entry), vec![ret_void()]);
}

// ── Errors ──────────────────────────────────────────────────────────

#[test]
fn unknown_locals_are_rejected() {
    let w = world();
    let mut program = Program::new(w.main);
    let code = assign(9, Expr::int(1));

    assert_eq!(
        lower_body(&mut program, &w.table, w.main, &body(code)),
        Err(LowerError::UnknownLocal {
            sig: w.main,
            slot: 9,
            locals: 4
        })
    );
}

#[test]
fn unknown_call_targets_are_rejected() {
    let w = world();
    let mut program = Program::new(w.main);
    let bogus = SigId::new(999);
    let code = Command::Expr(Expr::call(
        Expr::local(0, Ty::Class(w.main_class)),
        w.main_class,
        bogus,
        vec![],
    ));

    assert_eq!(
        lower_body(&mut program, &w.table, w.main, &body(code)),
        Err(LowerError::UnknownSignature {
            sig: w.main,
            target: bogus
        })
    );
}

#[test]
fn lowering_a_signature_twice_is_a_graph_error() {
    let w = world();
    let mut program = Program::new(w.main);
    lower_body(&mut program, &w.table, w.main, &body(Command::Skip)).unwrap();

    assert_eq!(
        lower_body(&mut program, &w.table, w.main, &body(Command::Skip)),
        Err(LowerError::Graph {
            sig: w.main,
            source: CfgError::CodeAlreadySet(w.main)
        })
    );
}
