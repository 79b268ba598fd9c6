//! Core pipeline: lower → clean up → verify.
//!
//! Portable (no IO). Bodies come in already type-checked; results come out
//! as a [`Compiled`] program.

use kit_cfg::{verify_clean, Program};
use kit_lower::{lower_body, Body};
use kit_types::{ClassTable, CodeKind, SigId};

use crate::error::CompileError;
use crate::output::{Compiled, TestPlan};

/// Configuration for a compilation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileConfig {
    /// Emit tests and fixtures even when the entry point never calls them.
    pub include_tests: bool,
    /// Check the cleaned-up graph and fail on any problem.
    pub verify: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            include_tests: false,
            verify: cfg!(debug_assertions),
        }
    }
}

/// Lower every body, clean the program up from `entry`, and return the
/// emitted signatures.
///
/// Signatures without a body are fine as long as nothing live reaches
/// them; the entry itself must have one.
pub fn compile(
    table: &ClassTable,
    bodies: &[(SigId, Body)],
    entry: SigId,
    config: &CompileConfig,
) -> Result<Compiled, CompileError> {
    if !bodies.iter().any(|(sig, _)| *sig == entry) {
        return Err(CompileError::MissingEntry(entry));
    }

    let mut program = Program::new(entry);
    for (sig, body) in bodies {
        lower_body(&mut program, table, *sig, body)?;
    }

    if config.include_tests {
        root_test_code(table, &mut program);
    }

    let cleanup = program.clean_up().map_err(CompileError::Cleanup)?;

    if config.verify {
        let problems = verify_clean(&program);
        if !problems.is_empty() {
            for problem in &problems {
                tracing::error!(%problem, "graph verification");
            }
            return Err(CompileError::Verify(problems));
        }
    }

    let test_plans = if config.include_tests {
        test_plans(table, &program)
    } else {
        Vec::new()
    };
    let order = program.emission_order();
    tracing::debug!(
        signatures = order.len(),
        blocks = program.cfg().len(),
        instructions = program.stats().total(),
        "compiled"
    );

    Ok(Compiled {
        program,
        order,
        cleanup,
        test_plans,
    })
}

/// Make every test and fixture a cleanup root, along with the
/// argument-free constructor a test runner instantiates each test class
/// with.
fn root_test_code(table: &ClassTable, program: &mut Program) {
    let mut roots: Vec<SigId> = table
        .signature_ids()
        .filter(|&sig| matches!(table.signature(sig).kind, CodeKind::Test | CodeKind::Fixture))
        .collect();
    roots.extend(
        table
            .class_ids()
            .filter(|&class| !table.tests_of(class).is_empty())
            .filter_map(|class| table.constructor_lookup(class, &[])),
    );
    for sig in roots {
        if program.code(sig).is_some() {
            program.add_root(sig);
        } else {
            tracing::debug!(sig = sig.raw(), "skipping test code without a body");
        }
    }
}

/// Per-class test plans over the live tests and fixtures.
fn test_plans(table: &ClassTable, program: &Program) -> Vec<TestPlan> {
    table
        .class_ids()
        .filter_map(|class| {
            let tests: Vec<SigId> = table
                .tests_of(class)
                .iter()
                .copied()
                .filter(|&sig| program.is_live(sig))
                .collect();
            if tests.is_empty() {
                return None;
            }
            let fixtures = table
                .fixtures_lookup(class)
                .into_iter()
                .filter(|&sig| program.is_live(sig))
                .collect();
            let constructor = table
                .constructor_lookup(class, &[])
                .filter(|&sig| program.is_live(sig));
            Some(TestPlan {
                class,
                constructor,
                fixtures,
                tests,
            })
        })
        .collect()
}
