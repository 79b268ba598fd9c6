//! Compilation results.

use kit_cfg::{CleanupStats, Program, UsageStats};
use kit_types::{ClassId, SigId};

/// A cleaned-up program, ready for the encoder.
#[derive(Debug)]
pub struct Compiled {
    pub program: Program,
    /// Live signatures in the order they are emitted.
    pub order: Vec<SigId>,
    pub cleanup: CleanupStats,
    /// One plan per class with live tests. Empty unless tests were included.
    pub test_plans: Vec<TestPlan>,
}

impl Compiled {
    /// Opcode counts over the emitted code.
    pub fn stats(&self) -> &UsageStats {
        self.program.stats()
    }

    /// Graphviz rendering of the code of `sig`, if it was emitted.
    pub fn to_dot(&self, sig: SigId) -> Option<String> {
        if self.program.is_live(sig) {
            kit_cfg::to_dot(&self.program, sig)
        } else {
            None
        }
    }
}

/// What a test runner executes for one class: for each test, a fresh
/// instance from the argument-free constructor, then every fixture, then
/// the test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestPlan {
    pub class: ClassId,
    /// `None` if the class declares no argument-free constructor with a
    /// body.
    pub constructor: Option<SigId>,
    /// Inherited fixtures first, then the class's own.
    pub fixtures: Vec<SigId>,
    pub tests: Vec<SigId>,
}
