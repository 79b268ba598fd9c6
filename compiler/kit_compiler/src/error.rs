use kit_cfg::{CfgError, GraphProblem};
use kit_lower::LowerError;
use kit_types::SigId;

/// Why a compilation run stopped.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lower(#[from] LowerError),

    /// No body was supplied for the program's entry signature.
    #[error("entry point {0} has no body")]
    MissingEntry(SigId),

    #[error("cleanup failed: {0}")]
    Cleanup(#[source] CfgError),

    #[error("graph verification found {} problem(s)", .0.len())]
    Verify(Vec<GraphProblem>),
}
