//! Lowering errors.
//!
//! Every variant names the signature whose body was being lowered.

use kit_cfg::CfgError;
use kit_types::SigId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LowerError {
    /// The IR rejected a graph edit: a lowering bug.
    #[error("malformed graph while lowering {sig}: {source}")]
    Graph {
        sig: SigId,
        #[source]
        source: CfgError,
    },

    #[error("{sig} refers to {target}, which the class table does not declare")]
    UnknownSignature { sig: SigId, target: SigId },

    #[error("{sig} uses local slot {slot}, but declares only {locals} locals")]
    UnknownLocal { sig: SigId, slot: u32, locals: u32 },
}
