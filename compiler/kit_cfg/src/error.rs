//! Malformed-graph errors.
//!
//! Every variant is a lowering bug, not a property of the source program:
//! a well-formed front end never triggers one. They are still reported as
//! values so the driver can abort the current compilation unit with a
//! diagnostic instead of tearing down the process.

use kit_types::SigId;

use crate::block::BlockId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CfgError {
    #[error("{0} does not exist in this graph")]
    UnknownBlock(BlockId),

    #[error("{0} has been unlinked")]
    Unlinked(BlockId),

    #[error("{block} has been merged into {into}")]
    Merged { block: BlockId, into: BlockId },

    #[error("code for {0} is already set")]
    CodeAlreadySet(SigId),

    #[error("{0} has no code")]
    NoCode(SigId),
}
