//! Virtual-call target resolution.
//!
//! A virtual call may reach any override of its static target in any
//! concrete subtype of the receiver's static type. The hierarchy is closed
//! while a program is compiled, so the full set is computed once, when the
//! call instruction is built, and frozen into it. Cleanup never resolves
//! again.

use kit_types::{ClassHierarchy, ClassId, Name, Ty};

use crate::instr::DynamicTargets;

/// Every signature a call of `name(params)` on a `receiver` may run.
///
/// Each concrete subtype of `receiver` (the receiver included, unless it is
/// abstract) contributes what method resolution finds for it, if anything.
/// The result is sorted and free of duplicates; an empty result means no
/// concrete class can answer the call.
pub fn resolve_dynamic_targets<H: ClassHierarchy + ?Sized>(
    hierarchy: &H,
    receiver: ClassId,
    name: Name,
    params: &[Ty],
) -> DynamicTargets {
    let mut targets = DynamicTargets::new();
    for class in hierarchy.subtypes_of(receiver) {
        let Some(sig) = hierarchy.resolve_method(class, name, params) else {
            continue;
        };
        if let Err(pos) = targets.binary_search(&sig) {
            targets.insert(pos, sig);
        }
    }
    tracing::trace!(
        receiver = receiver.raw(),
        name = name.raw(),
        targets = targets.len(),
        "resolved dynamic targets"
    );
    targets
}

#[cfg(test)]
mod tests;
