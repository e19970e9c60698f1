pub mod file;
pub mod playlist;
pub mod user;

/// Outcome of an association change on a join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    Unlinked,
    /// The entity whose collection was being edited does not exist
    OwnerMissing,
    /// The entity being attached does not exist
    TargetMissing,
}
