use xfidelity_schema::{ArchetypeConfig, FileData};

/// What a fact evaluator can see about the current scan step. Kept as a
/// trait (rather than a concrete struct import) so this crate never
/// depends on the engine crate that owns the real implementation
/// (the per-run `Almanac`), avoiding a dependency cycle between the
/// plugin host and the engine that drives it.
pub trait FactContext: Send + Sync {
    /// `None` while evaluating the repo-global pseudo-file pass.
    fn file_data(&self) -> Option<&FileData>;

    fn archetype_config(&self) -> &ArchetypeConfig;

    /// Ad-hoc parameters threaded through from the rule's condition
    /// (`condition.params`), distinct from the archetype/file context.
    fn param(&self, key: &str) -> Option<&serde_json::Value>;
}
