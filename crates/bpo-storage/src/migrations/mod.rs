//! Migration catalog: a gapless chain of steps keyed by the version they
//! start from.
//!
//! Steps are append-only. Never edit a step that has shipped; add a new one
//! and bump the matching `since` annotation in `schema::layout`.

pub mod v001_package_arch_branch_index;
pub mod v002_log_commit;
pub mod v003_package_status_index;

use bpo_core::errors::MigrationError;

use crate::version_store::SchemaVersion;

/// One atomic, irreversible schema change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    pub from: SchemaVersion,
    pub name: &'static str,
    pub statements: &'static [&'static str],
}

impl MigrationStep {
    pub const fn new(from: u32, name: &'static str, statements: &'static [&'static str]) -> Self {
        Self {
            from: SchemaVersion::new(from),
            name,
            statements,
        }
    }

    pub const fn to(&self) -> SchemaVersion {
        self.from.next()
    }
}

/// Validated chain of steps: `steps[i].from == i` for every `i`.
#[derive(Debug, Clone)]
pub struct MigrationCatalog {
    steps: Vec<MigrationStep>,
}

impl MigrationCatalog {
    /// Build a catalog, rejecting gaps, duplicates and empty steps.
    pub fn new(mut steps: Vec<MigrationStep>) -> Result<Self, MigrationError> {
        steps.sort_by_key(|s| s.from);

        for (expected, step) in steps.iter().enumerate() {
            let expected = expected as u32;
            let found = step.from.get();
            if found < expected {
                return Err(MigrationError::DuplicateStep { from: found });
            }
            if found > expected {
                return Err(MigrationError::CatalogGap { expected, found });
            }
            if step.statements.is_empty() {
                return Err(MigrationError::EmptyStep { from: found });
            }
        }

        Ok(Self { steps })
    }

    /// The step whose `from` equals `version`, or `None` at the latest version.
    pub fn step_after(&self, version: SchemaVersion) -> Option<&MigrationStep> {
        self.steps.get(version.get() as usize)
    }

    /// Version reached after every step has run.
    pub fn latest(&self) -> SchemaVersion {
        SchemaVersion::new(self.steps.len() as u32)
    }

    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// The bpo catalog.
pub fn catalog() -> Result<MigrationCatalog, MigrationError> {
    MigrationCatalog::new(vec![
        MigrationStep::new(
            0,
            "package: add index arch-branch",
            v001_package_arch_branch_index::MIGRATION_SQL,
        ),
        MigrationStep::new(1, "log: add column commit", v002_log_commit::MIGRATION_SQL),
        MigrationStep::new(
            2,
            "package: add index status",
            v003_package_status_index::MIGRATION_SQL,
        ),
    ])
}
