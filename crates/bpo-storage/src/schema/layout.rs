//! The bpo table layout as the running code expects it.
//!
//! Only append here together with a catalog step in `migrations`. A `since(n)`
//! item must be created by the step that reaches version `n`, and new columns
//! go after the existing ones because `ADD COLUMN` appends.

use std::fmt;
use std::str::FromStr;

use super::{ColumnDeclaration as Col, ColumnType, IndexDeclaration as Idx, TableDeclaration};

/// Build state of a package, persisted by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageStatus {
    Queued,
    Building,
    Built,
    Published,
    Failed,
}

impl PackageStatus {
    pub const ALL: [PackageStatus; 5] = [
        Self::Queued,
        Self::Building,
        Self::Built,
        Self::Published,
        Self::Failed,
    ];

    pub const NAMES: &'static [&'static str] =
        &["queued", "building", "built", "published", "failed"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Building => "building",
            Self::Built => "built",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }

    /// Whether dependents may start building against this package.
    pub fn is_built(&self) -> bool {
        matches!(self, Self::Built | Self::Published)
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the persisted name, i.e. one of the values the `status` column's
/// `CHECK` constraint allows.
impl FromStr for PackageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown package status: {s}"))
    }
}

/// Longest status name; the column is sized to it.
const STATUS_WIDTH: u16 = 9;

pub fn package() -> TableDeclaration {
    TableDeclaration::new("package")
        .column(Col::new("id", ColumnType::Integer).primary_key())
        .column(Col::new("date", ColumnType::DateTime).default("CURRENT_TIMESTAMP"))
        .column(Col::new("last_update", ColumnType::DateTime))
        .column(Col::new("arch", ColumnType::Text))
        .column(Col::new("branch", ColumnType::Text))
        .column(Col::new("pkgname", ColumnType::Text))
        .column(Col::new("status", ColumnType::Varchar(STATUS_WIDTH)).one_of(PackageStatus::NAMES))
        .column(Col::new("job_id", ColumnType::Integer).unique())
        // Latest state only; history lives in git.
        .column(Col::new("version", ColumnType::Text))
        .column(Col::new("repo", ColumnType::Text))
        .index(Idx::new("pkgname-arch-branch", &["pkgname", "arch", "branch"]).unique())
        .index(Idx::new("job_id", &["job_id"]))
        .index(Idx::new("arch-branch", &["arch", "branch"]).since(1))
        .index(Idx::new("status", &["status"]).since(3))
}

pub fn log() -> TableDeclaration {
    TableDeclaration::new("log")
        .column(Col::new("id", ColumnType::Integer).primary_key())
        .column(Col::new("date", ColumnType::DateTime).default("CURRENT_TIMESTAMP"))
        .column(Col::new("action", ColumnType::Text))
        .column(Col::new("payload", ColumnType::Text))
        .column(Col::new("arch", ColumnType::Text))
        .column(Col::new("branch", ColumnType::Text))
        .column(Col::new("pkgname", ColumnType::Text))
        .column(Col::new("version", ColumnType::Text))
        .column(Col::new("job_id", ColumnType::Integer))
        .column(Col::new("commit", ColumnType::Text).since(2))
}

/// package.depends <-> package.required_by, n:n.
pub fn package_dependency() -> TableDeclaration {
    TableDeclaration::new("package_dependency")
        .column(
            Col::new("package_id", ColumnType::Integer)
                .not_null()
                .references("package", "id"),
        )
        .column(
            Col::new("dependency_id", ColumnType::Integer)
                .not_null()
                .references("package", "id"),
        )
        .primary_key(&["package_id", "dependency_id"])
}

/// Every table, in creation order (referenced tables first).
pub fn declarations() -> Vec<TableDeclaration> {
    vec![package(), log(), package_dependency()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_round_trip() {
        for status in PackageStatus::ALL {
            assert_eq!(status.as_str().parse::<PackageStatus>().unwrap(), status);
        }
        assert!("unknown".parse::<PackageStatus>().is_err());
        assert_eq!(
            PackageStatus::NAMES,
            PackageStatus::ALL.map(|s| s.as_str()).as_slice()
        );
    }

    #[test]
    fn status_width_fits_every_name() {
        let longest = PackageStatus::NAMES.iter().map(|n| n.len()).max().unwrap();
        assert_eq!(longest, STATUS_WIDTH as usize);
    }

    #[test]
    fn only_built_and_published_satisfy_dependents() {
        let built: Vec<_> = PackageStatus::ALL
            .into_iter()
            .filter(PackageStatus::is_built)
            .collect();
        assert_eq!(built, vec![PackageStatus::Built, PackageStatus::Published]);
    }

    #[test]
    fn table_names_are_unique() {
        let decls = declarations();
        let mut names: Vec<_> = decls.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), decls.len());
    }
}
