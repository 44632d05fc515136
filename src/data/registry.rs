//! Source discovery.
//!
//! A registry answers one question: which sources exist right now, and in what
//! override order. Discovery never fails; when the data directory cannot be
//! listed the registry degrades to the primary source alone.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AggregatorConfig, SourceDescriptor, SourceFormat};

/// Enumerates performance sources in override-rank order.
///
/// The first descriptor is the primary source (rank 0). Later descriptors
/// override earlier ones during merge.
pub trait SourceRegistry: Send + Sync {
    fn discover(&self) -> Vec<SourceDescriptor>;
}

/// Filesystem registry: `pr_<plant>.json` plus `pr_<plant>_*.{json,csv}`.
///
/// Supplementary files are ranked by file name (lexicographic), which makes the
/// override order independent of directory listing order.
#[derive(Debug, Clone)]
pub struct DirectoryRegistry {
    dir: PathBuf,
    primary: String,
    prefix: String,
}

impl DirectoryRegistry {
    pub fn new(dir: impl Into<PathBuf>, primary: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            primary: primary.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &AggregatorConfig) -> Self {
        Self::new(
            config.data_dir.clone(),
            config.primary_file_name(),
            config.supplementary_prefix(),
        )
    }

    fn is_supplementary(&self, file_name: &str) -> bool {
        if file_name == self.primary || !file_name.starts_with(&self.prefix) {
            return false;
        }
        Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(SourceFormat::from_extension)
            .is_some()
    }

    fn supplementary_names(&self) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if self.is_supplementary(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

impl SourceRegistry for DirectoryRegistry {
    fn discover(&self) -> Vec<SourceDescriptor> {
        let mut sources = vec![SourceDescriptor::file(
            self.primary.clone(),
            0,
            self.dir.join(&self.primary),
        )];

        match self.supplementary_names() {
            Ok(names) => {
                for (i, name) in names.into_iter().enumerate() {
                    let path = self.dir.join(&name);
                    sources.push(SourceDescriptor::file(name, i + 1, path));
                }
            }
            Err(e) => {
                tracing::warn!(
                    dir = %self.dir.display(),
                    error = %e,
                    "could not list data directory; using primary source only"
                );
            }
        }

        sources
    }
}

/// Explicitly declared sources, in the order given.
///
/// Ranks are reassigned from list position so the declaration order *is* the
/// override order.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    sources: Vec<SourceDescriptor>,
}

impl StaticRegistry {
    pub fn new(sources: impl IntoIterator<Item = SourceDescriptor>) -> Self {
        let sources = sources
            .into_iter()
            .enumerate()
            .map(|(rank, mut s)| {
                s.rank = rank;
                s
            })
            .collect();
        Self { sources }
    }
}

impl SourceRegistry for StaticRegistry {
    fn discover(&self) -> Vec<SourceDescriptor> {
        self.sources.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(sources: &[SourceDescriptor]) -> Vec<&str> {
        sources.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn primary_first_then_supplementary_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "pr_P_2024b.csv",
            "pr_P.json",
            "pr_P_2024a.json",
            "pr_P_notes.txt",
            "pr_Q_2024.json",
            "readme.md",
        ] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        std::fs::create_dir(dir.path().join("pr_P_dir.json")).unwrap();

        let registry = DirectoryRegistry::new(dir.path(), "pr_P.json", "pr_P_");
        let sources = registry.discover();

        assert_eq!(names(&sources), ["pr_P.json", "pr_P_2024a.json", "pr_P_2024b.csv"]);
        assert!(sources[0].is_primary());
        assert_eq!(sources.iter().map(|s| s.rank).collect::<Vec<_>>(), [0, 1, 2]);
    }

    #[test]
    fn unreadable_directory_degrades_to_primary_only() {
        let registry = DirectoryRegistry::new("/definitely/not/a/real/dir", "pr_P.json", "pr_P_");
        let sources = registry.discover();
        assert_eq!(names(&sources), ["pr_P.json"]);
    }

    #[test]
    fn static_registry_ranks_by_declaration_order() {
        let registry = StaticRegistry::new([
            SourceDescriptor::inline("base", 7, SourceFormat::Json, "{}"),
            SourceDescriptor::inline("late", 3, SourceFormat::Csv, "date,asset_id,value\n"),
        ]);
        let sources = registry.discover();
        assert_eq!(names(&sources), ["base", "late"]);
        assert_eq!(sources[1].rank, 1);
    }
}
