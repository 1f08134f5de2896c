//! Archive ledger: which video ids are already mirrored, and where.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// On-disk record of finished downloads, one `id<TAB>path` line per video,
/// so a re-run of the same channel skips work instead of re-downloading.
#[derive(Debug, Clone, Default)]
pub struct ArchiveLedger {
    entries: BTreeMap<String, PathBuf>,
}

impl ArchiveLedger {
    /// Default ledger file under the XDG state dir.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("ytmirror")?;
        Ok(xdg_dirs
            .get_state_home()
            .join("ytmirror")
            .join("archive.tsv"))
    }

    /// Load the ledger at `path`. A missing file is an empty ledger;
    /// malformed lines are skipped with a warning.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("read archive ledger: {}", path.display()))
            }
        };
        let mut entries = BTreeMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.split_once('\t') {
                Some((id, target)) if !id.is_empty() => {
                    entries.insert(id.to_string(), PathBuf::from(target));
                }
                _ => tracing::warn!(
                    path = %path.display(),
                    line = lineno + 1,
                    "skipping malformed ledger line"
                ),
            }
        }
        Ok(Self { entries })
    }

    /// Save to `path` (creates parent dir if needed).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let mut text = String::new();
        for (id, target) in &self.entries {
            text.push_str(id);
            text.push('\t');
            text.push_str(&target.to_string_lossy());
            text.push('\n');
        }
        std::fs::write(path, text)
            .with_context(|| format!("write archive ledger: {}", path.display()))?;
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Path> {
        self.entries.get(id).map(PathBuf::as_path)
    }

    pub fn insert(&mut self, id: impl Into<String>, target: impl Into<PathBuf>) {
        self.entries.insert(id.into(), target.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(id, p)| (id.as_str(), p.as_path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ArchiveLedger::load(&dir.path().join("absent.tsv")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("archive.tsv");

        let mut ledger = ArchiveLedger::default();
        ledger.insert("b-vid", "/media/yt/b.mp4");
        ledger.insert("a-vid", "/media/yt/a.mp4");
        ledger.save(&path).unwrap();

        let read = ArchiveLedger::load(&path).unwrap();
        assert_eq!(read.len(), 2);
        assert!(read.contains("a-vid"));
        assert_eq!(read.get("b-vid"), Some(Path::new("/media/yt/b.mp4")));
    }

    #[test]
    fn iteration_is_id_ordered() {
        let mut ledger = ArchiveLedger::default();
        ledger.insert("zz", "/tmp/z.mp4");
        ledger.insert("aa", "/tmp/a.mp4");
        let ids: Vec<&str> = ledger.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["aa", "zz"]);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.tsv");
        std::fs::write(&path, "good\t/tmp/good.mp4\nno-tab-here\n\t/tmp/no-id.mp4\n\n").unwrap();

        let ledger = ArchiveLedger::load(&path).unwrap();
        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains("good"));
    }

    #[test]
    fn insert_replaces_existing_target() {
        let mut ledger = ArchiveLedger::default();
        ledger.insert("vid", "/tmp/old.mp4");
        ledger.insert("vid", "/tmp/new.mp4");
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("vid"), Some(Path::new("/tmp/new.mp4")));
    }
}
