//! Scanner - filtered directory walk plus a parallel extraction pool
//!
//! The file list is collected up front, then a fixed set of workers pulls
//! paths from a channel, extracts facts and reports back to the single
//! coordinator, which is the only writer of the [`FactStore`]. The scope
//! join is the barrier before any resolution starts.

use crate::adapter::LanguageExtractor;
use crate::filter::IgnoreFilter;
use crate::store::FactStore;
use crate::ui::ScanProgress;
use crate::{Error, Result, ScanMessage};
use crossbeam::channel;
use ignore::WalkBuilder;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Extraction walks the syntax tree recursively; workers get room for the
/// deepest tree the extractor accepts.
const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// A file that could not be turned into facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    pub file_key: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct ScanReport {
    pub store: FactStore,
    pub failures: Vec<ScanFailure>,
    pub elapsed: Duration,
}

pub struct Scanner<'a> {
    root: PathBuf,
    extractor: &'a dyn LanguageExtractor,
    filter: Arc<IgnoreFilter>,
    threads: usize,
    show_progress: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(root: impl Into<PathBuf>, extractor: &'a dyn LanguageExtractor, filter: IgnoreFilter) -> Self {
        Self {
            root: root.into(),
            extractor,
            filter: Arc::new(filter),
            threads: 1,
            show_progress: false,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every file under the root the extractor can handle, sorted.
    pub fn collect_files(&self) -> Vec<PathBuf> {
        let filter = Arc::clone(&self.filter);
        let mut files: Vec<PathBuf> = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
                !filter.is_ignored(entry.path(), is_dir)
            })
            .build()
            .filter_map(|result| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|entry| entry.into_path())
            .filter(|path| self.extractor.can_handle(path))
            .collect();

        files.sort();
        files
    }

    pub fn scan(&self) -> Result<ScanReport> {
        if !self.root.is_dir() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("scan root {} is not a readable directory", self.root.display()),
            )));
        }

        let started = Instant::now();
        let files = self.collect_files();
        let workers = self.threads.min(files.len()).max(1);
        debug!(
            "scanning {} {} files under {} with {} workers",
            files.len(),
            self.extractor.language_name(),
            self.root.display(),
            workers
        );

        let progress = ScanProgress::new(files.len(), self.show_progress);
        let (job_tx, job_rx) = channel::unbounded::<PathBuf>();
        let (msg_tx, msg_rx) = channel::unbounded::<ScanMessage>();

        for path in files {
            let _ = job_tx.send(path);
        }
        drop(job_tx);

        let mut store = FactStore::new();
        let mut failures = Vec::new();

        crossbeam::scope(|s| -> Result<()> {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let msg_tx = msg_tx.clone();
                s.builder().stack_size(WORKER_STACK_SIZE).spawn(move |_| {
                    for path in job_rx.iter() {
                        if msg_tx.send(self.extract_file(&path)).is_err() {
                            break;
                        }
                    }
                })?;
            }
            drop(msg_tx);

            for message in msg_rx.iter() {
                match message {
                    ScanMessage::Extracted { file_key, facts } => {
                        progress.advance(&file_key);
                        store.insert(facts);
                    }
                    ScanMessage::Failed { file_key, reason } => {
                        progress.advance(&file_key);
                        warn!("skipping {}: {}", file_key, reason);
                        failures.push(ScanFailure { file_key, reason });
                    }
                }
            }
            Ok(())
        })
        .map_err(|_| Error::Adapter("scan worker panicked".to_string()))??;

        failures.sort_by(|a, b| a.file_key.cmp(&b.file_key));
        let elapsed = started.elapsed();
        progress.finish(store.len(), failures.len(), elapsed);

        Ok(ScanReport {
            store,
            failures,
            elapsed,
        })
    }

    fn file_key(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn extract_file(&self, path: &Path) -> ScanMessage {
        let file_key = self.file_key(path);
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                return ScanMessage::Failed {
                    file_key,
                    reason: e.to_string(),
                };
            }
        };

        match self.extractor.extract(&file_key, &source) {
            Ok(facts) => ScanMessage::Extracted { file_key, facts },
            Err(e) => ScanMessage::Failed {
                file_key,
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::PythonExtractor;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_collect_files_skips_excluded_dirs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "app/main.py", "x = 1\n");
        write(root, "app/api/users.py", "y = 2\n");
        write(root, ".venv/lib/site.py", "z = 3\n");
        write(root, "app/__pycache__/main.py", "z = 3\n");
        write(root, "node_modules/pkg/index.py", "z = 3\n");
        write(root, "README.md", "# readme\n");

        let extractor = PythonExtractor::new();
        let scanner = Scanner::new(root, &extractor, IgnoreFilter::new(root, &[], false));
        let keys: Vec<String> = scanner.collect_files().iter().map(|p| scanner.file_key(p)).collect();

        assert_eq!(keys, vec!["app/api/users.py", "app/main.py"]);
    }

    #[test]
    fn test_scan_populates_store_and_reports_failures() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "app.py",
            "from fastapi import FastAPI\nfrom users import router\napp = FastAPI()\napp.include_router(router)\n",
        );
        write(
            root,
            "users.py",
            "from fastapi import APIRouter\nrouter = APIRouter(prefix=\"/users\")\n\n@router.get(\"/\")\ndef list_users():\n    return []\n",
        );
        write(root, "broken.py", "def oops(:\n    pass\n");

        let extractor = PythonExtractor::new();
        let report = Scanner::new(root, &extractor, IgnoreFilter::new(root, &[], false))
            .with_threads(4)
            .scan()
            .unwrap();

        let keys: Vec<&str> = report.store.file_keys().collect();
        assert_eq!(keys, vec!["app.py", "users.py"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file_key, "broken.py");
        assert_eq!(report.store.stats().routes, 1);
    }

    #[test]
    fn test_extra_excludes_apply() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "app/main.py", "x = 1\n");
        write(root, "migrations/001.py", "x = 1\n");

        let extractor = PythonExtractor::new();
        let filter = IgnoreFilter::new(root, &["migrations/".to_string()], false);
        let report = Scanner::new(root, &extractor, filter).scan().unwrap();

        assert!(report.store.contains("app/main.py"));
        assert!(!report.store.contains("migrations/001.py"));
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let extractor = PythonExtractor::new();
        let result = Scanner::new(&missing, &extractor, IgnoreFilter::new(&missing, &[], false)).scan();

        match result {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("expected io error, got {:?}", other.map(|r| r.store.len())),
        }
    }
}
