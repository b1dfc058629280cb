use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Directory names never descended into.
pub const EXCLUDED_DIRS: &[&str] = &["__pycache__", "node_modules", "venv", "env"];

pub struct IgnoreFilter {
    inner: Gitignore,
}

impl IgnoreFilter {
    pub fn new(root: &Path, extra_excludes: &[String], respect_gitignore: bool) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        // 1. Project ignore files, only when asked for
        if respect_gitignore {
            builder.add(root.join(".gitignore"));
        }

        // 2. User config excludes
        for pattern in extra_excludes {
            if let Err(e) = builder.add_line(None, pattern) {
                tracing::warn!("ignoring invalid exclude pattern '{}': {}", pattern, e);
            }
        }

        Self {
            inner: builder.build().unwrap_or_else(|_| Gitignore::empty()),
        }
    }

    /// Hidden directories and the fixed denylist, matched by name only.
    pub fn is_excluded_dir_name(name: &str) -> bool {
        name.starts_with('.') || EXCLUDED_DIRS.contains(&name)
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        if is_dir {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if Self::is_excluded_dir_name(name) {
                return true;
            }
        }
        self.inner.matched(path, is_dir).is_ignore()
    }
}
