use crate::error::{DiscoveryError, Result};
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// Scanner for finding candidate source files in a project
pub struct FileScanner {
    root: PathBuf,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Walk the root (.gitignore aware) and return source files in sorted order
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Err(DiscoveryError::invalid_path(
                &self.root,
                "directory does not exist",
            ));
        }
        if !self.root.is_dir() {
            return Err(DiscoveryError::invalid_path(&self.root, "not a directory"));
        }

        let mut files = Vec::new();

        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true) // dot files and dot directories are never candidates
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true);
        builder.filter_entry(move |entry| !Self::is_ignored_scope(entry.path(), &root));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > MAX_FILE_SIZE_BYTES {
                            log::debug!(
                                "Skipping large file {} ({} bytes > {})",
                                path.display(),
                                meta.len(),
                                MAX_FILE_SIZE_BYTES
                            );
                            continue;
                        }
                    }

                    if Self::is_test_file(path) {
                        log::debug!("Skipping test file {}", path.display());
                        continue;
                    }

                    if Self::is_noise_file(path) {
                        log::debug!("Skipping config artifact {}", path.display());
                        continue;
                    }

                    if !Self::is_source_file(path) {
                        continue;
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!(
            "Found {} source files under {}",
            files.len(),
            self.root.display()
        );
        Ok(files)
    }

    /// Check if file has a recognized source extension
    fn is_source_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
    }

    /// `test_x.py`, `x_test.go`, `x.test.ts`, `x.spec.js`, `conftest.py`
    fn is_test_file(path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let lowered = name.to_lowercase();
        if lowered == "conftest.py" {
            return true;
        }

        let stem = lowered
            .rsplit_once('.')
            .map_or(lowered.as_str(), |(stem, _)| stem);

        stem.starts_with("test_")
            || stem.ends_with("_test")
            || stem.ends_with("_tests")
            || stem.ends_with(".test")
            || stem.ends_with(".spec")
    }

    fn is_ignored_scope(path: &Path, root: &Path) -> bool {
        if let Ok(relative) = path.strip_prefix(root) {
            for component in relative.components() {
                if let Component::Normal(name) = component {
                    let lowered = name.to_string_lossy().to_lowercase();
                    if IGNORED_SCOPES.iter().any(|ignored| ignored == &lowered) {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn is_noise_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| {
                NOISE_FILE_NAMES
                    .iter()
                    .any(|candidate| name.eq_ignore_ascii_case(candidate))
            })
    }
}

/// Discover source files under `directory`
pub fn discover(directory: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    FileScanner::new(directory).discover()
}

const IGNORED_SCOPES: &[&str] = &[
    // dependencies
    "node_modules",
    "venv",
    "env",
    "virtualenv",
    "vendor",
    "bower_components",
    "jspm_packages",
    "packages",
    "third_party",
    "third-party",
    // build output
    "target",
    "build",
    "dist",
    "out",
    "output",
    "bin",
    "obj",
    // tests
    "test",
    "tests",
    "spec",
    "specs",
    "testing",
    "__tests__",
    // docs
    "docs",
    "doc",
    "documentation",
    // generated / caches
    "generated",
    "gen",
    "auto-generated",
    "__pycache__",
    "tmp",
    "temp",
    "coverage",
    "htmlcov",
];

const NOISE_FILE_NAMES: &[&str] = &["setup.py", "conf.py", "manage.py", "noxfile.py"];

const MAX_FILE_SIZE_BYTES: u64 = 1_048_576; // 1 MB

#[rustfmt::skip]
const SUPPORTED_EXTENSIONS: &[&str] = &[
    // Python
    "py", "pyx", "pyi",
    // JavaScript / TypeScript
    "js", "jsx", "mjs", "cjs", "ts", "tsx",
    // JVM
    "java", "kt", "kts", "scala", "groovy",
    // C family
    "c", "h", "cpp", "cc", "cxx", "hpp", "hxx", "cs",
    // Others
    "go", "rb", "php", "swift", "rs", "dart", "lua", "elm", "r", "pl", "pm",
    "sh", "bash", "html", "htm", "css",
];
