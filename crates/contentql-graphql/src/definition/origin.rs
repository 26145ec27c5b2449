//! Resource origins.
//!
//! An origin serves definition resources by path (`/<module>/...`) and
//! reports their modification times.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use tracing::trace;

use super::DefinitionError;

/// Read access to definition resources.
#[async_trait]
pub trait ResourceOrigin: Send + Sync {
    /// Name of this origin (for logging).
    fn name(&self) -> &str;

    async fn has_path(&self, path: &str) -> bool;

    /// Modification time of `path` in milliseconds since the Unix epoch.
    async fn last_modified(&self, path: &str) -> Result<u64, DefinitionError>;

    async fn read_to_string(&self, path: &str) -> Result<String, DefinitionError>;

    /// Every resource path, sorted.
    async fn list(&self) -> Result<Vec<String>, DefinitionError>;

    /// Directory backing this origin, if it lives on the local file system.
    fn local_root(&self) -> Option<&Path> {
        None
    }
}

/// Origin over a directory. Resource `/a/b.graphql` is file `<root>/a/b.graphql`.
#[derive(Debug, Clone)]
pub struct FileSystemOrigin {
    root: PathBuf,
}

impl FileSystemOrigin {
    /// Creates an origin rooted at `root`.
    ///
    /// The root is canonicalized when it exists, so paths reported by file
    /// watchers map back onto resource paths.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a resource path. `..` segments are rejected.
    pub fn file_path(&self, path: &str) -> Result<PathBuf, DefinitionError> {
        let relative = path.trim_start_matches('/');
        if relative.is_empty() || relative.split('/').any(|s| s == ".." || s.is_empty()) {
            return Err(DefinitionError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Resource path of a file below the root.
    pub fn resource_path(&self, file: &Path) -> Option<String> {
        resource_path_under(&self.root, file)
    }
}

/// `/`-separated path of `file` relative to `root`, with a leading `/`.
pub(crate) fn resource_path_under(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let segments: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    if segments.is_empty() {
        return None;
    }
    Some(format!("/{}", segments.join("/")))
}

#[async_trait]
impl ResourceOrigin for FileSystemOrigin {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn has_path(&self, path: &str) -> bool {
        match self.file_path(path) {
            Ok(file) => tokio::fs::metadata(&file)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn last_modified(&self, path: &str) -> Result<u64, DefinitionError> {
        let file = self.file_path(path)?;
        let metadata = tokio::fs::metadata(&file)
            .await
            .map_err(|e| DefinitionError::io(path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| DefinitionError::io(path, e))?;
        let millis = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Ok(millis)
    }

    async fn read_to_string(&self, path: &str) -> Result<String, DefinitionError> {
        let file = self.file_path(path)?;
        tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| DefinitionError::io(path, e))
    }

    async fn list(&self) -> Result<Vec<String>, DefinitionError> {
        let mut paths = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if dir == self.root => {
                    return Err(DefinitionError::io(&self.root.display().to_string(), e));
                }
                Err(e) => {
                    trace!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                    continue;
                }
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| DefinitionError::io(&dir.display().to_string(), e))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| DefinitionError::io(&entry.path().display().to_string(), e))?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if let Some(path) = self.resource_path(&entry.path()) {
                    paths.push(path);
                }
            }
        }

        paths.sort();
        Ok(paths)
    }

    fn local_root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let file = root.join(relative);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, content).unwrap();
    }

    #[tokio::test]
    async fn test_list_and_read() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "tours/graphqls/tours.graphql", "type Tour { name: String }");
        write(dir.path(), "site/graphqls/v1/pages.graphql", "type Page { title: String }");
        write(dir.path(), "site/templates/page.yaml", "title: Page");

        let origin = FileSystemOrigin::new(dir.path());
        let paths = origin.list().await.unwrap();
        assert_eq!(
            paths,
            vec![
                "/site/graphqls/v1/pages.graphql",
                "/site/templates/page.yaml",
                "/tours/graphqls/tours.graphql",
            ]
        );

        assert!(origin.has_path("/tours/graphqls/tours.graphql").await);
        assert!(!origin.has_path("/tours/graphqls/missing.graphql").await);
        assert!(!origin.has_path("/tours/graphqls").await);
        assert_eq!(
            origin
                .read_to_string("/tours/graphqls/tours.graphql")
                .await
                .unwrap(),
            "type Tour { name: String }"
        );
    }

    #[tokio::test]
    async fn test_last_modified() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "tours/graphqls/tours.graphql", "");
        let file = dir.path().join("tours/graphqls/tours.graphql");
        filetime::set_file_mtime(&file, filetime::FileTime::from_unix_time(1_700_000_000, 0))
            .unwrap();

        let origin = FileSystemOrigin::new(dir.path());
        assert_eq!(
            origin
                .last_modified("/tours/graphqls/tours.graphql")
                .await
                .unwrap(),
            1_700_000_000_000
        );
        assert!(origin.last_modified("/tours/graphqls/gone.graphql").await.is_err());
    }

    #[test]
    fn test_rejects_parent_segments() {
        let origin = FileSystemOrigin::new("/srv/definitions");
        assert!(origin.file_path("/../etc/passwd").is_err());
        assert!(origin.file_path("/").is_err());
        assert!(origin.file_path("/a//b").is_err());
    }

    #[test]
    fn test_resource_path() {
        let dir = TempDir::new().unwrap();
        let origin = FileSystemOrigin::new(dir.path());
        let file = origin.root().join("tours/graphqls/tours.graphql");
        assert_eq!(
            origin.resource_path(&file).as_deref(),
            Some("/tours/graphqls/tours.graphql")
        );
        assert_eq!(origin.resource_path(Path::new("/elsewhere/x.graphql")), None);
    }

    #[tokio::test]
    async fn test_missing_root() {
        let origin = FileSystemOrigin::new("/definitely/not/here");
        assert!(origin.list().await.is_err());
    }
}
