// src/storage/mod.rs
// =============================================================================
// This module persists what the crawler finds.
//
// Layout on disk (rooted at the output folder):
//
//   <root>/
//   ├── pages/          one file per visited page, named after its URL
//   ├── log/output.log  only when file logging is enabled
//   └── result.out      every visited URL, one per line
//
// The crawl core only knows the `PageStore` trait, so tests can swap in an
// in-memory store.
// =============================================================================

use futures::future::{BoxFuture, FutureExt};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use url::Url;

const PAGES_DIR: &str = "pages";
const LOG_DIR: &str = "log";
const LOG_FILE: &str = "output.log";
const RESULT_FILE: &str = "result.out";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

// Receives the content of every page the crawler records as visited
pub trait PageStore: Send + Sync + 'static {
    fn store<'a>(&'a self, url: &'a Url, content: &'a str) -> BoxFuture<'a, Result<(), StoreError>>;
}

// Stores pages as plain files under an output folder
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
    pages: PathBuf,
}

impl DiskStore {
    /// Creates the output folder and its `pages/` directory.
    ///
    /// This runs before any worker starts, so a failure here aborts the crawl.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let pages = root.join(PAGES_DIR);
        create_dir(&root)?;
        create_dir(&pages)?;

        Ok(Self { root, pages })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // Where a given URL's content ends up
    pub fn page_path(&self, url: &Url) -> PathBuf {
        self.pages.join(file_name_for(url))
    }

    // Path of the log file, creating log/ if needed
    pub fn log_file(&self) -> Result<PathBuf, StoreError> {
        let dir = self.root.join(LOG_DIR);
        create_dir(&dir)?;
        Ok(dir.join(LOG_FILE))
    }

    /// Writes every visited URL, one per line, to `result.out`.
    pub async fn write_results(&self, visited: &[Url]) -> Result<PathBuf, StoreError> {
        let path = self.root.join(RESULT_FILE);
        let body = visited
            .iter()
            .map(Url::as_str)
            .collect::<Vec<_>>()
            .join("\n");

        write_file(&path, body.as_bytes()).await?;
        Ok(path)
    }
}

impl PageStore for DiskStore {
    fn store<'a>(&'a self, url: &'a Url, content: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            let path = self.page_path(url);
            write_file(&path, content.as_bytes()).await?;
            debug!(%url, path = %path.display(), "saved page");
            Ok(())
        }
        .boxed()
    }
}

// Replaces characters that are not valid in file names with '_'
//
// "https://example.com/a b" -> "https___example.com_a_b"
fn file_name_for(url: &Url) -> String {
    url.as_str()
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

fn create_dir(path: &Path) -> Result<(), StoreError> {
    std::fs::create_dir_all(path).map_err(|source| StoreError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_is_sanitized() {
        let url = Url::parse("https://example.com/a?b=c").unwrap();
        assert_eq!(file_name_for(&url), "https___example.com_a_b=c");
    }

    #[test]
    fn test_create_makes_pages_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("example.com");

        let store = DiskStore::create(&root).unwrap();

        assert!(root.join("pages").is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn test_create_fails_when_root_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("taken");
        std::fs::write(&root, "not a directory").unwrap();

        let err = DiskStore::create(&root).unwrap_err();
        assert!(matches!(err, StoreError::CreateDir { .. }));
    }

    #[tokio::test]
    async fn test_store_writes_page() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::create(dir.path()).unwrap();
        let url = Url::parse("https://example.com/docs").unwrap();

        store.store(&url, "<html>docs</html>").await.unwrap();

        let saved = std::fs::read_to_string(store.page_path(&url)).unwrap();
        assert_eq!(saved, "<html>docs</html>");
    }

    #[tokio::test]
    async fn test_write_results_one_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::create(dir.path()).unwrap();
        let visited = vec![
            Url::parse("https://example.com/").unwrap(),
            Url::parse("https://example.com/b").unwrap(),
        ];

        let path = store.write_results(&visited).await.unwrap();

        let saved = std::fs::read_to_string(path).unwrap();
        assert_eq!(saved, "https://example.com/\nhttps://example.com/b");
    }

    #[test]
    fn test_log_file_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::create(dir.path()).unwrap();

        let path = store.log_file().unwrap();

        assert!(dir.path().join("log").is_dir());
        assert!(path.ends_with("log/output.log"));
    }
}
