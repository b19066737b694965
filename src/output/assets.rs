//! Output directory preparation and static asset copying

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Root document of the source site, never copied (every route replaces it)
pub const ROOT_DOCUMENT: &str = "index.html";

/// Empties `dir`, creating it if needed
pub async fn prepare_output_dir(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(dir).await
}

/// Copies every entry of `source` except its root document into `dest`
///
/// Directories are copied recursively and existing files are overwritten.
///
/// # Returns
///
/// * `Ok(usize)` - Number of files copied
/// * `Err(io::Error)` - A read, directory creation or copy failed
pub async fn copy_assets(source: &Path, dest: &Path) -> io::Result<usize> {
    let mut copied = 0;
    let mut pending: Vec<(PathBuf, PathBuf)> = Vec::new();

    let mut top = fs::read_dir(source).await?;
    while let Some(entry) = top.next_entry().await? {
        if entry.file_name() == ROOT_DOCUMENT {
            continue;
        }
        pending.push((entry.path(), dest.join(entry.file_name())));
    }

    while let Some((from, to)) = pending.pop() {
        let file_type = fs::metadata(&from).await?.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&to).await?;
            let mut entries = fs::read_dir(&from).await?;
            while let Some(entry) = entries.next_entry().await? {
                pending.push((entry.path(), to.join(entry.file_name())));
            }
        } else {
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::copy(&from, &to).await?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::fs::write(dir.path().join("app.js"), "run()").unwrap();
        std::fs::create_dir_all(dir.path().join("assets/img")).unwrap();
        std::fs::write(dir.path().join("assets/style.css"), "p{}").unwrap();
        std::fs::write(dir.path().join("assets/img/logo.svg"), "<svg/>").unwrap();
        // Nested index files are ordinary assets
        std::fs::write(dir.path().join("assets/index.html"), "nested").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_copy_skips_root_document() {
        let source = site();
        let dest = TempDir::new().unwrap();

        let copied = copy_assets(source.path(), dest.path()).await.unwrap();

        assert_eq!(copied, 4);
        assert!(!dest.path().join("index.html").exists());
        assert_eq!(
            std::fs::read_to_string(dest.path().join("app.js")).unwrap(),
            "run()"
        );
        assert!(dest.path().join("assets/img/logo.svg").is_file());
        assert!(dest.path().join("assets/index.html").is_file());
    }

    #[tokio::test]
    async fn test_copy_overwrites() {
        let source = site();
        let dest = TempDir::new().unwrap();
        std::fs::write(dest.path().join("app.js"), "stale").unwrap();

        copy_assets(source.path(), dest.path()).await.unwrap();
        copy_assets(source.path(), dest.path()).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.path().join("app.js")).unwrap(),
            "run()"
        );
    }

    #[tokio::test]
    async fn test_copy_missing_source_fails() {
        let dest = TempDir::new().unwrap();
        let result = copy_assets(&dest.path().join("missing"), dest.path()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_prepare_clears_existing_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("output");
        std::fs::create_dir_all(output.join("old")).unwrap();
        std::fs::write(output.join("old/index.html"), "stale").unwrap();

        prepare_output_dir(&output).await.unwrap();

        assert!(output.is_dir());
        assert_eq!(std::fs::read_dir(&output).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_prepare_creates_missing_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("a/b/output");

        prepare_output_dir(&output).await.unwrap();

        assert!(output.is_dir());
    }
}
