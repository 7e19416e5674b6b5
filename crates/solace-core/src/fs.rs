//! Filesystem utilities for atomic document writes.

use std::io;
use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// On some platforms (notably Windows), `rename` fails if the destination already exists.
/// This function handles that case by removing the destination first and retrying.
///
/// If the rename ultimately fails, the temp file is cleaned up.
pub async fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination).await {
        let _ = fs::remove_file(destination).await;
        if let Err(retry_err) = fs::rename(temp_path, destination).await {
            let _ = fs::remove_file(temp_path).await;
            return Err(io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            ));
        }
    }
    Ok(())
}

/// Write `data` to `path` through a synced temp file in the same directory.
///
/// Readers never observe a partially written document.
pub async fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no parent"))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid document filename"))?;
    fs::create_dir_all(parent).await?;

    let temp_path = parent.join(format!(".{}.{}.tmp", filename, Uuid::new_v4().simple()));
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .await?;
    let written = match file.write_all(data).await {
        Ok(()) => file.sync_all().await,
        Err(err) => Err(err),
    };
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path).await;
        return Err(err);
    }
    drop(file);

    rename_with_fallback(&temp_path, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rename_new_file() {
        let dir = tempdir().unwrap();
        let temp = dir.path().join("temp.txt");
        let dest = dir.path().join("dest.txt");

        fs::write(&temp, b"test").await.unwrap();
        rename_with_fallback(&temp, &dest).await.unwrap();

        assert!(!temp.exists());
        assert_eq!(fs::read_to_string(&dest).await.unwrap(), "test");
    }

    #[tokio::test]
    async fn test_write_atomic_overwrites_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("docs").join("a.json");

        write_atomic(&dest, b"old").await.unwrap();
        write_atomic(&dest, b"new").await.unwrap();

        assert_eq!(fs::read_to_string(&dest).await.unwrap(), "new");
        let leftovers: Vec<_> = std::fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
