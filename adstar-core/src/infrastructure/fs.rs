// adstar-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write content to a file atomically using a temporary file.
///
/// The target file is either fully written or left as it was.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    // Same directory as the target so the rename never crosses filesystems
    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(InfrastructureError::Io)?;

    temp_file
        .write_all(content.as_ref())
        .map_err(InfrastructureError::Io)?;

    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Fresh, empty directory next to `dest`, to be filled then swapped in.
/// Dropped without a swap, it removes itself.
pub fn staging_dir_for(dest: &Path) -> Result<TempDir, InfrastructureError> {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;
    let dir = tempfile::Builder::new()
        .prefix(".adstar-next-")
        .tempdir_in(parent)?;
    Ok(dir)
}

/// A swap that already happened, with the previous snapshot still kept aside.
/// Dropping it discards the previous snapshot.
#[derive(Debug)]
pub struct Swap {
    dest: PathBuf,
    backup: TempDir,
    had_previous: bool,
}

impl Swap {
    fn aside(&self) -> PathBuf {
        self.backup.path().join("snapshot")
    }

    /// Puts the previous snapshot back. `dest` disappears if there was none.
    pub fn revert(self) -> Result<(), InfrastructureError> {
        if self.dest.exists() {
            fs::remove_dir_all(&self.dest)?;
        }
        if self.had_previous {
            fs::rename(self.aside(), &self.dest)?;
        }
        Ok(())
    }

    /// Keeps the new snapshot and removes the previous one.
    pub fn finish(self) {}
}

/// Replaces `dest` with the staged directory, keeping the previous snapshot
/// aside until the returned [`Swap`] is finished or reverted.
///
/// If the rename fails the previous snapshot is put back, so `dest` always
/// holds one complete snapshot.
pub fn swap_dir_reversible(staged: TempDir, dest: &Path) -> Result<Swap, InfrastructureError> {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    let backup = tempfile::Builder::new()
        .prefix(".adstar-prev-")
        .tempdir_in(parent)?;
    let swap = Swap {
        dest: dest.to_path_buf(),
        had_previous: dest.exists(),
        backup,
    };

    if swap.had_previous {
        fs::rename(dest, swap.aside())?;
    }

    let staged_path = staged.keep();
    if let Err(e) = fs::rename(&staged_path, dest) {
        if swap.had_previous {
            fs::rename(swap.aside(), dest)?;
        }
        let _ = fs::remove_dir_all(&staged_path);
        return Err(InfrastructureError::Io(e));
    }

    Ok(swap)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.txt");
        let content = "Hello, World!";

        atomic_write(&file_path, content)?;

        assert!(file_path.exists());
        let read_content = fs::read_to_string(file_path)?;
        assert_eq!(read_content, content);
        Ok(())
    }

    #[test]
    fn test_atomic_write_overwrites_existing() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("nested").join("run_results.json");

        atomic_write(&file_path, "Initial")?;
        atomic_write(&file_path, "Updated")?;

        let read_content = fs::read_to_string(file_path)?;
        assert_eq!(read_content, "Updated");
        Ok(())
    }

    #[test]
    fn test_swap_replaces_whole_directory() -> Result<()> {
        let root = tempdir()?;
        let dest = root.path().join("dimensional");
        fs::create_dir_all(&dest)?;
        fs::write(dest.join("stale.csv"), "old")?;

        let staged = staging_dir_for(&dest)?;
        fs::write(staged.path().join("dim_site.csv"), "site_key,site_name\n")?;
        swap_dir_reversible(staged, &dest)?.finish();

        assert!(dest.join("dim_site.csv").exists());
        assert!(!dest.join("stale.csv").exists());
        // no leftover staging or backup directories
        assert_eq!(fs::read_dir(root.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_dropped_staging_dir_leaves_destination_untouched() -> Result<()> {
        let root = tempdir()?;
        let dest = root.path().join("dimensional");
        fs::create_dir_all(&dest)?;
        fs::write(dest.join("dim_site.csv"), "old")?;

        {
            let staged = staging_dir_for(&dest)?;
            fs::write(staged.path().join("dim_site.csv"), "half")?;
        }

        assert_eq!(fs::read_to_string(dest.join("dim_site.csv"))?, "old");
        assert_eq!(fs::read_dir(root.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_reverted_swap_restores_previous_snapshot() -> Result<()> {
        let root = tempdir()?;
        let dest = root.path().join("outputs");
        fs::create_dir_all(&dest)?;
        fs::write(dest.join("kpi_summary.csv"), "old")?;

        let staged = staging_dir_for(&dest)?;
        fs::write(staged.path().join("kpi_summary.csv"), "new")?;
        let swap = swap_dir_reversible(staged, &dest)?;
        assert_eq!(fs::read_to_string(dest.join("kpi_summary.csv"))?, "new");

        swap.revert()?;
        assert_eq!(fs::read_to_string(dest.join("kpi_summary.csv"))?, "old");
        assert_eq!(fs::read_dir(root.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_reverted_first_swap_removes_destination() -> Result<()> {
        let root = tempdir()?;
        let dest = root.path().join("dimensional");

        let staged = staging_dir_for(&dest)?;
        fs::write(staged.path().join("dim_site.csv"), "new")?;
        swap_dir_reversible(staged, &dest)?.revert()?;

        assert!(!dest.exists());
        Ok(())
    }
}
