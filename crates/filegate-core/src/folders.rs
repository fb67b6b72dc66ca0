//! Folder algorithms shared by every backend.

use crate::adapter::RemoteOps;
use crate::entry::RemoteEntry;
use crate::error::{Error, Result};
use crate::path;
use log::{debug, info};

/// Create `target` and every missing intermediate folder, root to leaf.
/// Folders that already exist are left alone.
pub fn create_folder<R>(ops: &mut R, target: &str) -> Result<()>
where
    R: RemoteOps + ?Sized,
{
    for prefix in path::segment_prefixes(target) {
        if ops.dir_exists(&prefix)? {
            continue;
        }
        ops.make_dir(&prefix)?;
        debug!("created folder {}", prefix);
    }
    info!("folder ready: {}", target);
    Ok(())
}

/// Delete a folder.
///
/// Without `recursive` the folder must be empty, otherwise the call fails
/// with `FolderNotEmpty` and nothing is removed. With `recursive` every
/// subfolder is emptied depth-first, then the direct files go, then the
/// folder itself.
pub fn delete_folder<R>(ops: &mut R, target: &str, recursive: bool) -> Result<()>
where
    R: RemoteOps + ?Sized,
{
    let children: Vec<RemoteEntry> = ops
        .entries(target)?
        .into_iter()
        .filter(|e| !e.is_pseudo())
        .collect();

    if !recursive && !children.is_empty() {
        return Err(Error::folder_not_empty(target));
    }

    for dir in children.iter().filter(|e| e.is_dir()) {
        delete_folder(ops, &dir.path(), true)?;
    }
    for file in children.iter().filter(|e| e.is_file()) {
        ops.remove_file(&file.path())?;
        debug!("deleted {}", file.path());
    }

    ops.remove_dir(target)?;
    info!("deleted folder {}", target);
    Ok(())
}
