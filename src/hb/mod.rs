//! High-bandwidth channel plumbing
//!
//! The high-bandwidth channel is bulk file offload: instead of staging
//! copies, the device's data folder is symlinked into the exchange area
//! and the transport agent reads straight from it.

use std::fs;
use std::path::Path;

use crate::context::EdgeContext;
use crate::error::{Error, Result};

/// Exchange-area entry the device data folder is linked at.
pub(crate) const DO_DATA_FOLDER: &str = "hb/do/data";
/// Folder device-targeted high-bandwidth content arrives in.
pub(crate) const DT_FOLDER: &str = "hb/dt";

impl EdgeContext {
    /// Expose `data_folder_path` to the transport agent by linking it at
    /// the fixed high-bandwidth location.
    ///
    /// The source folder is created if missing; any existing entry at the
    /// link location (including the placeholder directory created when
    /// the context was opened) is removed first.
    pub fn link_data_folder(&mut self, data_folder_path: impl AsRef<Path>) -> Result<()> {
        let source = data_folder_path.as_ref();
        crate::context::check_path(source)?;

        let target = self.base_path().join(DO_DATA_FOLDER);
        if let Ok(metadata) = target.symlink_metadata() {
            let removed = if metadata.is_dir() {
                fs::remove_dir(&target)
            } else {
                fs::remove_file(&target)
            };
            removed.map_err(|_| Error::FileDelete)?;
        }

        std::os::unix::fs::symlink(source, &target).map_err(|_| Error::SymlinkCreate)?;
        log::debug!("linked {} at {}", source.display(), target.display());
        self.hb_data_link = Some(target);
        Ok(())
    }

    /// Remove the high-bandwidth data link, if this context created one.
    pub fn unlink_data_folder(&mut self) -> Result<()> {
        if let Some(target) = self.hb_data_link.take() {
            if fs::remove_file(&target).is_err() {
                self.hb_data_link = Some(target);
                return Err(Error::FileDelete);
            }
        }
        Ok(())
    }
}
