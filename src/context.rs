//! SDK context: base path management and per-session state
//!
//! All file exchange happens under a single base path owned by the
//! transport agent. An [`EdgeContext`] is constructed once at startup,
//! validating the fixed folder layout and reading the device NUID, and is
//! then threaded through every operation. Session state that the SDK
//! must remember between calls — the general-export counter and the
//! high-bandwidth data link — lives here rather than in globals.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::{hb, lb};

/// File the device's unique identifier is read from, one line.
pub(crate) const DEVNUID_FILE: &str = "devinfo/devnuid.txt";

/// Longest device NUID string, in bytes.
pub const MAX_NUID_LENGTH: usize = 16;

/// Handle to the on-disk exchange area shared with the transport agent.
///
/// # Examples
///
/// ```rust,no_run
/// use edgelink::context::EdgeContext;
///
/// let context = EdgeContext::new("/opt/transport")?;
/// println!("device NUID: {}", context.nuid());
/// # Ok::<(), edgelink::Error>(())
/// ```
#[derive(Debug)]
pub struct EdgeContext {
    base_path: PathBuf,
    nuid: heapless::String<MAX_NUID_LENGTH>,
    pub(crate) general_do_count: u32,
    pub(crate) hb_data_link: Option<PathBuf>,
}

impl EdgeContext {
    /// Open the exchange area rooted at `base_path`.
    ///
    /// Creates any of the fixed subfolders that are missing (repairing
    /// dangling symlinks), verifies read/write access to each, and reads
    /// the device NUID. Fails with [`Error::InvalidBasePath`] when the
    /// NUID file is absent or empty.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();

        for folder in [
            lb::DATA_FOLDER,
            lb::CONFIG_FOLDER,
            lb::GENERAL_DO_FOLDER,
            lb::GENERAL_DT_FOLDER,
            hb::DO_DATA_FOLDER,
            hb::DT_FOLDER,
        ] {
            check_path(&base_path.join(folder))?;
        }

        let nuid_text =
            fs::read_to_string(base_path.join(DEVNUID_FILE)).map_err(|_| Error::InvalidBasePath)?;
        let nuid_line = nuid_text.lines().next().ok_or(Error::InvalidBasePath)?;

        log::debug!("opened exchange area at {}", base_path.display());
        Ok(EdgeContext {
            base_path,
            nuid: crate::bounded(nuid_line),
            general_do_count: 0,
            hb_data_link: None,
        })
    }

    /// The base path every exchange folder lives under.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// The device's unique identifier.
    pub fn nuid(&self) -> &str {
        &self.nuid
    }
}

/// Ensure `path` exists as a usable directory (or directory link).
///
/// A missing entry is created recursively; a dangling symlink is removed
/// and replaced by a real directory; an entry without write permission is
/// rejected.
pub(crate) fn check_path(path: &Path) -> Result<()> {
    if !path.exists() {
        // The entry may still exist as a dangling symlink, which has to go
        // before a directory can take its place.
        if path.symlink_metadata().is_ok() {
            fs::remove_file(path).map_err(|_| Error::FileDelete)?;
        }
        fs::create_dir_all(path).map_err(|_| Error::FileOpen)?;
    }

    let metadata = fs::metadata(path).map_err(|_| Error::FilePermission)?;
    if metadata.permissions().readonly() {
        return Err(Error::FilePermission);
    }
    Ok(())
}

/// Names of the `*.json` entries in `dir`, sorted for deterministic
/// processing order.
pub(crate) fn list_json_files(dir: &Path) -> Result<Vec<std::ffi::OsString>> {
    let entries = fs::read_dir(dir).map_err(|_| Error::FileOpen)?;
    let mut filenames = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|_| Error::FileOpen)?;
        let filename = entry.file_name();
        if Path::new(&filename)
            .extension()
            .is_some_and(|ext| ext == "json")
        {
            filenames.push(filename);
        }
    }
    filenames.sort();
    Ok(filenames)
}
