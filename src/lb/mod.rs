//! Low-bandwidth message records and their on-disk JSON codecs
//!
//! The low-bandwidth channel exchanges four record kinds with the
//! transport agent, each staged as JSON files under the base path:
//!
//! - [`Status`]: a device state snapshot, one per data export
//! - [`DataSnippet`]: a data record whose positional/attitude/time fields
//!   are written as deltas against the accompanying status
//! - [`Config`]: an ordered list of [`Param`] entries, supplied by the
//!   transport agent for the device to import
//! - [`General`]: a single [`Param`], exchanged in both directions
//!
//! Records track which optional fields were populated through a
//! [`FieldMask`](crate::presence::FieldMask); exports emit only populated
//! fields, and range-violating setters reject the value without mutating
//! state.

pub mod config;
pub mod data;
pub mod general;
pub mod param;
pub mod status;

pub use config::Config;
pub use data::DataSnippet;
pub use general::General;
pub use param::{Param, ParamId, ParamValue};
pub use status::{HeadingRef, Status};

use crate::context::EdgeContext;
use crate::error::{Error, Result};

/// Data record folder, one timestamped subdirectory per export.
pub(crate) const DATA_FOLDER: &str = "lb/data";
/// Folder the transport agent drops configuration files into.
pub(crate) const CONFIG_FOLDER: &str = "lb/cfg";
/// Folder device-originated general messages are exported into.
pub(crate) const GENERAL_DO_FOLDER: &str = "lb/do-msg";
/// Folder device-targeted general messages arrive in.
pub(crate) const GENERAL_DT_FOLDER: &str = "lb/dt-msg";
/// Status filename inside each data record directory.
pub(crate) const STATUS_FILENAME: &str = "sys_status.json";

/// Reject `value` outside `[lower, upper]` without mutating anything.
pub(crate) fn check_range(value: f32, lower: f32, upper: f32) -> Result<()> {
    if value < lower || value > upper {
        Err(Error::OutOfRange)
    } else {
        Ok(())
    }
}

impl EdgeContext {
    /// Export a status snapshot plus its data snippets as one record set.
    ///
    /// Creates (or reuses) a directory named after the status timestamp
    /// string under the data folder, writes the status file, then exports
    /// each snippet in order against that status, stopping at the first
    /// failure and propagating its error. Snippets are mutated when they
    /// carry a data file: the stored path is rewritten to the bare
    /// filename after the file is moved or copied into the record
    /// directory.
    pub fn export_data(&self, status: &Status, snippets: &mut [DataSnippet]) -> Result<()> {
        let timestamp = status.require_timestamp()?;

        let record_dir = self.base_path().join(DATA_FOLDER).join(timestamp);
        crate::context::check_path(&record_dir)?;

        status.export_into(&record_dir)?;
        for snippet in snippets.iter_mut() {
            snippet.export_into(&record_dir, status)?;
        }
        log::debug!(
            "exported status + {} snippet(s) to {}",
            snippets.len(),
            record_dir.display()
        );
        Ok(())
    }
}
