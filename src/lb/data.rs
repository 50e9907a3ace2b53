//! Data snippet record
//!
//! A data snippet never stands alone on disk: it is exported next to a
//! [`Status`] snapshot, and every positional, attitude and time field it
//! carries is written as a delta against that status rather than as an
//! absolute value. Scores are the exception and are written absolute.

use std::fs;
use std::path::{Path, PathBuf};

use core::fmt::Write as _;

use crate::error::{Error, Result};
use crate::json;
use crate::presence::FieldMask;
use crate::time::{self, MAX_TIMESTAMP_LENGTH};

use super::check_range;
use super::status::{Status, thousandths};

const F_TYPE_AND_INSTANCE: u32 = 1 << 0;
const F_DATA_TIME: u32 = 1 << 1;
const F_LATITUDE: u32 = 1 << 2;
const F_LONGITUDE: u32 = 1 << 3;
const F_HEADING: u32 = 1 << 4;
const F_ROLL_ANGLE: u32 = 1 << 5;
const F_PITCH_ANGLE: u32 = 1 << 6;
const F_SCORES: u32 = 1 << 7;
const F_DATA_FILE: u32 = 1 << 8;

/// Length of a data snippet type code, in bytes.
pub const DATA_TYPE_LENGTH: usize = 3;

/// A single data record exported alongside a status snapshot.
///
/// Identified by a three-character type code plus an instance number,
/// which together name the exported file (`<type><instance>.json`). An
/// optional payload file can be attached; on export it is moved (when
/// `delete_on_export` is set) or copied into the record directory and the
/// snippet's stored path is rewritten to the bare filename.
#[derive(Debug, Default, Clone)]
pub struct DataSnippet {
    data_type: heapless::String<DATA_TYPE_LENGTH>,
    instance: u32,
    data_time: heapless::String<MAX_TIMESTAMP_LENGTH>,
    latitude_deg: f32,
    longitude_deg: f32,
    heading_deg: f32,
    roll_angle_deg: f32,
    pitch_angle_deg: f32,
    quality_score: f32,
    type_score: f32,
    event_score: f32,
    data_file: PathBuf,
    delete_on_export: bool,
    fields: FieldMask,
}

impl DataSnippet {
    /// Create a snippet with the mandatory type code and instance number.
    ///
    /// The type code must be exactly [`DATA_TYPE_LENGTH`] bytes.
    pub fn new(data_type: &str, instance: u32) -> Result<Self> {
        if data_type.len() != DATA_TYPE_LENGTH {
            return Err(Error::OutOfRange);
        }
        let mut snippet = DataSnippet::default();
        snippet.data_type = crate::bounded(data_type);
        snippet.instance = instance;
        snippet.fields.set(F_TYPE_AND_INSTANCE);
        Ok(snippet)
    }

    /// Record when the data itself was captured.
    ///
    /// Exported as a millisecond offset from the reference status
    /// timestamp.
    pub fn set_data_timestamp(&mut self, data_time_rfc3339: &str) {
        self.data_time = crate::bounded(data_time_rfc3339);
        self.fields.set(F_DATA_TIME);
    }

    /// Set the latitude in degrees, `[-90, 90]`.
    pub fn set_latitude(&mut self, latitude_deg: f32) -> Result<()> {
        check_range(latitude_deg, -90.0, 90.0)?;
        self.latitude_deg = latitude_deg;
        self.fields.set(F_LATITUDE);
        Ok(())
    }

    /// Set the longitude in degrees, `[-180, 180]`.
    pub fn set_longitude(&mut self, longitude_deg: f32) -> Result<()> {
        check_range(longitude_deg, -180.0, 180.0)?;
        self.longitude_deg = longitude_deg;
        self.fields.set(F_LONGITUDE);
        Ok(())
    }

    /// Set the heading in degrees, `[-360, 360]`.
    ///
    /// Snippets carry no reference frame of their own; the heading is
    /// exported purely as an offset from the reference status heading.
    pub fn set_heading(&mut self, heading_deg: f32) -> Result<()> {
        check_range(heading_deg, -360.0, 360.0)?;
        self.heading_deg = heading_deg;
        self.fields.set(F_HEADING);
        Ok(())
    }

    /// Set the roll angle in degrees, `[-360, 360]`.
    pub fn set_roll_angle(&mut self, roll_deg: f32) -> Result<()> {
        check_range(roll_deg, -360.0, 360.0)?;
        self.roll_angle_deg = roll_deg;
        self.fields.set(F_ROLL_ANGLE);
        Ok(())
    }

    /// Set the pitch angle in degrees, `[-360, 360]`.
    pub fn set_pitch_angle(&mut self, pitch_deg: f32) -> Result<()> {
        check_range(pitch_deg, -360.0, 360.0)?;
        self.pitch_angle_deg = pitch_deg;
        self.fields.set(F_PITCH_ANGLE);
        Ok(())
    }

    /// Set the quality/type/event score triple, each in `[0, 1]`.
    ///
    /// The three scores are validated and tracked atomically as one field.
    pub fn set_scores(&mut self, quality_score: f32, type_score: f32, event_score: f32) -> Result<()> {
        check_range(quality_score, 0.0, 1.0)?;
        check_range(type_score, 0.0, 1.0)?;
        check_range(event_score, 0.0, 1.0)?;
        self.quality_score = quality_score;
        self.type_score = type_score;
        self.event_score = event_score;
        self.fields.set(F_SCORES);
        Ok(())
    }

    /// Attach a payload file to this snippet.
    ///
    /// With `delete_on_export` set the file is moved into the record
    /// directory at export time; otherwise it is copied and the original
    /// left in place.
    pub fn set_data_file(&mut self, data_file_path: impl Into<PathBuf>, delete_on_export: bool) {
        self.data_file = data_file_path.into();
        self.delete_on_export = delete_on_export;
        self.fields.set(F_DATA_FILE);
    }

    /// Export this snippet into `record_dir` against the given reference
    /// status: relocate the payload file if one is attached, then write
    /// `<type><instance>.json`.
    pub(crate) fn export_into(&mut self, record_dir: &Path, status: &Status) -> Result<()> {
        if !self.fields.is_set(F_TYPE_AND_INSTANCE) {
            return Err(Error::RequiredFieldMissing);
        }

        if self.fields.is_set(F_DATA_FILE) {
            let file_name = self
                .data_file
                .file_name()
                .ok_or(Error::FileMove)?
                .to_os_string();
            let destination = record_dir.join(&file_name);
            if self.delete_on_export {
                fs::rename(&self.data_file, &destination).map_err(|_| Error::FileMove)?;
            } else {
                fs::copy(&self.data_file, &destination).map_err(|_| Error::FileMove)?;
            }
            // From here on the snippet refers to its relocated copy.
            self.data_file = PathBuf::from(file_name);
        }

        let filename = format!("{}{}.json", self.data_type.as_str(), self.instance);
        let rendered = self.render(status);
        fs::write(record_dir.join(filename), rendered).map_err(|_| Error::FileOpen)
    }

    /// Render the snippet JSON with every populated field expressed as a
    /// delta from the reference status (scores excepted).
    fn render(&self, status: &Status) -> String {
        let mut out = String::from("{\n\t\"type\":");
        json::write_json_string(&mut out, self.data_type.as_str());
        let _ = write!(out, ",\n\t\"instance\":{}", self.instance);

        if self.fields.is_set(F_DATA_TIME) {
            let offset_ms = time::subtract(&self.data_time, &status.timestamp);
            let _ = write!(out, ",\n\t\"data_time_offset\":{offset_ms}");
        }
        if self.fields.is_set(F_LATITUDE) {
            let _ = write!(
                out,
                ",\n\t\"latitude_offset\":{:.6}",
                self.latitude_deg - status.latitude_deg
            );
        }
        if self.fields.is_set(F_LONGITUDE) {
            let _ = write!(
                out,
                ",\n\t\"longitude_offset\":{:.6}",
                self.longitude_deg - status.longitude_deg
            );
        }
        if self.fields.is_set(F_HEADING) {
            let _ = write!(
                out,
                ",\n\t\"heading_offset\":{}",
                thousandths(self.heading_deg - status.heading_deg)
            );
        }
        if self.fields.is_set(F_ROLL_ANGLE) {
            let _ = write!(
                out,
                ",\n\t\"roll_offset\":{}",
                thousandths(self.roll_angle_deg - status.roll_angle_deg)
            );
        }
        if self.fields.is_set(F_PITCH_ANGLE) {
            let _ = write!(
                out,
                ",\n\t\"pitch_offset\":{}",
                thousandths(self.pitch_angle_deg - status.pitch_angle_deg)
            );
        }
        if self.fields.is_set(F_SCORES) {
            let _ = write!(out, ",\n\t\"quality_score\":{:.6}", self.quality_score);
            let _ = write!(out, ",\n\t\"type_score\":{:.6}", self.type_score);
            let _ = write!(out, ",\n\t\"event_score\":{:.6}", self.event_score);
        }
        if self.fields.is_set(F_DATA_FILE) {
            out.push_str(",\n\t\"data_file\":");
            json::write_json_string(&mut out, &self.data_file.to_string_lossy());
        }
        out.push_str("\n}");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lb::HeadingRef;

    #[test]
    fn type_code_must_be_three_bytes() {
        assert!(DataSnippet::new("img", 0).is_ok());
        assert_eq!(DataSnippet::new("im", 0).unwrap_err(), Error::OutOfRange);
        assert_eq!(DataSnippet::new("imag", 0).unwrap_err(), Error::OutOfRange);
    }

    #[test]
    fn fields_are_rendered_as_deltas() {
        let mut status = Status::new("2020-09-03T17:14:25.2-04:00");
        status.set_latitude(47.0).unwrap();
        status.set_heading(HeadingRef::TrueNorth, 90.0).unwrap();

        let mut snippet = DataSnippet::new("cls", 1).unwrap();
        snippet.set_data_timestamp("2020-09-03T17:14:26.2-04:00");
        snippet.set_latitude(47.5).unwrap();
        snippet.set_heading(91.25).unwrap();

        let rendered = snippet.render(&status);
        assert!(rendered.contains("\"type\":\"cls\""));
        assert!(rendered.contains("\"instance\":1"));
        assert!(rendered.contains("\"data_time_offset\":1000"));
        assert!(rendered.contains("\"latitude_offset\":0.500000"));
        assert!(rendered.contains("\"heading_offset\":1250"));
    }

    #[test]
    fn scores_are_absolute_and_atomic() {
        let status = Status::new("2020-09-03T17:14:25.2-04:00");
        let mut snippet = DataSnippet::new("cls", 0).unwrap();

        assert_eq!(snippet.set_scores(0.5, 1.5, 0.5), Err(Error::OutOfRange));
        assert!(!snippet.render(&status).contains("quality_score"));

        snippet.set_scores(0.25, 0.5, 0.75).unwrap();
        let rendered = snippet.render(&status);
        assert!(rendered.contains("\"quality_score\":0.250000"));
        assert!(rendered.contains("\"type_score\":0.500000"));
        assert!(rendered.contains("\"event_score\":0.750000"));
    }
}
