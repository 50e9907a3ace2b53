//! Device status snapshot record

use std::fs;
use std::path::Path;

use core::fmt::Write as _;

use crate::error::{Error, Result};
use crate::json;
use crate::presence::FieldMask;
use crate::time::{self, MAX_TIMESTAMP_LENGTH};

use super::{STATUS_FILENAME, check_range};

const F_TIMESTAMP: u32 = 1 << 0;
const F_NAVSAT_FIX_TIME: u32 = 1 << 1;
const F_LATITUDE: u32 = 1 << 2;
const F_LONGITUDE: u32 = 1 << 3;
const F_HEADING_AND_REF: u32 = 1 << 4;
const F_ROLL_ANGLE: u32 = 1 << 5;
const F_PITCH_ANGLE: u32 = 1 << 6;
const F_TEMPERATURE: u32 = 1 << 7;
const F_POWER_STATE: u32 = 1 << 8;
const F_DEVICE_STATUS: u32 = 1 << 9;

/// Reference frame for a heading angle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum HeadingRef {
    /// Heading measured against true north.
    #[default]
    TrueNorth,
    /// Heading measured against magnetic north.
    MagNorth,
}

/// A device state snapshot.
///
/// Every field except the timestamp is optional; exports emit only the
/// fields that were actually set. The timestamp also names the record
/// directory the snapshot and its data snippets are exported into, and
/// serves as the reference that snippet time offsets are computed against.
///
/// # Examples
///
/// ```rust
/// use edgelink::lb::Status;
///
/// let mut status = Status::new("2020-09-03T17:14:25.2-04:00");
/// status.set_latitude(47.6062).unwrap();
/// status.set_longitude(-122.3321).unwrap();
/// assert!(status.set_latitude(91.0).is_err());
/// ```
#[derive(Debug, Default, Clone)]
pub struct Status {
    pub(crate) timestamp: heapless::String<MAX_TIMESTAMP_LENGTH>,
    navsat_fix_time: heapless::String<MAX_TIMESTAMP_LENGTH>,
    pub(crate) latitude_deg: f32,
    pub(crate) longitude_deg: f32,
    pub(crate) heading_deg: f32,
    heading_ref: HeadingRef,
    pub(crate) roll_angle_deg: f32,
    pub(crate) pitch_angle_deg: f32,
    temperature_c: f32,
    power_state_pct: u8,
    device_status: Vec<u8>,
    fields: FieldMask,
}

impl Status {
    /// Create a snapshot stamped with the given timestamp string.
    ///
    /// The string is stored verbatim (truncated to
    /// [`MAX_TIMESTAMP_LENGTH`] bytes) and exported unmodified.
    pub fn new(timestamp_rfc3339: &str) -> Self {
        let mut status = Status::default();
        status.set_timestamp(timestamp_rfc3339);
        status
    }

    /// Set or replace the snapshot timestamp.
    pub fn set_timestamp(&mut self, timestamp_rfc3339: &str) {
        self.timestamp = crate::bounded(timestamp_rfc3339);
        self.fields.set(F_TIMESTAMP);
    }

    /// Record when the last navigation satellite fix was obtained.
    ///
    /// Exported as a millisecond offset from the snapshot timestamp, not
    /// as a string.
    pub fn set_navsat_fix_time(&mut self, timestamp_rfc3339: &str) {
        self.navsat_fix_time = crate::bounded(timestamp_rfc3339);
        self.fields.set(F_NAVSAT_FIX_TIME);
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

    /// Set the heading in degrees, `[-360, 360]`, together with its
    /// reference frame. The pair is tracked as a single field.
    pub fn set_heading(&mut self, heading_ref: HeadingRef, heading_deg: f32) -> Result<()> {
        check_range(heading_deg, -360.0, 360.0)?;
        self.heading_ref = heading_ref;
        self.heading_deg = heading_deg;
        self.fields.set(F_HEADING_AND_REF);
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

    /// Set the device temperature in degrees Celsius (unranged).
    pub fn set_temperature(&mut self, temperature_c: f32) {
        self.temperature_c = temperature_c;
        self.fields.set(F_TEMPERATURE);
    }

    /// Set the power state as a percentage, `[0, 100]`. Stored and
    /// exported as a whole percent.
    pub fn set_power_state(&mut self, power_state_pct: f32) -> Result<()> {
        check_range(power_state_pct, 0.0, 100.0)?;
        self.power_state_pct = power_state_pct as u8;
        self.fields.set(F_POWER_STATE);
        Ok(())
    }

    /// Attach an opaque device-status byte buffer.
    pub fn set_device_status(&mut self, entries: &[u8]) {
        self.device_status = entries.to_vec();
        self.fields.set(F_DEVICE_STATUS);
    }

    /// Timestamp string, or `RequiredFieldMissing` if it was never set.
    pub(crate) fn require_timestamp(&self) -> Result<&str> {
        if self.fields.is_set(F_TIMESTAMP) {
            Ok(&self.timestamp)
        } else {
            Err(Error::RequiredFieldMissing)
        }
    }

    /// Render the status JSON: the mandatory timestamp plus every
    /// populated optional field. Angles are quantized to thousandths of a
    /// degree and the temperature to tenths, written as signed integers.
    pub(crate) fn render(&self) -> Result<String> {
        let timestamp = self.require_timestamp()?;

        let mut out = String::from("{\n\t\"timestamp\":");
        json::write_json_string(&mut out, timestamp);

        if self.fields.is_set(F_NAVSAT_FIX_TIME) {
            let offset_ms = time::subtract(&self.navsat_fix_time, timestamp);
            let _ = write!(out, ",\n\t\"navsat_fix_time_offset\":{offset_ms}");
        }
        if self.fields.is_set(F_LATITUDE) {
            let _ = write!(out, ",\n\t\"latitude\":{:.6}", self.latitude_deg);
        }
        if self.fields.is_set(F_LONGITUDE) {
            let _ = write!(out, ",\n\t\"longitude\":{:.6}", self.longitude_deg);
        }
        if self.fields.is_set(F_HEADING_AND_REF) {
            let _ = write!(out, ",\n\t\"heading\":{}", thousandths(self.heading_deg));
            let _ = write!(
                out,
                ",\n\t\"heading_true_north\":{}",
                self.heading_ref == HeadingRef::TrueNorth
            );
        }
        if self.fields.is_set(F_ROLL_ANGLE) {
            let _ = write!(out, ",\n\t\"roll_angle\":{}", thousandths(self.roll_angle_deg));
        }
        if self.fields.is_set(F_PITCH_ANGLE) {
            let _ = write!(
                out,
                ",\n\t\"pitch_angle\":{}",
                thousandths(self.pitch_angle_deg)
            );
        }
        if self.fields.is_set(F_TEMPERATURE) {
            let tenths = (10.0 * f64::from(self.temperature_c)).round() as i32;
            let _ = write!(out, ",\n\t\"temperature\":{tenths}");
        }
        if self.fields.is_set(F_POWER_STATE) {
            let _ = write!(out, ",\n\t\"power_state\":{}", self.power_state_pct);
        }
        if self.fields.is_set(F_DEVICE_STATUS) {
            out.push_str(",\n\t\"device_status\":[");
            for (i, byte) in self.device_status.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{byte}");
            }
            out.push(']');
        }
        out.push_str("\n}");
        Ok(out)
    }

    /// Write `sys_status.json` into the given record directory.
    pub(crate) fn export_into(&self, record_dir: &Path) -> Result<()> {
        let rendered = self.render()?;
        fs::write(record_dir.join(STATUS_FILENAME), rendered).map_err(|_| Error::FileOpen)
    }
}

/// Quantize a degree value to integer thousandths.
pub(crate) fn thousandths(value_deg: f32) -> i32 {
    (1000.0 * f64::from(value_deg)).round() as i32
}
