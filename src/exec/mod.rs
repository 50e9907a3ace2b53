//! Execution status reports from the transport agent
//!
//! After a transmission run the agent leaves behind up to two report
//! files, one per channel, each carrying a `connections` array of
//! per-connection outcomes. The importer rebuilds the connection list from
//! the flat token stream with no lookahead: before any field is written to
//! the current tail entry, a field whose presence bit is already set means
//! the stream has moved on to the next array element, and a fresh tail is
//! started. Warning and error strings are recognized purely by token type
//! and path shape (a string inside an array), and routed by which of the
//! two arrays is currently open.

use std::fs;

use crate::context::EdgeContext;
use crate::error::{Error, Result};
use crate::json::{self, JsonEvent, JsonToken};
use crate::presence::FieldMask;
use crate::time::{MAX_TIMESTAMP_LENGTH, leading_i64};

/// Low-bandwidth half of the execution report.
pub(crate) const LB_EXEC_STATUS_FILE: &str = "log/lb_execution_status.json";
/// High-bandwidth half of the execution report.
pub(crate) const HB_EXEC_STATUS_FILE: &str = "log/hb_execution_status.json";
/// Marker file whose mere existence means device software was updated.
pub(crate) const SW_UPDATE_STATUS_FILE: &str = "log/sw_update_status.json";

/// Longest comms-type string a connection entry stores, in bytes.
pub const MAX_COMMS_TYPE_LENGTH: usize = 32;
/// Longest warning/error string a connection entry stores, in bytes.
pub const MAX_COMMS_NOTE_LENGTH: usize = 64;
/// Most warnings (and, independently, errors) a connection entry stores.
pub const MAX_COMMS_NOTE_COUNT: usize = 8;

// Common header fields, shared bit numbering.
const F_COMMS_TYPE: u32 = 1 << 0;
const F_STATUS: u32 = 1 << 1;
const F_START_TIME: u32 = 1 << 2;
const F_STOP_TIME: u32 = 1 << 3;
const F_WARNINGS: u32 = 1 << 4;
const F_ERRORS: u32 = 1 << 5;

// LB extension fields. Numbering restarts at bit 6 for the HB variant
// below; the two masks never meet in one value.
const F_MESSAGES_SENT: u32 = 1 << 6;
const F_PACKETS_SENT: u32 = 1 << 7;
const F_MESSAGES_RECEIVED: u32 = 1 << 8;

// HB extension fields.
const F_DATA_SENT: u32 = 1 << 6;
const F_DATA_RECEIVED: u32 = 1 << 7;
const F_DIRECTION: u32 = 1 << 8;

/// Outcome of one connection attempt.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CommsStatus {
    /// The connection completed successfully.
    Success,
    /// The connection could not be established.
    ConnFailed,
    /// The connection was administratively disabled.
    Disabled,
    /// Anything the report did not phrase in a recognized way.
    #[default]
    Unknown,
}

impl CommsStatus {
    fn from_wire(text: &str) -> Self {
        match text {
            "success" => CommsStatus::Success,
            "connfailed" => CommsStatus::ConnFailed,
            "disabled" => CommsStatus::Disabled,
            _ => CommsStatus::Unknown,
        }
    }
}

/// Transfer direction of a high-bandwidth connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Device-originated transfer.
    DeviceOriginated,
    /// Device-targeted transfer.
    DeviceTargeted,
    /// Unrecognized direction token.
    Unknown,
}

impl Direction {
    // The wire writes "sw" (a software delivery) for device-targeted
    // transfers; "dt" never appears. That token is part of the format.
    fn from_wire(text: &str) -> Self {
        match text {
            "do" => Direction::DeviceOriginated,
            "sw" => Direction::DeviceTargeted,
            _ => Direction::Unknown,
        }
    }
}

/// Fields shared by both connection-status variants.
#[derive(Debug, Default, Clone)]
struct ConnectionHeader {
    comms_type: heapless::String<MAX_COMMS_TYPE_LENGTH>,
    status: CommsStatus,
    start_time: heapless::String<MAX_TIMESTAMP_LENGTH>,
    stop_time: heapless::String<MAX_TIMESTAMP_LENGTH>,
    warnings: heapless::Vec<heapless::String<MAX_COMMS_NOTE_LENGTH>, MAX_COMMS_NOTE_COUNT>,
    errors: heapless::Vec<heapless::String<MAX_COMMS_NOTE_LENGTH>, MAX_COMMS_NOTE_COUNT>,
    fields: FieldMask,
    // Transient import state, never part of the persisted model: which of
    // the two string arrays an in-flight parse is currently inside.
    parsing_warnings: bool,
    parsing_errors: bool,
}

impl ConnectionHeader {
    /// Presence bit for a common-header field name.
    fn field_bit(name: &str) -> Option<u32> {
        match name {
            "comms_type" => Some(F_COMMS_TYPE),
            "status" => Some(F_STATUS),
            "timestart" => Some(F_START_TIME),
            "timestop" => Some(F_STOP_TIME),
            "warnings" => Some(F_WARNINGS),
            "errors" => Some(F_ERRORS),
            _ => None,
        }
    }

    fn apply(&mut self, name: &str, token: &JsonToken) {
        match name {
            "comms_type" => {
                if let JsonToken::Str(text) = token {
                    self.comms_type = crate::bounded(text);
                }
            }
            "status" => {
                if let JsonToken::Str(text) = token {
                    self.status = CommsStatus::from_wire(text);
                }
            }
            "timestart" => {
                if let JsonToken::Str(text) = token {
                    self.start_time = crate::bounded(text);
                }
            }
            "timestop" => {
                if let JsonToken::Str(text) = token {
                    self.stop_time = crate::bounded(text);
                }
            }
            "warnings" => {
                self.warnings.clear();
                self.parsing_warnings = true;
            }
            "errors" => {
                self.errors.clear();
                self.parsing_errors = true;
            }
            _ => {}
        }
    }

    /// Store a string that appeared inside whichever array is open.
    ///
    /// Past capacity the entry is dropped without an error.
    fn push_note(&mut self, text: &str) {
        let destination = if self.parsing_warnings {
            &mut self.warnings
        } else if self.parsing_errors {
            &mut self.errors
        } else {
            // Inside an array this importer does not track.
            return;
        };
        if destination.push(crate::bounded(text)).is_err() {
            log::warn!("connection report note dropped past capacity");
        }
    }

    /// An array just ended: leave whichever string array was open. With
    /// neither open this is the end of the outer `connections` array.
    fn finish_array(&mut self) {
        if self.parsing_warnings {
            self.parsing_warnings = false;
        } else if self.parsing_errors {
            self.parsing_errors = false;
        }
    }

    fn comms_type(&self) -> Option<&str> {
        if self.fields.is_set(F_COMMS_TYPE) {
            Some(self.comms_type.as_str())
        } else {
            None
        }
    }

    fn status(&self) -> CommsStatus {
        if self.fields.is_set(F_STATUS) {
            self.status
        } else {
            CommsStatus::Unknown
        }
    }

    fn timestamps(&self) -> (Option<&str>, Option<&str>) {
        let start = if self.fields.is_set(F_START_TIME) {
            Some(self.start_time.as_str())
        } else {
            None
        };
        let stop = if self.fields.is_set(F_STOP_TIME) {
            Some(self.stop_time.as_str())
        } else {
            None
        };
        (start, stop)
    }

    fn warnings(&self) -> &[heapless::String<MAX_COMMS_NOTE_LENGTH>] {
        if self.fields.is_set(F_WARNINGS) {
            &self.warnings
        } else {
            &[]
        }
    }

    fn errors(&self) -> &[heapless::String<MAX_COMMS_NOTE_LENGTH>] {
        if self.fields.is_set(F_ERRORS) {
            &self.errors
        } else {
            &[]
        }
    }
}

/// Behavior a connection-status variant contributes to the shared importer.
trait ConnectionRecord: Default {
    fn header(&self) -> &ConnectionHeader;
    fn header_mut(&mut self) -> &mut ConnectionHeader;
    /// Presence bit for a variant-specific field name.
    fn extension_bit(name: &str) -> Option<u32>;
    /// Field names present on the wire that this SDK deliberately skips.
    fn is_ignored(name: &str) -> bool;
    fn apply_extension(&mut self, name: &str, token: &JsonToken);
}

/// Outcome of one low-bandwidth connection.
#[derive(Debug, Default, Clone)]
pub struct LbConnectionStatus {
    header: ConnectionHeader,
    messages_sent: u32,
    packets_sent: u32,
    messages_received: u32,
}

impl LbConnectionStatus {
    /// Comms type string, if reported.
    pub fn comms_type(&self) -> Option<&str> {
        self.header.comms_type()
    }

    /// Connection outcome; `Unknown` when not reported.
    pub fn status(&self) -> CommsStatus {
        self.header.status()
    }

    /// Start and stop timestamps, each `None` when not reported.
    pub fn timestamps(&self) -> (Option<&str>, Option<&str>) {
        self.header.timestamps()
    }

    /// Reported warnings, empty when none were reported.
    pub fn warnings(&self) -> &[heapless::String<MAX_COMMS_NOTE_LENGTH>] {
        self.header.warnings()
    }

    /// Reported errors, empty when none were reported.
    pub fn errors(&self) -> &[heapless::String<MAX_COMMS_NOTE_LENGTH>] {
        self.header.errors()
    }

    /// `(messages_sent, packets_sent, messages_received)`, zero for any
    /// count not reported.
    pub fn statistics(&self) -> (u32, u32, u32) {
        let f = &self.header.fields;
        (
            if f.is_set(F_MESSAGES_SENT) { self.messages_sent } else { 0 },
            if f.is_set(F_PACKETS_SENT) { self.packets_sent } else { 0 },
            if f.is_set(F_MESSAGES_RECEIVED) { self.messages_received } else { 0 },
        )
    }
}

impl ConnectionRecord for LbConnectionStatus {
    fn header(&self) -> &ConnectionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ConnectionHeader {
        &mut self.header
    }

    fn extension_bit(name: &str) -> Option<u32> {
        match name {
            "msgsent" => Some(F_MESSAGES_SENT),
            "pktsent" => Some(F_PACKETS_SENT),
            "msgrecv" => Some(F_MESSAGES_RECEIVED),
            _ => None,
        }
    }

    fn is_ignored(name: &str) -> bool {
        matches!(name, "statsent" | "datasent" | "gensent" | "cfgrecv" | "genrecv")
    }

    fn apply_extension(&mut self, name: &str, token: &JsonToken) {
        let JsonToken::Number(text) = token else {
            return;
        };
        match name {
            "msgsent" => self.messages_sent = leading_i64(text) as u32,
            "pktsent" => self.packets_sent = leading_i64(text) as u32,
            "msgrecv" => self.messages_received = leading_i64(text) as u32,
            _ => {}
        }
    }
}

/// Outcome of one high-bandwidth connection.
#[derive(Debug, Default, Clone)]
pub struct HbConnectionStatus {
    header: ConnectionHeader,
    data_sent_kb: u32,
    data_received_kb: u32,
    direction: Option<Direction>,
}

impl HbConnectionStatus {
    /// Comms type string, if reported.
    pub fn comms_type(&self) -> Option<&str> {
        self.header.comms_type()
    }

    /// Connection outcome; `Unknown` when not reported.
    pub fn status(&self) -> CommsStatus {
        self.header.status()
    }

    /// Start and stop timestamps, each `None` when not reported.
    pub fn timestamps(&self) -> (Option<&str>, Option<&str>) {
        self.header.timestamps()
    }

    /// Reported warnings, empty when none were reported.
    pub fn warnings(&self) -> &[heapless::String<MAX_COMMS_NOTE_LENGTH>] {
        self.header.warnings()
    }

    /// Reported errors, empty when none were reported.
    pub fn errors(&self) -> &[heapless::String<MAX_COMMS_NOTE_LENGTH>] {
        self.header.errors()
    }

    /// `(data_sent_kb, data_received_kb)`, zero for any count not reported.
    pub fn statistics(&self) -> (u32, u32) {
        let f = &self.header.fields;
        (
            if f.is_set(F_DATA_SENT) { self.data_sent_kb } else { 0 },
            if f.is_set(F_DATA_RECEIVED) { self.data_received_kb } else { 0 },
        )
    }

    /// Transfer direction, `None` when not reported.
    pub fn direction(&self) -> Option<Direction> {
        if self.header.fields.is_set(F_DIRECTION) {
            self.direction
        } else {
            None
        }
    }
}

impl ConnectionRecord for HbConnectionStatus {
    fn header(&self) -> &ConnectionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ConnectionHeader {
        &mut self.header
    }

    fn extension_bit(name: &str) -> Option<u32> {
        match name {
            "datasent_kB" => Some(F_DATA_SENT),
            "datarecv_kB" => Some(F_DATA_RECEIVED),
            "dtype" => Some(F_DIRECTION),
            _ => None,
        }
    }

    fn is_ignored(name: &str) -> bool {
        matches!(name, "numdirs" | "numfiles")
    }

    fn apply_extension(&mut self, name: &str, token: &JsonToken) {
        match (name, token) {
            ("datasent_kB", JsonToken::Number(text)) => {
                self.data_sent_kb = leading_i64(text) as u32;
            }
            ("datarecv_kB", JsonToken::Number(text)) => {
                self.data_received_kb = leading_i64(text) as u32;
            }
            ("dtype", JsonToken::Str(text)) => {
                self.direction = Some(Direction::from_wire(text));
            }
            _ => {}
        }
    }
}

/// Streaming reconstruction state for one report file.
struct ConnectionImporter<'a, R: ConnectionRecord> {
    connections: &'a mut Vec<R>,
}

impl<R: ConnectionRecord> ConnectionImporter<'_, R> {
    fn on_event(&mut self, event: &JsonEvent<'_>) {
        if matches!(event.token, JsonToken::ObjectStart | JsonToken::ObjectEnd) {
            return;
        }
        if event.name == "connections" || R::is_ignored(event.name) {
            return;
        }

        let header_bit = ConnectionHeader::field_bit(event.name);
        if let Some(bit) = header_bit.or_else(|| R::extension_bit(event.name)) {
            // A recurrence of an already-populated field can only mean the
            // next array element has begun.
            if matches!(self.connections.last(), Some(tail) if tail.header().fields.is_set(bit)) {
                self.connections.push(R::default());
            } else if self.connections.is_empty() {
                self.connections.push(R::default());
            }
            if let Some(tail) = self.connections.last_mut() {
                if header_bit.is_some() {
                    tail.header_mut().apply(event.name, &event.token);
                } else {
                    tail.apply_extension(event.name, &event.token);
                }
                tail.header_mut().fields.set(bit);
            }
            return;
        }

        match &event.token {
            // A string inside an array cannot start a new entry; it belongs
            // to whichever warnings/errors array is open on the tail.
            JsonToken::Str(text) if event.path.ends_with(']') => {
                if let Some(tail) = self.connections.last_mut() {
                    tail.header_mut().push_note(text);
                }
            }
            JsonToken::ArrayEnd => {
                if let Some(tail) = self.connections.last_mut() {
                    tail.header_mut().finish_array();
                }
            }
            _ => {}
        }
    }
}

/// Aggregate result of one transmission run.
///
/// Built by [`EdgeContext::import_exec_status`]; both report files are
/// optional, and a missing file simply contributes zero entries.
#[derive(Debug, Default)]
pub struct ExecStatus {
    lb_connections: Vec<LbConnectionStatus>,
    hb_connections: Vec<HbConnectionStatus>,
    software_updated: bool,
}

impl ExecStatus {
    /// Low-bandwidth connection outcomes, in report order.
    pub fn lb_connections(&self) -> &[LbConnectionStatus] {
        &self.lb_connections
    }

    /// High-bandwidth connection outcomes, in report order.
    pub fn hb_connections(&self) -> &[HbConnectionStatus] {
        &self.hb_connections
    }

    /// `(lb_count, hb_count)`.
    pub fn counts(&self) -> (usize, usize) {
        (self.lb_connections.len(), self.hb_connections.len())
    }

    /// Whether the transport agent left the software-update marker behind.
    pub fn software_was_updated(&self) -> bool {
        self.software_updated
    }

    pub(crate) fn parse_lb_report(&mut self, text: &str) -> Result<()> {
        let mut importer = ConnectionImporter {
            connections: &mut self.lb_connections,
        };
        json::walk(text, |event| importer.on_event(event))
    }

    pub(crate) fn parse_hb_report(&mut self, text: &str) -> Result<()> {
        let mut importer = ConnectionImporter {
            connections: &mut self.hb_connections,
        };
        json::walk(text, |event| importer.on_event(event))
    }
}

impl EdgeContext {
    /// Import the execution status reports left by the last transmission
    /// run.
    ///
    /// Reads the LB and HB report files when present (a missing file is
    /// not an error) and checks for the software-update marker.
    pub fn import_exec_status(&self) -> Result<ExecStatus> {
        let mut exec_status = ExecStatus::default();

        let lb_path = self.base_path().join(LB_EXEC_STATUS_FILE);
        if lb_path.exists() {
            let text = fs::read_to_string(&lb_path).map_err(|_| Error::InvalidFormat)?;
            exec_status.parse_lb_report(&text)?;
        }

        let hb_path = self.base_path().join(HB_EXEC_STATUS_FILE);
        if hb_path.exists() {
            let text = fs::read_to_string(&hb_path).map_err(|_| Error::InvalidFormat)?;
            exec_status.parse_hb_report(&text)?;
        }

        exec_status.software_updated = self.base_path().join(SW_UPDATE_STATUS_FILE).exists();

        let (lb_count, hb_count) = exec_status.counts();
        log::debug!("imported exec status: {lb_count} LB, {hb_count} HB connection(s)");
        Ok(exec_status)
    }
}
