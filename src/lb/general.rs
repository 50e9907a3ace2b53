//! General-purpose single-parameter messages
//!
//! A general message carries exactly one identifier/value pair. The device
//! exports them into the device-originated folder under sequentially
//! numbered filenames; downlinked messages arrive in the device-targeted
//! folder and are imported through the same parameter parser the config
//! codec uses, minus the list semantics.

use std::fs;
use std::path::Path;

use crate::context::EdgeContext;
use crate::error::{Error, Result};
use crate::json::{self, JsonEvent, JsonToken};
use crate::presence::FieldMask;

use super::param::{Param, ParamId, ParamParser, ParamValue, write_param};
use super::{GENERAL_DO_FOLDER, GENERAL_DT_FOLDER};

const F_PAYLOAD: u32 = 1 << 0;

/// A single key/value message exchanged with the transport agent.
///
/// # Examples
///
/// ```rust
/// use edgelink::lb::{General, ParamValue};
///
/// let mut message = General::new();
/// message.set_payload("reboot_requested", ParamValue::Bool(true));
/// assert!(message.payload().is_some());
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct General {
    param: Param,
    fields: FieldMask,
}

impl General {
    /// Create an empty message with no payload set.
    pub fn new() -> Self {
        General::default()
    }

    /// Set the payload, classifying the value explicitly by variant.
    pub fn set_payload(&mut self, id: impl Into<ParamId>, value: ParamValue) {
        self.param = Param::new(id, value);
        self.fields.set(F_PAYLOAD);
    }

    /// The payload pair, or `None` if none has been set.
    pub fn payload(&self) -> Option<&Param> {
        if self.fields.is_set(F_PAYLOAD) {
            Some(&self.param)
        } else {
            None
        }
    }

    /// Render the single-pair document shape.
    ///
    /// Fails with `RequiredFieldMissing` when no payload has been set —
    /// checked before anything touches the filesystem.
    pub fn to_json(&self) -> Result<String> {
        if !self.fields.is_set(F_PAYLOAD) {
            return Err(Error::RequiredFieldMissing);
        }
        let mut out = String::from("{\n");
        write_param(&mut out, &self.param);
        out.push_str("\n}");
        Ok(out)
    }

    /// Rebuild a message from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut general = General::default();
        let mut importer = GeneralImporter {
            general: &mut general,
            parser: ParamParser::default(),
        };
        json::walk(text, |event| importer.on_event(event))?;
        Ok(general)
    }
}

/// Streaming reconstruction state for one general-message import.
struct GeneralImporter<'a> {
    general: &'a mut General,
    parser: ParamParser,
}

impl GeneralImporter<'_> {
    fn on_event(&mut self, event: &JsonEvent<'_>) {
        if matches!(event.token, JsonToken::ObjectStart | JsonToken::ObjectEnd) {
            return;
        }
        match event.name {
            "identifier" => {
                ParamParser::parse_identifier(&mut self.general.param, &event.token);
                self.general.fields.set(F_PAYLOAD);
            }
            "value" => {
                self.parser.parse_value(&mut self.general.param, &event.token);
                self.general.fields.set(F_PAYLOAD);
            }
            _ => match &event.token {
                JsonToken::Number(_) if event.path.ends_with(']') => {
                    self.parser.parse_value(&mut self.general.param, &event.token);
                }
                JsonToken::ArrayEnd => self.parser.finish_array(),
                _ => {}
            },
        }
    }
}

pub(crate) fn import_general_file(path: &Path) -> Result<General> {
    let text = fs::read_to_string(path).map_err(|_| Error::InvalidFormat)?;
    let general = General::from_json(&text)?;
    log::debug!("imported general message from {}", path.display());
    Ok(general)
}

impl EdgeContext {
    /// Export a general message as the next numbered device-originated
    /// file (`general_do_<N>.json`).
    ///
    /// The counter lives for the life of this context and only advances on
    /// a successful write, so numbering has no gaps.
    pub fn export_general(&mut self, general: &General) -> Result<()> {
        let rendered = general.to_json()?;

        let filename = format!("general_do_{}.json", self.general_do_count);
        let path = self
            .base_path()
            .join(GENERAL_DO_FOLDER)
            .join(&filename);
        fs::write(&path, rendered).map_err(|_| Error::FileOpen)?;

        self.general_do_count += 1;
        log::debug!("exported general message {filename}");
        Ok(())
    }

    /// Import one device-targeted general message by filename.
    pub fn import_general(&self, filename: &str) -> Result<General> {
        import_general_file(&self.base_path().join(GENERAL_DT_FOLDER).join(filename))
    }

    /// Import every `*.json` file in the device-targeted folder, in
    /// filename order, stopping at the first failure.
    pub fn import_all_general(&self) -> Result<Vec<General>> {
        let dir = self.base_path().join(GENERAL_DT_FOLDER);
        let filenames = crate::context::list_json_files(&dir)?;
        let mut messages = Vec::with_capacity(filenames.len());
        for filename in &filenames {
            messages.push(import_general_file(&dir.join(filename))?);
        }
        Ok(messages)
    }
}
