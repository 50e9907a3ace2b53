//! Configuration message record and streaming import
//!
//! Config files are produced by the transport agent and consumed by the
//! device. Each file carries a `params` array of identifier/value objects;
//! the importer rebuilds the ordered parameter list from the flat event
//! stream without lookahead, opening a new list entry whenever a field
//! that is already populated on the current entry recurs.

use std::fs;
use std::path::Path;

use crate::context::EdgeContext;
use crate::error::{Error, Result};
use crate::json::{self, JsonEvent, JsonToken};
use crate::presence::FieldMask;

use super::CONFIG_FOLDER;
use super::param::{Param, ParamParser, write_param};

const F_PARAMS: u32 = 1 << 0;

/// An ordered list of configuration parameters.
///
/// Built either programmatically through [`push_param`](Config::push_param)
/// or by importing a config file; insertion order matches the JSON array
/// order of the source file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Config {
    params: Vec<Param>,
    fields: FieldMask,
}

impl Config {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Config::default()
    }

    /// The parameters in order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Whether at least one parameter is present.
    pub fn has_params(&self) -> bool {
        self.fields.is_set(F_PARAMS)
    }

    /// Append a parameter, preserving insertion order.
    pub fn push_param(&mut self, param: Param) {
        self.params.push(param);
        self.fields.set(F_PARAMS);
    }

    /// Render the `{"params":[...]}` document shape.
    pub fn to_json(&self) -> String {
        let mut out = String::from("{\n\"params\":[");
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str("\n{\n");
            write_param(&mut out, param);
            out.push_str("\n}");
        }
        out.push_str("\n]\n}");
        out
    }

    /// Rebuild a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut config = Config::default();
        let mut importer = ConfigImporter {
            config: &mut config,
            parser: ParamParser::default(),
        };
        json::walk(text, |event| importer.on_event(event))?;
        Ok(config)
    }
}

/// Streaming reconstruction state for one config import.
struct ConfigImporter<'a> {
    config: &'a mut Config,
    parser: ParamParser,
}

impl ConfigImporter<'_> {
    fn on_event(&mut self, event: &JsonEvent<'_>) {
        if matches!(event.token, JsonToken::ObjectStart | JsonToken::ObjectEnd) {
            return;
        }
        if event.name == "params" {
            // Start of the params array itself, nothing to record yet.
            return;
        }

        match event.name {
            "identifier" => {
                // A second identifier on the same entry means the stream
                // moved on to the next array element.
                if self.needs_new_entry(|p| p.id.is_some()) {
                    self.config.params.push(Param::default());
                }
                if let Some(param) = self.config.params.last_mut() {
                    ParamParser::parse_identifier(param, &event.token);
                }
                self.config.fields.set(F_PARAMS);
            }
            "value" => {
                // Independently tracked: a recurring value also closes out
                // the previous entry, whatever state its identifier is in.
                if self.needs_new_entry(|p| p.value.is_some()) {
                    self.config.params.push(Param::default());
                }
                if let Some(param) = self.config.params.last_mut() {
                    self.parser.parse_value(param, &event.token);
                }
                self.config.fields.set(F_PARAMS);
            }
            _ => match &event.token {
                // A bare number whose path ends inside an array is byte
                // data for the value currently being accumulated.
                JsonToken::Number(_) if event.path.ends_with(']') => {
                    if let Some(param) = self.config.params.last_mut() {
                        self.parser.parse_value(param, &event.token);
                    }
                }
                JsonToken::ArrayEnd => self.parser.finish_array(),
                _ => {}
            },
        }
    }

    /// True when the current tail entry already has the field about to be
    /// written; an empty list instead gets its first entry allocated.
    fn needs_new_entry(&mut self, populated: impl Fn(&Param) -> bool) -> bool {
        if self.config.params.is_empty() {
            self.config.params.push(Param::default());
            return false;
        }
        self.config.params.last().is_some_and(populated)
    }
}

pub(crate) fn import_config_file(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path).map_err(|_| Error::InvalidFormat)?;
    let config = Config::from_json(&text)?;
    log::debug!(
        "imported {} param(s) from {}",
        config.params().len(),
        path.display()
    );
    Ok(config)
}

impl EdgeContext {
    /// Import one configuration file from the config folder.
    pub fn import_config(&self, filename: &str) -> Result<Config> {
        import_config_file(&self.base_path().join(CONFIG_FOLDER).join(filename))
    }

    /// Import every `*.json` file in the config folder, in filename order.
    ///
    /// Stops at the first file that fails to import and propagates its
    /// error.
    pub fn import_all_config(&self) -> Result<Vec<Config>> {
        let dir = self.base_path().join(CONFIG_FOLDER);
        let filenames = crate::context::list_json_files(&dir)?;
        let mut configs = Vec::with_capacity(filenames.len());
        for filename in &filenames {
            configs.push(import_config_file(&dir.join(filename))?);
        }
        Ok(configs)
    }
}
