//! Per-object configuration from `@attr value` creation arguments.

use thiserror::Error;

use crate::atom::Atom;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown attribute '@{0}'")]
    UnknownAttribute(String),
    #[error("attribute '@{0}' needs a value")]
    MissingValue(String),
    #[error("bad value '{value}' for attribute '@{attr}'")]
    BadValue { attr: String, value: String },
    #[error("unexpected argument '{0}', attributes start with '@'")]
    Stray(String),
}

/// Persisted attributes of a script object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectConfig {
    /// Requested namespace name.
    pub name: Option<String>,
    /// Default source file for `execfile`, `load` and `read`.
    pub file: Option<String>,
    /// Load `file` when the object is created.
    pub autoload: bool,
    /// Run the editor buffer every time it is saved.
    pub run_on_save: bool,
    /// Extra `sys.path` entry.
    pub pythonpath: Option<String>,
    /// Post every request to the console.
    pub debug: bool,
}

impl ObjectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `@attr value` pairs.
    pub fn from_atoms(atoms: &[Atom]) -> Result<Self, ConfigError> {
        let mut config = ObjectConfig::default();
        let mut rest = atoms;
        while let Some((head, tail)) = rest.split_first() {
            let attr = head
                .as_symbol()
                .and_then(|s| s.strip_prefix('@'))
                .ok_or_else(|| ConfigError::Stray(head.to_string()))?;
            let (value, tail) = tail
                .split_first()
                .ok_or_else(|| ConfigError::MissingValue(attr.to_string()))?;
            match attr {
                "name" => config.name = Some(text_value(attr, value)?),
                "file" => config.file = Some(text_value(attr, value)?),
                "pythonpath" => config.pythonpath = Some(text_value(attr, value)?),
                "autoload" => config.autoload = flag_value(attr, value)?,
                "run_on_save" => config.run_on_save = flag_value(attr, value)?,
                "debug" => config.debug = flag_value(attr, value)?,
                _ => return Err(ConfigError::UnknownAttribute(attr.to_string())),
            }
            rest = tail;
        }
        Ok(config)
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    #[must_use]
    pub fn autoload(mut self, on: bool) -> Self {
        self.autoload = on;
        self
    }

    #[must_use]
    pub fn run_on_save(mut self, on: bool) -> Self {
        self.run_on_save = on;
        self
    }

    #[must_use]
    pub fn pythonpath(mut self, dir: impl Into<String>) -> Self {
        self.pythonpath = Some(dir.into());
        self
    }

    #[must_use]
    pub fn debug(mut self, on: bool) -> Self {
        self.debug = on;
        self
    }
}

fn text_value(attr: &str, value: &Atom) -> Result<String, ConfigError> {
    match value {
        Atom::Symbol(s) => Ok(s.clone()),
        other => Err(bad_value(attr, other)),
    }
}

fn flag_value(attr: &str, value: &Atom) -> Result<bool, ConfigError> {
    match value {
        Atom::Int(n) => Ok(*n != 0),
        other => Err(bad_value(attr, other)),
    }
}

#[cold]
fn bad_value(attr: &str, value: &Atom) -> ConfigError {
    ConfigError::BadValue {
        attr: attr.to_string(),
        value: value.to_string(),
    }
}
