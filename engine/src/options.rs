//! UCI option declarations and the table an engine keeps them in.
//!
//! Option names are case-insensitive, as in the UCI protocol. Values are
//! stored as text and validated against the declared type when set.

use crate::EngineError;

pub const VARIANT_OPTION: &str = "UCI_Variant";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    Check { default: bool },
    Spin { default: i64, min: i64, max: i64 },
    Combo { default: String, vars: Vec<String> },
    String { default: String },
    Button,
}

impl OptionKind {
    fn default_value(&self) -> String {
        match self {
            OptionKind::Check { default } => default.to_string(),
            OptionKind::Spin { default, .. } => default.to_string(),
            OptionKind::Combo { default, .. } => default.clone(),
            OptionKind::String { default } => default.clone(),
            OptionKind::Button => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UciOption {
    pub name: String,
    pub kind: OptionKind,
    value: String,
}

impl UciOption {
    pub fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        let value = kind.default_value();
        Self {
            name: name.into(),
            kind,
            value,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Validate `value` against the declared type and return its canonical
    /// text form.
    fn validate(&self, value: &str) -> Result<String, EngineError> {
        let invalid = || EngineError::InvalidOptionValue {
            name: self.name.clone(),
            value: value.to_string(),
        };

        match &self.kind {
            OptionKind::Check { .. } => match value.to_ascii_lowercase().as_str() {
                "true" => Ok("true".to_string()),
                "false" => Ok("false".to_string()),
                _ => Err(invalid()),
            },
            OptionKind::Spin { min, max, .. } => {
                let parsed: i64 = value.parse().map_err(|_| invalid())?;
                if parsed < *min || parsed > *max {
                    return Err(invalid());
                }
                Ok(parsed.to_string())
            }
            OptionKind::Combo { vars, .. } => vars
                .iter()
                .find(|var| var.eq_ignore_ascii_case(value))
                .cloned()
                .ok_or_else(|| {
                    if self.name.eq_ignore_ascii_case(VARIANT_OPTION) {
                        EngineError::UnknownVariant(value.to_string())
                    } else {
                        invalid()
                    }
                }),
            OptionKind::String { .. } => Ok(value.to_string()),
            OptionKind::Button => Ok(String::new()),
        }
    }
}

/// Options known to an engine, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct OptionsTable {
    options: Vec<UciOption>,
}

impl OptionsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an option, replacing an earlier declaration of the same name.
    pub fn declare(&mut self, option: UciOption) {
        match self
            .options
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(&option.name))
        {
            Some(existing) => *existing = option,
            None => self.options.push(option),
        }
    }

    pub fn with(mut self, name: &str, kind: OptionKind) -> Self {
        self.declare(UciOption::new(name, kind));
        self
    }

    pub fn get(&self, name: &str) -> Option<&UciOption> {
        self.options
            .iter()
            .find(|option| option.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a known option. Returns the canonical name and value that were
    /// stored.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(&str, &str), EngineError> {
        let option = self
            .options
            .iter_mut()
            .find(|option| option.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| EngineError::UnknownOption(name.to_string()))?;

        option.value = option.validate(value.trim())?;
        Ok((&option.name, &option.value))
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(UciOption::value)
    }

    pub fn spin(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(|value| value.parse().ok())
    }

    pub fn check(&self, name: &str) -> Option<bool> {
        self.value(name).map(|value| value == "true")
    }

    pub fn names(&self) -> Vec<String> {
        self.options.iter().map(|option| option.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UciOption> {
        self.options.iter()
    }
}
