use serde::Serialize;

use crate::error::ValidationError;

pub const MAX_NAME_CHARS: usize = 5;
const DEFAULT_FIRST_NAME: &str = "A";
const DEFAULT_SECOND_NAME: &str = "B";

/// Display names of the two members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub first_name: String,
    pub second_name: String,
    pub updated_at: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            first_name: DEFAULT_FIRST_NAME.into(),
            second_name: DEFAULT_SECOND_NAME.into(),
            updated_at: String::new(),
        }
    }
}

impl Settings {
    /// Trim and length-check user input. Blank names are stored blank and
    /// resolved to the defaults on read.
    pub fn from_input(
        first: &str,
        second: &str,
        updated_at: String,
    ) -> Result<Self, ValidationError> {
        let first = first.trim();
        let second = second.trim();
        if first.chars().count() > MAX_NAME_CHARS || second.chars().count() > MAX_NAME_CHARS {
            return Err(ValidationError::InvalidLength);
        }
        Ok(Self {
            first_name: first.to_string(),
            second_name: second.to_string(),
            updated_at,
        })
    }

    /// Replace blank fields with defaults.
    pub fn resolved(self) -> Self {
        let def = Self::default();
        Self {
            first_name: non_blank(self.first_name, def.first_name),
            second_name: non_blank(self.second_name, def.second_name),
            updated_at: self.updated_at,
        }
    }
}

fn non_blank(value: String, fallback: String) -> String {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
