// File: ./src/model/country.rs
//! Read-only code <-> name lookup for registered-address countries.
//! The table itself is configuration; this type only indexes it both ways.
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct CountryTable {
    by_code: HashMap<String, String>,
    by_name: HashMap<String, String>,
}

impl CountryTable {
    pub fn from_map(entries: &BTreeMap<String, String>) -> Self {
        let mut table = Self::default();
        for (code, name) in entries {
            let code = code.trim().to_uppercase();
            table.by_name.insert(name.trim().to_lowercase(), code.clone());
            table.by_code.insert(code, name.trim().to_string());
        }
        table
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.by_code
            .get(&code.trim().to_uppercase())
            .map(String::as_str)
    }

    pub fn code(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Display name for a code, falling back to the code itself.
    pub fn display(&self, code: &str) -> String {
        self.name(code)
            .map(str::to_string)
            .unwrap_or_else(|| code.trim().to_uppercase())
    }

    /// Accepts either a code or a known country name, returning the code.
    pub fn normalize(&self, input: &str) -> String {
        if let Some(code) = self.code(input) {
            return code.to_string();
        }
        input.trim().to_uppercase()
    }
}
