//! Column mapping: guess which raw column plays each role, then rename.

use crate::error::{DashboardError, Result};
use crate::role::{KeywordTable, Role};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use ventas_sheet::Sheet;

/// Normalized lookup key for header matching.
fn lookup_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Guess the column for one role.
///
/// Returns the first keyword (in order) that matches an available column,
/// compared case-insensitively after trimming. When two columns share a key,
/// the later column wins.
#[must_use]
pub fn guess_role<'a, S: AsRef<str>>(keywords: &[S], columns: &[&'a str]) -> Option<&'a str> {
    let lookup: HashMap<String, &'a str> = columns
        .iter()
        .map(|column| (lookup_key(column), *column))
        .collect();

    keywords
        .iter()
        .find_map(|keyword| lookup.get(&lookup_key(keyword.as_ref())).copied())
}

/// The user-confirmed assignment of raw columns to roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    columns: IndexMap<Role, String>,
    use_fecha: bool,
}

impl ColumnMapping {
    /// Create an empty mapping (no roles assigned, no date column).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a mapping from keyword guesses over the sheet's text columns.
    ///
    /// The date toggle is turned on when a date column was guessed.
    #[must_use]
    pub fn guess(keywords: &KeywordTable, sheet: &Sheet) -> Self {
        let available = sheet.text_column_names();
        let mut mapping = Self::new();

        for role in Role::ALL {
            if let Some(column) = guess_role(keywords.keywords(role), &available) {
                tracing::debug!(%role, column, "guessed column");
                mapping.columns.insert(role, column.to_string());
            }
        }

        mapping.use_fecha = mapping.columns.contains_key(&Role::Fecha);
        mapping
    }

    /// The raw column chosen for a role, if any.
    #[must_use]
    pub fn column(&self, role: Role) -> Option<&str> {
        self.columns.get(&role).map(String::as_str)
    }

    /// Choose the raw column for a role.
    pub fn set(&mut self, role: Role, column: impl Into<String>) {
        self.columns.insert(role, column.into());
        if role == Role::Fecha {
            self.use_fecha = true;
        }
    }

    /// Remove the choice for a role.
    pub fn clear(&mut self, role: Role) {
        self.columns.shift_remove(&role);
    }

    #[must_use]
    pub fn use_fecha(&self) -> bool {
        self.use_fecha
    }

    /// Toggle whether the file has a date column.
    pub fn set_use_fecha(&mut self, use_fecha: bool) {
        self.use_fecha = use_fecha;
    }

    /// Effective assignments in canonical role order; the date role only
    /// when the date toggle is on.
    pub fn assignments(&self) -> impl Iterator<Item = (Role, &str)> {
        Role::ALL.into_iter().filter_map(move |role| {
            if role == Role::Fecha && !self.use_fecha {
                return None;
            }
            self.column(role).map(|column| (role, column))
        })
    }

    /// Check that every chosen column is a text column of the sheet.
    pub fn validate(&self, sheet: &Sheet) -> Result<()> {
        let available = sheet.text_column_names();
        for (role, column) in self.assignments() {
            if !available.contains(&column) {
                return Err(DashboardError::UnknownColumn {
                    role,
                    column: column.to_string(),
                    available: available.iter().map(|c| (*c).to_string()).collect(),
                });
            }
        }
        Ok(())
    }
}

/// Rename the chosen raw columns to their canonical names.
///
/// Unchosen columns are kept as they are. When two roles pick the same raw
/// column the later role (in canonical order) gets it.
///
/// # Errors
///
/// `MissingColumns` names every required role absent after renaming;
/// `DuplicateColumn` is returned when two columns share a name after renaming.
pub fn apply_mapping(sheet: &Sheet, mapping: &ColumnMapping) -> Result<Sheet> {
    let mut renames: BTreeMap<usize, Role> = BTreeMap::new();
    for (role, column) in mapping.assignments() {
        if let Some(index) = sheet.column_index(column) {
            renames.insert(index, role);
        }
    }

    let mut mapped = sheet.clone();
    for (&index, role) in &renames {
        mapped.rename_column(index, role.canonical_name())?;
    }

    let missing: Vec<Role> = Role::REQUIRED
        .into_iter()
        .filter(|role| !mapped.has_column(role.canonical_name()))
        .collect();
    if !missing.is_empty() {
        tracing::warn!(?missing, "required columns missing after mapping");
        return Err(DashboardError::MissingColumns { missing });
    }

    let mut seen = HashSet::new();
    if let Some(name) = mapped
        .column_names()
        .into_iter()
        .find(|name| !seen.insert(name.clone()))
    {
        return Err(DashboardError::DuplicateColumn { name });
    }

    Ok(mapped)
}
