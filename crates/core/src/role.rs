//! Semantic roles, grouping dimensions and the keyword table used to guess them.

use crate::error::{DashboardError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ventas_sheet::{Sheet, SheetError};

/// A semantic column of the sales schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Region,
    Vendedor,
    Unidades,
    Ventas,
    Fecha,
}

impl Role {
    /// Every role in canonical order.
    pub const ALL: [Role; 5] = [
        Role::Region,
        Role::Vendedor,
        Role::Unidades,
        Role::Ventas,
        Role::Fecha,
    ];

    /// Roles that must be present after mapping.
    pub const REQUIRED: [Role; 4] = [Role::Region, Role::Vendedor, Role::Unidades, Role::Ventas];

    /// The column name this role is renamed to.
    #[must_use]
    pub fn canonical_name(self) -> &'static str {
        match self {
            Role::Region => "region",
            Role::Vendedor => "vendedor",
            Role::Unidades => "unidades",
            Role::Ventas => "ventas",
            Role::Fecha => "fecha",
        }
    }

    /// Index of this role's canonical column in a mapped sheet.
    pub fn index_in(self, sheet: &Sheet) -> Result<usize> {
        let name = self.canonical_name();
        sheet.column_index(name).ok_or_else(|| {
            SheetError::ColumnNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl FromStr for Role {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "region" | "región" => Ok(Role::Region),
            "vendedor" | "salesperson" => Ok(Role::Vendedor),
            "unidades" | "units" => Ok(Role::Unidades),
            "ventas" | "sales" => Ok(Role::Ventas),
            "fecha" | "date" => Ok(Role::Fecha),
            _ => Err(DashboardError::invalid("role", s)),
        }
    }
}

/// A column the aggregator can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    #[default]
    Region,
    Vendedor,
}

impl Dimension {
    /// The role whose column this dimension groups by.
    #[must_use]
    pub fn role(self) -> Role {
        match self {
            Dimension::Region => Role::Region,
            Dimension::Vendedor => Role::Vendedor,
        }
    }

    #[must_use]
    pub fn column(self) -> &'static str {
        self.role().canonical_name()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Dimension {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.parse::<Role>() {
            Ok(Role::Region) => Ok(Dimension::Region),
            Ok(Role::Vendedor) => Ok(Dimension::Vendedor),
            _ => Err(DashboardError::invalid("dimension", s)),
        }
    }
}

/// Ordered keyword synonyms per role.
///
/// Matching is case-insensitive and whitespace-trimmed; earlier keywords win.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordTable {
    keywords: IndexMap<Role, Vec<String>>,
}

impl KeywordTable {
    /// Keywords for a role, in priority order.
    #[must_use]
    pub fn keywords(&self, role: Role) -> &[String] {
        self.keywords.get(&role).map(Vec::as_slice).unwrap_or_default()
    }

    /// Replace the keywords of one role.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, role: Role, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords
            .insert(role, keywords.into_iter().map(Into::into).collect());
        self
    }

    /// Parse a JSON object of `role -> [keywords]`.
    ///
    /// Roles missing from the object keep the default keywords.
    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: IndexMap<String, Vec<String>> = serde_json::from_str(json)?;
        overrides
            .into_iter()
            .try_fold(Self::default(), |table, (role, keywords)| {
                Ok(table.with_keywords(role.parse()?, keywords))
            })
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        let table: [(Role, &[&str]); 5] = [
            (Role::Region, &["región", "region", "zona", "area"]),
            (
                Role::Vendedor,
                &[
                    "vendedor",
                    "ejecutivo",
                    "asesor",
                    "salesperson",
                    "nombre",
                    "nombre vendedor",
                    "vendedores",
                ],
            ),
            (
                Role::Unidades,
                &["unidades vendidas", "unidades", "qty", "cantidad"],
            ),
            (
                Role::Ventas,
                &["ventas totales", "ventas", "monto", "sales", "importe"],
            ),
            (Role::Fecha, &["fecha", "date"]),
        ];

        Self {
            keywords: table
                .into_iter()
                .map(|(role, words)| (role, words.iter().map(|w| (*w).to_string()).collect()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("ventas".parse::<Role>().unwrap(), Role::Ventas);
        assert_eq!(" Región ".parse::<Role>().unwrap(), Role::Region);
        assert_eq!("units".parse::<Role>().unwrap(), Role::Unidades);
        assert!("monto".parse::<Role>().is_err());
    }

    #[test]
    fn test_dimension_parse() {
        assert_eq!("vendedor".parse::<Dimension>().unwrap(), Dimension::Vendedor);
        assert!("ventas".parse::<Dimension>().is_err());
        assert_eq!(Dimension::default().column(), "region");
    }

    #[test]
    fn test_default_keywords_order() {
        let table = KeywordTable::default();
        assert_eq!(table.keywords(Role::Ventas)[0], "ventas totales");
        assert_eq!(table.keywords(Role::Vendedor).len(), 7);
        assert_eq!(table.keywords(Role::Fecha), ["fecha", "date"]);
    }

    #[test]
    fn test_keywords_from_json_merges_defaults() {
        let table = KeywordTable::from_json(r#"{"ventas": ["revenue", "ventas"]}"#).unwrap();
        assert_eq!(table.keywords(Role::Ventas), ["revenue", "ventas"]);
        assert_eq!(table.keywords(Role::Region)[0], "región");
    }

    #[test]
    fn test_keywords_from_json_rejects_unknown_role() {
        let err = KeywordTable::from_json(r#"{"precio": ["p"]}"#).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidValue { kind: "role", .. }));
    }
}
