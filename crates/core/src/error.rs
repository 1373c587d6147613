//! Error types for ventas.

use crate::role::Role;
use thiserror::Error;
use ventas_sheet::SheetError;

/// Result type for dashboard operations.
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Errors that can occur while loading, mapping or querying sales data.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// No upload was given and the default file does not exist, or the source has no rows.
    #[error("No data: upload a spreadsheet or place {default_file} in the working directory")]
    EmptySource { default_file: String },

    /// Required canonical columns are absent after applying the column mapping.
    #[error("Missing required columns: {}", join_roles(.missing))]
    MissingColumns { missing: Vec<Role> },

    /// A rename would leave two columns with the same name.
    #[error("Duplicate column after mapping: {name}")]
    DuplicateColumn { name: String },

    /// The mapping names a column the table does not have.
    #[error("Unknown column '{column}' for {role}; available: {}", .available.join(", "))]
    UnknownColumn {
        role: Role,
        column: String,
        available: Vec<String>,
    },

    /// A filter or detail choice that is not among the current options.
    #[error("'{value}' is not a {column} in the current selection")]
    UnknownChoice { column: String, value: String },

    /// A value that does not name a role, dimension or chart.
    #[error("Invalid {kind}: '{value}'")]
    InvalidValue { kind: &'static str, value: String },

    /// The source could not be read (corrupt or unsupported file).
    #[error("Could not read the spreadsheet: {0}")]
    Read(#[from] SheetError),

    /// I/O error while reading a source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DashboardError {
    /// Create an invalid value error.
    pub fn invalid(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            kind,
            value: value.into(),
        }
    }

    /// Whether the user can fix this error by changing a choice or the mapping.
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::MissingColumns { .. }
                | Self::DuplicateColumn { .. }
                | Self::UnknownColumn { .. }
                | Self::UnknownChoice { .. }
                | Self::InvalidValue { .. }
        )
    }
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|role| role.canonical_name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_names_columns() {
        let err = DashboardError::MissingColumns {
            missing: vec![Role::Unidades, Role::Ventas],
        };
        assert_eq!(err.to_string(), "Missing required columns: unidades, ventas");
        assert!(err.is_user_correctable());
    }

    #[test]
    fn test_read_error_is_not_user_correctable() {
        let err = DashboardError::from(SheetError::Spreadsheet("corrupt".to_string()));
        assert!(!err.is_user_correctable());
        assert!(err.to_string().starts_with("Could not read the spreadsheet"));
    }
}
