//! Excel export descriptors

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;

const XLSX_EXTENSION: &str = ".xlsx";
const URL_FIELDS: [&str; 3] = ["file_url", "file", "archivo"];
const NAME_FIELDS: [&str; 2] = ["nombre_archivo", "nombre"];

/// Reports the server can render as spreadsheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportKind {
    /// Work records
    Registros,
    /// Absences
    Ausencias,
    /// Time control entries
    ControlHoras,
}

impl ExportKind {
    /// Resource segment used in export URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registros => "registros",
            Self::Ausencias => "ausencias",
            Self::ControlHoras => "control-horas",
        }
    }

    /// Endpoint describing the most recently generated file.
    #[must_use]
    pub fn info_path(self) -> String {
        format!("/excel/{}/", self.as_str())
    }

    /// Endpoint that triggers generation of a new file.
    #[must_use]
    pub fn generate_path(self) -> String {
        format!("/excel/{}/generar/", self.as_str())
    }

    /// File name used when the server does not provide one.
    #[must_use]
    pub const fn default_file_name(self) -> &'static str {
        match self {
            Self::Registros => "registros.xlsx",
            Self::Ausencias => "ausencias.xlsx",
            Self::ControlHoras => "control_horas.xlsx",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registros" => Ok(Self::Registros),
            "ausencias" => Ok(Self::Ausencias),
            "control-horas" | "controlhoras" => Ok(Self::ControlHoras),
            other => Err(DomainError::UnknownExport(other.to_string())),
        }
    }
}

/// Server description of a generated spreadsheet.
///
/// Backends disagree on field names, so lookups go through ordered
/// fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportInfo {
    raw: Map<String, Value>,
}

impl ExportInfo {
    /// Wraps a raw object.
    #[must_use]
    pub const fn new(raw: Map<String, Value>) -> Self {
        Self { raw }
    }

    /// Download URL from `file_url`, `file` or `archivo`, in that order.
    #[must_use]
    pub fn file_url(&self) -> Option<&str> {
        first_text(&self.raw, &URL_FIELDS)
    }

    /// File name from `nombre_archivo` or `nombre`, falling back to the
    /// report default; always ends in `.xlsx`.
    #[must_use]
    pub fn file_name(&self, kind: ExportKind) -> String {
        let name = first_text(&self.raw, &NAME_FIELDS).unwrap_or_else(|| kind.default_file_name());
        if name.ends_with(XLSX_EXTENSION) {
            name.to_string()
        } else {
            format!("{name}{XLSX_EXTENSION}")
        }
    }

    /// Returns a raw field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.raw.get(field)
    }
}

fn first_text<'a>(raw: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|field| raw.get(*field).and_then(Value::as_str))
        .find(|value| !value.is_empty())
}
