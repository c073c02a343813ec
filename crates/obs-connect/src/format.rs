//! File formats and file type detection
//!
//! Browse results show a MIME-like file type per object and the host
//! preselects a source format from it. Detection is by extension only.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// File type reported for unrecognized extensions
pub const UNKNOWN_FILE_TYPE: &str = "unknown";

/// Characters not allowed in a reference name
static INVALID_REFERENCE_CHARS: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"[^A-Za-z0-9_.\-]")
        .expect("reference name regex pattern is invalid - this is a bug")
});

/// Record formats understood by the file system implementation
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Text,
    Csv,
    Tsv,
    Delimited,
    Json,
    Avro,
    Parquet,
    Blob,
}

impl FileFormat {
    pub const ALL: [FileFormat; 8] = [
        Self::Text,
        Self::Csv,
        Self::Tsv,
        Self::Delimited,
        Self::Json,
        Self::Avro,
        Self::Parquet,
        Self::Blob,
    ];

    /// Lowercase name, as used in plugin properties
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Delimited => "delimited",
            Self::Json => "json",
            Self::Avro => "avro",
            Self::Parquet => "parquet",
            Self::Blob => "blob",
        }
    }

    /// Whether records are split on a user-supplied delimiter
    pub fn requires_delimiter(&self) -> bool {
        matches!(self, Self::Delimited)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name() == lower)
            .ok_or_else(|| {
                format!(
                    "unsupported format '{}', expected one of: {}",
                    s,
                    Self::ALL.map(|f| f.name()).join(", ")
                )
            })
    }
}

/// Detect a MIME-like file type from the extension of `path`
pub fn detect_file_type(path: &str) -> &'static str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let extension = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return UNKNOWN_FILE_TYPE,
    };

    match extension.as_str() {
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "txt" | "log" | "text" => "text/plain",
        "json" | "jsonl" | "ndjson" => "application/json",
        "avro" => "application/avro",
        "parquet" => "application/x-parquet",
        "xml" => "application/xml",
        "gz" | "gzip" => "application/gzip",
        "zip" => "application/zip",
        "bz2" => "application/x-bzip2",
        "snappy" => "application/x-snappy-framed",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => UNKNOWN_FILE_TYPE,
    }
}

/// Whether the host can sample records from a file of this type
pub fn is_sampleable(file_type: &str) -> bool {
    file_type.starts_with("text/")
        || matches!(
            file_type,
            "application/json" | "application/avro" | "application/x-parquet"
        )
}

/// Pick the source format matching a detected file type
pub fn detect_file_format(file_type: &str) -> FileFormat {
    match file_type {
        "text/csv" => FileFormat::Csv,
        "text/tab-separated-values" => FileFormat::Tsv,
        "application/json" => FileFormat::Json,
        "application/avro" => FileFormat::Avro,
        "application/x-parquet" => FileFormat::Parquet,
        _ => FileFormat::Text,
    }
}

/// Replace characters the host does not accept in reference names with `_`
pub fn cleanse_reference_name(name: &str) -> String {
    INVALID_REFERENCE_CHARS.replace_all(name, "_").into_owned()
}

/// Whether `name` is a valid reference name
pub fn is_valid_reference_name(name: &str) -> bool {
    !name.is_empty() && !INVALID_REFERENCE_CHARS.is_match(name)
}
