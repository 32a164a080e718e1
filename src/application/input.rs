//! Target resolution from a single source id or a tabular file
//!
//! A source ending in `.csv` or `.tsv` is read as a table with an `obj_id`
//! column and, for post/update, a column named after the annotation key.
//! Anything else is taken as a single source identifier.

use std::path::Path;

use tracing::{debug, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{coerce_value, Action, DomainError, Target};
use crate::infrastructure::traits::FileSystem;

/// Column holding source identifiers.
pub const OBJ_ID_COLUMN: &str = "obj_id";

/// Field delimiter for `source` if it names a tabular file.
pub fn tabular_delimiter(source: &str) -> Option<u8> {
    let ext = Path::new(source).extension()?.to_str()?;
    if ext.eq_ignore_ascii_case("csv") {
        Some(b',')
    } else if ext.eq_ignore_ascii_case("tsv") {
        Some(b'\t')
    } else {
        None
    }
}

/// Resolve the targets of a run.
///
/// Fails before any target is returned if a required column is missing or,
/// for post/update, any target lacks a value.
pub fn load_targets(
    fs: &dyn FileSystem,
    source: &str,
    action: Action,
    key: &str,
    value: Option<&str>,
) -> ApplicationResult<Vec<Target>> {
    let source = source.trim();
    let targets = match tabular_delimiter(source) {
        Some(delimiter) => read_table(fs, Path::new(source), delimiter, action, key)?,
        None => vec![single_target(source, action, value)?],
    };
    debug!("load_targets: {} target(s) from {}", targets.len(), source);
    Ok(targets)
}

fn single_target(source: &str, action: Action, value: Option<&str>) -> ApplicationResult<Target> {
    let value = value.filter(|v| !v.trim().is_empty()).map(coerce_value);
    if action.requires_value() && value.is_none() {
        return Err(DomainError::MissingValue {
            obj_id: source.to_string(),
        }
        .into());
    }
    Ok(Target::new(source, value))
}

fn read_table(
    fs: &dyn FileSystem,
    path: &Path,
    delimiter: u8,
    action: Action,
    key: &str,
) -> ApplicationResult<Vec<Target>> {
    let content = fs
        .read_to_string(path)
        .with_path_context("read input file", path)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| invalid_input(path, e))?
        .clone();

    let obj_id_col = column_index(&headers, OBJ_ID_COLUMN, path)?;
    let value_col = if action.requires_value() {
        Some(column_index(&headers, key, path)?)
    } else {
        None
    };

    let mut targets = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| invalid_input(path, e))?;

        let obj_id = record.get(obj_id_col).unwrap_or_default();
        if obj_id.is_empty() {
            warn!("{}: row {} has no {}, skipping", path.display(), row + 1, OBJ_ID_COLUMN);
            continue;
        }

        let value = match value_col {
            Some(col) => {
                let cell = record.get(col).unwrap_or_default();
                if cell.is_empty() {
                    return Err(DomainError::MissingValue {
                        obj_id: obj_id.to_string(),
                    }
                    .into());
                }
                Some(coerce_value(cell))
            }
            None => None,
        };

        targets.push(Target::new(obj_id, value));
    }
    Ok(targets)
}

fn column_index(
    headers: &csv::StringRecord,
    column: &str,
    path: &Path,
) -> ApplicationResult<usize> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| {
            DomainError::MissingColumn {
                column: column.to_string(),
                source_name: path.display().to_string(),
            }
            .into()
        })
}

fn invalid_input(path: &Path, e: csv::Error) -> ApplicationError {
    ApplicationError::InvalidInput {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
