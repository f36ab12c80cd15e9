//! CSV loader for the Ideate idea table.
//!
//! The backing table is a flat CSV file with the header
//! `app_id,app_name,source,idea_1,...,idea_10`. It is read exactly once at
//! process start; any failure is fatal — no partial corpus is ever served.

pub mod error;

pub use error::{Error, Result};

use std::{io::Read, path::Path};

use ideate_core::corpus::IdeaRecord;

/// Read the idea table at `path`. A missing file, unreadable bytes, or a
/// malformed row all surface as [`Error::DataUnavailable`].
pub fn load_idea_table(path: impl AsRef<Path>) -> Result<Vec<IdeaRecord>> {
  let path = path.as_ref();
  let file = std::fs::File::open(path).map_err(|e| {
    Error::DataUnavailable(format!("cannot open {}: {e}", path.display()))
  })?;
  read_idea_table(file)
}

/// Read the idea table from any byte stream. Split out from
/// [`load_idea_table`] so tests can parse in-memory fixtures.
pub fn read_idea_table(reader: impl Read) -> Result<Vec<IdeaRecord>> {
  let mut csv_reader = csv::ReaderBuilder::new()
    .trim(csv::Trim::Headers)
    .from_reader(reader);

  let mut records = Vec::new();
  for row in csv_reader.deserialize() {
    let record: IdeaRecord = row
      .map_err(|e| Error::DataUnavailable(format!("malformed row: {e}")))?;
    records.push(record);
  }
  Ok(records)
}

#[cfg(test)]
mod tests {
  use ideate_core::source::Source;

  use super::*;

  const HEADER: &str = "app_id,app_name,source,idea_1,idea_2,idea_3,idea_4,\
                        idea_5,idea_6,idea_7,idea_8,idea_9,idea_10";

  /// One CSV row: identity fields plus exactly ten idea slots.
  fn row(app_id: &str, app_name: &str, source: &str, ideas: &[&str]) -> String {
    let mut slots = vec![""; 10];
    slots[..ideas.len()].copy_from_slice(ideas);
    format!("{app_id},{app_name},{source},{}", slots.join(","))
  }

  #[test]
  fn parses_rows_with_blank_slots() {
    let table = format!(
      "{HEADER}\n{}\n{}\n",
      row("X", "Ex", "DBGNN", &["A", "", "B"]),
      row("NA", "NA", "VALIDATION", &["V1", "V2"]),
    );
    let records = read_idea_table(table.as_bytes()).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].app_id, "X");
    assert_eq!(records[0].source, Source::Dbgnn);
    assert_eq!(records[0].idea_1, "A");
    assert_eq!(records[0].idea_2, "");
    assert_eq!(records[0].idea_3, "B");
    assert_eq!(records[1].source, Source::Validation);
  }

  #[test]
  fn unknown_source_label_is_fatal() {
    let table =
      format!("{HEADER}\n{}\n", row("X", "Ex", "NOT_A_SOURCE", &["A"]));
    let err = read_idea_table(table.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::DataUnavailable(_)));
  }

  #[test]
  fn missing_file_is_data_unavailable() {
    let err = load_idea_table("/nonexistent/ideas.csv").unwrap_err();
    assert!(matches!(err, Error::DataUnavailable(_)));
  }

  #[test]
  fn quoted_fields_with_commas_survive() {
    let table = format!(
      "{HEADER}\n{}\n",
      row("X", "Ex", "COT", &["\"first, with comma\""]),
    );
    let records = read_idea_table(table.as_bytes()).unwrap();
    assert_eq!(records[0].idea_1, "first, with comma");
  }
}
