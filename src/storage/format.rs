//! On-disk text format for tables
//!
//! One record per line, fields separated by commas. A field that contains a
//! comma, a double quote or a line break is wrapped in double quotes with
//! inner quotes doubled; every other field is written verbatim. Plain tables
//! therefore read as simple comma-joined lines.

use super::table::{Row, Table};
use crate::error::{Error, Result};

/// Field delimiter
pub const DELIMITER: char = ',';

const QUOTE: char = '"';

/// Encode a single field
pub fn encode_field(field: &str) -> String {
    if field.contains([DELIMITER, QUOTE, '\r', '\n']) {
        let mut out = String::with_capacity(field.len() + 2);
        out.push(QUOTE);
        for ch in field.chars() {
            if ch == QUOTE {
                out.push(QUOTE);
            }
            out.push(ch);
        }
        out.push(QUOTE);
        out
    } else {
        field.to_string()
    }
}

/// Encode a record as one line, without the trailing newline
pub fn encode_record(fields: &[String]) -> String {
    // A lone empty field would otherwise be indistinguishable from a blank line.
    if let [only] = fields {
        if only.is_empty() {
            return "\"\"".to_string();
        }
    }
    fields
        .iter()
        .map(|f| encode_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode every record in `text`. Blank lines are skipped.
pub fn decode_records(text: &str) -> Vec<Row> {
    let mut records = Vec::new();
    let mut fields: Row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut has_content = false;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    field.push(QUOTE);
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
            continue;
        }

        match ch {
            QUOTE if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
                has_content = true;
            }
            DELIMITER => {
                fields.push(std::mem::take(&mut field));
                quoted = false;
                has_content = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if has_content {
                    fields.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut fields));
                }
                quoted = false;
                has_content = false;
            }
            _ => {
                field.push(ch);
                has_content = true;
            }
        }
    }

    if has_content {
        fields.push(field);
        records.push(fields);
    }
    records
}

/// Parse a full table file. The first record is the header.
pub fn decode_table(name: &str, text: &str) -> Result<Table> {
    let mut records = decode_records(text).into_iter();
    let columns = records
        .next()
        .ok_or_else(|| Error::CorruptedTable(name.to_string()))?;
    Ok(Table::with_rows(name, columns, records.collect()))
}

/// Render a full table file, one record per line
pub fn encode_table(table: &Table) -> String {
    let mut out = encode_record(table.columns());
    out.push('\n');
    for row in table.rows() {
        out.push_str(&encode_record(row));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Row {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_plain_fields_verbatim() {
        assert_eq!(encode_record(&row(&["1", "Alice", "x y"])), "1,Alice,x y");
    }

    #[test]
    fn test_special_fields_quoted() {
        assert_eq!(encode_field("a,b"), "\"a,b\"");
        assert_eq!(encode_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(encode_record(&row(&[""])), "\"\"");
        assert_eq!(encode_record(&row(&["", ""])), ",");
    }

    #[test]
    fn test_decode_quoted_and_plain() {
        let records = decode_records("a,b\n\"x,y\",2\n\"he said \"\"no\"\"\",3\n");
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], row(&["x,y", "2"]));
        assert_eq!(records[2], row(&["he said \"no\"", "3"]));
    }

    #[test]
    fn test_decode_multiline_field_and_crlf() {
        let records = decode_records("a,b\r\n\"line1\nline2\",z\r\n");
        assert_eq!(records, vec![row(&["a", "b"]), row(&["line1\nline2", "z"])]);
    }

    #[test]
    fn test_decode_skips_blank_lines_and_keeps_empty_fields() {
        let records = decode_records("a,b\n\n1,\n\"\"\n");
        assert_eq!(records, vec![row(&["a", "b"]), row(&["1", ""]), row(&[""])]);
    }

    #[test]
    fn test_decode_header_without_newline() {
        let table = decode_table("t", "id,name").unwrap();
        assert_eq!(table.columns(), &row(&["id", "name"])[..]);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_decode_empty_file_is_corrupted() {
        assert!(matches!(decode_table("t", ""), Err(Error::CorruptedTable(_))));
    }

    #[test]
    fn test_table_text() {
        let table = Table::with_rows(
            "t",
            row(&["a", "b"]),
            vec![row(&["a,b", "2"]), row(&["3", "4"])],
        );
        let text = encode_table(&table);
        assert_eq!(text, "a,b\n\"a,b\",2\n3,4\n");
        assert_eq!(decode_table("t", &text).unwrap(), table);
    }
}
