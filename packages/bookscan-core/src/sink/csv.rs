use crate::record::CanonicalRecord;
use std::io::{self, Write};

const SEP: char = ',';

fn needs_quotes(field: &str) -> bool {
    field.contains(SEP) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row to any writer.
fn write_row<W: Write, S: AsRef<str>>(w: &mut W, row: &[S]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        let cell = cell.as_ref();
        if !first {
            write!(w, "{}", SEP)?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// Write the header and one row per record.
pub fn write_csv<W: Write>(mut w: W, records: &[CanonicalRecord]) -> io::Result<()> {
    write_row(&mut w, &CanonicalRecord::CSV_HEADER[..])?;
    for record in records {
        write_row(&mut w, record.to_row().as_slice())?;
    }
    w.flush()
}

/// Render records as a UTF-8 CSV document.
pub fn to_csv_string(records: &[CanonicalRecord]) -> io::Result<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, records)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
