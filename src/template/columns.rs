use std::io::{BufRead, BufReader, Read, Seek};

use tracing::debug;

use super::guard::ReadGuard;
use crate::error::Result;

/// How a template line is split into cells.
///
/// The default splits on every comma with no quoting, which is the format the
/// downloadable template uses. `quoted` switches to RFC 4180 parsing so cells
/// may contain the delimiter (or newlines) inside double quotes. The header
/// and the data rows are always read with the same rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub quoted: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quoted: false,
        }
    }
}

impl Dialect {
    pub fn quoted() -> Self {
        Self {
            quoted: true,
            ..Self::default()
        }
    }

    fn csv_reader<R: Read>(&self, reader: R) -> csv::Reader<R> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(reader)
    }

    fn split(&self, line: &str) -> Vec<String> {
        line.split(char::from(self.delimiter))
            .map(str::to_string)
            .collect()
    }
}

fn trim_line_end(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// A line with nothing but whitespace on it. `","` is not blank.
fn is_blank<S: AsRef<str>>(cells: &[S]) -> bool {
    cells.len() <= 1 && cells.iter().all(|c| c.as_ref().trim().is_empty())
}

fn record_line(record: &csv::StringRecord) -> usize {
    record.position().map_or(0, |p| p.line() as usize)
}

/// Read the header (first line) of `stream` into trimmed column names.
///
/// The stream is rewound before and after the read. A blank header yields no
/// columns.
pub fn parse_columns<S: Read + Seek>(
    stream: &mut S,
    dialect: &Dialect,
    guard: &ReadGuard,
) -> Result<Vec<String>> {
    stream.rewind()?;
    guard.check()?;
    let header = read_header(&mut *stream, dialect);
    stream.rewind()?;

    let mut cells = header?;
    if let Some(first) = cells.first_mut() {
        if let Some(rest) = first.strip_prefix('\u{feff}') {
            *first = rest.to_string();
        }
    }
    if is_blank(&cells) {
        debug!("template header is empty");
        return Ok(Vec::new());
    }
    let columns: Vec<String> = cells.iter().map(|c| c.trim().to_string()).collect();
    debug!(count = columns.len(), "parsed template header");
    Ok(columns)
}

fn read_header<R: Read>(stream: R, dialect: &Dialect) -> Result<Vec<String>> {
    if dialect.quoted {
        let mut record = csv::StringRecord::new();
        // The csv reader skips empty lines, so a record past line 1 means the
        // header line itself was blank.
        if !dialect.csv_reader(stream).read_record(&mut record)? || record_line(&record) != 1 {
            return Ok(Vec::new());
        }
        return Ok(record.iter().map(str::to_string).collect());
    }
    let mut line = String::new();
    BufReader::new(stream).read_line(&mut line)?;
    Ok(dialect.split(trim_line_end(&line)))
}

/// Feed every non-blank data row (everything after the header) to `f`, along
/// with its 1-based line number in the file. Cells are not trimmed.
///
/// The stream is rewound before reading and again once reading stops.
pub fn for_each_row<S, F>(
    stream: &mut S,
    dialect: &Dialect,
    guard: &ReadGuard,
    mut f: F,
) -> Result<()>
where
    S: Read + Seek,
    F: FnMut(usize, &[String]) -> Result<()>,
{
    stream.rewind()?;
    let result = if dialect.quoted {
        read_quoted_rows(&mut *stream, dialect, guard, &mut f)
    } else {
        read_plain_rows(&mut *stream, dialect, guard, &mut f)
    };
    let rewound = stream.rewind();
    result?;
    rewound?;
    Ok(())
}

fn read_quoted_rows<R, F>(stream: R, dialect: &Dialect, guard: &ReadGuard, f: &mut F) -> Result<()>
where
    R: Read,
    F: FnMut(usize, &[String]) -> Result<()>,
{
    let mut rdr = dialect.csv_reader(stream);
    let mut record = csv::StringRecord::new();
    let mut header_pending = true;
    loop {
        guard.check()?;
        if !rdr.read_record(&mut record)? {
            break;
        }
        let line_no = record_line(&record);
        if header_pending {
            header_pending = false;
            // A first record past line 1 is data under a blank header line.
            if line_no == 1 {
                continue;
            }
        }
        let values: Vec<String> = record.iter().map(str::to_string).collect();
        if is_blank(&values) {
            continue;
        }
        f(line_no, &values)?;
    }
    Ok(())
}

fn read_plain_rows<R, F>(stream: R, dialect: &Dialect, guard: &ReadGuard, f: &mut F) -> Result<()>
where
    R: Read,
    F: FnMut(usize, &[String]) -> Result<()>,
{
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    guard.check()?;
    if reader.read_line(&mut line)? == 0 {
        return Ok(());
    }

    let mut line_no = 1;
    loop {
        guard.check()?;
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_no += 1;
        let row = trim_line_end(&line);
        if row.trim().is_empty() {
            continue;
        }
        f(line_no, &dialect.split(row))?;
    }
    Ok(())
}
