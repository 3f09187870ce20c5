use crate::domain::model::FlatRecord;
use crate::domain::ports::WriteMode;
use crate::utils::encoding::TextEncoding;
use crate::utils::error::{LookupError, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Renders one record as a CSV line without the record terminator.
///
/// Fields containing a comma, quote or line break are quoted and embedded
/// quotes are doubled; nothing else is quoted.
pub fn render_line(record: &FlatRecord) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.serialize(record)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| LookupError::Io(std::io::Error::other(e.to_string())))?;
    let line = String::from_utf8(bytes)
        .map_err(|e| LookupError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    Ok(line.strip_suffix('\n').unwrap_or(&line).to_string())
}

/// Appends `line` and `separator` to `path` and closes the file again.
pub fn append_line(
    path: &Path,
    line: &str,
    separator: &str,
    encoding: TextEncoding,
    append: bool,
) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    file.write_all(&encoding.encode(line))?;
    file.write_all(&encoding.encode(separator))?;
    file.flush()?;
    Ok(())
}

/// The output file of one run.
pub struct CsvSink {
    path: PathBuf,
    encoding: TextEncoding,
    writer: Option<BufWriter<File>>,
    rows: usize,
}

impl CsvSink {
    /// Creates the file if needed. An existing file is appended to, never truncated.
    pub fn create(path: PathBuf, encoding: TextEncoding, mode: WriteMode) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let writer = match mode {
            WriteMode::Held => Some(BufWriter::new(file)),
            WriteMode::PerRecord => None,
        };

        Ok(Self {
            path,
            encoding,
            writer,
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn write_record(&mut self, record: &FlatRecord) -> Result<()> {
        let line = render_line(record)?;
        match self.writer.as_mut() {
            Some(writer) => {
                writer.write_all(&self.encoding.encode(&line))?;
                writer.write_all(&self.encoding.encode(LINE_SEPARATOR))?;
            }
            None => append_line(&self.path, &line, LINE_SEPARATOR, self.encoding, true)?,
        }
        self.rows += 1;
        Ok(())
    }

    /// Flushes buffered rows and closes the handle.
    pub fn finish(mut self) -> Result<PathBuf> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(self.path)
    }
}
