//! Append-only record destinations.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Conventional kernel log location shared with the log viewers.
pub const DEFAULT_SINK_PATH: &str = "/var/log/kern.log";

/// Destination for rendered records.
pub trait LogSink: Send {
    /// Appends one record and a newline, flushed before returning.
    fn append(&mut self, record: &str) -> io::Result<()>;
}

/// Appends to a file, reopening it for every record so rotation by
/// logrotate or a deleted file never strands the writer.
#[derive(Clone, Debug)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl LogSink for FileSink {
    fn append(&mut self, record: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(record.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()
    }
}

/// Writes records to any stream, e.g. stdout for replay.
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn append(&mut self, record: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", record)?;
        self.writer.flush()
    }
}

/// In-memory sink; clones share the same buffer.
#[derive(Clone, Default, Debug)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<String> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl LogSink for MemorySink {
    fn append(&mut self, record: &str) -> io::Result<()> {
        self.records.lock().push(record.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kern.log");
        fs::write(&path, "existing line\n").unwrap();

        let mut sink = FileSink::new(&path);
        sink.append("first").unwrap();
        sink.append("second").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "existing line\nfirst\nsecond\n"
        );
    }

    #[test]
    fn file_sink_recreates_rotated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kern.log");
        let mut sink = FileSink::new(&path);

        sink.append("before").unwrap();
        fs::remove_file(&path).unwrap();
        sink.append("after").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "after\n");
    }

    #[test]
    fn file_sink_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("missing").join("kern.log"));
        assert!(sink.append("record").is_err());
    }

    #[test]
    fn writer_sink_terminates_records() {
        let mut sink = WriterSink::new(Vec::new());
        sink.append("a").unwrap();
        sink.append("b").unwrap();
        assert_eq!(sink.into_inner(), b"a\nb\n");
    }

    #[test]
    fn memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.append("record").unwrap();
        assert_eq!(sink.records(), vec!["record".to_string()]);
        assert_eq!(sink.len(), 1);
    }
}
