//! JSON-lines result sink.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use insights_core::serde_utils::to_json_line;
use insights_engine::Record;

use crate::error::CliError;

pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl JsonLinesSink<Box<dyn Write>> {
    /// Opens `path` for writing (truncating it), or stdout when no path is given.
    pub fn open(path: Option<&Path>) -> Result<Self, CliError> {
        let writer: Box<dyn Write> = match path {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(BufWriter::new(io::stdout())),
        };
        Ok(Self::new(writer))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn write_record(&mut self, record: &Record) -> Result<(), CliError> {
        let line = to_json_line(record)?;
        writeln!(self.writer, "{}", line)?;
        self.written += 1;
        Ok(())
    }

    pub fn write_all(&mut self, records: &[Record]) -> Result<(), CliError> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Flushes the writer and returns the number of records written.
    pub fn finish(mut self) -> Result<usize, CliError> {
        self.writer.flush()?;
        Ok(self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, serde_json::Value)]) -> Record {
        pairs
            .iter()
            .map(|(key, value)| (*key, value.clone()))
            .collect()
    }

    #[test]
    fn writes_one_object_per_line_in_field_order() {
        let mut buffer = Vec::new();
        let mut sink = JsonLinesSink::new(&mut buffer);
        sink.write_all(&[
            record(&[("zeta", json!("1")), ("alpha", json!({"nested": true}))]),
            record(&[("foo", json!("2"))]),
        ])
        .unwrap();
        assert_eq!(sink.finish().unwrap(), 2);

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "{\"zeta\":\"1\",\"alpha\":{\"nested\":true}}\n{\"foo\":\"2\"}\n"
        );
    }

    #[test]
    fn empty_results_write_nothing() {
        let mut buffer = Vec::new();
        let sink = JsonLinesSink::new(&mut buffer);
        assert_eq!(sink.finish().unwrap(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn open_truncates_the_target_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        std::fs::write(&path, "stale contents\n").unwrap();

        let mut sink = JsonLinesSink::open(Some(&path)).unwrap();
        sink.write_record(&record(&[("foo", json!("1"))])).unwrap();
        assert_eq!(sink.finish().unwrap(), 1);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"foo\":\"1\"}\n");
    }
}
