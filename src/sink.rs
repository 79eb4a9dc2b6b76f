//! Append-only byte sinks that know their own position.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Somewhere the serialized document goes. Output only ever moves forward, so the
/// position after a write is the byte offset of whatever is written next.
pub trait ByteSink {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Number of bytes written so far
    fn position(&self) -> u64;

    fn flush(&mut self) -> io::Result<()>;
}

/// Wraps any [Write] and counts the bytes that go through it
pub struct CountingSink<W: Write> {
    inner: W,
    position: u64,
}

impl<W: Write> CountingSink<W> {
    pub fn new(inner: W) -> CountingSink<W> {
        CountingSink { inner, position: 0 }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Write> ByteSink for CountingSink<W> {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_all(bytes)
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Collects the document in memory
pub type MemorySink = CountingSink<Vec<u8>>;

impl MemorySink {
    pub fn in_memory() -> MemorySink {
        CountingSink::new(Vec::new())
    }

    pub fn bytes(&self) -> &[u8] {
        self.get_ref()
    }
}

/// Writes the document to a file through a buffer
pub type FileSink = CountingSink<BufWriter<File>>;

impl FileSink {
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<FileSink> {
        Ok(CountingSink::new(BufWriter::new(File::create(path)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_tracks_bytes_written() {
        let mut sink = MemorySink::in_memory();
        sink.write_all(b"%PDF-1.5\n").unwrap();
        assert_eq!(sink.position(), 9);
        sink.write_all(b"").unwrap();
        sink.write_all(b"1 0 obj").unwrap();
        assert_eq!(sink.position(), 16);
        assert_eq!(sink.bytes(), b"%PDF-1.5\n1 0 obj");
    }

    #[test]
    fn file_sink_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut sink = FileSink::create(&path).unwrap();
        sink.write_all(b"abc").unwrap();
        ByteSink::flush(&mut sink).unwrap();
        assert_eq!(sink.position(), 3);
        drop(sink);
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }
}
