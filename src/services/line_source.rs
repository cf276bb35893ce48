//! File access and line decoding.
//!
//! [`FileSource`] is the seam between the resolver and storage: one `open` per
//! file, and the returned reader is dropped (closing the handle) as soon as
//! the caller is done with it, including on early error returns.
//! [`LineSource`] turns any reader into text lines the way the descriptor
//! dialects expect them.

use camino::Utf8Path;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};

/// Opens files by path.
#[cfg_attr(test, mockall::automock)]
pub trait FileSource {
    fn open(&self, path: &Utf8Path) -> io::Result<Box<dyn Read>>;
}

/// [`FileSource`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl FileSource for LocalFiles {
    fn open(&self, path: &Utf8Path) -> io::Result<Box<dyn Read>> {
        let file = File::open(path)?;
        Ok(Box::new(file))
    }
}

/// Iterator of text lines read from a byte stream.
///
/// Lines are split on `\n` with every `\r` removed. The stream ends at EOF or
/// at the first NUL byte, whichever comes first; bytes that are not valid
/// UTF-8 are replaced rather than rejected.
pub struct LineSource<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    finished: bool,
}

impl<R: Read> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
            finished: false,
        }
    }
}

impl<R: Read> LineSource<io::Take<R>> {
    /// Stop after `limit` bytes even if neither EOF nor NUL was seen.
    pub fn bounded(reader: R, limit: u64) -> Self {
        Self::new(reader.take(limit))
    }
}

impl<R: Read> Iterator for LineSource<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.finished = true;
                None
            }
            Ok(_) => {
                if let Some(nul) = self.buf.iter().position(|&b| b == 0) {
                    self.buf.truncate(nul);
                    self.finished = true;
                    if self.buf.is_empty() {
                        return None;
                    }
                }
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                self.buf.retain(|&b| b != b'\r');
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lines(bytes: &[u8]) -> Vec<String> {
        LineSource::new(Cursor::new(bytes.to_vec()))
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_splits_and_strips_carriage_returns() {
        assert_eq!(
            lines(b"a = \"1\"\r\nb = \"2\"\r\n"),
            vec!["a = \"1\"", "b = \"2\""]
        );
    }

    #[test]
    fn test_last_line_without_newline() {
        assert_eq!(lines(b"first\nsecond"), vec!["first", "second"]);
    }

    #[test]
    fn test_stops_at_nul() {
        assert_eq!(lines(b"one\ntwo\0three\nfour\n"), vec!["one", "two"]);
        assert_eq!(lines(b"one\n\0two\n"), vec!["one"]);
    }

    #[test]
    fn test_empty_lines_are_kept() {
        assert_eq!(lines(b"a\n\nb\n"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_bounded_stops_at_limit() {
        let source = LineSource::bounded(Cursor::new(b"abc\ndef\nghi\n".to_vec()), 6);
        let got: Vec<String> = source.collect::<io::Result<_>>().unwrap();
        assert_eq!(got, vec!["abc", "de"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let got = lines(b"\xff\xfe key\n");
        assert_eq!(got.len(), 1);
        assert!(got[0].ends_with(" key"));
    }
}
