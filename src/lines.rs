use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One physical line of a CGGTTS file, terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Line {
    /// 1-based line number, for diagnostics
    pub number: usize,
    pub text: String,
}

impl Line {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Iterator yielding numbered lines from a reader, tolerating both LF and
/// CRLF terminators. Owns the underlying reader, so when built from a path
/// the file handle is released as soon as the iterator is dropped.
pub(crate) struct Lines<R> {
    reader: R,
    number: usize,
}

impl Lines<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> Lines<R> {
    pub fn new(reader: R) -> Self {
        Lines { reader, number: 0 }
    }
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = std::io::Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut text = String::new();
        match self.reader.read_line(&mut text) {
            Ok(0) => None,
            Ok(_) => {
                if text.ends_with('\n') {
                    text.pop();
                    if text.ends_with('\r') {
                        text.pop();
                    }
                }
                self.number += 1;
                Some(Ok(Line {
                    number: self.number,
                    text,
                }))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_lines_from_one() {
        let dat = "first\nsecond\nthird\n";
        let lines: Vec<Line> = Lines::new(dat.as_bytes()).map(Result::unwrap).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[2].number, 3);
        assert_eq!(lines[1].text, "second");
    }

    #[test]
    fn strips_crlf_and_bare_lf() {
        let dat = "a\r\nb\nc";
        let lines: Vec<Line> = Lines::new(dat.as_bytes()).map(Result::unwrap).collect();
        assert_eq!(lines[0].text, "a");
        assert_eq!(lines[1].text, "b");
        // last line without terminator is still yielded
        assert_eq!(lines[2].text, "c");
    }

    #[test]
    fn blank_detection() {
        assert!(Line { number: 1, text: "   ".into() }.is_blank());
        assert!(!Line { number: 1, text: " x ".into() }.is_blank());
    }
}
