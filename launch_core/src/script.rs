//! Script Accumulator: builds the data-driven configuration stream.
//!
//! File content always comes first, byte for byte, then every `-i` fragment
//! in command-line order, each followed by exactly one line break. The
//! buffer holds bytes: script files need not be valid UTF-8.

use crate::error::LaunchError;
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Ordered script text handed to the data-driven initialization path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptBuffer {
    bytes: Vec<u8>,
    file_len: usize,
}

impl ScriptBuffer {
    /// Read `script_path` (if any), then append `fragments`.
    ///
    /// Without a path nothing is read and nothing can fail; fragments alone
    /// form a valid script.
    pub fn assemble(
        script_path: Option<&Path>,
        fragments: &[String],
    ) -> Result<ScriptBuffer, LaunchError> {
        let mut buffer = match script_path {
            Some(path) => {
                let bytes = std::fs::read(path).map_err(|source| LaunchError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!(path = %path.display(), bytes = bytes.len(), "script file loaded");
                ScriptBuffer {
                    file_len: bytes.len(),
                    bytes,
                }
            }
            None => ScriptBuffer::default(),
        };
        for fragment in fragments {
            buffer.push_fragment(fragment);
        }
        Ok(buffer)
    }

    pub fn push_fragment(&mut self, fragment: &str) {
        self.bytes.extend_from_slice(fragment.as_bytes());
        self.bytes.push(b'\n');
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The buffer as text; invalid UTF-8 sequences become U+FFFD.
    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// An empty buffer means the data-driven path is not taken.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes that came from the script file (a prefix of [`Self::as_bytes`]).
    pub fn file_content(&self) -> &[u8] {
        &self.bytes[..self.file_len]
    }
}

impl fmt::Display for ScriptBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn fragments(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn file_then_fragments_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scene.lua");
        fs::write(&path, "end_frame = 10").unwrap();

        let buffer =
            ScriptBuffer::assemble(Some(&path), &fragments(&["a = 1", "b = 2"])).unwrap();
        assert_eq!(buffer.as_bytes(), b"end_frame = 10a = 1\nb = 2\n");
        assert_eq!(buffer.file_content(), b"end_frame = 10");
    }

    #[test]
    fn fragments_alone_are_a_script() {
        let buffer = ScriptBuffer::assemble(None, &fragments(&["x = 3"])).unwrap();
        assert_eq!(buffer.as_bytes(), b"x = 3\n");
        assert!(buffer.file_content().is_empty());
    }

    #[test]
    fn nothing_supplied_is_empty() {
        let buffer = ScriptBuffer::assemble(None, &[]).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn empty_fragment_still_adds_line_break() {
        let buffer = ScriptBuffer::assemble(None, &fragments(&[""])).unwrap();
        assert_eq!(buffer.as_bytes(), b"\n");
        assert!(!buffer.is_empty());
    }

    #[test]
    fn non_utf8_file_bytes_are_kept_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.lua");
        let content = b"-- caf\xe9\nend_frame = 3\n";
        fs::write(&path, content).unwrap();

        let buffer = ScriptBuffer::assemble(Some(&path), &fragments(&["x = 1"])).unwrap();
        assert_eq!(buffer.file_content(), &content[..]);
        assert!(buffer.as_bytes().starts_with(content));
        assert!(buffer.as_bytes().ends_with(b"x = 1\n"));
        assert_eq!(buffer.len(), content.len() + 6);
        assert!(buffer.to_text().contains("end_frame = 3"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.lua");
        let err = ScriptBuffer::assemble(Some(&path), &fragments(&["a = 1"])).unwrap_err();
        match err {
            LaunchError::Io { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
