//! JAR manifest handling.
//!
//! Remapped archives keep the main attributes of `META-INF/MANIFEST.MF` but
//! lose the per-entry sections, which carry digests of the original classes.

use std::fmt;

use thiserror::Error;

const MAX_LINE_BYTES: usize = 72;

/// Errors raised while reading a manifest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// The manifest is not valid UTF-8.
    #[error("manifest is not valid UTF-8")]
    InvalidUtf8,
    /// A line is neither a header nor a continuation.
    #[error("malformed manifest line {line}")]
    Malformed {
        /// One-based line number.
        line: usize,
    },
}

/// The main section of a manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
}

impl Manifest {
    /// Parses the main section, ignoring every entry section.
    pub fn parse(bytes: &[u8]) -> Result<Self, ManifestError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ManifestError::InvalidUtf8)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut attributes: Vec<(String, String)> = Vec::new();
        for (index, line) in text.split('\n').enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                break;
            }
            if let Some(continuation) = line.strip_prefix(' ') {
                match attributes.last_mut() {
                    Some((_, value)) => value.push_str(continuation),
                    None => return Err(ManifestError::Malformed { line: index + 1 }),
                }
                continue;
            }
            match line.split_once(": ") {
                Some((name, value)) if !name.is_empty() => attributes.push((name.to_string(), value.to_string())),
                _ => return Err(ManifestError::Malformed { line: index + 1 }),
            }
        }
        Ok(Manifest { attributes })
    }

    /// The value of a main attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All main attributes in order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serializes the main section with CRLF line endings and lines wrapped
    /// at 72 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.attributes {
            write_wrapped(f, &format!("{}: {}", name, value))?;
        }
        f.write_str("\r\n")
    }
}

fn write_wrapped(f: &mut fmt::Formatter<'_>, line: &str) -> fmt::Result {
    let mut rest = line;
    let mut limit = MAX_LINE_BYTES;
    loop {
        if rest.len() <= limit {
            f.write_str(rest)?;
            return f.write_str("\r\n");
        }
        let mut split = limit;
        while !rest.is_char_boundary(split) {
            split -= 1;
        }
        let (head, tail) = rest.split_at(split);
        f.write_str(head)?;
        f.write_str("\r\n ")?;
        rest = tail;
        // continuation lines lose one byte to the leading space
        limit = MAX_LINE_BYTES - 1;
    }
}

/// Drops all per-entry sections of a manifest, keeping its main attributes.
pub fn clear_entry_sections(bytes: &[u8]) -> Result<Vec<u8>, ManifestError> {
    Ok(Manifest::parse(bytes)?.to_bytes())
}
