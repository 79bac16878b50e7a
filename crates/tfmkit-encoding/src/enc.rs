//! `.enc` PostScript encoding-vector interface (§1 "external
//! collaborators"; spec.md asks only for this interface, not a full
//! PostScript parser). An encoding vector maps a byte code 0..255 to a
//! glyph name, as in `/Encoding [ /.notdef /space /exclam ... ] def`.

use crate::error::Error;

/// A 256-entry code -> glyph-name table, as read from a `.enc` file.
pub type EncodingVector = Vec<String>;

/// Something that can hand back an encoding vector by name. The real
/// implementation reads a `.enc` file off disk; tests use
/// [`StubEncodingVectorSource`] instead.
pub trait EncodingVectorSource {
    fn load(&self, name: &str) -> Result<EncodingVector, Error>;
}

/// Scans PostScript `.enc` text for the `/glyphname` tokens inside the
/// `[ ... ]` array following `/Encoding`. This is a line scanner, not a
/// PostScript interpreter: it does not evaluate procedures, comments
/// other than `%`-to-end-of-line, or anything outside that one array.
pub struct EncLineScanner;

impl EncLineScanner {
    /// Parse `.enc` file contents, returning the glyph names in array
    /// order (normally 256 of them, one per code point).
    pub fn scan(text: &str) -> Result<EncodingVector, Error> {
        let stripped: String = text
            .lines()
            .map(|line| match line.find('%') {
                Some(i) => &line[..i],
                None => line,
            })
            .collect::<Vec<_>>()
            .join(" ");

        let start = stripped
            .find("/Encoding")
            .ok_or_else(|| Error::Semantic("no /Encoding found in .enc text".into()))?;
        let after = &stripped[start..];
        let open = after
            .find('[')
            .ok_or_else(|| Error::Semantic("/Encoding has no opening [".into()))?;
        let close = after[open..]
            .find(']')
            .ok_or_else(|| Error::Semantic("/Encoding array has no closing ]".into()))?
            + open;
        let body = &after[open + 1..close];

        let names: Vec<String> = body
            .split_whitespace()
            .filter_map(|tok| tok.strip_prefix('/'))
            .map(|s| s.to_string())
            .collect();
        if names.is_empty() {
            return Err(Error::Semantic("/Encoding array contained no glyph names".into()));
        }
        Ok(names)
    }
}

/// Reads a `.enc` file from disk and scans it with [`EncLineScanner`].
pub struct FileEncodingVectorSource;

impl EncodingVectorSource for FileEncodingVectorSource {
    fn load(&self, name: &str) -> Result<EncodingVector, Error> {
        let text = std::fs::read_to_string(name)
            .map_err(|e| Error::External(format!("reading {name}: {e}")))?;
        EncLineScanner::scan(&text)
    }
}

/// Deterministic in-memory source for tests, keyed by the exact name
/// passed to [`EncodingVectorSource::load`].
#[derive(Default)]
pub struct StubEncodingVectorSource {
    vectors: std::collections::HashMap<String, EncodingVector>,
}

impl StubEncodingVectorSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, vector: EncodingVector) {
        self.vectors.insert(name.into(), vector);
    }
}

impl EncodingVectorSource for StubEncodingVectorSource {
    fn load(&self, name: &str) -> Result<EncodingVector, Error> {
        self.vectors
            .get(name)
            .cloned()
            .ok_or_else(|| Error::External(format!("no stubbed encoding vector named {name:?}")))
    }
}
