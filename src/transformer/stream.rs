//! Streaming decoders for the upstream response body.
//!
//! The upstream body is a JSON array of response objects, delivered in
//! transport chunks whose boundaries fall anywhere, including inside a
//! multi-byte UTF-8 sequence or inside a string literal.

use super::gemini::extract_text;
use super::FragmentExtractor;

// ============================================================================
// UTF-8 decoding
// ============================================================================

/// Incremental UTF-8 decoder.
///
/// An incomplete sequence at the end of a chunk is held back until the next
/// chunk arrives. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk, returning all text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let bytes = if self.pending.is_empty() {
            chunk.to_vec()
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            joined
        };

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&rest[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &rest[valid + len..];
                        }
                        None => {
                            self.pending = rest[valid..].to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush at end of stream. A dangling partial sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }

    /// Bytes currently held back.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

// ============================================================================
// JSON array framing
// ============================================================================

/// Splits a streamed JSON array into its top-level object texts.
///
/// Tracks brace depth plus string and escape state across calls, so braces
/// inside string literals never count and an object may span any number of
/// chunks. A bare top-level object (no surrounding array) is accepted too.
#[derive(Debug, Default)]
pub struct JsonArrayDecoder {
    current: String,
    depth: usize,
    in_string: bool,
    escape: bool,
}

impl JsonArrayDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed decoded text, returning every object completed by it.
    pub fn push_str(&mut self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for ch in text.chars() {
            if self.depth == 0 {
                match ch {
                    '{' => {
                        self.depth = 1;
                        self.current.push(ch);
                    }
                    // brackets, separators and whitespace
                    _ => {}
                }
                continue;
            }

            self.current.push(ch);
            if self.in_string {
                if self.escape {
                    self.escape = false;
                } else if ch == '\\' {
                    self.escape = true;
                } else if ch == '"' {
                    self.in_string = false;
                }
                continue;
            }

            match ch {
                '"' => self.in_string = true,
                '{' => self.depth += 1,
                '}' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        out.push(std::mem::take(&mut self.current));
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// End of input. Returns the unterminated object text, if any.
    pub fn finish(&mut self) -> Option<String> {
        self.depth = 0;
        self.in_string = false;
        self.escape = false;
        if self.current.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.current))
        }
    }

    /// Whether the decoder is between objects.
    pub fn is_idle(&self) -> bool {
        self.depth == 0
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// Extractor that never loses an object to an unlucky chunk boundary.
#[derive(Debug, Default)]
pub struct IncrementalExtractor {
    utf8: Utf8Decoder,
    array: JsonArrayDecoder,
}

impl IncrementalExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn texts(objects: Vec<String>) -> Vec<String> {
        objects.iter().filter_map(|object| extract_text(object)).collect()
    }
}

impl FragmentExtractor for IncrementalExtractor {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.utf8.decode(chunk);
        Self::texts(self.array.push_str(&text))
    }

    fn finish(&mut self) -> Vec<String> {
        let tail = self.utf8.finish();
        let fragments = Self::texts(self.array.push_str(&tail));
        if let Some(partial) = self.array.finish() {
            tracing::warn!(
                bytes = partial.len(),
                "Upstream stream ended inside an unterminated object"
            );
        }
        fragments
    }
}

/// Extractor that inspects each chunk in isolation.
///
/// The text between the chunk's first `{` and last `}` is parsed as one
/// object; if that fails the chunk contributes nothing. Nothing is carried
/// between chunks except incomplete UTF-8 sequences.
#[derive(Debug, Default)]
pub struct PerChunkExtractor {
    utf8: Utf8Decoder,
}

impl PerChunkExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn extract(text: &str) -> Option<String> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end < start {
            return None;
        }
        extract_text(&text[start..=end])
    }
}

impl FragmentExtractor for PerChunkExtractor {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.utf8.decode(chunk);
        Self::extract(&text).into_iter().collect()
    }

    fn finish(&mut self) -> Vec<String> {
        self.utf8.finish();
        Vec::new()
    }
}
