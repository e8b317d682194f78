//! Transformer module for upstream stream conversion.
//!
//! The upstream answers `streamGenerateContent` with a JSON array whose
//! elements arrive over time, split at arbitrary byte offsets. This module
//! turns those raw chunks into the plain text fragments relayed to clients.
//!
//! ```text
//! Upstream bytes
//!     ↓
//! [Utf8Decoder]          ← reassemble split multi-byte sequences
//!     ↓
//! [FragmentExtractor]    ← find complete JSON objects
//!     ↓
//! [gemini::extract_text] ← candidates[0].content.parts[0].text
//!     ↓
//! Text fragments
//! ```

pub mod gemini;
pub mod stream;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use stream::{IncrementalExtractor, JsonArrayDecoder, PerChunkExtractor, Utf8Decoder};

// ============================================================================
// Extraction mode
// ============================================================================

/// How fragments are located in the upstream byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Track object boundaries across chunks; nothing is lost to chunking.
    #[default]
    Incremental,
    /// Look for one complete object inside each chunk on its own and skip
    /// the chunk otherwise. Objects split across reads are dropped.
    PerChunk,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMode::Incremental => "incremental",
            ExtractionMode::PerChunk => "per_chunk",
        }
    }

    /// Create a fresh extractor for one upstream stream.
    pub fn extractor(&self) -> Box<dyn FragmentExtractor> {
        match self {
            ExtractionMode::Incremental => Box::new(IncrementalExtractor::new()),
            ExtractionMode::PerChunk => Box::new(PerChunkExtractor::new()),
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "incremental" => Ok(ExtractionMode::Incremental),
            "per_chunk" | "legacy" => Ok(ExtractionMode::PerChunk),
            other => Err(format!(
                "unknown extraction mode '{}', expected 'incremental' or 'per_chunk'",
                other
            )),
        }
    }
}

// ============================================================================
// Extractor trait
// ============================================================================

/// Stateful converter from upstream byte chunks to text fragments.
///
/// One instance serves exactly one upstream stream.
pub trait FragmentExtractor: Send {
    /// Feed one transport chunk, returning the fragments it completes, in order.
    fn push(&mut self, chunk: &[u8]) -> Vec<String>;

    /// Flush whatever can still be extracted at end of stream.
    fn finish(&mut self) -> Vec<String>;
}
