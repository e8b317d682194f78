//! Property-based tests for the stream decoders.
//!
//! These tests use proptest to check that fragment extraction does not
//! depend on where the upstream happens to split its byte stream.

use prompt_relay::transformer::{ExtractionMode, JsonArrayDecoder, Utf8Decoder};
use proptest::prelude::*;
use serde_json::json;

fn object(text: &str) -> String {
    json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]}).to_string()
}

fn array(texts: &[String]) -> String {
    let objects: Vec<String> = texts.iter().map(|t| object(t)).collect();
    format!("[{}]", objects.join(",\r\n"))
}

/// Cut `bytes` at the given (unsorted, possibly duplicate) offsets.
fn split_at_points(bytes: &[u8], points: &[usize]) -> Vec<Vec<u8>> {
    let mut cuts: Vec<usize> = points
        .iter()
        .map(|p| if bytes.is_empty() { 0 } else { p % bytes.len() })
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for cut in cuts {
        if cut > start {
            chunks.push(bytes[start..cut].to_vec());
            start = cut;
        }
    }
    chunks.push(bytes[start..].to_vec());
    chunks
}

/// Text fragments, including quotes, braces, escapes and multi-byte chars.
fn fragment_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ,.!?]{1,20}",
        "[{}\\[\\]\"\\\\]{1,8}",
        "[éü世界🦀\n\t]{1,6}",
    ]
}

proptest! {
    /// Incremental extraction yields the same fragments in the same order
    /// however the body is chunked.
    #[test]
    fn test_incremental_extraction_ignores_chunking(
        texts in prop::collection::vec(fragment_strategy(), 1..8),
        points in prop::collection::vec(any::<usize>(), 0..16)
    ) {
        let body = array(&texts);
        let mut extractor = ExtractionMode::Incremental.extractor();

        let mut fragments = Vec::new();
        for chunk in split_at_points(body.as_bytes(), &points) {
            fragments.extend(extractor.push(&chunk));
        }
        fragments.extend(extractor.finish());

        prop_assert_eq!(fragments, texts);
    }

    /// Decoding UTF-8 in pieces reproduces the whole string.
    #[test]
    fn test_utf8_decoder_reassembles_any_split(
        text in "\\PC{0,64}",
        points in prop::collection::vec(any::<usize>(), 0..12)
    ) {
        let mut decoder = Utf8Decoder::new();
        let mut output = String::new();
        for chunk in split_at_points(text.as_bytes(), &points) {
            output.push_str(&decoder.decode(&chunk));
        }
        output.push_str(&decoder.finish());

        prop_assert_eq!(output, text);
        prop_assert_eq!(decoder.pending_len(), 0);
    }

    /// Every object the array decoder emits is valid JSON.
    #[test]
    fn test_array_decoder_emits_complete_objects(
        texts in prop::collection::vec(fragment_strategy(), 0..6),
        points in prop::collection::vec(any::<usize>(), 0..12)
    ) {
        let body = array(&texts);
        let mut utf8 = Utf8Decoder::new();
        let mut decoder = JsonArrayDecoder::new();
        let mut objects = Vec::new();
        for chunk in split_at_points(body.as_bytes(), &points) {
            objects.extend(decoder.push_str(&utf8.decode(&chunk)));
        }
        objects.extend(decoder.push_str(&utf8.finish()));

        prop_assert_eq!(objects.len(), texts.len());
        for object in objects {
            prop_assert!(serde_json::from_str::<serde_json::Value>(&object).is_ok());
        }
        prop_assert!(decoder.is_idle());
    }

    /// Per-chunk extraction never emits anything that was not sent.
    #[test]
    fn test_per_chunk_only_emits_sent_fragments(
        texts in prop::collection::vec("[a-z]{1,10}", 1..6),
        points in prop::collection::vec(any::<usize>(), 0..8)
    ) {
        let body = array(&texts);
        let mut extractor = ExtractionMode::PerChunk.extractor();

        let mut fragments = Vec::new();
        for chunk in split_at_points(body.as_bytes(), &points) {
            fragments.extend(extractor.push(&chunk));
        }
        fragments.extend(extractor.finish());

        for fragment in &fragments {
            prop_assert!(texts.contains(fragment));
        }
        prop_assert!(fragments.len() <= texts.len());
    }
}
