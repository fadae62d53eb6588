// src/exec/decode.rs

//! Incremental UTF-8 decoding for streamed process output.
//!
//! Bytes arrive in arbitrary chunks, so a multi-byte character may straddle
//! two reads. The decoder keeps only the incomplete tail between calls.
//! Invalid sequences decode to U+FFFD exactly as `String::from_utf8_lossy`
//! would for the whole stream: one replacement per maximal invalid subpart,
//! not one per byte. A truncated `E2 82` followed by `A` yields a single
//! U+FFFD and then `A`.

/// Stateful UTF-8 decoder. Holds at most three pending bytes.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `input`, appending every complete character to `out`.
    pub fn decode(&mut self, input: &[u8], out: &mut Vec<char>) {
        self.pending.extend_from_slice(input);

        let mut consumed = 0;
        while consumed < self.pending.len() {
            let rest = &self.pending[consumed..];
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.extend(valid.chars());
                    consumed = self.pending.len();
                }
                Err(err) => {
                    let (valid, _) = rest.split_at(err.valid_up_to());
                    if let Ok(valid) = std::str::from_utf8(valid) {
                        out.extend(valid.chars());
                    }
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            consumed += err.valid_up_to() + bad;
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more.
                            consumed += err.valid_up_to();
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
    }

    /// Flush at end of stream. A truncated trailing sequence becomes one
    /// replacement character.
    pub fn finish(&mut self, out: &mut Vec<char>) {
        if !self.pending.is_empty() {
            self.pending.clear();
            out.push(char::REPLACEMENT_CHARACTER);
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode_chunks(chunks: &[&[u8]]) -> String {
        let mut decoder = Utf8Decoder::new();
        let mut out = Vec::new();
        for chunk in chunks {
            decoder.decode(chunk, &mut out);
        }
        decoder.finish(&mut out);
        out.into_iter().collect()
    }

    #[test]
    fn ascii_passes_through() {
        assert_eq!(decode_chunks(&[b"Usage: terraform"]), "Usage: terraform");
    }

    #[test]
    fn multibyte_char_split_across_reads() {
        let bytes = "€".as_bytes();
        let mut decoder = Utf8Decoder::new();
        let mut out = Vec::new();

        decoder.decode(&bytes[..1], &mut out);
        assert!(out.is_empty());
        assert!(decoder.has_pending());

        decoder.decode(&bytes[1..2], &mut out);
        assert!(out.is_empty());

        decoder.decode(&bytes[2..], &mut out);
        assert_eq!(out, vec!['€']);
        assert!(!decoder.has_pending());
    }

    #[test]
    fn invalid_byte_becomes_replacement() {
        assert_eq!(decode_chunks(&[b"a\xffb"]), "a\u{FFFD}b");
    }

    #[test]
    fn truncated_sequence_mid_stream_is_one_replacement() {
        assert_eq!(decode_chunks(&[b"\xe2\x82A"]), "\u{FFFD}A");
        assert_eq!(decode_chunks(&[b"\xe2", b"\x82", b"A"]), "\u{FFFD}A");
    }

    #[test]
    fn truncated_tail_is_flushed_on_finish() {
        assert_eq!(decode_chunks(&[b"ok\xe2\x82"]), "ok\u{FFFD}");
    }

    proptest! {
        #[test]
        fn chunked_decoding_matches_lossy_conversion(
            bytes in proptest::collection::vec(any::<u8>(), 0..256),
            cuts in proptest::collection::vec(any::<usize>(), 0..8),
        ) {
            let mut points: Vec<usize> = cuts
                .into_iter()
                .map(|c| if bytes.is_empty() { 0 } else { c % bytes.len() })
                .collect();
            points.sort_unstable();
            points.dedup();

            let mut chunks: Vec<&[u8]> = Vec::new();
            let mut start = 0;
            for p in points {
                chunks.push(&bytes[start..p]);
                start = p;
            }
            chunks.push(&bytes[start..]);

            prop_assert_eq!(decode_chunks(&chunks), String::from_utf8_lossy(&bytes).into_owned());
        }
    }
}
