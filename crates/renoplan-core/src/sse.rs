//! Incremental decoder for chat completion Server-Sent-Events streams.
//!
//! The stream is a sequence of `data: {json}` lines ending with `data: [DONE]`.
//! Chunk boundaries from the network are arbitrary, so the decoder keeps a line
//! buffer (and any split UTF-8 sequence) between calls to [`SseDecoder::feed`].

use serde::Deserialize;
use std::mem;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Deserialize)]
struct StreamFrame {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// How a single complete line was interpreted.
#[derive(Debug, PartialEq)]
enum Frame {
    /// Comment, blank line or a non-`data:` field.
    Ignored,
    /// A parsed data frame with its `choices[0].delta.content`, if any.
    Delta(Option<String>),
    Done,
    /// A `data:` line whose payload is not valid JSON.
    Unparsed,
}

fn classify(line: &str) -> Frame {
    if line.starts_with(':') || line.trim().is_empty() {
        return Frame::Ignored;
    }
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Ignored;
    };
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return Frame::Done;
    }
    match serde_json::from_str::<StreamFrame>(payload) {
        Ok(frame) => Frame::Delta(
            frame
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta)
                .and_then(|d| d.content),
        ),
        Err(_) => Frame::Unparsed,
    }
}

/// Line-buffering SSE decoder that accumulates assistant text.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    /// Decoded text not yet consumed as complete lines.
    buffer: String,
    /// Concatenation of every delta seen so far.
    text: String,
    done: bool,
    /// The front of `buffer` is a line that already failed to parse once.
    requeued: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk and return the deltas it completed, in order.
    ///
    /// A data line that is not valid JSON is put back at the front of the
    /// buffer and processing stops until the next chunk. If it still fails on
    /// that retry it is dropped so later frames are not held up behind it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.decode(bytes);

        let mut deltas = Vec::new();
        while !self.done {
            let Some(pos) = self.buffer.find('\n') else {
                break;
            };
            let raw: String = self.buffer.drain(..=pos).collect();
            let body = &raw[..raw.len() - 1];
            let line = body.strip_suffix('\r').unwrap_or(body);
            let retried = mem::take(&mut self.requeued);

            match classify(line) {
                Frame::Ignored | Frame::Delta(None) => {}
                Frame::Delta(Some(delta)) => self.push_delta(delta, &mut deltas),
                Frame::Done => self.mark_done(),
                Frame::Unparsed if retried => {
                    tracing::debug!(target: "renoplan::relay", "Dropping unparseable SSE line: {}", line);
                }
                Frame::Unparsed => {
                    self.buffer.insert_str(0, &raw);
                    self.requeued = true;
                    break;
                }
            }
        }
        deltas
    }

    /// Flush whatever is still buffered once the byte stream has ended.
    ///
    /// Uses the same line rules as [`feed`](Self::feed); JSON errors are
    /// ignored since no more data will arrive.
    pub fn finish(&mut self) -> Vec<String> {
        let mut deltas = Vec::new();
        if self.done {
            return deltas;
        }
        if !self.pending.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending).into_owned();
            self.buffer.push_str(&tail);
            self.pending.clear();
        }

        let remaining = mem::take(&mut self.buffer);
        for raw in remaining.split('\n') {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            match classify(line) {
                Frame::Delta(Some(delta)) => self.push_delta(delta, &mut deltas),
                Frame::Done => {
                    self.mark_done();
                    break;
                }
                _ => {}
            }
        }
        self.requeued = false;
        deltas
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    fn push_delta(&mut self, delta: String, deltas: &mut Vec<String>) {
        if delta.is_empty() {
            return;
        }
        self.text.push_str(&delta);
        deltas.push(delta);
    }

    fn mark_done(&mut self) {
        self.done = true;
        self.buffer.clear();
        self.pending.clear();
        self.requeued = false;
    }

    /// Append bytes to the line buffer, holding back a split UTF-8 sequence.
    fn decode(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    self.buffer.push_str(s);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(prefix) = std::str::from_utf8(&self.pending[..valid]) {
                        self.buffer.push_str(prefix);
                    }
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for the next chunk.
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame(content: &str) -> String {
        format!(
            "data: {}\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    fn decode_all(chunks: &[&[u8]]) -> SseDecoder {
        let mut decoder = SseDecoder::new();
        for chunk in chunks {
            decoder.feed(chunk);
        }
        decoder.finish();
        decoder
    }

    #[test]
    fn test_hello_example() {
        let f1 = frame("Hel");
        let f2 = frame("lo");
        let done = "data: [DONE]\n";
        let decoder = decode_all(&[f1.as_bytes(), f2.as_bytes(), done.as_bytes()]);
        assert_eq!(decoder.text(), "Hello");
        assert!(decoder.is_done());
    }

    #[test]
    fn test_feed_returns_deltas_in_order() {
        let mut decoder = SseDecoder::new();
        let input = format!("{}{}", frame("a"), frame("b"));
        assert_eq!(decoder.feed(input.as_bytes()), vec!["a", "b"]);
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let input = format!(": keep-alive\n\n\r\n{}event: ping\nid: 7\n{}", frame("x"), frame("y"));
        let decoder = decode_all(&[input.as_bytes()]);
        assert_eq!(decoder.text(), "xy");
    }

    #[test]
    fn test_crlf_lines() {
        let input = frame("crlf").replace('\n', "\r\n");
        let decoder = decode_all(&[input.as_bytes()]);
        assert_eq!(decoder.text(), "crlf");
    }

    #[test]
    fn test_done_halts_processing() {
        let input = format!("{}data: [DONE]\n{}", frame("kept"), frame("dropped"));
        let mut decoder = SseDecoder::new();
        decoder.feed(input.as_bytes());
        assert!(decoder.is_done());
        assert!(decoder.feed(frame("later").as_bytes()).is_empty());
        assert!(decoder.finish().is_empty());
        assert_eq!(decoder.text(), "kept");
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let full = frame("split me");
        let (a, b) = full.split_at(20);
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(a.as_bytes()).is_empty());
        assert_eq!(decoder.feed(b.as_bytes()), vec!["split me"]);
        assert_eq!(decoder.text(), "split me");
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let full = frame("café ☕");
        let bytes = full.as_bytes();
        let cut = full.find('☕').unwrap() + 1;
        let decoder = decode_all(&[&bytes[..cut], &bytes[cut..]]);
        assert_eq!(decoder.text(), "café ☕");
    }

    #[test]
    fn test_unparsed_line_is_requeued_then_dropped() {
        let mut decoder = SseDecoder::new();
        let first = format!("data: {{\"choices\": [\n{}", frame("after"));
        assert!(decoder.feed(first.as_bytes()).is_empty());
        assert_eq!(decoder.text(), "");

        // Retried on the next chunk, still broken, so it is dropped and the
        // frames behind it are delivered.
        let deltas = decoder.feed(frame("next").as_bytes());
        assert_eq!(deltas, vec!["after", "next"]);
    }

    #[test]
    fn test_frames_without_content() {
        let input = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n",
            "data: {\"choices\":[]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n",
        );
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(input.as_bytes()).is_empty());
        assert_eq!(decoder.text(), "");
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let full = frame("tail");
        let unterminated = full.trim_end_matches('\n');
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(unterminated.as_bytes()).is_empty());
        assert_eq!(decoder.finish(), vec!["tail"]);
        assert!(!decoder.is_done());
    }

    #[test]
    fn test_finish_ignores_partial_json() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"data: {\"choices\":[{\"del");
        assert!(decoder.finish().is_empty());
        assert_eq!(decoder.text(), "");
    }

    proptest! {
        #[test]
        fn prop_chunk_boundary_invariance(
            contents in proptest::collection::vec("[a-zA-Z0-9 é☕\"\\\\\n]{0,8}", 0..12),
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..10),
        ) {
            let mut stream = String::from(": open\n\n");
            for c in &contents {
                stream.push_str(&frame(c));
            }
            stream.push_str("data: [DONE]\n");
            let bytes = stream.as_bytes();

            let mut points: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
            points.sort_unstable();
            points.dedup();

            let mut decoder = SseDecoder::new();
            let mut start = 0;
            for p in points {
                decoder.feed(&bytes[start..p]);
                start = p;
            }
            decoder.feed(&bytes[start..]);
            decoder.finish();

            prop_assert!(decoder.is_done());
            prop_assert_eq!(decoder.into_text(), contents.concat());
        }
    }
}
