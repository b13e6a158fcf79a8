//! Server-sent event decoding.
//!
//! Both supported servers stream one JSON object per `data:` line and end
//! with `data: [DONE]` (or simply close the connection). Decoding is
//! line-based and incremental, so events split across network chunks and
//! several events within one chunk come out the same.

use crate::TokenStream;
use futures::{Stream, StreamExt, future, stream};
use quill_error::{ServerError, ServerErrorKind};

/// Payload that terminates a stream.
pub const DONE: &str = "[DONE]";

/// Incremental `data:` line decoder.
#[derive(Debug, Clone, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the payloads of every line it completes.
    ///
    /// Payloads have the `data:` prefix removed and are trimmed. Other SSE
    /// fields (`event:`, `id:`, comments) are ignored.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a final line that arrived without a trailing newline.
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let payload = line.trim_end_matches(['\r', '\n']).strip_prefix("data:")?.trim();
    (!payload.is_empty()).then(|| payload.to_string())
}

/// What a client made of one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A generated token to pass on
    Token(String),
    /// End of generation
    Done,
    /// Nothing to yield (empty token, undecodable JSON)
    Skip,
}

/// Turn a byte stream into a token stream using `parse` for each payload.
///
/// The stream ends at the first [`SseEvent::Done`] or when the bytes run out.
/// Transport errors surface as [`ServerErrorKind::Stream`].
pub fn token_stream<S, B, E, F>(bytes: S, parse: F) -> TokenStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
    F: Fn(&str) -> SseEvent + Send + 'static,
{
    let payloads = bytes
        .map(Some)
        .chain(stream::once(future::ready(None)))
        .scan(SseDecoder::new(), |decoder, item| {
            let payloads: Vec<Result<String, ServerError>> = match item {
                Some(Ok(chunk)) => decoder.push(chunk.as_ref()).into_iter().map(Ok).collect(),
                Some(Err(e)) => {
                    tracing::error!("Stream error: {}", e);
                    vec![Err(ServerError::new(ServerErrorKind::Stream(format!(
                        "Stream error: {}",
                        e
                    ))))]
                }
                None => decoder.finish().into_iter().map(Ok).collect(),
            };
            future::ready(Some(stream::iter(payloads)))
        })
        .flatten();

    let tokens = payloads
        .map(move |payload| payload.map(|data| parse(&data)))
        .take_while(|event| future::ready(!matches!(event, Ok(SseEvent::Done))))
        .filter_map(|event| {
            future::ready(match event {
                Ok(SseEvent::Token(token)) => Some(Ok(token)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
        });

    Box::pin(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: message\nda").is_empty());
        assert!(decoder.push(b"ta: {\"token\":").is_empty());
        assert_eq!(decoder.push(b" \"a\"}\n\n"), vec!["{\"token\": \"a\"}"]);
    }

    #[test]
    fn several_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: 1\n\ndata: 2\r\n\r\n: comment\ndata: [DONE]\n");
        assert_eq!(payloads, vec!["1", "2", DONE]);
    }

    #[test]
    fn multibyte_char_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: 星\n".as_bytes();
        assert!(decoder.push(&bytes[..7]).is_empty());
        assert_eq!(decoder.push(&bytes[7..]), vec!["星"]);
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: last").is_empty());
        assert_eq!(decoder.finish(), Some("last".to_string()));
        assert_eq!(decoder.finish(), None);
    }
}
