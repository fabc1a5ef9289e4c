//! Minimal server-sent-events line splitter shared by the providers

use super::ProviderError;

/// Accumulates raw bytes and hands back complete `data:` payloads
///
/// Lines are decoded only once their terminating newline has arrived, so a
/// multi-byte character split across network chunks survives intact.
#[derive(Debug, Default)]
pub(crate) struct SseBuffer {
    buffer: Vec<u8>,
}

impl SseBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed a network chunk, returning every payload completed by it
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, ProviderError> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = data_payload(&line)? {
                payloads.push(data);
            }
        }
        Ok(payloads)
    }

    /// Whatever is left once the connection closes without a final newline
    pub(crate) fn finish(&mut self) -> Result<Option<String>, ProviderError> {
        let rest = std::mem::take(&mut self.buffer);
        data_payload(&rest)
    }
}

fn data_payload(line: &[u8]) -> Result<Option<String>, ProviderError> {
    let line = std::str::from_utf8(line)
        .map_err(|e| ProviderError::Parse(format!("event stream is not valid UTF-8: {}", e)))?;
    Ok(line
        .trim()
        .strip_prefix("data:")
        .map(|data| data.trim_start().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_across_chunks() {
        let mut sse = SseBuffer::new();
        assert!(sse.push(b"data: {\"a\"").unwrap().is_empty());
        assert_eq!(
            sse.push(b":1}\n\ndata: [DONE]\n\n").unwrap(),
            vec!["{\"a\":1}", "[DONE]"]
        );
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let event = "data: {\"t\":\"x ≤ y\"}\n\n".as_bytes();
        let cut = event.iter().position(|&b| b == 0xE2).unwrap() + 1;

        let mut sse = SseBuffer::new();
        assert!(sse.push(&event[..cut]).unwrap().is_empty());
        assert_eq!(sse.push(&event[cut..]).unwrap(), vec!["{\"t\":\"x ≤ y\"}"]);
    }

    #[test]
    fn test_invalid_utf8_is_a_parse_error() {
        let mut sse = SseBuffer::new();
        let err = sse.push(b"data: \xff\xfe\n").unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }

    #[test]
    fn test_crlf_and_comments() {
        let mut sse = SseBuffer::new();
        let payloads = sse.push(b": keep-alive\r\ndata: {\"x\":true}\r\n\r\n").unwrap();
        assert_eq!(payloads, vec!["{\"x\":true}"]);
    }

    #[test]
    fn test_finish_flushes_tail() {
        let mut sse = SseBuffer::new();
        assert!(sse.push(b"data: tail").unwrap().is_empty());
        assert_eq!(sse.finish().unwrap().as_deref(), Some("tail"));
        assert_eq!(sse.finish().unwrap(), None);
    }
}
