use bytes::Bytes;
use concierge_backend::ErrorKind;

use super::Chunks;
use crate::Error;

/// A type for reading the `data` payloads of server-sent events from a
/// chunk stream.
///
/// Bytes are buffered until a whole event has arrived, so an event split
/// in the middle of a multi-byte character is still decoded correctly.
pub struct Sse {
    buf: Vec<u8>,
    chunks: Chunks,
    exhausted: bool,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
            exhausted: false,
        }
    }

    /// Returns the payload of the next event that carries data.
    pub async fn next_data(&mut self) -> Result<Option<Bytes>, Error> {
        loop {
            // Drain every complete event in the buffer first. Events without
            // data fields (comments, keep-alives) produce nothing.
            while let Some(event) = self.take_event() {
                if let Some(data) = parse_event(&event)? {
                    return Ok(Some(data));
                }
            }

            if self.exhausted {
                if !self.buf.is_empty() {
                    trace!("discard incomplete event: {} bytes", self.buf.len());
                    self.buf.clear();
                }
                return Ok(None);
            }

            match self.chunks.next_chunk().await? {
                Some(bytes) => self.buf.extend_from_slice(&bytes),
                None => self.exhausted = true,
            }
        }
    }

    fn take_event(&mut self) -> Option<Vec<u8>> {
        // end-of-line = ( cr lf / cr / lf ), we handle lf and cr lf. An
        // event ends with an empty line.
        let (end, consumed) = (0..self.buf.len()).find_map(|idx| {
            let rest = &self.buf[idx..];
            if rest.starts_with(b"\n\n") {
                Some((idx, idx + 2))
            } else if rest.starts_with(b"\r\n\r\n") {
                Some((idx, idx + 4))
            } else {
                None
            }
        })?;
        let event = self.buf[..end].to_vec();
        self.buf.drain(..consumed);
        Some(event)
    }
}

// event         = *( comment / field ) end-of-line
// comment       = colon *any-char end-of-line
// field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
//
// The optional space is kept: the backend writes each token right after
// the colon, and a token may itself start with a space.
fn parse_event(event: &[u8]) -> Result<Option<Bytes>, Error> {
    let Ok(event) = str::from_utf8(event) else {
        return Err(Error::new(
            "invalid event stream payload",
            ErrorKind::Decode,
        ));
    };

    let mut data: Option<String> = None;
    for line in event.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (name, value) = line.split_once(':').unwrap_or((line, ""));
        if name != "data" {
            // `event`, `id` and `retry` don't affect the reply text.
            continue;
        }
        match &mut data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => data = Some(value.to_owned()),
        }
    }

    Ok(data.map(Bytes::from))
}

#[cfg(test)]
mod tests {
    use concierge_backend::BackendError;

    use super::*;

    async fn collect(
        chunks: &[&'static [u8]],
    ) -> Result<Vec<String>, Error> {
        let mut sse = Sse::new(Chunks::from_static(chunks));
        let mut payloads = Vec::new();
        while let Some(data) = sse.next_data().await? {
            payloads.push(String::from_utf8(data.to_vec()).unwrap());
        }
        Ok(payloads)
    }

    #[tokio::test]
    async fn test_normal_events() {
        let payloads =
            collect(&[b"data:hello\n\n", b"data:bye\n\n"]).await.unwrap();
        assert_eq!(payloads, ["hello", "bye"]);
    }

    #[tokio::test]
    async fn test_leading_space_is_kept() {
        let payloads = collect(&[
            b"data:Hello\n\n",
            b"data: \n\n",
            b"data: there\n\n",
        ])
        .await
        .unwrap();
        assert_eq!(payloads.concat(), "Hello  there");
        assert_eq!(payloads[1], " ");
    }

    #[tokio::test]
    async fn test_quirk_streaming() {
        let payloads = collect(&[b"da", b"ta:hel", b"lo\n", b"\n"])
            .await
            .unwrap();
        assert_eq!(payloads, ["hello"]);
    }

    #[tokio::test]
    async fn test_split_multibyte_character() {
        // "€" is e2 82 ac.
        let payloads =
            collect(&[b"data:5\xe2\x82", b"\xac\n\n"]).await.unwrap();
        assert_eq!(payloads, ["5€"]);
    }

    #[tokio::test]
    async fn test_multiline_data_and_other_fields() {
        let payloads = collect(&[
            b": keep-alive\n\n",
            b"event: message\r\nid: 1\r\ndata:line one\r\ndata:line two\r\n\r\n",
        ])
        .await
        .unwrap();
        assert_eq!(payloads, ["line one\nline two"]);
    }

    #[tokio::test]
    async fn test_incomplete_and_invalid_data() {
        let payloads = collect(&[b"data:hello\n"]).await.unwrap();
        assert!(payloads.is_empty());

        let err = collect(&[b"data:\xff\xfe\n\n"]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
