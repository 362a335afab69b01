#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::Response;

use crate::Error;

enum Source {
    Response(Response),
    #[cfg(test)]
    Scripted(VecDeque<Result<Bytes, Error>>),
}

/// The body of a reply, read chunk by chunk.
///
/// Empty chunks are skipped, so `Some` always carries at least one byte.
pub struct Chunks {
    source: Source,
    received: usize,
}

impl Chunks {
    pub fn from_response(response: Response) -> Self {
        Self::from_source(Source::Response(response))
    }

    #[cfg(test)]
    pub fn scripted<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Result<Bytes, Error>>,
    {
        Self::from_source(Source::Scripted(items.into_iter().collect()))
    }

    #[cfg(test)]
    pub fn from_static(chunks: &[&'static [u8]]) -> Self {
        Self::scripted(chunks.iter().copied().map(|c| Ok(Bytes::from_static(c))))
    }

    fn from_source(source: Source) -> Self {
        Self {
            source,
            received: 0,
        }
    }

    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        loop {
            let chunk = match &mut self.source {
                Source::Response(response) => {
                    response.chunk().await.map_err(|err| {
                        error!("body broke after {} bytes", self.received);
                        Error::from_reqwest(err)
                    })?
                }
                #[cfg(test)]
                Source::Scripted(items) => items.pop_front().transpose()?,
            };
            match chunk {
                Some(chunk) if chunk.is_empty() => continue,
                Some(chunk) => {
                    self.received += chunk.len();
                    return Ok(Some(chunk));
                }
                None => {
                    trace!("body finished: {} bytes", self.received);
                    return Ok(None);
                }
            }
        }
    }
}
