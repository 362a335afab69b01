use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use concierge_backend::ChatResponse;
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::{Chunks, Sse};

/// Where the reply bytes come from.
enum Body {
    /// A plain streamed body, handed out chunk by chunk.
    Raw(Chunks),
    /// An event stream, handed out as one `data` payload per event.
    Sse(Sse),
}

impl Body {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self {
            Body::Raw(chunks) => chunks.next_chunk().await,
            Body::Sse(sse) => sse.next_data().await,
        }
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextChunk = Result<(Option<Bytes>, Body), Error>;

pin_project! {
    pub struct HttpResponse {
        next_chunk_fut: Option<PinnedFuture<NextChunk>>,
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse").finish_non_exhaustive()
    }
}

impl HttpResponse {
    #[inline]
    pub(crate) fn from_chunks(chunks: Chunks) -> Self {
        Self::from_body(Body::Raw(chunks))
    }

    #[inline]
    pub(crate) fn from_sse(sse: Sse) -> Self {
        Self::from_body(Body::Sse(sse))
    }

    fn from_body(body: Body) -> Self {
        Self {
            next_chunk_fut: Some(Box::pin(next_chunk(body))),
        }
    }
}

impl ChatResponse for HttpResponse {
    type Error = crate::Error;

    fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Bytes>, Self::Error>> {
        let this = self.project();
        let Some(next_chunk_fut) = this.next_chunk_fut else {
            // The body has been exhausted or has failed.
            return Poll::Ready(Ok(None));
        };
        let (chunk, body) = match ready!(next_chunk_fut.as_mut().poll(cx)) {
            Ok((Some(chunk), body)) => (chunk, body),
            Ok((None, _)) => {
                *this.next_chunk_fut = None;
                return Poll::Ready(Ok(None));
            }
            Err(err) => {
                *this.next_chunk_fut = None;
                return Poll::Ready(Err(err));
            }
        };

        // The body may still have more data to pull, create a new future for
        // the next chunk.
        *this.next_chunk_fut = Some(Box::pin(next_chunk(body)));

        Poll::Ready(Ok(Some(chunk)))
    }
}

async fn next_chunk(mut body: Body) -> NextChunk {
    let chunk = body.next_chunk().await?;
    if let Some(chunk) = &chunk {
        trace!("got a chunk: {} bytes", chunk.len());
    }
    Ok((chunk, body))
}
