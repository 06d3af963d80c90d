use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tracing::debug;

/// What travels over the reply channel.
#[derive(Debug)]
enum Frame {
    Chunk(String),
    Reset(String),
    Done,
}

/// An event observed by the reply consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    /// Append this text to the reply.
    Chunk(String),
    /// Discard the partial reply and show exactly this text.
    Reset(String),
}

/// Create the single-producer, single-consumer handle for one exchange.
///
/// Unbounded: the producer never waits on a slow or absent reader.
pub fn reply_channel() -> (ReplySender, ReplyStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ReplySender {
            tx,
            relayed: 0,
            finished: false,
        },
        ReplyStream {
            rx,
            completed: false,
        },
    )
}

/// Write side of the reply channel. Not `Clone`: one writer per exchange.
///
/// Completion is signaled by `done`, which consumes the sender. A sender
/// dropped without `done` still signals completion exactly once.
#[derive(Debug)]
pub struct ReplySender {
    tx: mpsc::UnboundedSender<Frame>,
    relayed: usize,
    finished: bool,
}

impl ReplySender {
    /// Relay a chunk. Returns `false` when nobody is listening any more,
    /// which is not an error.
    pub fn update(&mut self, chunk: impl Into<String>) -> bool {
        self.relayed += 1;
        self.send(Frame::Chunk(chunk.into()))
    }

    /// Replace everything relayed so far with `text`.
    pub fn reset(&mut self, text: impl Into<String>) -> bool {
        self.send(Frame::Reset(text.into()))
    }

    /// Signal completion.
    pub fn done(mut self) {
        self.finish();
    }

    /// Number of chunks relayed through `update`.
    pub fn relayed(&self) -> usize {
        self.relayed
    }

    /// Whether the read side is still alive.
    pub fn is_observed(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, frame: Frame) -> bool {
        if self.tx.send(frame).is_err() {
            debug!("Reply consumer gone; dropping frame");
            return false;
        }
        true
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.send(Frame::Done);
        }
    }
}

impl Drop for ReplySender {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Read side of the reply channel: a finite, ordered stream of events that
/// ends once the producer signals completion.
#[derive(Debug)]
pub struct ReplyStream {
    rx: mpsc::UnboundedReceiver<Frame>,
    completed: bool,
}

impl ReplyStream {
    pub fn is_complete(&self) -> bool {
        self.completed
    }
}

impl Stream for ReplyStream {
    type Item = ReplyEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.completed {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(Frame::Chunk(text))) => Poll::Ready(Some(ReplyEvent::Chunk(text))),
            Poll::Ready(Some(Frame::Reset(text))) => Poll::Ready(Some(ReplyEvent::Reset(text))),
            Poll::Ready(Some(Frame::Done)) | Poll::Ready(None) => {
                this.completed = true;
                this.rx.close();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_chunks_arrive_in_order() {
        let (mut tx, rx) = reply_channel();
        for chunk in ["a", "b", "c"] {
            assert!(tx.update(chunk));
        }
        assert_eq!(tx.relayed(), 3);
        tx.done();

        let events: Vec<_> = rx.collect().await;
        assert_eq!(
            events,
            vec![
                ReplyEvent::Chunk("a".into()),
                ReplyEvent::Chunk("b".into()),
                ReplyEvent::Chunk("c".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_stays_finished() {
        let (mut tx, mut rx) = reply_channel();
        tx.update("only");
        tx.done();

        assert_eq!(rx.next().await, Some(ReplyEvent::Chunk("only".into())));
        assert_eq!(rx.next().await, None);
        assert!(rx.is_complete());
        assert_eq!(rx.next().await, None);
    }

    #[tokio::test]
    async fn test_dropped_sender_completes_stream() {
        let (mut tx, mut rx) = reply_channel();
        tx.update("partial");
        drop(tx);

        assert_eq!(rx.next().await, Some(ReplyEvent::Chunk("partial".into())));
        assert_eq!(rx.next().await, None);
    }

    #[tokio::test]
    async fn test_send_without_subscriber_is_noop() {
        let (mut tx, rx) = reply_channel();
        drop(rx);

        assert!(!tx.is_observed());
        assert!(!tx.update("ignored"));
        assert!(!tx.reset("ignored"));
        tx.done();
    }

    #[tokio::test]
    async fn test_reset_is_forwarded() {
        let (mut tx, rx) = reply_channel();
        tx.update("par");
        tx.reset("fallback");
        tx.done();

        let events: Vec<_> = rx.collect().await;
        assert_eq!(events.last(), Some(&ReplyEvent::Reset("fallback".into())));
    }
}
