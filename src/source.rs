//! Input side of the pipeline: a reader task feeding fixed-size fragments
//! through a bounded channel.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, trace};

pub type Fragment = io::Result<Vec<u8>>;

/// Spawn a task that reads `reader` in fragments of at most `fragment_size`
/// bytes. At most `capacity` fragments wait in the channel, so a slow
/// consumer stalls the reader instead of growing memory.
///
/// A read error is sent as the final item. The task also stops when the
/// receiver is dropped.
pub fn spawn_reader<R>(
    mut reader: R,
    fragment_size: usize,
    capacity: usize,
) -> mpsc::Receiver<Fragment>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let fragment_size = fragment_size.max(1);
    let (tx, rx) = mpsc::channel(capacity.max(1));

    tokio::spawn(async move {
        let mut total = 0u64;
        loop {
            let mut buf = vec![0u8; fragment_size];
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };
            buf.truncate(n);
            total += n as u64;
            trace!(bytes = n, "Read fragment");

            if tx.send(Ok(buf)).await.is_err() {
                debug!(total, "Consumer went away, reader stopping");
                return;
            }
        }
        debug!(total, "Reached end of input");
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    async fn collect(mut rx: mpsc::Receiver<Fragment>) -> (Vec<u8>, Option<io::Error>) {
        let mut data = Vec::new();
        while let Some(item) = rx.recv().await {
            match item {
                Ok(bytes) => data.extend(bytes),
                Err(e) => return (data, Some(e)),
            }
        }
        (data, None)
    }

    #[tokio::test]
    async fn test_reads_everything_in_small_fragments() {
        let input: &'static [u8] = b"alpha beta gamma delta";
        let mut rx = spawn_reader(input, 4, 2);

        let first = rx.recv().await.unwrap().unwrap();
        assert!(first.len() <= 4);

        let (rest, err) = collect(rx).await;
        assert!(err.is_none());
        assert_eq!([first, rest].concat(), input);
    }

    #[tokio::test]
    async fn test_empty_input_closes_channel() {
        let rx = spawn_reader(tokio::io::empty(), 16, 1);
        let (data, err) = collect(rx).await;
        assert!(data.is_empty());
        assert!(err.is_none());
    }

    /// Yields `good` once, then fails
    struct Flaky {
        good: Option<Vec<u8>>,
    }

    impl AsyncRead for Flaky {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.good.take() {
                Some(bytes) => {
                    buf.put_slice(&bytes);
                    Poll::Ready(Ok(()))
                }
                None => Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))),
            }
        }
    }

    #[tokio::test]
    async fn test_read_error_is_delivered_last() {
        let rx = spawn_reader(Flaky { good: Some(b"ok".to_vec()) }, 16, 1);
        let (data, err) = collect(rx).await;
        assert_eq!(data, b"ok");
        assert_eq!(err.unwrap().kind(), io::ErrorKind::BrokenPipe);
    }

    /// Serves `data` in reads of at most the caller's buffer size and counts
    /// every read that returned bytes
    struct Counting {
        data: Vec<u8>,
        pos: usize,
        reads: Arc<AtomicUsize>,
    }

    impl AsyncRead for Counting {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let n = buf.remaining().min(self.data.len() - self.pos);
            if n > 0 {
                let start = self.pos;
                buf.put_slice(&self.data[start..start + n]);
                self.pos += n;
                self.reads.fetch_add(1, Ordering::SeqCst);
            }
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_stalled_consumer_stalls_reader() {
        let data: Vec<u8> = (0..64u8).collect();
        let reads = Arc::new(AtomicUsize::new(0));
        let reader = Counting {
            data: data.clone(),
            pos: 0,
            reads: reads.clone(),
        };
        let capacity = 1;
        let rx = spawn_reader(reader, 4, capacity);

        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
        // one fragment waits in the channel, one is held by the blocked send
        let stalled_at = reads.load(Ordering::SeqCst);
        assert!(stalled_at >= 1);
        assert!(stalled_at <= capacity + 1, "reader ran ahead: {stalled_at} reads");

        let (received, err) = collect(rx).await;
        assert!(err.is_none());
        assert_eq!(received, data);
        assert_eq!(reads.load(Ordering::SeqCst), 16);
    }
}
