//! Wake-ups for the background handshake driver
//!
//! The driver sweeps the retry queue on a fixed interval. Anything that
//!  queues a fresh handshake can dispatch a job so the first attempt does
//!  not wait for the next interval.

use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeJob {
    /// Sweep the whole retry queue now
    RunDue,
}

/// Cloneable sending half, shared with anything that queues handshakes
#[derive(Debug, Clone)]
pub struct HandshakeDispatcher {
    tx: flume::Sender<HandshakeJob>,
}

impl HandshakeDispatcher {
    pub fn new() -> (Self, HandshakeJobReceiver) {
        let (tx, rx) = flume::unbounded();
        (Self { tx }, HandshakeJobReceiver { rx })
    }

    pub fn dispatch(&self, job: HandshakeJob) -> Result<()> {
        tracing::debug!(?job, "dispatching handshake job");
        self.tx
            .send(job)
            .map_err(|_| anyhow::anyhow!("handshake job receiver has been dropped"))
    }
}

/// Receiving half, owned by the driver task
#[derive(Debug)]
pub struct HandshakeJobReceiver {
    rx: flume::Receiver<HandshakeJob>,
}

impl HandshakeJobReceiver {
    pub fn try_recv(&self) -> Option<HandshakeJob> {
        self.rx.try_recv().ok()
    }

    pub fn into_async(self) -> flume::r#async::RecvStream<'static, HandshakeJob> {
        self.rx.into_stream()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_and_receive() {
        let (dispatcher, receiver) = HandshakeDispatcher::new();
        dispatcher.dispatch(HandshakeJob::RunDue).unwrap();
        assert_eq!(receiver.try_recv(), Some(HandshakeJob::RunDue));
        assert_eq!(receiver.try_recv(), None);
    }

    #[test]
    fn test_dispatch_after_receiver_dropped() {
        let (dispatcher, receiver) = HandshakeDispatcher::new();
        drop(receiver);
        assert!(dispatcher.dispatch(HandshakeJob::RunDue).is_err());
    }
}
