use crate::session::Session;
use crossbeam_channel::{bounded, select, tick, Sender};
use log::{debug, error};
use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

/// Background thread that periodically drains the hardware stream of a time-based session.
///
/// The stream is drained one last time when the poller stops, so reports sampled after the final
/// tick still reach the metric dump.
pub struct StreamPoller {
    shutdown_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl StreamPoller {
    /// Starts draining `session` every `interval`.
    pub fn spawn(session: Arc<Session>, interval: Duration) -> io::Result<StreamPoller> {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let handle = thread::Builder::new()
            .name("devperf-stream".to_owned())
            .spawn(move || {
                let ticker = tick(interval);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            session.drain_stream();
                        },
                        // Only ever fires on disconnect.
                        recv(shutdown_rx) -> _ => break,
                    }
                }

                let batches = session.drain_stream();
                debug!("stream poller stopped after a final drain of {} batches", batches);
            })?;

        Ok(StreamPoller {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Stops the poller and waits for its final drain.
    pub fn stop(mut self) { self.shutdown(); }

    fn shutdown(&mut self) {
        drop(self.shutdown_tx.take());

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("stream poller thread panicked");
            }
        }
    }
}

impl Drop for StreamPoller {
    fn drop(&mut self) { self.shutdown(); }
}
