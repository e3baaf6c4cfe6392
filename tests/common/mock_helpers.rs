//! Mock construction helpers

use crossbeam_channel::{bounded, Receiver, Sender};
use motion_har::inference::FnInvoker;
use motion_har::sensor::FnSource;
use motion_har::{Channel, Result, Sample, Tensor};

/// Source that yields 1, 2, 3, ... on every read
pub fn counting_source() -> FnSource<impl FnMut(Channel) -> Result<Sample> + Send> {
    let mut next = 0.0;
    FnSource::new("counter", move |_| {
        next += 1.0;
        Ok(next)
    })
}

/// Controls for a [`gated_invoker`]
pub struct Gate {
    /// Receives one message each time an invocation starts
    pub entered: Receiver<()>,
    /// Each message lets one blocked invocation finish
    pub release: Sender<()>,
}

/// Invoker that blocks inside every call until the test releases it
pub fn gated_invoker(
    scores: Vec<f32>,
) -> (FnInvoker<impl Fn(&Tensor) -> Result<Vec<f32>> + Send + Sync>, Gate) {
    let (entered_tx, entered_rx) = bounded(64);
    let (release_tx, release_rx) = bounded::<()>(64);
    let invoker = FnInvoker::new("gated", move |_: &Tensor| {
        let _ = entered_tx.send(());
        let _ = release_rx.recv();
        Ok(scores.clone())
    });
    (
        invoker,
        Gate {
            entered: entered_rx,
            release: release_tx,
        },
    )
}
