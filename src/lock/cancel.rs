use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Lets a caller abort a lock request that is waiting in a queue.
///
/// The handle fires once its [`Canceller`] is cancelled or dropped. Requests
/// that are granted without waiting ignore it.
#[derive(Clone)]
pub struct Cancellation {
    receiver: Receiver<()>,
}

/// Fires the paired [`Cancellation`], either through [`Canceller::cancel`] or
/// when dropped.
#[must_use = "dropping a Canceller fires its Cancellation"]
pub struct Canceller {
    sender: Sender<()>,
}

impl Canceller {
    pub fn cancel(self) {
        drop(self.sender);
    }
}

impl Cancellation {
    /// Creates a linked pair.
    ///
    /// The [`Canceller`] must be kept alive for as long as waits should go on:
    /// `let (_, cancel) = Cancellation::new()` drops it on the spot, and every
    /// wait on `cancel` is then cancelled straight away. Use
    /// [`Cancellation::never`] when no cancellation is wanted.
    #[must_use = "dropping the Canceller cancels the paired Cancellation"]
    pub fn new() -> (Canceller, Cancellation) {
        let (sender, receiver) = crossbeam_channel::bounded(0);
        (Canceller { sender }, Cancellation { receiver })
    }

    /// A handle that never fires.
    pub fn never() -> Cancellation {
        Cancellation {
            receiver: crossbeam_channel::never(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.receiver.try_recv(), Err(TryRecvError::Disconnected))
    }

    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}
