use crate::error::SubmitError;
use hermes_wire::Message;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};

/// Maximum number of in-flight requests a supervisor will hold at once.
pub(crate) const CAPACITY: usize = 10;
const SUBMIT_RETRIES: usize = 50;
const SUBMIT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// One scheduled request waiting for the dispatch loop to service it.
pub(crate) struct Envelope {
    pub message: Message,
    pub reply: oneshot::Sender<Result<Message, SubmitError>>,
}

/// Fixed-size set of request slots shared between `Supervisor::submit` and
/// the per-connection dispatch loop. A slot holds at most one in-flight
/// request; `submit` installs into the first free slot and the dispatch loop
/// drains slots one at a time, in no particular order.
pub(crate) struct CommandBuffer {
    slots: Mutex<Vec<Option<Envelope>>>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new((0..CAPACITY).map(|_| None).collect()),
        }
    }

    /// Installs `envelope` into the first free slot. Returns it back unchanged
    /// if the buffer is full.
    async fn try_install(&self, envelope: Envelope) -> Option<Envelope> {
        let mut slots = self.slots.lock().await;
        match slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(envelope);
                None
            }
            None => Some(envelope),
        }
    }

    /// Takes the first occupied slot, leaving it empty. Used by the dispatch
    /// loop to claim exactly one request per iteration.
    pub async fn take_one(&self) -> Option<Envelope> {
        let mut slots = self.slots.lock().await;
        slots.iter_mut().find_map(Option::take)
    }

    /// Empties every slot, failing each waiting caller with `error()`. Called
    /// after a crash is detected, before the new connection starts serving
    /// requests, so stale envelopes from the dead connection don't linger.
    pub async fn drain_with_error(&self, error: impl Fn() -> SubmitError) {
        let mut slots = self.slots.lock().await;
        for slot in slots.iter_mut() {
            if let Some(envelope) = slot.take() {
                let _ = envelope.reply.send(Err(error()));
            }
        }
    }

    /// Schedules `message`, retrying every 100ms up to 50 times if the buffer
    /// is full, then awaits the dispatch loop's reply.
    pub async fn submit(&self, message: Message) -> Result<Message, SubmitError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let mut envelope = Envelope { message, reply: reply_tx };

        for _ in 0..SUBMIT_RETRIES {
            match self.try_install(envelope).await {
                None => {
                    return match reply_rx.await {
                        Ok(result) => result,
                        Err(_) => Err(SubmitError::ChannelClosed),
                    };
                }
                Some(returned) => {
                    envelope = returned;
                    tokio::time::sleep(SUBMIT_RETRY_DELAY).await;
                }
            }
        }

        Err(SubmitError::SchedulingTimeout)
    }
}
