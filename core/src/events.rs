use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Subscription list owned by the object that raises the events.
///
/// Each `subscribe` call hands out its own receiver; receivers that were
/// dropped are pruned on the next `emit`.
#[derive(Debug)]
pub struct Subscribers<E> {
    senders: Vec<UnboundedSender<E>>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            senders: Vec::new(),
        }
    }
}

impl<E: Clone> Subscribers<E> {
    pub fn subscribe(&mut self) -> UnboundedReceiver<E> {
        let (tx, rx) = unbounded_channel();
        self.senders.push(tx);
        rx
    }

    pub fn emit(&mut self, event: E) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

/// Drains everything already queued on `rx` without waiting.
pub fn drain<E>(rx: &mut UnboundedReceiver<E>) -> Vec<E> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
