use std::sync::mpsc::{self, Receiver, Sender};

/// 將事件廣播給所有仍在接收的訂閱者。 / Fans events out to every subscriber that is still listening.
///
/// Receivers are drained on the thread that owns the hub; dropping a receiver unsubscribes it.
#[derive(Debug)]
pub struct EventHub<E> {
    subscribers: Vec<Sender<E>>,
}

impl<E: Clone> EventHub<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// 新增訂閱者。 / Registers a new subscriber.
    pub fn subscribe(&mut self) -> Receiver<E> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// 發送事件並移除已中斷的訂閱者。 / Sends an event, pruning disconnected subscribers.
    pub fn emit(&mut self, event: E) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<E: Clone> Default for EventHub<E> {
    fn default() -> Self {
        Self::new()
    }
}
