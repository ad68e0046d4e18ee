//! Notifications emitted by the store

use std::path::PathBuf;
use tokio::sync::mpsc;

/// Events delivered to subscribers of a store.
///
/// # Example
///
/// ```no_run
/// use settings_store::{StoreEvent, StoreOptions};
///
/// let (store, mut events) = StoreOptions::new("settings.xml").open_with_events();
/// while let Ok(event) = events.try_recv() {
///     if let StoreEvent::Loaded { groups, .. } = event {
///         println!("{} groups ready", groups);
///     }
/// }
/// # drop(store);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// The initial load finished; fired once per store.
    Loaded { path: PathBuf, groups: usize },
    /// The document was written to disk.
    Saved { path: PathBuf },
    /// The document was reloaded from disk.
    Refreshed { path: PathBuf },
    /// The backing file was deleted and the document reset.
    FileDeleted { path: PathBuf },
    /// An error was swallowed at the public boundary.
    Error { message: String },
}

pub type EventReceiver = mpsc::UnboundedReceiver<StoreEvent>;

#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    senders: Vec<mpsc::UnboundedSender<StoreEvent>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self) -> EventReceiver {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.senders.push(sender);
        receiver
    }

    /// Deliver to every live subscriber, dropping closed ones.
    pub(crate) fn emit(&mut self, event: StoreEvent) {
        self.senders
            .retain(|sender| sender.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }
}
