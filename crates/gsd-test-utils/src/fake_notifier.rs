use std::collections::HashSet;

use gsd_cache::{CacheNotifier, NotificationKind, NotifierError};
use gsd_protocol::Address;
use tokio::sync::broadcast;

use crate::event::{Channel, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Publishing,
    Watching,
}

/// An in-memory stand-in for `gsd_cache::Notifier`, backed by a
/// `tokio::sync::broadcast` channel shared with the [`crate::FakeCache`]
/// that created it, instead of a redis pub/sub connection.
pub struct FakeNotifier {
    tx: broadcast::Sender<Event>,
    rx: broadcast::Receiver<Event>,
    watched: HashSet<Channel>,
    mode: Mode,
}

impl FakeNotifier {
    pub(crate) fn new(tx: broadcast::Sender<Event>) -> Self {
        let rx = tx.subscribe();
        Self {
            tx,
            rx,
            watched: HashSet::new(),
            mode: Mode::Idle,
        }
    }

    fn enter_publishing(&mut self) -> Result<(), NotifierError> {
        if self.mode == Mode::Watching {
            return Err(NotifierError::AlreadyWatching);
        }
        self.mode = Mode::Publishing;
        Ok(())
    }

    fn enter_watching(&mut self) -> Result<(), NotifierError> {
        if self.mode == Mode::Publishing {
            return Err(NotifierError::AlreadyPublishing);
        }
        self.mode = Mode::Watching;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CacheNotifier for FakeNotifier {
    async fn notify_server(&mut self, addr: Address) -> Result<(), NotifierError> {
        self.enter_publishing()?;
        let _ = self.tx.send(Event {
            channel: Channel::Server(addr),
            addr,
        });
        Ok(())
    }

    async fn notify_tag(&mut self, tag: &str, addr: Address) -> Result<(), NotifierError> {
        self.enter_publishing()?;
        let _ = self.tx.send(Event {
            channel: Channel::Tag(tag.to_owned()),
            addr,
        });
        Ok(())
    }

    async fn watch_server(&mut self, addr: Address) -> Result<(), NotifierError> {
        self.enter_watching()?;
        self.watched.insert(Channel::Server(addr));
        Ok(())
    }

    async fn unwatch_server(&mut self, addr: Address) -> Result<(), NotifierError> {
        self.enter_watching()?;
        self.watched.remove(&Channel::Server(addr));
        Ok(())
    }

    async fn watch_tag(&mut self, tag: &str) -> Result<(), NotifierError> {
        self.enter_watching()?;
        self.watched.insert(Channel::Tag(tag.to_owned()));
        Ok(())
    }

    async fn unwatch_tag(&mut self, tag: &str) -> Result<(), NotifierError> {
        self.enter_watching()?;
        self.watched.remove(&Channel::Tag(tag.to_owned()));
        Ok(())
    }

    async fn watch(&mut self) -> Result<(NotificationKind, Address), NotifierError> {
        if self.mode != Mode::Watching {
            return Err(NotifierError::NotWatching);
        }
        loop {
            let event = match self.rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(NotifierError::ChannelClosed)
                }
            };
            if !self.watched.contains(&event.channel) {
                continue;
            }
            let kind = match &event.channel {
                Channel::Server(_) => NotificationKind::Server,
                Channel::Tag(_) => NotificationKind::Tag,
            };
            return Ok((kind, event.addr));
        }
    }
}
