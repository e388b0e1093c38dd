//! A notifier owns one dedicated Redis connection, since pub/sub mode
//! prevents multiplexing other commands on the same connection.
//!
//! A notifier starts in neither mode; the first `notify_*` or `watch_*`
//! call commits it to publish or watch mode for the rest of its life.

use futures_util::StreamExt;
use gsd_protocol::Address;

use crate::error::NotifierError;
use crate::keys;

/// Which kind of channel a [`Notifier::watch`] woke up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Server,
    Tag,
}

enum State {
    Idle,
    Publishing(redis::aio::ConnectionManager),
    Watching(redis::aio::PubSub),
}

pub struct Notifier {
    client: redis::Client,
    state: State,
}

impl Notifier {
    pub(crate) fn new(client: redis::Client) -> Self {
        Self {
            client,
            state: State::Idle,
        }
    }

    async fn publishing(&mut self) -> Result<&mut redis::aio::ConnectionManager, NotifierError> {
        if matches!(self.state, State::Watching(_)) {
            return Err(NotifierError::AlreadyWatching);
        }
        if matches!(self.state, State::Idle) {
            let conn = self.client.get_connection_manager().await?;
            self.state = State::Publishing(conn);
        }
        match &mut self.state {
            State::Publishing(conn) => Ok(conn),
            _ => unreachable!(),
        }
    }

    async fn watching(&mut self) -> Result<&mut redis::aio::PubSub, NotifierError> {
        if matches!(self.state, State::Publishing(_)) {
            return Err(NotifierError::AlreadyPublishing);
        }
        if matches!(self.state, State::Idle) {
            let pubsub = self.client.get_async_pubsub().await?;
            self.state = State::Watching(pubsub);
        }
        match &mut self.state {
            State::Watching(pubsub) => Ok(pubsub),
            _ => unreachable!(),
        }
    }

    pub async fn notify_server(&mut self, addr: Address) -> Result<(), NotifierError> {
        let addr_str = addr.to_string();
        let channel = keys::server_channel(&addr_str);
        let conn = self.publishing().await?;
        let _: () = conn.publish(channel, addr_str).await?;
        Ok(())
    }

    pub async fn notify_tag(&mut self, tag: &str, addr: Address) -> Result<(), NotifierError> {
        let addr_str = addr.to_string();
        let channel = keys::tag_channel(tag);
        let conn = self.publishing().await?;
        let _: () = conn.publish(channel, addr_str).await?;
        Ok(())
    }

    pub async fn watch_server(&mut self, addr: Address) -> Result<(), NotifierError> {
        let channel = keys::server_channel(&addr.to_string());
        self.watching().await?.subscribe(channel).await?;
        Ok(())
    }

    pub async fn unwatch_server(&mut self, addr: Address) -> Result<(), NotifierError> {
        let channel = keys::server_channel(&addr.to_string());
        self.watching().await?.unsubscribe(channel).await?;
        Ok(())
    }

    pub async fn watch_tag(&mut self, tag: &str) -> Result<(), NotifierError> {
        let channel = keys::tag_channel(tag);
        self.watching().await?.subscribe(channel).await?;
        Ok(())
    }

    pub async fn unwatch_tag(&mut self, tag: &str) -> Result<(), NotifierError> {
        let channel = keys::tag_channel(tag);
        self.watching().await?.unsubscribe(channel).await?;
        Ok(())
    }

    /// Block until any watched channel publishes, returning which kind of
    /// channel fired and the address it named.
    pub async fn watch(&mut self) -> Result<(NotificationKind, Address), NotifierError> {
        let pubsub = match &mut self.state {
            State::Watching(pubsub) => pubsub,
            _ => return Err(NotifierError::NotWatching),
        };
        let message = pubsub
            .on_message()
            .next()
            .await
            .ok_or(NotifierError::ChannelClosed)?;
        let channel = message.get_channel_name().to_owned();
        let payload: String = message.get_payload()?;
        let addr = Address::parse(&payload).map_err(|_| NotifierError::MalformedPayload)?;

        if channel.starts_with(keys::SERVER_CHANNEL_PREFIX) {
            Ok((NotificationKind::Server, addr))
        } else if channel.starts_with(keys::TAG_CHANNEL_PREFIX) {
            Ok((NotificationKind::Tag, addr))
        } else {
            Err(NotifierError::MalformedPayload)
        }
    }

    /// Release the underlying connection. Equivalent to dropping the
    /// notifier; provided so call sites can express intent explicitly in
    /// a `finally`-style block.
    pub fn close(self) {
        drop(self);
    }
}

#[async_trait::async_trait]
impl crate::CacheNotifier for Notifier {
    async fn notify_server(&mut self, addr: Address) -> Result<(), NotifierError> {
        Notifier::notify_server(self, addr).await
    }

    async fn notify_tag(&mut self, tag: &str, addr: Address) -> Result<(), NotifierError> {
        Notifier::notify_tag(self, tag, addr).await
    }

    async fn watch_server(&mut self, addr: Address) -> Result<(), NotifierError> {
        Notifier::watch_server(self, addr).await
    }

    async fn unwatch_server(&mut self, addr: Address) -> Result<(), NotifierError> {
        Notifier::unwatch_server(self, addr).await
    }

    async fn watch_tag(&mut self, tag: &str) -> Result<(), NotifierError> {
        Notifier::watch_tag(self, tag).await
    }

    async fn unwatch_tag(&mut self, tag: &str) -> Result<(), NotifierError> {
        Notifier::unwatch_tag(self, tag).await
    }

    async fn watch(&mut self) -> Result<(NotificationKind, Address), NotifierError> {
        Notifier::watch(self).await
    }
}
