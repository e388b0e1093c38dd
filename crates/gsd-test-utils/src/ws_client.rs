//! A minimal WebSocket client over [`gsd_protocol::WsMessage`], for
//! integration tests driving a real `gsd_websocket::serve` instance bound
//! to a loopback port.

use futures_util::{SinkExt, StreamExt};
use gsd_protocol::WsMessage;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::MaybeTlsStream;

type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub struct WsClient {
    write: futures_util::stream::SplitSink<WsStream, Message>,
    read: futures_util::stream::SplitStream<WsStream>,
}

impl WsClient {
    pub async fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
        let (write, read) = stream.split();
        Ok(Self { write, read })
    }

    pub async fn send(&mut self, message: &WsMessage) -> Result<(), Box<dyn std::error::Error>> {
        self.write
            .send(Message::Text(message.to_json_string().into()))
            .await?;
        Ok(())
    }

    /// Read the next message, skipping pings/pongs. Errors on a close
    /// frame or a stream end, since every test using this expects a
    /// reply to still be coming.
    pub async fn recv(&mut self) -> Result<WsMessage, Box<dyn std::error::Error>> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(WsMessage::parse(&text)?);
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) => return Err("connection closed by server".into()),
                Some(Ok(_)) => continue,
                Some(Err(error)) => return Err(error.into()),
                None => return Err("connection stream ended".into()),
            }
        }
    }
}
