use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

use gsd_protocol::Address;

use crate::error::SyncError;
use crate::protocol::{build_request, parse_response, Region, FIRST_SEED};

/// Default upstream: Valve's public Source-engine master server.
pub const DEFAULT_MASTER_SERVER: &str = "hl2master.steampowered.com:27011";

/// Per-request timeout. One region may take many requests to page
/// through; each individual request gets this budget.
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// A safety cap on pages per region, so a misbehaving upstream that never
/// sends the sentinel can't wedge a sync pass forever.
const MAX_PAGES: usize = 10_000;

/// An upstream directory of known server addresses, filtered by region
/// and a Source engine filter string. [`SteamMasterServer`] is the only
/// production implementation; tests supply their own.
pub trait MasterServerDirectory: Send + Sync {
    async fn region(&self, region: Region, filter: &str) -> Result<Vec<Address>, SyncError>;
}

/// Queries a real Source engine master server over UDP, paging through
/// a region with the server's own continuation protocol until the
/// `0.0.0.0:0` sentinel is returned.
pub struct SteamMasterServer {
    master_addr: SocketAddr,
}

impl SteamMasterServer {
    pub fn new(master_addr: SocketAddr) -> Self {
        Self { master_addr }
    }
}

impl MasterServerDirectory for SteamMasterServer {
    async fn region(&self, region: Region, filter: &str) -> Result<Vec<Address>, SyncError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(self.master_addr).await?;

        let mut addresses = Vec::new();
        let mut seed = FIRST_SEED.to_owned();

        for _ in 0..MAX_PAGES {
            let request = build_request(region, &seed, filter);
            socket.send(&request).await?;

            let mut buf = [0u8; 2048];
            let received = timeout(QUERY_TIMEOUT, socket.recv(&mut buf))
                .await
                .map_err(|_elapsed| SyncError::Timeout)??;

            let page = parse_response(&buf[..received])?;
            let last_of_page = page.addresses.last().copied();
            addresses.extend(page.addresses);

            if page.exhausted {
                break;
            }
            match last_of_page {
                Some(addr) => seed = addr.to_string(),
                // A non-exhausted, empty page shouldn't happen; bail out
                // rather than looping on an unchanged seed.
                None => return Err(SyncError::MalformedResponse),
            }
        }

        Ok(addresses)
    }
}
