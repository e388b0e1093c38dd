use std::net::SocketAddrV4;
use std::time::Duration;

use crate::error::{classify, PollError};
use crate::types::{A2sInfo, A2sPlayers, A2sRules};

/// Per-request timeout for every INFO/PLAYERS/RULES query, per the
/// poller's polling-cycle contract.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// The three responses of one polling cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct A2sQueryResult {
    pub info: A2sInfo,
    pub players: A2sPlayers,
    pub rules: A2sRules,
}

/// Query `addr` for INFO, PLAYERS and RULES in sequence.
///
/// The `a2s` crate's client is blocking (a plain `UdpSocket` under the
/// hood), so the query runs on the blocking thread pool. Each of the
/// three calls carries its own 5s socket-level timeout
/// (`client.set_timeout`); the outer `tokio::time` timeout is a backstop
/// sized for all three in sequence, not a second per-request budget, so
/// three compliant ~5s responses can't trip it early.
pub async fn query(addr: SocketAddrV4) -> Result<A2sQueryResult, PollError> {
    let outcome = tokio::time::timeout(
        QUERY_TIMEOUT * 3,
        tokio::task::spawn_blocking(move || query_blocking(addr)),
    )
    .await;

    match outcome {
        Err(_elapsed) => Err(PollError::NoResponse),
        Ok(Err(_join_error)) => Err(PollError::BrokenMessage(
            "querier task panicked".to_owned(),
        )),
        Ok(Ok(result)) => result,
    }
}

fn query_blocking(addr: SocketAddrV4) -> Result<A2sQueryResult, PollError> {
    let mut client =
        a2s::A2SClient::new().map_err(|e| PollError::BrokenMessage(e.to_string()))?;
    client.set_timeout(QUERY_TIMEOUT);

    let info: A2sInfo = client
        .info(addr)
        .map_err(|e| classify(&e))?
        .into();
    let players: A2sPlayers = client
        .players(addr)
        .map_err(|e| classify(&e))?
        .into();
    let rules: A2sRules = client
        .rules(addr)
        .map_err(|e| classify(&e))?
        .into();

    Ok(A2sQueryResult {
        info,
        players,
        rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a live A2S-speaking server"]
    async fn query_times_out_against_a_black_hole() {
        // 192.0.2.0/24 is TEST-NET-1: guaranteed unroutable, so this
        // exercises the timeout path without a real server.
        let addr: SocketAddrV4 = "192.0.2.1:27015".parse().unwrap();
        let result = query(addr).await;
        assert!(matches!(result, Err(PollError::NoResponse)));
    }
}
