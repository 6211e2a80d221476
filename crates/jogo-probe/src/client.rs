use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::net::UdpSocket;

use crate::error::LatencyError;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(1);

/// Measures a round trip to `host:port`'s UDP echo endpoint. Returns the RTT
/// in milliseconds, or a negative sentinel on failure: `-1.0` on timeout,
/// `-2.0` on any other I/O error (spec.md §4.5, matching
/// `cliente_cmd.py`'s `medir_latencia_udp`).
pub async fn measure_latency(host: &str, port: u16) -> f64 {
    match measure(host, port).await {
        Ok(rtt_ms) => rtt_ms,
        Err(LatencyError::Timeout) => -1.0,
        Err(_) => -2.0,
    }
}

async fn measure(host: &str, port: u16) -> Result<f64, LatencyError> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
    socket.connect((host, port)).await?;

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    let message = format!("PING:{timestamp}");

    let start = Instant::now();
    socket.send(message.as_bytes()).await?;

    let mut buf = [0u8; 512];
    let len = tokio::time::timeout(CLIENT_TIMEOUT, socket.recv(&mut buf))
        .await
        .map_err(|_| LatencyError::Timeout)??;
    let rtt = start.elapsed();

    if &buf[..len] != message.as_bytes() {
        return Err(LatencyError::Other("echoed payload did not match".to_string()));
    }

    Ok(rtt.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echo::run_echo_server;

    #[tokio::test]
    async fn measures_a_real_round_trip_against_the_local_echo_server() {
        let port = 34_567;
        tokio::spawn(run_echo_server(port));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let rtt = measure_latency("127.0.0.1", port).await;
        assert!(rtt >= 0.0 && rtt < 1000.0, "rtt was {rtt}");
    }

    #[tokio::test]
    async fn times_out_against_an_unresponsive_port() {
        // Nothing listening on this port; the client must surface the
        // timeout sentinel rather than hanging.
        let rtt = measure_latency("127.0.0.1", 1).await;
        assert_eq!(rtt, -1.0);
    }
}
