use tokio::net::UdpSocket;
use tracing::{info, warn};

/// Stateless UDP echo: every datagram received on `port` is sent back
/// verbatim to its source (spec.md §4.5). No sequencing, no retransmit — a
/// dropped datagram is just a dropped measurement at the client.
///
/// Runs forever; the caller spawns this as a dedicated task alongside the
/// HTTP server (spec.md §9: "a dedicated worker for UDP echo").
pub async fn run_echo_server(port: u16) -> std::io::Result<()> {
    let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
    info!(port, "udp latency probe listening");

    let mut buf = [0u8; 1024];
    loop {
        let (len, source) = match socket.recv_from(&mut buf).await {
            Ok(pair) => pair,
            Err(err) => {
                warn!(%err, "udp echo: recv_from failed");
                continue;
            }
        };
        if let Err(err) = socket.send_to(&buf[..len], source).await {
            warn!(%err, %source, "udp echo: send_to failed");
        }
    }
}
