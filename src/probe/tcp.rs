use std::time::Duration;

use tokio::net::TcpStream;
use tracing::trace;

use super::ProbeError;

/// Attempt a TCP handshake with `host:port`, closing the stream right away.
pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<(), ProbeError> {
    let address = if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    };

    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            trace!("connected to {address}");
            drop(stream);
            Ok(())
        }
        Ok(Err(source)) => Err(ProbeError::Connect { address, source }),
        Err(_) => Err(ProbeError::ConnectTimeout { address, timeout }),
    }
}
