//! ICMP echo probe
//!
//! Sends a single echo request over a blocking socket on tokio's blocking
//! pool. A raw socket is tried first (needs CAP_NET_RAW), then the
//! unprivileged datagram ICMP socket.

use std::io::{self, Read};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::trace;

use super::{ProbeError, resolve_ipv4};

const ECHO_REQUEST: u8 = 8;
const ECHO_SEQUENCE: u16 = 1;
const ECHO_PAYLOAD: &[u8] = b"aznetmon";

/// Send one echo request to `host` and wait for a reply.
///
/// Any datagram from `host` received before the timeout counts as the reply.
pub async fn ping(host: &str, timeout: Duration) -> Result<(), ProbeError> {
    let ip = resolve_ipv4(host).await?;

    tokio::task::spawn_blocking(move || blocking_ping(ip, timeout))
        .await
        .map_err(|e| ProbeError::Task(e.to_string()))?
}

fn blocking_ping(ip: Ipv4Addr, timeout: Duration) -> Result<(), ProbeError> {
    let mut socket = open_socket(ip, timeout)?;

    let packet = echo_request(echo_identifier());
    socket.send(&packet).map_err(ProbeError::Send)?;

    let mut reply = [0u8; 1500];
    match socket.read(&mut reply) {
        Ok(len) => {
            trace!("received {len} byte reply from {ip}");
            Ok(())
        }
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
            Err(ProbeError::ReplyTimeout(timeout))
        }
        Err(e) => Err(ProbeError::Receive(e)),
    }
}

/// Open an ICMP socket connected to `ip`.
///
/// Connecting restricts received datagrams to ones sent by `ip`.
fn open_socket(ip: Ipv4Addr, timeout: Duration) -> Result<Socket, ProbeError> {
    let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))
        .or_else(|_| Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::ICMPV4)))
        .map_err(ProbeError::Socket)?;

    socket
        .set_read_timeout(Some(timeout))
        .map_err(ProbeError::Socket)?;
    socket
        .set_write_timeout(Some(timeout))
        .map_err(ProbeError::Socket)?;

    let dest = SocketAddr::new(IpAddr::V4(ip), 0);
    socket.connect(&dest.into()).map_err(ProbeError::Socket)?;

    Ok(socket)
}

fn echo_identifier() -> u16 {
    (std::process::id() & 0xffff) as u16
}

/// Build an ICMP echo request (type 8, code 0) with the fixed payload.
fn echo_request(identifier: u16) -> Vec<u8> {
    let mut packet = vec![0u8; 8 + ECHO_PAYLOAD.len()];

    packet[0] = ECHO_REQUEST;
    packet[1] = 0;
    packet[4..6].copy_from_slice(&identifier.to_be_bytes());
    packet[6..8].copy_from_slice(&ECHO_SEQUENCE.to_be_bytes());
    packet[8..].copy_from_slice(ECHO_PAYLOAD);

    let checksum = checksum(&packet);
    packet[2..4].copy_from_slice(&checksum.to_be_bytes());

    packet
}

/// Internet checksum (RFC 1071).
fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = data
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]) as u32,
            [hi] => (*hi as u32) << 8,
            _ => 0,
        })
        .sum();

    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }

    !(sum as u16)
}
