//! Session-boundary helpers over captured Ethernet frames.
//!
//! The record layer and decryptor work on reassembled TCP payloads; these
//! helpers bridge from raw IPv4 frames for workflows that index a whole
//! capture, most importantly mapping every observed SNI to the server
//! endpoint that was dialed.

use crate::error::{Result, TlsError};
use crate::handshake::{client_hello_from_payload, client_hello_from_record, get_sni, ClientHello};
use crate::record::{is_client_hello, is_tls_payload, split_records, TlsRecord};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::tcp::TcpPacket;
use pnet::packet::Packet;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use tracing::debug;

/// SNI hostname → IPv4 server endpoint.
pub type SniToIp = HashMap<String, Ipv4Addr>;

/// Destination address and TCP payload of an IPv4/TCP Ethernet frame.
fn ipv4_tcp_payload(frame: &[u8]) -> Option<(Ipv4Addr, Vec<u8>)> {
    let ethernet = EthernetPacket::new(frame)?;
    if ethernet.get_ethertype() != EtherTypes::Ipv4 {
        return None;
    }
    let ipv4 = Ipv4Packet::new(ethernet.payload())?;
    if ipv4.get_next_level_protocol() != IpNextHeaderProtocols::Tcp {
        return None;
    }
    let tcp = TcpPacket::new(ipv4.payload())?;
    Some((ipv4.get_destination(), tcp.payload().to_vec()))
}

/// TCP payload of an Ethernet frame, or `BadFormat` when the frame is not
/// IPv4/TCP.
pub fn tcp_payload_from_ethernet(frame: &[u8]) -> Result<Vec<u8>> {
    ipv4_tcp_payload(frame)
        .map(|(_, payload)| payload)
        .ok_or_else(|| TlsError::BadFormat("not an IPv4/TCP frame".to_string()))
}

/// First complete TLS record carried by an Ethernet frame.
pub fn record_from_ethernet(frame: &[u8]) -> Result<TlsRecord> {
    let payload = tcp_payload_from_ethernet(frame)?;
    let (records, _) = split_records(&payload)?;
    records.into_iter().next().ok_or(TlsError::Truncated)
}

/// ClientHello carried by an Ethernet frame.
pub fn client_hello_from_ethernet(frame: &[u8]) -> Result<ClientHello> {
    let payload = tcp_payload_from_ethernet(frame)?;
    client_hello_from_payload(&payload)
}

/// Maps every SNI observed in a session's ClientHello messages to the
/// destination address that carried it.
///
/// Frames that are not IPv4/TCP, not TLS, or whose hello does not parse are
/// skipped; a capture full of unrelated traffic is the normal case, not an
/// error. Duplicate names resolve to the last writer.
pub fn get_sni_to_ip(frames: &[Vec<u8>]) -> SniToIp {
    let mut map = SniToIp::new();

    for frame in frames {
        let Some((destination, payload)) = ipv4_tcp_payload(frame) else {
            continue;
        };
        if !is_tls_payload(&payload) {
            continue;
        }
        let Ok((records, _)) = split_records(&payload) else {
            continue;
        };
        for record in records.iter().filter(|record| is_client_hello(record)) {
            match client_hello_from_record(record).and_then(|hello| get_sni(&hello)) {
                Ok(sni) => {
                    map.insert(sni, destination);
                }
                Err(e) => debug!("skipping ClientHello without usable SNI: {e}"),
            }
        }
    }

    map
}
