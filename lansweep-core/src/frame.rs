//! Read-only link-layer frame inspection.
//!
//! The observers never own packets; the simulation engine hands them an
//! opaque frame handle ([`FrameRef`]) with every trace event. The only
//! inspection the statistics need is the header-unwrap gate of the echo
//! timing: is this frame IPv4, and is the encapsulated transport UDP?
//! That gate exists to keep control traffic sharing the same device
//! (ARP, ICMP) out of the echo-delay statistic.

use std::fmt;

/// Ethernet header length: destination (6) + source (6) + EtherType (2).
const ETHERNET_HEADER_LEN: usize = 14;

/// Minimum IPv4 header length (no options).
const IPV4_MIN_HEADER_LEN: usize = 20;

/// Offset of the protocol field within the IPv4 header.
const IPV4_PROTOCOL_OFFSET: usize = 9;

/// The EtherType field of an Ethernet frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EtherType(pub u16);

impl EtherType {
    pub const IPV4: Self = Self(0x0800);
    pub const ARP: Self = Self(0x0806);
    pub const IPV6: Self = Self(0x86DD);
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// The transport protocol number of an IPv4 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpProtocol(pub u8);

impl IpProtocol {
    pub const ICMP: Self = Self(1);
    pub const TCP: Self = Self(6);
    pub const UDP: Self = Self(17);
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a frame is too short to carry the headers it
/// claims.
#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum FrameError {
    #[error("frame too short for an Ethernet header: {0} bytes")]
    TruncatedEthernet(usize),
}

/// Zero-copy view over the headers of a raw Ethernet frame.
///
/// ```
/// # use lansweep_core::frame::{EtherType, FrameView, IpProtocol};
/// let mut frame = vec![0u8; 64];
/// frame[12..14].copy_from_slice(&0x0800u16.to_be_bytes()); // IPv4
/// frame[14] = 0x45; // version 4, IHL 5
/// frame[14 + 9] = 17; // UDP
///
/// let view = FrameView::parse(&frame).unwrap();
/// assert_eq!(view.ether_type(), EtherType::IPV4);
/// assert_eq!(view.ipv4_protocol(), Some(IpProtocol::UDP));
/// assert!(view.is_echo_candidate());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    bytes: &'a [u8],
}

impl<'a> FrameView<'a> {
    /// wrap raw frame bytes, checking only that the Ethernet header is
    /// complete.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, FrameError> {
        if bytes.len() < ETHERNET_HEADER_LEN {
            return Err(FrameError::TruncatedEthernet(bytes.len()));
        }
        Ok(Self { bytes })
    }

    /// the EtherType field of the Ethernet header.
    pub fn ether_type(&self) -> EtherType {
        EtherType(u16::from_be_bytes([self.bytes[12], self.bytes[13]]))
    }

    /// the link-layer payload (everything after the Ethernet header).
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[ETHERNET_HEADER_LEN..]
    }

    /// the transport protocol number of the encapsulated IPv4 header.
    ///
    /// `None` when the frame is not IPv4 or the IPv4 header is
    /// truncated.
    pub fn ipv4_protocol(&self) -> Option<IpProtocol> {
        if self.ether_type() != EtherType::IPV4 {
            return None;
        }
        let payload = self.payload();
        if payload.len() < IPV4_MIN_HEADER_LEN {
            return None;
        }
        Some(IpProtocol(payload[IPV4_PROTOCOL_OFFSET]))
    }

    /// `true` when the frame carries UDP over IPv4 — the traffic class
    /// the echo request/response applications exchange.
    pub fn is_echo_candidate(&self) -> bool {
        self.ipv4_protocol() == Some(IpProtocol::UDP)
    }
}

/// Opaque per-event frame handle.
///
/// Carries the raw bytes for header inspection and the engine-assigned
/// packet identifier, which the observers use for diagnostics only.
#[derive(Debug, Clone, Copy)]
pub struct FrameRef<'a> {
    id: u64,
    bytes: &'a [u8],
}

impl<'a> FrameRef<'a> {
    pub fn new(id: u64, bytes: &'a [u8]) -> Self {
        Self { id, bytes }
    }

    /// the engine-assigned packet identifier, for logging.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// header-unwrap-and-check gate: UDP over IPv4.
    ///
    /// A frame too short for the headers simply fails the gate; a
    /// malformed frame is not an error for the statistics, it is just
    /// not an echo candidate.
    pub fn is_echo_candidate(&self) -> bool {
        FrameView::parse(self.bytes)
            .map(|view| view.is_echo_candidate())
            .unwrap_or(false)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// build a minimal frame with the given EtherType and, for IPv4,
    /// the given transport protocol.
    pub(crate) fn frame_bytes(ether_type: EtherType, protocol: Option<IpProtocol>) -> Vec<u8> {
        let mut bytes = vec![0u8; ETHERNET_HEADER_LEN + IPV4_MIN_HEADER_LEN];
        bytes[12..14].copy_from_slice(&ether_type.0.to_be_bytes());
        if let Some(IpProtocol(p)) = protocol {
            bytes[ETHERNET_HEADER_LEN] = 0x45; // version 4, IHL 5
            bytes[ETHERNET_HEADER_LEN + IPV4_PROTOCOL_OFFSET] = p;
        }
        bytes
    }

    pub(crate) fn udp_frame() -> Vec<u8> {
        frame_bytes(EtherType::IPV4, Some(IpProtocol::UDP))
    }

    pub(crate) fn icmp_frame() -> Vec<u8> {
        frame_bytes(EtherType::IPV4, Some(IpProtocol::ICMP))
    }

    pub(crate) fn arp_frame() -> Vec<u8> {
        frame_bytes(EtherType::ARP, None)
    }
}
