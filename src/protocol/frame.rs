//! KNXnet/IP frame parsing and encoding.
//!
//! This module handles the outer frame structure: the 6-byte header, the
//! zero-copy frame view used to route an inbound datagram, and the host
//! endpoint record (HPAI) that requests carry to say where replies go.
//!
//! ## Frame Structure
//!
//! All KNXnet/IP frames follow this structure:
//!
//! ```text
//! ┌─────────────────────────────┐
//! │  Header (6 bytes)           │
//! │  - Header Length: 0x06      │
//! │  - Protocol Version: 0x10   │
//! │  - Service Type: 2 bytes    │
//! │  - Total Length: 2 bytes    │
//! ├─────────────────────────────┤
//! │  Body (variable)            │
//! │  - Service-specific data    │
//! └─────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use knx_wire::protocol::frame::{encode_frame, HostInfo, KnxnetIpFrame};
//! use knx_wire::protocol::services::SearchRequest;
//! use knx_wire::protocol::constants::ServiceType;
//!
//! let request = SearchRequest::new(HostInfo::udp([192, 168, 1, 10], 3671));
//! let mut buf = [0u8; 32];
//! let n = encode_frame(&request, &mut buf).unwrap();
//!
//! let frame = KnxnetIpFrame::parse(&buf[..n]).unwrap();
//! assert_eq!(frame.service_type(), Some(ServiceType::SearchRequest));
//! let decoded: SearchRequest = frame.decode_body().unwrap();
//! assert_eq!(decoded, request);
//! ```

use core::net::{Ipv4Addr, SocketAddrV4};

use crate::error::{KnxError, Result};
use crate::protocol::codec::{Decode, Encode, Reader, Writer};
use crate::protocol::constants::{ServiceType, HEADER_SIZE_10, IPV4_UDP, KNXNETIP_VERSION_10};
use crate::protocol::services::Service;

/// KNXnet/IP frame header (6 bytes)
///
/// ```text
/// ┌──────────────┬──────────────┬─────────────────────┐
/// │ Header Len   │ Protocol Ver │  Service Type ID    │
/// │   (1 byte)   │   (1 byte)   │     (2 bytes)       │
/// ├──────────────┴──────────────┴─────────────────────┤
/// │           Total Length (2 bytes)                   │
/// └────────────────────────────────────────────────────┘
/// ```
///
/// The service identifier is kept raw so that frames for services this crate
/// does not model can still be parsed and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KnxnetIpHeader {
    /// Raw service type identifier
    pub service: u16,
    /// Total length of frame (header + body)
    pub total_length: u16,
}

impl KnxnetIpHeader {
    /// Size of the header in bytes
    pub const SIZE: usize = 6;

    /// Create a new header
    pub fn new(service_type: ServiceType, body_length: usize) -> Result<Self> {
        let total_length = u16::try_from(Self::SIZE + body_length)
            .map_err(|_| KnxError::payload_too_large())?;
        Ok(Self {
            service: service_type.to_u16(),
            total_length,
        })
    }

    /// Service type, `None` when the identifier is not one this crate models
    pub const fn service_type(&self) -> Option<ServiceType> {
        ServiceType::from_u16(self.service)
    }

    /// Parse a header from a byte slice
    ///
    /// # Errors
    ///
    /// - `InvalidLength` if fewer than 6 bytes are available
    /// - `StructureLengthMismatch` if the header length byte is not 6
    /// - `UnsupportedCode` if the protocol version is not 1.0
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        let header_length = r.read_u8()?;
        let protocol_version = r.read_u8()?;
        let service = r.read_be_u16()?;
        let total_length = r.read_be_u16()?;

        if header_length != HEADER_SIZE_10 {
            return Err(KnxError::structure_length_mismatch());
        }
        if protocol_version != KNXNETIP_VERSION_10 {
            crate::knx_log!(debug, "unsupported KNXnet/IP version {:#x}", protocol_version);
            return Err(KnxError::unsupported_code());
        }

        Ok(Self {
            service,
            total_length,
        })
    }

    /// Get the expected body length from the header
    pub const fn body_length(&self) -> u16 {
        self.total_length.saturating_sub(Self::SIZE as u16)
    }
}

/// Zero-copy view of a KNXnet/IP frame
#[derive(Debug)]
pub struct KnxnetIpFrame<'a> {
    /// Frame bytes, trimmed to the total length
    data: &'a [u8],
    /// Parsed header
    header: KnxnetIpHeader,
}

impl<'a> KnxnetIpFrame<'a> {
    /// Parse a KNXnet/IP frame from a byte slice
    ///
    /// Bytes beyond the header's total length are ignored.
    ///
    /// # Errors
    ///
    /// Header errors from [`KnxnetIpHeader::parse`], or `InvalidLength` when
    /// the total length is shorter than the header or longer than `data`.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = KnxnetIpHeader::parse(data)?;
        let total = usize::from(header.total_length);

        if total < KnxnetIpHeader::SIZE || data.len() < total {
            return Err(KnxError::invalid_length());
        }

        Ok(Self {
            data: &data[..total],
            header,
        })
    }

    /// Get the frame header
    #[inline(always)]
    pub const fn header(&self) -> &KnxnetIpHeader {
        &self.header
    }

    /// Get the service type, if modelled
    #[inline(always)]
    pub const fn service_type(&self) -> Option<ServiceType> {
        self.header.service_type()
    }

    /// Get the frame body (payload after header)
    #[inline(always)]
    pub fn body(&self) -> &'a [u8] {
        &self.data[KnxnetIpHeader::SIZE..]
    }

    /// Get the complete frame data including header
    #[inline(always)]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Decode the body as service `S`
    ///
    /// # Errors
    ///
    /// `UnsupportedCode` if the header names a different service, otherwise
    /// whatever the body decoder reports.
    pub fn decode_body<S: Service + Decode>(&self) -> Result<S> {
        if self.header.service != S::SERVICE.to_u16() {
            return Err(KnxError::unsupported_code());
        }
        S::decode(self.body()).map(|(service, _)| service)
    }
}

/// Write header and body of `service` into `buf`, returning the frame length
///
/// # Errors
///
/// `BufferTooSmall` if `buf` cannot hold the frame, `PayloadTooLarge` if the
/// body does not fit the 16-bit total length.
pub fn encode_frame<S: Service>(service: &S, buf: &mut [u8]) -> Result<usize> {
    let body_length = service.size();
    let header = KnxnetIpHeader::new(S::SERVICE, body_length)?;
    if buf.len() < usize::from(header.total_length) {
        return Err(KnxError::buffer_too_small());
    }

    let mut w = Writer::new(buf);
    w.write_encoded(&header)?;
    w.write_encoded(service)?;
    Ok(w.position())
}

impl Encode for KnxnetIpHeader {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_u8(HEADER_SIZE_10)?;
        w.write_u8(KNXNETIP_VERSION_10)?;
        w.write_be_u16(self.service)?;
        w.write_be_u16(self.total_length)?;
        Ok(w.position())
    }
}

/// Host Protocol Address Information (HPAI)
///
/// Endpoint a request asks replies to be sent to.
///
/// ```text
/// ┌──────────────┬──────────────┬─────────────────────┐
/// │ Structure Len│ Host Protocol│   IP Address        │
/// │   (1 byte)   │   (1 byte)   │   (4 bytes IPv4)    │
/// ├──────────────┴──────────────┴─────────────────────┤
/// │                Port (2 bytes)                      │
/// └────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HostInfo {
    /// Host protocol code (`IPV4_UDP`, `IPV4_TCP`)
    pub protocol: u8,
    /// IPv4 address
    pub address: [u8; 4],
    /// Port
    pub port: u16,
}

impl HostInfo {
    /// Size of HPAI structure for IPv4
    pub const SIZE: usize = 8;

    /// Create an endpoint record
    pub const fn new(protocol: u8, address: [u8; 4], port: u16) -> Self {
        Self {
            protocol,
            address,
            port,
        }
    }

    /// Create an IPv4 UDP endpoint record
    pub const fn udp(address: [u8; 4], port: u16) -> Self {
        Self::new(IPV4_UDP, address, port)
    }

    /// Create a UDP endpoint record from a local socket address
    pub const fn from_socket_addr(addr: SocketAddrV4) -> Self {
        Self::udp(addr.ip().octets(), addr.port())
    }

    /// The endpoint as a socket address
    pub const fn socket_addr(&self) -> SocketAddrV4 {
        let [a, b, c, d] = self.address;
        SocketAddrV4::new(Ipv4Addr::new(a, b, c, d), self.port)
    }
}

impl From<SocketAddrV4> for HostInfo {
    fn from(addr: SocketAddrV4) -> Self {
        Self::from_socket_addr(addr)
    }
}

impl Encode for HostInfo {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_u8(Self::SIZE as u8)?;
        w.write_u8(self.protocol)?;
        w.write_all(&self.address)?;
        w.write_be_u16(self.port)?;
        Ok(w.position())
    }
}

impl Decode for HostInfo {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut r = Reader::new(data);
        let body = r.read_array::<{ HostInfo::SIZE }>()?;
        if usize::from(body[0]) != Self::SIZE {
            return Err(KnxError::structure_length_mismatch());
        }

        let info = Self {
            protocol: body[1],
            address: [body[2], body[3], body[4], body[5]],
            port: u16::from_be_bytes([body[6], body[7]]),
        };
        Ok((info, r.position()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::services::SearchRequest;

    #[test]
    fn test_header_parse() {
        let data = [
            0x06, // header length
            0x10, // protocol version
            0x02, 0x01, // service type (SEARCH_REQUEST)
            0x00, 0x0E, // total length (14 bytes)
        ];

        let header = KnxnetIpHeader::parse(&data).unwrap();
        assert_eq!(header.service_type(), Some(ServiceType::SearchRequest));
        assert_eq!(header.total_length, 14);
        assert_eq!(header.body_length(), 8);
    }

    #[test]
    fn test_header_unknown_service() {
        let data = [0x06, 0x10, 0x02, 0x05, 0x00, 0x06];
        let header = KnxnetIpHeader::parse(&data).unwrap();
        assert_eq!(header.service, 0x0205);
        assert_eq!(header.service_type(), None);
    }

    #[test]
    fn test_header_invalid() {
        assert!(KnxnetIpHeader::parse(&[0x06, 0x10, 0x02])
            .unwrap_err()
            .is_invalid_length());
        assert!(KnxnetIpHeader::parse(&[0x08, 0x10, 0x02, 0x01, 0x00, 0x06])
            .unwrap_err()
            .is_structure_length_mismatch());
        assert!(KnxnetIpHeader::parse(&[0x06, 0x20, 0x02, 0x01, 0x00, 0x06])
            .unwrap_err()
            .is_unsupported_code());
    }

    #[test]
    fn test_header_encode() {
        let header = KnxnetIpHeader::new(ServiceType::SearchRequest, 8).unwrap();
        let mut buf = [0u8; 6];
        let size = header.encode(&mut buf).unwrap();

        assert_eq!(size, 6);
        assert_eq!(buf, [0x06, 0x10, 0x02, 0x01, 0x00, 0x0E]);
    }

    #[test]
    fn test_header_body_too_large() {
        let err = KnxnetIpHeader::new(ServiceType::RoutingIndication, 0x10000).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::PayloadTooLarge);
    }

    #[test]
    fn test_frame_parse() {
        let data = [
            0x06, 0x10, // header
            0x02, 0x01, // SEARCH_REQUEST
            0x00, 0x0A, // total length = 10
            0x01, 0x02, 0x03, 0x04, // body
            0xFF, // trailing garbage
        ];

        let frame = KnxnetIpFrame::parse(&data).unwrap();
        assert_eq!(frame.service_type(), Some(ServiceType::SearchRequest));
        assert_eq!(frame.body(), &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(frame.data().len(), 10);
    }

    #[test]
    fn test_frame_truncated() {
        let data = [0x06, 0x10, 0x02, 0x01, 0x00, 0x0E, 0x08, 0x01];
        assert!(KnxnetIpFrame::parse(&data).unwrap_err().is_invalid_length());

        let data = [0x06, 0x10, 0x02, 0x01, 0x00, 0x04];
        assert!(KnxnetIpFrame::parse(&data).unwrap_err().is_invalid_length());
    }

    #[test]
    fn test_encode_frame_and_decode_body() {
        let request = SearchRequest::new(HostInfo::udp([192, 168, 1, 100], 3671));
        let mut buf = [0u8; 14];
        let n = encode_frame(&request, &mut buf).unwrap();
        assert_eq!(n, 14);
        assert_eq!(
            buf,
            [0x06, 0x10, 0x02, 0x01, 0x00, 0x0E, 0x08, 0x01, 192, 168, 1, 100, 0x0E, 0x57]
        );

        let frame = KnxnetIpFrame::parse(&buf).unwrap();
        assert_eq!(frame.decode_body::<SearchRequest>().unwrap(), request);
    }

    #[test]
    fn test_encode_frame_buffer_too_small() {
        let request = SearchRequest::new(HostInfo::udp([192, 168, 1, 100], 3671));
        let mut buf = [0u8; 13];
        assert!(encode_frame(&request, &mut buf).unwrap_err().is_buffer_too_small());
    }

    #[test]
    fn test_decode_body_wrong_service() {
        let data = [0x06, 0x10, 0x02, 0x03, 0x00, 0x0E, 0x08, 0x01, 0, 0, 0, 0, 0, 0];
        let frame = KnxnetIpFrame::parse(&data).unwrap();
        assert!(frame.decode_body::<SearchRequest>().unwrap_err().is_unsupported_code());
    }

    #[test]
    fn test_host_info_decode() {
        let data = [
            0x08, // structure length
            0x01, // IPv4 UDP
            192, 168, 1, 100, // IP address
            0x0E, 0x57, // port 3671
        ];

        let (info, n) = HostInfo::decode(&data).unwrap();
        assert_eq!(n, 8);
        assert_eq!(info.protocol, IPV4_UDP);
        assert_eq!(info.address, [192, 168, 1, 100]);
        assert_eq!(info.port, 3671);
        assert_eq!(info.socket_addr(), SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 100), 3671));
    }

    #[test]
    fn test_host_info_decode_errors() {
        assert!(HostInfo::decode(&[0x08, 0x01, 192, 168]).unwrap_err().is_invalid_length());
        let data = [0x06, 0x01, 192, 168, 1, 100, 0x0E, 0x57];
        assert!(HostInfo::decode(&data).unwrap_err().is_structure_length_mismatch());
    }

    #[test]
    fn test_host_info_encode() {
        let addr = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 50000);
        let info = HostInfo::from(addr);
        assert_eq!(info.size(), 8);
        let mut buf = [0u8; 8];
        let size = info.encode(&mut buf).unwrap();

        assert_eq!(size, 8);
        assert_eq!(buf, [0x08, 0x01, 10, 0, 0, 2, 0xC3, 0x50]);
    }
}
