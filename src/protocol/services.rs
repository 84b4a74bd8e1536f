//! KNXnet/IP service bodies.
//!
//! Each service is a typed body that pairs with a [`ServiceType`] identifier.
//! [`encode_frame`](crate::protocol::frame::encode_frame) prefixes the body
//! with the KNXnet/IP header, and
//! [`KnxnetIpFrame::decode_body`](crate::protocol::frame::KnxnetIpFrame::decode_body)
//! reads it back.
//!
//! ## Supported Services
//!
//! - **SEARCH** - Multicast discovery of KNXnet/IP servers
//! - **DESCRIPTION** - Unicast device description
//! - **REMOTE_DIAGNOSTIC** - Selector based diagnosis
//! - **TUNNELLING** - cEMI messages over a tunnel connection
//! - **ROUTING_INDICATION** - cEMI messages over multicast
//!
//! ## Example
//!
//! ```rust
//! use knx_wire::protocol::codec::Encode;
//! use knx_wire::protocol::frame::HostInfo;
//! use knx_wire::protocol::services::{DiagnosticRequest, Selector};
//!
//! let endpoint = HostInfo::udp([192, 168, 1, 100], 3671);
//! let request = DiagnosticRequest::new(endpoint, Selector::new(true, None));
//!
//! let mut buffer = [0u8; 16];
//! let len = request.encode(&mut buffer).unwrap();
//! assert_eq!(&buffer[8..len], &[0x02, 0x01]);
//! ```
//!
//! ## Protocol Flow
//!
//! ```text
//! Client                          Server
//!   |                                |
//!   |------- SEARCH_REQUEST -------->|  (multicast)
//!   |<------ SEARCH_RESPONSE --------|
//!   |                                |
//!   |---- DESCRIPTION_REQUEST ------>|
//!   |<--- DESCRIPTION_RESPONSE ------|
//!   |                                |
//!   |-- REMOTE_DIAGNOSTIC_REQUEST -->|  (multicast, selector)
//!   |<- REMOTE_DIAGNOSTIC_RESPONSE --|
//! ```

use crate::error::{KnxError, Result, ScanError};
use crate::protocol::cemi::Message;
use crate::protocol::codec::{Decode, Encode, Reader, Writer};
use crate::protocol::constants::ServiceType;
use crate::protocol::description::{DescriptorBlock, DiagnosticSink};
use crate::protocol::frame::HostInfo;

/// A KNXnet/IP service body with a fixed service identifier
pub trait Service: Encode {
    /// Identifier written into the frame header
    const SERVICE: ServiceType;
}

/// Scan the descriptor blocks following `offset` bytes of fixed fields
fn scan_tail<S>(data: &[u8], offset: usize, sink: &mut S) -> core::result::Result<(DescriptorBlock, usize), ScanError>
where
    S: DiagnosticSink + ?Sized,
{
    DescriptorBlock::decode_with(&data[offset..], sink)
        .map(|(block, n)| (block, offset + n))
        .map_err(|err| ScanError::new(offset + err.consumed, err.error))
}

// =============================================================================
// Discovery
// =============================================================================

/// `SEARCH_REQUEST` service (0x0201)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRequest {
    /// Where the server should send its response
    pub endpoint: HostInfo,
}

impl SearchRequest {
    /// Create a new `SEARCH_REQUEST`
    pub const fn new(endpoint: HostInfo) -> Self {
        Self { endpoint }
    }
}

impl Service for SearchRequest {
    const SERVICE: ServiceType = ServiceType::SearchRequest;
}

impl Encode for SearchRequest {
    fn size(&self) -> usize {
        HostInfo::SIZE
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        self.endpoint.encode(buf)
    }
}

impl Decode for SearchRequest {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        HostInfo::decode(data).map(|(endpoint, n)| (Self { endpoint }, n))
    }
}

/// `SEARCH_RESPONSE` service (0x0202)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResponse {
    /// Control endpoint of the responding server
    pub control_endpoint: HostInfo,
    /// Device description
    pub description: DescriptorBlock,
}

impl SearchResponse {
    /// Decode, reporting descriptor scan notes to `sink`
    pub fn decode_with<S>(data: &[u8], sink: &mut S) -> Result<(Self, usize)>
    where
        S: DiagnosticSink + ?Sized,
    {
        let (control_endpoint, offset) = HostInfo::decode(data)?;
        let (description, n) = scan_tail(data, offset, sink)?;
        let response = Self {
            control_endpoint,
            description,
        };
        Ok((response, n))
    }
}

impl Service for SearchResponse {
    const SERVICE: ServiceType = ServiceType::SearchResponse;
}

impl Encode for SearchResponse {
    fn size(&self) -> usize {
        HostInfo::SIZE + self.description.size()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_encoded(&self.control_endpoint)?;
        w.write_encoded(&self.description)?;
        Ok(w.position())
    }
}

impl Decode for SearchResponse {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        Self::decode_with(data, &mut crate::protocol::description::LogSink)
    }
}

/// `DESCRIPTION_REQUEST` service (0x0203)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptionRequest {
    /// Where the server should send its response
    pub endpoint: HostInfo,
}

impl DescriptionRequest {
    /// Create a new `DESCRIPTION_REQUEST`
    pub const fn new(endpoint: HostInfo) -> Self {
        Self { endpoint }
    }
}

impl Service for DescriptionRequest {
    const SERVICE: ServiceType = ServiceType::DescriptionRequest;
}

impl Encode for DescriptionRequest {
    fn size(&self) -> usize {
        HostInfo::SIZE
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        self.endpoint.encode(buf)
    }
}

impl Decode for DescriptionRequest {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        HostInfo::decode(data).map(|(endpoint, n)| (Self { endpoint }, n))
    }
}

/// `DESCRIPTION_RESPONSE` service (0x0204)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescriptionResponse(pub DescriptorBlock);

impl Service for DescriptionResponse {
    const SERVICE: ServiceType = ServiceType::DescriptionResponse;
}

impl Encode for DescriptionResponse {
    fn size(&self) -> usize {
        self.0.size()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        self.0.encode(buf)
    }
}

impl Decode for DescriptionResponse {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        DescriptorBlock::decode(data).map(|(block, n)| (Self(block), n))
    }
}

// =============================================================================
// Remote Diagnosis
// =============================================================================

/// Which devices should answer a diagnostic request
///
/// ```text
/// ┌──────────────┬──────────────┬───────────────────────┐
/// │ Length       │ Kind         │ MAC (kind 0x02 only)  │
/// │   (1 byte)   │   (1 byte)   │   (6 bytes)           │
/// └──────────────┴──────────────┴───────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selector {
    /// Every device
    #[default]
    All,
    /// Devices in programming mode
    ProgrammingMode,
    /// The device with this MAC address
    Mac([u8; 6]),
}

impl Selector {
    const KIND_ALL: u8 = 0x00;
    const KIND_PROGRAMMING_MODE: u8 = 0x01;
    const KIND_MAC: u8 = 0x02;

    /// Pick a selector; programming mode wins over a MAC address
    pub const fn new(programming_mode: bool, mac: Option<[u8; 6]>) -> Self {
        match (programming_mode, mac) {
            (true, _) => Self::ProgrammingMode,
            (false, Some(mac)) => Self::Mac(mac),
            (false, None) => Self::All,
        }
    }

    /// Selector kind code
    pub const fn kind(&self) -> u8 {
        match self {
            Self::All => Self::KIND_ALL,
            Self::ProgrammingMode => Self::KIND_PROGRAMMING_MODE,
            Self::Mac(_) => Self::KIND_MAC,
        }
    }
}

impl Encode for Selector {
    fn size(&self) -> usize {
        match self {
            Self::Mac(_) => 8,
            Self::All | Self::ProgrammingMode => 2,
        }
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_u8(self.size() as u8)?;
        w.write_u8(self.kind())?;
        if let Self::Mac(mac) = self {
            w.write_all(mac)?;
        }
        Ok(w.position())
    }
}

impl Decode for Selector {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut r = Reader::new(data);
        let length = r.read_u8()?;
        let kind = r.read_u8()?;

        let selector = match (kind, length) {
            (Self::KIND_ALL, 2) => Self::All,
            (Self::KIND_PROGRAMMING_MODE, 2) => Self::ProgrammingMode,
            (Self::KIND_MAC, 8) => Self::Mac(r.read_array()?),
            (Self::KIND_ALL | Self::KIND_PROGRAMMING_MODE | Self::KIND_MAC, _) => {
                return Err(KnxError::structure_length_mismatch());
            }
            _ => {
                crate::knx_log!(debug, "unsupported selector kind {:#x}", kind);
                return Err(KnxError::unsupported_code());
            }
        };
        Ok((selector, r.position()))
    }
}

/// `REMOTE_DIAGNOSTIC_REQUEST` service (0x0740)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticRequest {
    /// Where the server should send its response
    pub endpoint: HostInfo,
    /// Which devices should answer
    pub selector: Selector,
}

impl DiagnosticRequest {
    /// Create a new `REMOTE_DIAGNOSTIC_REQUEST`
    pub const fn new(endpoint: HostInfo, selector: Selector) -> Self {
        Self { endpoint, selector }
    }
}

impl Service for DiagnosticRequest {
    const SERVICE: ServiceType = ServiceType::RemoteDiagnosticRequest;
}

impl Encode for DiagnosticRequest {
    fn size(&self) -> usize {
        HostInfo::SIZE + self.selector.size()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_encoded(&self.endpoint)?;
        w.write_encoded(&self.selector)?;
        Ok(w.position())
    }
}

impl Decode for DiagnosticRequest {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let (endpoint, offset) = HostInfo::decode(data)?;
        let (selector, n) = Selector::decode(&data[offset..])?;
        Ok((Self { endpoint, selector }, offset + n))
    }
}

/// `REMOTE_DIAGNOSTIC_RESPONSE` service (0x0741)
///
/// Echoes the request's endpoint and selector, followed by the answering
/// device's descriptor blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticResponse {
    /// Endpoint echoed from the request
    pub endpoint: HostInfo,
    /// Selector echoed from the request
    pub selector: Selector,
    /// Description of the answering device
    pub description: DescriptorBlock,
}

impl DiagnosticResponse {
    /// Decode, reporting descriptor scan notes to `sink`
    pub fn decode_with<S>(data: &[u8], sink: &mut S) -> Result<(Self, usize)>
    where
        S: DiagnosticSink + ?Sized,
    {
        let (endpoint, offset) = HostInfo::decode(data)?;
        let (selector, n) = Selector::decode(&data[offset..])?;
        let (description, total) = scan_tail(data, offset + n, sink)?;
        let response = Self {
            endpoint,
            selector,
            description,
        };
        Ok((response, total))
    }
}

impl Service for DiagnosticResponse {
    const SERVICE: ServiceType = ServiceType::RemoteDiagnosticResponse;
}

impl Encode for DiagnosticResponse {
    fn size(&self) -> usize {
        HostInfo::SIZE + self.selector.size() + self.description.size()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_encoded(&self.endpoint)?;
        w.write_encoded(&self.selector)?;
        w.write_encoded(&self.description)?;
        Ok(w.position())
    }
}

impl Decode for DiagnosticResponse {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        Self::decode_with(data, &mut crate::protocol::description::LogSink)
    }
}

// =============================================================================
// Tunnelling and Routing
// =============================================================================

/// Connection header of tunnelling services
///
/// ```text
/// ┌──────────┬──────────┬──────────┬──────────┐
/// │ Length 4 │ Channel  │ Sequence │ Reserved │
/// └──────────┴──────────┴──────────┴──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionHeader {
    /// Communication channel ID
    pub channel_id: u8,
    /// Sequence counter
    pub sequence_counter: u8,
}

impl ConnectionHeader {
    /// Packed size
    pub const SIZE: usize = 4;

    /// Create a new connection header
    pub const fn new(channel_id: u8, sequence_counter: u8) -> Self {
        Self {
            channel_id,
            sequence_counter,
        }
    }
}

impl Encode for ConnectionHeader {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_u8(Self::SIZE as u8)?;
        w.write_u8(self.channel_id)?;
        w.write_u8(self.sequence_counter)?;
        w.write_u8(0x00)?;
        Ok(w.position())
    }
}

impl Decode for ConnectionHeader {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut r = Reader::new(data);
        let [length, channel_id, sequence_counter, reserved] = r.read_array()?;

        if usize::from(length) != Self::SIZE {
            return Err(KnxError::structure_length_mismatch());
        }
        if reserved != 0 {
            return Err(KnxError::bad_reserved_bits());
        }
        Ok((Self::new(channel_id, sequence_counter), r.position()))
    }
}

/// `TUNNELLING_REQUEST` service (0x0420)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelRequest {
    /// Connection header
    pub connection_header: ConnectionHeader,
    /// cEMI message
    pub message: Message,
}

impl TunnelRequest {
    /// Create a new `TUNNELLING_REQUEST`
    pub const fn new(connection_header: ConnectionHeader, message: Message) -> Self {
        Self {
            connection_header,
            message,
        }
    }
}

impl Service for TunnelRequest {
    const SERVICE: ServiceType = ServiceType::TunnellingRequest;
}

impl Encode for TunnelRequest {
    fn size(&self) -> usize {
        ConnectionHeader::SIZE + self.message.size()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_encoded(&self.connection_header)?;
        w.write_encoded(&self.message)?;
        Ok(w.position())
    }
}

impl Decode for TunnelRequest {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let (connection_header, offset) = ConnectionHeader::decode(data)?;
        let (message, n) = Message::decode(&data[offset..])?;
        Ok((Self::new(connection_header, message), offset + n))
    }
}

/// `TUNNELLING_ACK` service (0x0421)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelAck {
    /// Connection header
    pub connection_header: ConnectionHeader,
    /// Status code (0 = OK)
    pub status: u8,
}

impl TunnelAck {
    /// Create a new `TUNNELLING_ACK`
    pub const fn new(connection_header: ConnectionHeader, status: u8) -> Self {
        Self {
            connection_header,
            status,
        }
    }

    /// Check if request was acknowledged successfully
    pub const fn is_ok(&self) -> bool {
        self.status == 0
    }
}

impl Service for TunnelAck {
    const SERVICE: ServiceType = ServiceType::TunnellingAck;
}

impl Encode for TunnelAck {
    fn size(&self) -> usize {
        ConnectionHeader::SIZE + 1
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_encoded(&self.connection_header)?;
        w.write_u8(self.status)?;
        Ok(w.position())
    }
}

impl Decode for TunnelAck {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let (connection_header, offset) = ConnectionHeader::decode(data)?;
        let status = *data.get(offset).ok_or_else(KnxError::invalid_length)?;
        Ok((Self::new(connection_header, status), offset + 1))
    }
}

/// `ROUTING_INDICATION` service (0x0530)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingIndication {
    /// cEMI message
    pub message: Message,
}

impl Service for RoutingIndication {
    const SERVICE: ServiceType = ServiceType::RoutingIndication;
}

impl Encode for RoutingIndication {
    fn size(&self) -> usize {
        self.message.size()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        self.message.encode(buf)
    }
}

impl Decode for RoutingIndication {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        Message::decode(data).map(|(message, n)| (Self { message }, n))
    }
}
