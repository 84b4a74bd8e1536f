//! Description Information Blocks (DIB).
//!
//! Every DIB starts with a 2-byte header, the declared block length followed by
//! a type tag:
//!
//! ```text
//! ┌──────────────┬──────────────┬─────────────────────────────┐
//! │ Length       │ Type         │ Body (length - 2 bytes)     │
//! │   (1 byte)   │   (1 byte)   │                             │
//! └──────────────┴──────────────┴─────────────────────────────┘
//! ```
//!
//! Fixed-size blocks reject any declared length other than their own size
//! with `StructureLengthMismatch` before looking at the body. Variable blocks
//! (service families, address list) compute their size from the entry count
//! and must agree with the declared length the same way.
//!
//! The aggregate of all blocks in a response lives in
//! [`description`](crate::protocol::description).

use crate::addressing::IndividualAddress;
use crate::error::{KnxError, Result};
use crate::protocol::codec::{length_byte, Decode, Encode, Reader, Writer};
use crate::protocol::constants::{MAX_DIB_BODY_SIZE, MAX_DIB_ENTRIES};

/// DIB header size (length + type)
pub const DIB_HEADER_SIZE: usize = 2;

/// Fixed width of the friendly name field in a device info block
pub const FRIENDLY_NAME_SIZE: usize = 30;

/// Friendly name decoded from ISO-8859-1 (up to 2 UTF-8 bytes per character)
pub type FriendlyName = heapless::String<{ FRIENDLY_NAME_SIZE * 2 }>;

/// DIB type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DescriptionType {
    /// Device information (medium, serial number, name, ...)
    DeviceInfo = 0x01,
    /// Service families supported by the device
    SupportedServiceFamilies = 0x02,
    /// Configured IP settings
    IpConfig = 0x03,
    /// IP settings currently in use
    CurrentIpConfig = 0x04,
    /// KNX individual addresses of the device
    KnxAddresses = 0x05,
    /// Manufacturer specific data
    ManufacturerData = 0xFE,
}

impl DescriptionType {
    /// Convert a type tag to `DescriptionType`
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::DeviceInfo),
            0x02 => Some(Self::SupportedServiceFamilies),
            0x03 => Some(Self::IpConfig),
            0x04 => Some(Self::CurrentIpConfig),
            0x05 => Some(Self::KnxAddresses),
            0xFE => Some(Self::ManufacturerData),
            _ => None,
        }
    }

    /// Convert `DescriptionType` to its tag
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// KNX medium of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KnxMedium {
    /// Twisted pair 1
    Tp1,
    /// Powerline 110
    Pl110,
    /// Radio frequency
    Rf,
    /// KNX IP
    Ip,
    /// Medium code not known to this crate
    Unknown(u8),
}

impl KnxMedium {
    /// Convert a medium code
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x02 => Self::Tp1,
            0x04 => Self::Pl110,
            0x10 => Self::Rf,
            0x20 => Self::Ip,
            other => Self::Unknown(other),
        }
    }

    /// Convert to the medium code
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Tp1 => 0x02,
            Self::Pl110 => 0x04,
            Self::Rf => 0x10,
            Self::Ip => 0x20,
            Self::Unknown(other) => other,
        }
    }
}

/// KNXnet/IP service family identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ServiceFamilyType {
    /// KNXnet/IP Core
    IpCore,
    /// Device Management
    DeviceManagement,
    /// Tunnelling
    Tunnelling,
    /// Routing
    Routing,
    /// Remote Logging
    RemoteLogging,
    /// Remote Configuration and Diagnosis
    RemoteConfigDiagnosis,
    /// Object Server
    ObjectServer,
    /// Family code not known to this crate
    Unknown(u8),
}

impl ServiceFamilyType {
    /// Convert a family code
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x02 => Self::IpCore,
            0x03 => Self::DeviceManagement,
            0x04 => Self::Tunnelling,
            0x05 => Self::Routing,
            0x06 => Self::RemoteLogging,
            0x07 => Self::RemoteConfigDiagnosis,
            0x08 => Self::ObjectServer,
            other => Self::Unknown(other),
        }
    }

    /// Convert to the family code
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::IpCore => 0x02,
            Self::DeviceManagement => 0x03,
            Self::Tunnelling => 0x04,
            Self::Routing => 0x05,
            Self::RemoteLogging => 0x06,
            Self::RemoteConfigDiagnosis => 0x07,
            Self::ObjectServer => 0x08,
            Self::Unknown(other) => other,
        }
    }
}

/// IP address assignment method in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IpAssignment {
    /// Manually configured
    Manual,
    /// `BootP`
    BootP,
    /// DHCP
    Dhcp,
    /// Link-local auto IP
    AutoIp,
    /// Method code not known to this crate
    Unknown(u8),
}

impl IpAssignment {
    /// Convert a method code
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x01 => Self::Manual,
            0x02 => Self::BootP,
            0x04 => Self::Dhcp,
            0x08 => Self::AutoIp,
            other => Self::Unknown(other),
        }
    }

    /// Convert to the method code
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Manual => 0x01,
            Self::BootP => 0x02,
            Self::Dhcp => 0x04,
            Self::AutoIp => 0x08,
            Self::Unknown(other) => other,
        }
    }
}

/// Read the DIB header of a fixed-size block.
///
/// The declared length is checked before the buffer length, so a wrong length
/// byte is reported as a mismatch even when the buffer is also short.
fn open_fixed(data: &[u8], block_type: DescriptionType, size: usize) -> Result<Reader<'_>> {
    let mut r = Reader::new(data);
    let length = usize::from(r.read_u8()?);
    let tag = r.read_u8()?;

    if tag != block_type.to_u8() {
        return Err(KnxError::unsupported_code());
    }
    if length != size {
        return Err(KnxError::structure_length_mismatch());
    }
    if data.len() < size {
        return Err(KnxError::invalid_length());
    }
    Ok(r)
}

/// Read the DIB header of a variable block and return its body.
///
/// A body that is not a whole number of 2-byte entries cannot match the
/// computed size.
fn open_entries(data: &[u8], block_type: DescriptionType) -> Result<&[u8]> {
    let mut r = Reader::new(data);
    let length = usize::from(r.read_u8()?);
    let tag = r.read_u8()?;

    if tag != block_type.to_u8() {
        return Err(KnxError::unsupported_code());
    }
    if length < DIB_HEADER_SIZE {
        return Err(KnxError::invalid_length());
    }
    let body = r.read_exact(length - DIB_HEADER_SIZE)?;
    if body.len() % 2 != 0 {
        return Err(KnxError::structure_length_mismatch());
    }
    Ok(body)
}

fn write_header(w: &mut Writer<'_>, size: usize, block_type: DescriptionType) -> Result<()> {
    w.write_u8(length_byte(size)?)?;
    w.write_u8(block_type.to_u8())
}

/// Decode a zero-padded ISO-8859-1 name
fn decode_name(raw: &[u8]) -> Result<FriendlyName> {
    let mut name = FriendlyName::new();
    for &byte in raw.iter().take_while(|&&byte| byte != 0) {
        name.push(char::from(byte))
            .map_err(|_| KnxError::payload_too_large())?;
    }
    Ok(name)
}

/// Encode a name as zero-padded ISO-8859-1, truncated to the field width
fn encode_name(name: &str) -> [u8; FRIENDLY_NAME_SIZE] {
    let mut raw = [0u8; FRIENDLY_NAME_SIZE];
    for (slot, c) in raw.iter_mut().zip(name.chars()) {
        *slot = u8::try_from(u32::from(c)).unwrap_or(b'?');
    }
    raw
}

/// Device information block (type 0x01, 54 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceInfo {
    /// KNX medium
    pub medium: KnxMedium,
    /// Device status, bit 0 is the programming mode flag
    pub status: u8,
    /// Individual address of the device
    pub source: IndividualAddress,
    /// Project installation identifier
    pub project_id: u16,
    /// KNX serial number
    pub serial_number: [u8; 6],
    /// Routing multicast address
    pub multicast_address: [u8; 4],
    /// MAC address
    pub mac_address: [u8; 6],
    /// Friendly name, at most 30 characters on the wire
    pub friendly_name: FriendlyName,
}

impl DeviceInfo {
    /// Packed size
    pub const SIZE: usize = 54;

    /// Whether the device is in programming mode
    pub const fn is_programming_mode(&self) -> bool {
        self.status & 0x01 != 0
    }
}

impl Encode for DeviceInfo {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::SIZE {
            return Err(KnxError::buffer_too_small());
        }
        let mut w = Writer::new(buf);
        write_header(&mut w, Self::SIZE, DescriptionType::DeviceInfo)?;
        w.write_u8(self.medium.to_u8())?;
        w.write_u8(self.status)?;
        w.write_be_u16(self.source.raw())?;
        w.write_be_u16(self.project_id)?;
        w.write_all(&self.serial_number)?;
        w.write_all(&self.multicast_address)?;
        w.write_all(&self.mac_address)?;
        w.write_all(&encode_name(&self.friendly_name))?;
        Ok(w.position())
    }
}

impl Decode for DeviceInfo {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut r = open_fixed(data, DescriptionType::DeviceInfo, Self::SIZE)?;

        let info = Self {
            medium: KnxMedium::from_u8(r.read_u8()?),
            status: r.read_u8()?,
            source: IndividualAddress::from_raw(r.read_be_u16()?),
            project_id: r.read_be_u16()?,
            serial_number: r.read_array()?,
            multicast_address: r.read_array()?,
            mac_address: r.read_array()?,
            friendly_name: decode_name(r.read_exact(FRIENDLY_NAME_SIZE)?)?,
        };
        Ok((info, r.position()))
    }
}

/// A supported service family and its version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceFamily {
    /// Family identifier
    pub family: ServiceFamilyType,
    /// Family version
    pub version: u8,
}

impl ServiceFamily {
    /// Create a service family entry
    pub const fn new(family: ServiceFamilyType, version: u8) -> Self {
        Self { family, version }
    }
}

/// Supported service families block (type 0x02, 2 + 2n bytes)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SupportedServices {
    /// Families in wire order
    pub families: heapless::Vec<ServiceFamily, MAX_DIB_ENTRIES>,
}

impl SupportedServices {
    /// Whether `family` is listed, at any version
    pub fn supports(&self, family: ServiceFamilyType) -> bool {
        self.families.iter().any(|entry| entry.family == family)
    }
}

impl Encode for SupportedServices {
    fn size(&self) -> usize {
        DIB_HEADER_SIZE + 2 * self.families.len()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        write_header(&mut w, self.size(), DescriptionType::SupportedServiceFamilies)?;
        for entry in &self.families {
            w.write_u8(entry.family.to_u8())?;
            w.write_u8(entry.version)?;
        }
        Ok(w.position())
    }
}

impl Decode for SupportedServices {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let body = open_entries(data, DescriptionType::SupportedServiceFamilies)?;

        let mut block = Self::default();
        for pair in body.chunks_exact(2) {
            let entry = ServiceFamily::new(ServiceFamilyType::from_u8(pair[0]), pair[1]);
            block.families.push(entry).map_err(|_| KnxError::payload_too_large())?;
        }
        Ok((block, DIB_HEADER_SIZE + body.len()))
    }
}

/// Configured IP settings block (type 0x03, 16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IpConfig {
    /// IP address
    pub ip_address: [u8; 4],
    /// Subnet mask
    pub subnet_mask: [u8; 4],
    /// Default gateway
    pub default_gateway: [u8; 4],
    /// Capability bit set (`BootP`, DHCP, auto IP)
    pub capabilities: u8,
    /// Bit set of enabled assignment methods
    pub assignment_methods: u8,
}

impl IpConfig {
    /// Packed size
    pub const SIZE: usize = 16;
}

impl Encode for IpConfig {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        write_header(&mut w, Self::SIZE, DescriptionType::IpConfig)?;
        w.write_all(&self.ip_address)?;
        w.write_all(&self.subnet_mask)?;
        w.write_all(&self.default_gateway)?;
        w.write_u8(self.capabilities)?;
        w.write_u8(self.assignment_methods)?;
        Ok(w.position())
    }
}

impl Decode for IpConfig {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut r = open_fixed(data, DescriptionType::IpConfig, Self::SIZE)?;

        let config = Self {
            ip_address: r.read_array()?,
            subnet_mask: r.read_array()?,
            default_gateway: r.read_array()?,
            capabilities: r.read_u8()?,
            assignment_methods: r.read_u8()?,
        };
        Ok((config, r.position()))
    }
}

/// Current IP settings block (type 0x04, 20 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurrentIpConfig {
    /// IP address
    pub ip_address: [u8; 4],
    /// Subnet mask
    pub subnet_mask: [u8; 4],
    /// Default gateway
    pub default_gateway: [u8; 4],
    /// DHCP server that leased the address
    pub dhcp_server: [u8; 4],
    /// Assignment method in use
    pub assignment: IpAssignment,
    /// Reserved byte, kept as received
    pub reserved: u8,
}

impl CurrentIpConfig {
    /// Packed size
    pub const SIZE: usize = 20;
}

impl Encode for CurrentIpConfig {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        write_header(&mut w, Self::SIZE, DescriptionType::CurrentIpConfig)?;
        w.write_all(&self.ip_address)?;
        w.write_all(&self.subnet_mask)?;
        w.write_all(&self.default_gateway)?;
        w.write_all(&self.dhcp_server)?;
        w.write_u8(self.assignment.to_u8())?;
        w.write_u8(self.reserved)?;
        Ok(w.position())
    }
}

impl Decode for CurrentIpConfig {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut r = open_fixed(data, DescriptionType::CurrentIpConfig, Self::SIZE)?;

        let config = Self {
            ip_address: r.read_array()?,
            subnet_mask: r.read_array()?,
            default_gateway: r.read_array()?,
            dhcp_server: r.read_array()?,
            assignment: IpAssignment::from_u8(r.read_u8()?),
            reserved: r.read_u8()?,
        };
        Ok((config, r.position()))
    }
}

/// KNX individual addresses block (type 0x05, 2 + 2n bytes)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnxAddressList {
    /// Addresses in wire order
    pub addresses: heapless::Vec<IndividualAddress, MAX_DIB_ENTRIES>,
}

impl Encode for KnxAddressList {
    fn size(&self) -> usize {
        DIB_HEADER_SIZE + 2 * self.addresses.len()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        write_header(&mut w, self.size(), DescriptionType::KnxAddresses)?;
        for address in &self.addresses {
            w.write_be_u16(address.raw())?;
        }
        Ok(w.position())
    }
}

impl Decode for KnxAddressList {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let body = open_entries(data, DescriptionType::KnxAddresses)?;

        let mut block = Self::default();
        for pair in body.chunks_exact(2) {
            let address = IndividualAddress::from_raw(u16::from_be_bytes([pair[0], pair[1]]));
            block.addresses.push(address).map_err(|_| KnxError::payload_too_large())?;
        }
        Ok((block, DIB_HEADER_SIZE + body.len()))
    }
}

/// Block kept verbatim: manufacturer data or a vendor extension
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnknownBlock {
    /// Type tag
    pub block_type: u8,
    /// Body without the 2-byte header
    pub data: heapless::Vec<u8, MAX_DIB_BODY_SIZE>,
}

impl UnknownBlock {
    /// Create a block, failing with `PayloadTooLarge` beyond 253 body bytes
    pub fn new(block_type: u8, data: &[u8]) -> Result<Self> {
        let mut body = heapless::Vec::new();
        body.extend_from_slice(data)
            .map_err(|_| KnxError::payload_too_large())?;
        Ok(Self {
            block_type,
            data: body,
        })
    }
}

impl Encode for UnknownBlock {
    fn size(&self) -> usize {
        DIB_HEADER_SIZE + self.data.len()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_u8(length_byte(self.size())?)?;
        w.write_u8(self.block_type)?;
        w.write_all(&self.data)?;
        Ok(w.position())
    }
}
