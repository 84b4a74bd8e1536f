//! Common External Message Interface (cEMI) implementation.
//!
//! A cEMI message wraps a KNX telegram for transport over KNXnet/IP. The first
//! byte is the message code, which selects the decoder for the rest.
//!
//! ## Frame Structure
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Message Code (1 byte)                    │
//! ├──────────────────────────────────────────┤
//! │ Additional Info Length (1 byte)          │
//! ├──────────────────────────────────────────┤
//! │ Additional Info (variable)               │
//! ├──────────────────────────────────────────┤
//! │ Service Information (L_Data)             │
//! │  ├─ Control Field 1 (1 byte)             │
//! │  ├─ Control Field 2 (1 byte)             │
//! │  ├─ Source Address (2 bytes)             │
//! │  ├─ Destination Address (2 bytes)        │
//! │  └─ TPDU (2+ bytes)                      │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use knx_wire::protocol::cemi::Message;
//! use knx_wire::protocol::codec::Decode;
//! use knx_wire::GroupAddress;
//!
//! let bytes = [0x29, 0x00, 0xBC, 0xE0, 0x11, 0x01, 0x0A, 0x03, 0x01, 0x00, 0x81];
//! let (message, consumed) = Message::decode(&bytes).unwrap();
//! assert_eq!(consumed, bytes.len());
//!
//! let ldata = &message.frame().ldata;
//! assert!(ldata.is_group_write());
//! assert_eq!(ldata.destination_group(), Some(GroupAddress::new(1, 2, 3)));
//! ```

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::error::{KnxError, Result};
use crate::protocol::codec::{length_byte, Decode, Encode, Reader, Writer};
use crate::protocol::constants::{MessageCode, Priority, MAX_SEGMENT_SIZE};
use crate::protocol::tpdu::{Apci, TransportUnit};

/// Length-prefixed additional information carried ahead of the telegram.
///
/// The content is kept opaque.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Info {
    data: heapless::Vec<u8, MAX_SEGMENT_SIZE>,
}

impl Info {
    /// Create an info segment, failing with `PayloadTooLarge` beyond 255 bytes
    pub fn new(data: &[u8]) -> Result<Self> {
        let mut info = Self::default();
        info.data
            .extend_from_slice(data)
            .map_err(|_| KnxError::payload_too_large())?;
        Ok(info)
    }

    /// Raw info bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Number of info bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the segment carries no info
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Encode for Info {
    fn size(&self) -> usize {
        1 + self.data.len()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_u8(length_byte(self.data.len())?)?;
        w.write_all(&self.data)?;
        Ok(w.position())
    }
}

impl Decode for Info {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut r = Reader::new(data);
        let len = usize::from(r.read_u8()?);
        let body = r.read_exact(len)?;

        let data = heapless::Vec::from_slice(body).map_err(|_| KnxError::payload_too_large())?;
        Ok((Self { data }, r.position()))
    }
}

/// Control Field 1 of `L_Data` frame
///
/// ```text
/// Bit 7: Frame Type (0=extended, 1=standard)
/// Bit 6: Reserved, must be 0
/// Bit 5: Repeat (0=repeat, 1=do not repeat)
/// Bit 4: System Broadcast (0=system, 1=broadcast)
/// Bit 3-2: Priority (00=system, 01=normal, 10=urgent, 11=low)
/// Bit 1: Acknowledge Request (0=no ack, 1=ack requested)
/// Bit 0: Confirm (0=no error, 1=error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlField1 {
    raw: u8,
}

impl ControlField1 {
    const RESERVED: u8 = 0x40;

    /// Get raw byte value
    #[inline(always)]
    pub const fn raw(self) -> u8 {
        self.raw
    }

    /// Check if frame is standard (true) or extended (false)
    #[inline(always)]
    pub const fn is_standard_frame(self) -> bool {
        (self.raw & 0x80) != 0
    }

    /// Check if repeat flag is set (do not repeat if true)
    #[inline(always)]
    pub const fn do_not_repeat(self) -> bool {
        (self.raw & 0x20) != 0
    }

    /// Check if this is a normal broadcast (false means system broadcast)
    #[inline(always)]
    pub const fn is_broadcast(self) -> bool {
        (self.raw & 0x10) != 0
    }

    /// Get priority
    #[inline(always)]
    pub const fn priority(self) -> Priority {
        Priority::from_u8(self.raw >> 2)
    }

    /// Check if acknowledge is requested
    #[inline(always)]
    pub const fn ack_requested(self) -> bool {
        (self.raw & 0x02) != 0
    }

    /// Check if confirm error flag is set
    #[inline(always)]
    pub const fn has_error(self) -> bool {
        (self.raw & 0x01) != 0
    }

    /// Create a new Control Field 1
    pub const fn new(
        standard_frame: bool,
        do_not_repeat: bool,
        broadcast: bool,
        priority: Priority,
        ack_requested: bool,
        has_error: bool,
    ) -> Self {
        let mut raw = 0u8;

        if standard_frame {
            raw |= 0x80;
        }
        if do_not_repeat {
            raw |= 0x20;
        }
        if broadcast {
            raw |= 0x10;
        }
        raw |= priority.to_u8() << 2;
        if ack_requested {
            raw |= 0x02;
        }
        if has_error {
            raw |= 0x01;
        }

        Self { raw }
    }
}

impl TryFrom<u8> for ControlField1 {
    type Error = KnxError;

    fn try_from(raw: u8) -> Result<Self> {
        if raw & Self::RESERVED != 0 {
            return Err(KnxError::bad_reserved_bits());
        }
        Ok(Self { raw })
    }
}

impl From<ControlField1> for u8 {
    #[inline(always)]
    fn from(ctrl: ControlField1) -> u8 {
        ctrl.raw
    }
}

impl Default for ControlField1 {
    /// Standard frame, repeat allowed, broadcast, normal priority (0x94)
    #[inline]
    fn default() -> Self {
        Self::new(true, false, true, Priority::Normal, false, false)
    }
}

/// Control Field 2 of `L_Data` frame
///
/// ```text
/// Bit 7: Destination Address Type (0=individual, 1=group)
/// Bit 6-4: Hop Count (0-7)
/// Bit 3-0: Extended Frame Format (0000=standard)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlField2 {
    raw: u8,
}

impl From<u8> for ControlField2 {
    #[inline(always)]
    fn from(raw: u8) -> Self {
        Self { raw }
    }
}

impl From<ControlField2> for u8 {
    #[inline(always)]
    fn from(ctrl: ControlField2) -> u8 {
        ctrl.raw
    }
}

impl ControlField2 {
    const GROUP: u8 = 0x80;

    /// Get raw byte value
    #[inline(always)]
    pub const fn raw(self) -> u8 {
        self.raw
    }

    /// Check if destination is group address (true) or individual (false)
    #[inline(always)]
    pub const fn is_group_address(self) -> bool {
        (self.raw & Self::GROUP) != 0
    }

    /// Get hop count (0-7)
    #[inline(always)]
    pub const fn hop_count(self) -> u8 {
        (self.raw >> 4) & 0x07
    }

    /// Get extended frame format
    #[inline(always)]
    pub const fn extended_format(self) -> u8 {
        self.raw & 0x0F
    }

    /// Create a new Control Field 2
    pub const fn new(is_group: bool, hop_count: u8, extended_format: u8) -> Self {
        let mut raw = 0u8;

        if is_group {
            raw |= Self::GROUP;
        }
        raw |= (hop_count & 0x07) << 4;
        raw |= extended_format & 0x0F;

        Self { raw }
    }

    /// Same field with the address-type bit replaced
    #[must_use]
    pub const fn with_group_address(self, is_group: bool) -> Self {
        let raw = self.raw & !Self::GROUP;
        Self {
            raw: if is_group { raw | Self::GROUP } else { raw },
        }
    }
}

impl Default for ControlField2 {
    /// Group address, hop count 6, standard format (0xE0)
    #[inline]
    fn default() -> Self {
        Self::new(true, 6, 0)
    }
}

/// Telegram destination, selected by the address-type bit of [`ControlField2`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Destination {
    /// Point-to-point destination
    Individual(IndividualAddress),
    /// Multicast destination
    Group(GroupAddress),
}

impl Destination {
    /// Whether the destination is a group address
    pub const fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Raw 16-bit address value
    pub const fn raw(&self) -> u16 {
        match self {
            Self::Individual(addr) => addr.raw(),
            Self::Group(addr) => addr.raw(),
        }
    }

    const fn from_raw(raw: u16, is_group: bool) -> Self {
        if is_group {
            Self::Group(GroupAddress::from_raw(raw))
        } else {
            Self::Individual(IndividualAddress::from_raw(raw))
        }
    }
}

impl From<GroupAddress> for Destination {
    fn from(addr: GroupAddress) -> Self {
        Self::Group(addr)
    }
}

impl From<IndividualAddress> for Destination {
    fn from(addr: IndividualAddress) -> Self {
        Self::Individual(addr)
    }
}

/// `L_Data` telegram: control fields, addressing and a transport unit
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LData {
    /// Control field 1
    pub ctrl1: ControlField1,
    /// Control field 2; the address-type bit follows `destination` on encode
    pub ctrl2: ControlField2,
    /// Source address (individual)
    pub source: IndividualAddress,
    /// Destination address (individual or group)
    pub destination: Destination,
    /// Transport data unit
    pub tpdu: TransportUnit,
}

impl LData {
    /// Control fields, source and destination (6 bytes)
    pub const HEADER_SIZE: usize = 6;

    /// Create a telegram with default control fields
    pub fn new(
        source: IndividualAddress,
        destination: impl Into<Destination>,
        tpdu: impl Into<TransportUnit>,
    ) -> Self {
        let destination = destination.into();
        Self {
            ctrl1: ControlField1::default(),
            ctrl2: ControlField2::default().with_group_address(destination.is_group()),
            source,
            destination,
            tpdu: tpdu.into(),
        }
    }

    /// Get destination as group address (if applicable)
    #[inline]
    pub const fn destination_group(&self) -> Option<GroupAddress> {
        match self.destination {
            Destination::Group(addr) => Some(addr),
            Destination::Individual(_) => None,
        }
    }

    /// Get destination as individual address (if applicable)
    #[inline]
    pub const fn destination_individual(&self) -> Option<IndividualAddress> {
        match self.destination {
            Destination::Individual(addr) => Some(addr),
            Destination::Group(_) => None,
        }
    }

    /// Application command, `None` for control units
    pub fn apci(&self) -> Option<Apci> {
        self.tpdu.as_app().map(|app| app.command)
    }

    /// Application payload (first byte already reduced to 6 bits)
    pub fn data(&self) -> &[u8] {
        self.tpdu.as_app().map_or(&[], |app| app.data.as_slice())
    }

    fn is_group_command(&self, command: Apci) -> bool {
        self.destination.is_group() && self.apci() == Some(command)
    }

    /// Check if this is a group value write
    pub fn is_group_write(&self) -> bool {
        self.is_group_command(Apci::GroupValueWrite)
    }

    /// Check if this is a group value read
    pub fn is_group_read(&self) -> bool {
        self.is_group_command(Apci::GroupValueRead)
    }

    /// Check if this is a group value response
    pub fn is_group_response(&self) -> bool {
        self.is_group_command(Apci::GroupValueResponse)
    }
}

impl Encode for LData {
    fn size(&self) -> usize {
        Self::HEADER_SIZE + self.tpdu.size()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let ctrl2 = self.ctrl2.with_group_address(self.destination.is_group());

        let mut w = Writer::new(buf);
        w.write_u8(self.ctrl1.raw())?;
        w.write_u8(ctrl2.raw())?;
        w.write_be_u16(self.source.raw())?;
        w.write_be_u16(self.destination.raw())?;
        w.write_encoded(&self.tpdu)?;
        Ok(w.position())
    }
}

impl Decode for LData {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut r = Reader::new(data);
        let ctrl1 = ControlField1::try_from(r.read_u8()?)?;
        let ctrl2 = ControlField2::from(r.read_u8()?);
        let source = IndividualAddress::from_raw(r.read_be_u16()?);
        let destination = Destination::from_raw(r.read_be_u16()?, ctrl2.is_group_address());

        let (tpdu, used) = TransportUnit::decode(r.rest())?;
        r.advance(used)?;

        let ldata = Self {
            ctrl1,
            ctrl2,
            source,
            destination,
            tpdu,
        };
        Ok((ldata, r.position()))
    }
}

/// Body shared by `L_Data.req`, `L_Data.con` and `L_Data.ind`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LDataFrame {
    /// Additional information
    pub info: Info,
    /// Telegram
    pub ldata: LData,
}

impl LDataFrame {
    /// Frame without additional information
    pub fn new(ldata: LData) -> Self {
        Self {
            info: Info::default(),
            ldata,
        }
    }
}

impl Encode for LDataFrame {
    fn size(&self) -> usize {
        self.info.size() + self.ldata.size()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_encoded(&self.info)?;
        w.write_encoded(&self.ldata)?;
        Ok(w.position())
    }
}

impl Decode for LDataFrame {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let (info, info_len) = Info::decode(data)?;
        let (ldata, ldata_len) = LData::decode(&data[info_len..])?;
        Ok((Self { info, ldata }, info_len + ldata_len))
    }
}

/// cEMI message, one variant per registered message code
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// `L_Data.req` (0x11)
    LDataReq(LDataFrame),
    /// `L_Data.con` (0x2E)
    LDataCon(LDataFrame),
    /// `L_Data.ind` (0x29)
    LDataInd(LDataFrame),
}

type MessageDecoder = fn(&[u8]) -> Result<(Message, usize)>;

/// Message code to body decoder
const DECODERS: [(MessageCode, MessageDecoder); 3] = [
    (MessageCode::LDataReq, decode_ldata_req),
    (MessageCode::LDataCon, decode_ldata_con),
    (MessageCode::LDataInd, decode_ldata_ind),
];

fn decode_ldata_req(data: &[u8]) -> Result<(Message, usize)> {
    LDataFrame::decode(data).map(|(frame, n)| (Message::LDataReq(frame), n))
}

fn decode_ldata_con(data: &[u8]) -> Result<(Message, usize)> {
    LDataFrame::decode(data).map(|(frame, n)| (Message::LDataCon(frame), n))
}

fn decode_ldata_ind(data: &[u8]) -> Result<(Message, usize)> {
    LDataFrame::decode(data).map(|(frame, n)| (Message::LDataInd(frame), n))
}

impl Message {
    /// Message code of this variant
    pub const fn code(&self) -> MessageCode {
        match self {
            Self::LDataReq(_) => MessageCode::LDataReq,
            Self::LDataCon(_) => MessageCode::LDataCon,
            Self::LDataInd(_) => MessageCode::LDataInd,
        }
    }

    /// The `L_Data` body
    pub const fn frame(&self) -> &LDataFrame {
        match self {
            Self::LDataReq(frame) | Self::LDataCon(frame) | Self::LDataInd(frame) => frame,
        }
    }
}

impl Encode for Message {
    fn size(&self) -> usize {
        1 + self.frame().size()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_u8(self.code().to_u8())?;
        w.write_encoded(self.frame())?;
        Ok(w.position())
    }
}

impl Decode for Message {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut r = Reader::new(data);
        let code = r.read_u8()?;

        let decoder = DECODERS
            .iter()
            .find(|(registered, _)| registered.to_u8() == code)
            .map(|(_, decoder)| *decoder)
            .ok_or_else(|| {
                crate::knx_log!(debug, "unsupported cEMI message code {:#x}", code);
                KnxError::unsupported_code()
            })?;

        let (message, used) = decoder(r.rest())?;
        Ok((message, 1 + used))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::tpdu::{ApplicationUnit, ControlCommand, ControlUnit};

    #[test]
    fn test_control_field1() {
        let ctrl = ControlField1::new(true, false, true, Priority::Normal, false, false);
        assert!(ctrl.is_standard_frame());
        assert!(!ctrl.do_not_repeat());
        assert!(ctrl.is_broadcast());
        assert_eq!(ctrl.priority(), Priority::Normal);
        assert!(!ctrl.ack_requested());
        assert!(!ctrl.has_error());
        assert_eq!(ControlField1::default(), ctrl);
        assert_eq!(ctrl.raw(), 0x94);
    }

    #[test]
    fn test_control_field1_raw() {
        // 1 0 1 1 11 0 0
        let ctrl = ControlField1::try_from(0xBC).unwrap();
        assert!(ctrl.is_standard_frame());
        assert!(ctrl.do_not_repeat());
        assert!(ctrl.is_broadcast());
        assert_eq!(ctrl.priority(), Priority::Low);
        assert!(!ctrl.ack_requested());
        assert!(!ctrl.has_error());
    }

    #[test]
    fn test_control_field1_reserved_bit() {
        let err = ControlField1::try_from(0xFC).unwrap_err();
        assert!(err.is_bad_reserved_bits());
    }

    #[test]
    fn test_control_field2() {
        let ctrl = ControlField2::new(true, 6, 0);
        assert!(ctrl.is_group_address());
        assert_eq!(ctrl.hop_count(), 6);
        assert_eq!(ctrl.extended_format(), 0);
        assert_eq!(ctrl.raw(), 0xE0);
        assert_eq!(ControlField2::default(), ctrl);

        let ctrl = ctrl.with_group_address(false);
        assert!(!ctrl.is_group_address());
        assert_eq!(ctrl.hop_count(), 6);
    }

    #[test]
    fn test_info_decode() {
        let (info, n) = Info::decode(&[0x03, 0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        assert_eq!(n, 4);
        assert_eq!(info.as_slice(), &[0xAA, 0xBB, 0xCC]);

        let (info, n) = Info::decode(&[0x00]).unwrap();
        assert_eq!(n, 1);
        assert!(info.is_empty());
    }

    #[test]
    fn test_info_decode_largest() {
        let mut data = [0xA5u8; 256];
        data[0] = 0xFF;
        let (info, n) = Info::decode(&data).unwrap();
        assert_eq!(n, 256);
        assert_eq!(info.len(), 255);
    }

    #[test]
    fn test_info_short_buffer() {
        assert!(Info::decode(&[0x04, 1, 2, 3]).unwrap_err().is_invalid_length());
        assert!(Info::decode(&[]).unwrap_err().is_invalid_length());
    }

    #[test]
    fn test_info_too_large() {
        let data = [0u8; 256];
        assert!(Info::new(&data).is_err());
        assert_eq!(Info::new(&data[..255]).unwrap().size(), 256);
    }

    #[test]
    fn test_ldata_parse_group_write() {
        let data = [
            0xBC, // Control field 1
            0xE0, // Control field 2 (group address, hop count 6)
            0x11, 0x01, // Source: 1.1.1
            0x0A, 0x03, // Destination: 1/2/3
            0x01, // Payload length
            0x00, // TPCI (unnumbered data)
            0x81, // APCI (group write) + 6-bit data (0x01)
        ];

        let (ldata, n) = LData::decode(&data).unwrap();
        assert_eq!(n, data.len());
        assert_eq!(ldata.source, IndividualAddress::new(1, 1, 1));
        assert_eq!(ldata.destination_group(), Some(GroupAddress::new(1, 2, 3)));
        assert!(ldata.is_group_write());
        assert_eq!(ldata.data(), &[0x01]);
    }

    #[test]
    fn test_ldata_individual_destination() {
        let data = [0xB0, 0x60, 0x11, 0x01, 0x11, 0x05, 0x00, 0x81];
        let (ldata, n) = LData::decode(&data).unwrap();
        assert_eq!(n, 8);
        assert_eq!(ldata.destination_individual(), Some(IndividualAddress::new(1, 1, 5)));
        assert_eq!(ldata.apci(), None);
        assert!(!ldata.is_group_read());
        assert_eq!(
            ldata.tpdu,
            TransportUnit::Control(ControlUnit::new(ControlCommand::Disconnect))
        );
    }

    #[test]
    fn test_ldata_encode_sets_address_type() {
        let mut ldata = LData::new(
            IndividualAddress::new(1, 1, 1),
            GroupAddress::new(1, 2, 3),
            ApplicationUnit::new(Apci::GroupValueRead, &[]),
        );
        // Inconsistent bit is corrected on encode
        ldata.ctrl2 = ControlField2::new(false, 6, 0);

        let mut buf = [0u8; 16];
        let n = ldata.encode(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[0x94, 0xE0, 0x11, 0x01, 0x0A, 0x03, 0x01, 0x00, 0x00]);

        let (decoded, _) = LData::decode(&buf[..n]).unwrap();
        assert!(decoded.is_group_read());
    }

    #[test]
    fn test_ldata_truncated_tpdu() {
        let data = [0xBC, 0xE0, 0x11, 0x01, 0x0A, 0x03, 0x02, 0x00, 0x80];
        assert!(LData::decode(&data).unwrap_err().is_invalid_length());
    }

    #[test]
    fn test_message_decode_indication() {
        let data = [
            0x29, // Message code: L_Data.ind
            0x00, // Add info length (none)
            0xBC, 0xE0, 0x11, 0x01, 0x0A, 0x03, 0x01, 0x00, 0x80,
        ];

        let (message, n) = Message::decode(&data).unwrap();
        assert_eq!(n, data.len());
        assert_eq!(message.code(), MessageCode::LDataInd);
        assert!(message.frame().info.is_empty());
        assert!(message.frame().ldata.is_group_write());
    }

    #[test]
    fn test_message_with_additional_info() {
        let data = [
            0x11, // Message code: L_Data.req
            0x04, // Add info length: 4 bytes
            0x01, 0x02, 0x03, 0x04, // Additional info
            0xBC, 0xE0, 0x11, 0x01, 0x0A, 0x03, 0x01, 0x00, 0x80,
        ];

        let (message, n) = Message::decode(&data).unwrap();
        assert_eq!(n, data.len());
        assert!(matches!(message, Message::LDataReq(_)));
        assert_eq!(message.frame().info.as_slice(), &[1, 2, 3, 4]);

        let mut buf = [0u8; 32];
        let written = message.encode(&mut buf).unwrap();
        assert_eq!(&buf[..written], &data);
    }

    #[test]
    fn test_message_trailing_bytes_not_consumed() {
        let data = [0x2E, 0x00, 0xBC, 0xE0, 0x11, 0x01, 0x0A, 0x03, 0x01, 0x00, 0x80, 0xFF];
        let (message, n) = Message::decode(&data).unwrap();
        assert_eq!(n, data.len() - 1);
        assert_eq!(message.code(), MessageCode::LDataCon);
    }

    #[test]
    fn test_message_unsupported_code() {
        let err = Message::decode(&[0xFF, 0x00]).unwrap_err();
        assert!(err.is_unsupported_code());
        let err = Message::decode(&[0x2B, 0x00]).unwrap_err();
        assert!(err.is_unsupported_code());
    }

    #[test]
    fn test_message_empty() {
        assert!(Message::decode(&[]).unwrap_err().is_invalid_length());
    }

    #[test]
    fn test_message_encode_buffer_too_small() {
        let ldata = LData::new(
            IndividualAddress::new(1, 1, 1),
            GroupAddress::new(1, 2, 3),
            ApplicationUnit::new(Apci::GroupValueWrite, &[1]),
        );
        let message = Message::LDataReq(LDataFrame::new(ldata));
        assert_eq!(message.size(), 11);
        let mut buf = [0u8; 10];
        assert!(message.encode(&mut buf).unwrap_err().is_buffer_too_small());
    }
}
