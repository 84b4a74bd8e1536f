//! Transport layer data units (TPDU) carried at the end of an `L_Data` telegram.
//!
//! The first byte of a unit is the NPDU length, the second holds the TPCI.
//! Bit 7 of the TPCI selects the variant:
//!
//! ```text
//! Control unit (2 bytes)
//! ┌──────────┬───┬───┬─────────┬─────┐
//! │ 0x00     │ 1 │ N │ seq (4) │ cmd │
//! └──────────┴───┴───┴─────────┴─────┘
//!
//! Application unit (2 + length bytes)
//! ┌──────────┬───┬───┬─────────┬─────────┬─────────┬──────────┬─────────┐
//! │ length   │ 0 │ N │ seq (4) │ apci hi │ apci lo │ data0(6) │ data1.. │
//! └──────────┴───┴───┴─────────┴─────────┴─────────┴──────────┴─────────┘
//! ```
//!
//! The sequence number is only carried when the numbered flag `N` is set.

use crate::error::{KnxError, Result};
use crate::protocol::codec::{Decode, Encode, Reader, Writer};
use crate::protocol::constants::MAX_SEGMENT_SIZE;

const TPCI_CONTROL: u8 = 0x80;
const TPCI_NUMBERED: u8 = 0x40;

/// Application payload bytes, at most 255
pub type AppPayload = heapless::Vec<u8, MAX_SEGMENT_SIZE>;

/// APCI (Application Layer Protocol Control Information)
///
/// The 4-bit command spread over the TPCI byte (2 high bits) and the first
/// application byte (2 low bits). Every 4-bit value is named, so decoding
/// never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Apci {
    /// `A_GroupValue_Read`
    GroupValueRead = 0,
    /// `A_GroupValue_Response`
    GroupValueResponse = 1,
    /// `A_GroupValue_Write`
    GroupValueWrite = 2,
    /// `A_IndividualAddress_Write`
    IndividualAddressWrite = 3,
    /// `A_IndividualAddress_Read`
    IndividualAddressRead = 4,
    /// `A_IndividualAddress_Response`
    IndividualAddressResponse = 5,
    /// `A_ADC_Read`
    AdcRead = 6,
    /// `A_ADC_Response`
    AdcResponse = 7,
    /// `A_Memory_Read`
    MemoryRead = 8,
    /// `A_Memory_Response`
    MemoryResponse = 9,
    /// `A_Memory_Write`
    MemoryWrite = 10,
    /// `A_UserMessage`
    UserMessage = 11,
    /// `A_DeviceDescriptor_Read` (mask version read)
    DeviceDescriptorRead = 12,
    /// `A_DeviceDescriptor_Response`
    DeviceDescriptorResponse = 13,
    /// `A_Restart`
    Restart = 14,
    /// Escape to extended commands
    Escape = 15,
}

impl Apci {
    /// Build from the low 4 bits of `code`
    pub const fn from_code(code: u8) -> Self {
        match code & 0x0F {
            0 => Self::GroupValueRead,
            1 => Self::GroupValueResponse,
            2 => Self::GroupValueWrite,
            3 => Self::IndividualAddressWrite,
            4 => Self::IndividualAddressRead,
            5 => Self::IndividualAddressResponse,
            6 => Self::AdcRead,
            7 => Self::AdcResponse,
            8 => Self::MemoryRead,
            9 => Self::MemoryResponse,
            10 => Self::MemoryWrite,
            11 => Self::UserMessage,
            12 => Self::DeviceDescriptorRead,
            13 => Self::DeviceDescriptorResponse,
            14 => Self::Restart,
            _ => Self::Escape,
        }
    }

    /// The 4-bit command code
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The 10-bit APCI wire value with the 6 data bits cleared (e.g. `0x080` for write)
    pub const fn to_u16(self) -> u16 {
        (self as u16) << 6
    }

    /// Rebuild from a 10-bit APCI value; the low 6 (data) bits are ignored
    pub const fn from_u16(value: u16) -> Self {
        Self::from_code(((value >> 6) & 0x0F) as u8)
    }
}

/// Command of a transport control unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ControlCommand {
    /// `T_Connect`
    Connect = 0b00,
    /// `T_Disconnect`
    Disconnect = 0b01,
    /// `T_ACK`
    Ack = 0b10,
    /// `T_NAK`
    Nak = 0b11,
}

impl ControlCommand {
    /// Build from the low 2 bits of `value`
    pub const fn from_u8(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Self::Connect,
            0b01 => Self::Disconnect,
            0b10 => Self::Ack,
            _ => Self::Nak,
        }
    }

    /// Convert to the 2-bit wire value
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// TPCI byte without the variant bit: numbered flag and sequence number
const fn tpci_bits(sequence: Option<u8>) -> u8 {
    match sequence {
        Some(seq) => TPCI_NUMBERED | ((seq & 0x0F) << 2),
        None => 0,
    }
}

/// Sequence number of a TPCI byte, `None` for unnumbered units
const fn tpci_sequence(tpci: u8) -> Option<u8> {
    if tpci & TPCI_NUMBERED != 0 {
        Some((tpci >> 2) & 0x0F)
    } else {
        None
    }
}

/// Transport control unit (`T_Connect`, `T_Disconnect`, `T_ACK`, `T_NAK`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlUnit {
    /// Sequence number (0-15), present only for numbered units
    pub sequence: Option<u8>,
    /// Control command
    pub command: ControlCommand,
}

impl ControlUnit {
    /// Packed size of a control unit
    pub const SIZE: usize = 2;

    /// Create an unnumbered control unit
    pub const fn new(command: ControlCommand) -> Self {
        Self {
            sequence: None,
            command,
        }
    }

    /// Create a numbered control unit; `sequence` is masked to 4 bits
    pub const fn numbered(command: ControlCommand, sequence: u8) -> Self {
        Self {
            sequence: Some(sequence & 0x0F),
            command,
        }
    }

    /// Whether the unit carries a sequence number
    pub const fn is_numbered(&self) -> bool {
        self.sequence.is_some()
    }
}

impl Encode for ControlUnit {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        w.write_u8(0)?;
        w.write_u8(TPCI_CONTROL | tpci_bits(self.sequence) | self.command.to_u8())?;
        Ok(w.position())
    }
}

impl Decode for ControlUnit {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut r = Reader::new(data);
        let length = r.read_u8()?;
        let tpci = r.read_u8()?;

        if tpci & TPCI_CONTROL == 0 {
            return Err(KnxError::unsupported_code());
        }
        // Control units carry no NPDU payload
        if length != 0 {
            return Err(KnxError::bad_reserved_bits());
        }

        let unit = Self {
            sequence: tpci_sequence(tpci),
            command: ControlCommand::from_u8(tpci),
        };
        Ok((unit, r.position()))
    }
}

/// Application data unit carrying an APCI command and its payload
///
/// The first payload byte shares its octet with the low APCI bits, so only its
/// low 6 bits are transmitted. The payload always holds that shared byte: an
/// empty payload is stored as a single zero byte, so a decoded unit equals the
/// one that was encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ApplicationUnit {
    /// Sequence number (0-15), present only for numbered units
    pub sequence: Option<u8>,
    /// Application command
    pub command: Apci,
    /// Payload; byte 0 is limited to 6 bits on the wire
    pub data: AppPayload,
}

impl ApplicationUnit {
    /// Create an unnumbered unit; `data` beyond 255 bytes is truncated
    ///
    /// The first byte is reduced to its 6 transmitted bits and an empty `data`
    /// becomes `[0]`.
    pub fn new(command: Apci, data: &[u8]) -> Self {
        let data = if data.is_empty() { &[0u8][..] } else { data };
        let mut payload: AppPayload = data.iter().copied().take(MAX_SEGMENT_SIZE).collect();
        if let Some(first) = payload.first_mut() {
            *first &= 0x3F;
        }
        Self {
            sequence: None,
            command,
            data: payload,
        }
    }

    /// Set a sequence number (masked to 4 bits), making the unit numbered
    #[must_use]
    pub fn with_sequence(mut self, sequence: u8) -> Self {
        self.sequence = Some(sequence & 0x0F);
        self
    }

    /// Whether the unit carries a sequence number
    pub const fn is_numbered(&self) -> bool {
        self.sequence.is_some()
    }

    /// Number of payload bytes on the wire (at least 1 for the shared APCI byte)
    fn wire_length(&self) -> usize {
        self.data.len().max(1)
    }
}

impl Encode for ApplicationUnit {
    fn size(&self) -> usize {
        2 + self.wire_length()
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < self.size() {
            return Err(KnxError::buffer_too_small());
        }
        let apci = self.command.code();
        let first = self.data.first().copied().unwrap_or(0);

        let mut w = Writer::new(buf);
        w.write_u8(self.wire_length() as u8)?;
        w.write_u8(tpci_bits(self.sequence) | (apci >> 2))?;
        w.write_u8(((apci & 0b11) << 6) | (first & 0x3F))?;
        if self.data.len() > 1 {
            w.write_all(&self.data[1..])?;
        }
        Ok(w.position())
    }
}

impl Decode for ApplicationUnit {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let mut r = Reader::new(data);
        let length = usize::from(r.read_u8()?);
        let tpci = r.read_u8()?;

        if tpci & TPCI_CONTROL != 0 {
            return Err(KnxError::unsupported_code());
        }
        // The shared APCI/data byte is always present
        if length == 0 {
            return Err(KnxError::invalid_length());
        }

        let body = r.read_exact(length)?;
        let apci = ((tpci & 0b11) << 2) | (body[0] >> 6);

        let mut payload = AppPayload::from_slice(body).map_err(|_| KnxError::payload_too_large())?;
        payload[0] &= 0x3F;

        let unit = Self {
            sequence: tpci_sequence(tpci),
            command: Apci::from_code(apci),
            data: payload,
        };
        Ok((unit, r.position()))
    }
}

/// Transport data unit, dispatched on bit 7 of the TPCI byte
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportUnit {
    /// Transport control unit
    Control(ControlUnit),
    /// Application data unit
    App(ApplicationUnit),
}

impl TransportUnit {
    /// Whether this is an application data unit
    pub const fn is_app(&self) -> bool {
        matches!(self, Self::App(_))
    }

    /// Get the application unit, if any
    pub const fn as_app(&self) -> Option<&ApplicationUnit> {
        match self {
            Self::App(app) => Some(app),
            Self::Control(_) => None,
        }
    }

    /// Get the control unit, if any
    pub const fn as_control(&self) -> Option<&ControlUnit> {
        match self {
            Self::Control(control) => Some(control),
            Self::App(_) => None,
        }
    }
}

impl From<ControlUnit> for TransportUnit {
    fn from(unit: ControlUnit) -> Self {
        Self::Control(unit)
    }
}

impl From<ApplicationUnit> for TransportUnit {
    fn from(unit: ApplicationUnit) -> Self {
        Self::App(unit)
    }
}

impl Encode for TransportUnit {
    fn size(&self) -> usize {
        match self {
            Self::Control(unit) => unit.size(),
            Self::App(unit) => unit.size(),
        }
    }

    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Self::Control(unit) => unit.encode(buf),
            Self::App(unit) => unit.encode(buf),
        }
    }
}

impl Decode for TransportUnit {
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let tpci = *data.get(1).ok_or_else(KnxError::invalid_length)?;

        if tpci & TPCI_CONTROL != 0 {
            ControlUnit::decode(data).map(|(unit, n)| (Self::Control(unit), n))
        } else {
            ApplicationUnit::decode(data).map(|(unit, n)| (Self::App(unit), n))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_unit(data: &[u8]) -> (TransportUnit, usize) {
        TransportUnit::decode(data).unwrap()
    }

    #[test]
    fn test_apci_values() {
        assert_eq!(Apci::GroupValueWrite.to_u16(), 0x080);
        assert_eq!(Apci::GroupValueResponse.to_u16(), 0x040);
        assert_eq!(Apci::from_u16(0x0BF), Apci::GroupValueWrite);
        assert_eq!(Apci::from_code(0x1F), Apci::Escape);
    }

    #[test]
    fn test_control_unit_encode() {
        let unit = ControlUnit::numbered(ControlCommand::Ack, 5);
        let mut buf = [0u8; 2];
        assert_eq!(unit.encode(&mut buf).unwrap(), 2);
        // 1 1 0101 10
        assert_eq!(buf, [0x00, 0b1101_0110]);

        let unit = ControlUnit::new(ControlCommand::Disconnect);
        unit.encode(&mut buf).unwrap();
        assert_eq!(buf, [0x00, 0x81]);
    }

    #[test]
    fn test_control_unit_decode() {
        let (unit, n) = decode_unit(&[0x00, 0xC2, 0xFF]);
        assert_eq!(n, 2);
        assert_eq!(
            unit,
            TransportUnit::Control(ControlUnit::numbered(ControlCommand::Ack, 0))
        );
    }

    #[test]
    fn test_unnumbered_ignores_sequence_bits() {
        // Sequence bits set but numbered flag clear
        let (unit, _) = decode_unit(&[0x00, 0b1011_1100]);
        let control = unit.as_control().unwrap();
        assert!(!control.is_numbered());
        assert_eq!(control.sequence, None);
        assert_eq!(control.command, ControlCommand::Connect);
    }

    #[test]
    fn test_control_unit_reserved_length() {
        let err = TransportUnit::decode(&[0x01, 0x80]).unwrap_err();
        assert!(err.is_bad_reserved_bits());
    }

    #[test]
    fn test_app_unit_group_write_6bit() {
        let unit = ApplicationUnit::new(Apci::GroupValueWrite, &[0x01]);
        let mut buf = [0u8; 8];
        let n = unit.encode(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[0x01, 0x00, 0x81]);

        let (decoded, consumed) = decode_unit(&buf[..n]);
        assert_eq!(consumed, 3);
        assert_eq!(decoded, TransportUnit::App(unit));
    }

    #[test]
    fn test_app_unit_with_trailing_data() {
        let unit = ApplicationUnit::new(Apci::GroupValueResponse, &[0, 0x0C, 0x1A]).with_sequence(3);
        let mut buf = [0u8; 8];
        let n = unit.encode(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[0x03, 0b0100_1100, 0x40, 0x0C, 0x1A]);

        let (decoded, consumed) = decode_unit(&buf[..n]);
        assert_eq!(consumed, 5);
        let app = decoded.as_app().unwrap();
        assert_eq!(app.sequence, Some(3));
        assert_eq!(app.command, Apci::GroupValueResponse);
        assert_eq!(app.data.as_slice(), &[0, 0x0C, 0x1A]);
    }

    #[test]
    fn test_app_unit_empty_payload() {
        let unit = ApplicationUnit::new(Apci::GroupValueRead, &[]);
        assert_eq!(unit.size(), 3);
        assert_eq!(unit.data.as_slice(), &[0x00]);
        let mut buf = [0u8; 3];
        unit.encode(&mut buf).unwrap();
        assert_eq!(buf, [0x01, 0x00, 0x00]);

        let (decoded, consumed) = decode_unit(&buf);
        assert_eq!(consumed, 3);
        assert_eq!(decoded, TransportUnit::App(unit));
    }

    #[test]
    fn test_app_unit_first_byte_masked() {
        let unit = ApplicationUnit::new(Apci::GroupValueWrite, &[0xFF, 0xFF]);
        assert_eq!(unit.data.as_slice(), &[0x3F, 0xFF]);
        let mut buf = [0u8; 4];
        unit.encode(&mut buf).unwrap();
        assert_eq!(buf[2], 0xBF);

        let (decoded, _) = decode_unit(&buf);
        assert_eq!(decoded, TransportUnit::App(unit));
    }

    #[test]
    fn test_app_unit_truncates_to_255() {
        let data = [0x11u8; 300];
        let unit = ApplicationUnit::new(Apci::MemoryResponse, &data);
        assert_eq!(unit.data.len(), 255);
        assert_eq!(unit.size(), 257);
    }

    #[test]
    fn test_app_unit_short_buffer() {
        // Declares 3 payload bytes, only 2 present
        let err = TransportUnit::decode(&[0x03, 0x00, 0x80, 0x01]).unwrap_err();
        assert!(err.is_invalid_length());

        let err = TransportUnit::decode(&[0x00]).unwrap_err();
        assert!(err.is_invalid_length());

        let err = TransportUnit::decode(&[0x00, 0x00, 0x80]).unwrap_err();
        assert!(err.is_invalid_length());
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let unit = ApplicationUnit::new(Apci::GroupValueWrite, &[1, 2, 3]);
        let mut buf = [0u8; 3];
        assert!(unit.encode(&mut buf).unwrap_err().is_buffer_too_small());
    }
}
