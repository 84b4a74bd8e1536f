//! KNX Individual Address implementation.
//!
//! Individual addresses identify physical devices on the KNX bus.
//! Format: Area.Line.Device (e.g., 1.1.5)
//! - Area: 0-15 (4 bits)
//! - Line: 0-15 (4 bits)
//! - Device: 0-255 (8 bits)
//!
//! The upper byte can also be read as a single subnet number (0-255), which
//! gives the 2-part form `subnet.device`.

use crate::addressing::split_numbers;
use crate::error::{KnxError, Result};
use core::fmt;

/// KNX Individual Address (Area.Line.Device)
///
/// # Examples
///
/// ```
/// use knx_wire::IndividualAddress;
///
/// let addr = IndividualAddress::new(1, 1, 5);
/// assert_eq!(addr.to_string(), "1.1.5");
///
/// let addr = IndividualAddress::from(0x1105u16);
/// assert_eq!(addr.area(), 1);
/// assert_eq!(addr.line(), 1);
/// assert_eq!(addr.device(), 5);
///
/// // 2-part and flat forms are accepted, output is always 3-part
/// let addr: IndividualAddress = "17.5".parse().unwrap();
/// assert_eq!(addr.to_string(), "1.1.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndividualAddress {
    raw: u16,
}

impl IndividualAddress {
    /// Maximum area value (4 bits)
    pub const MAX_AREA: u8 = 15;
    /// Maximum line value (4 bits)
    pub const MAX_LINE: u8 = 15;
    /// Maximum device value (8 bits)
    pub const MAX_DEVICE: u8 = 255;

    /// Create an address from `area.line.device`.
    ///
    /// Area and line are masked to 4 bits each; this never fails. Use
    /// [`str::parse`] for range-checked construction from text.
    #[inline]
    pub const fn new(area: u8, line: u8, device: u8) -> Self {
        let raw = ((area as u16 & 0x0F) << 12) | ((line as u16 & 0x0F) << 8) | device as u16;
        Self { raw }
    }

    /// Create an address from `subnet.device`, where subnet is the full upper byte.
    #[inline]
    pub const fn from_pair(subnet: u8, device: u8) -> Self {
        Self {
            raw: ((subnet as u16) << 8) | device as u16,
        }
    }

    /// Create from a 3-element array `[area, line, device]`.
    pub const fn from_array(parts: [u8; 3]) -> Self {
        Self::new(parts[0], parts[1], parts[2])
    }

    /// Create from the raw 16-bit value.
    #[inline(always)]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    /// Get the raw u16 representation of the address.
    #[inline(always)]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    /// Get the area component (0-15).
    #[inline(always)]
    pub const fn area(self) -> u8 {
        ((self.raw >> 12) & 0x0F) as u8
    }

    /// Get the line component (0-15).
    #[inline(always)]
    pub const fn line(self) -> u8 {
        ((self.raw >> 8) & 0x0F) as u8
    }

    /// Get the subnet (area and line together, 0-255).
    #[inline(always)]
    pub const fn subnet(self) -> u8 {
        (self.raw >> 8) as u8
    }

    /// Get the device component (0-255).
    #[inline(always)]
    pub const fn device(self) -> u8 {
        (self.raw & 0xFF) as u8
    }

    /// Encode the address into a byte buffer (big-endian).
    ///
    /// Returns the number of bytes written (always 2).
    #[inline]
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 2 {
            return Err(KnxError::buffer_too_small());
        }
        buf[0..2].copy_from_slice(&self.raw.to_be_bytes());
        Ok(2)
    }

    /// Decode an address from a byte buffer (big-endian).
    #[inline]
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < 2 {
            return Err(KnxError::invalid_length());
        }
        Ok(Self {
            raw: u16::from_be_bytes([buf[0], buf[1]]),
        })
    }
}

impl fmt::Display for IndividualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.area(), self.line(), self.device())
    }
}

impl From<u16> for IndividualAddress {
    #[inline(always)]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<IndividualAddress> for u16 {
    #[inline(always)]
    fn from(addr: IndividualAddress) -> u16 {
        addr.raw
    }
}

impl core::str::FromStr for IndividualAddress {
    type Err = KnxError;

    /// Parse `area.line.device`, `subnet.device` or a flat number.
    fn from_str(s: &str) -> Result<Self> {
        let nums = split_numbers(s, '.').ok_or_else(KnxError::invalid_individual_address)?;

        match *nums.as_slice() {
            [area, line, device] => {
                if area > u32::from(Self::MAX_AREA)
                    || line > u32::from(Self::MAX_LINE)
                    || device > u32::from(Self::MAX_DEVICE)
                {
                    return Err(KnxError::invalid_individual_address());
                }
                Ok(Self::new(area as u8, line as u8, device as u8))
            }
            [subnet, device] => {
                if subnet > 255 || device > 255 {
                    return Err(KnxError::invalid_individual_address());
                }
                Ok(Self::from_pair(subnet as u8, device as u8))
            }
            [raw] => u16::try_from(raw)
                .map(Self::from)
                .map_err(|_| KnxError::invalid_individual_address()),
            _ => Err(KnxError::invalid_individual_address()),
        }
    }
}
