//! KNX Group Address implementation.
//!
//! Group addresses are multicast destinations for functional control.
//! Three textual forms are accepted:
//! - 3-level: Main/Middle/Sub (e.g., 1/2/3) - most common
//! - 2-level: Main/Sub (e.g., 1/234)
//! - flat: a single 16-bit number
//!
//! Internally stored as 16 bits:
//! - Main: 5 bits (0-31)
//! - Middle: 3 bits (0-7)
//! - Sub: 8 bits (0-255)
//!
//! Group address 0 is the broadcast address. The hierarchical textual forms
//! reject it (`0/0/0`, `0/0`); the flat form accepts it.

use crate::addressing::split_numbers;
use crate::error::{KnxError, Result};
use core::fmt;

/// KNX Group Address
///
/// # Examples
///
/// ```
/// use knx_wire::GroupAddress;
///
/// let addr = GroupAddress::new(1, 2, 3);
/// assert_eq!(addr.to_string(), "1/2/3");
///
/// let addr = GroupAddress::new_2level(1, 234);
/// assert_eq!(addr.to_string_2level(), "1/234");
///
/// let addr: GroupAddress = "1/2/3".parse().unwrap();
/// assert_eq!(u16::from(addr), 0x0A03);
///
/// assert!("0/0/0".parse::<GroupAddress>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupAddress {
    raw: u16,
}

impl GroupAddress {
    /// Maximum main group value (5 bits)
    pub const MAX_MAIN: u8 = 31;
    /// Maximum middle group value (3 bits)
    pub const MAX_MIDDLE: u8 = 7;
    /// Maximum sub group value (8 bits)
    pub const MAX_SUB: u8 = 255;
    /// Maximum sub value for 2-level format (11 bits)
    pub const MAX_SUB_2LEVEL: u16 = 2047;

    /// Create a 3-level Group Address (Main/Middle/Sub).
    ///
    /// Main is masked to 5 bits and middle to 3 bits; this never fails.
    #[inline]
    pub const fn new(main: u8, middle: u8, sub: u8) -> Self {
        let raw = ((main as u16 & 0x1F) << 11) | ((middle as u16 & 0x07) << 8) | sub as u16;
        Self { raw }
    }

    /// Create a 2-level Group Address (Main/Sub).
    ///
    /// Main is masked to 5 bits and sub to 11 bits.
    #[inline]
    pub const fn new_2level(main: u8, sub: u16) -> Self {
        Self {
            raw: ((main as u16 & 0x1F) << 11) | (sub & Self::MAX_SUB_2LEVEL),
        }
    }

    /// Create from a 3-element array `[main, middle, sub]`.
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

    /// Check whether this is the broadcast address (0).
    #[inline(always)]
    pub const fn is_broadcast(self) -> bool {
        self.raw == 0
    }

    /// Get the main group component (0-31).
    #[inline(always)]
    pub const fn main(self) -> u8 {
        ((self.raw >> 11) & 0x1F) as u8
    }

    /// Get the middle group component for 3-level format (0-7).
    #[inline(always)]
    pub const fn middle(self) -> u8 {
        ((self.raw >> 8) & 0x07) as u8
    }

    /// Get the sub group component for 3-level format (0-255).
    #[inline(always)]
    pub const fn sub(self) -> u8 {
        (self.raw & 0xFF) as u8
    }

    /// Get the sub group component for 2-level format (0-2047).
    #[inline(always)]
    pub const fn sub_2level(self) -> u16 {
        self.raw & Self::MAX_SUB_2LEVEL
    }

    /// Format as 2-level string (Main/Sub).
    pub fn to_string_2level(&self) -> heapless::String<16> {
        use core::fmt::Write;
        let mut s = heapless::String::new();
        // "31/2047" is 7 bytes, always fits
        let _ = write!(s, "{}/{}", self.main(), self.sub_2level());
        s
    }

    /// Encode the address into a byte buffer (big-endian).
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

impl From<u16> for GroupAddress {
    #[inline(always)]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<GroupAddress> for u16 {
    #[inline(always)]
    fn from(addr: GroupAddress) -> u16 {
        addr.raw
    }
}

impl fmt::Display for GroupAddress {
    /// Always formats as 3-level address
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}

impl core::str::FromStr for GroupAddress {
    type Err = KnxError;

    fn from_str(s: &str) -> Result<Self> {
        let nums = split_numbers(s, '/').ok_or_else(KnxError::invalid_group_address)?;

        match *nums.as_slice() {
            [main, middle, sub] => {
                if main > u32::from(Self::MAX_MAIN)
                    || middle > u32::from(Self::MAX_MIDDLE)
                    || sub > u32::from(Self::MAX_SUB)
                {
                    return Err(KnxError::invalid_group_address());
                }
                if main == 0 && middle == 0 && sub == 0 {
                    return Err(KnxError::invalid_group_address());
                }
                Ok(Self::new(main as u8, middle as u8, sub as u8))
            }
            [main, sub] => {
                if main > u32::from(Self::MAX_MAIN) || sub > u32::from(Self::MAX_SUB_2LEVEL) {
                    return Err(KnxError::invalid_group_address());
                }
                if main == 0 && sub == 0 {
                    return Err(KnxError::invalid_group_address());
                }
                Ok(Self::new_2level(main as u8, sub as u16))
            }
            // The flat form does not reserve 0
            [raw] => u16::try_from(raw)
                .map(Self::from)
                .map_err(|_| KnxError::invalid_group_address()),
            _ => Err(KnxError::invalid_group_address()),
        }
    }
}
