//! Descriptor block scanning.
//!
//! Search, description and diagnostic responses end with a sequence of DIBs in
//! no particular order. [`DescriptorBlock`] collects at most one of each known
//! block and keeps manufacturer data verbatim.
//!
//! Blocks of an unknown type are skipped by their declared length so that
//! newer devices stay readable. Such events are reported to a
//! [`DiagnosticSink`] passed into the scan rather than to a global logger.
//!
//! ```rust
//! use knx_wire::protocol::description::{DescriptorBlock, ScanNote};
//!
//! let data = [
//!     0x06, 0x05, 0x11, 0x01, 0x11, 0x02, // address list
//!     0x04, 0x42, 0xAA, 0xBB, // unknown type 0x42
//! ];
//! let mut notes = heapless::Vec::<ScanNote, 4>::new();
//! let (block, consumed) = DescriptorBlock::decode_with(&data, &mut notes).unwrap();
//!
//! assert_eq!(consumed, data.len());
//! assert_eq!(block.knx_addresses.unwrap().addresses.len(), 2);
//! assert_eq!(notes.as_slice(), &[ScanNote::UnsupportedBlock { block_type: 0x42, length: 4 }]);
//! ```

use crate::error::{KnxError, Result, ScanError};
use crate::protocol::codec::{Decode, Encode, Writer};
use crate::protocol::constants::MAX_UNKNOWN_BLOCKS;
use crate::protocol::dib::{
    CurrentIpConfig, DescriptionType, DeviceInfo, IpConfig, KnxAddressList, SupportedServices,
    UnknownBlock, DIB_HEADER_SIZE,
};

/// Non-fatal event raised while scanning descriptor blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanNote {
    /// Manufacturer data kept as an unknown block
    ManufacturerData {
        /// Type tag
        block_type: u8,
        /// Declared block length
        length: u8,
    },
    /// Block of an unknown type skipped
    UnsupportedBlock {
        /// Type tag
        block_type: u8,
        /// Declared block length
        length: u8,
    },
    /// A known block appeared again and replaced the earlier one
    DuplicateBlock {
        /// Type tag
        block_type: u8,
    },
}

/// Receiver for non-fatal scan events
pub trait DiagnosticSink {
    /// Record one event
    fn note(&mut self, note: ScanNote);
}

/// Discards every note
impl DiagnosticSink for () {
    fn note(&mut self, _note: ScanNote) {}
}

/// Collects notes until full, later notes are dropped
impl<const N: usize> DiagnosticSink for heapless::Vec<ScanNote, N> {
    fn note(&mut self, note: ScanNote) {
        let _ = self.push(note);
    }
}

/// Forwards notes to the crate logger
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn note(&mut self, note: ScanNote) {
        match note {
            ScanNote::ManufacturerData { block_type, length } => {
                crate::knx_log!(debug, "DIB not parsed: {:#x} ({} bytes)", block_type, length);
            }
            ScanNote::UnsupportedBlock { block_type, length } => {
                crate::knx_log!(debug, "Found unsupported DIB with code: {:#x} ({} bytes)", block_type, length);
            }
            ScanNote::DuplicateBlock { block_type } => {
                crate::knx_log!(debug, "Duplicate DIB {:#x} replaces earlier one", block_type);
            }
        }
    }
}

/// All description information blocks found in a response
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DescriptorBlock {
    /// Device information
    pub device_info: Option<DeviceInfo>,
    /// Supported service families
    pub supported_services: Option<SupportedServices>,
    /// Configured IP settings
    pub ip_config: Option<IpConfig>,
    /// Current IP settings
    pub current_ip_config: Option<CurrentIpConfig>,
    /// Additional individual addresses
    pub knx_addresses: Option<KnxAddressList>,
    /// Manufacturer data blocks in stream order
    pub unknown_blocks: heapless::Vec<UnknownBlock, MAX_UNKNOWN_BLOCKS>,
}

/// Store a decoded block, noting when it replaces an earlier one
fn place<T, S>(slot: &mut Option<T>, value: T, block_type: DescriptionType, sink: &mut S)
where
    S: DiagnosticSink + ?Sized,
{
    if slot.replace(value).is_some() {
        sink.note(ScanNote::DuplicateBlock {
            block_type: block_type.to_u8(),
        });
    }
}

impl DescriptorBlock {
    /// Scan `data` as a sequence of DIBs, reporting non-fatal events to `sink`
    ///
    /// The whole buffer is consumed; on success the returned length equals
    /// `data.len()`.
    ///
    /// # Errors
    ///
    /// - `InvalidLength` when a block header is cut off, a declared length is
    ///   below 2, or a block runs past the end of `data`
    /// - `StructureLengthMismatch` when a known block's declared length differs
    ///   from its size
    /// - `PayloadTooLarge` when more manufacturer blocks arrive than
    ///   [`MAX_UNKNOWN_BLOCKS`] can hold
    ///
    /// The error carries the offset of the failing block.
    pub fn decode_with<S>(data: &[u8], sink: &mut S) -> core::result::Result<(Self, usize), ScanError>
    where
        S: DiagnosticSink + ?Sized,
    {
        let mut block = Self::default();
        let mut offset = 0;

        while offset < data.len() {
            let length = block
                .scan_one(&data[offset..], sink)
                .map_err(|error| ScanError::new(offset, error))?;
            offset += length;
        }

        Ok((block, offset))
    }

    /// Decode one DIB at the front of `rest`, returning its declared length
    fn scan_one<S>(&mut self, rest: &[u8], sink: &mut S) -> Result<usize>
    where
        S: DiagnosticSink + ?Sized,
    {
        let [length, tag, ..] = *rest else {
            return Err(KnxError::invalid_length());
        };
        let declared = usize::from(length);
        if declared < DIB_HEADER_SIZE {
            return Err(KnxError::invalid_length());
        }

        match DescriptionType::from_u8(tag) {
            Some(kind @ DescriptionType::DeviceInfo) => {
                let (dib, _) = DeviceInfo::decode(rest)?;
                place(&mut self.device_info, dib, kind, sink);
            }
            Some(kind @ DescriptionType::SupportedServiceFamilies) => {
                let (dib, _) = SupportedServices::decode(rest)?;
                place(&mut self.supported_services, dib, kind, sink);
            }
            Some(kind @ DescriptionType::IpConfig) => {
                let (dib, _) = IpConfig::decode(rest)?;
                place(&mut self.ip_config, dib, kind, sink);
            }
            Some(kind @ DescriptionType::CurrentIpConfig) => {
                let (dib, _) = CurrentIpConfig::decode(rest)?;
                place(&mut self.current_ip_config, dib, kind, sink);
            }
            Some(kind @ DescriptionType::KnxAddresses) => {
                let (dib, _) = KnxAddressList::decode(rest)?;
                place(&mut self.knx_addresses, dib, kind, sink);
            }
            Some(DescriptionType::ManufacturerData) => {
                let body = rest
                    .get(DIB_HEADER_SIZE..declared)
                    .ok_or_else(KnxError::invalid_length)?;
                // Blocks without payload are dropped silently
                if !body.is_empty() {
                    self.keep_unknown(tag, body)?;
                    sink.note(ScanNote::ManufacturerData {
                        block_type: tag,
                        length,
                    });
                }
            }
            None => {
                if rest.len() < declared {
                    return Err(KnxError::invalid_length());
                }
                sink.note(ScanNote::UnsupportedBlock {
                    block_type: tag,
                    length,
                });
            }
        }

        Ok(declared)
    }

    fn keep_unknown(&mut self, block_type: u8, body: &[u8]) -> Result<()> {
        let unknown = UnknownBlock::new(block_type, body)?;
        self.unknown_blocks.push(unknown).map_err(|_| {
            crate::knx_log!(warn, "Unknown DIB list full at {:#x}", block_type);
            KnxError::payload_too_large()
        })
    }

    /// Whether no block was found
    pub fn is_empty(&self) -> bool {
        self.device_info.is_none()
            && self.supported_services.is_none()
            && self.ip_config.is_none()
            && self.current_ip_config.is_none()
            && self.knx_addresses.is_none()
            && self.unknown_blocks.is_empty()
    }
}

impl Decode for DescriptorBlock {
    /// Scan with [`LogSink`]
    fn decode(data: &[u8]) -> Result<(Self, usize)> {
        Self::decode_with(data, &mut LogSink).map_err(KnxError::from)
    }
}

impl Encode for DescriptorBlock {
    fn size(&self) -> usize {
        self.device_info.as_ref().map_or(0, Encode::size)
            + self.supported_services.as_ref().map_or(0, Encode::size)
            + self.ip_config.as_ref().map_or(0, Encode::size)
            + self.current_ip_config.as_ref().map_or(0, Encode::size)
            + self.knx_addresses.as_ref().map_or(0, Encode::size)
            + self.unknown_blocks.iter().map(Encode::size).sum::<usize>()
    }

    /// Known blocks in type order, then unknown blocks in stream order
    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut w = Writer::new(buf);
        if let Some(dib) = &self.device_info {
            w.write_encoded(dib)?;
        }
        if let Some(dib) = &self.supported_services {
            w.write_encoded(dib)?;
        }
        if let Some(dib) = &self.ip_config {
            w.write_encoded(dib)?;
        }
        if let Some(dib) = &self.current_ip_config {
            w.write_encoded(dib)?;
        }
        if let Some(dib) = &self.knx_addresses {
            w.write_encoded(dib)?;
        }
        for dib in &self.unknown_blocks {
            w.write_encoded(dib)?;
        }
        Ok(w.position())
    }
}
