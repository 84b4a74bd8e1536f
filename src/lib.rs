#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![doc = include_str!("../README.md")]

//! ## Crate Layout
//!
//! - [`addressing`] - individual and group addresses with their text forms
//! - [`protocol::cemi`] and [`protocol::tpdu`] - the cEMI telegram codec
//! - [`protocol::frame`] and [`protocol::services`] - KNXnet/IP frames
//! - [`protocol::dib`] and [`protocol::description`] - description blocks
//! - [`error`] - the shared error type

pub mod addressing;
pub mod error;
pub mod protocol;

// Macro modules (must be declared before use)
#[macro_use]
pub mod macros;
#[macro_use]
pub mod logging;

// Re-export commonly used types
#[doc(inline)]
pub use addressing::{GroupAddress, IndividualAddress};
#[doc(inline)]
pub use error::{ErrorKind, KnxError, Result, ScanError};
#[doc(inline)]
pub use protocol::codec::{Decode, Encode};
#[doc(inline)]
pub use protocol::{DescriptorBlock, HostInfo, KnxnetIpFrame, LData, Message, Selector};
