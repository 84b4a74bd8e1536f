//! KNX wire protocol implementation.
//!
//! This module contains the telegram codec (cEMI messages and their
//! transport units) and the KNXnet/IP codec (header, endpoints, services
//! and description information blocks).

pub mod cemi;
pub mod codec;
pub mod constants;
pub mod description;
pub mod dib;
pub mod frame;
pub mod services;
pub mod tpdu;

pub use cemi::*;
pub use codec::{Decode, Encode};
pub use constants::*;
pub use description::*;
pub use dib::*;
pub use frame::*;
pub use services::*;
pub use tpdu::*;
