//! KNX addressing system.
//!
//! KNX uses two 16-bit address spaces:
//! - Individual addresses identify physical devices (Area.Line.Device)
//! - Group addresses are multicast destinations (Main/Middle/Sub or Main/Sub)
//!
//! Both accept a 1-, 2- or 3-part textual form and always format in the
//! 3-part hierarchical form.

pub mod group;
pub mod individual;

pub use group::GroupAddress;
pub use individual::IndividualAddress;

/// Split `text` on `separator` into at most three unsigned numbers.
///
/// Returns `None` for more than three parts or any token that is not a
/// decimal number (including empty tokens).
pub(crate) fn split_numbers(text: &str, separator: char) -> Option<heapless::Vec<u32, 3>> {
    let mut nums = heapless::Vec::new();
    for part in text.split(separator) {
        let value = part.parse::<u32>().ok()?;
        nums.push(value).ok()?;
    }
    Some(nums)
}
