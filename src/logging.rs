//! Unified logging macro for knx-wire.
//!
//! The backend is selected at compile time from the active feature flags:
//!
//! - `defmt` - uses `defmt::` (preferred on embedded targets)
//! - `log` - uses the `log` facade (std applications, USB serial loggers)
//! - neither - logging is compiled out, arguments are still type-checked
//!
//! # Usage
//!
//! ```rust,ignore
//! knx_log!(debug, "Skipping DIB {:#x}", block_type);
//! knx_log!(warn, "Unknown DIB list full at {:#x}", block_type);
//! ```

/// Unified logging macro - selects `defmt::` or `log::` based on features
#[macro_export]
#[doc(hidden)]
#[cfg(feature = "defmt")]
macro_rules! knx_log {
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[macro_export]
#[doc(hidden)]
#[cfg(all(feature = "log", not(feature = "defmt")))]
macro_rules! knx_log {
    (info, $($arg:tt)*) => { log::info!($($arg)*) };
    (debug, $($arg:tt)*) => { log::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { log::warn!($($arg)*) };
    (error, $($arg:tt)*) => { log::error!($($arg)*) };
    (trace, $($arg:tt)*) => { log::trace!($($arg)*) };
}

#[macro_export]
#[doc(hidden)]
#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! knx_log {
    ($level:ident, $($arg:tt)*) => {{
        if false {
            let _ = format_args!($($arg)*);
        }
    }};
}
