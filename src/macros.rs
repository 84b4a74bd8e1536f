//! Convenience macros for writing KNX addresses as literals.

/// Creates a [`GroupAddress`](crate::addressing::GroupAddress) from 3-level notation.
///
/// # Syntax
///
/// ```text
/// ga!(main/middle/sub)
/// ```
///
/// Where:
/// - `main`: Main group (0-31)
/// - `middle`: Middle group (0-7)
/// - `sub`: Sub group (0-255)
///
/// # Examples
///
/// ```
/// use knx_wire::ga;
///
/// let light_switch = ga!(2/1/5);
/// assert_eq!(light_switch.to_string(), "2/1/5");
/// ```
///
/// # Compile-Time Validation
///
/// ```compile_fail
/// // main group > 31
/// let addr = knx_wire::ga!(32/0/0);
/// ```
///
/// ```compile_fail
/// // middle group > 7
/// let addr = knx_wire::ga!(1/8/0);
/// ```
///
/// ```compile_fail
/// // 0/0/0 is the broadcast address
/// let addr = knx_wire::ga!(0/0/0);
/// ```
#[macro_export]
macro_rules! ga {
    ($main:literal / $middle:literal / $sub:literal) => {{
        const _: () = {
            if $main > 31 {
                panic!("Main group must be 0-31");
            }
            if $middle > 7 {
                panic!("Middle group must be 0-7");
            }
            if $sub > 255 {
                panic!("Sub group must be 0-255");
            }
            if $main == 0 && $middle == 0 && $sub == 0 {
                panic!("Group address 0/0/0 is reserved");
            }
        };
        const ADDR: $crate::addressing::GroupAddress =
            $crate::addressing::GroupAddress::new($main, $middle, $sub);
        ADDR
    }};
}

/// Creates an [`IndividualAddress`](crate::addressing::IndividualAddress) from
/// `area, line, device`.
///
/// Dots cannot be used as separators in a macro pattern (`1.1` lexes as a
/// float), so the components are comma separated.
///
/// # Examples
///
/// ```
/// use knx_wire::ia;
///
/// let router = ia!(1, 1, 0);
/// assert_eq!(router.to_string(), "1.1.0");
/// ```
///
/// ```compile_fail
/// // area > 15
/// let addr = knx_wire::ia!(16, 0, 1);
/// ```
#[macro_export]
macro_rules! ia {
    ($area:literal, $line:literal, $device:literal) => {{
        const _: () = {
            if $area > 15 {
                panic!("Area must be 0-15");
            }
            if $line > 15 {
                panic!("Line must be 0-15");
            }
            if $device > 255 {
                panic!("Device must be 0-255");
            }
        };
        const ADDR: $crate::addressing::IndividualAddress =
            $crate::addressing::IndividualAddress::new($area, $line, $device);
        ADDR
    }};
}
