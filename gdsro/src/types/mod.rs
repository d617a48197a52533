//! Wire encodings of external types.
//!
//! - [`time`][::time]'s [`Date`][::time::Date], [`Time`][::time::Time] and
//!   [`PrimitiveDateTime`][::time::PrimitiveDateTime], see [`time`]
pub mod time;
