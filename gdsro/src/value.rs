//! Column values.
use bytes::Bytes;
use std::fmt;
use time::{Date, PrimitiveDateTime, Time};

use crate::ext::FmtExt;

/// A decoded column value, or a parameter value to be encoded.
///
/// Blob, array and quad columns carry their 64-bit identifier as [`Value::Int64`].
#[derive(Clone, PartialEq)]
pub enum Value {
    /// Fixed or varying text, raw bytes in the column character set.
    Bytes(Bytes),
    Short(i16),
    Long(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Date(Date),
    Time(Time),
    Timestamp(PrimitiveDateTime),
}

impl Value {
    /// Returns the text content, if the value is text.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the text content as utf8, if the value is valid utf8 text.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Returns any integer value widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Short(v) => Some(v.into()),
            Value::Long(v) => Some(v.into()),
            Value::Int64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns any floating point value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v.into()),
            Value::Double(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Bytes(_) => "bytes",
            Value::Short(_) => "short",
            Value::Long(_) => "long",
            Value::Int64(_) => "int64",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for Value {
            fn from($pat: $ty) -> Self {
                $body
            }
        }
    };
}

from!(<Bytes>v => Value::Bytes(v));
from!(<Vec<u8>>v => Value::Bytes(v.into()));
from!(<&[u8]>v => Value::Bytes(Bytes::copy_from_slice(v)));
from!(<String>v => Value::Bytes(v.into()));
from!(<&str>v => Value::Bytes(Bytes::copy_from_slice(v.as_bytes())));
from!(<i16>v => Value::Short(v));
from!(<i32>v => Value::Long(v));
from!(<i64>v => Value::Int64(v));
from!(<f32>v => Value::Float(v));
from!(<f64>v => Value::Double(v));
from!(<Date>v => Value::Date(v));
from!(<Time>v => Value::Time(v));
from!(<PrimitiveDateTime>v => Value::Timestamp(v));

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bytes(b) => fmt::Debug::fmt(&b.lossy(), f),
            Value::Short(v) => fmt::Debug::fmt(v, f),
            Value::Long(v) => fmt::Debug::fmt(v, f),
            Value::Int64(v) => fmt::Debug::fmt(v, f),
            Value::Float(v) => fmt::Debug::fmt(v, f),
            Value::Double(v) => fmt::Debug::fmt(v, f),
            Value::Date(v) => fmt::Display::fmt(v, f),
            Value::Time(v) => fmt::Display::fmt(v, f),
            Value::Timestamp(v) => fmt::Display::fmt(v, f),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accessors() {
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::from(7i16).as_i64(), Some(7));
        assert_eq!(Value::from(1.5f32).as_f64(), Some(1.5));
        assert_eq!(Value::from(7i32).as_f64(), None);
        assert_eq!(format!("{:?}", Value::from(&b"a\x00"[..])), "b\"a\\x00\"");
    }
}
