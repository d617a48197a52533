//! Row operation.
//!
//! - [`Row`]
//! - [`FromRow`]
//! - [`Decode`]
//!
//! - [`Index`]
//! - [`DecodeError`]
use bytes::Bytes;
use std::{borrow::Cow, fmt, string::FromUtf8Error, sync::Arc};
use time::{Date, PrimitiveDateTime, Time};

use crate::{gds::isc, value::Value};

/// A fetched row.
#[derive(Clone, PartialEq)]
pub struct Row {
    names: Arc<[String]>,
    values: Vec<Option<Value>>,
}

impl Row {
    pub(crate) fn new(names: Arc<[String]>, values: Vec<Option<Value>>) -> Self {
        Self { names, values }
    }

    /// Returns `true` if row contains no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns column value, [`None`] for out of bounds.
    pub fn get(&self, idx: usize) -> Option<&Option<Value>> {
        self.values.get(idx)
    }

    /// Returns column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns all column values.
    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Option<Value>> {
        self.values
    }

    /// Try get and decode column.
    pub fn try_get<I: Index, R: Decode>(&self, idx: I) -> Result<R, DecodeError> {
        let nth = idx.position(&self.names, self.values.len())?;
        R::decode(self.values[nth].clone())
    }

    /// Try decode type using [`FromRow`] implementation.
    pub fn decode<D: FromRow>(self) -> Result<D, DecodeError> {
        D::from_row(self)
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_map();
        for (i, value) in self.values.iter().enumerate() {
            let key = self.names.get(i).map(String::as_str).unwrap_or("?");
            match value {
                Some(value) => dbg.entry(&key, value),
                None => dbg.entry(&key, &format_args!("NULL")),
            };
        }
        dbg.finish()
    }
}

// ===== Traits =====

/// Type that can be constructed from a row.
pub trait FromRow: Sized {
    /// Construct self from row.
    fn from_row(row: Row) -> Result<Self, DecodeError>;
}

impl FromRow for Row {
    fn from_row(row: Row) -> Result<Self, DecodeError> {
        Ok(row)
    }
}

impl FromRow for () {
    fn from_row(_: Row) -> Result<Self, DecodeError> {
        Ok(())
    }
}

macro_rules! from_row_tuple {
    ($($t:ident $i:literal),*) => {
        impl<$($t),*> FromRow for ($($t),*,)
        where
            $($t: Decode),*
        {
            fn from_row(row: Row) -> Result<Self, DecodeError> {
                Ok((
                    $(row.try_get($i)?),*,
                ))
            }
        }
    };
}

from_row_tuple!(T0 0);
from_row_tuple!(T0 0, T1 1);
from_row_tuple!(T0 0, T1 1, T2 2);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3, T4 4);

/// A type that can be constructed from a column value.
pub trait Decode: Sized {
    /// Try decode self from column value, [`None`] is `NULL`.
    fn decode(value: Option<Value>) -> Result<Self, DecodeError>;
}

impl Decode for Value {
    fn decode(value: Option<Value>) -> Result<Self, DecodeError> {
        value.ok_or(DecodeError::Null)
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(value: Option<Value>) -> Result<Self, DecodeError> {
        match value {
            None => Ok(None),
            value => T::decode(value).map(Some),
        }
    }
}

macro_rules! decode {
    ($ty:ty, $name:literal, |$v:ident| $body:expr) => {
        impl Decode for $ty {
            fn decode(value: Option<Value>) -> Result<Self, DecodeError> {
                let $v = value.ok_or(DecodeError::Null)?;
                let found = $v.kind();
                let result: Option<$ty> = $body;
                result.ok_or(DecodeError::Mismatch { expect: $name, found })
            }
        }
    };
}

decode!(i16, "short", |v| v.as_i64().and_then(|v| v.try_into().ok()));
decode!(i32, "long", |v| v.as_i64().and_then(|v| v.try_into().ok()));
decode!(i64, "int64", |v| v.as_i64());
decode!(f32, "float", |v| match v {
    Value::Float(f) => Some(f),
    _ => None,
});
decode!(f64, "double", |v| v.as_f64());
decode!(Bytes, "bytes", |v| match v {
    Value::Bytes(b) => Some(b),
    _ => None,
});
decode!(Vec<u8>, "bytes", |v| match v {
    Value::Bytes(b) => Some(b.into()),
    _ => None,
});
decode!(Date, "date", |v| match v {
    Value::Date(d) => Some(d),
    Value::Timestamp(ts) => Some(ts.date()),
    _ => None,
});
decode!(Time, "time", |v| match v {
    Value::Time(t) => Some(t),
    _ => None,
});
decode!(PrimitiveDateTime, "timestamp", |v| match v {
    Value::Timestamp(ts) => Some(ts),
    _ => None,
});

impl Decode for String {
    fn decode(value: Option<Value>) -> Result<Self, DecodeError> {
        let bytes = Vec::<u8>::decode(value)?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// Type that can be used for indexing column.
pub trait Index: Sized + sealed::Sealed {
    /// Returns the nth column.
    fn position(self, names: &[String], len: usize) -> Result<usize, DecodeError>;
}

impl Index for usize {
    fn position(self, _: &[String], len: usize) -> Result<usize, DecodeError> {
        match self < len {
            true => Ok(self),
            false => Err(DecodeError::IndexOutOfBounds(self)),
        }
    }
}

impl Index for &str {
    fn position(self, names: &[String], len: usize) -> Result<usize, DecodeError> {
        names
            .iter()
            .take(len)
            .position(|name| name.eq_ignore_ascii_case(self))
            .ok_or_else(|| DecodeError::ColumnNotFound(String::from(self).into()))
    }
}

mod sealed {
    pub trait Sealed { }
    impl Sealed for usize { }
    impl Sealed for &str { }
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for DecodeError {
            fn from($pat: $ty) -> Self {
                $body
            }
        }
    };
}

/// An error when encoding or decoding column value.
pub enum DecodeError {
    /// Text is not utf8.
    Utf8(FromUtf8Error),
    /// Column requested not found.
    ColumnNotFound(Cow<'static, str>),
    /// Index requested is out of bounds.
    IndexOutOfBounds(usize),
    /// Value is null.
    Null,
    /// Value does not match the requested or declared type.
    Mismatch {
        expect: &'static str,
        found: &'static str,
    },
    /// Wire type code is not known.
    UnknownType(i32),
    /// Null indicator is neither `0` nor `-1`.
    NullIndicator(i32),
    /// Input column is not null but carries no value.
    MissingValue(usize),
    /// Value is longer than the column.
    Oversize {
        len: usize,
        max: usize,
    },
    /// Day number is not a representable date.
    InvalidDate(i32),
    /// Time of day out of range.
    InvalidTime(i32),
    /// Parameter buffer value longer than its one byte length prefix.
    ParameterTooLong {
        tag: u8,
        len: usize,
    },
}

impl DecodeError {
    /// The matching status code.
    pub fn code(&self) -> i32 {
        match self {
            Self::MissingValue(_) => isc::DSQL_SQLDA_VALUE_ERR,
            _ => isc::DSQL_SQLDA_ERR,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to decode value, ")?;
        match self {
            Self::Utf8(e) => write!(f, "{e}"),
            Self::ColumnNotFound(name) => write!(f, "column not found: {name:?}"),
            Self::IndexOutOfBounds(u) => write!(f, "index out of bounds: {u:?}"),
            Self::Null => write!(f, "unexpected NULL value"),
            Self::Mismatch { expect, found } => write!(f, "expected {expect} found {found}"),
            Self::UnknownType(t) => write!(f, "unknown sql data type: {t}"),
            Self::NullIndicator(i) => write!(f, "invalid sqlind value: {i}"),
            Self::MissingValue(i) => write!(f, "column {i} is not null but has no value"),
            Self::Oversize { len, max } => write!(f, "value of {len} bytes exceeds column length {max}"),
            Self::InvalidDate(d) => write!(f, "invalid date: {d}"),
            Self::InvalidTime(t) => write!(f, "invalid time: {t}"),
            Self::ParameterTooLong { tag, len } => {
                write!(f, "parameter {tag} of {len} bytes exceeds {} bytes", u8::MAX)
            }
        }
    }
}

from!(<FromUtf8Error>e => Self::Utf8(e));

impl std::error::Error for DecodeError { }

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn row() -> Row {
        Row::new(
            vec!["ID".into(), "NAME".into(), "NOTE".into()].into(),
            vec![Some(Value::Long(7)), Some(Value::from("abc")), None],
        )
    }

    #[test]
    fn get_by_index_and_name() {
        let row = row();
        assert_eq!(row.try_get::<_, i32>(0).unwrap(), 7);
        assert_eq!(row.try_get::<_, i64>("id").unwrap(), 7);
        assert_eq!(row.try_get::<_, String>("NAME").unwrap(), "abc");
        assert_eq!(row.try_get::<_, Option<String>>(2).unwrap(), None);
        assert!(matches!(row.try_get::<_, String>(2), Err(DecodeError::Null)));
        assert!(matches!(row.try_get::<_, i32>(3), Err(DecodeError::IndexOutOfBounds(3))));
        assert!(matches!(row.try_get::<_, i32>("X"), Err(DecodeError::ColumnNotFound(_))));
        assert!(matches!(row.try_get::<_, i32>(1), Err(DecodeError::Mismatch { .. })));
    }

    #[test]
    fn tuples() {
        let (id, name, note) = row().decode::<(i16, String, Option<i32>)>().unwrap();
        assert_eq!((id, name.as_str(), note), (7, "abc", None));
    }
}
