//! Row encoding.
//!
//! Every column value is followed by its null indicator, `0` for a value and
//! `-1` for null. A null column without value is sent as the zero value of its
//! type.
use bytes::{BufMut, Bytes};

use crate::{
    Result,
    row::DecodeError,
    sqlda::{SqlType, XsqlVar},
    stream::GdsStream,
    types::time,
    value::Value,
    xdr::{self, XdrBufMut},
};

/// Column value in its wire representation.
#[derive(Debug, Clone, PartialEq)]
enum Wire {
    Opaque(Bytes, usize),
    Varying(Bytes),
    Short(i16),
    Long(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Timestamp(i32, i32),
}

impl Wire {
    fn size(&self) -> usize {
        match self {
            Wire::Opaque(_, len) => xdr::opaque_size(*len),
            Wire::Varying(b) => xdr::buffer_size(b.len()),
            Wire::Short(_) | Wire::Long(_) | Wire::Float(_) => 4,
            Wire::Int64(_) | Wire::Double(_) | Wire::Timestamp(..) => 8,
        }
    }

    fn encode(&self, mut buf: impl BufMut) {
        match self {
            Wire::Opaque(b, len) => buf.put_opaque(b, *len),
            Wire::Varying(b) => buf.put_buffer(b),
            Wire::Short(v) => buf.put_xdr_i16(*v),
            Wire::Long(v) => buf.put_i32(*v),
            Wire::Int64(v) => buf.put_i64(*v),
            Wire::Float(v) => buf.put_f32(*v),
            Wire::Double(v) => buf.put_f64(*v),
            Wire::Timestamp(d, t) => {
                buf.put_i32(*d);
                buf.put_i32(*t);
            }
        }
    }
}

/// Validated input row, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    columns: Vec<(Wire, i32)>,
}

impl EncodedRow {
    /// Validate and convert column values.
    ///
    /// A column that is not null must carry a value. A null column without
    /// value is back-filled with the zero value of its type.
    pub fn new(vars: &[XsqlVar]) -> Result<Self, DecodeError> {
        let mut columns = Vec::with_capacity(vars.len());
        for (i, var) in vars.iter().enumerate() {
            let sql_type = var.sql_type()?;
            let value = match (&var.sqldata, var.is_null()) {
                (Some(value), _) => value.clone(),
                (None, true) => sql_type.zero(),
                (None, false) => return Err(DecodeError::MissingValue(i)),
            };
            let ind = if var.is_null() { -1 } else { 0 };
            columns.push((to_wire(sql_type, var.sqllen, value)?, ind));
        }
        Ok(Self { columns })
    }

    pub fn size(&self) -> usize {
        self.columns.iter().map(|(w, _)| w.size() + 4).sum()
    }

    pub fn encode(&self, mut buf: impl BufMut) {
        for (wire, ind) in &self.columns {
            wire.encode(&mut buf);
            buf.put_i32(*ind);
        }
    }
}

fn mismatch(expect: SqlType, value: &Value) -> DecodeError {
    DecodeError::Mismatch {
        expect: sql_type_name(expect),
        found: value.kind(),
    }
}

fn sql_type_name(t: SqlType) -> &'static str {
    match t {
        SqlType::Text => "text",
        SqlType::Varying => "varying",
        SqlType::Short => "short",
        SqlType::Long => "long",
        SqlType::Float => "float",
        SqlType::Double => "double",
        SqlType::DFloat => "d_float",
        SqlType::Timestamp => "timestamp",
        SqlType::Blob => "blob",
        SqlType::Array => "array",
        SqlType::Quad => "quad",
        SqlType::Time => "time",
        SqlType::Date => "date",
        SqlType::Int64 => "int64",
    }
}

fn to_wire(sql_type: SqlType, sqllen: i32, value: Value) -> Result<Wire, DecodeError> {
    let max = usize::try_from(sqllen).unwrap_or(0);
    let wire = match (sql_type, value) {
        (SqlType::Text, Value::Bytes(b)) => {
            if b.len() > max {
                return Err(DecodeError::Oversize { len: b.len(), max });
            }
            Wire::Opaque(b, max)
        }
        (SqlType::Varying, Value::Bytes(b)) => {
            if b.len() > max {
                return Err(DecodeError::Oversize { len: b.len(), max });
            }
            Wire::Varying(b)
        }
        (SqlType::Short, v) => {
            let n = v.as_i64().and_then(|n| i16::try_from(n).ok());
            Wire::Short(n.ok_or_else(|| mismatch(sql_type, &v))?)
        }
        (SqlType::Long, v) => {
            let n = v.as_i64().and_then(|n| i32::try_from(n).ok());
            Wire::Long(n.ok_or_else(|| mismatch(sql_type, &v))?)
        }
        (SqlType::Int64 | SqlType::Quad | SqlType::Blob | SqlType::Array, v) => {
            Wire::Int64(v.as_i64().ok_or_else(|| mismatch(sql_type, &v))?)
        }
        (SqlType::Float, v) => {
            let n = v.as_f64().map(|n| n as f32);
            Wire::Float(n.ok_or_else(|| mismatch(sql_type, &v))?)
        }
        (SqlType::Double | SqlType::DFloat, v) => {
            Wire::Double(v.as_f64().ok_or_else(|| mismatch(sql_type, &v))?)
        }
        (SqlType::Timestamp, Value::Timestamp(ts)) => {
            let (d, t) = time::encode_timestamp(ts);
            Wire::Timestamp(d, t)
        }
        (SqlType::Timestamp, Value::Date(d)) => Wire::Timestamp(time::encode_date(d), 0),
        (SqlType::Date, Value::Date(d)) => Wire::Long(time::encode_date(d)),
        (SqlType::Date, Value::Timestamp(ts)) => Wire::Long(time::encode_date(ts.date())),
        (SqlType::Time, Value::Time(t)) => Wire::Long(time::encode_time(t)),
        (SqlType::Time, Value::Timestamp(ts)) => Wire::Long(time::encode_time(ts.time())),
        (sql_type, v) => return Err(mismatch(sql_type, &v)),
    };
    Ok(wire)
}

/// Read one row, values are decoded according to `vars` types.
pub(crate) async fn read_row(stream: &mut GdsStream, vars: &[XsqlVar]) -> Result<Vec<Option<Value>>> {
    let mut row = Vec::with_capacity(vars.len());
    for var in vars {
        let value = match var.sql_type()? {
            SqlType::Text => {
                let len = var.sqllen.max(0) as usize;
                Value::Bytes(stream.read_opaque(len).await?)
            }
            SqlType::Varying => Value::Bytes(stream.read_buffer().await?),
            SqlType::Short => Value::Short(stream.read_i16().await?),
            SqlType::Long => Value::Long(stream.read_i32().await?),
            SqlType::Float => Value::Float(stream.read_f32().await?),
            SqlType::Double | SqlType::DFloat => Value::Double(stream.read_f64().await?),
            SqlType::Timestamp => {
                let date = stream.read_i32().await?;
                let tm = stream.read_i32().await?;
                Value::Timestamp(time::decode_timestamp(date, tm)?)
            }
            SqlType::Time => Value::Time(time::decode_time(stream.read_i32().await?)?),
            SqlType::Date => Value::Date(time::decode_date(stream.read_i32().await?)?),
            SqlType::Blob | SqlType::Array | SqlType::Quad | SqlType::Int64 => {
                Value::Int64(stream.read_i64().await?)
            }
        };

        match stream.read_i32().await? {
            0 => row.push(Some(value)),
            -1 => row.push(None),
            ind => return Err(DecodeError::NullIndicator(ind).into()),
        }
    }
    crate::common::verbose!(columns = row.len(), "decoded row");
    Ok(row)
}

#[cfg(test)]
mod test {
    use ::time::macros::{date, datetime, time};
    use bytes::BytesMut;
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::net::Socket;

    fn var(sql_type: SqlType, len: i32, value: Option<Value>) -> XsqlVar {
        let mut var = XsqlVar::new(sql_type, len);
        var.set_value(value);
        var
    }

    #[test]
    fn encodes_each_type() {
        let vars = [
            var(SqlType::Text, 5, Some("ab".into())),
            var(SqlType::Varying, 8, Some("abc".into())),
            var(SqlType::Short, 2, Some(Value::Long(-2))),
            var(SqlType::Timestamp, 8, Some(datetime!(2000-01-01 0:00:01).into())),
        ];
        let row = EncodedRow::new(&vars).unwrap();
        let mut buf = BytesMut::new();
        row.encode(&mut buf);
        assert_eq!(buf.len(), row.size());

        let mut expect = BytesMut::new();
        expect.put_slice(b"ab   \0\0\0");
        expect.put_i32(0);
        expect.put_slice(&[0, 0, 0, 3, b'a', b'b', b'c', 0]);
        expect.put_i32(0);
        expect.put_i32(-2);
        expect.put_i32(0);
        expect.put_i32(51544);
        expect.put_i32(10_000);
        expect.put_i32(0);
        assert_eq!(buf, expect);
    }

    #[test]
    fn null_is_back_filled() {
        let vars = [var(SqlType::Long, 4, None), var(SqlType::Date, 4, None)];
        let row = EncodedRow::new(&vars).unwrap();
        let mut buf = BytesMut::new();
        row.encode(&mut buf);
        assert_eq!(&buf[..], &[0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn invalid_inputs() {
        let mut missing = XsqlVar::new(SqlType::Long, 4);
        missing.sqlind = 0;
        let err = EncodedRow::new(&[missing]).unwrap_err();
        assert_eq!(err.code(), crate::gds::isc::DSQL_SQLDA_VALUE_ERR);

        let long = var(SqlType::Varying, 2, Some("abc".into()));
        assert!(matches!(EncodedRow::new(&[long]), Err(DecodeError::Oversize { len: 3, max: 2 })));

        let overflow = var(SqlType::Short, 2, Some(Value::Long(70_000)));
        assert!(matches!(EncodedRow::new(&[overflow]), Err(DecodeError::Mismatch { .. })));

        let wrong = var(SqlType::Date, 4, Some(Value::Long(1)));
        assert!(matches!(EncodedRow::new(&[wrong]), Err(DecodeError::Mismatch { .. })));
    }

    #[tokio::test]
    async fn reads_row_with_nulls() {
        let (client, mut server) = tokio::io::duplex(1024);
        let mut stream = GdsStream::new(Socket::duplex(client));

        let mut reply = BytesMut::new();
        reply.put_opaque(b"xy", 3);
        reply.put_i32(0);
        reply.put_string("hello");
        reply.put_i32(0);
        reply.put_i64(0);
        reply.put_i32(-1);
        reply.put_i32(51544);
        reply.put_i32(36_005_000);
        reply.put_i32(0);
        server.write_all(&reply).await.unwrap();

        let vars = [
            XsqlVar::new(SqlType::Text, 3),
            XsqlVar::new(SqlType::Varying, 10),
            XsqlVar::new(SqlType::Blob, 8),
            XsqlVar::new(SqlType::Timestamp, 8),
        ];
        let row = read_row(&mut stream, &vars).await.unwrap();
        assert_eq!(row[0], Some(Value::from("xy ")));
        assert_eq!(row[1], Some(Value::from("hello")));
        assert_eq!(row[2], None);
        assert_eq!(
            row[3],
            Some(Value::Timestamp(::time::PrimitiveDateTime::new(date!(2000-01-01), time!(1:00:00.5))))
        );
    }

    #[tokio::test]
    async fn bad_null_indicator() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut stream = GdsStream::new(Socket::duplex(client));
        server.write_all(&[0, 0, 0, 1, 0, 0, 0, 5]).await.unwrap();

        let err = read_row(&mut stream, &[XsqlVar::new(SqlType::Long, 4)]).await.unwrap_err();
        assert_eq!(err.code(), crate::gds::isc::DSQL_SQLDA_ERR);
    }
}
