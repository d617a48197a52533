//! Message descriptor in binary language representation.
//!
//! ```text
//! version5 begin message 0 <count:u16le>
//!   <column type> [<length:u16le> | <scale:i8>]
//!   short 0                                      null indicator
//!   ...
//! end eoc
//! ```
use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    gds::blr,
    row::DecodeError,
    sqlda::{SqlType, XsqlVar},
};

/// Message descriptor of a column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blr {
    columns: Vec<Column>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Column {
    sql_type: SqlType,
    len: u16,
    scale: i8,
}

impl Blr {
    /// Describe columns, fails on unknown column type.
    pub fn new(vars: &[XsqlVar]) -> Result<Self, DecodeError> {
        let columns = vars
            .iter()
            .map(|var| -> Result<Column, DecodeError> {
                Ok(Column {
                    sql_type: var.sql_type()?,
                    len: var.sqllen as u16,
                    scale: var.sqlscale as i8,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { columns })
    }

    /// Encoded length.
    pub fn len(&self) -> usize {
        // header, count, end
        let fixed = 4 + 2 + 2;
        let columns: usize = self
            .columns
            .iter()
            .map(|c| {
                let operand = match c.sql_type {
                    SqlType::Text | SqlType::Varying => 3,
                    SqlType::Short
                    | SqlType::Long
                    | SqlType::Int64
                    | SqlType::Quad
                    | SqlType::Blob
                    | SqlType::Array => 2,
                    _ => 1,
                };
                // null indicator
                operand + 2
            })
            .sum();
        fixed + columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn encode(&self, mut buf: impl BufMut) {
        let par_count = (self.columns.len() * 2) as u16;
        buf.put_slice(&[blr::VERSION5, blr::BEGIN, blr::MESSAGE, 0]);
        buf.put_u16_le(par_count);

        for c in &self.columns {
            buf.put_u8(c.sql_type.blr());
            match c.sql_type {
                SqlType::Text | SqlType::Varying => buf.put_u16_le(c.len),
                SqlType::Blob | SqlType::Array => buf.put_u8(0),
                SqlType::Short | SqlType::Long | SqlType::Int64 | SqlType::Quad => {
                    buf.put_i8(c.scale)
                }
                _ => {}
            }
            buf.put_slice(&[blr::SHORT, 0]);
        }

        buf.put_slice(&[blr::END, blr::EOC]);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.len());
        self.encode(&mut buf);
        buf.freeze()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn length_matches_encoding() {
        let vars = [XsqlVar::new(SqlType::Text, 10), XsqlVar::new(SqlType::Long, 4)];
        let blr = Blr::new(&vars).unwrap();
        assert_eq!(blr.to_bytes().len(), blr.len());
    }

    #[test]
    fn every_type_matches_length() {
        use SqlType::*;
        let vars: Vec<_> = [
            Text, Varying, Short, Long, Float, Double, DFloat, Timestamp, Blob, Array, Quad, Time,
            Date, Int64,
        ]
        .into_iter()
        .map(|t| XsqlVar::new(t, 8))
        .collect();
        let blr = Blr::new(&vars).unwrap();
        assert_eq!(blr.to_bytes().len(), blr.len());
    }

    #[test]
    fn layout() {
        let mut scaled = XsqlVar::new(SqlType::Int64, 8);
        scaled.sqlscale = -2;
        let vars = [XsqlVar::new(SqlType::Varying, 300), scaled, XsqlVar::new(SqlType::Blob, 8)];
        let bytes = Blr::new(&vars).unwrap().to_bytes();
        assert_eq!(
            &bytes[..],
            &[
                5, 2, 4, 0, 6, 0,
                37, 0x2c, 0x01, 7, 0,
                16, 0xfe, 7, 0,
                9, 0, 7, 0,
                255, 76,
            ]
        );
    }

    #[test]
    fn unknown_type_fails() {
        let vars = [XsqlVar { sqltype: 1, ..Default::default() }];
        assert!(matches!(Blr::new(&vars), Err(DecodeError::UnknownType(1))));
    }
}
