//! Column descriptors.
//!
//! - [`SqlType`]
//! - [`XsqlVar`]
//! - [`Sqlda`]
//! - [`StatementType`]
use crate::{
    gds::{ProtocolError, blr, info},
    info::InfoReader,
    row::DecodeError,
    types::time::EPOCH,
    value::Value,
};

/// Column type, the low bit of the wire type code is the nullable flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Varying,
    Short,
    Long,
    Float,
    Double,
    DFloat,
    Timestamp,
    Blob,
    Array,
    Quad,
    Time,
    Date,
    Int64,
}

macro_rules! sql_types {
    ($($name:ident = $code:literal, $blr:expr, $zero:expr;)*) => {
        impl SqlType {
            /// Lookup type from wire type code, ignoring the nullable flag.
            pub fn from_code(code: i32) -> Option<SqlType> {
                match code & !1 {
                    $($code => Some(SqlType::$name),)*
                    _ => None,
                }
            }

            /// Wire type code, without the nullable flag.
            pub fn code(self) -> i32 {
                match self {
                    $(SqlType::$name => $code,)*
                }
            }

            /// BLR opcode.
            pub fn blr(self) -> u8 {
                match self {
                    $(SqlType::$name => $blr,)*
                }
            }

            /// Value written for a null column without value.
            pub fn zero(self) -> Value {
                match self {
                    $(SqlType::$name => $zero,)*
                }
            }
        }
    };
}

sql_types! {
    Text = 452, blr::TEXT, Value::Bytes(Default::default());
    Varying = 448, blr::VARYING, Value::Bytes(Default::default());
    Short = 500, blr::SHORT, Value::Short(0);
    Long = 496, blr::LONG, Value::Long(0);
    Float = 482, blr::FLOAT, Value::Float(0.0);
    Double = 480, blr::DOUBLE, Value::Double(0.0);
    DFloat = 530, blr::D_FLOAT, Value::Double(0.0);
    Timestamp = 510, blr::TIMESTAMP, Value::Timestamp(time::PrimitiveDateTime::new(EPOCH, time::Time::MIDNIGHT));
    Blob = 520, blr::QUAD, Value::Int64(0);
    Array = 540, blr::QUAD, Value::Int64(0);
    Quad = 550, blr::QUAD, Value::Int64(0);
    Time = 560, blr::SQL_TIME, Value::Time(time::Time::MIDNIGHT);
    Date = 570, blr::SQL_DATE, Value::Date(EPOCH);
    Int64 = 580, blr::INT64, Value::Int64(0);
}

/// Column descriptor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XsqlVar {
    /// Wire type code, the low bit is set when the column is nullable.
    pub sqltype: i32,
    pub sqlsubtype: i32,
    pub sqlscale: i32,
    /// Byte length.
    pub sqllen: i32,
    /// Current value.
    pub sqldata: Option<Value>,
    /// Null indicator, `-1` for null.
    pub sqlind: i32,
    pub sqlname: String,
    pub relname: String,
    pub ownname: String,
    pub aliasname: String,
}

impl XsqlVar {
    /// Create descriptor of given type.
    pub fn new(sql_type: SqlType, sqllen: i32) -> Self {
        Self {
            sqltype: sql_type.code(),
            sqllen,
            ..Default::default()
        }
    }

    /// Lookup the column type.
    pub fn sql_type(&self) -> Result<SqlType, DecodeError> {
        SqlType::from_code(self.sqltype).ok_or(DecodeError::UnknownType(self.sqltype))
    }

    pub fn is_nullable(&self) -> bool {
        self.sqltype & 1 == 1
    }

    pub fn is_null(&self) -> bool {
        self.sqlind == -1
    }

    /// Set value, `None` set the null indicator.
    pub fn set_value(&mut self, value: Option<Value>) {
        self.sqlind = if value.is_some() { 0 } else { -1 };
        self.sqldata = value;
    }

    pub fn set_null(&mut self) {
        self.set_value(None);
    }

    /// Column name, the alias when present.
    pub fn name(&self) -> &str {
        if self.aliasname.is_empty() { &self.sqlname } else { &self.aliasname }
    }
}

/// Ordered list of column descriptors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sqlda {
    /// Number of columns declared by the server.
    pub sqln: usize,
    vars: Vec<XsqlVar>,
}

impl Sqlda {
    /// Create descriptor list of `len` empty columns.
    pub fn new(len: usize) -> Self {
        Self { sqln: len, vars: vec![XsqlVar::default(); len] }
    }

    pub fn from_vars(vars: Vec<XsqlVar>) -> Self {
        Self { sqln: vars.len(), vars }
    }

    /// Number of columns in use.
    pub fn sqld(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn columns(&self) -> &[XsqlVar] {
        &self.vars
    }

    pub fn columns_mut(&mut self) -> &mut [XsqlVar] {
        &mut self.vars
    }

    pub fn get(&self, idx: usize) -> Option<&XsqlVar> {
        self.vars.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut XsqlVar> {
        self.vars.get_mut(idx)
    }

    /// Set column value, returns `false` when `idx` is out of bounds.
    pub fn set(&mut self, idx: usize, value: impl Into<Value>) -> bool {
        match self.vars.get_mut(idx) {
            Some(var) => {
                var.set_value(Some(value.into()));
                true
            }
            None => false,
        }
    }

    /// Set column values in order, a `None` sets the null indicator.
    pub fn bind<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = Option<Value>>,
    {
        for (var, value) in self.vars.iter_mut().zip(values) {
            var.set_value(value);
        }
    }

    /// Column names, see [`XsqlVar::name`].
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(XsqlVar::name)
    }
}

/// Statement type reported at prepare time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Ddl,
    GetSegment,
    PutSegment,
    ExecProcedure,
    StartTransaction,
    Commit,
    Rollback,
    SelectForUpdate,
    SetGenerator,
    Savepoint,
}

impl StatementType {
    pub fn from_code(code: i32) -> Option<StatementType> {
        use StatementType::*;
        Some(match code {
            1 => Select,
            2 => Insert,
            3 => Update,
            4 => Delete,
            5 => Ddl,
            6 => GetSegment,
            7 => PutSegment,
            8 => ExecProcedure,
            9 => StartTransaction,
            10 => Commit,
            11 => Rollback,
            12 => SelectForUpdate,
            13 => SetGenerator,
            14 => Savepoint,
            _ => return None,
        })
    }

    /// Whether the statement opens a cursor.
    pub fn has_cursor(self) -> bool {
        matches!(self, StatementType::Select | StatementType::SelectForUpdate)
    }
}

/// Items requested to describe the output columns.
pub(crate) const DESCRIBE_SELECT: &[u8] = &[
    info::SQL_SELECT,
    info::SQL_DESCRIBE_VARS,
    info::SQL_SQLDA_SEQ,
    info::SQL_TYPE,
    info::SQL_SUB_TYPE,
    info::SQL_SCALE,
    info::SQL_LENGTH,
    info::SQL_FIELD,
    info::SQL_RELATION,
    info::SQL_OWNER,
    info::SQL_ALIAS,
    info::SQL_DESCRIBE_END,
];

/// Items requested to describe the input parameters.
pub(crate) const DESCRIBE_BIND: &[u8] = &[
    info::SQL_BIND,
    info::SQL_DESCRIBE_VARS,
    info::SQL_SQLDA_SEQ,
    info::SQL_TYPE,
    info::SQL_SUB_TYPE,
    info::SQL_SCALE,
    info::SQL_LENGTH,
    info::SQL_FIELD,
    info::SQL_RELATION,
    info::SQL_OWNER,
    info::SQL_ALIAS,
    info::SQL_DESCRIBE_END,
];

/// Incremental parser of `op_info_sql` describe replies.
///
/// A reply cut short by `isc_info_truncated` is continued with a request built
/// by [`resume_items`][DescribeParser::resume_items], which restarts at the
/// last column fully parsed. Every continuation must complete at least one
/// more column.
#[derive(Debug, Default)]
pub(crate) struct DescribeParser {
    sqlda: Option<Sqlda>,
    stmt_type: Option<StatementType>,
    /// 1-based index of the column being parsed.
    index: usize,
    /// 1-based index of the last column fully parsed.
    last_index: usize,
    /// `last_index` when the previous reply was truncated.
    resumed_at: Option<usize>,
}

impl DescribeParser {
    /// Parse one reply, returns `true` if the reply was truncated.
    pub(crate) fn feed(&mut self, buf: &[u8]) -> Result<bool, ProtocolError> {
        let mut r = InfoReader::new(buf);
        loop {
            match r.item()? {
                info::END => return Ok(false),
                info::TRUNCATED => {
                    if self.resumed_at.is_some_and(|at| self.last_index <= at)
                        || self.last_index == 0
                    {
                        return Err(ProtocolError::info("truncated describe made no progress"));
                    }
                    self.resumed_at = Some(self.last_index);
                    return Ok(true);
                }
                info::SQL_STMT_TYPE => self.stmt_type = StatementType::from_code(r.int()?),
                info::SQL_SELECT | info::SQL_BIND => {}
                info::SQL_DESCRIBE_VARS => {
                    let n = usize::try_from(r.int()?)
                        .map_err(|_| ProtocolError::info("negative column count"))?;
                    if self.sqlda.is_none() {
                        self.sqlda = Some(Sqlda::new(n));
                    }
                }
                info::SQL_SQLDA_SEQ => {
                    let index = r.int()?;
                    let sqlda = self.sqlda.as_mut().ok_or(ProtocolError::info("column before count"))?;
                    let slot = usize::try_from(index)
                        .ok()
                        .and_then(|i| i.checked_sub(1))
                        .and_then(|i| sqlda.vars.get_mut(i))
                        .ok_or(ProtocolError::info("column sequence out of range"))?;
                    *slot = XsqlVar::default();
                    self.index = index as usize;
                }
                info::SQL_TYPE => self.current()?.sqltype = r.int()?,
                info::SQL_SUB_TYPE => self.current()?.sqlsubtype = r.int()?,
                info::SQL_SCALE => self.current()?.sqlscale = r.int()?,
                info::SQL_LENGTH => self.current()?.sqllen = r.int()?,
                info::SQL_FIELD => self.current()?.sqlname = r.string()?,
                info::SQL_RELATION => self.current()?.relname = r.string()?,
                info::SQL_OWNER => self.current()?.ownname = r.string()?,
                info::SQL_ALIAS => self.current()?.aliasname = r.string()?,
                info::SQL_DESCRIBE_END => self.last_index = self.index,
                _ => return Err(ProtocolError::info("unexpected sql info item")),
            }
        }
    }

    /// Items for the continuation request.
    pub(crate) fn resume_items(&self, items: &[u8]) -> Vec<u8> {
        let start = u16::try_from(self.last_index).unwrap_or(u16::MAX).to_le_bytes();
        let mut buf = Vec::with_capacity(4 + items.len());
        buf.extend_from_slice(&[info::SQL_SQLDA_START, 2, start[0], start[1]]);
        buf.extend_from_slice(items);
        buf
    }

    pub(crate) fn stmt_type(&self) -> Option<StatementType> {
        self.stmt_type
    }

    /// Returns the described columns, empty if the reply carried none.
    pub(crate) fn finish(self) -> Sqlda {
        self.sqlda.unwrap_or_default()
    }

    fn current(&mut self) -> Result<&mut XsqlVar, ProtocolError> {
        let idx = self.index.checked_sub(1).ok_or(ProtocolError::info("column item before sequence"))?;
        self.sqlda
            .as_mut()
            .and_then(|s| s.vars.get_mut(idx))
            .ok_or(ProtocolError::info("column item before sequence"))
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Build describe clusters for `(type, len, name)` columns starting at 1-based `from`.
    pub(crate) fn describe(total: usize, from: usize, columns: &[(i32, i32, &str)]) -> Vec<u8> {
        fn int(buf: &mut Vec<u8>, item: u8, v: i32) {
            buf.push(item);
            buf.extend_from_slice(&4u16.to_le_bytes());
            buf.extend_from_slice(&v.to_le_bytes());
        }
        fn string(buf: &mut Vec<u8>, item: u8, v: &str) {
            buf.push(item);
            buf.extend_from_slice(&(v.len() as u16).to_le_bytes());
            buf.extend_from_slice(v.as_bytes());
        }

        let mut buf = vec![info::SQL_SELECT];
        int(&mut buf, info::SQL_DESCRIBE_VARS, total as i32);
        for (i, (ty, len, name)) in columns.iter().enumerate() {
            int(&mut buf, info::SQL_SQLDA_SEQ, (from + i) as i32);
            int(&mut buf, info::SQL_TYPE, *ty);
            int(&mut buf, info::SQL_SUB_TYPE, 0);
            int(&mut buf, info::SQL_SCALE, 0);
            int(&mut buf, info::SQL_LENGTH, *len);
            string(&mut buf, info::SQL_FIELD, name);
            string(&mut buf, info::SQL_RELATION, "T");
            string(&mut buf, info::SQL_OWNER, "SYSDBA");
            string(&mut buf, info::SQL_ALIAS, name);
            buf.push(info::SQL_DESCRIBE_END);
        }
        buf
    }

    #[test]
    fn type_table() {
        assert_eq!(SqlType::from_code(453), Some(SqlType::Text));
        assert_eq!(SqlType::from_code(496), Some(SqlType::Long));
        assert_eq!(SqlType::from_code(999), None);
        assert_eq!(SqlType::Blob.blr(), blr::QUAD);
        assert_eq!(SqlType::Int64.code(), 580);
        assert!(XsqlVar { sqltype: 449, ..Default::default() }.is_nullable());
    }

    #[test]
    fn describe_in_one_reply() {
        let mut reply = vec![info::SQL_STMT_TYPE, 4, 0, 1, 0, 0, 0];
        reply.extend(describe(2, 1, &[(452, 10, "NAME"), (497, 4, "ID")]));
        reply.push(info::END);

        let mut parser = DescribeParser::default();
        assert!(!parser.feed(&reply).unwrap());
        assert_eq!(parser.stmt_type(), Some(StatementType::Select));

        let sqlda = parser.finish();
        assert_eq!(sqlda.sqld(), 2);
        assert_eq!(sqlda.columns()[0].sqllen, 10);
        assert_eq!(sqlda.columns()[1].sql_type().unwrap(), SqlType::Long);
        assert_eq!(sqlda.names().collect::<Vec<_>>(), ["NAME", "ID"]);
    }

    #[test]
    fn truncated_reply_resumes_at_last_parsed() {
        let mut first = describe(3, 1, &[(452, 10, "A"), (496, 4, "B")]);
        // third column cut short
        first.extend_from_slice(&[info::SQL_SQLDA_SEQ, 4, 0, 3, 0, 0, 0, info::TRUNCATED]);

        let mut parser = DescribeParser::default();
        assert!(parser.feed(&first).unwrap());
        let items = parser.resume_items(DESCRIBE_SELECT);
        assert_eq!(&items[..4], &[info::SQL_SQLDA_START, 2, 2, 0]);
        assert_eq!(&items[4..], DESCRIBE_SELECT);

        let mut second = describe(3, 2, &[(496, 4, "B"), (580, 8, "C")]);
        second.push(info::END);
        assert!(!parser.feed(&second).unwrap());

        let sqlda = parser.finish();
        assert_eq!(sqlda.sqld(), 3);
        assert_eq!(sqlda.columns()[2].sql_type().unwrap(), SqlType::Int64);
        assert_eq!(sqlda.columns()[1].sqlname, "B");
    }

    #[test]
    fn truncation_without_progress_fails() {
        let mut first = describe(2, 1, &[(452, 10, "A")]);
        first.push(info::TRUNCATED);

        let mut parser = DescribeParser::default();
        assert!(parser.feed(&first).unwrap());
        assert!(parser.feed(&first).is_err());

        let mut parser = DescribeParser::default();
        assert!(parser.feed(&[info::SQL_SELECT, info::TRUNCATED]).is_err());
    }

    #[test]
    fn unknown_item_fails() {
        let mut parser = DescribeParser::default();
        assert!(parser.feed(&[info::SQL_SELECT, 99]).is_err());
    }
}
