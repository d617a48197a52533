//! Status vector.
//!
//! A status vector is a sequence of `(kind, argument)` pairs terminated by
//! [`isc::ARG_END`]. The first entry of a chain is a status code, followed by
//! arguments used to format the message.
use std::fmt;

use super::isc;
use crate::{net::TransportError, stream::GdsStream};

/// One status vector argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusArg {
    /// Error status code.
    Gds(i32),
    /// String argument.
    String(String),
    /// Preformatted message.
    Interpreted(String),
    /// Five character SQLSTATE.
    SqlState(String),
    /// Numeric argument.
    Number(i32),
    /// Warning status code.
    Warning(i32),
    /// Argument of a kind this client does not interpret.
    Other { kind: i32, value: i32 },
}

impl fmt::Display for StatusArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusArg::Gds(code) | StatusArg::Warning(code) => write!(f, "{code}"),
            StatusArg::String(s) | StatusArg::Interpreted(s) => f.write_str(s),
            StatusArg::SqlState(s) => write!(f, "SQLSTATE {s}"),
            StatusArg::Number(n) => write!(f, "{n}"),
            StatusArg::Other { kind, value } => write!(f, "{kind}:{value}"),
        }
    }
}

/// Decoded status vector, either an error or a warning chain.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Diagnostic {
    entries: Vec<StatusArg>,
}

impl Diagnostic {
    pub fn new(entries: Vec<StatusArg>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[StatusArg] {
        &self.entries
    }

    /// Returns `true` if the server reported success.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the chain is warning only.
    ///
    /// An error chain may carry trailing warnings, it is still an error.
    pub fn is_warning(&self) -> bool {
        matches!(self.entries.first(), Some(StatusArg::Warning(_)))
    }

    /// First status code of the chain.
    pub fn code(&self) -> Option<i32> {
        self.entries.iter().find_map(|e| match e {
            StatusArg::Gds(code) | StatusArg::Warning(code) => Some(*code),
            _ => None,
        })
    }

    /// SQLSTATE, if the server sent one.
    pub fn sql_state(&self) -> Option<&str> {
        self.entries.iter().find_map(|e| match e {
            StatusArg::SqlState(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Returns `true` if the chain contains `code`.
    pub fn contains(&self, code: i32) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, StatusArg::Gds(c) | StatusArg::Warning(c) if *c == code))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.is_warning() {
            true => f.write_str("database warning:")?,
            false => f.write_str("database error:")?,
        }
        for entry in &self.entries {
            write!(f, " {entry}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

/// Read a status vector.
///
/// Zero status codes and zero unknown arguments are skipped. Numeric
/// arguments are always kept.
pub(crate) async fn read(stream: &mut GdsStream) -> Result<Diagnostic, TransportError> {
    let mut entries = vec![];
    loop {
        let kind = stream.read_i32().await?;
        match kind {
            isc::ARG_END => break,
            isc::ARG_GDS => {
                let code = stream.read_i32().await?;
                if code != 0 {
                    entries.push(StatusArg::Gds(code));
                }
            }
            isc::ARG_STRING => entries.push(StatusArg::String(stream.read_string().await?)),
            isc::ARG_INTERPRETED => entries.push(StatusArg::Interpreted(stream.read_string().await?)),
            isc::ARG_SQL_STATE => entries.push(StatusArg::SqlState(stream.read_string().await?)),
            isc::ARG_NUMBER => entries.push(StatusArg::Number(stream.read_i32().await?)),
            isc::ARG_WARNING => {
                let code = stream.read_i32().await?;
                if code != 0 {
                    entries.push(StatusArg::Warning(code));
                }
            }
            kind => {
                let value = stream.read_i32().await?;
                if value != 0 {
                    entries.push(StatusArg::Other { kind, value });
                }
            }
        }
    }
    Ok(Diagnostic { entries })
}
