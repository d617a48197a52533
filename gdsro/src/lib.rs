//! Firebird GDS Wire Protocol Engine
//!
//! Client side of the Firebird remote protocol: attachments, transactions,
//! statements with cursors, and blobs, over one socket per attachment.
//!
//! # Examples
//!
//! Query:
//!
//! ```no_run
//! use gdsro::{Attachment, Config};
//!
//! # async fn app() -> gdsro::Result<()> {
//! let db = Attachment::open(&Config::from_env()).await?;
//!
//! let mut tx = db.begin().await?;
//! let mut stmt = db.statement().await?;
//!
//! stmt.prepare(&tx, "select rdb$relation_name from rdb$relations").await?;
//! stmt.execute(&tx, None).await?;
//!
//! while let Some(row) = stmt.fetch().await? {
//!     let name: String = row.try_get(0)?;
//!     println!("{}", name.trim_end());
//! }
//!
//! stmt.close().await?;
//! tx.commit().await?;
//! db.detach().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Parameters:
//!
//! ```no_run
//! use gdsro::{Attachment, Sqlda};
//!
//! # async fn app(db: Attachment) -> gdsro::Result<()> {
//! let mut tx = db.begin().await?;
//! let mut stmt = db.statement().await?;
//!
//! stmt.prepare(&tx, "insert into post(id, name) values(?, ?)").await?;
//!
//! let mut input: Sqlda = stmt.describe_bind().await?;
//! input.set(0, 420);
//! input.set(1, "Foo");
//! stmt.execute(&tx, Some(&input)).await?;
//!
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```
mod common;
mod net;
mod ext;

// Protocol
pub mod xdr;
pub mod gds;
pub mod stream;

// Encoding
mod value;
pub mod types;
pub mod info;
pub mod clumplet;
pub mod sqlda;
pub mod blr;
pub mod marshal;
pub mod row;

// Operation
mod transport;
pub mod attachment;
pub mod transaction;
pub mod statement;
pub mod fetch;
pub mod blob;

// Connection
pub mod connection;

mod error;

pub use value::Value;
pub use clumplet::Clumplet;
pub use sqlda::{Sqlda, XsqlVar, SqlType, StatementType};
pub use row::{Row, FromRow, Decode, DecodeError};

pub use attachment::Attachment;
pub use transaction::{Transaction, TransactionState};
pub use statement::{Statement, FreeOption};
pub use fetch::Rows;
pub use blob::Blob;
pub use connection::{Config, ParseError};
pub use error::{Error, ErrorKind, StateError, Result};
