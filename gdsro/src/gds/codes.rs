//! Protocol constants.

/// Operation codes.
pub mod op {
    pub const CONNECT: i32 = 1;
    pub const ACCEPT: i32 = 3;
    pub const REJECT: i32 = 4;
    pub const RESPONSE: i32 = 9;
    pub const ATTACH: i32 = 19;
    pub const CREATE: i32 = 20;
    pub const DETACH: i32 = 21;
    pub const TRANSACTION: i32 = 29;
    pub const COMMIT: i32 = 30;
    pub const ROLLBACK: i32 = 31;
    pub const PREPARE: i32 = 32;
    pub const CREATE_BLOB: i32 = 34;
    pub const OPEN_BLOB: i32 = 35;
    pub const GET_SEGMENT: i32 = 36;
    pub const PUT_SEGMENT: i32 = 37;
    pub const CANCEL_BLOB: i32 = 38;
    pub const CLOSE_BLOB: i32 = 39;
    pub const INFO_DATABASE: i32 = 40;
    pub const BATCH_SEGMENTS: i32 = 44;
    pub const COMMIT_RETAINING: i32 = 50;
    pub const PREPARE2: i32 = 51;
    pub const OPEN_BLOB2: i32 = 56;
    pub const CREATE_BLOB2: i32 = 57;
    pub const ALLOCATE_STATEMENT: i32 = 62;
    pub const EXECUTE: i32 = 63;
    pub const EXEC_IMMEDIATE: i32 = 64;
    pub const FETCH: i32 = 65;
    pub const FETCH_RESPONSE: i32 = 66;
    pub const FREE_STATEMENT: i32 = 67;
    pub const PREPARE_STATEMENT: i32 = 68;
    pub const SET_CURSOR: i32 = 69;
    pub const INFO_SQL: i32 = 70;
    pub const DUMMY: i32 = 71;
    pub const EXEC_IMMEDIATE2: i32 = 75;
    pub const EXECUTE2: i32 = 76;
    pub const SQL_RESPONSE: i32 = 78;
    pub const DROP_DATABASE: i32 = 81;
    pub const ROLLBACK_RETAINING: i32 = 86;

    /// Get operation name from operation code.
    ///
    /// Returns `"unknown"` for unknown operation code.
    pub fn name(op: i32) -> &'static str {
        match op {
            CONNECT => "op_connect",
            ACCEPT => "op_accept",
            REJECT => "op_reject",
            RESPONSE => "op_response",
            ATTACH => "op_attach",
            CREATE => "op_create",
            DETACH => "op_detach",
            TRANSACTION => "op_transaction",
            COMMIT => "op_commit",
            ROLLBACK => "op_rollback",
            PREPARE => "op_prepare",
            CREATE_BLOB => "op_create_blob",
            OPEN_BLOB => "op_open_blob",
            GET_SEGMENT => "op_get_segment",
            PUT_SEGMENT => "op_put_segment",
            CANCEL_BLOB => "op_cancel_blob",
            CLOSE_BLOB => "op_close_blob",
            INFO_DATABASE => "op_info_database",
            BATCH_SEGMENTS => "op_batch_segments",
            COMMIT_RETAINING => "op_commit_retaining",
            PREPARE2 => "op_prepare2",
            OPEN_BLOB2 => "op_open_blob2",
            CREATE_BLOB2 => "op_create_blob2",
            ALLOCATE_STATEMENT => "op_allocate_statement",
            EXECUTE => "op_execute",
            EXEC_IMMEDIATE => "op_exec_immediate",
            FETCH => "op_fetch",
            FETCH_RESPONSE => "op_fetch_response",
            FREE_STATEMENT => "op_free_statement",
            PREPARE_STATEMENT => "op_prepare_statement",
            SET_CURSOR => "op_set_cursor",
            INFO_SQL => "op_info_sql",
            DUMMY => "op_dummy",
            EXEC_IMMEDIATE2 => "op_exec_immediate2",
            EXECUTE2 => "op_execute2",
            SQL_RESPONSE => "op_sql_response",
            DROP_DATABASE => "op_drop_database",
            ROLLBACK_RETAINING => "op_rollback_retaining",
            _ => "unknown",
        }
    }
}

/// Status vector argument kinds and status codes.
pub mod isc {
    pub const ARG_END: i32 = 0;
    pub const ARG_GDS: i32 = 1;
    pub const ARG_STRING: i32 = 2;
    pub const ARG_CSTRING: i32 = 3;
    pub const ARG_NUMBER: i32 = 4;
    pub const ARG_INTERPRETED: i32 = 5;
    pub const ARG_WARNING: i32 = 18;
    pub const ARG_SQL_STATE: i32 = 19;

    pub const BAD_DB_FORMAT: i32 = 335544323;
    pub const BAD_DB_HANDLE: i32 = 335544324;
    pub const BAD_REQ_HANDLE: i32 = 335544327;
    pub const BAD_SEGSTR_HANDLE: i32 = 335544328;
    pub const BAD_TRANS_HANDLE: i32 = 335544332;
    pub const OPEN_TRANS: i32 = 335544357;
    pub const SEGMENT: i32 = 335544366;
    pub const SEGSTR_EOF: i32 = 335544367;
    pub const CONNECT_REJECT: i32 = 335544421;
    pub const TRA_STATE: i32 = 335544468;
    pub const DSQL_SQLDA_ERR: i32 = 335544583;
    pub const DSQL_SQLDA_VALUE_ERR: i32 = 335544597;
    pub const NETWORK_ERROR: i32 = 335544721;
    pub const NET_READ_ERR: i32 = 335544726;
    pub const NET_WRITE_ERR: i32 = 335544727;

    /// Free statement option, close the cursor only.
    pub const DSQL_CLOSE: i32 = 1;
    /// Free statement option, release the statement.
    pub const DSQL_DROP: i32 = 2;

    pub const SQL_DIALECT_V5: u32 = 1;
    pub const SQL_DIALECT_V6: u32 = 3;
    pub const SQL_DIALECT_CURRENT: u32 = SQL_DIALECT_V6;
}

/// Information request items.
pub mod info {
    pub const END: u8 = 1;
    pub const TRUNCATED: u8 = 2;

    pub const SQL_SELECT: u8 = 4;
    pub const SQL_BIND: u8 = 5;
    pub const SQL_NUM_VARIABLES: u8 = 6;
    pub const SQL_DESCRIBE_VARS: u8 = 7;
    pub const SQL_DESCRIBE_END: u8 = 8;
    pub const SQL_SQLDA_SEQ: u8 = 9;
    pub const SQL_TYPE: u8 = 11;
    pub const SQL_SUB_TYPE: u8 = 12;
    pub const SQL_SCALE: u8 = 13;
    pub const SQL_LENGTH: u8 = 14;
    pub const SQL_FIELD: u8 = 16;
    pub const SQL_RELATION: u8 = 17;
    pub const SQL_OWNER: u8 = 18;
    pub const SQL_ALIAS: u8 = 19;
    pub const SQL_SQLDA_START: u8 = 20;
    pub const SQL_STMT_TYPE: u8 = 21;

    pub const DB_ID: u8 = 4;
    pub const ISC_VERSION: u8 = 12;
    pub const PAGE_SIZE: u8 = 14;
    pub const ODS_VERSION: u8 = 32;
    pub const DB_SQL_DIALECT: u8 = 62;
    pub const DB_READ_ONLY: u8 = 63;
    pub const FIREBIRD_VERSION: u8 = 103;
}

/// Binary language representation codes.
pub mod blr {
    pub const VERSION5: u8 = 5;
    pub const BEGIN: u8 = 2;
    pub const MESSAGE: u8 = 4;
    pub const END: u8 = 255;
    pub const EOC: u8 = 76;

    pub const SHORT: u8 = 7;
    pub const LONG: u8 = 8;
    pub const QUAD: u8 = 9;
    pub const FLOAT: u8 = 10;
    pub const D_FLOAT: u8 = 11;
    pub const SQL_DATE: u8 = 12;
    pub const SQL_TIME: u8 = 13;
    pub const TEXT: u8 = 14;
    pub const INT64: u8 = 16;
    pub const DOUBLE: u8 = 27;
    pub const TIMESTAMP: u8 = 35;
    pub const VARYING: u8 = 37;
}

/// Database parameter buffer items.
pub mod dpb {
    pub const VERSION1: u8 = 1;
    pub const PAGE_SIZE: u8 = 4;
    pub const NUM_BUFFERS: u8 = 5;
    pub const USER_NAME: u8 = 28;
    pub const PASSWORD: u8 = 29;
    pub const LC_CTYPE: u8 = 48;
    pub const SQL_ROLE_NAME: u8 = 60;
    pub const SQL_DIALECT: u8 = 63;
}

/// Transaction parameter buffer items.
pub mod tpb {
    pub const VERSION3: u8 = 3;
    pub const CONSISTENCY: u8 = 1;
    pub const CONCURRENCY: u8 = 2;
    pub const WAIT: u8 = 6;
    pub const NOWAIT: u8 = 7;
    pub const READ: u8 = 8;
    pub const WRITE: u8 = 9;
    pub const READ_COMMITTED: u8 = 15;
    pub const REC_VERSION: u8 = 17;
    pub const NO_REC_VERSION: u8 = 18;
    pub const LOCK_TIMEOUT: u8 = 21;
}

/// Blob parameter buffer items.
pub mod bpb {
    pub const VERSION1: u8 = 1;
    pub const SOURCE_TYPE: u8 = 1;
    pub const TARGET_TYPE: u8 = 2;
    pub const TYPE: u8 = 3;
    pub const SOURCE_INTERP: u8 = 4;
    pub const TARGET_INTERP: u8 = 5;

    pub const TYPE_SEGMENTED: u8 = 0;
    pub const TYPE_STREAM: u8 = 1;
}
