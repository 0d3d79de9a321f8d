pub mod constraint;
pub mod error;
pub mod executor;
pub mod repl;
pub mod server;
pub mod sql;
pub mod storage;
pub mod value;
