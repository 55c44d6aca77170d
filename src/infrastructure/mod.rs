pub mod http;
pub mod parsers;
pub mod sqlite;
pub mod storage;
