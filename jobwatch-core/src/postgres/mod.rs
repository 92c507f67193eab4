//! Postgres-backed collaborators: snapshot reads over a pool and a
//! `LISTEN`/`NOTIFY` change feed.

pub mod change_feed;
pub mod data_source;

pub use change_feed::{PostgresChangeFeed, PostgresChangeFeedConfig};
pub use data_source::PostgresDataSource;
