//! Database layer for the Barents vessel tracker.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode
//! initialization, and embedded SQL migrations. The sighting log is the
//! only durable state the service has, and every table is created through
//! the versioned migrations managed here.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: the ingestion pipeline is a single writer
//!   while the query API reads concurrently. WAL gives concurrent readers
//!   alongside that one writer without any external database process.
//! - **`r2d2` connection pool**: bounded connection reuse; the HTTP
//!   handlers and the pipeline each check a connection out for the
//!   duration of one statement.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, so the schema ships with the code that depends on it.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
