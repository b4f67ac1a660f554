//! Keg: the pipelined data layer.
//!
//! Keg turns structured query descriptors into MySQL text and runs them
//! through an ordered, replaceable stage pipeline: compile, execute, unpack.
//! The [`Db`] entry point exposes one builder per operation (table
//! management, inserts, upserts, deletes, selections, aggregations, row
//! duplication) plus record-at-a-time [`RowSink`] adapters, all on top of a
//! [`Transport`] seam that owns the physical connection.
//!
//! ```no_run
//! # async fn example(transport: impl keg::Transport + 'static) -> keg::Result<()> {
//! use keg::{Db, record};
//!
//! let db = Db::new(transport);
//! let table = db.create_table(Some("person"), &["id".into(), "name".into()]).await?;
//! db.insert(&table, record!["name" => "Adam"]).await?;
//! let people = db.select_all(&table).await?;
//! # let _ = people;
//! # Ok(())
//! # }
//! ```

pub use keg_core::*;
