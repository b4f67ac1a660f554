mod db;
mod filter;
mod pipeline;
mod row;
mod sink;
mod sql_writer;
mod statement;
mod transport;
mod unpack;
mod util;
mod value;

pub use ::anyhow::Context;
pub use db::*;
pub use filter::*;
pub use pipeline::*;
pub use row::*;
pub use sink::*;
pub use sql_writer::*;
pub use statement::*;
pub use transport::*;
pub use unpack::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
