//! Reader, writer and directory pipelines for historical `.odb` containers.

pub mod config;
pub mod convert;
pub mod error;
pub mod mux;
pub mod preflight;
pub mod progress;
pub mod reader;
pub mod record;
pub mod schema;
pub mod sniff;
pub mod writer;

pub use config::*;
pub use convert::*;
pub use error::*;
pub use mux::*;
pub use progress::*;
pub use reader::*;
pub use record::*;
pub use schema::*;
pub use sniff::*;
pub use writer::*;
