//! Bar sinks for OpenIndex
//!
//! Implementations of the engine's [`BarSink`] boundary. Persistence and
//! display are entirely the sink's concern; the engine only guarantees
//! ordered, at-most-once bar delivery. The interoperable textual form is
//! `<unix_timestamp>,<index_price>`, one line per bar.

pub mod console;
pub mod csv;
pub mod memory;

pub use console::ConsoleSink;
pub use csv::CsvSink;
pub use memory::MemorySink;
