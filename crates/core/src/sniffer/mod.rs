//! Format detection from the engine's diagnostic log.

mod parser;
mod probe;

pub use parser::{LogFormatParser, StreamInfoParser};
pub use probe::FormatSniffer;
