/// Console and rotating file logger built on `fern`.
pub mod logger;

pub use logger::setup_logging;
