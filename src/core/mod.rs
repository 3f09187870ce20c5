pub mod args;
pub mod csv_sink;
pub mod naming;
pub mod processor;
pub mod reader;
pub mod request_url;

pub use crate::domain::model::{FlatRecord, GeoPosition, LocationRecord};
pub use crate::domain::ports::{ByteSource, ConfigProvider, StreamOpener, WriteMode};
pub use crate::utils::error::Result;
