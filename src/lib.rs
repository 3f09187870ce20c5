pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::http::HttpStreamOpener;
pub use crate::config::Settings;
pub use crate::core::args::{location_from_os_args, location_from_tokens};
pub use crate::core::processor::QueryProcessor;
pub use crate::core::request_url::build_request_url;
pub use crate::utils::encoding::TextEncoding;
pub use crate::utils::error::{ArgumentError, LookupError, QueryProcessingError, Result};
