//! Concrete adapter implementations for ports and external formats.

pub mod api_client;
pub mod correction_adapter;
pub mod delimited_adapter;
pub mod file_config_adapter;
pub mod http_transport;
pub mod record_cache;
pub mod remote_adapter;
pub mod spreadsheet_adapter;
pub mod trend_export;
