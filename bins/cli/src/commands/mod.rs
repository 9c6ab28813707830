//! Local CLI command handlers.

pub mod aggregate;
pub mod config;
pub mod info;
pub mod records;

pub use aggregate::{run_aggregate_span, run_aggregate_yesterday};
pub use config::{run_config_check, run_config_show};
pub use info::run_info;
pub use records::run_records_list;
