pub mod compare;
pub mod config;
pub mod diff;
pub mod parse;
pub mod report;

pub use compare::{compare_command, resolve_compare_options, CompareArgs};
pub use config::{init_config_command, load_config};
pub use diff::{diff_command, resolve_diff_options, DiffArgs};
pub use parse::parse_command;
