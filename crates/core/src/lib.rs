mod assets;

pub mod config;
pub mod endpoint;
pub mod generate;

pub use crate::assets::{get_config_dir, get_data_dir};
