pub mod config;

// self:: 避免与 config crate 同名歧义
pub use self::config::{
  apply_cli_overrides, load_and_merge_configs, load_layered_config, validate_config, AppConfig,
};
