pub mod loader;
pub mod schema;

pub use loader::{
    discover, load_from_path, load_from_str, resolve, ConfigError, ConfigSource, LoadedConfig,
    CONFIG_FILE_NAME,
};
pub use schema::{
    DiffSettings, FileSettings, FixerConfig, FixerSettings, LineTerminator, SniffSettings,
    ValidationError, ValidationIssue,
};
