//! flagscope: resolve clap flags from the command line, the environment and a
//! config file.
//!
//! Every flag visible at the executing subcommand is bound to a dotted
//! configuration key. With prefixed commands it is also bound under each
//! command namespace, so `--param` on `app bar` can come from `APP_BAR_PARAM`
//! or from `bar: { param: ... }` in the config file. Precedence, highest
//! first:
//!
//! 1. a value supplied on the command line,
//! 2. the deepest namespace that has a value, environment before file,
//! 3. the flag's default.
//!
//! ```no_run
//! use clap::{Arg, Command};
//! use flagscope::{Binder, BinderConfig};
//!
//! # fn main() -> flagscope::Result<()> {
//! let cmd = Command::new("app")
//!     .subcommand(Command::new("serve").arg(Arg::new("port").long("port").default_value("8080")));
//!
//! let mut binder = Binder::new(
//!     BinderConfig::new()
//!         .default_config_name("app")
//!         .config_path(".")
//!         .env_prefix("APP")
//!         .prefix_commands(true)
//!         .add_config_flag(true),
//! );
//!
//! binder.execute(cmd, std::env::args_os(), |invocation| {
//!     println!("port = {:?}", invocation.value("port"));
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod invocation;
pub mod key;
pub mod merge;
pub mod scope;
pub mod settings;
pub mod tree;

pub use binder::{Binder, BinderConfig, CONFIG_FLAG};
pub use command::apply_matches;
pub use config::{ConfigSource, ConfigStore};
pub use env::Environment;
pub use error::{BindingError, BindingErrors, Error, Result};
pub use invocation::Invocation;
pub use key::QualifiedKey;
pub use merge::{resolve, CancelToken, MergeOptions, Resolution, Sources};
pub use scope::prefixes;
pub use settings::Settings;
pub use tree::{CommandNode, CommandTree, FlagRef, FlagSpec, NodeId, ValueSource};
