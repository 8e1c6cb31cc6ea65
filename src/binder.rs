//! Wiring clap, the config file and the environment together
//!
//! A [`Binder`] owns the config source for the life of the process. For each
//! command invocation it loads the file (once), binds the executing
//! command's flags and builds the merged settings before the command body
//! runs.

use crate::command::{apply_matches, deepest_raw};
use crate::config::ConfigSource;
use crate::env::Environment;
use crate::error::Result;
use crate::invocation::Invocation;
use crate::merge::{resolve, CancelToken, MergeOptions, Sources};
use crate::settings::Settings;
use crate::tree::CommandTree;
use clap::{value_parser, Arg, ArgMatches, Command};
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::path::PathBuf;

/// Id and long name of the flag that points at an explicit config file.
pub const CONFIG_FLAG: &str = "config";

/// How a [`Binder`] finds the config file and derives keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinderConfig {
    /// File name, without extension, searched for in `config_paths`.
    pub default_config_name: Option<String>,
    pub config_paths: Vec<PathBuf>,
    /// Prefix of bound environment variables. Without one the environment
    /// is not consulted.
    pub env_prefix: Option<String>,
    pub prefix_commands: bool,
    pub namespace_flags: bool,
    /// Add a global `--config/-c <FILE>` flag to the root command.
    pub add_config_flag: bool,
}

impl BinderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_config_name(mut self, name: impl Into<String>) -> Self {
        self.default_config_name = Some(name.into());
        self
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_paths.push(path.into());
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    pub fn prefix_commands(mut self, enabled: bool) -> Self {
        self.prefix_commands = enabled;
        self
    }

    pub fn namespace_flags(mut self, enabled: bool) -> Self {
        self.namespace_flags = enabled;
        self
    }

    pub fn add_config_flag(mut self, enabled: bool) -> Self {
        self.add_config_flag = enabled;
        self
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions { namespace_flags: self.namespace_flags, prefix_commands: self.prefix_commands }
    }
}

/// Binds clap flags to environment and config file values.
#[derive(Debug)]
pub struct Binder {
    config: BinderConfig,
    source: ConfigSource,
    environment: Option<Environment>,
    cancel: Option<CancelToken>,
}

impl Binder {
    pub fn new(config: BinderConfig) -> Self {
        let source = ConfigSource::new(config.default_config_name.clone(), config.config_paths.clone());
        Self { config, source, environment: None, cancel: None }
    }

    /// Read variables from `environment` instead of the process environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Prepare a command for binding, adding the `--config` flag when
    /// configured and the command does not define one already.
    pub fn inject(&self, cmd: Command) -> Command {
        if !self.config.add_config_flag || cmd.get_arguments().any(|a| a.get_id() == CONFIG_FLAG) {
            return cmd;
        }

        cmd.arg(
            Arg::new(CONFIG_FLAG)
                .short('c')
                .long(CONFIG_FLAG)
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file to use"),
        )
    }

    /// Bind the executing command's flags. `cmd` must be the command that
    /// produced `matches`.
    pub fn bind(&mut self, cmd: &Command, matches: &ArgMatches) -> Result<Invocation> {
        let explicit = deepest_raw(matches, CONFIG_FLAG).filter(|p| !p.is_empty()).map(PathBuf::from);
        let store = self.source.load(explicit.as_deref())?;

        let mut tree = CommandTree::from_clap(cmd);
        let node = apply_matches(&mut tree, matches);
        tracing::debug!(command = %tree.path(node).join(" "), "Binding flags");

        let environment = match &self.environment {
            Some(environment) => environment.clone(),
            None => Environment::from_process(),
        };
        let sources = Sources {
            store,
            environment: &environment,
            env_prefix: self.config.env_prefix.as_deref().filter(|p| !p.is_empty()),
        };

        let resolution =
            resolve(&mut tree, node, &sources, self.config.merge_options(), self.cancel.as_ref())?;
        let settings = Settings::build(&tree, &resolution, &sources);
        let config_file = store.path().map(PathBuf::from);

        Ok(Invocation::new(tree, node, resolution, settings, config_file))
    }

    /// Bind, then decode the merged settings into `target`.
    pub fn bind_into<T: DeserializeOwned>(
        &mut self,
        cmd: &Command,
        matches: &ArgMatches,
        target: &mut T,
    ) -> Result<Invocation> {
        let invocation = self.bind(cmd, matches)?;
        invocation.decode_into(target)?;
        Ok(invocation)
    }

    /// Inject, parse `args` and bind.
    pub fn try_bind_from<I, T>(&mut self, cmd: Command, args: I) -> Result<Invocation>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut cmd = self.inject(cmd);
        let matches = cmd.try_get_matches_from_mut(args)?;
        self.bind(&cmd, &matches)
    }

    /// Parse and bind, then run `body`. The body never runs when binding
    /// fails.
    pub fn execute<I, T, F, R>(&mut self, cmd: Command, args: I, body: F) -> Result<R>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
        F: FnOnce(&Invocation) -> R,
    {
        let invocation = self.try_bind_from(cmd, args)?;
        Ok(body(&invocation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_adds_global_config_flag() {
        let binder = Binder::new(BinderConfig::new().add_config_flag(true));
        let cmd = binder.inject(Command::new("app").subcommand(Command::new("sub")));

        let config = cmd.get_arguments().find(|a| a.get_id() == CONFIG_FLAG).expect("config flag");
        assert_eq!(config.get_short(), Some('c'));
        assert!(config.is_global_set());
    }

    #[test]
    fn test_inject_keeps_existing_config_flag() {
        let binder = Binder::new(BinderConfig::new().add_config_flag(true));
        let cmd = binder.inject(Command::new("app").arg(Arg::new("config").long("config")));
        assert_eq!(cmd.get_arguments().filter(|a| a.get_id() == CONFIG_FLAG).count(), 1);
    }

    #[test]
    fn test_inject_without_config_flag() {
        let binder = Binder::new(BinderConfig::new());
        let cmd = binder.inject(Command::new("app"));
        assert!(cmd.get_arguments().all(|a| a.get_id() != CONFIG_FLAG));
    }

    #[test]
    fn test_execute_skips_body_on_parse_error() {
        let mut binder = Binder::new(BinderConfig::new()).with_environment(Environment::default());
        let mut ran = false;
        let result = binder.execute(Command::new("app"), ["app", "--unknown"], |_| ran = true);
        assert!(result.is_err());
        assert!(!ran);
    }

    #[test]
    fn test_merge_options_follow_config() {
        let config = BinderConfig::new().prefix_commands(true).namespace_flags(true);
        assert_eq!(
            config.merge_options(),
            MergeOptions { namespace_flags: true, prefix_commands: true }
        );
    }
}
