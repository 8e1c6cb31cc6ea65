//! flagscope: show how subcommand flags resolve
//!
//! Each command prints its flags together with the source every value was
//! taken from: the command line, a `FLAGSCOPE_*` environment variable, the
//! `flagscope.{yaml,yml,json,toml}` config file, or the flag's default.

use anyhow::Result;

mod cli;

fn main() -> Result<()> {
    cli::run()
}
