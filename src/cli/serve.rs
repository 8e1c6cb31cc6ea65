//! Serve command implementation

use anyhow::{Context, Result};
use flagscope::Invocation;
use serde::Deserialize;

use super::report;

#[derive(Debug, Deserialize)]
struct ServeSettings {
    #[serde(default)]
    host: Option<String>,
    port: u16,
}

#[derive(Debug, Deserialize)]
struct Settings {
    serve: ServeSettings,
}

pub fn run(invocation: &Invocation) -> Result<()> {
    let settings: Settings = invocation.decode().context("Invalid serve settings")?;

    report::print(invocation)?;
    if invocation.value("format") == Some("text") {
        let host = settings.serve.host.as_deref().unwrap_or("127.0.0.1");
        println!("Listening on {}:{}", host, settings.serve.port);
    }

    Ok(())
}
