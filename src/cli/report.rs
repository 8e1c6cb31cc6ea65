//! Resolution report

use anyhow::Result;
use flagscope::{FlagSpec, Invocation};

pub fn print(invocation: &Invocation) -> Result<()> {
    match invocation.value("format").unwrap_or("text") {
        "text" => {
            print_text(invocation);
            Ok(())
        }
        "yaml" => {
            print!("{}", invocation.settings().to_yaml()?);
            Ok(())
        }
        other => anyhow::bail!("Unsupported output format: {}", other),
    }
}

fn print_text(invocation: &Invocation) {
    let path = invocation.command_path();
    let command = if path.is_empty() { "(root)".to_string() } else { path.join(" ") };
    println!("Command: {}", command);

    match invocation.config_file() {
        Some(file) => println!("Config file: {}", file.display()),
        None => println!("Config file: (none)"),
    }

    let width = invocation.flags().map(|(flag, _)| flag.name().len()).max().unwrap_or(0);
    println!("Flags:");
    for (flag, _) in invocation.flags() {
        println!("  {}", flag_line(flag, width));
    }
}

/// `name = value  (source)`, with the name padded to `width`.
pub fn flag_line(flag: &FlagSpec, width: usize) -> String {
    let source = flag.source().map(ToString::to_string).unwrap_or_else(|| "unset".to_string());
    format!("{:<width$} = {}  ({})", flag.name(), flag.value().unwrap_or(""), source, width = width)
}
