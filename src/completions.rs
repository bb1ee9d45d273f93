use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::app::AppError;
use crate::cli::Cli;

const BIN_NAME: &str = "tally";

pub fn generate_completions(shell: Shell, buf: &mut dyn Write) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, buf);
}

fn shell_from_name(raw: &str) -> Option<Shell> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        "elvish" => Some(Shell::Elvish),
        "powershell" | "pwsh" => Some(Shell::PowerShell),
        _ => None,
    }
}

/// Maps a `$SHELL` value such as `/usr/bin/zsh` to a shell.
fn shell_from_env_value(value: &str) -> Option<Shell> {
    shell_from_name(value.rsplit('/').next()?)
}

fn install_path(shell: Shell, home: &Path) -> Option<PathBuf> {
    match shell {
        Shell::Bash => Some(home.join(".local/share/bash-completion/completions/tally")),
        Shell::Zsh => Some(home.join(".zfunc/_tally")),
        Shell::Fish => Some(home.join(".config/fish/completions/tally.fish")),
        _ => None,
    }
}

fn install_into(shell: Shell, home: &Path) -> io::Result<PathBuf> {
    let path = install_path(shell, home).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no install path for {shell}"),
        )
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut buf = Vec::new();
    generate_completions(shell, &mut buf);
    std::fs::write(&path, buf)?;
    tracing::debug!(path = %path.display(), "installed completions");
    Ok(path)
}

pub fn run_completions_command(shell_arg: Option<&str>, install: bool) -> Result<(), AppError> {
    let shell = match shell_arg {
        Some(name) => shell_from_name(name)
            .ok_or_else(|| AppError::InvalidArgument(format!("unknown shell '{name}'")))?,
        None => std::env::var("SHELL")
            .ok()
            .as_deref()
            .and_then(shell_from_env_value)
            .ok_or_else(|| {
                AppError::InvalidArgument(
                    "unable to detect shell from $SHELL; pass a shell name".to_string(),
                )
            })?,
    };

    if install {
        let home = std::env::var_os("HOME").ok_or_else(|| {
            AppError::InvalidArgument("HOME is not set; cannot install completions".to_string())
        })?;
        let path = install_into(shell, Path::new(&home))?;
        println!("completions installed to {}", path.display());
    } else {
        let mut stdout = io::stdout().lock();
        generate_completions(shell, &mut stdout);
    }
    Ok(())
}
