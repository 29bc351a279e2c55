//! Shell completion scripts
//!
//! `photoguardctl completion zsh > ~/.zsh/completion/_photoguardctl`

use anyhow::Result;
use clap::{CommandFactory, ValueEnum};
use clap_complete::{generate, Shell as ClapShell};
use std::io;

use crate::cli::Cli;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
    Elvish,
}

impl From<Shell> for ClapShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => ClapShell::Bash,
            Shell::Zsh => ClapShell::Zsh,
            Shell::Fish => ClapShell::Fish,
            Shell::Powershell => ClapShell::PowerShell,
            Shell::Elvish => ClapShell::Elvish,
        }
    }
}

/// Write the completion script for `shell` to stdout
pub fn execute(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(ClapShell::from(shell), &mut cmd, name, &mut io::stdout());

    if let Shell::Bash = shell {
        eprintln!();
        eprintln!("# Add to ~/.bashrc:");
        eprintln!("#    source <(photoguardctl completion bash)");
    }
    Ok(())
}
