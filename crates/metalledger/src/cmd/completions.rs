//! Shell completion generation.

use clap::CommandFactory;
use clap_complete::Shell;
use std::io;

/// Write completions for `C` to stdout.
pub fn generate_completions<C: CommandFactory>(shell: Shell, bin_name: &str) {
    let mut cmd = C::command();
    clap_complete::generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
