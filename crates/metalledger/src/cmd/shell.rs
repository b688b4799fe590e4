//! `mledger shell`: an interactive session over one loaded inventory.
//!
//! Lines are parsed with the same subcommands as the command line, so
//! `sell Copper 40 15 --buyer Bob` works the same in both places. While the
//! shell is open a background worker writes periodic backups from a
//! snapshot of the shared inventory.

use super::{execute, Command, Session};
use anyhow::Result;
use clap::Parser;
use metalledger_loader::AutoBackup;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use std::fs;
use std::io;
use std::mem;
use std::path::PathBuf;
use tracing::warn;

/// One line typed at the prompt.
#[derive(Parser, Debug)]
#[command(name = "mledger", no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

fn history_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("mledger").join("history"))
}

/// Run the read-eval-print loop until `exit` or end of input.
pub fn run(session: &mut Session) -> Result<()> {
    let mut rl: Editor<(), DefaultHistory> = DefaultEditor::new()?;
    if let Some(path) = history_path() {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = rl.load_history(&path);
    }

    let worker = if session.settings().auto_backup {
        Some(AutoBackup::spawn(
            session.shared(),
            session.store().clone(),
            session.settings().backup_interval(),
            session.settings().backup_retention_days,
        )?)
    } else {
        None
    };

    {
        let repo = session.inventory();
        println!("Data file: \"{}\"", session.store().data_path().display());
        println!(
            "Ready with {} commodities, {} history entries and {} parties",
            repo.commodities().len(),
            repo.history().len(),
            repo.parties().len()
        );
    }
    println!("Type `help` for commands, `exit` to leave.");
    println!();

    loop {
        match rl.readline("mledger> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                if matches!(line, "exit" | "quit") {
                    break;
                }
                run_line(line, session);
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("(interrupted)");
            }
            Err(ReadlineError::Eof) => {
                println!("exit");
                break;
            }
            Err(err) => {
                eprintln!("error: {err}");
                break;
            }
        }
    }

    if let Some(path) = history_path() {
        if let Err(e) = rl.save_history(&path) {
            warn!(error = %e, "could not save shell history");
        }
    }
    if let Some(worker) = worker {
        worker.stop();
    }
    Ok(())
}

fn run_line(line: &str, session: &mut Session) {
    let words = match split_words(line) {
        Ok(words) => words,
        Err(e) => {
            eprintln!("error: {e}");
            return;
        }
    };
    match Line::try_parse_from(words) {
        Ok(parsed) => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = execute(&parsed.command, session, &mut stdout) {
                eprintln!("error: {e:#}");
            }
        }
        Err(e) => {
            let _ = e.print();
        }
    }
}

/// Split a line into words, honouring single and double quotes.
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_words() {
        assert_eq!(
            split_words("sell Copper 40  15").unwrap(),
            vec!["sell", "Copper", "40", "15"]
        );
    }

    #[test]
    fn test_split_quoted_words() {
        assert_eq!(
            split_words(r#"buy "Red Copper" 10 5 --source 'Acme Ltd'"#).unwrap(),
            vec!["buy", "Red Copper", "10", "5", "--source", "Acme Ltd"]
        );
        assert_eq!(split_words(r#"party add """#).unwrap(), vec!["party", "add", ""]);
    }

    #[test]
    fn test_split_unterminated_quote() {
        assert!(split_words("buy \"Copper 10 5").is_err());
    }

    #[test]
    fn test_line_parses_subcommands() {
        let line = Line::try_parse_from(["sell", "Copper", "40", "--lot", "2", "--split"]).unwrap();
        match line.command {
            Command::Sell(args) => {
                assert_eq!(args.lot, Some(2));
                assert!(args.split);
                assert_eq!(args.price, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
