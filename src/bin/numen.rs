use std::{fs, path::PathBuf};

use clap::{Parser, Subcommand};

use numen::{Interpreter, NumenError, Repl};

#[derive(Parser)]
#[command(author, version, about = "Numen language interpreter")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a Numen script file
    Run {
        #[arg(default_value = "./test.nm")]
        script: PathBuf,
    },
    /// Start an interactive REPL session
    Repl,
    /// Evaluate a snippet of Numen source
    Eval { source: String },
}

fn main() -> Result<(), NumenError> {
    let args = Args::parse();
    match args.command.unwrap_or(Command::Run {
        script: PathBuf::from("./test.nm"),
    }) {
        Command::Run { script } => run_script(script),
        Command::Repl => {
            let mut repl = Repl::new();
            repl.run()
        }
        Command::Eval { source } => {
            let mut interpreter = Interpreter::new();
            interpreter.run_source(&source)?;
            Ok(())
        }
    }
}

fn run_script(path: PathBuf) -> Result<(), NumenError> {
    let source = fs::read_to_string(&path)?;
    let mut interpreter = Interpreter::new();
    interpreter.run_source(&source)?;
    Ok(())
}
