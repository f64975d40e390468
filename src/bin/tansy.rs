use std::{fs, io::IsTerminal, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};

use tansy::{parser, Debugger, Interpreter, Repl, TansyError, TerminalConsole};

#[derive(Parser)]
#[command(author, version, about = "Tansy language interpreter")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a Tansy script file
    Run {
        script: PathBuf,
        /// Attach an interactive source-level debugger
        #[arg(long)]
        debug: bool,
    },
    /// Start an interactive REPL session
    Repl,
    /// Evaluate a snippet of Tansy code and print the result
    Eval { source: String },
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = match args.command.unwrap_or(Command::Repl) {
        Command::Run { script, debug } => run_script(script, debug),
        Command::Repl => Repl::new().run(),
        Command::Eval { source } => {
            let mut interpreter = Interpreter::new();
            interpreter.eval_source(&source).map(|value| {
                println!("{value}");
            })
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run_script(path: PathBuf, debug: bool) -> Result<(), TansyError> {
    let source = fs::read_to_string(&path)?;
    let mut interpreter = Interpreter::new();

    if !debug {
        interpreter.eval_source(&source)?;
        return Ok(());
    }

    let outcome = parser::parse(&source);
    if let Some(first) = outcome.errors.first().cloned() {
        for diag in &outcome.errors {
            eprintln!("{diag}");
        }
        return Err(TansyError::from(first));
    }

    let console = TerminalConsole::new()?;
    let mut debugger =
        Debugger::new(&source, console).with_color(std::io::stdout().is_terminal());
    debugger.set_debug_info(outcome.debug);
    debugger.step_from_start();
    debugger.show_banner();
    interpreter.attach_listener(Box::new(debugger));

    interpreter.eval_program(&outcome.program)?;
    Ok(())
}
