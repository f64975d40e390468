use std::collections::BTreeSet;

use rustyline::{error::ReadlineError, DefaultEditor};

use crate::{
    ast::DebugInfo,
    bus::{StepEvent, StepListener, StepResponse},
    diagnostics::{Result, TansyError},
    scope::Scope,
};

/// ANSI escapes for the session output, enabled per debugger instance.
mod colors {
    pub const BOLD: &str = "\x1b[1m";
    pub const CYAN: &str = "\x1b[36m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const RESET: &str = "\x1b[0m";
}

/// Where the debugger sits in its session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebuggerState {
    Running,
    StepPaused,
    BreakpointPaused,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepMode {
    /// Run until a breakpoint line is reached.
    Continue,
    /// Pause at the next steppable node.
    Step,
}

/// The debugger's line-oriented I/O channel. Production sessions wrap
/// rustyline; tests inject a scripted implementation.
pub trait Console {
    /// Read one command line. `None` means end of input (treated as quit).
    fn read_command(&mut self, prompt: &str) -> Result<Option<String>>;
    fn write_line(&mut self, text: &str);
}

/// Interactive console over rustyline, matching the REPL's line editor.
pub struct TerminalConsole {
    editor: DefaultEditor,
}

impl TerminalConsole {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(|err| {
            TansyError::from(std::io::Error::other(err))
        })?;
        Ok(Self { editor })
    }
}

impl Console for TerminalConsole {
    fn read_command(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                self.editor.add_history_entry(line.trim()).ok();
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(TansyError::from(std::io::Error::other(err))),
        }
    }

    fn write_line(&mut self, text: &str) {
        println!("{text}");
    }
}

/// A source-level debugger: listens for step events, pauses the evaluator
/// at breakpoints or while single-stepping, and drives an interactive
/// session over the captured source text.
pub struct Debugger<C: Console> {
    /// Source lines, index 1-based (slot 0 is an empty pad).
    lines: Vec<String>,
    console: C,
    breakpoints: BTreeSet<usize>,
    mode: StepMode,
    state: DebuggerState,
    debug_info: DebugInfo,
    color: bool,
}

impl<C: Console> Debugger<C> {
    pub fn new(source: &str, console: C) -> Self {
        let mut lines = vec![String::new()];
        lines.extend(source.lines().map(str::to_string));
        Self {
            lines,
            console,
            breakpoints: BTreeSet::new(),
            mode: StepMode::Continue,
            state: DebuggerState::Running,
            debug_info: DebugInfo::default(),
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Hand over the parser's per-function step index.
    pub fn set_debug_info(&mut self, debug_info: DebugInfo) {
        self.debug_info = debug_info;
    }

    pub fn set_breakpoint(&mut self, line: usize) {
        self.breakpoints.insert(line);
    }

    pub fn clear_breakpoint(&mut self, line: usize) {
        self.breakpoints.remove(&line);
    }

    /// Start the session in single-step mode, pausing at the first
    /// steppable node instead of running to the first breakpoint.
    pub fn step_from_start(&mut self) {
        self.mode = StepMode::Step;
    }

    pub fn state(&self) -> DebuggerState {
        self.state
    }

    pub fn show_banner(&mut self) {
        let title = if self.color {
            format!("{}tansy debugger{}", colors::BOLD, colors::RESET)
        } else {
            "tansy debugger".to_string()
        };
        self.console.write_line(&title);
        self.console
            .write_line("commands: step continue inspect break delete list help quit");
    }

    fn show_pause(&mut self, event: &StepEvent, reason: &str) {
        let header = format!(
            "paused in `{}` at line {} ({reason})",
            event.function, event.line
        );
        let header = if self.color {
            format!("{}{header}{}", colors::YELLOW, colors::RESET)
        } else {
            header
        };
        self.console.write_line(&header);
        self.show_window(event.line);
    }

    /// Print a three-line source window with the current line marked.
    fn show_window(&mut self, line: usize) {
        let first = line.saturating_sub(1).max(1);
        let last = (line + 1).min(self.lines.len().saturating_sub(1));
        for number in first..=last {
            let Some(text) = self.lines.get(number) else {
                continue;
            };
            let marker = if number == line { ">" } else { " " };
            let rendered = if self.color && number == line {
                format!("{}{marker} {number:>4} | {text}{}", colors::CYAN, colors::RESET)
            } else {
                format!("{marker} {number:>4} | {text}")
            };
            self.console.write_line(&rendered);
        }
    }

    /// List the source of the function active at `event`, falling back to
    /// a window around the current line when it has no debug slice.
    fn list_function(&mut self, event: &StepEvent) {
        let range = self.debug_info.function(&event.function).and_then(|f| {
            let first = f.steps.iter().map(|s| s.line).min()?;
            let last = f.steps.iter().map(|s| s.line).max()?;
            Some((first.saturating_sub(1).max(1), last + 1))
        });
        let (first, last) = range.unwrap_or((event.line.saturating_sub(3).max(1), event.line + 3));
        let last = last.min(self.lines.len().saturating_sub(1));
        for number in first..=last {
            if let Some(text) = self.lines.get(number) {
                let marker = if number == event.line { ">" } else { " " };
                let text = format!("{marker} {number:>4} | {text}");
                self.console.write_line(&text);
            }
        }
    }

    fn inspect(&mut self, event: &StepEvent, name: &str) {
        match Scope::resolve(&event.scope, name) {
            Some(value) => self.console.write_line(&format!("{name} = {value:?}")),
            None => self.console.write_line(&format!("`{name}` is not bound")),
        }
    }

    fn show_help(&mut self) {
        self.console.write_line("  step (s)         pause at the next statement");
        self.console.write_line("  continue (c)     run to the next breakpoint");
        self.console.write_line("  inspect <name>   show a binding from the current scope");
        self.console.write_line("  break <line>     set a breakpoint");
        self.console.write_line("  delete <line>    remove a breakpoint");
        self.console.write_line("  list (l)         show the active function's source");
        self.console.write_line("  quit (q)         terminate evaluation");
    }

    /// The interactive pause loop. Returns once the operator issues a
    /// command that resumes (or terminates) evaluation.
    fn interact(&mut self, event: &StepEvent) -> StepResponse {
        loop {
            let line = match self.console.read_command("(tansy) ") {
                Ok(Some(line)) => line,
                Ok(None) | Err(_) => {
                    self.state = DebuggerState::Terminated;
                    return StepResponse::Terminate;
                }
            };
            let mut words = line.split_whitespace();
            let command = words.next().unwrap_or("step");
            let argument = words.next();
            match command {
                "step" | "s" => {
                    self.mode = StepMode::Step;
                    self.state = DebuggerState::Running;
                    return StepResponse::Resume;
                }
                "continue" | "c" => {
                    self.mode = StepMode::Continue;
                    self.state = DebuggerState::Running;
                    return StepResponse::Resume;
                }
                "inspect" | "p" => match argument {
                    Some(name) => self.inspect(event, name),
                    None => self.console.write_line("usage: inspect <name>"),
                },
                "break" | "b" => match argument.and_then(|arg| arg.parse().ok()) {
                    Some(line) => {
                        self.set_breakpoint(line);
                        self.console.write_line(&format!("breakpoint set at line {line}"));
                    }
                    None => self.console.write_line("usage: break <line>"),
                },
                "delete" => match argument.and_then(|arg| arg.parse().ok()) {
                    Some(line) => {
                        self.clear_breakpoint(line);
                        self.console
                            .write_line(&format!("breakpoint removed from line {line}"));
                    }
                    None => self.console.write_line("usage: delete <line>"),
                },
                "list" | "l" => self.list_function(event),
                "help" | "h" => self.show_help(),
                "quit" | "q" => {
                    self.state = DebuggerState::Terminated;
                    return StepResponse::Terminate;
                }
                other => {
                    self.console
                        .write_line(&format!("unknown command `{other}` (try `help`)"));
                }
            }
        }
    }
}

impl<C: Console> StepListener for Debugger<C> {
    fn on_step(&mut self, event: &StepEvent) -> StepResponse {
        match self.state {
            DebuggerState::Terminated => return StepResponse::Terminate,
            DebuggerState::Running | DebuggerState::StepPaused | DebuggerState::BreakpointPaused => {}
        }

        let (pause, reason) = match self.mode {
            StepMode::Step => (DebuggerState::StepPaused, "step"),
            StepMode::Continue if self.breakpoints.contains(&event.line) => {
                (DebuggerState::BreakpointPaused, "breakpoint")
            }
            StepMode::Continue => return StepResponse::Resume,
        };

        self.state = pause;
        self.show_pause(event, reason);
        self.interact(event)
    }
}
