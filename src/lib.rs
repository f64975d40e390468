//! Core library for the Tansy scripting runtime: lexing, parsing, a
//! tree-walking evaluator with an event-driven source-level debugger, and
//! a bridge for exposing host functions and constants to scripts.

pub mod ast;
pub mod bridge;
pub mod builtins;
pub mod bus;
pub mod debugger;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod scope;
pub mod value;

pub use bridge::HostRegistry;
pub use bus::{StepEvent, StepListener, StepResponse};
pub use debugger::{Console, Debugger, DebuggerState, TerminalConsole};
pub use diagnostics::{Diagnostic, DiagnosticKind, SourceSpan, TansyError};
pub use repl::Repl;
pub use runtime::Interpreter;
pub use value::{Value, ValueKind};
