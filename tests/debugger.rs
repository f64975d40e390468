use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use tansy::{
    diagnostics::{DiagnosticKind, Result},
    parser,
    value::{Value, ValueKind},
    Console, Debugger, Interpreter, StepEvent, StepListener, StepResponse,
};

/// A console driven by a pre-scripted command list. Output is shared so
/// tests can assert on it after the debugger has been moved into the
/// interpreter.
struct ScriptedConsole {
    commands: VecDeque<String>,
    output: Rc<RefCell<Vec<String>>>,
}

impl ScriptedConsole {
    fn new(commands: &[&str]) -> (Self, Rc<RefCell<Vec<String>>>) {
        let output = Rc::new(RefCell::new(Vec::new()));
        let console = Self {
            commands: commands.iter().map(|c| c.to_string()).collect(),
            output: Rc::clone(&output),
        };
        (console, output)
    }
}

impl Console for ScriptedConsole {
    fn read_command(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.commands.pop_front())
    }

    fn write_line(&mut self, text: &str) {
        self.output.borrow_mut().push(text.to_string());
    }
}

/// Records every published step event; never pauses.
struct Recorder {
    events: Rc<RefCell<Vec<(String, usize)>>>,
}

impl StepListener for Recorder {
    fn on_step(&mut self, event: &StepEvent) -> StepResponse {
        self.events
            .borrow_mut()
            .push((event.function.clone(), event.line));
        StepResponse::Resume
    }
}

/// Run `source` under a debugger fed by `commands`, returning the
/// evaluation result and the session transcript.
fn debug_session(
    source: &str,
    breakpoints: &[usize],
    commands: &[&str],
    step_from_start: bool,
) -> (Result<Value>, Vec<String>) {
    let (console, output) = ScriptedConsole::new(commands);
    let mut debugger = Debugger::new(source, console);
    debugger.set_debug_info(parser::parse(source).debug);
    for line in breakpoints {
        debugger.set_breakpoint(*line);
    }
    if step_from_start {
        debugger.step_from_start();
    }

    let mut interpreter = Interpreter::new();
    interpreter.attach_listener(Box::new(debugger));
    let result = interpreter.eval_source(source);
    let transcript = output.borrow().clone();
    (result, transcript)
}

fn pauses(transcript: &[String]) -> Vec<String> {
    transcript
        .iter()
        .filter(|line| line.starts_with("paused"))
        .cloned()
        .collect()
}

const PROGRAM: &str = "let a = 1\nlet b = 2\nlet c = a + b\nc";

#[test]
fn continue_only_session_pauses_at_breakpoints_in_order() {
    let (result, transcript) = debug_session(PROGRAM, &[2, 4], &["continue", "continue"], false);
    let value = result.expect("evaluation should finish");
    assert!(matches!(value.0.as_ref(), ValueKind::Int(3)));

    let paused = pauses(&transcript);
    assert_eq!(paused.len(), 2, "transcript: {transcript:?}");
    assert!(paused[0].contains("at line 2"), "{}", paused[0]);
    assert!(paused[1].contains("at line 4"), "{}", paused[1]);
}

#[test]
fn stepping_walks_consecutive_statements() {
    let (result, transcript) = debug_session(PROGRAM, &[], &["step", "step", "continue"], true);
    result.expect("evaluation should finish");

    let paused = pauses(&transcript);
    assert_eq!(paused.len(), 3, "transcript: {transcript:?}");
    assert!(paused[0].contains("at line 1"));
    assert!(paused[1].contains("at line 2"));
    assert!(paused[2].contains("at line 3"));
}

#[test]
fn breakpoint_pauses_before_the_line_runs() {
    let source = "fn add(a, b) {\n    return a + b\n}\nadd(2, 3)";
    let (result, transcript) =
        debug_session(source, &[2], &["inspect a", "inspect missing", "continue"], false);
    let value = result.expect("evaluation should finish");
    assert!(matches!(value.0.as_ref(), ValueKind::Int(5)));

    let paused = pauses(&transcript);
    assert_eq!(paused.len(), 1, "transcript: {transcript:?}");
    assert!(paused[0].contains("paused in `add` at line 2"), "{}", paused[0]);
    assert!(transcript.iter().any(|line| line == "a = 2"), "{transcript:?}");
    assert!(
        transcript.iter().any(|line| line.contains("`missing` is not bound")),
        "{transcript:?}"
    );
}

#[test]
fn quit_terminates_evaluation() {
    let (result, _) = debug_session(PROGRAM, &[1], &["quit"], false);
    let err = result.expect_err("quit should abort evaluation");
    assert_eq!(err.kind(), Some(DiagnosticKind::DebuggerTerminated));
}

#[test]
fn console_eof_terminates_evaluation() {
    let (result, _) = debug_session(PROGRAM, &[1], &[], false);
    let err = result.expect_err("end of input should abort evaluation");
    assert_eq!(err.kind(), Some(DiagnosticKind::DebuggerTerminated));
}

#[test]
fn breakpoints_added_mid_session_take_effect() {
    // Pause at line 1, plant a breakpoint further down, then continue.
    let (result, transcript) =
        debug_session(PROGRAM, &[1], &["break 3", "continue", "continue"], false);
    result.expect("evaluation should finish");

    let paused = pauses(&transcript);
    assert_eq!(paused.len(), 2, "transcript: {transcript:?}");
    assert!(paused[0].contains("at line 1"));
    assert!(paused[1].contains("at line 3"));
}

#[test]
fn source_window_marks_the_current_line() {
    let (_, transcript) = debug_session(PROGRAM, &[2], &["continue"], false);
    assert!(
        transcript.iter().any(|line| line.contains(">    2 | let b = 2")),
        "{transcript:?}"
    );
}

#[test]
fn list_shows_the_active_function_source() {
    let source = "fn add(a, b) {\n    return a + b\n}\nadd(2, 3)";
    let (result, transcript) = debug_session(source, &[2], &["list", "continue"], false);
    result.expect("evaluation should finish");
    assert!(
        transcript.iter().any(|line| line.contains("return a + b")),
        "{transcript:?}"
    );
}

#[test]
fn recorder_sees_every_statement_with_frame_names() {
    let source = "fn add(a, b) {\n    return a + b\n}\nadd(2, 3)";
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut interpreter = Interpreter::new();
    interpreter.attach_listener(Box::new(Recorder {
        events: Rc::clone(&events),
    }));
    interpreter
        .eval_source(source)
        .expect("evaluation should finish");

    let events = events.borrow();
    let expected = vec![
        ("<main>".to_string(), 1),
        ("<main>".to_string(), 4),
        ("add".to_string(), 2),
    ];
    assert_eq!(*events, expected);
}

#[test]
fn evaluation_without_listeners_is_unaffected() {
    let mut interpreter = Interpreter::new();
    let value = interpreter
        .eval_source(PROGRAM)
        .expect("evaluation should finish");
    assert!(matches!(value.0.as_ref(), ValueKind::Int(3)));
}
