use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    ast::{BinaryOp, Expr, ExprKind, Literal, Program, Stmt, StmtKind, UnaryOp},
    bridge::{self, HostRegistry},
    builtins,
    bus::{MessageBus, StepEvent, StepListener, StepResponse},
    diagnostics::{Diagnostic, DiagnosticKind, Result, SourceSpan, TansyError},
    parser,
    scope::{Scope, ScopeRef},
    value::{MapKey, ScriptFunction, Value, ValueKind},
};

/// The evaluation engine: walks a program tree against a scope chain,
/// resolving host calls through the bridge registry and publishing one
/// step event per statement when listeners are attached.
///
/// Each interpreter owns an isolated scope root; nothing is shared between
/// instances except the (read-only) registry.
pub struct Interpreter {
    scope: ScopeRef,
    registry: Rc<HostRegistry>,
    bus: MessageBus,
    frames: Vec<String>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_registry(Rc::new(builtins::standard_registry()))
    }

    /// Build an interpreter over a custom host registry. Every registered
    /// namespace becomes a binding in the root scope.
    pub fn with_registry(registry: Rc<HostRegistry>) -> Self {
        let scope = Scope::root();
        {
            let mut root = scope.borrow_mut();
            for name in registry.namespace_names() {
                root.define(name.to_string(), Value::namespace(name));
            }
        }
        Self {
            scope,
            registry,
            bus: MessageBus::new(),
            frames: vec!["<main>".into()],
        }
    }

    /// Attach a step listener (e.g. a debugger). Evaluation without
    /// listeners never constructs or publishes events.
    pub fn attach_listener(&mut self, listener: Box<dyn StepListener>) {
        self.bus.add_listener(listener);
    }

    pub fn eval_source(&mut self, source: &str) -> Result<Value> {
        let outcome = parser::parse(source);
        if let Some(first) = outcome.errors.first() {
            let mut diag = first.clone();
            if outcome.errors.len() > 1 {
                diag = diag.with_note(format!(
                    "{} more parse error(s) follow",
                    outcome.errors.len() - 1
                ));
            }
            return Err(TansyError::from(diag));
        }
        self.eval_program(&outcome.program)
    }

    /// The never-failing entry point: any error folds into the `Error`
    /// value variant, so the caller always receives exactly one value.
    pub fn run(&mut self, source: &str) -> Value {
        match self.eval_source(source) {
            Ok(value) => value,
            Err(TansyError::Diagnostic(diag)) => Value::error(diag),
            Err(TansyError::Io(err)) => {
                Value::error(Diagnostic::new(DiagnosticKind::Runtime, err.to_string()))
            }
        }
    }

    pub fn eval_program(&mut self, program: &Program) -> Result<Value> {
        let mut last_value: Option<Value> = None;
        for stmt in &program.items {
            match self.execute_statement(stmt)? {
                FlowControl::Next => {}
                FlowControl::NextValue(value) => {
                    last_value = Some(value);
                }
                FlowControl::Return(value) => return Ok(value),
                FlowControl::Break(_) => {
                    return Err(TansyError::from(
                        Diagnostic::new(DiagnosticKind::Runtime, "`break` outside loop")
                            .with_span(stmt.span),
                    ));
                }
                FlowControl::Continue => {
                    return Err(TansyError::from(
                        Diagnostic::new(DiagnosticKind::Runtime, "`continue` outside loop")
                            .with_span(stmt.span),
                    ));
                }
            }
        }
        Ok(last_value.unwrap_or_else(Value::null))
    }

    /// Publish the step event for `stmt`. Free when no listener is
    /// attached; aborts evaluation when a listener signals termination.
    fn notify_step(&mut self, stmt: &Stmt) -> Result<()> {
        if self.bus.is_empty() {
            return Ok(());
        }
        let event = StepEvent {
            function: self.frames.last().cloned().unwrap_or_else(|| "<main>".into()),
            line: stmt.span.line,
            stmt: stmt_name(&stmt.kind),
            scope: Rc::clone(&self.scope),
        };
        match self.bus.publish(&event) {
            StepResponse::Resume => Ok(()),
            StepResponse::Terminate => Err(TansyError::from(
                Diagnostic::new(
                    DiagnosticKind::DebuggerTerminated,
                    "evaluation terminated by debugger",
                )
                .with_span(stmt.span),
            )),
        }
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<FlowControl> {
        self.notify_step(stmt)?;
        match &stmt.kind {
            StmtKind::Let { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::null(),
                };
                self.scope.borrow_mut().define(name.clone(), value);
                Ok(FlowControl::Next)
            }
            StmtKind::Function { name, params, body } => {
                let function = ScriptFunction {
                    name: Some(name.clone()),
                    params: params.clone(),
                    body: body.clone(),
                    scope: Rc::clone(&self.scope),
                };
                self.scope
                    .borrow_mut()
                    .define(name.clone(), Value::new(ValueKind::Function(function)));
                Ok(FlowControl::Next)
            }
            StmtKind::Expr(expr) => {
                let value = self.evaluate(expr)?;
                Ok(FlowControl::NextValue(value))
            }
            StmtKind::Block(statements) => self.execute_block(statements),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute_block(then_branch)
                } else if let Some(branch) = else_branch {
                    self.execute_block(branch)
                } else {
                    Ok(FlowControl::Next)
                }
            }
            StmtKind::While { condition, body } => {
                loop {
                    if !self.evaluate(condition)?.is_truthy() {
                        break;
                    }
                    match self.execute_block(body)? {
                        FlowControl::Next | FlowControl::NextValue(_) => {}
                        FlowControl::Continue => continue,
                        FlowControl::Break(None) => break,
                        FlowControl::Break(Some(value)) => {
                            return Ok(FlowControl::NextValue(value));
                        }
                        FlowControl::Return(value) => return Ok(FlowControl::Return(value)),
                    }
                }
                Ok(FlowControl::Next)
            }
            StmtKind::Loop { body } => {
                loop {
                    match self.execute_block(body)? {
                        FlowControl::Next | FlowControl::NextValue(_) => {}
                        FlowControl::Continue => continue,
                        FlowControl::Break(None) => break,
                        FlowControl::Break(Some(value)) => {
                            return Ok(FlowControl::NextValue(value));
                        }
                        FlowControl::Return(value) => return Ok(FlowControl::Return(value)),
                    }
                }
                Ok(FlowControl::Next)
            }
            StmtKind::For {
                binding,
                iterable,
                body,
            } => {
                let iterable_value = self.evaluate(iterable)?;
                for item in self.iterate(iterable_value, iterable.span)? {
                    let child = Scope::child(&self.scope);
                    child.borrow_mut().define(binding.clone(), item);
                    let prev = Rc::clone(&self.scope);
                    self.scope = child;
                    let flow = self.execute_block_in_place(body);
                    self.scope = prev;
                    match flow? {
                        FlowControl::Next | FlowControl::NextValue(_) => {}
                        FlowControl::Continue => continue,
                        FlowControl::Break(None) => break,
                        FlowControl::Break(Some(value)) => {
                            return Ok(FlowControl::NextValue(value));
                        }
                        FlowControl::Return(value) => return Ok(FlowControl::Return(value)),
                    }
                }
                Ok(FlowControl::Next)
            }
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::null(),
                };
                Ok(FlowControl::Return(value))
            }
            StmtKind::Break(expr) => {
                let value = match expr {
                    Some(expr) => Some(self.evaluate(expr)?),
                    None => None,
                };
                Ok(FlowControl::Break(value))
            }
            StmtKind::Continue => Ok(FlowControl::Continue),
        }
    }

    /// Run `statements` in a fresh child scope, discarded afterwards.
    fn execute_block(&mut self, statements: &[Stmt]) -> Result<FlowControl> {
        let child = Scope::child(&self.scope);
        let prev = Rc::clone(&self.scope);
        self.scope = child;
        let flow = self.execute_block_in_place(statements);
        self.scope = prev;
        flow
    }

    /// Run `statements` in the current scope (the caller already set one up).
    fn execute_block_in_place(&mut self, statements: &[Stmt]) -> Result<FlowControl> {
        let mut last_value: Option<Value> = None;
        for stmt in statements {
            match self.execute_statement(stmt)? {
                FlowControl::Next => {}
                FlowControl::NextValue(value) => {
                    last_value = Some(value);
                }
                other => return Ok(other),
            }
        }
        if let Some(value) = last_value {
            Ok(FlowControl::NextValue(value))
        } else {
            Ok(FlowControl::Next)
        }
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(literal(lit)),
            ExprKind::Variable(name) => Scope::lookup(&self.scope, name, expr.span),
            ExprKind::Binary { op, left, right } => {
                let left_value = self.evaluate(left)?;
                let right_value = self.evaluate(right)?;
                self.binary(*op, left_value, right_value, expr.span)
            }
            ExprKind::Unary { op, expr: right } => {
                let value = self.evaluate(right)?;
                self.unary(*op, value, expr.span)
            }
            ExprKind::Assign { target, value } => {
                let value = self.evaluate(value)?;
                match &target.kind {
                    ExprKind::Variable(name) => {
                        Scope::assign(&self.scope, name, value.clone(), target.span)?;
                        Ok(value)
                    }
                    ExprKind::Field {
                        target: owner,
                        field,
                    } => {
                        self.assign_field(owner, field, value.clone())?;
                        Ok(value)
                    }
                    ExprKind::Index {
                        target: owner,
                        index,
                    } => {
                        self.assign_index(owner, index, value.clone())?;
                        Ok(value)
                    }
                    _ => Err(TansyError::from(
                        Diagnostic::new(DiagnosticKind::Runtime, "invalid assignment target")
                            .with_span(target.span),
                    )),
                }
            }
            ExprKind::Call { callee, args } => {
                let callee_value = self.evaluate(callee)?;
                let mut eval_args = Vec::new();
                for arg in args {
                    eval_args.push(self.evaluate(arg)?);
                }
                self.call(callee_value, eval_args, expr.span)
            }
            ExprKind::ArrayLiteral(elements) => {
                let mut values = Vec::new();
                for element in elements {
                    values.push(self.evaluate(element)?);
                }
                Ok(Value::array(values))
            }
            ExprKind::MapLiteral(entries) => {
                let mut map = IndexMap::new();
                for (key_expr, value_expr) in entries {
                    let key_value = self.evaluate(key_expr)?;
                    let key = MapKey::from_value(&key_value, key_expr.span)?;
                    let value = self.evaluate(value_expr)?;
                    map.insert(key, value);
                }
                Ok(Value::map(map))
            }
            ExprKind::Group(inner) => self.evaluate(inner),
            ExprKind::Index { target, index } => {
                let target_value = self.evaluate(target)?;
                let index_value = self.evaluate(index)?;
                self.index(target_value, index_value, expr.span)
            }
            ExprKind::Field { target, field } => {
                let target_value = self.evaluate(target)?;
                self.field(target_value, field, expr.span)
            }
            ExprKind::Lambda { params, body } => {
                let function = ScriptFunction {
                    name: None,
                    params: params.clone(),
                    body: body.clone(),
                    scope: Rc::clone(&self.scope),
                };
                Ok(Value::new(ValueKind::Function(function)))
            }
        }
    }

    fn binary(&self, op: BinaryOp, left: Value, right: Value, span: SourceSpan) -> Result<Value> {
        use BinaryOp::*;
        match op {
            Add | Sub | Mul | Div | Mod => self.arithmetic(op, left, right, span),
            Equal => Ok(Value::bool(left.equals(&right))),
            NotEqual => Ok(Value::bool(!left.equals(&right))),
            Less | LessEqual | Greater | GreaterEqual => self.comparison(op, left, right, span),
            And => Ok(Value::bool(left.is_truthy() && right.is_truthy())),
            Or => Ok(Value::bool(left.is_truthy() || right.is_truthy())),
        }
    }

    /// Arithmetic with the numeric-promotion rule: Int op Int stays Int
    /// (truncating division); any Float operand promotes both to Float.
    /// `+` additionally concatenates strings. Everything else is a type
    /// mismatch, never an implicit coercion.
    fn arithmetic(&self, op: BinaryOp, left: Value, right: Value, span: SourceSpan) -> Result<Value> {
        use BinaryOp::*;
        match (&*left.0, &*right.0) {
            (ValueKind::Int(a), ValueKind::Int(b)) => match op {
                Add => Ok(Value::int(a.wrapping_add(*b))),
                Sub => Ok(Value::int(a.wrapping_sub(*b))),
                Mul => Ok(Value::int(a.wrapping_mul(*b))),
                Div | Mod if *b == 0 => Err(TansyError::from(
                    Diagnostic::new(DiagnosticKind::Runtime, "division by zero").with_span(span),
                )),
                Div => Ok(Value::int(a.wrapping_div(*b))),
                Mod => Ok(Value::int(a.wrapping_rem(*b))),
                _ => unreachable!("non-arithmetic operator"),
            },
            (ValueKind::Int(_) | ValueKind::Float(_), ValueKind::Int(_) | ValueKind::Float(_)) => {
                let a = as_f64(&left);
                let b = as_f64(&right);
                let result = match op {
                    Add => a + b,
                    Sub => a - b,
                    Mul => a * b,
                    Div => a / b,
                    Mod => a % b,
                    _ => unreachable!("non-arithmetic operator"),
                };
                Ok(Value::float(result))
            }
            (ValueKind::String(a), ValueKind::String(b)) if op == Add => {
                Ok(Value::string(format!("{a}{b}")))
            }
            _ => Err(TansyError::from(
                Diagnostic::new(
                    DiagnosticKind::TypeMismatch,
                    format!(
                        "operator `{}` cannot combine {} and {}",
                        op_symbol(op),
                        left.type_name(),
                        right.type_name()
                    ),
                )
                .with_span(span),
            )),
        }
    }

    fn comparison(&self, op: BinaryOp, left: Value, right: Value, span: SourceSpan) -> Result<Value> {
        use BinaryOp::*;
        let ordering = match (&*left.0, &*right.0) {
            (ValueKind::Int(a), ValueKind::Int(b)) => a.partial_cmp(b),
            (ValueKind::Int(_) | ValueKind::Float(_), ValueKind::Int(_) | ValueKind::Float(_)) => {
                as_f64(&left).partial_cmp(&as_f64(&right))
            }
            _ => {
                return Err(TansyError::from(
                    Diagnostic::new(
                        DiagnosticKind::TypeMismatch,
                        format!(
                            "operator `{}` cannot compare {} and {}",
                            op_symbol(op),
                            left.type_name(),
                            right.type_name()
                        ),
                    )
                    .with_span(span),
                ));
            }
        };
        let result = match (op, ordering) {
            (_, None) => false,
            (Less, Some(ord)) => ord.is_lt(),
            (LessEqual, Some(ord)) => ord.is_le(),
            (Greater, Some(ord)) => ord.is_gt(),
            (GreaterEqual, Some(ord)) => ord.is_ge(),
            _ => unreachable!("non-comparison operator"),
        };
        Ok(Value::bool(result))
    }

    fn unary(&self, op: UnaryOp, value: Value, span: SourceSpan) -> Result<Value> {
        match op {
            UnaryOp::Negate => match &*value.0 {
                ValueKind::Int(n) => Ok(Value::int(n.wrapping_neg())),
                ValueKind::Float(n) => Ok(Value::float(-n)),
                _ => Err(TansyError::from(
                    Diagnostic::new(
                        DiagnosticKind::TypeMismatch,
                        format!("unary `-` expects a numeric value, found {}", value.type_name()),
                    )
                    .with_span(span),
                )),
            },
            UnaryOp::Not => Ok(Value::bool(!value.is_truthy())),
        }
    }

    fn call(&mut self, callee: Value, args: Vec<Value>, span: SourceSpan) -> Result<Value> {
        match &*callee.0 {
            ValueKind::HostFunction(fun) => bridge::call_host(fun, &args, span),
            ValueKind::Function(fun) => {
                if args.len() != fun.params.len() {
                    let name = fun.name.as_deref().unwrap_or("<anonymous>");
                    return Err(TansyError::from(
                        Diagnostic::new(
                            DiagnosticKind::ArityMismatch,
                            format!(
                                "function `{name}` expected {} arguments but received {}",
                                fun.params.len(),
                                args.len()
                            ),
                        )
                        .with_span(span),
                    ));
                }
                let call_scope = Scope::child(&fun.scope);
                for (name, value) in fun.params.iter().zip(args) {
                    call_scope.borrow_mut().define(name.clone(), value);
                }
                let prev = Rc::clone(&self.scope);
                self.scope = call_scope;
                self.frames
                    .push(fun.name.clone().unwrap_or_else(|| "<anonymous>".into()));
                let outcome = self.run_function_body(&fun.body, span);
                self.frames.pop();
                self.scope = prev;
                outcome
            }
            _ => Err(TansyError::from(
                Diagnostic::new(
                    DiagnosticKind::TypeMismatch,
                    format!("{} value is not callable", callee.type_name()),
                )
                .with_span(span),
            )),
        }
    }

    /// Evaluate a function body. `return` is caught here; a loop signal
    /// reaching a call boundary is an error, never a silent escape.
    fn run_function_body(&mut self, body: &[Stmt], span: SourceSpan) -> Result<Value> {
        let mut result = Value::null();
        for stmt in body {
            match self.execute_statement(stmt)? {
                FlowControl::Next => {}
                FlowControl::NextValue(value) => {
                    result = value;
                }
                FlowControl::Return(value) => return Ok(value),
                FlowControl::Break(_) | FlowControl::Continue => {
                    return Err(TansyError::from(
                        Diagnostic::new(
                            DiagnosticKind::Runtime,
                            "loop control flow cannot escape function",
                        )
                        .with_span(span),
                    ));
                }
            }
        }
        Ok(result)
    }

    fn index(&self, target: Value, index: Value, span: SourceSpan) -> Result<Value> {
        match (&*target.0, &*index.0) {
            (ValueKind::Array(values), ValueKind::Int(idx)) => {
                usize::try_from(*idx)
                    .ok()
                    .and_then(|idx| values.get(idx))
                    .cloned()
                    .ok_or_else(|| index_out_of_bounds(*idx, span))
            }
            (ValueKind::String(text), ValueKind::Int(idx)) => usize::try_from(*idx)
                .ok()
                .and_then(|idx| text.chars().nth(idx))
                .map(|ch| Value::string(ch.to_string()))
                .ok_or_else(|| index_out_of_bounds(*idx, span)),
            (ValueKind::Map(map), _) => {
                let key = MapKey::from_value(&index, span)?;
                map.get(&key).cloned().ok_or_else(|| {
                    TansyError::from(
                        Diagnostic::new(DiagnosticKind::Runtime, format!("missing key `{key}`"))
                            .with_span(span),
                    )
                })
            }
            _ => Err(TansyError::from(
                Diagnostic::new(
                    DiagnosticKind::TypeMismatch,
                    format!(
                        "cannot index {} with {}",
                        target.type_name(),
                        index.type_name()
                    ),
                )
                .with_span(span),
            )),
        }
    }

    /// Field access. On a namespace value this is the bridge resolution
    /// point; on a map it reads a string key.
    fn field(&self, target: Value, field: &str, span: SourceSpan) -> Result<Value> {
        match &*target.0 {
            ValueKind::Namespace(namespace) => self.registry.resolve(namespace, field, span),
            ValueKind::Map(map) => map
                .get(&MapKey::String(field.to_string()))
                .cloned()
                .ok_or_else(|| {
                    TansyError::from(
                        Diagnostic::new(DiagnosticKind::Runtime, format!("missing field `{field}`"))
                            .with_span(span),
                    )
                }),
            _ => Err(TansyError::from(
                Diagnostic::new(
                    DiagnosticKind::TypeMismatch,
                    format!("field access expects a map or namespace, found {}", target.type_name()),
                )
                .with_span(span),
            )),
        }
    }

    fn assign_index(&mut self, target: &Expr, index: &Expr, value: Value) -> Result<()> {
        let target_value = self.evaluate(target)?;
        match &*target_value.0 {
            ValueKind::Array(elements) => {
                let index_value = self.evaluate(index)?;
                let idx = self.array_index(&index_value, elements.len(), index.span)?;
                let mut new_elements = elements.clone();
                new_elements[idx] = value;
                self.write_back(target, Value::array(new_elements))
            }
            ValueKind::Map(map) => {
                let index_value = self.evaluate(index)?;
                let key = MapKey::from_value(&index_value, index.span)?;
                let mut new_map = map.clone();
                new_map.insert(key, value);
                self.write_back(target, Value::map(new_map))
            }
            _ => Err(TansyError::from(
                Diagnostic::new(
                    DiagnosticKind::TypeMismatch,
                    format!(
                        "index assignment expects an array or map target, found {}",
                        target_value.type_name()
                    ),
                )
                .with_span(target.span),
            )),
        }
    }

    fn assign_field(&mut self, target: &Expr, field: &str, value: Value) -> Result<()> {
        let target_value = self.evaluate(target)?;
        match &*target_value.0 {
            ValueKind::Map(map) => {
                let mut new_map = map.clone();
                new_map.insert(MapKey::String(field.to_string()), value);
                self.write_back(target, Value::map(new_map))
            }
            _ => Err(TansyError::from(
                Diagnostic::new(
                    DiagnosticKind::TypeMismatch,
                    format!(
                        "field assignment expects a map target, found {}",
                        target_value.type_name()
                    ),
                )
                .with_span(target.span),
            )),
        }
    }

    /// Values are immutable behind `Rc`, so container assignment rebuilds
    /// the container and stores it back through the target chain.
    fn write_back(&mut self, target: &Expr, new_value: Value) -> Result<()> {
        match &target.kind {
            ExprKind::Variable(name) => Scope::assign(&self.scope, name, new_value, target.span),
            ExprKind::Field {
                target: owner,
                field,
            } => self.assign_field(owner, field, new_value),
            ExprKind::Index {
                target: owner,
                index,
            } => {
                let owner_value = self.evaluate(owner)?;
                match &*owner_value.0 {
                    ValueKind::Array(elements) => {
                        let index_value = self.evaluate(index)?;
                        let idx = self.array_index(&index_value, elements.len(), index.span)?;
                        let mut new_elements = elements.clone();
                        new_elements[idx] = new_value;
                        self.write_back(owner, Value::array(new_elements))
                    }
                    ValueKind::Map(map) => {
                        let index_value = self.evaluate(index)?;
                        let key = MapKey::from_value(&index_value, index.span)?;
                        let mut new_map = map.clone();
                        new_map.insert(key, new_value);
                        self.write_back(owner, Value::map(new_map))
                    }
                    _ => Err(TansyError::from(
                        Diagnostic::new(
                            DiagnosticKind::TypeMismatch,
                            format!(
                                "index assignment expects an array or map target, found {}",
                                owner_value.type_name()
                            ),
                        )
                        .with_span(target.span),
                    )),
                }
            }
            _ => Err(TansyError::from(
                Diagnostic::new(
                    DiagnosticKind::Runtime,
                    "cannot assign to computed expression",
                )
                .with_span(target.span),
            )),
        }
    }

    fn array_index(&self, value: &Value, len: usize, span: SourceSpan) -> Result<usize> {
        match &*value.0 {
            ValueKind::Int(idx) => usize::try_from(*idx)
                .ok()
                .filter(|idx| *idx < len)
                .ok_or_else(|| index_out_of_bounds(*idx, span)),
            _ => Err(TansyError::from(
                Diagnostic::new(
                    DiagnosticKind::TypeMismatch,
                    format!("array index must be Int, found {}", value.type_name()),
                )
                .with_span(span),
            )),
        }
    }

    fn iterate(&self, value: Value, span: SourceSpan) -> Result<Vec<Value>> {
        match &*value.0 {
            ValueKind::Array(values) => Ok(values.clone()),
            ValueKind::String(text) => {
                Ok(text.chars().map(|c| Value::string(c.to_string())).collect())
            }
            ValueKind::Map(map) => Ok(map
                .iter()
                .map(|(key, value)| Value::array(vec![key.to_value(), value.clone()]))
                .collect()),
            _ => Err(TansyError::from(
                Diagnostic::new(
                    DiagnosticKind::TypeMismatch,
                    format!("{} value is not iterable", value.type_name()),
                )
                .with_span(span),
            )),
        }
    }
}

enum FlowControl {
    Next,
    NextValue(Value),
    Return(Value),
    Break(Option<Value>),
    Continue,
}

fn literal(literal: &Literal) -> Value {
    match literal {
        Literal::Int(n) => Value::int(*n),
        Literal::Float(n) => Value::float(*n),
        Literal::Bool(b) => Value::bool(*b),
        Literal::String(s) => Value::string(s.clone()),
        Literal::Null => Value::null(),
    }
}

fn as_f64(value: &Value) -> f64 {
    match &*value.0 {
        ValueKind::Int(n) => *n as f64,
        ValueKind::Float(f) => *f,
        _ => f64::NAN,
    }
}

fn index_out_of_bounds(idx: i64, span: SourceSpan) -> TansyError {
    TansyError::from(
        Diagnostic::new(DiagnosticKind::Runtime, format!("index {idx} out of bounds"))
            .with_span(span),
    )
}

fn op_symbol(op: BinaryOp) -> &'static str {
    use BinaryOp::*;
    match op {
        Add => "+",
        Sub => "-",
        Mul => "*",
        Div => "/",
        Mod => "%",
        Equal => "==",
        NotEqual => "!=",
        Less => "<",
        LessEqual => "<=",
        Greater => ">",
        GreaterEqual => ">=",
        And => "&&",
        Or => "||",
    }
}

fn stmt_name(kind: &StmtKind) -> &'static str {
    match kind {
        StmtKind::Let { .. } => "let",
        StmtKind::Function { .. } => "fn",
        StmtKind::Expr(_) => "expr",
        StmtKind::Block(_) => "block",
        StmtKind::If { .. } => "if",
        StmtKind::While { .. } => "while",
        StmtKind::Loop { .. } => "loop",
        StmtKind::For { .. } => "for",
        StmtKind::Return(_) => "return",
        StmtKind::Break(_) => "break",
        StmtKind::Continue => "continue",
    }
}
