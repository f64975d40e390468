use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, SourceSpan, TansyError},
    value::Value,
};

pub type ScopeRef = Rc<RefCell<Scope>>;

/// One lexical binding frame. Frames chain outward through `parent`;
/// closures keep their defining frame alive by holding a `ScopeRef`.
#[derive(Default)]
pub struct Scope {
    parent: Option<ScopeRef>,
    bindings: IndexMap<String, Value>,
}

impl Scope {
    pub fn root() -> ScopeRef {
        Rc::new(RefCell::new(Self {
            parent: None,
            bindings: IndexMap::new(),
        }))
    }

    pub fn child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(Self {
            parent: Some(Rc::clone(parent)),
            bindings: IndexMap::new(),
        }))
    }

    /// Bind `name` in this frame, shadowing any outer binding.
    pub fn define(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Overwrite the nearest existing binding of `name`. Assignment never
    /// declares: an unbound name is an error.
    pub fn assign(
        scope: &ScopeRef,
        name: &str,
        value: Value,
        span: SourceSpan,
    ) -> Result<(), TansyError> {
        if scope.borrow().bindings.contains_key(name) {
            scope.borrow_mut().bindings.insert(name.to_string(), value);
            return Ok(());
        }
        if let Some(parent) = scope.borrow().parent.clone() {
            return Scope::assign(&parent, name, value, span);
        }
        Err(TansyError::from(
            Diagnostic::new(
                DiagnosticKind::UndefinedIdentifier,
                format!("undefined identifier `{name}`"),
            )
            .with_span(span),
        ))
    }

    /// Resolve `name`, walking outward until found or the chain ends.
    pub fn lookup(scope: &ScopeRef, name: &str, span: SourceSpan) -> Result<Value, TansyError> {
        Scope::resolve(scope, name).ok_or_else(|| {
            TansyError::from(
                Diagnostic::new(
                    DiagnosticKind::UndefinedIdentifier,
                    format!("undefined identifier `{name}`"),
                )
                .with_span(span),
            )
        })
    }

    /// Non-erroring lookup, used by the debugger's `inspect`.
    pub fn resolve(scope: &ScopeRef, name: &str) -> Option<Value> {
        if let Some(value) = scope.borrow().bindings.get(name) {
            return Some(value.clone());
        }
        let parent = scope.borrow().parent.clone();
        parent.and_then(|parent| Scope::resolve(&parent, name))
    }
}
