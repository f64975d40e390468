use std::{any::Any, fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{
    ast::Stmt,
    diagnostics::{Diagnostic, DiagnosticKind, SourceSpan, TansyError},
    scope::ScopeRef,
};

#[derive(Clone)]
pub struct Value(pub Rc<ValueKind>);

impl Value {
    pub fn new(kind: ValueKind) -> Self {
        Self(Rc::new(kind))
    }

    pub fn null() -> Self {
        Self::new(ValueKind::Null)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ValueKind::Bool(value))
    }

    pub fn int(value: i64) -> Self {
        Self::new(ValueKind::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Self::new(ValueKind::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ValueKind::String(value.into()))
    }

    pub fn array(values: Vec<Value>) -> Self {
        Self::new(ValueKind::Array(values))
    }

    pub fn map(entries: IndexMap<MapKey, Value>) -> Self {
        Self::new(ValueKind::Map(entries))
    }

    pub fn namespace(name: impl Into<String>) -> Self {
        Self::new(ValueKind::Namespace(name.into()))
    }

    pub fn host(tag: &'static str, data: Rc<dyn Any>) -> Self {
        Self::new(ValueKind::Host(HostValue { tag, data }))
    }

    pub fn error(diagnostic: Diagnostic) -> Self {
        Self::new(ValueKind::Error(Box::new(diagnostic)))
    }

    pub fn is_truthy(&self) -> bool {
        match &*self.0 {
            ValueKind::Null => false,
            ValueKind::Bool(b) => *b,
            ValueKind::Int(n) => *n != 0,
            ValueKind::Float(f) => *f != 0.0,
            ValueKind::String(s) => !s.is_empty(),
            ValueKind::Array(values) => !values.is_empty(),
            ValueKind::Map(map) => !map.is_empty(),
            ValueKind::Error(_) => false,
            ValueKind::Function(_)
            | ValueKind::HostFunction(_)
            | ValueKind::Namespace(_)
            | ValueKind::Host(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match &*self.0 {
            ValueKind::Null => "Null",
            ValueKind::Bool(_) => "Bool",
            ValueKind::Int(_) => "Int",
            ValueKind::Float(_) => "Float",
            ValueKind::String(_) => "String",
            ValueKind::Array(_) => "Array",
            ValueKind::Map(_) => "Map",
            ValueKind::Function(_) | ValueKind::HostFunction(_) => "Function",
            ValueKind::Namespace(_) => "Namespace",
            ValueKind::Host(_) => "Host",
            ValueKind::Error(_) => "Error",
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(&*self.0, ValueKind::Int(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(&*self.0, ValueKind::Error(_))
    }

    /// Structural equality. Strict per variant: `1 == 1.0` is false.
    pub fn equals(&self, other: &Value) -> bool {
        match (&*self.0, &*other.0) {
            (ValueKind::Null, ValueKind::Null) => true,
            (ValueKind::Bool(a), ValueKind::Bool(b)) => a == b,
            (ValueKind::Int(a), ValueKind::Int(b)) => a == b,
            (ValueKind::Float(a), ValueKind::Float(b)) => a == b,
            (ValueKind::String(a), ValueKind::String(b)) => a == b,
            (ValueKind::Array(a), ValueKind::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(l, r)| l.equals(r))
            }
            (ValueKind::Map(a), ValueKind::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.get(key).map(|rhs| value.equals(rhs)).unwrap_or(false)
                    })
            }
            (ValueKind::Host(a), ValueKind::Host(b)) => {
                a.tag == b.tag && Rc::ptr_eq(&a.data, &b.data)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ValueKind::Null => write!(f, "Null"),
            ValueKind::Bool(b) => write!(f, "{b}"),
            ValueKind::Int(n) => write!(f, "{n}"),
            ValueKind::Float(n) => write!(f, "{n}"),
            ValueKind::String(s) => write!(f, "\"{s}\""),
            ValueKind::Array(values) => f.debug_list().entries(values.iter()).finish(),
            ValueKind::Map(map) => f.debug_map().entries(map.iter()).finish(),
            ValueKind::Function(fun) => write!(
                f,
                "<fn {}>",
                fun.name.clone().unwrap_or_else(|| "<anonymous>".into())
            ),
            ValueKind::HostFunction(fun) => write!(f, "<host fn {}>", fun.name),
            ValueKind::Namespace(name) => write!(f, "<namespace {name}>"),
            ValueKind::Host(host) => write!(f, "<host {}>", host.tag),
            ValueKind::Error(diag) => write!(f, "<error {:?}: {}>", diag.kind, diag.message),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Bool(b) => write!(f, "{b}"),
            ValueKind::Int(n) => write!(f, "{n}"),
            ValueKind::Float(n) => write!(f, "{n}"),
            ValueKind::String(s) => write!(f, "{s}"),
            ValueKind::Array(values) => {
                write!(f, "[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            ValueKind::Map(map) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            ValueKind::Function(fun) => write!(
                f,
                "<fn {}>",
                fun.name.clone().unwrap_or_else(|| "<anonymous>".into())
            ),
            ValueKind::HostFunction(fun) => write!(f, "<host fn {}>", fun.name),
            ValueKind::Namespace(name) => write!(f, "<namespace {name}>"),
            ValueKind::Host(host) => write!(f, "<host {}>", host.tag),
            ValueKind::Error(diag) => write!(f, "error: {}", diag.message),
        }
    }
}

#[derive(Clone)]
pub enum ValueKind {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(IndexMap<MapKey, Value>),
    Function(ScriptFunction),
    HostFunction(HostFunction),
    Namespace(String),
    Host(HostValue),
    Error(Box<Diagnostic>),
}

/// Keys a script map may use. A restriction of `Value` to the hashable
/// scalar variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Int(i64),
    Bool(bool),
    String(String),
}

impl MapKey {
    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Int(n) => Value::int(*n),
            MapKey::Bool(b) => Value::bool(*b),
            MapKey::String(s) => Value::string(s.clone()),
        }
    }

    pub fn from_value(value: &Value, span: SourceSpan) -> Result<MapKey, TansyError> {
        match &*value.0 {
            ValueKind::Int(n) => Ok(MapKey::Int(*n)),
            ValueKind::Bool(b) => Ok(MapKey::Bool(*b)),
            ValueKind::String(s) => Ok(MapKey::String(s.clone())),
            _ => Err(TansyError::from(
                Diagnostic::new(
                    DiagnosticKind::TypeMismatch,
                    format!(
                        "map keys must be Int, Bool, or String, found {}",
                        value.type_name()
                    ),
                )
                .with_span(span),
            )),
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Int(n) => write!(f, "{n}"),
            MapKey::Bool(b) => write!(f, "{b}"),
            MapKey::String(s) => write!(f, "{s}"),
        }
    }
}

/// A script-defined function: a closure over the scope it was created in.
#[derive(Clone)]
pub struct ScriptFunction {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub scope: ScopeRef,
}

/// Arity sentinel for host functions accepting any argument count.
pub const VARIADIC: usize = usize::MAX;

/// A pre-wrapped host adapter: unmarshals its own arguments, calls into
/// native code, and marshals the result back.
#[derive(Clone)]
pub struct HostFunction {
    pub name: String,
    pub arity: usize,
    pub callback: fn(&[Value]) -> Result<Value, TansyError>,
}

/// An opaque host-native value passing through script code unchanged.
/// The tag identifies the wrapped type so the host side can downcast it
/// back out.
#[derive(Clone)]
pub struct HostValue {
    pub tag: &'static str,
    pub data: Rc<dyn Any>,
}

impl HostValue {
    pub fn downcast<T: 'static>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }
}
