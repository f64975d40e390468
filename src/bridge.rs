use indexmap::IndexMap;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, SourceSpan, TansyError},
    value::{HostFunction, MapKey, Value, ValueKind, VARIADIC},
};

/// A symbol a namespace exposes to scripts: either a pre-wrapped adapter
/// function or a constant value.
#[derive(Clone)]
pub enum HostSymbol {
    Function(HostFunction),
    Constant(Value),
}

/// The registry connecting script-visible `namespace.symbol` references to
/// host functionality. Built by the embedder before evaluation begins and
/// shared read-only with every interpreter that uses it; this is the only
/// place script values are marshaled to and from host-native form.
#[derive(Default)]
pub struct HostRegistry {
    namespaces: IndexMap<String, IndexMap<String, HostSymbol>>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group of adapter functions under `namespace`.
    /// Re-registration of an existing name is last-write-wins.
    pub fn register_functions(
        &mut self,
        namespace: &str,
        entries: &[(&str, usize, fn(&[Value]) -> Result<Value, TansyError>)],
    ) {
        let table = self.namespaces.entry(namespace.to_string()).or_default();
        for (name, arity, callback) in entries {
            table.insert(
                (*name).to_string(),
                HostSymbol::Function(HostFunction {
                    name: format!("{namespace}.{name}"),
                    arity: *arity,
                    callback: *callback,
                }),
            );
        }
    }

    /// Register a group of constant values under `namespace`.
    pub fn register_constants(&mut self, namespace: &str, entries: Vec<(&str, Value)>) {
        let table = self.namespaces.entry(namespace.to_string()).or_default();
        for (name, value) in entries {
            table.insert(name.to_string(), HostSymbol::Constant(value));
        }
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    pub fn namespace_names(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Resolve `namespace.name` to a script value. Functions surface as
    /// `HostFunction` values, constants as themselves.
    pub fn resolve(
        &self,
        namespace: &str,
        name: &str,
        span: SourceSpan,
    ) -> Result<Value, TansyError> {
        let symbol = self
            .namespaces
            .get(namespace)
            .and_then(|table| table.get(name))
            .ok_or_else(|| {
                TansyError::from(
                    Diagnostic::new(
                        DiagnosticKind::UnknownHostSymbol,
                        format!("unknown host symbol `{namespace}.{name}`"),
                    )
                    .with_span(span),
                )
            })?;
        Ok(match symbol {
            HostSymbol::Function(fun) => Value::new(ValueKind::HostFunction(fun.clone())),
            HostSymbol::Constant(value) => value.clone(),
        })
    }
}

/// Invoke a host adapter. The arity gate lives here so adapters only see
/// argument lists of the length they declared.
pub fn call_host(fun: &HostFunction, args: &[Value], span: SourceSpan) -> Result<Value, TansyError> {
    if fun.arity != VARIADIC && args.len() != fun.arity {
        return Err(TansyError::from(
            Diagnostic::new(
                DiagnosticKind::ArityMismatch,
                format!(
                    "`{}` expected {} arguments but received {}",
                    fun.name,
                    fun.arity,
                    args.len()
                ),
            )
            .with_span(span),
        ));
    }
    (fun.callback)(args)
}

/// Wrap a host-side failure so it surfaces to the script as a catchable
/// error rather than an abort.
pub fn host_failure(name: &str, description: impl std::fmt::Display) -> TansyError {
    TansyError::from(Diagnostic::new(
        DiagnosticKind::HostCallFailure,
        format!("`{name}` failed: {description}"),
    ))
}

fn argument_mismatch(name: &str, expected: &str, found: &Value) -> TansyError {
    TansyError::from(Diagnostic::new(
        DiagnosticKind::TypeMismatch,
        format!(
            "`{name}` expected {expected} but found {}",
            found.type_name()
        ),
    ))
}

pub fn expect_str<'a>(value: &'a Value, name: &str) -> Result<&'a str, TansyError> {
    match &*value.0 {
        ValueKind::String(s) => Ok(s),
        _ => Err(argument_mismatch(name, "String", value)),
    }
}

pub fn expect_int(value: &Value, name: &str) -> Result<i64, TansyError> {
    match &*value.0 {
        ValueKind::Int(n) => Ok(*n),
        _ => Err(argument_mismatch(name, "Int", value)),
    }
}

/// Accepts Int or Float, applying the numeric-promotion rule.
pub fn expect_number(value: &Value, name: &str) -> Result<f64, TansyError> {
    match &*value.0 {
        ValueKind::Int(n) => Ok(*n as f64),
        ValueKind::Float(f) => Ok(*f),
        _ => Err(argument_mismatch(name, "numeric", value)),
    }
}

pub fn expect_bool(value: &Value, name: &str) -> Result<bool, TansyError> {
    match &*value.0 {
        ValueKind::Bool(b) => Ok(*b),
        _ => Err(argument_mismatch(name, "Bool", value)),
    }
}

pub fn expect_array<'a>(value: &'a Value, name: &str) -> Result<&'a [Value], TansyError> {
    match &*value.0 {
        ValueKind::Array(values) => Ok(values),
        _ => Err(argument_mismatch(name, "Array", value)),
    }
}

pub fn expect_map<'a>(
    value: &'a Value,
    name: &str,
) -> Result<&'a indexmap::IndexMap<MapKey, Value>, TansyError> {
    match &*value.0 {
        ValueKind::Map(map) => Ok(map),
        _ => Err(argument_mismatch(name, "Map", value)),
    }
}
