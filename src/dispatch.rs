//! Generic method dispatch for the host runtime
//!
//! The host calls a named method with an argument bundle and gets back a
//! value or an explicit not-implemented signal.

use log::debug;

/// Values that cross the dispatch boundary
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<Value>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        MethodCall {
            method: method.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    NotImplemented,
}

impl MethodResponse {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, MethodResponse::NotImplemented)
    }
}

pub trait MethodHandler {
    fn handle(&self, call: &MethodCall) -> MethodResponse;
}

/// Method handler the host runtime calls into.
#[derive(Debug, Default)]
pub struct BridgePlugin;

impl BridgePlugin {
    pub fn new() -> Self {
        BridgePlugin
    }
}

impl MethodHandler for BridgePlugin {
    fn handle(&self, call: &MethodCall) -> MethodResponse {
        match call.method.as_str() {
            "sayHello" => MethodResponse::Success(Value::from("hello")),
            other => {
                debug!("Method '{}' is not implemented", other);
                MethodResponse::NotImplemented
            }
        }
    }
}
