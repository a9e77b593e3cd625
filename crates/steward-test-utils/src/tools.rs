use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use steward_core::{ToolError, ToolInvoker, ToolSpec};

#[derive(Clone, Default)]
pub struct DummyInvoker {
    tools: Vec<(ToolSpec, Value)>,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl DummyInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        result: Value,
    ) -> Self {
        self.tools.push((ToolSpec::new(name, description), result));
        self
    }

    /// Invocations seen so far, as (tool name, arguments) pairs.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ToolInvoker for DummyInvoker {
    fn tools(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|(spec, _)| spec.clone()).collect()
    }

    async fn invoke(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        self.calls.lock().push((name.to_string(), arguments));
        self.tools
            .iter()
            .find(|(spec, _)| spec.name == name)
            .map(|(_, result)| result.clone())
            .ok_or_else(|| ToolError::Unknown(name.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct FailingInvoker {
    tools: Vec<ToolSpec>,
    message: String,
}

impl FailingInvoker {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            tools: Vec::new(),
            message: message.into(),
        }
    }

    pub fn with_tool(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.tools.push(ToolSpec::new(name, description));
        self
    }
}

#[async_trait]
impl ToolInvoker for FailingInvoker {
    fn tools(&self) -> Vec<ToolSpec> {
        self.tools.clone()
    }

    async fn invoke(&self, _name: &str, _arguments: Value) -> Result<Value, ToolError> {
        Err(ToolError::ExecutionFailed(self.message.clone()))
    }
}
