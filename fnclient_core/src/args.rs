//! Binding model-supplied arguments to parameters by name.

use serde_json::{Map, Value};

use crate::error::{ArgumentError, ToolError};
use crate::types::ToolParam;

/// Named arguments of one tool call.
///
/// Each parameter is taken out exactly once; [`Arguments::finish`] then
/// rejects anything the function did not declare.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    function: String,
    values: Map<String, Value>,
}

impl Arguments {
    pub fn new(function: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            function: function.into(),
            values,
        }
    }

    /// Decodes the raw argument text of a tool call. Blank text is an empty
    /// argument list.
    pub fn parse(function: &str, raw: &str) -> Result<Self, ToolError> {
        if raw.trim().is_empty() {
            return Ok(Self::new(function, Map::new()));
        }
        let value: Value = serde_json::from_str(raw).map_err(|e| ToolError::Deserialize {
            function: function.to_owned(),
            source: ArgumentError::Malformed(e.to_string()),
        })?;
        Self::from_value(function, value)
    }

    pub fn from_value(function: &str, value: Value) -> Result<Self, ToolError> {
        match value {
            Value::Object(values) => Ok(Self::new(function, values)),
            Value::Null => Ok(Self::new(function, Map::new())),
            other => Err(ToolError::Deserialize {
                function: function.to_owned(),
                source: ArgumentError::Malformed(format!("expected an object, got {other}")),
            }),
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Takes the argument `name`. Missing arguments are only accepted for
    /// optional parameter types.
    pub fn take<T: ToolParam>(&mut self, name: &str) -> Result<T, ToolError> {
        match self.values.remove(name) {
            Some(value) => T::from_value(value)
                .map_err(|reason| self.error(ArgumentError::invalid(name, reason))),
            None => T::absent()
                .ok_or_else(|| self.error(ArgumentError::Missing(name.to_owned()))),
        }
    }

    /// Takes the argument `name`, falling back to `default` when it is missing
    /// or `null`.
    pub fn take_or_else<T, F>(&mut self, name: &str, default: F) -> Result<T, ToolError>
    where
        T: ToolParam,
        F: FnOnce() -> T,
    {
        match self.values.remove(name) {
            None | Some(Value::Null) => Ok(default()),
            Some(value) => T::from_value(value)
                .map_err(|reason| self.error(ArgumentError::invalid(name, reason))),
        }
    }

    /// Fails if any argument was not taken.
    pub fn finish(self) -> Result<(), ToolError> {
        match self.values.keys().next() {
            None => Ok(()),
            Some(extra) => Err(self.error(ArgumentError::Unexpected(extra.clone()))),
        }
    }

    fn error(&self, source: ArgumentError) -> ToolError {
        ToolError::Deserialize {
            function: self.function.clone(),
            source,
        }
    }
}
