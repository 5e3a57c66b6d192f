//! Tool descriptors in the chat-completions function-calling format.
//!
//! A [`FunctionSpec`] is the language-neutral description of a function
//! (name, doc block, typed parameters). [`build_descriptor`] turns it into
//! the [`ToolDescriptor`] sent to the model:
//!
//! ```json
//! { "type": "function",
//!   "function": {
//!     "name": "...", "description": "...",
//!     "parameters": {
//!       "type": "object",
//!       "properties": { "<param>": { "type": "...", "enum": [...], "description": "..." } },
//!       "required": ["..."] } } }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::doc::parse_doc;
use crate::error::ToolError;
use crate::types::{DeclaredType, ToolParam, TypeFragment, map_type};

// ============================================================================
// FUNCTION SPECS
// ============================================================================

/// One parameter of a registrable function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    /// `None` when the parameter carries no type declaration.
    pub declared: Option<DeclaredType>,
    pub has_default: bool,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, declared: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared: Some(declared),
            has_default: false,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared: None,
            has_default: false,
        }
    }

    /// Parameter typed after a Rust [`ToolParam`]; `Option<T>` has a default.
    pub fn of<T: ToolParam>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared: Some(T::declared_type()),
            has_default: T::OPTIONAL,
        }
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }
}

/// Name, documentation and ordered parameters of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: String,
    pub doc: Option<String>,
    pub params: Vec<ParamSpec>,
}

impl FunctionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }
}

// ============================================================================
// DESCRIPTORS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Function,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    #[default]
    Object,
}

/// Schema of one parameter. `name` and `required` are not serialized: the
/// name is the property key and requiredness lives in the parent's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDescriptor {
    #[serde(skip)]
    pub name: String,
    #[serde(flatten)]
    pub fragment: TypeFragment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParametersSchema {
    #[serde(rename = "type")]
    pub kind: SchemaKind,
    pub properties: IndexMap<String, ParameterDescriptor>,
    pub required: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: ParametersSchema,
}

/// A tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    #[serde(rename = "type")]
    pub kind: ToolKind,
    pub function: FunctionDescriptor,
}

impl ToolDescriptor {
    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn description(&self) -> Option<&str> {
        self.function.description.as_deref()
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.function.parameters.properties.get(name)
    }

    pub fn parameters(&self) -> impl Iterator<Item = &ParameterDescriptor> + '_ {
        self.function.parameters.properties.values()
    }

    pub fn required(&self) -> &[String] {
        &self.function.parameters.required
    }

    pub fn to_value(&self) -> Result<Value, ToolError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Derives the descriptor for `spec`.
///
/// Parameters keep declaration order. A parameter is required iff it has no
/// default. The summary line becomes the description; when there is none the
/// field is omitted.
pub fn build_descriptor(spec: &FunctionSpec) -> Result<ToolDescriptor, ToolError> {
    let doc = parse_doc(spec.doc.as_deref());

    let mut properties = IndexMap::with_capacity(spec.params.len());
    let mut required = Vec::new();

    for param in &spec.params {
        if properties.contains_key(&param.name) {
            return Err(ToolError::DuplicateParameter {
                function: spec.name.clone(),
                parameter: param.name.clone(),
            });
        }

        let fragment = map_type(&spec.name, &param.name, param.declared.as_ref())?;
        let is_required = !param.has_default;
        if is_required {
            required.push(param.name.clone());
        }

        properties.insert(
            param.name.clone(),
            ParameterDescriptor {
                name: param.name.clone(),
                fragment,
                description: doc.parameter(&param.name).map(str::to_owned),
                required: is_required,
            },
        );
    }

    let description = (!doc.summary.is_empty()).then_some(doc.summary);

    Ok(ToolDescriptor {
        kind: ToolKind::Function,
        function: FunctionDescriptor {
            name: spec.name.clone(),
            description,
            parameters: ParametersSchema {
                kind: SchemaKind::Object,
                properties,
                required,
            },
        },
    })
}
