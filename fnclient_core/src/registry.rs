//! The function registry: tool name → descriptor + invocable function.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use indexmap::IndexMap;
use serde_json::Value;

use crate::args::Arguments;
use crate::error::ToolError;
use crate::output::IntoToolOutput;
use crate::schema::{FunctionSpec, ToolDescriptor, build_descriptor};

/// Type-erased tool function: named arguments in, reply text out.
pub type ToolFunc =
    dyn Fn(Arguments) -> BoxFuture<'static, Result<String, ToolError>> + Send + Sync;

/// Link-time registration submitted by the `#[tool]` macro.
pub struct ToolRegistration {
    pub name: &'static str,
    pub spec: fn() -> FunctionSpec,
    pub call: fn(Arguments) -> BoxFuture<'static, Result<String, ToolError>>,
}

impl ToolRegistration {
    pub const fn new(
        name: &'static str,
        spec: fn() -> FunctionSpec,
        call: fn(Arguments) -> BoxFuture<'static, Result<String, ToolError>>,
    ) -> Self {
        Self { name, spec, call }
    }

    /// Looks up a `#[tool]` function linked into the binary.
    pub fn find(name: &str) -> Option<&'static ToolRegistration> {
        inventory::iter::<ToolRegistration>
            .into_iter()
            .find(|reg| reg.name == name)
    }
}

inventory::collect!(ToolRegistration);

#[derive(Clone)]
struct Entry {
    descriptor: ToolDescriptor,
    func: Arc<ToolFunc>,
}

/// Tools available to a conversation, in registration order.
///
/// Descriptors are derived once, when a function is registered.
/// Re-registering a name with a structurally equal descriptor replaces the
/// function; a different descriptor under a taken name is an error.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    entries: IndexMap<String, Entry>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("tools", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a closure under `spec`.
    ///
    /// The closure returns `Result<O, ToolError>`, so `args.take(..)?` keeps
    /// argument errors as [`ToolError::Deserialize`]. Its own failures go in
    /// `O` (for example `Result<T, E: Display>`) or as
    /// [`ToolError::Invocation`].
    ///
    /// ```rust
    /// # use fnclient_core::{FunctionRegistry, FunctionSpec, ParamSpec};
    /// let mut tools = FunctionRegistry::new();
    /// tools
    ///     .register(
    ///         FunctionSpec::new("greet")
    ///             .with_doc("Greets someone\nname: who to greet")
    ///             .param(ParamSpec::of::<String>("name")),
    ///         |mut args| async move {
    ///             let name: String = args.take("name")?;
    ///             args.finish()?;
    ///             Ok::<_, fnclient_core::ToolError>(format!("Hello, {name}!"))
    ///         },
    ///     )
    ///     .unwrap();
    /// assert!(tools.contains("greet"));
    /// ```
    pub fn register<F, Fut, O>(
        &mut self,
        spec: FunctionSpec,
        func: F,
    ) -> Result<&mut Self, ToolError>
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, ToolError>> + Send + 'static,
        O: IntoToolOutput,
    {
        let descriptor = build_descriptor(&spec)?;
        let func = Arc::new(func);
        let erased: Arc<ToolFunc> = Arc::new(move |args: Arguments| {
            let func = func.clone();
            async move { func(args).await?.into_tool_output() }.boxed()
        });
        self.insert(descriptor, erased)
    }

    /// Registers a `#[tool]` function.
    pub fn register_tool(
        &mut self,
        registration: &ToolRegistration,
    ) -> Result<&mut Self, ToolError> {
        let descriptor = build_descriptor(&(registration.spec)())?;
        self.insert(descriptor, Arc::new(registration.call))
    }

    /// Registers the `#[tool]` function called `name`.
    pub fn register_named(&mut self, name: &str) -> Result<&mut Self, ToolError> {
        let registration =
            ToolRegistration::find(name).ok_or_else(|| ToolError::not_found(name))?;
        self.register_tool(registration)
    }

    /// Every `#[tool]` function linked into the binary.
    pub fn collect_tools() -> Result<Self, ToolError> {
        let mut registry = Self::new();
        for registration in inventory::iter::<ToolRegistration> {
            registry.register_tool(registration)?;
        }
        Ok(registry)
    }

    /// The named `#[tool]` functions, in the given order.
    pub fn collect_only<I, S>(names: I) -> Result<Self, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.register_named(name.as_ref())?;
        }
        Ok(registry)
    }

    fn insert(
        &mut self,
        descriptor: ToolDescriptor,
        func: Arc<ToolFunc>,
    ) -> Result<&mut Self, ToolError> {
        let name = descriptor.name().to_owned();
        if let Some(existing) = self.entries.get(&name) {
            if existing.descriptor != descriptor {
                return Err(ToolError::AlreadyRegistered { name });
            }
            tracing::debug!(tool = %name, "re-registering tool with identical descriptor");
        } else {
            tracing::debug!(tool = %name, "registered tool");
        }
        self.entries.insert(name, Entry { descriptor, func });
        Ok(self)
    }

    pub fn unregister(&mut self, name: &str) -> Result<(), ToolError> {
        self.entries
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| ToolError::not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.entries.get(name).map(|entry| &entry.descriptor)
    }

    /// Descriptors in registration order, ready to send to the model.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.entries.values().map(|entry| entry.descriptor.clone()).collect()
    }

    pub fn descriptions(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.descriptor.description()))
    }

    pub fn json(&self) -> Result<Value, ToolError> {
        let list: Vec<&ToolDescriptor> = self
            .entries
            .values()
            .map(|entry| &entry.descriptor)
            .collect();
        Ok(serde_json::to_value(list)?)
    }

    /// Invokes `name` with already-decoded arguments. A panic inside the
    /// function becomes [`ToolError::Invocation`].
    pub async fn call(&self, name: &str, args: Arguments) -> Result<String, ToolError> {
        let func = self
            .entries
            .get(name)
            .map(|entry| entry.func.clone())
            .ok_or_else(|| ToolError::not_found(name))?;

        match AssertUnwindSafe(func(args)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(ToolError::Invocation(format!(
                "tool '{name}' panicked: {}",
                panic_message(panic.as_ref())
            ))),
        }
    }

    /// Decodes `raw` JSON arguments and invokes `name`.
    pub async fn call_raw(&self, name: &str, raw: &str) -> Result<String, ToolError> {
        if !self.contains(name) {
            return Err(ToolError::not_found(name));
        }
        let args = Arguments::parse(name, raw)?;
        self.call(name, args).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArgumentError;
    use crate::schema::ParamSpec;
    use crate::types::DeclaredType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn add_spec() -> FunctionSpec {
        FunctionSpec::new("add")
            .with_doc("Adds two values\na: left operand\nb: right operand")
            .param(ParamSpec::of::<i64>("a"))
            .param(ParamSpec::of::<i64>("b"))
    }

    fn add_registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        registry
            .register(add_spec(), |mut args| async move {
                let a: i64 = args.take("a")?;
                let b: i64 = args.take("b")?;
                args.finish()?;
                Ok::<_, ToolError>(a + b)
            })
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_register_and_call() {
        let registry = add_registry();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.call_raw("add", r#"{"a": 1, "b": 2}"#).await.unwrap(), "3");
        assert_eq!(
            registry.descriptor("add").unwrap().description(),
            Some("Adds two values")
        );
    }

    #[tokio::test]
    async fn test_invalid_function_name() {
        let registry = add_registry();
        let err = registry.call_raw("ghost", "{}").await.unwrap_err();
        assert!(matches!(err, ToolError::FunctionNotFound { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_deserialization_error() {
        let registry = add_registry();
        let err = registry
            .call_raw("add", r#"{"a": "one", "b": 2}"#)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::Deserialize { source: ArgumentError::Invalid { .. }, .. }
        ));
    }

    #[tokio::test]
    async fn test_closure_argument_errors_stay_decode_errors() {
        let mut registry = FunctionRegistry::new();
        registry
            .register(
                FunctionSpec::new("echo").param(ParamSpec::of::<String>("text")),
                |mut args| async move {
                    let text: String = args.take("text")?;
                    args.finish()?;
                    Ok::<_, ToolError>(text)
                },
            )
            .unwrap();

        let err = registry.call_raw("echo", r#"{"text": 5}"#).await.unwrap_err();
        let ToolError::Deserialize { function, source } = err else {
            panic!("expected a decode error, got {err:?}");
        };
        assert_eq!(function, "echo");
        assert!(matches!(source, ArgumentError::Invalid { .. }));
        let err = registry.call_raw("echo", "{}").await.unwrap_err();
        assert!(matches!(err, ToolError::Deserialize { source: ArgumentError::Missing(_), .. }));
    }

    #[tokio::test]
    async fn test_function_error_is_invocation_error() {
        let mut registry = FunctionRegistry::new();
        registry
            .register(FunctionSpec::new("fail"), |_args| async {
                Ok::<_, ToolError>(Err::<String, _>("weather service unavailable"))
            })
            .unwrap()
            .register(FunctionSpec::new("raise"), |_args| async {
                Err::<String, _>(ToolError::Invocation("quota exceeded".into()))
            })
            .unwrap();

        let err = registry.call_raw("fail", "").await.unwrap_err();
        assert!(matches!(err, ToolError::Invocation(_)));
        assert_eq!(err.to_string(), "weather service unavailable");

        let err = registry.call_raw("raise", "").await.unwrap_err();
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[tokio::test]
    async fn test_panic_is_caught() {
        let mut registry = FunctionRegistry::new();
        registry
            .register(FunctionSpec::new("explode"), |_args| async {
                if true {
                    panic!("kaboom");
                }
                Ok::<_, ToolError>("unreachable")
            })
            .unwrap();
        let err = registry.call_raw("explode", "{}").await.unwrap_err();
        assert!(
            matches!(err, ToolError::Invocation(ref m) if m == "tool 'explode' panicked: kaboom")
        );
    }

    #[test]
    fn test_idempotent_registration() {
        let mut registry = add_registry();
        let first = registry.descriptor("add").unwrap().clone();
        registry
            .register(add_spec(), |_args| async { Ok::<_, ToolError>(0_i64) })
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.descriptor("add").unwrap(), &first);
    }

    #[test]
    fn test_conflicting_registration() {
        let mut registry = add_registry();
        let other = FunctionSpec::new("add").param(ParamSpec::of::<String>("text"));
        let err = registry.register(other, |_args| async { Ok::<_, ToolError>("") }).unwrap_err();
        assert!(matches!(err, ToolError::AlreadyRegistered { ref name } if name == "add"));
    }

    #[test]
    fn test_unsupported_type_fails_registration() {
        let mut registry = FunctionRegistry::new();
        let spec =
            FunctionSpec::new("area").param(ParamSpec::new("radius", DeclaredType::other("f64")));
        let err = registry.register(spec, |_args| async { Ok::<_, ToolError>("") }).unwrap_err();
        assert!(matches!(err, ToolError::UnsupportedType { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_descriptors_in_registration_order() {
        let mut registry = FunctionRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register(FunctionSpec::new(name), |_args| async { Ok::<_, ToolError>("") })
                .unwrap();
        }
        let names: Vec<_> = registry
            .descriptors()
            .iter()
            .map(|d| d.name().to_owned())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);

        let json = registry.json().unwrap();
        assert_eq!(json.as_array().unwrap().len(), 3);
        assert_eq!(json[0]["function"]["name"], "zeta");
    }

    #[tokio::test]
    async fn test_unregister() {
        let mut registry = add_registry();
        registry.unregister("add").unwrap();
        assert!(!registry.contains("add"));
        assert!(matches!(
            registry.unregister("add"),
            Err(ToolError::FunctionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_stateful_closure() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = FunctionRegistry::new();
        {
            let counter = counter.clone();
            registry
                .register(FunctionSpec::new("inc"), move |_args| {
                    let counter = counter.clone();
                    async move { Ok::<_, ToolError>(counter.fetch_add(1, Ordering::SeqCst) + 1) }
                })
                .unwrap();
        }
        assert_eq!(registry.call_raw("inc", "").await.unwrap(), "1");
        assert_eq!(registry.call_raw("inc", "").await.unwrap(), "2");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
