//! Turning a tool function's return value into reply text.

use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;

use crate::error::ToolError;

/// Return types a tool function may use.
///
/// `Result<T, E>` maps `Err(e)` to [`ToolError::Invocation`] carrying
/// `e.to_string()` unchanged, so the model sees the function's own message.
pub trait IntoToolOutput {
    fn into_tool_output(self) -> Result<String, ToolError>;
}

/// Serializes the wrapped value as JSON text.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoToolOutput for Json<T> {
    fn into_tool_output(self) -> Result<String, ToolError> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

impl IntoToolOutput for String {
    fn into_tool_output(self) -> Result<String, ToolError> {
        Ok(self)
    }
}

impl IntoToolOutput for &str {
    fn into_tool_output(self) -> Result<String, ToolError> {
        Ok(self.to_owned())
    }
}

impl IntoToolOutput for () {
    fn into_tool_output(self) -> Result<String, ToolError> {
        Ok(String::new())
    }
}

impl IntoToolOutput for Value {
    fn into_tool_output(self) -> Result<String, ToolError> {
        match self {
            Value::String(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }
}

macro_rules! display {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl IntoToolOutput for $ty {
                fn into_tool_output(self) -> Result<String, ToolError> {
                    Ok(self.to_string())
                }
            }
        )+
    };
}

display!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char
);

impl<T, E> IntoToolOutput for Result<T, E>
where
    T: IntoToolOutput,
    E: Display,
{
    fn into_tool_output(self) -> Result<String, ToolError> {
        match self {
            Ok(value) => value.into_tool_output(),
            Err(err) => Err(ToolError::Invocation(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_values_are_stringified() {
        assert_eq!("hi".into_tool_output().unwrap(), "hi");
        assert_eq!(String::from("hi").into_tool_output().unwrap(), "hi");
        assert_eq!(75_i32.into_tool_output().unwrap(), "75");
        assert_eq!(true.into_tool_output().unwrap(), "true");
        assert_eq!(().into_tool_output().unwrap(), "");
    }

    #[test]
    fn json_values() {
        assert_eq!(json!("raw").into_tool_output().unwrap(), "raw");
        assert_eq!(json!({ "t": 75 }).into_tool_output().unwrap(), r#"{"t":75}"#);
        assert_eq!(Json(vec![1, 2]).into_tool_output().unwrap(), "[1,2]");
    }

    #[test]
    fn errors_keep_their_message() {
        let failed: Result<String, String> = Err("city not found".into());
        let err = failed.into_tool_output().unwrap_err();
        assert!(matches!(err, ToolError::Invocation(ref m) if m == "city not found"));
        assert_eq!(err.to_string(), "city not found");

        let ok: Result<u64, std::io::Error> = Ok(3);
        assert_eq!(ok.into_tool_output().unwrap(), "3");
    }
}
