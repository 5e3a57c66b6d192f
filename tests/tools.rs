use fnclient::{
    DeclaredType, FunctionRegistry, ToolEnum, ToolError, ToolParam, collect_tools, tool,
};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, ToolEnum)]
enum Unit {
    #[param(rename = "celsius")]
    Celsius,
    #[param(rename = "fahrenheit")]
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, ToolEnum)]
enum Priority {
    Low = 1,
    Normal = 5,
    Urgent = 10,
}

#[tool]
/// Converts a temperature
/// degrees: the value to convert
/// to: the target unit
async fn convert(degrees: i64, #[default(Unit::Celsius)] to: Unit) -> String {
    match to {
        Unit::Celsius => format!("{}C", (degrees - 32) * 5 / 9),
        Unit::Fahrenheit => format!("{}F", degrees * 9 / 5 + 32),
    }
}

#[tool]
/// Files a ticket
fn file_ticket(title: String, priority: Priority, assignee: Option<String>) -> Result<u32, String> {
    if title.is_empty() {
        return Err("title must not be empty".into());
    }
    let base = match priority {
        Priority::Low => 100,
        Priority::Normal => 200,
        Priority::Urgent => 300,
    };
    Ok(base + assignee.map_or(0, |a| a.len() as u32))
}

#[tool]
fn undocumented() {}

#[tool]
/// Repeats its argument
fn echo(echo: String) -> String {
    echo
}

#[test]
fn test_enum_param_types() {
    assert_eq!(
        Unit::declared_type(),
        DeclaredType::StringEnum(vec!["celsius".into(), "fahrenheit".into()])
    );
    assert_eq!(Priority::declared_type(), DeclaredType::IntegerEnum(vec![1, 5, 10]));
    assert_eq!(Unit::from_value(json!("fahrenheit")), Ok(Unit::Fahrenheit));
    assert_eq!(Priority::from_value(json!(10)), Ok(Priority::Urgent));
    assert!(Unit::from_value(json!("kelvin")).unwrap_err().contains("expected one of"));
    assert!(Priority::from_value(json!(2)).is_err());
}

#[test]
fn test_macro_descriptors() {
    let registry =
        FunctionRegistry::collect_only(["convert", "file_ticket", "undocumented"]).unwrap();

    assert_eq!(
        registry.descriptor("convert").unwrap().to_value().unwrap(),
        json!({
            "type": "function",
            "function": {
                "name": "convert",
                "description": "Converts a temperature",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "degrees": { "type": "integer", "description": "the value to convert" },
                        "to": {
                            "type": "string",
                            "enum": ["celsius", "fahrenheit"],
                            "description": "the target unit"
                        }
                    },
                    "required": ["degrees"]
                }
            }
        })
    );

    let ticket = registry.descriptor("file_ticket").unwrap().to_value().unwrap();
    assert_eq!(
        ticket["function"]["parameters"]["properties"]["priority"],
        json!({ "type": "integer", "enum": [1, 5, 10] })
    );
    assert_eq!(ticket["function"]["parameters"]["required"], json!(["title", "priority"]));

    let bare = registry.descriptor("undocumented").unwrap().to_value().unwrap();
    assert!(bare["function"].get("description").is_none());
    assert_eq!(bare["function"]["parameters"]["properties"], json!({}));
}

#[tokio::test]
async fn test_macro_calls() {
    let registry = FunctionRegistry::collect_only(["convert", "file_ticket"]).unwrap();

    assert_eq!(registry.call_raw("convert", r#"{"degrees": 212}"#).await.unwrap(), "100C");
    assert_eq!(
        registry
            .call_raw("convert", r#"{"degrees": 100, "to": "fahrenheit"}"#)
            .await
            .unwrap(),
        "212F"
    );
    assert_eq!(
        registry
            .call_raw("file_ticket", r#"{"title": "x", "priority": 5, "assignee": "ann"}"#)
            .await
            .unwrap(),
        "203"
    );

    let err = registry
        .call_raw("file_ticket", r#"{"title": "", "priority": 1}"#)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "title must not be empty");

    let err = registry
        .call_raw("convert", r#"{"degrees": 1, "scale": 2}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Deserialize { .. }));

    let err = registry.call_raw("file_ticket", r#"{"title": "x"}"#).await.unwrap_err();
    assert!(err.to_string().contains("missing required argument 'priority'"));
}

#[tokio::test]
async fn test_param_named_like_function() {
    let registry = FunctionRegistry::collect_only(["echo"]).unwrap();
    assert_eq!(registry.call_raw("echo", r#"{"echo": "hi"}"#).await.unwrap(), "hi");
}

#[test]
fn test_registration_is_idempotent() {
    let mut registry = collect_tools().unwrap();
    let before = registry.descriptor("convert").unwrap().clone();
    registry.register_named("convert").unwrap();
    assert_eq!(registry.descriptor("convert").unwrap(), &before);
    assert_eq!(registry.names().filter(|n| *n == "convert").count(), 1);
}
