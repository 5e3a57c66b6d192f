use fnclient::{
    ChatResponse, ClientConfig, FunctionClient, Role, ScriptedEndpoint, SendOptions,
    ToolCallRequest, collect_tools, tool,
};

#[tool]
/// Gets the weather
/// location: where to get the forecast for
fn get_weather(location: String) -> String {
    format!("The weather in {location} is 75 degrees")
}

#[tool]
/// Adds two numbers
/// a: left operand
/// b: right operand
async fn add(a: i64, b: i64) -> i64 {
    a + b
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    demos::init_tracing();

    println!("fnclient scripted demo\n======================");

    let tools = collect_tools()?;
    println!("{}", serde_json::to_string_pretty(&tools.json()?)?);

    let endpoint = ScriptedEndpoint::new([
        ChatResponse::tool_calls(vec![ToolCallRequest::with_generated_id(
            "get_weather",
            r#"{"location": "LA"}"#,
        )]),
        ChatResponse::text("The current weather in Los Angeles is 75 degrees"),
        ChatResponse::tool_calls(vec![
            ToolCallRequest::with_generated_id("add", r#"{"a": 40, "b": 2}"#),
            ToolCallRequest::with_generated_id("divide", r#"{"a": 1, "b": 0}"#),
        ]),
        ChatResponse::text("40 + 2 is 42. I can't divide."),
    ]);

    let mut client = FunctionClient::builder(endpoint)
        .config(ClientConfig::new("scripted").with_parallel_tool_calls(true))
        .system_prompt("You are a helpful assistant.")
        .functions(tools)
        .build()?;

    println!("\n{}", client.chat("What's the weather in LA?").await?);

    let options = SendOptions::new().force_function("add");
    println!(
        "{}",
        client
            .send_message(Role::User, "What is 40 + 2, and 1 / 0?", options)
            .await?
    );

    println!("\nConversation:");
    for message in client.messages() {
        match (&message.tool_call_id, message.requests_tools()) {
            (Some(id), _) => println!("  tool[{id}]: {}", message.text().unwrap_or_default()),
            (None, true) => {
                for call in &message.tool_calls {
                    println!("  {}: {}({})", message.role, call.name(), call.arguments());
                }
            }
            (None, false) => println!("  {}: {}", message.role, message.text().unwrap_or_default()),
        }
    }

    Ok(())
}
