use chrono::Local;
use demos::openai::OpenAiEndpoint;
use fnclient::{ClientConfig, FunctionClient, ToolEnum, collect_tools, tool};

#[derive(Debug, Clone, Copy, ToolEnum)]
enum Unit {
    #[param(rename = "celsius")]
    Celsius,
    #[param(rename = "fahrenheit")]
    Fahrenheit,
}

#[tool]
/// Gets the current weather for a city
/// location: the city to get the weather for
/// unit: temperature unit of the reply
async fn get_weather(location: String, #[default(Unit::Fahrenheit)] unit: Unit) -> String {
    match unit {
        Unit::Celsius => format!("The weather in {location} is 24 degrees celsius"),
        Unit::Fahrenheit => format!("The weather in {location} is 75 degrees fahrenheit"),
    }
}

#[tool]
/// Returns the local date and time
fn current_time() -> String {
    Local::now().to_rfc3339()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    demos::init_tracing();

    let mut config = ClientConfig::from_env()?;
    if config.model.is_empty() {
        config.model = "gpt-4o-mini".into();
    }

    let mut client = FunctionClient::builder(OpenAiEndpoint::from_env()?)
        .config(config)
        .system_prompt("You are a helpful assistant. Use the tools when they help.")
        .functions(collect_tools()?)
        .build()?;

    let question = std::env::args().nth(1).unwrap_or_else(|| {
        "What's the weather in Los Angeles right now, and what time is it?".into()
    });
    println!("> {question}");
    println!("{}", client.chat(question).await?);
    Ok(())
}
