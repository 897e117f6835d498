//! Structured output example with JSON schema

use openai_client::{ChatRequest, Message, OpenAIClient};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OpenAIClient::from_env()?;

    // Strict mode needs every property listed as required
    let schema = json!({
        "type": "object",
        "properties": {
            "title": {
                "type": ["string", "null"],
                "description": "Headline of the listing"
            },
            "price": {
                "type": ["string", "null"],
                "description": "Asking price as written"
            },
            "bedrooms": {
                "type": ["string", "null"],
                "description": "Number of bedrooms"
            }
        },
        "required": ["title", "price", "bedrooms"],
        "additionalProperties": false
    });

    let listing = "Sunny 3-bed craftsman near the park. Offered at $450,000.";

    let parsed = client
        .chat_json(
            ChatRequest::new("gpt-4o-mini")
                .message(Message::system("Extract listing details from the text."))
                .message(Message::user(listing))
                .temperature(0.0)
                .json_schema("listing_fields", schema),
        )
        .await?;

    println!("Parsed:");
    println!("  Title: {}", parsed["title"]);
    println!("  Price: {}", parsed["price"]);
    println!("  Bedrooms: {}", parsed["bedrooms"]);

    Ok(())
}
