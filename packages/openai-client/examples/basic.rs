//! Basic OpenAI client usage example

use openai_client::{ChatRequest, ContentPart, ImageUrl, Message, OpenAIClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize from environment
    let client = OpenAIClient::from_env()?;

    // Simple chat completion
    println!("=== Chat Completion ===");
    let response = client
        .chat_completion(
            ChatRequest::new("gpt-4o-mini")
                .message(Message::system("You write short real-estate blurbs."))
                .message(Message::user("Describe a two-bedroom bungalow in one sentence."))
                .temperature(0.7)
                .max_tokens(100),
        )
        .await?;

    println!("Response: {}", response.content);

    // Vision input
    println!("\n=== Vision ===");
    let image_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://upload.wikimedia.org/wikipedia/commons/6/6a/House.jpg".into());
    let response = client
        .chat_completion(ChatRequest::new("gpt-4o-mini").message(Message::user_parts(vec![
            ContentPart::text("What room or building does this photo show?"),
            ContentPart::image(ImageUrl::remote(image_url).with_detail("low")),
        ])))
        .await?;

    println!("Response: {}", response.content);
    if let Some(usage) = response.usage {
        println!("Tokens used: {}", usage.total_tokens);
    }

    Ok(())
}
