//! Reply text composition.

use serde_json::{Map, Value};

/// Onboarding message sent when a user follows the bot.
pub const WELCOME_MESSAGE: &str = "Welcome! Thank you for adding me as a friend. \n\n\
Send me any message and I'll echo it back to you!\n\n\
Type 'help' to see available commands.";

/// Reply to greeting keywords.
pub const GREETING_MESSAGE: &str = "Hello! How can I help you today?";

/// Reply to the help keyword.
pub const HELP_MESSAGE: &str = "Available commands:\n\
- hello: Greet the bot\n\
- help: Show this help message\n\
- Any other message will be echoed back";

/// Produces reply text for an incoming text message.
pub trait ReplyComposer: Send + Sync {
    fn compose(&self, user_id: &str, incoming_text: &str) -> String;
}

/// Default composer: greets, shows help, or echoes.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordComposer;

impl ReplyComposer for KeywordComposer {
    fn compose(&self, _user_id: &str, incoming_text: &str) -> String {
        match incoming_text {
            "hello" | "Hello" | "hi" | "Hi" => GREETING_MESSAGE.to_string(),
            "help" | "Help" => HELP_MESSAGE.to_string(),
            other => format!("You said: {}", other),
        }
    }
}

/// Describe a parsed postback payload back to the user.
pub fn postback_reply(payload: &Map<String, Value>) -> String {
    format!("Received postback: {}", Value::Object(payload.clone()))
}
