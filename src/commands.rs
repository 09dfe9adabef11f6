//! Bot commands and their static texts

use teloxide::utils::command::BotCommands;

pub const START_TEXT: &str = "Hello! I am an AI gestalt therapist. Just write your question \
or share what you are going through.\n\n/help - list of commands.";

pub const ABOUT_TEXT: &str = "I am an AI gestalt therapist made for support and self-help. \
I use gestalt therapy techniques and artificial intelligence. Your messages are not stored \
and are not shared with third parties.";

pub const RESET_TEXT: &str = "Conversation history has been reset. We can start over.";

pub const STOP_TEXT: &str =
    "Session finished. If you want to continue, just write to me again. Take care!";

#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum BotCommand {
    #[command(description = "start working with the bot")]
    Start,
    #[command(description = "show this help")]
    Help,
    #[command(description = "reset the conversation history")]
    Reset,
    #[command(description = "about the bot")]
    About,
    #[command(description = "finish the session")]
    Stop,
}

impl BotCommand {
    /// Commands that clear the user's conversation history.
    pub fn clears_history(&self) -> bool {
        matches!(self, BotCommand::Reset | BotCommand::Stop)
    }

    /// Reply text for this command.
    pub fn reply_text(&self) -> String {
        match self {
            BotCommand::Start => START_TEXT.to_string(),
            BotCommand::Help => BotCommand::descriptions().to_string(),
            BotCommand::Reset => RESET_TEXT.to_string(),
            BotCommand::About => ABOUT_TEXT.to_string(),
            BotCommand::Stop => STOP_TEXT.to_string(),
        }
    }
}
