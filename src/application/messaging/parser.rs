//! Message parser - Parses raw text into structured messages

use crate::domain::entities::{Content, Message, User};

/// Parses incoming text into structured [`Message`] objects.
pub struct MessageParser {
    command_prefix: String,
    platform: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
            platform: "unknown".to_string(),
        }
    }

    /// Stamp parsed messages with the adapter they arrived through.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Parse one inbound text message.
    pub fn parse(
        &self,
        chat_id: impl Into<String>,
        text: impl Into<String>,
        sender: Option<User>,
    ) -> Message {
        let text = text.into();
        let chat_id = chat_id.into();

        if text.starts_with('/') || text.starts_with(&self.command_prefix) {
            return self.parse_command(chat_id, text, sender);
        }

        let message = if text.trim().is_empty() {
            Message::new(chat_id, Content::Empty)
        } else {
            Message::from_text(chat_id, text)
        };
        message
            .with_platform(&self.platform)
            .with_sender_opt(sender)
    }

    fn parse_command(&self, chat_id: String, text: String, sender: Option<User>) -> Message {
        let cmd_text = if let Some(stripped) = text.strip_prefix('/') {
            stripped
        } else {
            text.trim_start_matches(&self.command_prefix)
        };

        let parts: Vec<&str> = cmd_text.split_whitespace().collect();
        // Group chats address commands as /name@botname; the suffix is not
        // part of the command.
        let name = parts
            .first()
            .and_then(|part| part.split('@').next())
            .unwrap_or_default()
            .to_string();
        let args: Vec<String> = parts
            .get(1..)
            .unwrap_or_default()
            .iter()
            .map(|s| s.to_string())
            .collect();

        Message::from_command(chat_id, name, args)
            .with_platform(&self.platform)
            .with_sender_opt(sender)
    }
}

impl Message {
    /// Helper to set sender as Option
    pub fn with_sender_opt(self, user: Option<User>) -> Self {
        match user {
            Some(u) => self.with_sender(u),
            None => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> MessageParser {
        MessageParser::new("/")
    }

    #[test]
    fn plain_text_stays_text() {
        let message = parser().parse("42", "USD", None);
        assert_eq!(message.content, Content::Text("USD".to_string()));
        assert_eq!(message.chat_id, "42");
    }

    #[test]
    fn blank_text_is_empty() {
        let message = parser().parse("42", "   ", None);
        assert_eq!(message.content, Content::Empty);
    }

    #[test]
    fn slash_commands_are_split_into_name_and_args() {
        let message = parser().parse("42", "/triangle 3 4 5", None);
        assert_eq!(
            message.content,
            Content::Command {
                name: "triangle".to_string(),
                args: vec!["3".to_string(), "4".to_string(), "5".to_string()],
            }
        );
        assert!(message.content.is_command());
    }

    #[test]
    fn bot_mention_suffix_is_stripped() {
        let message = parser().parse("42", "/start@kurs_bot", None);
        assert_eq!(
            message.content,
            Content::Command {
                name: "start".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn sender_is_attached_when_known() {
        let user = User::new("7").with_username("alice");
        let message = parser().parse("42", "/start", Some(user));
        assert_eq!(
            message.sender.as_ref().map(|u| u.display_name()),
            Some("alice".to_string())
        );
    }

    #[test]
    fn messages_carry_their_platform() {
        let parser = MessageParser::new("/").with_platform("console");
        assert_eq!(parser.parse("42", "hi", None).platform, "console");
        assert_eq!(parser.parse("42", "/start", None).platform, "console");
    }
}
