use std::path::PathBuf;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /new (/n) - Start a new chat session and switch to it.
- /list (/l) - List chat sessions, newest first. The current one is marked with *.
- /switch (/s) [SESSION_ID] - Switch to another chat session.
- /upload (/u) [PATH] - Attach a .txt, .md or .pdf document to the current session, replacing any previous one.
- /help (/h) - Provides this help menu.
- /quit /exit (/q) - Exit Aegis.

Anything else is sent as a question about the current session's document.
        "#;

    text.trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    New,
    List,
    Switch(String),
    Upload(PathBuf),
    Help,
    Quit,
    Invalid(String),
}

impl SlashCommand {
    /// `None` when the input is not a slash command at all.
    pub fn parse(input: &str) -> Option<SlashCommand> {
        let trimmed = input.trim();
        if !trimmed.starts_with('/') {
            return None;
        }

        let (name, argument) = match trimmed.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (trimmed, ""),
        };

        let command = match name {
            "/new" | "/n" => SlashCommand::New,
            "/list" | "/l" => SlashCommand::List,
            "/help" | "/h" => SlashCommand::Help,
            "/quit" | "/exit" | "/q" => SlashCommand::Quit,
            "/switch" | "/s" => {
                if argument.is_empty() {
                    SlashCommand::Invalid("/switch needs a session id, see /list".to_string())
                } else {
                    SlashCommand::Switch(argument.to_string())
                }
            }
            "/upload" | "/u" => {
                if argument.is_empty() {
                    SlashCommand::Invalid("/upload needs a file path".to_string())
                } else {
                    SlashCommand::Upload(PathBuf::from(argument))
                }
            }
            other => SlashCommand::Invalid(format!("Unknown command {other}, try /help")),
        };

        Some(command)
    }
}
