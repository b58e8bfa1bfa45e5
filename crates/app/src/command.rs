//! Line commands understood by the terminal front end.

use crate::chat::UserInput;
use shared::settings::{ProviderId, UnknownProvider};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(UserInput),
    NewConversation,
    SetProvider(ProviderId),
    SetModel(String),
    History,
    Help,
    Quit,
    /// A command we recognised but could not use, with the reason.
    Invalid(String),
}

pub const HELP: &str = "\
/new                      start a new conversation
/provider <id>            anthropic | openai | gemini | openrouter
/model <name>             model for the active provider
/image <data-uri> <text>  send text with an image
/history                  show the conversation
/quit                     exit
anything else is sent as a message";

impl Command {
    pub fn parse(line: &str) -> Command {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(rest) = line.trim_start().strip_prefix('/') else {
            return Command::Send(UserInput::Text(line.to_string()));
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "new" => Command::NewConversation,
            "history" => Command::History,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "provider" => match arg.parse::<ProviderId>() {
                Ok(p) => Command::SetProvider(p),
                Err(UnknownProvider(raw)) => {
                    Command::Invalid(format!("unknown provider '{}'", raw))
                }
            },
            "model" if !arg.is_empty() => Command::SetModel(arg.to_string()),
            "model" => Command::Invalid("usage: /model <name>".into()),
            "image" => match arg.split_once(char::is_whitespace) {
                Some((uri, text)) if uri.starts_with("data:") => {
                    Command::Send(UserInput::TextWithImage {
                        text: text.trim().to_string(),
                        image_data_uri: uri.to_string(),
                    })
                }
                _ => Command::Invalid("usage: /image <data-uri> <text>".into()),
            },
            // Unknown slash words are ordinary messages ("/shrug", paths...).
            _ => Command::Send(UserInput::Text(line.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_sent_verbatim() {
        assert_eq!(
            Command::parse("  what is 2+2?\n"),
            Command::Send(UserInput::Text("  what is 2+2?".into()))
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(Command::parse("/new"), Command::NewConversation);
        assert_eq!(Command::parse("/history"), Command::History);
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(
            Command::parse("/provider Gemini"),
            Command::SetProvider(ProviderId::Gemini)
        );
        assert_eq!(
            Command::parse("/model gpt-4o"),
            Command::SetModel("gpt-4o".into())
        );
    }

    #[test]
    fn test_bad_arguments() {
        assert!(matches!(Command::parse("/provider cohere"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/model"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/image not-a-uri hi"), Command::Invalid(_)));
    }

    #[test]
    fn test_image_command() {
        assert_eq!(
            Command::parse("/image data:image/png;base64,AAAA what is this?"),
            Command::Send(UserInput::TextWithImage {
                text: "what is this?".into(),
                image_data_uri: "data:image/png;base64,AAAA".into(),
            })
        );
    }

    #[test]
    fn test_unknown_slash_word_is_a_message() {
        assert_eq!(
            Command::parse("/usr/bin is on my PATH?"),
            Command::Send(UserInput::Text("/usr/bin is on my PATH?".into()))
        );
    }
}
