pub mod settings;
pub mod store;

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    /// Who authored a turn. Providers with a different vocabulary map this
    /// in their adapter (Gemini says "model").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        User,
        #[serde(alias = "model")]
        Assistant,
    }

    impl Role {
        pub fn as_str(&self) -> &'static str {
            match self {
                Role::User => "user",
                Role::Assistant => "assistant",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ImageUrl {
        /// `data:<mime>;base64,<payload>`
        pub url: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum ContentPart {
        Text { text: String },
        ImageUrl { image_url: ImageUrl },
    }

    impl ContentPart {
        pub fn text(text: impl Into<String>) -> Self {
            ContentPart::Text { text: text.into() }
        }

        pub fn image(url: impl Into<String>) -> Self {
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: url.into() },
            }
        }
    }

    /// Turn content: a bare string, or ordered text/image parts.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum Content {
        Text(String),
        Parts(Vec<ContentPart>),
    }

    impl Content {
        pub fn has_images(&self) -> bool {
            match self {
                Content::Text(_) => false,
                Content::Parts(parts) => parts
                    .iter()
                    .any(|p| matches!(p, ContentPart::ImageUrl { .. })),
            }
        }

        /// All text of this content, parts joined with a newline.
        pub fn text(&self) -> String {
            match self {
                Content::Text(text) => text.clone(),
                Content::Parts(parts) => parts
                    .iter()
                    .filter_map(|p| match p {
                        ContentPart::Text { text } => Some(text.as_str()),
                        ContentPart::ImageUrl { .. } => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            }
        }
    }

    /// One message of a conversation. The serialized form doubles as the
    /// persisted history format.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Turn {
        pub role: Role,
        pub content: Content,
    }

    impl Turn {
        pub fn user(text: impl Into<String>) -> Self {
            Self {
                role: Role::User,
                content: Content::Text(text.into()),
            }
        }

        pub fn assistant(text: impl Into<String>) -> Self {
            Self {
                role: Role::Assistant,
                content: Content::Text(text.into()),
            }
        }

        pub fn user_with_image(text: impl Into<String>, image_data_uri: impl Into<String>) -> Self {
            Self {
                role: Role::User,
                content: Content::Parts(vec![
                    ContentPart::text(text),
                    ContentPart::image(image_data_uri),
                ]),
            }
        }
    }

}
