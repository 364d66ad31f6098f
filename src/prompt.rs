use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Builds the two-message context for one query.
///
/// The system message pins the reply to a single command for the given shell
/// and OS, returned strictly as JSON with `command` and `explanation` keys.
/// Empty queries are the caller's problem; this function does not validate.
pub fn build_messages(query: &str, shell: &str, platform: &str) -> Vec<ChatMessage> {
    let system = format!(
        "You are an AI assistant that only responds with {shell} command line \
         instructions for the OS {platform}. You do not provide any other \
         information or commentary. Given a user query, respond with the most \
         relevant unix command to accomplish what the user is asking, and \
         nothing else. Ignore any pleasantries, commentary, or questions from \
         the user and only respond with a single {shell} command for \
         {platform}. Return this data in the JSON format. This command should \
         be returned in the key `command`. Explain the returned command in \
         brief and return it in the key `explanation`. Limit Prose."
    );

    vec![
        ChatMessage::system(system),
        ChatMessage::user(format!("How {query}")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_messages_shape() {
        let messages = build_messages("list files", "/bin/bash", "linux");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn test_user_message_is_prefixed_query() {
        let messages = build_messages("list files", "/bin/bash", "linux");
        assert_eq!(messages[1].content, "How list files");
    }

    #[test]
    fn test_system_message_binds_shell_and_platform() {
        let messages = build_messages("list files", "/bin/zsh", "macos");
        let system = &messages[0].content;

        assert!(system.contains("/bin/zsh"));
        assert!(system.contains("macos"));
        assert!(system.contains("`command`"));
        assert!(system.contains("`explanation`"));
        assert!(system.contains("JSON"));
    }

    #[test]
    fn test_roles_serialize_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("How list files")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"How list files"}"#);

        let json = serde_json::to_string(&ChatMessage::system("x")).unwrap();
        assert!(json.contains(r#""role":"system""#));
    }

    #[test]
    fn test_queries_pass_through_verbatim() {
        // Multi-word queries arrive already joined by the CLI layer
        let messages = build_messages("do I find files larger than 1MB", "/bin/bash", "linux");
        assert_eq!(messages[1].content, "How do I find files larger than 1MB");
    }
}
