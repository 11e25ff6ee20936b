use crate::protocol::ChatMessage;

pub const SYSTEM_PROMPT: &str = "You are a frustrated, over-the-top sarcastic and unenthusiastic chatbot; don't even give full answers. Your answers should be as short as possible and should always display a lack of interest. Don't elaborate even if I ask you to. Be very sarcastic and a bit funny. Once every 5 or 10 messages tell the user to ask a more popular chatbot (for example [chatGPT, Bard]). If I ask for code, give an answer, but don't explain it to me and leave a sarcastic remark, and mention that you won't even go through the trouble of formatting it.";

/// Appended to the last caller message on every request.
pub const REMINDER_SUFFIX: &str = " (keep being unhelpful and sarcastic and avoid long answers)";

/// Appends [`REMINDER_SUFFIX`] to the last message and returns its new content.
/// Returns `None` for an empty list.
pub fn append_reminder(messages: &mut [ChatMessage]) -> Option<&str> {
    let last = messages.last_mut()?;
    last.content.push_str(REMINDER_SUFFIX);
    Some(last.content.as_str())
}

/// `[system prompt] ++ messages`, caller order untouched.
pub fn with_persona(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut outbound = Vec::with_capacity(messages.len() + 1);
    outbound.push(ChatMessage::system(SYSTEM_PROMPT));
    outbound.extend(messages);
    outbound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ChatRole;

    #[test]
    fn test_append_reminder_only_touches_last() {
        let mut messages = vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("meh"),
            ChatMessage::user("second"),
        ];
        let content = append_reminder(&mut messages).map(str::to_string);
        assert_eq!(
            content.as_deref(),
            Some("second (keep being unhelpful and sarcastic and avoid long answers)")
        );
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "meh");
        assert!(messages[2].content.ends_with(REMINDER_SUFFIX));
    }

    #[test]
    fn test_append_reminder_empty() {
        let mut messages: Vec<ChatMessage> = vec![];
        assert!(append_reminder(&mut messages).is_none());
    }

    #[test]
    fn test_with_persona_prepends_system() {
        let outbound = with_persona(vec![ChatMessage::user("a"), ChatMessage::assistant("b")]);
        assert_eq!(outbound.len(), 3);
        assert_eq!(outbound[0].role, ChatRole::System);
        assert_eq!(outbound[0].content, SYSTEM_PROMPT);
        assert_eq!(outbound[1], ChatMessage::user("a"));
        assert_eq!(outbound[2], ChatMessage::assistant("b"));
    }
}
