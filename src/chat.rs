//! Chat session state: the transcript of one chat-screen visit.
//!
//! The request/response lifecycle is split so no network is needed to drive
//! it: `begin_send` appends the user message and raises `pending`, the
//! caller dispatches the query however it likes, and `complete` folds the
//! outcome back in. `complete` always lowers `pending`, so the loading
//! indicator cannot get stuck on either path.

use anyhow::Result;

use crate::dify::{ChatInputs, ChatReply};
use crate::selection::{QuizParams, NOT_SELECTED};

/// Shown in place of every failure cause: network error, non-2xx status, or
/// a body we cannot parse. Causes are deliberately not distinguished.
pub const ERROR_MESSAGE: &str = "エラーが発生しました。";

const NO_ANSWER: &str = "(no answer)";

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

pub struct ChatSession {
    language: String,
    difficulty: String,
    qtype: String,
    messages: Vec<ChatMessage>,
    conversation_id: String,
    pending: bool,
}

impl ChatSession {
    /// Builds a session from the navigation parameters. Absent fields fall
    /// back to the `未選択` placeholder, mirroring missing query parameters
    /// on a deep-linked chat screen.
    pub fn new(params: QuizParams) -> Self {
        let fallback = || NOT_SELECTED.to_string();
        Self {
            language: params.language.unwrap_or_else(fallback),
            difficulty: params.difficulty.unwrap_or_else(fallback),
            qtype: params.qtype.unwrap_or_else(fallback),
            messages: Vec::new(),
            conversation_id: String::new(),
            pending: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Header line for the chat screen, e.g. `【英語 - 初級 - 単語】`.
    pub fn header_title(&self) -> String {
        format!(
            "【{} - {} - {}】",
            self.language, self.difficulty, self.qtype
        )
    }

    /// The quiz parameters as sent with every request.
    pub fn inputs(&self) -> ChatInputs {
        ChatInputs {
            language: self.language.clone(),
            difficulty: self.difficulty.clone(),
            qtype: self.qtype.clone(),
        }
    }

    /// Starts one exchange: trims the input, appends the user message, and
    /// raises `pending`. Returns the query text to dispatch, or `None` for
    /// empty/whitespace input (no transcript mutation, no request).
    pub fn begin_send(&mut self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: text.to_string(),
        });
        self.pending = true;
        Some(text.to_string())
    }

    /// Folds the outcome of the dispatched request back into the session.
    /// On success the answer is appended and any returned conversation id
    /// overwrites the stored one; on failure a single fixed error message is
    /// appended. `pending` is lowered on both paths.
    pub fn complete(&mut self, result: Result<ChatReply>) {
        match result {
            Ok(reply) => {
                let answer = reply.answer.unwrap_or_else(|| NO_ANSWER.to_string());
                self.messages.push(ChatMessage {
                    role: ChatRole::Assistant,
                    content: answer,
                });
                if let Some(id) = reply.conversation_id {
                    self.conversation_id = id;
                }
            }
            Err(_) => {
                self.messages.push(ChatMessage {
                    role: ChatRole::Assistant,
                    content: ERROR_MESSAGE.to_string(),
                });
            }
        }
        self.pending = false;
    }

    /// Navigation request back to the selection screen. The three parameters
    /// are passed back verbatim; the session never mutates them.
    pub fn go_back(&self) -> QuizParams {
        QuizParams {
            language: Some(self.language.clone()),
            difficulty: Some(self.difficulty.clone()),
            qtype: Some(self.qtype.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn session() -> ChatSession {
        ChatSession::new(QuizParams {
            language: Some("英語".to_string()),
            difficulty: Some("初級".to_string()),
            qtype: Some("文法".to_string()),
        })
    }

    fn reply(answer: Option<&str>, conversation_id: Option<&str>) -> ChatReply {
        ChatReply {
            answer: answer.map(str::to_string),
            conversation_id: conversation_id.map(str::to_string),
        }
    }

    #[test]
    fn empty_and_whitespace_input_are_ignored() {
        let mut chat = session();
        assert_eq!(chat.begin_send(""), None);
        assert_eq!(chat.begin_send("   "), None);
        assert!(chat.messages().is_empty());
        assert!(!chat.pending());
    }

    #[test]
    fn begin_send_appends_user_message_and_raises_pending() {
        let mut chat = session();
        let query = chat.begin_send("  hello  ").unwrap();
        assert_eq!(query, "hello");
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].role, ChatRole::User);
        assert_eq!(chat.messages()[0].content, "hello");
        assert!(chat.pending());
    }

    #[test]
    fn success_appends_answer_and_stores_conversation_id() {
        let mut chat = session();
        chat.begin_send("hello");
        chat.complete(Ok(reply(Some("Bonjour"), Some("abc"))));

        let last = chat.messages().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, "Bonjour");
        assert_eq!(chat.conversation_id(), "abc");
        assert!(!chat.pending());
    }

    #[test]
    fn missing_answer_renders_stand_in() {
        let mut chat = session();
        chat.begin_send("hello");
        chat.complete(Ok(reply(None, None)));
        assert_eq!(chat.messages().last().unwrap().content, "(no answer)");
    }

    #[test]
    fn missing_conversation_id_keeps_previous_one() {
        let mut chat = session();
        chat.begin_send("first");
        chat.complete(Ok(reply(Some("A"), Some("abc"))));

        chat.begin_send("second");
        chat.complete(Ok(reply(Some("B"), None)));
        assert_eq!(chat.conversation_id(), "abc");
    }

    #[test]
    fn failure_appends_fixed_error_message() {
        let mut chat = session();
        chat.begin_send("first");
        chat.complete(Ok(reply(Some("A"), Some("abc"))));

        chat.begin_send("second");
        assert!(chat.pending());
        chat.complete(Err(anyhow!("connection refused")));

        let last = chat.messages().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, ERROR_MESSAGE);
        // failures never touch the stored conversation id
        assert_eq!(chat.conversation_id(), "abc");
        assert!(!chat.pending());
    }

    #[test]
    fn transcript_keeps_exchange_order() {
        let mut chat = session();
        chat.begin_send("q1");
        chat.complete(Ok(reply(Some("a1"), None)));
        chat.begin_send("q2");
        chat.complete(Err(anyhow!("boom")));

        let contents: Vec<&str> = chat.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["q1", "a1", "q2", ERROR_MESSAGE]);
    }

    #[test]
    fn go_back_returns_params_verbatim() {
        let chat = session();
        let params = chat.go_back();
        assert_eq!(params.language.as_deref(), Some("英語"));
        assert_eq!(params.difficulty.as_deref(), Some("初級"));
        assert_eq!(params.qtype.as_deref(), Some("文法"));
    }

    #[test]
    fn absent_params_fall_back_to_placeholder() {
        let chat = ChatSession::new(QuizParams {
            language: None,
            difficulty: None,
            qtype: None,
        });
        assert_eq!(chat.header_title(), "【未選択 - 未選択 - 未選択】");

        // go_back passes the placeholders along unchanged
        let params = chat.go_back();
        assert_eq!(params.language.as_deref(), Some(NOT_SELECTED));
    }
}
