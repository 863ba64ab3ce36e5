use anyhow::Result;
use tokio::task::JoinHandle;
use unicode_width::UnicodeWidthStr;

use crate::chat::ChatSession;
use crate::dify::{ChatReply, DifyClient};
use crate::selection::{SelectionFlow, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Selection,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Keyboard focus on the selection screen: one of the three option cards, or
/// the start button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionFocus {
    Card(Step),
    Start,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Selection screen state
    pub flow: SelectionFlow,
    pub focus: SelectionFocus,
    pub card_cursor: usize,

    // Chat screen state
    pub chat: Option<ChatSession>,
    pub chat_input: String,
    pub chat_cursor: usize, // cursor position in chat_input (chars)
    pub chat_scroll: u16,
    pub chat_height: u16, // inner size of the transcript area, set during render
    pub chat_width: u16,
    pub send_task: Option<JoinHandle<Result<ChatReply>>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Remote client, built once from config at startup
    pub dify: DifyClient,
}

impl App {
    pub fn new(dify: DifyClient) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Selection,
            input_mode: InputMode::Normal,

            flow: SelectionFlow::new(),
            focus: SelectionFocus::Card(Step::Language),
            card_cursor: 0,

            chat: None,
            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            send_task: None,

            animation_frame: 0,

            dify,
        }
    }

    // Selection screen ---------------------------------------------------

    /// Focusable targets in order: every card whose gate is open, then the
    /// start button. Gated cards are skipped entirely.
    pub fn focus_targets(&self) -> Vec<SelectionFocus> {
        let mut targets = Vec::new();
        for step in [Step::Language, Step::Difficulty, Step::QuestionType] {
            if self.flow.step_active(step) {
                targets.push(SelectionFocus::Card(step));
            }
        }
        targets.push(SelectionFocus::Start);
        targets
    }

    pub fn focus_next(&mut self) {
        let targets = self.focus_targets();
        let i = targets.iter().position(|t| *t == self.focus).unwrap_or(0);
        self.focus = targets[(i + 1) % targets.len()];
        self.sync_card_cursor();
    }

    pub fn focus_prev(&mut self) {
        let targets = self.focus_targets();
        let i = targets.iter().position(|t| *t == self.focus).unwrap_or(0);
        self.focus = targets[(i + targets.len() - 1) % targets.len()];
        self.sync_card_cursor();
    }

    /// Point the cursor at the focused card's current selection.
    fn sync_card_cursor(&mut self) {
        self.card_cursor = match self.focus {
            SelectionFocus::Card(step) => self
                .flow
                .selected(step)
                .and_then(|v| step.options().iter().position(|o| *o == v))
                .unwrap_or(0),
            SelectionFocus::Start => 0,
        };
    }

    pub fn cursor_down(&mut self) {
        if let SelectionFocus::Card(step) = self.focus {
            let len = step.options().len();
            self.card_cursor = (self.card_cursor + 1).min(len - 1);
        }
    }

    pub fn cursor_up(&mut self) {
        if let SelectionFocus::Card(_) = self.focus {
            self.card_cursor = self.card_cursor.saturating_sub(1);
        }
    }

    /// Enter on the selection screen: apply the highlighted option, or start
    /// the quiz when the start button is focused. The flow itself silently
    /// ignores gated sets and a premature start.
    pub fn apply_selection(&mut self) {
        match self.focus {
            SelectionFocus::Card(step) => {
                if let Some(option) = step.options().get(self.card_cursor) {
                    self.flow.set(step, option);
                }
            }
            SelectionFocus::Start => self.start_quiz(),
        }
    }

    /// Navigate to the chat screen with the three chosen parameters. No-op
    /// unless the flow is complete.
    pub fn start_quiz(&mut self) {
        if let Some(params) = self.flow.start() {
            self.chat = Some(ChatSession::new(params));
            self.chat_input.clear();
            self.chat_cursor = 0;
            self.chat_scroll = 0;
            self.screen = Screen::Chat;
            self.input_mode = InputMode::Editing;
        }
    }

    // Chat screen ---------------------------------------------------------

    /// Navigate back to the selection screen, re-seeding the flow from the
    /// session's parameters. The transcript is discarded with the session;
    /// an in-flight request dies with it.
    pub fn go_back(&mut self) {
        if let Some(task) = self.send_task.take() {
            task.abort();
        }
        if let Some(chat) = self.chat.take() {
            self.flow = SelectionFlow::from_params(&chat.go_back());
        }
        self.focus = SelectionFocus::Card(Step::Language);
        self.sync_card_cursor();
        self.input_mode = InputMode::Normal;
        self.screen = Screen::Selection;
    }

    pub fn chat_pending(&self) -> bool {
        self.chat.as_ref().map(|c| c.pending()).unwrap_or(false)
    }

    /// Send the input buffer as one exchange. Suppressed while a request is
    /// already in flight; empty input is ignored by the session.
    pub fn submit_message(&mut self) {
        if self.send_task.is_some() {
            return;
        }
        let Some(chat) = self.chat.as_mut() else {
            return;
        };
        let Some(query) = chat.begin_send(&self.chat_input) else {
            return;
        };
        self.chat_input.clear();
        self.chat_cursor = 0;

        let dify = self.dify.clone();
        let inputs = chat.inputs();
        let conversation_id = chat.conversation_id().to_string();
        self.send_task = Some(tokio::spawn(async move {
            dify.send_message(&query, inputs, &conversation_id).await
        }));

        self.scroll_chat_to_bottom();
    }

    /// Reap the in-flight request once it resolves. Called from the tick arm
    /// of the event loop.
    pub async fn check_send_task(&mut self) {
        let finished = self
            .send_task
            .as_ref()
            .map(|t| t.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }
        if let Some(task) = self.send_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(anyhow::anyhow!(e)),
            };
            if let Some(chat) = self.chat.as_mut() {
                chat.complete(result);
            }
            self.scroll_chat_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Transcript scrolling ------------------------------------------------

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Scroll the transcript so the newest message (or the typing indicator)
    /// is visible. Estimates wrapped line counts from the rendered width.
    pub fn scroll_chat_to_bottom(&mut self) {
        let Some(chat) = self.chat.as_ref() else {
            return;
        };

        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in chat.messages() {
            total_lines += 1; // Role line ("You:" or "AI:")
            for line in msg.content.lines() {
                total_lines += wrapped_line_count(line, wrap_width);
            }
            total_lines += 1; // Blank line after message
        }

        if chat.pending() {
            total_lines += 2; // "AI:" + typing indicator
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }
}

/// Rendered line count of one transcript line after wrapping. Uses display
/// width, not char count: CJK text takes two terminal columns per character.
fn wrapped_line_count(line: &str, wrap_width: usize) -> u16 {
    let width = line.width();
    if width == 0 {
        1
    } else {
        ((width / wrap_width) + 1) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dify::DEFAULT_API_URL;

    fn app() -> App {
        App::new(DifyClient::new(DEFAULT_API_URL, "app-test"))
    }

    #[test]
    fn focus_skips_gated_cards() {
        let mut app = app();
        assert_eq!(
            app.focus_targets(),
            vec![SelectionFocus::Card(Step::Language), SelectionFocus::Start]
        );

        // Tab from language lands on start, never on a gated card
        app.focus_next();
        assert_eq!(app.focus, SelectionFocus::Start);
        app.focus_next();
        assert_eq!(app.focus, SelectionFocus::Card(Step::Language));
    }

    #[test]
    fn start_is_a_no_op_until_flow_is_complete() {
        let mut app = app();
        app.focus = SelectionFocus::Start;
        app.apply_selection();
        assert_eq!(app.screen, Screen::Selection);
        assert!(app.chat.is_none());
    }

    #[test]
    fn selecting_through_all_steps_opens_chat() {
        let mut app = app();
        // pick the first option on each card in gate order
        for step in [Step::Language, Step::Difficulty, Step::QuestionType] {
            app.focus = SelectionFocus::Card(step);
            app.card_cursor = 0;
            app.apply_selection();
        }
        app.focus = SelectionFocus::Start;
        app.apply_selection();

        assert_eq!(app.screen, Screen::Chat);
        let chat = app.chat.as_ref().unwrap();
        assert_eq!(chat.header_title(), "【英語 - 初級 - 単語】");
    }

    #[test]
    fn autoscroll_counts_display_width() {
        assert_eq!(wrapped_line_count("", 40), 1);
        assert_eq!(wrapped_line_count(&"a".repeat(30), 40), 1);
        // 30 CJK characters occupy 60 columns, so they wrap at width 40
        assert_eq!(wrapped_line_count(&"あ".repeat(30), 40), 2);
        assert_eq!(wrapped_line_count(&"あ".repeat(30), 60), 2);
    }

    #[test]
    fn go_back_restores_selection_from_session() {
        let mut app = app();
        app.flow.set_language("中国語");
        app.flow.set_difficulty("上級");
        app.flow.set_question_type("文法");
        app.start_quiz();
        assert_eq!(app.screen, Screen::Chat);

        app.go_back();
        assert_eq!(app.screen, Screen::Selection);
        assert_eq!(app.flow.language(), Some("中国語"));
        assert_eq!(app.flow.difficulty(), Some("上級"));
        assert_eq!(app.flow.question_type(), Some("文法"));
        assert!(app.chat.is_none());
    }
}
