//! Selection-flow state machine for the three quiz parameters.
//!
//! Three ordered single-choice steps: language, then difficulty, then
//! question type. A step only accepts a value once every earlier step is
//! satisfied; changing an earlier step clears everything after it. Invalid
//! transitions are silent no-ops (the UI renders gated steps as disabled,
//! but this module is the source of truth, not the rendering).

/// Placeholder carried across the navigation boundary for an unset field.
pub const NOT_SELECTED: &str = "未選択";

pub const LANGUAGES: [&str; 3] = ["英語", "中国語", "フランス語"];
pub const DIFFICULTIES: [&str; 3] = ["初級", "中級", "上級"];
pub const QUESTION_TYPES: [&str; 3] = ["単語", "文法", "和訳"];

/// The three selection steps, in gate order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Language,
    Difficulty,
    QuestionType,
}

impl Step {
    pub fn options(self) -> &'static [&'static str] {
        match self {
            Step::Language => &LANGUAGES,
            Step::Difficulty => &DIFFICULTIES,
            Step::QuestionType => &QUESTION_TYPES,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Language => "言語",
            Step::Difficulty => "難易度",
            Step::QuestionType => "出題",
        }
    }
}

/// The navigation payload between the selection screen and the chat screen.
/// `None` means the field was never chosen; the chat screen substitutes
/// [`NOT_SELECTED`] on entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizParams {
    pub language: Option<String>,
    pub difficulty: Option<String>,
    pub qtype: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionFlow {
    language: Option<String>,
    difficulty: Option<String>,
    qtype: Option<String>,
}

impl SelectionFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-seed the flow from navigation parameters (returning from the chat
    /// screen). Values that are not known options, including the
    /// [`NOT_SELECTED`] placeholder, leave that step unselected.
    pub fn from_params(params: &QuizParams) -> Self {
        let mut flow = Self::new();
        if let Some(v) = params.language.as_deref() {
            if LANGUAGES.contains(&v) {
                flow.set_language(v);
            }
        }
        if let Some(v) = params.difficulty.as_deref() {
            if DIFFICULTIES.contains(&v) {
                flow.set_difficulty(v);
            }
        }
        if let Some(v) = params.qtype.as_deref() {
            if QUESTION_TYPES.contains(&v) {
                flow.set_question_type(v);
            }
        }
        flow
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn difficulty(&self) -> Option<&str> {
        self.difficulty.as_deref()
    }

    pub fn question_type(&self) -> Option<&str> {
        self.qtype.as_deref()
    }

    pub fn selected(&self, step: Step) -> Option<&str> {
        match step {
            Step::Language => self.language(),
            Step::Difficulty => self.difficulty(),
            Step::QuestionType => self.question_type(),
        }
    }

    /// Whether a step's gate is open (all earlier steps satisfied).
    pub fn step_active(&self, step: Step) -> bool {
        match step {
            Step::Language => true,
            Step::Difficulty => self.language.is_some(),
            Step::QuestionType => self.difficulty.is_some(),
        }
    }

    pub fn set_language(&mut self, value: &str) {
        self.language = Some(value.to_string());
        self.difficulty = None;
        self.qtype = None;
    }

    pub fn set_difficulty(&mut self, value: &str) {
        if self.language.is_none() {
            return;
        }
        self.difficulty = Some(value.to_string());
        self.qtype = None;
    }

    pub fn set_question_type(&mut self, value: &str) {
        if self.difficulty.is_none() {
            return;
        }
        self.qtype = Some(value.to_string());
    }

    pub fn set(&mut self, step: Step, value: &str) {
        match step {
            Step::Language => self.set_language(value),
            Step::Difficulty => self.set_difficulty(value),
            Step::QuestionType => self.set_question_type(value),
        }
    }

    pub fn can_start(&self) -> bool {
        self.language.is_some() && self.difficulty.is_some() && self.qtype.is_some()
    }

    /// Navigation request to the chat screen. `None` unless every step is
    /// satisfied.
    pub fn start(&self) -> Option<QuizParams> {
        if !self.can_start() {
            return None;
        }
        Some(QuizParams {
            language: self.language.clone(),
            difficulty: self.difficulty.clone(),
            qtype: self.qtype.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_gate_in_order() {
        let mut flow = SelectionFlow::new();
        assert!(flow.step_active(Step::Language));
        assert!(!flow.step_active(Step::Difficulty));
        assert!(!flow.step_active(Step::QuestionType));

        flow.set_language("英語");
        assert!(flow.step_active(Step::Difficulty));
        assert!(!flow.step_active(Step::QuestionType));

        flow.set_difficulty("初級");
        assert!(flow.step_active(Step::QuestionType));
    }

    #[test]
    fn gated_set_is_a_no_op() {
        let mut flow = SelectionFlow::new();
        flow.set_difficulty("初級");
        assert_eq!(flow.difficulty(), None);

        flow.set_question_type("単語");
        assert_eq!(flow.question_type(), None);
        assert!(!flow.can_start());
    }

    #[test]
    fn changing_language_clears_downstream() {
        let mut flow = SelectionFlow::new();
        flow.set_language("英語");
        flow.set_difficulty("中級");
        flow.set_question_type("文法");
        assert!(flow.can_start());

        flow.set_language("中国語");
        assert_eq!(flow.language(), Some("中国語"));
        assert_eq!(flow.difficulty(), None);
        assert_eq!(flow.question_type(), None);
        assert!(!flow.can_start());
    }

    #[test]
    fn changing_difficulty_clears_question_type() {
        let mut flow = SelectionFlow::new();
        flow.set_language("フランス語");
        flow.set_difficulty("初級");
        flow.set_question_type("和訳");

        flow.set_difficulty("上級");
        assert_eq!(flow.difficulty(), Some("上級"));
        assert_eq!(flow.question_type(), None);
    }

    #[test]
    fn can_start_iff_all_three_set() {
        let mut flow = SelectionFlow::new();
        assert!(!flow.can_start());
        flow.set_language("英語");
        assert!(!flow.can_start());
        flow.set_difficulty("初級");
        assert!(!flow.can_start());
        flow.set_question_type("単語");
        assert!(flow.can_start());
    }

    #[test]
    fn start_carries_all_three_values() {
        let mut flow = SelectionFlow::new();
        assert_eq!(flow.start(), None);

        flow.set_language("英語");
        flow.set_difficulty("初級");
        flow.set_question_type("文法");
        let params = flow.start().unwrap();
        assert_eq!(params.language.as_deref(), Some("英語"));
        assert_eq!(params.difficulty.as_deref(), Some("初級"));
        assert_eq!(params.qtype.as_deref(), Some("文法"));
    }

    #[test]
    fn from_params_restores_known_values() {
        let params = QuizParams {
            language: Some("中国語".to_string()),
            difficulty: Some("中級".to_string()),
            qtype: Some("和訳".to_string()),
        };
        let flow = SelectionFlow::from_params(&params);
        assert_eq!(flow.language(), Some("中国語"));
        assert_eq!(flow.difficulty(), Some("中級"));
        assert_eq!(flow.question_type(), Some("和訳"));
        assert!(flow.can_start());
    }

    #[test]
    fn from_params_ignores_placeholder_values() {
        let params = QuizParams {
            language: Some("英語".to_string()),
            difficulty: Some(NOT_SELECTED.to_string()),
            qtype: Some("単語".to_string()),
        };
        let flow = SelectionFlow::from_params(&params);
        assert_eq!(flow.language(), Some("英語"));
        assert_eq!(flow.difficulty(), None);
        // qtype stays gated behind the unset difficulty
        assert_eq!(flow.question_type(), None);
    }
}
