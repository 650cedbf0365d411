//! Interactive quiz session: selection, scoring, navigation and completion.
//!
//! The answered set lives here, not in the renderer, so a question can never
//! be scored twice no matter how the UI drives the session.

use std::collections::BTreeSet;

use crate::types::QuizQuestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionState {
    Unanswered,
    Answered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Excellent,
    Good,
    KeepPracticing,
}

impl Grade {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            80.. => Grade::Excellent,
            60.. => Grade::Good,
            _ => Grade::KeepPracticing,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::Excellent => "Excellent!",
            Grade::Good => "Good Job!",
            Grade::KeepPracticing => "Keep Practicing!",
        }
    }
}

/// What a submission revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_index: usize,
    pub selected: usize,
    pub correct: bool,
    pub correct_index: Option<usize>,
    pub explanation: String,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    index: usize,
    selected: Option<usize>,
    revealed: Option<AnswerOutcome>,
    answered: BTreeSet<usize>,
    score: usize,
    finished: bool,
}

impl QuizSession {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        let finished = questions.is_empty();
        Self {
            questions,
            index: 0,
            selected: None,
            revealed: None,
            answered: BTreeSet::new(),
            score: 0,
            finished,
        }
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        if self.finished {
            return None;
        }
        self.questions.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// The outcome of the current question once it has been submitted.
    pub fn revealed(&self) -> Option<&AnswerOutcome> {
        self.revealed.as_ref()
    }

    pub fn question_state(&self, index: usize) -> QuestionState {
        if self.answered.contains(&index) {
            QuestionState::Answered
        } else {
            QuestionState::Unanswered
        }
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.questions.len()
    }

    pub fn percentage(&self) -> u32 {
        if self.questions.is_empty() {
            return 0;
        }
        ((self.score as f64 / self.questions.len() as f64) * 100.0).round() as u32
    }

    pub fn grade(&self) -> Grade {
        Grade::from_percentage(self.percentage())
    }

    /// Returns `false` when the selection was ignored: the question is already
    /// answered, the session is finished, or the option does not exist.
    pub fn select(&mut self, option: usize) -> bool {
        let Some(question) = self.current() else {
            return false;
        };
        if option >= question.options.len() || self.answered.contains(&self.index) {
            return false;
        }
        self.selected = Some(option);
        true
    }

    /// Locks in the pending selection. `None` when there is nothing to submit.
    pub fn submit(&mut self) -> Option<&AnswerOutcome> {
        let selected = self.selected?;
        if self.answered.contains(&self.index) {
            return None;
        }
        let question = self.questions.get(self.index)?;

        let correct = question.correct_index == Some(selected);
        let outcome = AnswerOutcome {
            question_index: self.index,
            selected,
            correct,
            correct_index: question.correct_index,
            explanation: question.explanation.clone(),
        };

        self.answered.insert(self.index);
        if correct {
            self.score += 1;
        }
        self.revealed = Some(outcome);
        self.revealed.as_ref()
    }

    /// Moves past an answered question; past the last one the session finishes.
    pub fn advance(&mut self) -> bool {
        if self.finished || !self.answered.contains(&self.index) {
            return false;
        }
        if self.is_last() {
            self.finished = true;
        } else {
            self.index += 1;
        }
        self.selected = None;
        self.revealed = None;
        true
    }

    pub fn restart(&mut self) {
        self.index = 0;
        self.selected = None;
        self.revealed = None;
        self.answered.clear();
        self.score = 0;
        self.finished = self.questions.is_empty();
    }
}
