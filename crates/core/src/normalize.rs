//! Reshapes raw service results into the notes and quiz shapes used for display.

use crate::types::{
    DisplaySection, NoteSection, QuizQuestion, RawQuizQuestion, ResultsResponse, StudyMaterials,
    StudyNotes,
};

const DEFAULT_TITLE: &str = "Lecture Notes";

/// First section gives the title and summary, the last gives the key points,
/// everything in between becomes a body section. A single section feeds both
/// the summary and the key points.
pub fn normalize_notes(raw: &[NoteSection]) -> StudyNotes {
    let Some((first, rest)) = raw.split_first() else {
        return StudyNotes {
            title: DEFAULT_TITLE.to_string(),
            summary: String::new(),
            sections: Vec::new(),
            key_points: Vec::new(),
        };
    };

    let (body, last) = match rest.split_last() {
        Some((last, body)) => (body, last),
        None => (&[][..], first),
    };

    StudyNotes {
        title: first.title.clone(),
        summary: first.content.join(" "),
        sections: body
            .iter()
            .map(|section| DisplaySection {
                heading: section.title.clone(),
                content: section.content.clone(),
            })
            .collect(),
        key_points: last.content.clone(),
    }
}

pub fn normalize_question(raw: &RawQuizQuestion) -> QuizQuestion {
    QuizQuestion {
        id: raw.id,
        prompt: raw.question.clone(),
        options: raw.options.iter().map(|o| o.text.clone()).collect(),
        correct_index: raw.options.iter().position(|o| o.id == raw.correct_answer),
        explanation: raw.explanation.clone(),
    }
}

pub fn normalize_quiz(raw: &[RawQuizQuestion]) -> Vec<QuizQuestion> {
    raw.iter().map(normalize_question).collect()
}

/// `audio_url` is passed in rather than read from `results` so callers can
/// resolve it against the configured service base URL.
pub fn normalize_results(results: &ResultsResponse, audio_url: String) -> StudyMaterials {
    StudyMaterials {
        task_id: results.task_id.clone(),
        notes: normalize_notes(&results.notes),
        quiz: normalize_quiz(&results.quiz),
        audio_url,
    }
}
