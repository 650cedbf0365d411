use std::io;

use console::{Term, style};

use cram_core::{Grade, QuizQuestion, QuizSession};

fn option_label(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// Accepts a letter (`b`) or a 1-based number (`2`).
fn parse_choice(input: &str) -> Option<usize> {
    let input = input.trim();
    if let Ok(n) = input.parse::<usize>() {
        return n.checked_sub(1);
    }
    let mut chars = input.chars();
    let c = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !c.is_ascii_uppercase() {
        return None;
    }
    Some((c as u8 - b'A') as usize)
}

fn print_question(term: &Term, session: &QuizSession, question: &QuizQuestion) -> io::Result<()> {
    term.write_line("")?;
    term.write_line(&format!(
        "{}",
        style(format!("Question {} of {}", session.index() + 1, session.total())).dim()
    ))?;
    term.write_line(&format!("{}", style(&question.prompt).bold()))?;
    for (i, option) in question.options.iter().enumerate() {
        term.write_line(&format!("  {}. {}", style(option_label(i)).cyan(), option))?;
    }
    Ok(())
}

fn print_summary(term: &Term, session: &QuizSession) -> io::Result<()> {
    let grade = session.grade();
    let label = match grade {
        Grade::Excellent => style(grade.label()).green().bold(),
        Grade::Good => style(grade.label()).yellow().bold(),
        Grade::KeepPracticing => style(grade.label()).red().bold(),
    };
    term.write_line("")?;
    term.write_line(&format!("{}", style("─".repeat(60)).dim()))?;
    term.write_line(&format!("{}  {}", style("Quiz Complete!").bold(), label))?;
    term.write_line(&format!(
        "You scored {}/{} ({}%)",
        session.score(),
        session.total(),
        session.percentage()
    ))?;
    Ok(())
}

fn confirm(term: &Term, prompt: &str) -> io::Result<bool> {
    term.write_str(&format!("{} ", style(prompt).dim()))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Walks the user through the quiz on the terminal until they decline a retake.
pub fn run(questions: Vec<QuizQuestion>) -> io::Result<()> {
    let term = Term::stdout();
    let mut session = QuizSession::new(questions);

    if session.total() == 0 {
        term.write_line(&format!("{}", style("No quiz questions were generated.").dim()))?;
        return Ok(());
    }

    loop {
        if session.is_finished() {
            print_summary(&term, &session)?;
            if confirm(&term, "Retake quiz? [y/N]")? {
                session.restart();
                continue;
            }
            return Ok(());
        }

        let Some(question) = session.current().cloned() else {
            return Ok(());
        };
        print_question(&term, &session, &question)?;

        loop {
            term.write_str(&format!("{} ", style("Your answer:").dim()))?;
            let input = term.read_line()?;
            if parse_choice(&input).is_some_and(|choice| session.select(choice)) {
                break;
            }
            term.write_line(&format!(
                "{}",
                style(format!(
                    "Pick one of {}",
                    (0..question.options.len()).map(option_label).collect::<String>()
                ))
                .red()
            ))?;
        }

        if let Some(outcome) = session.submit().cloned() {
            if outcome.correct {
                term.write_line(&format!("{} Correct!", style("✓").green().bold()))?;
            } else {
                let answer = outcome
                    .correct_index
                    .and_then(|i| {
                        let text = question.options.get(i)?;
                        Some(format!("{}. {}", option_label(i), text))
                    })
                    .unwrap_or_else(|| "unknown".to_string());
                term.write_line(&format!(
                    "{} Incorrect. Correct answer: {}",
                    style("✗").red().bold(),
                    style(answer).green()
                ))?;
            }
            if !outcome.explanation.is_empty() {
                term.write_line(&format!("  {}", style(&outcome.explanation).dim()))?;
            }
        }

        let next = if session.is_last() { "see results" } else { "next question" };
        term.write_str(&format!("{} ", style(format!("Press Enter for {next}")).dim()))?;
        term.read_line()?;
        session.advance();
    }
}
