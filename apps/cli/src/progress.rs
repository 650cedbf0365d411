use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use cram_core::{ControllerSnapshot, StepStatus};

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Renders the five processing steps as a column of spinners that turn into
/// check marks as the remote task advances.
#[derive(Default)]
pub struct StepView {
    finished: usize,
    spinner: Option<ProgressBar>,
    active: Option<&'static str>,
}

impl StepView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, snapshot: &ControllerSnapshot) {
        let steps = snapshot.steps.steps();

        while self.finished < steps.len() && steps[self.finished].status == StepStatus::Complete {
            let done = format!("{} {}", style("✓").green().bold(), steps[self.finished].title);
            match self.spinner.take() {
                Some(spinner) => spinner.finish_with_message(done),
                None => println!("{done}"),
            }
            self.finished += 1;
            self.active = None;
        }

        let Some(active) = steps.get(self.finished) else {
            return;
        };
        if active.status != StepStatus::Processing {
            return;
        }

        let message = format!(
            "{} {} {}",
            active.title,
            style(format!("{}%", snapshot.progress)).yellow(),
            style(if snapshot.current_step.is_empty() {
                active.description
            } else {
                snapshot.current_step.as_str()
            })
            .dim()
        );
        match &self.spinner {
            Some(spinner) => spinner.set_message(message),
            None => {
                self.spinner = Some(create_spinner(&message));
                self.active = Some(active.title);
            }
        }
    }

    /// Marks the step in flight as failed.
    pub fn abandon(&mut self) {
        let title = self.active.take().unwrap_or("Processing");
        let message = format!("{} {}", style("✗").red().bold(), title);
        match self.spinner.take() {
            Some(spinner) => spinner.abandon_with_message(message),
            None => println!("{message}"),
        }
    }

    pub fn clear(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}
