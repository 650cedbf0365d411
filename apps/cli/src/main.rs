use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use console::style;
use tokio::{fs, sync::mpsc};
use tracing_subscriber::EnvFilter;

use cram_core::{
    ClientConfig, ControllerEvent, HttpJobClient, JobApi, ProgressSteps, StepStatus,
    StudyMaterials, TaskController, TaskId, VideoFile, format_file_size, format_notes_text,
    get_audio_path, get_notes_path, get_root_output_dir, get_task_dir, normalize_results,
};

use crate::progress::{StepView, create_spinner};

mod progress;
mod quiz;

fn format_duration(d: Duration) -> String {
    let tenths = d.as_millis() / 100;
    if tenths < 600 {
        format!("{}.{}s", tenths / 10, tenths % 10)
    } else {
        let secs = d.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[derive(Parser)]
#[command(name = "cram")]
#[command(about = "Turn lecture videos into study notes, voice notes and a quiz")]
struct Cli {
    /// Base URL of the processing service
    #[arg(long, global = true, env = "CRAM_API_URL")]
    api_url: Option<String>,

    /// How often to check task status, in milliseconds
    #[arg(long, global = true, env = "CRAM_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Where saved notes and voice notes go. Defaults to the user cache dir.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a lecture video and follow it until the study materials are ready
    Process {
        /// Video file (mp4, avi, mov, mkv, webm; up to 500 MB)
        file: PathBuf,

        /// Save the notes and download the voice notes
        #[arg(short, long)]
        save: bool,

        /// Take the quiz once processing finishes
        #[arg(short, long)]
        quiz: bool,

        /// Delete the task from the service when done
        #[arg(long)]
        discard: bool,
    },
    /// Show the processing status of a task
    Status { task_id: String },
    /// Show the study notes of a finished task
    Results {
        task_id: String,

        /// Save the notes as plain text
        #[arg(short, long)]
        save: bool,
    },
    /// Take the quiz of a finished task
    Quiz { task_id: String },
    /// Download the voice notes of a finished task
    Audio {
        task_id: String,

        /// Destination file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a task and its files from the service
    Delete { task_id: String },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn client_config(cli: &Cli) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(ms) = cli.poll_interval_ms.filter(|ms| *ms > 0) {
        config = config.with_poll_interval(Duration::from_millis(ms));
    }
    config
}

fn print_header(subtitle: &str) {
    println!(
        "\n{}  {}\n",
        style("cram").cyan().bold(),
        style(subtitle).dim()
    );
}

fn print_materials(materials: &StudyMaterials) {
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", format_notes_text(&materials.notes));
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{} {}",
        style("Voice notes:").dim(),
        style(&materials.audio_url).cyan()
    );
    println!(
        "{} {} questions",
        style("Quiz:").dim(),
        materials.quiz.len()
    );
}

async fn save_notes(root: &std::path::Path, materials: &StudyMaterials) -> Result<PathBuf> {
    let task_dir = get_task_dir(root, &materials.task_id);
    fs::create_dir_all(&task_dir).await?;
    let path = get_notes_path(&task_dir);
    fs::write(&path, format_notes_text(&materials.notes)).await?;
    Ok(path)
}

async fn save_audio(
    client: &HttpJobClient,
    root: &std::path::Path,
    task_id: &TaskId,
) -> Result<PathBuf> {
    let path = get_audio_path(&get_task_dir(root, task_id));
    let spinner = create_spinner("Downloading voice notes...");
    match client.download_audio(task_id, &path).await {
        Ok(bytes) => {
            spinner.finish_with_message(format!(
                "{} Voice notes downloaded {}",
                style("✓").green().bold(),
                style(format!("({})", format_file_size(bytes))).dim()
            ));
            Ok(path)
        }
        Err(e) => {
            spinner.abandon_with_message(format!(
                "{} Voice notes unavailable",
                style("✗").red().bold()
            ));
            Err(e.into())
        }
    }
}

async fn fetch_materials(client: &HttpJobClient, task_id: &TaskId) -> Result<StudyMaterials> {
    let spinner = create_spinner("Fetching results...");
    let raw = client.fetch_results(task_id).await;
    spinner.finish_and_clear();
    let raw = raw.with_context(|| format!("Could not load results for task {task_id}"))?;
    Ok(normalize_results(&raw, client.audio_url(task_id)))
}

async fn take_quiz(materials: &StudyMaterials) -> Result<()> {
    let questions = materials.quiz.clone();
    tokio::task::spawn_blocking(move || quiz::run(questions)).await??;
    Ok(())
}

/// Waits for the controller to reach a terminal event, rendering progress on the way.
async fn follow(
    events: &mut mpsc::UnboundedReceiver<ControllerEvent>,
    view: &mut StepView,
) -> Result<Option<std::sync::Arc<StudyMaterials>>> {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ControllerEvent::Progress(snapshot)) => view.update(&snapshot),
                Some(ControllerEvent::Completed(materials)) => return Ok(Some(materials)),
                Some(failed @ ControllerEvent::Failed { .. }) => {
                    view.abandon();
                    if let Some(err) = failed.into_failure() {
                        return Err(err.into());
                    }
                }
                Some(ControllerEvent::Submitted { .. } | ControllerEvent::Restarted) => {}
                None => bail!("Task controller stopped unexpectedly"),
            },
            _ = tokio::signal::ctrl_c() => {
                view.clear();
                return Ok(None);
            }
        }
    }
}

async fn process(cli: &Cli, file: PathBuf, save: bool, take: bool, discard: bool) -> Result<()> {
    let config = client_config(cli);
    let root = cli.output_dir.clone().unwrap_or_else(get_root_output_dir);
    let start = Instant::now();

    print_header("Lecture Processor");

    let video = VideoFile::inspect(&file).await?;
    println!(
        "{} Selected: {} {}",
        style("✓").green().bold(),
        video.file_name,
        style(format!("({})", format_file_size(video.size))).dim()
    );

    let client = HttpJobClient::new(&config)?;
    let (mut controller, mut events) = TaskController::new(client, config.poll_interval);

    let spinner = create_spinner(&format!("Uploading to {}...", config.base_url));
    let task_id = match controller.submit(&video).await {
        Ok(task_id) => {
            spinner.finish_with_message(format!(
                "{} Uploaded: task {}",
                style("✓").green().bold(),
                style(&task_id).yellow()
            ));
            task_id
        }
        Err(e) => {
            spinner.abandon_with_message(format!("{} Upload failed", style("✗").red().bold()));
            return Err(e.into());
        }
    };

    let mut view = StepView::new();
    let Some(materials) = follow(&mut events, &mut view).await? else {
        println!(
            "{} Cancelled, removing task {}",
            style("!").yellow().bold(),
            task_id
        );
        controller.restart_and_wait().await;
        return Ok(());
    };

    println!(
        "\n{} {}\n",
        style("Done in").dim(),
        style(format_duration(start.elapsed())).cyan()
    );
    print_materials(&materials);

    if save {
        let notes = save_notes(&root, &materials).await?;
        println!("\n{} {}", style("Saved:").dim(), style(notes.display()).cyan());
        let audio = save_audio(controller.api(), &root, &task_id).await?;
        println!("{} {}", style("Saved:").dim(), style(audio.display()).cyan());
    }

    if take {
        take_quiz(&materials).await?;
    }

    if discard {
        controller.restart_and_wait().await;
        println!("{} Task {} discarded", style("✓").green().bold(), task_id);
    }
    controller.shutdown();

    Ok(())
}

async fn status(config: &ClientConfig, task_id: TaskId) -> Result<()> {
    let client = HttpJobClient::new(config)?;
    let status = client.poll_status(&task_id).await?;

    let mut steps = ProgressSteps::new();
    steps.apply(status.status);

    println!(
        "{} {}  {}  {}",
        style("Task").dim(),
        style(&status.task_id).yellow(),
        style(status.status).bold(),
        style(format!("{}%", status.progress)).cyan()
    );
    if !status.current_step.is_empty() {
        println!("{}", style(&status.current_step).dim());
    }
    for step in steps.steps() {
        let marker = match step.status {
            StepStatus::Complete => style("✓").green().bold(),
            StepStatus::Processing => style("●").cyan().bold(),
            StepStatus::Pending => style("○").dim(),
        };
        println!("  {} {}", marker, step.title);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = client_config(&cli);
    let root = cli.output_dir.clone().unwrap_or_else(get_root_output_dir);
    tracing::debug!(
        base_url = %config.base_url,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        output_dir = %root.display(),
        "configuration loaded"
    );

    match &cli.command {
        Command::Process {
            file,
            save,
            quiz,
            discard,
        } => process(&cli, file.clone(), *save, *quiz, *discard).await,
        Command::Status { task_id } => status(&config, TaskId::from(task_id.as_str())).await,
        Command::Results { task_id, save } => {
            let client = HttpJobClient::new(&config)?;
            let materials = fetch_materials(&client, &TaskId::from(task_id.as_str())).await?;
            print_materials(&materials);
            if *save {
                let path = save_notes(&root, &materials).await?;
                println!("\n{} {}", style("Saved:").dim(), style(path.display()).cyan());
            }
            Ok(())
        }
        Command::Quiz { task_id } => {
            let client = HttpJobClient::new(&config)?;
            let materials = fetch_materials(&client, &TaskId::from(task_id.as_str())).await?;
            take_quiz(&materials).await
        }
        Command::Audio { task_id, output } => {
            let client = HttpJobClient::new(&config)?;
            let task_id = TaskId::from(task_id.as_str());
            let path = match output {
                Some(output) => {
                    let spinner = create_spinner("Downloading voice notes...");
                    let bytes = client.download_audio(&task_id, output).await;
                    spinner.finish_and_clear();
                    println!(
                        "{} Voice notes downloaded {}",
                        style("✓").green().bold(),
                        style(format!("({})", format_file_size(bytes?))).dim()
                    );
                    output.clone()
                }
                None => save_audio(&client, &root, &task_id).await?,
            };
            println!("{} {}", style("Saved:").dim(), style(path.display()).cyan());
            Ok(())
        }
        Command::Delete { task_id } => {
            let client = HttpJobClient::new(&config)?;
            let task_id = TaskId::from(task_id.as_str());
            client.discard(&task_id).await?;
            println!("{} Task {} deleted", style("✓").green().bold(), task_id);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_millis(119_600)), "1m 59s");
        assert_eq!(format_duration(Duration::from_millis(59_960)), "59.9s");
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "cram",
            "--api-url",
            "http://svc:9000",
            "--poll-interval-ms",
            "250",
            "status",
            "abc",
        ]);
        let config = client_config(&cli);
        assert_eq!(config.base_url, "http://svc:9000");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert!(matches!(cli.command, Command::Status { ref task_id } if task_id == "abc"));
    }

    #[test]
    fn process_flags() {
        let cli = Cli::parse_from(["cram", "process", "talk.mp4", "--save", "-q", "-vv"]);
        assert_eq!(cli.verbose, 2);
        let Command::Process { file, save, quiz, discard } = cli.command else {
            panic!("expected process");
        };
        assert_eq!(file, PathBuf::from("talk.mp4"));
        assert!(save && quiz && !discard);
    }
}
