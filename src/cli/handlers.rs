use crate::cli::commands::*;
use crate::config::{self, LecternConfig};
use crate::error::{LecternError, Result};
use crate::lms::{Acquirer, CanvasClient};
use crate::pipeline;
use crate::quiz;
use crate::storage::TranscriptDb;
use std::path::Path;

pub async fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Config { action } => handle_config(action).await,
        command => {
            let cfg = config::loader::load_config_with_env()?;
            config::loader::ensure_directories(&cfg)?;
            dispatch(command, cfg).await
        }
    }
}

async fn dispatch(command: Commands, cfg: LecternConfig) -> Result<()> {
    match command {
        Commands::Acquire { course_id } => handle_acquire(&cfg, course_id).await,
        Commands::Transcribe {
            video,
            course,
            chunk_minutes,
        } => handle_transcribe(cfg, &video, &course, chunk_minutes).await,
        Commands::Run { course_id, quiz } => handle_run(&cfg, course_id, quiz).await,
        Commands::Show { id } => handle_show(&cfg, &id),
        Commands::List { limit } => handle_list(&cfg, limit),
        Commands::Quiz { id, label } => handle_quiz(&cfg, &id, label.as_deref()).await,
        Commands::Config { action } => handle_config(action).await,
    }
}

async fn handle_acquire(cfg: &LecternConfig, course_id: Option<String>) -> Result<()> {
    let course_id = cfg.lms.resolve_course_id(course_id)?;
    let canvas = CanvasClient::from_config(&cfg.lms)?;
    let acquirer = Acquirer::new(
        &canvas,
        &canvas,
        config::loader::video_dir(cfg)?,
        config::loader::metadata_path(cfg)?,
    );

    let modules = acquirer.acquire(&course_id).await;
    if modules.is_empty() {
        println!("No videos downloaded for course {}.", course_id);
        return Ok(());
    }

    for (module, videos) in &modules {
        println!("{} ({} videos)", module, videos.len());
        for video in videos {
            println!("  {}", video.display());
        }
    }
    Ok(())
}

async fn handle_transcribe(
    mut cfg: LecternConfig,
    video: &Path,
    course: &str,
    chunk_minutes: Option<u64>,
) -> Result<()> {
    if !video.exists() {
        return Err(LecternError::VideoNotFound(video.to_path_buf()));
    }
    if let Some(minutes) = chunk_minutes {
        cfg.media.chunk_duration_minutes = minutes;
    }

    match pipeline::transcribe_file(&cfg, video, course).await? {
        Some(stored) => {
            println!("Stored transcript {} for {}", stored.id, stored.file_name);
            println!("View it with: lectern show {}", stored.id);
        }
        None => println!("No transcript produced for {}", video.display()),
    }
    Ok(())
}

async fn handle_run(cfg: &LecternConfig, course_id: Option<String>, quiz: bool) -> Result<()> {
    let course_id = cfg.lms.resolve_course_id(course_id)?;
    let summary = pipeline::run_course(cfg, &course_id, quiz).await?;

    println!(
        "Course {}: {} modules, {} videos, {} transcripts stored",
        course_id, summary.modules, summary.videos, summary.stored
    );
    for path in &summary.quizzes {
        println!("  MCQs: {}", path.display());
    }
    Ok(())
}

fn handle_show(cfg: &LecternConfig, id: &str) -> Result<()> {
    let db = TranscriptDb::connect(cfg.require_connection_string()?)?;
    let record = db
        .get_by_id(id)
        .ok_or_else(|| LecternError::TranscriptNotFound(id.to_string()))?;

    println!("\n{}", "=".repeat(60));
    println!("  {} - {}", record.course_name, record.file_name);
    println!("{}", "=".repeat(60));
    println!("Stored: {}\n", record.created_at.format("%Y-%m-%d %H:%M"));
    println!("{}", record.transcript);

    db.close()
}

fn handle_list(cfg: &LecternConfig, limit: usize) -> Result<()> {
    let db = TranscriptDb::connect(cfg.require_connection_string()?)?;
    let records = db.list(limit)?;

    if records.is_empty() {
        println!("No transcripts stored yet.");
        return db.close();
    }

    println!("{} of {} transcripts\n", records.len(), db.count()?);

    println!("{:<36} {:<24} {:<30} {:<16}", "ID", "Course", "File", "Stored");
    println!("{}", "-".repeat(108));

    for record in records {
        println!(
            "{:<36} {:<24} {:<30} {:<16}",
            record.id,
            truncate(&record.course_name, 22),
            truncate(&record.file_name, 28),
            record.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    db.close()
}

async fn handle_quiz(cfg: &LecternConfig, id: &str, label: Option<&str>) -> Result<()> {
    match pipeline::quiz_from_record(cfg, id, label).await? {
        Some(path) => match quiz::load_batch(&path) {
            Ok(batch) => println!("{} MCQs saved to {}", batch.mcqs.len(), path.display()),
            Err(_) => println!("MCQs saved to {}", path.display()),
        },
        None => println!("No MCQs generated for {}", id),
    }
    Ok(())
}

async fn handle_config(action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let cfg = config::loader::load_config()?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigCommands::Path => {
            println!("{}", config::loader::config_path()?.display());
        }
        ConfigCommands::Init => {
            let cfg = config::loader::load_config()?;
            config::loader::ensure_directories(&cfg)?;
            println!(
                "Configuration initialized at: {}",
                config::loader::config_path()?.display()
            );
            println!("\nDefault settings:");
            println!("  Chunk length: {} min", cfg.media.chunk_duration_minutes);
            println!("  Transcription model: {}", cfg.transcription.model);
            println!("  LLM: {} ({})", cfg.llm.model, cfg.llm.provider);
            println!("  Videos: {}", config::loader::video_dir(&cfg)?.display());
        }
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
