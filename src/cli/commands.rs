use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lectern")]
#[command(
    author,
    version,
    about = "Turn LMS lecture videos into searchable transcripts and quizzes"
)]
#[command(
    long_about = "Download course videos from Canvas, transcribe them in chunks, store the transcripts and generate multiple-choice questions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download every video file attached to a course's modules
    Acquire {
        /// Canvas course ID (defaults to CANVAS_COURSE_ID)
        #[arg(long)]
        course_id: Option<String>,
    },

    /// Transcribe a local video and store the transcript
    Transcribe {
        /// Path to the video file
        video: PathBuf,
        /// Course or module label stored with the transcript
        #[arg(short, long)]
        course: String,
        /// Segment length in minutes
        #[arg(long)]
        chunk_minutes: Option<u64>,
    },

    /// Acquire, transcribe and store a whole course
    Run {
        /// Canvas course ID (defaults to CANVAS_COURSE_ID)
        #[arg(long)]
        course_id: Option<String>,
        /// Also generate MCQs for each module
        #[arg(long)]
        quiz: bool,
    },

    /// Print a stored transcript
    Show {
        /// Transcript ID
        id: String,
    },

    /// List stored transcripts
    List {
        /// Maximum number of transcripts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Generate MCQs from a stored transcript
    Quiz {
        /// Transcript ID
        id: String,
        /// Artifact label (defaults to the transcript's course name)
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print config file path
    Path,
    /// Initialize default configuration
    Init,
}
