// CLI module for rhgate
// Author: kelexine (https://github.com/kelexine)

use crate::gateway::CitationStyle;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rhgate - Rate-limited, cached Gemini assistant for your paper library
#[derive(Parser, Debug)]
#[command(name = "rhgate", version, about, long_about = None)]
pub struct Args {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Config file (default: ~/.rhgate/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask the research assistant a single question
    Ask {
        question: String,

        /// Abstract or notes of the paper the question is about
        #[arg(long)]
        context: Option<String>,
    },

    /// Generate a citation for a paper
    Cite {
        #[arg(long)]
        title: String,

        /// Repeat for each author
        #[arg(long = "author", required = true)]
        authors: Vec<String>,

        /// Journal name or conference proceedings
        #[arg(long)]
        publication: String,

        #[arg(long)]
        year: i32,

        #[arg(long)]
        volume: Option<String>,

        #[arg(long)]
        issue: Option<String>,

        #[arg(long)]
        pages: Option<String>,

        /// APA7, IEEE or Harvard
        #[arg(long, default_value = "APA7")]
        style: CitationStyle,
    },

    /// Summarize an abstract in one sentence
    Summarize {
        /// Abstract text
        text: String,
    },

    /// Extract citation metadata from paper text as JSON
    Extract {
        /// Text file with the paper's first page; reads stdin when omitted
        file: Option<PathBuf>,
    },

    /// Interactive assistant session (/usage, /metrics, /quit)
    Chat {
        /// Abstract of the paper being discussed
        #[arg(long)]
        context: Option<String>,
    },

    /// Show today's request usage
    Usage,

    /// Validate the configured API key format
    CheckKey,
}
