// Prompt builders for the citation and research-assistant features
// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Citation formats the assistant can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CitationStyle {
    #[default]
    Apa7,
    Ieee,
    Harvard,
}

impl CitationStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CitationStyle::Apa7 => "APA7",
            CitationStyle::Ieee => "IEEE",
            CitationStyle::Harvard => "Harvard",
        }
    }
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CitationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apa" | "apa7" => Ok(CitationStyle::Apa7),
            "ieee" => Ok(CitationStyle::Ieee),
            "harvard" => Ok(CitationStyle::Harvard),
            other => Err(format!(
                "unknown citation style '{}' (expected APA7, IEEE or Harvard)",
                other
            )),
        }
    }
}

/// Bibliographic fields of a paper in the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub title: String,
    pub authors: Vec<String>,
    /// Journal name or conference proceedings.
    pub publication: String,
    pub year: i32,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
}

/// Ask for a single raw citation string in `style`.
pub fn citation_prompt(paper: &PaperMetadata, style: CitationStyle) -> String {
    format!(
        "Generate a bibliographic citation for the following academic paper in **{style}** format.\n\
         Return ONLY the raw citation string. No markdown formatting.\n\
         \n\
         Metadata:\n\
         Title: {title}\n\
         Authors: {authors}\n\
         Publication (Journal/Conf): {publication}\n\
         Year: {year}\n\
         Volume: {volume}\n\
         Issue: {issue}\n\
         Pages: {pages}",
        style = style,
        title = paper.title,
        authors = paper.authors.join(", "),
        publication = paper.publication,
        year = paper.year,
        volume = paper.volume.as_deref().unwrap_or("N/A"),
        issue = paper.issue.as_deref().unwrap_or("N/A"),
        pages = paper.pages.as_deref().unwrap_or("N/A"),
    )
}

const ASSISTANT_PREAMBLE: &str = "You are a helpful AI research assistant for academics. You help with:
- Summarizing and explaining research papers
- Citation styles (APA, MLA, Chicago, IEEE, Harvard)
- Research methodology and best practices
- Academic writing tips
- Finding research directions";

/// Wrap a user question in the research-assistant instructions.
///
/// `context` is usually the abstract of the paper being viewed.
pub fn assistant_prompt(question: &str, context: Option<&str>) -> String {
    let mut prompt = String::from(ASSISTANT_PREAMBLE);
    prompt.push_str("\n\n");

    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!(
            "Current context: The user is viewing a paper with the following abstract: \"{}\"\n\n",
            context
        ));
    }

    prompt.push_str("Be concise, helpful, and academic in tone. Use markdown formatting when appropriate.");
    prompt.push_str("\n\nUser question: ");
    prompt.push_str(question);
    prompt
}

/// Ask for a one-sentence summary of an abstract.
pub fn summary_prompt(abstract_text: &str) -> String {
    format!(
        "Summarize this academic abstract into one concise sentence:\n\n{}",
        abstract_text
    )
}

/// Ask for bibliographic fields as a JSON object.
///
/// Kept short since the paper text already makes up most of the request.
pub fn metadata_prompt(paper_text: &str) -> String {
    format!(
        "Extract paper metadata as JSON: \
         {{\"title\":\"\",\"authors\":[],\"year\":0,\"journal\":\"\",\"volume\":\"\",\"issue\":\"\",\"pages\":\"\"}}. \
         Text: {}",
        paper_text
    )
}
