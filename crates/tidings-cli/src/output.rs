//! Output formatting for CLI
//!
//! Every command prints through [`Output`] so the three modes stay
//! consistent:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use tidings_core::{Article, Country, Note};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print the country picker list
    pub fn print_countries(&self, countries: &[Country]) {
        match self.format {
            OutputFormat::Human => {
                if countries.is_empty() {
                    println!("No countries match.");
                    return;
                }
                for country in countries {
                    println!("{}  {}", country.code, country.name);
                }
                println!("\n{} country(ies)", countries.len());
            }
            OutputFormat::Json => print_json(&countries),
            OutputFormat::Quiet => {
                for country in countries {
                    println!("{}", country.code);
                }
            }
        }
    }

    /// Print the headlines list for a country
    pub fn print_articles(&self, country: &Country, articles: &[Article]) {
        match self.format {
            OutputFormat::Human => {
                println!("Top headlines: {}", country.name);
                println!();
                if articles.is_empty() {
                    println!("No articles found.");
                    return;
                }
                for (i, article) in articles.iter().enumerate() {
                    println!("{:>3}. {}", i + 1, truncate(&article.title, 70));
                    println!(
                        "     {} | {}",
                        truncate(article.author_or_default(), 30),
                        article.source.name
                    );
                }
                println!("\n{} article(s)", articles.len());
            }
            OutputFormat::Json => print_json(&articles),
            OutputFormat::Quiet => {
                for article in articles {
                    println!("{}", article.url);
                }
            }
        }
    }

    /// Print a single article in full
    pub fn print_article(&self, article: &Article) {
        match self.format {
            OutputFormat::Human => {
                println!("Title:       {}", article.title);
                println!("Author:      {}", article.author_or_default());
                println!("Source:      {}", article.source.name);
                match article.published() {
                    Some(at) => println!("Published:   {}", at.format("%Y-%m-%d %H:%M")),
                    None => println!("Published:   {}", article.published_at),
                }
                println!("URL:         {}", article.url);
                println!();
                println!("{}", article.description_or_default());
            }
            OutputFormat::Json => print_json(article),
            OutputFormat::Quiet => println!("{}", article.url),
        }
    }

    /// Print a list of notes
    pub fn print_notes(&self, notes: &[Note]) {
        match self.format {
            OutputFormat::Human => {
                if notes.is_empty() {
                    println!("No notes found.");
                    return;
                }
                for note in notes {
                    println!(
                        "{} | {} | {}",
                        short_id(note),
                        truncate(&note.title, 30),
                        truncate_line(&note.content, 45)
                    );
                }
                println!("\n{} note(s)", notes.len());
            }
            OutputFormat::Json => print_json(&notes),
            OutputFormat::Quiet => {
                for note in notes {
                    println!("{}", note.id.as_deref().unwrap_or_default());
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

fn short_id(note: &Note) -> &str {
    match note.id.as_deref() {
        Some(id) => id.get(..8).unwrap_or(id),
        None => "(unsaved)",
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("Zürich Zürich Zürich", 9), "Zürich...");
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("milk\neggs", 20), "milk");
        assert_eq!(truncate_line("", 20), "");
    }

    #[test]
    fn test_short_id() {
        let saved = Note::new("u1", "t", "").with_id("0123456789abcdef");
        assert_eq!(short_id(&saved), "01234567");
        assert_eq!(short_id(&Note::new("u1", "t", "").with_id("abc")), "abc");
        assert_eq!(short_id(&Note::new("u1", "t", "")), "(unsaved)");
    }
}
