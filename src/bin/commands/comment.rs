use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use clap::Subcommand;
use rowstore::database::Database;
use rowstore::output::{display_optional, truncate_text, DEFAULT_TEXT_MAX_LEN};
use rowstore::{Comment, OutputFormat};
use serde::Deserialize;
use serde_json::json;
use tabled::Tabled;
use tracing::info;

use super::print_records;

/// Comment subcommands
#[derive(Subcommand)]
pub enum CommentCommands {
    /// Add a comment; the identifier is assigned by the database
    Add {
        #[clap(value_name = "EMAIL")]
        email: String,

        #[clap(value_name = "TEXT")]
        text: Option<String>,
    },

    /// List comments in table order
    List {
        /// Stop after this many rows
        #[clap(short, long)]
        limit: Option<usize>,
    },

    /// Import comments from a JSON Lines file in one transaction
    ///
    /// Each line is an object with "email" and optional "comment" fields.
    /// If any line fails, nothing is imported.
    Import {
        #[clap(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct CommentLine {
    email: String,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Tabled)]
struct CommentRow {
    id: String,
    email: String,
    comment: String,
}

impl From<&Comment> for CommentRow {
    fn from(c: &Comment) -> Self {
        CommentRow {
            id: display_optional(&c.id),
            email: c.email.clone(),
            comment: truncate_text(&display_optional(&c.comment), DEFAULT_TEXT_MAX_LEN),
        }
    }
}

fn read_comment_lines(file: &Path) -> anyhow::Result<Vec<Comment>> {
    let reader = BufReader::new(
        std::fs::File::open(file)
            .map_err(|e| anyhow!("Failed to open '{}': {}", file.display(), e))?,
    );

    let mut comments = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: CommentLine = serde_json::from_str(&line)
            .map_err(|e| anyhow!("Invalid comment on line {}: {}", n + 1, e))?;
        comments.push(Comment::new(parsed.email, parsed.comment));
    }
    Ok(comments)
}

pub fn run(db: &Database, command: CommentCommands, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        CommentCommands::Add { email, text } => {
            let mut comment = Comment::new(email, text);
            let id = db.comments().insert(&comment)?;
            comment.id = Some(id);
            if !format.is_json() {
                println!("Inserted comment with id {}", id);
            }
            print_records::<_, CommentRow>(&[comment], format)
        }
        CommentCommands::List { limit } => {
            let list: Vec<Comment> = db.comments().find_all(|records| match limit {
                Some(n) => records.take(n).collect(),
                None => records.collect(),
            })?;
            print_records::<_, CommentRow>(&list, format)
        }
        CommentCommands::Import { file } => {
            let comments = read_comment_lines(&file)?;
            let ids = db.run_in_transaction(|uow| uow.comments().insert_many(&comments))?;
            info!("imported {} comments from {}", ids.len(), file.display());

            if format.is_json() {
                println!("{}", json!({ "imported": ids.len(), "ids": ids }));
            } else {
                println!("Imported {} comments", ids.len());
            }
            Ok(())
        }
    }
}
