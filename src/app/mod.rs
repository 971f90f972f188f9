use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{OutputFormat, Settings};
use crate::dsl::{SearchQuery, evaluate_query, filter_records, parse_query};
use crate::library::{Library, Track, TrackStore};
use crate::sinks::init_sink;
use crate::tags::{
    add_tag_to_records, decode, encode, global_tags, is_ambiguous,
    remove_tag_from_records, set_tags_on_records,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Number of threads for large libraries (default: all cores)
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the tracks matching a query
    Search {
        #[command(flatten)]
        library: LibraryArg,

        /// Output format (default from settings)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Query terms, joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },

    /// Print the parsed form of a query as JSON
    Explain {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },

    /// List every tag in the library with its usage count
    Tags {
        #[command(flatten)]
        library: LibraryArg,
    },

    /// Add, remove or replace tags on tracks
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },

    /// Split a raw comment field into comment and tags
    Decode {
        raw: String,
    },

    /// Build a raw comment field from a comment and tags
    Encode {
        /// User comment kept in front of the tags
        #[arg(long, default_value = "")]
        comment: String,

        tags: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum TagAction {
    /// Add one tag to the given tracks
    Add {
        #[command(flatten)]
        target: TagTarget,
        tag: String,
    },
    /// Remove one tag from the given tracks
    Remove {
        #[command(flatten)]
        target: TagTarget,
        tag: String,
    },
    /// Replace the tag list of the given tracks
    Set {
        #[command(flatten)]
        target: TagTarget,
        tags: Vec<String>,
    },
}

#[derive(Args)]
pub struct LibraryArg {
    /// Library file (.json, .yaml); falls back to the `library` setting
    #[arg(short, long)]
    pub library: Option<PathBuf>,
}

#[derive(Args)]
pub struct TagTarget {
    #[command(flatten)]
    pub library: LibraryArg,

    /// Track ids, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub ids: Vec<i64>,

    /// Write the library file back instead of printing changed tracks
    #[arg(long)]
    pub in_place: bool,
}

impl LibraryArg {
    fn resolve<'a>(&'a self, settings: &'a Settings) -> Result<&'a Path> {
        self.library
            .as_deref()
            .or(settings.library.as_deref())
            .context("CLI: No library file; pass --library or set `library` in the settings")
    }
}

pub fn run(cli: Cli, settings: &Settings) -> Result<()> {
    match cli.command {
        Command::Search {
            library,
            format,
            output,
            query,
        } => {
            let path = library.resolve(settings)?;
            let library = Library::load(path)?;
            let format = format.unwrap_or(settings.format);
            run_search(
                &library,
                &query.join(" "),
                format,
                output.as_deref(),
                settings,
            )
        }
        Command::Explain { query } => {
            let query = parse_query(&query.join(" "));
            write_json_line(&query)
        }
        Command::Tags { library } => {
            let library = Library::load(library.resolve(settings)?)?;
            run_tags(&library)
        }
        Command::Tag { action } => run_tag_action(action, settings),
        Command::Decode { raw } => write_json_line(&decode(&raw)),
        Command::Encode { comment, tags } => {
            let raw = encode(&comment, &tags)?;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", raw)?;
            Ok(())
        }
    }
}

pub fn summarize_query(query: &SearchQuery) -> String {
    format!(
        "{} string filters, {} numeric filters",
        query.string_filters.len(),
        query.numeric_filters.len()
    )
}

/// Filter on the rayon pool once the library is big enough; order is kept.
pub fn matching_tracks<'a>(
    library: &'a Library,
    query: &SearchQuery,
    parallel_threshold: usize,
) -> Vec<&'a Track> {
    if library.len() >= parallel_threshold {
        tracing::info!("Filtering {} tracks in parallel", library.len());
        library
            .tracks()
            .par_iter()
            .filter(|track| evaluate_query(query, *track))
            .collect()
    } else {
        filter_records(query, library.tracks())
    }
}

fn run_search(
    library: &Library,
    raw_query: &str,
    format: OutputFormat,
    output: Option<&Path>,
    settings: &Settings,
) -> Result<()> {
    let query = parse_query(raw_query);
    tracing::info!("Query '{}': {}", raw_query, summarize_query(&query));

    let start = std::time::Instant::now();
    let matches = matching_tracks(library, &query, settings.parallel_threshold);
    tracing::info!(
        "Matched {} of {} tracks in {:.2}ms",
        matches.len(),
        library.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let mut sink = init_sink(format, output)?;
    for track in matches {
        sink.add_track(track)?;
    }
    sink.finish().context("Search: Failed to finalize sink")
}

fn run_tags(library: &Library) -> Result<()> {
    let ambiguous = library
        .tracks()
        .iter()
        .filter(|t| t.comment_raw.as_deref().is_some_and(is_ambiguous))
        .count();
    if ambiguous > 0 {
        tracing::warn!(
            "{} comments contain the tag separator more than once; their tags may be misread",
            ambiguous
        );
    }

    let mut stdout = std::io::stdout().lock();
    for usage in global_tags(library.tracks()) {
        serde_json::to_writer(&mut stdout, &usage)?;
        writeln!(stdout)?;
    }
    Ok(())
}

fn run_tag_action(action: TagAction, settings: &Settings) -> Result<()> {
    let (TagAction::Add { target, .. }
    | TagAction::Remove { target, .. }
    | TagAction::Set { target, .. }) = &action;

    let path = target.library.resolve(settings)?.to_path_buf();
    let mut library = Library::load(&path)?;
    let edit = match &action {
        TagAction::Add { tag, .. } => add_tag_to_records(&mut library, &target.ids, tag)?,
        TagAction::Remove { tag, .. } => remove_tag_from_records(&mut library, &target.ids, tag)?,
        TagAction::Set { tags, .. } => set_tags_on_records(&mut library, &target.ids, tags)?,
    };
    tracing::info!("Tag edit changed {} of {} tracks", edit.len(), target.ids.len());

    if target.in_place {
        if !edit.is_empty() {
            library.save(&path)?;
        }
        return Ok(());
    }

    let mut sink = init_sink(OutputFormat::Jsonl, None)?;
    for id in edit.ids() {
        if let Some(track) = library.track(id) {
            sink.add_track(track)?;
        }
    }
    sink.finish()
}

fn write_json_line<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(size: i64) -> Library {
        Library::new(
            (0..size)
                .map(|id| Track {
                    id,
                    bpm: Some(100 + (id % 40) as u32),
                    ..Track::default()
                })
                .collect(),
        )
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let lib = library(500);
        let query = parse_query("bpm:110-120 -bpm:115");
        let sequential: Vec<i64> = matching_tracks(&lib, &query, usize::MAX)
            .iter()
            .map(|t| t.id)
            .collect();
        let parallel: Vec<i64> = matching_tracks(&lib, &query, 0)
            .iter()
            .map(|t| t.id)
            .collect();
        assert!(!sequential.is_empty());
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn summary_counts_filters() {
        let query = parse_query("techno bpm:>120 tag:peak");
        assert_eq!(summarize_query(&query), "2 string filters, 1 numeric filters");
    }

    #[test]
    fn cli_parses_tag_ids() {
        let cli = Cli::try_parse_from([
            "tagsift", "tag", "add", "--library", "lib.json", "--ids", "1,2,5", "Warm",
        ])
        .unwrap();
        match cli.command {
            Command::Tag {
                action: TagAction::Add { target, tag },
            } => {
                assert_eq!(target.ids, vec![1, 2, 5]);
                assert_eq!(tag, "Warm");
                assert!(!target.in_place);
            }
            _ => panic!("expected tag add"),
        }
    }

    #[test]
    fn library_falls_back_to_settings() {
        let arg = LibraryArg { library: None };
        assert!(arg.resolve(&Settings::default()).is_err());

        let settings = Settings {
            library: Some(PathBuf::from("/music/lib.json")),
            ..Settings::default()
        };
        assert_eq!(arg.resolve(&settings).unwrap(), Path::new("/music/lib.json"));
    }
}
