//! tabfeed CLI - Replay tooling for the tab lifecycle feed
//!
//! Commands:
//! - replay: Normalize a recorded capture into canonical events
//! - validate: Report, per notice, whether it would emit or be dropped
//! - schema: Print the capture and event schemas

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use tabfeed::normalizer::normalize;
use tabfeed::notice::RawNotice;
use tabfeed::pipeline::replay_with_no_tab_id;
use tabfeed::sources::NO_TAB_ID;
use tabfeed::types::TabEvent;
use tabfeed::{FeedError, PRODUCER_NAME, TABFEED_VERSION};

/// tabfeed - Canonical tab lifecycle feed from raw browser notifications
#[derive(Parser)]
#[command(name = "tabfeed")]
#[command(version = TABFEED_VERSION)]
#[command(about = "Replay raw browser tab notifications into a canonical lifecycle feed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a recorded capture into canonical events
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// "No tab" sentinel reported by the capturing registry
        #[arg(long, default_value_t = NO_TAB_ID, allow_negative_numbers = true)]
        no_tab_id: i64,
    },

    /// Report, per notice, whether it would emit or be dropped and why
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// "No tab" sentinel reported by the capturing registry
        #[arg(long, default_value_t = NO_TAB_ID, allow_negative_numbers = true)]
        no_tab_id: i64,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one notice per line)
    Ndjson,
    /// JSON array of notices
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one event per line)
    Ndjson,
    /// JSON array of events
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (raw notice capture)
    Input,
    /// Output schema (canonical lifecycle events)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), FeedCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            no_tab_id,
        } => cmd_replay(&input, &output, input_format, output_format, no_tab_id),

        Commands::Validate {
            input,
            input_format,
            no_tab_id,
            json,
        } => cmd_validate(&input, input_format, no_tab_id, json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_replay(
    input: &PathBuf,
    output: &PathBuf,
    input_format: InputFormat,
    output_format: OutputFormat,
    no_tab_id: i64,
) -> Result<(), FeedCliError> {
    let input_data = read_input(input)?;
    let notices = parse_notices(&input_data, &input_format)?;

    if notices.is_empty() {
        return Err(FeedCliError::NoNotices);
    }

    // Dropped notices are normal filtering; an all-noise capture yields an
    // empty feed, not an error.
    let events = replay_with_no_tab_id(notices, no_tab_id);

    let output_data = format_output(&events, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(
    input: &PathBuf,
    input_format: InputFormat,
    no_tab_id: i64,
    json: bool,
) -> Result<(), FeedCliError> {
    let input_data = read_input(input)?;
    let notices = parse_notices(&input_data, &input_format)?;

    let mut emitted = 0usize;
    let mut drops: Vec<DroppedNotice> = Vec::new();

    for (index, notice) in notices.iter().enumerate() {
        match normalize(notice, no_tab_id) {
            Ok(_) => emitted += 1,
            Err(reason) => drops.push(DroppedNotice {
                index,
                notice: notice.kind().to_string(),
                reason: reason.as_str().to_string(),
            }),
        }
    }

    let report = ValidationReport {
        producer: PRODUCER_NAME.to_string(),
        version: TABFEED_VERSION.to_string(),
        total_notices: notices.len(),
        emitted,
        dropped: drops.len(),
        drops,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Producer:      {}", report.producer);
        println!("Version:       {}", report.version);
        println!("Total notices: {}", report.total_notices);
        println!("Would emit:    {}", report.emitted);
        println!("Would drop:    {}", report.dropped);

        if !report.drops.is_empty() {
            println!("\nDropped notices (normal filtering):");
            for dropped in &report.drops {
                println!(
                    "  - notice {} ({}): {}",
                    dropped.index, dropped.notice, dropped.reason
                );
            }
        }
    }

    // Drops never fail validation; only unparseable input does, and that
    // errored above.
    Ok(())
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), FeedCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: raw notice capture");
                println!();
                println!("One tagged raw notification per NDJSON line, five kinds:");
                println!();
                println!("1. before_navigate - A frame is about to navigate to a url");
                println!("   - tabId, url, frameId (0 = top frame), timeStamp (fractional ms)");
                println!();
                println!("2. dom_content_loaded - A frame's DOM finished loading");
                println!("   - tabId, frameId, timeStamp");
                println!();
                println!("3. completed - A frame finished loading completely");
                println!("   - tabId, frameId, timeStamp");
                println!();
                println!("4. tab_removed - A tab was closed");
                println!("   - tabId");
                println!();
                println!("5. tab_replaced - A pre-rendered tab took over an existing one");
                println!("   - addedTabId, removedTabId");
                println!();
                println!("Payload fields keep the browser's camelCase names; unknown fields are ignored.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: canonical tab lifecycle events");
                println!();
                println!("One tagged event per NDJSON line, four kinds:");
                println!();
                println!("1. tab_start - Top-frame navigation began");
                println!("   - tab_id, url, tsm (timestamp floored to whole ms)");
                println!();
                println!("2. dom - The tab's DOM finished loading");
                println!("   - tab_id, tsm");
                println!();
                println!("3. completed - The page finished loading completely");
                println!("   - tab_id, tsm");
                println!();
                println!("4. tab_end - The tab was removed or replaced");
                println!("   - tab_id");
                println!();
                println!("Every tab_id is valid: never zero, never the \"no tab\" sentinel.");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &PathBuf) -> Result<String, FeedCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("Reading raw notices from stdin; pipe a capture or press Ctrl-D to finish");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_notices(input_data: &str, format: &InputFormat) -> Result<Vec<RawNotice>, FeedCliError> {
    let notices = match format {
        InputFormat::Ndjson => RawNotice::parse_ndjson(input_data)?,
        InputFormat::Json => RawNotice::parse_array(input_data)?,
    };
    Ok(notices)
}

fn format_output(events: &[TabEvent], format: &OutputFormat) -> Result<String, FeedCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for event in events {
                lines.push(serde_json::to_string(event)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(events)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(events)?),
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "tabfeed raw notice",
        "description": "One raw browser notification in the tabfeed recording envelope",
        "type": "object",
        "required": ["notice"],
        "properties": {
            "notice": {
                "type": "string",
                "enum": ["before_navigate", "dom_content_loaded", "completed", "tab_removed", "tab_replaced"]
            },
            "tabId": { "type": "integer" },
            "url": { "type": "string" },
            "frameId": { "type": "integer" },
            "timeStamp": { "type": "number" },
            "addedTabId": { "type": "integer" },
            "removedTabId": { "type": "integer" }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "tabfeed canonical event",
        "description": "One canonical tab lifecycle event",
        "type": "object",
        "required": ["event", "tab_id"],
        "properties": {
            "event": {
                "type": "string",
                "enum": ["tab_start", "tab_end", "dom", "completed"]
            },
            "tab_id": { "type": "integer" },
            "url": { "type": "string" },
            "tsm": { "type": "integer" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum FeedCliError {
    Io(io::Error),
    Feed(FeedError),
    Json(serde_json::Error),
    NoNotices,
}

impl From<io::Error> for FeedCliError {
    fn from(e: io::Error) -> Self {
        FeedCliError::Io(e)
    }
}

impl From<FeedError> for FeedCliError {
    fn from(e: FeedError) -> Self {
        FeedCliError::Feed(e)
    }
}

impl From<serde_json::Error> for FeedCliError {
    fn from(e: serde_json::Error) -> Self {
        FeedCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FeedCliError> for CliError {
    fn from(e: FeedCliError) -> Self {
        match e {
            FeedCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FeedCliError::Feed(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input is a capture of raw notices (see 'tabfeed schema input')".to_string()),
            },
            FeedCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FeedCliError::NoNotices => CliError {
                code: "NO_NOTICES".to_string(),
                message: "No raw notices found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    producer: String,
    version: String,
    total_notices: usize,
    emitted: usize,
    dropped: usize,
    drops: Vec<DroppedNotice>,
}

#[derive(serde::Serialize)]
struct DroppedNotice {
    index: usize,
    notice: String,
    reason: String,
}
