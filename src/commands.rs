//! Slash command parsing for the dashboard REPL.
//!
//! Input starting with `/` controls the dashboard; anything else is sent to
//! the assistant in the current mode.

use std::path::PathBuf;

use crate::file::FileTask;
use crate::image::ImageStyle;
use crate::types::Mode;

/// A parsed dashboard command.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardCommand {
    /// Switch the active view.
    Mode(Mode),

    /// Clear the conversation.
    Clear,

    /// Write the transcript as `chat-<date>.txt` into a directory (default:
    /// the working directory).
    Export(Option<PathBuf>),

    /// Save the conversation as JSON.
    Save(PathBuf),

    /// Load a conversation saved with `/save`.
    Load(PathBuf),

    /// List pages.  `None` uses the default root or depth.
    Query {
        path: Option<String>,
        depth: Option<u32>,
    },

    /// Toggle selection of a page.
    Select(String),

    /// Run compliance checks on the selection, optionally limited to some
    /// categories.
    Check(Option<Vec<String>>),

    /// Download the compliance report in a format.
    Report(String),

    /// Show the last compliance results.
    Results,

    /// Browse an asset folder.
    Assets(Option<String>),

    /// Search the current asset folder.  An empty keyword re-lists it.
    Search(String),

    /// Select an asset for preview and version comparison.
    Asset(String),

    /// List tags.
    Tags,

    /// Create a tag.
    Tag {
        id: String,
        title: String,
        description: String,
    },

    /// List workflow models.
    Workflows,

    /// Start a workflow model on the selected pages.
    Workflow(String),

    /// List versions of the selected asset.
    Versions,

    /// Compare two versions of the selected asset.
    Compare(String, String),

    /// Generate an image.
    Image { style: ImageStyle, prompt: String },

    /// Upload a file for analysis.
    Upload {
        file: PathBuf,
        task: FileTask,
        question: String,
    },

    /// Show preview links for the selected asset.
    Preview,

    /// Change the model.
    Model(String),

    /// Set the sampling temperature.
    Temperature(f32),

    /// Show session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Display help information.
    Help,

    /// Exit.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `None` if the input should be sent as a message.
///
/// ```
/// # use aemassist::commands::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/mode aem").is_some());
/// assert!(parse_command("Check my homepage").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<DashboardCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "mode" => match argument.map(str::parse::<Mode>) {
            Some(Ok(mode)) => DashboardCommand::Mode(mode),
            Some(Err(err)) => DashboardCommand::Invalid(err.to_string()),
            None => DashboardCommand::Invalid(
                "/mode requires one of chat, file, web, aem".to_string(),
            ),
        },
        "clear" => DashboardCommand::Clear,
        "export" => DashboardCommand::Export(argument.map(PathBuf::from)),
        "save" => match argument {
            Some(arg) => DashboardCommand::Save(PathBuf::from(arg)),
            None => DashboardCommand::Invalid("/save requires a file path".to_string()),
        },
        "load" => match argument {
            Some(arg) => DashboardCommand::Load(PathBuf::from(arg)),
            None => DashboardCommand::Invalid("/load requires a file path".to_string()),
        },
        "query" => parse_query(argument),
        "select" => match argument {
            Some(arg) => DashboardCommand::Select(arg.to_string()),
            None => DashboardCommand::Invalid("/select requires a page path".to_string()),
        },
        "check" => DashboardCommand::Check(argument.map(|arg| {
            arg.split([',', ' '])
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })),
        "report" => DashboardCommand::Report(argument.unwrap_or("pdf").to_lowercase()),
        "results" => DashboardCommand::Results,
        "assets" => DashboardCommand::Assets(argument.map(str::to_string)),
        "search" => DashboardCommand::Search(argument.unwrap_or_default().to_string()),
        "asset" => match argument {
            Some(arg) => DashboardCommand::Asset(arg.to_string()),
            None => DashboardCommand::Invalid("/asset requires an asset path".to_string()),
        },
        "tags" => DashboardCommand::Tags,
        "tag" => parse_tag(argument),
        "workflows" => DashboardCommand::Workflows,
        "workflow" => match argument {
            Some(arg) => DashboardCommand::Workflow(arg.to_string()),
            None => DashboardCommand::Invalid("/workflow requires a model path".to_string()),
        },
        "versions" => DashboardCommand::Versions,
        "compare" => {
            let names: Vec<&str> = argument.unwrap_or_default().split_whitespace().collect();
            match names.as_slice() {
                [first, second] => DashboardCommand::Compare(first.to_string(), second.to_string()),
                _ => DashboardCommand::Invalid("/compare requires two version names".to_string()),
            }
        }
        "image" => parse_image(argument),
        "upload" => parse_upload(argument),
        "preview" => DashboardCommand::Preview,
        "model" => match argument {
            Some(model) => DashboardCommand::Model(model.to_string()),
            None => DashboardCommand::Invalid("/model requires a model name".to_string()),
        },
        "temperature" => match argument {
            Some(arg) => match parse_f32_in_range(arg, 0.0, 1.0) {
                Ok(value) => DashboardCommand::Temperature(value),
                Err(err) => DashboardCommand::Invalid(format!("/temperature {err}")),
            },
            None => DashboardCommand::Invalid("/temperature requires a value".to_string()),
        },
        "stats" | "status" => DashboardCommand::Stats,
        "config" => DashboardCommand::ShowConfig,
        "help" | "?" => DashboardCommand::Help,
        "quit" | "exit" | "q" => DashboardCommand::Quit,
        _ => DashboardCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_query(argument: Option<&str>) -> DashboardCommand {
    let mut words = argument.unwrap_or_default().split_whitespace();
    let path = words.next().map(str::to_string);
    let depth = match words.next() {
        Some(depth) => match depth.parse::<u32>() {
            Ok(depth) => Some(depth),
            Err(_) => {
                return DashboardCommand::Invalid("/query depth expects a positive integer".to_string());
            }
        },
        None => None,
    };
    DashboardCommand::Query { path, depth }
}

fn parse_tag(argument: Option<&str>) -> DashboardCommand {
    let Some(arg) = argument else {
        return DashboardCommand::Invalid("/tag requires a tag id".to_string());
    };
    let (head, description) = match arg.split_once('|') {
        Some((head, description)) => (head.trim(), description.trim()),
        None => (arg, ""),
    };
    let mut parts = head.splitn(2, ' ');
    let id = parts.next().unwrap_or_default().to_string();
    let title = parts.next().map(str::trim).unwrap_or_default();
    DashboardCommand::Tag {
        title: if title.is_empty() { id.clone() } else { title.to_string() },
        id,
        description: description.to_string(),
    }
}

fn parse_image(argument: Option<&str>) -> DashboardCommand {
    let Some(arg) = argument else {
        return DashboardCommand::Invalid("/image requires a prompt".to_string());
    };
    let (first, rest) = arg.split_once(' ').unwrap_or((arg, ""));
    match first.parse::<ImageStyle>() {
        Ok(style) if !rest.trim().is_empty() => DashboardCommand::Image {
            style,
            prompt: rest.trim().to_string(),
        },
        _ => DashboardCommand::Image {
            style: ImageStyle::default(),
            prompt: arg.to_string(),
        },
    }
}

fn parse_upload(argument: Option<&str>) -> DashboardCommand {
    let Some(arg) = argument else {
        return DashboardCommand::Invalid("/upload requires a file path".to_string());
    };
    let (file, rest) = arg.split_once(' ').unwrap_or((arg, ""));
    let rest = rest.trim();
    let (first, remainder) = rest.split_once(' ').unwrap_or((rest, ""));
    let (task, question) = match first.parse::<FileTask>() {
        Ok(task) => (task, remainder.trim()),
        Err(_) => (FileTask::default(), rest),
    };
    DashboardCommand::Upload {
        file: PathBuf::from(file),
        task,
        question: question.to_string(),
    }
}

fn parse_f32_in_range(value: &str, min: f32, max: f32) -> Result<f32, String> {
    let parsed: f32 = value
        .parse()
        .map_err(|_| format!("expects a value between {min} and {max}"))?;
    if parsed.is_finite() && parsed >= min && parsed <= max {
        Ok(parsed)
    } else {
        Err(format!("expects a value between {min} and {max}"))
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /mode chat|file|web|aem    Switch view
  /clear                     Clear the conversation
  /export [dir]              Write the transcript to chat-<date>.txt
  /save <file>               Save the conversation as JSON
  /load <file>               Load a saved conversation
  /query [path] [depth]      List pages (default /content, depth 3)
  /select <path>             Select or unselect a page
  /check [categories]        Run compliance checks on selected pages
  /report [csv|pdf]          Download the compliance report
  /results                   Show compliance results
  /assets [path]             Browse DAM assets (default /content/dam)
  /search [keyword]          Search the current asset folder
  /asset <path>              Select an asset for preview and versions
  /tags                      List tags
  /tag <id> [title] [| desc] Create a tag
  /workflows                 List workflow models
  /workflow <model>          Start a workflow on the selected pages
  /versions                  List versions of the selected asset
  /compare <v1> <v2>         Compare two versions of the selected asset
  /image [style] <prompt>    Generate an image
  /upload <file> [task] [q]  Analyze a file (qa, summarize, analyze, extract, translate)
  /preview                   Show preview links for the selected asset
  /model <name>              Change the model
  /temperature <v>           Set temperature 0.0-1.0
  /stats                     Show session statistics
  /config                    Show current configuration
  /help                      Show this help message
  /quit                      Exit"#
}
