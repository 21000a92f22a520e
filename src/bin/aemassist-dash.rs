//! Interactive dashboard for the AEM compliance assistant.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: gemma3 against http://localhost:8000/api
//! aemassist-dash
//!
//! # Point at another backend and AEM author instance
//! aemassist-dash --api-url http://assistant:8000/api --aem-host http://author:4502
//!
//! # Read settings from a file; AEMASSIST_* variables and flags override it
//! aemassist-dash --config settings.yaml
//! ```
//!
//! Plain input is sent to the assistant in the current mode.  Type `/help` for
//! the slash commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use aemassist::aem::{DEFAULT_ASSET_ROOT, DEFAULT_QUERY_DEPTH, DEFAULT_QUERY_PATH};
use aemassist::commands::{DashboardCommand, help_text, parse_command};
use aemassist::config::DashboardArgs;
use aemassist::file::FileAnalysis;
use aemassist::render::{PlainTextRenderer, Renderer};
use aemassist::utils::{format_file_size, truncate_text};
use aemassist::{Dashboard, Mode, OverallStats, Settings, View};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = DashboardArgs::from_command_line_relaxed("aemassist-dash [OPTIONS]");
    let settings = Settings::resolve(&args)?;
    let renderer = Arc::new(PlainTextRenderer::with_color(!args.no_color));
    let mut dashboard = Dashboard::new(settings, renderer.clone())?;
    let mut rl = DefaultEditor::new()?;

    // Requests cannot be cancelled; a second Ctrl+C while one is in flight exits.
    let interrupts = Arc::new(AtomicUsize::new(0));
    let interrupts_clone = interrupts.clone();
    ctrlc::set_handler(move || {
        if interrupts_clone.fetch_add(1, Ordering::Relaxed) >= 1 {
            std::process::exit(130);
        }
        eprintln!("\nWaiting for the request to finish (Ctrl+C again to exit)");
    })?;

    let settings = dashboard.settings().get();
    println!(
        "AEM Compliance Assistant (model: {}, api: {})",
        settings.model, settings.api_url
    );
    println!("Type /help for commands, /quit to exit\n");
    if let Some(greeting) = dashboard.chat().messages().first() {
        renderer.print_message(greeting);
    }

    loop {
        interrupts.store(0, Ordering::Relaxed);

        let readline = rl.readline(&format!("[{}] You: ", dashboard.mode()));
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    if cmd == DashboardCommand::Quit {
                        println!("Goodbye!");
                        break;
                    }
                    run_command(&mut dashboard, renderer.as_ref(), cmd).await;
                    continue;
                }

                if dashboard.mode() == Mode::File {
                    renderer.print_info("File mode: use /upload <file> [task] [question]");
                    continue;
                }
                let before = dashboard.mode();
                dashboard.send_message(line).await;
                if let Some(reply) = dashboard.chat().messages().last() {
                    renderer.print_message(reply);
                }
                if dashboard.mode() != before {
                    renderer.print_info(&format!(
                        "Switched to {} mode",
                        dashboard.mode().label()
                    ));
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

async fn run_command(dashboard: &mut Dashboard, renderer: &dyn Renderer, cmd: DashboardCommand) {
    match cmd {
        DashboardCommand::Mode(mode) => {
            dashboard.set_mode(mode);
            renderer.print_info(&format!("Mode: {}", mode.label()));
        }
        DashboardCommand::Clear => {
            dashboard.chat().clear_chat().await;
            if let Some(greeting) = dashboard.chat().messages().first() {
                renderer.print_message(greeting);
            }
        }
        DashboardCommand::Export(dir) => {
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            match dashboard.chat().export_chat_to(&dir) {
                Ok(path) => renderer.print_info(&format!("Transcript written to {}", path.display())),
                Err(err) => renderer.print_error(&format!("Failed to export chat: {}", err)),
            }
        }
        DashboardCommand::Save(path) => match dashboard.chat().save_transcript_to(&path) {
            Ok(()) => renderer.print_info(&format!("Conversation saved to {}", path.display())),
            Err(err) => renderer.print_error(&format!("Failed to save conversation: {}", err)),
        },
        DashboardCommand::Load(path) => match dashboard.chat().load_transcript_from(&path) {
            Ok(()) => renderer.print_info(&format!("Conversation loaded from {}", path.display())),
            Err(err) => renderer.print_error(&format!("Failed to load conversation: {}", err)),
        },
        DashboardCommand::Query { path, depth } => {
            let path = path.unwrap_or_else(|| DEFAULT_QUERY_PATH.to_string());
            let depth = depth.unwrap_or(DEFAULT_QUERY_DEPTH);
            if dashboard.pages().query_pages(&path, depth).await {
                print_pages(dashboard);
            } else {
                renderer.print_info("No pages loaded");
            }
        }
        DashboardCommand::Select(path) => {
            let selected = dashboard.pages().toggle_select(&path);
            let verb = if selected { "Selected" } else { "Unselected" };
            renderer.print_info(&format!(
                "{verb} {path} ({} selected)",
                dashboard.pages().selection().len()
            ));
        }
        DashboardCommand::Check(categories) => {
            if dashboard
                .pages()
                .run_compliance_check(categories.as_deref())
                .await
            {
                print_results(dashboard);
            }
        }
        DashboardCommand::Report(format) => {
            if !dashboard.pages().has_results() {
                renderer.print_info("No compliance results to export");
                return;
            }
            if let Some(path) = dashboard
                .pages()
                .export_results(&format, &PathBuf::from("."))
                .await
            {
                renderer.print_info(&format!("Report written to {}", path.display()));
            }
        }
        DashboardCommand::Results => print_results(dashboard),
        DashboardCommand::Assets(path) => {
            let path = path.unwrap_or_else(|| DEFAULT_ASSET_ROOT.to_string());
            dashboard.assets().browse(&path).await;
            print_assets(dashboard);
        }
        DashboardCommand::Search(keyword) => {
            dashboard.assets().search(&keyword).await;
            print_assets(dashboard);
        }
        DashboardCommand::Asset(path) => {
            if dashboard.mode() != Mode::Aem {
                renderer.print_info("Switch to aem mode first: /mode aem");
                return;
            }
            let Some(asset) = dashboard.assets().find(&path) else {
                renderer.print_error(&format!("No listed asset at {path}"));
                return;
            };
            if let Some(selected) = dashboard.select_asset(asset).await {
                renderer.print_info(&format!("Selected {}", selected.url));
                print_versions(dashboard);
            }
        }
        DashboardCommand::Tags => {
            dashboard.tags().list().await;
            print_tags(dashboard);
        }
        DashboardCommand::Tag {
            id,
            title,
            description,
        } => match dashboard.tags().create(&id, &title, &description).await {
            Ok(true) => print_tags(dashboard),
            Ok(false) => {}
            Err(err) => renderer.print_error(&err.to_string()),
        },
        DashboardCommand::Workflows => {
            for model in dashboard.workflows().list().await {
                println!("    {}  {}", model.id, model.title);
            }
        }
        DashboardCommand::Workflow(model) => {
            let pages = dashboard.pages().selected_paths();
            if pages.is_empty() {
                renderer.print_error(aemassist::aem::EMPTY_SELECTION_ALERT);
                return;
            }
            for start in dashboard.workflows().start(&model, &pages).await {
                match start.error {
                    None => println!("    started  {}", start.page_path),
                    Some(err) => println!("    failed   {}: {}", start.page_path, err),
                }
            }
        }
        DashboardCommand::Versions => {
            let Some(versions) = dashboard.workspace().and_then(|w| w.versions()) else {
                renderer.print_info("Select an asset first: /asset <path>");
                return;
            };
            versions.list().await;
            print_versions(dashboard);
        }
        DashboardCommand::Compare(version1, version2) => {
            let Some(versions) = dashboard.workspace().and_then(|w| w.versions()) else {
                renderer.print_info("Select an asset first: /asset <path>");
                return;
            };
            if versions.compare(&version1, &version2).await
                && let Some(diff) = versions.comparison()
            {
                println!("    --- {} ({})", diff.version1.name, version1);
                println!("{}", diff.version1.content);
                println!("    --- {} ({})", diff.version2.name, version2);
                println!("{}", diff.version2.content);
            }
        }
        DashboardCommand::Image { style, prompt } => {
            if dashboard.images().generate(&prompt, style).await
                && let Some(image) = dashboard.images().last_image()
            {
                renderer.print_info(&format!(
                    "Generated ({}): {}",
                    style.label(),
                    dashboard.images().image_url(&image)
                ));
            } else {
                renderer.print_info("No image generated");
            }
        }
        DashboardCommand::Upload {
            file,
            task,
            question,
        } => {
            let Some(upload) = dashboard.file_upload() else {
                renderer.print_info("Switch to file mode first: /mode file");
                return;
            };
            if let Some(analysis) = upload.analyze(&file, &question, task).await {
                print_analysis(renderer, &analysis);
            }
        }
        DashboardCommand::Preview => {
            let aem_host = dashboard.settings().get().aem_host;
            match dashboard.workspace().and_then(|w| w.preview_links(&aem_host)) {
                Some((preview, open)) => {
                    println!("    Preview: {preview}");
                    println!("    Open:    {open}");
                }
                None => renderer.print_info("Select an asset to preview"),
            }
        }
        DashboardCommand::Model(model) => {
            match dashboard.settings().update(|s| s.model = model.clone()) {
                Ok(()) => renderer.print_info(&format!("Model changed to: {model}")),
                Err(err) => renderer.print_error(&err.to_string()),
            }
        }
        DashboardCommand::Temperature(value) => {
            match dashboard.settings().update(|s| s.temperature = value) {
                Ok(()) => renderer.print_info(&format!("temperature set to {value:.2}")),
                Err(err) => renderer.print_error(&err.to_string()),
            }
        }
        DashboardCommand::Stats => print_stats(dashboard),
        DashboardCommand::ShowConfig => print_config(dashboard),
        DashboardCommand::Help => {
            for line in help_text().lines() {
                println!("    {}", line);
            }
        }
        DashboardCommand::Quit => {}
        DashboardCommand::Invalid(message) => renderer.print_error(&message),
    }
}

fn print_pages(dashboard: &Dashboard) {
    let selection = dashboard.pages().selection();
    for page in dashboard.pages().pages() {
        let mark = if selection.contains(&page.path) { "[x]" } else { "[ ]" };
        println!("    {mark} {}  {}", page.path, page.title);
    }
}

fn print_results(dashboard: &Dashboard) {
    let Some(results) = dashboard.pages().compliance_results() else {
        println!("    No compliance results");
        return;
    };
    let stats = OverallStats::from_results(&results);
    println!(
        "    Average score {:.2}, {} issues ({} high / {} medium / {} low)",
        stats.average_score,
        stats.total_issues,
        stats.high_priority,
        stats.medium_priority,
        stats.low_priority
    );
    for result in &results {
        println!(
            "    {}  {}  {:.1}  {}",
            result.grade, result.page_path, result.overall_score, result.page_title
        );
        for (category, check) in result.failed_checks() {
            println!("        {category} / {}: {}", check.name, check.issues.join("; "));
        }
    }
}

fn print_assets(dashboard: &Dashboard) {
    println!("    {}", dashboard.assets().current_path());
    for asset in dashboard.assets().assets() {
        let kind = asset.asset_type.as_deref().unwrap_or("folder");
        let size = asset.size.map(format_file_size).unwrap_or_default();
        println!("    {kind:<9} {}  {}  {size}", asset.path, asset.title);
    }
}

fn print_tags(dashboard: &Dashboard) {
    println!("    Namespace: {}", dashboard.tags().namespace());
    for tag in dashboard.tags().tags() {
        match &tag.description {
            Some(description) => println!("    {}  {}  {}", tag.id, tag.label(), description),
            None => println!("    {}  {}", tag.id, tag.label()),
        }
    }
}

fn print_versions(dashboard: &Dashboard) {
    let Some(versions) = dashboard.workspace().and_then(|w| w.versions()) else {
        return;
    };
    for version in versions.versions() {
        println!("    {}  {}", version.name, version.display_label());
    }
}

fn print_analysis(renderer: &dyn Renderer, analysis: &FileAnalysis) {
    if let Some(error) = analysis.error() {
        renderer.print_error(error);
        return;
    }
    println!("    Result:");
    for line in analysis.text().lines() {
        println!("      {line}");
    }
    if let Some(metadata) = analysis.metadata() {
        println!("    Metadata: {}", truncate_text(&metadata.to_string(), 200));
    }
}

fn print_stats(dashboard: &Dashboard) {
    let stats = dashboard.chat().stats();
    println!("    Session Statistics:");
    println!("      Mode: {}", dashboard.mode().label());
    println!("      Conversation: {}", stats.conversation_id);
    println!("      Messages: {}", stats.message_count);
    println!(
        "      Requests: {} ({} failed)",
        stats.total_requests, stats.failed_requests
    );
    println!(
        "      Selected pages: {}",
        dashboard.pages().selection().len()
    );
    if let View::AemWorkspace(workspace) = dashboard.view()
        && let Some(selected) = workspace.selected_asset()
    {
        println!("      Selected asset: {}", selected.asset.path);
    }
}

fn print_config(dashboard: &Dashboard) {
    let settings = dashboard.settings().get();
    println!("    Current Configuration:");
    println!("      Model: {}", settings.model);
    println!("      Temperature: {:.2}", settings.temperature);
    println!("      AEM host: {}", settings.aem_host);
    println!("      API URL: {}", settings.api_url);
}
