//! Command-line adapter over the programme explorer library.
//!
//! Usage:
//!   explorer programmes --query eng --page 1
//!   explorer modules --programme ENG1 --query intro --stage 2
//!   explorer module M101 --programme ENG1
//!   explorer replay events.json --module-query data
//!
//! Each command drives a fresh `Session` with the events a user would have
//! produced, then prints the resulting panes as plain text (or JSON).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use programme_explorer::catalog::{CatalogIndex, IndexCache, JsonDirLoader};
use programme_explorer::logging::init_logging;
use programme_explorer::navigation::{Event, Session};
use programme_explorer::view::{
    self, DetailsView, Entry, ExplorerView, ModuleListView, SidebarView, ViewInputs,
};
use programme_explorer::{ExplorerConfig, ModuleCode, ProgrammeCode};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "explorer")]
#[command(about = "Browse programmes and modules from catalog artifacts")]
struct Cli {
    /// Directory holding the four catalog JSON artifacts.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Default log level; RUST_LOG overrides it.
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Print view models as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search programmes and show one sidebar page.
    Programmes {
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
    /// List modules, within one programme or across the catalog.
    Modules {
        #[arg(long)]
        programme: Option<String>,
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long)]
        stage: Option<i64>,
    },
    /// Show the details pane for one module.
    Module {
        code: String,
        #[arg(long)]
        programme: Option<String>,
    },
    /// Dispatch a JSON array of events and render every pane.
    Replay {
        events: PathBuf,
        #[arg(long, default_value = "")]
        module_query: String,
        #[arg(long)]
        stage: Option<i64>,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = ExplorerConfig::resolve(cli.data_dir.as_deref(), cli.log_level.as_deref())?;
    init_logging(&config.log_level);

    let loader = JsonDirLoader::new(config.data_dir.clone())?;
    let mut session = Session::new(Arc::new(IndexCache::new()), loader);
    let index = session.index()?;

    match cli.command {
        Command::Programmes { query, page } => {
            session.dispatch(&Event::QueryChanged { query })?;
            let paging = view::page_events(&index, session.state(), page);
            session.dispatch_all(&paging)?;
            let sidebar = view::sidebar(&index, session.state());
            emit(cli.json, &sidebar, print_sidebar)
        }
        Command::Modules {
            programme,
            query,
            stage,
        } => {
            if let Some(code) = programme {
                session.dispatch(&select_programme(&index, code))?;
            }
            let modules = view::module_list(&index, session.state(), &query, stage);
            emit(cli.json, &modules, print_modules)
        }
        Command::Module { code, programme } => {
            if let Some(programme) = programme {
                session.dispatch(&select_programme(&index, programme))?;
            }
            session.dispatch(&Event::SelectModule {
                code: ModuleCode::from(code.as_str()),
                programme: None,
                title: None,
                subtitle: None,
            })?;
            let details = view::details(&index, session.state())
                .with_context(|| format!("module {code} has no detail record"))?;
            emit(cli.json, &details, print_details)
        }
        Command::Replay {
            events,
            module_query,
            stage,
        } => {
            let raw = fs::read_to_string(&events)
                .with_context(|| format!("reading events from {}", events.display()))?;
            let events: Vec<Event> =
                serde_json::from_str(&raw).context("parsing navigation events")?;
            session.dispatch_all(&events)?;
            let index = session.index()?;
            let inputs = ViewInputs {
                module_query,
                stage,
            };
            let rendered = view::render(&index, session.state(), &inputs);
            emit(cli.json, &rendered, print_view)
        }
    }
}

fn select_programme(index: &CatalogIndex, code: String) -> Event {
    let code = ProgrammeCode::from(code);
    let title = index.programme_title(&code).unwrap_or_default().to_string();
    Event::SelectProgramme {
        code,
        title,
        subtitle: None,
    }
}

fn emit<T: Serialize>(json: bool, value: &T, print: fn(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print(value);
    }
    Ok(())
}

fn print_entry(entry: &Entry) {
    println!("  {}", entry.title);
    if !entry.subtitle.trim().is_empty() {
        println!("    {}", entry.subtitle);
    }
}

fn print_sidebar(sidebar: &SidebarView) {
    println!("[{}]", sidebar.placeholder);
    println!("{}", sidebar.caption);
    for entry in &sidebar.entries {
        print_entry(entry);
    }
    if sidebar.total_pages > 1 {
        println!("page {}/{}", sidebar.page + 1, sidebar.total_pages);
    }
}

fn print_modules(modules: &ModuleListView) {
    println!("{}", modules.header);
    println!("[{}]", modules.placeholder);
    if let Some(caption) = &modules.caption {
        println!("{caption}");
    }
    if let Some(message) = &modules.message {
        println!("{message}");
    }
    if let Some(stage) = &modules.stage {
        let tabs: Vec<String> = modules.stages.iter().map(|s| format!("Stage {s}")).collect();
        println!("{}", tabs.join(" | "));
        println!("{}", stage.label);
        for (idx, entry) in stage.entries.iter().enumerate() {
            if stage.divider_before == Some(idx) {
                println!("  ---");
            }
            print_entry(entry);
        }
    }
}

fn print_details(details: &DetailsView) {
    println!("{}", details.header);
    if let Some(subtitle) = &details.subtitle {
        println!("{subtitle}");
    }
    if let Some(description) = &details.description {
        println!();
        println!("{description}");
    }
    println!();
    println!("Eligibility");
    for section in &details.eligibility {
        println!(" {}", section.header);
        section.entries.iter().for_each(print_entry);
    }
    if let Some(message) = &details.eligibility_message {
        println!("  {message}");
    }
    println!("Similar modules");
    for section in &details.similarity {
        println!(" {}", section.header);
        section.entries.iter().for_each(print_entry);
    }
    if let Some(message) = &details.similarity_message {
        println!("  {message}");
    }
    println!("Other majors");
    details.other_programmes.iter().for_each(print_entry);
    if let Some(message) = &details.other_programmes_message {
        println!("  {message}");
    }
}

fn print_view(view: &ExplorerView) {
    print_sidebar(&view.sidebar);
    println!();
    print_modules(&view.modules);
    if let Some(details) = &view.details {
        println!();
        print_details(details);
    }
}
