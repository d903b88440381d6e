use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::warn;

use ssh_sidebar::collapse::FileCollapseStore;
use ssh_sidebar::config::{self, ConfigStore, FileConfigStore};
use ssh_sidebar::host::{ConfigProfileStore, ConnectionPicker, PickerOption, SessionSet};
use ssh_sidebar::organizer::SortMode;
use ssh_sidebar::sidebar::{ContextAction, Sidebar};
use ssh_sidebar::{logger, toolbar, Profile};

#[derive(Parser)]
#[command(name = "ssh-sidebar", version, about = "Browse and launch SSH connection profiles")]
struct Cli {
    /// Config file (defaults to $SSH_SIDEBAR_CONFIG or the user config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the grouped connection list.
    List {
        /// name, host or recent; remembered for next time.
        #[arg(long)]
        sort: Option<SortMode>,
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Pick an SSH profile interactively and connect.
    Pick,
    Pin { id: String },
    Unpin { id: String },
    /// Print the ssh command line and copy it to the clipboard.
    Command { id: String },
    Connect { id: String },
}

/// Numbered list on stdout, choice read from stdin.
struct StdinPicker;

#[async_trait(?Send)]
impl ConnectionPicker for StdinPicker {
    async fn pick(&self, title: &str, options: &[PickerOption]) -> Result<Option<usize>> {
        println!("{title}");
        for (i, option) in options.iter().enumerate() {
            println!("  {:>2}) {:<24} {}", i + 1, option.name, option.description);
        }
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .filter(|i| *i < options.len()))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli.config.clone().unwrap_or_else(config::config_path);
    let dir = path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    logger::init(Some(&dir.join("ssh-sidebar.log")));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;

    let store = Arc::new(FileConfigStore::open(&path));
    let result = runtime.block_on(run(cli.command, store.clone(), dir));
    store.flush(Duration::from_secs(2));
    result
}

async fn run(command: Command, store: Arc<FileConfigStore>, dir: PathBuf) -> Result<()> {
    let config: Arc<dyn ConfigStore> = store;
    let profiles = Arc::new(ConfigProfileStore::new(config.clone()));
    let mut sidebar = Sidebar::new(profiles.clone(), config.clone(), SessionSet::new())
        .with_collapse_store(Box::new(FileCollapseStore::open(dir.join("collapse.json"))));
    sidebar.init().await?;

    match command {
        Command::List { sort, filter } => {
            if let Some(sort) = sort {
                sidebar.set_sort_order(sort).await?;
            }
            sidebar.set_filter(&filter);
            print_list(&sidebar);
        }
        Command::Pick => {
            if let Some(profile) = toolbar::quick_connect(profiles.as_ref(), &StdinPicker).await? {
                println!("connecting to {}", profile.name);
            }
        }
        Command::Pin { id } => {
            let profile = find(&sidebar, &id)?;
            sidebar.run_context_action(ContextAction::Pin, &profile).await?;
        }
        Command::Unpin { id } => {
            let profile = find(&sidebar, &id)?;
            sidebar.run_context_action(ContextAction::Unpin, &profile).await?;
        }
        Command::Command { id } => {
            let profile = find(&sidebar, &id)?;
            println!("{}", profile.ssh_command());
            if let Err(err) = sidebar
                .run_context_action(ContextAction::CopyCommand, &profile)
                .await
            {
                warn!(error = %format!("{err:#}"), "clipboard copy failed");
            }
        }
        Command::Connect { id } => {
            let profile = find(&sidebar, &id)?;
            sidebar.run_context_action(ContextAction::Launch, &profile).await?;
        }
    }
    Ok(())
}

fn find(sidebar: &Sidebar, id: &str) -> Result<Profile> {
    sidebar
        .profiles()
        .iter()
        .find(|p| p.has_id(id))
        .cloned()
        .ok_or_else(|| anyhow!("no SSH profile with id {id:?}"))
}

fn print_list(sidebar: &Sidebar) {
    println!("{}", sidebar.connection_count_text());
    if !sidebar.view().has_visible_profiles() {
        println!("(no matching connections)");
        return;
    }
    for group in sidebar.view().visible_groups() {
        let marker = if group.collapsed { "+" } else { "-" };
        println!("{marker} {} ({})", group.name, group.entries.len());
        if group.collapsed {
            continue;
        }
        for entry in group.visible_entries() {
            let pin = if entry.pinned { "*" } else { " " };
            let active = if entry.active { " (active)" } else { "" };
            println!(
                "  {pin} {:<24} {}  [{}]{active}",
                entry.profile.name,
                entry.description,
                sidebar.type_label(&entry.profile)
            );
        }
    }
}
