//! tabshell CLI: a scripted demonstration shell around the navigation
//! adapter, backed by the stub engine.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use url::Url;

use nav_center::{
    AllowAllPolicy, Hooks, InMemorySnapshotLog, InMemoryVisitLog, StaticHomeResolver,
};
use scroll_chrome::ScrollSample;
use tabshell::{NavigationState, Shell, ShellConfig, StubEngineFactory};

#[derive(Parser)]
#[command(name = "tabshell", about = "Navigation adapter demo shell", version)]
struct Cli {
    /// Path to a JSON config file; defaults resolve from TABSHELL_* env.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scripted navigation against the stub engine and print the
    /// resulting state transitions.
    Demo {
        /// Target location for the scripted load.
        #[arg(long, default_value = "https://example.com/")]
        url: String,
        /// Also hot-swap the engine variant and re-issue the load.
        #[arg(long)]
        switch: bool,
    },
    /// Print the resolved configuration and adapter metrics.
    Info,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ShellConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ShellConfig::default(),
    };

    match cli.command {
        Command::Demo { url, switch } => run_demo(config, url, switch).await,
        Command::Info => run_info(config),
    }
}

async fn wait_for_state<F>(
    feed: &mut watch::Receiver<NavigationState>,
    what: &str,
    pred: F,
) -> Result<NavigationState>
where
    F: Fn(&NavigationState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let current = feed.borrow().clone();
                if pred(&current) {
                    return Ok::<_, anyhow::Error>(current);
                }
            }
            feed.changed().await.context("state feed closed")?;
        }
    })
    .await
    .with_context(|| format!("timed out waiting for {what}"))?
}

async fn run_demo(config: ShellConfig, url: String, switch: bool) -> Result<()> {
    let target: Url = url.parse().context("invalid --url")?;
    let factory = StubEngineFactory::new();
    let visits = InMemoryVisitLog::new();
    let snapshots = InMemorySnapshotLog::new();
    let home = config.home()?;
    let hooks = Hooks {
        home: Arc::new(match home {
            Some(home) => StaticHomeResolver::new(home),
            None => StaticHomeResolver::none(),
        }),
        policy: Arc::new(AllowAllPolicy),
        visits: visits.clone(),
        snapshots: snapshots.clone(),
    };

    let shell = Shell::new(config, factory.clone(), hooks)?;
    let tab = shell.open_tab_with(shell.config().default_variant, None);
    let mut feed = tab.nav().watch();
    let mut started_signals = shell.nav_started_signals();

    println!("tab {} opened on variant {}", tab.id(), tab.variant());

    shell.navigate(tab.id(), target.clone())?;
    let engine = factory.last_created().context("stub engine missing")?;
    tokio::time::timeout(Duration::from_secs(5), async {
        while engine.last_requested_load().as_ref() != Some(&target) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .context("load request never reached the engine")?;

    engine.complete_load(target.clone(), "Example Domain");

    let started = started_signals.recv().await.context("no started signal")?;
    println!("navigation started: {}", started.url);

    let state = wait_for_state(&mut feed, "load completion", |s| {
        !s.is_loading && s.progress == 1.0
    })
    .await?;
    println!(
        "load finished: url={} title={:?} back={} forward={}",
        state.url.as_ref().map(Url::as_str).unwrap_or("-"),
        state.title,
        state.can_go_back,
        state.can_go_forward,
    );

    if switch {
        let to = tab.variant().toggled();
        println!("switching engine variant to {to}");
        shell.switch_engine(tab.id(), to)?;
        let replacement = factory.last_created().context("replacement engine missing")?;
        tokio::time::timeout(Duration::from_secs(5), async {
            while replacement.last_requested_load().as_ref() != Some(&target) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .context("re-issued load never reached the replacement engine")?;
        replacement.complete_load(target.clone(), "Example Domain");
        let state = wait_for_state(&mut feed, "reload after switch", |s| {
            !s.is_loading && s.progress == 1.0
        })
        .await?;
        println!(
            "reloaded on {}: url={}",
            tab.variant(),
            state.url.as_ref().map(Url::as_str).unwrap_or("-"),
        );
    }

    // Scroll side channel: a downward fling hides chrome, an upward one
    // brings it back.
    shell.on_scroll_sample(ScrollSample::now(0.0));
    for (offset, label) in [(400.0, "down"), (100.0, "up")] {
        if let Some(signal) = shell.on_scroll_sample(ScrollSample::now(offset)) {
            println!("scroll {label}: chrome signal {signal:?}");
        }
    }

    println!("\nvisits recorded:");
    for (url, title) in visits.entries() {
        println!("  {url}  {title:?}");
    }
    println!("snapshots captured: {}", snapshots.captures().len());

    println!("\njournal:");
    for entry in tab.nav().journal().snapshot() {
        println!("  {:?} {} {}", entry.kind, entry.at.to_rfc3339(), entry.detail);
    }

    println!("\nmetrics: {:?}", nav_center::metrics::snapshot());
    Ok(())
}

fn run_info(config: ShellConfig) -> Result<()> {
    println!(
        "config: {}",
        serde_json::to_string_pretty(&config).context("serialize config")?
    );
    println!("nav metrics: {:?}", nav_center::metrics::snapshot());
    println!("bridge metrics: {:?}", engine_bridge::metrics::snapshot());
    Ok(())
}
