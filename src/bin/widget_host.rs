//! widget-host CLI
//!
//! Drives the widget lifecycle controller from the command line against a
//! registry snapshot file, using the built-in script engine as the sandbox.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use widget_host::snapshot::load_registry;
use widget_host::{
    CodeRecord, CodeRegistry, CollectingSink, ControllerConfig, ExecutionContext, RenderOutput,
    ScriptEngine, WidgetLifecycleController, WidgetReference,
};

#[derive(Parser)]
#[command(
    name = "widget-host",
    about = "Execute sandboxed widgets from a registry snapshot",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a widget, execute it, and print the rendered output
    Run {
        /// Widget source, `account/section/name[@version]`
        src: String,

        /// Registry snapshot JSON file to resolve against
        #[arg(long)]
        snapshot: PathBuf,

        /// Properties passed to the widget, as a JSON object
        #[arg(long)]
        props: Option<String>,

        /// Network the widget executes against
        #[arg(long, default_value = "mainnet")]
        network: String,

        /// Nesting depth of the widget within the host tree
        #[arg(long, default_value_t = 0)]
        depth: u32,

        /// Authenticated account for privileged operations
        #[arg(long)]
        account: Option<String>,
    },

    /// Show how a widget source resolves against a snapshot
    Resolve {
        /// Widget source, `account/section/name[@version]`
        src: String,

        /// Registry snapshot JSON file to resolve against
        #[arg(long)]
        snapshot: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            src,
            snapshot,
            props,
            network,
            depth,
            account,
        } => run(&src, &snapshot, props.as_deref(), network, depth, account),
        Command::Resolve { src, snapshot } => resolve(&src, &snapshot),
    }
}

fn run(
    src: &str,
    snapshot: &PathBuf,
    props: Option<&str>,
    network: String,
    depth: u32,
    account: Option<String>,
) -> Result<()> {
    let registry = load_registry(snapshot)?;
    let sink = Arc::new(CollectingSink::new());
    let reference = WidgetReference::parse(src)?;

    let mut controller = WidgetLifecycleController::new(
        registry,
        Arc::new(ScriptEngine),
        sink.clone(),
        ControllerConfig {
            network_id: network.clone(),
            depth,
            ..ControllerConfig::default()
        },
    );

    if account.is_some() {
        let mut context = ExecutionContext::unauthenticated(&network);
        context.account_id = account;
        controller.set_context(context);
    }
    if let Some(props) = props {
        let props = serde_json::from_str(props).context("parsing --props as JSON")?;
        controller.set_props(props);
    }
    controller.set_reference(reference, vec![]);

    match controller.output() {
        RenderOutput::Rendered(value) => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(())
        }
        RenderOutput::Pending => {
            println!("pending");
            Ok(())
        }
        RenderOutput::Fallback { message, .. } => {
            for report in sink.reports() {
                eprintln!("{report}");
            }
            bail!("widget faulted: {message}");
        }
    }
}

fn resolve(src: &str, snapshot: &PathBuf) -> Result<()> {
    let registry = load_registry(snapshot)?;
    let reference = WidgetReference::parse(src)?;
    let WidgetReference::Path { path, version } = &reference else {
        bail!("only path references can be resolved");
    };

    match registry.resolve(path, *version) {
        CodeRecord::Pending => println!("pending"),
        CodeRecord::NotFound => bail!("not found: {src}"),
        CodeRecord::Code(code) => println!("{code}"),
    }
    Ok(())
}
