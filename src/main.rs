use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dashgraph::apps::{App, Dashboard};
use dashgraph::controls::ControlValue;
use dashgraph::server::{self, AppState};
use dashgraph::snapshot::{parse_assignment, write_snapshot};
use dashgraph::{csv_reader, RenderOptions};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "dashgraph", version)]
#[command(about = "Reactive chart dashboards over static CSV datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the automobile sales statistics dashboard
    Automobile(ServeArgs),

    /// Serve the launch records dashboard
    Launch(ServeArgs),

    /// Apply control values once and write the resulting charts to files
    Snapshot(SnapshotArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// CSV file path or http(s) URL (defaults to the dashboard's dataset)
    #[arg(short, long)]
    data: Option<String>,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on (automobile: 8050, launch: 8051)
    #[arg(short, long)]
    port: Option<u16>,

    /// Chart rendering options as JSON (e.g. '{"width": 800, "height": 500}')
    #[arg(long)]
    render: Option<String>,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    /// Which dashboard to drive
    #[arg(value_enum)]
    app: App,

    /// CSV file path or http(s) URL (defaults to the dashboard's dataset)
    #[arg(short, long)]
    data: Option<String>,

    /// Control value as <control-id>=<json>, repeatable (e.g. select-year=1980)
    #[arg(long = "set", value_parser = parse_assignment)]
    set: Vec<(String, ControlValue)>,

    /// Directory the chart files are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Chart rendering options as JSON (e.g. '{"type": "svg"}')
    #[arg(long)]
    render: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Automobile(args) => run_serve(App::Automobile, args).await,
        Command::Launch(args) => run_serve(App::Launch, args).await,
        Command::Snapshot(args) => run_snapshot(args).await,
    }
}

async fn run_serve(app: App, args: ServeArgs) -> Result<()> {
    let render = parse_render(args.render.as_deref())?;
    let dashboard = load_dashboard(app, args.data).await?;
    let addr = SocketAddr::new(args.host, args.port.unwrap_or_else(|| app.default_port()));

    server::serve(AppState::new(dashboard, render), addr).await;
    Ok(())
}

async fn run_snapshot(args: SnapshotArgs) -> Result<()> {
    let render = parse_render(args.render.as_deref())?;
    let mut dashboard = load_dashboard(args.app, args.data).await?;

    write_snapshot(&mut dashboard, &args.set, &args.out_dir, &render)
        .context("Failed to write snapshot")?;
    Ok(())
}

async fn load_dashboard(app: App, data: Option<String>) -> Result<Dashboard> {
    let source = data.unwrap_or_else(|| app.default_source().to_string());
    let table = csv_reader::load_source(&source)
        .await
        .with_context(|| format!("Failed to load dataset from {}", source))?;
    app.build(Arc::new(table))
        .context("Failed to build dashboard")
}

fn parse_render(json: Option<&str>) -> Result<RenderOptions> {
    match json {
        Some(s) => serde_json::from_str(s).context("Invalid --render options"),
        None => Ok(RenderOptions::default()),
    }
}
