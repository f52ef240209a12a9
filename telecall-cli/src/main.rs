use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use dialoguer::{Input, Select, theme::ColorfulTheme};
use std::fs;
use std::path::{Path, PathBuf};
use telecall_client::{CallHandle, CallRole, CallSession, SessionConfig, SessionEvent, SyntheticDevices};
use telecall_core::{CallState, IceServerConfig, MediaState};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "telecall")]
#[command(about = "One-to-one WebRTC calls over a WebSocket relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join the relay room and start a call.
    Join(JoinArgs),
}

#[derive(clap::Args)]
struct JoinArgs {
    /// Relay endpoint, e.g. ws://localhost:8000/ws/chat/
    #[arg(long)]
    url: Option<String>,

    #[arg(long)]
    token: Option<String>,

    #[arg(long, value_enum)]
    role: Option<RoleArg>,

    /// Give way when both sides offer at once.
    #[arg(long)]
    polite: bool,

    /// STUN server url; repeat for several. Replaces the configured list.
    #[arg(long = "stun")]
    stun: Vec<String>,

    /// JSON session config; flags are applied on top.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Initiator,
    Responder,
}

impl From<RoleArg> for CallRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Initiator => CallRole::Initiator,
            RoleArg::Responder => CallRole::Responder,
        }
    }
}

const MENU: [&str; 4] = ["Toggle mute", "Toggle video", "Send chat message", "Hang up"];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("telecall=info,webrtc=warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Join(args) => {
            let config = build_config(args)?;
            join(config).await?;
        }
    }

    Ok(())
}

fn build_config(args: JoinArgs) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };

    if let Some(url) = args.url {
        config.relay_url = url;
    }
    if args.token.is_some() {
        config.auth_token = args.token;
    }
    if let Some(role) = args.role {
        config.role = role.into();
    }
    if args.polite {
        config.polite = true;
    }
    if !args.stun.is_empty() {
        config.ice_servers = args.stun.into_iter().map(IceServerConfig::stun).collect();
    }

    Ok(config)
}

fn load_config(path: &Path) -> Result<SessionConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
}

async fn join(config: SessionConfig) -> Result<()> {
    println!(
        "{} {} as {:?}",
        "📞 Joining".green().bold(),
        config.relay_url,
        config.role
    );

    let (handle, events) = CallSession::connect(config, SyntheticDevices::new("telecall"))
        .await
        .context("Failed to start call")?;
    let printer = tokio::spawn(print_events(events));

    loop {
        let choice = tokio::task::spawn_blocking(prompt_action)
            .await
            .context("Menu task panicked")??;

        if handle.is_finished() {
            println!("{}", "Call already ended.".yellow());
            break;
        }

        match choice {
            0 => report_toggle(handle.toggle_mute().await),
            1 => report_toggle(handle.toggle_video().await),
            2 => send_chat(&handle).await?,
            _ => {
                handle.hang_up().await?;
                break;
            }
        }
    }

    drop(handle);
    let _ = printer.await;
    println!("{}", "👋 Call ended".green().bold());
    Ok(())
}

fn prompt_action() -> Result<usize> {
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Call controls")
        .items(&MENU)
        .default(0)
        .interact()?;
    Ok(choice)
}

async fn send_chat(handle: &CallHandle) -> Result<()> {
    let text: String = tokio::task::spawn_blocking(|| {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Message")
            .interact_text()
    })
    .await
    .context("Input task panicked")??;

    if let Err(e) = handle.send_chat(text).await {
        println!("{} {}", "Chat not sent:".red(), e);
    }
    Ok(())
}

fn report_toggle(result: telecall_client::error::Result<MediaState>) {
    match result {
        Ok(state) => show_media(state),
        Err(e) => println!("{} {}", "Toggle failed:".red(), e),
    }
}

fn show_media(state: MediaState) {
    let mic = if state.muted { "muted".red() } else { "live".green() };
    let cam = if state.video_off { "off".red() } else { "on".green() };
    println!("   🎙  mic {}   🎥 camera {}", mic, cam);
}

async fn print_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Event printer skipped {} events", n);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let last = ends_call(&event);
        match event {
            SessionEvent::StateChanged(state) => {
                println!("   {} {}", "●".cyan(), describe(state));
                if state == CallState::Failed {
                    println!("   {}", "Choose \"Hang up\" to leave.".dimmed());
                }
            }
            SessionEvent::LocalMediaReady { tracks } => {
                println!("   {} {} local tracks attached", "●".cyan(), tracks)
            }
            SessionEvent::MediaUnavailable(reason) => {
                println!("   {} media unavailable: {}", "●".red(), reason)
            }
            SessionEvent::MediaStateChanged(state) => show_media(state),
            SessionEvent::RemoteTrack { kind, id } => {
                println!("   {} receiving remote {} ({})", "●".green(), kind, id)
            }
            SessionEvent::RelayMessage(value) => match value.get("message") {
                Some(text) => println!("   💬 {}", text.as_str().unwrap_or_default()),
                None => println!("   {} relay: {}", "●".dimmed(), value),
            },
            SessionEvent::RelayClosed => println!("   {} relay connection lost", "●".yellow()),
            SessionEvent::NegotiationFailed(reason) => {
                println!("   {} negotiation failed: {}", "●".red(), reason)
            }
            SessionEvent::Closed { .. } => {}
        }
        if last {
            break;
        }
    }
}

/// Nothing worth printing follows this event.
fn ends_call(event: &SessionEvent) -> bool {
    match event {
        SessionEvent::StateChanged(state) => state.is_terminal(),
        SessionEvent::Closed { .. } => true,
        _ => false,
    }
}

fn describe(state: CallState) -> ColoredString {
    match state {
        CallState::Idle => "waiting for the other side".normal(),
        CallState::AcquiringMedia => "starting camera and microphone".normal(),
        CallState::PermissionDenied => "camera/microphone blocked, receive only".yellow(),
        CallState::Negotiating => "connecting".cyan(),
        CallState::Connected => "connected".green().bold(),
        CallState::Disconnected => "connection interrupted".yellow(),
        CallState::Failed => "connection failed".red().bold(),
        CallState::Closed => "closed".normal(),
    }
}
