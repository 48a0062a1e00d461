use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::info;

use message_log::{
    cli::{Cli, Command, GrpcClientArgs, StorageDemoArgs},
    config::Config,
    grpc::GrpcClient,
    log::{MessageLog, RECENT_LIMIT},
    server, storage,
    trace::TraceId,
};

const DEMO_CONTENT: &str = "Hello from the message-log storage demo";
const PREVIEW_CHARS: usize = 50;

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = Config::from_cli(&cli);
    match cli.command {
        Command::Post(args) => {
            let log = config.message_log();
            let trace = TraceId::new();
            let message = log.append(&args.user, &args.message, trace).await?;
            println!("Message #{} added", message.id);
            print_recent(&log, RECENT_LIMIT, trace).await?;
        }
        Command::Show(args) => {
            let log = config.message_log();
            print_recent(&log, args.limit, TraceId::new()).await?;
        }
        Command::Clear => {
            config.message_log().clear(TraceId::new()).await?;
            println!("All messages cleared.");
        }
        Command::StorageDemo(args) => storage_demo(args).await?,
        Command::Serve(args) => server::serve(config.with_serve_args(&args)).await?,
        Command::GrpcClient(args) => grpc_client(args).await?,
    }

    Ok(())
}

async fn print_recent(log: &MessageLog, limit: usize, trace: TraceId) -> Result<()> {
    let messages = log.last_n(limit, trace).await?;
    if messages.is_empty() {
        println!("No messages found.");
        return Ok(());
    }
    println!("Last {} messages:", messages.len());
    for message in &messages {
        println!("{message}");
    }
    Ok(())
}

async fn storage_demo(args: StorageDemoArgs) -> Result<()> {
    let trace = TraceId::new();
    let content = match args.data {
        Some(data) if !data.is_empty() => data,
        _ => format!("{DEMO_CONTENT}\nTimestamp: {}", Local::now().to_rfc3339()),
    };

    storage::save_data(&args.file, &content, trace)
        .await
        .with_context(|| format!("failed to save {}", args.file.display()))?;
    let read_back = storage::read_data(&args.file, trace)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let preview = preview(&read_back);
    info!(trace_id = %trace, path = %args.file.display(), %preview, "storage demo complete");
    println!("Saved {} bytes to {}", read_back.len(), args.file.display());
    println!("{preview}");
    Ok(())
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

async fn grpc_client(args: GrpcClientArgs) -> Result<()> {
    let mut client = GrpcClient::connect(args.server.clone())
        .await
        .with_context(|| format!("failed to connect to {}", args.server))?;

    if let (Some(user), Some(message)) = (&args.user, &args.message) {
        client.save(user, message).await.context("save rpc failed")?;
        println!("Message saved via gRPC");
    }

    let messages = client.last10().await.context("get_last10 rpc failed")?;
    if messages.is_empty() {
        println!("No messages found.");
    }
    for message in messages {
        println!(
            "#{} [{}] {}: {}",
            message.id, message.timestamp, message.user, message.message
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(60);
        let cut = preview(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 53);
        assert_eq!(preview("short"), "short");
    }
}
