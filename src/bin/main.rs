use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "movierec-server")]
#[command(about = "Movie recommendation account service", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "movierec-server.yaml")]
    config: String,

    /// Log at debug level.
    #[arg(short, long)]
    debug: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_filter = if args.debug {
        "movierec_rs=debug,tower_http=debug"
    } else {
        "movierec_rs=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(args.json.then(|| fmt::layer().json()))
        .with((!args.json).then(|| fmt::layer()))
        .init();

    if let Err(e) = movierec_rs::run(&args.config, args.debug).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
