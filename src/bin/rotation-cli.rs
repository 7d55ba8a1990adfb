use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use url::Url;

#[derive(Parser)]
#[command(name = "rotation-cli")]
#[command(about = "Management CLI for the provider rotation engine", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "ROTATION_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check engine status
    Status,
    /// Show per-endpoint health
    Snapshot,
    /// Clear error counts (all groups unless --group is given)
    ResetErrors {
        #[arg(short, long)]
        group: Option<String>,
    },
    /// Take an endpoint out of rotation
    Offline { group: String, endpoint: String },
    /// Put an offline endpoint back into rotation
    Reactivate { group: String, endpoint: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let base = Url::parse(&cli.url)?;
    let request = match &cli.command {
        Commands::Status => client.get(admin_url(&base, &["status"])?),
        Commands::Snapshot => client.get(admin_url(&base, &["snapshot"])?),
        Commands::ResetErrors { group } => {
            let req = client.post(admin_url(&base, &["reset-errors"])?);
            match group {
                Some(group) => req.query(&[("group", group)]),
                None => req,
            }
        }
        Commands::Offline { group, endpoint } => {
            client.post(admin_url(&base, &["endpoints", group.as_str(), endpoint.as_str(), "offline"])?)
        }
        Commands::Reactivate { group, endpoint } => {
            client.post(admin_url(&base, &["endpoints", group.as_str(), endpoint.as_str(), "reactivate"])?)
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await?;
    Ok(())
}

/// `<base>/admin/<segments...>`, percent-encoding each segment.
fn admin_url(base: &Url, segments: &[&str]) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| format!("admin URL '{}' cannot take a path", base))?
        .pop_if_empty()
        .push("admin")
        .extend(segments);
    Ok(url)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
