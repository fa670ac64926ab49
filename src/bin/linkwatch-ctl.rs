use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "linkwatch-ctl")]
#[command(about = "Query a running linkwatch daemon", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8081")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full monitor status (mode, verdict, window summary)
    Status,
    /// Current link mode only
    Mode,
    /// Check the daemon is alive
    Ping,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/status", cli.url)).send().await?;
            if let Some(json) = read_json(res).await? {
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }
        Commands::Mode => {
            let res = client.get(format!("{}/status", cli.url)).send().await?;
            if let Some(json) = read_json(res).await? {
                println!("{}", json["mode"].as_str().unwrap_or("unknown"));
            }
        }
        Commands::Ping => {
            let res = client.get(format!("{}/healthz", cli.url)).send().await?;
            println!("{}", res.text().await?);
        }
    }

    Ok(())
}

async fn read_json(res: reqwest::Response) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: status API returned {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(None);
    }

    Ok(Some(res.json().await?))
}
