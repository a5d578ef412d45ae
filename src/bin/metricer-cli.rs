use clap::{Parser, Subcommand};
use reqwest::header::{HeaderValue, ACCEPT};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "metricer-cli")]
#[command(about = "Query a running Metricer host", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:9110")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the health checks
    Health,
    /// Print metric values
    Metrics {
        /// Request JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List logger levels (debug mode only)
    Levels,
    /// Change one logger level (debug mode only)
    SetLevel { logger: String, level: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health/check", cli.url)).send().await?;
            print_json(res).await?;
        }
        Commands::Metrics { json } => {
            let accept = if json { "application/json" } else { "text/plain" };
            let res = client
                .get(format!("{}/metrics/values", cli.url))
                .header(ACCEPT, HeaderValue::from_static(accept))
                .send()
                .await?;
            if json {
                print_json(res).await?;
            } else {
                print!("{}", res.text().await?);
            }
        }
        Commands::Levels => {
            let res = client
                .get(format!("{}/debug/logger/levels", cli.url))
                .send()
                .await?;
            print_json(res).await?;
        }
        Commands::SetLevel { logger, level } => {
            let mut body = serde_json::Map::new();
            body.insert(logger, Value::String(level));
            let res = client
                .patch(format!("{}/debug/logger/levels", cli.url))
                .json(&body)
                .send()
                .await?;
            print_json(res).await?;
        }
    }

    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await?;
    if !status.is_success() {
        eprintln!("Error: host returned status {}", status);
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
