use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "technica-cli")]
#[command(about = "Command-line client for a running technica service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check node reachability
    Health,
    /// Show the service account (address, nonces, balance)
    Account,
    /// Show the node's suggested gas price
    GasPrice,
    /// Show the options the next transaction will use
    Transactor,
    /// Show contract address, deployment and balance
    Contract,
    /// Execute a read-only call against the contract
    Call {
        /// Hex-encoded calldata
        #[arg(short, long)]
        data: Option<String>,
    },
    /// Sign and submit a transaction to the contract
    Transact {
        /// Hex-encoded calldata
        #[arg(short, long)]
        data: Option<String>,
        /// Value in wei (defaults to the service's configured value)
        #[arg(short, long)]
        value: Option<String>,
    },
    /// Show confirmation status of a transaction
    Tx {
        /// Transaction hash
        hash: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Account => client.get(format!("{}/account", base)).send().await?,
        Commands::GasPrice => client.get(format!("{}/gas-price", base)).send().await?,
        Commands::Transactor => client.get(format!("{}/transactor", base)).send().await?,
        Commands::Contract => client.get(format!("{}/contract", base)).send().await?,
        Commands::Call { data } => {
            client
                .post(format!("{}/contract/call", base))
                .json(&json!({ "data": data }))
                .send()
                .await?
        }
        Commands::Transact { data, value } => {
            client
                .post(format!("{}/contract/transact", base))
                .json(&json!({ "data": data, "value": value }))
                .send()
                .await?
        }
        Commands::Tx { hash } => client.get(format!("{}/tx/{}", base, hash)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body = res.text().await?;

    let rendered = match serde_json::from_str::<Value>(&body) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => body,
    };

    if status.is_success() {
        println!("{}", rendered);
        Ok(())
    } else {
        eprintln!("Error: service returned status {}", status);
        eprintln!("{}", rendered);
        std::process::exit(1);
    }
}
