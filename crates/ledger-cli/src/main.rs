use anyhow::Result;
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Number;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:5000)
    #[arg(long, global = true, env = "LEDGER_NODE", default_value = "http://127.0.0.1:5000")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine one block
    Mine,
    /// Print the node's chain
    Chain,
    /// Ask the node whether its chain is valid
    Valid,
    /// Submit a transaction to the pending pool
    Tx {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Receiver
        #[arg(long)]
        receiver: String,
        /// Amount (integer or decimal)
        #[arg(long)]
        amount: Number,
    },
    /// Register peer nodes
    Connect {
        /// Peer URLs, e.g. http://127.0.0.1:5001
        #[arg(required = true)]
        nodes: Vec<String>,
    },
    /// Run longest-chain consensus against the registered peers
    Replace,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    receiver: String,
    amount: Number,
}

#[derive(Serialize)]
struct Connect {
    nodes: Vec<String>,
}

fn endpoint(node: &str, path: &str) -> String {
    format!("{}/{}", node.trim_end_matches('/'), path)
}

async fn print_response(res: Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = Client::new();
    let node = cli.node;
    let res = match cli.cmd {
        Command::Mine => client.get(endpoint(&node, "mine_block")).send().await?,
        Command::Chain => client.get(endpoint(&node, "get_chain")).send().await?,
        Command::Valid => client.get(endpoint(&node, "is_valid")).send().await?,
        Command::Replace => client.get(endpoint(&node, "replace_chain")).send().await?,
        Command::Tx { sender, receiver, amount } => {
            let tx = Tx { sender, receiver, amount };
            client.post(endpoint(&node, "add_transaction")).json(&tx).send().await?
        }
        Command::Connect { nodes } => {
            client.post(endpoint(&node, "connect_node")).json(&Connect { nodes }).send().await?
        }
    };
    debug!(url = %res.url(), "request complete");
    print_response(res).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_paths() {
        assert_eq!(endpoint("http://127.0.0.1:5000", "get_chain"), "http://127.0.0.1:5000/get_chain");
        assert_eq!(endpoint("http://127.0.0.1:5000/", "mine_block"), "http://127.0.0.1:5000/mine_block");
    }

    #[test]
    fn parses_transaction_amounts() {
        let cli = Cli::try_parse_from([
            "ledger-cli", "tx", "--sender", "A", "--receiver", "B", "--amount", "2.5",
        ])
        .unwrap();
        match cli.cmd {
            Command::Tx { amount, .. } => assert_eq!(amount.as_f64(), Some(2.5)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn connect_requires_nodes() {
        assert!(Cli::try_parse_from(["ledger-cli", "connect"]).is_err());
        let cli = Cli::try_parse_from(["ledger-cli", "--node", "http://n:1", "connect", "http://a:1", "http://b:2"])
            .unwrap();
        assert_eq!(cli.node, "http://n:1");
        assert!(matches!(cli.cmd, Command::Connect { ref nodes } if nodes.len() == 2));
    }
}
