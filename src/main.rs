use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vault_bridge::chains::table::{ProfileParams, CHAINS};
use vault_bridge::relay::open_keysign_uri;
use vault_bridge::utils::init_tracing;
use vault_bridge::BridgeConfig;

#[derive(Parser)]
#[command(name = "vault-bridge", version, about = "Cross-chain MPC signing bridge")]
struct Cli {
    /// JSON config file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supported chains
    Chains {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Decode a keysign URI and print its decrypted payload
    InspectUri { uri: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing("vault_bridge=info")?;

    let config = BridgeConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Chains { json } => print_chains(&config, json),
        Command::InspectUri { uri } => {
            let (parsed, payload) = open_keysign_uri(&uri).context("decoding keysign URI")?;
            let output = serde_json::json!({
                "type": parsed.kind,
                "vault": parsed.vault_public_key,
                "session_id": parsed.message.session_id,
                "service_name": parsed.message.service_name,
                "use_relay": parsed.message.use_relay,
                "payload": payload,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}

fn print_chains(config: &BridgeConfig, json: bool) -> anyhow::Result<()> {
    if json {
        let chains: Vec<_> = CHAINS
            .iter()
            .map(|p| {
                serde_json::json!({
                    "chain": p.name,
                    "ticker": p.ticker,
                    "decimals": p.decimals,
                    "family": p.family(),
                    "evm_chain_id": p.evm_chain_id(),
                    "endpoints": config.endpoints(p.name),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&chains)?);
        return Ok(());
    }

    println!("{:<14} {:<6} {:>8}  {:<15} DETAIL", "CHAIN", "TICKER", "DECIMALS", "FAMILY");
    for profile in CHAINS {
        let detail = match profile.params {
            ProfileParams::Evm { chain_id, gas_limit } => format!("chain id {}, gas limit {}", chain_id, gas_limit),
            ProfileParams::Utxo(p) => format!("sighash 0x{:02x}, dust {}", p.sighash_type, p.dust_threshold),
            ProfileParams::Cosmos(p) => format!("{} fee {}{}", p.chain_id, p.fee_amount, p.denom),
            ProfileParams::Thorchain(p) => format!("{} {}.{}", p.chain_id, p.asset_chain, p.asset_symbol),
        };
        println!(
            "{:<14} {:<6} {:>8}  {:<15} {}",
            profile.name,
            profile.ticker,
            profile.decimals,
            profile.family().to_string(),
            detail
        );
    }
    Ok(())
}
