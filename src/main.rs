//! Vault Relayer CLI
//!
//! Run modes:
//!   vault-relayer init --mint <MINT>...                 Create vault token accounts
//!   vault-relayer transfer -m <MINT> -t <WALLET> -a <AMOUNT> -d <DECIMALS>
//!   vault-relayer derive -m <MINT> [-o <OWNER>]         Print derived addresses (offline)
//!   vault-relayer info [--mint <MINT>...]               Program, payer and vault status
//!   vault-relayer batch <FILE>                          Run a JSON request file
//!
//! `--simulate` swaps the RPC backend for an in-memory vault program.

use clap::{Parser, Subcommand};
use solana_sdk::{native_token::lamports_to_sol, pubkey::Pubkey, signature::Signer};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use vault_relayer::amount::format_base_units;
use vault_relayer::common::{init_from_config, ConfigOverrides};
use vault_relayer::derive::{derive_associated_account, derive_vault_authority_with_bump, parse_pubkey};
use vault_relayer::ledger::load_keypair_from_file;
use vault_relayer::vault::OutcomeStatus;
use vault_relayer::{
    HumanAmount, Ledger, MemoryLedger, RelayerConfig, RequestFile, Result, RpcLedger, VaultClient,
};

#[derive(Parser)]
#[command(name = "vault-relayer")]
#[command(about = "Provision and pay out of a program-owned token vault")]
struct Cli {
    /// mainnet, testnet, devnet or localnet (or set VAULT_NETWORK)
    #[arg(long, global = true)]
    network: Option<String>,

    /// RPC endpoint (or set VAULT_RPC_URL)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Vault program ID (or set VAULT_PROGRAM_ID)
    #[arg(long, global = true)]
    program_id: Option<String>,

    /// Payer keypair file (or set VAULT_PAYER_KEYPAIR)
    #[arg(short, long, global = true)]
    keypair: Option<PathBuf>,

    /// Payer the vault program accepts for transfers (or set VAULT_AUTHORIZED_PAYER)
    #[arg(long, global = true)]
    authorized_payer: Option<String>,

    /// processed, confirmed or finalized
    #[arg(long, global = true)]
    commitment: Option<String>,

    /// Emit JSON logs
    #[arg(long, global = true)]
    json_logs: bool,

    /// Run against an in-memory simulation of the vault program
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ensure the vault token account exists for each mint
    Init {
        #[arg(short, long = "mint", required = true)]
        mints: Vec<String>,
    },

    /// Transfer tokens from the vault to a wallet
    Transfer {
        #[arg(short, long)]
        mint: String,

        /// Recipient wallet
        #[arg(short = 't', long = "to")]
        recipient: String,

        /// Human amount, e.g. 10 or 2.5
        #[arg(short, long)]
        amount: HumanAmount,

        /// The mint's decimals
        #[arg(short, long)]
        decimals: u8,
    },

    /// Print derived addresses without touching the chain
    Derive {
        #[arg(short, long)]
        mint: String,

        /// Also derive this wallet's token account
        #[arg(short, long)]
        owner: Option<String>,
    },

    /// Show program, payer and vault status
    Info {
        #[arg(short, long = "mint")]
        mints: Vec<String>,
    },

    /// Run every request in a JSON request file
    Batch {
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error [{}]: {}", e.error_code(), e);
            ExitCode::FAILURE
        }
    }
}

/// Returns false when some request failed
async fn run(cli: Cli) -> Result<bool> {
    let overrides = ConfigOverrides {
        network: cli.network,
        rpc_url: cli.rpc_url,
        program_id: cli.program_id,
        payer_keypair: cli.keypair,
        authorized_payer: cli.authorized_payer,
        commitment: cli.commitment,
        log_json: cli.json_logs,
    };
    let config = RelayerConfig::load(&overrides)?;
    init_from_config(&config)?;

    if let Commands::Derive { mint, owner } = &cli.command {
        return cmd_derive(&config.program_id, mint, owner.as_deref()).map(|_| true);
    }

    if cli.simulate {
        tracing::info!(target: "vault_relayer", "using in-memory vault program simulation");
        let client = VaultClient::new(simulated_ledger(&config), config.program_id);
        dispatch(&client, &config, cli.command).await
    } else {
        let client = VaultClient::new(RpcLedger::from_config(&config)?, config.program_id);
        dispatch(&client, &config, cli.command).await
    }
}

/// Simulation signs as the configured keypair when it loads, so payer
/// authorization behaves as it would on chain
fn simulated_ledger(config: &RelayerConfig) -> MemoryLedger {
    let mut ledger = MemoryLedger::new(config.program_id);
    match load_keypair_from_file(&config.payer_keypair) {
        Ok(keypair) => ledger = ledger.with_payer(keypair.pubkey()),
        Err(e) => tracing::warn!(
            target: "vault_relayer",
            error = %e,
            "payer keypair not loaded; simulating with a random payer"
        ),
    }
    if let Some(authorized) = config.authorized_payer {
        ledger = ledger.with_authorized_payer(authorized);
    }
    ledger
}

async fn dispatch<L: Ledger>(
    client: &VaultClient<L>,
    config: &RelayerConfig,
    command: Commands,
) -> Result<bool> {
    match command {
        Commands::Init { mints } => cmd_init(client, &mints).await,
        Commands::Transfer {
            mint,
            recipient,
            amount,
            decimals,
        } => cmd_transfer(client, &mint, &recipient, &amount, decimals).await,
        Commands::Info { mints } => cmd_info(client, config, &mints).await,
        Commands::Batch { file, json } => cmd_batch(client, &file, json).await,
        Commands::Derive { .. } => Ok(true),
    }
}

async fn cmd_init<L: Ledger>(client: &VaultClient<L>, mints: &[String]) -> Result<bool> {
    let mut all_ok = true;

    for mint in mints {
        println!("\n=== Vault account for {} ===", mint);
        let result = match parse_pubkey(mint) {
            Ok(mint) => client.ensure_vault_account(&mint).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => {
                println!("Vault authority: {}", outcome.vault_authority);
                println!("Vault ATA:       {}", outcome.address);
                match outcome.signature {
                    Some(sig) => println!("Created (tx {})", sig),
                    None => println!("Already exists"),
                }
            }
            Err(e) if e.is_skippable() => {
                println!("Skipped: program not available ({})", e);
            }
            Err(e) => {
                println!("Failed [{}]: {}", e.error_code(), e);
                all_ok = false;
            }
        }
    }

    Ok(all_ok)
}

async fn cmd_transfer<L: Ledger>(
    client: &VaultClient<L>,
    mint: &str,
    recipient: &str,
    amount: &HumanAmount,
    decimals: u8,
) -> Result<bool> {
    let mint = parse_pubkey(mint)?;
    let recipient = parse_pubkey(recipient)?;

    println!("\n=== Transfer {} of {} ===", amount, mint);
    println!("Recipient: {}", recipient);

    let receipt = client.transfer(&mint, &recipient, amount, decimals).await?;

    println!("Sender ATA:   {}", receipt.sender_ata);
    println!("Receiver ATA: {}", receipt.receiver_ata);
    println!(
        "Amount:       {} ({} base units)",
        format_base_units(receipt.amount, decimals),
        receipt.amount
    );
    println!("Signature:    {}", receipt.signature);
    Ok(true)
}

fn cmd_derive(program_id: &Pubkey, mint: &str, owner: Option<&str>) -> Result<()> {
    let mint = parse_pubkey(mint)?;
    let (vault_authority, bump) = derive_vault_authority_with_bump(&mint, program_id);

    println!("Program ID:      {}", program_id);
    println!("Mint:            {}", mint);
    println!("Vault authority: {} (bump {})", vault_authority, bump);
    println!(
        "Vault ATA:       {}",
        derive_associated_account(&vault_authority, &mint)
    );

    if let Some(owner) = owner {
        let owner = parse_pubkey(owner)?;
        println!("Owner:           {}", owner);
        println!("Owner ATA:       {}", derive_associated_account(&owner, &mint));
    }
    Ok(())
}

async fn cmd_info<L: Ledger>(
    client: &VaultClient<L>,
    config: &RelayerConfig,
    mints: &[String],
) -> Result<bool> {
    config.print_summary();

    println!("Payer:   {}", client.payer());
    match client.payer_is_authorized(config.authorized_payer.as_ref()) {
        Some(true) => println!("Payer is authorized for transfers"),
        Some(false) => println!(
            "WARNING: transfers will fail with UNAUTHORIZED; the program only accepts payer {}",
            config.authorized_payer.map(|p| p.to_string()).unwrap_or_default()
        ),
        None => {}
    }
    let lamports = client.payer_balance().await?;
    println!("Balance: {} SOL", lamports_to_sol(lamports));

    for mint in mints {
        let status = client.vault_status(&parse_pubkey(mint)?).await?;
        println!("\n=== Vault for {} ===", status.mint);
        println!("Vault authority: {}", status.vault_authority);
        println!("Vault ATA:       {}", status.vault_ata);
        match status.balance {
            Some(balance) => println!("Balance:         {} base units", balance),
            None => println!("Balance:         (account not created; run `init`)"),
        }
    }

    Ok(true)
}

async fn cmd_batch<L: Ledger>(client: &VaultClient<L>, file: &Path, json: bool) -> Result<bool> {
    let requests = RequestFile::load(file)?;
    let report = client.run_batch(&requests).await;

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| vault_relayer::VaultError::invalid_input(e.to_string()))?;
        println!("{}", rendered);
    } else {
        for outcome in &report.outcomes {
            let mark = match outcome.status {
                OutcomeStatus::Succeeded => "ok  ",
                OutcomeStatus::Skipped => "skip",
                OutcomeStatus::Failed => "FAIL",
            };
            println!("[{}] {:<9} {} : {}", mark, outcome.operation, outcome.label, outcome.detail);
        }
        println!(
            "\n{} succeeded, {} skipped, {} failed",
            report.count(OutcomeStatus::Succeeded),
            report.count(OutcomeStatus::Skipped),
            report.count(OutcomeStatus::Failed)
        );
    }

    Ok(!report.has_failures())
}
