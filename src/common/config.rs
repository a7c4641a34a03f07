//! Environment-based Configuration for the Vault Relayer
//!
//! All addresses and key material come from the environment (or CLI flags
//! layered on top), never from constants baked into request code.
//!
//! # Environment Variables
//!
//! - `VAULT_NETWORK` - "mainnet", "testnet", "devnet" or "localnet" (default: "devnet")
//! - `VAULT_RPC_URL` - Solana RPC endpoint URL (default: per network)
//! - `VAULT_PROGRAM_ID` - Vault program ID (devnet has a default, required elsewhere)
//! - `VAULT_PAYER_KEYPAIR` - Path to a JSON keypair file (default: ~/.config/solana/id.json)
//! - `VAULT_COMMITMENT` - "processed", "confirmed" or "finalized" (default: "confirmed")
//! - `VAULT_RPC_TIMEOUT_SECS` - RPC transport timeout (default: 30)
//! - `VAULT_AUTHORIZED_PAYER` - Payer the vault program accepts for transfers (optional)
//! - `VAULT_LOG_LEVEL` - Logging level (debug, info, warn, error)
//! - `VAULT_LOG_JSON` - "1"/"true"/"yes" for JSON logs, "0"/"false"/"no" for text
//!   (default: on for mainnet)

use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Vault program deployed on devnet
pub const DEVNET_PROGRAM_ID: &str = "5PkzwskiUGBr6HoqeALh3Y9k1kPK4a7xCZWi5q39LVLy";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Network environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
    Localnet,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "mainnet-beta" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "devnet" | "dev" => Ok(Network::Devnet),
            "localnet" | "local" | "localhost" => Ok(Network::Localnet),
            _ => Err(ConfigError::InvalidValue(
                "VAULT_NETWORK".to_string(),
                format!("unknown network: {}", s),
            )),
        }
    }
}

impl Network {
    /// Get default Solana RPC for this network
    pub fn default_rpc(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://api.mainnet-beta.solana.com",
            Network::Testnet => "https://api.testnet.solana.com",
            Network::Devnet => "https://api.devnet.solana.com",
            Network::Localnet => "http://127.0.0.1:8899",
        }
    }
}

/// Relayer configuration
#[derive(Debug, Clone)]
pub struct RelayerConfig {
    pub network: Network,

    /// Solana RPC endpoint
    pub rpc_url: String,

    /// Vault program ID
    pub program_id: Pubkey,

    /// Keypair paying fees and rent
    pub payer_keypair: PathBuf,

    /// Payer the deployed program restricts `transfer_tokens` to, if known
    pub authorized_payer: Option<Pubkey>,

    /// Commitment used for queries and confirmation
    pub commitment: CommitmentConfig,

    /// Transport timeout for every RPC call
    pub rpc_timeout: Duration,

    pub log_level: String,

    /// JSON log output
    pub log_json: bool,
}

/// Values supplied on the command line; each one wins over its env var
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub network: Option<String>,
    pub rpc_url: Option<String>,
    pub program_id: Option<String>,
    pub payer_keypair: Option<PathBuf>,
    pub authorized_payer: Option<String>,
    pub commitment: Option<String>,
    pub log_json: bool,
}

/// Override first, then environment
fn lookup(var: &str, overridden: &Option<String>) -> Option<String> {
    overridden.clone().or_else(|| env::var(var).ok())
}

impl RelayerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(&ConfigOverrides::default())
    }

    /// Load configuration from environment variables and CLI overrides
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let network: Network = lookup("VAULT_NETWORK", &overrides.network)
            .unwrap_or_else(|| "devnet".to_string())
            .parse()?;

        let rpc_url = lookup("VAULT_RPC_URL", &overrides.rpc_url)
            .unwrap_or_else(|| network.default_rpc().to_string());

        let program_id = match lookup("VAULT_PROGRAM_ID", &overrides.program_id) {
            Some(value) => parse_program_id(&value)?,
            None if network == Network::Devnet => parse_program_id(DEVNET_PROGRAM_ID)?,
            None => return Err(ConfigError::MissingEnvVar("VAULT_PROGRAM_ID".to_string())),
        };

        let payer_keypair = overrides
            .payer_keypair
            .clone()
            .or_else(|| env::var("VAULT_PAYER_KEYPAIR").ok().map(PathBuf::from))
            .unwrap_or_else(default_keypair_path);

        let authorized_payer = lookup("VAULT_AUTHORIZED_PAYER", &overrides.authorized_payer)
            .map(|value| parse_pubkey_var("VAULT_AUTHORIZED_PAYER", &value))
            .transpose()?;

        let commitment = match lookup("VAULT_COMMITMENT", &overrides.commitment) {
            Some(value) => parse_commitment(&value)?,
            None => CommitmentConfig::confirmed(),
        };

        let rpc_timeout = match env::var("VAULT_RPC_TIMEOUT_SECS") {
            Ok(value) => Duration::from_secs(value.parse().map_err(|_| {
                ConfigError::InvalidValue(
                    "VAULT_RPC_TIMEOUT_SECS".to_string(),
                    "must be a number of seconds".to_string(),
                )
            })?),
            Err(_) => Duration::from_secs(30),
        };

        let log_level = env::var("VAULT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_json = overrides.log_json
            || match env::var("VAULT_LOG_JSON") {
                Ok(value) => parse_flag("VAULT_LOG_JSON", &value)?,
                Err(_) => network == Network::Mainnet,
            };

        Ok(Self {
            network,
            rpc_url,
            program_id,
            payer_keypair,
            authorized_payer,
            commitment,
            rpc_timeout,
            log_level,
            log_json,
        })
    }

    /// Print configuration summary (no key material)
    pub fn print_summary(&self) {
        println!("=== Vault Relayer Configuration ===");
        println!("Network: {:?}", self.network);
        println!("RPC: {}", self.rpc_url);
        println!("Program ID: {}", self.program_id);
        println!("Payer keypair: {}", self.payer_keypair.display());
        if let Some(authorized) = &self.authorized_payer {
            println!("Authorized payer: {}", authorized);
        }
        println!("Commitment: {:?}", self.commitment.commitment);
        println!("RPC timeout: {}s", self.rpc_timeout.as_secs());
        println!("Log Level: {}", self.log_level);
        println!("===================================");
    }
}

fn parse_program_id(value: &str) -> Result<Pubkey, ConfigError> {
    parse_pubkey_var("VAULT_PROGRAM_ID", value)
}

fn parse_pubkey_var(var: &str, value: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value.trim())
        .map_err(|e| ConfigError::InvalidValue(var.to_string(), e.to_string()))
}

/// Parse a boolean env var; unrecognised values are an error, not "off"
pub fn parse_flag(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            var.to_string(),
            format!("expected true/false, got '{}'", other),
        )),
    }
}

/// Parse a commitment level name
pub fn parse_commitment(value: &str) -> Result<CommitmentConfig, ConfigError> {
    match value.to_lowercase().as_str() {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => Err(ConfigError::InvalidValue(
            "VAULT_COMMITMENT".to_string(),
            format!("unknown commitment: {}", other),
        )),
    }
}

/// Solana CLI default keypair location
fn default_keypair_path() -> PathBuf {
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config/solana/id.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parsing() {
        assert!(matches!("mainnet".parse::<Network>(), Ok(Network::Mainnet)));
        assert!(matches!("testnet".parse::<Network>(), Ok(Network::Testnet)));
        assert!(matches!("devnet".parse::<Network>(), Ok(Network::Devnet)));
        assert!(matches!("localhost".parse::<Network>(), Ok(Network::Localnet)));
        assert!("invalid".parse::<Network>().is_err());
    }

    #[test]
    fn test_commitment_parsing() {
        assert_eq!(parse_commitment("Finalized").unwrap(), CommitmentConfig::finalized());
        assert_eq!(parse_commitment("confirmed").unwrap(), CommitmentConfig::confirmed());
        assert!(parse_commitment("eventually").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let overrides = ConfigOverrides {
            network: Some("localnet".to_string()),
            program_id: Some(DEVNET_PROGRAM_ID.to_string()),
            commitment: Some("finalized".to_string()),
            payer_keypair: Some(PathBuf::from("/tmp/payer.json")),
            ..Default::default()
        };

        let config = RelayerConfig::load(&overrides).unwrap();
        assert_eq!(config.network, Network::Localnet);
        assert_eq!(config.program_id.to_string(), DEVNET_PROGRAM_ID);
        assert_eq!(config.commitment, CommitmentConfig::finalized());
        assert_eq!(config.payer_keypair, PathBuf::from("/tmp/payer.json"));
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let overrides = ConfigOverrides {
            program_id: Some("not-base58!".to_string()),
            ..Default::default()
        };
        assert!(RelayerConfig::load(&overrides).is_err());
    }

    #[test]
    fn test_devnet_program_id_is_valid() {
        assert!(parse_program_id(DEVNET_PROGRAM_ID).is_ok());
        assert!(parse_program_id("xyz").is_err());
    }

    #[test]
    fn test_flag_parsing() {
        for on in ["1", "true", "TRUE", "yes", "on"] {
            assert!(parse_flag("VAULT_LOG_JSON", on).unwrap(), "{}", on);
        }
        for off in ["0", "false", "No", "off", ""] {
            assert!(!parse_flag("VAULT_LOG_JSON", off).unwrap(), "{}", off);
        }
        assert!(parse_flag("VAULT_LOG_JSON", "sometimes").is_err());
    }

    #[test]
    fn test_authorized_payer_override() {
        let payer = "E4tL4xNAmtrEMxd9yi2YupxzvB3XPV5eKo4z15oyphsk";
        let overrides = ConfigOverrides {
            network: Some("devnet".to_string()),
            authorized_payer: Some(payer.to_string()),
            ..Default::default()
        };
        let config = RelayerConfig::load(&overrides).unwrap();
        assert_eq!(config.authorized_payer.map(|p| p.to_string()).as_deref(), Some(payer));

        let overrides = ConfigOverrides {
            network: Some("devnet".to_string()),
            authorized_payer: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            RelayerConfig::load(&overrides),
            Err(ConfigError::InvalidValue(var, _)) if var == "VAULT_AUTHORIZED_PAYER"
        ));
    }
}
