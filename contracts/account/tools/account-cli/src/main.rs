use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use k256::ecdsa::SigningKey;
use role_account_encoder::{
    address_of, encode_execute, encode_execute_batch, operation_id, ready_at, sign_user_op, user_op_hash, CallSpec,
    UserOperation,
};
use role_account_types::Call;
use serde::Serialize;
use serde_json::Value;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info};

/// Off-chain helper for the role-gated account: hash and sign user operations, encode
/// account calldata and compute schedule ids.
///
/// Operations are read as JSON in the unpacked form (`callGasLimit`, `maxFeePerGas`, ...).
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Log filter (eg, `info`, `account_cli=debug`). Falls back to `RUST_LOG`.
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

/// Domain the user-operation hash is bound to.
#[derive(Args, Debug)]
struct Domain {
    /// Relay (EntryPoint v0.7) address.
    #[arg(long, env = "ENTRY_POINT", default_value = "0x0000000071727De22E5E9d8BAf0edAc6f37da032")]
    entry_point: Address,

    #[arg(long, env = "CHAIN_ID")]
    chain_id: u64,
}

#[derive(Args, Debug)]
struct KeySource {
    /// Path to a file containing the signer private key.
    #[arg(long, env = "PRIV_KEY_PATH", conflicts_with = "private_key")]
    private_key_path: Option<PathBuf>,

    /// Private key (hex string, 0x...).
    #[arg(long, env = "PKEY", conflicts_with = "private_key_path")]
    private_key: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the hash a signer must sign for an operation.
    Hash {
        /// JSON file holding the operation.
        #[arg(long)]
        op: PathBuf,
        #[command(flatten)]
        domain: Domain,
    },
    /// Sign an operation and write it back with its signature.
    Sign {
        #[arg(long)]
        op: PathBuf,
        /// Where to write the signed operation; defaults to `--op`.
        #[arg(long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        domain: Domain,
        #[command(flatten)]
        key: KeySource,
    },
    /// `execute(target, value, data)` calldata.
    EncodeExecute {
        #[arg(long)]
        target: Address,
        #[arg(long, default_value = "0")]
        value: U256,
        #[arg(long, default_value = "0x")]
        data: Bytes,
    },
    /// `executeBatch` calldata from a JSON array of `{target, value, data}`.
    EncodeBatch {
        #[arg(long)]
        calls: PathBuf,
    },
    /// Id of the scheduled operation `(caller, target, data)`.
    OperationId {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        target: Address,
        #[arg(long)]
        data: Bytes,
    },
    /// When a call scheduled now (or at `--now`) becomes executable.
    ReadyAt {
        /// Execution delay of the caller's role, in seconds.
        #[arg(long)]
        delay: u32,
        /// Requested earliest time (unix seconds); 0 for as soon as possible.
        #[arg(long, default_value_t = 0)]
        when: u64,
        #[arg(long)]
        now: Option<u64>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HashReport {
    user_op_hash: FixedBytes<32>,
    entry_point: Address,
    chain_id: u64,
    required_prefund: U256,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Command::Hash { op, domain } => {
            let packed = read_op(&op)?.pack();
            let report = HashReport {
                user_op_hash: user_op_hash(&packed, domain.entry_point, domain.chain_id),
                entry_point: domain.entry_point,
                chain_id: domain.chain_id,
                required_prefund: packed
                    .required_prefund()
                    .map_err(|err| anyhow!("invalid paymasterAndData: {err:?}"))?,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Sign {
            op,
            out,
            domain,
            key,
        } => {
            let signing_key = load_signing_key(&key)?;
            let mut user_op = read_op(&op)?;
            let mut packed = user_op.pack();
            let op_hash = sign_user_op(&mut packed, domain.entry_point, domain.chain_id, &signing_key)
                .map_err(|err| anyhow!("signing failed: {err}"))?;
            user_op.signature = packed.signature;

            let out = out.unwrap_or(op);
            let value = serde_json::to_value(&user_op).context("failed serialising user operation")?;
            write_json_atomic(&out, &value)?;
            info!(
                signer = %address_of(signing_key.verifying_key()),
                %op_hash,
                path = %out.display(),
                "user operation signed"
            );
            println!("{op_hash}");
        }
        Command::EncodeExecute {
            target,
            value,
            data,
        } => {
            println!("0x{}", hex::encode(encode_execute(target, value, data)));
        }
        Command::EncodeBatch { calls } => {
            let raw = fs::read_to_string(&calls).with_context(|| format!("failed reading {}", calls.display()))?;
            let specs: Vec<CallSpec> = serde_json::from_str(&raw)
                .with_context(|| format!("failed parsing calls in {}", calls.display()))?;
            debug!(calls = specs.len(), "encoding batch");
            let calls: Vec<Call> = specs.into_iter().map(Call::from).collect();
            println!("0x{}", hex::encode(encode_execute_batch(&calls)));
        }
        Command::OperationId {
            caller,
            target,
            data,
        } => {
            println!("{}", operation_id(caller, target, &data));
        }
        Command::ReadyAt { delay, when, now } => {
            let now = match now {
                Some(now) => now,
                None => u64::try_from(OffsetDateTime::now_utc().unix_timestamp()).context("clock before 1970")?,
            };
            let ready = ready_at(now, delay, when);
            let formatted = i64::try_from(ready)
                .ok()
                .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
                .and_then(|at| at.format(&Rfc3339).ok())
                .unwrap_or_else(|| "out of range".to_string());
            println!("{ready} ({formatted})");
        }
    }
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}

fn read_op(path: &Path) -> Result<UserOperation> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed parsing user operation in {}", path.display()))
}

fn load_signing_key(source: &KeySource) -> Result<SigningKey> {
    let raw = if let Some(ref path) = source.private_key_path {
        fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?
    } else if let Some(ref key) = source.private_key {
        key.clone()
    } else {
        return Err(anyhow!(
            "missing signer key: provide --private-key-path or --private-key (or set PRIV_KEY_PATH/PKEY)"
        ));
    };
    let trimmed = raw.trim();
    let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .map_err(|err| anyhow!("private key is not hex: {err}"))?;
    SigningKey::from_slice(&bytes).map_err(|_| anyhow!("private key is not a valid secp256k1 scalar"))
}

fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent).with_context(|| format!("failed creating directory {}", parent.display()))?;
    }

    let serialised = serde_json::to_string_pretty(value).context("failed serialising JSON")?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, serialised.as_bytes())
        .with_context(|| format!("failed writing temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("failed replacing {}", path.display()))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
