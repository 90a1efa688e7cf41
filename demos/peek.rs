//! Peek/poke tool - read or write remote memory from the command line.
//!
//! This example demonstrates:
//! - Building a client from a JSON config file or flags
//! - Chunked reads and writes through the public API
//! - Enabling the crate's tracing output with `RUST_LOG`
//!
//! # Running against a local emulator
//!
//! ```text
//! RUST_LOG=memwire_client=trace cargo run --example peek -- read 0x100000 16
//! cargo run --example peek -- write 0x100000 ffffffff
//! ```

use clap::{Parser, Subcommand};
use memwire_client::{Client, ClientConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Read or write memory of a remote process")]
struct Args {
    /// JSON config file with `address`, `port` and `read_timeout_ms`.
    #[arg(long)]
    config: Option<String>,

    /// Remote host (overrides the config file).
    #[arg(long)]
    address: Option<String>,

    /// Remote port (overrides the config file).
    #[arg(long)]
    port: Option<u16>,

    /// Receive timeout in milliseconds (overrides the config file).
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read SIZE bytes at ADDRESS and print them as hex.
    Read {
        #[arg(value_parser = parse_u32)]
        address: u32,
        #[arg(value_parser = parse_u32)]
        size: u32,
    },
    /// Write HEX bytes at ADDRESS.
    Write {
        #[arg(value_parser = parse_u32)]
        address: u32,
        hex: String,
    },
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("{s:?}: {e}"))
}

fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err("hex string has an odd number of digits".to_string());
    }
    digits
        .chunks(2)
        .map(|pair| {
            let byte: String = pair.iter().collect();
            u8::from_str_radix(&byte, 16).map_err(|e| format!("{byte:?}: {e}"))
        })
        .collect()
}

/// Command-line flags win over the loaded config; absent flags keep it.
fn apply_flags(mut config: ClientConfig, args: &Args) -> ClientConfig {
    if let Some(address) = &args.address {
        config.address = address.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(ms) = args.timeout_ms {
        config.read_timeout_ms = Some(ms);
    }
    config
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let base = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::from_env()?,
    };
    let config = apply_flags(base, &args);

    let mut client = Client::builder().config(config).connect()?;

    match args.command {
        Command::Read { address, size } => {
            let bytes = client.read_memory(address, size)?;
            for (row, line) in bytes.chunks(16).enumerate() {
                let hex: Vec<String> = line.iter().map(|b| format!("{b:02x}")).collect();
                let offset = address.wrapping_add(row as u32 * 16);
                println!("{offset:08x}  {}", hex.join(" "));
            }
        }
        Command::Write { address, hex } => {
            let data = parse_hex(&hex)?;
            client.write_memory(address, &data)?;
            println!("wrote {} bytes at {address:#010x}", data.len());
        }
    }

    Ok(())
}
