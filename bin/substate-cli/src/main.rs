//! Command-line entry point over a substate store. No EVM dependency:
//! `replay` only walks the store through the task pool and tallies
//! transactions and gas.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use substate_db::Store;
use substate_exec::{execute, TaskPoolConfig};
use substate_primitives::Result;

#[derive(Parser)]
#[command(name = "substate-cli", about = "Inspect and replay a substate store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay every substate in a block range through the task pool.
    Replay {
        /// Path to the substate store.
        #[arg(long = "substate-db")]
        substate_db: PathBuf,

        /// First block to replay (defaults to the store's first block).
        #[arg(long)]
        first: Option<u64>,

        /// Last block to replay (defaults to the store's last block).
        #[arg(long)]
        last: Option<u64>,

        /// Number of worker threads.
        #[arg(long, default_value_t = 4)]
        workers: usize,

        /// Skip plain-transfer transactions.
        #[arg(long = "skip-transfer-txs")]
        skip_transfer_txs: bool,

        /// Skip contract-call transactions.
        #[arg(long = "skip-call-txs")]
        skip_call_txs: bool,

        /// Skip contract-creation transactions.
        #[arg(long = "skip-create-txs")]
        skip_create_txs: bool,
    },
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Replay {
            substate_db,
            first,
            last,
            workers,
            skip_transfer_txs,
            skip_call_txs,
            skip_create_txs,
        } => {
            let store = Store::open_read_only(&substate_db)?;
            let first = match first {
                Some(b) => b,
                None => store.substates().get_first_substate()?.map(|s| s.block).unwrap_or(0),
            };
            let last = match last {
                Some(b) => b,
                None => store.substates().get_last_block()?,
            };

            log::info!("replaying blocks {first}..={last} with {workers} workers");

            let task_fn = |_block: u64, _tx: u32, _substate: &substate_primitives::Substate| -> Result<()> { Ok(()) };
            let config = TaskPoolConfig {
                first,
                last,
                workers,
                task_fn: Some(&task_fn),
                block_fn: None,
                skip_transfer: skip_transfer_txs,
                skip_call: skip_call_txs,
                skip_create: skip_create_txs,
            };
            let tally = execute(&store, config)?;
            println!("replayed {} transactions, {} gas used", tally.txs, tally.gas_used);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
