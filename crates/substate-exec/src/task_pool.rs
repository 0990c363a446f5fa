//! Parallel replay over a block range: `workers` worker
//! threads execute blocks out of order, while the caller-visible
//! *completion* order stays ascending via a "wait map" — a block is
//! reported done only once every lower-numbered block has already been
//! reported.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{bounded, unbounded};
use substate_db::{Store, SubstateStore};
use substate_primitives::{Error, Result, Substate};

const WORK_CHANNEL_CAPACITY: usize = 64;

/// `task_fn`'s per-transaction callback.
pub type TaskFn<'a> = dyn Fn(u64, u32, &Substate) -> Result<()> + Send + Sync + 'a;
/// `block_fn`'s per-block callback, invoked before `task_fn` runs over
/// a block's transactions.
pub type BlockFn<'a> = dyn Fn(u64, usize) -> Result<()> + Send + Sync + 'a;

pub struct TaskPoolConfig<'a> {
    pub first: u64,
    pub last: u64,
    pub workers: usize,
    pub task_fn: Option<&'a TaskFn<'a>>,
    pub block_fn: Option<&'a BlockFn<'a>>,
    pub skip_transfer: bool,
    pub skip_call: bool,
    pub skip_create: bool,
}

/// Tallies accumulated by a successful run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub txs: u64,
    pub gas_used: u64,
}

/// Whether a transaction survives the `skip_*` filters.
fn passes_filters(substate: &Substate, skip_transfer: bool, skip_call: bool, skip_create: bool) -> bool {
    match &substate.message.to {
        None => !skip_create,
        Some(to) => {
            let has_code = substate
                .input_state
                .get()
                .get(to)
                .is_some_and(|acc| acc.is_contract());
            if has_code {
                !skip_call
            } else {
                !skip_transfer
            }
        }
    }
}

/// Runs every non-filtered transaction of `block` through `task_fn`,
/// in ascending tx order.
pub fn execute_block(substates: &SubstateStore, block: u64, config: &TaskPoolConfig) -> Result<Tally> {
    let txs = substates
        .get_block_substates(block)
        .map_err(|e| e.context(format!("cannot execute block {block}")))?;

    if let Some(block_fn) = config.block_fn {
        block_fn(block, txs.len()).map_err(|e| e.context(format!("block_fn failed at block {block}")))?;
    }

    let Some(task_fn) = config.task_fn else {
        return Ok(Tally {
            txs: txs.len() as u64,
            gas_used: 0,
        });
    };

    let mut tally = Tally::default();
    for (tx, substate) in txs {
        if !passes_filters(&substate, config.skip_transfer, config.skip_call, config.skip_create) {
            continue;
        }
        task_fn(block, tx, &substate)
            .map_err(|e| e.context(format!("task_fn failed at block={block} tx={tx}")))?;
        tally.txs += 1;
        tally.gas_used += substate.result.gas_used;
    }
    Ok(tally)
}

enum DoneMessage {
    Ok(u64, Tally),
    Err(u64, Error),
}

/// Whether `block`'s progress is due to be logged, given `sec` elapsed
/// since the run started and `last_sec` elapsed at the previous report.
/// Rarer milestones (round block numbers) get a short grace period;
/// everything else is rate-limited to once a minute.
fn due_for_report(block: u64, last: u64, sec: f64, last_sec: f64) -> bool {
    block == last
        || (block % 10000 == 0 && sec > last_sec + 5.0)
        || (block % 1000 == 0 && sec > last_sec + 10.0)
        || (block % 100 == 0 && sec > last_sec + 20.0)
        || (block % 10 == 0 && sec > last_sec + 40.0)
        || (sec > last_sec + 60.0)
}

/// Drives `execute_block` over `[first, last]` with `workers` worker
/// threads, a producer pushing the block range into a bounded work
/// channel, and a wait-map ensuring completion is observed in
/// ascending block order even though execution itself is parallel.
pub fn execute(store: &Store, config: TaskPoolConfig) -> Result<Tally> {
    let workers = config.workers.max(1);
    let TaskPoolConfig {
        first,
        last,
        task_fn,
        block_fn,
        skip_transfer,
        skip_call,
        skip_create,
        ..
    } = config;

    let (work_tx, work_rx) = bounded::<u64>(WORK_CHANNEL_CAPACITY);
    let (done_tx, done_rx) = unbounded::<DoneMessage>();
    let stop = Arc::new(AtomicBool::new(false));

    // `task_fn`/`block_fn` are borrowed, not `'static` — `thread::scope`
    // lets the worker threads hold them without requiring the caller
    // to box or leak the callbacks.
    let (total, first_error) = std::thread::scope(|scope| {
        let producer_stop = stop.clone();
        std::thread::Builder::new()
            .name("substate-taskpool-producer".into())
            .spawn_scoped(scope, move || {
                for block in first..=last {
                    if producer_stop.load(Ordering::SeqCst) {
                        break;
                    }
                    if work_tx.send(block).is_err() {
                        break;
                    }
                }
            })
            .expect("failed to spawn task pool producer thread");

        for i in 0..workers {
            let work_rx = work_rx.clone();
            let done_tx = done_tx.clone();
            let stop = stop.clone();
            let substates = store.substates().clone();
            let local_config = TaskPoolConfig {
                first,
                last,
                workers,
                task_fn,
                block_fn,
                skip_transfer,
                skip_call,
                skip_create,
            };
            std::thread::Builder::new()
                .name(format!("substate-taskpool-worker-{i}"))
                .spawn_scoped(scope, move || loop {
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }
                    let block = match work_rx.recv() {
                        Ok(b) => b,
                        Err(_) => break,
                    };
                    match execute_block(&substates, block, &local_config) {
                        Ok(tally) => {
                            if done_tx.send(DoneMessage::Ok(block, tally)).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            let _ = done_tx.send(DoneMessage::Err(block, e));
                            stop.store(true, Ordering::SeqCst);
                            break;
                        }
                    }
                })
                .expect("failed to spawn task pool worker thread");
        }
        drop(work_rx);
        drop(done_tx);

        let total_blocks = last - first + 1;
        let mut pending: BTreeMap<u64, Tally> = BTreeMap::new();
        let mut next_to_commit = first;
        let mut total = Tally::default();
        let mut first_error: Option<Error> = None;
        let start = Instant::now();
        let mut last_sec = 0.0f64;
        let mut blocks_committed = 0u64;

        while blocks_committed < total_blocks {
            let msg = match done_rx.recv() {
                Ok(m) => m,
                Err(_) => break,
            };
            match msg {
                DoneMessage::Ok(block, tally) => {
                    pending.insert(block, tally);
                }
                DoneMessage::Err(block, e) => {
                    first_error.get_or_insert(e.context(format!("task pool aborted at block {block}")));
                    stop.store(true, Ordering::SeqCst);
                    break;
                }
            }
            while let Some(tally) = pending.remove(&next_to_commit) {
                let committed_block = next_to_commit;
                total.txs += tally.txs;
                total.gas_used += tally.gas_used;
                blocks_committed += 1;
                next_to_commit += 1;

                let sec = start.elapsed().as_secs_f64();
                if due_for_report(committed_block, last, sec, last_sec) {
                    log::info!(
                        "replayed up to block {committed_block} ({blocks_committed} blocks, {} txs, {} gas)",
                        total.txs,
                        total.gas_used
                    );
                    last_sec = sec;
                }
            }
        }

        stop.store(true, Ordering::SeqCst);
        (total, first_error)
        // scope exit joins the producer and every worker thread.
    });

    if let Some(e) = first_error {
        return Err(e);
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use substate_primitives::{Account, Address, Env, ExecutionResult, Message, WorldState};

    fn sample(block: u64, tx: u32, to: Option<Address>, gas_used: u64) -> Substate {
        let mut ws = WorldState::new();
        ws.add(Address::from_slice(&[1; 20]), Account::default());
        Substate {
            input_state: ws,
            output_state: WorldState::new(),
            env: Env::default(),
            message: Message {
                to,
                ..Default::default()
            },
            result: ExecutionResult {
                gas_used,
                ..Default::default()
            },
            block,
            tx,
        }
    }

    #[test]
    fn single_worker_visits_every_tx_in_order() {
        let store = Store::open_in_memory();
        store
            .substates()
            .put_substate(&sample(1, 0, Some(Address::from_slice(&[9; 20])), 21))
            .unwrap();
        store
            .substates()
            .put_substate(&sample(1, 1, Some(Address::from_slice(&[9; 20])), 30))
            .unwrap();
        store
            .substates()
            .put_substate(&sample(2, 0, Some(Address::from_slice(&[9; 20])), 50))
            .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let task_fn = move |block: u64, tx: u32, _s: &Substate| -> Result<()> {
            seen_clone.lock().push((block, tx));
            Ok(())
        };
        let config = TaskPoolConfig {
            first: 1,
            last: 2,
            workers: 1,
            task_fn: Some(&task_fn),
            block_fn: None,
            skip_transfer: false,
            skip_call: false,
            skip_create: false,
        };
        let tally = execute(&store, config).unwrap();
        assert_eq!(tally.txs, 3);
        assert_eq!(tally.gas_used, 101);
        assert_eq!(*seen.lock(), vec![(1, 0), (1, 1), (2, 0)]);
    }

    #[test]
    fn skip_create_drops_txs_with_no_recipient() {
        let store = Store::open_in_memory();
        store.substates().put_substate(&sample(1, 0, None, 10)).unwrap();
        store
            .substates()
            .put_substate(&sample(1, 1, Some(Address::from_slice(&[9; 20])), 20))
            .unwrap();

        let config = TaskPoolConfig {
            first: 1,
            last: 1,
            workers: 2,
            task_fn: Some(&|_b, _t, _s| Ok(())),
            block_fn: None,
            skip_transfer: false,
            skip_call: false,
            skip_create: true,
        };
        let tally = execute(&store, config).unwrap();
        assert_eq!(tally.txs, 1);
    }

    #[test]
    fn worker_error_aborts_and_propagates() {
        let store = Store::open_in_memory();
        store.substates().put_substate(&sample(1, 0, None, 10)).unwrap();

        let task_fn = |_b: u64, _t: u32, _s: &Substate| -> Result<()> {
            Err(Error::Cancelled)
        };
        let config = TaskPoolConfig {
            first: 1,
            last: 1,
            workers: 1,
            task_fn: Some(&task_fn),
            block_fn: None,
            skip_transfer: false,
            skip_call: false,
            skip_create: false,
        };
        assert!(execute(&store, config).is_err());
    }
}
