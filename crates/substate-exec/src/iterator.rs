//! Streaming substate iterator: one reader thread feeds
//! `N` decoder threads round-robin; a single ordered sink thread reads
//! the decoders' outputs strictly round-robin so the externally
//! observed order matches key order even though decoding runs in
//! parallel.
//!
//! Threads, not an async runtime, following the `runtime/io::worker`
//! model — bounded `crossbeam-channel`s stand in for a `deque`/
//! `Condvar` work-stealing queue, since the pipeline here is a fixed
//! round-robin fan-out/fan-in rather than a work-stealing pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

use substate_db::Store;
use substate_primitives::{Error, Substate};

const CHANNEL_CAPACITY: usize = 10;

struct RawEntry {
    block: u64,
    tx: u32,
    bytes: Box<[u8]>,
}

/// Yields fully decoded substates in ascending `(block, tx)` order.
pub struct SubstateIterator {
    output_rx: Receiver<Substate>,
    current: Option<Substate>,
    error_slot: Arc<Mutex<Option<Error>>>,
    cancelled: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
    released: bool,
}

impl SubstateIterator {
    pub fn new(store: &Store, start_block: u64, workers: usize) -> Self {
        let workers = workers.max(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let error_slot = Arc::new(Mutex::new(None));

        let mut decoder_txs = Vec::with_capacity(workers);
        let mut decoder_rxs = Vec::with_capacity(workers);
        for _ in 0..workers {
            let (tx, rx) = bounded::<RawEntry>(CHANNEL_CAPACITY);
            decoder_txs.push(tx);
            decoder_rxs.push(rx);
        }

        let backend = store.backend().clone();
        let reader_cancelled = cancelled.clone();
        let reader = std::thread::Builder::new()
            .name("substate-iter-reader".into())
            .spawn(move || {
                let prefix = b"1s";
                let start = start_block.to_be_bytes();
                let mut step = 0usize;
                for (key, value) in backend.new_iterator(prefix, &start) {
                    if reader_cancelled.load(Ordering::SeqCst) {
                        break;
                    }
                    let Ok((block, tx)) = parse_substate_key_tail(&key) else {
                        break;
                    };
                    let entry = RawEntry {
                        block,
                        tx,
                        bytes: value,
                    };
                    if decoder_txs[step].send(entry).is_err() {
                        break;
                    }
                    step = (step + 1) % decoder_txs.len();
                }
            })
            .expect("failed to spawn substate iterator reader thread");

        let mut result_rxs = Vec::with_capacity(workers);
        let mut decoder_threads = Vec::with_capacity(workers);
        for (i, input_rx) in decoder_rxs.into_iter().enumerate() {
            let (result_tx, result_rx) = bounded::<Substate>(CHANNEL_CAPACITY);
            result_rxs.push(result_rx);
            let code = store.code().clone();
            let decoder_cancelled = cancelled.clone();
            let error_slot = error_slot.clone();
            let handle = std::thread::Builder::new()
                .name(format!("substate-iter-decoder-{i}"))
                .spawn(move || {
                    let mut code = code;
                    loop {
                        if decoder_cancelled.load(Ordering::SeqCst) {
                            break;
                        }
                        let entry = match input_rx.recv() {
                            Ok(e) => e,
                            Err(_) => break,
                        };
                        match substate_rlp::decode_substate(&entry.bytes, entry.block, entry.tx, &mut code)
                        {
                            Ok((_version, substate)) => {
                                if result_tx.send(substate).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                let mut slot = error_slot.lock();
                                if slot.is_none() {
                                    *slot = Some(e);
                                }
                                break;
                            }
                        }
                    }
                })
                .expect("failed to spawn substate iterator decoder thread");
            decoder_threads.push(handle);
        }

        let (output_tx, output_rx) = bounded::<Substate>(CHANNEL_CAPACITY);
        let sink = std::thread::Builder::new()
            .name("substate-iter-sink".into())
            .spawn(move || {
                let mut open: Vec<bool> = vec![true; result_rxs.len()];
                let mut remaining = result_rxs.len();
                let mut step = 0usize;
                while remaining > 0 {
                    if open[step] {
                        match result_rxs[step].recv() {
                            Ok(item) => {
                                if output_tx.send(item).is_err() {
                                    return;
                                }
                            }
                            Err(_) => {
                                open[step] = false;
                                remaining -= 1;
                            }
                        }
                    }
                    step = (step + 1) % open.len();
                }
            })
            .expect("failed to spawn substate iterator sink thread");

        let mut threads = Vec::with_capacity(2 + workers);
        threads.push(reader);
        threads.extend(decoder_threads);
        threads.push(sink);

        SubstateIterator {
            output_rx,
            current: None,
            error_slot,
            cancelled,
            threads,
            released: false,
        }
    }

    /// Blocks until the next result arrives or the stream ends.
    pub fn next(&mut self) -> bool {
        match self.output_rx.recv() {
            Ok(item) => {
                self.current = Some(item);
                true
            }
            Err(_) => {
                self.current = None;
                false
            }
        }
    }

    pub fn value(&self) -> Option<&Substate> {
        self.current.as_ref()
    }

    pub fn error(&self) -> Option<Error> {
        self.error_slot.lock().clone()
    }

    /// Signals cancellation, drains all channels to unblock any
    /// blocked sender upstream, and joins every pipeline thread.
    /// Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.cancelled.store(true, Ordering::SeqCst);
        while self.output_rx.recv().is_ok() {}
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for SubstateIterator {
    fn drop(&mut self) {
        self.release();
    }
}

fn parse_substate_key_tail(key: &[u8]) -> Result<(u64, u32), ()> {
    if key.len() != 18 {
        return Err(());
    }
    let block = u64::from_be_bytes(key[2..10].try_into().unwrap());
    let tx_wide = u64::from_be_bytes(key[10..18].try_into().unwrap());
    let tx = u32::try_from(tx_wide).map_err(|_| ())?;
    Ok((block, tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use substate_primitives::{Account, Address, Env, ExecutionResult, Message, WorldState};

    fn sample(block: u64, tx: u32) -> Substate {
        let mut ws = WorldState::new();
        ws.add(Address::from_slice(&[1; 20]), Account::default());
        Substate {
            input_state: ws,
            output_state: WorldState::new(),
            env: Env::default(),
            message: Message::default(),
            result: ExecutionResult::default(),
            block,
            tx,
        }
    }

    #[test]
    fn yields_every_substate_in_key_order() {
        let store = Store::open_in_memory();
        store.substates().put_substate(&sample(1, 0)).unwrap();
        store.substates().put_substate(&sample(1, 1)).unwrap();
        store.substates().put_substate(&sample(2, 0)).unwrap();

        let mut it = SubstateIterator::new(&store, 0, 4);
        let mut seen = Vec::new();
        while it.next() {
            let s = it.value().unwrap();
            seen.push((s.block, s.tx));
        }
        assert_eq!(seen, vec![(1, 0), (1, 1), (2, 0)]);
        assert!(it.error().is_none());
    }

    #[test]
    fn release_before_exhaustion_does_not_hang() {
        let store = Store::open_in_memory();
        for tx in 0..20u32 {
            store.substates().put_substate(&sample(1, tx)).unwrap();
        }
        let mut it = SubstateIterator::new(&store, 0, 4);
        assert!(it.next());
        it.release();
        it.release();
    }

    #[test]
    fn respects_start_block() {
        let store = Store::open_in_memory();
        store.substates().put_substate(&sample(1, 0)).unwrap();
        store.substates().put_substate(&sample(2, 0)).unwrap();
        store.substates().put_substate(&sample(3, 0)).unwrap();

        let mut it = SubstateIterator::new(&store, 2, 2);
        let mut seen = Vec::new();
        while it.next() {
            seen.push(it.value().unwrap().block);
        }
        assert_eq!(seen, vec![2, 3]);
    }
}
