//! Nullable chain: an in-process chain that records how it was queried.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy_primitives::{keccak256, Bytes, B256, U256};

use chainwatch_client::{ChainBlock, ChainClient, ChainError};
use chainwatch_types::{Address, Transaction};

struct ChainState {
    blocks: BTreeMap<u64, ChainBlock>,
    /// Transactions each address sent before the modeled history began.
    prior_nonces: HashMap<Address, u64>,
    failing_blocks: BTreeSet<u64>,
    fail_head: bool,
    fetched: Vec<u64>,
}

impl ChainState {
    fn head(&self) -> u64 {
        self.blocks.keys().next_back().copied().unwrap_or(0)
    }

    fn sent_before(&self, address: &Address, up_to: u64) -> u64 {
        let prior = self.prior_nonces.get(address).copied().unwrap_or(0);
        let sent = self
            .blocks
            .range(..=up_to)
            .flat_map(|(_, block)| &block.transactions)
            .filter(|tx| &tx.from == address)
            .count() as u64;
        prior + sent
    }
}

/// A deterministic chain for testing.
///
/// Starts with an empty genesis block 0. Blocks are mined explicitly, and
/// every call is counted so tests can assert how much of the chain a scan
/// touched.
pub struct NullChainClient {
    state: Mutex<ChainState>,
    head_calls: AtomicUsize,
    tx_count_calls: AtomicUsize,
    block_calls: AtomicUsize,
}

impl NullChainClient {
    pub fn new() -> Self {
        let genesis = ChainBlock {
            number: 0,
            hash: block_hash(0),
            transactions: Vec::new(),
        };
        Self {
            state: Mutex::new(ChainState {
                blocks: BTreeMap::from([(0, genesis)]),
                prior_nonces: HashMap::new(),
                failing_blocks: BTreeSet::new(),
                fail_head: false,
                fetched: Vec::new(),
            }),
            head_calls: AtomicUsize::new(0),
            tx_count_calls: AtomicUsize::new(0),
            block_calls: AtomicUsize::new(0),
        }
    }

    /// Mine one block holding a transfer per `(from, to)` pair, in order.
    /// `to = None` models a contract creation. Returns the new block number.
    pub fn mine_transfers(&self, transfers: &[(&Address, Option<&Address>)]) -> u64 {
        let mut state = self.state.lock().unwrap();
        let number = state.head() + 1;
        let hash = block_hash(number);

        let mut transactions = Vec::with_capacity(transfers.len());
        for (index, (from, to)) in transfers.iter().enumerate() {
            let nonce = state.sent_before(from, number)
                + transactions
                    .iter()
                    .filter(|tx: &&Transaction| &tx.from == *from)
                    .count() as u64;
            transactions.push(Transaction {
                hash: keccak256(format!("{number}:{index}")),
                block_hash: hash,
                block_number: number,
                from: (*from).clone(),
                to: to.cloned(),
                nonce,
                gas: U256::from(21_000u64),
                gas_price: U256::from(1_000_000_000u64),
                value: U256::from(index as u64 + 1),
                input: Bytes::new(),
                v: U256::from(27u64),
                r: U256::from(1u64),
                s: U256::from(1u64),
                transaction_index: index as u64,
            });
        }

        state.blocks.insert(
            number,
            ChainBlock {
                number,
                hash,
                transactions,
            },
        );
        number
    }

    /// Mine `count` empty blocks. Returns the new head.
    pub fn mine_empty(&self, count: u64) -> u64 {
        let mut head = self.head_now();
        for _ in 0..count {
            head = self.mine_transfers(&[]);
        }
        head
    }

    /// Pretend `address` sent `nonce` transactions before genesis.
    pub fn set_prior_nonce(&self, address: &Address, nonce: u64) {
        self.state
            .lock()
            .unwrap()
            .prior_nonces
            .insert(address.clone(), nonce);
    }

    /// Make every fetch of block `number` fail with a transport error.
    pub fn fail_block(&self, number: u64) {
        self.state.lock().unwrap().failing_blocks.insert(number);
    }

    /// Make head lookups fail with a transport error.
    pub fn fail_head(&self, fail: bool) {
        self.state.lock().unwrap().fail_head = fail;
    }

    /// The current head, without counting a call.
    pub fn head_now(&self) -> u64 {
        self.state.lock().unwrap().head()
    }

    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    pub fn tx_count_calls(&self) -> usize {
        self.tx_count_calls.load(Ordering::SeqCst)
    }

    pub fn block_calls(&self) -> usize {
        self.block_calls.load(Ordering::SeqCst)
    }

    /// Block numbers fetched so far, in request order.
    pub fn fetched_blocks(&self) -> Vec<u64> {
        self.state.lock().unwrap().fetched.clone()
    }

    /// Reset the call counters and the fetch log.
    pub fn reset_calls(&self) {
        self.head_calls.store(0, Ordering::SeqCst);
        self.tx_count_calls.store(0, Ordering::SeqCst);
        self.block_calls.store(0, Ordering::SeqCst);
        self.state.lock().unwrap().fetched.clear();
    }
}

impl Default for NullChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainClient for NullChainClient {
    fn head(&self) -> Result<u64, ChainError> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.fail_head {
            return Err(ChainError::Transport("null chain: head unavailable".into()));
        }
        Ok(state.head())
    }

    fn tx_count_as_of(&self, address: &Address, block: u64) -> Result<u64, ChainError> {
        self.tx_count_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if block > state.head() {
            return Err(ChainError::Rpc {
                code: -32000,
                message: "header not found".into(),
            });
        }
        Ok(state.sent_before(address, block))
    }

    fn block_transactions(&self, number: u64) -> Result<ChainBlock, ChainError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        state.fetched.push(number);
        if state.failing_blocks.contains(&number) {
            return Err(ChainError::Transport(format!("null chain: block {number} unavailable")));
        }
        state
            .blocks
            .get(&number)
            .cloned()
            .ok_or_else(|| ChainError::MissingResult(format!("block {number}")))
    }
}

fn block_hash(number: u64) -> B256 {
    keccak256(format!("block:{number}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> Address {
        Address::parse(&format!("0x{}{:02x}", "0".repeat(38), last)).unwrap()
    }

    #[test]
    fn genesis_is_empty_head() {
        let chain = NullChainClient::new();
        assert_eq!(chain.head().unwrap(), 0);
        assert!(chain.block_transactions(0).unwrap().transactions.is_empty());
    }

    #[test]
    fn tx_count_counts_outgoing_only() {
        let chain = NullChainClient::new();
        let (a, b) = (addr(1), addr(2));
        chain.mine_transfers(&[(&a, Some(&b)), (&b, Some(&a))]);
        chain.mine_transfers(&[(&a, None)]);

        assert_eq!(chain.tx_count_as_of(&a, 2).unwrap(), 2);
        assert_eq!(chain.tx_count_as_of(&a, 1).unwrap(), 1);
        assert_eq!(chain.tx_count_as_of(&b, 2).unwrap(), 1);
        assert!(chain.tx_count_as_of(&a, 3).is_err());
    }

    #[test]
    fn nonces_follow_sender_history() {
        let chain = NullChainClient::new();
        let (a, b) = (addr(1), addr(2));
        chain.set_prior_nonce(&a, 5);
        chain.mine_transfers(&[(&a, Some(&b)), (&a, Some(&b))]);
        let block = chain.block_transactions(1).unwrap();
        assert_eq!(block.transactions[0].nonce, 5);
        assert_eq!(block.transactions[1].nonce, 6);
        assert_ne!(block.transactions[0].hash, block.transactions[1].hash);
    }

    #[test]
    fn injected_failures_and_counters() {
        let chain = NullChainClient::new();
        chain.mine_empty(3);
        chain.fail_block(2);
        assert!(chain.block_transactions(3).is_ok());
        assert!(matches!(chain.block_transactions(2), Err(ChainError::Transport(_))));
        assert!(matches!(chain.block_transactions(9), Err(ChainError::MissingResult(_))));
        assert_eq!(chain.block_calls(), 3);
        assert_eq!(chain.fetched_blocks(), vec![3, 2, 9]);

        chain.fail_head(true);
        assert!(chain.head().is_err());
        assert_eq!(chain.head_calls(), 1);
    }
}
