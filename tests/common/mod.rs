// tests/common/mod.rs
//! In-memory ledger running the identity registry's rules.
//!
//! Signed transactions are decoded and their sender recovered exactly as a node would,
//! so the resolver is exercised end to end without a chain. The log filter can be made
//! sloppy to mimic nodes that ignore topic filters.

#![allow(dead_code)]

use async_trait::async_trait;
use did_registry_resolver::contracts::identity_registry::{registry_abi, updated_topic};
use did_registry_resolver::{Ledger, Resolver, ResolverConfig, ResolverError, Result};
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, Filter, Log, TransactionReceipt,
    ValueOrArray, H256, U256,
};
use ethers::utils::{keccak256, rlp::Rlp};
use ethers_core::abi::{encode, Token};
use k256::ecdsa::SigningKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const CHAIN_ID: u64 = 1337;
pub const GENESIS_TIMESTAMP: u64 = 1_600_000_000;
pub const BLOCK_TIME: u64 = 15;

pub const NOT_AUTHORIZED: &str = "Sender is not authorized.";
pub const RECOVERY_LOCKED: &str = "Recovery can not be changed.";
pub const NOT_REGISTERED: &str = "DID is not registered.";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A throwaway signing key and its address.
pub struct TestKey {
    pub raw: Vec<u8>,
    pub address: Address,
}

impl TestKey {
    pub fn random() -> Self {
        let key = SigningKey::random(&mut rand::thread_rng());
        TestKey {
            raw: key.to_bytes().to_vec(),
            address: ethers::utils::secret_key_to_address(&key),
        }
    }
}

/// A fresh random DID, so tests never share registry keys.
pub fn random_did() -> String {
    let bytes: [u8; 32] = rand::random();
    format!("did:jolo:{}", ethers::utils::hex::encode(bytes))
}

#[derive(Debug, Clone)]
struct Record {
    owner: Address,
    recovery: Address,
    service_hash: String,
}

#[derive(Default)]
struct State {
    records: HashMap<H256, Record>,
    nonces: HashMap<Address, U256>,
    logs: Vec<Log>,
    block: u64,
    calls: usize,
    submissions: usize,
    log_queries: usize,
    fail_logs: bool,
    fail_nonce: bool,
}

pub struct FakeLedger {
    registry: Address,
    sloppy_filter: bool,
    state: Mutex<State>,
}

impl FakeLedger {
    pub fn new(registry: Address) -> Self {
        FakeLedger {
            registry,
            sloppy_filter: false,
            state: Mutex::new(State::default()),
        }
    }

    /// Log queries return every registry log, whatever the topic filter says.
    pub fn sloppy(mut self) -> Self {
        self.sloppy_filter = true;
        self
    }

    pub fn fail_log_queries(&self) {
        self.state.lock().unwrap().fail_logs = true;
    }

    pub fn fail_nonce_queries(&self) {
        self.state.lock().unwrap().fail_nonce = true;
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn submissions(&self) -> usize {
        self.state.lock().unwrap().submissions
    }

    pub fn log_queries(&self) -> usize {
        self.state.lock().unwrap().log_queries
    }

    /// Advances the chain by `blocks` empty blocks.
    pub fn mine_empty(&self, blocks: u64) {
        self.state.lock().unwrap().block += blocks;
    }

    fn apply(&self, state: &mut State, sender: Address, data: &[u8]) -> std::result::Result<H256, String> {
        let abi = registry_abi();
        let selector = |name: &str| abi.abi().function(name).unwrap().short_signature();
        if data.len() < 4 {
            return Err("unknown method".into());
        }

        if data[..4] == selector("setIdentity") {
            let (key, owner, service_hash): (H256, Address, String) =
                abi.decode("setIdentity", data).map_err(|e| e.to_string())?;
            let next = match state.records.get(&key) {
                None => Record {
                    owner,
                    recovery: Address::zero(),
                    service_hash,
                },
                Some(current) if current.owner == sender => Record {
                    owner,
                    recovery: current.recovery,
                    service_hash,
                },
                Some(current) if !current.recovery.is_zero() && current.recovery == sender => {
                    Record {
                        owner,
                        recovery: Address::zero(),
                        service_hash,
                    }
                }
                Some(_) => return Err(NOT_AUTHORIZED.into()),
            };
            state.records.insert(key, next);
            Ok(key)
        } else if data[..4] == selector("setRecovery") {
            let (key, recovery): (H256, Address) =
                abi.decode("setRecovery", data).map_err(|e| e.to_string())?;
            let record = state
                .records
                .get_mut(&key)
                .ok_or_else(|| NOT_REGISTERED.to_string())?;
            if record.owner != sender {
                return Err(NOT_AUTHORIZED.into());
            }
            if !record.recovery.is_zero() {
                return Err(RECOVERY_LOCKED.into());
            }
            record.recovery = recovery;
            Ok(key)
        } else {
            Err("unknown method".into())
        }
    }

    fn topic1(filter: &Filter) -> Option<H256> {
        match &filter.topics[1] {
            Some(ValueOrArray::Value(Some(topic))) => Some(*topic),
            _ => None,
        }
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn chain_id(&self) -> Result<u64> {
        Ok(CHAIN_ID)
    }

    async fn transaction_count(&self, address: Address) -> Result<U256> {
        let state = self.state.lock().unwrap();
        if state.fail_nonce {
            return Err(ResolverError::Transport("connection reset".into()));
        }
        Ok(state.nonces.get(&address).copied().unwrap_or_default())
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        let data = tx.data().cloned().unwrap_or_default();
        let key: H256 = registry_abi()
            .decode("getIdentity", &data)
            .map_err(|e| ResolverError::Transport(e.to_string()))?;

        let record = state.records.get(&key).cloned().unwrap_or(Record {
            owner: Address::zero(),
            recovery: Address::zero(),
            service_hash: String::new(),
        });
        Ok(encode(&[
            Token::Address(record.owner),
            Token::Address(record.recovery),
            Token::String(record.service_hash),
        ])
        .into())
    }

    async fn submit(&self, raw: Bytes) -> Result<TransactionReceipt> {
        let (tx, signature) = TypedTransaction::decode_signed(&Rlp::new(&raw))
            .map_err(|e| ResolverError::Transport(e.to_string()))?;
        let sender = signature
            .recover(tx.sighash())
            .map_err(|e| ResolverError::Transport(e.to_string()))?;

        let mut state = self.state.lock().unwrap();
        state.submissions += 1;

        if tx.chain_id() != Some(CHAIN_ID.into()) {
            return Err(ResolverError::Transport("invalid chain id".into()));
        }
        let expected = state.nonces.get(&sender).copied().unwrap_or_default();
        if tx.nonce() != Some(&expected) {
            return Err(ResolverError::Transport("nonce too low".into()));
        }
        state.nonces.insert(sender, expected + 1);
        if tx.to_addr() != Some(&self.registry) {
            return Err(ResolverError::Transport("unexpected destination".into()));
        }

        // Reverted transactions are still mined and consume the nonce.
        state.block += 1;
        let block = state.block;
        let timestamp = GENESIS_TIMESTAMP + block * BLOCK_TIME;
        let hash = H256::from(keccak256(&raw));

        let data = tx.data().cloned().unwrap_or_default();
        let key = self
            .apply(&mut state, sender, &data)
            .map_err(|reason| ResolverError::RegistryRejected { reason })?;

        let log = Log {
            address: self.registry,
            topics: vec![updated_topic(), key],
            data: encode(&[Token::Uint(U256::from(timestamp))]).into(),
            block_number: Some(block.into()),
            log_index: Some(U256::zero()),
            transaction_hash: Some(hash),
            ..Default::default()
        };
        state.logs.push(log.clone());

        Ok(TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(block.into()),
            status: Some(1u64.into()),
            logs: vec![log],
            ..Default::default()
        })
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.state.lock().unwrap().block)
    }

    async fn logs(&self, filter: &Filter) -> Result<Vec<Log>> {
        let mut state = self.state.lock().unwrap();
        state.log_queries += 1;
        if state.fail_logs {
            return Err(ResolverError::Transport("request timed out".into()));
        }

        let from = filter.get_from_block().map(|n| n.as_u64()).unwrap_or(0);
        let to = filter.get_to_block().map(|n| n.as_u64()).unwrap_or(u64::MAX);
        let wanted = Self::topic1(filter);

        Ok(state
            .logs
            .iter()
            .filter(|log| {
                let block = log.block_number.map(|n| n.as_u64()).unwrap_or(0);
                block >= from && block <= to
            })
            .filter(|log| self.sloppy_filter || wanted.is_none() || log.topics.get(1) == wanted.as_ref())
            .cloned()
            .collect())
    }
}

pub fn registry_address() -> Address {
    "0xc4b48901af7891d83ce83877e1f8fb4c81a94907".parse().unwrap()
}

pub fn test_config() -> ResolverConfig {
    ResolverConfig::new("http://localhost:8545", registry_address())
}

/// Resolver over a fresh fake ledger.
pub fn resolver_with(ledger: FakeLedger, config: &ResolverConfig) -> (Resolver<FakeLedger>, Arc<FakeLedger>) {
    init_logging();
    let ledger = Arc::new(ledger);
    (Resolver::with_ledger(ledger.clone(), config), ledger)
}

pub fn resolver() -> (Resolver<FakeLedger>, Arc<FakeLedger>) {
    resolver_with(FakeLedger::new(registry_address()), &test_config())
}
