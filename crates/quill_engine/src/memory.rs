//! Reference in-memory engine.

use crate::engine::{Engine, EngineTransaction, KvCursor, Store};
use crate::error::{EngineError, EngineResult};
use parking_lot::{Condvar, Mutex};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

/// Contents of one store.
#[derive(Debug, Clone, Default)]
struct StoreData {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    next_sequence: u64,
}

/// Full engine state: every store by name.
#[derive(Debug, Clone, Default)]
struct EngineState {
    stores: BTreeMap<String, StoreData>,
}

#[derive(Debug, Default)]
struct Inner {
    state: EngineState,
    writer_active: bool,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    inner: Mutex<Inner>,
    writer_released: Condvar,
}

/// An in-memory storage engine.
///
/// Each transaction works on a private snapshot of the committed state:
/// readers simply keep theirs, while the single writer swaps its snapshot
/// back in on commit. Writers are serialized; `begin(true)` blocks until
/// the current writer finishes.
///
/// This engine is suitable for tests and ephemeral databases. It is
/// thread-safe and cheap to clone handles of via [`Engine`] trait objects.
///
/// # Example
///
/// ```
/// use quill_engine::{Engine, MemoryEngine};
///
/// let engine = MemoryEngine::new();
/// let tx = engine.begin(true).unwrap();
/// tx.create_store("data").unwrap();
/// tx.store("data").unwrap().put(b"k", b"v").unwrap();
/// tx.commit().unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MemoryEngine {
    shared: Arc<Shared>,
}

impl MemoryEngine {
    /// Creates a new empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for MemoryEngine {
    fn begin(&self, writable: bool) -> EngineResult<Box<dyn EngineTransaction + '_>> {
        let mut inner = self.shared.inner.lock();
        if inner.closed {
            return Err(EngineError::EngineClosed);
        }
        if writable {
            while inner.writer_active {
                self.shared.writer_released.wait(&mut inner);
                if inner.closed {
                    return Err(EngineError::EngineClosed);
                }
            }
            inner.writer_active = true;
        }
        let snapshot = inner.state.clone();
        drop(inner);

        Ok(Box::new(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            state: Arc::new(Mutex::new(TxnState {
                state: snapshot,
                done: false,
            })),
            writable,
        }))
    }

    fn close(&self) -> EngineResult<()> {
        let mut inner = self.shared.inner.lock();
        inner.closed = true;
        // wake anyone waiting for the writer slot so they observe the close
        self.shared.writer_released.notify_all();
        Ok(())
    }
}

/// Transaction-private view of the engine state.
#[derive(Debug)]
struct TxnState {
    state: EngineState,
    done: bool,
}

struct MemoryTransaction {
    shared: Arc<Shared>,
    state: Arc<Mutex<TxnState>>,
    writable: bool,
}

impl MemoryTransaction {
    fn release_writer(&self) {
        if self.writable {
            let mut inner = self.shared.inner.lock();
            inner.writer_active = false;
            self.shared.writer_released.notify_one();
        }
    }

    fn check_writable(&self) -> EngineResult<()> {
        if self.writable {
            Ok(())
        } else {
            Err(EngineError::ReadOnlyTransaction)
        }
    }
}

impl EngineTransaction for MemoryTransaction {
    fn create_store(&self, name: &str) -> EngineResult<()> {
        self.check_writable()?;
        let mut txn = self.state.lock();
        if txn.done {
            return Err(EngineError::TransactionDiscarded);
        }
        if txn.state.stores.contains_key(name) {
            return Err(EngineError::store_already_exists(name));
        }
        txn.state.stores.insert(name.to_string(), StoreData::default());
        Ok(())
    }

    fn store(&self, name: &str) -> EngineResult<Box<dyn Store + '_>> {
        let txn = self.state.lock();
        if txn.done {
            return Err(EngineError::TransactionDiscarded);
        }
        if !txn.state.stores.contains_key(name) {
            return Err(EngineError::store_not_found(name));
        }
        drop(txn);

        Ok(Box::new(MemoryStore {
            name: name.to_string(),
            txn: Arc::clone(&self.state),
            writable: self.writable,
        }))
    }

    fn drop_store(&self, name: &str) -> EngineResult<()> {
        self.check_writable()?;
        let mut txn = self.state.lock();
        if txn.done {
            return Err(EngineError::TransactionDiscarded);
        }
        txn.state
            .stores
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::store_not_found(name))
    }

    fn store_names(&self) -> EngineResult<Vec<String>> {
        let txn = self.state.lock();
        if txn.done {
            return Err(EngineError::TransactionDiscarded);
        }
        Ok(txn.state.stores.keys().cloned().collect())
    }

    fn commit(self: Box<Self>) -> EngineResult<()> {
        self.check_writable()?;
        let mut txn = self.state.lock();
        if txn.done {
            return Err(EngineError::TransactionDiscarded);
        }
        txn.done = true;
        let state = std::mem::take(&mut txn.state);
        drop(txn);

        let mut inner = self.shared.inner.lock();
        inner.state = state;
        inner.writer_active = false;
        drop(inner);
        self.shared.writer_released.notify_one();
        Ok(())
    }

    fn rollback(self: Box<Self>) -> EngineResult<()> {
        let mut txn = self.state.lock();
        if txn.done {
            return Err(EngineError::TransactionDiscarded);
        }
        txn.done = true;
        drop(txn);
        self.release_writer();
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        // a transaction dropped without commit or rollback behaves as a
        // rollback: the snapshot vanishes and the writer slot frees up
        let mut txn = self.state.lock();
        if !txn.done {
            txn.done = true;
            drop(txn);
            self.release_writer();
        }
    }
}

#[derive(Debug)]
struct MemoryStore {
    name: String,
    txn: Arc<Mutex<TxnState>>,
    writable: bool,
}

impl MemoryStore {
    fn read<R>(&self, f: impl FnOnce(&StoreData) -> R) -> EngineResult<R> {
        let txn = self.txn.lock();
        if txn.done {
            return Err(EngineError::TransactionDiscarded);
        }
        let data = txn
            .state
            .stores
            .get(&self.name)
            .ok_or_else(|| EngineError::store_not_found(&self.name))?;
        Ok(f(data))
    }

    fn write<R>(&mut self, f: impl FnOnce(&mut StoreData) -> EngineResult<R>) -> EngineResult<R> {
        if !self.writable {
            return Err(EngineError::ReadOnlyTransaction);
        }
        let mut txn = self.txn.lock();
        if txn.done {
            return Err(EngineError::TransactionDiscarded);
        }
        let data = txn
            .state
            .stores
            .get_mut(&self.name)
            .ok_or_else(|| EngineError::store_not_found(&self.name))?;
        f(data)
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        self.read(|data| data.entries.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.write(|data| {
            data.entries.insert(key.to_vec(), value.to_vec());
            Ok(())
        })
    }

    fn delete(&mut self, key: &[u8]) -> EngineResult<()> {
        self.write(|data| {
            data.entries
                .remove(key)
                .map(|_| ())
                .ok_or(EngineError::KeyNotFound)
        })
    }

    fn truncate(&mut self) -> EngineResult<()> {
        self.write(|data| {
            data.entries.clear();
            Ok(())
        })
    }

    fn next_sequence(&mut self) -> EngineResult<u64> {
        self.write(|data| {
            data.next_sequence += 1;
            Ok(data.next_sequence)
        })
    }

    fn ascend_greater_or_equal(&self, pivot: Option<&[u8]>) -> EngineResult<KvCursor<'_>> {
        let items = self.read(|data| {
            let range: Vec<(Vec<u8>, Vec<u8>)> = match pivot {
                Some(p) => data
                    .entries
                    .range::<[u8], _>((Bound::Included(p), Bound::Unbounded))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                None => data
                    .entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            };
            range
        })?;
        Ok(Box::new(items.into_iter()))
    }

    fn descend_less_or_equal(&self, pivot: Option<&[u8]>) -> EngineResult<KvCursor<'_>> {
        let items = self.read(|data| {
            let range: Vec<(Vec<u8>, Vec<u8>)> = match pivot {
                Some(p) => data
                    .entries
                    .range::<[u8], _>((Bound::Unbounded, Bound::Included(p)))
                    .rev()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                None => data
                    .entries
                    .iter()
                    .rev()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            };
            range
        })?;
        Ok(Box::new(items.into_iter()))
    }
}
