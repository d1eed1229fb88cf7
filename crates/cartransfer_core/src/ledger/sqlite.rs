//! SQLite-backed world state.
//!
//! # Invariants
//! - `ledger_state.key` is a BLOB, so `ORDER BY key` is byte-lexicographic.
//! - Scans page through the range with keyset pagination; no SQLite
//!   statement stays open between pages.
//! - `open_iterators` counts live `StateIterator`s and returns to zero once
//!   they are all dropped.

use super::composite_key::{create_composite_key, CompositeKey};
use super::{KeyValue, LedgerResult, StateStore};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::Cell;
use std::collections::VecDeque;

/// Rows fetched per round-trip during a range scan.
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 64;

const GET_SQL: &str = "SELECT value FROM ledger_state WHERE key = ?1;";
const PUT_SQL: &str = "INSERT INTO ledger_state (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value;";
const FIRST_PAGE_SQL: &str = "SELECT key, value FROM ledger_state
     WHERE key >= ?1 AND key < ?2
     ORDER BY key ASC
     LIMIT ?3;";
const NEXT_PAGE_SQL: &str = "SELECT key, value FROM ledger_state
     WHERE key > ?1 AND key < ?2
     ORDER BY key ASC
     LIMIT ?3;";

/// World state over one migrated connection.
///
/// Pass a `rusqlite::Transaction` (it derefs to `Connection`) to scope every
/// read and write to a single commit.
pub struct SqliteLedger<'conn> {
    conn: &'conn Connection,
    page_size: usize,
    open_iterators: Cell<usize>,
}

impl<'conn> SqliteLedger<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            page_size: DEFAULT_SCAN_PAGE_SIZE,
            open_iterators: Cell::new(0),
        }
    }

    /// Overrides the scan page size. Values below 1 are raised to 1.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Number of scan iterators not yet released.
    pub fn open_iterators(&self) -> usize {
        self.open_iterators.get()
    }
}

impl StateStore for SqliteLedger<'_> {
    type Iter<'a>
        = StateIterator<'a>
    where
        Self: 'a;

    fn get_state(&self, key: &CompositeKey) -> LedgerResult<Option<Vec<u8>>> {
        let mut stmt = self.conn.prepare_cached(GET_SQL)?;
        let value = stmt
            .query_row([key.as_bytes()], |row| row.get::<_, Vec<u8>>(0))
            .optional()?;
        Ok(value)
    }

    fn put_state(&self, key: &CompositeKey, value: &[u8]) -> LedgerResult<()> {
        let mut stmt = self.conn.prepare_cached(PUT_SQL)?;
        stmt.execute(params![key.as_bytes(), value])?;
        Ok(())
    }

    fn get_state_by_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> LedgerResult<StateIterator<'_>> {
        let prefix = create_composite_key(object_type, attributes)?;
        let end = prefix.range_end();
        self.open_iterators.set(self.open_iterators.get() + 1);
        debug!(
            "event=state_scan_open module=ledger prefix={} open={}",
            prefix,
            self.open_iterators.get()
        );
        Ok(StateIterator {
            ledger: self,
            start: prefix.as_bytes().to_vec(),
            end,
            last_key: None,
            buffer: VecDeque::new(),
            done: false,
        })
    }
}

/// Lazy range cursor returned by partial-key scans.
///
/// Finite and non-restartable: after the range is exhausted or an error is
/// yielded, it only returns `None`. Dropping it releases the cursor.
pub struct StateIterator<'a> {
    ledger: &'a SqliteLedger<'a>,
    start: Vec<u8>,
    end: Vec<u8>,
    last_key: Option<Vec<u8>>,
    buffer: VecDeque<KeyValue>,
    done: bool,
}

impl StateIterator<'_> {
    /// Releases the cursor explicitly. Equivalent to dropping it.
    pub fn close(self) {}

    fn fetch_page(&mut self) -> LedgerResult<()> {
        let conn = self.ledger.conn;
        let limit = i64::try_from(self.ledger.page_size).unwrap_or(i64::MAX);
        let (sql, lower) = match &self.last_key {
            None => (FIRST_PAGE_SQL, self.start.clone()),
            Some(last) => (NEXT_PAGE_SQL, last.clone()),
        };

        let mut stmt = conn.prepare_cached(sql)?;
        let mut rows = stmt.query(params![lower, self.end, limit])?;
        let mut fetched = 0usize;
        while let Some(row) = rows.next()? {
            let key = row.get::<_, Vec<u8>>(0)?;
            let value = row.get::<_, Vec<u8>>(1)?;
            self.last_key = Some(key.clone());
            self.buffer.push_back(KeyValue {
                key: CompositeKey::from_stored(key)?,
                value,
            });
            fetched += 1;
        }

        if fetched < self.ledger.page_size {
            self.done = true;
        }
        Ok(())
    }
}

impl Iterator for StateIterator<'_> {
    type Item = LedgerResult<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.done {
            if let Err(err) = self.fetch_page() {
                self.done = true;
                self.buffer.clear();
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

impl Drop for StateIterator<'_> {
    fn drop(&mut self) {
        let remaining = self.ledger.open_iterators.get().saturating_sub(1);
        self.ledger.open_iterators.set(remaining);
        debug!("event=state_scan_close module=ledger open={remaining}");
    }
}
