//! Append-only transaction log
//!
//! This module provides the `TransactionLog` that records every applied
//! operation, one stream per account.
//!
//! # Design
//!
//! Streams live in a `DashMap` so accounts do not contend with each other. Each
//! stream is an `Arc<RwLock<Vec<_>>>`: appends take the write lock briefly,
//! history readers take the read lock once per yielded record.
//!
//! Records are never mutated or removed. Every record gets a global sequence
//! number from an atomic counter; within one account the ledger appends under
//! that account's lock, so per-account sequence order is chronological order.
//!
//! # History
//!
//! [`TransactionLog::history`] returns a [`History`] handle instead of a `Vec`.
//! The handle is bounded to the records present when it was taken (finite),
//! produces records one at a time (lazy), and can be iterated any number of
//! times (restartable).

use crate::types::{
    AccountId, HistoryOrder, LedgerError, OperationKind, TransactionId, TransactionRecord,
    TransferId,
};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

type Stream = Arc<RwLock<Vec<TransactionRecord>>>;

/// Operation details handed to the log; the log fills in id, sequence and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub account_id: AccountId,
    pub kind: OperationKind,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub counterpart: Option<AccountId>,
    pub transfer_id: Option<TransferId>,
}

impl LogEntry {
    /// Entry for a deposit or withdrawal
    pub fn single(
        account_id: AccountId,
        kind: OperationKind,
        amount: Decimal,
        balance_after: Decimal,
    ) -> Self {
        LogEntry {
            account_id,
            kind,
            amount,
            balance_after,
            counterpart: None,
            transfer_id: None,
        }
    }

    /// Entry for one leg of a transfer
    pub fn transfer_leg(
        account_id: AccountId,
        kind: OperationKind,
        amount: Decimal,
        balance_after: Decimal,
        counterpart: AccountId,
        transfer_id: TransferId,
    ) -> Self {
        LogEntry {
            account_id,
            kind,
            amount,
            balance_after,
            counterpart: Some(counterpart),
            transfer_id: Some(transfer_id),
        }
    }
}

/// Append-only per-account transaction log
#[derive(Debug, Default)]
pub struct TransactionLog {
    streams: DashMap<AccountId, Stream>,
    sequence: AtomicU64,
}

impl TransactionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self {
            streams: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Register a stream for an account
    ///
    /// Opening an already registered stream keeps its records.
    pub fn open_stream(&self, account_id: AccountId) {
        self.streams
            .entry(account_id)
            .or_insert_with(Stream::default);
    }

    /// Append a record built from `entry`
    ///
    /// # Returns
    ///
    /// The stored record (a copy; the stored one can no longer change)
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is not strictly positive
    /// - `AccountNotFound` if no stream was opened for the account
    pub fn append(&self, entry: LogEntry) -> Result<TransactionRecord, LedgerError> {
        if entry.amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(entry.amount));
        }

        let stream = self.stream(entry.account_id)?;
        let mut records = stream.write().unwrap_or_else(PoisonError::into_inner);

        let record = self.seal(entry);
        records.push(record.clone());

        Ok(record)
    }

    /// Turn an entry into a record; called with the stream's write lock held
    fn seal(&self, entry: LogEntry) -> TransactionRecord {
        TransactionRecord {
            id: TransactionId::new(),
            account_id: entry.account_id,
            kind: entry.kind,
            amount: entry.amount,
            balance_after: entry.balance_after,
            timestamp: Utc::now(),
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            counterpart: entry.counterpart,
            transfer_id: entry.transfer_id,
        }
    }

    /// Append both legs of a transfer, or neither
    ///
    /// Both entries are validated and both streams resolved before anything is
    /// written. Stream locks are taken in account order.
    ///
    /// # Errors
    ///
    /// Same as [`TransactionLog::append`], for either entry, plus
    /// `SameAccountTransfer` if both legs name the same account.
    pub fn append_linked(
        &self,
        outgoing: LogEntry,
        incoming: LogEntry,
    ) -> Result<(TransactionRecord, TransactionRecord), LedgerError> {
        if outgoing.account_id == incoming.account_id {
            return Err(LedgerError::same_account_transfer(outgoing.account_id));
        }
        for entry in [&outgoing, &incoming] {
            if entry.amount <= Decimal::ZERO {
                return Err(LedgerError::invalid_amount(entry.amount));
            }
        }

        let out_stream = self.stream(outgoing.account_id)?;
        let in_stream = self.stream(incoming.account_id)?;

        let (mut out_records, mut in_records) = if outgoing.account_id < incoming.account_id {
            let out_records = out_stream.write().unwrap_or_else(PoisonError::into_inner);
            let in_records = in_stream.write().unwrap_or_else(PoisonError::into_inner);
            (out_records, in_records)
        } else {
            let in_records = in_stream.write().unwrap_or_else(PoisonError::into_inner);
            let out_records = out_stream.write().unwrap_or_else(PoisonError::into_inner);
            (out_records, in_records)
        };

        let out_record = self.seal(outgoing);
        let in_record = self.seal(incoming);
        out_records.push(out_record.clone());
        in_records.push(in_record.clone());

        Ok((out_record, in_record))
    }

    /// History of an account in the requested order
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no stream was opened for the account.
    pub fn history(
        &self,
        account_id: AccountId,
        order: HistoryOrder,
    ) -> Result<History, LedgerError> {
        let stream = self.stream(account_id)?;
        let len = stream.read().unwrap_or_else(PoisonError::into_inner).len();
        Ok(History { stream, len, order })
    }

    /// Number of records appended for an account
    pub fn len(&self, account_id: AccountId) -> Result<usize, LedgerError> {
        let stream = self.stream(account_id)?;
        let len = stream.read().unwrap_or_else(PoisonError::into_inner).len();
        Ok(len)
    }

    fn stream(&self, account_id: AccountId) -> Result<Stream, LedgerError> {
        self.streams
            .get(&account_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LedgerError::account_not_found(account_id))
    }
}

/// Restartable, finite view over an account's records
#[derive(Debug, Clone)]
pub struct History {
    stream: Stream,
    len: usize,
    order: HistoryOrder,
}

impl History {
    /// Number of records in this view
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Start a fresh pass over the records
    pub fn iter(&self) -> HistoryIter<'_> {
        HistoryIter {
            history: self,
            front: 0,
            back: self.len,
        }
    }

    fn record_at(&self, index: usize) -> Option<TransactionRecord> {
        self.stream
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = TransactionRecord;
    type IntoIter = HistoryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator produced by [`History::iter`]
///
/// `front..back` is the window of stream positions not yet yielded.
#[derive(Debug)]
pub struct HistoryIter<'a> {
    history: &'a History,
    front: usize,
    back: usize,
}

impl Iterator for HistoryIter<'_> {
    type Item = TransactionRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let index = match self.history.order {
            HistoryOrder::Chronological => {
                self.front += 1;
                self.front - 1
            }
            HistoryOrder::ReverseChronological => {
                self.back -= 1;
                self.back
            }
        };
        self.history.record_at(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HistoryIter<'_> {}
