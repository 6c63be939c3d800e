use std::collections::VecDeque;

use crate::categories::{Category, Label};
use crate::error::{LedgerError, Result};
use crate::models::Transaction;

/// Client-side review queue: uncategorized rows waiting for a label, and
/// labeled rows waiting to be submitted. Nothing here outlives the process.
#[derive(Debug, Default)]
pub struct ReviewSession {
    pending: VecDeque<Transaction>,
    categorized: Vec<Transaction>,
}

impl ReviewSession {
    #[cfg(test)]
    pub fn new(transactions: Vec<Transaction>) -> Self {
        let mut session = Self::default();
        session.load(transactions);
        session
    }

    /// Replace the pending queue with a fresh fetch. Labeled rows that have
    /// not been submitted yet survive a refresh and are not re-queued.
    pub fn load(&mut self, transactions: Vec<Transaction>) {
        let labeled: Vec<u64> = self.categorized.iter().map(|t| t.row_number).collect();
        self.pending = transactions
            .into_iter()
            .filter(|t| !labeled.contains(&t.row_number))
            .collect();
    }

    pub fn current(&self) -> Option<&Transaction> {
        self.pending.front()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn categorized_len(&self) -> usize {
        self.categorized.len()
    }

    #[cfg(test)]
    pub fn categorized(&self) -> &[Transaction] {
        &self.categorized
    }

    /// Label the card on screen and move it to the submission list.
    pub fn categorize(&mut self, label: Label) -> Option<&Transaction> {
        let mut txn = self.pending.pop_front()?;
        txn.apply_label(label);
        self.categorized.push(txn);
        self.categorized.last()
    }

    /// The label a right swipe would apply: the AI suggestion, keeping an
    /// existing subcategory when it fits.
    pub fn suggested_label(&self) -> Result<Label> {
        let txn = self
            .current()
            .ok_or_else(|| LedgerError::Other("No transaction to categorize".into()))?;
        let suggestion = txn
            .ai_category
            .as_deref()
            .ok_or(LedgerError::NoSuggestion(txn.row_number))?;
        let category: Category = suggestion
            .parse()
            .map_err(|_| LedgerError::NoSuggestion(txn.row_number))?;
        let sub = txn.subcategory.as_deref().unwrap_or("");
        Ok(Label::new(category, sub).unwrap_or(Label {
            category,
            subcategory: None,
        }))
    }

    pub fn accept_suggestion(&mut self) -> Result<Label> {
        let label = self.suggested_label()?;
        self.categorize(label);
        Ok(label)
    }

    /// Send the current card to the back of the queue.
    pub fn skip(&mut self) {
        if let Some(txn) = self.pending.pop_front() {
            self.pending.push_back(txn);
        }
    }

    /// Put the most recently labeled row back on screen, unlabeled.
    pub fn undo_last(&mut self) -> Option<&Transaction> {
        let mut txn = self.categorized.pop()?;
        txn.clear_label();
        self.pending.push_front(txn);
        self.pending.front()
    }

    /// Everything labeled so far, ready for the update webhook.
    pub fn submission(&self) -> Result<&[Transaction]> {
        if self.categorized.is_empty() {
            return Err(LedgerError::NothingToSubmit);
        }
        Ok(&self.categorized)
    }

    /// Called only after the backend accepted the submission.
    pub fn mark_submitted(&mut self) -> usize {
        let count = self.categorized.len();
        self.categorized.clear();
        count
    }
}
