//! Balanced ledger entries and the in-memory ledger book.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use aioffice_core::{
    is_balanced, Entity, JournalId, LedgerEntryId, LedgerLineId, OfficeError, OfficeResult,
    PartnerId, ValidationReport,
};

/// One side of a ledger entry. Carries the open-item bookkeeping used by
/// reconciliation: a residual amount and a reconciled flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub id: LedgerLineId,
    pub account_code: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: String,
    pub partner: Option<PartnerId>,
    pub reconciled: bool,
    /// Signed open amount: `debit - credit` until settled.
    pub residual: Decimal,
}

impl LedgerLine {
    pub fn new(
        account_code: impl Into<String>,
        debit: Decimal,
        credit: Decimal,
        description: impl Into<String>,
        partner: Option<PartnerId>,
    ) -> Self {
        Self {
            id: LedgerLineId::new(),
            account_code: account_code.into(),
            debit,
            credit,
            description: description.into(),
            partner,
            reconciled: false,
            residual: debit - credit,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.reconciled && !self.residual.is_zero()
    }
}

/// A posted journal entry. Balanced at creation and immutable afterwards
/// except for per-line reconciliation flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub journal: JournalId,
    pub date: NaiveDate,
    /// External reference (case reference / Belegnummer).
    pub reference: String,
    pub partner: Option<PartnerId>,
    pub lines: Vec<LedgerLine>,
}

impl LedgerEntry {
    /// Build an entry, enforcing the double-entry invariant.
    pub fn new(
        journal: JournalId,
        date: NaiveDate,
        reference: impl Into<String>,
        partner: Option<PartnerId>,
        lines: Vec<LedgerLine>,
    ) -> OfficeResult<Self> {
        let reference = reference.into();
        let mut report = ValidationReport::new(reference.clone());
        if lines.is_empty() {
            report.push("ledger entry must have lines");
        }
        for line in &lines {
            if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
                report.push(format!(
                    "line on account {}: amounts must not be negative",
                    line.account_code
                ));
            }
        }
        let debit: Decimal = lines.iter().map(|l| l.debit).sum();
        let credit: Decimal = lines.iter().map(|l| l.credit).sum();
        if !is_balanced(debit, credit) {
            report.push(format!(
                "entry is not balanced: debit {debit} != credit {credit}"
            ));
        }
        report.into_result()?;
        Ok(Self {
            id: LedgerEntryId::new(),
            journal,
            date,
            reference,
            partner,
            lines,
        })
    }

    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }
}

impl Entity for LedgerEntry {
    type Id = LedgerEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// An unsettled line as the reconciliation matcher sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenItem {
    pub id: LedgerLineId,
    pub date: NaiveDate,
    pub reference: String,
    pub name: String,
    /// Signed residual; positive = open debit, negative = open credit.
    pub residual: Decimal,
    pub account_code: String,
    pub move_name: String,
}

/// In-memory ledger store with stable insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerBook {
    order: Vec<LedgerEntryId>,
    entries: HashMap<LedgerEntryId, LedgerEntry>,
}

impl LedgerBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: LedgerEntry) -> LedgerEntryId {
        let id = entry.id;
        self.order.push(id);
        self.entries.insert(id, entry);
        id
    }

    pub fn entry(&self, id: LedgerEntryId) -> OfficeResult<&LedgerEntry> {
        self.entries
            .get(&id)
            .ok_or_else(|| OfficeError::not_found("ledger entry", id.to_string()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn line(&self, id: LedgerLineId) -> Option<&LedgerLine> {
        self.entries()
            .flat_map(|e| e.lines.iter())
            .find(|l| l.id == id)
    }

    pub fn line_mut(&mut self, id: LedgerLineId) -> Option<&mut LedgerLine> {
        // Locate the owning entry immutably first, then borrow it mutably
        // exactly once.
        let entry_id = *self.order.iter().find(|eid| {
            self.entries
                .get(eid)
                .is_some_and(|e| e.lines.iter().any(|l| l.id == id))
        })?;
        self.entries
            .get_mut(&entry_id)?
            .lines
            .iter_mut()
            .find(|l| l.id == id)
    }

    /// A partner's open (unreconciled, non-zero residual) lines, in
    /// original posting order.
    pub fn open_items(&self, partner: PartnerId) -> Vec<OpenItem> {
        self.entries()
            .flat_map(|entry| {
                entry.lines.iter().filter(|l| l.is_open()).filter_map(move |line| {
                    if line.partner == Some(partner) {
                        Some(OpenItem {
                            id: line.id,
                            date: entry.date,
                            reference: entry.reference.clone(),
                            name: line.description.clone(),
                            residual: line.residual,
                            account_code: line.account_code.clone(),
                            move_name: entry.reference.clone(),
                        })
                    } else {
                        None
                    }
                })
            })
            .collect()
    }
}
