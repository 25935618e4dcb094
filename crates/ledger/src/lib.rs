//! `aioffice-ledger`: the double-entry side. Chart of accounts, journals,
//! balanced entries, the in-memory ledger book and the posting engine.

pub mod account;
pub mod entry;
pub mod journal;
pub mod poster;
pub mod skr03;

pub use account::{Account, AccountKind, ChartOfAccounts};
pub use entry::{LedgerBook, LedgerEntry, LedgerLine, OpenItem};
pub use journal::{select_posting_journal, Journal, JournalKind};
pub use poster::post_case_entry;
pub use skr03::{contra_accounts, tax_rate_for_account, CONTRA_ACCOUNTS, TAX_ACCOUNTS};
