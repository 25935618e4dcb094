//! Chart of accounts (SKR03-style numeric codes).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use aioffice_core::CompanyId;

/// High-level account kind (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// Account identifier + metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    pub code: String, // e.g. "6300"
    pub name: String, // e.g. "Sonstige betriebliche Aufwendungen"
    pub kind: AccountKind,
}

/// Per-company account lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartOfAccounts {
    accounts: HashMap<CompanyId, Vec<Account>>,
}

impl ChartOfAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, company: CompanyId, account: Account) {
        self.accounts.entry(company).or_default().push(account);
    }

    pub fn lookup(&self, company: CompanyId, code: &str) -> Option<&Account> {
        self.accounts
            .get(&company)?
            .iter()
            .find(|a| a.code == code)
    }
}
