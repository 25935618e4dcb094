//! Approval policies and their resolution.
//!
//! Scope precedence: supplier overrides company overrides global. Within a
//! scope, the last active match in insertion order wins; this mirrors the
//! historical behavior and is deliberately not replaced by a priority rule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use aioffice_core::{CompanyId, PartnerId};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.8;
pub const DEFAULT_RISK_SCORE_MAX: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyScope {
    Global,
    Company,
    Supplier,
}

/// Threshold rules carried by a policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyRules {
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
    #[serde(default)]
    pub risk_score_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub scope: PolicyScope,
    pub key: String,
    /// Scope targets; `None` on a scoped policy means "does not apply".
    pub company: Option<CompanyId>,
    pub supplier: Option<PartnerId>,
    pub active: bool,
    pub active_from: Option<NaiveDate>,
    pub active_to: Option<NaiveDate>,
    pub rules: PolicyRules,
}

impl Policy {
    fn applies_on(&self, date: NaiveDate) -> bool {
        if !self.active {
            return false;
        }
        if let Some(from) = self.active_from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.active_to {
            if date > to {
                return false;
            }
        }
        true
    }

    fn matches(&self, company: CompanyId, supplier: Option<PartnerId>, date: NaiveDate) -> bool {
        if !self.applies_on(date) {
            return false;
        }
        match self.scope {
            PolicyScope::Global => true,
            PolicyScope::Company => self.company == Some(company),
            PolicyScope::Supplier => supplier.is_some() && self.supplier == supplier,
        }
    }
}

/// Effective thresholds after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedThresholds {
    pub confidence_threshold: f64,
    pub risk_score_max: f64,
}

impl Default for ResolvedThresholds {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            risk_score_max: DEFAULT_RISK_SCORE_MAX,
        }
    }
}

/// Policy store preserving insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySet {
    policies: Vec<Policy>,
}

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, policy: Policy) {
        self.policies.push(policy);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Policy> {
        self.policies.iter()
    }

    /// Resolve thresholds for a case. Within the winning scope the **last**
    /// matching active policy in insertion order is taken.
    pub fn resolve(
        &self,
        company: CompanyId,
        supplier: Option<PartnerId>,
        date: NaiveDate,
    ) -> ResolvedThresholds {
        let pick = |scope: PolicyScope| {
            self.policies
                .iter()
                .filter(|p| p.scope == scope && p.matches(company, supplier, date))
                .last()
        };

        let winner = pick(PolicyScope::Supplier)
            .or_else(|| pick(PolicyScope::Company))
            .or_else(|| pick(PolicyScope::Global));

        let defaults = ResolvedThresholds::default();
        match winner {
            Some(p) => ResolvedThresholds {
                confidence_threshold: p
                    .rules
                    .confidence_threshold
                    .unwrap_or(defaults.confidence_threshold),
                risk_score_max: p.rules.risk_score_max.unwrap_or(defaults.risk_score_max),
            },
            None => defaults,
        }
    }
}
