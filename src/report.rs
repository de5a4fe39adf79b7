//! Scoring endpoint contract.
//!
//! Wraps a [`ScanResult`] with an identity and timestamp and collapses the
//! five severity bands into the three levels external consumers use.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::security::{Modality, ScanResult, Severity};
use crate::value::FindingValue;

/// Three-level risk scale of the scoring endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Nothing found.
    #[serde(rename = "CLEAN")]
    Clean,
    /// Worth a look.
    #[serde(rename = "SUSPICIOUS")]
    Suspicious,
    /// Very likely carries hidden content.
    #[serde(rename = "HIGH-RISK")]
    HighRisk,
}

impl From<Severity> for RiskLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Critical | Severity::High => RiskLevel::HighRisk,
            Severity::Medium | Severity::Low => RiskLevel::Suspicious,
            Severity::Safe => RiskLevel::Clean,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Clean => write!(f, "CLEAN"),
            RiskLevel::Suspicious => write!(f, "SUSPICIOUS"),
            RiskLevel::HighRisk => write!(f, "HIGH-RISK"),
        }
    }
}

/// One scored scan as returned to API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    /// Report identifier.
    pub id: Uuid,
    /// When the report was produced.
    pub timestamp: DateTime<Utc>,
    /// Classified modality.
    pub modality: Modality,
    /// Collapsed severity.
    pub severity: RiskLevel,
    /// Fused score, 0 to 100.
    pub score: u8,
    /// Findings keyed by detector name.
    pub findings: FindingValue,
    /// Reason tags.
    pub reasons: BTreeSet<String>,
    /// Recovered payload, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_payload: Option<String>,
}

impl ScoreReport {
    /// Wrap a finished scan.
    pub fn new(result: ScanResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            modality: result.modality,
            severity: result.severity.into(),
            score: result.score,
            findings: result.findings,
            reasons: result.reasons,
            verified_payload: result.verified_payload,
        }
    }

    /// Raise the report to HIGH-RISK on evidence gathered outside the
    /// engine, such as a deceptive link. The score is left untouched.
    pub fn force_high_risk(&mut self, reason: impl Into<String>) {
        self.severity = RiskLevel::HighRisk;
        self.reasons.insert(reason.into());
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<ScanResult> for ScoreReport {
    fn from(result: ScanResult) -> Self {
        Self::new(result)
    }
}
