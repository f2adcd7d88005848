//! Consent records
//!
//! Append-only per participant. The most recent record decides whether the
//! participant may play.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentDetails {
    pub research_participation: bool,
    pub data_collection: bool,
    pub data_sharing: bool,
    pub contact_permission: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentFlags {
    pub consent_given: bool,
    pub consent_details: ConsentDetails,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub document_id: Uuid,
    pub user_id: String,
    #[serde(flatten)]
    pub flags: ConsentFlags,
    pub consent_timestamp: DateTime<Utc>,
}

/// Latest consent state for a participant
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsentStatus {
    pub exists: bool,
    pub consent_given: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<ConsentRecord>,
}

impl ConsentStatus {
    fn from_latest(latest: Option<ConsentRecord>) -> Self {
        Self {
            exists: latest.is_some(),
            consent_given: latest.as_ref().map_or(false, |r| r.flags.consent_given),
            latest,
        }
    }
}

#[async_trait]
pub trait ConsentStore: Send + Sync {
    async fn submit_consent(&self, user_id: &str, flags: ConsentFlags) -> Result<ConsentRecord>;

    async fn check_consent(&self, user_id: &str) -> Result<ConsentStatus>;

    /// Every record for `user_id`, newest first
    async fn consents_for(&self, user_id: &str) -> Result<Vec<ConsentRecord>>;
}

#[derive(Default)]
pub struct MemoryConsentStore {
    records: DashMap<String, Vec<ConsentRecord>>,
}

impl MemoryConsentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConsentStore for MemoryConsentStore {
    async fn submit_consent(&self, user_id: &str, flags: ConsentFlags) -> Result<ConsentRecord> {
        let record = ConsentRecord {
            document_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            flags,
            consent_timestamp: Utc::now(),
        };
        self.records
            .entry(user_id.to_string())
            .or_default()
            .push(record.clone());

        tracing::info!(
            user_id = %user_id,
            consent_given = flags.consent_given,
            document_id = %record.document_id,
            "consent submitted"
        );
        Ok(record)
    }

    async fn check_consent(&self, user_id: &str) -> Result<ConsentStatus> {
        let latest = self
            .records
            .get(user_id)
            .and_then(|list| list.last().cloned());
        Ok(ConsentStatus::from_latest(latest))
    }

    async fn consents_for(&self, user_id: &str) -> Result<Vec<ConsentRecord>> {
        let mut list = self
            .records
            .get(user_id)
            .map(|list| list.clone())
            .unwrap_or_default();
        list.reverse();
        Ok(list)
    }
}
