//! In-process stand-ins for the database, mail provider and OCR engine.
//! Backs `AppState::fake()` and the test suites.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    auth::{
        repo::AuthRepo,
        repo_types::{MagicLinkToken, User},
    },
    mail::Mailer,
    ocr::{OcrEngine, OcrError},
    weights::{
        repo::WeightRepo,
        repo_types::{TimeRange, WeightEntry},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tokens: HashMap<String, MagicLinkToken>,
    // insertion order doubles as tie-break for equal timestamps
    weights: Vec<WeightEntry>,
}

/// Store holding every table behind one lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub async fn weight_count(&self) -> usize {
        self.tables.lock().await.weights.len()
    }
}

#[async_trait]
impl AuthRepo for MemoryStore {
    async fn issue_magic_link(
        &self,
        email: &str,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut t = self.tables.lock().await;
        for old in t.tokens.values_mut().filter(|m| m.email == email) {
            old.consumed = true;
        }
        t.tokens.insert(
            token.to_string(),
            MagicLinkToken {
                token: token.to_string(),
                email: email.to_string(),
                expires_at,
                consumed: false,
                created_at: OffsetDateTime::now_utc(),
            },
        );
        Ok(())
    }

    async fn redeem_magic_link(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let mut t = self.tables.lock().await;
        let email = match t.tokens.get_mut(token) {
            Some(m) if m.is_redeemable(now) => {
                m.consumed = true;
                m.email.clone()
            }
            _ => return Ok(None),
        };

        if let Some(user) = t.users.iter().find(|u| u.email == email) {
            return Ok(Some(user.clone()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email,
            created_at: now,
        };
        t.users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl WeightRepo for MemoryStore {
    async fn insert(&self, entry: &WeightEntry) -> anyhow::Result<WeightEntry> {
        let mut t = self.tables.lock().await;
        anyhow::ensure!(
            t.weights.iter().all(|w| w.id != entry.id),
            "duplicate weight entry id {}",
            entry.id
        );
        t.weights.push(entry.clone());
        Ok(entry.clone())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        range: TimeRange,
    ) -> anyhow::Result<Vec<WeightEntry>> {
        let t = self.tables.lock().await;
        let mut out: Vec<WeightEntry> = t
            .weights
            .iter()
            .filter(|w| w.user_id == user_id && range.contains(w.timestamp))
            .cloned()
            .collect();
        out.sort_by_key(|w| w.timestamp);
        Ok(out)
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<WeightEntry>> {
        let t = self.tables.lock().await;
        Ok(t.weights.iter().find(|w| w.id == id).cloned())
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        let before = t.weights.len();
        t.weights.retain(|w| !(w.id == id && w.user_id == user_id));
        Ok(t.weights.len() != before)
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl SentMail {
    /// Token carried by the magic link in the body.
    pub fn token(&self) -> Option<String> {
        let start = self.body.find("token=")? + "token=".len();
        let token: String = self.body[start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        (!token.is_empty()).then_some(token)
    }
}

/// Keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub async fn last(&self) -> Option<SentMail> {
        self.sent.lock().await.last().cloned()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        self.sent.lock().await.push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Returns the image bytes themselves, read as UTF-8, as the recognized text.
/// Lets tests choose the "photo" contents directly.
pub struct EchoOcr;

#[async_trait]
impl OcrEngine for EchoOcr {
    async fn recognize(&self, image: Bytes) -> Result<String, OcrError> {
        String::from_utf8(image.to_vec()).map_err(|_| OcrError::Unreadable("not utf-8".into()))
    }
}
