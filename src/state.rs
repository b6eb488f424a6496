use std::sync::Arc;

use crate::auth::repo::AuthRepo;
use crate::config::AppConfig;
use crate::db::PgStore;
use crate::fakes::{EchoOcr, MemoryStore, RecordingMailer};
use crate::mail::{self, Mailer};
use crate::ocr::{OcrEngine, TesseractEngine};
use crate::weights::repo::WeightRepo;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<dyn AuthRepo>,
    pub weights: Arc<dyn WeightRepo>,
    pub ocr: Arc<dyn OcrEngine>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = PgStore::connect(&config.database_url).await?;
        store.migrate().await?;

        let ocr = Arc::new(TesseractEngine::new(&config.ocr)) as Arc<dyn OcrEngine>;
        let mailer = mail::from_config(&config.mail);

        Ok(Self {
            auth: Arc::new(store.clone()),
            weights: Arc::new(store),
            config,
            ocr,
            mailer,
        })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        auth: Arc<dyn AuthRepo>,
        weights: Arc<dyn WeightRepo>,
        ocr: Arc<dyn OcrEngine>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config,
            auth,
            weights,
            ocr,
            mailer,
        }
    }

    /// State wired to in-memory fakes: one shared store, a recording mailer and
    /// an OCR engine that reads the uploaded bytes as text.
    pub fn fake() -> (Self, Arc<MemoryStore>, Arc<RecordingMailer>) {
        let store = Arc::new(MemoryStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let state = Self::from_parts(
            Arc::new(AppConfig::test_default()),
            store.clone(),
            store.clone(),
            Arc::new(EchoOcr),
            mailer.clone(),
        );
        (state, store, mailer)
    }
}
