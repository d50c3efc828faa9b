use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use workpass_core::categorize::{GENERAL_CATEGORY, GENERAL_PASS_TYPE};
use workpass_core::config::AppConfig;
use workpass_core::domain::UserContext;
use workpass_core::error::{codes, AppError};
use workpass_core::metadata::get_str;

use crate::answer::{Answer, AnswerComposer, AnswerSettings};
use crate::embeddings::Embedder;
use crate::llm::Llm;
use crate::pipeline::{index_chunks, BuildContext};
use crate::retrieve::Retriever;
use crate::retry::Sleeper;
use crate::store::{CollectionStatus, CollectionStore};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    Rebuilding,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InitEvent {
    StoreFound,
    StoreMissingArtifactFound,
    NothingFound,
    StoreUnreadable,
    RebuildSucceeded,
    RebuildFailed,
}

impl InitState {
    /// Next state, or `None` when `event` is not valid here.
    pub fn on(self, event: InitEvent) -> Option<InitState> {
        use InitEvent::*;
        use InitState::*;
        match (self, event) {
            (Uninitialized, StoreFound) => Some(Ready),
            (Uninitialized, StoreMissingArtifactFound) => Some(Rebuilding),
            (Uninitialized, NothingFound) | (Uninitialized, StoreUnreadable) => Some(Failed),
            (Rebuilding, RebuildSucceeded) => Some(Ready),
            (Rebuilding, RebuildFailed) => Some(Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transition {
    pub from: InitState,
    pub event: InitEvent,
    pub to: InitState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub text: String,
    pub title: String,
    pub url: String,
    pub pass_type: String,
    pub category: String,
    pub relevance_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineStatus {
    pub state: InitState,
    pub collection: CollectionStatus,
    /// Whether the processed artifact needed for a rebuild is on disk.
    pub artifact_found: bool,
    pub error: Option<String>,
}

/// Query-side facade over one collection. Built once at startup; a missing
/// store is rebuilt from the processed artifact when one exists.
pub struct Engine {
    config: AppConfig,
    embedder: Box<dyn Embedder>,
    llm: Box<dyn Llm>,
    settings: AnswerSettings,
    store: Option<CollectionStore>,
    state: InitState,
    transitions: Vec<Transition>,
    failure: Option<AppError>,
}

impl Engine {
    pub fn initialize(
        config: AppConfig,
        embedder: Box<dyn Embedder>,
        llm: Box<dyn Llm>,
        sleeper: &dyn Sleeper,
        now: &str,
    ) -> Engine {
        let settings = AnswerSettings {
            model: config.provider.llm_model.clone(),
            temperature: config.provider.temperature,
            top_k: config.retrieval.answer_k,
        };
        let mut engine = Engine {
            config,
            embedder,
            llm,
            settings,
            store: None,
            state: InitState::Uninitialized,
            transitions: Vec::new(),
            failure: None,
        };
        engine.boot(sleeper, now);
        engine
    }

    fn boot(&mut self, sleeper: &dyn Sleeper, now: &str) {
        let storage = self.config.store.storage_path.clone();
        let collection = self.config.store.collection_name.clone();

        match CollectionStore::open_existing(&storage) {
            Ok(Some(store)) => match store.status(&collection) {
                Ok(st) if st.ready => {
                    log::info!(
                        "Loaded collection {} ({} chunks) from {}",
                        collection,
                        st.chunk_count,
                        storage.display()
                    );
                    self.store = Some(store);
                    self.advance(InitEvent::StoreFound);
                    return;
                }
                Ok(_) => log::info!("Collection {collection} is empty; looking for an artifact"),
                Err(e) => return self.fail(InitEvent::StoreUnreadable, e),
            },
            Ok(None) => log::info!("No vector store at {}", storage.display()),
            Err(e) => return self.fail(InitEvent::StoreUnreadable, e),
        }

        let artifact = self.config.store.processed_path.clone();
        if !artifact.is_file() {
            let err = AppError::new(
                codes::AI_INDEX_NOT_READY,
                "Knowledge base not found; run `workpass build --pages <scraped pages>` first",
            )
            .with_details(format!(
                "store={}; artifact={}",
                storage.display(),
                artifact.display()
            ));
            return self.fail(InitEvent::NothingFound, err);
        }

        self.advance(InitEvent::StoreMissingArtifactFound);
        log::info!("Rebuilding vector store from {}", artifact.display());
        match self.rebuild(sleeper, now) {
            Ok(store) => {
                self.store = Some(store);
                self.advance(InitEvent::RebuildSucceeded);
            }
            Err(e) => {
                let e = AppError::new(
                    codes::AI_INDEX_NOT_READY,
                    "Rebuilding the vector store failed; run `workpass build` to retry",
                )
                .with_details(e.to_string());
                self.fail(InitEvent::RebuildFailed, e);
            }
        }
    }

    fn rebuild(&self, sleeper: &dyn Sleeper, now: &str) -> Result<CollectionStore, AppError> {
        let chunks = workpass_core::process::load_processed(&self.config.store.processed_path)?;
        let mut store = CollectionStore::open(&self.config.store.storage_path)?;
        let ctx = BuildContext {
            config: &self.config,
            embedder: self.embedder.as_ref(),
            sleeper,
            now,
        };
        index_chunks(&ctx, &mut store, &chunks)?;
        Ok(store)
    }

    fn advance(&mut self, event: InitEvent) {
        let from = self.state;
        let to = from.on(event).unwrap_or(InitState::Failed);
        log::debug!("Engine init: {from:?} --{event:?}--> {to:?}");
        self.transitions.push(Transition { from, event, to });
        self.state = to;
    }

    fn fail(&mut self, event: InitEvent, err: AppError) {
        log::error!("Engine initialization failed: {err}");
        self.failure = Some(err);
        self.advance(event);
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn failure(&self) -> Option<&AppError> {
        self.failure.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Ok when ready, otherwise the error that stopped initialization.
    pub fn ensure_ready(&self) -> Result<&CollectionStore, AppError> {
        match (&self.store, self.state) {
            (Some(store), InitState::Ready) => Ok(store),
            _ => Err(self.failure.clone().unwrap_or_else(|| {
                AppError::new(codes::AI_INDEX_NOT_READY, "Engine is not ready")
            })),
        }
    }

    fn retriever<'a>(&'a self, store: &'a CollectionStore) -> Retriever<'a> {
        Retriever::new(
            store,
            self.embedder.as_ref(),
            &self.config.store.collection_name,
        )
    }

    /// Answers `question`; never fails, errors are folded into the answer text.
    pub fn query(&self, question: &str, user_context: Option<&UserContext>) -> Answer {
        let store = match self.ensure_ready() {
            Ok(store) => store,
            Err(e) => {
                return Answer {
                    answer: format!("I encountered an error: {e}. Please try again."),
                    sources: Vec::new(),
                    question: question.to_string(),
                }
            }
        };
        AnswerComposer::new(self.retriever(store), self.llm.as_ref(), &self.settings)
            .answer(question, user_context)
    }

    /// Raw similarity search. `top_k` defaults and is clamped per config.
    pub fn search(&self, query: &str, top_k: Option<u32>) -> Result<Vec<SearchHit>, AppError> {
        let store = self.ensure_ready()?;
        let k = self.config.retrieval.clamp_search_k(top_k);
        let results = self.retriever(store).retrieve(query, k)?;
        Ok(results
            .into_iter()
            .map(|r| SearchHit {
                title: get_str(&r.metadata, "title", "Unknown").to_string(),
                url: get_str(&r.metadata, "source", "").to_string(),
                pass_type: get_str(&r.metadata, "pass_type", GENERAL_PASS_TYPE).to_string(),
                category: get_str(&r.metadata, "category", GENERAL_CATEGORY).to_string(),
                text: r.chunk_text,
                relevance_score: r.similarity_score,
            })
            .collect())
    }

    /// Distinct pass types present in the collection, without "General".
    pub fn pass_types(&self) -> Result<Vec<String>, AppError> {
        self.distinct_metadata("pass_type", |v| v != GENERAL_PASS_TYPE)
    }

    /// Distinct categories present in the collection.
    pub fn categories(&self) -> Result<Vec<String>, AppError> {
        self.distinct_metadata("category", |_| true)
    }

    fn distinct_metadata(
        &self,
        key: &str,
        keep: impl Fn(&str) -> bool,
    ) -> Result<Vec<String>, AppError> {
        let store = self.ensure_ready()?;
        let mut out = BTreeSet::new();
        for meta in store.read_metadata(&self.config.store.collection_name)? {
            if let Some(v) = meta.get(key).and_then(|v| v.as_str()) {
                if keep(v) {
                    out.insert(v.to_string());
                }
            }
        }
        Ok(out.into_iter().collect())
    }

    pub fn status(&self) -> Result<EngineStatus, AppError> {
        let name = &self.config.store.collection_name;
        let collection = match &self.store {
            Some(store) => store.status(name)?,
            None => CollectionStatus::missing(name),
        };
        Ok(EngineStatus {
            state: self.state,
            collection,
            artifact_found: self.config.store.processed_path.is_file(),
            error: self.failure.as_ref().map(|e| e.to_string()),
        })
    }

    /// Read-only status: never rebuilds, never creates the store and needs no
    /// provider. A ready collection reports `Ready`, anything else stays
    /// `Uninitialized` with a hint.
    pub fn inspect(config: &AppConfig) -> Result<EngineStatus, AppError> {
        let name = &config.store.collection_name;
        let collection = match CollectionStore::open_existing(&config.store.storage_path)? {
            Some(store) => store.status(name)?,
            None => CollectionStatus::missing(name),
        };
        let artifact_found = config.store.processed_path.is_file();
        let (state, error) = if collection.ready {
            (InitState::Ready, None)
        } else if artifact_found {
            (
                InitState::Uninitialized,
                Some(
                    "Vector store missing; the next query rebuilds it from the processed artifact"
                        .to_string(),
                ),
            )
        } else {
            (
                InitState::Uninitialized,
                Some(
                    "Knowledge base not found; run `workpass build --pages <scraped pages>` first"
                        .to_string(),
                ),
            )
        };
        Ok(EngineStatus {
            state,
            collection,
            artifact_found,
            error,
        })
    }
}
