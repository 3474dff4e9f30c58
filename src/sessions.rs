//! Interaction-scoped state: the credential in use, its generator, and the
//! last generation kept for display and export.
//!
//! The HTTP front end keeps one [`Session`] per client in a bounded
//! [`SessionStore`]; the CLI drives a single session directly.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::GenerationConfig;
use crate::error::{OutlineError, Result};
use crate::generator::{Generation, OutlineGenerator};

/// Builds a generator for a credential; swapped out in tests to inject a backend.
pub type GeneratorFactory =
    Arc<dyn Fn(Option<&str>, &GenerationConfig) -> anyhow::Result<OutlineGenerator> + Send + Sync>;

/// Hugging Face backed generator for a token, offline without one.
pub fn default_factory() -> GeneratorFactory {
    Arc::new(OutlineGenerator::from_token)
}

/// Trimmed topic, or `InvalidParams` when nothing is left.
pub fn normalize_topic(topic: &str) -> Result<&str> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(OutlineError::InvalidParams {
            message: "topic is required".to_string(),
        });
    }
    Ok(topic)
}

/// Exported outline ready to be written or downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineExport {
    pub file_name: String,
    pub contents: String,
}

pub struct Session {
    config: GenerationConfig,
    factory: GeneratorFactory,
    credential: Option<String>,
    generator: Option<Arc<OutlineGenerator>>,
    last: Option<Generation>,
}

impl Session {
    pub fn new(config: GenerationConfig) -> Self {
        Self::with_factory(config, default_factory())
    }

    pub fn with_factory(config: GenerationConfig, factory: GeneratorFactory) -> Self {
        Self {
            config,
            factory,
            credential: None,
            generator: None,
            last: None,
        }
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn generator(&self) -> Option<&OutlineGenerator> {
        self.generator.as_deref()
    }

    pub fn last(&self) -> Option<&Generation> {
        self.last.as_ref()
    }

    /// Generator for `credential`. A different token gets a fresh generator,
    /// which forgets the probed model and probes again on first use.
    pub fn prepare(&mut self, credential: Option<&str>) -> Result<Arc<OutlineGenerator>> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        if let Some(generator) = &self.generator
            && credential == self.credential
        {
            return Ok(Arc::clone(generator));
        }

        tracing::debug!("building generator for new credential");
        let generator = (self.factory)(credential.as_deref(), &self.config).map_err(|e| {
            OutlineError::Config {
                message: e.to_string(),
            }
        })?;
        let generator = Arc::new(generator);
        self.generator = Some(Arc::clone(&generator));
        self.credential = credential;
        Ok(generator)
    }

    /// Keep `generation` as the session's current outline, replacing the previous one.
    pub fn store(&mut self, generation: Generation) -> &Generation {
        self.last.insert(generation)
    }

    /// Generate for `topic` and keep the result as the session's current outline.
    pub async fn generate(
        &mut self,
        topic: &str,
        keyword: &str,
        credential: Option<&str>,
    ) -> Result<&Generation> {
        let topic = normalize_topic(topic)?;
        let generation = self.prepare(credential)?.generate(topic, keyword.trim()).await;
        Ok(self.store(generation))
    }

    /// Export of the current outline, if one was generated.
    pub fn export(&self) -> Option<OutlineExport> {
        self.last.as_ref().map(|g| OutlineExport {
            file_name: g.file_name(),
            contents: g.text(),
        })
    }
}

/// Sessions keyed by client id; the least recently used one is evicted at capacity.
pub struct SessionStore {
    config: GenerationConfig,
    factory: GeneratorFactory,
    sessions: Mutex<LruCache<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new(config: GenerationConfig, capacity: usize, factory: GeneratorFactory) -> Self {
        Self {
            config,
            factory,
            sessions: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Existing session for `id`.
    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.lock().await.get(id).cloned()
    }

    /// Session for `id`, or a new one under a fresh id when `id` is absent or unknown.
    /// The returned flag is true when the session was created.
    pub async fn get_or_create(&self, id: Option<&str>) -> (String, Arc<Mutex<Session>>, bool) {
        let mut sessions = self.sessions.lock().await;
        if let Some(id) = id
            && let Some(session) = sessions.get(id)
        {
            return (id.to_string(), Arc::clone(session), false);
        }

        let id = uuid::Uuid::new_v4().simple().to_string();
        let session = Arc::new(Mutex::new(Session::with_factory(
            self.config.clone(),
            Arc::clone(&self.factory),
        )));
        if let Some((evicted, _)) = sessions.push(id.clone(), Arc::clone(&session))
            && evicted != id
        {
            tracing::debug!("session store full, evicted oldest session");
        }
        (id, session, true)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{InferenceBackend, InferenceError, InferenceRequest};
    use crate::error::FallbackReason;
    use crate::generator::{OutlineSource, PROBE_MAX_NEW_TOKENS};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const OUTLINE_JSON: &str = r#"{"h1": "H", "ctas": [], "sections": [
        {"h2": "a", "bullets": ["1", "2"]},
        {"h2": "b", "bullets": ["1", "2"]},
        {"h2": "c", "bullets": ["1", "2"]}]}"#;

    /// Answers every call with a valid outline and counts probe requests.
    struct CountingBackend {
        probes: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl InferenceBackend for CountingBackend {
        async fn generate(
            &self,
            _model: &str,
            request: &InferenceRequest,
        ) -> std::result::Result<String, InferenceError> {
            if request.max_new_tokens == PROBE_MAX_NEW_TOKENS {
                self.probes.fetch_add(1, Ordering::SeqCst);
            }
            Ok(OUTLINE_JSON.to_string())
        }
    }

    fn counting_factory(builds: Arc<AtomicUsize>, probes: Arc<AtomicUsize>) -> GeneratorFactory {
        Arc::new(
            move |token: Option<&str>,
                  config: &GenerationConfig|
                  -> anyhow::Result<OutlineGenerator> {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(match token {
                    Some(_) => OutlineGenerator::new(
                        Arc::new(CountingBackend {
                            probes: Arc::clone(&probes),
                        }),
                        config,
                    ),
                    None => OutlineGenerator::offline(config),
                })
            },
        )
    }

    #[tokio::test]
    async fn empty_topic_is_rejected() {
        let mut session = Session::new(GenerationConfig::default());
        let err = session.generate("   ", "", None).await.err().unwrap();
        assert!(matches!(err, OutlineError::InvalidParams { .. }));
        assert!(session.export().is_none());
    }

    #[tokio::test]
    async fn export_matches_last_generation() {
        let mut session = Session::new(GenerationConfig::default());
        let generation = session.generate("my garden", "", None).await.unwrap();
        assert_eq!(generation.source, OutlineSource::Template);

        let export = session.export().unwrap();
        assert_eq!(export.file_name, "my-garden-outline.txt");
        assert!(export.contents.starts_with("# My Garden: Essential Guide\n\n"));
    }

    #[tokio::test]
    async fn new_generation_replaces_previous() {
        let mut session = Session::new(GenerationConfig::default());
        session.generate("my garden", "", None).await.unwrap();
        session.generate("what is entropy", "", None).await.unwrap();
        assert_eq!(session.last().unwrap().topic, "what is entropy");
    }

    #[tokio::test]
    async fn credential_change_rebuilds_generator_and_reprobes() {
        let builds = Arc::new(AtomicUsize::new(0));
        let probes = Arc::new(AtomicUsize::new(0));
        let mut session = Session::with_factory(
            GenerationConfig::default(),
            counting_factory(Arc::clone(&builds), Arc::clone(&probes)),
        );

        let first = session.generate("my garden", "", Some("token-a")).await.unwrap();
        assert!(matches!(first.source, OutlineSource::Model { .. }));
        assert!(session.generator().unwrap().has_credential());
        assert_eq!((builds.load(Ordering::SeqCst), probes.load(Ordering::SeqCst)), (1, 1));

        // same token: generator and probed model are reused
        session.generate("my garden", "", Some(" token-a ")).await.unwrap();
        assert_eq!((builds.load(Ordering::SeqCst), probes.load(Ordering::SeqCst)), (1, 1));

        session.generate("my garden", "", Some("token-b")).await.unwrap();
        assert_eq!(session.credential(), Some("token-b"));
        assert_eq!((builds.load(Ordering::SeqCst), probes.load(Ordering::SeqCst)), (2, 2));

        let offline = session.generate("my garden", "", None).await.unwrap();
        assert_eq!(offline.fallback, Some(FallbackReason::NoCredential));
        assert!(!session.generator().unwrap().has_credential());
        assert_eq!(session.credential(), None);
        assert_eq!((builds.load(Ordering::SeqCst), probes.load(Ordering::SeqCst)), (3, 2));
    }

    #[tokio::test]
    async fn store_separates_clients() {
        let store = SessionStore::new(GenerationConfig::default(), 8, default_factory());
        let (id_a, session_a, created) = store.get_or_create(None).await;
        assert!(created);
        session_a
            .lock()
            .await
            .generate("my garden", "", None)
            .await
            .unwrap();

        let (id_b, session_b, _) = store.get_or_create(Some("unknown-id")).await;
        assert_ne!(id_a, id_b);
        assert!(session_b.lock().await.last().is_none());

        let (again, session, created) = store.get_or_create(Some(id_a.as_str())).await;
        assert!(!created);
        assert_eq!(again, id_a);
        assert_eq!(session.lock().await.last().unwrap().topic, "my garden");
    }

    #[tokio::test]
    async fn store_evicts_least_recently_used() {
        let store = SessionStore::new(GenerationConfig::default(), 2, default_factory());
        let (first, _, _) = store.get_or_create(None).await;
        store.get_or_create(None).await;
        store.get_or_create(None).await;
        assert_eq!(store.len().await, 2);
        assert!(store.get(&first).await.is_none());
    }
}
