//! Test doubles and a harness wiring them into an [`Orchestrator`].

use crate::config::DialogConfig;
use crate::gateway::{GatewayError, MessageGateway, OutboundDocument};
use crate::orchestrator::{Collaborators, Orchestrator};
use async_trait::async_trait;
use budget_chat_accounts::{Account, StaticDirectory};
use budget_chat_ai::{ClassifiedUtterance, ClassifierContext, Entities, Intent, IntentClassifier};
use budget_chat_conversation::{
    InMemorySessionStore, PendingConfirmation, Session, SessionError, SessionStore, Turn,
};
use budget_chat_core::UserId;
use budget_chat_ledger::{InMemoryLedger, LedgerError, LedgerStore, LineItem, PlainTextRenderer};
use budget_chat_pricing::{PriceError, PriceOracle, PriceResolver, PricingConfig};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const PHONE: &str = "+56 9 1234 5678";
pub const LEDGER: &str = "ledger-ashly";

pub fn classified(intent: Intent, entities: Entities) -> ClassifiedUtterance {
    ClassifiedUtterance::new(intent, entities)
}

pub fn named(budget: &str) -> Entities {
    Entities {
        budget_name: Some(budget.to_string()),
        ..Entities::default()
    }
}

/// Builds add-item entities. Empty slices leave the entity unset.
pub fn entities(items: &[&str], quantities: &[f64], prices: &[Option<f64>]) -> Entities {
    Entities {
        item: (!items.is_empty())
            .then(|| items.iter().map(|i| (*i).to_string()).collect::<Vec<_>>().into()),
        quantity: (!quantities.is_empty()).then(|| quantities.to_vec().into()),
        unit_price: (!prices.is_empty()).then(|| prices.to_vec().into()),
        ..Entities::default()
    }
}

/// Replays queued classifications; an empty queue yields the degraded result.
#[derive(Default)]
pub struct ScriptedClassifier {
    queue: Mutex<VecDeque<ClassifiedUtterance>>,
    contexts: Mutex<Vec<ClassifierContext>>,
}

impl ScriptedClassifier {
    pub fn push(&self, utterance: ClassifiedUtterance) {
        self.queue.lock().unwrap().push_back(utterance);
    }

    pub fn contexts(&self) -> Vec<ClassifierContext> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    async fn classify(&self, _text: &str, context: &ClassifierContext) -> ClassifiedUtterance {
        self.contexts.lock().unwrap().push(context.clone());
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(ClassifiedUtterance::unknown)
    }
}

/// Answers from a fixed table and records which items were asked about.
#[derive(Default)]
pub struct CountingOracle {
    answers: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl CountingOracle {
    pub fn answer(&self, item: &str, answer: &str) {
        self.answers
            .lock()
            .unwrap()
            .insert(item.to_string(), answer.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceOracle for CountingOracle {
    async fn estimate(&self, item: &str) -> Result<String, PriceError> {
        self.calls.lock().unwrap().push(item.to_string());
        self.answers
            .lock()
            .unwrap()
            .get(item)
            .cloned()
            .ok_or_else(|| PriceError::OracleFailed {
                reason: "no answer".to_string(),
            })
    }
}

/// Records everything sent.
#[derive(Default)]
pub struct RecordingGateway {
    texts: Mutex<Vec<String>>,
    documents: Mutex<Vec<OutboundDocument>>,
    fail_documents: AtomicBool,
}

impl RecordingGateway {
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }

    pub fn documents(&self) -> Vec<OutboundDocument> {
        self.documents.lock().unwrap().clone()
    }

    pub fn fail_documents(&self) {
        self.fail_documents.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageGateway for RecordingGateway {
    async fn send_text(&self, _user: &UserId, text: &str) -> Result<(), GatewayError> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn send_document(
        &self,
        _user: &UserId,
        document: OutboundDocument,
    ) -> Result<(), GatewayError> {
        if self.fail_documents.load(Ordering::SeqCst) {
            return Err(GatewayError::UploadFailed {
                reason: "media endpoint down".to_string(),
            });
        }
        self.documents.lock().unwrap().push(document);
        Ok(())
    }
}

/// An in-memory ledger that can be told to fail.
#[derive(Default)]
pub struct FlakyLedger {
    inner: InMemoryLedger,
    fail_all: AtomicBool,
    adds_left: Mutex<Option<usize>>,
}

impl FlakyLedger {
    /// Every later call fails.
    pub fn fail_all(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    /// `add_item` succeeds `n` more times, then fails.
    pub fn fail_adds_after(&self, n: usize) {
        *self.adds_left.lock().unwrap() = Some(n);
    }

    fn check(&self) -> Result<(), LedgerError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable {
                reason: "spreadsheet api timeout".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for FlakyLedger {
    async fn create_budget(&self, ledger: &str, name: &str) -> Result<(), LedgerError> {
        self.check()?;
        self.inner.create_budget(ledger, name).await
    }

    async fn list_budgets(&self, ledger: &str) -> Result<Vec<String>, LedgerError> {
        self.check()?;
        self.inner.list_budgets(ledger).await
    }

    async fn add_item(
        &self,
        ledger: &str,
        budget: &str,
        item: &LineItem,
    ) -> Result<(), LedgerError> {
        self.check()?;
        {
            let mut adds_left = self.adds_left.lock().unwrap();
            match adds_left.as_mut() {
                Some(0) => {
                    return Err(LedgerError::Unavailable {
                        reason: "quota exceeded".to_string(),
                    });
                }
                Some(n) => *n -= 1,
                None => {}
            }
        }
        self.inner.add_item(ledger, budget, item).await
    }

    async fn get_items(&self, ledger: &str, budget: &str) -> Result<Vec<LineItem>, LedgerError> {
        self.check()?;
        self.inner.get_items(ledger, budget).await
    }

    async fn delete_item(
        &self,
        ledger: &str,
        budget: &str,
        position: usize,
    ) -> Result<LineItem, LedgerError> {
        self.check()?;
        self.inner.delete_item(ledger, budget, position).await
    }

    async fn delete_budget(&self, ledger: &str, budget: &str) -> Result<(), LedgerError> {
        self.check()?;
        self.inner.delete_budget(ledger, budget).await
    }
}

/// A session store whose every call fails.
pub struct BrokenSessionStore;

fn broken() -> SessionError {
    SessionError::StorageFailed {
        reason: "connection refused".to_string(),
    }
}

#[async_trait]
impl SessionStore for BrokenSessionStore {
    async fn get_or_create(&self, _user: &UserId) -> Result<Session, SessionError> {
        Err(broken())
    }

    async fn append_turn(&self, _user: &UserId, _turn: Turn) -> Result<(), SessionError> {
        Err(broken())
    }

    async fn recent_turns(&self, _user: &UserId, _limit: usize) -> Result<Vec<Turn>, SessionError> {
        Err(broken())
    }

    async fn set_active_budget(
        &self,
        _user: &UserId,
        _budget: Option<&str>,
    ) -> Result<(), SessionError> {
        Err(broken())
    }

    async fn set_ledger_handle(&self, _user: &UserId, _handle: &str) -> Result<(), SessionError> {
        Err(broken())
    }

    async fn set_pending_confirmation(
        &self,
        _user: &UserId,
        _pending: Option<PendingConfirmation>,
    ) -> Result<(), SessionError> {
        Err(broken())
    }

    async fn trim_history(&self, _user: &UserId, _keep: usize) -> Result<usize, SessionError> {
        Err(broken())
    }
}

/// An orchestrator over in-memory doubles, speaking as [`PHONE`].
pub struct Harness {
    pub user: UserId,
    pub classifier: Arc<ScriptedClassifier>,
    pub sessions: Arc<dyn SessionStore>,
    pub ledger: Arc<FlakyLedger>,
    pub oracle: Arc<CountingOracle>,
    pub gateway: Arc<RecordingGateway>,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(
            Arc::new(InMemorySessionStore::new()),
            registered(),
            DialogConfig::default(),
        )
    }

    pub fn with_config(config: DialogConfig) -> Self {
        Self::build(Arc::new(InMemorySessionStore::new()), registered(), config)
    }

    pub fn with_directory(directory: StaticDirectory) -> Self {
        Self::build(
            Arc::new(InMemorySessionStore::new()),
            directory,
            DialogConfig::default(),
        )
    }

    pub fn with_broken_sessions() -> Self {
        Self::build(
            Arc::new(BrokenSessionStore),
            registered(),
            DialogConfig::default(),
        )
    }

    fn build(
        sessions: Arc<dyn SessionStore>,
        directory: StaticDirectory,
        config: DialogConfig,
    ) -> Self {
        let classifier = Arc::new(ScriptedClassifier::default());
        let ledger = Arc::new(FlakyLedger::default());
        let oracle = Arc::new(CountingOracle::default());
        let gateway = Arc::new(RecordingGateway::default());
        let prices = Arc::new(PriceResolver::new(oracle.clone(), &PricingConfig::default()));

        let orchestrator = Orchestrator::new(
            Collaborators {
                classifier: classifier.clone(),
                sessions: sessions.clone(),
                ledger: ledger.clone(),
                prices,
                directory: Arc::new(directory),
                gateway: gateway.clone(),
                renderer: Arc::new(PlainTextRenderer::new(ledger.clone())),
            },
            config,
        );

        Self {
            user: UserId::from_phone(PHONE),
            classifier,
            sessions,
            ledger,
            oracle,
            gateway,
            orchestrator,
        }
    }

    pub fn classify(&self, intent: Intent, entities: Entities) {
        self.classifier.push(classified(intent, entities));
    }

    pub async fn process(&self, text: &str) -> String {
        self.orchestrator.process(&self.user, text).await
    }

    /// Creates a budget in the user's ledger.
    pub async fn budget(&self, name: &str, items: Vec<LineItem>) {
        self.ledger.inner.create_budget(LEDGER, name).await.unwrap();
        for item in items {
            self.ledger.inner.add_item(LEDGER, name, &item).await.unwrap();
        }
    }

    pub async fn activate(&self, name: &str) {
        self.sessions
            .set_active_budget(&self.user, Some(name))
            .await
            .unwrap();
    }

    pub async fn session(&self) -> Session {
        self.sessions.get_or_create(&self.user).await.unwrap()
    }

    pub async fn turns(&self) -> Vec<Turn> {
        self.sessions.recent_turns(&self.user, 1000).await.unwrap()
    }

    pub async fn ledger_budgets(&self) -> Vec<String> {
        self.ledger.inner.list_budgets(LEDGER).await.unwrap()
    }

    pub async fn items(&self, budget: &str) -> Vec<LineItem> {
        self.ledger.inner.get_items(LEDGER, budget).await.unwrap()
    }
}

fn registered() -> StaticDirectory {
    StaticDirectory::new(vec![
        Account::new("Constructora Ashly", PHONE)
            .with_ledger_handle(LEDGER)
            .with_notify_emails(vec!["obras@ashly.cl".to_string()]),
    ])
}
