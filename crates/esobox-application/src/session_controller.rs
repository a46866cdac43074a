//! Session controller.
//!
//! `SessionController` owns the live [`Session`] and performs the user-level
//! operations on it. Every operation that touches the interpreter or the
//! shareable state goes through the [`RunLock`], so at most one of them is in
//! flight and the editable fields stay read-only while it runs.
//!
//! # Fault handling
//!
//! - User faults (the program misbehaved) land in the Debug field
//! - Internal faults (interpreter bugs, failed assertions, panics) land in
//!   the Debug field with a banner, are forwarded to the [`FaultReporter`]
//!   and returned as [`CoreError::InternalFault`]

use crate::export::{
    Export, ExportFormat, ExportSettings, link_label, markdown_snippet, share_url, wiki_link,
};
use chrono::Utc;
use esobox_core::codec::{ProtocolVersion, SessionCodec};
use esobox_core::encoding::EncodingRegistry;
use esobox_core::fault::{Fault, FaultReporter};
use esobox_core::interpreter::{Adapter, Interpreter, InterpreterError};
use esobox_core::language::{LanguageCatalog, LanguageInfo};
use esobox_core::run_lock::{ExclusiveOp, RunLock};
use esobox_core::session::{Field, Session, SharedSession};
use esobox_core::{CoreError, Result};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::Instrument;

/// Banner shown on the Debug field after an internal fault.
pub const INTERNAL_ERROR_BANNER: &str = "Internal error!\nThis is a bug in the interpreter.";

/// How a run ended, from the user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The program finished; its output is in the Output field
    Completed,
    /// The program faulted; the message is in the Debug field
    UserFault,
    /// Another run was in progress; nothing happened
    AlreadyRunning,
}

/// Collaborators the controller delegates to.
#[derive(Clone)]
pub struct ControllerServices {
    pub catalog: Arc<dyn LanguageCatalog>,
    pub interpreter: Arc<dyn Interpreter>,
    pub encodings: EncodingRegistry,
    pub reporter: Arc<dyn FaultReporter>,
}

/// Behavioural settings, resolved from configuration and launch parameters.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub codec: SessionCodec,
    /// Version written by exports
    pub export_version: ProtocolVersion,
    pub export: ExportSettings,
    /// Run the sample program right after loading it
    pub auto_run_hello_world: bool,
}

/// Performs operations on one live session.
///
/// Cloning is cheap; clones share the session and the lock.
#[derive(Clone)]
pub struct SessionController {
    session: SharedSession,
    lock: RunLock,
    services: ControllerServices,
    settings: Arc<ControllerSettings>,
}

impl SessionController {
    /// Creates a controller.
    ///
    /// # Arguments
    ///
    /// * `session` - The live session
    /// * `lock` - Gate shared by every exclusive operation on `session`
    /// * `services` - Catalog, interpreter, encodings and fault sink
    /// * `settings` - Export and run behaviour
    pub fn new(
        session: SharedSession,
        lock: RunLock,
        services: ControllerServices,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            session,
            lock,
            services,
            settings: Arc::new(settings),
        }
    }

    /// Snapshot of the session.
    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    pub fn shared_session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Whether the active language offers a hello-world program.
    pub async fn hello_world_available(&self) -> bool {
        let language = self.session.read().await.language().to_string();
        self.services
            .catalog
            .get_usable(&language)
            .is_some_and(|info| info.has_hello_world())
    }

    /// Replaces the text of an editable field.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the field is not user-editable or is
    /// disabled because an exclusive operation is in progress.
    pub async fn edit(&self, field: Field, text: impl Into<String>) -> Result<()> {
        let mut session = self.session.write().await;
        if !field.is_editable() {
            return Err(CoreError::contract(format!("{} is not editable", field)));
        }
        if !session.is_enabled(field) {
            return Err(CoreError::contract(format!(
                "{} is disabled while an operation is in progress",
                field
            )));
        }
        session.set(field, text);
        Ok(())
    }

    pub async fn set_adapters(&self, input: Option<Adapter>, output: Option<Adapter>) {
        let mut session = self.session.write().await;
        session.set_input_adapter(input);
        session.set_output_adapter(output);
    }

    /// Selects the source encoding used for byte counting.
    pub async fn set_source_encoding(&self, name: &str) {
        self.session
            .write()
            .await
            .set_source_encoding(name, &self.services.encodings);
    }

    /// Runs the session's program.
    ///
    /// Returns [`RunOutcome::AlreadyRunning`] without touching anything when
    /// a run is already in progress.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InternalFault`] when the interpreter failed for a
    /// reason other than the program itself. The session has been updated
    /// and the fault reported by then.
    pub async fn run(&self) -> Result<RunOutcome> {
        if !self.session.write().await.try_begin_run() {
            tracing::debug!("[SessionController] Run ignored, already running");
            return Ok(RunOutcome::AlreadyRunning);
        }

        let pending = PendingRun::new(self.shared_session());
        let this = self.clone();
        self.exclusive(ExclusiveOp::Run, move || async move {
            let pending = pending;
            let outcome = this.run_body().await;
            pending.disarm();
            outcome
        })
        .await
    }

    async fn run_body(&self) -> Result<RunOutcome> {
        let (language, program, input, options) = {
            let session = self.session.read().await;
            (
                session.language().to_string(),
                session.full_program(),
                session.get(Field::Input).to_string(),
                session.run_options(),
            )
        };

        tracing::info!(
            "[SessionController] Running {} ({} bytes)",
            language,
            program.len()
        );

        let result = AssertUnwindSafe(
            self.services
                .interpreter
                .run(&language, &program, &input, options),
        )
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(InterpreterError::Assertion(panic_message(panic))));

        let mut session = self.session.write().await;
        let outcome = match result {
            Ok(output) => {
                session.set(Field::Output, output);
                session.clear(Field::Debug);
                session.hide_all_messages();
                Ok(RunOutcome::Completed)
            }
            Err(err) if err.is_user_fault() => {
                tracing::debug!("[SessionController] Program fault: {}", err);
                session.clear(Field::Output);
                session.set(Field::Debug, err.to_string());
                session.hide_all_messages();
                Ok(RunOutcome::UserFault)
            }
            Err(err) => {
                let detail = err.detail();
                session.clear(Field::Output);
                session.set(Field::Debug, detail.clone());
                session.show_message(Field::Debug, INTERNAL_ERROR_BANNER);
                Err(CoreError::InternalFault {
                    message: err.to_string(),
                    detail,
                })
            }
        };
        session.finish_run();
        outcome
    }

    /// Loads the active language's hello-world program into the Code field,
    /// then runs it when auto-run is enabled.
    ///
    /// # Errors
    ///
    /// Returns a contract violation when the language has no hello-world
    /// program, and an internal fault when the interpreter cannot supply it.
    pub async fn run_hello_world(&self) -> Result<Option<RunOutcome>> {
        let this = self.clone();
        self.exclusive(ExclusiveOp::HelloWorld, move || async move {
            this.load_hello_world().await
        })
        .await?;

        if self.settings.auto_run_hello_world {
            return self.run().await.map(Some);
        }
        Ok(None)
    }

    async fn load_hello_world(&self) -> Result<()> {
        let language = self.session.read().await.language().to_string();
        let info = self.usable_language(&language)?;
        if !info.has_hello_world() {
            return Err(CoreError::contract(format!(
                "{} has no hello-world program",
                language
            )));
        }

        let program = self
            .services
            .interpreter
            .hello_world_program(&language)
            .await
            .map_err(|e| CoreError::InternalFault {
                message: e.to_string(),
                detail: e.detail(),
            })?
            .ok_or_else(|| {
                CoreError::internal(format!(
                    "interpreter has no hello-world program for {}",
                    language
                ))
            })?;

        let mut session = self.session.write().await;
        session.set_input_adapter(Some(Adapter::Text));
        session.set_output_adapter(Some(Adapter::Text));
        session.set(Field::Code, program);
        tracing::info!("[SessionController] Loaded hello world for {}", language);
        Ok(())
    }

    /// Encodes the session into a shareable link and places the rendered
    /// snippet in the Export field.
    pub async fn export(&self) -> Result<Export> {
        let this = self.clone();
        self.exclusive(ExclusiveOp::Export, move || async move {
            this.export_body().await
        })
        .await
    }

    async fn export_body(&self) -> Result<Export> {
        let mut session = self.session.write().await;
        let record = session.record();
        let settings = &self.settings;

        let token = settings.codec.encode(&record, settings.export_version);
        let url = share_url(&settings.export.base_url, &settings.export.project, &token);
        let text = match settings.export.format {
            ExportFormat::Wiki => wiki_link(&url),
            ExportFormat::Markdown => {
                let info = self
                    .services
                    .catalog
                    .get(&record.language)
                    .unwrap_or_else(|| LanguageInfo::new(record.language.clone()));
                let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
                let label = link_label(now, rand::random());
                markdown_snippet(&info, &record.code, session.bytes_num(), &url, &label)
            }
        };

        session.set(Field::Export, text.clone());
        session.expand(Field::Export);
        tracing::debug!(
            "[SessionController] Exported {} as version {} ({} chars)",
            record.language,
            settings.export_version,
            token.len()
        );
        Ok(Export { token, url, text })
    }

    /// Switches the session to `language`.
    ///
    /// Returns `false` when `language` is already active.
    ///
    /// # Errors
    ///
    /// Returns a contract violation when `language` is not usable.
    pub async fn switch_language(&self, language: &str) -> Result<bool> {
        if self.session.read().await.language() == language {
            return Ok(false);
        }
        self.activate_language(language).await?;
        Ok(true)
    }

    /// Makes `language` the active language even if it already is.
    ///
    /// Returns whether the language offers a hello-world program.
    pub async fn activate_language(&self, language: &str) -> Result<bool> {
        let this = self.clone();
        let language = language.to_string();
        self.exclusive(ExclusiveOp::LanguageSwitch, move || async move {
            let info = this.usable_language(&language)?;
            this.session.write().await.set_language(info.name.clone());
            tracing::info!("[SessionController] Language set to {}", info.name);
            Ok(info.has_hello_world())
        })
        .await
    }

    fn usable_language(&self, language: &str) -> Result<LanguageInfo> {
        self.services
            .catalog
            .get_usable(language)
            .ok_or_else(|| CoreError::contract(format!("{:?} is not a usable language", language)))
    }

    /// Runs `body` under the lock and reports internal faults it produced.
    async fn exclusive<F, Fut, T>(&self, op: ExclusiveOp, body: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let session_id = self.session.read().await.id();
        let result = self
            .lock
            .run_exclusive(op, body)
            .instrument(tracing::debug_span!("session", id = %session_id))
            .await
            .and_then(|r| r);
        if let Err(err) = &result {
            self.report(op, err).await;
        }
        result
    }

    async fn report(&self, op: ExclusiveOp, err: &CoreError) {
        match err {
            CoreError::InternalFault { message, detail } => {
                let session = self.session.read().await;
                let fault = Fault {
                    session_id: session.id().to_string(),
                    language: session.language().to_string(),
                    message: message.clone(),
                    detail: detail.clone(),
                    occurred_at: Utc::now(),
                };
                drop(session);
                self.services.reporter.report(&fault);
            }
            CoreError::ContractViolation(message) => {
                tracing::error!("[SessionController] {} rejected: {}", op, message);
            }
            other => tracing::warn!("[SessionController] {} failed: {}", op, other),
        }
    }
}

/// Returns the session to idle when dropped before the run body finished.
///
/// Owned by the run body, so the reset happens when the body panics or is
/// dropped while still queued for the lock. A finished body has already
/// reset the state and disarms the guard, leaving a newer run untouched.
struct PendingRun {
    session: Option<SharedSession>,
}

impl PendingRun {
    fn new(session: SharedSession) -> Self {
        Self {
            session: Some(session),
        }
    }

    fn disarm(mut self) {
        self.session = None;
    }
}

impl Drop for PendingRun {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        if let Ok(mut guard) = session.try_write() {
            guard.finish_run();
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { session.write().await.finish_run() });
            }
            Err(_) => tracing::warn!("[SessionController] No runtime, run state not reset"),
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "interpreter panicked".to_string()
    }
}
