//! Boundary surface of the engine.
//!
//! [`StudyEngine`] is what collaborators (CLI, UI, notification layer)
//! talk to: it owns an explicitly injected [`Store`] instance plus the
//! optional live [`SessionController`], and persists the active session
//! into the store's kv table after every mutation so a new process can
//! pick the same logical session back up.

use chrono::Utc;

use crate::achievements::Achievement;
use crate::error::CoreError;
use crate::events::Event;
use crate::session::{Session, SessionController, SessionStatus, Settings};
use crate::stats::Stats;
use crate::storage::Store;

const KV_ACTIVE_SESSION: &str = "active_session";

pub struct StudyEngine {
    store: Store,
    settings: Settings,
    controller: Option<SessionController>,
}

impl StudyEngine {
    /// Build an engine over `store`, loading saved settings and any
    /// persisted active session. A corrupt active-session record is
    /// logged and dropped (the engine comes up with no session active).
    ///
    /// # Errors
    /// Returns an error if the settings or the kv store cannot be read.
    pub fn new(store: Store) -> Result<Self, CoreError> {
        let settings = Settings::load()?;
        Self::with_settings(store, settings)
    }

    /// Like [`StudyEngine::new`] but with explicit settings, bypassing
    /// the settings file.
    pub fn with_settings(store: Store, settings: Settings) -> Result<Self, CoreError> {
        let controller = match store.kv_get(KV_ACTIVE_SESSION)? {
            Some(json) => match serde_json::from_str::<SessionController>(&json) {
                Ok(controller) if !controller.is_terminal() => Some(controller),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "corrupt active session record, discarding");
                    None
                }
            },
            None => None,
        };
        Ok(Self {
            store,
            settings,
            controller,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.controller.as_ref().map(|c| c.session())
    }

    pub fn stats(&self) -> Result<Stats, CoreError> {
        self.store.stats()
    }

    pub fn achievements(&self) -> Result<Vec<Achievement>, CoreError> {
        self.store.achievements()
    }

    pub fn sessions(&self) -> Result<Vec<Session>, CoreError> {
        self.store.sessions()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a new session. `settings` defaults to the saved settings;
    /// whichever is used becomes immutable for this session.
    ///
    /// # Errors
    /// Rejects a non-positive budget, invalid settings, or a start while
    /// another session is still live.
    pub fn start_session(
        &mut self,
        subject: &str,
        total_budget_min: u64,
        settings: Option<Settings>,
    ) -> Result<Vec<Event>, CoreError> {
        if let Some(controller) = &self.controller {
            if !controller.is_terminal() {
                return Err(CoreError::SessionActive {
                    id: controller.session().id.to_string(),
                });
            }
        }
        let settings = settings.unwrap_or_else(|| self.settings.clone());
        let (controller, events) = SessionController::start(subject, total_budget_min, &settings)?;
        self.controller = Some(controller);
        self.persist_active()?;
        Ok(events)
    }

    /// Drive the active countdown; completions cascade into cycle
    /// advancement, session completion, and stats recording.
    pub fn tick(&mut self) -> Result<Vec<Event>, CoreError> {
        let controller = self.controller.as_mut().ok_or(CoreError::NoActiveSession)?;
        let mut events = controller.tick();
        self.settle(&mut events)?;
        Ok(events)
    }

    pub fn pause(&mut self) -> Result<Option<Event>, CoreError> {
        let controller = self.controller.as_mut().ok_or(CoreError::NoActiveSession)?;
        let event = controller.pause();
        self.persist_active()?;
        Ok(event)
    }

    pub fn resume(&mut self) -> Result<Option<Event>, CoreError> {
        let controller = self.controller.as_mut().ok_or(CoreError::NoActiveSession)?;
        let event = controller.resume();
        self.persist_active()?;
        Ok(event)
    }

    pub fn skip(&mut self) -> Result<Vec<Event>, CoreError> {
        let controller = self.controller.as_mut().ok_or(CoreError::NoActiveSession)?;
        let mut events = controller.skip();
        self.settle(&mut events)?;
        Ok(events)
    }

    pub fn reset(&mut self) -> Result<Option<Event>, CoreError> {
        let controller = self.controller.as_mut().ok_or(CoreError::NoActiveSession)?;
        let event = controller.reset();
        self.persist_active()?;
        Ok(event)
    }

    /// Abort the active session. Cancelled sessions never reach the
    /// stats pipeline.
    pub fn cancel(&mut self) -> Result<Option<Event>, CoreError> {
        let controller = self.controller.as_mut().ok_or(CoreError::NoActiveSession)?;
        let event = controller.cancel();
        let mut events = Vec::new();
        self.settle(&mut events)?;
        Ok(event)
    }

    /// Validate, persist, and adopt new settings. The active session
    /// (if any) keeps the settings it was generated with.
    pub fn save_settings(&mut self, settings: Settings) -> Result<(), CoreError> {
        settings.validate()?;
        settings.save()?;
        self.settings = settings;
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// After a command: persist the live session, or fold a terminal
    /// one (recording Completed sessions, discarding Cancelled ones)
    /// and clear it.
    fn settle(&mut self, events: &mut Vec<Event>) -> Result<(), CoreError> {
        let Some(controller) = &self.controller else {
            return Ok(());
        };
        if !controller.is_terminal() {
            return self.persist_active();
        }
        if controller.status() == SessionStatus::Completed {
            let session = controller.session().clone();
            if let Some(outcome) = self.store.record_session(&session)? {
                let now = Utc::now();
                for achievement in outcome.newly_unlocked {
                    events.push(Event::AchievementUnlocked { achievement, at: now });
                }
            }
        }
        self.controller = None;
        self.store.kv_delete(KV_ACTIVE_SESSION)
    }

    fn persist_active(&self) -> Result<(), CoreError> {
        match &self.controller {
            Some(controller) => self
                .store
                .kv_set(KV_ACTIVE_SESSION, &serde_json::to_string(controller)?),
            None => self.store.kv_delete(KV_ACTIVE_SESSION),
        }
    }
}
