//! Escalation transitions executed against the task store.
//!
//! A transition is a handful of independent field writes. Writes are issued
//! payload first, then history, then status; the status dropdown is what
//! every later read trusts, so an interrupted transition leaves the record in
//! its previous state. When a write fails, the fields already written are
//! put back (best effort) and the caller gets [`EscalationError::PartialWrite`].

use std::sync::Arc;

use ai::SuggestionSource;
use chrono::Utc;
use clickup::{FieldWrite, Task, TaskRef, TaskStore};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::error::{EscalationError, EscalationResult};
use crate::fields::{EscalationFields, FieldKey};
use crate::history::{self, HistoryEntry};
use crate::lock::TaskLocks;
use crate::property_link::{self, ResolvedLink, DEFAULT_MAX_DEPTH};
use crate::record::EscalationRecord;
use crate::state::{transition, Action, EscalationState, RfiEffect, Transition};

/// Input for [`EscalationService::submit`].
#[derive(Debug, Clone, Default)]
pub struct SubmitInput {
    pub reason: String,
    /// Summary already generated by the browser, stored as-is.
    pub ai_summary: Option<String>,
}

/// What happened to the AI suggestion during submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "suggestion", rename_all = "snake_case")]
pub enum SuggestionOutcome {
    /// Fetched from the suggestion source and stored.
    Generated(String),
    /// Already on the task; no outbound call was made.
    Cached(String),
    /// The source failed; the escalation still went through.
    Unavailable,
    /// No suggestion source configured.
    Disabled,
}

impl SuggestionOutcome {
    /// Suggestion text, when there is one.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Generated(s) | Self::Cached(s) => Some(s),
            Self::Unavailable | Self::Disabled => None,
        }
    }
}

/// Result of a successful transition.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub task_id: String,
    pub action: Action,
    pub from: EscalationState,
    pub to: EscalationState,
    /// Unix ms at which the transition was recorded.
    pub at: i64,
    pub fields_written: Vec<FieldKey>,
}

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    #[serde(flatten)]
    pub transition: TransitionOutcome,
    pub property_link: ResolvedLink,
    pub suggestion: SuggestionOutcome,
}

type Payload = Vec<(FieldKey, FieldWrite)>;

/// Executes escalation transitions.
pub struct EscalationService {
    store: Arc<dyn TaskStore>,
    fields: EscalationFields,
    suggestions: Option<Arc<dyn SuggestionSource>>,
    locks: TaskLocks,
    max_link_depth: u32,
}

impl EscalationService {
    /// Create a service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn TaskStore>, fields: EscalationFields) -> Self {
        Self {
            store,
            fields,
            suggestions: None,
            locks: TaskLocks::new(),
            max_link_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Attach a suggestion source used on submission.
    #[must_use]
    pub fn with_suggestions(mut self, source: Arc<dyn SuggestionSource>) -> Self {
        self.suggestions = Some(source);
        self
    }

    /// How many ancestors property-link resolution may search.
    #[must_use]
    pub const fn with_property_link_depth(mut self, depth: u32) -> Self {
        self.max_link_depth = depth;
        self
    }

    #[must_use]
    pub fn fields(&self) -> &EscalationFields {
        &self.fields
    }

    /// Current escalation record of a task.
    #[instrument(skip(self), fields(task = %task))]
    pub async fn load(&self, task: &TaskRef) -> EscalationResult<EscalationRecord> {
        let task = self.store.get_task(task).await?;
        EscalationRecord::from_task(&task, &self.fields, Utc::now())
    }

    /// Ensure the task has a property link, copying it from an ancestor.
    #[instrument(skip(self), fields(task = %task))]
    pub async fn validate_property_link(&self, task: &TaskRef) -> EscalationResult<ResolvedLink> {
        let canonical = self.store.get_task(task).await?.id;
        let _guard = self.locks.acquire(&canonical).await;
        let task = self.reload(&canonical).await?;
        property_link::resolve(self.store.as_ref(), &self.fields, &task, self.max_link_depth).await
    }

    /// Escalate a task to level 1.
    #[instrument(skip(self, input), fields(task = %task))]
    pub async fn submit(
        &self,
        task: &TaskRef,
        input: &SubmitInput,
        actor: Option<&str>,
    ) -> EscalationResult<SubmitOutcome> {
        let reason =
            require_text(&input.reason, "MISSING_REASON", "Escalation reason is required")?;
        let ai_summary = input
            .ai_summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let canonical = self.store.get_task(task).await?.id;
        let guard = self.locks.acquire(&canonical).await;
        let task = self.reload(&canonical).await?;
        let record = self.decode(&task)?;
        let step = lookup(record.state, Action::Submit)?;

        let link =
            property_link::resolve(self.store.as_ref(), &self.fields, &task, self.max_link_depth)
                .await?;

        let now = Utc::now().timestamp_millis();
        let mut payload: Payload = vec![
            (FieldKey::ReasonText, FieldWrite::Text(reason.to_string())),
            (FieldKey::SubmittedAt, FieldWrite::Date(now)),
        ];
        if let Some(summary) = ai_summary {
            payload.push((FieldKey::AiSummary, FieldWrite::Text(summary.to_string())));
        }
        self.clear_if_set(&task, &mut payload, &[FieldKey::RfiRequest, FieldKey::RfiResponse]);

        let transition = self
            .apply(&task, &record, step, payload, actor, Some(reason))
            .await?;
        drop(guard);

        let suggestion = self
            .suggestion(&task.id, &record, &link.property_link_ids)
            .await;

        Ok(SubmitOutcome {
            transition,
            property_link: link,
            suggestion,
        })
    }

    /// Answer and resolve an open escalation.
    #[instrument(skip(self, response), fields(task = %task))]
    pub async fn answer(
        &self,
        task: &TaskRef,
        response: &str,
        actor: Option<&str>,
    ) -> EscalationResult<TransitionOutcome> {
        let response = require_text(response, "MISSING_RESPONSE", "Response text is required")?;
        self.run(task, Action::Answer, actor, Some(response), |_, _, now| {
            vec![
                (FieldKey::Response, FieldWrite::Text(response.to_string())),
                (FieldKey::ResolvedAt, FieldWrite::Date(now)),
            ]
        })
        .await
    }

    /// Ask the employee for more information.
    ///
    /// Any previous RFI answer is cleared; it remains in the history log.
    #[instrument(skip(self, question), fields(task = %task))]
    pub async fn request_info(
        &self,
        task: &TaskRef,
        question: &str,
        actor: Option<&str>,
    ) -> EscalationResult<TransitionOutcome> {
        let question = require_text(question, "MISSING_QUESTION", "A question is required")?;
        self.run(task, Action::RequestInfo, actor, Some(question), |svc, task, _| {
            let mut payload = vec![(FieldKey::RfiRequest, FieldWrite::Text(question.to_string()))];
            svc.clear_if_set(task, &mut payload, &[FieldKey::RfiResponse]);
            payload
        })
        .await
    }

    /// Hand a level 1 escalation to level 2.
    #[instrument(skip(self, note), fields(task = %task))]
    pub async fn escalate_to_level_2(
        &self,
        task: &TaskRef,
        note: Option<&str>,
        actor: Option<&str>,
    ) -> EscalationResult<TransitionOutcome> {
        let note = note.map(str::trim).filter(|s| !s.is_empty());
        self.run(task, Action::EscalateToLevel2, actor, note, |svc, task, _| {
            let mut payload = Vec::new();
            svc.clear_if_set(task, &mut payload, &[FieldKey::RfiRequest, FieldKey::RfiResponse]);
            payload
        })
        .await
    }

    /// Answer an information request and return the escalation to its reviewer.
    #[instrument(skip(self, answer), fields(task = %task))]
    pub async fn respond_to_rfi(
        &self,
        task: &TaskRef,
        answer: &str,
        actor: Option<&str>,
    ) -> EscalationResult<TransitionOutcome> {
        let answer = require_text(answer, "MISSING_RFI_RESPONSE", "An answer is required")?;
        self.run(task, Action::RespondToRfi, actor, Some(answer), |_, _, _| {
            vec![(FieldKey::RfiResponse, FieldWrite::Text(answer.to_string()))]
        })
        .await
    }

    // =========================================================================
    // Transition plumbing
    // =========================================================================

    /// Lock, re-read, check the table, then apply `payload`.
    async fn run<F>(
        &self,
        task: &TaskRef,
        action: Action,
        actor: Option<&str>,
        detail: Option<&str>,
        payload: F,
    ) -> EscalationResult<TransitionOutcome>
    where
        F: FnOnce(&Self, &Task, i64) -> Payload + Send,
    {
        let canonical = self.store.get_task(task).await?.id;
        let _guard = self.locks.acquire(&canonical).await;
        let task = self.reload(&canonical).await?;
        let record = self.decode(&task)?;
        let step = lookup(record.state, action)?;

        let writes = payload(self, &task, Utc::now().timestamp_millis());
        self.apply(&task, &record, step, writes, actor, detail).await
    }

    async fn reload(&self, canonical: &str) -> EscalationResult<Task> {
        Ok(self
            .store
            .get_task(&TaskRef::Canonical(canonical.to_string()))
            .await?)
    }

    fn decode(&self, task: &Task) -> EscalationResult<EscalationRecord> {
        EscalationRecord::from_task(task, &self.fields, Utc::now())
    }

    fn clear_if_set(&self, task: &Task, payload: &mut Payload, keys: &[FieldKey]) {
        for key in keys {
            if task.field_value(self.fields.id(*key)).is_some() {
                payload.push((*key, FieldWrite::Clear));
            }
        }
    }

    /// Add level, RFI status, history and status writes, then execute.
    async fn apply(
        &self,
        task: &Task,
        record: &EscalationRecord,
        step: &Transition,
        mut writes: Payload,
        actor: Option<&str>,
        detail: Option<&str>,
    ) -> EscalationResult<TransitionOutcome> {
        let now = Utc::now();

        if let Some(level) = step.to.level() {
            if record.level != Some(level) || step.from.level() != Some(level) {
                writes.push((FieldKey::Level, FieldWrite::Dropdown(level.ordinal())));
            }
        }

        match step.rfi {
            RfiEffect::Keep => {}
            RfiEffect::Clear => self.clear_if_set(task, &mut writes, &[FieldKey::RfiStatus]),
            RfiEffect::Set(status) => {
                writes.push((FieldKey::RfiStatus, FieldWrite::Dropdown(status.ordinal())));
            }
        }

        let mut log = record.history.clone();
        log.push(HistoryEntry::transition(
            now, step.action, step.from, step.to, actor, detail,
        ));
        writes.push((FieldKey::History, FieldWrite::Text(history::render(&log))));

        writes.push((FieldKey::Status, FieldWrite::Dropdown(step.to.status_ordinal())));

        self.write_all(task, &writes).await?;

        info!(
            task_id = %task.id,
            action = %step.action,
            from = %step.from,
            to = %step.to,
            writes = writes.len(),
            "Escalation transition applied"
        );

        Ok(TransitionOutcome {
            task_id: task.id.clone(),
            action: step.action,
            from: step.from,
            to: step.to,
            at: now.timestamp_millis(),
            fields_written: writes.iter().map(|(k, _)| *k).collect(),
        })
    }

    /// Issue writes in order; on failure restore what was already written.
    async fn write_all(
        &self,
        task: &Task,
        writes: &[(FieldKey, FieldWrite)],
    ) -> EscalationResult<()> {
        for (done, (key, write)) in writes.iter().enumerate() {
            if let Err(source) = self.store.set_field(&task.id, self.fields.id(*key), write).await {
                error!(
                    task_id = %task.id,
                    field = ?key,
                    error = %source,
                    "Escalation field write failed, rolling back"
                );
                let rolled_back = self.compensate(task, &writes[..done]).await;
                return Err(EscalationError::PartialWrite {
                    task_id: task.id.clone(),
                    failed: *key,
                    rolled_back,
                    source,
                });
            }
        }
        Ok(())
    }

    /// Restore the pre-transition values of `written`, newest first.
    async fn compensate(&self, task: &Task, written: &[(FieldKey, FieldWrite)]) -> bool {
        let mut clean = true;
        for (key, _) in written.iter().rev() {
            let Some(restore) = self.fields.restore_write(task, *key) else {
                continue;
            };
            if let Err(e) = self.store.set_field(&task.id, self.fields.id(*key), &restore).await {
                clean = false;
                error!(
                    task_id = %task.id,
                    field = ?key,
                    error = %e,
                    "Compensating write failed"
                );
            }
        }
        clean
    }

    /// Best-effort AI suggestion after a successful submission.
    async fn suggestion(
        &self,
        task_id: &str,
        record: &EscalationRecord,
        property_link: &[String],
    ) -> SuggestionOutcome {
        if let Some(existing) = &record.ai_suggestion {
            info!(task_id = %task_id, "Reusing stored AI suggestion");
            return SuggestionOutcome::Cached(existing.clone());
        }
        let Some(source) = &self.suggestions else {
            return SuggestionOutcome::Disabled;
        };

        match source.suggest(task_id, property_link).await {
            Ok(suggestion) => {
                let write = FieldWrite::Text(suggestion.clone());
                if let Err(e) = self
                    .store
                    .set_field(task_id, self.fields.id(FieldKey::AiSuggestion), &write)
                    .await
                {
                    warn!(task_id = %task_id, error = %e, "Failed to store AI suggestion");
                }
                SuggestionOutcome::Generated(suggestion)
            }
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "AI suggestion unavailable");
                SuggestionOutcome::Unavailable
            }
        }
    }
}

fn require_text<'a>(
    value: &'a str,
    code: &'static str,
    message: &str,
) -> EscalationResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(EscalationError::validation(code, message))
    } else {
        Ok(trimmed)
    }
}

fn lookup(state: EscalationState, action: Action) -> EscalationResult<&'static Transition> {
    transition(state, action).ok_or(EscalationError::InvalidTransition {
        from: state,
        action,
    })
}
