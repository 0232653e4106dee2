//! The form state controller.
//!
//! An update loop in the Elm style: [`FormController::apply`] consumes one
//! [`FormEvent`], mutates the record/cache/validation state, and returns
//! the [`Effect`]s to execute. The controller performs no IO itself, which
//! keeps every ordering property testable without a runtime.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use formwork_model::{FieldSpec, FieldValue, FormDefinition, OptionItem, Record};
use formwork_validate::{Issue, RecordSchema, ValidationReport};

use crate::cache::{CommitOutcome, LoadState, OptionCache};
use crate::effect::Effect;
use crate::error::EngineError;
use crate::event::FormEvent;
use crate::graph::DependencyGraph;
use crate::options::{EngineOptions, ErrorVisibility};
use crate::submit::SubmitGate;

/// Render model of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldView {
    pub value: FieldValue,
    /// Committed options, else the spec's static list, else empty.
    pub options: Vec<OptionItem>,
    pub load_state: LoadState,
    /// Validation message, after the error-visibility gate.
    pub error: Option<String>,
}

/// Render model of the whole form at one settled point.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSnapshot {
    pub record: Record,
    pub fields: BTreeMap<String, FieldView>,
    /// Visible record-level validation message.
    pub record_error: Option<String>,
    pub is_valid: bool,
    pub submit_pending: bool,
}

/// Owns the authoritative record and everything keyed to it.
///
/// All mutation goes through [`apply`]; collaborators read snapshots. The
/// initial-values state machine, the cascade-clear rule, and the submit
/// gate live here.
///
/// [`apply`]: FormController::apply
pub struct FormController {
    definition: FormDefinition,
    schema: Arc<dyn RecordSchema>,
    options: EngineOptions,
    graph: DependencyGraph,
    record: Record,
    /// Initial values last applied by a reset; the comparison target for
    /// deciding whether a newly supplied set is a genuine change.
    last_applied: Record,
    cache: OptionCache,
    gate: SubmitGate,
    touched: BTreeSet<String>,
    submitted: bool,
    validation: ValidationReport,
}

impl FormController {
    pub fn new(
        definition: FormDefinition,
        schema: Arc<dyn RecordSchema>,
        options: EngineOptions,
    ) -> Self {
        let graph = DependencyGraph::build(&definition, options.cycle_policy);
        let record = definition.empty_record();
        let mut controller = Self {
            graph,
            record,
            last_applied: Record::new(),
            cache: OptionCache::new(),
            gate: SubmitGate::default(),
            touched: BTreeSet::new(),
            submitted: false,
            validation: ValidationReport::new(),
            definition,
            schema,
            options,
        };
        controller.revalidate();
        controller
    }

    /// Loads issued once per engine lifetime: option sources with no
    /// dependency. The session driver executes these at startup.
    pub fn start(&mut self) -> Vec<Effect> {
        self.global_load_effects()
    }

    /// Process one event and return the effects to execute.
    ///
    /// Errors are reserved for caller bugs (events naming unknown fields);
    /// data-level failures such as a rejected loader arrive as events and
    /// become state, never errors.
    pub fn apply(&mut self, event: FormEvent) -> Result<Vec<Effect>, EngineError> {
        match event {
            FormEvent::ValuesSupplied(values) => Ok(self.apply_values_supplied(&values)),
            FormEvent::ResetRequested => {
                let initial = self.last_applied.clone();
                Ok(self.apply_reset(initial))
            }
            FormEvent::FieldChanged { field, value } => self.apply_field_change(&field, value),
            FormEvent::FieldBlurred { field } => self.apply_blur(&field),
            FormEvent::ReloadRequested => Ok(self.global_load_effects()),
            FormEvent::SubmitRequested => Ok(self.apply_submit()),
            FormEvent::OptionsLoaded {
                field,
                token,
                result,
            } => Ok(self.apply_options_loaded(&field, token, result)),
            FormEvent::SubmitSettled { outcome } => {
                self.apply_submit_settled(outcome);
                Ok(Vec::new())
            }
        }
    }

    // ------------------------------------------------------------------
    // Event handlers
    // ------------------------------------------------------------------

    fn apply_field_change(
        &mut self,
        field: &str,
        value: FieldValue,
    ) -> Result<Vec<Effect>, EngineError> {
        let on_change = match self.definition.field(field) {
            Some(spec) => spec.on_change.clone(),
            None => return Err(EngineError::unknown_field(field)),
        };
        if self.record.get(field) == Some(&value) {
            // Same value: no load, no notification, no hooks.
            return Ok(Vec::new());
        }
        self.record.set(field, value.clone());
        if let Some(hook) = on_change {
            hook(&value);
        }

        let mut effects = Vec::new();
        let dependents: Vec<String> = self.graph.dependents_of(field).to_vec();
        for dependent in &dependents {
            self.clear_dependent(dependent);
        }
        if !value.is_empty() {
            for dependent in &dependents {
                if let Some(effect) = self.begin_dependent_load(dependent, &value) {
                    effects.push(effect);
                }
            }
        }

        self.revalidate();
        self.push_record_notification(&mut effects);
        Ok(effects)
    }

    fn apply_blur(&mut self, field: &str) -> Result<Vec<Effect>, EngineError> {
        let on_blur = match self.definition.field(field) {
            Some(spec) => spec.on_blur.clone(),
            None => return Err(EngineError::unknown_field(field)),
        };
        self.touched.insert(field.to_string());
        if let Some(hook) = on_blur {
            hook();
        }
        Ok(Vec::new())
    }

    /// Initial-values state machine. A supplied set triggers a hard reset
    /// only when some key's value differs from the last applied set;
    /// re-supplying an equal set is a no-op, which is what breaks the
    /// reset loop when the host rebuilds an identical object every render.
    ///
    /// Equality is deep structural value equality. Only the keys of the
    /// supplied set are compared; keys for unknown fields are ignored for
    /// comparison and application alike.
    fn apply_values_supplied(&mut self, supplied: &Record) -> Vec<Effect> {
        let known: Record = supplied
            .iter()
            .filter(|(name, _)| self.definition.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let differs = known
            .iter()
            .any(|(name, value)| self.last_applied.get(name) != Some(value));
        if !differs {
            tracing::debug!("initial values unchanged; skipping reset");
            return Vec::new();
        }
        self.apply_reset(known)
    }

    /// Hard reset: the record is fully replaced, edits since the last
    /// reset are discarded. Dependents whose source value changed get
    /// their options reloaded (or cleared when the source emptied);
    /// dependents of unchanged sources keep value and options.
    fn apply_reset(&mut self, initial: Record) -> Vec<Effect> {
        let target = self.definition.record_from(&initial);
        self.last_applied = initial;
        self.touched.clear();
        self.submitted = false;
        if target == self.record {
            return Vec::new();
        }
        tracing::debug!("applying hard reset from supplied initial values");
        let previous = std::mem::replace(&mut self.record, target);

        let mut effects = Vec::new();
        let sources: Vec<String> = self.graph.sources().map(str::to_string).collect();
        for source in sources {
            let current = self
                .record
                .get(&source)
                .cloned()
                .unwrap_or(FieldValue::Empty);
            if previous.get(&source) == Some(&current) {
                continue;
            }
            let dependents: Vec<String> = self.graph.dependents_of(&source).to_vec();
            if current.is_empty() {
                for dependent in &dependents {
                    self.clear_dependent(dependent);
                }
            } else {
                for dependent in &dependents {
                    if let Some(effect) = self.begin_dependent_load(dependent, &current) {
                        effects.push(effect);
                    }
                }
            }
        }

        self.revalidate();
        self.push_record_notification(&mut effects);
        effects
    }

    fn apply_options_loaded(
        &mut self,
        field: &str,
        token: u64,
        result: Result<Vec<OptionItem>, String>,
    ) -> Vec<Effect> {
        match self.cache.commit(field, token, result) {
            CommitOutcome::Failed { error } => vec![Effect::NotifyLoadFailed {
                field: field.to_string(),
                error,
            }],
            CommitOutcome::Committed | CommitOutcome::Stale => Vec::new(),
        }
    }

    /// Validate, then forward. A submit attempt makes every error visible;
    /// while a forward is outstanding, repeats are refused without effects.
    fn apply_submit(&mut self) -> Vec<Effect> {
        self.submitted = true;
        self.revalidate();
        if self.validation.has_errors() {
            tracing::debug!(
                errors = self.validation.error_count(),
                "submission refused by validation"
            );
            return vec![Effect::NotifySubmitRejected {
                report: self.validation.clone(),
            }];
        }
        if !self.gate.try_begin() {
            tracing::debug!("submit already outstanding; ignoring repeat request");
            return Vec::new();
        }
        tracing::info!("forwarding validated record to submit handler");
        vec![Effect::ForwardSubmit {
            record: self.record.clone(),
        }]
    }

    fn apply_submit_settled(&mut self, outcome: Result<(), String>) {
        self.gate.settle();
        match outcome {
            Ok(()) => tracing::info!("submission settled"),
            Err(error) => tracing::warn!(error = %error, "submission failed; gate reopened"),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Cascade-clear one dependent: empty value, invalidated options.
    /// Hooks do not run for cascade-driven clears.
    fn clear_dependent(&mut self, field: &str) {
        let Some(kind) = self.definition.field(field).map(|spec| spec.kind) else {
            return;
        };
        self.record.set(field, FieldValue::empty_for(kind));
        self.cache.invalidate(field);
    }

    fn begin_dependent_load(&mut self, field: &str, dependency: &FieldValue) -> Option<Effect> {
        let has_loader = self
            .definition
            .field(field)
            .is_some_and(FieldSpec::has_async_options);
        if !has_loader {
            return None;
        }
        let token = self.cache.begin_load(field);
        Some(Effect::LoadOptions {
            field: field.to_string(),
            token,
            dependency: Some(dependency.clone()),
        })
    }

    fn global_load_effects(&mut self) -> Vec<Effect> {
        // A field that declared a dependency is never a global source,
        // even when the link was severed at graph build.
        let globals: Vec<String> = self
            .definition
            .fields()
            .filter(|spec| spec.has_async_options() && spec.depends_on.is_none())
            .map(|spec| spec.name.clone())
            .collect();
        let mut effects = Vec::new();
        for field in globals {
            let token = self.cache.begin_load(&field);
            effects.push(Effect::LoadOptions {
                field,
                token,
                dependency: None,
            });
        }
        effects
    }

    fn revalidate(&mut self) {
        let mut report = self.schema.validate(&self.record);
        report.extend(self.graph.issues().iter().cloned());
        self.validation = report;
    }

    fn push_record_notification(&self, effects: &mut Vec<Effect>) {
        match self.record.serialize_json() {
            Ok(serialized) => effects.push(Effect::NotifyRecordChanged { serialized }),
            Err(error) => {
                tracing::error!(error = %error, "failed to serialize record for change notification");
            }
        }
    }

    fn visible_error(&self, key: &str) -> Option<&Issue> {
        let issue = self.validation.error_for(key)?;
        match self.options.error_visibility {
            ErrorVisibility::Always => Some(issue),
            ErrorVisibility::AfterTouch => {
                (self.touched.contains(key) || self.submitted).then_some(issue)
            }
        }
    }

    // ------------------------------------------------------------------
    // Read surface
    // ------------------------------------------------------------------

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn current_record(&self) -> &Record {
        &self.record
    }

    /// Current validation, including schema-structure warnings.
    pub fn validation(&self) -> &ValidationReport {
        &self.validation
    }

    /// Structural problems found at graph build.
    pub fn schema_issues(&self) -> &[Issue] {
        self.graph.issues()
    }

    pub fn submit_pending(&self) -> bool {
        self.gate.is_pending()
    }

    pub fn load_state(&self, field: &str) -> LoadState {
        self.cache.state(field)
    }

    pub fn field_view(&self, field: &str) -> Option<FieldView> {
        let spec = self.definition.field(field)?;
        Some(FieldView {
            value: self
                .record
                .get(field)
                .cloned()
                .unwrap_or_else(|| FieldValue::empty_for(spec.kind)),
            options: self.cache.effective_options(spec),
            load_state: self.cache.state(field),
            error: self.visible_error(field).map(Issue::message),
        })
    }

    pub fn snapshot(&self) -> FormSnapshot {
        let fields = self
            .definition
            .fields()
            .filter_map(|spec| {
                self.field_view(&spec.name)
                    .map(|view| (spec.name.clone(), view))
            })
            .collect();
        FormSnapshot {
            record: self.record.clone(),
            fields,
            record_error: self
                .visible_error(formwork_validate::RECORD_KEY)
                .map(Issue::message),
            is_valid: self.validation.is_valid(),
            submit_pending: self.gate.is_pending(),
        }
    }
}
