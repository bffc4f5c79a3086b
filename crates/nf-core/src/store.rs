//! Workflow persistence boundary and an in-memory store.

use crate::document::{
    ExportBundle, HistoryRecord, SCHEMA_VERSION, TemplateRecord, Workflow, WorkflowRecord,
};
use crate::error::DocumentError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Get/put of workflow documents keyed by id.
pub trait WorkflowStore {
    fn get(&self, id: &str) -> Option<WorkflowRecord>;

    /// Insert or overwrite. `createdAt` survives overwrites; `updatedAt` is
    /// always restamped.
    fn put(&mut self, workflow: Workflow) -> WorkflowRecord;

    /// Returns whether a record was removed.
    fn delete(&mut self, id: &str) -> bool;

    /// All records, most recently updated first.
    fn list(&self) -> Vec<WorkflowRecord>;

    /// Case-insensitive match on name or description.
    fn search(&self, query: &str) -> Vec<WorkflowRecord> {
        let query = query.to_lowercase();
        self.list()
            .into_iter()
            .filter(|r| {
                r.workflow.name.to_lowercase().contains(&query)
                    || r.workflow.description.to_lowercase().contains(&query)
            })
            .collect()
    }
}

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

/// Store backed by hash maps; also keeps templates, run history and
/// key/value settings so the whole thing can be exported as one bundle.
pub struct MemoryStore {
    workflows: HashMap<String, WorkflowRecord>,
    templates: HashMap<String, TemplateRecord>,
    history: HashMap<String, HistoryRecord>,
    settings: serde_json::Map<String, serde_json::Value>,
    now: Clock,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_clock(Utc::now)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that takes its timestamps from `now`.
    pub fn with_clock(now: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        Self {
            workflows: HashMap::new(),
            templates: HashMap::new(),
            history: HashMap::new(),
            settings: serde_json::Map::new(),
            now: Box::new(now),
        }
    }

    // ─── Templates ───────────────────────────────────────────────────────

    pub fn put_template(&mut self, template: TemplateRecord) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn template(&self, id: &str) -> Option<&TemplateRecord> {
        self.templates.get(id)
    }

    pub fn templates(&self) -> Vec<&TemplateRecord> {
        let mut out: Vec<_> = self.templates.values().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub fn templates_in(&self, category: &str) -> Vec<&TemplateRecord> {
        self.templates()
            .into_iter()
            .filter(|t| t.category == category)
            .collect()
    }

    pub fn delete_template(&mut self, id: &str) -> bool {
        self.templates.remove(id).is_some()
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn add_history(&mut self, record: HistoryRecord) {
        self.history.insert(record.id.clone(), record);
    }

    /// All runs, most recently started first.
    pub fn history(&self) -> Vec<&HistoryRecord> {
        let mut out: Vec<_> = self.history.values().collect();
        out.sort_by(|a, b| b.started_at.cmp(&a.started_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    pub fn history_for(&self, workflow_id: &str) -> Vec<&HistoryRecord> {
        self.history()
            .into_iter()
            .filter(|h| h.workflow_id == workflow_id)
            .collect()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ─── Settings ────────────────────────────────────────────────────────

    pub fn setting(&self, key: &str) -> Option<&serde_json::Value> {
        self.settings.get(key)
    }

    pub fn set_setting(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.settings.insert(key.into(), value);
    }

    pub fn delete_setting(&mut self, key: &str) -> bool {
        self.settings.remove(key).is_some()
    }

    // ─── Bulk ────────────────────────────────────────────────────────────

    pub fn export_all(&self) -> ExportBundle {
        ExportBundle {
            workflows: self.list(),
            templates: self.templates().into_iter().cloned().collect(),
            history: self.history().into_iter().cloned().collect(),
            settings: self.settings.clone(),
            exported_at: (self.now)(),
            version: SCHEMA_VERSION,
        }
    }

    /// Merge a bundle into the store. Records keep the timestamps they were
    /// exported with; same-id records are overwritten.
    pub fn import_all(&mut self, bundle: ExportBundle) -> Result<(), DocumentError> {
        if bundle.version > SCHEMA_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: bundle.version,
                supported: SCHEMA_VERSION,
            });
        }
        log::debug!(
            "importing {} workflow(s), {} template(s), {} run(s), {} setting(s)",
            bundle.workflows.len(),
            bundle.templates.len(),
            bundle.history.len(),
            bundle.settings.len()
        );
        for record in bundle.workflows {
            self.workflows.insert(record.workflow.id.clone(), record);
        }
        for template in bundle.templates {
            self.put_template(template);
        }
        for run in bundle.history {
            self.add_history(run);
        }
        self.settings.extend(bundle.settings);
        Ok(())
    }

    pub fn import_json(&mut self, json: &str) -> Result<(), DocumentError> {
        self.import_all(ExportBundle::from_json(json)?)
    }

    pub fn clear_all(&mut self) {
        self.workflows.clear();
        self.templates.clear();
        self.history.clear();
        self.settings.clear();
    }
}

impl WorkflowStore for MemoryStore {
    fn get(&self, id: &str) -> Option<WorkflowRecord> {
        self.workflows.get(id).cloned()
    }

    fn put(&mut self, workflow: Workflow) -> WorkflowRecord {
        let now = (self.now)();
        let created_at = self
            .workflows
            .get(&workflow.id)
            .map_or(now, |existing| existing.created_at);
        let record = WorkflowRecord {
            workflow,
            created_at,
            updated_at: now,
        };
        log::debug!("saved workflow `{}`", record.workflow.id);
        self.workflows
            .insert(record.workflow.id.clone(), record.clone());
        record
    }

    fn delete(&mut self, id: &str) -> bool {
        self.workflows.remove(id).is_some()
    }

    fn list(&self) -> Vec<WorkflowRecord> {
        let mut out: Vec<WorkflowRecord> = self.workflows.values().cloned().collect();
        out.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.workflow.id.cmp(&b.workflow.id))
        });
        out
    }
}
