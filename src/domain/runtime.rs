//! The model runtime: one active model, its store, and the operations a host
//! drives against them.

use crate::domain::error::SimError;
use crate::domain::export::{self, MergedResultView};
use crate::domain::loader::{self, LoadReport};
use crate::domain::model::run_model;
use crate::domain::schema::{ModelKind, ModelSchema};
use crate::domain::script::{self, ScriptReport};
use crate::domain::series_store::SeriesStore;
use crate::ports::log_port::LogPort;
use std::path::Path;

pub struct ModelRuntime<'a> {
    kind: ModelKind,
    store: SeriesStore,
    log: &'a dyn LogPort,
}

impl<'a> ModelRuntime<'a> {
    pub fn new(kind: ModelKind, log: &'a dyn LogPort) -> Self {
        log.info(&format!("Runtime initialized with model: {kind}"));
        Self {
            kind,
            store: SeriesStore::new(kind.schema()),
            log,
        }
    }

    /// Resolve `name` and build a runtime for it.
    pub fn from_name(name: &str, log: &'a dyn LogPort) -> Result<Self, SimError> {
        match ModelKind::from_name(name) {
            Ok(kind) => Ok(Self::new(kind, log)),
            Err(e) => {
                log.error(&format!("Failed to initialize runtime with model: {name} - {e}"));
                Err(e)
            }
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn schema(&self) -> &ModelSchema {
        self.store.schema()
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    /// Switch to the model called `name`. An unknown name leaves the current
    /// model and its data untouched.
    pub fn select_model(&mut self, name: &str) -> Result<(), SimError> {
        let kind = ModelKind::from_name(name).inspect_err(|e| {
            self.log.error(&format!(
                "Failed to re-initialize runtime with model: {name} - {e}"
            ));
        })?;
        self.select_kind(kind);
        Ok(())
    }

    /// Switch to `kind`, discarding all loaded and derived data.
    pub fn select_kind(&mut self, kind: ModelKind) {
        self.kind = kind;
        self.store = SeriesStore::new(kind.schema());
        self.log
            .info(&format!("Runtime re-initialized with model: {kind}"));
    }

    pub fn reset(&mut self) {
        self.store.reset();
        self.log.info("Runtime has been reset.");
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadReport, SimError> {
        loader::load_file(path, &mut self.store, self.log)
    }

    pub fn load_str(&mut self, content: &str) -> LoadReport {
        loader::load_str(content, &mut self.store, self.log)
    }

    /// Run the active model. A failure is logged and returned; the runtime
    /// stays usable.
    pub fn run(&mut self) -> Result<(), SimError> {
        self.log.info("Initiating model run.");
        match run_model(self.kind, &mut self.store, self.log) {
            Ok(()) => {
                self.log.info("Model has been run successfully.");
                Ok(())
            }
            Err(e) => {
                self.log.error(&format!("Failed to run model - {e}"));
                Err(e)
            }
        }
    }

    pub fn execute_script(&mut self, source: &str) -> Result<ScriptReport, SimError> {
        script::execute(source, &mut self.store, self.log)
    }

    pub fn execute_script_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<ScriptReport, SimError> {
        script::execute_file(path, &mut self.store, self.log)
    }

    pub fn merged_view(&self) -> MergedResultView {
        export::to_table(&self.store)
    }

    pub fn to_delimited_text(&self) -> Result<String, SimError> {
        export::to_delimited_text(&self.store)
    }
}
