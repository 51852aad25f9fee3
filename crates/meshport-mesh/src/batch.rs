use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::builder::MeshModelBuilder;
use crate::hook::PostExportHook;
use crate::mesh::MeshModel;
use crate::obj::ObjExporter;
use crate::source::SourceObject;

/// Stage at which an asset failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Build,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Build => write!(f, "build"),
            Stage::Export => write!(f, "export"),
        }
    }
}

/// Why an asset produced no file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedCompression,
}

/// What happened to one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOutcome {
    Exported {
        path: PathBuf,
        /// Error reported by the post-export hook, if any.
        hook_error: Option<String>,
    },
    Skipped(SkipReason),
    Failed {
        stage: Stage,
        kind: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReport {
    pub name: String,
    pub outcome: AssetOutcome,
}

/// Per-asset results of a batch run, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub assets: Vec<AssetReport>,
}

impl BatchReport {
    pub fn exported(&self) -> usize {
        self.count(|o| matches!(o, AssetOutcome::Exported { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, AssetOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, AssetOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, predicate: impl Fn(&AssetOutcome) -> bool) -> usize {
        self.assets.iter().filter(|a| predicate(&a.outcome)).count()
    }
}

/// Builds and exports many assets, isolating failures per asset.
pub struct MeshBatch {
    builder: MeshModelBuilder,
    exporter: ObjExporter,
    out_dir: PathBuf,
    hook: Option<Box<dyn PostExportHook>>,
}

impl MeshBatch {
    pub fn new(exporter: ObjExporter, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            builder: MeshModelBuilder::new(),
            exporter,
            out_dir: out_dir.into(),
            hook: None,
        }
    }

    /// Run `hook` after every successful export.
    pub fn with_hook(mut self, hook: impl PostExportHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Build and export one asset. `label` names it when the source carries
    /// no usable name or fails before one is read.
    pub fn process<S: SourceObject>(&self, label: &str, source: &S) -> AssetReport {
        self.process_tracked(label, source, &mut HashSet::new())
    }

    /// Process every `(label, source)` pair, continuing past failures.
    ///
    /// An asset whose output path was already written earlier in the run
    /// fails instead of overwriting that file.
    pub fn run<'s, S, I>(&self, sources: I) -> BatchReport
    where
        S: SourceObject + 's,
        I: IntoIterator<Item = (String, &'s S)>,
    {
        let mut written = HashSet::new();
        let assets: Vec<AssetReport> = sources
            .into_iter()
            .map(|(label, source)| self.process_tracked(&label, source, &mut written))
            .collect();
        let report = BatchReport { assets };
        info!(
            "Batch finished: {} exported, {} skipped, {} failed",
            report.exported(),
            report.skipped(),
            report.failed()
        );
        report
    }

    fn process_tracked<S: SourceObject>(
        &self,
        label: &str,
        source: &S,
        written: &mut HashSet<PathBuf>,
    ) -> AssetReport {
        match self.builder.build(source) {
            Ok(model) => self.export(model, written),
            Err(e) => {
                warn!("Failed to build '{}' ({}): {}", label, e.kind(), e);
                AssetReport {
                    name: label.to_string(),
                    outcome: AssetOutcome::Failed {
                        stage: Stage::Build,
                        kind: e.kind(),
                        message: e.to_string(),
                    },
                }
            }
        }
    }

    fn export(&self, model: MeshModel, written: &mut HashSet<PathBuf>) -> AssetReport {
        let name = model.name().to_string();

        if model.unsupported_compression() {
            return AssetReport {
                name,
                outcome: AssetOutcome::Skipped(SkipReason::UnsupportedCompression),
            };
        }

        let path = self.out_dir.join(self.exporter.file_name(&model));
        if written.contains(&path) {
            warn!("Not exporting '{}': {} was already written", name, path.display());
            return AssetReport {
                outcome: AssetOutcome::Failed {
                    stage: Stage::Export,
                    kind: "name collision",
                    message: format!("{} was already written by an earlier asset", path.display()),
                },
                name,
            };
        }

        let completed = match self.exporter.export_to_dir(&model, &self.out_dir) {
            Ok(completed) => completed,
            Err(e) => {
                warn!("Failed to export '{}' ({}): {}", name, e.kind(), e);
                return AssetReport {
                    name,
                    outcome: AssetOutcome::Failed {
                        stage: Stage::Export,
                        kind: e.kind(),
                        message: e.to_string(),
                    },
                };
            }
        };

        written.insert(completed.path.clone());

        let hook_error = self.hook.as_ref().and_then(|hook| {
            hook.on_export(&completed).err().map(|e| {
                warn!("Post-export hook failed for '{}': {:#}", name, e);
                format!("{e:#}")
            })
        });

        AssetReport {
            name,
            outcome: AssetOutcome::Exported {
                path: completed.path,
                hook_error,
            },
        }
    }
}
