use crate::obj::ExportCompleted;

/// Action run by the caller after a mesh file has been fully written.
///
/// The exporter never calls a hook itself; [`MeshBatch`](crate::MeshBatch)
/// invokes it only after a successful export, and a failing hook does not
/// undo or fail that export.
pub trait PostExportHook {
    fn on_export(&self, completed: &ExportCompleted) -> anyhow::Result<()>;
}

impl<F> PostExportHook for F
where
    F: Fn(&ExportCompleted) -> anyhow::Result<()>,
{
    fn on_export(&self, completed: &ExportCompleted) -> anyhow::Result<()> {
        self(completed)
    }
}
