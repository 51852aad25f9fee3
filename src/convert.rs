//! Post-export conversion through an external program

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context};
use meshport_mesh::{ExportCompleted, PostExportHook};
use tracing::info;

use crate::settings::ConverterSettings;

/// Runs a converter program on each exported file, e.g. OBJ to FBX.
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    program: PathBuf,
    args: Vec<String>,
    output_extension: String,
}

impl ExternalConverter {
    pub fn from_settings(settings: &ConverterSettings) -> Self {
        Self {
            program: settings.program.clone(),
            args: settings.args.clone(),
            output_extension: settings.output_extension.clone(),
        }
    }

    /// Path of the converted file next to `input`.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        input.with_extension(&self.output_extension)
    }

    /// Arguments with `{input}` and `{output}` substituted.
    fn command_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }
}

impl PostExportHook for ExternalConverter {
    fn on_export(&self, completed: &ExportCompleted) -> anyhow::Result<()> {
        let output = self.output_path(&completed.path);
        info!("Converting {} to {}", completed.path.display(), output.display());

        let status = Command::new(&self.program)
            .args(self.command_args(&completed.path, &output))
            .status()
            .with_context(|| format!("Failed to run {}", self.program.display()))?;

        if !status.success() {
            bail!("{} exited with {}", self.program.display(), status);
        }
        Ok(())
    }
}
