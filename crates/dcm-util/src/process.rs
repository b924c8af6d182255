use std::process::{Command, Output};

use crate::errors::DcmError;

/// Builder for the external render and inspect commands.
pub struct CommandBuilder {
    program: String,
    args: Vec<String>,
}

impl CommandBuilder {
    /// Create a new builder for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build a command from an argv template, replacing every `{key}`
    /// placeholder with its value from `vars`.
    ///
    /// Returns `None` for an empty template.
    pub fn from_template(argv: &[String], vars: &[(&str, &str)]) -> Option<Self> {
        let mut expanded = argv.iter().map(|part| {
            vars.iter().fold(part.clone(), |acc, (key, value)| {
                acc.replace(&format!("{{{key}}}"), value)
            })
        });
        let program = expanded.next()?;
        Some(Self::new(program).args(expanded))
    }

    /// Append multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The command line as it would be typed in a shell, for log messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Execute the command and return its output.
    pub fn exec(&self) -> Result<Output, DcmError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        tracing::debug!(command = %self.display(), "spawning process");
        cmd.output().map_err(DcmError::from)
    }

    /// Execute the command and return its stdout, failing on a non-zero exit.
    pub fn exec_stdout(&self) -> Result<Vec<u8>, DcmError> {
        let output = self.exec()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DcmError::Generic {
                message: format!(
                    "`{}` exited with {}: {}",
                    self.display(),
                    output.status,
                    stderr.trim()
                ),
            });
        }
        Ok(output.stdout)
    }
}
