//! Shell hooks run around generation.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_value::Value as SerdeValue;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Hooks that run at specific points during code generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hooks {
    /// Commands to run after every file has been written
    #[serde(default, deserialize_with = "deserialize_commands")]
    pub post_generate: Vec<String>,
}

impl Hooks {
    pub fn is_empty(&self) -> bool {
        self.post_generate.is_empty()
    }

    /// Run the `post_generate` commands in order inside `dir`.
    ///
    /// Stops at the first command that exits unsuccessfully.
    pub async fn run_post_generate(&self, dir: &Path) -> Result<()> {
        for command in &self.post_generate {
            log::info!("Running post-generate hook: {}", command);
            let output = Command::new("sh")
                .arg("-c")
                .arg(command)
                .current_dir(dir)
                .output()
                .await?;

            if !output.stdout.is_empty() {
                log::debug!("{}", String::from_utf8_lossy(&output.stdout).trim_end());
            }
            if !output.status.success() {
                return Err(Error::config(format!(
                    "Hook '{}' failed with {}: {}",
                    command,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim_end()
                )));
            }
        }
        Ok(())
    }
}

/// Deserialize either a single command or a list of commands
fn deserialize_commands<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = SerdeValue::deserialize(deserializer)?;

    match value {
        SerdeValue::Unit | SerdeValue::Option(None) => Ok(Vec::new()),
        SerdeValue::String(s) => Ok(vec![s]),
        SerdeValue::Seq(seq) => seq
            .into_iter()
            .map(|item| match item {
                SerdeValue::String(s) => Ok(s),
                _ => Err(serde::de::Error::custom(
                    "Expected string or array of strings",
                )),
            })
            .collect(),
        _ => Err(serde::de::Error::custom(
            "Expected string or array of strings",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_single_command_or_list() {
        let hooks: Hooks = serde_yaml::from_str("post_generate: bun install").unwrap();
        assert_eq!(hooks.post_generate, vec!["bun install"]);

        let hooks: Hooks =
            serde_yaml::from_str("post_generate:\n  - bun install\n  - bunx tsc --noEmit").unwrap();
        assert_eq!(hooks.post_generate.len(), 2);

        let hooks: Hooks = serde_json::from_str("{}").unwrap();
        assert!(hooks.is_empty());

        assert!(serde_yaml::from_str::<Hooks>("post_generate: [1, 2]").is_err());
    }

    #[tokio::test]
    async fn test_hooks_run_in_output_dir() -> Result<()> {
        let dir = tempdir()?;
        let hooks = Hooks {
            post_generate: vec!["echo done > marker.txt".into()],
        };
        hooks.run_post_generate(dir.path()).await?;
        let marker = std::fs::read_to_string(dir.path().join("marker.txt"))?;
        assert_eq!(marker.trim(), "done");
        Ok(())
    }

    #[tokio::test]
    async fn test_failing_hook_is_error() {
        let dir = tempdir().unwrap();
        let hooks = Hooks {
            post_generate: vec!["exit 3".into(), "echo never > marker.txt".into()],
        };
        let result = hooks.run_post_generate(dir.path()).await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(!dir.path().join("marker.txt").exists());
    }
}
