use crate::error::{CorralError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One process to launch under supervision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Display name for the process (unique not required)
    pub name: String,

    /// Path to the executable to run
    pub command: PathBuf,

    /// Command-line arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the process
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Extra environment variables, overlaid on the inherited environment
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl LaunchSpec {
    /// Create a spec for a bare command with no arguments
    pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
        }
    }

    /// Build a spec from a raw command line
    ///
    /// The line is split on whitespace: the first token is the command, the
    /// rest are arguments. The process name is derived from the command's
    /// file stem.
    pub fn from_command_line(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        let command = tokens
            .next()
            .ok_or_else(|| CorralError::Config("empty command line".to_string()))?;
        let command = PathBuf::from(command);

        let name = command
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("process")
            .to_string();

        Ok(Self {
            name,
            command,
            args: tokens.map(str::to_string).collect(),
            cwd: None,
            env: HashMap::new(),
        })
    }

    /// Load launch specs from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<Vec<LaunchSpec>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CorralError::Config(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let specs = match extension {
            "toml" => Self::parse_toml(&contents)?,
            "json" => Self::parse_json(&contents)?,
            _ => {
                return Err(CorralError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        // Expand environment variables in all specs
        let expanded: Vec<LaunchSpec> = specs
            .into_iter()
            .map(|mut spec| {
                spec.expand_env_vars();
                spec
            })
            .collect();

        for spec in &expanded {
            spec.validate()?;
        }

        Ok(expanded)
    }

    /// Parse TOML configuration file
    fn parse_toml(contents: &str) -> Result<Vec<LaunchSpec>> {
        #[derive(Deserialize)]
        struct ConfigFile {
            #[serde(default)]
            processes: Vec<LaunchSpec>,
            #[serde(flatten)]
            single: Option<LaunchSpec>,
        }

        let config_file: ConfigFile = toml::from_str(contents)
            .map_err(|e| CorralError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?;

        // Support both a single spec and an array of specs
        if let Some(single) = config_file.single {
            Ok(vec![single])
        } else if !config_file.processes.is_empty() {
            Ok(config_file.processes)
        } else {
            Err(CorralError::InvalidConfig(
                "No process configuration found in file".to_string(),
            ))
        }
    }

    /// Parse JSON configuration file
    fn parse_json(contents: &str) -> Result<Vec<LaunchSpec>> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ConfigFile {
            Single(LaunchSpec),
            Multiple { processes: Vec<LaunchSpec> },
        }

        let config_file: ConfigFile = serde_json::from_str(contents)
            .map_err(|e| CorralError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?;

        match config_file {
            ConfigFile::Single(spec) => Ok(vec![spec]),
            ConfigFile::Multiple { processes } => {
                if processes.is_empty() {
                    Err(CorralError::InvalidConfig(
                        "No process configuration found in file".to_string(),
                    ))
                } else {
                    Ok(processes)
                }
            }
        }
    }

    /// Validate the spec
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CorralError::MissingConfigField("name".to_string()));
        }

        if self.command.as_os_str().is_empty() {
            return Err(CorralError::MissingConfigField("command".to_string()));
        }

        // Validate working directory exists if specified
        if let Some(ref cwd) = self.cwd {
            if !cwd.exists() {
                return Err(CorralError::ConfigValidation(format!(
                    "Working directory does not exist: {}",
                    cwd.display()
                )));
            }
            if !cwd.is_dir() {
                return Err(CorralError::ConfigValidation(format!(
                    "Working directory is not a directory: {}",
                    cwd.display()
                )));
            }
        }

        Ok(())
    }

    /// Expand environment variables in spec fields
    fn expand_env_vars(&mut self) {
        self.command = Self::expand_env_in_path(&self.command);

        if let Some(ref cwd) = self.cwd {
            self.cwd = Some(Self::expand_env_in_path(cwd));
        }

        self.args = self
            .args
            .iter()
            .map(|arg| Self::expand_env_in_string(arg))
            .collect();

        // Values only, keys stay literal
        self.env = self
            .env
            .iter()
            .map(|(k, v)| (k.clone(), Self::expand_env_in_string(v)))
            .collect();
    }

    /// Expand environment variables in a string
    fn expand_env_in_string(s: &str) -> String {
        let mut result = s.to_string();

        // Handle $VAR and ${VAR} syntax
        for (key, value) in std::env::vars() {
            result = result.replace(&format!("${{{}}}", key), &value);
            result = result.replace(&format!("${}", key), &value);
        }

        result
    }

    /// Expand environment variables in a path
    fn expand_env_in_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = Self::expand_env_in_string(&path_str);
        PathBuf::from(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_from_command_line() {
        let spec = LaunchSpec::from_command_line("/bin/sleep 5").unwrap();
        assert_eq!(spec.name, "sleep");
        assert_eq!(spec.command, PathBuf::from("/bin/sleep"));
        assert_eq!(spec.args, vec!["5".to_string()]);
        assert!(spec.cwd.is_none());
        assert!(spec.env.is_empty());
    }

    #[test]
    fn test_from_command_line_bare() {
        let spec = LaunchSpec::from_command_line("/bin/true").unwrap();
        assert_eq!(spec.name, "true");
        assert!(spec.args.is_empty());
    }

    #[test]
    fn test_from_command_line_empty() {
        let result = LaunchSpec::from_command_line("   ");
        assert!(matches!(result, Err(CorralError::Config(_))));
    }

    #[test]
    fn test_validate_missing_name() {
        let mut spec = LaunchSpec::new("x", "/bin/echo");
        spec.name = String::new();

        match spec.validate() {
            Err(CorralError::MissingConfigField(field)) => assert_eq!(field, "name"),
            other => panic!("Expected MissingConfigField, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_missing_command() {
        let spec = LaunchSpec::new("x", "");

        match spec.validate() {
            Err(CorralError::MissingConfigField(field)) => assert_eq!(field, "command"),
            other => panic!("Expected MissingConfigField, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_bad_cwd() {
        let mut spec = LaunchSpec::new("x", "/bin/echo");
        spec.cwd = Some(PathBuf::from("/nonexistent/directory"));

        assert!(matches!(
            spec.validate(),
            Err(CorralError::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_load_toml_single() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("single.toml");
        fs::write(
            &path,
            r#"
name = "worker"
command = "/bin/sleep"
args = ["5"]
"#,
        )
        .unwrap();

        let specs = LaunchSpec::from_file(&path).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "worker");
        assert_eq!(specs[0].args, vec!["5".to_string()]);
    }

    #[test]
    fn test_load_toml_multiple() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("multi.toml");
        fs::write(
            &path,
            r#"
[[processes]]
name = "one"
command = "/bin/true"

[[processes]]
name = "two"
command = "/bin/sleep"
args = ["1"]
"#,
        )
        .unwrap();

        let specs = LaunchSpec::from_file(&path).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "one");
        assert_eq!(specs[1].name, "two");
    }

    #[test]
    fn test_load_json_multiple() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("multi.json");
        fs::write(
            &path,
            r#"{"processes": [{"name": "a", "command": "/bin/true"}]}"#,
        )
        .unwrap();

        let specs = LaunchSpec::from_file(&path).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "a");
    }

    #[test]
    fn test_load_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("specs.yaml");
        fs::write(&path, "name: x").unwrap();

        assert!(matches!(
            LaunchSpec::from_file(&path),
            Err(CorralError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_env_expansion() {
        std::env::set_var("CORRAL_TEST_BIN", "/bin");

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("expand.toml");
        fs::write(
            &path,
            r#"
name = "expanded"
command = "${CORRAL_TEST_BIN}/echo"
args = ["$CORRAL_TEST_BIN"]
"#,
        )
        .unwrap();

        let specs = LaunchSpec::from_file(&path).unwrap();
        assert_eq!(specs[0].command, PathBuf::from("/bin/echo"));
        assert_eq!(specs[0].args, vec!["/bin".to_string()]);
    }
}
