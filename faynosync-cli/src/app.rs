use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::CommandFactory;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::cli::{Cli, Command, ConfigAction, UPLOAD_USAGE};
use crate::config::{Config, RuntimeConfig, DEFAULT_OWNER, DEFAULT_SERVER};
use crate::error::{FaynoError, Result};
use crate::upload::{self, ParsedUpload, ReportSink, TracingSink};

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Runs parsed commands against an input stream and an output writer.
pub struct App<R, W> {
    input: R,
    output: W,
    sink: Arc<dyn ReportSink>,
    env: EnvLookup,
    config_path: Option<PathBuf>,
}

impl<R, W> App<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            sink: Arc::new(TracingSink),
            env: Box::new(|key: &str| std::env::var(key).ok()),
            config_path: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(env);
        self
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub async fn run(&mut self, cli: Cli) -> Result<()> {
        match cli.command {
            None => self.print_help(None),
            Some(Command::Init) => self.init_config().await,
            Some(Command::Config { action: None }) => self.print_help(Some("config")),
            Some(Command::Config {
                action: Some(ConfigAction::View),
            }) => self.view_config(),
            Some(Command::Config {
                action: Some(ConfigAction::Set { key, value }),
            }) => self.set_config(&key, value).await,
            Some(Command::Upload { args }) => self.run_upload(&args).await,
        }
    }

    async fn run_upload(&mut self, args: &[String]) -> Result<()> {
        let intent = match upload::parse_upload_flags(args)? {
            ParsedUpload::Help => {
                writeln!(self.output, "{UPLOAD_USAGE}")?;
                return Ok(());
            }
            ParsedUpload::Intent(intent) => intent,
        };
        intent.require_files()?;

        let runtime = RuntimeConfig::resolve(&self.env, || self.config_path())?;
        tracing::debug!(owner = %runtime.owner, "Resolved runtime settings");

        upload::run_upload(&intent, &runtime, &mut self.input, self.sink.as_ref()).await?;
        Ok(())
    }

    async fn init_config(&mut self) -> Result<()> {
        let path = self.config_path()?;
        if path.exists() {
            tracing::info!(path = %path.display(), "Config already exists");
            return Ok(());
        }

        let server = self.prompt_with_default("server", DEFAULT_SERVER).await?;
        tracing::debug!(server = %server, "Server value");
        let owner = self.prompt_with_default("owner", DEFAULT_OWNER).await?;
        tracing::debug!(owner = %owner, "Owner value");

        Config { server, owner }.init_at(&path)?;
        tracing::info!(path = %path.display(), "Config initialized");
        Ok(())
    }

    fn view_config(&mut self) -> Result<()> {
        let path = self.config_path()?;
        let config = Config::load_from(&path)?;
        let rendered = config.to_yaml_string().map_err(|e| FaynoError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        write!(self.output, "{rendered}")?;
        Ok(())
    }

    async fn set_config(&mut self, key: &str, value: Option<String>) -> Result<()> {
        let value = match value {
            Some(value) => value,
            None => self.prompt(&format!("Enter value for {key}: ")).await?,
        };
        if value.is_empty() {
            return Err(FaynoError::EmptyValue);
        }

        let path = self.config_path()?;
        let mut config = Config::load_from(&path)?;
        config.update_field(key, &value)?;
        config.save_at(&path)?;

        tracing::info!(key = %key, "Config updated");
        Ok(())
    }

    async fn prompt_with_default(&mut self, key: &str, default: &str) -> Result<String> {
        let value = self
            .prompt(&format!("Enter value for {key} [{default}]: "))
            .await?;
        if value.is_empty() {
            return Ok(default.to_string());
        }
        Ok(value)
    }

    /// Print `question` and read one trimmed line; end of input reads as empty.
    async fn prompt(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line).await?;
        Ok(line.trim().to_string())
    }

    fn print_help(&mut self, subcommand: Option<&str>) -> Result<()> {
        let mut command = Cli::command();
        let help = match subcommand {
            Some(name) => command
                .find_subcommand_mut(name)
                .map(|sub| sub.render_help().to_string())
                .unwrap_or_default(),
            None => command.render_help().to_string(),
        };
        writeln!(self.output, "{help}")?;
        Ok(())
    }

    fn config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Config::default_path(),
        }
    }
}
