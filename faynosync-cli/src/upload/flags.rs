use serde::Serialize;

use crate::error::{FaynoError, Result};

/// Outcome of parsing the arguments that follow `upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedUpload {
    Help,
    Intent(UploadIntent),
}

/// A validated upload request, built once from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadIntent {
    pub app_name: String,
    pub files: Vec<String>,
    pub version: String,
    pub channel: String,
    pub platform: String,
    pub arch: String,
    pub publish: bool,
    pub critical: bool,
    pub intermediate: bool,
    pub changelog: String,
    pub changelog_file: String,
    pub changelog_stdin: bool,
}

/// JSON document sent in the `data` field of the multipart body.
#[derive(Debug, Serialize)]
pub struct UploadMetadata<'a> {
    pub app_name: &'a str,
    pub version: &'a str,
    pub channel: &'a str,
    pub publish: bool,
    pub critical: bool,
    pub intermediate: bool,
    pub platform: &'a str,
    pub arch: &'a str,
    pub changelog: &'a str,
}

impl UploadIntent {
    /// Fails unless at least one `--file` was given.
    pub fn require_files(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(FaynoError::NoFiles);
        }
        Ok(())
    }

    /// Rejects more than one configured changelog source.
    pub fn validate_changelog_sources(&self) -> Result<()> {
        let used = [
            !self.changelog.is_empty(),
            !self.changelog_file.trim().is_empty(),
            self.changelog_stdin,
        ]
        .into_iter()
        .filter(|used| *used)
        .count();

        if used > 1 {
            return Err(FaynoError::ConflictingChangelogSources);
        }
        Ok(())
    }

    pub fn metadata<'a>(&'a self, changelog: &'a str) -> UploadMetadata<'a> {
        UploadMetadata {
            app_name: &self.app_name,
            version: &self.version,
            channel: &self.channel,
            publish: self.publish,
            critical: self.critical,
            intermediate: self.intermediate,
            platform: &self.platform,
            arch: &self.arch,
            changelog,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    App,
    File,
    Version,
    Channel,
    Platform,
    Arch,
    Publish,
    Critical,
    Intermediate,
    Changelog,
    ChangelogFile,
    ChangelogStdin,
}

impl Flag {
    const ALL: [Flag; 12] = [
        Flag::App,
        Flag::File,
        Flag::Version,
        Flag::Channel,
        Flag::Platform,
        Flag::Arch,
        Flag::Publish,
        Flag::Critical,
        Flag::Intermediate,
        Flag::Changelog,
        Flag::ChangelogFile,
        Flag::ChangelogStdin,
    ];

    fn name(self) -> &'static str {
        match self {
            Flag::App => "--app",
            Flag::File => "--file",
            Flag::Version => "--version",
            Flag::Channel => "--channel",
            Flag::Platform => "--platform",
            Flag::Arch => "--arch",
            Flag::Publish => "--publish",
            Flag::Critical => "--critical",
            Flag::Intermediate => "--intermediate",
            Flag::Changelog => "--changelog",
            Flag::ChangelogFile => "--changelog-file",
            Flag::ChangelogStdin => "--changelog-stdin",
        }
    }

    fn from_name(name: &str) -> Option<Flag> {
        Flag::ALL.into_iter().find(|flag| flag.name() == name)
    }

    fn is_bool(self) -> bool {
        matches!(
            self,
            Flag::Publish | Flag::Critical | Flag::Intermediate | Flag::ChangelogStdin
        )
    }
}

fn is_help(token: &str) -> bool {
    matches!(token, "-h" | "--help" | "help")
}

/// Parse the raw arguments following the `upload` subcommand.
///
/// Every option takes either the next token or an inline `--name=value`.
/// Boolean options may stand alone, in which case they are set to `true`.
/// A help token anywhere short-circuits the parse.
pub fn parse_upload_flags<S: AsRef<str>>(args: &[S]) -> Result<ParsedUpload> {
    let mut intent = UploadIntent::default();
    let mut idx = 0;

    while idx < args.len() {
        let arg = args[idx].as_ref().trim();
        if is_help(arg) {
            return Ok(ParsedUpload::Help);
        }

        let (name, inline) = match arg.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (arg, None),
        };
        let flag = Flag::from_name(name).ok_or_else(|| FaynoError::UnknownFlag(arg.to_string()))?;
        let next = args.get(idx + 1).map(|next| next.as_ref().trim());

        let consumed = if flag.is_bool() {
            let (value, consumed) = match inline {
                Some(raw) => (parse_bool(raw, flag.name())?, 0),
                None => bool_value(next, flag.name())?,
            };
            intent.set_bool(flag, value);
            consumed
        } else {
            let (value, consumed) = match inline {
                Some(raw) => (raw.to_string(), 0),
                None => (require_value(next, flag.name())?, 1),
            };
            intent.set_value(flag, value);
            consumed
        };

        idx += 1 + consumed;
    }

    intent.validate_changelog_sources()?;
    Ok(ParsedUpload::Intent(intent))
}

impl UploadIntent {
    fn set_value(&mut self, flag: Flag, value: String) {
        match flag {
            Flag::App => self.app_name = value,
            Flag::File => self.files.push(value),
            Flag::Version => self.version = value,
            Flag::Channel => self.channel = value,
            Flag::Platform => self.platform = value,
            Flag::Arch => self.arch = value,
            Flag::Changelog => self.changelog = value,
            Flag::ChangelogFile => self.changelog_file = value,
            Flag::Publish | Flag::Critical | Flag::Intermediate | Flag::ChangelogStdin => {}
        }
    }

    fn set_bool(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::Publish => self.publish = value,
            Flag::Critical => self.critical = value,
            Flag::Intermediate => self.intermediate = value,
            Flag::ChangelogStdin => self.changelog_stdin = value,
            _ => {}
        }
    }
}

fn require_value(next: Option<&str>, flag: &str) -> Result<String> {
    match next {
        Some(value) if !value.starts_with('-') => Ok(value.to_string()),
        _ => Err(FaynoError::MissingValue {
            flag: flag.to_string(),
        }),
    }
}

/// A standalone boolean flag is `true`; otherwise the next token is the literal.
fn bool_value(next: Option<&str>, flag: &str) -> Result<(bool, usize)> {
    match next {
        Some(value) if !value.starts_with('-') => Ok((parse_bool(value, flag)?, 1)),
        _ => Ok((true, 0)),
    }
}

fn parse_bool(raw: &str, flag: &str) -> Result<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(FaynoError::InvalidBool {
            flag: flag.to_string(),
            value: raw.to_string(),
        }),
    }
}
