// ABOUTME: Command-line parsing - whitespace split into a typed Command
//
// No quoting or escaping: a filename containing spaces is cut at the first
// space and the remaining words are ignored.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("No command given")]
    Empty,
    #[error("Command not supported: {0}")]
    Unsupported(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `pip install <pkg> [<pkg>...]`
    PipInstall { packages: Vec<String> },
    /// `touch <file>` and `nano <file>`
    Edit { path: String },
    Python { path: String },
    List { dir: Option<String> },
    Cat { path: String },
    Remove { path: String },
    MakeDir { path: String },
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(ParseError::Empty)?;
        let args: Vec<&str> = words.collect();

        let first = |usage: &'static str| {
            args.first()
                .map(|a| a.to_string())
                .ok_or(ParseError::Usage(usage))
        };

        match verb {
            "pip" => match args.first() {
                Some(&"install") if args.len() > 1 => Ok(Command::PipInstall {
                    packages: args[1..].iter().map(|p| p.to_string()).collect(),
                }),
                Some(&"install") | None => Err(ParseError::Usage("pip install <package> [<package>...]")),
                Some(_) => Err(ParseError::Unsupported(line.trim().to_string())),
            },
            "touch" => Ok(Command::Edit {
                path: first("touch <file>")?,
            }),
            "nano" => Ok(Command::Edit {
                path: first("nano <file>")?,
            }),
            "python" => Ok(Command::Python {
                path: first("python <file>")?,
            }),
            "ls" => Ok(Command::List {
                dir: args.first().map(|d| d.to_string()),
            }),
            "cat" => Ok(Command::Cat {
                path: first("cat <file>")?,
            }),
            "rm" => Ok(Command::Remove {
                path: first("rm <file>")?,
            }),
            "mkdir" => Ok(Command::MakeDir {
                path: first("mkdir <dir>")?,
            }),
            _ => Err(ParseError::Unsupported(line.trim().to_string())),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Command::PipInstall { .. } => "pip",
            Command::Edit { .. } => "edit",
            Command::Python { .. } => "python",
            Command::List { .. } => "ls",
            Command::Cat { .. } => "cat",
            Command::Remove { .. } => "rm",
            Command::MakeDir { .. } => "mkdir",
        }
    }

    /// Whether the command changes the workspace
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::PipInstall { .. } | Command::Edit { .. } | Command::Remove { .. } | Command::MakeDir { .. }
        )
    }
}
