// ABOUTME: CLI exec command - run one command line against a repository and print the result

use anyhow::Result;
use serde::Serialize;

use super::{util, ExecArgs, OutputFormat};
use repoterm::interpreter::CommandInterpreter;
use repoterm::models::CommandResult;

#[derive(Serialize)]
struct ExecReport<'a> {
    repository: String,
    command: String,
    #[serde(flatten)]
    result: &'a CommandResult,
}

/// Returns whether the command succeeded
pub async fn execute(args: ExecArgs, format: OutputFormat) -> Result<bool> {
    let (config, mut session) = util::open_session(&args.repo, args.token.as_deref()).await?;
    let interpreter = CommandInterpreter::new(&config);

    let line = args.line.join(" ");
    let result = interpreter.execute(&mut session, &line).await;

    match format {
        OutputFormat::Text => {
            let rendered = result.render();
            if !rendered.is_empty() {
                println!("{}", rendered);
            }
            if let Some(edit) = &result.edit {
                eprintln!("Use 'repoterm shell {}' to edit {} interactively.", args.repo, edit.path);
            }
        }
        OutputFormat::Json => {
            let report = ExecReport {
                repository: session.binding().remote.full_name(),
                command: line,
                result: &result,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(result.succeeded)
}
