// ABOUTME: CLI shell command - interactive loop over stdin with the edit/save step for touch and nano
//
// Edits go through a temp file opened in the resolved editor. Without an
// editor, replacement content is read from stdin until a line holding a
// single `.`.

use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use super::{util, OutputFormat, ShellArgs};
use repoterm::config::AppConfig;
use repoterm::editors::{editor_command_to_name, resolve_editor};
use repoterm::interpreter::CommandInterpreter;
use repoterm::models::EditRequest;
use repoterm::session::Session;

type InputLines = Lines<BufReader<Stdin>>;

pub async fn execute(args: ShellArgs, format: OutputFormat) -> Result<()> {
    let (config, mut session) = util::open_session(&args.repo, args.token.as_deref()).await?;
    let interpreter = CommandInterpreter::new(&config);

    println!(
        "Connected to {} ({})",
        session.binding().remote,
        session.binding().local_root.display()
    );
    println!("Commands: pip install, touch, nano, python, ls, cat, rm, mkdir. Type 'history' or 'exit'.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("$ ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            "history" => {
                print_history(&session, format)?;
                continue;
            }
            _ => {}
        }

        let result = interpreter.execute(&mut session, line).await;
        print_block(&result.render());

        if let Some(edit) = result.edit {
            match edit_content(&config, &edit, &mut lines).await? {
                Some(content) => {
                    let saved = interpreter.commit_edit(&mut session, &edit.path, &content).await;
                    print_block(&saved.render());
                }
                None => println!("{} unchanged, nothing saved", edit.path),
            }
        }
    }

    info!(session_id = %session.id(), commands = session.history().len(), "Shell closed");
    Ok(())
}

fn print_block(text: &str) {
    if !text.is_empty() {
        println!("{}", text);
    }
}

fn print_history(session: &Session, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for entry in session.history() {
                println!("{}", entry.transcript());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(session.history())?),
    }
    Ok(())
}

/// Run the edit step. Returns `None` when the content was left unchanged.
async fn edit_content(
    config: &AppConfig,
    edit: &EditRequest,
    lines: &mut InputLines,
) -> Result<Option<String>> {
    let edited = match resolve_editor(config.ui.editor.as_deref()) {
        Some(editor) => match edit_in_editor(&editor, edit).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Editor failed, falling back to stdin: {:#}", e);
                println!("Editor unavailable ({}), enter content instead.", e);
                read_until_dot(edit, lines).await?
            }
        },
        None => read_until_dot(edit, lines).await?,
    };

    Ok((edited != edit.content).then_some(edited))
}

async fn edit_in_editor(editor: &str, edit: &EditRequest) -> Result<String> {
    let mut parts = editor.split_whitespace();
    let program = parts.next().context("Empty editor command")?;
    let name = editor_command_to_name(program).unwrap_or(program);

    // Keep the extension so the editor can pick a syntax mode
    let suffix = std::path::Path::new(&edit.path)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut staged = tempfile::Builder::new()
        .prefix("repoterm-")
        .suffix(&suffix)
        .tempfile()
        .context("Failed to create temp file for editing")?;
    staged.write_all(edit.content.as_bytes())?;
    staged.flush()?;

    println!("Opening {} in {}...", edit.path, name);
    let status = tokio::process::Command::new(program)
        .args(parts)
        .arg(staged.path())
        .status()
        .await
        .with_context(|| format!("Failed to launch {}", program))?;
    if !status.success() {
        anyhow::bail!("{} exited with {}", name, status);
    }

    std::fs::read_to_string(staged.path()).context("Failed to read edited content")
}

async fn read_until_dot(edit: &EditRequest, lines: &mut InputLines) -> Result<String> {
    if !edit.content.is_empty() {
        println!("--- current content of {} ---", edit.path);
        print!("{}", edit.content);
        if !edit.content.ends_with('\n') {
            println!();
        }
        println!("---");
    }
    println!("Enter new content for {}, end with a line containing only '.':", edit.path);

    let mut content = String::new();
    while let Some(line) = lines.next_line().await? {
        if line == "." {
            return Ok(content);
        }
        content.push_str(&line);
        content.push('\n');
    }
    // Input closed before the terminator: keep what was typed
    Ok(content)
}
