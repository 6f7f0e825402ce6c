// ABOUTME: Behavioral tests for the command set against a connected workspace
// Each test drives the interpreter the way a terminal user would

use anyhow::Result;
use pretty_assertions::assert_eq;

use repoterm::interpreter::CommandInterpreter;
use repoterm::models::CommandResult;
use repoterm::remote::memory::RemoteCall;

use super::fixtures::Connected;

fn interpreter(connected: &Connected) -> CommandInterpreter {
    CommandInterpreter::new(&connected.workspace.config)
}

/// `pip install requests` lands in the manifest locally and remotely
#[tokio::test]
async fn test_pip_install_updates_manifest_on_both_sides() -> Result<()> {
    let mut c = Connected::new().await?;
    let sh = interpreter(&c);

    let result = sh.execute(&mut c.session, "pip install requests").await;

    assert_eq!(result, CommandResult::success("Saved requests to requirements.txt"));
    assert_eq!(c.session.store().read("requirements.txt")?, b"requests\n");
    let remote = c.remote.content("requirements.txt").unwrap();
    assert!(remote.ends_with(b"requests\n"));
    Ok(())
}

/// Installing into a manifest the remote already has updates it in place
#[tokio::test]
async fn test_pip_install_appends_to_existing_remote_manifest() -> Result<()> {
    let mut c = Connected::new().await?;
    let sh = interpreter(&c);
    c.remote.put_external("requirements.txt", b"");

    sh.execute(&mut c.session, "pip install requests").await;
    sh.execute(&mut c.session, "pip install flask").await;

    assert_eq!(c.remote.content("requirements.txt").unwrap(), b"requests\nflask\n");
    assert!(c
        .remote
        .calls()
        .iter()
        .all(|call| !matches!(call, RemoteCall::Create(_))));
    Ok(())
}

/// `ls` on a fresh workspace shows only the manifest
#[tokio::test]
async fn test_ls_on_empty_workspace_shows_manifest_only() -> Result<()> {
    let source = super::fixtures::TestRepo::empty()?;
    let workspace = super::fixtures::Workspace::new()?;
    let remote = std::sync::Arc::new(repoterm::remote::MemoryRemote::new());
    let mut session = super::fixtures::connect_local(&workspace, &source, remote).await?;

    let result = CommandInterpreter::new(&workspace.config)
        .execute(&mut session, "ls")
        .await;

    assert!(result.succeeded);
    assert_eq!(result.output.lines().collect::<Vec<_>>(), vec!["requirements.txt"]);
    Ok(())
}

/// `ls` reflects clone contents plus new files, in any order
#[tokio::test]
async fn test_ls_lists_top_level_entries() -> Result<()> {
    let mut c = Connected::new().await?;
    let sh = interpreter(&c);
    sh.execute(&mut c.session, "mkdir data").await;
    let edit = sh.execute(&mut c.session, "touch src/app.py").await;
    assert!(edit.succeeded);

    let result = sh.execute(&mut c.session, "ls").await;
    let mut names: Vec<&str> = result.output.lines().collect();
    names.sort_unstable();
    assert_eq!(names, vec!["README.md", "data", "requirements.txt", "src"]);

    let nested = sh.execute(&mut c.session, "ls src").await;
    assert_eq!(nested.output, "app.py");
    Ok(())
}

/// `mkdir` twice succeeds both times and leaves one directory
#[tokio::test]
async fn test_mkdir_is_idempotent() -> Result<()> {
    let mut c = Connected::new().await?;
    let sh = interpreter(&c);

    let first = sh.execute(&mut c.session, "mkdir data").await;
    let second = sh.execute(&mut c.session, "mkdir data").await;

    assert!(first.succeeded && second.succeeded);
    let root = &c.session.binding().local_root;
    assert!(root.join("data").is_dir());
    let count = std::fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name() == "data")
        .count();
    assert_eq!(count, 1);
    assert!(c.remote.calls().is_empty());
    Ok(())
}

/// touch, save, then cat returns exactly the saved content
#[tokio::test]
async fn test_touch_save_cat_round_trip() -> Result<()> {
    let mut c = Connected::new().await?;
    let sh = interpreter(&c);
    let content = "import sys\nprint(sys.argv)\n";

    let opened = sh.execute(&mut c.session, "touch hello.py").await;
    let edit = opened.edit.expect("touch should request an edit");
    assert_eq!(edit.content, "");

    let saved = sh.commit_edit(&mut c.session, &edit.path, content).await;
    assert!(saved.succeeded, "{}", saved.render());

    let cat = sh.execute(&mut c.session, "cat hello.py").await;
    assert_eq!(cat.output, content);
    assert_eq!(c.remote.content("hello.py").unwrap(), content.as_bytes());
    Ok(())
}

/// nano on a cloned file presents its committed content
#[tokio::test]
async fn test_nano_presents_existing_content() -> Result<()> {
    let mut c = Connected::new().await?;
    let sh = interpreter(&c);

    let opened = sh.execute(&mut c.session, "nano README.md").await;
    assert_eq!(opened.output, "Editing README.md");
    assert_eq!(opened.edit.unwrap().content, "# Test Repo\n");
    Ok(())
}

/// rm of a file absent everywhere reports NotFound and never calls the remote
#[tokio::test]
async fn test_rm_absent_file_is_not_found_without_remote_calls() -> Result<()> {
    let mut c = Connected::new().await?;
    let sh = interpreter(&c);

    let result = sh.execute(&mut c.session, "rm ghost.txt").await;

    assert_eq!(result, CommandResult::failure("File ghost.txt does not exist"));
    assert!(c.remote.calls().is_empty());
    Ok(())
}

/// rm removes the local file and the remote object
#[tokio::test]
async fn test_rm_removes_both_sides() -> Result<()> {
    let mut c = Connected::new().await?;
    let sh = interpreter(&c);
    let edit = sh.begin_edit(&mut c.session, "tmp.py")?;
    sh.commit_edit(&mut c.session, &edit.path, "x = 1\n").await;

    let result = sh.execute(&mut c.session, "rm tmp.py").await;

    assert_eq!(result, CommandResult::success("tmp.py deleted"));
    assert!(!c.session.store().exists("tmp.py")?);
    assert!(c.remote.content("tmp.py").is_none());
    assert!(c.session.sync().tracked("tmp.py").is_none());
    Ok(())
}

/// Clone metadata is off limits to every command
#[tokio::test]
async fn test_git_metadata_is_not_reachable() -> Result<()> {
    let mut c = Connected::new().await?;
    let sh = interpreter(&c);

    for line in ["cat .git/config", "rm .git/HEAD", "touch .git/hooks/pre-commit", "python .git/x.py", "ls .git"] {
        let result = sh.execute(&mut c.session, line).await;
        assert!(!result.succeeded, "{line} should fail");
        assert!(result.output.contains("outside the workspace"), "{line}: {}", result.output);
    }

    assert!(c.remote.calls().is_empty());
    assert!(c.session.binding().local_root.join(".git").join("HEAD").is_file());
    Ok(())
}

/// python on a missing file fails without launching anything
#[tokio::test]
async fn test_python_missing_file() -> Result<()> {
    let mut c = Connected::new().await?;
    let mut config = c.workspace.config.clone();
    // Launching this would fail differently, proving no launch happens
    config.exec.interpreter = "repoterm-no-such-interpreter".to_string();
    let sh = CommandInterpreter::new(&config);

    let result = sh.execute(&mut c.session, "python missing.py").await;

    assert!(!result.succeeded);
    assert_eq!(result.output, "File missing.py does not exist");
    Ok(())
}

/// A script that cannot be launched is reported, and the session carries on
#[tokio::test]
async fn test_python_launch_failure_is_reported() -> Result<()> {
    let mut c = Connected::new().await?;
    let mut config = c.workspace.config.clone();
    config.exec.interpreter = "repoterm-no-such-interpreter".to_string();
    let sh = CommandInterpreter::new(&config);
    c.session.store().write("main.py", b"print(1)\n")?;

    let result = sh.execute(&mut c.session, "python main.py").await;
    assert!(!result.succeeded);
    assert!(result.output.contains("Failed to launch repoterm-no-such-interpreter"));

    let next = sh.execute(&mut c.session, "cat main.py").await;
    assert!(next.succeeded);
    Ok(())
}

/// Unsupported verbs and missing arguments change nothing
#[tokio::test]
async fn test_parse_errors_have_no_side_effects() -> Result<()> {
    let mut c = Connected::new().await?;
    let sh = interpreter(&c);

    for line in ["git status", "touch", "pip uninstall requests", "rm"] {
        let result = sh.execute(&mut c.session, line).await;
        assert!(!result.succeeded, "{line} should fail");
    }

    assert!(c.remote.calls().is_empty());
    assert_eq!(c.session.store().read("requirements.txt")?, b"");
    assert_eq!(c.session.history().len(), 4);
    Ok(())
}

/// History records every command and its result in order
#[tokio::test]
async fn test_history_is_append_only_and_ordered() -> Result<()> {
    let mut c = Connected::new().await?;
    let sh = interpreter(&c);

    sh.execute(&mut c.session, "mkdir data").await;
    sh.execute(&mut c.session, "cat nope.txt").await;
    let edit = sh.execute(&mut c.session, "touch a.txt").await.edit.unwrap();
    sh.commit_edit(&mut c.session, &edit.path, "hi\n").await;

    let transcript: Vec<String> = c.session.history().iter().map(|h| h.transcript()).collect();
    assert_eq!(
        transcript,
        vec![
            "$ mkdir data\nDirectory data created".to_string(),
            "$ cat nope.txt\nFile nope.txt does not exist".to_string(),
            "$ touch a.txt\nEditing a.txt".to_string(),
            "$ save a.txt\na.txt saved".to_string(),
        ]
    );
    Ok(())
}

/// Two sessions on different repositories do not see each other's files
#[tokio::test]
async fn test_sessions_are_independent() -> Result<()> {
    let mut a = Connected::new().await?;
    let mut b = Connected::new().await?;
    let sh = interpreter(&a);

    sh.execute(&mut a.session, "pip install requests").await;

    assert_eq!(b.session.store().read("requirements.txt")?, b"");
    let cat = sh.execute(&mut b.session, "cat requirements.txt").await;
    assert_eq!(cat.output, "");
    assert!(b.remote.calls().is_empty());
    assert_eq!(a.session.history().len(), 1);
    assert_eq!(b.session.history().len(), 1);
    Ok(())
}
