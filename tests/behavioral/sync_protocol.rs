// ABOUTME: Behavioral tests for the remote sync protocol - create vs update, conflicts, and deletes
// A racing remote advances a path's version between our fetch and our write

use anyhow::Result;
use std::sync::Arc;

use repoterm::interpreter::CommandInterpreter;
use repoterm::remote::memory::RemoteCall;
use repoterm::remote::{MemoryRemote, RemoteError, RemoteRepository, VersionTag};
use repoterm::sync::{DeleteOutcome, PushOutcome, SyncCoordinator};

use super::fixtures::{connect_local, TestRepo, Workspace};

/// Remote where another writer commits to a path right after every fetch of it
struct RacingRemote {
    inner: MemoryRemote,
}

#[async_trait::async_trait]
impl RemoteRepository for RacingRemote {
    async fn get_content(&self, path: &str) -> Result<(Vec<u8>, VersionTag), RemoteError> {
        let fetched = self.inner.get_content(path).await?;
        self.inner.put_external(path, b"written by someone else\n");
        Ok(fetched)
    }

    async fn create_file(&self, path: &str, content: &[u8], message: &str) -> Result<VersionTag, RemoteError> {
        self.inner.create_file(path, content, message).await
    }

    async fn update_file(
        &self,
        path: &str,
        content: &[u8],
        tag: &VersionTag,
        message: &str,
    ) -> Result<VersionTag, RemoteError> {
        self.inner.update_file(path, content, tag, message).await
    }

    async fn delete_file(&self, path: &str, tag: &VersionTag, message: &str) -> Result<(), RemoteError> {
        self.inner.delete_file(path, tag, message).await
    }
}

/// Any untracked path pushed through the coordinator reads back identically
#[tokio::test]
async fn test_push_then_get_returns_pushed_content() -> Result<()> {
    let remote = Arc::new(MemoryRemote::new());
    let mut sync = SyncCoordinator::new(remote.clone());

    for (path, content) in [
        ("a.txt", &b"alpha"[..]),
        ("nested/dir/b.py", &b"print('b')\n"[..]),
        ("empty.txt", &b""[..]),
        ("bin.dat", &[0u8, 159, 146, 150][..]),
    ] {
        assert!(sync.tracked(path).is_none());
        let outcome = sync.push(path, content, None).await?;
        assert!(matches!(outcome, PushOutcome::Created(_)));

        let (fetched, tag) = remote.get_content(path).await?;
        assert_eq!(fetched, content);
        assert_eq!(&tag, outcome.tag());
    }
    Ok(())
}

/// A version advanced between fetch and update surfaces as a conflict
#[tokio::test]
async fn test_stale_tag_update_is_conflict() -> Result<()> {
    let remote = MemoryRemote::new();
    let stale = remote.put_external("app.py", b"one");
    remote.put_external("app.py", b"two");

    let err = remote.update_file("app.py", b"mine", &stale, "Update app.py").await.unwrap_err();
    assert_eq!(err, RemoteError::Conflict("app.py".to_string()));
    Ok(())
}

/// A conflicting save keeps the local file exactly as written and warns
#[tokio::test]
async fn test_conflict_leaves_local_content_untouched() -> Result<()> {
    let source = TestRepo::new()?;
    let workspace = Workspace::new()?;
    let racing = Arc::new(RacingRemote {
        inner: MemoryRemote::new(),
    });
    racing.inner.put_external("app.py", b"original\n");
    let mut session = connect_local(&workspace, &source, racing.clone()).await?;
    let sh = CommandInterpreter::new(&workspace.config);

    let edit = sh.execute(&mut session, "nano app.py").await.edit.unwrap();
    let result = sh.commit_edit(&mut session, &edit.path, "mine\n").await;

    assert!(result.succeeded, "local save must stand");
    assert!(result.is_partial());
    assert!(result.warnings[0].contains("app.py"));
    assert_eq!(session.store().read("app.py")?, b"mine\n");
    assert_eq!(racing.inner.content("app.py").unwrap(), b"written by someone else\n");
    assert!(session.sync().tracked("app.py").unwrap().remote_version.is_none());
    Ok(())
}

/// Deleting a path the remote no longer has counts as done
#[tokio::test]
async fn test_remote_absent_delete_is_success() -> Result<()> {
    let mut c = super::fixtures::Connected::new().await?;
    let sh = CommandInterpreter::new(&c.workspace.config);
    let edit = sh.begin_edit(&mut c.session, "gone.py")?;
    sh.commit_edit(&mut c.session, &edit.path, "x\n").await;
    c.remote.remove_external("gone.py");
    c.remote.clear_calls();

    let result = sh.execute(&mut c.session, "rm gone.py").await;

    assert!(result.succeeded);
    assert!(result.warnings.is_empty());
    assert_eq!(c.remote.calls(), vec![RemoteCall::Get("gone.py".to_string())]);
    Ok(())
}

/// Offline remote: deletes and pushes are local-first with warnings
#[tokio::test]
async fn test_offline_mutations_are_partial_successes() -> Result<()> {
    let mut c = super::fixtures::Connected::new().await?;
    let sh = CommandInterpreter::new(&c.workspace.config);
    c.session.store().write("old.py", b"x")?;
    c.remote.set_offline(true);

    let pip = sh.execute(&mut c.session, "pip install requests").await;
    let rm = sh.execute(&mut c.session, "rm old.py").await;

    for result in [&pip, &rm] {
        assert!(result.succeeded);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.render().contains("warning: remote sync of"));
    }
    assert_eq!(c.session.store().read("requirements.txt")?, b"requests\n");
    assert!(!c.session.store().exists("old.py")?);
    Ok(())
}

/// The coordinator distinguishes already-absent from deleted
#[tokio::test]
async fn test_delete_outcomes() -> Result<()> {
    let remote = Arc::new(MemoryRemote::new());
    let mut sync = SyncCoordinator::new(remote.clone());
    remote.put_external("x.txt", b"x");

    assert_eq!(sync.delete("x.txt", None).await?, DeleteOutcome::Deleted);
    assert_eq!(sync.delete("x.txt", None).await?, DeleteOutcome::AlreadyAbsent);
    Ok(())
}
