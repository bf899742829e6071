//! Account and note command handlers
//!
//! Each command signs in, waits for the first snapshot of the user's notes,
//! acts, and signs out again.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use tracing::debug;

use tidings_core::{
    AuthError, AuthService, BackendKind, Config, FirebaseBackend, FirebaseSettings,
    MemoryBackend, Note, NoteSync, Session, User,
};

use crate::output::Output;

/// Account credentials, from flags or the environment
#[derive(Args, Clone)]
pub struct Credentials {
    /// Account email
    #[arg(long, env = "TIDINGS_EMAIL")]
    pub email: Option<String>,

    /// Account password
    #[arg(long, env = "TIDINGS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl Credentials {
    fn require(&self) -> Result<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => bail!("Email and password required (--email/--password or TIDINGS_EMAIL/TIDINGS_PASSWORD)"),
        }
    }
}

/// A signed-in session with its first snapshot loaded
struct Connected {
    session: Session,
    user: User,
}

impl Connected {
    fn notes(&self) -> Vec<Note> {
        self.session.notes().notes()
    }

    async fn close(self) -> Result<()> {
        self.session.sign_out().await.context("Failed to sign out")
    }
}

/// Build the configured backend
fn backend(config: &Config) -> Result<(Arc<dyn AuthService>, Arc<NoteSync>)> {
    match config.backend {
        BackendKind::Memory => {
            let backend = MemoryBackend::new();
            let sync = Arc::new(NoteSync::new(Arc::new(backend.clone())));
            Ok((Arc::new(backend), sync))
        }
        BackendKind::Firebase => {
            let settings = FirebaseSettings::from_config(config)?;
            let backend = FirebaseBackend::new(settings)?;
            let sync = Arc::new(NoteSync::new(Arc::new(backend.clone())));
            Ok((Arc::new(backend), sync))
        }
    }
}

async fn connect(config: &Config, credentials: &Credentials) -> Result<Connected> {
    let (email, password) = credentials.require()?;
    let (auth, sync) = backend(config)?;

    if config.backend == BackendKind::Memory {
        // The in-process store starts empty every run
        debug!("Registering {} with the memory backend", email);
        match auth.sign_up(email, password).await {
            Ok(_) | Err(AuthError::EmailInUse(_)) => {}
            Err(e) => return Err(e.into()),
        }
        auth.sign_out().await?;
    }

    let session = Session::new(auth, Arc::clone(&sync));
    let mut notes_rx = sync.watch_notes();
    let user = session
        .sign_in(email, password)
        .await
        .context("Sign in failed")?;

    tokio::time::timeout(config.request_timeout(), notes_rx.changed())
        .await
        .context("Timed out waiting for notes")?
        .context("Note listener closed")?;

    Ok(Connected { session, user })
}

/// Create an account
pub async fn signup(config: &Config, credentials: &Credentials, output: &Output) -> Result<()> {
    let (email, password) = credentials.require()?;
    let (auth, sync) = backend(config)?;
    let session = Session::new(auth, sync);

    let user = session
        .sign_up(email, password)
        .await
        .context("Sign up failed")?;
    session.sign_out().await.context("Failed to sign out")?;

    output.success(&format!("Created account {}", user.email));
    Ok(())
}

/// List the signed-in user's notes
pub async fn list(config: &Config, credentials: &Credentials, output: &Output) -> Result<()> {
    let conn = connect(config, credentials).await?;
    output.print_notes(&conn.notes());
    conn.close().await
}

/// Add a note
pub async fn add(
    config: &Config,
    credentials: &Credentials,
    title: String,
    content: Option<String>,
    output: &Output,
) -> Result<()> {
    let conn = connect(config, credentials).await?;
    let result = conn
        .session
        .notes()
        .add_note(&conn.user, &title, content.as_deref().unwrap_or(""))
        .await;
    conn.close().await?;

    let id = result.context("Failed to add note")?;
    output.success(&format!("Added note {}", id));
    if output.is_quiet() {
        println!("{}", id);
    }
    Ok(())
}

/// Change a note's title and/or content
pub async fn edit(
    config: &Config,
    credentials: &Credentials,
    id: String,
    title: Option<String>,
    content: Option<String>,
    output: &Output,
) -> Result<()> {
    if title.is_none() && content.is_none() {
        bail!("Nothing to change. Pass --title and/or --content.");
    }

    let conn = connect(config, credentials).await?;
    let result = async {
        let mut note = find_note(&conn.notes(), &id)?;
        if let Some(title) = title {
            note.title = title;
        }
        if let Some(content) = content {
            note.content = content;
        }
        conn.session
            .notes()
            .update_note(&note)
            .await
            .context("Failed to update note")?;
        Ok::<_, anyhow::Error>(note)
    }
    .await;
    conn.close().await?;

    let note = result?;
    output.success(&format!("Updated note: {}", note.title));
    Ok(())
}

/// Delete a note
pub async fn delete(
    config: &Config,
    credentials: &Credentials,
    id: String,
    output: &Output,
) -> Result<()> {
    let conn = connect(config, credentials).await?;
    let result = async {
        let note = find_note(&conn.notes(), &id)?;
        conn.session
            .notes()
            .delete_note(&note)
            .await
            .context("Failed to delete note")?;
        Ok::<_, anyhow::Error>(note)
    }
    .await;
    conn.close().await?;

    let note = result?;
    output.success(&format!("Deleted note: {}", note.title));
    Ok(())
}

/// Print the note list every time it changes, until Ctrl-C
pub async fn watch(config: &Config, credentials: &Credentials, output: &Output) -> Result<()> {
    let conn = connect(config, credentials).await?;
    let mut rx = conn.session.notes().watch_notes();

    output.message(&format!("Watching notes for {} (Ctrl-C to stop)", conn.user.email));
    output.print_notes(&rx.borrow_and_update().clone());

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let notes = rx.borrow_and_update().clone();
                output.message("");
                output.print_notes(&notes);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    conn.close().await
}

/// Find a note by full ID or unique ID prefix
fn find_note(notes: &[Note], id: &str) -> Result<Note> {
    if let Some(note) = notes.iter().find(|n| n.id.as_deref() == Some(id)) {
        return Ok(note.clone());
    }

    let matches: Vec<_> = notes
        .iter()
        .filter(|n| n.id.as_deref().is_some_and(|nid| nid.starts_with(id)))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!("Note not found: {}", id)),
        [note] => Ok((*note).clone()),
        _ => bail!(
            "Ambiguous ID prefix '{}' matches {} notes. Use more characters.",
            id,
            matches.len()
        ),
    }
}
