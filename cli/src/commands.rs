//! One handler per subcommand.
//!
//! Handlers print their own output through [`crate::render`] and return
//! `anyhow::Result`; `main` reports whatever bubbles up. Interactive prompts
//! go to stderr so stdout stays clean for results.

use std::fs;
use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail, ensure};

use redink_api::ApiClient;
use redink_engine::{AnalysisController, AnalysisSnapshot, AnalysisTransport, Phase};
use redink_types::{
    AnalysisStatus, Credentials, NewWriting, WritingId, WritingPatch, WritingType,
};

use crate::render;
use crate::session::{self, StoredSession};

pub async fn signup(client: &ApiClient, email: String) -> Result<()> {
    let password = prompt_password("Password")?;
    let confirmed = prompt_password("Confirm password")?;
    ensure!(password == confirmed, "passwords do not match");

    let user = client
        .signup(&Credentials { email, password })
        .await?;
    println!(
        "Account created for {}. Sign in with `redink login {}`.",
        user.email, user.email
    );
    Ok(())
}

pub async fn login(client: &ApiClient, email: String) -> Result<()> {
    let password = prompt_password("Password")?;
    let auth = client.login(&Credentials { email, password }).await?;

    let stored = client
        .session()
        .map(|active| StoredSession::new(auth.user.email.clone(), &active))
        .context("login succeeded but no session was captured")?;
    session::save(&stored)?;

    println!("Signed in as {}.", auth.user.email);
    Ok(())
}

pub async fn logout(client: &ApiClient) -> Result<()> {
    if let Err(err) = client.logout().await {
        render::warn(&format!(
            "server sign-out failed ({err}); discarding the local session anyway"
        ));
    }
    session::delete()?;
    println!("Signed out.");
    Ok(())
}

pub async fn whoami(client: &ApiClient) -> Result<()> {
    let user = client.me().await?;
    println!("{} ({})", user.email, user.id);
    Ok(())
}

pub async fn list(client: &ApiClient, page: u32, limit: u32) -> Result<()> {
    let page = client.list_writings(page, limit).await?;
    render::print_writing_list(&page);
    Ok(())
}

pub async fn show(client: &ApiClient, id: WritingId) -> Result<()> {
    let writing = client.get_writing(id).await?;
    render::print_writing(&writing);
    Ok(())
}

pub async fn create(
    client: &ApiClient,
    kind: WritingType,
    title: String,
    content: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let content = match content_arg(content, file)? {
        Some(content) => content,
        None => read_stdin_content()?,
    };

    let new = NewWriting {
        kind,
        title,
        content,
    };
    new.validate()?;

    let writing = client.create_writing(&new).await?;
    println!("Created \"{}\" ({}).", writing.title, writing.id);
    Ok(())
}

pub async fn edit(
    client: &ApiClient,
    id: WritingId,
    kind: Option<WritingType>,
    title: Option<String>,
    content: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let patch = WritingPatch {
        kind,
        title,
        content: content_arg(content, file)?,
    };
    ensure!(
        !patch.is_empty(),
        "nothing to change; pass --title, --type, --content or --file"
    );
    patch.validate()?;

    let writing = client.update_writing(id, &patch).await?;
    println!("Updated \"{}\".", writing.title);
    Ok(())
}

pub async fn delete(client: &ApiClient, id: WritingId, yes: bool) -> Result<()> {
    let writing = client.get_writing(id).await?;
    if !yes && !confirm(&format!("Delete \"{}\"?", writing.title))? {
        println!("Aborted.");
        return Ok(());
    }
    client.delete_writing(id).await?;
    println!("Deleted \"{}\".", writing.title);
    Ok(())
}

pub async fn submit(client: &Arc<ApiClient>, id: WritingId, watch: bool, yes: bool) -> Result<()> {
    let writing = client.get_writing(id).await?;
    ensure!(
        writing.status.is_submittable(),
        "\"{}\" is {}; only drafts can be submitted",
        writing.title,
        writing.status
    );
    if !yes && !confirm(&format!("Submit \"{}\" for analysis?", writing.title))? {
        println!("Aborted.");
        return Ok(());
    }

    let controller = AnalysisController::new(Arc::clone(client));
    if !controller.submit_writing(id).await {
        let snapshot = controller.snapshot().await;
        if snapshot.is_rate_limited {
            let message = snapshot
                .error
                .unwrap_or_else(|| "the daily submission limit was reached".to_owned());
            render::warn(&message);
            process::exit(1);
        }
        bail!(snapshot.error.unwrap_or_else(|| "submission failed".to_owned()));
    }

    if watch {
        follow(&controller, None).await
    } else {
        controller.stop_polling().await;
        println!("Submitted. Check progress with `redink analysis {id}` or `redink watch {id}`.");
        Ok(())
    }
}

pub async fn watch(client: &Arc<ApiClient>, id: WritingId) -> Result<()> {
    let initial = match client.analysis_status(id).await {
        Ok(analysis) => Some(analysis),
        Err(err) if err.is_not_found() => None,
        Err(err) => return Err(err.into()),
    };

    match initial {
        None => {
            println!(
                "No analysis for this writing yet. Submit it first with `redink submit {id}`."
            );
            Ok(())
        }
        Some(analysis) if analysis.status.is_terminal() => {
            render::print_analysis(&analysis);
            Ok(())
        }
        Some(analysis) => {
            render::print_status(analysis.status);
            let controller = AnalysisController::new(Arc::clone(client));
            controller.start_polling(id).await;
            follow(&controller, Some(analysis.status)).await
        }
    }
}

pub async fn analysis(client: &ApiClient, id: WritingId) -> Result<()> {
    match client.analysis_status(id).await {
        Ok(analysis) => {
            render::print_analysis(&analysis);
            Ok(())
        }
        Err(err) if err.is_not_found() => {
            println!(
                "No analysis for this writing yet. Submit it first with `redink submit {id}`."
            );
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Mirror controller state to the terminal until polling ends or the user
/// interrupts. `last` seeds status-change detection so an already-printed
/// status is not repeated.
async fn follow<T>(
    controller: &AnalysisController<T>,
    mut last: Option<AnalysisStatus>,
) -> Result<()>
where
    T: AnalysisTransport,
{
    println!("Watching; press Ctrl-C to stop.");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("failed to listen for Ctrl-C")?;
                controller.dispose().await;
                println!("Stopped watching; the analysis keeps running server-side.");
                return Ok(());
            }
            () = tokio::time::sleep(Duration::from_millis(500)) => {
                let snapshot = controller.snapshot().await;
                if let Some(analysis) = &snapshot.current_analysis
                    && !analysis.status.is_terminal()
                    && last != Some(analysis.status)
                {
                    render::print_status(analysis.status);
                    last = Some(analysis.status);
                }
                if !snapshot.is_polling {
                    return report(&snapshot);
                }
            }
        }
    }
}

/// Final word once polling has stopped on its own.
fn report(snapshot: &AnalysisSnapshot) -> Result<()> {
    if snapshot.phase == Phase::Terminal {
        if let Some(analysis) = &snapshot.current_analysis {
            render::print_analysis(analysis);
        }
        return Ok(());
    }
    if let Some(error) = &snapshot.error {
        bail!("{error}");
    }
    // Polling ends without an error only when the session expired mid-watch.
    render::warn("the session expired; sign in with `redink login` and watch again");
    Ok(())
}

fn content_arg(content: Option<String>, file: Option<PathBuf>) -> Result<Option<String>> {
    match (content, file) {
        (Some(_), Some(_)) => bail!("pass either --content or --file, not both"),
        (Some(content), None) => Ok(Some(content)),
        (None, Some(path)) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Some(text))
        }
        (None, None) => Ok(None),
    }
}

fn read_stdin_content() -> Result<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        eprintln!("Reading content from stdin; finish with Ctrl-D.");
    }
    let mut content = String::new();
    stdin
        .read_to_string(&mut content)
        .context("failed to read content from stdin")?;
    ensure!(!content.trim().is_empty(), "content is empty");
    Ok(content)
}

/// Prompt on stderr, read one line from stdin. The terminal echo stays on.
fn prompt_password(prompt: &str) -> Result<String> {
    eprint!("{prompt}: ");
    io::stderr().flush().context("failed to flush stderr")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_owned();
    ensure!(!password.is_empty(), "password must not be empty");
    Ok(password)
}

fn confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    io::stderr().flush().context("failed to flush stderr")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read confirmation")?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes" | "Yes"))
}
