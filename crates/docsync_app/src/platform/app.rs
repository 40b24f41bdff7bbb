use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use docsync_core::{AppState, Detail, DocumentId, FileCandidate, SubmitError};
use docsync_engine::{Coordinator, EngineConfig, ServiceSettings};
use docsync_logging::{sync_info, sync_warn};

use super::{persistence, render};
use crate::{Cli, Command};

pub(crate) async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = ServiceSettings {
        base_url: cli.api_url.clone(),
        poll_interval: Duration::from_secs(cli.poll_secs.max(1)),
        ..ServiceSettings::default()
    };
    // Long enough for one request to time out and report back.
    let wait = settings.request_timeout + Duration::from_secs(5);
    let mut coordinator = Coordinator::connect(EngineConfig::new(settings))
        .with_context(|| format!("Cannot use {} as the document service", cli.api_url))?;
    sync_info!("docsync using {}", cli.api_url);

    match cli.command {
        Command::List => {
            load_list(&mut coordinator, wait).await?;
            print_lines(render::render(&coordinator.view()));
        }
        Command::Upload { files, wait: follow } => {
            upload(&mut coordinator, files, follow, wait).await?;
        }
        Command::Watch => watch(&mut coordinator).await?,
        Command::Show { id } => {
            let id = match id {
                Some(id) => DocumentId::new(id),
                None => persistence::load_last_selected(&cli.state_dir)
                    .context("No document id given and none shown before")?,
            };
            show(&mut coordinator, &id, wait).await?;
            if let Err(err) = persistence::save_last_selected(&cli.state_dir, Some(&id)) {
                sync_warn!("Could not remember selection: {}", err);
            }
        }
        Command::Delete { id, yes } => {
            let id = DocumentId::new(id);
            if delete(&mut coordinator, &id, yes, wait).await?
                && persistence::load_last_selected(&cli.state_dir).as_ref() == Some(&id)
            {
                if let Err(err) = persistence::save_last_selected(&cli.state_dir, None) {
                    sync_warn!("Could not forget selection: {}", err);
                }
            }
        }
    }

    coordinator.stop();
    Ok(())
}

async fn load_list(coordinator: &mut Coordinator, wait: Duration) -> anyhow::Result<()> {
    coordinator.refresh();
    if !next_within(coordinator, wait).await? {
        bail!("Document list request was dropped");
    }
    let view = coordinator.view();
    if let Some(notice) = view.notices.first() {
        bail!("{notice}");
    }
    sync_info!("Loaded {} documents", view.documents.len());
    Ok(())
}

async fn upload(
    coordinator: &mut Coordinator,
    paths: Vec<PathBuf>,
    follow: bool,
    wait: Duration,
) -> anyhow::Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let meta = std::fs::metadata(&path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        files.push(FileCandidate::new(path, meta.len()));
    }

    let report = match coordinator.submit(files) {
        Ok(report) => report,
        Err(SubmitError::NoValidFiles { rejected }) => {
            let names: Vec<_> = rejected.into_iter().map(|invalid| invalid.name).collect();
            bail!("No PDF files to upload (skipped: {})", names.join(", "));
        }
    };
    print_lines(render::render_submit(&report));

    let uploads_done = |state: &AppState| state.uploads().next().is_none();
    while !uploads_done(coordinator.state()) {
        if !next_within(coordinator, wait).await? {
            bail!("Upload requests were dropped");
        }
        if coordinator.consume_dirty() {
            for row in coordinator.view().uploads {
                println!("{} {:>3}%", row.name, row.percent);
            }
        }
    }

    if follow {
        coordinator.start();
        let idle = |state: &AppState| state.polls().is_empty();
        while !idle(coordinator.state()) {
            if !coordinator.next().await {
                break;
            }
            if coordinator.consume_dirty() {
                print_lines(render::render(&coordinator.view()));
            }
        }
    }

    let view = coordinator.view();
    print_lines(render::render(&view));
    if let Some(notice) = view.notices.first() {
        bail!("{notice}");
    }
    Ok(())
}

async fn watch(coordinator: &mut Coordinator) -> anyhow::Result<()> {
    coordinator.start();
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Cannot listen for Ctrl-C")?;
                break;
            }
            alive = coordinator.next() => {
                if !alive {
                    break;
                }
                if coordinator.consume_dirty() {
                    print_lines(render::render(&coordinator.view()));
                    coordinator.dismiss_notices();
                }
            }
        }
    }
    sync_info!("Watch interrupted");
    Ok(())
}

async fn show(
    coordinator: &mut Coordinator,
    id: &DocumentId,
    wait: Duration,
) -> anyhow::Result<()> {
    load_list(coordinator, wait).await?;
    if !coordinator.state().registry().contains(id) {
        bail!("No document with id {id}");
    }
    coordinator.select(id.clone());
    let loaded = coordinator
        .run_until(wait, |state| {
            !matches!(state.selection().detail(), Some(Detail::Loading))
        })
        .await;
    if !loaded {
        sync_warn!("Processed text for {} did not arrive in time", id);
    }
    if let Some(selected) = coordinator.view().selected {
        print_lines(render::render_selected(&selected));
    }
    Ok(())
}

/// Returns whether the document was deleted.
async fn delete(
    coordinator: &mut Coordinator,
    id: &DocumentId,
    yes: bool,
    wait: Duration,
) -> anyhow::Result<bool> {
    load_list(coordinator, wait).await?;
    let Some(doc) = coordinator.state().registry().get(id).cloned() else {
        bail!("No document with id {id}");
    };
    if !yes && !confirm(&format!("Delete {} ({})?", doc.name, id))? {
        println!("Kept {}", doc.name);
        return Ok(false);
    }

    coordinator.delete(id.clone());
    let settled = coordinator
        .run_until(wait, |state| {
            !state.registry().contains(id) || !state.notices().is_empty()
        })
        .await;
    if !settled {
        bail!("Timed out deleting {id}");
    }
    if let Some(notice) = coordinator.view().notices.first() {
        bail!("{notice}");
    }
    println!("Deleted {}", doc.name);
    Ok(true)
}

/// Applies the next message, failing if none arrives within `wait`.
async fn next_within(coordinator: &mut Coordinator, wait: Duration) -> anyhow::Result<bool> {
    tokio::time::timeout(wait, coordinator.next())
        .await
        .context("Timed out waiting for the document service")
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    use std::io::Write;

    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("Cannot read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}
