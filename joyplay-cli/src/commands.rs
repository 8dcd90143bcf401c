use anyhow::{bail, Context, Result};
use joyplay_sandbox::{CancellationToken, Event, EventKind, PlaygroundService, ProcessRuntime};
use joyplay_server::{start_server, watch_signals, AppConfig, Playground};
use joyplay_store::SnippetStore;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

pub async fn execute_serve(config: &AppConfig) -> Result<()> {
    let playground = Arc::new(Playground::from_config(config).await?);
    tokio::spawn(watch_signals(playground.shutdown_token().clone()));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;

    start_server(listener, playground).await
}

pub async fn execute_run(config: &AppConfig, file: &Path) -> Result<()> {
    let source = read_source(file).await?;
    let service = PlaygroundService::new(ProcessRuntime::new(), config.sandbox_config());

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(watch_signals(cancel.clone()));
    let response = service.compile(&source, &cancel).await;
    watcher.abort();

    let response = response?;
    if response.is_error() {
        bail!("{}", response.errors);
    }

    let events = response.events.unwrap_or_default();
    replay(&events, &mut tokio::io::stdout(), &mut tokio::io::stderr()).await?;
    Ok(())
}

pub async fn execute_fmt(config: &AppConfig, file: &Path, imports: bool) -> Result<()> {
    let source = read_source(file).await?;
    let service = PlaygroundService::new(ProcessRuntime::new(), config.sandbox_config());

    let response = service
        .format(&source, imports, &CancellationToken::new())
        .await?;
    if response.is_error() {
        bail!("{}", response.error);
    }

    let mut stdout = tokio::io::stdout();
    stdout.write_all(response.body.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

pub async fn execute_share(config: &AppConfig, file: &Path) -> Result<()> {
    let body = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let store = SnippetStore::from_config(&config.store).await?;
    if store.tier_names().first() == Some(&"memory") {
        warn!("No persistent snippet tier configured; the snippet will not outlive this process");
    }

    let id = store.store(&body).await?;
    info!(snippet_id = %id, "Shared snippet");
    println!("{}", id);
    Ok(())
}

pub async fn execute_get(config: &AppConfig, id: &str) -> Result<()> {
    let store = SnippetStore::from_config(&config.store).await?;
    let body = store.resolve(id).await?;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&body).await?;
    stdout.flush().await?;
    Ok(())
}

async fn read_source(file: &Path) -> Result<String> {
    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))
}

/// Write each event to its stream after waiting out its delay
async fn replay<O, E>(events: &[Event], stdout: &mut O, stderr: &mut E) -> std::io::Result<()>
where
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    for event in events {
        if !event.delay.is_zero() {
            tokio::time::sleep(event.delay).await;
        }
        match event.kind {
            EventKind::Stdout => {
                stdout.write_all(event.message.as_bytes()).await?;
                stdout.flush().await?;
            }
            EventKind::Stderr => {
                stderr.write_all(event.message.as_bytes()).await?;
                stderr.flush().await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_replay_routes_and_paces() {
        let events = vec![
            Event::new("out 1\n", EventKind::Stdout, Duration::ZERO),
            Event::new("err 1\n", EventKind::Stderr, Duration::from_millis(50)),
            Event::new("out 2\n", EventKind::Stdout, Duration::from_millis(50)),
        ];
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let started = Instant::now();
        replay(&events, &mut stdout, &mut stderr).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(String::from_utf8(stdout).unwrap(), "out 1\nout 2\n");
        assert_eq!(String::from_utf8(stderr).unwrap(), "err 1\n");
    }

    #[tokio::test]
    async fn test_missing_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_source(&dir.path().join("absent.go")).await.unwrap_err();
        assert!(err.to_string().contains("absent.go"));
    }
}
