//! Test playground built on `/bin/sh`
//!
//! The engine is a shell one-liner that drops the package clause: in run
//! mode the rest of the source is executed as a shell script, in build mode
//! it is printed back unchanged as the artifact. The formatter squeezes runs
//! of spaces.

use joyplay_sandbox::{PlaygroundService, ProcessRuntime, SandboxConfig};
use joyplay_server::{start_server, Playground};
use joyplay_store::SnippetStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub fn sh_sandbox(deadline: Duration) -> SandboxConfig {
    SandboxConfig::default()
        .with_engine(
            "/bin/sh",
            vec!["-c".into(), "tail -n +2 \"$1\" | sh".into(), "engine".into()],
        )
        .with_build_args(vec!["-c".into(), "tail -n +2 \"$1\"".into(), "engine".into()])
        .with_formatter(
            "/bin/sh",
            vec!["-c".into(), "tr -s ' ' < \"$1\"".into(), "fmt".into()],
        )
        .with_deadline(deadline)
        .with_env("PATH", "/usr/bin:/bin")
}

pub fn playground(store: SnippetStore, deadline: Duration) -> Arc<Playground> {
    let service = PlaygroundService::new(ProcessRuntime::new(), sh_sandbox(deadline));
    Arc::new(Playground::new(service, store))
}

/// Serve `playground` on an ephemeral port; returns its base URL
pub async fn serve(playground: Arc<Playground>) -> (String, JoinHandle<anyhow::Result<()>>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let url = format!("http://{}", listener.local_addr().expect("local addr"));
    (url, tokio::spawn(start_server(listener, playground)))
}

/// Program text: package clause, then shell lines
pub fn program(lines: &[&str]) -> String {
    let mut source = String::from("package main\n");
    for line in lines {
        source.push_str(line);
        source.push('\n');
    }
    source
}
