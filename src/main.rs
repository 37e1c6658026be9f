mod client;
mod fragment;
mod ipc;
mod registry;
mod reports;
mod roles;

use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::time::Duration;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("fatal: {e:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    // One writer drains replies and events; stdout stays a clean protocol
    // stream (diagnostics go to stderr via the logger).
    let (tx, rx) = mpsc::channel::<serde_json::Value>();
    let writer = std::thread::spawn(move || {
        let mut stdout = io::stdout();
        for msg in rx {
            let _ = writeln!(stdout, "{}", msg);
            let _ = stdout.flush();
        }
    });

    let mut state = ipc::AppState::new(rt.handle().clone(), tx.clone());

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply with an id; emit a bare error line.
                let _ = tx.send(serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                }));
                continue;
            }
        };

        let outcome = ipc::handle_request(&mut state, req);
        let _ = tx.send(outcome.reply);
        if let Some(job) = outcome.job {
            state.rt.spawn(job);
        }
    }

    // Let in-flight sync jobs drain before the stream closes.
    rt.shutdown_timeout(Duration::from_secs(2));
    drop(state);
    drop(tx);
    let _ = writer.join();
    Ok(())
}
