//! CLI `edit` command — interactive notes editing through the autosave editor.
//!
//! Every stdin line is appended to the draft. Writes happen after the configured
//! quiet period, and the save status is echoed to stderr on each change.

use anyhow::{bail, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use citynotes::autosave::{NotesEditor, SaveStatus};
use citynotes::config::CityNotesConfig;

pub async fn edit(config: &CityNotesConfig, id: &str) -> Result<()> {
    let mut store = super::open_store(config)?;
    let mut editor = NotesEditor::new(config.autosave.policy());

    if !editor.open(&mut store, id) {
        bail!("{id} is not in your list; save it first");
    }

    eprintln!("Editing notes for {id}. Type lines to append; Ctrl-D to finish.");
    if let Some(draft) = editor.draft().filter(|d| !d.is_empty()) {
        println!("{draft}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_status = editor.status();

    loop {
        let wakeup = editor.next_wakeup().map(Instant::from_std);

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let mut text = editor.draft().unwrap_or_default().to_string();
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&line);
                editor.edit(text);
            }
            _ = sleep_until(wakeup) => {
                if editor.tick(&mut store).is_some() {
                    store.flush().await;
                }
            }
        }

        for advisory in store.drain_advisories() {
            super::report_advisory(&advisory);
        }

        let status = editor.status();
        if status != last_status {
            eprintln!("[{status}]");
            last_status = status;
        }
    }

    editor.close(&mut store);
    super::finish(&mut store).await?;
    eprintln!("[{}]", SaveStatus::Clean);
    Ok(())
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
