//! Feeds a JSON-lines stream of host events to a batch context.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use extrafiles_core::{BatchReport, ExtraFiles, FileTransfer, HostEvent};

/// Reads one [`HostEvent`] per line until a `cli_exit` event or end of
/// input, then runs the exit pass. Blank lines are ignored.
pub async fn replay<R, T>(reader: R, mut extrafiles: ExtraFiles<T>) -> Result<BatchReport>
where
    R: AsyncBufRead + Unpin,
    T: FileTransfer,
{
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read event")? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: HostEvent = serde_json::from_str(line)
            .with_context(|| format!("Invalid event on line {}", line_no))?;
        debug!("Event {}: {:?}", line_no, event);

        if extrafiles.handle(event) {
            info!("Host run ended after {} events", line_no);
            return Ok(extrafiles.finish().await);
        }
    }

    info!("Event stream closed without cli_exit, finishing run");
    Ok(extrafiles.finish().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use extrafiles_core::testing::{fixtures::populate, MockTransfer};
    use extrafiles_core::{load_config_from_str, TransferKind};
    use tempfile::TempDir;

    fn batch(transfer: &MockTransfer) -> ExtraFiles<MockTransfer> {
        let config = load_config_from_str("[patterns]\nlog = \"*.log\"\n").unwrap();
        ExtraFiles::with_transfer(&config, transfer.clone()).unwrap()
    }

    fn event_line(kind: &str, source: &std::path::Path, destination: &std::path::Path) -> String {
        serde_json::json!({
            "event": kind,
            "item": {"artist": "Artist", "album": "Album"},
            "source": source,
            "destination": destination,
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_replay_until_exit() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("in");
        populate(&source, &["01.mp3", "rip.log"]).unwrap();
        let out = temp.path().join("out");

        let input = format!(
            "{}\n\n{}\n{}\n{}\n",
            r#"{"event":"album_imported","album":{"albumartist":"Artist","album":"Album"}}"#,
            event_line("item_copied", &source.join("01.mp3"), &out.join("01.mp3")),
            r#"{"event":"cli_exit"}"#,
            event_line("item_moved", &source.join("01.mp3"), &out.join("01.mp3")),
        );

        let transfer = MockTransfer::new();
        let report = replay(input.as_bytes(), batch(&transfer)).await.unwrap();

        let recorded = transfer.recorded_transfers().await;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].kind, TransferKind::Copy);
        assert_eq!(recorded[0].to, out.join("rip.log"));
        assert_eq!(report.copy.placed, 1);
        assert_eq!(report.moved.total(), 0);
    }

    #[tokio::test]
    async fn test_replay_finishes_at_end_of_input() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("in");
        populate(&source, &["01.mp3", "rip.log"]).unwrap();
        let out = temp.path().join("out");

        let input = event_line("item_moved", &source.join("01.mp3"), &out.join("01.mp3"));

        let transfer = MockTransfer::new();
        let report = replay(input.as_bytes(), batch(&transfer)).await.unwrap();
        assert_eq!(report.moved.placed, 1);
    }

    #[tokio::test]
    async fn test_invalid_event_is_an_error() {
        let transfer = MockTransfer::new();
        let err = replay("{\"event\":\"nope\"}\n".as_bytes(), batch(&transfer))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
