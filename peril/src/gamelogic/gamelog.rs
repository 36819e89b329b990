//! Append-only game log written by the server.

use std::io;
use std::path::Path;

use chrono::SecondsFormat;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::routing::GameLog;

/// Format one log line: `<RFC3339 time> <username>: <message>`.
pub fn format_log(log: &GameLog) -> String {
    format!(
        "{} {}: {}\n",
        log.current_time.to_rfc3339_opts(SecondsFormat::Secs, true),
        log.username,
        log.message
    )
}

/// Append `log` to the file at `path`, creating it if needed.
pub async fn write_log(path: &Path, log: &GameLog) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    file.write_all(format_log(log).as_bytes()).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn sample_log(message: &str) -> GameLog {
        GameLog {
            current_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            message: message.to_string(),
            username: "alice".to_string(),
        }
    }

    #[test]
    fn test_format_log() {
        let line = format_log(&sample_log("alice won a war against bob"));
        assert_eq!(line, "2024-03-01T12:30:00Z alice: alice won a war against bob\n");
    }

    #[tokio::test]
    async fn test_write_log_appends() {
        let path = std::env::temp_dir().join(format!("peril-gamelog-{}.log", std::process::id()));
        let _ = tokio::fs::remove_file(&path).await;

        write_log(&path, &sample_log("first")).await.unwrap();
        write_log(&path, &sample_log("second")).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("alice: first"));
        assert!(lines[1].ends_with("alice: second"));

        let _ = tokio::fs::remove_file(&path).await;
    }
}
