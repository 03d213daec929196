// Helper functions shared by engines and the updater

use regex::Regex;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};

use super::models::ExtractionOutput;

/// Python interpreter used for `-m yt_dlp` and `-m pip`.
///
/// Override with YTDLP_PYTHON (e.g. a venv interpreter).
pub fn python_cmd() -> String {
    std::env::var("YTDLP_PYTHON").unwrap_or_else(|_| "python3".to_string())
}

/// Find yt-dlp executable in common paths
pub fn find_ytdlp() -> String {
    let common_paths = [
        "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
        "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac / pip
        "/usr/bin/yt-dlp",          // System installation
    ];

    for path in common_paths {
        if std::path::Path::new(path).exists() {
            return path.to_string();
        }
    }

    if let Ok(output) = std::process::Command::new("which").arg("yt-dlp").output() {
        if output.status.success() {
            let trimmed = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !trimmed.is_empty() {
                return trimmed;
            }
        }
    }

    "yt-dlp".to_string()
}

/// Run command to completion, capturing stdout and stderr
pub async fn run_output(program: &str, args: &[String]) -> Result<std::process::Output, String> {
    TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| format!("Failed to start {}: {}", program, e))
}

/// Run command with timeout; the child is killed when the timeout fires
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, String> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to start {}: {}", program, e))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| format!("Failed to capture stdout from {}", program))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| format!("Failed to capture stderr from {}", program))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|e| format!("Failed to read stdout: {}", e))?;
        Ok::<Vec<u8>, String>(buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|e| format!("Failed to read stderr: {}", e))?;
        Ok::<Vec<u8>, String>(buf)
    });

    match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(status_res) => {
            let status = status_res.map_err(|e| format!("Failed to wait for {}: {}", program, e))?;
            let stdout = stdout_task
                .await
                .map_err(|e| format!("stdout task failed: {}", e))??;
            let stderr = stderr_task
                .await
                .map_err(|e| format!("stderr task failed: {}", e))??;
            Ok(std::process::Output { status, stdout, stderr })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(format!("Timed out after {}s", timeout_secs))
        }
    }
}

/// stdout followed by stderr, lossily decoded
pub fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (false, false) => format!("{}\n{}", stdout.trim_end(), stderr.trim_end()),
        (false, true) => stdout.trim_end().to_string(),
        (true, false) => stderr.trim_end().to_string(),
        (true, true) => String::new(),
    }
}

/// Pull the final file path out of yt-dlp's log lines.
///
/// Later lines win, so a merge or recode target replaces the first
/// `Destination:` of an intermediate stream.
pub fn parse_engine_output(stdout: &str) -> ExtractionOutput {
    lazy_static::lazy_static! {
        static ref DEST_RE: Regex = Regex::new(r"^\[(?:download|ExtractAudio|VideoConvertor)\]\s+Destination:\s+(.+)$").unwrap();
        static ref MERGE_RE: Regex = Regex::new(r#"^\[Merger\]\s+Merging formats into\s+"(.+)"$"#).unwrap();
        static ref ALREADY_RE: Regex = Regex::new(r"^\[download\]\s+(.+?)\s+has already been downloaded").unwrap();
        static ref ARCHIVE_RE: Regex = Regex::new(r"has already been recorded in the archive").unwrap();
    }

    let mut output = ExtractionOutput::default();

    for line in stdout.lines().map(str::trim_end) {
        if let Some(caps) = MERGE_RE.captures(line) {
            output.destination = Some(caps[1].to_string());
        } else if let Some(caps) = DEST_RE.captures(line) {
            output.destination = Some(caps[1].to_string());
        } else if let Some(caps) = ALREADY_RE.captures(line) {
            output.destination = Some(caps[1].to_string());
        } else if ARCHIVE_RE.is_match(line) {
            output.already_archived = true;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_merged_destination() {
        let log = "\
[youtube] Extracting URL: https://www.youtube.com/watch?v=abc123
[download] Destination: /youtube-dl/static/abc123.f137.mp4
[download] 100% of   10.00MiB in 00:00:02 at 4.50MiB/s
[download] Destination: /youtube-dl/static/abc123.f140.m4a
[Merger] Merging formats into \"/youtube-dl/static/abc123.mp4\"
Deleting original file /youtube-dl/static/abc123.f137.mp4 (pass -k to keep)
";
        let out = parse_engine_output(log);
        assert_eq!(out.destination.as_deref(), Some("/youtube-dl/static/abc123.mp4"));
        assert!(!out.already_archived);
    }

    #[test]
    fn test_parse_already_downloaded_and_archived() {
        let out = parse_engine_output(
            "[download] /youtube-dl/static/abc123.webm has already been downloaded\n",
        );
        assert_eq!(out.destination.as_deref(), Some("/youtube-dl/static/abc123.webm"));

        let out = parse_engine_output("[download] abc123: has already been recorded in the archive\n");
        assert!(out.already_archived);
        assert!(out.destination.is_none());
    }

    #[test]
    fn test_parse_audio_extraction_destination() {
        let log = "\
[download] Destination: /out/abc123.webm
[ExtractAudio] Destination: /out/abc123.mp3
";
        let out = parse_engine_output(log);
        assert_eq!(out.destination.as_deref(), Some("/out/abc123.mp3"));
    }

    #[tokio::test]
    async fn test_run_output_missing_program() {
        let err = run_output("definitely-not-a-real-program-xyz", &[]).await.unwrap_err();
        assert!(err.contains("Failed to start"));
    }
}
