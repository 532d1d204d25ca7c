use crate::types::ExecutionResult;
use std::{
    io::Read,
    process::{Command, Stdio},
    thread,
};

/// Runs a command string and reports how it went.
pub trait Runner {
    fn run(&self, command: &str) -> ExecutionResult;
}

/// Hands the whole command string to `sh -c`, so pipes and other shell
/// operators work as typed.
pub struct ShellExecutor {
    pub max_output_lines: usize,
}

impl ShellExecutor {
    pub fn new(max_output_lines: usize) -> Self {
        Self { max_output_lines }
    }
}

impl Runner for ShellExecutor {
    fn run(&self, command: &str) -> ExecutionResult {
        tracing::debug!(%command, "executing");

        let mut child = match Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return ExecutionResult::failed(format!("failed to start shell: {e}")),
        };

        let stdout = child.stdout.take().map(read_lines);
        let stderr = child.stderr.take().map(read_lines);

        let status = match child.wait() {
            Ok(status) => status,
            Err(e) => return ExecutionResult::failed(format!("failed to wait for command: {e}")),
        };

        let stdout_lines = stdout.map(join_reader).unwrap_or_default();
        let stderr_lines = stderr.map(join_reader).unwrap_or_default();

        let output = non_empty(truncate_lines(&stdout_lines, self.max_output_lines));
        let stderr_text = non_empty(truncate_lines(&stderr_lines, self.max_output_lines));

        if status.success() {
            ExecutionResult {
                success: true,
                output,
                error: stderr_text,
            }
        } else {
            let error = stderr_text.unwrap_or_else(|| match status.code() {
                Some(code) => format!("command exited with status {code}"),
                None => "command was terminated by a signal".to_string(),
            });
            ExecutionResult {
                success: false,
                output,
                error: Some(error),
            }
        }
    }
}

/// Drains the stream to EOF so the child never blocks or hits a closed pipe.
/// Bytes that are not UTF-8 are decoded lossily.
fn read_lines<R: Read + Send + 'static>(mut stream: R) -> thread::JoinHandle<Vec<String>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = stream.read_to_end(&mut buf) {
            tracing::warn!("failed to read command output: {e}");
        }
        String::from_utf8_lossy(&buf)
            .lines()
            .map(String::from)
            .collect()
    })
}

fn join_reader(handle: thread::JoinHandle<Vec<String>>) -> Vec<String> {
    handle.join().unwrap_or_default()
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Keeps the head and tail of long output with a marker in between.
fn truncate_lines(lines: &[String], max_lines: usize) -> String {
    if max_lines == 0 || lines.len() <= max_lines {
        return lines.join("\n");
    }

    let head = max_lines / 2;
    let tail = max_lines - head;
    let mut kept: Vec<String> = lines[..head].to_vec();
    kept.push(format!(
        "... [{} lines truncated] ...",
        lines.len() - max_lines
    ));
    kept.extend_from_slice(&lines[lines.len() - tail..]);
    kept.join("\n")
}
