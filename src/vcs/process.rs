use crate::boundary::BoundaryWarning;
use crate::ui::Logger;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

/// Default time a VCS command may run before it is killed
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs VCS command line tools with a bounded wait.
///
/// Failures never propagate: a command that cannot start, exits with a
/// non-zero status or runs out of time yields `None` and a diagnostic.
/// The timeout covers both the process and the draining of its output, so
/// a background process holding the pipes open cannot block the caller.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        ProcessRunner {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Output of one pipe reader thread
enum StreamOutput {
    Stdout(Vec<String>),
    Stderr(String),
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        ProcessRunner { timeout }
    }

    /// Run `program` in `dir` and return its standard output lines if it
    /// succeeded in time.
    pub fn run(
        &self,
        program: &str,
        args: &[&str],
        dir: &Path,
        logger: &dyn Logger,
    ) -> Option<Vec<String>> {
        let command_line = format!("{} {}", program, args.join(" "));
        logger.trace(&format!("Executing: {} (in {})", command_line, dir.display()));

        let started = Instant::now();
        let mut child = match Command::new(program)
            .args(args)
            .current_dir(dir)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                logger.trace(&format!("Failed to start {}: {}", program, e));
                return None;
            }
        };

        let (readers, outputs) = spawn_readers(&mut child);

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                self.report_timeout(command_line, logger);
                return None;
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                logger.trace(&format!("Waiting for {} failed: {}", program, e));
                return None;
            }
        };

        // Readers finish once every holder of the pipes has closed them,
        // which may be a background process outliving the child. Only wait
        // for what is left of the budget and leave stuck readers detached.
        let mut lines = Vec::new();
        let mut errors = String::new();
        for _ in 0..readers {
            let remaining = self.timeout.saturating_sub(started.elapsed());
            match outputs.recv_timeout(remaining) {
                Ok(StreamOutput::Stdout(out)) => lines = out,
                Ok(StreamOutput::Stderr(err)) => errors = err,
                Err(_) => {
                    self.report_timeout(command_line, logger);
                    return None;
                }
            }
        }

        for line in &lines {
            logger.raw(line);
        }

        if !status.success() {
            logger.trace(&format!(
                "{} exited with {}: {}",
                command_line,
                status.code().map_or("signal".to_string(), |c| c.to_string()),
                errors.trim()
            ));
            return None;
        }

        Some(lines)
    }

    fn report_timeout(&self, command: String, logger: &dyn Logger) {
        logger.boundary(&BoundaryWarning::CommandTimedOut {
            command,
            timeout_ms: self.timeout.as_millis() as u64,
        });
    }
}

/// Drain stdout and stderr on their own threads so a chatty tool cannot
/// block on a full pipe. Returns the number of readers started.
fn spawn_readers(child: &mut Child) -> (usize, Receiver<StreamOutput>) {
    let (sender, receiver) = mpsc::channel();
    let mut readers = 0;

    if let Some(out) = child.stdout.take() {
        let sender = sender.clone();
        readers += 1;
        thread::spawn(move || {
            let lines = BufReader::new(out)
                .lines()
                .map_while(|line| line.ok())
                .collect::<Vec<String>>();
            let _ = sender.send(StreamOutput::Stdout(lines));
        });
    }

    if let Some(err) = child.stderr.take() {
        let sender = sender.clone();
        readers += 1;
        thread::spawn(move || {
            let mut text = String::new();
            let _ = BufReader::new(err).read_to_string(&mut text);
            let _ = sender.send(StreamOutput::Stderr(text));
        });
    }

    (readers, receiver)
}

/// True when `program` can be found on the search path
pub fn is_available(program: &str) -> bool {
    which::which(program).is_ok()
}
