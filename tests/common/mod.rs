#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use arthur_ops::command::{CapturedOutput, CommandRunner, Invocation};
use arthur_ops::environment::Environment;
use arthur_ops::{Error, Result};

/// Replays canned outputs for commands whose line starts with a given
/// prefix and records every invocation it sees.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Vec<(String, Result<CapturedOutput>)>,
    interactive_exit: i32,
    calls: RefCell<Vec<Invocation>>,
    /// Copies of files named by `file://` arguments, taken at call time.
    pub captured_files: RefCell<HashMap<String, String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to commands starting with `prefix` (program and args joined by spaces).
    pub fn ok(mut self, prefix: &str, stdout: &str) -> Self {
        self.responses.push((
            prefix.to_string(),
            Ok(CapturedOutput::new(Some(0), stdout.to_string(), String::new())),
        ));
        self
    }

    pub fn fail(mut self, prefix: &str, exit_code: i32, stderr: &str) -> Self {
        self.responses.push((
            prefix.to_string(),
            Ok(CapturedOutput::new(Some(exit_code), String::new(), stderr.to_string())),
        ));
        self
    }

    /// Fail the call itself, as the system runner does when a signal
    /// arrives while the command runs.
    pub fn error(mut self, prefix: &str, err: Error) -> Self {
        self.responses.push((prefix.to_string(), Err(err)));
        self
    }

    pub fn interactive_exit(mut self, code: i32) -> Self {
        self.interactive_exit = code;
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Space-joined command lines, without shell quoting.
    pub fn lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(plain_line).collect()
    }

    pub fn count_matching(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|line| line.starts_with(prefix)).count()
    }

    fn record(&self, invocation: &Invocation) {
        for arg in &invocation.args {
            if let Some(path) = arg.strip_prefix("file://") {
                if let Ok(content) = std::fs::read_to_string(path) {
                    self.captured_files
                        .borrow_mut()
                        .insert(path.to_string(), content);
                }
            }
        }
        self.calls.borrow_mut().push(invocation.clone());
    }
}

impl CommandRunner for ScriptedRunner {
    fn output(&self, invocation: &Invocation) -> Result<CapturedOutput> {
        self.record(invocation);
        let line = plain_line(invocation);
        let response = self
            .responses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| Ok(CapturedOutput::new(Some(0), String::new(), String::new())));
        response
    }

    fn interactive(&self, invocation: &Invocation) -> Result<i32> {
        self.record(invocation);
        Ok(self.interactive_exit)
    }
}

pub fn plain_line(invocation: &Invocation) -> String {
    let mut parts = vec![invocation.program.clone()];
    parts.extend(invocation.args.iter().cloned());
    parts.join(" ")
}

pub fn env_value<'a>(invocation: &'a Invocation, key: &str) -> Option<&'a str> {
    invocation
        .env
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Environment rooted in a scratch directory, with no ambient variables.
pub fn environment(root: &Path) -> Environment {
    Environment {
        cwd: root.to_path_buf(),
        home: Some(root.join("home")),
        temp_dir: root.join("tmp"),
        pid: 4242,
        user: Some("alice".to_string()),
        ..Default::default()
    }
}
