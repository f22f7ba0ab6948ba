// Shared fakes for driving `App` end to end without network or subprocesses.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::rc::Rc;
use std::time::Duration;

use skunk::net::{FetchError, Fetcher, HttpResponse};
use skunk::tools::{Tool, ToolError, ToolOutput, ToolRunner};
use skunk::wizard::Prompter;
use skunk::{App, AppConfig};
use tempfile::TempDir;

/// Fake remote host. Clones share routes and the request log.
#[derive(Clone, Default)]
pub struct FakeRemote {
    routes: Rc<RefCell<HashMap<String, HttpResponse>>>,
    down: Rc<RefCell<HashSet<String>>>,
    pub requests: Rc<RefCell<Vec<String>>>,
}

impl FakeRemote {
    pub fn serve(&self, url: impl Into<String>, response: HttpResponse) {
        self.routes.borrow_mut().insert(url.into(), response);
    }

    /// Make `url` fail as if the host could not be reached.
    pub fn fail(&self, url: impl Into<String>) {
        self.down.borrow_mut().insert(url.into());
    }

    fn respond(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        if self.down.borrow().contains(url) {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: "connection failed".to_string(),
            });
        }
        Ok(self
            .routes
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or_else(|| HttpResponse::status(404)))
    }
}

impl Fetcher for FakeRemote {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.respond(url)
    }

    fn post_json(&self, url: &str, _: &serde_json::Value) -> Result<HttpResponse, FetchError> {
        self.respond(url)
    }

    fn probe(&self, url: &str, _: Duration) -> Result<u16, FetchError> {
        self.respond(url).map(|response| response.status)
    }
}

/// Fake tool set. Clones share the call log.
#[derive(Clone, Default)]
pub struct FakeTools {
    available: Rc<RefCell<HashSet<Tool>>>,
    stdout: Rc<RefCell<HashMap<Tool, String>>>,
    pub calls: Rc<RefCell<Vec<(Tool, Vec<String>)>>>,
}

impl FakeTools {
    pub fn install(&self, tool: Tool, stdout: &str) {
        self.available.borrow_mut().insert(tool);
        self.stdout.borrow_mut().insert(tool, stdout.to_string());
    }
}

impl ToolRunner for FakeTools {
    fn is_available(&self, tool: Tool) -> bool {
        self.available.borrow().contains(&tool)
    }

    fn run(&self, tool: Tool, args: &[String]) -> Result<ToolOutput, ToolError> {
        self.calls.borrow_mut().push((tool, args.to_vec()));
        if !self.is_available(tool) {
            return Err(ToolError::Spawn {
                program: tool.binary(),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }
        Ok(ToolOutput {
            success: true,
            stdout: self.stdout.borrow().get(&tool).cloned().unwrap_or_default(),
            stderr: String::new(),
        })
    }
}

/// Answers questions from a fixed script; an exhausted script takes defaults.
pub struct ScriptedPrompter(pub VecDeque<String>);

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self(answers.iter().map(|a| a.to_string()).collect())
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, _: &str, default: Option<&str>) -> io::Result<String> {
        let answer = self.0.pop_front().unwrap_or_default();
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer)
        }
    }
}

pub struct Harness {
    pub home: TempDir,
    pub remote: FakeRemote,
    pub tools: FakeTools,
    pub app: App,
}

pub fn harness(answers: &[&str]) -> Harness {
    let home = tempfile::tempdir().unwrap();
    let config = AppConfig::load_from(None, home.path()).unwrap();
    let remote = FakeRemote::default();
    let tools = FakeTools::default();
    let app = App::new(
        config,
        Box::new(remote.clone()),
        Box::new(tools.clone()),
        Box::new(ScriptedPrompter::new(answers)),
    );
    Harness {
        home,
        remote,
        tools,
        app,
    }
}
