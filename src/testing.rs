// In-memory fakes for the HTTP and subprocess seams.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::net::{FetchError, Fetcher, HttpResponse};
use crate::tools::{Tool, ToolError, ToolOutput, ToolRunner};

/// Unrouted URLs answer 404; URLs marked with `fail` never connect.
#[derive(Default)]
pub struct FakeFetcher {
    routes: HashMap<String, HttpResponse>,
    down: HashSet<String>,
    pub gets: RefCell<Vec<String>>,
    pub posts: RefCell<Vec<(String, serde_json::Value)>>,
}

impl FakeFetcher {
    pub fn route(mut self, url: impl Into<String>, response: HttpResponse) -> Self {
        self.routes.insert(url.into(), response);
        self
    }

    pub fn fail(mut self, url: impl Into<String>) -> Self {
        self.down.insert(url.into());
        self
    }

    fn lookup(&self, url: &str) -> Result<HttpResponse, FetchError> {
        if self.down.contains(url) {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: "connection failed".to_string(),
            });
        }
        Ok(self
            .routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| HttpResponse::status(404)))
    }
}

impl Fetcher for FakeFetcher {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.gets.borrow_mut().push(url.to_string());
        self.lookup(url)
    }

    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse, FetchError> {
        self.posts.borrow_mut().push((url.to_string(), body.clone()));
        self.lookup(url)
    }

    fn probe(&self, url: &str, _: Duration) -> Result<u16, FetchError> {
        self.lookup(url).map(|response| response.status)
    }
}

#[derive(Default)]
pub struct FakeTools {
    available: HashSet<Tool>,
    outputs: HashMap<Tool, ToolOutput>,
    pub calls: RefCell<Vec<(Tool, Vec<String>)>>,
}

impl FakeTools {
    pub fn with(mut self, tool: Tool) -> Self {
        self.available.insert(tool);
        self
    }

    pub fn output(mut self, tool: Tool, success: bool, stdout: &str) -> Self {
        self.available.insert(tool);
        self.outputs.insert(
            tool,
            ToolOutput {
                success,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
        self
    }

    pub fn calls_to(&self, tool: Tool) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .filter(|(called, _)| *called == tool)
            .map(|(_, args)| args.clone())
            .collect()
    }
}

impl ToolRunner for FakeTools {
    fn is_available(&self, tool: Tool) -> bool {
        self.available.contains(&tool)
    }

    fn run(&self, tool: Tool, args: &[String]) -> Result<ToolOutput, ToolError> {
        self.calls.borrow_mut().push((tool, args.to_vec()));
        if !self.available.contains(&tool) {
            return Err(ToolError::Spawn {
                program: tool.binary(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        Ok(self.outputs.get(&tool).cloned().unwrap_or(ToolOutput {
            success: true,
            stdout: String::new(),
            stderr: String::new(),
        }))
    }
}
