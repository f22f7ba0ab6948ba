use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::Regex;

/// Required marker file; a skill directory without it is incomplete.
pub const MARKER_FILE: &str = "SKILL.md";

/// Files fetched for every skill, in order. Only the marker is required.
pub const SKILL_FILES: [&str; 3] = [MARKER_FILE, "config.json", "README.md"];

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid skill name regex"));

/// A skill name that is safe to use as a single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SkillName(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillNameError {
    Empty,
    Invalid(String),
}

impl SkillName {
    pub fn parse(raw: &str) -> Result<Self, SkillNameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SkillNameError::Empty);
        }
        if trimmed == "." || trimmed == ".." || !NAME_RE.is_match(trimmed) {
            return Err(SkillNameError::Invalid(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A directory found under the skills root.
#[derive(Debug, Clone)]
pub struct InstalledSkill {
    pub name: String,
    pub path: PathBuf,
    pub description: Option<String>,
    pub complete: bool,
}

impl InstalledSkill {
    pub fn read(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let marker = path.join(MARKER_FILE);
        let description = std::fs::read_to_string(&marker)
            .ok()
            .and_then(|text| describe(&text));

        Self {
            name,
            path: path.to_path_buf(),
            description,
            complete: marker.is_file(),
        }
    }
}

/// Front-matter `description:` if present, else the first heading.
pub fn describe(markdown: &str) -> Option<String> {
    let (front_matter, body) = split_front_matter(markdown);
    if let Some(fm) = front_matter {
        let found = fm.lines().find_map(|line| {
            line.strip_prefix("description:")
                .map(|value| value.trim().trim_matches('"').to_string())
        });
        if let Some(description) = found.filter(|d| !d.is_empty()) {
            return Some(description);
        }
    }
    first_heading(body)
}

fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text.strip_prefix("---\n") else {
        return (None, text);
    };
    match rest.find("\n---") {
        Some(end) => {
            let body = rest[end + 4..].trim_start_matches(['\r', '\n']);
            (Some(&rest[..end]), body)
        }
        None => (None, text),
    }
}

fn first_heading(markdown: &str) -> Option<String> {
    let mut in_heading = false;
    let mut heading = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { level, .. })
                if matches!(level, HeadingLevel::H1 | HeadingLevel::H2) =>
            {
                in_heading = true;
            }
            Event::End(TagEnd::Heading(_)) if in_heading => {
                let trimmed = heading.trim();
                return (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
            Event::Text(text) | Event::Code(text) if in_heading => heading.push_str(&text),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_single_path_components() {
        assert!(SkillName::parse("skunk-wordpress").is_ok());
        assert!(SkillName::parse("v1.2_beta").is_ok());
        assert_eq!(SkillName::parse("  "), Err(SkillNameError::Empty));
        for bad in ["..", ".", "../etc", "a/b", "a b", "x\\y"] {
            assert!(
                matches!(SkillName::parse(bad), Err(SkillNameError::Invalid(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn description_prefers_front_matter() {
        let doc = "---\nname: demo\ndescription: \"Manage forms\"\n---\n# Demo Skill\n";
        assert_eq!(describe(doc).as_deref(), Some("Manage forms"));
    }

    #[test]
    fn description_falls_back_to_heading() {
        let doc = "Intro text\n\n# SkunkCRM `helper`\n\nbody";
        assert_eq!(describe(doc).as_deref(), Some("SkunkCRM helper"));
        assert_eq!(describe("plain text only"), None);
    }
}
