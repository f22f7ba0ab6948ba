use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

/// A Skunk plugin with its free and pro WordPress slugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginEntry {
    pub name: &'static str,
    pub free_slug: &'static str,
    pub pro_slug: &'static str,
    pub display_name: &'static str,
}

impl PluginEntry {
    pub fn slug(&self, edition: Edition) -> &'static str {
        match edition {
            Edition::Free => self.free_slug,
            Edition::Pro => self.pro_slug,
        }
    }

    pub fn label(&self, edition: Edition) -> String {
        match edition {
            Edition::Free => self.display_name.to_string(),
            Edition::Pro => format!("{} Pro", self.display_name),
        }
    }
}

pub const REGISTRY: &[PluginEntry] = &[
    PluginEntry {
        name: "crm",
        free_slug: "skunkcrm",
        pro_slug: "skunkcrm-pro",
        display_name: "SkunkCRM",
    },
    PluginEntry {
        name: "forms",
        free_slug: "skunkforms",
        pro_slug: "skunkforms-pro",
        display_name: "SkunkForms",
    },
    PluginEntry {
        name: "pages",
        free_slug: "skunkpages",
        pro_slug: "skunkpages-pro",
        display_name: "SkunkPages",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    Free,
    Pro,
}

/// A user-supplied plugin name split into base name and edition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRequest {
    pub base: String,
    pub edition: Edition,
}

impl PluginRequest {
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        match lowered.strip_suffix("-pro") {
            Some(base) => Self {
                base: base.to_string(),
                edition: Edition::Pro,
            },
            None => Self {
                base: lowered,
                edition: Edition::Free,
            },
        }
    }
}

/// Resolve by short name or by free slug (`crm` and `skunkcrm` both work).
pub fn lookup(base: &str) -> Option<&'static PluginEntry> {
    REGISTRY
        .iter()
        .find(|entry| entry.name == base || entry.free_slug == base)
}

pub fn known_names() -> Vec<&'static str> {
    REGISTRY.iter().map(|entry| entry.name).collect()
}

/// Closest registry name for a mistyped `base`, if any is close enough.
pub fn suggest(base: &str) -> Option<&'static str> {
    if base.is_empty() {
        return None;
    }
    let matcher = SkimMatcherV2::default();
    REGISTRY
        .iter()
        .flat_map(|entry| {
            [entry.name, entry.free_slug]
                .into_iter()
                .filter_map(|candidate| matcher.fuzzy_match(candidate, base))
                .map(move |score| (score, entry.name))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pro_suffix_selects_edition() {
        assert_eq!(
            PluginRequest::parse("Forms-Pro"),
            PluginRequest {
                base: "forms".into(),
                edition: Edition::Pro
            }
        );
        assert_eq!(PluginRequest::parse("crm").edition, Edition::Free);
    }

    #[test]
    fn lookup_accepts_short_name_and_slug() {
        assert_eq!(lookup("crm").map(|e| e.display_name), Some("SkunkCRM"));
        assert_eq!(lookup("skunkforms").map(|e| e.name), Some("forms"));
        assert!(lookup("woocommerce").is_none());
        assert_eq!(lookup("pages").unwrap().slug(Edition::Pro), "skunkpages-pro");
    }

    #[test]
    fn suggests_near_misses() {
        assert_eq!(suggest("frm"), Some("forms"));
        assert_eq!(suggest("skcrm"), Some("crm"));
        assert_eq!(suggest("zzz"), None);
    }
}
