//! Workspace path scrubbing for captured output

use crate::error::Result;
use crate::types::Event;
use regex::Regex;
use std::borrow::Cow;
use std::path::Path;

/// Rewrites every mention of a workspace directory to a fixed placeholder.
///
/// Matches the absolute path, and the same path reached through any number
/// of leading `../` segments. Pure text transform: event count and order
/// never change.
#[derive(Debug, Clone)]
pub struct Normalizer {
    pattern: Regex,
    placeholder: String,
}

impl Normalizer {
    pub fn new(workspace: &Path, placeholder: impl Into<String>) -> Result<Self> {
        let mut spellings = vec![workspace.to_string_lossy().into_owned()];
        // Temp dirs are often behind a symlink (/tmp -> /private/tmp on macOS).
        if let Ok(canonical) = workspace.canonicalize() {
            let canonical = canonical.to_string_lossy().into_owned();
            if !spellings.contains(&canonical) {
                spellings.push(canonical);
            }
        }
        // Longest first so a shorter spelling never matches inside a longer one.
        spellings.sort_by_key(|s| std::cmp::Reverse(s.len()));

        let alternatives: Vec<String> = spellings
            .iter()
            .map(|path| {
                let relative = path.trim_start_matches(['/', '\\']);
                format!(
                    r"(?:\.\./)+{}|{}",
                    regex::escape(relative),
                    regex::escape(path)
                )
            })
            .collect();

        Ok(Self {
            pattern: Regex::new(&alternatives.join("|"))?,
            placeholder: placeholder.into(),
        })
    }

    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.pattern
            .replace_all(text, regex::NoExpand(&self.placeholder))
    }

    pub fn apply_events(&self, events: &mut [Event]) {
        for event in events.iter_mut() {
            if let Cow::Owned(message) = self.apply(&event.message) {
                event.message = message;
            }
        }
    }
}
