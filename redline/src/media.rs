//! Resolves `LINK_ID`, `IMAGE_ID` and `VIDEO_ID` tokens in exported
//! Markdown.
//!
//! Both the bracketed form (`[LINK_ID:docs]`) and the bare form
//! (`LINK_ID:docs`) are recognised. Lines inside fenced code blocks are left
//! alone. What happens to images and to tokens with no table entry is set by
//! [`MediaConfig`].

use std::path::Path;

use regex::{Captures, Regex};
use redline_core::PlaceholderResolver;
use serde::Deserialize;

use crate::config::MediaConfig;

const FENCE: &str = "```";

const BRACKETED_TOKEN: &str = r"\[(LINK_ID|IMAGE_ID|VIDEO_ID):([^\]]+)\]";
/// The bare form needs a non-word, non-bracket character (or line start)
/// before it so it never matches inside another identifier.
const BARE_TOKEN: &str = r"(^|[^A-Za-z0-9_\[])(LINK_ID|IMAGE_ID|VIDEO_ID):([A-Za-z0-9_.:-]+)";

/// How a resolved image token is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOutput {
    /// `![](url)`
    Markdown,
    /// The bare URL.
    #[default]
    Url,
}

/// What happens to a token whose id is not in the tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unresolved {
    #[default]
    Remove,
    Keep,
}

/// Only Markdown files carry media tokens; everything else exports as is.
pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

pub struct MediaPlaceholders {
    media: MediaConfig,
    bracketed: Regex,
    bare: Regex,
}

impl MediaPlaceholders {
    pub fn new(media: MediaConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            media,
            bracketed: Regex::new(BRACKETED_TOKEN)?,
            bare: Regex::new(BARE_TOKEN)?,
        })
    }

    fn lookup(&self, kind: &str, id: &str) -> Option<String> {
        let url = match kind {
            "LINK_ID" => self.media.links.get(id),
            "IMAGE_ID" => self.media.images.get(id),
            "VIDEO_ID" => self.media.videos.get(id),
            _ => None,
        }
        .filter(|url| !url.is_empty())?;

        if kind == "IMAGE_ID" && self.media.image_output == ImageOutput::Markdown {
            Some(format!("![]({url})"))
        } else {
            Some(url.clone())
        }
    }

    fn resolve_line(&self, line: &str) -> String {
        let keep = self.media.unresolved == Unresolved::Keep;

        let line = self.bracketed.replace_all(line, |caps: &Captures| {
            match self.lookup(&caps[1], &caps[2]) {
                Some(url) => url,
                None if keep => caps[0].to_owned(),
                None => String::new(),
            }
        });

        self.bare
            .replace_all(&line, |caps: &Captures| {
                let prefix = &caps[1];
                match self.lookup(&caps[2], &caps[3]) {
                    Some(url) => format!("{prefix}{url}"),
                    None if keep => caps[0].to_owned(),
                    None => prefix.to_owned(),
                }
            })
            .into_owned()
    }
}

impl PlaceholderResolver for MediaPlaceholders {
    fn resolve(&self, content: &str) -> String {
        if !content.contains("_ID:") {
            return content.to_owned();
        }
        let mut in_fence = false;
        let lines: Vec<String> = content
            .split('\n')
            .map(|line| {
                if line.trim_start().starts_with(FENCE) {
                    in_fence = !in_fence;
                    line.to_owned()
                } else if in_fence {
                    line.to_owned()
                } else {
                    self.resolve_line(line)
                }
            })
            .collect();
        lines.join("\n")
    }
}
