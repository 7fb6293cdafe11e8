//! File name masks.

use regex::Regex;

use crate::error::{Error, Result};

/// A file name mask where `*` matches any run of characters.
///
/// Every other character is literal and the whole file name must match, so
/// `*.md` accepts `index.md` but not `index.md.bak`.
#[derive(Debug, Clone)]
pub struct FileMask {
    mask: String,
    regex: Regex,
}

impl FileMask {
    pub fn new(mask: &str) -> Result<Self> {
        let pattern = mask
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("^{pattern}$")).map_err(|source| Error::FileMask {
            mask: mask.to_string(),
            source,
        })?;
        Ok(Self {
            mask: mask.to_string(),
            regex,
        })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }

    pub fn as_str(&self) -> &str {
        &self.mask
    }
}
