use serde::{Deserialize, Serialize};

/// Formatting choices for [`crate::serialize_with`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkdownOptions {
    pub bullet_marker: char,
    pub emphasis_marker: char,
    pub strong_marker: String,
    pub code_fence: String,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            bullet_marker: '-',
            emphasis_marker: '*',
            strong_marker: "**".to_string(),
            code_fence: "```".to_string(),
        }
    }
}

impl MarkdownOptions {
    /// Marker used for a bullet list directly following another bullet list
    pub(crate) fn alternate_bullet(&self) -> char {
        match self.bullet_marker {
            '-' => '*',
            _ => '-',
        }
    }

    /// Emphasis marker that cannot be confused with the strong marker
    pub(crate) fn alternate_emphasis(&self) -> char {
        match self.emphasis_marker {
            '*' => '_',
            _ => '*',
        }
    }

    /// Out-of-range values fall back to defaults
    pub(crate) fn sanitized(&self) -> Self {
        let defaults = Self::default();
        Self {
            bullet_marker: if matches!(self.bullet_marker, '-' | '*' | '+') {
                self.bullet_marker
            } else {
                defaults.bullet_marker
            },
            emphasis_marker: if matches!(self.emphasis_marker, '*' | '_') {
                self.emphasis_marker
            } else {
                defaults.emphasis_marker
            },
            strong_marker: if matches!(self.strong_marker.as_str(), "**" | "__") {
                self.strong_marker.clone()
            } else {
                defaults.strong_marker
            },
            code_fence: if self.code_fence.len() >= 3
                && (self.code_fence.chars().all(|c| c == '`')
                    || self.code_fence.chars().all(|c| c == '~'))
            {
                self.code_fence.clone()
            } else {
                defaults.code_fence
            },
        }
    }
}
