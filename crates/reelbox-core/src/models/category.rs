use serde::{Deserialize, Serialize};

/// Which backend catalog a category draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Tv,
    /// Local play history ("recently played").
    Record,
}

impl ContentKind {
    /// Query-string value understood by the remote catalog.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Record => "record",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-selectable content bucket.
///
/// A category carrying `tags` is a tag group: it cannot be fetched until one
/// of its tags has been picked into `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ContentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Category {
    pub fn new(title: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            title: title.into(),
            kind: Some(kind),
            tag: None,
            tags: None,
        }
    }

    /// The built-in "recently played" category.
    pub fn recently_played() -> Self {
        Self::new("最近播放", ContentKind::Record)
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_record(&self) -> bool {
        self.kind == Some(ContentKind::Record)
    }

    /// Tag group with no tag picked yet.
    pub fn needs_tag(&self) -> bool {
        self.tags.is_some() && self.tag.is_none()
    }

    /// Pick the first tag of a tag group if none is selected.
    ///
    /// Categories that already have a tag, or have no tags to choose from,
    /// are returned unchanged.
    pub fn resolve_default_tag(self) -> Self {
        if self.tag.is_some() {
            return self;
        }
        let first = self.tags.as_ref().and_then(|t| t.first()).cloned();
        match first {
            Some(tag) => self.with_tag(tag),
            None => self,
        }
    }

    /// Equal title, tag and tag set. A missing tag list equals an empty one.
    pub fn same_selection(&self, other: &Category) -> bool {
        let tags = |c: &Category| c.tags.clone().unwrap_or_default();
        self.title == other.title && self.tag == other.tag && tags(self) == tags(other)
    }
}
