use serde::{Deserialize, Serialize};

/// Search-engine specific fields of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeoMetadata {
  pub title:         String,
  pub description:   String,
  pub keywords:      Vec<String>,
  pub canonical_url: String,
  pub no_index:      bool,
}

/// Title, description and image shown when a post is shared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingTarget {
  pub title:       String,
  pub description: String,
  pub image:       String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialFields {
  pub primary:   SharingTarget,
  pub secondary: SharingTarget,
}

/// Everything the scorer looks at. The scorer grades exactly these fields;
/// falling back from empty SEO fields to the general ones happens before
/// they get here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentInput {
  pub title:       String,
  pub description: String,
  pub slug:        String,
  /// Markup of the post body.
  pub body:        String,
  pub keywords:    Vec<String>,
  pub metadata:    SeoMetadata,
  pub social:      SocialFields,
}

impl ContentInput {
  /// Non-empty, trimmed keywords.
  pub fn target_keywords(&self) -> impl Iterator<Item = &str> {
    self
      .keywords
      .iter()
      .map(|keyword| keyword.trim())
      .filter(|keyword| !keyword.is_empty())
  }
}
