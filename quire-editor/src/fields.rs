//! Post metadata fields and their propagation rules.
//!
//! The title feeds the slug, the SEO title and both sharing titles; the
//! description feeds the SEO description and both sharing descriptions. A
//! derived field follows its source until the author edits it directly, and
//! follows again after [`PostFields::reset_override`].
use serde::{Deserialize, Serialize};

use crate::{
  analysis::{ContentInput, SeoMetadata, SharingTarget, SocialFields},
  slug::slugify,
};

/// A value that tracks a source field until it is edited directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverridableField {
  value:      String,
  overridden: bool,
}

impl OverridableField {
  #[must_use]
  pub fn value(&self) -> &str {
    &self.value
  }

  #[must_use]
  pub const fn is_overridden(&self) -> bool {
    self.overridden
  }

  /// A direct edit by the author; the field stops following its source.
  pub fn edit(&mut self, value: impl Into<String>) {
    self.value = value.into();
    self.overridden = true;
  }

  /// Take the source's value unless the field was edited directly.
  pub fn propagate(&mut self, source: &str) {
    if !self.overridden {
      self.value = source.to_string();
    }
  }

  /// Follow the source again, starting from its current value.
  pub fn reset(&mut self, source: &str) {
    self.overridden = false;
    self.value = source.to_string();
  }
}

/// The derived fields an author can edit directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Slug,
  SeoTitle,
  SeoDescription,
  PrimaryTitle,
  PrimaryDescription,
  SecondaryTitle,
  SecondaryDescription,
}

/// Every field of a post except its body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostFields {
  title:       String,
  description: String,
  pub tags:    Vec<String>,

  slug:                  OverridableField,
  seo_title:             OverridableField,
  seo_description:       OverridableField,
  primary_title:         OverridableField,
  primary_description:   OverridableField,
  secondary_title:       OverridableField,
  secondary_description: OverridableField,

  pub seo_keywords:    Vec<String>,
  pub canonical_url:   String,
  pub no_index:        bool,
  pub primary_image:   String,
  pub secondary_image: String,
}

impl PostFields {
  #[must_use]
  pub fn title(&self) -> &str {
    &self.title
  }

  #[must_use]
  pub fn description(&self) -> &str {
    &self.description
  }

  #[must_use]
  pub const fn field(&self, field: Field) -> &OverridableField {
    match field {
      Field::Slug => &self.slug,
      Field::SeoTitle => &self.seo_title,
      Field::SeoDescription => &self.seo_description,
      Field::PrimaryTitle => &self.primary_title,
      Field::PrimaryDescription => &self.primary_description,
      Field::SecondaryTitle => &self.secondary_title,
      Field::SecondaryDescription => &self.secondary_description,
    }
  }

  const fn field_mut(&mut self, field: Field) -> &mut OverridableField {
    match field {
      Field::Slug => &mut self.slug,
      Field::SeoTitle => &mut self.seo_title,
      Field::SeoDescription => &mut self.seo_description,
      Field::PrimaryTitle => &mut self.primary_title,
      Field::PrimaryDescription => &mut self.primary_description,
      Field::SecondaryTitle => &mut self.secondary_title,
      Field::SecondaryDescription => &mut self.secondary_description,
    }
  }

  /// The value a derived field takes from its source.
  fn source_value(&self, field: Field) -> String {
    match field {
      Field::Slug => slugify(&self.title),
      Field::SeoTitle | Field::PrimaryTitle | Field::SecondaryTitle => {
        self.title.clone()
      },
      Field::SeoDescription
      | Field::PrimaryDescription
      | Field::SecondaryDescription => self.description.clone(),
    }
  }

  pub fn set_title(&mut self, title: impl Into<String>) {
    self.title = title.into();
    let slug = slugify(&self.title);
    self.slug.propagate(&slug);
    for field in [Field::SeoTitle, Field::PrimaryTitle, Field::SecondaryTitle] {
      let title = self.title.clone();
      self.field_mut(field).propagate(&title);
    }
  }

  pub fn set_description(&mut self, description: impl Into<String>) {
    self.description = description.into();
    for field in [
      Field::SeoDescription,
      Field::PrimaryDescription,
      Field::SecondaryDescription,
    ] {
      let description = self.description.clone();
      self.field_mut(field).propagate(&description);
    }
  }

  /// A direct edit of a derived field.
  pub fn edit(&mut self, field: Field, value: impl Into<String>) {
    self.field_mut(field).edit(value);
  }

  /// Re-link a derived field to its source.
  pub fn reset_override(&mut self, field: Field) {
    let source = self.source_value(field);
    self.field_mut(field).reset(&source);
  }

  /// Scorer input for `body`, with empty SEO fields replaced by the general
  /// title, description and tags.
  #[must_use]
  pub fn analysis_input(&self, body: impl Into<String>) -> ContentInput {
    let or_general = |seo: &str, general: &str| {
      if seo.trim().is_empty() {
        general.to_string()
      } else {
        seo.to_string()
      }
    };
    let keywords = if self.seo_keywords.iter().all(|k| k.trim().is_empty()) {
      self.tags.clone()
    } else {
      self.seo_keywords.clone()
    };

    ContentInput {
      title: or_general(self.seo_title.value(), &self.title),
      description: or_general(self.seo_description.value(), &self.description),
      slug: self.slug.value().to_string(),
      body: body.into(),
      keywords,
      metadata: SeoMetadata {
        title:         self.seo_title.value().to_string(),
        description:   self.seo_description.value().to_string(),
        keywords:      self.seo_keywords.clone(),
        canonical_url: self.canonical_url.clone(),
        no_index:      self.no_index,
      },
      social: SocialFields {
        primary:   SharingTarget {
          title:       self.primary_title.value().to_string(),
          description: self.primary_description.value().to_string(),
          image:       self.primary_image.clone(),
        },
        secondary: SharingTarget {
          title:       self.secondary_title.value().to_string(),
          description: self.secondary_description.value().to_string(),
          image:       self.secondary_image.clone(),
        },
      },
    }
  }
}
