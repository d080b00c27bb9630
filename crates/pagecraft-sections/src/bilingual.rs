//! Parallel text for the two supported locales

use crate::error::SectionError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// One of the two fixed locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Locale {
    /// Primary locale, `en` on the wire
    #[serde(rename = "en")]
    Primary,
    /// Secondary locale, `ar` on the wire
    #[serde(rename = "ar")]
    Secondary,
}

impl Locale {
    /// Both locales in wire order
    pub const ALL: [Self; 2] = [Self::Primary, Self::Secondary];

    /// Wire key for this locale
    #[inline]
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Primary => "en",
            Self::Secondary => "ar",
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Text held in both locales
///
/// Missing keys deserialize as empty strings, so partially translated
/// documents from the API load without error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BilingualText {
    /// Primary locale text
    #[serde(rename = "en", default)]
    pub primary: String,
    /// Secondary locale text
    #[serde(rename = "ar", default)]
    pub secondary: String,
}

impl BilingualText {
    /// Create from both halves
    #[inline]
    #[must_use]
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// Text for one locale
    #[inline]
    #[must_use]
    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Primary => &self.primary,
            Locale::Secondary => &self.secondary,
        }
    }

    /// Replace one half, returning the updated value
    #[inline]
    #[must_use]
    pub fn with(mut self, locale: Locale, text: impl Into<String>) -> Self {
        self.set(locale, text);
        self
    }

    /// Replace one half in place
    #[inline]
    pub fn set(&mut self, locale: Locale, text: impl Into<String>) {
        match locale {
            Locale::Primary => self.primary = text.into(),
            Locale::Secondary => self.secondary = text.into(),
        }
    }

    /// First locale whose text is blank after trimming
    #[must_use]
    pub fn missing_locale(&self) -> Option<Locale> {
        Locale::ALL
            .into_iter()
            .find(|locale| self.get(*locale).trim().is_empty())
    }

    /// Both halves non-empty after trimming
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_locale().is_none()
    }

    /// Both halves blank
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.primary.trim().is_empty() && self.secondary.trim().is_empty()
    }

    /// Enforce the completeness rule
    ///
    /// # Errors
    /// Returns `IncompleteLocalization` naming `location` and the empty locale
    pub fn require_complete(&self, location: impl Into<String>) -> Result<(), SectionError> {
        match self.missing_locale() {
            None => Ok(()),
            Some(missing) => Err(SectionError::IncompleteLocalization {
                location: location.into(),
                missing,
            }),
        }
    }
}
