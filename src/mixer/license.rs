//! License files.
//!
//! The file name and text both follow the `license` key of the render context; a
//! context without a known license produces no file at all. The compiled-in texts
//! read `license_year` and `license_holder` from the context.

use crate::context::Context;
use crate::mixer::node::{Content, Name};
use crate::mixer::{File, Source};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Commonly used licenses, identified by their lowercase SPDX id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseOption {
    #[serde(rename = "agpl-3.0")]
    Agpl3,
    #[serde(rename = "apache-2.0")]
    Apache2,
    #[serde(rename = "bsd-2-clause")]
    Bsd2Clause,
    #[serde(rename = "bsd-3-clause")]
    Bsd3Clause,
    #[serde(rename = "bsl-1.0")]
    Bsl1,
    #[serde(rename = "cc0-1.0")]
    Cc0,
    #[serde(rename = "epl-2.0")]
    Epl2,
    #[serde(rename = "gpl-2.0")]
    Gpl2,
    #[serde(rename = "gpl-3.0")]
    Gpl3,
    #[serde(rename = "lgpl-2.1")]
    Lgpl2_1,
    #[serde(rename = "mit")]
    Mit,
    #[serde(rename = "mpl-2.0")]
    Mpl2,
    #[serde(rename = "unlicense")]
    Unlicense,
}

impl LicenseOption {
    pub const ALL: [LicenseOption; 13] = [
        LicenseOption::Agpl3,
        LicenseOption::Apache2,
        LicenseOption::Bsd2Clause,
        LicenseOption::Bsd3Clause,
        LicenseOption::Bsl1,
        LicenseOption::Cc0,
        LicenseOption::Epl2,
        LicenseOption::Gpl2,
        LicenseOption::Gpl3,
        LicenseOption::Lgpl2_1,
        LicenseOption::Mit,
        LicenseOption::Mpl2,
        LicenseOption::Unlicense,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            LicenseOption::Agpl3 => "agpl-3.0",
            LicenseOption::Apache2 => "apache-2.0",
            LicenseOption::Bsd2Clause => "bsd-2-clause",
            LicenseOption::Bsd3Clause => "bsd-3-clause",
            LicenseOption::Bsl1 => "bsl-1.0",
            LicenseOption::Cc0 => "cc0-1.0",
            LicenseOption::Epl2 => "epl-2.0",
            LicenseOption::Gpl2 => "gpl-2.0",
            LicenseOption::Gpl3 => "gpl-3.0",
            LicenseOption::Lgpl2_1 => "lgpl-2.1",
            LicenseOption::Mit => "mit",
            LicenseOption::Mpl2 => "mpl-2.0",
            LicenseOption::Unlicense => "unlicense",
        }
    }

    /// Conventional file name: `COPYING` for the GPL family, `COPYING.LESSER` for
    /// the LGPL, `UNLICENSE` for the Unlicense and `LICENSE` otherwise.
    pub fn filename(&self) -> &'static str {
        match self {
            LicenseOption::Agpl3 | LicenseOption::Gpl2 | LicenseOption::Gpl3 => "COPYING",
            LicenseOption::Lgpl2_1 => "COPYING.LESSER",
            LicenseOption::Unlicense => "UNLICENSE",
            _ => "LICENSE",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            LicenseOption::Agpl3 => include_str!("licenses/agpl-3.0.template"),
            LicenseOption::Apache2 => include_str!("licenses/apache-2.0.template"),
            LicenseOption::Bsd2Clause => include_str!("licenses/bsd-2-clause.template"),
            LicenseOption::Bsd3Clause => include_str!("licenses/bsd-3-clause.template"),
            LicenseOption::Bsl1 => include_str!("licenses/bsl-1.0.template"),
            LicenseOption::Cc0 => include_str!("licenses/cc0-1.0.template"),
            LicenseOption::Epl2 => include_str!("licenses/epl-2.0.template"),
            LicenseOption::Gpl2 => include_str!("licenses/gpl-2.0.template"),
            LicenseOption::Gpl3 => include_str!("licenses/gpl-3.0.template"),
            LicenseOption::Lgpl2_1 => include_str!("licenses/lgpl-2.1.template"),
            LicenseOption::Mit => include_str!("licenses/mit.template"),
            LicenseOption::Mpl2 => include_str!("licenses/mpl-2.0.template"),
            LicenseOption::Unlicense => include_str!("licenses/unlicense.template"),
        }
    }

    /// The license named by the `license` key, if it is a known one.
    pub fn from_context(context: &Context) -> Option<Self> {
        context.get("license").and_then(|value| Self::deserialize(value).ok())
    }
}

impl fmt::Display for LicenseOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

pub fn license_filename(context: &Context) -> Option<String> {
    LicenseOption::from_context(context).map(|license| license.filename().to_string())
}

/// Unrendered license text; rendering fills in the year and holder.
pub fn license_content(context: &Context) -> Option<Content> {
    LicenseOption::from_context(context).map(|license| Content::Text(license.template().to_string()))
}

/// A file named and filled in after the context's `license`.
pub fn license_file() -> File {
    File::new(Name::computed(license_filename), Source::computed(license_content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_as_lowercase_id() {
        for license in LicenseOption::ALL {
            assert_eq!(serde_json::to_value(license).unwrap(), json!(license.id()));
        }
    }

    #[test]
    fn test_unknown_license_has_no_file() {
        let mut context = Context::new();
        assert!(license_filename(&context).is_none());
        context.insert("license".to_string(), json!("wtfpl"));
        assert!(license_filename(&context).is_none());
        assert!(license_content(&context).is_none());
    }
}
