//! Branding shown by front ends

use serde::{Deserialize, Serialize};

/// Per-customer branding constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branding {
    /// Application name (window/tab title)
    pub app_name: String,
    /// Company shown next to the logo
    pub company_name: String,
    /// Short description
    pub app_description: String,
    /// Logo path relative to the public assets
    pub logo_path: String,
    /// Alternative text for the logo
    pub logo_alt: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            app_name: "empresa Report".to_string(),
            company_name: "empresa Report".to_string(),
            app_description: "Records and reporting management system".to_string(),
            logo_path: "/icons/logo_hd.png".to_string(),
            logo_alt: "Report+ company logo".to_string(),
        }
    }
}

impl Branding {
    /// One-line banner for terminal front ends.
    #[must_use]
    pub fn banner(&self) -> String {
        format!("{} - {}", self.app_name, self.app_description)
    }
}
