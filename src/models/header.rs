use serde::Serialize;

use super::{announcement::Announcement, console_config::ConsoleConfig};

/// Version badge shown next to the product name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionLabel {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Overrides set by the active console theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Directory under `libs/themes/` holding the theme's assets.
    pub name: String,
    pub app_name: Option<String>,
    /// Logo URL; wins over `ui.appLogoPath`.
    pub logo: Option<String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "default".into(),
            app_name: None,
            logo: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductBrand {
    pub app_name: String,
    pub logo: Option<String>,
    pub version: Option<VersionLabel>,
}

impl ProductBrand {
    /// Resolves the brand block of the header.
    ///
    /// A non-empty theme app name wins over `ui.appName`, a non-empty theme
    /// logo wins over `ui.appLogoPath`, and
    /// `productVersionConfig.versionOverride` wins over `deployment.productVersion`.
    pub fn resolve(config: &ConsoleConfig, theme: &Theme) -> Self {
        let app_name = non_empty(theme.app_name.as_deref())
            .map(str::to_owned)
            .unwrap_or_else(|| config.ui.app_name.clone());

        let logo = non_empty(theme.logo.as_deref())
            .map(str::to_owned)
            .or_else(|| app_logo(config, &theme.name));

        Self {
            app_name,
            logo,
            version: version_label(config),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// `ui.appLogoPath` as a URL. Absolute URLs are used as is, relative paths
/// live under `<clientOrigin>/<appBase>/libs/themes/<theme>/`.
fn app_logo(config: &ConsoleConfig, theme: &str) -> Option<String> {
    let path = non_empty(config.ui.app_logo_path.as_deref())?;
    if ["http://", "https://", "//"].iter().any(|scheme| path.starts_with(scheme)) {
        return Some(path.to_owned());
    }

    let mut url = config.client_origin.trim_end_matches('/').to_owned();
    for segment in [config.app_base.as_str(), "libs/themes", theme, path] {
        let segment = segment.trim_matches('/');
        if !segment.is_empty() {
            url.push('/');
            url.push_str(segment);
        }
    }
    Some(url)
}

fn version_label(config: &ConsoleConfig) -> Option<VersionLabel> {
    let settings = config.ui.product_version_config.clone().unwrap_or_default();

    let version = settings
        .version_override
        .as_deref()
        .unwrap_or(&config.deployment.product_version);
    if version.is_empty() {
        return None;
    }

    let allow_snapshot = settings.allow_snapshot.unwrap_or(false);
    if !allow_snapshot && version.to_uppercase().contains("SNAPSHOT") {
        return None;
    }

    let text = match settings.text_case.as_deref() {
        Some("lowercase") => version.to_lowercase(),
        Some("uppercase") => version.to_uppercase(),
        _ => version.to_owned(),
    };

    Some(VersionLabel {
        text,
        color: settings.label_color,
    })
}

/// Everything the header needs to render for one client.
#[derive(Debug, Clone, Serialize)]
pub struct HeaderView {
    pub brand: ProductBrand,
    pub brand_link: String,
    pub announcement: Option<Announcement>,
}

impl HeaderView {
    pub fn new(config: &ConsoleConfig, theme: &Theme, announcement: Option<Announcement>) -> Self {
        Self {
            brand: ProductBrand::resolve(config, theme),
            brand_link: config.deployment.app_home_path.clone(),
            announcement,
        }
    }
}
