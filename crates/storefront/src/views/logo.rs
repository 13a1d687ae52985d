//! Brand logo.

use std::fmt;
use std::str::FromStr;

use askama::Template;

/// Logo image served from the site root.
pub const LOGO_SRC: &str = "/MoringaLogo_horizontal_color.png";

/// Alternative text of the logo image.
pub const LOGO_ALT: &str = "Eleve Logo";

/// Wordmark shown next to the image when `show_text` is set.
pub const LOGO_TEXT: &str = "AM Botanics";

/// Rendered logo height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogoSize {
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
}

impl LogoSize {
    /// Height class of the image container.
    #[must_use]
    pub const fn container_class(self) -> &'static str {
        match self {
            Self::Sm => "h-8",
            Self::Md => "h-10",
            Self::Lg => "h-16",
            Self::Xl => "h-20",
        }
    }

    /// Font-size class of the wordmark.
    #[must_use]
    pub const fn text_class(self) -> &'static str {
        match self {
            Self::Sm => "text-lg",
            Self::Md => "text-xl",
            Self::Lg => "text-3xl",
            Self::Xl => "text-4xl",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sm => "sm",
            Self::Md => "md",
            Self::Lg => "lg",
            Self::Xl => "xl",
        }
    }
}

impl fmt::Display for LogoSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogoSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sm" => Ok(Self::Sm),
            "md" => Ok(Self::Md),
            "lg" => Ok(Self::Lg),
            "xl" => Ok(Self::Xl),
            other => Err(format!("unknown logo size: {other}")),
        }
    }
}

/// Visual treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogoVariant {
    /// Bare image.
    #[default]
    Default,
    /// Image on a rounded white pill, for dark backgrounds.
    Badge,
}

/// Presentational logo component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Template)]
#[template(path = "components/logo.html")]
pub struct Logo {
    pub size: LogoSize,
    /// Extra classes appended to the wrapper.
    pub class: String,
    pub show_text: bool,
    pub variant: LogoVariant,
}

impl Logo {
    #[must_use]
    pub fn new(size: LogoSize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    #[must_use]
    pub const fn with_text(mut self) -> Self {
        self.show_text = true;
        self
    }

    #[must_use]
    pub const fn badge(mut self) -> Self {
        self.variant = LogoVariant::Badge;
        self
    }

    fn wrapper_class(&self) -> String {
        let mut class = String::from("flex items-center");
        if self.variant == LogoVariant::Badge {
            class.push_str(" rounded-full bg-white px-3 py-1 shadow-sm");
        }
        let extra = self.class.trim();
        if !extra.is_empty() {
            class.push(' ');
            class.push_str(extra);
        }
        class
    }

    fn image_class(&self) -> String {
        format!("{} w-auto object-contain", self.size.container_class())
    }

    fn text_class(&self) -> String {
        format!("ml-2 font-bold text-gray-900 {}", self.size.text_class())
    }

    #[allow(clippy::unused_self)]
    const fn src(&self) -> &'static str {
        LOGO_SRC
    }

    #[allow(clippy::unused_self)]
    const fn alt(&self) -> &'static str {
        LOGO_ALT
    }

    #[allow(clippy::unused_self)]
    const fn wordmark(&self) -> &'static str {
        LOGO_TEXT
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_size_classes() {
        let table = [
            (LogoSize::Sm, "h-8", "text-lg"),
            (LogoSize::Md, "h-10", "text-xl"),
            (LogoSize::Lg, "h-16", "text-3xl"),
            (LogoSize::Xl, "h-20", "text-4xl"),
        ];
        for (size, container, text) in table {
            assert_eq!(size.container_class(), container);
            assert_eq!(size.text_class(), text);
            assert_eq!(size.as_str().parse::<LogoSize>().unwrap(), size);
        }
        assert!("xxl".parse::<LogoSize>().is_err());
    }

    #[test]
    fn test_default_logo_markup() {
        let html = Logo::default().render().unwrap();
        assert!(html.contains(r#"src="/MoringaLogo_horizontal_color.png""#));
        assert!(html.contains(r#"alt="Eleve Logo""#));
        assert!(html.contains("h-10 w-auto object-contain"));
        assert!(!html.contains(LOGO_TEXT));
        assert!(!html.contains("rounded-full"));
    }

    #[test]
    fn test_badge_with_text_and_class() {
        let html = Logo::new(LogoSize::Xl)
            .with_class("mx-auto")
            .with_text()
            .badge()
            .render()
            .unwrap();
        assert!(html.contains("flex items-center rounded-full bg-white px-3 py-1 shadow-sm mx-auto"));
        assert!(html.contains("h-20"));
        assert!(html.contains("text-4xl"));
        assert!(html.contains(LOGO_TEXT));
    }
}
