//! Askama views: document head, page chrome and placeholders.

pub mod logo;

use askama::Template;

pub use logo::{LOGO_ALT, LOGO_SRC, Logo, LogoSize, LogoVariant};

use crate::error::Result;
use crate::preload::{PRODUCTS_PATH, ProductSummary};

/// A link in a navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
}

const fn link(href: &'static str, label: &'static str) -> NavLink {
    NavLink { href, label }
}

/// Links in the public navigation bar.
pub const PUBLIC_NAV: &[NavLink] = &[
    link("/", "Home"),
    link("/products", "Products"),
    link("/orders", "Orders"),
    link("/contact", "Contact"),
    link("/cart", "Cart"),
];

/// Links in the footer.
pub const FOOTER_NAV: &[NavLink] = &[
    link("/shipping-info", "Shipping Info"),
    link("/returns-exchanges", "Returns & Exchanges"),
    link("/soap-guide", "Soap Guide"),
    link("/faq", "FAQ"),
    link("/privacy-policy", "Privacy Policy"),
];

/// Links in the admin sidebar.
pub const ADMIN_NAV: &[NavLink] = &[
    link("/admin/dashboard", "Dashboard"),
    link("/admin/products", "Products"),
    link("/admin/orders", "Orders"),
    link("/admin/users", "Users"),
    link("/admin/announcements", "Announcements"),
    link("/admin/reviews", "Reviews"),
];

/// Who the chrome greets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    /// Display name when logged in.
    pub name: Option<String>,
    pub is_admin: bool,
}

/// Full HTML document.
#[derive(Template)]
#[template(path = "document.html")]
pub struct DocumentView<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub body: &'a str,
    /// Show the global "Loading..." overlay.
    pub overlay: bool,
}

impl DocumentView<'_> {
    #[allow(clippy::unused_self)]
    const fn preload_href(&self) -> &'static str {
        PRODUCTS_PATH
    }
}

/// Navbar, footer and contact widget around a public page.
#[derive(Template)]
#[template(path = "layouts/public.html")]
pub struct PublicLayout<'a> {
    pub logo: String,
    pub footer_logo: String,
    pub nav: &'a [NavLink],
    pub footer_nav: &'a [NavLink],
    pub viewer: &'a Viewer,
    pub content: &'a str,
    /// Contact widget target; `None` hides the widget.
    pub contact_href: Option<String>,
}

/// Sidebar layout around an admin page.
#[derive(Template)]
#[template(path = "layouts/admin.html")]
pub struct AdminLayout<'a> {
    pub logo: String,
    pub nav: &'a [NavLink],
    pub active: &'a str,
    pub viewer: &'a Viewer,
    pub content: &'a str,
}

/// Spinner shown while a public page module loads.
#[derive(Template)]
#[template(path = "placeholders/page_loading.html")]
pub struct PageLoadingView;

/// Skeleton shown while an admin page module loads.
#[derive(Template)]
#[template(path = "placeholders/admin_loading.html")]
pub struct AdminLoadingView;

/// Neutral view while the admin gate waits for the session.
#[derive(Template)]
#[template(path = "placeholders/gate_loading.html")]
pub struct GateLoadingView;

/// Unknown path.
#[derive(Template)]
#[template(path = "pages/not_found.html")]
pub struct NotFoundView<'a> {
    pub path: &'a str,
}

/// A page module failed to load.
#[derive(Template)]
#[template(path = "pages/load_failed.html")]
pub struct LoadFailedView<'a> {
    pub heading: &'a str,
    pub path: &'a str,
}

/// Body of the built-in page modules.
#[derive(Template)]
#[template(path = "pages/content.html")]
pub struct PageContentView<'a> {
    pub page: &'a str,
    pub heading: &'a str,
    pub intro: &'a str,
    /// Route parameter worth showing, e.g. the product id.
    pub detail: Option<&'a str>,
    pub products: &'a [ProductSummary],
}

/// Render any view to a string.
///
/// # Errors
///
/// Returns [`crate::ShellError::Render`] when the template fails.
pub fn render(view: &impl Template) -> Result<String> {
    Ok(view.render()?)
}
