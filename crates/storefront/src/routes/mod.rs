//! Client route table.
//!
//! # Route Structure
//!
//! ```text
//! # Public chrome (navbar, footer, contact widget)
//! /                        - Home page
//! /products                - Product listing
//! /product/:id             - Product detail
//! /cart                    - Cart
//! /checkout                - Checkout
//! /orders                  - Order history
//! /order-success           - Order confirmation
//! /contact                 - Contact form
//! /auth                    - Login (no contact widget)
//! /shipping-info           - Shipping information
//! /returns-exchanges       - Returns and exchanges
//! /soap-guide              - Soap guide
//! /faq                     - FAQ
//! /privacy-policy          - Privacy policy
//!
//! # Admin chrome (behind the admin gate)
//! /admin/dashboard         - Dashboard
//! /admin/products          - Product management
//! /admin/orders            - Order management
//! /admin/users             - User management
//! /admin/announcements     - Announcements
//! /admin/reviews           - Review moderation
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// Page modules the shell knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageId {
    Home,
    Products,
    ProductDetail,
    Cart,
    Checkout,
    Orders,
    OrderSuccess,
    Contact,
    Auth,
    ShippingInfo,
    ReturnsExchanges,
    SoapGuide,
    Faq,
    PrivacyPolicy,
    AdminDashboard,
    AdminProducts,
    AdminOrders,
    AdminUsers,
    AdminAnnouncements,
    AdminReviews,
}

impl PageId {
    /// Stable identifier used in logs and markup.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Products => "products",
            Self::ProductDetail => "product-detail",
            Self::Cart => "cart",
            Self::Checkout => "checkout",
            Self::Orders => "orders",
            Self::OrderSuccess => "order-success",
            Self::Contact => "contact",
            Self::Auth => "auth",
            Self::ShippingInfo => "shipping-info",
            Self::ReturnsExchanges => "returns-exchanges",
            Self::SoapGuide => "soap-guide",
            Self::Faq => "faq",
            Self::PrivacyPolicy => "privacy-policy",
            Self::AdminDashboard => "admin-dashboard",
            Self::AdminProducts => "admin-products",
            Self::AdminOrders => "admin-orders",
            Self::AdminUsers => "admin-users",
            Self::AdminAnnouncements => "admin-announcements",
            Self::AdminReviews => "admin-reviews",
        }
    }

    /// Human-readable page heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Products => "Products",
            Self::ProductDetail => "Product Details",
            Self::Cart => "Your Cart",
            Self::Checkout => "Checkout",
            Self::Orders => "My Orders",
            Self::OrderSuccess => "Order Placed",
            Self::Contact => "Contact Us",
            Self::Auth => "Sign In",
            Self::ShippingInfo => "Shipping Information",
            Self::ReturnsExchanges => "Returns & Exchanges",
            Self::SoapGuide => "Soap Guide",
            Self::Faq => "Frequently Asked Questions",
            Self::PrivacyPolicy => "Privacy Policy",
            Self::AdminDashboard => "Dashboard",
            Self::AdminProducts => "Products",
            Self::AdminOrders => "Orders",
            Self::AdminUsers => "Users",
            Self::AdminAnnouncements => "Announcements",
            Self::AdminReviews => "Reviews",
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout wrapped around a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chrome {
    /// Navbar, footer and optional contact widget.
    Public,
    /// Admin gate, then the admin layout.
    Admin,
}

/// One row of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Path pattern; `:name` segments capture a parameter.
    pub pattern: &'static str,
    /// Page rendered for this route.
    pub page: PageId,
    /// Layout variant.
    pub chrome: Chrome,
    /// Whether the floating contact widget is shown.
    pub contact_widget: bool,
}

impl RouteDescriptor {
    const fn public(pattern: &'static str, page: PageId) -> Self {
        Self {
            pattern,
            page,
            chrome: Chrome::Public,
            contact_widget: true,
        }
    }

    const fn admin(pattern: &'static str, page: PageId) -> Self {
        Self {
            pattern,
            page,
            chrome: Chrome::Admin,
            contact_widget: false,
        }
    }

    const fn without_contact_widget(mut self) -> Self {
        self.contact_widget = false;
        self
    }

    /// Whether the route sits behind the admin gate.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.chrome, Chrome::Admin)
    }

    fn matches(&self, segments: &[&str]) -> Option<BTreeMap<&'static str, String>> {
        let pattern: Vec<&'static str> = split_segments(self.pattern).collect();
        if pattern.len() != segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (expected, actual) in pattern.into_iter().zip(segments) {
            if let Some(name) = expected.strip_prefix(':') {
                params.insert(name, (*actual).to_string());
            } else if expected != *actual {
                return None;
            }
        }
        Some(params)
    }
}

static ROUTES: &[RouteDescriptor] = &[
    RouteDescriptor::public("/", PageId::Home),
    RouteDescriptor::public("/products", PageId::Products),
    RouteDescriptor::public("/product/:id", PageId::ProductDetail),
    RouteDescriptor::public("/cart", PageId::Cart),
    RouteDescriptor::public("/checkout", PageId::Checkout),
    RouteDescriptor::public("/orders", PageId::Orders),
    RouteDescriptor::public("/order-success", PageId::OrderSuccess),
    RouteDescriptor::public("/contact", PageId::Contact),
    RouteDescriptor::public("/auth", PageId::Auth).without_contact_widget(),
    RouteDescriptor::public("/shipping-info", PageId::ShippingInfo),
    RouteDescriptor::public("/returns-exchanges", PageId::ReturnsExchanges),
    RouteDescriptor::public("/soap-guide", PageId::SoapGuide),
    RouteDescriptor::public("/faq", PageId::Faq),
    RouteDescriptor::public("/privacy-policy", PageId::PrivacyPolicy),
    RouteDescriptor::admin("/admin/dashboard", PageId::AdminDashboard),
    RouteDescriptor::admin("/admin/products", PageId::AdminProducts),
    RouteDescriptor::admin("/admin/orders", PageId::AdminOrders),
    RouteDescriptor::admin("/admin/users", PageId::AdminUsers),
    RouteDescriptor::admin("/admin/announcements", PageId::AdminAnnouncements),
    RouteDescriptor::admin("/admin/reviews", PageId::AdminReviews),
];

/// A resolved route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Matched table row.
    pub route: &'static RouteDescriptor,
    /// Captured `:name` parameters.
    pub params: BTreeMap<&'static str, String>,
}

impl RouteMatch {
    /// Captured parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Immutable path-to-page mapping.
#[derive(Debug, Clone, Copy)]
pub struct RouteTable {
    routes: &'static [RouteDescriptor],
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RouteTable {
    /// The storefront's routes.
    #[must_use]
    pub const fn standard() -> Self {
        Self { routes: ROUTES }
    }

    /// All rows in declaration order.
    #[must_use]
    pub const fn routes(&self) -> &'static [RouteDescriptor] {
        self.routes
    }

    /// Find the route for `path`. Query strings, fragments and trailing
    /// slashes are ignored.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let segments: Vec<&str> = split_segments(strip_query(path)).collect();
        self.routes.iter().find_map(|route| {
            route
                .matches(&segments)
                .map(|params| RouteMatch { route, params })
        })
    }
}

/// Path with any query string or fragment removed.
pub(crate) fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or_default()
}

/// `path` reduced to its canonical form: leading slash, no trailing slash,
/// no query.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = split_segments(strip_query(path)).collect();
    format!("/{}", segments.join("/"))
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_resolves_to_itself() {
        let table = RouteTable::standard();
        for route in table.routes() {
            let path = route.pattern.replace(":id", "abc123");
            let matched = table.resolve(&path).unwrap();
            assert_eq!(matched.route.page, route.page, "{path}");
        }
    }

    #[test]
    fn test_product_detail_captures_id() {
        let matched = RouteTable::standard().resolve("/product/64f0c2").unwrap();
        assert_eq!(matched.route.page, PageId::ProductDetail);
        assert_eq!(matched.param("id"), Some("64f0c2"));
    }

    #[test]
    fn test_trailing_slash_and_query_are_ignored() {
        let table = RouteTable::standard();
        assert_eq!(table.resolve("/faq/").unwrap().route.page, PageId::Faq);
        assert_eq!(
            table.resolve("/products?category=soap").unwrap().route.page,
            PageId::Products
        );
        assert_eq!(table.resolve("").unwrap().route.page, PageId::Home);
    }

    #[test]
    fn test_unknown_paths_do_not_match() {
        let table = RouteTable::standard();
        assert!(table.resolve("/nope").is_none());
        assert!(table.resolve("/product").is_none());
        assert!(table.resolve("/product/1/reviews").is_none());
        assert!(table.resolve("/admin").is_none());
    }

    #[test]
    fn test_contact_widget_hidden_only_on_auth() {
        let table = RouteTable::standard();
        let hidden: Vec<_> = table
            .routes()
            .iter()
            .filter(|r| r.chrome == Chrome::Public && !r.contact_widget)
            .map(|r| r.pattern)
            .collect();
        assert_eq!(hidden, vec!["/auth"]);
    }

    #[test]
    fn test_admin_routes_use_admin_chrome() {
        let table = RouteTable::standard();
        for route in table.routes() {
            assert_eq!(route.is_admin(), route.pattern.starts_with("/admin/"));
        }
        assert_eq!(table.routes().iter().filter(|r| r.is_admin()).count(), 6);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/auth/?next=/cart"), "/auth");
        assert_eq!(normalize_path("products"), "/products");
        assert_eq!(normalize_path("/"), "/");
    }
}
