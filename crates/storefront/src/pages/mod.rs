//! Lazily loaded page modules.
//!
//! Every route names a [`PageId`]. The registry maps each id to a loader that
//! produces the page module on first use; later visits reuse the loaded
//! module. A failed load leaves the slot empty so the next visit retries.

use std::collections::HashMap;
use std::sync::Arc;

use am_botanics_client::SessionSnapshot;
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::{Result, ShellError};
use crate::preload::product_summaries;
use crate::routes::{PageId, RouteMatch};
use crate::views::{self, PageContentView};

/// Everything a page sees when it renders.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub route: &'a RouteMatch,
    pub session: &'a SessionSnapshot,
    /// Preloaded `/api/products` payload, when available.
    pub products: Option<&'a Value>,
}

/// A loaded page.
pub trait PageModule: Send + Sync {
    /// Page body, without chrome.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be rendered.
    fn render(&self, ctx: &PageContext<'_>) -> Result<String>;
}

/// Produces a page module. Called once per successful load.
pub type PageLoader =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn PageModule>>> + Send + Sync>;

/// Build a [`PageLoader`] from an async closure.
pub fn loader<F, Fut>(f: F) -> PageLoader
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Arc<dyn PageModule>>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Where a page module is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotStarted,
    Loading,
    Ready,
    /// Last attempt failed; the next visit retries.
    Failed(String),
}

struct LazyPage {
    loader: PageLoader,
    module: OnceCell<Arc<dyn PageModule>>,
    state: Mutex<LoadState>,
}

impl LazyPage {
    fn new(loader: PageLoader) -> Self {
        Self {
            loader,
            module: OnceCell::new(),
            state: Mutex::new(LoadState::NotStarted),
        }
    }

    async fn load(&self, page: PageId) -> Result<Arc<dyn PageModule>> {
        let module = self
            .module
            .get_or_try_init(|| async {
                *self.state.lock() = LoadState::Loading;
                debug!(page = %page, "Loading page module");

                match (self.loader)().await {
                    Ok(module) => {
                        *self.state.lock() = LoadState::Ready;
                        info!(page = %page, "Page module loaded");
                        Ok(module)
                    }
                    Err(e) => {
                        warn!(page = %page, error = %e, "Page module failed to load");
                        *self.state.lock() = LoadState::Failed(e.to_string());
                        Err(e)
                    }
                }
            })
            .await?;
        Ok(Arc::clone(module))
    }
}

/// All page modules the shell can show.
pub struct PageRegistry {
    pages: HashMap<PageId, LazyPage>,
}

impl std::fmt::Debug for PageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRegistry")
            .field("pages", &self.pages.len())
            .finish()
    }
}

impl Default for PageRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PageRegistry {
    /// Registry with no pages.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    /// Registry with the built-in module for every route.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for route in crate::routes::RouteTable::standard().routes() {
            let page = route.page;
            registry.register(
                page,
                loader(move || async move {
                    Ok(Arc::new(BuiltinPage { page }) as Arc<dyn PageModule>)
                }),
            );
        }
        registry
    }

    /// Install or replace the loader for `page`. Replacing resets its state.
    pub fn register(&mut self, page: PageId, loader: PageLoader) {
        self.pages.insert(page, LazyPage::new(loader));
    }

    /// Module for `page` if it has already loaded.
    #[must_use]
    pub fn loaded(&self, page: PageId) -> Option<Arc<dyn PageModule>> {
        self.pages
            .get(&page)
            .and_then(|lazy| lazy.module.get().cloned())
    }

    /// Current load state of `page`; `None` when nothing is registered.
    #[must_use]
    pub fn state(&self, page: PageId) -> Option<LoadState> {
        self.pages.get(&page).map(|lazy| lazy.state.lock().clone())
    }

    /// Load `page`, or return it if already loaded. Concurrent callers
    /// share one load.
    ///
    /// # Errors
    ///
    /// Returns the loader's error, or [`ShellError::PageLoad`] when no
    /// loader is registered.
    pub async fn load(&self, page: PageId) -> Result<Arc<dyn PageModule>> {
        let lazy = self.pages.get(&page).ok_or_else(|| ShellError::PageLoad {
            page,
            message: "no module registered".to_string(),
        })?;
        lazy.load(page).await
    }
}

/// Generic page body used when no richer module is registered.
struct BuiltinPage {
    page: PageId,
}

impl BuiltinPage {
    const fn intro(&self) -> &'static str {
        match self.page {
            PageId::Home => "Natural skincare made with moringa and botanical oils.",
            PageId::Products => "Face creams, body creams, soaps and anti-aging care.",
            PageId::ProductDetail => "Ingredients, usage and reviews for this product.",
            PageId::Cart => "Review the items in your cart.",
            PageId::Checkout => "Enter delivery details to place your order.",
            PageId::Orders => "Track the status of your orders.",
            PageId::OrderSuccess => "Thank you! Your order has been received.",
            PageId::Contact => "Questions about an order or a product? Get in touch.",
            PageId::Auth => "Sign in to manage your orders.",
            PageId::ShippingInfo => "Free delivery across Pakistan.",
            PageId::ReturnsExchanges => "How to return or exchange a product.",
            PageId::SoapGuide => "Choosing the right soap for your skin type.",
            PageId::Faq => "Answers to common questions.",
            PageId::PrivacyPolicy => "How we handle your personal data.",
            PageId::AdminDashboard => "Store overview.",
            PageId::AdminProducts => "Manage the product catalogue.",
            PageId::AdminOrders => "Process and update customer orders.",
            PageId::AdminUsers => "Manage customer and admin accounts.",
            PageId::AdminAnnouncements => "Publish site-wide announcements.",
            PageId::AdminReviews => "Moderate product reviews.",
        }
    }
}

impl PageModule for BuiltinPage {
    fn render(&self, ctx: &PageContext<'_>) -> Result<String> {
        let products = match self.page {
            PageId::Home | PageId::Products => {
                ctx.products.map(product_summaries).unwrap_or_default()
            }
            _ => Vec::new(),
        };
        views::render(&PageContentView {
            page: self.page.as_str(),
            heading: self.page.title(),
            intro: self.intro(),
            detail: ctx.route.param("id"),
            products: &products,
        })
    }
}
