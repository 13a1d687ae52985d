//! The storefront shell: routing, gating, lazy pages and chrome.
//!
//! # Visiting a path
//!
//! 1. Record the navigation and bump the generation counter
//! 2. Resolve the route; unknown paths render the not-found page
//! 3. Admin routes wait for the session to settle, then either continue or
//!    redirect to `/auth`
//! 4. Load the page module (first visit only)
//! 5. Drop the result if another visit started in the meantime
//! 6. Render the page inside its chrome and the document shell

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use am_botanics_client::{
    ApiClient, LoginFailure, SessionSnapshot, SessionStore, TokenStore, provide_session,
};
use am_botanics_core::SessionUser;
use secrecy::SecretString;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::config::StorefrontConfig;
use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::gate::{AdminGate, GateDecision};
use crate::loading::LoadingIndicator;
use crate::navigation::{LoginRedirect, Navigator, is_login_route};
use crate::pages::{PageContext, PageRegistry};
use crate::preload::ProductPreload;
use crate::routes::{Chrome, PageId, RouteDescriptor, RouteTable, normalize_path};
use crate::views::{
    self, ADMIN_NAV, AdminLayout, AdminLoadingView, DocumentView, FOOTER_NAV, GateLoadingView,
    LoadFailedView, Logo, LogoSize, NotFoundView, PUBLIC_NAV, PageLoadingView, PublicLayout,
    Viewer,
};

/// How far a rendered view got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    /// Page content is shown.
    Ready,
    /// A placeholder is shown while the session or page module loads.
    Loading,
    /// No route matched.
    NotFound,
    /// The page module failed to load.
    Failed,
}

/// A rendered HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    /// How far rendering got.
    pub status: ViewStatus,
    /// Page shown, `None` for the not-found page.
    pub page: Option<PageId>,
    /// Complete HTML document.
    pub html: String,
}

/// Outcome of rendering a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// A document was rendered.
    View(View),
    /// The gate refused; the navigator has been sent to `to`.
    Redirect {
        /// Route the navigator was sent to.
        to: &'static str,
    },
    /// A later navigation started before this one finished.
    Superseded,
}

impl Rendered {
    /// The view, if one was rendered.
    #[must_use]
    pub const fn view(&self) -> Option<&View> {
        match self {
            Self::View(view) => Some(view),
            Self::Redirect { .. } | Self::Superseded => None,
        }
    }
}

/// Background work kicked off by [`Shell::start`].
#[derive(Debug)]
pub struct Startup {
    /// Session rehydration.
    pub session: JoinHandle<()>,
    /// Product catalogue preload.
    pub preload: JoinHandle<()>,
}

/// Storefront shell.
pub struct Shell {
    config: StorefrontConfig,
    routes: RouteTable,
    session: SessionStore,
    pages: PageRegistry,
    navigator: Arc<dyn Navigator>,
    preload: ProductPreload,
    loading: LoadingIndicator,
    generation: AtomicU64,
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("pages", &self.pages)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Shell {
    /// Build a shell whose client reads tokens from `tokens`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialised.
    pub fn new(
        config: StorefrontConfig,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let client = ApiClient::new(config.api.clone(), tokens)?;
        Ok(Self::with_client(config, client, navigator))
    }

    /// Build a shell around an existing client.
    ///
    /// Registers the session store and then the login redirect as `401`
    /// handlers, so the session is already anonymous when the redirect runs.
    #[must_use]
    pub fn with_client(
        config: StorefrontConfig,
        client: ApiClient,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let session = SessionStore::new(client.clone());
        client.add_unauthorized_handler(LoginRedirect::new(Arc::clone(&navigator)));
        let preload = ProductPreload::new(client);

        Self {
            config,
            routes: RouteTable::standard(),
            session,
            pages: PageRegistry::with_defaults(),
            navigator,
            preload,
            loading: LoadingIndicator::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Replace the page registry.
    #[must_use]
    pub fn with_pages(mut self, pages: PageRegistry) -> Self {
        self.pages = pages;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    #[must_use]
    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        self.session.client()
    }

    #[must_use]
    pub const fn pages(&self) -> &PageRegistry {
        &self.pages
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    #[must_use]
    pub const fn preload(&self) -> &ProductPreload {
        &self.preload
    }

    #[must_use]
    pub const fn loading(&self) -> &LoadingIndicator {
        &self.loading
    }

    /// Start session rehydration and the product preload in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> Startup {
        info!(base_url = %self.client().base_url(), "Starting storefront shell");
        Startup {
            session: self.session.start(),
            preload: self.preload.start(),
        }
    }

    /// Log in, showing the global overlay while the request is in flight.
    ///
    /// # Errors
    ///
    /// See [`SessionStore::login`].
    pub async fn login(
        &self,
        email: &str,
        password: SecretString,
    ) -> std::result::Result<SessionUser, LoginFailure> {
        let _overlay = self.loading.begin();
        let user = self.session.login(email, password).await?;
        set_sentry_user(&user.id, user.email.as_deref());
        add_breadcrumb("auth", "Logged in", Some(&[("role", user.role.as_str())]));
        Ok(user)
    }

    /// Log out locally.
    pub fn logout(&self) {
        self.session.logout();
        clear_sentry_user();
        add_breadcrumb("auth", "Logged out", None);
    }

    /// Render `path` from what is already known, without waiting on the
    /// session, page loaders or the network, and without navigating.
    ///
    /// # Errors
    ///
    /// Returns an error if a template or page module fails to render.
    pub async fn render_now(&self, path: &str) -> Result<Rendered> {
        let snapshot = self.session.snapshot();
        let Some(matched) = self.routes.resolve(path) else {
            return self.not_found(path, &snapshot);
        };
        let route = matched.route;

        if route.is_admin() {
            match GateDecision::evaluate(&snapshot) {
                GateDecision::Loading => {
                    let body = views::render(&GateLoadingView)?;
                    return self.document(ViewStatus::Loading, Some(route.page), &body);
                }
                GateDecision::Redirect(to) => return Ok(Rendered::Redirect { to }),
                GateDecision::Allow => {}
            }
        }

        let Some(module) = self.pages.loaded(route.page) else {
            return match route.chrome {
                Chrome::Public => {
                    let body = views::render(&PageLoadingView)?;
                    self.framed(route, ViewStatus::Loading, &body, &snapshot)
                }
                // The admin layout is part of the lazily loaded bundle.
                Chrome::Admin => {
                    let body = views::render(&AdminLoadingView)?;
                    self.document(ViewStatus::Loading, Some(route.page), &body)
                }
            };
        };

        let products = self.preload.cached().await;
        let body = module.render(&PageContext {
            route: &matched,
            session: &snapshot,
            products: products.as_ref(),
        })?;
        self.framed(route, ViewStatus::Ready, &body, &snapshot)
    }

    /// Navigate to `path` and render it once the gate and page module are
    /// ready.
    ///
    /// # Errors
    ///
    /// Returns an error if a template or page module fails to render. A page
    /// module that fails to *load* is reported and rendered as a retry page.
    #[instrument(skip(self), fields(generation = tracing::field::Empty))]
    pub async fn visit(&self, path: &str) -> Result<Rendered> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::Span::current().record("generation", generation);

        self.navigator.navigate(path);
        add_breadcrumb("navigation", "Visited page", Some(&[("path", path)]));

        let Some(matched) = self.routes.resolve(path) else {
            info!(path, "No route matches");
            return self.not_found(path, &self.session.snapshot());
        };
        let route = matched.route;

        if route.is_admin() {
            let decision =
                provide_session(self.session.clone(), async { AdminGate::new().settled().await })
                    .await;
            if !self.is_current(generation) {
                return Ok(superseded(path));
            }
            if let GateDecision::Redirect(to) = decision {
                return Ok(self.redirect(to));
            }
        }

        let loaded = self.pages.load(route.page).await;
        if !self.is_current(generation) {
            return Ok(superseded(path));
        }
        let snapshot = self.session.snapshot();

        let module = match loaded {
            Ok(module) => module,
            Err(e) => {
                e.report();
                let body = views::render(&LoadFailedView {
                    heading: route.page.title(),
                    path: &normalize_path(path),
                })?;
                return self.framed(route, ViewStatus::Failed, &body, &snapshot);
            }
        };

        // The session may have ended while the module was loading.
        if route.is_admin()
            && let GateDecision::Redirect(to) = GateDecision::evaluate(&snapshot)
        {
            return Ok(self.redirect(to));
        }

        let products = self.preload.cached().await;
        let body = module.render(&PageContext {
            route: &matched,
            session: &snapshot,
            products: products.as_ref(),
        })?;
        self.framed(route, ViewStatus::Ready, &body, &snapshot)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    fn redirect(&self, to: &'static str) -> Rendered {
        if is_login_route(&self.navigator.current_path()) {
            debug!(to, "Already on login route");
        } else {
            info!(to, "Admin gate refused; redirecting");
            self.navigator.navigate(to);
        }
        Rendered::Redirect { to }
    }

    fn not_found(&self, path: &str, snapshot: &SessionSnapshot) -> Result<Rendered> {
        let body = views::render(&NotFoundView { path })?;
        let framed = self.public_chrome(true, &body, snapshot)?;
        self.document(ViewStatus::NotFound, None, &framed)
    }

    fn framed(
        &self,
        route: &RouteDescriptor,
        status: ViewStatus,
        body: &str,
        snapshot: &SessionSnapshot,
    ) -> Result<Rendered> {
        let framed = match route.chrome {
            Chrome::Public => self.public_chrome(route.contact_widget, body, snapshot)?,
            Chrome::Admin => admin_chrome(route.pattern, body, snapshot)?,
        };
        self.document(status, Some(route.page), &framed)
    }

    fn public_chrome(
        &self,
        contact_widget: bool,
        content: &str,
        snapshot: &SessionSnapshot,
    ) -> Result<String> {
        let viewer = viewer(snapshot);
        views::render(&PublicLayout {
            logo: views::render(&Logo::new(LogoSize::Md))?,
            footer_logo: views::render(&Logo::new(LogoSize::Lg).badge().with_text())?,
            nav: PUBLIC_NAV,
            footer_nav: FOOTER_NAV,
            viewer: &viewer,
            content,
            contact_href: contact_widget.then(|| self.config.site.contact_href()),
        })
    }

    fn document(&self, status: ViewStatus, page: Option<PageId>, body: &str) -> Result<Rendered> {
        let html = views::render(&DocumentView {
            title: &self.config.site.title,
            description: &self.config.site.description,
            body,
            overlay: self.loading.is_active(),
        })?;
        Ok(Rendered::View(View { status, page, html }))
    }
}

fn admin_chrome(active: &str, content: &str, snapshot: &SessionSnapshot) -> Result<String> {
    let viewer = viewer(snapshot);
    views::render(&AdminLayout {
        logo: views::render(&Logo::new(LogoSize::Sm).with_text())?,
        nav: ADMIN_NAV,
        active,
        viewer: &viewer,
        content,
    })
}

fn viewer(snapshot: &SessionSnapshot) -> Viewer {
    Viewer {
        name: snapshot.user().map(|user| user.display_name().to_string()),
        is_admin: snapshot.is_admin(),
    }
}

fn superseded(path: &str) -> Rendered {
    debug!(path, "Navigation superseded; discarding result");
    Rendered::Superseded
}
