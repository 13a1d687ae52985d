//! Page commands: `visit`, `routes`.

use am_botanics_storefront::{Chrome, Rendered, RouteTable, Shell};

use super::CommandError;

/// Render `path` the way the browser shell would after startup.
pub async fn visit(shell: &Shell, path: &str) -> Result<(), CommandError> {
    let startup = shell.start();
    // A product page rendered before the preload lands would look empty.
    if let Err(e) = startup.preload.await {
        tracing::warn!(error = %e, "Product preload task failed");
    }

    match shell.visit(path).await? {
        Rendered::View(view) => {
            tracing::info!(status = ?view.status, page = ?view.page, "Rendered");
            #[allow(clippy::print_stdout)]
            {
                println!("{}", view.html);
            }
        }
        Rendered::Redirect { to } => {
            #[allow(clippy::print_stdout)]
            {
                println!("Redirected to {to}");
            }
        }
        Rendered::Superseded => {
            tracing::warn!(path, "Navigation superseded");
        }
    }
    Ok(())
}

/// Print the route table.
pub fn routes() {
    for route in RouteTable::standard().routes() {
        let chrome = match route.chrome {
            Chrome::Public => "public",
            Chrome::Admin => "admin",
        };
        let widget = if route.contact_widget { "contact" } else { "-" };

        #[allow(clippy::print_stdout)]
        {
            println!("{:<22} {:<20} {:<7} {widget}", route.pattern, route.page.as_str(), chrome);
        }
    }
}
