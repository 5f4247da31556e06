//! In-N-Out Books API
//!
//! Book catalogue CRUD, user registration, and password reset served over
//! in-memory collections. Modules plug into the bookshelf kernel and are
//! mounted by `bookshelf-http`.

pub mod modules;

use anyhow::Context;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub use modules::Collections;

/// Build a registry holding every module, wired to `collections`
pub fn build_registry(
    settings: &Settings,
    collections: &Collections,
) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, collections, settings)
        .context("failed to register modules")?;
    Ok(registry)
}

/// Run the API until a shutdown signal arrives
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let collections = Collections::in_memory(&settings);
    let registry = build_registry(&settings, &collections)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served =
        bookshelf_http::start_server(&registry, &settings, bookshelf_http::shutdown_signal()).await;

    registry.stop_all().await?;
    served
}
