pub mod books;
pub mod landing;
pub mod users;

use std::sync::Arc;

use bookshelf_kernel::{settings::Settings, ModuleRegistry};
use bookshelf_store::MemoryCollection;

use books::{models::seed_catalogue, BookCollection};
use users::{password::PasswordHasher, UserCollection};

/// Data collaborators handed to the modules
#[derive(Clone)]
pub struct Collections {
    pub books: BookCollection,
    pub users: UserCollection,
}

impl Collections {
    /// In-memory collections, seeded according to `settings.store`
    pub fn in_memory(settings: &Settings) -> Self {
        let books = if settings.store.seed_books {
            MemoryCollection::with_records(seed_catalogue())
        } else {
            MemoryCollection::new()
        };

        Self {
            books: Arc::new(books),
            users: Arc::new(MemoryCollection::new()),
        }
    }
}

/// Register all project modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    collections: &Collections,
    settings: &Settings,
) -> anyhow::Result<()> {
    let hasher = PasswordHasher::from_settings(&settings.auth)?;

    registry.register(landing::create_module())?;
    registry.register(books::create_module(Arc::clone(&collections.books)))?;
    registry.register(users::create_module(
        Arc::clone(&collections.users),
        hasher,
    ))?;
    Ok(())
}
