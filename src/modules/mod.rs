pub mod books;

use shelf_db::Database;
use shelf_kernel::ModuleRegistry;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: &Database) {
    registry.register(books::create_module(db.clone()));
}
