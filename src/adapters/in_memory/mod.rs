pub mod store;

pub use store::InMemoryLibraryStore;
