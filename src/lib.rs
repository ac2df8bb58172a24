// Export modules for use in tests
pub mod autosave;
pub mod identity;
pub mod paginator;
pub mod position;
pub mod provider;
pub mod reconcile;
pub mod renderer;
pub mod search;
pub mod session;
pub mod settings;
pub mod store;
pub mod textflow;
pub mod toc;

pub use autosave::AutoSaver;
pub use paginator::{Geometry, InvalidGeometryError, Page};
pub use position::Position;
pub use provider::{BookProvider, Chapter, EpubProvider, InvalidBookError};
pub use session::{ReaderSession, SessionOptions, View};
pub use store::{Bookmark, JsonStore, PersistenceGateway, ReadingRecord, StorageError};
