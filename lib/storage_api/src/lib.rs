mod model;
pub use model::{FileContent, TokenRelationship};

mod entities;
pub use entities::ReadEntities;

mod contracts;
pub use contracts::ReadContracts;

mod tokens;
pub use tokens::ReadTokenRelationships;

mod files;
pub use files::ReadFileData;

mod record_files;
pub use record_files::ReadRecordFiles;

mod error;
pub use error::{RepositoryError, RepositoryResult};
