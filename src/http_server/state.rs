use std::sync::Arc;

use crate::database::Database;
use crate::services::file::FileStore;

pub struct AppState {
    pub db: Arc<Database>,
    pub files: FileStore,
}
