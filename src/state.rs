use std::sync::Arc;

use crate::audit::HolidayCalendar;
use crate::config::AppConfig;
use crate::ingest::{Ingestor, PageRenderer};
use crate::search::DocIndex;

/// Shared application state / 共享应用状态
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub index: DocIndex,
    pub ingestor: Ingestor,
    /// Loaded once at startup, never modified / 启动时加载，之后只读
    pub holidays: Arc<HolidayCalendar>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        index: DocIndex,
        holidays: HolidayCalendar,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        let config = Arc::new(config);
        let ingestor = Ingestor::new(index.clone(), config.clone(), renderer);
        Self {
            config,
            index,
            ingestor,
            holidays: Arc::new(holidays),
        }
    }
}
