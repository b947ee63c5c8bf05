use crate::clock::{Clock, SystemClock};
use crate::store::AppData;
use crate::template::Template;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub clock: Arc<dyn Clock>,
    pub template: Arc<Template>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData, template: Template) -> Self {
        Self::with_clock(data_path, data, template, Arc::new(SystemClock))
    }

    pub fn with_clock(
        data_path: PathBuf,
        data: AppData,
        template: Template,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            clock,
            template: Arc::new(template),
        }
    }
}
