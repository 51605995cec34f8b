use std::sync::Arc;

use crate::application::admin::{AdminProductService, AdminTaxonomyService};
use crate::application::images::ImageService;
use crate::application::session::SessionService;
use crate::cache::CatalogCache;
use crate::config::SessionSettings;

#[derive(Clone)]
pub struct AdminState {
    pub session: Arc<SessionService>,
    pub session_settings: SessionSettings,
    pub products: Arc<AdminProductService>,
    pub taxonomy: Arc<AdminTaxonomyService>,
    pub images: Arc<ImageService>,
    pub catalog: CatalogCache,
}
