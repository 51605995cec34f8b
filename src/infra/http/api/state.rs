use crate::cache::CatalogCache;

#[derive(Clone)]
pub struct ApiState {
    pub catalog: CatalogCache,
}
