use crate::common::{NewLocation, ServerErrorResponse, VeganLocation};
use crate::error::ApiError;
use crate::network::{ApiClient, ApiRequest};
use crate::state::ToastQueue;

/// Search results for vegan locations. Each search replaces the list;
/// created locations are appended.
pub struct LocationStore {
    api: ApiClient,
    toasts: ToastQueue,
    locations: Vec<VeganLocation>,
    search: String,
    page: u32,
    is_loading: bool,
    is_creating: bool,
    is_fetched: bool,
    error: Option<ServerErrorResponse>,
}

impl LocationStore {
    pub fn new(api: ApiClient, toasts: ToastQueue) -> Self {
        Self {
            api,
            toasts,
            locations: Vec::new(),
            search: String::new(),
            page: 0,
            is_loading: false,
            is_creating: false,
            is_fetched: false,
            error: None,
        }
    }

    pub fn locations(&self) -> &[VeganLocation] {
        &self.locations
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_creating(&self) -> bool {
        self.is_creating
    }

    /// True once any search has succeeded.
    pub fn is_fetched(&self) -> bool {
        self.is_fetched
    }

    pub fn error(&self) -> Option<&ServerErrorResponse> {
        self.error.as_ref()
    }

    pub async fn load_locations(&mut self, page: u32, search: &str) -> Result<(), ApiError> {
        self.is_loading = true;
        let request = ApiRequest::get("vegan-locations")
            .with_query("search", search)
            .with_query("page", page);
        let result = self.api.json::<Vec<VeganLocation>>(request).await;
        self.is_loading = false;

        match result {
            Ok(locations) => {
                self.locations = locations;
                self.search = search.to_string();
                self.page = page;
                self.is_fetched = true;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                log::error!("Error fetching locations: {err}");
                self.error = err.payload().cloned();
                Err(err)
            }
        }
    }

    pub async fn create_location(&mut self, location: &NewLocation) -> Result<VeganLocation, ApiError> {
        self.is_creating = true;
        let result = self
            .api
            .post::<_, VeganLocation>("vegan-locations", location)
            .await;
        self.is_creating = false;

        match result {
            Ok(created) => {
                self.locations.retain(|existing| existing.id != created.id);
                self.locations.push(created.clone());
                self.error = None;
                self.toasts.success("Location created successfully, thank you!");
                Ok(created)
            }
            Err(err) => {
                log::error!("Error creating location: {err}");
                self.error = err.payload().cloned();
                Err(err)
            }
        }
    }
}
