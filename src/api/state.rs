use crate::service::theater::TheaterService;

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * The service behind the dashboard pages.
     */
    pub theater_service: TheaterService,
}

impl AppState {
    /**
     * Creates a new instance of `AppState`.
     *
     * # Arguments
     * `theater_service`: The service behind the dashboard pages.
     */
    pub fn new(theater_service: TheaterService) -> Self {
        AppState { theater_service }
    }
}
