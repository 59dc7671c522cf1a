// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Itinerary, SearchCriteria, OrientationPreference, AgeRange, DayWindow, NO_PREFERENCE};
pub use requests::{SearchItinerariesRequest, RecordViewRequest, CriteriaError};
pub use responses::{SearchItinerariesResponse, HealthResponse, ErrorResponse, RecordViewResponse};
