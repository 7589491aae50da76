// Main library file for the travel planner

pub mod config;
pub mod flight_search;
pub mod itinerary;
pub mod offers;
pub mod planner;
pub mod render;
pub mod server;
pub mod trip;

#[cfg(test)]
mod test_support;

// Re-export key types for convenience
pub use crate::config::{AppConfig, ConfigError};
pub use flight_search::{
    fetch_offers, FlightLookup, FlightSearch, FlightStatus, SearchError, SerpApiClient,
};
pub use itinerary::{GeminiClient, ItineraryCrew, ItineraryError, ItineraryGenerator, LanguageModel};
pub use offers::{format_timestamp, select_cheapest, FlightLeg, FlightOffer, Money};
pub use planner::{ItineraryOutcome, TripPlan, TripPlanner};
pub use render::{PageRenderer, RenderError};
pub use trip::{TripBrief, TripForm, TripFormError, TripRequest};
