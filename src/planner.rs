// End-to-end handling of one trip submission

use std::sync::Arc;
use tracing::{info, warn};

use crate::flight_search::{fetch_offers, FlightSearch, FlightStatus};
use crate::itinerary::ItineraryGenerator;
use crate::offers::FlightOffer;
use crate::trip::{TripBrief, TripRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum ItineraryOutcome {
    Generated(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct TripPlan {
    pub offers: Vec<FlightOffer>,
    pub flight_status: FlightStatus,
    pub itinerary: ItineraryOutcome,
}

#[derive(Clone)]
pub struct TripPlanner {
    flights: Arc<dyn FlightSearch>,
    itinerary: Arc<dyn ItineraryGenerator>,
}

impl TripPlanner {
    pub fn new(flights: Arc<dyn FlightSearch>, itinerary: Arc<dyn ItineraryGenerator>) -> Self {
        Self { flights, itinerary }
    }

    /// Fetch and rank flights, then generate the itinerary.
    ///
    /// The two calls never overlap, and a failure in one does not stop the other.
    pub async fn plan(&self, request: &TripRequest, brief: &TripBrief) -> TripPlan {
        info!(
            origin = request.origin(),
            destination = request.destination(),
            "Planning trip"
        );

        let lookup = fetch_offers(self.flights.as_ref(), request).await;

        let itinerary = match self.itinerary.generate(brief, &lookup.offers).await {
            Ok(text) => ItineraryOutcome::Generated(text),
            Err(e) => {
                warn!(error = %e, "Itinerary generation failed");
                ItineraryOutcome::Failed(e.to_string())
            }
        };

        TripPlan {
            offers: lookup.offers,
            flight_status: lookup.status,
            itinerary,
        }
    }
}
