// Itinerary generation: a language model client and a three-agent crew that
// researches the destination, picks stays and restaurants, then plans each day

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::GeminiConfig;
use crate::offers::{display_time, FlightOffer};
use crate::trip::{Choice, TripBrief};

#[derive(Error, Debug)]
pub enum ItineraryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0}s")]
    Timeout(u64),

    #[error("Model API error: {status_code} - {message}")]
    Api { status_code: u16, message: String },

    #[error("Malformed model response: {0}")]
    Decode(String),

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Client error: {0}")]
    Client(String),
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ItineraryError>;
}

#[async_trait]
pub trait ItineraryGenerator: Send + Sync {
    /// Produce the itinerary text shown to the traveller.
    async fn generate(
        &self,
        brief: &TripBrief,
        offers: &[FlightOffer],
    ) -> Result<String, ItineraryError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    // Text of the first candidate, parts joined in order
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn from_config(config: &GeminiConfig) -> Result<Self, ItineraryError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ItineraryError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> ItineraryError {
        if err.is_timeout() {
            ItineraryError::Timeout(self.timeout_secs)
        } else {
            ItineraryError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ItineraryError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!(model = %self.model, prompt_len = prompt.len(), "Calling language model");

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ItineraryError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let decoded: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ItineraryError::Decode(e.to_string()))?;

        decoded.into_text().ok_or(ItineraryError::EmptyResponse)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentProfile {
    pub role: &'static str,
    pub goal: String,
    pub backstory: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrewTask {
    pub agent: AgentProfile,
    pub description: String,
    pub expected_output: String,
}

impl CrewTask {
    // Earlier stage outputs are appended as context, labelled by the agent that wrote them
    pub fn prompt(&self, context: &[(&'static str, String)]) -> String {
        let mut prompt = format!(
            "You are the {}. {}\n\nYour goal: {}\n\nTask:\n{}\n\nExpected output:\n{}\n",
            self.agent.role,
            self.agent.backstory,
            self.agent.goal,
            self.description,
            self.expected_output
        );

        for (role, output) in context {
            prompt.push_str(&format!("\n--- Findings from the {} ---\n{}\n", role, output));
        }

        prompt
    }
}

pub fn flight_summary(offers: &[FlightOffer]) -> String {
    if offers.is_empty() {
        return "No flight data available.".to_string();
    }

    offers
        .iter()
        .enumerate()
        .map(|(idx, offer)| {
            let price = offer
                .price
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "price not available".to_string());
            format!(
                "{}. {} | departs {} | arrives {} | {}",
                idx + 1,
                offer.airline(),
                display_time(offer.departure_time()),
                display_time(offer.arrival_time()),
                price
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The crew's tasks in execution order.
pub fn crew_tasks(brief: &TripBrief, offers: &[FlightOffer]) -> Vec<CrewTask> {
    let destination = &brief.destination;
    let days = brief.num_days;
    let theme = brief.theme.label();

    let researcher = AgentProfile {
        role: "Travel Researcher",
        goal: format!(
            "Gather comprehensive information on {} for a {}-day {} trip.",
            destination, days, theme
        ),
        backstory: "An expert travel analyst who specializes in finding detailed information \
                    about destinations, including climate, culture, popular attractions, and safety tips.",
    };

    let concierge = AgentProfile {
        role: "Accommodation and Dining Expert",
        goal: format!(
            "Find the best hotels and restaurants in {} based on user preferences.",
            destination
        ),
        backstory: "A seasoned concierge who knows the best places to stay and eat. They prioritize \
                    high ratings, proximity to attractions, and alignment with the user's budget and theme.",
    };

    let planner = AgentProfile {
        role: "Itinerary Planner",
        goal: format!(
            "Create a personalized, detailed {}-day itinerary for the trip to {}.",
            days, destination
        ),
        backstory: "A meticulous planner who excels at crafting day-by-day travel plans, \
                    including activities, timings, and transportation options, tailored to user preferences.",
    };

    vec![
        CrewTask {
            agent: researcher,
            description: format!(
                "1. Search for popular attractions, landmarks, and must-visit places in {dest}.\n\
                 2. Research activities that match the traveller's interests: {activities}.\n\
                 3. Find information on the local climate and culture.\n\
                 4. Provide a well-structured summary of the findings.\n\
                 Ensure the information is relevant for a {theme} trip.",
                dest = destination,
                activities = brief.activities,
                theme = theme.to_lowercase(),
            ),
            expected_output: format!(
                "A detailed markdown report with sections for 'Top Attractions', 'Local Activities', \
                 'Climate & Culture', and 'Safety Tips' for {}. The output should be easy to read \
                 and directly usable for itinerary planning.",
                destination
            ),
        },
        CrewTask {
            agent: concierge,
            description: format!(
                "1. Identify the top-rated hotels in {dest} that match the user's preferences: \
                 Budget: {budget}, Hotel Rating: {rating}.\n\
                 2. Find highly-rated restaurants near the main attractions, considering the \
                 traveller's theme: {theme}.\n\
                 3. Provide a list of options for both, including ratings and a brief description.",
                dest = destination,
                budget = brief.budget.label(),
                rating = brief.hotel_rating.label(),
                theme = theme,
            ),
            expected_output: format!(
                "A list of 3-5 top hotel recommendations and 3-5 top restaurant recommendations \
                 for {}. Each recommendation should include the name, star rating, a brief \
                 description, and its approximate location.",
                destination
            ),
        },
        CrewTask {
            agent: planner,
            description: format!(
                "Create a detailed, day-by-day itinerary for a {}-day trip to {}. The plan should \
                 incorporate the research findings from the 'Travel Researcher' and the hotel/restaurant \
                 recommendations from the 'Accommodation and Dining Expert'.\n\
                 Consider the traveller's preferences: Theme: {}, Activities: {}, Budget: {}, \
                 Flight class: {}.\n\
                 Cheapest flight options found:\n{}\n\
                 The itinerary should include scheduled activities, estimated travel times, and \
                 suggestions for meals.",
                days,
                destination,
                theme,
                brief.activities,
                brief.budget.label(),
                brief.flight_class.label(),
                flight_summary(offers)
            ),
            expected_output: format!(
                "A complete, structured travel itinerary for a {}-day trip to {}. The output should \
                 be formatted clearly with headings for each day, listing morning, afternoon, and \
                 evening activities, and incorporating flight details and hotel/restaurant suggestions.",
                days, destination
            ),
        },
    ]
}

/// Runs the crew's tasks one after another; the last task's output is the itinerary.
pub struct ItineraryCrew {
    model: Arc<dyn LanguageModel>,
}

impl ItineraryCrew {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl ItineraryGenerator for ItineraryCrew {
    async fn generate(
        &self,
        brief: &TripBrief,
        offers: &[FlightOffer],
    ) -> Result<String, ItineraryError> {
        let mut context: Vec<(&'static str, String)> = Vec::new();

        for task in crew_tasks(brief, offers) {
            info!(agent = task.agent.role, "Running crew task");
            let output = self.model.generate(&task.prompt(&context)).await?;
            context.push((task.agent.role, output));
        }

        context
            .pop()
            .map(|(_, itinerary)| itinerary)
            .ok_or(ItineraryError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offers::select_cheapest;
    use crate::test_support::{closed_endpoint, spawn_stub};
    use crate::trip::{BudgetTier, FlightClass, HotelRating, TravelTheme};
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    fn test_brief() -> TripBrief {
        TripBrief {
            destination: "DEL".to_string(),
            num_days: 3,
            theme: TravelTheme::FamilyVacation,
            activities: "Museums, street food".to_string(),
            budget: BudgetTier::Economy,
            flight_class: FlightClass::Business,
            hotel_rating: HotelRating::ThreeStar,
        }
    }

    fn test_config(base_url: String) -> GeminiConfig {
        GeminiConfig {
            api_key: "gemini_key".to_string(),
            base_url,
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 5,
        }
    }

    // Records every prompt and answers with the stage number
    struct ScriptedModel {
        prompts: Mutex<Vec<String>>,
        fail_at: Option<usize>,
    }

    impl ScriptedModel {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail_at,
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String, ItineraryError> {
            let mut prompts = self.prompts.lock().unwrap();
            let stage = prompts.len();
            prompts.push(prompt.to_string());
            if self.fail_at == Some(stage) {
                return Err(ItineraryError::EmptyResponse);
            }
            Ok(format!("output of stage {}", stage))
        }
    }

    #[tokio::test]
    async fn test_crew_runs_tasks_in_order_with_context() {
        let model = Arc::new(ScriptedModel::new(None));
        let crew = ItineraryCrew::new(model.clone());

        let itinerary = assert_ok!(crew.generate(&test_brief(), &[]).await);
        assert_eq!(itinerary, "output of stage 2");

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].starts_with("You are the Travel Researcher."));
        assert!(!prompts[0].contains("Findings from"));
        assert!(prompts[1].starts_with("You are the Accommodation and Dining Expert."));
        assert!(prompts[1].contains("--- Findings from the Travel Researcher ---\noutput of stage 0"));
        assert!(prompts[2].starts_with("You are the Itinerary Planner."));
        assert!(prompts[2].contains("output of stage 0"));
        assert!(prompts[2].contains("output of stage 1"));
    }

    #[tokio::test]
    async fn test_crew_stops_at_first_failure() {
        let model = Arc::new(ScriptedModel::new(Some(1)));
        let crew = ItineraryCrew::new(model.clone());

        let result = crew.generate(&test_brief(), &[]).await;
        assert!(matches!(result, Err(ItineraryError::EmptyResponse)));
        assert_eq!(model.prompts.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_tasks_carry_trip_preferences() {
        let tasks = crew_tasks(&test_brief(), &[]);

        assert_eq!(tasks.len(), 3);
        assert!(tasks[0].agent.goal.contains("3-day Family Vacation trip"));
        assert!(tasks[0].description.contains("Museums, street food"));
        assert!(tasks[0].description.ends_with("relevant for a family vacation trip."));
        for section in ["'Top Attractions'", "'Local Activities'", "'Climate & Culture'", "'Safety Tips'"] {
            assert!(tasks[0].expected_output.contains(section));
        }
        assert!(tasks[1].description.contains("Budget: Economy, Hotel Rating: 3 Star"));
        assert!(tasks[1].description.contains("traveller's theme: Family Vacation"));
        assert!(tasks[1]
            .expected_output
            .starts_with("A list of 3-5 top hotel recommendations and 3-5 top restaurant recommendations"));
        assert!(tasks[2].description.contains("Flight class: Business"));
        assert!(tasks[2].description.contains("No flight data available."));
    }

    #[test]
    fn test_flight_summary_lists_ranked_offers() {
        let offers = select_cheapest(&json!({
            "search_parameters": {"currency": "INR"},
            "best_flights": [
                {"price": 4200, "flights": [{
                    "airline": "Vistara",
                    "departure_airport": {"time": "2025-03-14 06:00"},
                    "arrival_airport": {"time": "2025-03-14 08:10"}
                }]},
                {}
            ]
        }));

        assert_eq!(
            flight_summary(&offers),
            "1. Vistara | departs Mar-14, 2025 | 06:00 AM | arrives Mar-14, 2025 | 08:10 AM | 4200 INR\n\
             2. Unknown Airline | departs N/A | arrives N/A | price not available"
        );
    }

    #[tokio::test]
    async fn test_gemini_client_round_trip() {
        async fn generate(
            Path(model_action): Path<String>,
            Query(query): Query<HashMap<String, String>>,
            Json(body): Json<Value>,
        ) -> Json<Value> {
            let prompt = body["contents"][0]["parts"][0]["text"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            Json(json!({
                "candidates": [{
                    "content": {"parts": [
                        {"text": format!("{}|{}|", model_action, query["key"])},
                        {"text": prompt}
                    ]}
                }]
            }))
        }

        let router = Router::new().route("/v1beta/models/{model_action}", post(generate));
        let base_url = spawn_stub(router).await;
        let client = GeminiClient::from_config(&test_config(base_url)).unwrap();

        let text = assert_ok!(client.generate("Plan my trip").await);
        assert_eq!(
            text,
            "gemini-2.5-flash:generateContent|gemini_key|Plan my trip"
        );
    }

    #[tokio::test]
    async fn test_gemini_client_empty_candidates() {
        let router = Router::new().route(
            "/v1beta/models/{model_action}",
            post(|| async { Json(json!({"candidates": []})) }),
        );
        let base_url = spawn_stub(router).await;
        let client = GeminiClient::from_config(&test_config(base_url)).unwrap();

        let result = client.generate("Hi").await;
        assert!(matches!(result, Err(ItineraryError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_gemini_client_api_error() {
        let router = Router::new().route(
            "/v1beta/models/{model_action}",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"error": {"message": "quota exceeded"}})),
                )
            }),
        );
        let base_url = spawn_stub(router).await;
        let client = GeminiClient::from_config(&test_config(base_url)).unwrap();

        match client.generate("Hi").await {
            Err(ItineraryError::Api {
                status_code,
                message,
            }) => {
                assert_eq!(status_code, 429);
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("Expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_gemini_client_times_out() {
        let router = Router::new().route(
            "/v1beta/models/{model_action}",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({"candidates": []}))
            }),
        );
        let base_url = spawn_stub(router).await;
        let client = GeminiClient::from_config(&GeminiConfig {
            timeout_secs: 1,
            ..test_config(base_url)
        })
        .unwrap();

        let err = assert_err!(client.generate("Hi").await);
        assert!(matches!(err, ItineraryError::Timeout(1)));
        assert_eq!(err.to_string(), "Request timeout after 1s");
    }

    #[tokio::test]
    async fn test_gemini_client_unreachable() {
        let client = GeminiClient::from_config(&test_config(closed_endpoint().await)).unwrap();

        let result = client.generate("Hi").await;
        assert!(matches!(result, Err(ItineraryError::Network(_))));
    }
}
