// HTML pages for the trip form and the planning results

use handlebars::Handlebars;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use serde::Serialize;
use thiserror::Error;

use crate::flight_search::FlightStatus;
use crate::offers::{display_time, FlightOffer};
use crate::planner::{ItineraryOutcome, TripPlan};
use crate::trip::{
    BudgetTier, Choice, FlightClass, HotelRating, TravelTheme, TripBrief, TripForm, TripRequest,
    DATE_FORMAT, MAX_TRIP_DAYS, MIN_TRIP_DAYS,
};

const LAYOUT_HEADER: &str = include_str!("../templates/layout_header.hbs");
const FORM_TEMPLATE: &str = include_str!("../templates/form.hbs");
const PLAN_TEMPLATE: &str = include_str!("../templates/plan.hbs");

pub const NOT_AVAILABLE: &str = "N/A";
pub const PRICE_NOT_AVAILABLE: &str = "Not Available";
pub const BOOKING_LINK_PLACEHOLDER: &str = "#";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

#[derive(Debug, Serialize)]
struct ChoiceView {
    value: &'static str,
    label: &'static str,
    selected: bool,
}

fn choices<C: Choice>(current: &str) -> Vec<ChoiceView> {
    C::ALL
        .iter()
        .map(|choice| ChoiceView {
            value: choice.slug(),
            label: choice.label(),
            selected: choice.matches(current),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct FormView<'a> {
    form: &'a TripForm,
    error: Option<&'a str>,
    min_days: u8,
    max_days: u8,
    themes: Vec<ChoiceView>,
    budgets: Vec<ChoiceView>,
    flight_classes: Vec<ChoiceView>,
    hotel_ratings: Vec<ChoiceView>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct FlightCard {
    pub airline: String,
    pub logo: Option<String>,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
    pub price: String,
    pub booking_link: &'static str,
}

impl From<&FlightOffer> for FlightCard {
    fn from(offer: &FlightOffer) -> Self {
        Self {
            airline: offer.airline().to_string(),
            logo: offer.airline_logo.clone(),
            departure: display_time(offer.departure_time()),
            arrival: display_time(offer.arrival_time()),
            duration: offer
                .total_duration_minutes
                .map(|minutes| format!("{} min", minutes))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            price: offer
                .price
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| PRICE_NOT_AVAILABLE.to_string()),
            booking_link: BOOKING_LINK_PLACEHOLDER,
        }
    }
}

/// Render the crew's Markdown answer to HTML.
///
/// Raw HTML in the answer is emitted as escaped text and `javascript:` links
/// are pointed at `#`.
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if is_script_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed(BOOKING_LINK_PLACEHOLDER),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

fn is_script_url(url: &str) -> bool {
    url.trim_start().to_ascii_lowercase().starts_with("javascript:")
}

#[derive(Debug, Serialize)]
struct PlanView<'a> {
    origin: &'a str,
    destination: &'a str,
    outbound_date: String,
    return_date: String,
    theme: &'static str,
    cards: Vec<FlightCard>,
    search_failure: Option<&'a str>,
    itinerary_html: Option<String>,
    itinerary_failure: Option<&'a str>,
}

pub struct PageRenderer {
    registry: Handlebars<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut registry = Handlebars::new();
        registry.register_partial("layout_header", LAYOUT_HEADER)?;
        registry.register_template_string("form", FORM_TEMPLATE)?;
        registry.register_template_string("plan", PLAN_TEMPLATE)?;
        Ok(Self { registry })
    }

    pub fn render_form(&self, form: &TripForm, error: Option<&str>) -> Result<String, RenderError> {
        let view = FormView {
            form,
            error,
            min_days: MIN_TRIP_DAYS,
            max_days: MAX_TRIP_DAYS,
            themes: choices::<TravelTheme>(&form.travel_theme),
            budgets: choices::<BudgetTier>(&form.budget),
            flight_classes: choices::<FlightClass>(&form.flight_class),
            hotel_ratings: choices::<HotelRating>(&form.hotel_rating),
        };
        Ok(self.registry.render("form", &view)?)
    }

    pub fn render_plan(
        &self,
        request: &TripRequest,
        brief: &TripBrief,
        plan: &TripPlan,
    ) -> Result<String, RenderError> {
        let (itinerary_html, itinerary_failure) = match &plan.itinerary {
            ItineraryOutcome::Generated(text) => (Some(markdown_to_html(text)), None),
            ItineraryOutcome::Failed(reason) => (None, Some(reason.as_str())),
        };

        let search_failure = match &plan.flight_status {
            FlightStatus::Unavailable(reason) => Some(reason.as_str()),
            FlightStatus::Found | FlightStatus::NoData => None,
        };

        let view = PlanView {
            origin: request.origin(),
            destination: request.destination(),
            outbound_date: request.outbound_date().format(DATE_FORMAT).to_string(),
            return_date: request.return_date().format(DATE_FORMAT).to_string(),
            theme: brief.theme.label(),
            cards: plan.offers.iter().map(FlightCard::from).collect(),
            search_failure,
            itinerary_html,
            itinerary_failure,
        };
        Ok(self.registry.render("plan", &view)?)
    }
}
