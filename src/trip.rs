// Trip request assembly: raw form fields in, typed request and itinerary brief out

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const MIN_TRIP_DAYS: u8 = 1;
pub const MAX_TRIP_DAYS: u8 = 14;

#[derive(Error, Debug, PartialEq)]
pub enum TripFormError {
    #[error("Invalid {field}: expected YYYY-MM-DD, got '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("Trip duration must be between 1 and 14 days, got '{0}'")]
    TripLength(String),

    #[error("Unknown {field}: '{value}'")]
    UnknownChoice { field: &'static str, value: String },
}

/// A fixed list of options offered by the trip form.
pub trait Choice: Sized + Copy + 'static {
    const ALL: &'static [Self];
    const FIELD: &'static str;

    fn slug(&self) -> &'static str;
    fn label(&self) -> &'static str;

    // Accepts either the slug or the human label, case-insensitively
    fn matches(&self, raw: &str) -> bool {
        let raw = raw.trim();
        raw.eq_ignore_ascii_case(self.slug()) || raw.eq_ignore_ascii_case(self.label())
    }

    fn parse(raw: &str) -> Result<Self, TripFormError> {
        Self::ALL
            .iter()
            .copied()
            .find(|choice| choice.matches(raw))
            .ok_or_else(|| TripFormError::UnknownChoice {
                field: Self::FIELD,
                value: raw.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TravelTheme {
    CoupleGetaway,
    FamilyVacation,
    AdventureTrip,
    SoloExploration,
}

impl Choice for TravelTheme {
    const ALL: &'static [Self] = &[
        Self::CoupleGetaway,
        Self::FamilyVacation,
        Self::AdventureTrip,
        Self::SoloExploration,
    ];
    const FIELD: &'static str = "travel theme";

    fn slug(&self) -> &'static str {
        match self {
            Self::CoupleGetaway => "couple-getaway",
            Self::FamilyVacation => "family-vacation",
            Self::AdventureTrip => "adventure-trip",
            Self::SoloExploration => "solo-exploration",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::CoupleGetaway => "Couple Getaway",
            Self::FamilyVacation => "Family Vacation",
            Self::AdventureTrip => "Adventure Trip",
            Self::SoloExploration => "Solo Exploration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BudgetTier {
    Economy,
    Standard,
    Luxury,
}

impl Choice for BudgetTier {
    const ALL: &'static [Self] = &[Self::Economy, Self::Standard, Self::Luxury];
    const FIELD: &'static str = "budget";

    fn slug(&self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::Standard => "standard",
            Self::Luxury => "luxury",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Economy => "Economy",
            Self::Standard => "Standard",
            Self::Luxury => "Luxury",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlightClass {
    Economy,
    Business,
    FirstClass,
}

impl Choice for FlightClass {
    const ALL: &'static [Self] = &[Self::Economy, Self::Business, Self::FirstClass];
    const FIELD: &'static str = "flight class";

    fn slug(&self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::Business => "business",
            Self::FirstClass => "first-class",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Economy => "Economy",
            Self::Business => "Business",
            Self::FirstClass => "First Class",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HotelRating {
    Any,
    ThreeStar,
    FourStar,
    FiveStar,
}

impl Choice for HotelRating {
    const ALL: &'static [Self] = &[Self::Any, Self::ThreeStar, Self::FourStar, Self::FiveStar];
    const FIELD: &'static str = "hotel rating";

    fn slug(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::ThreeStar => "3-star",
            Self::FourStar => "4-star",
            Self::FiveStar => "5-star",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::ThreeStar => "3 Star",
            Self::FourStar => "4 Star",
            Self::FiveStar => "5 Star",
        }
    }
}

// Raw submission as posted by the trip form; every field arrives as text
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TripForm {
    pub source: String,
    pub destination: String,
    pub departure_date: String,
    pub return_date: String,
    pub num_days: String,
    pub travel_theme: String,
    pub activity_preferences: String,
    pub budget: String,
    pub flight_class: String,
    pub hotel_rating: String,
}

impl Default for TripForm {
    fn default() -> Self {
        let today = chrono::Local::now()
            .date_naive()
            .format(DATE_FORMAT)
            .to_string();

        Self {
            source: "BOM".to_string(),
            destination: "DEL".to_string(),
            departure_date: today.clone(),
            return_date: today,
            num_days: "5".to_string(),
            travel_theme: TravelTheme::CoupleGetaway.slug().to_string(),
            activity_preferences: "Relaxing on the beach, exploring historical sites".to_string(),
            budget: BudgetTier::Standard.slug().to_string(),
            flight_class: FlightClass::Economy.slug().to_string(),
            hotel_rating: HotelRating::Any.slug().to_string(),
        }
    }
}

/// Canonical flight search input for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRequest {
    origin: String,
    destination: String,
    outbound_date: NaiveDate,
    return_date: NaiveDate,
    currency: String,
}

impl TripRequest {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        outbound_date: NaiveDate,
        return_date: NaiveDate,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            outbound_date,
            return_date,
            currency: currency.into(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn outbound_date(&self) -> NaiveDate {
        self.outbound_date
    }

    pub fn return_date(&self) -> NaiveDate {
        self.return_date
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

// Free-text trip parameters handed to the itinerary generator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripBrief {
    pub destination: String,
    pub num_days: u8,
    pub theme: TravelTheme,
    pub activities: String,
    pub budget: BudgetTier,
    pub flight_class: FlightClass,
    pub hotel_rating: HotelRating,
}

impl TripForm {
    /// Package the submission into a flight search request and an itinerary brief.
    ///
    /// Airport codes pass through untouched. Dates must parse as `YYYY-MM-DD`,
    /// but a departure after the return date is only logged.
    pub fn assemble(&self, currency: &str) -> Result<(TripRequest, TripBrief), TripFormError> {
        let outbound_date = parse_date("departure date", &self.departure_date)?;
        let return_date = parse_date("return date", &self.return_date)?;
        let num_days = parse_trip_length(&self.num_days)?;

        if outbound_date > return_date {
            warn!(
                %outbound_date,
                %return_date,
                "Departure date is after return date, searching anyway"
            );
        }

        let request = TripRequest::new(
            self.source.clone(),
            self.destination.clone(),
            outbound_date,
            return_date,
            currency,
        );

        let brief = TripBrief {
            destination: self.destination.clone(),
            num_days,
            theme: TravelTheme::parse(&self.travel_theme)?,
            activities: self.activity_preferences.clone(),
            budget: BudgetTier::parse(&self.budget)?,
            flight_class: FlightClass::parse(&self.flight_class)?,
            hotel_rating: HotelRating::parse(&self.hotel_rating)?,
        };

        Ok((request, brief))
    }
}

fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, TripFormError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| TripFormError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

fn parse_trip_length(raw: &str) -> Result<u8, TripFormError> {
    match raw.trim().parse::<u8>() {
        Ok(days) if (MIN_TRIP_DAYS..=MAX_TRIP_DAYS).contains(&days) => Ok(days),
        _ => Err(TripFormError::TripLength(raw.to_string())),
    }
}
