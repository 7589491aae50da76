// Flight offers: typed view of the search provider's records, cheapest-first selection
// and display formatting of leg timestamps

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

pub const BEST_OFFERS_KEY: &str = "best_flights";
pub const MAX_RANKED_OFFERS: usize = 3;

pub const TIMESTAMP_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%b-%d, %Y | %I:%M %p";
pub const TIMESTAMP_FALLBACK: &str = "N/A";

pub const UNKNOWN_AIRLINE: &str = "Unknown Airline";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Money {
    pub amount: f64,
    pub currency: Option<String>,
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.amount.fract() == 0.0 {
            write!(f, "{:.0}", self.amount)?;
        } else {
            write!(f, "{:.2}", self.amount)?;
        }
        match &self.currency {
            Some(currency) => write!(f, " {}", currency),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportStop {
    pub code: Option<String>,
    pub name: Option<String>,
    pub time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightLeg {
    pub departure: AirportStop,
    pub arrival: AirportStop,
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub duration_minutes: Option<u64>,
}

/// One priced itinerary from the search provider.
///
/// Every field except `legs` may be missing in the provider's record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightOffer {
    pub airline_logo: Option<String>,
    pub price: Option<Money>,
    pub total_duration_minutes: Option<u64>,
    pub legs: Vec<FlightLeg>,
}

impl FlightOffer {
    pub fn from_json(record: &Map<String, Value>, currency: Option<&str>) -> Self {
        let price = record.get("price").and_then(Value::as_f64).map(|amount| Money {
            amount,
            currency: currency.map(str::to_string),
        });

        let legs = record
            .get("flights")
            .and_then(Value::as_array)
            .map(|legs| {
                legs.iter()
                    .filter_map(Value::as_object)
                    .map(FlightLeg::from_json)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            airline_logo: string_field(record, "airline_logo"),
            price,
            total_duration_minutes: record.get("total_duration").and_then(Value::as_u64),
            legs,
        }
    }

    pub fn price_amount(&self) -> Option<f64> {
        self.price.as_ref().map(|price| price.amount)
    }

    // The carrier shown for an offer is the one operating its first leg
    pub fn airline(&self) -> &str {
        self.legs
            .first()
            .and_then(|leg| leg.airline.as_deref())
            .unwrap_or(UNKNOWN_AIRLINE)
    }

    pub fn departure_time(&self) -> Option<NaiveDateTime> {
        self.legs.first().and_then(|leg| leg.departure.time)
    }

    pub fn arrival_time(&self) -> Option<NaiveDateTime> {
        self.legs.last().and_then(|leg| leg.arrival.time)
    }
}

impl FlightLeg {
    fn from_json(record: &Map<String, Value>) -> Self {
        Self {
            departure: AirportStop::from_json(record.get("departure_airport")),
            arrival: AirportStop::from_json(record.get("arrival_airport")),
            airline: string_field(record, "airline"),
            flight_number: string_field(record, "flight_number"),
            duration_minutes: record.get("duration").and_then(Value::as_u64),
        }
    }
}

impl AirportStop {
    fn from_json(value: Option<&Value>) -> Self {
        let record = value.and_then(Value::as_object);
        let field = |key: &str| record.and_then(|r| string_field(r, key));

        Self {
            code: field("id"),
            name: field("name"),
            time: field("time").and_then(|raw| parse_timestamp(&raw)),
        }
    }
}

fn string_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_string)
}

// Priced offers ascending, unpriced offers after all priced ones
fn by_price(a: &FlightOffer, b: &FlightOffer) -> Ordering {
    match (a.price_amount(), b.price_amount()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Rank the provider's "best" offers by price and keep the cheapest three.
///
/// Never fails: a missing or non-list `best_flights` yields an empty list, and
/// entries that are not objects are skipped. The sort is stable, so offers with
/// equal (or equally missing) prices keep the provider's order.
pub fn select_cheapest(raw: &Value) -> Vec<FlightOffer> {
    let currency = raw
        .pointer("/search_parameters/currency")
        .and_then(Value::as_str);

    let mut offers: Vec<FlightOffer> = raw
        .get(BEST_OFFERS_KEY)
        .and_then(Value::as_array)
        .map(|records| {
            records
                .iter()
                .filter_map(Value::as_object)
                .map(|record| FlightOffer::from_json(record, currency))
                .collect()
        })
        .unwrap_or_default();

    offers.sort_by(by_price);
    offers.truncate(MAX_RANKED_OFFERS);
    offers
}

// chrono lets whitespace in the pattern match any run of spaces, including none
fn has_timestamp_layout(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 16
        && bytes.iter().enumerate().all(|(idx, b)| match idx {
            4 | 7 => *b == b'-',
            10 => *b == b' ',
            13 => *b == b':',
            _ => b.is_ascii_digit(),
        })
}

/// Parse a provider timestamp laid out exactly as `YYYY-MM-DD HH:MM`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if !has_timestamp_layout(raw) {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_INPUT_FORMAT).ok()
}

pub fn display_time(time: Option<NaiveDateTime>) -> String {
    match time {
        Some(time) => time.format(TIMESTAMP_DISPLAY_FORMAT).to_string(),
        None => TIMESTAMP_FALLBACK.to_string(),
    }
}

/// `"2025-03-14 09:30"` becomes `"Mar-14, 2025 | 09:30 AM"`; anything that
/// does not match the input pattern becomes `"N/A"`.
pub fn format_timestamp(raw: &str) -> String {
    display_time(parse_timestamp(raw))
}
