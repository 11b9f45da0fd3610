use std::cmp::Ordering;

use serde::Deserialize;

use crate::hotel::Hotel;
use crate::route::BusRoute;

/// Hotel listing filters. Text filters are case-insensitive substring matches.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelFilter {
    pub city: Option<String>,
    pub state: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub rating: Option<f64>,
}

impl HotelFilter {
    pub fn matches(&self, hotel: &Hotel) -> bool {
        hotel.is_active
            && contains_ci(&hotel.city, self.city.as_deref())
            && contains_ci(&hotel.state, self.state.as_deref())
            && self.min_price.map_or(true, |min| hotel.price_per_night >= min)
            && self.max_price.map_or(true, |max| hotel.price_per_night <= max)
            && self.rating.map_or(true, |r| hotel.rating >= r)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteFilter {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RouteFilter {
    pub fn matches(&self, route: &BusRoute) -> bool {
        route.is_active
            && contains_ci(&route.from, self.from.as_deref())
            && contains_ci(&route.to, self.to.as_deref())
    }
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

/// Best rated first, newest first among equals.
pub fn sort_hotels(hotels: &mut [Hotel]) {
    hotels.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Earliest departure first, newest first among equals.
pub fn sort_routes(routes: &mut [BusRoute]) {
    routes.sort_by(|a, b| {
        departure_minutes(&a.departure_time)
            .cmp(&departure_minutes(&b.departure_time))
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

fn departure_minutes(time: &str) -> u32 {
    time.split_once(':')
        .and_then(|(h, m)| Some(h.parse::<u32>().ok()? * 60 + m.parse::<u32>().ok()?))
        .unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn hotel(city: &str, rating: f64, price: f64, age_days: i64) -> Hotel {
        let mut input = crate::hotel::tests::sample_input();
        input.city = city.to_string();
        input.rating = Some(rating);
        input.price_per_night = price;
        Hotel::create(input, None, Utc::now() - Duration::days(age_days)).unwrap()
    }

    #[test]
    fn test_hotel_filter() {
        let h = hotel("Jalingo", 4.5, 20000.0, 0);
        let filter = HotelFilter {
            city: Some("jAL".to_string()),
            min_price: Some(15000.0),
            rating: Some(4.0),
            ..Default::default()
        };
        assert!(filter.matches(&h));

        let filter = HotelFilter {
            max_price: Some(10000.0),
            ..Default::default()
        };
        assert!(!filter.matches(&h));

        let mut inactive = h.clone();
        inactive.is_active = false;
        assert!(!HotelFilter::default().matches(&inactive));
    }

    #[test]
    fn test_hotel_ordering() {
        let mut hotels = vec![
            hotel("A", 3.5, 1.0, 0),
            hotel("B", 5.0, 1.0, 3),
            hotel("C", 5.0, 1.0, 1),
        ];
        sort_hotels(&mut hotels);
        let cities: Vec<&str> = hotels.iter().map(|h| h.city.as_str()).collect();
        assert_eq!(cities, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_departure_minutes() {
        assert_eq!(departure_minutes("7:05"), 425);
        assert_eq!(departure_minutes("23:59"), 1439);
        assert_eq!(departure_minutes("bad"), u32::MAX);
    }
}
