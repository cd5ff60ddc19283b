//! Weather collaborator contract.
//!
//! The weather feed is owned by another component; this model only holds the
//! narrow contract this process depends on: a message value deserializing to
//! a JSON object with `temperature` and `status`. A malformed payload is
//! logged as fatal for that message and leaves the prior state unchanged, so
//! the consuming process keeps running.

use serde::Deserialize;
use tracing::error;

/// Latest observed weather state.
#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    pub temperature: f64,
    pub status: String,
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            temperature: 70.0,
            status: "sunny".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct WeatherUpdate {
    temperature: f64,
    status: String,
}

impl Weather {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle an incoming weather message value.
    ///
    /// Updates `temperature` and `status` from the payload; on a malformed
    /// payload both retain their previous values.
    pub fn process_message(&mut self, payload: &[u8]) {
        match serde_json::from_slice::<WeatherUpdate>(payload) {
            Ok(update) => {
                self.temperature = update.temperature;
                self.status = update.status;
            }
            Err(e) => error!("unable to process weather message: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let weather = Weather::new();
        assert_eq!(weather.temperature, 70.0);
        assert_eq!(weather.status, "sunny");
    }

    #[test]
    fn test_valid_message_updates_state() {
        let mut weather = Weather::new();
        weather.process_message(br#"{"temperature": 33.5, "status": "windy"}"#);

        assert_eq!(weather.temperature, 33.5);
        assert_eq!(weather.status, "windy");
    }

    #[test]
    fn test_malformed_message_retains_prior_state() {
        let mut weather = Weather::new();
        weather.process_message(br#"{"temperature": 12.0, "status": "cloudy"}"#);

        weather.process_message(b"{not json");

        assert_eq!(weather.temperature, 12.0);
        assert_eq!(weather.status, "cloudy");
    }

    #[test]
    fn test_missing_field_retains_prior_state() {
        let mut weather = Weather::new();
        weather.process_message(br#"{"temperature": 55.0}"#);

        assert_eq!(weather.temperature, 70.0);
        assert_eq!(weather.status, "sunny");
    }

    #[test]
    fn test_process_continues_after_bad_message() {
        let mut weather = Weather::new();
        weather.process_message(b"{not json");
        weather.process_message(br#"{"temperature": -4.0, "status": "snow"}"#);

        assert_eq!(weather.temperature, -4.0);
        assert_eq!(weather.status, "snow");
    }
}
