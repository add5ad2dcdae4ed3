//! Plain-text rendering of screen state.

use chrono::NaiveDate;
use std::fmt::Write;
use weathertoday_core::{
    CitySuggestion, ForecastDay, Phase, ScreenState, Settings, Unit, WeatherSnapshot,
};

/// Whole degrees with the unit symbol, e.g. "24°C".
pub fn temperature(value: f64, unit: Unit) -> String {
    format!("{}{}", value.round() as i64, unit.temperature_symbol())
}

pub const RETRY_HINT: &str = "  (temporary problem, run the command again to retry)";

fn banner<T>(out: &mut String, state: &ScreenState<T>) {
    if let Some(message) = &state.error {
        let _ = writeln!(out, "! {message}");
        if state.retryable {
            let _ = writeln!(out, "{RETRY_HINT}");
        }
    }
    if state.phase == Phase::Refreshing {
        let _ = writeln!(out, "(refreshing)");
    }
}

pub fn home(state: &ScreenState<WeatherSnapshot>) -> String {
    let mut out = String::new();
    banner(&mut out, state);

    let Some(w) = &state.data else {
        if state.error.is_none() {
            out.push_str("No weather data.\n");
        }
        return out;
    };

    let unit = w.unit;
    let _ = writeln!(out, "{}", w.location);
    let _ = writeln!(out, "{}  {}", temperature(w.temperature, unit), w.description);
    let _ = writeln!(out);
    let _ = writeln!(out, "  Feels like  {}", temperature(w.feels_like, unit));
    let _ = writeln!(out, "  Humidity    {}%", w.humidity);
    let _ = writeln!(out, "  Wind        {} {}", w.wind_speed.round() as i64, unit.speed_label());
    let _ = writeln!(out, "  Pressure    {} hPa", w.pressure);
    let _ = writeln!(out, "  Visibility  {} {}", w.visibility, unit.distance_label());
    let _ = writeln!(out, "  UV index    {}", w.uv_index);
    let _ = writeln!(out, "  Sunrise     {}", w.sunrise);
    let _ = writeln!(out, "  Sunset      {}", w.sunset);
    out
}

pub fn forecast(state: &ScreenState<Vec<ForecastDay>>, today: NaiveDate) -> String {
    let mut out = String::new();
    banner(&mut out, state);

    let Some(days) = state.data.as_deref().filter(|d| !d.is_empty()) else {
        if state.error.is_none() {
            out.push_str("No forecast data.\n");
        }
        return out;
    };

    out.push_str("7-Day Forecast\n");
    for day in days {
        let name = if day.date == today { "Today".to_string() } else { day.weekday_name() };
        let _ = writeln!(
            out,
            "  {name:<10} {:<7} {:>6} / {:<6} {}",
            day.short_date(),
            temperature(day.max_temp, day.unit),
            temperature(day.min_temp, day.unit),
            day.condition,
        );
    }
    out
}

pub fn suggestions(query: &str, found: &[CitySuggestion]) -> String {
    if found.is_empty() {
        return format!("No cities found for '{query}'.\n");
    }
    found
        .iter()
        .enumerate()
        .fold(String::new(), |mut out, (i, city)| {
            let _ = writeln!(out, "{:>2}. {}", i + 1, city.label());
            out
        })
}

pub fn settings(settings: &Settings, email: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Account        {}", email.unwrap_or("not signed in"));
    let _ = writeln!(
        out,
        "Units          {} ({})",
        settings.unit,
        settings.unit.temperature_symbol()
    );
    let _ = writeln!(out, "Theme          {}", settings.theme);
    let _ = writeln!(
        out,
        "Notifications  {}",
        if settings.notifications { "on" } else { "off" }
    );
    out
}
