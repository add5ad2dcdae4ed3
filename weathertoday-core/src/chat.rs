//! Canned assistant replies for the chat screen.

use rand::seq::SliceRandom;

pub const GREETING: &str = "Hello! I'm your weather assistant. I can help you with weather \
information, app features and more. How can I assist you today?";

const WEATHER_REPLIES: &[&str] = &[
    "I can help you with weather information! The weather screen shows current conditions and \
     detailed data. You can search for any city or use your current location.",
    "Current conditions are on the weather screen and the week ahead is on the forecast screen. \
     Search for a city to check somewhere else.",
    "For real-time weather data, check the weather screen. You can search for cities and view \
     a 7-day forecast.",
];

const HELP_REPLY: &str = "I can help you with:\n\
    - Weather information and forecasts\n\
    - General questions\n\
    - App navigation and features\n\
    - Tips and recommendations\n\n\
    Just ask me anything!";

const GREETING_REPLY: &str = "Hello! How can I assist you today? I'm here to help with weather \
info, general questions, or anything else you need!";

const FEATURES_REPLY: &str = "This weather app has several features:\n\
    - Weather: current conditions and detailed weather data\n\
    - Forecast: the next 7 days\n\
    - Chat: that's me!\n\
    - Settings: units, theme and cache";

const HELP_REPLIES: &[&str] = &[HELP_REPLY];
const GREETING_REPLIES: &[&str] = &[GREETING_REPLY];
const FEATURES_REPLIES: &[&str] = &[FEATURES_REPLY];

const DEFAULT_REPLIES: &[&str] = &[
    "That's an interesting question! I'm here to help you with weather information and general \
     assistance. Feel free to ask me anything!",
    "I'd be happy to help with that! You can ask me about weather, app features, or any general \
     questions you might have.",
    "Thanks for your message! What would you like to know more about?",
    "I'm here to assist you! Whether it's weather information, app help, or general questions, \
     I'm ready to help.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Weather,
    Help,
    Greeting,
    Features,
    Other,
}

impl Topic {
    /// First matching keyword group wins, in this order.
    pub fn classify(input: &str) -> Topic {
        let input = input.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| input.contains(w));

        if has(&["weather", "temperature", "forecast"]) {
            Topic::Weather
        } else if has(&["help", "what can you do"]) {
            Topic::Help
        } else if has(&["hello", "hi", "hey"]) {
            Topic::Greeting
        } else if has(&["app", "features", "tabs"]) {
            Topic::Features
        } else {
            Topic::Other
        }
    }

    pub fn replies(&self) -> &'static [&'static str] {
        match self {
            Topic::Weather => WEATHER_REPLIES,
            Topic::Help => HELP_REPLIES,
            Topic::Greeting => GREETING_REPLIES,
            Topic::Features => FEATURES_REPLIES,
            Topic::Other => DEFAULT_REPLIES,
        }
    }
}

pub trait ChatResponder: Send + Sync {
    /// `None` for blank input.
    fn reply(&self, input: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedResponder;

impl ChatResponder for ScriptedResponder {
    fn reply(&self, input: &str) -> Option<String> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        let replies = Topic::classify(input).replies();
        replies.choose(&mut rand::thread_rng()).map(|r| r.to_string())
    }
}
