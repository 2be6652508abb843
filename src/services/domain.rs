//! The fixed set of monitoring domains.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A monitoring domain served under `/api/{domain}/v1/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Seismology,
    Wildfire,
    Climate,
    Prediction,
    Displacement,
    Aviation,
    Research,
    Unrest,
    Conflict,
    Maritime,
    Cyber,
    Economic,
    Infrastructure,
    Market,
    News,
    Intelligence,
    Military,
}

impl Domain {
    /// Registration order. Route tables are concatenated in this order.
    pub const ALL: [Domain; 17] = [
        Domain::Seismology,
        Domain::Wildfire,
        Domain::Climate,
        Domain::Prediction,
        Domain::Displacement,
        Domain::Aviation,
        Domain::Research,
        Domain::Unrest,
        Domain::Conflict,
        Domain::Maritime,
        Domain::Cyber,
        Domain::Economic,
        Domain::Infrastructure,
        Domain::Market,
        Domain::News,
        Domain::Intelligence,
        Domain::Military,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Seismology => "seismology",
            Domain::Wildfire => "wildfire",
            Domain::Climate => "climate",
            Domain::Prediction => "prediction",
            Domain::Displacement => "displacement",
            Domain::Aviation => "aviation",
            Domain::Research => "research",
            Domain::Unrest => "unrest",
            Domain::Conflict => "conflict",
            Domain::Maritime => "maritime",
            Domain::Cyber => "cyber",
            Domain::Economic => "economic",
            Domain::Infrastructure => "infrastructure",
            Domain::Market => "market",
            Domain::News => "news",
            Domain::Intelligence => "intelligence",
            Domain::Military => "military",
        }
    }

    /// RPCs exposed when a service config lists none.
    pub fn known_rpcs(self) -> &'static [&'static str] {
        match self {
            Domain::Seismology => &["list-earthquakes"],
            Domain::Wildfire => &["list-fire-detections"],
            Domain::Prediction => &["list-prediction-markets"],
            Domain::Aviation => &["list-airport-delays"],
            Domain::News => &["summarize-article"],
            Domain::Unrest => &["list-unrest-events"],
            Domain::Cyber => &["list-cyber-threats"],
            _ => &[],
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
