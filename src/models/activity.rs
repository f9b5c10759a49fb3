use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Single-mode activities the engine can route for. A closed enum: each
/// variant carries its constraint table and speed model as data, so there is
/// no string-keyed dispatch anywhere downstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    #[default]
    Walk,
    Bike,
    Drive,
    Ski,
    Transit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Paved,
    Gravel,
    Trail,
    Rock,
    Snow,
    Sand,
}

impl Surface {
    /// How much skill the footing demands, on the same 1..5 scale as
    /// [`ActivityConstraints::technical_difficulty`].
    pub fn technicality(&self) -> u8 {
        match self {
            Surface::Paved | Surface::Gravel => 1,
            Surface::Trail => 2,
            Surface::Sand | Surface::Snow => 3,
            Surface::Rock => 4,
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Surface::Paved => "paved",
            Surface::Gravel => "gravel",
            Surface::Trail => "trail",
            Surface::Rock => "rock",
            Surface::Snow => "snow",
            Surface::Sand => "sand",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeatherLimits {
    pub max_wind_kmh: f64,
    pub min_temp_c: f64,
    pub max_temp_c: f64,
}

/// Hard per-activity limits; built once per request from the static table
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityConstraints {
    /// Maximum grade as a fraction (0.25 = 25%). Never negative.
    pub max_grade: f64,
    pub allowed_surfaces: HashSet<Surface>,
    pub weather_limits: WeatherLimits,
    /// 1 (easy) .. 5 (expert) ceiling for acceptable terrain.
    pub technical_difficulty: u8,
}

impl ActivityConstraints {
    fn new(
        max_grade: f64,
        surfaces: &[Surface],
        weather_limits: WeatherLimits,
        technical_difficulty: u8,
    ) -> Self {
        debug_assert!(max_grade >= 0.0);
        ActivityConstraints {
            max_grade: max_grade.max(0.0),
            allowed_surfaces: surfaces.iter().copied().collect(),
            weather_limits,
            technical_difficulty,
        }
    }

    pub fn allows_surface(&self, surface: Surface) -> bool {
        self.allowed_surfaces.contains(&surface)
    }

    pub fn allows_grade(&self, grade: f64) -> bool {
        grade.abs() <= self.max_grade
    }
}

impl Activity {
    /// Static activity -> constraint table (hard safety limits).
    pub fn constraints(&self) -> ActivityConstraints {
        use Surface::*;
        match self {
            Activity::Walk => ActivityConstraints::new(
                0.35,
                &[Paved, Gravel, Trail, Rock, Sand],
                WeatherLimits {
                    max_wind_kmh: 60.0,
                    min_temp_c: -20.0,
                    max_temp_c: 40.0,
                },
                4,
            ),
            Activity::Bike => ActivityConstraints::new(
                0.15,
                &[Paved, Gravel, Trail],
                WeatherLimits {
                    max_wind_kmh: 45.0,
                    min_temp_c: -10.0,
                    max_temp_c: 38.0,
                },
                3,
            ),
            Activity::Drive => ActivityConstraints::new(
                0.12,
                &[Paved, Gravel],
                WeatherLimits {
                    max_wind_kmh: 100.0,
                    min_temp_c: -30.0,
                    max_temp_c: 45.0,
                },
                1,
            ),
            Activity::Ski => ActivityConstraints::new(
                0.45,
                &[Snow],
                WeatherLimits {
                    max_wind_kmh: 50.0,
                    min_temp_c: -25.0,
                    max_temp_c: 5.0,
                },
                5,
            ),
            Activity::Transit => ActivityConstraints::new(
                0.12,
                &[Paved],
                WeatherLimits {
                    max_wind_kmh: 120.0,
                    min_temp_c: -30.0,
                    max_temp_c: 45.0,
                },
                1,
            ),
        }
    }

    /// Nominal speed on flat ground, before grade/conditions adjustment.
    pub fn base_speed_kmh(&self) -> f64 {
        match self {
            Activity::Walk => 5.0,
            Activity::Bike => 18.0,
            Activity::Drive => 60.0,
            Activity::Ski => 12.0,
            Activity::Transit => 30.0,
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Walk => write!(f, "walk"),
            Activity::Bike => write!(f, "bike"),
            Activity::Drive => write!(f, "drive"),
            Activity::Ski => write!(f, "ski"),
            Activity::Transit => write!(f, "transit"),
        }
    }
}

impl FromStr for Activity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "walk" | "walking" | "hike" | "hiking" => Ok(Activity::Walk),
            "bike" | "cycling" | "bicycle" => Ok(Activity::Bike),
            "drive" | "driving" | "car" => Ok(Activity::Drive),
            "ski" | "skiing" => Ok(Activity::Ski),
            "transit" | "bus" | "train" => Ok(Activity::Transit),
            _ => Err(format!("Invalid activity: '{}'", s)),
        }
    }
}
