//! Static host-city catalog: geofence boundaries and welcome copy.
//!
//! Both tables are compile-time data in a fixed order. Boundary order is
//! significant: when two radii overlap, the earlier boundary wins.

use concierge_core::Coordinates;

use super::venues::{STADIUMS, Stadium};

/// Host nation of a city. Crossing between nations changes currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Country {
    UnitedStates,
    Canada,
    Mexico,
}

impl Country {
    /// ISO 3166 alpha-2 code, as persisted.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UnitedStates => "US",
            Self::Canada => "CA",
            Self::Mexico => "MX",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "US" => Some(Self::UnitedStates),
            "CA" => Some(Self::Canada),
            "MX" => Some(Self::Mexico),
            _ => None,
        }
    }
}

/// A circular geofence around a host city.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityBoundary {
    /// Unique key joining the boundary to its [`CityVault`].
    pub city_key: &'static str,
    pub name: &'static str,
    pub country: Country,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

impl CityBoundary {
    #[must_use]
    pub const fn center(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Whether the point lies within the radius (inclusive).
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.center()
            .distance_km(&Coordinates::new(latitude, longitude))
            <= self.radius_km
    }
}

/// Welcome copy shown when entering a host city.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityVault {
    pub city_key: &'static str,
    pub motto: &'static str,
    pub welcome_message: &'static str,
}

const fn boundary(
    city_key: &'static str,
    name: &'static str,
    country: Country,
    latitude: f64,
    longitude: f64,
    radius_km: f64,
) -> CityBoundary {
    CityBoundary {
        city_key,
        name,
        country,
        latitude,
        longitude,
        radius_km,
    }
}

/// The sixteen host cities, in matching priority order.
pub static HOST_CITY_BOUNDARIES: [CityBoundary; 16] = [
    boundary("kansasCity", "Kansas City", Country::UnitedStates, 39.0997, -94.5786, 50.0),
    boundary("newYork", "New York", Country::UnitedStates, 40.7128, -74.0060, 60.0),
    boundary("losAngeles", "Los Angeles", Country::UnitedStates, 34.0522, -118.2437, 80.0),
    boundary("miami", "Miami", Country::UnitedStates, 25.7617, -80.1918, 50.0),
    boundary("dallas", "Dallas", Country::UnitedStates, 32.7767, -96.7970, 60.0),
    boundary("houston", "Houston", Country::UnitedStates, 29.7604, -95.3698, 70.0),
    boundary("atlanta", "Atlanta", Country::UnitedStates, 33.7490, -84.3880, 50.0),
    boundary("philadelphia", "Philadelphia", Country::UnitedStates, 39.9526, -75.1652, 40.0),
    boundary("seattle", "Seattle", Country::UnitedStates, 47.6062, -122.3321, 50.0),
    boundary("boston", "Boston", Country::UnitedStates, 42.3601, -71.0589, 50.0),
    boundary("sanFrancisco", "San Francisco", Country::UnitedStates, 37.7749, -122.4194, 60.0),
    boundary("toronto", "Toronto", Country::Canada, 43.6532, -79.3832, 50.0),
    boundary("vancouver", "Vancouver", Country::Canada, 49.2827, -123.1207, 50.0),
    boundary("mexicoCity", "Mexico City", Country::Mexico, 19.4326, -99.1332, 60.0),
    boundary("guadalajara", "Guadalajara", Country::Mexico, 20.6597, -103.3496, 50.0),
    boundary("monterrey", "Monterrey", Country::Mexico, 25.6866, -100.3161, 50.0),
];

/// Welcome copy per host city.
pub static CITY_VAULTS: [CityVault; 16] = [
    CityVault {
        city_key: "kansasCity",
        motto: "The Soccer Capital of America & The Heart of the Tournament",
        welcome_message: "Welcome to the Heart of America! I see you've arrived in Kansas City. A quick heads-up: Parking at the stadium is extremely restricted today. I have secured your 'Stadium Direct' bus pass and mapped the shuttle pickup at Union Station. Since you have 3 hours before kickoff, would you like the walking route to the WWI Museum Fan Fest for a photo at the Heart Gateway?",
    },
    CityVault {
        city_key: "newYork",
        motto: "The World's Stage - Where Champions Are Made",
        welcome_message: "Welcome to the Big Apple! I've noted your arrival in New York. The PATH trains and NJ Transit are running extended hours for match days. MetLife Stadium is in New Jersey - I've mapped the fastest route from your location. Would you like me to set a departure reminder accounting for stadium security lines?",
    },
    CityVault {
        city_key: "losAngeles",
        motto: "City of Angels - Where Dreams Meet the World's Game",
        welcome_message: "Welcome to LA! Traffic is always a factor here - I've calculated that leaving 3 hours before kickoff from your location will get you to SoFi Stadium comfortably. The Metro E Line has a direct station at the stadium. Would you like cooling station locations mapped? It's expected to be 85°F at kickoff.",
    },
    CityVault {
        city_key: "miami",
        motto: "Where Latin Passion Meets American Dreams",
        welcome_message: "Welcome to Miami! Important: The heat index can reach 105°F during matches. I've mapped all cooling stations and shaded rest areas around Hard Rock Stadium. The stadium is 15 miles north of downtown - would you like shuttle options from your hotel or the walking route to the nearest hydration station?",
    },
    CityVault {
        city_key: "dallas",
        motto: "Everything's Bigger in Texas - Including the Passion",
        welcome_message: "Welcome to Big D! AT&T Stadium in Arlington is climate-controlled (thank goodness in Texas heat). I've mapped the TRE train route from Dallas - it's the easiest way to avoid I-30 traffic. The retractable roof will likely be closed. Would you like Texas BBQ recommendations for before the match?",
    },
    CityVault {
        city_key: "houston",
        motto: "Space City - Where the World Lands for the Beautiful Game",
        welcome_message: "Welcome to Space City! Critical alert: June/July humidity in Houston is intense. I've mapped all underground tunnel system entrances near your hotel - they connect 95+ blocks of climate-controlled walkways downtown. NRG Stadium has excellent A/C. Would you like the tunnel route to Discovery Green Fan Festival?",
    },
    CityVault {
        city_key: "atlanta",
        motto: "The ATL - Where Southern Hospitality Meets Global Football",
        welcome_message: "Welcome to Atlanta! Mercedes-Benz Stadium is one of the world's most modern venues - the halo video board is incredible. MARTA takes you directly there. I've noted that Georgia heat can be intense even in the dome area. Would you like soul food recommendations near the Centennial Olympic Park Fan Festival?",
    },
    CityVault {
        city_key: "philadelphia",
        motto: "The Birthplace of America - Where History Meets Football",
        welcome_message: "Welcome to Philly! Lincoln Financial Field is easily reached via SEPTA. Fun fact: The city is one of the most walkable in America. I've mapped cheesesteak spots and the historic district near your hotel. Would you like the walking route to Independence Hall before your match?",
    },
    CityVault {
        city_key: "seattle",
        motto: "Emerald City - Rain or Shine, We Play",
        welcome_message: "Welcome to Seattle! Don't worry about the rain - Lumen Field is designed for it, and locals love playing in any weather. Light rail takes you right to the stadium. I've noted the best coffee spots near your hotel - this is the birthplace of Starbucks, after all. Would you like Pike Place Market recommendations?",
    },
    CityVault {
        city_key: "boston",
        motto: "America's Walking City - Historic Charm, Modern Game",
        welcome_message: "Welcome to Boston! Gillette Stadium is in Foxborough, about 30 miles south of the city. I've mapped the commuter rail route - it's the best option to avoid I-95 traffic. The Freedom Trail is a perfect pre-match walk. Would you like a walking tour mapped from your hotel?",
    },
    CityVault {
        city_key: "sanFrancisco",
        motto: "The Golden Gate to World Football",
        welcome_message: "Welcome to the Bay Area! Levi's Stadium is in Santa Clara, about 40 miles south. Caltrain is your best bet - I've mapped the route. Dress in layers; Bay Area weather can shift quickly. Would you like recommendations in Fisherman's Wharf before you head to the stadium?",
    },
    CityVault {
        city_key: "toronto",
        motto: "The Six - Canada's Global Gateway",
        welcome_message: "Welcome to Toronto! The PATH underground walkway system connects 30km of downtown - perfect for any weather. BMO Field is downtown and easily reached by TTC. I've mapped Tim Hortons and poutine spots near your hotel. Would you like the route to the CN Tower for pre-match photos?",
    },
    CityVault {
        city_key: "vancouver",
        motto: "Pacific Paradise - Where Mountains Meet the Match",
        welcome_message: "Welcome to Vancouver! BC Place is right downtown with the SkyTrain at your doorstep. The city is one of the most walkable in North America. I've noted it stays light until 10pm in summer - perfect for post-match strolls. Would you like Stanley Park or Granville Island recommendations?",
    },
    CityVault {
        city_key: "mexicoCity",
        motto: "Corazón de México - Where Football Is Religion",
        welcome_message: "¡Bienvenido a la Ciudad de México! Important: The altitude is 7,350 feet - take it easy the first day to acclimatize. I've mapped pharmacies with altitude sickness remedies near your hotel. Estadio Azteca is legendary - would you like the Metro route mapped and recommendations for tacos al pastor nearby?",
    },
    CityVault {
        city_key: "guadalajara",
        motto: "La Perla del Occidente - Where Tequila Meets the Beautiful Game",
        welcome_message: "¡Bienvenido a Guadalajara! The birthplace of mariachi and tequila. Estadio Akron is modern and accessible via Macrobús. I've mapped tequila tastings and mariachi plazas in Tlaquepaque. Would you like recommendations for birria tacos before your match?",
    },
    CityVault {
        city_key: "monterrey",
        motto: "La Sultana del Norte - Industrial Power, Football Passion",
        welcome_message: "¡Bienvenido a Monterrey! This is Mexico's industrial capital with passionate football culture. Heat can be extreme - I've mapped all air-conditioned refuges near your hotel. Estadio BBVA is one of the most modern in the Americas. Would you like carne asada recommendations?",
    },
];

/// A boundary table paired with the vaults that give its cities a voice and
/// the stadiums inside them.
///
/// The engine is written against a `Catalog` rather than the statics so the
/// matching and dedup rules can be exercised with small hand-built tables.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    pub boundaries: &'static [CityBoundary],
    pub vaults: &'static [CityVault],
    pub stadiums: &'static [Stadium],
}

impl Catalog {
    /// The shipped host-city catalog.
    #[must_use]
    pub fn host_cities() -> Self {
        Self {
            boundaries: &HOST_CITY_BOUNDARIES,
            vaults: &CITY_VAULTS,
            stadiums: &STADIUMS,
        }
    }

    /// First boundary in catalog order containing the point.
    ///
    /// Overlapping radii resolve by catalog order, not by distance to the
    /// center: a point inside both A and B matches whichever is listed first.
    #[must_use]
    pub fn check_city_perimeter(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Option<&'static CityBoundary> {
        self.boundaries
            .iter()
            .find(|city| city.contains(latitude, longitude))
    }

    #[must_use]
    pub fn boundary(&self, city_key: &str) -> Option<&'static CityBoundary> {
        self.boundaries.iter().find(|city| city.city_key == city_key)
    }

    #[must_use]
    pub fn vault(&self, city_key: &str) -> Option<&'static CityVault> {
        self.vaults.iter().find(|vault| vault.city_key == city_key)
    }

    /// First stadium in catalog order within approach range of `point`.
    #[must_use]
    pub fn nearby_stadium(&self, point: Coordinates) -> Option<&'static Stadium> {
        self.stadiums.iter().find(|stadium| stadium.is_approached_from(point))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::host_cities()
    }
}
