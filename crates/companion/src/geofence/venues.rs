//! Match venues: entry gates and ride-share zones around each stadium.

use concierge_core::Coordinates;

use self::ZoneUse::{Both, Dropoff, Pickup};

/// Distance at which a fan counts as approaching a stadium (one mile).
pub const STADIUM_APPROACH_KM: f64 = 1.609_344;

/// What a ride-share zone is signposted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneUse {
    Pickup,
    Dropoff,
    Both,
}

impl ZoneUse {
    #[must_use]
    pub const fn allows_dropoff(self) -> bool {
        matches!(self, Self::Dropoff | Self::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryGate {
    pub name: &'static str,
    /// Seating sections served, e.g. `"100-112"`.
    pub sections: &'static str,
    pub location: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RideShareZone {
    pub name: &'static str,
    pub usage: ZoneUse,
    pub location: Coordinates,
    pub walking_minutes: u8,
}

/// A host-city stadium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stadium {
    pub name: &'static str,
    /// Key of the host city the stadium belongs to.
    pub city_key: &'static str,
    pub location: Coordinates,
    pub gates: &'static [EntryGate],
    pub ride_share: &'static [RideShareZone],
}

impl Stadium {
    /// Whether `point` is within [`STADIUM_APPROACH_KM`] (inclusive).
    #[must_use]
    pub fn is_approached_from(&self, point: Coordinates) -> bool {
        self.location.distance_km(&point) <= STADIUM_APPROACH_KM
    }

    /// Gate closest to `point`.
    #[must_use]
    pub fn nearest_gate(&self, point: Coordinates) -> Option<&'static EntryGate> {
        nearest(self.gates.iter(), point, |gate| gate.location)
    }

    /// Closest zone that accepts drop-offs.
    #[must_use]
    pub fn nearest_dropoff(&self, point: Coordinates) -> Option<&'static RideShareZone> {
        nearest(
            self.ride_share.iter().filter(|zone| zone.usage.allows_dropoff()),
            point,
            |zone| zone.location,
        )
    }
}

fn nearest<T>(
    items: impl Iterator<Item = &'static T>,
    point: Coordinates,
    location: impl Fn(&T) -> Coordinates,
) -> Option<&'static T> {
    items
        .map(|item| (location(item).distance_km(&point), item))
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, item)| item)
}

const fn at(latitude: f64, longitude: f64) -> Coordinates {
    Coordinates::new(latitude, longitude)
}

const fn gate(name: &'static str, sections: &'static str, lat: f64, lon: f64) -> EntryGate {
    EntryGate {
        name,
        sections,
        location: at(lat, lon),
    }
}

const fn zone(name: &'static str, usage: ZoneUse, lat: f64, lon: f64, walk: u8) -> RideShareZone {
    RideShareZone {
        name,
        usage,
        location: at(lat, lon),
        walking_minutes: walk,
    }
}

/// One stadium per host city, in boundary catalog order.
pub static STADIUMS: [Stadium; 16] = [
    Stadium {
        name: "Arrowhead Stadium",
        city_key: "kansasCity",
        location: at(39.0489, -94.4839),
        gates: &[
            gate("Gate A", "100-112", 39.0502, -94.4839),
            gate("Gate B", "113-124", 39.0489, -94.4815),
            gate("Gate C", "125-136", 39.0476, -94.4839),
            gate("Gate D", "301-324", 39.0489, -94.4863),
        ],
        ride_share: &[
            zone("Lot N RideShare Zone", Both, 39.0525, -94.4839, 8),
            zone("Red Lot Exit", Pickup, 39.0510, -94.4875, 10),
        ],
    },
    Stadium {
        name: "MetLife Stadium",
        city_key: "newYork",
        location: at(40.8128, -74.0742),
        gates: &[
            gate("Gate A", "100-112, 201-212", 40.8138, -74.0725),
            gate("Gate B", "113-124, 213-224", 40.8115, -74.0742),
            gate("Gate C", "125-136, 225-236", 40.8128, -74.0765),
            gate("Gate D", "137-148, 237-248", 40.8145, -74.0742),
        ],
        ride_share: &[
            zone("Lot E RideShare Drop-off", Dropoff, 40.8150, -74.0710, 7),
            zone("Lot K RideShare Pickup", Pickup, 40.8100, -74.0780, 12),
        ],
    },
    Stadium {
        name: "SoFi Stadium",
        city_key: "losAngeles",
        location: at(33.9534, -118.3390),
        gates: &[
            gate("American Airlines Plaza", "100-115, C100-C115", 33.9548, -118.3390),
            gate("YouTube Theater Entrance", "116-130, C116-C130", 33.9534, -118.3365),
            gate("South Gate", "131-145, C131-C145", 33.9520, -118.3390),
        ],
        ride_share: &[
            zone("Pink Zone", Both, 33.9575, -118.3360, 10),
            zone("Uber Lot", Pickup, 33.9510, -118.3340, 8),
            zone("Lyft Zone", Pickup, 33.9510, -118.3420, 9),
        ],
    },
    Stadium {
        name: "Hard Rock Stadium",
        city_key: "miami",
        location: at(25.9580, -80.2389),
        gates: &[
            gate("Gate 1", "100-112", 25.9595, -80.2405),
            gate("Gate 2", "113-125", 25.9595, -80.2373),
            gate("Gate 3", "126-138", 25.9565, -80.2373),
            gate("Gate 4", "139-150", 25.9565, -80.2405),
        ],
        ride_share: &[
            zone("RideShare Lot", Dropoff, 25.9620, -80.2389, 8),
            zone("Post-Game Pickup", Pickup, 25.9550, -80.2420, 10),
        ],
    },
    Stadium {
        name: "AT&T Stadium",
        city_key: "dallas",
        location: at(32.7473, -97.0945),
        gates: &[
            gate("Gate A", "100-115, C200-C215", 32.7473, -97.0970),
            gate("Gate B", "116-130, C216-C230", 32.7473, -97.0920),
            gate("Gate C", "131-145, C231-C245", 32.7490, -97.0945),
        ],
        ride_share: &[
            zone("Lot 4 RideShare", Both, 32.7500, -97.0980, 12),
            zone("Texas Live! Pickup", Pickup, 32.7510, -97.0900, 10),
        ],
    },
    Stadium {
        name: "NRG Stadium",
        city_key: "houston",
        location: at(29.6847, -95.4107),
        gates: &[
            gate("Gate A", "100-115", 29.6847, -95.4080),
            gate("Gate B", "116-130", 29.6847, -95.4134),
            gate("Gate C", "500-530", 29.6865, -95.4107),
        ],
        ride_share: &[zone("Yellow Lot", Both, 29.6880, -95.4080, 10)],
    },
    Stadium {
        name: "Mercedes-Benz Stadium",
        city_key: "atlanta",
        location: at(33.7553, -84.4006),
        gates: &[
            gate("Gate 1", "100-112", 33.7570, -84.4020),
            gate("Gate 2", "113-124", 33.7570, -84.3992),
            gate("Gate 3", "125-136", 33.7536, -84.3992),
        ],
        ride_share: &[
            zone("Gulch Drop-off", Dropoff, 33.7530, -84.4030, 5),
            zone("State Farm Arena Pickup", Pickup, 33.7573, -84.3963, 8),
        ],
    },
    Stadium {
        name: "Lincoln Financial Field",
        city_key: "philadelphia",
        location: at(39.9008, -75.1675),
        gates: &[
            gate("Gate A", "100-112", 39.9020, -75.1660),
            gate("Gate B", "113-124", 39.8996, -75.1660),
            gate("Gate C", "125-136", 39.8996, -75.1690),
        ],
        ride_share: &[zone("Lot K RideShare", Both, 39.9035, -75.1650, 8)],
    },
    Stadium {
        name: "Lumen Field",
        city_key: "seattle",
        location: at(47.5952, -122.3316),
        gates: &[
            gate("North Gate", "100-115", 47.5968, -122.3316),
            gate("South Gate", "116-130", 47.5936, -122.3316),
        ],
        ride_share: &[
            zone("Occidental Ave Drop-off", Dropoff, 47.5990, -122.3330, 5),
            zone("1st Ave S Pickup", Pickup, 47.5920, -122.3340, 7),
        ],
    },
    Stadium {
        name: "Gillette Stadium",
        city_key: "boston",
        location: at(42.0909, -71.2643),
        gates: &[
            gate("Gate A", "100-115", 42.0925, -71.2643),
            gate("Gate B", "116-130", 42.0909, -71.2665),
            gate("Gate C", "131-145", 42.0909, -71.2621),
        ],
        ride_share: &[zone("P5 RideShare Lot", Both, 42.0940, -71.2620, 10)],
    },
    Stadium {
        name: "Levi's Stadium",
        city_key: "sanFrancisco",
        location: at(37.4033, -121.9695),
        gates: &[
            gate("Gate A", "100-115", 37.4045, -121.9680),
            gate("Gate B", "116-130", 37.4021, -121.9680),
            gate("Gate F", "200-215", 37.4045, -121.9710),
        ],
        ride_share: &[
            zone("Great America Pkwy Drop-off", Dropoff, 37.4060, -121.9720, 8),
            zone("Lot 1 Pickup", Pickup, 37.4010, -121.9730, 10),
        ],
    },
    Stadium {
        name: "BMO Field",
        city_key: "toronto",
        location: at(43.6332, -79.4186),
        gates: &[
            gate("Gate 1", "100-115", 43.6340, -79.4186),
            gate("Gate 2", "116-130", 43.6324, -79.4186),
        ],
        ride_share: &[zone("Exhibition Place Drop Zone", Both, 43.6355, -79.4170, 6)],
    },
    Stadium {
        name: "BC Place",
        city_key: "vancouver",
        location: at(49.2768, -123.1118),
        gates: &[
            gate("Gate A", "200-215", 49.2780, -123.1118),
            gate("Gate B", "216-230", 49.2768, -123.1095),
            gate("Gate C", "231-245", 49.2768, -123.1141),
        ],
        ride_share: &[zone("Pacific Blvd Zone", Both, 49.2755, -123.1150, 5)],
    },
    Stadium {
        name: "Estadio Azteca",
        city_key: "mexicoCity",
        location: at(19.3029, -99.1505),
        gates: &[
            gate("Puerta 1", "100-115", 19.3045, -99.1505),
            gate("Puerta 2", "116-130", 19.3029, -99.1480),
            gate("Puerta 3", "131-145", 19.3013, -99.1505),
        ],
        ride_share: &[zone("Zona Uber/Didi", Both, 19.3055, -99.1490, 8)],
    },
    Stadium {
        name: "Estadio Akron",
        city_key: "guadalajara",
        location: at(20.6810, -103.4621),
        gates: &[
            gate("Acceso Norte", "100-115", 20.6825, -103.4621),
            gate("Acceso Sur", "116-130", 20.6795, -103.4621),
        ],
        ride_share: &[zone("Zona de Rideshare", Both, 20.6840, -103.4600, 10)],
    },
    Stadium {
        name: "Estadio BBVA",
        city_key: "monterrey",
        location: at(25.6699, -100.2445),
        gates: &[
            gate("Acceso Principal", "100-120", 25.6710, -100.2445),
            gate("Acceso Este", "121-140", 25.6699, -100.2420),
        ],
        ride_share: &[zone("Zona Uber/Didi", Both, 25.6725, -100.2430, 7)],
    },
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn arrowhead() -> &'static Stadium {
        &STADIUMS[0]
    }

    #[test]
    fn test_approach_radius() {
        let stadium = arrowhead();
        assert!(stadium.is_approached_from(stadium.location));
        // ~0.01 degrees of latitude is about 1.1 km.
        assert!(stadium.is_approached_from(at(39.0589, -94.4839)));
        // ~0.02 degrees is about 2.2 km.
        assert!(!stadium.is_approached_from(at(39.0689, -94.4839)));
    }

    #[test]
    fn test_nearest_gate() {
        let stadium = arrowhead();
        let south = at(39.0470, -94.4839);
        assert_eq!(stadium.nearest_gate(south).unwrap().name, "Gate C");
        let west = at(39.0489, -94.4870);
        assert_eq!(stadium.nearest_gate(west).unwrap().name, "Gate D");
    }

    #[test]
    fn test_nearest_dropoff_skips_pickup_only_zones() {
        let stadium = arrowhead();
        // Right next to the pickup-only Red Lot Exit.
        let point = at(39.0510, -94.4875);
        assert_eq!(
            stadium.nearest_dropoff(point).unwrap().name,
            "Lot N RideShare Zone"
        );

        let houston = STADIUMS.iter().find(|s| s.city_key == "houston").unwrap();
        assert_eq!(houston.nearest_dropoff(houston.location).unwrap().walking_minutes, 10);
    }

    #[test]
    fn test_every_stadium_has_a_gate_and_a_dropoff() {
        for stadium in &STADIUMS {
            assert!(stadium.nearest_gate(stadium.location).is_some(), "{}", stadium.name);
            assert!(stadium.nearest_dropoff(stadium.location).is_some(), "{}", stadium.name);
        }
    }
}
