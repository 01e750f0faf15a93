use std::collections::HashMap;
use std::fmt;

use engine::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scenes::GameScene;

pub(crate) const DEFAULT_MARKER_HIT_RADIUS: f32 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum LocationId {
    Tent,
    MoominHouse,
    Bridge,
}

impl LocationId {
    pub(crate) const ALL: [LocationId; 3] =
        [LocationId::Tent, LocationId::MoominHouse, LocationId::Bridge];

    pub(crate) const fn name(self) -> &'static str {
        match self {
            LocationId::Tent => "tent",
            LocationId::MoominHouse => "moomin_house",
            LocationId::Bridge => "bridge",
        }
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SubsceneId {
    House,
    Fishing,
}

impl fmt::Display for SubsceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubsceneId::House => "house",
            SubsceneId::Fishing => "fishing",
        })
    }
}

/// Half-open interval `[start, end)` of world X coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct DetectionRange {
    pub(crate) start: f32,
    pub(crate) end: f32,
}

impl DetectionRange {
    pub(crate) const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    pub(crate) fn contains(&self, x: f32) -> bool {
        self.start <= x && x < self.end
    }

    fn overlaps(&self, other: &DetectionRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for DetectionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Location {
    pub(crate) id: LocationId,
    pub(crate) scene: GameScene,
    pub(crate) spawn_position: Vec2,
    pub(crate) detection_range: DetectionRange,
    pub(crate) map_marker_position: Vec2,
}

/// Arrival from a sub-scene lands at the spawn of `location`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SubsceneReturn {
    pub(crate) subscene: SubsceneId,
    pub(crate) location: LocationId,
}

/// Serialized form of the registry, as stored in `assets/locations.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LocationTable {
    pub(crate) locations: Vec<Location>,
    #[serde(default)]
    pub(crate) subscene_returns: Vec<SubsceneReturn>,
    #[serde(default = "default_marker_hit_radius")]
    pub(crate) marker_hit_radius: f32,
}

fn default_marker_hit_radius() -> f32 {
    DEFAULT_MARKER_HIT_RADIUS
}

impl LocationTable {
    pub(crate) fn builtin() -> Self {
        Self {
            locations: vec![
                Location {
                    id: LocationId::Tent,
                    scene: GameScene::Overworld,
                    spawn_position: Vec2::new(108.0, 1100.0),
                    detection_range: DetectionRange::new(0.0, 1500.0),
                    map_marker_position: Vec2::new(108.0, 203.0),
                },
                Location {
                    id: LocationId::MoominHouse,
                    scene: GameScene::Overworld,
                    spawn_position: Vec2::new(2588.0, 921.0),
                    detection_range: DetectionRange::new(2000.0, 3000.0),
                    map_marker_position: Vec2::new(-239.0, 547.0),
                },
                Location {
                    id: LocationId::Bridge,
                    scene: GameScene::Overworld,
                    spawn_position: Vec2::new(-1470.0, 1114.0),
                    detection_range: DetectionRange::new(-2000.0, 0.0),
                    map_marker_position: Vec2::new(290.0, 134.0),
                },
            ],
            subscene_returns: vec![
                SubsceneReturn {
                    subscene: SubsceneId::House,
                    location: LocationId::MoominHouse,
                },
                SubsceneReturn {
                    subscene: SubsceneId::Fishing,
                    location: LocationId::Bridge,
                },
            ],
            marker_hit_radius: DEFAULT_MARKER_HIT_RADIUS,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub(crate) enum LocationError {
    #[error("location {0} is not registered")]
    UnknownLocation(LocationId),
    #[error("no return location is registered for sub-scene {0}")]
    UnknownSubscene(SubsceneId),
    #[error("location table is empty")]
    NoLocations,
    #[error("location {0} is missing from the table")]
    MissingLocation(LocationId),
    #[error("location {0} is registered more than once")]
    DuplicateLocation(LocationId),
    #[error("sub-scene {0} has more than one return location")]
    DuplicateSubscene(SubsceneId),
    #[error("location {location} has a non-finite {field}")]
    NonFiniteCoordinate {
        location: LocationId,
        field: &'static str,
    },
    #[error("location {location} has an empty detection range {range}")]
    EmptyRange {
        location: LocationId,
        range: DetectionRange,
    },
    #[error("detection ranges of {first} {first_range} and {second} {second_range} overlap")]
    OverlappingRanges {
        first: LocationId,
        first_range: DetectionRange,
        second: LocationId,
        second_range: DetectionRange,
    },
    #[error("sub-scene {subscene} returns to unregistered location {location}")]
    UnknownSubsceneLocation {
        subscene: SubsceneId,
        location: LocationId,
    },
    #[error("location {location} lives in {scene:?}, which cannot host the player")]
    NonGameplayScene {
        location: LocationId,
        scene: GameScene,
    },
    #[error("marker hit radius must be positive and finite, got {0}")]
    InvalidHitRadius(f32),
}

/// Validated, read-only lookup table of every named place in the valley.
#[derive(Debug, Clone)]
pub(crate) struct LocationRegistry {
    locations: Vec<Location>,
    subscene_returns: HashMap<SubsceneId, LocationId>,
    marker_hit_radius: f32,
}

impl LocationRegistry {
    pub(crate) fn builtin() -> Result<Self, LocationError> {
        Self::from_table(LocationTable::builtin())
    }

    pub(crate) fn from_table(table: LocationTable) -> Result<Self, LocationError> {
        let LocationTable {
            locations,
            subscene_returns,
            marker_hit_radius,
        } = table;

        if locations.is_empty() {
            return Err(LocationError::NoLocations);
        }
        if !marker_hit_radius.is_finite() || marker_hit_radius <= 0.0 {
            return Err(LocationError::InvalidHitRadius(marker_hit_radius));
        }

        for (index, location) in locations.iter().enumerate() {
            if locations[..index].iter().any(|seen| seen.id == location.id) {
                return Err(LocationError::DuplicateLocation(location.id));
            }
            validate_location(location)?;
        }
        validate_disjoint_ranges(&locations)?;

        let mut returns = HashMap::with_capacity(subscene_returns.len());
        for row in subscene_returns {
            if !locations.iter().any(|location| location.id == row.location) {
                return Err(LocationError::UnknownSubsceneLocation {
                    subscene: row.subscene,
                    location: row.location,
                });
            }
            if returns.insert(row.subscene, row.location).is_some() {
                return Err(LocationError::DuplicateSubscene(row.subscene));
            }
        }
        if let Some(missing) = LocationId::ALL
            .into_iter()
            .find(|id| !locations.iter().any(|location| location.id == *id))
        {
            return Err(LocationError::MissingLocation(missing));
        }

        Ok(Self {
            locations,
            subscene_returns: returns,
            marker_hit_radius,
        })
    }

    pub(crate) fn resolve(&self, id: LocationId) -> Result<&Location, LocationError> {
        self.locations
            .iter()
            .find(|location| location.id == id)
            .ok_or(LocationError::UnknownLocation(id))
    }

    pub(crate) fn subscene_return(&self, subscene: SubsceneId) -> Result<&Location, LocationError> {
        let id = self
            .subscene_returns
            .get(&subscene)
            .copied()
            .ok_or(LocationError::UnknownSubscene(subscene))?;
        self.resolve(id)
    }

    /// Location whose detection range contains world `x`, if any.
    ///
    /// Ranges are disjoint, so at most one can match.
    pub(crate) fn infer_from_position(&self, x: f32) -> Option<LocationId> {
        self.locations
            .iter()
            .find(|location| location.detection_range.contains(x))
            .map(|location| location.id)
    }

    /// Location whose map marker hit-circle contains `point`; nearest marker wins.
    pub(crate) fn marker_at(&self, point: Vec2) -> Option<LocationId> {
        let radius_squared = self.marker_hit_radius * self.marker_hit_radius;
        self.locations
            .iter()
            .map(|location| {
                (
                    location.id,
                    location.map_marker_position.distance_squared(point),
                )
            })
            .filter(|(_, distance_squared)| *distance_squared <= radius_squared)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    pub(crate) fn marker_hit_radius(&self) -> f32 {
        self.marker_hit_radius
    }

    pub(crate) fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Largest absolute marker coordinate on each axis, padded by the hit radius.
    pub(crate) fn marker_extent(&self) -> Vec2 {
        self.locations.iter().fold(Vec2::default(), |extent, location| {
            let marker = location.map_marker_position;
            Vec2::new(
                extent.x.max(marker.x.abs() + self.marker_hit_radius),
                extent.y.max(marker.y.abs() + self.marker_hit_radius),
            )
        })
    }

    /// Uncovered stretches of X between the outermost detection ranges.
    pub(crate) fn range_gaps(&self) -> Vec<DetectionRange> {
        let mut ranges: Vec<DetectionRange> = self
            .locations
            .iter()
            .map(|location| location.detection_range)
            .collect();
        ranges.sort_by(|a, b| a.start.total_cmp(&b.start));
        ranges
            .windows(2)
            .filter(|pair| pair[0].end < pair[1].start)
            .map(|pair| DetectionRange::new(pair[0].end, pair[1].start))
            .collect()
    }
}

fn validate_location(location: &Location) -> Result<(), LocationError> {
    let non_finite = |field: &'static str| LocationError::NonFiniteCoordinate {
        location: location.id,
        field,
    };
    if !location.spawn_position.is_finite() {
        return Err(non_finite("spawn_position"));
    }
    if !location.map_marker_position.is_finite() {
        return Err(non_finite("map_marker_position"));
    }
    let range = location.detection_range;
    if !range.start.is_finite() || !range.end.is_finite() {
        return Err(non_finite("detection_range"));
    }
    if range.start >= range.end {
        return Err(LocationError::EmptyRange {
            location: location.id,
            range,
        });
    }
    if !location.scene.is_gameplay() {
        return Err(LocationError::NonGameplayScene {
            location: location.id,
            scene: location.scene,
        });
    }
    Ok(())
}

fn validate_disjoint_ranges(locations: &[Location]) -> Result<(), LocationError> {
    for (index, first) in locations.iter().enumerate() {
        for second in &locations[index + 1..] {
            if first.detection_range.overlaps(&second.detection_range) {
                return Err(LocationError::OverlappingRanges {
                    first: first.id,
                    first_range: first.detection_range,
                    second: second.id,
                    second_range: second.detection_range,
                });
            }
        }
    }
    Ok(())
}
