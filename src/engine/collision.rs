//! Geometric collision detection: intersect dog movement segments
//! ("gatherers") against stationary points ("items" — loot and offices).

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }

    fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    fn len_sq(self) -> f64 {
        self.dot(self)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Item {
    pub position: Vec2,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Gatherer {
    pub start: Vec2,
    pub end: Vec2,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatherEvent {
    pub item_id: usize,
    pub gatherer_id: usize,
    pub sq_distance: f64,
    pub ratio: f64,
}

/// Projects every item onto every gatherer's movement segment and emits
/// an event wherever the closest approach is within `gatherer.radius +
/// item.radius`. Events are sorted by `ratio` ascending (earliest point
/// along the movement the collision occurs), ties broken by insertion
/// order — which is what makes results deterministic when two dogs could
/// claim the same loot in one tick.
pub fn find_gather_events(items: &[Item], gatherers: &[Gatherer]) -> Vec<GatherEvent> {
    let mut events = Vec::new();

    for (gatherer_id, gatherer) in gatherers.iter().enumerate() {
        let movement = gatherer.end.sub(gatherer.start);
        if movement.len_sq() < EPSILON {
            continue;
        }

        for (item_id, item) in items.iter().enumerate() {
            let to_item = item.position.sub(gatherer.start);

            let ratio = to_item.dot(movement) / movement.len_sq();
            let ratio = ratio.clamp(0.0, 1.0);

            let closest = Vec2::new(
                gatherer.start.x + movement.x * ratio,
                gatherer.start.y + movement.y * ratio,
            );
            let sq_distance = item.position.sub(closest).len_sq();

            let min_distance = gatherer.radius + item.radius;
            if sq_distance <= min_distance * min_distance + EPSILON {
                events.push(GatherEvent {
                    item_id,
                    gatherer_id,
                    sq_distance,
                    ratio,
                });
            }
        }
    }

    events.sort_by(|a, b| a.ratio.partial_cmp(&b.ratio).unwrap());
    events
}
