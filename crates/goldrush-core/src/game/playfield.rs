//! Falling items, spawn rules and hit testing on the 375 x 500 field.

use rand::Rng;
use serde::Serialize;

pub const FIELD_WIDTH: f32 = 375.0;
pub const FIELD_HEIGHT: f32 = 500.0;

/// One item is spawned per interval
pub const SPAWN_INTERVAL_MS: i64 = 800;

/// Motion ticks per second
pub const TICKS_PER_SECOND: u32 = 60;

pub const DIAMOND_CHANCE: f64 = 0.025;
pub const GOLD_CHANCE: f64 = 0.7;
pub const MAX_DIAMONDS_PER_SESSION: u32 = 2;
pub const DIAMOND_SPACING_MS: i64 = 20_000;

/// Padding added around an item's rectangle when testing a tap
pub const BASE_HIT_MARGIN: f32 = 10.0;
pub const PRECISION_HIT_MULTIPLIER: f32 = 1.5;

pub const GOLD_POINTS: u64 = 10;
pub const DIAMOND_POINTS: u64 = 50;
pub const ROCK_PENALTY: u64 = 5;

const DIAMOND_SPEED: f32 = 1.5;
const MIN_SPEED: f32 = 2.0;
const SPEED_SPREAD: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Gold,
    Diamond,
    Rock,
}

impl ItemType {
    /// (width, height) in pixels
    pub fn size(&self) -> (f32, f32) {
        match self {
            Self::Diamond => (50.0, 50.0),
            Self::Gold | Self::Rock => (40.0, 40.0),
        }
    }

    /// Score after hitting this item
    pub fn apply(&self, score: u64) -> u64 {
        match self {
            Self::Gold => score + GOLD_POINTS,
            Self::Diamond => score + DIAMOND_POINTS,
            Self::Rock => score.saturating_sub(ROCK_PENALTY),
        }
    }
}

/// Pick the kind for one spawn from a single draw `r` in [0, 1)
pub fn draw_kind(r: f64, diamonds_spawned: u32, ms_since_last_diamond: Option<i64>) -> ItemType {
    let diamond_allowed = diamonds_spawned < MAX_DIAMONDS_PER_SESSION
        && ms_since_last_diamond.map_or(true, |ms| ms > DIAMOND_SPACING_MS);
    if diamond_allowed && r < DIAMOND_CHANCE {
        ItemType::Diamond
    } else if r < GOLD_CHANCE {
        ItemType::Gold
    } else {
        ItemType::Rock
    }
}

/// Hit margin for the current precision state
pub fn hit_margin(precision_active: bool) -> f32 {
    if precision_active {
        BASE_HIT_MARGIN * PRECISION_HIT_MULTIPLIER
    } else {
        BASE_HIT_MARGIN
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallingItem {
    pub id: u64,
    pub kind: ItemType,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Pixels per motion tick
    pub speed: f32,
}

impl FallingItem {
    /// True if (x, y) lies within the rectangle grown by `margin` on each side
    pub fn contains(&self, x: f32, y: f32, margin: f32) -> bool {
        x >= self.x - margin
            && x <= self.x + self.width + margin
            && y >= self.y - margin
            && y <= self.y + self.height + margin
    }
}

#[derive(Debug, Clone, Default)]
pub struct Playfield {
    items: Vec<FallingItem>,
    next_id: u64,
    diamonds_spawned: u32,
    last_diamond_at: Option<i64>,
}

impl Playfield {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[FallingItem] {
        &self.items
    }

    pub fn diamonds_spawned(&self) -> u32 {
        self.diamonds_spawned
    }

    /// Spawn one item above the field
    pub fn spawn<R: Rng>(&mut self, rng: &mut R, now_ms: i64) -> &FallingItem {
        let since_diamond = self.last_diamond_at.map(|at| now_ms - at);
        let kind = draw_kind(rng.gen::<f64>(), self.diamonds_spawned, since_diamond);
        let (width, _) = kind.size();
        let x = rng.gen::<f32>() * (FIELD_WIDTH - width);
        let speed = match kind {
            ItemType::Diamond => DIAMOND_SPEED,
            _ => MIN_SPEED + rng.gen::<f32>() * SPEED_SPREAD,
        };
        if kind == ItemType::Diamond {
            self.diamonds_spawned += 1;
            self.last_diamond_at = Some(now_ms);
        }
        let (_, height) = kind.size();
        self.place(kind, x, -height, speed)
    }

    /// Put an item at an exact position
    pub fn place(&mut self, kind: ItemType, x: f32, y: f32, speed: f32) -> &FallingItem {
        let (width, height) = kind.size();
        self.next_id += 1;
        self.items.push(FallingItem {
            id: self.next_id,
            kind,
            x,
            y,
            width,
            height,
            speed,
        });
        &self.items[self.items.len() - 1]
    }

    /// One motion tick; returns how many items left the field
    pub fn advance(&mut self) -> usize {
        let before = self.items.len();
        for item in &mut self.items {
            item.y += item.speed;
        }
        self.items.retain(|item| item.y < FIELD_HEIGHT);
        before - self.items.len()
    }

    /// Remove and return every item under the tap
    pub fn take_hits(&mut self, x: f32, y: f32, margin: f32) -> Vec<FallingItem> {
        let (hit, kept): (Vec<_>, Vec<_>) = self
            .items
            .drain(..)
            .partition(|item| item.contains(x, y, margin));
        self.items = kept;
        hit
    }

    /// TNT: remove every falling rock
    pub fn clear_rocks(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.kind != ItemType::Rock);
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_draw_thresholds() {
        assert_eq!(draw_kind(0.01, 0, None), ItemType::Diamond);
        assert_eq!(draw_kind(0.025, 0, None), ItemType::Gold);
        assert_eq!(draw_kind(0.69, 0, None), ItemType::Gold);
        assert_eq!(draw_kind(0.7, 0, None), ItemType::Rock);
    }

    #[test]
    fn test_diamond_limits() {
        // Low draws fall through to gold when a diamond is not allowed
        assert_eq!(draw_kind(0.01, 2, None), ItemType::Gold);
        assert_eq!(draw_kind(0.01, 1, Some(20_000)), ItemType::Gold);
        assert_eq!(draw_kind(0.01, 1, Some(20_001)), ItemType::Diamond);
    }

    #[test]
    fn test_spawn_stays_in_field() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut field = Playfield::new();
        for i in 0..500 {
            let item = field.spawn(&mut rng, i * SPAWN_INTERVAL_MS).clone();
            assert!(item.x >= 0.0 && item.x + item.width <= FIELD_WIDTH);
            assert_eq!(item.y, -item.height);
            match item.kind {
                ItemType::Diamond => assert_eq!(item.speed, 1.5),
                _ => assert!((2.0..=4.0).contains(&item.speed)),
            }
        }
        assert!(field.diamonds_spawned() <= MAX_DIAMONDS_PER_SESSION);
    }

    #[test]
    fn test_items_leave_at_bottom() {
        let mut field = Playfield::new();
        field.place(ItemType::Gold, 10.0, 497.0, 3.0);
        field.place(ItemType::Rock, 10.0, 0.0, 3.0);
        assert_eq!(field.advance(), 1);
        assert_eq!(field.items().len(), 1);
        assert_eq!(field.items()[0].y, 3.0);
    }

    #[test]
    fn test_hit_margin_and_precision() {
        let mut field = Playfield::new();
        field.place(ItemType::Gold, 100.0, 100.0, 2.0);

        // 12 px left of the rectangle: outside the base margin, inside precision
        assert!(field.take_hits(88.0, 120.0, hit_margin(false)).is_empty());
        let hits = field.take_hits(88.0, 120.0, hit_margin(true));
        assert_eq!(hits.len(), 1);
        assert!(field.items().is_empty());
    }

    #[test]
    fn test_overlapping_items_all_hit() {
        let mut field = Playfield::new();
        field.place(ItemType::Gold, 100.0, 100.0, 2.0);
        field.place(ItemType::Rock, 120.0, 110.0, 2.0);
        field.place(ItemType::Gold, 300.0, 300.0, 2.0);
        assert_eq!(field.take_hits(130.0, 130.0, BASE_HIT_MARGIN).len(), 2);
        assert_eq!(field.items().len(), 1);
    }

    #[test]
    fn test_clear_rocks() {
        let mut field = Playfield::new();
        field.place(ItemType::Rock, 0.0, 0.0, 2.0);
        field.place(ItemType::Gold, 50.0, 0.0, 2.0);
        field.place(ItemType::Rock, 100.0, 0.0, 2.0);
        assert_eq!(field.clear_rocks(), 2);
        assert_eq!(field.items()[0].kind, ItemType::Gold);
    }

    #[test]
    fn test_rock_never_below_zero() {
        assert_eq!(ItemType::Rock.apply(3), 0);
        assert_eq!(ItemType::Rock.apply(12), 7);
        assert_eq!(ItemType::Diamond.apply(0), 50);
    }
}
