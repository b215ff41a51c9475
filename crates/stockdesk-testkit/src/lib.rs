// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod document;
mod memory_api;
mod surface;

pub use document::{Element, MemoryDocument};
pub use memory_api::{ApiCall, CallKind, MemoryApi};
pub use surface::{PaginationView, RecordingSurface};

use stockdesk_app::{
    Department, DepartmentId, Organization, OrganizationId, Packaging, PackagingId, Position,
    PositionId, ProductModel, ProductModelId, User, UserId, WaterRate, WaterRateId,
};
use time::{Duration, Month, OffsetDateTime, Time};

const DEPARTMENTS: [&str; 6] = [
    "Production",
    "Quality Control",
    "Warehouse",
    "Purchasing",
    "Finance",
    "Logistics",
];

const POSITIONS: [&str; 5] = ["Operator", "Inspector", "Supervisor", "Clerk", "Manager"];

const ORGANIZATIONS: [&str; 4] = [
    "North Plant",
    "River Mill",
    "East Depot",
    "Harbor Branch",
];

const PACKAGING_KINDS: [&str; 8] = [
    "Woven Sack",
    "Jute Bag",
    "Carton",
    "Bulk Bag",
    "Paper Sack",
    "Drum",
    "Crate",
    "Pallet Wrap",
];

const MODEL_FAMILIES: [&str; 6] = ["Grain", "Seed", "Feed", "Flour", "Bran", "Meal"];
const MODEL_GRADES: [&str; 4] = ["Standard", "Premium", "Export", "Bulk"];

const SEASONS: [&str; 4] = ["Spring", "Summer", "Autumn", "Winter"];

const FIRST_NAMES: [&str; 12] = [
    "Wei", "Fang", "Lei", "Jing", "Tao", "Min", "Hui", "Jun", "Ying", "Bo", "Lan", "Qiang",
];
const LAST_NAMES: [&str; 10] = [
    "Wang", "Li", "Zhang", "Liu", "Chen", "Yang", "Zhao", "Huang", "Zhou", "Wu",
];

const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of plausible back-office records. The same seed always
/// yields the same sequence.
#[derive(Debug, Clone)]
pub struct StockFaker {
    rng: DeterministicRng,
}

impl StockFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn departments(&self) -> Vec<Department> {
        DEPARTMENTS
            .iter()
            .zip(1..)
            .map(|(name, id)| Department {
                id: DepartmentId::new(id),
                name: (*name).to_owned(),
            })
            .collect()
    }

    pub fn positions(&self) -> Vec<Position> {
        POSITIONS
            .iter()
            .zip(1..)
            .map(|(name, id)| Position {
                id: PositionId::new(id),
                name: (*name).to_owned(),
            })
            .collect()
    }

    pub fn organizations(&self) -> Vec<Organization> {
        ORGANIZATIONS
            .iter()
            .zip(1..)
            .map(|(name, id)| Organization {
                id: OrganizationId::new(id),
                name: (*name).to_owned(),
            })
            .collect()
    }

    pub fn packaging(&mut self, id: i64) -> Packaging {
        let kind = self.pick(&PACKAGING_KINDS);
        let capacity = 5 * (1 + self.int_n(10));
        let weight_kg = if self.int_n(4) == 0 {
            None
        } else {
            Some((20 + self.int_n(480)) as f64 / 100.0)
        };
        Packaging {
            id: PackagingId::new(id),
            name: format!("{kind} {capacity}kg"),
            specification: format!("{}x{}cm", 40 + self.int_n(60), 60 + self.int_n(60)),
            weight_kg,
            description: String::new(),
        }
    }

    pub fn product_model(&mut self, id: i64) -> ProductModel {
        let family = self.pick(&MODEL_FAMILIES);
        let grade = self.pick(&MODEL_GRADES);
        ProductModel {
            id: ProductModelId::new(id),
            name: format!("{grade} {family}"),
            code: format!(
                "{}-{}{:03}",
                &family[..2].to_ascii_uppercase(),
                &grade[..1],
                self.int_n(1000)
            ),
            organization: self.optional_organization(),
            description: String::new(),
        }
    }

    pub fn water_rate(&mut self, id: i64) -> WaterRate {
        let season = self.pick(&SEASONS);
        WaterRate {
            id: WaterRateId::new(id),
            name: format!("{season} deduction"),
            rate: self.int_n(200) as f64 / 2.0,
            organization: self.optional_organization(),
            description: String::new(),
        }
    }

    pub fn user(&mut self, id: i64) -> User {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let username = format!("{}.{}{id}", last.to_ascii_lowercase(), first.to_ascii_lowercase());
        let joined = reference_now() - Duration::days(self.int_n(1500) as i64);
        User {
            id: UserId::new(id),
            email: Some(format!("{username}@example.com")),
            username,
            first_name: Some(first.to_owned()),
            last_name: Some(last.to_owned()),
            department: Some(DepartmentId::new(1 + self.int_n(DEPARTMENTS.len()) as i64)),
            position: Some(PositionId::new(1 + self.int_n(POSITIONS.len()) as i64)),
            is_active: self.int_n(5) != 0,
            date_joined: Some(joined),
        }
    }

    pub fn users(&mut self, count: usize) -> Vec<User> {
        (1..=count as i64).map(|id| self.user(id)).collect()
    }

    fn optional_organization(&mut self) -> Option<OrganizationId> {
        let pick = self.int_n(ORGANIZATIONS.len() + 1);
        (pick > 0).then(|| OrganizationId::new(pick as i64))
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }
}

fn reference_now() -> OffsetDateTime {
    match time::Date::from_calendar_date(REFERENCE_YEAR, Month::June, 1) {
        Ok(date) => date.with_time(Time::MIDNIGHT).assume_utc(),
        Err(_) => OffsetDateTime::UNIX_EPOCH,
    }
}
