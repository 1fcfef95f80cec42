use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for delivery jobs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for drivers. Ordering is lexicographic and feeds the
/// final tie-break during selection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(pub String);

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Service regions. Booking forms send `north-east` while the roster
/// export uses `north_east`; both spellings land on the same variant and
/// nothing past the parser ever compares raw codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Region {
    Central,
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Region {
    pub const ALL: [Region; 9] = [
        Region::Central,
        Region::North,
        Region::South,
        Region::East,
        Region::West,
        Region::NorthEast,
        Region::NorthWest,
        Region::SouthEast,
        Region::SouthWest,
    ];

    /// Canonical hyphenated code.
    pub const fn code(self) -> &'static str {
        match self {
            Region::Central => "central",
            Region::North => "north",
            Region::South => "south",
            Region::East => "east",
            Region::West => "west",
            Region::NorthEast => "north-east",
            Region::NorthWest => "north-west",
            Region::SouthEast => "south-east",
            Region::SouthWest => "south-west",
        }
    }

    /// Accepts hyphenated, underscored or spaced codes in any case.
    pub fn from_code(raw: &str) -> Result<Self, RegionCodeError> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|ch| match ch {
                '_' | ' ' => '-',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        Region::ALL
            .into_iter()
            .find(|region| region.code() == normalized)
            .ok_or_else(|| RegionCodeError(raw.to_string()))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = RegionCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::from_code(s)
    }
}

impl TryFrom<String> for Region {
    type Error = RegionCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Region::from_code(&value)
    }
}

impl From<Region> for String {
    fn from(value: Region) -> Self {
        value.code().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown region code '{0}'")]
pub struct RegionCodeError(pub String);

/// Vehicle classes ordered by carrying capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Bicycle,
    Motorcycle,
    Car,
    Van,
    Truck,
}

impl VehicleType {
    /// A larger vehicle can always take a job booked for a smaller one.
    pub fn satisfies(self, required: VehicleType) -> bool {
        self >= required
    }
}

/// Pickup window within a day, written `HH:MM-HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, TimeSlotError> {
        if start >= end {
            return Err(TimeSlotError::Empty {
                start: start.format("%H:%M").to_string(),
                end: end.format("%H:%M").to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn parse(raw: &str) -> Result<Self, TimeSlotError> {
        let (start, end) = raw
            .trim()
            .split_once('-')
            .ok_or_else(|| TimeSlotError::Malformed(raw.to_string()))?;
        let parse_time = |value: &str| {
            NaiveTime::parse_from_str(value.trim(), "%H:%M")
                .map_err(|_| TimeSlotError::Malformed(raw.to_string()))
        };
        Self::new(parse_time(start)?, parse_time(end)?)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn start_hour(&self) -> u8 {
        self.start.hour() as u8
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = TimeSlotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeSlot::parse(&value)
    }
}

impl From<TimeSlot> for String {
    fn from(value: TimeSlot) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeSlotError {
    #[error("time slot '{0}' must look like HH:MM-HH:MM")]
    Malformed(String),
    #[error("time slot {start}-{end} ends before it starts")]
    Empty { start: String, end: String },
}

/// Job lifecycle as seen by the booking system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Booked,
    PendingAssignment,
    Assigned,
    InTransit,
    Delivered,
    Cancelled,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Booked => "booked",
            JobStatus::PendingAssignment => "pending-assignment",
            JobStatus::Assigned => "assigned",
            JobStatus::InTransit => "in-transit",
            JobStatus::Delivered => "delivered",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub const fn awaits_assignment(self) -> bool {
        matches!(self, JobStatus::Booked | JobStatus::PendingAssignment)
    }
}

/// Read-only snapshot of a delivery job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub pickup_region: Region,
    pub pickup_date: NaiveDate,
    pub pickup_slot: TimeSlot,
    #[serde(default)]
    pub required_vehicle: Option<VehicleType>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

/// Jobs already committed to a driver for one slot of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedLoad {
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub jobs: u32,
}

/// Read-only snapshot of a driver and the load already on their books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub primary_region: Region,
    #[serde(default)]
    pub secondary_regions: BTreeSet<Region>,
    pub vehicle_type: VehicleType,
    pub is_active: bool,
    pub max_jobs_per_day: u32,
    pub max_jobs_per_slot: u32,
    pub work_day_start_hour: u8,
    pub work_day_end_hour: u8,
    #[serde(default)]
    pub committed: Vec<CommittedLoad>,
}

/// How a driver's territory relates to a pickup region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionCoverage {
    Primary,
    Secondary,
    Uncovered,
}

impl Driver {
    pub fn coverage(&self, region: Region) -> RegionCoverage {
        if self.primary_region == region {
            RegionCoverage::Primary
        } else if self.secondary_regions.contains(&region) {
            RegionCoverage::Secondary
        } else {
            RegionCoverage::Uncovered
        }
    }

    pub fn works_at(&self, hour: u8) -> bool {
        (self.work_day_start_hour..self.work_day_end_hour).contains(&hour)
    }
}

/// Whether a decision came from the batch run or an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentMode {
    Auto,
    Manual,
}
