//! Dashboard statistics.
//!
//! Aggregates are derived on every call from the stored appointments and
//! registered users. Failures to load either collection are absorbed and
//! produce the all-zero record, since a dashboard must always render.

use std::sync::Arc;

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use tracing::warn;

use crate::cache::CacheStore;
use crate::error::Result;
use crate::keys;

// == Input Records ==
/// The fields of a stored appointment that statistics look at.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<String>,
}

/// The fields of a registered user that statistics look at.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub role: Option<String>,
}

// == Status Classification ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Confirmed,
    Cancelled,
    Pending,
}

impl Status {
    // Anything that is not confirmed or cancelled counts as pending.
    fn classify(raw: Option<&str>) -> Self {
        match raw {
            Some("confirmed") => Status::Confirmed,
            Some("cancelled") => Status::Cancelled,
            _ => Status::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusPercentages {
    pub confirmed: f64,
    pub cancelled: f64,
    pub pending: f64,
}

// == Specialty Counts ==
/// Appointment count per specialty, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecialtyCounts(Vec<(String, u64)>);

impl SpecialtyCounts {
    fn record(&mut self, specialty: &str) {
        match self.0.iter_mut().find(|(name, _)| name == specialty) {
            Some((_, count)) => *count += 1,
            None => self.0.push((specialty.to_string(), 1)),
        }
    }

    pub fn get(&self, specialty: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(name, _)| name == specialty)
            .map(|(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }
}

impl Serialize for SpecialtyCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

// == Tally ==
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    total: u64,
    confirmed: u64,
    cancelled: u64,
    pending: u64,
}

impl Tally {
    fn percentages(&self) -> StatusPercentages {
        if self.total == 0 {
            return StatusPercentages::default();
        }
        let share = |count: u64| 100.0 * count as f64 / self.total as f64;
        StatusPercentages {
            confirmed: share(self.confirmed),
            cancelled: share(self.cancelled),
            pending: share(self.pending),
        }
    }
}

fn tally<'a>(
    appointments: impl Iterator<Item = &'a AppointmentRecord>,
) -> (Tally, SpecialtyCounts) {
    let mut counts = Tally::default();
    let mut specialties = SpecialtyCounts::default();

    for appointment in appointments {
        counts.total += 1;
        match Status::classify(appointment.status.as_deref()) {
            Status::Confirmed => counts.confirmed += 1,
            Status::Cancelled => counts.cancelled += 1,
            Status::Pending => counts.pending += 1,
        }
        if let Some(specialty) = appointment.specialty.as_deref() {
            specialties.record(specialty);
        }
    }

    (counts, specialties)
}

// == Statistics Records ==
/// Clinic-wide dashboard numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_appointments: u64,
    pub confirmed_appointments: u64,
    pub total_patients: u64,
    pub total_doctors: u64,
    pub status_percentages: StatusPercentages,
    pub specialties: SpecialtyCounts,
}

/// Numbers for a single doctor's appointments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorStatistics {
    pub total_appointments: u64,
    pub confirmed_appointments: u64,
    pub cancelled_appointments: u64,
    pub pending_appointments: u64,
    pub status_percentages: StatusPercentages,
    pub specialties: SpecialtyCounts,
}

// == Aggregation ==
/// Clinic-wide numbers over every appointment and registered user.
///
/// # Arguments
/// * `appointments` - All stored appointments
/// * `users` - All registered users; only `role` is read
pub fn compute_statistics(appointments: &[AppointmentRecord], users: &[UserRecord]) -> Statistics {
    let (counts, specialties) = tally(appointments.iter());
    let with_role = |role: &str| {
        users
            .iter()
            .filter(|user| user.role.as_deref() == Some(role))
            .count() as u64
    };

    Statistics {
        total_appointments: counts.total,
        confirmed_appointments: counts.confirmed,
        total_patients: with_role("patient"),
        total_doctors: with_role("doctor"),
        status_percentages: counts.percentages(),
        specialties,
    }
}

/// Same reduction restricted to appointments whose `doctorId` matches.
pub fn compute_doctor_statistics(
    appointments: &[AppointmentRecord],
    doctor_id: &str,
) -> DoctorStatistics {
    let (counts, specialties) = tally(
        appointments
            .iter()
            .filter(|a| a.doctor_id.as_deref() == Some(doctor_id)),
    );

    DoctorStatistics {
        total_appointments: counts.total,
        confirmed_appointments: counts.confirmed,
        cancelled_appointments: counts.cancelled,
        pending_appointments: counts.pending,
        status_percentages: counts.percentages(),
        specialties,
    }
}

// == Statistics Service ==
pub struct StatisticsService {
    cache: Arc<CacheStore>,
}

impl StatisticsService {
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self { cache }
    }

    async fn appointments(&self) -> Result<Vec<AppointmentRecord>> {
        self.cache.get_or(keys::APPOINTMENTS, Vec::new()).await
    }

    async fn users(&self) -> Result<Vec<UserRecord>> {
        self.cache.get_or(keys::REGISTERED_USERS, Vec::new()).await
    }

    async fn load_all(&self) -> Result<(Vec<AppointmentRecord>, Vec<UserRecord>)> {
        Ok((self.appointments().await?, self.users().await?))
    }

    /// Clinic-wide statistics; all zeros if the data cannot be loaded.
    pub async fn general_statistics(&self) -> Statistics {
        match self.load_all().await {
            Ok((appointments, users)) => compute_statistics(&appointments, &users),
            Err(e) => {
                warn!(error = %e, "Could not compute statistics, reporting zeros");
                Statistics::default()
            }
        }
    }

    /// Statistics for one doctor; all zeros if the data cannot be loaded.
    pub async fn doctor_statistics(&self, doctor_id: &str) -> DoctorStatistics {
        match self.appointments().await {
            Ok(appointments) => compute_doctor_statistics(&appointments, doctor_id),
            Err(e) => {
                warn!(doctor_id, error = %e, "Could not compute doctor statistics, reporting zeros");
                DoctorStatistics::default()
            }
        }
    }
}
