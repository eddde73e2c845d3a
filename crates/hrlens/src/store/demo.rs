use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::{Date, Duration, Month, macros::date};

use super::schema::HrRecord;

const DEPARTMENTS: &[&str] = &[
    "IT",
    "HR",
    "Finance",
    "Marketing",
    "Sales",
    "Operations",
    "Customer Support",
    "R&D",
];
const LOCATIONS: &[&str] = &[
    "New York",
    "San Francisco",
    "Chicago",
    "Austin",
    "Seattle",
    "Boston",
    "Atlanta",
    "Denver",
];
const BANDS: &[&str] = &[
    "Entry", "Junior", "Mid", "Senior", "Lead", "Manager", "Director", "VP",
];
const PROCESSES: &[&str] = &[
    "Development",
    "Testing",
    "Design",
    "Analysis",
    "Support",
    "Management",
    "Administration",
];
const REASONS: &[&str] = &[
    "Better opportunity",
    "Relocation",
    "Personal reasons",
    "Work environment",
    "Compensation",
    "Career growth",
    "Health issues",
    "Family reasons",
];
const SEPARATION_TYPES: &[&str] = &["Voluntary", "Involuntary"];
const MALE_FIRST_NAMES: &[&str] = &[
    "James", "John", "Robert", "Michael", "William", "David", "Richard", "Joseph", "Thomas",
    "Charles",
];
const FEMALE_FIRST_NAMES: &[&str] = &[
    "Mary",
    "Patricia",
    "Jennifer",
    "Linda",
    "Elizabeth",
    "Barbara",
    "Susan",
    "Jessica",
    "Sarah",
    "Karen",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Jones", "Brown", "Davis", "Miller", "Wilson", "Moore",
    "Taylor",
];
const MANAGERS: &[&str] = &["Manager1", "Manager2", "Manager3", "Manager4", "Manager5"];
const FUNCTIONAL_HEADS: &[&str] = &["Head1", "Head2", "Head3"];
const NON_VOICE_DEPARTMENTS: &[&str] = &["IT", "Finance", "R&D"];

const ATTRITION_PROBABILITY: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoConfig {
    pub employees: usize,
    pub seed: u64,
    pub as_of: Date,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            employees: 1000,
            seed: 42,
            as_of: date!(2024 - 12 - 31),
        }
    }
}

#[derive(Debug, Clone)]
struct DemoEmployee {
    profile: HrRecord,
    joined: Date,
    resigned: Option<Date>,
}

/// Generates one row per employee per month across the `as_of` year and the year before it.
/// Output depends only on the config, so the same seed always yields the same dataset.
pub fn generate_demo_records(config: DemoConfig) -> Result<Vec<HrRecord>> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let employees = (1..=config.employees)
        .map(|index| generate_employee(&mut rng, index, config.as_of))
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    for year in [config.as_of.year() - 1, config.as_of.year()] {
        for month_number in 1..=12u8 {
            let month = Month::try_from(month_number)
                .with_context(|| format!("invalid month number {month_number}"))?;
            let month_start = Date::from_calendar_date(year, month, 1)
                .with_context(|| format!("invalid month start {year}-{month_number:02}"))?;
            if month_start > config.as_of {
                continue;
            }

            for employee in &employees {
                if month_start < employee.joined {
                    continue;
                }
                if employee
                    .resigned
                    .is_some_and(|resigned| month_start > resigned)
                {
                    continue;
                }

                records.push(HrRecord {
                    month: month.to_string(),
                    date: month_start.to_string(),
                    month_year: format!("{month} {year}"),
                    year: i64::from(year),
                    count: 1,
                    ..employee.profile.clone()
                });
            }
        }
    }

    Ok(records)
}

fn generate_employee(rng: &mut StdRng, index: usize, as_of: Date) -> DemoEmployee {
    let is_male = rng.gen_bool(0.5);
    let first_name = if is_male {
        pick(rng, MALE_FIRST_NAMES)
    } else {
        pick(rng, FEMALE_FIRST_NAMES)
    };
    let last_name = pick(rng, LAST_NAMES);

    let age: i64 = rng.gen_range(25..=55);
    let date_of_birth = as_of.saturating_sub(Duration::days(age * 365));

    let years_employed: i64 = rng.gen_range(0..=10);
    let joined = as_of.saturating_sub(Duration::days(
        years_employed * 365 + rng.gen_range(0..=364),
    ));

    let department = pick(rng, DEPARTMENTS);
    let location = pick(rng, LOCATIONS);
    let band = pick(rng, BANDS);
    let process = pick(rng, PROCESSES);

    let is_inactive = rng.gen_bool(ATTRITION_PROBABILITY);
    let mut resigned = None;
    let mut last_working_day = None;
    let mut reason = None;
    let mut separation_type = None;
    if is_inactive {
        let max_days = (as_of - joined).whole_days();
        let days_after_joining = if max_days < 30 {
            max_days
        } else {
            rng.gen_range(30..=max_days)
        };
        let resignation = joined.saturating_add(Duration::days(days_after_joining));
        let notice_period: i64 = rng.gen_range(14..=30);
        resigned = Some(resignation);
        last_working_day = Some(resignation.saturating_add(Duration::days(notice_period)));
        reason = Some(pick(rng, REASONS));
        separation_type = Some(pick(rng, SEPARATION_TYPES));
    }

    let manager = pick(rng, MANAGERS);
    let functional_head = pick(rng, FUNCTIONAL_HEADS);
    let inactive_flag = i64::from(is_inactive);
    let voice_non_voice = if NON_VOICE_DEPARTMENTS.contains(&department) {
        "Non_Voice"
    } else {
        "Voice"
    };

    let profile = HrRecord {
        emp_id: format!("EMP{index:04}"),
        employee_name: format!("{first_name} {last_name}"),
        date_of_birth: Some(date_of_birth.to_string()),
        age: Some(age),
        gender: Some(if is_male { "Male" } else { "Female" }.to_string()),
        date_of_joining: Some(joined.to_string()),
        band: Some(band.to_string()),
        designation: Some(band.to_string()),
        process: Some(process.to_string()),
        voice_non_voice: Some(voice_non_voice.to_string()),
        account_name: Some("Main Account".to_string()),
        domain: Some("Corporate".to_string()),
        department: Some(department.to_string()),
        manager: Some(manager.to_string()),
        functional_head: Some(functional_head.to_string()),
        location: Some(location.to_string()),
        sub_location: Some("Main Office".to_string()),
        country: Some("USA".to_string()),
        date_of_resignation: resigned.map(|value| value.to_string()),
        last_working_day: last_working_day.map(|value| value.to_string()),
        date_of_intimation_of_attrition: resigned.map(|value| value.to_string()),
        reason: reason.map(str::to_string),
        voluntary_involuntary: separation_type.map(str::to_string),
        nascom_attrition_analysis: separation_type.map(str::to_string),
        new_country: Some("USA".to_string()),
        active_count: 1 - inactive_flag,
        new_hire: i64::from(years_employed < 1),
        opening_hc: 1,
        overall_inactive_count: inactive_flag,
        inactive_count: inactive_flag,
        age_group: Some(age_group(age).to_string()),
        tenure_bucket: Some(tenure_bucket(years_employed).to_string()),
        ..HrRecord::default()
    };

    DemoEmployee {
        profile,
        joined,
        resigned,
    }
}

fn pick(rng: &mut StdRng, values: &[&'static str]) -> &'static str {
    values[rng.gen_range(0..values.len())]
}

#[must_use]
pub fn age_group(age: i64) -> &'static str {
    match age {
        ..=25 => "20-25",
        26..=30 => "26-30",
        31..=35 => "31-35",
        36..=40 => "36-40",
        41..=45 => "41-45",
        46..=50 => "46-50",
        _ => "51+",
    }
}

#[must_use]
pub fn tenure_bucket(years_employed: i64) -> &'static str {
    match years_employed {
        ..=0 => "<1 year",
        1..=2 => "1-2 years",
        3..=5 => "3-5 years",
        6..=10 => "6-10 years",
        _ => "10+ years",
    }
}
