//! Sample doctor directory loaded into an empty database at startup.

use chrono::{Duration, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde_json::json;
use tracing::info;

use crate::error::Result;
use crate::sqlite::Database;

struct SampleDoctor {
    id: &'static str,
    name: &'static str,
    specialization: &'static str,
    image: &'static str,
    rating: f64,
    experience: i64,
    consultation_fee: i64,
    location: &'static str,
    about: &'static str,
    education: &'static [&'static str],
    languages: &'static [&'static str],
    /// (days after the base date, offered times)
    calendar: &'static [(i64, &'static [&'static str])],
}

const SAMPLE_DOCTORS: &[SampleDoctor] = &[
    SampleDoctor {
        id: "1",
        name: "Dr. Kusuma",
        specialization: "Cardiologist",
        image: "https://images.pexels.com/photos/5327580/pexels-photo-5327580.jpeg?auto=compress&cs=tinysrgb&w=400",
        rating: 4.9,
        experience: 12,
        consultation_fee: 1200,
        location: "Downtown Medical Center",
        about: "Dr. Kusuma is a board-certified cardiologist with over 12 years of experience in treating cardiovascular diseases and preventive cardiology.",
        education: &[
            "MD - Harvard Medical School",
            "Residency - Johns Hopkins Hospital",
            "Fellowship - Mayo Clinic",
        ],
        languages: &["English", "Hindi"],
        calendar: &[
            (0, &["09:00 AM", "10:30 AM", "02:00 PM", "03:30 PM"]),
            (1, &["10:00 AM", "11:30 AM", "01:00 PM", "04:00 PM"]),
        ],
    },
    SampleDoctor {
        id: "2",
        name: "Dr. Rajesh Kumar",
        specialization: "Dermatologist",
        image: "https://images.pexels.com/photos/5452293/pexels-photo-5452293.jpeg?auto=compress&cs=tinysrgb&w=400",
        rating: 4.8,
        experience: 8,
        consultation_fee: 950,
        location: "Skin Care Clinic",
        about: "Dr. Rajesh Kumar is a renowned dermatologist specializing in medical and cosmetic dermatology with expertise in skin cancer detection.",
        education: &[
            "MD - AIIMS Delhi",
            "Residency - PGI Chandigarh",
            "Fellowship - Manipal Hospital",
        ],
        languages: &["English", "Hindi", "Tamil"],
        calendar: &[(0, &["08:00 AM", "11:00 AM", "01:30 PM", "04:00 PM"])],
    },
    SampleDoctor {
        id: "3",
        name: "Dr. Priya Sharma",
        specialization: "Pediatrician",
        image: "https://images.pexels.com/photos/5327920/pexels-photo-5327920.jpeg?auto=compress&cs=tinysrgb&w=400",
        rating: 4.7,
        experience: 10,
        consultation_fee: 1000,
        location: "Child Care Hospital, Mumbai",
        about: "Dr. Priya Sharma specializes in pediatric care with a focus on neonatal health and childhood development disorders.",
        education: &[
            "MBBS - KEM Hospital, Mumbai",
            "DCH - Seth GS Medical College",
            "Fellowship - Apollo Hospitals",
        ],
        languages: &["English", "Hindi", "Marathi"],
        calendar: &[
            (0, &["09:00 AM", "11:00 AM", "02:00 PM"]),
            (1, &["10:00 AM", "12:00 PM", "03:00 PM"]),
        ],
    },
    SampleDoctor {
        id: "4",
        name: "Dr. Ananya Gupta",
        specialization: "Neurologist",
        image: "https://images.pexels.com/photos/5327585/pexels-photo-5327585.jpeg?auto=compress&cs=tinysrgb&w=400",
        rating: 4.8,
        experience: 15,
        consultation_fee: 1500,
        location: "Brain & Spine Clinic, Delhi",
        about: "Dr. Ananya Gupta is an expert in treating neurological disorders, including epilepsy, stroke, and Parkinson's disease, with a focus on patient-centric care.",
        education: &[
            "DM Neurology - AIIMS Delhi",
            "Residency - NIMHANS Bangalore",
            "Fellowship - Cleveland Clinic",
        ],
        languages: &["English", "Hindi", "Bengali"],
        calendar: &[
            (0, &["10:00 AM", "12:30 PM", "03:00 PM", "04:30 PM"]),
            (1, &["09:30 AM", "11:00 AM", "02:00 PM"]),
        ],
    },
    SampleDoctor {
        id: "5",
        name: "Dr. Vikram Singh",
        specialization: "Orthopedic Surgeon",
        image: "https://images.pexels.com/photos/5327578/pexels-photo-5327578.jpeg?auto=compress&cs=tinysrgb&w=400",
        rating: 4.9,
        experience: 11,
        consultation_fee: 1300,
        location: "Bone & Joint Hospital, Chennai",
        about: "Dr. Vikram Singh specializes in joint replacement surgeries and sports injuries, with extensive experience in minimally invasive procedures.",
        education: &[
            "MS Orthopedics - Christian Medical College, Vellore",
            "Residency - Apollo Hospitals",
            "Fellowship - Singapore General Hospital",
        ],
        languages: &["English", "Hindi", "Punjabi"],
        calendar: &[
            (0, &["08:30 AM", "10:00 AM", "01:00 PM", "03:30 PM"]),
            (2, &["09:00 AM", "11:30 AM", "02:30 PM"]),
        ],
    },
    SampleDoctor {
        id: "6",
        name: "Dr. Meera Patel",
        specialization: "Gynecologist",
        image: "https://images.pexels.com/photos/5327921/pexels-photo-5327921.jpeg?auto=compress&cs=tinysrgb&w=400",
        rating: 4.7,
        experience: 9,
        consultation_fee: 1100,
        location: "Women's Health Center, Bangalore",
        about: "Dr. Meera Patel is dedicated to women's health, with expertise in high-risk pregnancies, infertility treatments, and laparoscopic surgeries.",
        education: &[
            "MD Obstetrics & Gynecology - Manipal Hospital",
            "Residency - St. John's Medical College",
            "Fellowship - Fernandez Hospital",
        ],
        languages: &["English", "Hindi", "Kannada"],
        calendar: &[
            (0, &["09:30 AM", "11:30 AM", "02:30 PM", "04:00 PM"]),
            (1, &["10:30 AM", "01:00 PM", "03:30 PM"]),
        ],
    },
];

/// Number of doctors inserted by [`seed_sample_doctors`].
pub const SAMPLE_DOCTOR_COUNT: usize = SAMPLE_DOCTORS.len();

/// Insert the sample doctors if the directory is empty. Returns the number
/// of rows inserted (0 when the table already had doctors).
pub async fn seed_sample_doctors(db: &Database, base_date: NaiveDate) -> Result<usize> {
    let inserted = db
        .transaction(move |tx| {
            let existing: i64 = tx.query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))?;
            if existing > 0 {
                return Ok(0);
            }
            insert_sample_doctors(tx, base_date)
        })
        .await?;

    if inserted > 0 {
        info!("Seeded {} sample doctors starting {}", inserted, base_date);
    }
    Ok(inserted)
}

fn insert_sample_doctors(conn: &Connection, base_date: NaiveDate) -> Result<usize> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let mut stmt = conn.prepare(
        r"
        INSERT INTO doctors (id, name, specialization, image, rating, experience,
                             availability_status, consultation_fee, location, about,
                             education, languages, available_slots, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'available', ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
        ",
    )?;

    for doctor in SAMPLE_DOCTORS {
        let calendar: Vec<_> = doctor
            .calendar
            .iter()
            .map(|(offset, times)| {
                json!({
                    "date": (base_date + Duration::days(*offset)).format("%Y-%m-%d").to_string(),
                    "slots": times,
                })
            })
            .collect();

        stmt.execute(params![
            doctor.id,
            doctor.name,
            doctor.specialization,
            doctor.image,
            doctor.rating,
            doctor.experience,
            doctor.consultation_fee,
            doctor.location,
            doctor.about,
            serde_json::to_string(doctor.education)?,
            serde_json::to_string(doctor.languages)?,
            serde_json::to_string(&calendar)?,
            now,
        ])?;
    }

    Ok(SAMPLE_DOCTORS.len())
}
