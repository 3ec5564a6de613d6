use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::schema::ModelSchema;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInformation {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    pub major: String,
    pub gpa: String,
    pub start_year: String,
    pub end_year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    /// Job title.
    pub role: String,
    /// Organization.
    pub company: String,
    pub city: String,
    pub country: String,
    pub start_year: String,
    pub end_year: String,
    pub description: String,
}

impl ExperienceEntry {
    /// Human-readable duration, e.g. "2019 – 2022" or "2021 – present".
    pub fn duration(&self) -> String {
        match (self.start_year.trim(), self.end_year.trim()) {
            ("", "") => String::new(),
            (start, "") => format!("{start} – present"),
            ("", end) => end.to_string(),
            (start, end) => format!("{start} – {end}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub start_year: String,
    pub end_year: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificationEntry {
    pub name: String,
    pub issuer: String,
    pub date: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwardEntry {
    pub title: String,
    pub issuer: String,
    pub year: String,
}

/// Structured candidate data extracted from resume text.
///
/// Every field is always present after coercion; the model may only leave
/// them empty. List order is the order the model reported, which follows the
/// resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedProfile {
    pub personal_information: PersonalInformation,
    pub summary: String,
    pub skills: Vec<String>,
    pub work_experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub projects: Vec<ProjectEntry>,
    pub certifications: Vec<CertificationEntry>,
    pub awards: Vec<AwardEntry>,
    /// The model's judgement that the document is a resume at all.
    pub is_resume: bool,
}

impl ModelSchema for ExtractedProfile {
    const NAME: &'static str = "ExtractedProfile";

    fn shape() -> Value {
        json!({
            "personal_information": {
                "name": "",
                "email": "",
                "phone": "",
                "city": "",
                "country": ""
            },
            "summary": "",
            "education": [{
                "school": "",
                "degree": "",
                "major": "",
                "gpa": "",
                "start_year": "",
                "end_year": ""
            }],
            "work_experience": [{
                "company": "",
                "role": "",
                "city": "",
                "country": "",
                "start_year": "",
                "end_year": "",
                "description": ""
            }],
            "projects": [{
                "name": "",
                "start_year": "",
                "end_year": "",
                "description": ""
            }],
            "certifications": [{
                "name": "",
                "issuer": "",
                "date": "",
                "id": ""
            }],
            "awards": [{
                "title": "",
                "issuer": "",
                "year": ""
            }],
            "skills": [""],
            "is_resume": true
        })
    }
}

impl ExtractedProfile {
    /// Short profile digest prepended to match and question prompts.
    pub fn candidate_summary(&self) -> String {
        let name = match self.personal_information.name.trim() {
            "" => "Unknown",
            name => name,
        };
        let skills = if self.skills.is_empty() {
            "Not specified".to_string()
        } else {
            self.skills.join(", ")
        };
        let mut summary = format!(
            "Candidate: {name}\n\
             Skills: {skills}\n\
             Experience: {} positions\n\
             Education: {} qualifications\n\
             Projects: {} projects\n\
             Certifications: {} certifications",
            self.work_experience.len(),
            self.education.len(),
            self.projects.len(),
            self.certifications.len(),
        );
        if let Some(latest) = self.work_experience.first() {
            summary.push_str(&format!(
                "\nMost recent role: {} at {}",
                latest.role, latest.company
            ));
            let duration = latest.duration();
            if !duration.is_empty() {
                summary.push_str(&format!(" ({duration})"));
            }
        }
        summary
    }
}
