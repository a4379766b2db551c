/// Fixture schemes and profiles shared by the unit tests.
use std::sync::Arc;

use sahayak_common::api::{NumberOrText, Occupation, UserProfile};
use sahayak_common::embedding::HashingEmbedder;

use crate::catalog::{parse_schemes, SchemeCatalog};
use crate::model::{IncomeCeiling, NumericBound, SchemeEntry, SchemeFilters};

pub const SCHEMES_CSV: &str = "\
Scheme Name,Category,Description,Apply Link,Gender,Caste,Income Max (Annual),Occupation,Disability Required,Marital status,Religion,state,Education Required,Minority status,For Orphans,Min Age,Max Age
Post Matric Scholarship for SC Students,Education,Financial assistance to scheduled caste students studying at post matriculation level,https://scholarships.gov.in,Any,SC,₹2.5 lakh,Student,No,Any,Any,Central,Class 10 pass,No,No,15,30
Ladli Scheme Delhi,Women and Child,Financial support for the girl child in Delhi,https://wcddel.in,Female,Any,1 lakh,Student,,Any,Any,Delhi,,,No,0,18
PM Kisan Samman Nidhi,Agriculture,Income support of 6000 rupees per year to farmer families,https://pmkisan.gov.in,Any,Any,Any,Farmer,No,Any,Any,Central,,No,No,18,
Pragati Scholarship for Girls,Education,Scholarship for girl students pursuing technical education,https://aicte-india.org,Female,Any,8 lakh,Student,No,Any,Any,Central,Diploma or degree,No,No,17,25
Mahatma Jyotiba Phule Jan Arogya Yojana,Health,Cashless health insurance for families in Maharashtra,https://jeevandayee.gov.in,Any,Any,1 lakh,Any,No,Any,Any,Maharashtra,,No,No,,
Indira Gandhi National Old Age Pension,Social Security,Monthly pension for senior citizens below the poverty line,https://nsap.nic.in,Any,Any,Any,Any,No,Any,Any,Central,,No,No,60,
Stand-Up India,Business,Bank loans for SC ST and women entrepreneurs setting up new enterprises,https://standupmitra.in,Female,SC,Any,Entrepreneur,No,Any,Any,Central,,No,No,18,
National Means cum Merit Scholarship,Education,Scholarship for meritorious students to reduce dropouts at class eight,https://scholarships.gov.in,Any,Any,,Student,No,Any,Any,Any,Class 8 pass,No,No,18+,
Widow Pension Scheme Delhi,Social Security,Pension for widows in distress in Delhi,https://wcddel.in,Female,Any,1.2 lakh,Any,No,Widow,Any,Delhi,,No,No,18,
";

/// Names of the fixture schemes the student profile is eligible for.
pub const STUDENT_ELIGIBLE: [&str; 3] = [
    "Post Matric Scholarship for SC Students",
    "Pragati Scholarship for Girls",
    "National Means cum Merit Scholarship",
];

pub fn student_profile() -> UserProfile {
    UserProfile {
        gender: Some("female".into()),
        caste: Some("sc".into()),
        income: Some(NumberOrText::Number(150_000.0)),
        occupation: Some(Occupation::One("student".into())),
        state: Some("delhi".into()),
        age: Some(NumberOrText::Number(19.0)),
        ..UserProfile::default()
    }
}

/// A scheme with no restrictions at all.
pub fn open_scheme() -> SchemeEntry {
    SchemeEntry {
        name: "Open Scheme".into(),
        category: "General".into(),
        description: "Available to everyone".into(),
        apply_link: "https://example.gov.in".into(),
        filters: SchemeFilters {
            gender: "any".into(),
            caste: "any".into(),
            income_max: "any".into(),
            occupation: "any".into(),
            disability: "any".into(),
            marital_status: "any".into(),
            religion: "any".into(),
            state: "any".into(),
            education: "any".into(),
            minority: "any".into(),
            for_orphans: "any".into(),
        },
        income_ceiling: IncomeCeiling::Unconstrained,
        min_age: NumericBound::Unconstrained,
        max_age: NumericBound::Unconstrained,
    }
}

pub async fn test_catalog() -> Arc<SchemeCatalog> {
    let schemes = parse_schemes(SCHEMES_CSV).expect("fixture schemes parse");
    Arc::new(
        SchemeCatalog::from_entries(schemes, Arc::new(HashingEmbedder::default()))
            .await
            .expect("fixture schemes index"),
    )
}
