//! Static cause catalog. Donations name a cause by `id`; nothing checks that
//! the id exists here.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cause {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub image: &'static str,
    pub raised: u32,
    pub goal: u32,
    pub donors: u32,
    pub category: &'static str,
    pub featured: bool,
}

impl Cause {
    /// Share of the goal raised so far, capped at 100.
    pub fn progress_percent(&self) -> u32 {
        if self.goal == 0 {
            return 0;
        }
        ((u64::from(self.raised) * 100 / u64::from(self.goal)) as u32).min(100)
    }
}

const CHILDREN: &str = "/assets/asian-beautiful-boy-charity-cheerful-child-childhood-children-color-cute-dress-education-emotion_t20_b6GeGV.jpg";
const BLANKET: &str = "/assets/image-of-man-child-covered-in-a-blanket.png";
const SUPPORT: &str = "/assets/women-breast-cancer-support-charity-concept.jpg";
const VOLUNTEERS: &str = "/assets/diverse-team-of-volunteers.jpg";

pub const CATEGORIES: [&str; 7] = [
    "Education",
    "Healthcare",
    "Basic Needs",
    "Environment",
    "Social",
    "Emergency",
    "General",
];

pub static CAUSES: [Cause; 12] = [
    Cause {
        id: "education",
        title: "Education for Children",
        description: "Providing quality education to underprivileged children, giving them the tools to build a brighter future through learning and skill development.",
        image: CHILDREN,
        raised: 4050,
        goal: 6750,
        donors: 31,
        category: "Education",
        featured: true,
    },
    Cause {
        id: "food-shelter",
        title: "Food & Shelter",
        description: "Ensuring no family goes hungry by providing nutritious meals and safe shelter to those in need across communities.",
        image: BLANKET,
        raised: 2565,
        goal: 4500,
        donors: 20,
        category: "Basic Needs",
        featured: true,
    },
    Cause {
        id: "healthcare",
        title: "Healthcare Support",
        description: "Bringing essential medical care and health services to communities without access to proper healthcare facilities.",
        image: SUPPORT,
        raised: 5580,
        goal: 9000,
        donors: 44,
        category: "Healthcare",
        featured: true,
    },
    Cause {
        id: "clean-water",
        title: "Clean Water Initiative",
        description: "Building wells and water purification systems to provide clean, safe drinking water to rural communities.",
        image: VOLUNTEERS,
        raised: 3150,
        goal: 5400,
        donors: 25,
        category: "Environment",
        featured: true,
    },
    Cause {
        id: "women-empowerment",
        title: "Women Empowerment",
        description: "Supporting women through education, skill training, and micro-financing to achieve financial independence.",
        image: SUPPORT,
        raised: 1665,
        goal: 3600,
        donors: 14,
        category: "Social",
        featured: false,
    },
    Cause {
        id: "emergency",
        title: "Emergency Relief Fund",
        description: "Rapid response fund for natural disasters and emergencies, providing immediate aid to affected communities.",
        image: VOLUNTEERS,
        raised: 4680,
        goal: 7200,
        donors: 56,
        category: "Emergency",
        featured: true,
    },
    Cause {
        id: "elderly-care",
        title: "Elderly Care Program",
        description: "Providing care, support, and companionship to senior citizens who need assistance with daily living.",
        image: VOLUNTEERS,
        raised: 1980,
        goal: 4050,
        donors: 17,
        category: "Healthcare",
        featured: false,
    },
    Cause {
        id: "youth-sports",
        title: "Youth Sports Development",
        description: "Creating opportunities for underprivileged youth to participate in sports and develop teamwork skills.",
        image: CHILDREN,
        raised: 1350,
        goal: 3150,
        donors: 12,
        category: "Education",
        featured: false,
    },
    Cause {
        id: "mental-health",
        title: "Mental Health Support",
        description: "Providing counseling and mental health resources to communities facing trauma and psychological challenges.",
        image: SUPPORT,
        raised: 2520,
        goal: 4950,
        donors: 24,
        category: "Healthcare",
        featured: false,
    },
    Cause {
        id: "animal-welfare",
        title: "Animal Welfare Initiative",
        description: "Rescuing and rehabilitating abandoned animals, providing shelter, medical care, and finding them loving homes.",
        image: VOLUNTEERS,
        raised: 1755,
        goal: 3600,
        donors: 28,
        category: "Environment",
        featured: false,
    },
    Cause {
        id: "disaster-preparedness",
        title: "Disaster Preparedness Training",
        description: "Training communities in disaster preparedness and providing essential emergency supplies and equipment.",
        image: VOLUNTEERS,
        raised: 2880,
        goal: 5850,
        donors: 18,
        category: "Emergency",
        featured: false,
    },
    Cause {
        id: "general",
        title: "Where Most Needed",
        description: "Let us allocate your donation where it's needed most. We'll ensure maximum impact across all our programs.",
        image: VOLUNTEERS,
        raised: 11250,
        goal: 18000,
        donors: 113,
        category: "General",
        featured: true,
    },
];

pub fn find(id: &str) -> Option<&'static Cause> {
    CAUSES.iter().find(|cause| cause.id == id)
}

/// Causes in `category`, or all of them for `None`/`"All"`.
pub fn in_category(category: Option<&str>) -> Vec<&'static Cause> {
    match category {
        None | Some("All") => CAUSES.iter().collect(),
        Some(category) => CAUSES
            .iter()
            .filter(|cause| cause.category.eq_ignore_ascii_case(category))
            .collect(),
    }
}

pub fn featured() -> impl Iterator<Item = &'static Cause> {
    CAUSES.iter().filter(|cause| cause.featured)
}
