//! The fixed roster of physicians patients can book with.

use serde::Serialize;

/// A physician on the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Doctor {
    pub name: &'static str,
    /// Portrait asset path
    pub image: &'static str,
}

pub static DOCTORS: [Doctor; 9] = [
    Doctor { name: "John Green", image: "/assets/images/dr-green.png" },
    Doctor { name: "Leila Cameron", image: "/assets/images/dr-cameron.png" },
    Doctor { name: "David Livingston", image: "/assets/images/dr-livingston.png" },
    Doctor { name: "Evan Peter", image: "/assets/images/dr-peter.png" },
    Doctor { name: "Jane Powell", image: "/assets/images/dr-powell.png" },
    Doctor { name: "Alex Ramirez", image: "/assets/images/dr-remirez.png" },
    Doctor { name: "Jasmine Lee", image: "/assets/images/dr-lee.png" },
    Doctor { name: "Alyana Cruz", image: "/assets/images/dr-cruz.png" },
    Doctor { name: "Hardik Sharma", image: "/assets/images/dr-sharma.png" },
];

/// Names of all physicians, in roster order.
#[must_use]
pub fn doctor_names() -> Vec<&'static str> {
    DOCTORS.iter().map(|d| d.name).collect()
}

/// Look up a physician by exact name.
#[must_use]
pub fn find_doctor(name: &str) -> Option<&'static Doctor> {
    DOCTORS.iter().find(|d| d.name == name)
}
