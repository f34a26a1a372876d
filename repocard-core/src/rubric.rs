//! The fixed scoring rubric.

/// One scored criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RubricEntry {
    /// Stable numeric identifier.
    pub id: u32,
    /// Display title.
    pub title: &'static str,
    /// Guidance for the scorer.
    pub how_to_score: &'static str,
    /// Ordered qualitative choices with their scores.
    pub choices: &'static [(&'static str, u8)],
}

/// A named group of rubric entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RubricArea {
    /// Stable numeric identifier.
    pub id: u32,
    /// Display title.
    pub title: &'static str,
    /// Entries in display order.
    pub entries: &'static [RubricEntry],
}

/// The complete rubric: 4 areas, 10 entries.
pub const RUBRIC: &[RubricArea] = &[
    RubricArea {
        id: 1001,
        title: "Code Quality",
        entries: &[
            RubricEntry {
                id: 1,
                title: "Documentation",
                how_to_score: "Technical documentation should be present and accessible.",
                choices: &[
                    ("Well documented with comprehensive README and docs", 100),
                    ("Basic documentation present", 80),
                    ("Minimal documentation", 40),
                    ("No documentation", 0),
                ],
            },
            RubricEntry {
                id: 2,
                title: "Static Code Analysis",
                how_to_score: "Code should be analyzed for quality and security issues.",
                choices: &[
                    ("Comprehensive static analysis with automated checks", 100),
                    ("Basic static analysis implemented", 70),
                    ("Manual code reviews only", 40),
                    ("No static analysis", 0),
                ],
            },
            RubricEntry {
                id: 3,
                title: "Code Structure",
                how_to_score: "Code should follow best practices and be well organized.",
                choices: &[
                    ("Excellent structure with design patterns", 100),
                    ("Good structure and organization", 80),
                    ("Basic structure present", 60),
                    ("Poor code organization", 20),
                ],
            },
        ],
    },
    RubricArea {
        id: 1002,
        title: "Operations",
        entries: &[
            RubricEntry {
                id: 4,
                title: "CI/CD Pipeline",
                how_to_score: "Automated build and deployment pipeline should be in place.",
                choices: &[
                    ("Full CI/CD with automated testing and deployment", 100),
                    ("CI/CD pipeline configured", 90),
                    ("Basic CI only", 50),
                    ("Manual deployment", 0),
                ],
            },
            RubricEntry {
                id: 5,
                title: "Dependency Management",
                how_to_score: "Dependencies should be properly managed and up to date.",
                choices: &[
                    ("Automated dependency management with security scanning", 100),
                    ("Regular dependency updates", 80),
                    ("Basic dependency files present", 60),
                    ("No dependency management", 0),
                ],
            },
            RubricEntry {
                id: 6,
                title: "Configuration Management",
                how_to_score: "Application configuration should be externalized and secure.",
                choices: &[
                    ("Environment-based config with secrets management", 100),
                    ("Basic environment configuration", 70),
                    ("Hardcoded configuration", 30),
                    ("No configuration management", 0),
                ],
            },
        ],
    },
    RubricArea {
        id: 1003,
        title: "Security",
        entries: &[
            RubricEntry {
                id: 7,
                title: "Security Practices",
                how_to_score: "Security best practices should be implemented.",
                choices: &[
                    ("Comprehensive security measures implemented", 100),
                    ("Basic security practices in place", 70),
                    ("Minimal security considerations", 40),
                    ("No security measures", 0),
                ],
            },
            RubricEntry {
                id: 8,
                title: "Secrets Management",
                how_to_score: "Secrets and credentials should be properly managed.",
                choices: &[
                    ("Secure secrets management with encryption", 100),
                    ("Environment variables for secrets", 80),
                    ("Some hardcoded secrets", 30),
                    ("Exposed secrets in code", 0),
                ],
            },
        ],
    },
    RubricArea {
        id: 1004,
        title: "Testing",
        entries: &[
            RubricEntry {
                id: 9,
                title: "Test Coverage",
                how_to_score: "Automated tests should cover critical functionality.",
                choices: &[
                    ("Comprehensive test suite with high coverage", 100),
                    ("Good test coverage", 80),
                    ("Basic tests present", 50),
                    ("No automated tests", 0),
                ],
            },
            RubricEntry {
                id: 10,
                title: "Test Quality",
                how_to_score: "Tests should be well-written and maintainable.",
                choices: &[
                    ("Excellent test quality and organization", 100),
                    ("Good test structure", 80),
                    ("Basic test implementation", 60),
                    ("Poor test quality", 20),
                ],
            },
        ],
    },
];

/// Iterate every entry across all areas in display order.
pub fn entries() -> impl Iterator<Item = &'static RubricEntry> {
    RUBRIC.iter().flat_map(|area| area.entries.iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rubric_has_ten_entries_in_four_areas() {
        assert_eq!(RUBRIC.len(), 4);
        let ids: Vec<u32> = entries().map(|entry| entry.id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn every_entry_offers_descending_choices() {
        for entry in entries() {
            assert!(!entry.choices.is_empty(), "entry {} has no choices", entry.id);
            let scores: Vec<u8> = entry.choices.iter().map(|(_, score)| *score).collect();
            let mut sorted = scores.clone();
            sorted.sort_unstable_by(|a, b| b.cmp(a));
            assert_eq!(scores, sorted, "entry {} choices out of order", entry.id);
        }
    }
}
