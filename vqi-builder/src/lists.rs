//! Membership lists
//!
//! Curated venue lists carry no rank: a venue is either on the list or not.
//! Each list is one immutable [`MembershipList`] entry in [`LISTS`].

/// One curated venue list
#[derive(Debug, PartialEq, Eq)]
pub struct MembershipList {
    /// Short identifier used on the command line and in file names
    pub id: &'static str,
    /// Human readable list name
    pub label: &'static str,
}

pub static FT50: MembershipList = MembershipList {
    id: "ft50",
    label: "Financial Times 50 Top Research Journals",
};

pub static UTD24: MembershipList = MembershipList {
    id: "utd24",
    label: "UT Dallas Top 100 Business School Research Rankings",
};

pub static ERA2023: MembershipList = MembershipList {
    id: "era2023",
    label: "Excellence in Research for Australia 2023",
};

/// Beall's list and PredatoryJournals.org, flagged rather than ranked
pub static PREDATORY: MembershipList = MembershipList {
    id: "predatory",
    label: "Predatory venue lists",
};

/// Every known list
pub static LISTS: &[&MembershipList] = &[&FT50, &UTD24, &ERA2023, &PREDATORY];

impl MembershipList {
    /// Look up a list by id (case-insensitive)
    pub fn by_id(id: &str) -> Option<&'static MembershipList> {
        LISTS.iter().copied().find(|list| list.id.eq_ignore_ascii_case(id.trim()))
    }
}
