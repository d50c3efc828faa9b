use serde::{Deserialize, Serialize};

use crate::domain::Page;

pub const GENERAL_PASS_TYPE: &str = "General";
pub const GENERAL_CATEGORY: &str = "general";

/// One row of the pass-type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassTypeRule {
    pub id: &'static str,
    pub display_name: &'static str,
    pub family: &'static str,
    pub keywords: &'static [&'static str],
}

/// Declaration order is significant: on equal scores the earlier row wins.
pub const PASS_TYPE_RULES: &[PassTypeRule] = &[
    PassTypeRule {
        id: "employment_pass",
        display_name: "Employment Pass",
        family: "employment_passes",
        keywords: &["employment pass", "ep", "employmentpass"],
    },
    PassTypeRule {
        id: "pep",
        display_name: "Personalised Employment Pass",
        family: "employment_passes",
        keywords: &[
            "personalised employment pass",
            "pep",
            "personalized employment pass",
        ],
    },
    PassTypeRule {
        id: "entrepass",
        display_name: "EntrePass",
        family: "employment_passes",
        keywords: &["entrepass", "entrepreneur pass"],
    },
    PassTypeRule {
        id: "s_pass",
        display_name: "S Pass",
        family: "work_permits",
        keywords: &["s pass", "s-pass", "spass"],
    },
    PassTypeRule {
        id: "work_permit",
        display_name: "Work Permit",
        family: "work_permits",
        keywords: &["work permit", "workpermit"],
    },
    PassTypeRule {
        id: "fdw",
        display_name: "Foreign Domestic Worker",
        family: "sector_specific",
        keywords: &[
            "foreign domestic worker",
            "fdw",
            "domestic worker",
            "domestic helper",
        ],
    },
    PassTypeRule {
        id: "performing_artiste",
        display_name: "Performing Artiste",
        family: "sector_specific",
        keywords: &["performing artiste", "performing artist"],
    },
    PassTypeRule {
        id: "confinement_nanny",
        display_name: "Confinement Nanny",
        family: "sector_specific",
        keywords: &["confinement nanny", "confinement"],
    },
    PassTypeRule {
        id: "training_pass",
        display_name: "Training Employment Pass",
        family: "other_passes",
        keywords: &["training employment pass", "training pass"],
    },
    PassTypeRule {
        id: "work_holiday",
        display_name: "Work Holiday Pass",
        family: "other_passes",
        keywords: &["work holiday pass", "work holiday"],
    },
    PassTypeRule {
        id: "dependant",
        display_name: "Dependant's Pass",
        family: "other_passes",
        keywords: &["dependant", "dependent", "dependant pass"],
    },
    PassTypeRule {
        id: "ltvp",
        display_name: "Long-Term Visit Pass",
        family: "other_passes",
        keywords: &["ltvp", "long-term visit pass", "long term visit pass"],
    },
];

/// Content-type buckets used when no pass type scores. Checked in order with
/// plain substring matching so stems like "renew" cover "renewal".
const CONTENT_BUCKETS: &[(&str, &[&str])] = &[
    ("eligibility_requirements", &["eligibility", "requirements"]),
    ("application_process", &["application", "apply"]),
    ("renewal", &["renew"]),
    ("fees", &["fee", "cost", "price"]),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Categorization {
    pub category: String,
    pub pass_type: String,
}

/// Assigns `(category, pass_type)` to a page from URL, body and title.
pub fn categorize(page: &Page) -> Categorization {
    let haystack = format!("{} {} {}", page.url, page.raw_text, page.title).to_lowercase();
    categorize_text(&haystack)
}

/// Same as [`categorize`] over an already lowercased haystack.
///
/// `pass_type` is the display name of the same winning rule that sets
/// `category`, scored over URL, body and title alike. It is not a separate
/// first-match lookup over URL and title only, so the two labels never
/// disagree.
pub fn categorize_text(haystack: &str) -> Categorization {
    if let Some(rule) = best_pass_type(haystack) {
        return Categorization {
            category: rule.family.to_string(),
            pass_type: rule.display_name.to_string(),
        };
    }

    let category = CONTENT_BUCKETS
        .iter()
        .find(|(_, terms)| terms.iter().any(|t| haystack.contains(t)))
        .map(|(name, _)| *name)
        .unwrap_or(GENERAL_CATEGORY);

    Categorization {
        category: category.to_string(),
        pass_type: GENERAL_PASS_TYPE.to_string(),
    }
}

/// Highest scoring rule, or `None` when nothing matched.
pub fn best_pass_type(haystack: &str) -> Option<&'static PassTypeRule> {
    let mut best: Option<(&'static PassTypeRule, usize)> = None;
    for rule in PASS_TYPE_RULES {
        let score = score_rule(rule, haystack);
        if score == 0 {
            continue;
        }
        // Strictly greater: ties keep the earlier declared rule.
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((rule, score));
        }
    }
    best.map(|(rule, _)| rule)
}

pub fn score_rule(rule: &PassTypeRule, haystack: &str) -> usize {
    rule.keywords
        .iter()
        .map(|kw| count_word_occurrences(haystack, kw))
        .sum()
}

/// Counts occurrences of `needle` that start on a word boundary and end on one,
/// optionally after a plural suffix ("s" or "es"). Short keywords such as
/// "ep" do not fire inside "step" or "deep", while "work permits" and
/// "Employment Passes" still count.
pub fn count_word_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    let bytes = haystack.as_bytes();
    haystack
        .match_indices(needle)
        .filter(|(pos, m)| {
            let before_ok = *pos == 0 || !bytes[pos - 1].is_ascii_alphanumeric();
            before_ok && ends_word(bytes, pos + m.len())
        })
        .count()
}

fn ends_word(bytes: &[u8], end: usize) -> bool {
    let boundary = |i: usize| i >= bytes.len() || !bytes[i].is_ascii_alphanumeric();
    if boundary(end) {
        return true;
    }
    if bytes.get(end..end + 2) == Some(b"es".as_slice()) && boundary(end + 2) {
        return true;
    }
    bytes[end] == b's' && boundary(end + 1)
}

/// Display name for a pass-type id, if known.
pub fn display_name(id: &str) -> Option<&'static str> {
    PASS_TYPE_RULES
        .iter()
        .find(|r| r.id == id)
        .map(|r| r.display_name)
}
