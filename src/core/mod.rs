// Core algorithm exports
pub mod extract;
pub mod matcher;
pub mod scoring;

pub use extract::{parse_age_years, us_sites, us_states};
pub use matcher::{MatchOutcome, Matcher};
pub use scoring::{build_match_reason, calculate_match_score};
