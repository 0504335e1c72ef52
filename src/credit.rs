//! Credit score tiers and the rate ranges lenders typically quote for them.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Lowest score on the FICO scale.
pub const MIN_SCORE: u16 = 300;
/// Highest score on the FICO scale.
pub const MAX_SCORE: u16 = 850;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreditTier {
    Poor,
    Fair,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoanCategory {
    Mortgage30,
    Mortgage15,
    AutoNew,
    AutoUsed,
    Personal,
    CreditCard,
}

/// Annual rate range, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSuggestion {
    pub min: Decimal,
    pub max: Decimal,
    pub typical: Decimal,
}

const fn rate(min: Decimal, max: Decimal, typical: Decimal) -> RateSuggestion {
    RateSuggestion { min, max, typical }
}

impl CreditTier {
    pub const ALL: [CreditTier; 4] = [CreditTier::Poor, CreditTier::Fair, CreditTier::Good, CreditTier::Excellent];

    /// Tier for a score. Total: anything below 650 is `Poor`, anything at or
    /// above 750 is `Excellent`.
    pub fn classify(score: u16) -> CreditTier {
        match score {
            750.. => CreditTier::Excellent,
            700..=749 => CreditTier::Good,
            650..=699 => CreditTier::Fair,
            _ => CreditTier::Poor,
        }
    }

    /// Inclusive score range of the tier within `[MIN_SCORE, MAX_SCORE]`.
    pub fn score_range(&self) -> (u16, u16) {
        match self {
            CreditTier::Poor => (MIN_SCORE, 649),
            CreditTier::Fair => (650, 699),
            CreditTier::Good => (700, 749),
            CreditTier::Excellent => (750, MAX_SCORE),
        }
    }

    pub fn rate_for(&self, category: LoanCategory) -> RateSuggestion {
        use CreditTier::*;
        use LoanCategory::*;

        match (category, self) {
            (Mortgage30, Excellent) => rate(dec!(5.8), dec!(6.5), dec!(6.15)),
            (Mortgage30, Good) => rate(dec!(6.5), dec!(7.2), dec!(6.85)),
            (Mortgage30, Fair) => rate(dec!(7.2), dec!(8.5), dec!(7.85)),
            (Mortgage30, Poor) => rate(dec!(8.5), dec!(10.5), dec!(9.5)),

            (Mortgage15, Excellent) => rate(dec!(5.3), dec!(6.0), dec!(5.65)),
            (Mortgage15, Good) => rate(dec!(6.0), dec!(6.7), dec!(6.35)),
            (Mortgage15, Fair) => rate(dec!(6.7), dec!(8.0), dec!(7.35)),
            (Mortgage15, Poor) => rate(dec!(8.0), dec!(10.0), dec!(9.0)),

            (AutoNew, Excellent) => rate(dec!(4.5), dec!(5.5), dec!(5.0)),
            (AutoNew, Good) => rate(dec!(5.5), dec!(7.5), dec!(6.5)),
            (AutoNew, Fair) => rate(dec!(7.5), dec!(11), dec!(9.25)),
            (AutoNew, Poor) => rate(dec!(11), dec!(18), dec!(14.5)),

            (AutoUsed, Excellent) => rate(dec!(6.0), dec!(7.0), dec!(6.5)),
            (AutoUsed, Good) => rate(dec!(7.0), dec!(9.0), dec!(8.0)),
            (AutoUsed, Fair) => rate(dec!(9.0), dec!(12.5), dec!(10.75)),
            (AutoUsed, Poor) => rate(dec!(12.5), dec!(19.5), dec!(16.0)),

            (Personal, Excellent) => rate(dec!(7), dec!(10), dec!(8.5)),
            (Personal, Good) => rate(dec!(10), dec!(15), dec!(12.5)),
            (Personal, Fair) => rate(dec!(15), dec!(22), dec!(18.5)),
            (Personal, Poor) => rate(dec!(22), dec!(30), dec!(26)),

            (CreditCard, Excellent) => rate(dec!(14), dec!(18), dec!(16)),
            (CreditCard, Good) => rate(dec!(18), dec!(22), dec!(20)),
            (CreditCard, Fair) => rate(dec!(22), dec!(26), dec!(24)),
            (CreditCard, Poor) => rate(dec!(26), dec!(30), dec!(28)),
        }
    }
}

impl fmt::Display for CreditTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CreditTier::Poor => "Poor",
            CreditTier::Fair => "Fair",
            CreditTier::Good => "Good",
            CreditTier::Excellent => "Excellent",
        };
        f.write_str(label)
    }
}

pub fn classify_credit(score: u16) -> CreditTier {
    CreditTier::classify(score)
}

/// Typical rate range for a borrower with `score` shopping for `category`.
pub fn suggested_rate(score: u16, category: LoanCategory) -> RateSuggestion {
    CreditTier::classify(score).rate_for(category)
}
