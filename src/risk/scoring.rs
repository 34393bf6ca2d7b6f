//! Applicant risk score and tiered loan recommendation.
//!
//! The score is a fixed additive formula; optional terms contribute zero when
//! absent. The score is then mapped through a three-row decision table to a
//! named subset of the catalog. Product eligibility thresholds are not
//! consulted.

use tracing::info;

use crate::domain::{ApplicantProfile, RiskAssessment, RiskTier};
use crate::error::AppError;
use crate::risk::catalog::{
    AXIS_EDUCATION_LOAN, CANARA_EDUCATION_LOAN, HDFC_EDUCATION_LOAN, LoanCatalog, PNB_EDUCATION_LOAN,
    SBI_EDUCATION_LOAN,
};

/// One row of the decision table: scores below `upper` (if any) fall in `tier`.
#[derive(Debug, Clone, Copy)]
pub struct TierRule {
    pub tier: RiskTier,
    pub upper: Option<f64>,
    pub products: &'static [&'static str],
}

/// Checked top to bottom; the first row whose bound exceeds the score wins.
pub static RISK_TIERS: [TierRule; 3] = [
    TierRule {
        tier: RiskTier::Low,
        upper: Some(20.0),
        products: &[SBI_EDUCATION_LOAN, HDFC_EDUCATION_LOAN, CANARA_EDUCATION_LOAN],
    },
    TierRule {
        tier: RiskTier::Moderate,
        upper: Some(40.0),
        products: &[AXIS_EDUCATION_LOAN],
    },
    TierRule {
        tier: RiskTier::High,
        upper: None,
        products: &[PNB_EDUCATION_LOAN],
    },
];

pub fn risk_score(profile: &ApplicantProfile) -> f64 {
    let mut risk = 0.0;
    risk += (100.0 - profile.academic_score) * 0.1;
    risk += (850.0 - profile.credit_score) * 0.05;
    risk += (100.0 - profile.marks_12) * 0.1;
    if let Some(ug) = profile.ug_marks {
        risk += (100.0 - ug) * 0.05;
    }
    if let Some(loan) = profile.prior_loan {
        risk += (loan.amount / 100_000.0) * 0.2;
        risk += f64::from(loan.emi_bounces) * 5.0;
    }
    risk
}

pub fn tier_rule(score: f64) -> &'static TierRule {
    RISK_TIERS
        .iter()
        .find(|rule| rule.upper.is_none_or(|upper| score < upper))
        .unwrap_or(&RISK_TIERS[RISK_TIERS.len() - 1])
}

/// Score a profile and pick the recommended products from `catalog`.
pub fn assess(profile: &ApplicantProfile, catalog: &LoanCatalog) -> RiskAssessment {
    let risk_score = risk_score(profile);
    let rule = tier_rule(risk_score);
    let recommended = catalog.select(rule.products);

    info!(
        risk_score,
        tier = ?rule.tier,
        recommended = recommended.len(),
        "risk assessed"
    );

    RiskAssessment {
        risk_score,
        tier: rule.tier,
        recommended,
    }
}

/// Range checks for applicant input, for the front-end to run before scoring.
pub fn validate_profile(profile: &ApplicantProfile) -> Result<(), AppError> {
    check_range("academic score", profile.academic_score, 0.0, 100.0)?;
    check_range("credit score", profile.credit_score, 300.0, 850.0)?;
    check_range("annual income", profile.annual_income, 0.0, f64::MAX)?;
    check_range("12th marks", profile.marks_12, 0.0, 100.0)?;
    if let Some(ug) = profile.ug_marks {
        check_range("undergraduate marks", ug, 0.0, 100.0)?;
    }
    if let Some(loan) = profile.prior_loan {
        check_range("past loan amount", loan.amount, 0.0, f64::MAX)?;
    }
    Ok(())
}

fn check_range(label: &str, value: f64, min: f64, max: f64) -> Result<(), AppError> {
    if value.is_finite() && value >= min && value <= max {
        return Ok(());
    }
    let bound = if max == f64::MAX {
        format!(">= {min}")
    } else {
        format!("between {min} and {max}")
    };
    Err(AppError::input(format!("Invalid {label}: {value} (must be {bound}).")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LoanProduct, PriorLoan};

    fn base_profile() -> ApplicantProfile {
        ApplicantProfile {
            academic_score: 75.0,
            credit_score: 720.0,
            annual_income: 1_000_000.0,
            marks_12: 80.0,
            ug_marks: None,
            prior_loan: None,
        }
    }

    fn names(products: &[LoanProduct]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn low_risk_profile_gets_three_products() {
        let assessment = assess(&base_profile(), LoanCatalog::builtin());
        assert!((assessment.risk_score - 11.0).abs() < 1e-9);
        assert_eq!(assessment.tier, RiskTier::Low);
        assert_eq!(
            names(&assessment.recommended),
            vec![SBI_EDUCATION_LOAN, HDFC_EDUCATION_LOAN, CANARA_EDUCATION_LOAN]
        );
    }

    #[test]
    fn prior_loan_with_bounces_moves_to_moderate_tier() {
        let profile = ApplicantProfile {
            prior_loan: Some(PriorLoan {
                amount: 50_000.0,
                emi_bounces: 2,
            }),
            ..base_profile()
        };
        let assessment = assess(&profile, LoanCatalog::builtin());
        assert!((assessment.risk_score - 21.1).abs() < 1e-9);
        assert_eq!(assessment.tier, RiskTier::Moderate);
        assert_eq!(names(&assessment.recommended), vec![AXIS_EDUCATION_LOAN]);
    }

    #[test]
    fn undergraduate_term_is_additive() {
        let profile = ApplicantProfile {
            ug_marks: Some(60.0),
            ..base_profile()
        };
        assert!((risk_score(&profile) - 13.0).abs() < 1e-9);
    }

    #[test]
    fn high_risk_profile_gets_pnb() {
        let profile = ApplicantProfile {
            academic_score: 40.0,
            credit_score: 500.0,
            marks_12: 50.0,
            ..base_profile()
        };
        // 6 + 17.5 + 5 = 28.5 -> moderate; add bounces to cross 40.
        assert_eq!(tier_rule(risk_score(&profile)).tier, RiskTier::Moderate);

        let profile = ApplicantProfile {
            prior_loan: Some(PriorLoan {
                amount: 0.0,
                emi_bounces: 3,
            }),
            ..profile
        };
        let assessment = assess(&profile, LoanCatalog::builtin());
        assert_eq!(assessment.tier, RiskTier::High);
        assert_eq!(names(&assessment.recommended), vec![PNB_EDUCATION_LOAN]);
    }

    #[test]
    fn tier_boundaries_are_half_open() {
        assert_eq!(tier_rule(19.999).tier, RiskTier::Low);
        assert_eq!(tier_rule(20.0).tier, RiskTier::Moderate);
        assert_eq!(tier_rule(39.999).tier, RiskTier::Moderate);
        assert_eq!(tier_rule(40.0).tier, RiskTier::High);
    }

    #[test]
    fn missing_catalog_entry_yields_empty_recommendation() {
        let without_axis = LoanCatalog::new(
            LoanCatalog::builtin()
                .products()
                .iter()
                .filter(|p| p.name != AXIS_EDUCATION_LOAN)
                .cloned()
                .collect(),
        );
        let profile = ApplicantProfile {
            prior_loan: Some(PriorLoan {
                amount: 50_000.0,
                emi_bounces: 2,
            }),
            ..base_profile()
        };
        let assessment = assess(&profile, &without_axis);
        assert_eq!(assessment.tier, RiskTier::Moderate);
        assert!(assessment.recommended.is_empty());
    }

    #[test]
    fn eligibility_thresholds_do_not_gate_recommendations() {
        // Credit score 700 is below SBI's listed minimum of 750.
        let profile = ApplicantProfile {
            academic_score: 95.0,
            credit_score: 700.0,
            marks_12: 95.0,
            ..base_profile()
        };
        let assessment = assess(&profile, LoanCatalog::builtin());
        assert_eq!(assessment.tier, RiskTier::Low);
        assert!(names(&assessment.recommended).contains(&SBI_EDUCATION_LOAN));
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        assert!(validate_profile(&base_profile()).is_ok());
        let bad = ApplicantProfile {
            credit_score: 900.0,
            ..base_profile()
        };
        assert_eq!(validate_profile(&bad).unwrap_err().exit_code(), crate::error::EXIT_INPUT);
    }
}
