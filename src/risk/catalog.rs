//! Loan product catalog.
//!
//! The built-in education-loan catalog is initialised once per process and is
//! read-only afterwards. Operators can swap in their own catalog through a
//! JSON file (an array of products); recommendation tiers match products by
//! exact name, so an edited catalog may legitimately leave a tier empty.

use std::fs::File;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::LoanProduct;
use crate::error::AppError;

pub const SBI_EDUCATION_LOAN: &str = "SBI Education Loan";
pub const HDFC_EDUCATION_LOAN: &str = "HDFC Education Loan";
pub const AXIS_EDUCATION_LOAN: &str = "Axis Bank Education Loan";
pub const PNB_EDUCATION_LOAN: &str = "PNB Education Loan";
pub const CANARA_EDUCATION_LOAN: &str = "Canara Bank Education Loan";

static BUILTIN: Lazy<LoanCatalog> = Lazy::new(LoanCatalog::education_loans);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanCatalog {
    products: Vec<LoanProduct>,
}

impl LoanCatalog {
    pub fn new(products: Vec<LoanProduct>) -> Self {
        Self { products }
    }

    /// The process-wide default catalog.
    pub fn builtin() -> &'static LoanCatalog {
        &BUILTIN
    }

    pub fn products(&self) -> &[LoanProduct] {
        &self.products
    }

    pub fn find(&self, name: &str) -> Option<&LoanProduct> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Products whose name is in `names`, in catalog order.
    pub fn select(&self, names: &[&str]) -> Vec<LoanProduct> {
        self.products
            .iter()
            .filter(|p| names.contains(&p.name.as_str()))
            .cloned()
            .collect()
    }

    pub fn from_json_str(json: &str) -> Result<Self, AppError> {
        serde_json::from_str(json).map_err(|e| AppError::input(format!("Invalid loan catalog JSON: {e}")))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::input(format!("Failed to open loan catalog '{}': {e}", path.display()))
        })?;
        let catalog: LoanCatalog = serde_json::from_reader(file)
            .map_err(|e| AppError::input(format!("Invalid loan catalog JSON '{}': {e}", path.display())))?;
        info!(path = %path.display(), products = catalog.products.len(), "loaded loan catalog");
        Ok(catalog)
    }

    fn education_loans() -> Self {
        Self::new(vec![
            product(
                SBI_EDUCATION_LOAN,
                70.0,
                750.0,
                2_000_000.0,
                "Offers competitive rates for higher studies in India and abroad.",
                "15 years",
                "7.5%",
            ),
            product(
                HDFC_EDUCATION_LOAN,
                75.0,
                720.0,
                1_800_000.0,
                "Covers tuition fees and other expenses with attractive interest rates.",
                "10-15 years",
                "8.0%",
            ),
            product(
                AXIS_EDUCATION_LOAN,
                65.0,
                700.0,
                1_500_000.0,
                "Quick approval process and broad coverage for educational expenses.",
                "10 years",
                "9.0%",
            ),
            product(
                PNB_EDUCATION_LOAN,
                60.0,
                680.0,
                1_600_000.0,
                "Competitive rates with extensive support for educational financing.",
                "10 years",
                "10.0%",
            ),
            product(
                CANARA_EDUCATION_LOAN,
                70.0,
                700.0,
                1_700_000.0,
                "Provides comprehensive financial support with flexible repayment options.",
                "15 years",
                "7.8%",
            ),
        ])
    }
}

fn product(
    name: &str,
    min_academic_score: f64,
    min_credit_score: f64,
    max_annual_income: f64,
    description: &str,
    tenure: &str,
    interest_rate: &str,
) -> LoanProduct {
    LoanProduct {
        name: name.to_string(),
        min_academic_score,
        min_credit_score,
        max_annual_income,
        description: description.to_string(),
        tenure: tenure.to_string(),
        interest_rate: interest_rate.to_string(),
    }
}
