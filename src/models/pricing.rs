//! Job pricing, account credit and submission limits.
//!
//! A quote bills at least `min_billing_hours`, adds filament, then applies
//! the material multiplier, the role discount and the account's personal
//! discount, in that order. All arithmetic is integral and rounded to the
//! cent once, at the end.

use crate::core::error::PricingError;
use crate::models::account::Account;
use crate::models::job::{MaterialType, PrintJob};
use crate::models::quantity::{Factor, Grams, Money};
use crate::models::role::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PricingConfig {
    pub cost_per_hour: Money,
    pub cost_per_gram: Money,
    /// Hours, in hundredths like every other fixed-point field
    #[serde(default = "default_min_billing_hours")]
    pub min_billing_hours: Factor,
    #[serde(default)]
    pub multipliers: MaterialMultipliers,
    #[serde(default)]
    pub discounts: RoleDiscounts,
}

/// Price multipliers per material. Materials without an entry bill at 1.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MaterialMultipliers {
    #[serde(default = "default_pla_multiplier")]
    pub pla: Factor,
    #[serde(default = "default_abs_multiplier")]
    pub abs: Factor,
    #[serde(default = "default_petg_multiplier")]
    pub petg: Factor,
    #[serde(default = "default_resin_multiplier")]
    pub resin: Factor,
}

/// Fractional discounts per role (`0.20` takes a fifth off).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleDiscounts {
    #[serde(default = "default_student_discount")]
    pub student: Factor,
    #[serde(default = "default_teacher_discount")]
    pub teacher: Factor,
}

impl Default for MaterialMultipliers {
    fn default() -> Self {
        Self {
            pla: default_pla_multiplier(),
            abs: default_abs_multiplier(),
            petg: default_petg_multiplier(),
            resin: default_resin_multiplier(),
        }
    }
}

impl Default for RoleDiscounts {
    fn default() -> Self {
        Self {
            student: default_student_discount(),
            teacher: default_teacher_discount(),
        }
    }
}

fn default_min_billing_hours() -> Factor {
    Factor::from_hundredths(50)
}

fn default_pla_multiplier() -> Factor {
    Factor::ONE
}

fn default_abs_multiplier() -> Factor {
    Factor::from_hundredths(120)
}

fn default_petg_multiplier() -> Factor {
    Factor::from_hundredths(110)
}

fn default_resin_multiplier() -> Factor {
    Factor::from_hundredths(200)
}

fn default_student_discount() -> Factor {
    Factor::from_hundredths(20)
}

fn default_teacher_discount() -> Factor {
    Factor::from_hundredths(10)
}

/// What a quote is computed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuoteRequest {
    pub minutes: u32,
    pub filament: Grams,
    pub material: MaterialType,
}

impl PricingConfig {
    pub fn multiplier(&self, material: MaterialType) -> Factor {
        match material {
            MaterialType::Pla => self.multipliers.pla,
            MaterialType::Abs => self.multipliers.abs,
            MaterialType::Petg => self.multipliers.petg,
            MaterialType::Resin => self.multipliers.resin,
            MaterialType::Tpu | MaterialType::Nylon | MaterialType::Other => Factor::ONE,
        }
    }

    pub fn role_discount(&self, role: Role) -> Factor {
        match role {
            Role::Student => self.discounts.student,
            Role::Teacher => self.discounts.teacher,
            Role::Technician | Role::Admin | Role::External => Factor::ZERO,
        }
    }

    /// Price of a job for an account with `role` and a personal discount
    /// given as a percentage.
    pub fn quote(&self, request: &QuoteRequest, role: Role, personal_discount: Factor) -> Money {
        // Billed time in hundredths of a minute
        let billed = (i128::from(request.minutes) * 100).max(i128::from(self.min_billing_hours.hundredths()) * 60);

        // base / 6_000 is in cents
        let base = billed * i128::from(self.cost_per_hour.cents())
            + i128::from(request.filament.centigrams()) * i128::from(self.cost_per_gram.cents()) * 60;

        let multiplier = i128::from(self.multiplier(request.material).hundredths());
        let role_kept = (100 - i128::from(self.role_discount(role).hundredths())).clamp(0, 100);
        let personal_kept = (10_000 - i128::from(personal_discount.hundredths())).clamp(0, 10_000);

        let numerator = base * multiplier * role_kept * personal_kept;
        let denominator: i128 = 6_000 * 100 * 100 * 10_000;
        let cents = round_half_away(numerator, denominator);
        Money::from_cents(i64::try_from(cents).unwrap_or(i64::MAX))
    }
}

fn round_half_away(numerator: i128, denominator: i128) -> i128 {
    let q = numerator / denominator;
    let r = numerator % denominator;
    if r.abs() * 2 >= denominator {
        q + numerator.signum()
    } else {
        q
    }
}

/// Account credit. The balance is outstanding debt: purchases raise it,
/// payments lower it, and it may never exceed the credit limit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreditProfile {
    pub balance: Money,
    pub credit_limit: Money,
    pub total_spent: Money,
    /// Percentage, so `5.00` is five percent off
    pub discount_percentage: Factor,
}

impl Default for CreditProfile {
    fn default() -> Self {
        Self {
            balance: Money::ZERO,
            credit_limit: Money::from_cents(100_000),
            total_spent: Money::ZERO,
            discount_percentage: Factor::ZERO,
        }
    }
}

impl CreditProfile {
    pub fn available_credit(&self) -> Money {
        (self.credit_limit - self.balance).max(Money::ZERO)
    }

    pub fn can_make_purchase(&self, amount: Money) -> bool {
        self.balance + amount <= self.credit_limit
    }

    pub fn charge(&mut self, amount: Money) -> Result<(), PricingError> {
        if !self.can_make_purchase(amount) {
            return Err(PricingError::InsufficientCredit {
                amount,
                available: self.available_credit(),
            });
        }
        self.balance += amount;
        self.total_spent += amount;
        Ok(())
    }

    pub fn record_payment(&mut self, amount: Money) {
        self.balance -= amount;
    }
}

/// Jobs of `account` still in the queue or on a printer.
pub fn active_job_count(account: &Account, jobs: &[PrintJob]) -> u32 {
    let count = jobs
        .iter()
        .filter(|job| job.owner_id == account.id && job.status.is_active())
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Whether `account` may submit one more job costing `cost`.
pub fn check_submission(account: &Account, jobs: &[PrintJob], cost: Money) -> Result<(), PricingError> {
    if !account.can_print() {
        return Err(PricingError::CannotPrint(account.id));
    }

    let active = active_job_count(account, jobs);
    if active >= account.max_concurrent_jobs {
        return Err(PricingError::ConcurrencyLimit {
            active,
            limit: account.max_concurrent_jobs,
        });
    }

    if !account.credit.can_make_purchase(cost) {
        return Err(PricingError::InsufficientCredit {
            amount: cost,
            available: account.credit.available_credit(),
        });
    }
    Ok(())
}

/// Submission headroom shown on an account's dashboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionStatus {
    pub active_jobs: u32,
    pub max_concurrent_jobs: u32,
    pub balance: Money,
    pub available_credit: Money,
    pub can_submit: bool,
}

impl SubmissionStatus {
    pub fn for_account(account: &Account, jobs: &[PrintJob]) -> Self {
        Self {
            active_jobs: active_job_count(account, jobs),
            max_concurrent_jobs: account.max_concurrent_jobs,
            balance: account.credit.balance,
            available_credit: account.credit.available_credit(),
            can_submit: check_submission(account, jobs, Money::ZERO).is_ok(),
        }
    }
}
