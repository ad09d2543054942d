//! Display strings for quotes. Numbers stay numeric in the quote itself.

use serde::Serialize;

use super::formula::{FinanceQuote, LeaseQuote};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaseQuoteDisplay {
    pub monthly_payment: String,
    pub due_at_signing: String,
    pub total_cost: String,
    pub residual_value: String,
    pub money_factor: String,
    pub equivalent_apr: String,
    pub term: String,
    pub mileage: String,
}

impl LeaseQuoteDisplay {
    pub fn from_quote(quote: &LeaseQuote) -> Self {
        Self {
            monthly_payment: format!("{}/mo", format_whole_dollars(quote.monthly_payment)),
            due_at_signing: format_currency(quote.due_at_signing),
            total_cost: format_currency(quote.total_cost),
            residual_value: format_currency(quote.residual_value),
            money_factor: format!("{:.5}", quote.money_factor),
            equivalent_apr: format!("{:.2}%", quote.equivalent_apr),
            term: format!("{} months", quote.term_months),
            mileage: format!("{} mi/yr", group_thousands(u64::from(quote.annual_mileage))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinanceQuoteDisplay {
    pub monthly_payment: String,
    pub due_at_signing: String,
    pub amount_financed: String,
    pub total_interest: String,
    pub total_cost: String,
    pub apr: String,
    pub term: String,
}

impl FinanceQuoteDisplay {
    pub fn from_quote(quote: &FinanceQuote) -> Self {
        Self {
            monthly_payment: format!("{}/mo", format_whole_dollars(quote.monthly_payment)),
            due_at_signing: format_currency(quote.due_at_signing),
            amount_financed: format_currency(quote.amount_financed),
            total_interest: format_currency(quote.total_interest),
            total_cost: format_currency(quote.total_cost),
            apr: format!("{:.2}%", quote.apr),
            term: format!("{} months", quote.term_months),
        }
    }
}

/// `1963.95` becomes `$1,963.95`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${}.{:02}", group_thousands(cents / 100), cents % 100)
}

/// `477.0` becomes `$477`.
pub fn format_whole_dollars(amount: f64) -> String {
    let dollars = amount.abs().round() as u64;
    let sign = if amount < 0.0 && dollars > 0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(dollars))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
