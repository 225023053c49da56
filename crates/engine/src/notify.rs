//! Transactional email collaborator and the templates the activators send.

use async_trait::async_trait;

use crate::EngineError;

/// A rendered transactional email.
#[derive(Clone, Debug)]
pub struct Email {
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, email: &Email, tags: &[&str]) -> Result<(), EngineError>;
}

pub struct PaymentSuccess<'a> {
    pub user_name: &'a str,
    pub amount: i64,
    pub invoice_number: &'a str,
    pub payment_method: &'a str,
    pub transaction_date: &'a str,
    pub item_name: &'a str,
}

pub struct MembershipActivation<'a> {
    pub user_name: &'a str,
    pub membership_name: &'a str,
    pub membership_duration: &'a str,
    pub starts_on: &'a str,
    pub ends_on: &'a str,
    pub price: i64,
    pub invoice_number: &'a str,
}

/// Benefits enumerated in the membership activation email.
pub const MEMBERSHIP_BENEFITS: [&str; 5] = [
    "Access to every premium course",
    "Private community groups",
    "International buyer & supplier database",
    "Complete export document templates",
    "Free consultations with expert mentors",
];

/// Formats an amount in rupiah with thousand separators.
pub fn format_idr(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

pub fn payment_success(data: &PaymentSuccess) -> Email {
    let amount = format_idr(data.amount);
    Email {
        subject: format!("Payment received — {}", data.item_name),
        html: format!(
            "<h2>Thank you, {name}!</h2>\
             <p>We have received your payment of <strong>{amount}</strong> \
             for <strong>{item}</strong>.</p>\
             <table>\
             <tr><td>Invoice</td><td>{invoice}</td></tr>\
             <tr><td>Payment method</td><td>{method}</td></tr>\
             <tr><td>Date</td><td>{date}</td></tr>\
             </table>\
             <p>Your access is being prepared and will be ready in a moment.</p>",
            name = data.user_name,
            amount = amount,
            item = data.item_name,
            invoice = data.invoice_number,
            method = data.payment_method,
            date = data.transaction_date,
        ),
    }
}

pub fn membership_activation(data: &MembershipActivation) -> Email {
    let benefits: String = MEMBERSHIP_BENEFITS
        .iter()
        .map(|benefit| format!("<li>{benefit}</li>"))
        .collect();
    Email {
        subject: format!("Your {} membership is active", data.membership_name),
        html: format!(
            "<h2>Welcome aboard, {name}!</h2>\
             <p>Your <strong>{membership}</strong> membership ({duration}) is \
             now active.</p>\
             <table>\
             <tr><td>Valid from</td><td>{starts}</td></tr>\
             <tr><td>Valid until</td><td>{ends}</td></tr>\
             <tr><td>Price</td><td>{price}</td></tr>\
             <tr><td>Invoice</td><td>{invoice}</td></tr>\
             </table>\
             <p>What you get:</p><ul>{benefits}</ul>",
            name = data.user_name,
            membership = data.membership_name,
            duration = data.membership_duration,
            starts = data.starts_on,
            ends = data.ends_on,
            price = format_idr(data.price),
            invoice = data.invoice_number,
            benefits = benefits,
        ),
    }
}
