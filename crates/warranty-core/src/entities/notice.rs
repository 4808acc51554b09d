//! Direct-message notices sent to users

use chrono::{DateTime, Utc};

/// Notification payload; rendering is left to the delivering adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    WarrantyActivated {
        code: String,
        expires_at: DateTime<Utc>,
    },
    Reminder {
        code: String,
        days_left: i64,
        expires_at: DateTime<Utc>,
    },
    WarrantyExpired {
        code: Option<String>,
        premium_kept: bool,
    },
    WelcomeBack {
        premium: bool,
        warranty_expires_at: Option<DateTime<Utc>>,
    },
}

impl Notice {
    /// Plain-text rendering
    pub fn render(&self) -> String {
        match self {
            Self::WarrantyActivated { code, expires_at } => format!(
                "Your warranty for code {code} is now active. It expires on {}.",
                expires_at.format("%Y-%m-%d")
            ),
            Self::Reminder {
                code,
                days_left,
                expires_at,
            } => format!(
                "Reminder: the warranty for code {code} expires in {days_left} day(s), on {}.",
                expires_at.format("%Y-%m-%d")
            ),
            Self::WarrantyExpired { code, premium_kept } => {
                let mut text = match code {
                    Some(code) => format!("The warranty for code {code} has expired."),
                    None => "Your warranty has expired.".to_string(),
                };
                if *premium_kept {
                    text.push_str(" Your premium access remains active.");
                }
                text
            }
            Self::WelcomeBack {
                premium,
                warranty_expires_at,
            } => {
                let mut text = "Welcome back! Your roles have been restored:".to_string();
                if *premium {
                    text.push_str(" premium");
                }
                if let Some(exp) = warranty_expires_at {
                    if *premium {
                        text.push(',');
                    }
                    text.push_str(&format!(" warranty until {}", exp.format("%Y-%m-%d")));
                }
                text.push('.');
                text
            }
        }
    }
}
