use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::display::{
    lenient_amount, lenient_count, lenient_flag, lenient_list, or_na, parse_fees, Fee,
};
use crate::status::{BookingStatus, CarStatus, DiscountStatus, TicketStatus, WithdrawalStatus};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl UserRef {
    #[must_use]
    pub fn display(user: Option<&Self>) -> String {
        or_na(user.and_then(|user| user.name.as_deref().or(user.email.as_deref())))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandRef {
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarRef {
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub plate_number: Option<String>,
}

impl CarRef {
    #[must_use]
    pub fn display(car: Option<&Self>) -> String {
        or_na(car.and_then(|car| car.name.as_deref().or(car.model.as_deref())))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<Value>,
    #[serde(default)]
    pub plate_number: Option<String>,
    #[serde(default)]
    pub brand: Option<BrandRef>,
    #[serde(default, alias = "user")]
    pub owner: Option<UserRef>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price_per_day: Option<f64>,
    #[serde(default)]
    pub status: CarStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "image")]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub cars_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    #[serde(default)]
    pub car: Option<CarRef>,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub additional_fees: Value,
}

impl Booking {
    #[must_use]
    pub fn fees(&self) -> Vec<Fee> {
        parse_fees(&self.additional_fees)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discount {
    pub id: i64,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, alias = "percent", deserialize_with = "lenient_amount")]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub car: Option<CarRef>,
    #[serde(default)]
    pub status: DiscountStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: i64,
    #[serde(default)]
    pub booking_id: Option<i64>,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub car: Option<CarRef>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub signed_at: Option<String>,
    #[serde(default, alias = "file")]
    pub file_url: Option<String>,
    #[serde(default, alias = "additional_fees")]
    pub fees: Value,
}

impl Contract {
    #[must_use]
    pub fn fees(&self) -> Vec<Fee> {
        parse_fees(&self.fees)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "lat", deserialize_with = "lenient_amount")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng", alias = "long", deserialize_with = "lenient_amount")]
    pub longitude: Option<f64>,
    #[serde(default, alias = "status", deserialize_with = "lenient_flag")]
    pub is_active: Option<bool>,
}

impl Station {
    /// Link to the station on a map, when it has coordinates.
    #[must_use]
    pub fn map_url(&self) -> Option<String> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(format!(
                "https://www.openstreetmap.org/?mlat={lat}&mlon={lng}#map=16/{lat}/{lng}"
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketReply {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, alias = "body")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    #[serde(default, alias = "title")]
    pub subject: Option<String>,
    #[serde(default, alias = "body")]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub replies: Vec<TicketReply>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(default, alias = "iban", alias = "account_number")]
    pub bank_account: Option<String>,
    #[serde(default)]
    pub status: WithdrawalStatus,
    #[serde(default, alias = "rejection_reason")]
    pub reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub unread_count: Option<u64>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    #[serde(default)]
    pub conversation_id: Option<i64>,
    #[serde(default, alias = "message")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub sender: Option<UserRef>,
    #[serde(default)]
    pub created_at: Option<String>,
}
